use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::paths::{AppDirKind, APP_DIR_NAME, CONFIG_FILE, LOCAL_STATE_FILE};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Directory name of the messaging application under the base dirs.
    pub app_dir_name: String,
    pub local_state_file: String,
    pub config_file: String,
    /// Base directory kind the state file is looked up under.
    pub local_state_location: AppDirKind,
    /// Replaces the roaming config base directory when set.
    pub roaming_dir: Option<PathBuf>,
    /// Replaces the local app data base directory when set.
    pub local_dir: Option<PathBuf>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            app_dir_name: APP_DIR_NAME.into(),
            local_state_file: LOCAL_STATE_FILE.into(),
            config_file: CONFIG_FILE.into(),
            local_state_location: AppDirKind::RoamingConfig,
            roaming_dir: None,
            local_dir: None,
        }
    }
}

impl ExtractorConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read(path).map_err(|source| Error::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_slice(&data).map_err(|e| Error::format(format!("settings file: {e}")))
    }
}
