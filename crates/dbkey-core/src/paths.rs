use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::ExtractorConfig;
use crate::error::{Error, Result};

pub const APP_DIR_NAME: &str = "Signal";
pub const LOCAL_STATE_FILE: &str = "Local State";
pub const CONFIG_FILE: &str = "config.json";

pub const ROAMING_DIR_ENV: &str = "DBKEY_ROAMING_DIR";
pub const LOCAL_DIR_ENV: &str = "DBKEY_LOCAL_DIR";

/// Per-user application data locations.
///
/// On Windows these are `%APPDATA%` and `%LOCALAPPDATA%`; elsewhere the
/// platform config and local data directories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppDirKind {
    RoamingConfig,
    LocalAppState,
}

impl AppDirKind {
    fn env_override(self) -> &'static str {
        match self {
            AppDirKind::RoamingConfig => ROAMING_DIR_ENV,
            AppDirKind::LocalAppState => LOCAL_DIR_ENV,
        }
    }
}

pub fn resolve(kind: AppDirKind) -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os(kind.env_override()).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let dirs = BaseDirs::new()
        .ok_or_else(|| Error::PathResolution("cannot determine home directory".into()))?;
    let dir = match kind {
        AppDirKind::RoamingConfig => dirs.config_dir(),
        AppDirKind::LocalAppState => dirs.data_local_dir(),
    };
    Ok(dir.to_path_buf())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedPaths {
    pub local_state: PathBuf,
    pub config: PathBuf,
}

/// Resolve both input files. Directories set in `config` win over the
/// environment and platform conventions.
pub fn resolve_paths(config: &ExtractorConfig) -> Result<ResolvedPaths> {
    let local_state = base_dir(config, config.local_state_location)?
        .join(&config.app_dir_name)
        .join(&config.local_state_file);
    let config_path = base_dir(config, AppDirKind::RoamingConfig)?
        .join(&config.app_dir_name)
        .join(&config.config_file);
    Ok(ResolvedPaths {
        local_state,
        config: config_path,
    })
}

fn base_dir(config: &ExtractorConfig, kind: AppDirKind) -> Result<PathBuf> {
    let explicit = match kind {
        AppDirKind::RoamingConfig => config.roaming_dir.as_ref(),
        AppDirKind::LocalAppState => config.local_dir.as_ref(),
    };
    match explicit {
        Some(dir) => Ok(dir.clone()),
        None => resolve(kind),
    }
}
