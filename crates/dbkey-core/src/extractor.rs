// Key extraction pipeline
//
// Runs path resolution, master key recovery, wrapped key decoding and the
// AES-GCM unwrap in order, stopping at the first failure. This is the only
// place that logs; no log line carries key material.

use std::fmt;
use std::path::Path;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::ExtractorConfig;
use crate::error::Error;
use crate::master_key::resolve_master_key;
use crate::paths::{resolve_paths, ResolvedPaths};
use crate::protector::{platform_protector, PlatformKeyProtector};
use crate::secret::{DatabaseKey, MasterKey};
use crate::unwrap::WrappedKey;
use crate::wrapped_key::resolve_wrapped_key;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    ResolvePaths,
    ReadLocalState,
    ResolveMasterKey,
    ReadConfig,
    ResolveWrappedKey,
    UnwrapKey,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::ResolvePaths => "resolve paths",
            Stage::ReadLocalState => "read local state",
            Stage::ResolveMasterKey => "resolve master key",
            Stage::ReadConfig => "read config",
            Stage::ResolveWrappedKey => "resolve wrapped key",
            Stage::UnwrapKey => "unwrap key",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
#[error("{stage} failed: {source}")]
pub struct StageError {
    pub stage: Stage,
    #[source]
    pub source: Error,
}

impl StageError {
    fn at(stage: Stage) -> impl FnOnce(Error) -> StageError {
        move |source| StageError { stage, source }
    }
}

pub struct KeyExtractor {
    config: ExtractorConfig,
    protector: Box<dyn PlatformKeyProtector>,
}

impl KeyExtractor {
    /// Extractor using the protection service of the build target.
    pub fn new(config: ExtractorConfig) -> Self {
        Self::with_protector(config, platform_protector())
    }

    pub fn with_protector(
        config: ExtractorConfig,
        protector: Box<dyn PlatformKeyProtector>,
    ) -> Self {
        Self { config, protector }
    }

    pub fn resolve_paths(&self) -> Result<ResolvedPaths, StageError> {
        resolve_paths(&self.config).map_err(StageError::at(Stage::ResolvePaths))
    }

    pub fn run(&self) -> Result<DatabaseKey, StageError> {
        self.run_stages().map_err(log_failure)
    }

    /// Run the in-memory stages on already loaded file contents.
    pub fn extract_from_contents(
        &self,
        local_state: &str,
        config: &str,
    ) -> Result<DatabaseKey, StageError> {
        self.recover_master_key(local_state)
            .and_then(|master_key| self.unwrap_with(master_key, config))
            .map_err(log_failure)
    }

    fn run_stages(&self) -> Result<DatabaseKey, StageError> {
        info!("resolving application paths");
        let paths = self.resolve_paths()?;
        debug!(
            local_state = %paths.local_state.display(),
            config = %paths.config.display(),
            "paths resolved"
        );

        let local_state =
            read_input(&paths.local_state).map_err(StageError::at(Stage::ReadLocalState))?;
        let master_key = self.recover_master_key(&local_state)?;

        let config = read_input(&paths.config).map_err(StageError::at(Stage::ReadConfig))?;
        self.unwrap_with(master_key, &config)
    }

    fn recover_master_key(&self, local_state: &str) -> Result<MasterKey, StageError> {
        info!("recovering master key");
        let master_key = resolve_master_key(local_state, self.protector.as_ref())
            .map_err(StageError::at(Stage::ResolveMasterKey))?;
        debug!(len = master_key.len(), "master key recovered");
        Ok(master_key)
    }

    fn unwrap_with(&self, master_key: MasterKey, config: &str) -> Result<DatabaseKey, StageError> {
        let wrapped =
            resolve_wrapped_key(config).map_err(StageError::at(Stage::ResolveWrappedKey))?;
        debug!(len = wrapped.len(), "wrapped key decoded");

        let db_key = WrappedKey::parse(&wrapped)
            .and_then(|parsed| {
                debug!(version = parsed.version.as_str(), "unwrapping database key");
                parsed.decrypt(master_key.as_bytes())
            })
            .map_err(StageError::at(Stage::UnwrapKey))?;

        if !db_key.is_well_formed() {
            warn!("decrypted database key is not 64 hex digits");
        }
        info!("database key recovered");
        Ok(db_key)
    }
}

fn log_failure(err: StageError) -> StageError {
    error!(stage = %err.stage, kind = %err.source.kind(), "key extraction stopped");
    err
}

/// Read an input file as UTF-8 text.
///
/// A missing or unreadable file is `FileRead`; bytes that are not UTF-8 are a
/// format problem with the file itself.
pub fn read_input(path: &Path) -> Result<String, Error> {
    let bytes = std::fs::read(path).map_err(|source| Error::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    String::from_utf8(bytes)
        .map_err(|e| Error::format(format!("{} is not UTF-8: {e}", path.display())))
}
