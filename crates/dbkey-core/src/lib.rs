//! Recovery of a messaging application's local database key.
//!
//! The key is wrapped twice: the AES-GCM master key is sealed with the
//! platform protection service and stored in `Local State`, and the database
//! key is sealed with that master key and stored hex-encoded in `config.json`.

pub mod config;
pub mod error;
pub mod extractor;
pub mod master_key;
pub mod paths;
pub mod protector;
pub mod secret;
pub mod unwrap;
pub mod wrapped_key;

pub use config::ExtractorConfig;
pub use error::{Error, ErrorKind, Result};
pub use extractor::{KeyExtractor, Stage, StageError};
pub use paths::{AppDirKind, ResolvedPaths};
pub use protector::{platform_protector, PlatformKeyProtector};
pub use secret::{DatabaseKey, MasterKey};
pub use unwrap::{unwrap_database_key, WrapVersion, WrappedKey};
