use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("path resolution failed: {0}")]
    PathResolution(String),

    #[error("cannot read {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("format error: {0}")]
    Format(String),

    #[error("platform unprotect failed: {0}")]
    PlatformProtection(String),

    #[error("authentication failed (tag mismatch)")]
    Authentication,
}

pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of [`Error`], stable across message wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    PathResolutionError,
    IoError,
    FormatError,
    PlatformProtectionError,
    AuthenticationError,
}

impl Error {
    pub fn format(message: impl Into<String>) -> Self {
        Error::Format(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::PathResolution(_) => ErrorKind::PathResolutionError,
            Error::FileRead { .. } => ErrorKind::IoError,
            Error::Format(_) => ErrorKind::FormatError,
            Error::PlatformProtection(_) => ErrorKind::PlatformProtectionError,
            Error::Authentication => ErrorKind::AuthenticationError,
        }
    }

    /// Human-readable guess at the cause, separating format problems from
    /// authentication problems.
    pub fn hint(&self) -> &'static str {
        match self.kind() {
            ErrorKind::PathResolutionError => {
                "set DBKEY_ROAMING_DIR / DBKEY_LOCAL_DIR or pass the directories explicitly"
            }
            ErrorKind::IoError => "check that the application is installed and the file is readable",
            ErrorKind::FormatError => "the file or key blob is malformed; this is a format problem",
            ErrorKind::PlatformProtectionError => {
                "run as the same user on the same machine that created the data"
            }
            ErrorKind::AuthenticationError => {
                "wrong master key or corrupted/tampered ciphertext; not a parsing bug"
            }
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::PathResolutionError => "PathResolutionError",
            ErrorKind::IoError => "IoError",
            ErrorKind::FormatError => "FormatError",
            ErrorKind::PlatformProtectionError => "PlatformProtectionError",
            ErrorKind::AuthenticationError => "AuthenticationError",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authentication_hint_points_at_key_or_tampering() {
        let err = Error::Authentication;
        assert_eq!(err.kind(), ErrorKind::AuthenticationError);
        assert!(err.hint().contains("tampered"));
    }

    #[test]
    fn format_hint_differs_from_authentication_hint() {
        assert_ne!(Error::format("bad").hint(), Error::Authentication.hint());
        assert!(Error::format("bad").hint().contains("format problem"));
    }

    #[test]
    fn file_read_message_names_path() {
        let err = Error::FileRead {
            path: PathBuf::from("/tmp/Local State"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert_eq!(err.kind(), ErrorKind::IoError);
        assert!(err.to_string().contains("Local State"));
    }
}
