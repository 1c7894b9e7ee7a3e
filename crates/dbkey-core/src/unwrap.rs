//! AES-256-GCM unwrap of the database key.
//!
//! Wire format:
//! [3 bytes: version "v10" | "v11"][12 bytes: nonce][N bytes: ciphertext][16 bytes: tag]
//!
//! Associated data is empty. Both versions decrypt identically.

use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce, Tag};
use serde::Serialize;
use zeroize::Zeroizing;

use crate::error::{Error, Result};
use crate::secret::DatabaseKey;

pub const VERSION_LEN: usize = 3;
pub const NONCE_LEN: usize = 12;
pub const TAG_LEN: usize = 16;
pub const KEY_LEN: usize = 32;
pub const MIN_WRAPPED_LEN: usize = VERSION_LEN + NONCE_LEN + TAG_LEN;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WrapVersion {
    V10,
    V11,
}

impl WrapVersion {
    pub const V10_TAG: &'static [u8] = b"v10";
    pub const V11_TAG: &'static [u8] = b"v11";

    fn from_header(header: &[u8]) -> Option<Self> {
        match header {
            Self::V10_TAG => Some(WrapVersion::V10),
            Self::V11_TAG => Some(WrapVersion::V11),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WrapVersion::V10 => "v10",
            WrapVersion::V11 => "v11",
        }
    }
}

/// Borrowed view over a wrapped key. Parsing never touches the cipher.
#[derive(Debug, Clone, Copy)]
pub struct WrappedKey<'a> {
    pub version: WrapVersion,
    pub nonce: &'a [u8],
    pub ciphertext: &'a [u8],
    pub tag: &'a [u8],
}

impl<'a> WrappedKey<'a> {
    pub fn parse(wrapped: &'a [u8]) -> Result<Self> {
        if wrapped.len() < MIN_WRAPPED_LEN {
            return Err(Error::format("truncated wrapped key"));
        }
        let (header, rest) = wrapped.split_at(VERSION_LEN);
        let (nonce, body) = rest.split_at(NONCE_LEN);
        let version =
            WrapVersion::from_header(header).ok_or_else(|| Error::format("unsupported header"))?;
        if body.len() < TAG_LEN {
            return Err(Error::format("truncated wrapped key"));
        }
        let (ciphertext, tag) = body.split_at(body.len() - TAG_LEN);
        Ok(Self {
            version,
            nonce,
            ciphertext,
            tag,
        })
    }

    pub fn total_len(&self) -> usize {
        VERSION_LEN + self.nonce.len() + self.ciphertext.len() + self.tag.len()
    }

    /// Verify the tag and decrypt. On any failure the working buffer is
    /// wiped before returning.
    pub fn decrypt(&self, master_key: &[u8]) -> Result<DatabaseKey> {
        if master_key.len() != KEY_LEN {
            return Err(Error::format(format!(
                "master key must be {KEY_LEN} bytes, got {}",
                master_key.len()
            )));
        }
        let cipher = Aes256Gcm::new_from_slice(master_key)
            .map_err(|e| Error::format(format!("master key: {e}")))?;

        let mut buffer = Zeroizing::new(self.ciphertext.to_vec());
        cipher
            .decrypt_in_place_detached(
                Nonce::from_slice(self.nonce),
                b"",
                buffer.as_mut_slice(),
                Tag::from_slice(self.tag),
            )
            .map_err(|_| Error::Authentication)?;

        let text = std::str::from_utf8(&buffer)
            .map_err(|e| Error::format(format!("decrypted key is not UTF-8: {e}")))?;
        Ok(DatabaseKey::from_hex_text(text))
    }
}

pub fn unwrap_database_key(master_key: &[u8], wrapped: &[u8]) -> Result<DatabaseKey> {
    WrappedKey::parse(wrapped)?.decrypt(master_key)
}
