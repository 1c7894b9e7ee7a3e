//! In-memory secret holders.
//!
//! Both types wipe their backing memory when dropped and never print their
//! contents through `Debug`.

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

pub const DATABASE_KEY_PREFIX: &str = "0x";

/// Number of hex digits in a well-formed database key (256 bits).
pub const DATABASE_KEY_HEX_LEN: usize = 64;

/// Raw master key returned by the platform protector.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterKey(Vec<u8>);

impl MasterKey {
    pub fn new(mut bytes: Zeroizing<Vec<u8>>) -> Self {
        Self(std::mem::take(&mut *bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MasterKey([REDACTED; {}])", self.0.len())
    }
}

/// Final database key, rendered as `0x` followed by the decrypted hex text.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct DatabaseKey(String);

impl DatabaseKey {
    pub(crate) fn from_hex_text(text: &str) -> Self {
        let mut key = String::with_capacity(DATABASE_KEY_PREFIX.len() + text.len());
        key.push_str(DATABASE_KEY_PREFIX);
        key.push_str(text);
        Self(key)
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// True when the key is `0x` plus exactly 64 hex digits.
    pub fn is_well_formed(&self) -> bool {
        match self.0.strip_prefix(DATABASE_KEY_PREFIX) {
            Some(hex) => {
                hex.len() == DATABASE_KEY_HEX_LEN && hex.bytes().all(|b| b.is_ascii_hexdigit())
            }
            None => false,
        }
    }
}

impl fmt::Debug for DatabaseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DatabaseKey([REDACTED])")
    }
}
