//! Master key recovery from the application's `Local State` file.
//!
//! The file stores `os_crypt.encrypted_key`: Base64 of the ASCII marker
//! `DPAPI` followed by a platform-protected blob.

use base64::{engine::general_purpose, Engine as _};
use serde::Deserialize;
use zeroize::Zeroizing;

use crate::error::{Error, Result};
use crate::protector::PlatformKeyProtector;
use crate::secret::MasterKey;

pub const DPAPI_MARKER: &[u8] = b"DPAPI";

#[derive(Deserialize)]
struct LocalState {
    os_crypt: OsCrypt,
}

#[derive(Deserialize)]
struct OsCrypt {
    encrypted_key: String,
}

pub fn resolve_master_key(
    local_state_contents: &str,
    protector: &dyn PlatformKeyProtector,
) -> Result<MasterKey> {
    let state: LocalState = serde_json::from_str(local_state_contents)
        .map_err(|e| Error::format(format!("local state: {e}")))?;
    let blob = Zeroizing::new(
        general_purpose::STANDARD
            .decode(state.os_crypt.encrypted_key.as_bytes())
            .map_err(|e| Error::format(format!("encrypted_key is not valid base64: {e}")))?,
    );
    let protected = strip_marker(&blob)?;
    let key = protector.unprotect(protected)?;
    Ok(MasterKey::new(key))
}

/// The marker is checked rather than blindly skipped so a foreign blob fails
/// here instead of inside the platform call.
fn strip_marker(blob: &[u8]) -> Result<&[u8]> {
    blob.strip_prefix(DPAPI_MARKER).ok_or_else(|| {
        if blob.len() < DPAPI_MARKER.len() {
            Error::format("encrypted_key shorter than DPAPI marker")
        } else {
            Error::format("encrypted_key missing DPAPI marker")
        }
    })
}
