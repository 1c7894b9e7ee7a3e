use serde::Deserialize;

use crate::error::{Error, Result};

#[derive(Deserialize)]
struct AppConfig {
    #[serde(rename = "encryptedKey")]
    encrypted_key: String,
}

/// Hex-decode the `encryptedKey` field of the application's `config.json`.
/// Layout checks are left to [`crate::unwrap`].
pub fn resolve_wrapped_key(config_contents: &str) -> Result<Vec<u8>> {
    let config: AppConfig = serde_json::from_str(config_contents)
        .map_err(|e| Error::format(format!("config: {e}")))?;
    hex::decode(config.encrypted_key.trim())
        .map_err(|e| Error::format(format!("encryptedKey is not valid hex: {e}")))
}
