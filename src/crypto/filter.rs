//! Replaces `![<base64>]` markers in merged properties with their plaintext.

use super::DecryptionContext;
use crate::core::MergedConfig;
use crate::error::{ConfigError, Result};
use tracing::debug;

/// Prefix of an encrypted value.
pub const MARKER_PREFIX: &str = "![";

/// Suffix of an encrypted value.
pub const MARKER_SUFFIX: &str = "]";

/// Returns the base64 payload if `value` is an encrypted marker.
///
/// # Examples
///
/// ```rust
/// use cloud_config_client::crypto::filter::marker_payload;
///
/// assert_eq!(marker_payload("![c2VjcmV0]"), Some("c2VjcmV0"));
/// assert_eq!(marker_payload("plain"), None);
/// assert_eq!(marker_payload("!["), None);
/// ```
pub fn marker_payload(value: &str) -> Option<&str> {
    value
        .strip_prefix(MARKER_PREFIX)
        .and_then(|rest| rest.strip_suffix(MARKER_SUFFIX))
}

/// Returns true if `value` has the `![...]` shape.
pub fn is_encrypted(value: &str) -> bool {
    marker_payload(value).is_some()
}

/// Decrypt every marked value of `config` in place.
///
/// Unmarked values are left untouched. Returns the number of decrypted values.
///
/// # Errors
///
/// Returns [`ConfigError::Decryption`] on the first value that cannot be decrypted,
/// including a marked value when no `context` is configured. The caller must then
/// discard `config` entirely.
pub fn decrypt_properties(
    config: &mut MergedConfig,
    context: Option<&DecryptionContext>,
) -> Result<usize> {
    let mut decrypted = 0;

    for (key, value) in config.iter_mut() {
        let Some(payload) = marker_payload(value) else {
            continue;
        };

        let context = context.ok_or_else(|| {
            ConfigError::decryption(key.as_str(), "value is encrypted but no decryption key is configured")
        })?;

        let plaintext = context.decrypt_payload(key, payload)?;
        debug!(key = %key, "Decrypted property");
        *value = plaintext;
        decrypted += 1;
    }

    Ok(decrypted)
}
