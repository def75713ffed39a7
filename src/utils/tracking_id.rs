//! Tracking id generation and identifier validation.
//!
//! Tracking ids are opaque, unguessable tokens that join a click to a later
//! conversion. Partner and product ids are operator-assigned and follow a
//! restricted alphabet so they can be embedded in links unescaped.

use crate::error::AppError;
use base64::Engine as _;
use regex::Regex;
use serde_json::json;
use std::sync::LazyLock;

/// Random bytes before base64 encoding (128 bits of entropy).
const TRACKING_ID_BYTES: usize = 16;

/// Encoded tracking id length.
pub const TRACKING_ID_LEN: usize = 22;

/// Partner, product, session and tracking ids: URL-safe, 1-64 characters.
pub static IDENTIFIER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_-]{1,64}$").expect("identifier pattern is valid")
});

/// Generates a cryptographically secure random tracking id.
///
/// Uses `getrandom` for entropy and encodes 16 bytes as URL-safe base64
/// without padding, producing a 22-character id.
///
/// # Errors
///
/// Returns [`AppError::Internal`] if the system random number generator fails.
pub fn generate_tracking_id() -> Result<String, AppError> {
    let mut buffer = [0u8; TRACKING_ID_BYTES];

    getrandom::fill(&mut buffer).map_err(|e| {
        AppError::internal(
            "Failed to generate tracking id",
            json!({ "reason": e.to_string() }),
        )
    })?;

    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buffer))
}

/// Returns true if `value` is a well-formed partner, product or tracking id.
pub fn is_valid_identifier(value: &str) -> bool {
    IDENTIFIER_RE.is_match(value)
}
