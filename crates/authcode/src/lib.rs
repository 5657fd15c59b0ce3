// Guard code derivation for account sign-in.
//
// Codes are 5 characters from a reduced alphabet and rotate every 30 seconds,
// derived with HMAC-SHA1 over the current time window from a shared seed.

use base64::Engine as _;
use base64::{alphabet, engine};
use hmac::{Hmac, Mac};
use sha1::Sha1;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

type HmacSha1 = Hmac<Sha1>;

/// Characters a code can contain. Visually ambiguous glyphs (0/O, 1/I/L, ...)
/// are excluded so codes survive manual entry.
pub const CODE_ALPHABET: &[u8; 26] = b"23456789BCDFGHJKMNPQRTVWXY";

/// Number of characters in an emitted code.
pub const CODE_LEN: usize = 5;

/// Seconds per code window. A code is stable within its window and changes
/// at the boundary.
pub const WINDOW_SECS: u64 = 30;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodeError {
    #[error("shared seed is empty")]
    EmptySecret,
    #[error("shared seed is not valid base64: {reason}")]
    InvalidSecret { reason: String },
}

/// Derive the guard code for a wall-clock instant.
///
/// Clocks before the Unix epoch clamp to window zero rather than failing;
/// the resulting code is simply wrong, which the service rejects like any
/// other stale code.
pub fn generate(secret: &str, at: SystemTime) -> Result<String, CodeError> {
    let unix_secs = at
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    generate_at(secret, unix_secs)
}

/// Derive the guard code for an explicit Unix timestamp.
///
/// Deterministic: the same seed and window always yield the same code.
pub fn generate_at(secret: &str, unix_secs: u64) -> Result<String, CodeError> {
    let seed = secret.trim();
    if seed.is_empty() {
        return Err(CodeError::EmptySecret);
    }
    let key = decode_seed(seed)?;

    let window = (unix_secs / WINDOW_SECS).to_be_bytes();
    let mut mac = HmacSha1::new_from_slice(&key).map_err(|e| CodeError::InvalidSecret {
        reason: format!("unusable key material: {e}"),
    })?;
    mac.update(&window);
    let digest = mac.finalize().into_bytes();

    Ok(emit_code(truncate_digest(&digest)))
}

/// Seeds come from authenticator exports, which are sloppier than canonical
/// base64: trailing bits are not always zeroed. Accept them the way the
/// exports write them.
const SEED_ENGINE: engine::GeneralPurpose = engine::GeneralPurpose::new(
    &alphabet::STANDARD,
    engine::GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

/// Decode the seed, restoring trailing padding first. Exports are not
/// consistent about padding either.
fn decode_seed(seed: &str) -> Result<Vec<u8>, CodeError> {
    let mut normalized = seed.to_owned();
    while normalized.len() % 4 != 0 {
        normalized.push('=');
    }
    SEED_ENGINE
        .decode(normalized.as_bytes())
        .map_err(|e| CodeError::InvalidSecret {
            reason: e.to_string(),
        })
}

/// Dynamic truncation: the low nibble of the last digest byte picks a
/// 4-byte big-endian slice, masked to 31 bits.
fn truncate_digest(digest: &[u8]) -> u32 {
    let offset = (digest[digest.len() - 1] & 0x0F) as usize;
    u32::from_be_bytes([
        digest[offset],
        digest[offset + 1],
        digest[offset + 2],
        digest[offset + 3],
    ]) & 0x7FFF_FFFF
}

/// Emit the code characters least-significant digit first, base 26 over the
/// reduced alphabet.
fn emit_code(mut value: u32) -> String {
    let radix = CODE_ALPHABET.len() as u32;
    let mut code = String::with_capacity(CODE_LEN);
    for _ in 0..CODE_LEN {
        code.push(CODE_ALPHABET[(value % radix) as usize] as char);
        value /= radix;
    }
    code
}
