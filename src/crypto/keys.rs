use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

/// Prefix every issued API key carries
pub const API_KEY_PREFIX: &str = "mgk_";

/// bcrypt cost for stored API key hashes
const HASH_COST: u32 = 10;

/// Generate a new API key
pub fn generate_api_key() -> String {
    let random_bytes: [u8; 24] = rand::random();
    format!(
        "{}{}",
        API_KEY_PREFIX,
        BASE64.encode(random_bytes).replace(['+', '/', '='], "")
    )
}

/// Hash an API key for storage
pub fn hash_api_key(api_key: &str) -> Result<String> {
    bcrypt::hash(api_key, HASH_COST).context("Failed to hash API key")
}

/// Verify an API key against a hash
pub fn verify_api_key(api_key: &str, hash: &str) -> bool {
    bcrypt::verify(api_key, hash).unwrap_or(false)
}

/// 32 hex chars, used for meeting and notification IDs
pub fn generate_id() -> String {
    let random_bytes: [u8; 16] = rand::random();
    hex::encode(random_bytes)
}
