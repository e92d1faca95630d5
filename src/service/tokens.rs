use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// 32 random bytes, hex encoded. Used for sessions, newsletter links and chat.
pub fn random_token() -> String {
    hex::encode(rand::random::<[u8; 32]>())
}

/// Digest stored in place of a bearer token.
pub fn digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

pub fn constant_time_eq(a: &str, b: &str) -> bool {
    bool::from(a.as_bytes().ct_eq(b.as_bytes()))
}
