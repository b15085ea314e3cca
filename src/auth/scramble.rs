//! Challenge/response scrambles
//!
//! Both plugins hash the password, double-hash it, mix in the server nonce
//! and XOR the result against the first hash. They differ only in digest
//! (SHA-1 vs SHA-256) and in which side of the concatenation the nonce goes.

use sha1::Sha1;
use sha2::{Digest, Sha256};

fn sha1(data: &[u8]) -> [u8; 20] {
    let mut hasher = Sha1::new();
    hasher.update(data);
    hasher.finalize().into()
}

fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// `mysql_native_password`: SHA1(password) XOR SHA1(nonce + SHA1(SHA1(password)))
///
/// Empty passwords send an empty response.
pub fn native_password_response(password: &str, nonce: &[u8]) -> Vec<u8> {
    if password.is_empty() {
        return Vec::new();
    }

    let password_hash = sha1(password.as_bytes());
    let double_hash = sha1(&password_hash);

    let mut combined = Vec::with_capacity(nonce.len() + double_hash.len());
    combined.extend_from_slice(nonce);
    combined.extend_from_slice(&double_hash);
    let mask = sha1(&combined);

    password_hash
        .iter()
        .zip(mask.iter())
        .map(|(a, b)| a ^ b)
        .collect()
}

/// `caching_sha2_password` fast path:
/// SHA256(password) XOR SHA256(SHA256(SHA256(password)) + nonce)
pub fn caching_sha2_response(password: &str, nonce: &[u8]) -> Vec<u8> {
    if password.is_empty() {
        return Vec::new();
    }

    let password_hash = sha256(password.as_bytes());
    let double_hash = sha256(&password_hash);

    let mut combined = Vec::with_capacity(double_hash.len() + nonce.len());
    combined.extend_from_slice(&double_hash);
    combined.extend_from_slice(nonce);
    let mask = sha256(&combined);

    password_hash
        .iter()
        .zip(mask.iter())
        .map(|(a, b)| a ^ b)
        .collect()
}
