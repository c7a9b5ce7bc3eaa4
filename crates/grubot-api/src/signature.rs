//! Webhook signature check.
//!
//! The platform signs each delivery with an HMAC of the raw body keyed by the
//! app secret, sent as `X-Hub-Signature: sha1=<hex>` and, on newer API
//! versions, `X-Hub-Signature-256: sha256=<hex>`.

use axum::http::HeaderMap;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::Sha256;
use thiserror::Error;

type HmacSha1 = Hmac<Sha1>;
type HmacSha256 = Hmac<Sha256>;

pub const SHA1_HEADER: &str = "x-hub-signature";
pub const SHA256_HEADER: &str = "x-hub-signature-256";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Sha1,
    Sha256,
}

impl Algorithm {
    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "sha1" => Some(Algorithm::Sha1),
            "sha256" => Some(Algorithm::Sha256),
            _ => None,
        }
    }

    pub fn prefix(self) -> &'static str {
        match self {
            Algorithm::Sha1 => "sha1",
            Algorithm::Sha256 => "sha256",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signature header missing")]
    Missing,
    #[error("signature header malformed")]
    Malformed,
    #[error("unsupported signature algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("signature does not match")]
    Mismatch,
}

/// Hex-encoded HMAC of `payload`.
pub fn sign(algorithm: Algorithm, secret: &str, payload: &[u8]) -> String {
    hex::encode(digest(algorithm, secret.as_bytes(), payload))
}

fn digest(algorithm: Algorithm, secret: &[u8], payload: &[u8]) -> Vec<u8> {
    // Any key length is accepted by HMAC, so key setup cannot fail here.
    match algorithm {
        Algorithm::Sha1 => HmacSha1::new_from_slice(secret)
            .map(|mut mac| {
                mac.update(payload);
                mac.finalize().into_bytes().to_vec()
            })
            .unwrap_or_default(),
        Algorithm::Sha256 => HmacSha256::new_from_slice(secret)
            .map(|mut mac| {
                mac.update(payload);
                mac.finalize().into_bytes().to_vec()
            })
            .unwrap_or_default(),
    }
}

/// Check a signature header value of the form `<algorithm>=<hex>`.
pub fn verify(secret: &str, payload: &[u8], header_value: &str) -> Result<(), SignatureError> {
    let (prefix, hex_sig) = header_value
        .trim()
        .split_once('=')
        .ok_or(SignatureError::Malformed)?;
    let algorithm = Algorithm::from_prefix(prefix)
        .ok_or_else(|| SignatureError::UnsupportedAlgorithm(prefix.to_string()))?;
    let provided = hex::decode(hex_sig).map_err(|_| SignatureError::Malformed)?;
    let expected = digest(algorithm, secret.as_bytes(), payload);

    // Constant-time comparison
    let matches = !expected.is_empty()
        && expected.len() == provided.len()
        && expected
            .iter()
            .zip(&provided)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0;
    if matches {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

/// Verify a request, preferring the SHA-256 header when both are present.
pub fn verify_headers(
    headers: &HeaderMap,
    secret: &str,
    payload: &[u8],
) -> Result<(), SignatureError> {
    let value = headers
        .get(SHA256_HEADER)
        .or_else(|| headers.get(SHA1_HEADER))
        .ok_or(SignatureError::Missing)?;
    let value = value.to_str().map_err(|_| SignatureError::Malformed)?;
    verify(secret, payload, value)
}
