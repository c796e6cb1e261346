//! Admin credential extraction and verification.
//!
//! A credential is an opaque bearer token presented either in the admin
//! cookie or in an `Authorization: Bearer` header. The gate never inspects
//! it; a [`TokenVerifier`] decides.

use anyhow::{Context, Result, bail};

/// Decides whether a presented bearer token is valid.
///
/// Called at most once per request. An `Err` is treated as an invalid token.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<bool>;
}

/// Verifies tokens against a configured BLAKE3 digest.
///
/// Only the digest is stored, so the config file never holds a usable token.
#[derive(Debug, Clone)]
pub struct BlakeTokenVerifier {
    expected: Option<[u8; 32]>,
}

impl BlakeTokenVerifier {
    /// Build from `[gate.auth] token_hash`; `None` rejects every token.
    pub fn new(token_hash: Option<&str>) -> Result<Self> {
        let expected = token_hash
            .map(|hash| {
                let bytes = hex::decode(hash.trim()).context("token_hash is not valid hex")?;
                <[u8; 32]>::try_from(bytes.as_slice())
                    .ok()
                    .context("token_hash must be a 32-byte digest")
            })
            .transpose()?;
        Ok(Self { expected })
    }

    /// Hex digest to put in `token_hash` for a given token.
    pub fn digest(token: &str) -> String {
        hex::encode(blake3::hash(token.as_bytes()).as_bytes())
    }
}

impl TokenVerifier for BlakeTokenVerifier {
    fn verify(&self, token: &str) -> Result<bool> {
        let Some(expected) = &self.expected else {
            bail!("no admin token hash configured");
        };
        let actual = blake3::hash(token.as_bytes());
        Ok(constant_time_eq(actual.as_bytes(), expected))
    }
}

fn constant_time_eq(a: &[u8; 32], b: &[u8; 32]) -> bool {
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Pull the bearer token out of request headers.
///
/// The cookie wins over the `Authorization` header. Empty values count as
/// absent.
pub fn extract_credential(
    cookie_header: Option<&str>,
    authorization: Option<&str>,
    cookie_name: &str,
) -> Option<String> {
    cookie_header
        .and_then(|header| cookie_value(header, cookie_name))
        .or_else(|| authorization.and_then(bearer_token))
        .filter(|token| !token.is_empty())
}

fn cookie_value(header: &str, name: &str) -> Option<String> {
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key.trim() == name).then(|| {
            let value = value.trim().trim_matches('"');
            urlencoding::decode(value)
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| value.to_owned())
        })
    })
}

fn bearer_token(header: &str) -> Option<String> {
    let (scheme, token) = header.trim().split_once(' ')?;
    scheme
        .eq_ignore_ascii_case("bearer")
        .then(|| token.trim().to_owned())
}

/// `Set-Cookie` value that removes the admin cookie.
pub fn clear_cookie(cookie_name: &str) -> String {
    format!("{cookie_name}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax")
}
