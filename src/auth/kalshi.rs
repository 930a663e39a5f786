//! Kalshi API authentication using RSA PKCS#1 v1.5 signatures.
//!
//! The private key arrives base64-encoded in `KALSHI_PRIVATE_KEY_B64` so the
//! whole credential set can live in the environment with no key file on disk.

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use pkcs1::DecodeRsaPrivateKey;
use rsa::{
    pkcs1v15::SigningKey,
    pkcs8::DecodePrivateKey,
    sha2::Sha256,
    signature::{RandomizedSigner, SignatureEncoding},
    RsaPrivateKey,
};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::types::{AuthCmd, AuthPayload};

/// Kalshi API credentials
#[derive(Clone)]
pub struct KalshiAuth {
    pub api_key: String,
    pub key_id: String,
    private_key: RsaPrivateKey,
}

impl KalshiAuth {
    /// Load credentials from the environment:
    /// `KALSHI_API_KEY`, `KALSHI_KEY_ID`, `KALSHI_PRIVATE_KEY_B64`.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let api_key = std::env::var("KALSHI_API_KEY").context("KALSHI_API_KEY is not set")?;
        let key_id = std::env::var("KALSHI_KEY_ID").context("KALSHI_KEY_ID is not set")?;
        let key_b64 =
            std::env::var("KALSHI_PRIVATE_KEY_B64").context("KALSHI_PRIVATE_KEY_B64 is not set")?;

        let key_bytes = BASE64
            .decode(key_b64.trim())
            .context("KALSHI_PRIVATE_KEY_B64 is not valid base64")?;
        let pem = String::from_utf8(key_bytes)
            .context("Decoded private key is not valid UTF-8 PEM")?;

        Ok(Self {
            api_key,
            key_id,
            private_key: parse_private_key_pem(&pem)?,
        })
    }

    /// Sign a message with RSA PKCS#1 v1.5 + SHA-256, returning base64.
    pub fn sign(&self, message: &str) -> Result<String> {
        let signing_key = SigningKey::<Sha256>::new(self.private_key.clone());
        let signature = signing_key.sign_with_rng(&mut rand::thread_rng(), message.as_bytes());
        Ok(BASE64.encode(signature.to_bytes()))
    }

    /// Current timestamp in milliseconds
    #[inline]
    pub fn timestamp_ms() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_millis() as u64
    }

    /// Sign a REST API request.
    ///
    /// Message format: `{timestamp_ms}{METHOD}{path}` where the path always
    /// carries the `/trade-api/v2` prefix and never the query string.
    ///
    /// Returns: (signature, timestamp_string)
    pub fn sign_request(&self, method: &str, path: &str) -> Result<(String, String)> {
        let timestamp = Self::timestamp_ms();
        let timestamp_str = timestamp.to_string();

        let message = format!("{}{}{}", timestamp, method, signing_path(path));
        let signature = self.sign(&message)?;

        Ok((signature, timestamp_str))
    }

    /// Build the auth command sent as the first frame on the trade socket.
    ///
    /// The socket authenticates by message, with the signature covering
    /// `{timestamp_ms}{api_key}`.
    pub fn ws_auth_payload(&self) -> Result<AuthCmd> {
        let timestamp = Self::timestamp_ms().to_string();
        let message = format!("{}{}", timestamp, self.api_key);
        let signature = self.sign(&message)?;

        Ok(AuthCmd {
            cmd_type: "auth",
            data: AuthPayload {
                id: self.key_id.clone(),
                timestamp,
                signature,
                api_key: self.api_key.clone(),
            },
        })
    }
}

/// Normalize a request path for signing: strip the query string and guarantee
/// the `/trade-api/v2` prefix (API requirement).
fn signing_path(path: &str) -> String {
    let path_without_query = path.split('?').next().unwrap_or(path);
    if path_without_query.starts_with("/trade-api/v2") {
        path_without_query.to_string()
    } else {
        format!("/trade-api/v2{}", path_without_query)
    }
}

/// Parse a PEM private key, accepting both PKCS#8 and PKCS#1 encodings.
fn parse_private_key_pem(pem: &str) -> Result<RsaPrivateKey> {
    let pem = pem.trim();
    RsaPrivateKey::from_pkcs8_pem(pem)
        .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
        .context("Failed to parse RSA private key PEM (tried PKCS#8 and PKCS#1)")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signing_path_adds_prefix() {
        assert_eq!(
            signing_path("/portfolio/orders"),
            "/trade-api/v2/portfolio/orders"
        );
    }

    #[test]
    fn test_signing_path_keeps_existing_prefix() {
        assert_eq!(
            signing_path("/trade-api/v2/portfolio/balance"),
            "/trade-api/v2/portfolio/balance"
        );
    }

    #[test]
    fn test_signing_path_strips_query() {
        assert_eq!(
            signing_path("/markets?status=open&limit=200"),
            "/trade-api/v2/markets"
        );
    }
}
