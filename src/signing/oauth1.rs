use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hmac::{Hmac, Mac};
use rand::distributions::Alphanumeric;
use rand::Rng;
use sha1::Sha1;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::PublishConfig;
use crate::error::{BotError, Result};

type HmacSha1 = Hmac<Sha1>;

/// OAuth 1.0a user-context credentials
#[derive(Debug, Clone)]
pub struct OAuthCredentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub token: String,
    pub token_secret: String,
}

impl OAuthCredentials {
    pub fn new(
        consumer_key: String,
        consumer_secret: String,
        token: String,
        token_secret: String,
    ) -> Self {
        Self {
            consumer_key,
            consumer_secret,
            token,
            token_secret,
        }
    }

    pub fn from_config(cfg: &PublishConfig) -> Self {
        Self::new(
            cfg.api_key.clone(),
            cfg.api_secret.clone(),
            cfg.access_token.clone(),
            cfg.access_token_secret.clone(),
        )
    }
}

/// HMAC-SHA1 request signer producing `Authorization: OAuth ...` headers
#[derive(Clone)]
pub struct OAuthSigner {
    credentials: OAuthCredentials,
}

impl OAuthSigner {
    pub fn new(credentials: OAuthCredentials) -> Self {
        Self { credentials }
    }

    /// Get current timestamp in seconds
    fn timestamp() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default()
    }

    fn nonce() -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect()
    }

    /// Authorization header for a request whose body is not form-encoded
    /// (JSON bodies are not part of the signature).
    pub fn authorization_header(&self, method: &str, url: &str) -> Result<String> {
        self.authorization_header_with(method, url, &[], &Self::nonce(), Self::timestamp())
    }

    /// Authorization header with explicit extra parameters, nonce and timestamp
    pub fn authorization_header_with(
        &self,
        method: &str,
        url: &str,
        extra_params: &[(&str, &str)],
        nonce: &str,
        timestamp: u64,
    ) -> Result<String> {
        let timestamp = timestamp.to_string();
        let mut oauth_params = vec![
            ("oauth_consumer_key", self.credentials.consumer_key.as_str()),
            ("oauth_nonce", nonce),
            ("oauth_signature_method", "HMAC-SHA1"),
            ("oauth_timestamp", timestamp.as_str()),
            ("oauth_token", self.credentials.token.as_str()),
            ("oauth_version", "1.0"),
        ];

        let mut all_params = oauth_params.clone();
        all_params.extend_from_slice(extra_params);

        let base = Self::signature_base(method, url, &all_params);
        let signature = self.sign(&base)?;
        oauth_params.push(("oauth_signature", signature.as_str()));

        let fields: Vec<String> = oauth_params
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
            .collect();

        Ok(format!("OAuth {}", fields.join(", ")))
    }

    /// `METHOD&encoded-url&encoded-sorted-params`
    fn signature_base(method: &str, url: &str, params: &[(&str, &str)]) -> String {
        let mut encoded: Vec<(String, String)> = params
            .iter()
            .map(|(k, v)| (encode(k), encode(v)))
            .collect();
        encoded.sort();

        let param_string = encoded
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");

        format!(
            "{}&{}&{}",
            method.to_uppercase(),
            encode(url),
            encode(&param_string)
        )
    }

    /// Create HMAC-SHA1 signature
    fn sign(&self, message: &str) -> Result<String> {
        let key = format!(
            "{}&{}",
            encode(&self.credentials.consumer_secret),
            encode(&self.credentials.token_secret)
        );

        let mut mac = HmacSha1::new_from_slice(key.as_bytes())
            .map_err(|e| BotError::Signature(format!("HMAC init failed: {}", e)))?;

        mac.update(message.as_bytes());
        let result = mac.finalize();

        Ok(BASE64.encode(result.into_bytes()))
    }
}

/// RFC 3986 percent-encoding (unreserved characters pass through)
fn encode(raw: &str) -> String {
    urlencoding::encode(raw).into_owned()
}
