//! Google service-account authentication with an explicit token cache.
//!
//! # Purpose
//! The warehouse and document-store clients authenticate to Google APIs by
//! signing a short-lived RS256 assertion with the service-account key and
//! exchanging it for an OAuth access token. Tokens are reused until shortly
//! before expiry through [`TokenCache`], an explicit expiry-stamped cache
//! owned by each client rather than a module-level global -- concurrent
//! requests may redundantly refresh, which is harmless.
//!
//! # Security boundary
//! Credential material (key JSON, signed assertions, access tokens) never
//! appears in logs or error messages beyond upstream status text.
use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Refresh this long before the reported expiry to absorb clock skew.
const EXPIRY_SKEW: Duration = Duration::from_secs(60);

/// Assertion lifetime requested from the token endpoint.
const ASSERTION_TTL_SECS: i64 = 3600;

const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

/// Service-account key material, parsed from raw or base64-encoded JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[allow(dead_code)]
    pub project_id: Option<String>,
}

/// Accepts either raw JSON or (URL-safe or standard) base64-encoded JSON.
/// Deployment tooling hands credentials over in both shapes.
pub fn decode_credentials(credentials: &str) -> Result<ServiceAccountKey> {
    let trimmed = credentials.trim();
    if trimmed.starts_with('{') {
        return serde_json::from_str(trimmed).with_context(|| "parse service account json");
    }

    let mut cleaned: String = trimmed
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    let padding = cleaned.len() % 4;
    if padding != 0 {
        cleaned.extend(std::iter::repeat('=').take(4 - padding));
    }

    let decoded = STANDARD
        .decode(cleaned.as_bytes())
        .with_context(|| "base64-decode service account credentials")?;
    serde_json::from_slice(&decoded).with_context(|| "parse decoded service account json")
}

/// Expiry-stamped access-token cache.
#[derive(Debug, Default)]
pub struct TokenCache {
    entry: Mutex<Option<CachedToken>>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: Instant,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached token if it is still comfortably inside its
    /// lifetime.
    pub async fn get(&self) -> Option<String> {
        let entry = self.entry.lock().await;
        entry
            .as_ref()
            .filter(|cached| cached.expires_at > Instant::now() + EXPIRY_SKEW)
            .map(|cached| cached.token.clone())
    }

    pub async fn put(&self, token: String, ttl: Duration) {
        self.put_with_expiry(token, Instant::now() + ttl).await;
    }

    pub async fn put_with_expiry(&self, token: String, expires_at: Instant) {
        *self.entry.lock().await = Some(CachedToken { token, expires_at });
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

/// Authenticator for one Google API scope, owning its token cache.
pub struct GoogleAuth {
    client: reqwest::Client,
    key: ServiceAccountKey,
    scope: String,
    cache: TokenCache,
}

impl GoogleAuth {
    pub fn new(client: reqwest::Client, key: ServiceAccountKey, scope: &str) -> Self {
        Self {
            client,
            key,
            scope: scope.to_string(),
            cache: TokenCache::new(),
        }
    }

    /// Returns a valid access token, minting a fresh one when the cache is
    /// empty or near expiry.
    pub async fn access_token(&self) -> Result<String> {
        if let Some(token) = self.cache.get().await {
            return Ok(token);
        }

        let assertion = self.sign_assertion()?;
        let response = self
            .client
            .post(TOKEN_ENDPOINT)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await
            .with_context(|| "request access token")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("token exchange failed: {status} - {body}");
        }

        let token: TokenResponse = response
            .json()
            .await
            .with_context(|| "parse token response")?;
        self.cache
            .put(
                token.access_token.clone(),
                Duration::from_secs(token.expires_in),
            )
            .await;
        Ok(token.access_token)
    }

    fn sign_assertion(&self) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: &self.scope,
            aud: TOKEN_ENDPOINT,
            iat: now,
            exp: now + ASSERTION_TTL_SECS,
        };
        let encoding_key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())
            .with_context(|| "parse service account private key")?;
        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &encoding_key)
            .with_context(|| "sign token assertion")
    }
}
