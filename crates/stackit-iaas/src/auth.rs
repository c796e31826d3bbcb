//! Service-account key flow.
//!
//! A service-account key carries an RSA private key. The client signs a
//! short-lived JWT assertion with it and trades the assertion for an access
//! token at the token endpoint. Access tokens are cached until shortly
//! before they expire.

use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::{Error, Result};

const GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 600;
/// Refresh this many seconds before the reported expiry.
const EXPIRY_LEEWAY_SECS: i64 = 60;

/// Service-account key as downloaded from the STACKIT portal.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAccountKey {
    pub id: String,
    #[serde(default)]
    pub public_key: Option<String>,
    pub credentials: KeyCredentials,
}

#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyCredentials {
    pub kid: String,
    pub iss: String,
    pub sub: String,
    pub aud: String,
    #[serde(default)]
    pub private_key: Option<String>,
}

impl std::fmt::Debug for KeyCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyCredentials")
            .field("kid", &self.kid)
            .field("iss", &self.iss)
            .field("sub", &self.sub)
            .field("aud", &self.aud)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl ServiceAccountKey {
    /// Parse a key from its JSON form. Unknown fields are ignored.
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(Error::InvalidServiceAccountKey)
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    sub: &'a str,
    aud: &'a str,
    jti: String,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: i64,
}

/// Produces bearer tokens for a single service-account key.
pub(crate) struct KeyFlow {
    credentials: KeyCredentials,
    signing_key: EncodingKey,
    token_endpoint: String,
    http: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

impl KeyFlow {
    /// Validates the key material up front so a bad key fails at
    /// construction instead of on the first request.
    pub(crate) fn new(
        key: ServiceAccountKey,
        token_endpoint: String,
        http: reqwest::Client,
    ) -> Result<Self> {
        let pem = key
            .credentials
            .private_key
            .as_deref()
            .ok_or(Error::MissingPrivateKey)?;
        let signing_key =
            EncodingKey::from_rsa_pem(pem.as_bytes()).map_err(Error::InvalidPrivateKey)?;

        Ok(Self {
            credentials: key.credentials,
            signing_key,
            token_endpoint,
            http,
            cached: Mutex::new(None),
        })
    }

    /// Return a valid access token, exchanging a fresh assertion if needed.
    pub(crate) async fn access_token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;
        let now = Utc::now().timestamp();

        if let Some(token) = cached.as_ref() {
            if token.expires_at - EXPIRY_LEEWAY_SECS > now {
                return Ok(token.value.clone());
            }
        }

        let token = self.exchange(now).await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    fn assertion(&self, now: i64) -> Result<String> {
        let mut header = Header::new(Algorithm::RS512);
        header.kid = Some(self.credentials.kid.clone());

        let claims = AssertionClaims {
            iss: &self.credentials.iss,
            sub: &self.credentials.sub,
            aud: &self.credentials.aud,
            jti: uuid::Uuid::new_v4().to_string(),
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };

        jsonwebtoken::encode(&header, &claims, &self.signing_key)
            .map_err(|e| Error::Token(format!("sign assertion: {e}")))
    }

    async fn exchange(&self, now: i64) -> Result<CachedToken> {
        let assertion = self.assertion(now)?;

        let resp = self
            .http
            .post(&self.token_endpoint)
            .form(&[("grant_type", GRANT_TYPE), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Token(format!("token endpoint returned {status}: {body}")));
        }

        let token: TokenResponse = resp.json().await?;
        let expires_at = expiry(now, token.expires_in);

        debug!(kid = %self.credentials.kid, expires_at, "stackit: access token refreshed");

        Ok(CachedToken {
            value: token.access_token,
            expires_at,
        })
    }
}

/// Absolute expiry for a token issued at `now`. Saturates on absurd
/// `expires_in` values from the token endpoint.
fn expiry(now: i64, expires_in: Option<i64>) -> i64 {
    now.saturating_add(expires_in.unwrap_or(ASSERTION_LIFETIME_SECS))
}
