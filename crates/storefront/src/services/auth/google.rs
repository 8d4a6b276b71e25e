//! Google ID token verification.
//!
//! Tokens are RS256-signed by Google. Signing keys come from Google's JWKS
//! endpoint and are cached for one hour.

use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use moka::future::Cache;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::GoogleAuthError;
use crate::config::GoogleConfig;

const GOOGLE_CERTS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";
const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];
const JWKS_CACHE_KEY: &str = "google";

/// Claims read from a verified Google ID token.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleClaims {
    pub sub: String,
    pub email: Option<String>,
    #[serde(default)]
    pub given_name: String,
    #[serde(default)]
    pub family_name: String,
    pub picture: Option<String>,
}

/// Verifies Google ID tokens for the configured OAuth client.
#[derive(Clone)]
pub struct GoogleVerifier {
    inner: Arc<GoogleVerifierInner>,
}

struct GoogleVerifierInner {
    client: reqwest::Client,
    client_id: Option<String>,
    keys: Cache<&'static str, Arc<JwkSet>>,
}

impl GoogleVerifier {
    #[must_use]
    pub fn new(config: &GoogleConfig) -> Self {
        let keys = Cache::builder()
            .max_capacity(1)
            .time_to_live(Duration::from_secs(3600))
            .build();

        Self {
            inner: Arc::new(GoogleVerifierInner {
                client: reqwest::Client::new(),
                client_id: config.client_id.clone(),
                keys,
            }),
        }
    }

    /// The OAuth client ID, when sign-in is enabled.
    #[must_use]
    pub fn client_id(&self) -> Option<&str> {
        self.inner.client_id.as_deref()
    }

    /// Verify `id_token` and return its claims.
    ///
    /// # Errors
    ///
    /// Returns `GoogleAuthError` if sign-in is disabled, the keys cannot be
    /// fetched, or the token fails signature, audience, issuer or expiry checks.
    #[instrument(skip_all)]
    pub async fn verify(&self, id_token: &str) -> Result<GoogleClaims, GoogleAuthError> {
        let client_id = self.client_id().ok_or(GoogleAuthError::NotConfigured)?;

        let header = decode_header(id_token)?;
        let kid = header.kid.ok_or(GoogleAuthError::MissingKeyId)?;

        let jwks = self.signing_keys().await?;
        let jwk = jwks
            .find(&kid)
            .ok_or_else(|| GoogleAuthError::UnknownKey(kid.clone()))?;
        let key = DecodingKey::from_jwk(jwk)?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[client_id]);
        validation.set_issuer(&GOOGLE_ISSUERS);

        let claims = decode::<GoogleClaims>(id_token, &key, &validation)?.claims;
        debug!(sub = %claims.sub, "Google ID token verified");
        Ok(claims)
    }

    async fn signing_keys(&self) -> Result<Arc<JwkSet>, GoogleAuthError> {
        let client = self.inner.client.clone();
        self.inner
            .keys
            .try_get_with(JWKS_CACHE_KEY, async move {
                let jwks = client
                    .get(GOOGLE_CERTS_URL)
                    .send()
                    .await?
                    .error_for_status()?
                    .json::<JwkSet>()
                    .await?;
                Ok::<_, reqwest::Error>(Arc::new(jwks))
            })
            .await
            .map_err(|e| GoogleAuthError::Jwks(e.to_string()))
    }
}
