use crate::utils::error::{BotError, Result};
use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;
use tokio::sync::Mutex;

use super::USER_AGENT;

/// App JWTs are valid for 10 minutes, per GitHub's limit.
const JWT_TTL_SECS: i64 = 600;
/// Cached credentials are refreshed this many seconds before they expire.
const REFRESH_MARGIN_SECS: i64 = 60;

#[derive(Debug, Serialize)]
struct AppClaims {
    iat: i64,
    exp: i64,
    iss: String,
}

#[derive(Debug, Clone)]
struct CachedSecret {
    value: String,
    expires_at: i64,
}

impl CachedSecret {
    fn usable_at(&self, now: i64) -> bool {
        now < self.expires_at - REFRESH_MARGIN_SECS
    }
}

/// GitHub App authentication: a signed app JWT exchanged for a short-lived
/// installation access token. Both are cached until shortly before expiry.
pub struct AppAuth {
    app_id: String,
    encoding_key: EncodingKey,
    jwt_cache: Mutex<Option<CachedSecret>>,
    token_cache: Mutex<Option<CachedSecret>>,
}

impl AppAuth {
    pub fn new(app_id: impl Into<String>, private_key_pem: &str) -> Result<Self> {
        let encoding_key =
            EncodingKey::from_rsa_pem(private_key_pem.as_bytes()).map_err(|_| BotError::AuthError {
                message: "invalid GitHub App private key: failed to parse RSA PEM".to_string(),
            })?;

        Ok(Self {
            app_id: app_id.into(),
            encoding_key,
            jwt_cache: Mutex::new(None),
            token_cache: Mutex::new(None),
        })
    }

    /// A signed app JWT, minted fresh when the cached one nears expiry.
    pub async fn jwt(&self) -> Result<String> {
        let now = Utc::now().timestamp();
        let mut cache = self.jwt_cache.lock().await;

        if let Some(cached) = cache.as_ref() {
            if cached.usable_at(now) {
                return Ok(cached.value.clone());
            }
        }

        let claims = AppClaims {
            iat: now,
            exp: now + JWT_TTL_SECS,
            iss: self.app_id.clone(),
        };
        let token = encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)?;

        *cache = Some(CachedSecret {
            value: token.clone(),
            expires_at: now + JWT_TTL_SECS,
        });

        Ok(token)
    }

    /// An installation access token, exchanged through the installations API
    /// when the cached one nears expiry.
    pub async fn installation_token(
        &self,
        http: &reqwest::Client,
        api_base: &str,
        installation_id: &str,
    ) -> Result<String> {
        let now = Utc::now().timestamp();
        let mut cache = self.token_cache.lock().await;

        if let Some(cached) = cache.as_ref() {
            if cached.usable_at(now) {
                return Ok(cached.value.clone());
            }
        }

        let jwt = self.jwt().await?;
        let url = format!(
            "{}/app/installations/{}/access_tokens",
            api_base.trim_end_matches('/'),
            installation_id
        );

        tracing::debug!("Requesting installation token for {}", installation_id);
        let response = http
            .post(&url)
            .bearer_auth(&jwt)
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", USER_AGENT)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(BotError::AuthError {
                message: format!(
                    "failed to create installation token (HTTP {}): {}",
                    status, body
                ),
            });
        }

        let data: serde_json::Value = response.json().await?;
        let token = data["token"]
            .as_str()
            .ok_or_else(|| BotError::AuthError {
                message: "no token in installation response".to_string(),
            })?
            .to_string();
        let expires_at = data["expires_at"]
            .as_str()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|t| t.timestamp())
            .ok_or_else(|| BotError::AuthError {
                message: "no parseable expires_at in installation response".to_string(),
            })?;

        *cache = Some(CachedSecret {
            value: token.clone(),
            expires_at,
        });

        tracing::debug!("Installation token obtained");
        Ok(token)
    }
}
