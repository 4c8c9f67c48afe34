//! Bearer-token lifecycle management.
//!
//! The manager owns at most one cached token at a time. A token moves through
//! Empty → Valid → ExpiringSoon → Expired and returns to Empty on an explicit
//! clear. Expiry comes from the JWT `exp` claim, decoded without signature
//! verification (the identity endpoint sits inside the trust boundary); when
//! the payload cannot be decoded, the response's `expires_in` is the fallback.

use crate::config::AuthConfig;
use crate::error::{MigrateError, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default threshold for `is_expiring_soon`: 2 minutes.
pub const DEFAULT_EXPIRY_THRESHOLD_MS: i64 = 120_000;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<i64>,
}

/// Decoded JWT payload; only the claims the pipeline needs.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtClaims {
    pub sub: Option<String>,
    pub iat: Option<i64>,
    pub exp: Option<i64>,
}

/// Decodes the payload segment of a JWT (base64url, no signature check).
pub fn decode_claims(token: &str) -> Option<JwtClaims> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// Pure threshold check so the boundary is testable without a clock.
pub(crate) fn expiring_soon(now_ms: i64, real_expiry_ms: Option<i64>, threshold_ms: i64) -> bool {
    match real_expiry_ms {
        Some(expiry) => now_ms > expiry - threshold_ms,
        // No expiry information means we cannot trust the token lifetime
        None => true,
    }
}

#[derive(Debug, Clone)]
struct CachedToken {
    raw: String,
    /// When `get_token` stops returning the cache and re-authenticates.
    refresh_deadline_ms: i64,
    /// JWT-derived expiry; absent when the payload could not be decoded.
    real_expiry_ms: Option<i64>,
    subject: Option<String>,
    issued_at_ms: Option<i64>,
}

/// Diagnostic view of the cached token for the CLI inspection commands.
#[derive(Debug, Clone)]
pub struct TokenInfo {
    pub has_token: bool,
    pub subject: Option<String>,
    pub issued_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub refresh_at: Option<DateTime<Utc>>,
}

pub struct TokenManager {
    http: reqwest::Client,
    config: AuthConfig,
    cached: Option<CachedToken>,
}

impl TokenManager {
    pub fn new(config: AuthConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            cached: None,
        }
    }

    /// Returns the cached token while it is inside the refresh window,
    /// otherwise issues a credential-grant request to the identity endpoint.
    pub async fn get_token(&mut self) -> Result<String> {
        let now = Utc::now().timestamp_millis();
        if let Some(cached) = &self.cached {
            if now < cached.refresh_deadline_ms {
                debug!("reusing cached bearer token");
                return Ok(cached.raw.clone());
            }
        }
        self.request_token().await
    }

    async fn request_token(&mut self) -> Result<String> {
        let params = [
            ("grant_type", "password"),
            ("client_id", self.config.client_id.as_str()),
            ("username", self.config.username.as_str()),
            ("password", self.config.password.as_str()),
        ];

        let response = self
            .http
            .post(&self.config.url)
            .form(&params)
            .timeout(Duration::from_secs(self.config.request_timeout_secs))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(MigrateError::AuthFailure(format!(
                "identity endpoint returned status {}",
                response.status().as_u16()
            )));
        }

        let body: TokenResponse = response.json().await?;
        let raw = body.access_token.ok_or_else(|| {
            MigrateError::AuthFailure("identity response did not include an access token".to_string())
        })?;

        let now = Utc::now().timestamp_millis();
        let claims = decode_claims(&raw);
        let (real_expiry_ms, refresh_deadline_ms) = match claims.as_ref().and_then(|c| c.exp) {
            Some(exp) => {
                let expiry = exp * 1000;
                (Some(expiry), expiry - self.config.refresh_threshold_ms)
            }
            None => {
                warn!("could not decode JWT payload; falling back to expires_in");
                let lifetime_ms = body.expires_in.unwrap_or(0) * 1000;
                (None, now + lifetime_ms - self.config.refresh_threshold_ms)
            }
        };

        self.cached = Some(CachedToken {
            raw: raw.clone(),
            refresh_deadline_ms,
            real_expiry_ms,
            subject: claims.as_ref().and_then(|c| c.sub.clone()),
            issued_at_ms: claims.as_ref().and_then(|c| c.iat).map(|s| s * 1000),
        });
        info!("obtained new bearer token");
        Ok(raw)
    }

    pub fn is_valid(&self) -> bool {
        let now = Utc::now().timestamp_millis();
        match &self.cached {
            Some(cached) => match cached.real_expiry_ms {
                Some(expiry) => now < expiry,
                None => now < cached.refresh_deadline_ms,
            },
            None => false,
        }
    }

    pub fn is_expiring_soon(&self) -> bool {
        self.is_expiring_soon_within(DEFAULT_EXPIRY_THRESHOLD_MS)
    }

    pub fn is_expiring_soon_within(&self, threshold_ms: i64) -> bool {
        let now = Utc::now().timestamp_millis();
        match &self.cached {
            Some(cached) => expiring_soon(now, cached.real_expiry_ms, threshold_ms),
            None => true,
        }
    }

    /// Drops the cached token, forcing the next `get_token` to re-authenticate.
    pub fn clear_token(&mut self) {
        self.cached = None;
        debug!("bearer token cache cleared");
    }

    pub fn token_info(&self) -> TokenInfo {
        let to_datetime = |ms: i64| Utc.timestamp_millis_opt(ms).single();
        match &self.cached {
            Some(cached) => TokenInfo {
                has_token: true,
                subject: cached.subject.clone(),
                issued_at: cached.issued_at_ms.and_then(to_datetime),
                expires_at: cached.real_expiry_ms.and_then(to_datetime),
                refresh_at: to_datetime(cached.refresh_deadline_ms),
            },
            None => TokenInfo {
                has_token: false,
                subject: None,
                issued_at: None,
                expires_at: None,
                refresh_at: None,
            },
        }
    }

    #[cfg(test)]
    pub(crate) fn seed_for_tests(
        &mut self,
        raw: &str,
        real_expiry_ms: Option<i64>,
        refresh_deadline_ms: i64,
    ) {
        self.cached = Some(CachedToken {
            raw: raw.to_string(),
            refresh_deadline_ms,
            real_expiry_ms,
            subject: None,
            issued_at_ms: None,
        });
    }
}
