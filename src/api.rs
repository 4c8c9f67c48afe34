//! HTTP client for the three outbound case-management operations.
//!
//! Every call obtains a bearer token from the [`TokenManager`] and carries a
//! per-operation timeout. A single 401 triggers one token refresh and one
//! retry of the identical request; a second 401 is terminal for the call.
//! Timeouts and 5xx responses are never retried — the registration call is
//! not idempotent.

use crate::auth::TokenManager;
use crate::catalog::{CatalogIndex, CatalogsResponse};
use crate::config::{ApiUrls, Config};
use crate::error::{MigrateError, Result};
use crate::types::{NoveltyReceipt, NoveltyRequest, NoveltyResponse, Person, PersonResponse};
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Copy)]
struct Timeouts {
    default: Duration,
    register: Duration,
    catalogs: Duration,
}

pub struct ApiClient {
    http: reqwest::Client,
    auth: TokenManager,
    urls: ApiUrls,
    timeouts: Timeouts,
}

impl ApiClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            auth: TokenManager::new(config.auth.clone()),
            urls: config.api.urls(),
            timeouts: Timeouts {
                default: config.api.timeout.default_timeout(),
                register: config.api.timeout.register_timeout(),
                catalogs: config.api.timeout.catalogs_timeout(),
            },
        }
    }

    pub fn auth(&self) -> &TokenManager {
        &self.auth
    }

    pub fn auth_mut(&mut self) -> &mut TokenManager {
        &mut self.auth
    }

    /// Looks up a person by document. `None` is a valid business outcome,
    /// not an error.
    #[instrument(skip(self))]
    pub async fn find_person(
        &mut self,
        document_type: &str,
        document_number: &str,
    ) -> Result<Option<Person>> {
        let payload = serde_json::json!({
            "validateEmployee": false,
            "documentType": document_type,
            "documentNumber": document_number,
        });
        let url = self.urls.find_person.clone();
        let timeout = self.timeouts.default;

        let response = self
            .send_with_reauth(|http, token| {
                http.post(&url).bearer_auth(token).json(&payload).timeout(timeout)
            })
            .await?;

        let body: PersonResponse = response.json().await?;
        debug!(found = body.data.is_some(), "person lookup completed");
        Ok(body.data)
    }

    /// Fetches the full catalog taxonomy. Called once per run, before the
    /// record loop starts.
    #[instrument(skip(self))]
    pub async fn fetch_catalogs(&mut self) -> Result<CatalogIndex> {
        let url = self.urls.catalogs.clone();
        let timeout = self.timeouts.catalogs;

        let response = self
            .send_with_reauth(|http, token| http.get(&url).bearer_auth(token).timeout(timeout))
            .await?;

        let body: CatalogsResponse = response.json().await?;
        info!(catalog_types = body.data.len(), "catalog snapshot loaded");
        Ok(CatalogIndex::new(body.data))
    }

    /// Submits one registration. A non-empty `observation` in an otherwise
    /// successful response surfaces as `BusinessRejection`.
    #[instrument(skip(self, request))]
    pub async fn register_novelty(&mut self, request: &NoveltyRequest) -> Result<NoveltyReceipt> {
        let url = self.urls.register.clone();
        let timeout = self.timeouts.register;

        let response = self
            .send_with_reauth(|http, token| {
                http.post(&url).bearer_auth(token).json(request).timeout(timeout)
            })
            .await?;

        let body: NoveltyResponse = response.json().await?;
        if let Some(observation) = body.data.observation.filter(|o| !o.is_empty()) {
            return Err(MigrateError::BusinessRejection { observation });
        }

        Ok(NoveltyReceipt {
            novelty_code: body
                .data
                .novelty_code
                .map(|code| code.to_string())
                .unwrap_or_default(),
        })
    }

    /// Sends a bearer-authenticated request with one-shot 401 recovery: on
    /// 401 the token cache is cleared, a fresh token fetched, and the
    /// identical request re-issued exactly once.
    async fn send_with_reauth<F>(&mut self, build: F) -> Result<reqwest::Response>
    where
        F: Fn(&reqwest::Client, &str) -> reqwest::RequestBuilder,
    {
        let token = self.auth.get_token().await?;
        let mut response = build(&self.http, &token).send().await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            warn!("request rejected with 401; refreshing token and retrying once");
            self.auth.clear_token();
            let fresh = self.auth.get_token().await?;
            response = build(&self.http, &fresh).send().await?;
            if response.status() == StatusCode::UNAUTHORIZED {
                return Err(MigrateError::AuthRetryExhausted);
            }
        }

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(MigrateError::Api { status, body });
        }
        Ok(response)
    }
}
