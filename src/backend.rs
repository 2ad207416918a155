#![doc = "HTTP client for the report backend: news retrieval, report generation, health and defaults."]
//
//! # Backend client
//!
//! [`HttpBackend`] is the production implementation of [`NewsSource`] and
//! [`ReportGenerator`]. It is constructed from an explicit [`ReporterConfig`];
//! the base address is never read from the environment here.
//!
//! - `POST /news`: failures of any kind degrade to "no articles".
//! - `POST /report`: failures are classified into [`ReportError`] variants.
//! - `GET /health`, `GET /config`: used by the binary and to seed form defaults.
//!
//! Every request is bounded by `request_timeout_secs`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::config::ReporterConfig;
use crate::contract::{Article, NewsQuery, NewsSource, ReportError, ReportGenerator, ReportRequest, ReportResult};

#[derive(Deserialize)]
struct NewsResponse {
    #[serde(default)]
    articles: Option<Vec<Article>>,
}

#[derive(Deserialize)]
struct HealthResponse {
    status: String,
}

/// Form defaults advertised by the backend at `GET /config`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BackendDefaults {
    pub default_location: Option<String>,
    pub default_window_hours: Option<i64>,
    #[serde(default)]
    pub llm_provider: Option<String>,
    pub use_llm: Option<bool>,
    pub model: Option<String>,
}

#[derive(Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(config: &ReporterConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        let base_url = config.api_url.trim_end_matches('/').to_string();
        info!(
            api_url = %base_url,
            timeout_secs = config.request_timeout_secs,
            "Initialized backend client"
        );
        Ok(Self { client, base_url })
    }

    /// The configured base address, as shown in unreachable-backend messages.
    pub fn endpoint(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `true` only when the backend answers `{"status": "ok"}`.
    pub async fn health(&self) -> bool {
        let resp = match self.client.get(self.url("/health")).send().await {
            Ok(resp) if resp.status().is_success() => resp,
            Ok(resp) => {
                warn!(status = %resp.status(), "Health check returned non-success status");
                return false;
            }
            Err(e) => {
                warn!(error = %e, endpoint = %self.base_url, "Health check failed");
                return false;
            }
        };
        match resp.json::<HealthResponse>().await {
            Ok(body) => body.status == "ok",
            Err(e) => {
                warn!(error = %e, "Health check body unreadable");
                false
            }
        }
    }

    /// Backend-advertised form defaults, or `None` when unavailable.
    pub async fn defaults(&self) -> Option<BackendDefaults> {
        let resp = match self.client.get(self.url("/config")).send().await {
            Ok(resp) if resp.status().is_success() => resp,
            Ok(resp) => {
                warn!(status = %resp.status(), "Backend defaults request returned non-success status");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Backend defaults request failed");
                return None;
            }
        };
        match resp.json::<BackendDefaults>().await {
            Ok(defaults) => {
                debug!(?defaults, "Fetched backend defaults");
                Some(defaults)
            }
            Err(e) => {
                warn!(error = %e, "Backend defaults body unreadable");
                None
            }
        }
    }

    fn classify_transport(&self, e: reqwest::Error) -> ReportError {
        if e.is_timeout() {
            ReportError::TimedOut {
                endpoint: self.base_url.clone(),
            }
        } else {
            ReportError::Unreachable {
                endpoint: self.base_url.clone(),
                detail: e.to_string(),
            }
        }
    }
}

/// Pulls FastAPI's `{"detail": ...}` out of an error body when present.
fn error_detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("detail").map(|d| match d {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }))
        .unwrap_or_else(|| body.to_string())
}

#[async_trait]
impl NewsSource for HttpBackend {
    async fn fetch_news(&self, query: &str, hours: u32) -> Vec<Article> {
        info!(query, hours, "Fetching news");
        let body = NewsQuery { query, hours };
        let resp = match self.client.post(self.url("/news")).json(&body).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(error = %e, endpoint = %self.base_url, "News retrieval failed; continuing without articles");
                return Vec::new();
            }
        };
        if !resp.status().is_success() {
            warn!(status = %resp.status(), "News retrieval returned non-success status; continuing without articles");
            return Vec::new();
        }
        match resp.json::<NewsResponse>().await {
            Ok(body) => {
                let articles = body.articles.unwrap_or_default();
                info!(count = articles.len(), "News retrieved");
                articles
            }
            Err(e) => {
                warn!(error = %e, "News response unreadable; continuing without articles");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl ReportGenerator for HttpBackend {
    async fn generate_report(&self, request: &ReportRequest) -> Result<ReportResult, ReportError> {
        info!(
            location = %request.location,
            hours = request.hours,
            use_llm = request.use_llm,
            model = %request.model,
            articles = request.articles.len(),
            has_image = request.image_base64.is_some(),
            "Requesting report generation"
        );
        let resp = self
            .client
            .post(self.url("/report"))
            .json(request)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, endpoint = %self.base_url, "Report request could not be delivered");
                self.classify_transport(e)
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let detail = error_detail(&body);
            error!(status = status.as_u16(), detail = %detail, "Report generation rejected by backend");
            return Err(ReportError::Rejected {
                status: status.as_u16(),
                detail,
            });
        }

        let body = resp.text().await.map_err(|e| {
            error!(error = %e, "Failed to read report response body");
            self.classify_transport(e)
        })?;
        let result: ReportResult = serde_json::from_str(&body).map_err(|e| {
            error!(error = %e, "Report response was not a valid report");
            ReportError::Decode(e.to_string())
        })?;
        info!(
            location = %result.location,
            generated_at = %result.generated_at,
            chars = result.report_text.len(),
            "Report received"
        );
        Ok(result)
    }
}
