//! # contract: shared data model and collaborator interfaces
//!
//! This module defines the plain data types that flow through one report
//! workflow session (inputs, articles, requests, generated reports) and the
//! traits for everything the workflow talks to but does not own:
//!
//! - [`NewsSource`]: resolves a location + lookback window into candidate articles.
//! - [`ReportGenerator`]: turns a [`ReportRequest`] into a [`ReportResult`].
//! - [`Clipboard`]: receives share-ready text.
//! - [`RenderTarget`]: produces the raster that the PDF exporter embeds.
//!
//! ## Mocking & Testing
//! - Every trait is annotated for `mockall` so the controller can be driven
//!   deterministically in tests (`MockNewsSource`, `MockReportGenerator`, ...).
//!
//! ## Wire format
//! - Field names follow the backend's JSON contract (`use_llm`, `image_base64`,
//!   `generated_at`, `report`), renamed where the Rust side reads better.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use image::RgbImage;
use mockall::automock;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Smallest accepted lookback window, in hours.
pub const MIN_HOURS: u32 = 1;
/// Largest accepted lookback window, in hours.
pub const MAX_HOURS: u32 = 72;

/// Clamp any user-supplied lookback into `[MIN_HOURS, MAX_HOURS]`.
pub fn clamp_hours(raw: i64) -> u32 {
    raw.clamp(MIN_HOURS as i64, MAX_HOURS as i64) as u32
}

/// Source attribution of an article: either `{ "name": ... }` or a bare string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArticleSource {
    Plain(String),
    Named {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(default)]
        name: Option<String>,
    },
}

/// A candidate news article as returned by the backend.
///
/// Identity is positional within one retrieval batch. Every field the backend
/// sent is kept (`extra`) so the same object can be submitted back verbatim.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Article {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ArticleSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Article {
    pub fn display_title(&self) -> &str {
        match self.title.as_deref() {
            Some(t) if !t.trim().is_empty() => t,
            _ => "Untitled",
        }
    }

    /// `source.name`, or the bare `source` string.
    pub fn source_name(&self) -> Option<&str> {
        match self.source.as_ref()? {
            ArticleSource::Plain(s) => Some(s.as_str()),
            ArticleSource::Named { name, .. } => name.as_deref(),
        }
    }
}

/// The operator's inputs for one workflow session.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowInput {
    pub location: String,
    hours: u32,
    pub use_llm: bool,
    pub model: String,
    pub image_base64: Option<String>,
}

impl WorkflowInput {
    pub fn new(location: impl Into<String>, hours: i64, use_llm: bool, model: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            hours: clamp_hours(hours),
            use_llm,
            model: model.into(),
            image_base64: None,
        }
    }

    pub fn hours(&self) -> u32 {
        self.hours
    }

    /// Out-of-range values are clamped, never stored.
    pub fn set_hours(&mut self, raw: i64) {
        self.hours = clamp_hours(raw);
    }
}

/// Body of `POST /news`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewsQuery<'a> {
    pub query: &'a str,
    pub hours: u32,
}

/// Body of `POST /report`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRequest {
    pub location: String,
    pub hours: u32,
    pub use_llm: bool,
    pub model: String,
    pub image_base64: Option<String>,
    pub articles: Vec<Article>,
}

impl ReportRequest {
    pub fn new(input: &WorkflowInput, articles: Vec<Article>) -> Self {
        Self {
            location: input.location.trim().to_string(),
            hours: clamp_hours(input.hours() as i64),
            use_llm: input.use_llm,
            model: input.model.clone(),
            image_base64: input.image_base64.clone(),
            articles,
        }
    }
}

/// A generated report. Replaced wholesale by the next successful generation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReportResult {
    pub location: String,
    pub hours: u32,
    #[serde(deserialize_with = "deserialize_generated_at")]
    pub generated_at: DateTime<Utc>,
    #[serde(rename = "report")]
    pub report_text: String,
}

/// Accepts RFC 3339, or a naive ISO-8601 timestamp (no offset) taken as UTC.
pub fn parse_generated_at(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

fn deserialize_generated_at<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_generated_at(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid generated_at timestamp: {raw}")))
}

/// What happened to a completion handed back to its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    Failed,
    /// The ticket was superseded; nothing changed.
    Discarded,
}

/// Classified failure of a report generation round trip.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Transport failed before any HTTP status was received.
    #[error("backend unreachable at {endpoint}: {detail}")]
    Unreachable { endpoint: String, detail: String },

    /// The configured request timeout elapsed.
    #[error("backend at {endpoint} did not answer in time")]
    TimedOut { endpoint: String },

    /// The backend answered with a non-success status.
    #[error("backend rejected the request with HTTP {status}: {detail}")]
    Rejected { status: u16, detail: String },

    /// The backend answered 2xx but the body was not a report.
    #[error("backend returned an unreadable report: {0}")]
    Decode(String),

    /// A submission is already outstanding.
    #[error("a report submission is already in progress")]
    Busy,

    #[error("location must not be empty")]
    EmptyLocation,
}

impl ReportError {
    /// The message shown to the operator. Server detail is never included.
    pub fn user_message(&self) -> String {
        match self {
            ReportError::Unreachable { endpoint, .. } | ReportError::TimedOut { endpoint } => format!(
                "Could not reach the report service at {endpoint}. Make sure the backend is running and the API URL is configured correctly."
            ),
            ReportError::Rejected { .. } | ReportError::Decode(_) => {
                "The report service failed to generate a report. Please try again, or turn off LLM generation.".to_string()
            }
            ReportError::Busy => "A report is already being generated.".to_string(),
            ReportError::EmptyLocation => "Please enter a location (City, Country).".to_string(),
        }
    }
}

/// Failure of an export operation.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("DOCX packaging failed: {0}")]
    Docx(String),

    #[error("clipboard unavailable: {0}")]
    Clipboard(String),
}

/// Resolves a free-text location and lookback into candidate articles.
///
/// Implementations never fail: any transport or status problem yields an empty list.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait NewsSource: Send + Sync {
    async fn fetch_news(&self, query: &str, hours: u32) -> Vec<Article>;
}

/// Produces a report for a submission.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ReportGenerator: Send + Sync {
    async fn generate_report(&self, request: &ReportRequest) -> Result<ReportResult, ReportError>;
}

/// Destination for share text.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait Clipboard {
    fn set_text(&self, text: &str) -> Result<(), ExportError>;
}

/// Something that can be rasterized for PDF export.
///
/// `scale` is the supersampling factor. `None` means there is nothing to capture.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait RenderTarget {
    fn capture(&self, scale: u32) -> Option<RgbImage>;
}
