use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::contract::WorkflowInput;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Runtime configuration, injected into the backend client and the workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReporterConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub defaults: InputDefaults,
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,
}

/// Initial form values for a new workflow session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputDefaults {
    pub location: String,
    pub hours: i64,
    pub use_llm: bool,
    pub model: String,
}

impl Default for InputDefaults {
    fn default() -> Self {
        Self {
            location: "Sanaa, Yemen".to_string(),
            hours: 24,
            use_llm: true,
            model: "phi3:mini".to_string(),
        }
    }
}

impl InputDefaults {
    pub fn to_input(&self) -> WorkflowInput {
        WorkflowInput::new(self.location.clone(), self.hours, self.use_llm, self.model.clone())
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_export_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            request_timeout_secs: default_timeout_secs(),
            defaults: InputDefaults::default(),
            export_dir: default_export_dir(),
        }
    }
}

impl ReporterConfig {
    pub fn trace_loaded(&self) {
        info!(
            api_url = %self.api_url,
            timeout_secs = self.request_timeout_secs,
            export_dir = %self.export_dir.display(),
            "Loaded ReporterConfig"
        );
        debug!(?self, "Config loaded (full debug)");
    }
}
