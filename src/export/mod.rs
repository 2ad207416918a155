//! Export pipeline: PDF, DOCX and share text, all read from committed report text.

pub mod docx;
pub mod pdf;
pub mod render;
pub mod share;

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tracing::{error, info};

use crate::contract::ExportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Pdf,
    Docx,
}

impl ArtifactKind {
    pub fn extension(self) -> &'static str {
        match self {
            ArtifactKind::Pdf => "pdf",
            ArtifactKind::Docx => "docx",
        }
    }
}

/// A finished export, ready to be written out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl Artifact {
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.filename);
        std::fs::write(&path, &self.bytes).map_err(|e| {
            error!(error = ?e, path = %path.display(), "Failed to write export");
            e
        })?;
        info!(path = %path.display(), size = self.bytes.len(), "Wrote export");
        Ok(path)
    }
}

fn separator() -> &'static Regex {
    static SEPARATOR: OnceLock<Regex> = OnceLock::new();
    SEPARATOR.get_or_init(|| Regex::new(r",\s*").expect("static regex"))
}

/// Replaces each comma and the spaces after it with a hyphen.
pub fn sanitize_location(location: &str) -> String {
    separator().replace_all(location.trim(), "-").into_owned()
}

/// `network-outage-report-<sanitized-location>.<ext>`
pub fn artifact_filename(location: &str, kind: ArtifactKind) -> String {
    format!(
        "network-outage-report-{}.{}",
        sanitize_location(location),
        kind.extension()
    )
}
