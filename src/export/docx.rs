//! Report → DOCX.
//!
//! The body is a literal line dump: each `\n`-separated line of the committed
//! text becomes one paragraph and Markdown markers are kept as plain text.

use std::io::Cursor;

use chrono::{DateTime, Utc};
use docx_rs::{Docx, Paragraph, Run};
use tracing::{error, info};

use crate::contract::ExportError;

/// Block structure of the exported document, before serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentModel {
    pub heading: String,
    pub metadata: String,
    pub paragraphs: Vec<String>,
}

impl DocumentModel {
    pub fn from_report(location: &str, generated_at: DateTime<Utc>, saved_text: &str) -> Self {
        Self {
            heading: format!("Network Outage Report: {location}"),
            metadata: format!("Generated: {}", generated_at.format("%Y-%m-%d %H:%M:%S UTC")),
            paragraphs: saved_text.split('\n').map(str::to_string).collect(),
        }
    }

    /// Heading + metadata + one per body line.
    pub fn block_count(&self) -> usize {
        self.paragraphs.len() + 2
    }

    pub fn to_docx(&self) -> Docx {
        let heading = Paragraph::new()
            .add_run(Run::new().add_text(&self.heading).bold().size(32))
            .style("Heading1");
        let metadata = Paragraph::new().add_run(Run::new().add_text(&self.metadata).italic().size(20));
        self.paragraphs.iter().fold(
            Docx::new().add_paragraph(heading).add_paragraph(metadata),
            |doc, line| doc.add_paragraph(Paragraph::new().add_run(Run::new().add_text(line))),
        )
    }
}

/// Serializes the document to `.docx` bytes.
pub fn render_docx(model: &DocumentModel) -> Result<Vec<u8>, ExportError> {
    let mut cursor = Cursor::new(Vec::new());
    model.to_docx().build().pack(&mut cursor).map_err(|e| {
        error!(error = ?e, "DOCX packaging failed");
        ExportError::Docx(e.to_string())
    })?;
    let bytes = cursor.into_inner();
    info!(size = bytes.len(), paragraphs = model.block_count(), "Generated DOCX");
    Ok(bytes)
}
