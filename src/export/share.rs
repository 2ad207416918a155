//! Share-ready excerpt copied to the clipboard.

use std::io::Write;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tracing::info;

use crate::contract::{Clipboard, ExportError};

pub const SHARE_EXCERPT_CHARS: usize = 500;

/// First 500 characters of the report followed by the caption block.
pub fn share_text(location: &str, saved_text: &str) -> String {
    let excerpt: String = saved_text.chars().take(SHARE_EXCERPT_CHARS).collect();
    format!(
        "{excerpt}...\n\nNetwork outage report: {location}\n#NetworkOutage #InternetShutdown #KeepItOn"
    )
}

pub fn copy_share_text(clipboard: &dyn Clipboard, location: &str, saved_text: &str) -> Result<String, ExportError> {
    let text = share_text(location, saved_text);
    clipboard.set_text(&text)?;
    info!(chars = text.chars().count(), "Copied share text to clipboard");
    Ok(text)
}

pub fn osc52_sequence(text: &str) -> String {
    let encoded = STANDARD.encode(text.as_bytes());
    format!("\x1b]52;c;{encoded}\x1b\\")
}

/// Terminal clipboard via the OSC 52 escape sequence on stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct Osc52Clipboard;

impl Clipboard for Osc52Clipboard {
    fn set_text(&self, text: &str) -> Result<(), ExportError> {
        let mut stdout = std::io::stdout();
        stdout
            .write_all(osc52_sequence(text).as_bytes())
            .and_then(|_| stdout.flush())
            .map_err(|e| ExportError::Clipboard(e.to_string()))
    }
}
