//! Saved/draft text pair for hand-editing a generated report.
//!
//! `saved` is the committed text every exporter reads. `draft` exists only
//! between [`EditSession::open`] and [`EditSession::save`] / [`EditSession::cancel`].

use std::ops::Range;

use tracing::{debug, info};

/// Inline Markdown helpers offered by the editor toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkupKind {
    Bold,
    Italic,
    Heading,
    ListItem,
}

impl MarkupKind {
    fn placeholder(self) -> &'static str {
        match self {
            MarkupKind::Bold => "bold text",
            MarkupKind::Italic => "italic text",
            MarkupKind::Heading => "Heading",
            MarkupKind::ListItem => "List item",
        }
    }

    fn apply(self, text: &str) -> String {
        match self {
            MarkupKind::Bold => format!("**{text}**"),
            MarkupKind::Italic => format!("*{text}*"),
            MarkupKind::Heading => format!("## {text}"),
            MarkupKind::ListItem => format!("\n- {text}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    saved: String,
    draft: String,
    editing: bool,
}

impl EditSession {
    pub fn new(text: impl Into<String>) -> Self {
        let saved = text.into();
        Self {
            draft: saved.clone(),
            saved,
            editing: false,
        }
    }

    /// Committed text. The only text exporters may read.
    pub fn saved_text(&self) -> &str {
        &self.saved
    }

    /// In-progress text, present only while editing.
    pub fn draft_text(&self) -> Option<&str> {
        self.editing.then_some(self.draft.as_str())
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn open(&mut self) {
        self.draft = self.saved.clone();
        self.editing = true;
        debug!(chars = self.draft.chars().count(), "Edit session opened");
    }

    /// Replaces the draft wholesale. Ignored outside an edit session.
    pub fn set_draft(&mut self, text: impl Into<String>) -> bool {
        if !self.editing {
            return false;
        }
        self.draft = text.into();
        true
    }

    /// Wraps or prefixes the selected span `[start, end)` (char offsets into
    /// the draft) with the markup for `kind`; an empty span inserts a
    /// placeholder. Returns the char range of the inserted markup, or `None`
    /// outside an edit session.
    pub fn insert_markup(&mut self, kind: MarkupKind, start: usize, end: usize) -> Option<Range<usize>> {
        if !self.editing {
            return None;
        }
        let len = self.draft.chars().count();
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        let start = start.min(len);
        let end = end.min(len);

        let byte_at = |idx: usize| {
            self.draft
                .char_indices()
                .nth(idx)
                .map(|(b, _)| b)
                .unwrap_or(self.draft.len())
        };
        let (start_b, end_b) = (byte_at(start), byte_at(end));

        let selected = &self.draft[start_b..end_b];
        let inner = if selected.is_empty() { kind.placeholder() } else { selected };
        let replacement = kind.apply(inner);
        let inserted_len = replacement.chars().count();

        self.draft.replace_range(start_b..end_b, &replacement);
        debug!(?kind, start, end, "Inserted markup into draft");
        Some(start..start + inserted_len)
    }

    /// Commits the draft.
    pub fn save(&mut self) {
        if !self.editing {
            return;
        }
        self.saved = self.draft.clone();
        self.editing = false;
        info!(chars = self.saved.chars().count(), "Report edits saved");
    }

    /// Discards the draft.
    pub fn cancel(&mut self) {
        self.draft = self.saved.clone();
        self.editing = false;
        debug!("Report edits discarded");
    }
}
