//! Top-level report workflow: inputs → news → selection → generation → edit → export.
//!
//! [`Workflow`] owns all session state and sequences the components in
//! response to operator actions. Its observable state is derived, so exactly
//! one [`WorkflowState`] is ever active:
//!
//! ```text
//! Idle → FetchingNews → Idle(articles) → Submitting → ReportReady ⇄ Editing
//!                                           ↘ (failure / cancel) → Idle
//! ```
//!
//! # Superseded completions
//! Each asynchronous operation (news fetch, submission, image encode) is
//! started with a ticket carrying a generation number. Completing with a
//! ticket whose generation is no longer current is a silent no-op, so a slow
//! response can never resurrect stale articles or overwrite a newer report.
//! The `begin_*` / `finish_*` pairs expose this split; [`Workflow::fetch_news`],
//! [`Workflow::submit`] and [`Workflow::select_image`] run both halves in sequence.
//!
//! # Errors
//! News and image failures degrade silently. Submission failures are stored
//! as a user-facing message ([`Workflow::error`]); the diagnostic detail is
//! only logged.

use std::path::Path;
use std::time::Duration;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::backend::BackendDefaults;
use crate::config::ReporterConfig;
use crate::contract::{
    Article, Clipboard, Completion, ExportError, NewsSource, ReportError, ReportGenerator, ReportRequest, ReportResult,
    WorkflowInput,
};
use crate::edit_session::{EditSession, MarkupKind};
use crate::export::docx::{render_docx, DocumentModel};
use crate::export::pdf::render_pdf;
use crate::export::render::MarkdownCanvas;
use crate::export::share::copy_share_text;
use crate::export::{artifact_filename, Artifact, ArtifactKind};
use crate::image_encoder::{encode_file, EncodeError, EncodeTicket, EncodedImage, ImageEncoder};
use crate::selection::SelectionStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    Idle,
    FetchingNews,
    Submitting,
    ReportReady,
    Editing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsTicket {
    generation: u64,
    pub query: String,
    pub hours: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmitTicket {
    generation: u64,
    pub request: ReportRequest,
}

pub struct Workflow<N, G> {
    news_source: N,
    generator: G,
    endpoint: String,
    timeout: Duration,

    input: WorkflowInput,
    image: ImageEncoder,
    selection: SelectionStore,

    news_generation: u64,
    news_pending: bool,
    submit_generation: u64,
    submitting: bool,

    report: Option<ReportResult>,
    edit: Option<EditSession>,
    error: Option<String>,
    notice: Option<String>,
}

impl<N, G> Workflow<N, G>
where
    N: NewsSource,
    G: ReportGenerator,
{
    pub fn new(config: &ReporterConfig, news_source: N, generator: G) -> Self {
        info!(api_url = %config.api_url, "Workflow session started");
        Self {
            news_source,
            generator,
            endpoint: config.api_url.clone(),
            timeout: Duration::from_secs(config.request_timeout_secs),
            input: config.defaults.to_input(),
            image: ImageEncoder::new(),
            selection: SelectionStore::default(),
            news_generation: 0,
            news_pending: false,
            submit_generation: 0,
            submitting: false,
            report: None,
            edit: None,
            error: None,
            notice: None,
        }
    }

    pub fn state(&self) -> WorkflowState {
        if self.submitting {
            WorkflowState::Submitting
        } else if self.news_pending {
            WorkflowState::FetchingNews
        } else if self.edit.as_ref().is_some_and(EditSession::is_editing) {
            WorkflowState::Editing
        } else if self.report.is_some() {
            WorkflowState::ReportReady
        } else {
            WorkflowState::Idle
        }
    }

    // --- inputs -----------------------------------------------------------

    pub fn input(&self) -> &WorkflowInput {
        &self.input
    }

    pub fn set_location(&mut self, location: impl Into<String>) {
        self.input.location = location.into();
    }

    pub fn set_hours(&mut self, raw: i64) {
        self.input.set_hours(raw);
    }

    pub fn set_use_llm(&mut self, use_llm: bool) {
        self.input.use_llm = use_llm;
    }

    pub fn set_model(&mut self, model: impl Into<String>) {
        self.input.model = model.into();
    }

    /// Seeds inputs from the backend's advertised defaults.
    pub fn apply_backend_defaults(&mut self, defaults: &BackendDefaults) {
        if let Some(location) = defaults.default_location.as_deref().filter(|l| !l.trim().is_empty()) {
            self.input.location = location.to_string();
        }
        if let Some(hours) = defaults.default_window_hours {
            self.input.set_hours(hours);
        }
        if let Some(use_llm) = defaults.use_llm {
            self.input.use_llm = use_llm;
        }
        if let Some(model) = defaults.model.as_deref().filter(|m| !m.trim().is_empty()) {
            self.input.model = model.to_string();
        }
        debug!(input = ?self.input, "Applied backend defaults");
    }

    // --- image ------------------------------------------------------------

    pub fn begin_image(&mut self) -> EncodeTicket {
        self.input.image_base64 = None;
        self.image.begin()
    }

    pub fn finish_image(&mut self, ticket: EncodeTicket, result: Result<EncodedImage, EncodeError>) -> Completion {
        let completion = self.image.complete(ticket, result);
        self.input.image_base64 = self.image.payload().map(str::to_string);
        completion
    }

    /// Selects (or with `None`, clears) the outage photo.
    pub async fn select_image(&mut self, path: Option<&Path>) -> Completion {
        let ticket = self.begin_image();
        let Some(path) = path else {
            return Completion::Applied;
        };
        let result = encode_file(path).await;
        self.finish_image(ticket, result)
    }

    pub fn image_preview(&self) -> Option<&str> {
        self.image.preview()
    }

    // --- news -------------------------------------------------------------

    pub fn begin_news_fetch(&mut self) -> NewsTicket {
        self.news_generation += 1;
        self.news_pending = true;
        self.selection.clear();
        self.error = None;
        info!(
            generation = self.news_generation,
            location = %self.input.location,
            hours = self.input.hours(),
            "Fetching news"
        );
        NewsTicket {
            generation: self.news_generation,
            query: self.input.location.trim().to_string(),
            hours: self.input.hours(),
        }
    }

    pub fn finish_news_fetch(&mut self, ticket: NewsTicket, articles: Vec<Article>) -> Completion {
        if ticket.generation != self.news_generation {
            debug!(
                ticket = ticket.generation,
                current = self.news_generation,
                "Discarding superseded news result"
            );
            return Completion::Discarded;
        }
        self.news_pending = false;
        info!(count = articles.len(), "News ready");
        self.selection = SelectionStore::load(articles);
        Completion::Applied
    }

    pub async fn fetch_news(&mut self) -> Completion {
        let ticket = self.begin_news_fetch();
        let articles = self.news_source.fetch_news(&ticket.query, ticket.hours).await;
        self.finish_news_fetch(ticket, articles)
    }

    pub fn articles(&self) -> &[Article] {
        self.selection.articles()
    }

    pub fn batch_id(&self) -> Uuid {
        self.selection.batch_id()
    }

    pub fn toggle_article(&mut self, index: usize, selected: bool) -> bool {
        self.selection.toggle(index, selected)
    }

    pub fn toggle_article_in_batch(&mut self, batch_id: Uuid, index: usize, selected: bool) -> bool {
        self.selection.toggle_in_batch(batch_id, index, selected)
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.selection.is_selected(index)
    }

    pub fn selected_count(&self) -> usize {
        self.selection.selected_count()
    }

    pub fn selected_articles(&self) -> Vec<Article> {
        self.selection.selected_articles()
    }

    // --- submission -------------------------------------------------------

    /// Starts a submission. Rejected with [`ReportError::Busy`] while one is pending.
    pub fn begin_submission(&mut self) -> Result<SubmitTicket, ReportError> {
        if self.submitting {
            warn!("Rejecting submission while another is in flight");
            return Err(ReportError::Busy);
        }
        self.restart_submission()
    }

    /// Starts a submission unconditionally; any pending one is superseded and
    /// its completion will be discarded.
    pub fn restart_submission(&mut self) -> Result<SubmitTicket, ReportError> {
        if self.input.location.trim().is_empty() {
            let err = ReportError::EmptyLocation;
            self.error = Some(err.user_message());
            return Err(err);
        }
        self.submit_generation += 1;
        self.submitting = true;
        self.report = None;
        self.edit = None;
        self.error = None;
        let request = ReportRequest::new(&self.input, self.selection.selected_articles());
        info!(
            generation = self.submit_generation,
            location = %request.location,
            hours = request.hours,
            articles = request.articles.len(),
            "Submitting report request"
        );
        Ok(SubmitTicket {
            generation: self.submit_generation,
            request,
        })
    }

    pub fn finish_submission(&mut self, ticket: SubmitTicket, result: Result<ReportResult, ReportError>) -> Completion {
        if !self.submitting || ticket.generation != self.submit_generation {
            debug!(
                ticket = ticket.generation,
                current = self.submit_generation,
                "Discarding superseded report result"
            );
            return Completion::Discarded;
        }
        self.submitting = false;
        match result {
            Ok(report) => {
                info!(location = %report.location, generated_at = %report.generated_at, "Report ready");
                self.edit = Some(EditSession::new(report.report_text.clone()));
                self.report = Some(report);
                self.error = None;
                Completion::Applied
            }
            Err(e) => {
                error!(error = %e, "Report generation failed");
                self.error = Some(e.user_message());
                self.report = None;
                self.edit = None;
                Completion::Failed
            }
        }
    }

    /// Submits and waits, bounded by the configured request timeout.
    pub async fn submit(&mut self) -> Completion {
        let ticket = match self.begin_submission() {
            Ok(ticket) => ticket,
            Err(_) => return Completion::Failed,
        };
        let result = match tokio::time::timeout(self.timeout, self.generator.generate_report(&ticket.request)).await {
            Ok(result) => result,
            Err(_) => Err(ReportError::TimedOut {
                endpoint: self.endpoint.clone(),
            }),
        };
        self.finish_submission(ticket, result)
    }

    /// Abandons the pending submission; its eventual result is discarded.
    pub fn cancel_submission(&mut self) -> bool {
        if !self.submitting {
            return false;
        }
        self.submit_generation += 1;
        self.submitting = false;
        info!("Report submission cancelled");
        true
    }

    pub fn report(&self) -> Option<&ReportResult> {
        self.report.as_ref()
    }

    /// User-facing message from the last failed submission.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Takes the pending transient notification, if any.
    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }

    // --- editing ----------------------------------------------------------

    pub fn saved_text(&self) -> Option<&str> {
        self.edit.as_ref().map(EditSession::saved_text)
    }

    pub fn draft_text(&self) -> Option<&str> {
        self.edit.as_ref().and_then(EditSession::draft_text)
    }

    pub fn open_edit(&mut self) -> bool {
        if self.state() != WorkflowState::ReportReady {
            return false;
        }
        match self.edit.as_mut() {
            Some(edit) => {
                edit.open();
                true
            }
            None => false,
        }
    }

    pub fn set_draft(&mut self, text: impl Into<String>) -> bool {
        self.edit.as_mut().is_some_and(|e| e.set_draft(text))
    }

    pub fn insert_markup(&mut self, kind: MarkupKind, start: usize, end: usize) -> bool {
        self.edit
            .as_mut()
            .and_then(|e| e.insert_markup(kind, start, end))
            .is_some()
    }

    pub fn save_edit(&mut self) -> bool {
        match self.edit.as_mut() {
            Some(edit) if edit.is_editing() => {
                edit.save();
                true
            }
            _ => false,
        }
    }

    pub fn cancel_edit(&mut self) -> bool {
        match self.edit.as_mut() {
            Some(edit) if edit.is_editing() => {
                edit.cancel();
                true
            }
            _ => false,
        }
    }

    // --- export -----------------------------------------------------------

    fn committed(&self) -> Option<(&ReportResult, &str)> {
        Some((self.report.as_ref()?, self.saved_text()?))
    }

    /// PDF of the committed report; `None` when there is nothing to render.
    pub fn export_pdf(&self) -> Option<Artifact> {
        let (report, text) = self.committed()?;
        let title = format!("Network Outage Report: {}", report.location);
        let bytes = render_pdf(&MarkdownCanvas::new(text), &title)?;
        Some(Artifact {
            kind: ArtifactKind::Pdf,
            filename: artifact_filename(&report.location, ArtifactKind::Pdf),
            bytes,
        })
    }

    /// DOCX of the committed report; `Ok(None)` when no report exists.
    pub fn export_docx(&self) -> Result<Option<Artifact>, ExportError> {
        let Some((report, text)) = self.committed() else {
            return Ok(None);
        };
        let model = DocumentModel::from_report(&report.location, report.generated_at, text);
        let bytes = render_docx(&model)?;
        Ok(Some(Artifact {
            kind: ArtifactKind::Docx,
            filename: artifact_filename(&report.location, ArtifactKind::Docx),
            bytes,
        }))
    }

    /// Copies the share excerpt and raises a notice. `Ok(None)` when no report exists.
    pub fn share(&mut self, clipboard: &dyn Clipboard) -> Result<Option<String>, ExportError> {
        let Some((report, text)) = self.committed() else {
            return Ok(None);
        };
        let copied = copy_share_text(clipboard, &report.location, text)?;
        self.notice = Some("Share text copied to clipboard".to_string());
        Ok(Some(copied))
    }
}
