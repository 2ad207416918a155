// Integration tests for the report workflow, driven through mocked collaborators.

use std::io::{Cursor, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use image::{ImageFormat, Rgb, RgbImage};
use outage_report::config::ReporterConfig;
use outage_report::contract::{
    Article, ArticleSource, Completion, MockClipboard, MockNewsSource, MockReportGenerator, ReportError,
    ReportGenerator, ReportRequest, ReportResult,
};
use outage_report::edit_session::MarkupKind;
use outage_report::image_encoder::{encode_bytes, EncodeError};
use tempfile::NamedTempFile;
use outage_report::workflow::{Workflow, WorkflowState};

fn article(title: &str, source: &str) -> Article {
    Article {
        title: Some(title.to_string()),
        source: Some(ArticleSource::Named {
            id: None,
            name: Some(source.to_string()),
        }),
        url: Some(format!("https://news.example/{}", title.to_lowercase().replace(' ', "-"))),
        ..Default::default()
    }
}

fn report(location: &str, text: &str) -> ReportResult {
    ReportResult {
        location: location.to_string(),
        hours: 24,
        generated_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        report_text: text.to_string(),
    }
}

fn quiet_news() -> MockNewsSource {
    let mut news = MockNewsSource::new();
    news.expect_fetch_news().never();
    news
}

fn idle_generator() -> MockReportGenerator {
    let mut generator = MockReportGenerator::new();
    generator.expect_generate_report().never();
    generator
}

/// Drives a workflow to ReportReady with the given report text.
async fn ready_workflow(location: &str, text: &str) -> Workflow<MockNewsSource, MockReportGenerator> {
    let text = text.to_string();
    let loc = location.to_string();
    let mut generator = MockReportGenerator::new();
    generator
        .expect_generate_report()
        .times(1)
        .returning(move |_| Ok(report(&loc, &text)));
    let mut workflow = Workflow::new(&ReporterConfig::default(), quiet_news(), generator);
    workflow.set_location(location);
    assert_eq!(workflow.submit().await, Completion::Applied);
    workflow
}

#[tokio::test]
async fn test_selected_articles_are_submitted_in_retrieval_order() {
    let mut news = MockNewsSource::new();
    news.expect_fetch_news().times(1).returning(|query, hours| {
        assert_eq!(query, "Sanaa, Yemen");
        assert_eq!(hours, 24);
        vec![
            article("Power cut", "Reuters"),
            article("Fibre damaged", "AP"),
            article("Mobile data throttled", "BBC"),
        ]
    });

    let captured = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&captured);
    let mut generator = MockReportGenerator::new();
    generator.expect_generate_report().times(1).returning(move |request| {
        *sink.lock().unwrap() = Some(request.clone());
        Ok(report("Sanaa, Yemen", "# Sanaa\n\nConnectivity degraded."))
    });

    let mut workflow = Workflow::new(&ReporterConfig::default(), news, generator);
    assert_eq!(workflow.state(), WorkflowState::Idle);
    assert_eq!(workflow.fetch_news().await, Completion::Applied);
    assert_eq!(workflow.articles().len(), 3);

    assert!(workflow.toggle_article(2, true));
    assert!(workflow.toggle_article(0, true));
    assert_eq!(workflow.selected_count(), 2);
    assert_eq!(workflow.submit().await, Completion::Applied);

    let request = captured.lock().unwrap().take().expect("request captured");
    assert_eq!(request.location, "Sanaa, Yemen");
    assert_eq!(request.hours, 24);
    assert!(request.use_llm);
    assert_eq!(request.model, "phi3:mini");
    let titles: Vec<_> = request.articles.iter().map(Article::display_title).collect();
    assert_eq!(titles, vec!["Power cut", "Mobile data throttled"]);

    assert_eq!(workflow.state(), WorkflowState::ReportReady);
    assert_eq!(workflow.saved_text(), Some("# Sanaa\n\nConnectivity degraded."));
    assert!(workflow.error().is_none());
}

#[tokio::test]
async fn test_submission_without_news_sends_no_articles() {
    let mut generator = MockReportGenerator::new();
    generator.expect_generate_report().times(1).returning(|request| {
        assert!(request.articles.is_empty());
        assert_eq!(request.location, "Lagos, Nigeria");
        Ok(report("Lagos, Nigeria", "ok"))
    });
    let mut workflow = Workflow::new(&ReporterConfig::default(), quiet_news(), generator);
    workflow.set_location("  Lagos, Nigeria  ");
    assert_eq!(workflow.submit().await, Completion::Applied);
}

#[tokio::test]
async fn test_rejected_submission_returns_to_idle_with_user_message() {
    let mut generator = MockReportGenerator::new();
    generator.expect_generate_report().times(1).returning(|_| {
        Err(ReportError::Rejected {
            status: 500,
            detail: "ollama: model not loaded".to_string(),
        })
    });
    let mut workflow = Workflow::new(&ReporterConfig::default(), quiet_news(), generator);

    assert_eq!(workflow.submit().await, Completion::Failed);
    assert_eq!(workflow.state(), WorkflowState::Idle);
    assert!(workflow.report().is_none());
    assert!(workflow.saved_text().is_none());
    let message = workflow.error().expect("error message set");
    assert!(message.contains("failed to generate"), "got: {message}");
    assert!(!message.contains("ollama"), "server detail must not leak: {message}");
}

#[tokio::test]
async fn test_unreachable_backend_message_names_endpoint() {
    let mut generator = MockReportGenerator::new();
    generator.expect_generate_report().returning(|_| {
        Err(ReportError::Unreachable {
            endpoint: "http://localhost:8000".to_string(),
            detail: "connection refused".to_string(),
        })
    });
    let mut workflow = Workflow::new(&ReporterConfig::default(), quiet_news(), generator);

    assert_eq!(workflow.submit().await, Completion::Failed);
    let message = workflow.error().unwrap();
    assert!(message.contains("http://localhost:8000"), "got: {message}");
}

#[tokio::test]
async fn test_empty_location_is_rejected_before_any_request() {
    let mut workflow = Workflow::new(&ReporterConfig::default(), quiet_news(), idle_generator());
    workflow.set_location("   ");
    assert_eq!(workflow.submit().await, Completion::Failed);
    assert_eq!(workflow.state(), WorkflowState::Idle);
    assert_eq!(workflow.error(), Some("Please enter a location (City, Country)."));
}

#[test]
fn test_hours_are_clamped_into_range() {
    let mut workflow = Workflow::new(&ReporterConfig::default(), quiet_news(), idle_generator());
    workflow.set_hours(0);
    assert_eq!(workflow.input().hours(), 1);
    workflow.set_hours(500);
    assert_eq!(workflow.input().hours(), 72);
    workflow.set_hours(-3);
    assert_eq!(workflow.input().hours(), 1);
    workflow.set_hours(48);
    assert_eq!(workflow.input().hours(), 48);
}

#[test]
fn test_superseded_news_result_is_discarded() {
    let mut workflow = Workflow::new(&ReporterConfig::default(), quiet_news(), idle_generator());

    let first = workflow.begin_news_fetch();
    workflow.set_location("Aden, Yemen");
    let second = workflow.begin_news_fetch();
    assert_eq!(second.query, "Aden, Yemen");
    assert_eq!(workflow.state(), WorkflowState::FetchingNews);

    assert_eq!(
        workflow.finish_news_fetch(second, vec![article("Aden outage", "AFP")]),
        Completion::Applied
    );
    assert_eq!(
        workflow.finish_news_fetch(first, vec![article("Stale", "X"), article("Older", "Y")]),
        Completion::Discarded
    );

    assert_eq!(workflow.state(), WorkflowState::Idle);
    assert_eq!(workflow.articles().len(), 1);
    assert_eq!(workflow.articles()[0].display_title(), "Aden outage");
}

#[test]
fn test_new_fetch_clears_previous_selection() {
    let mut workflow = Workflow::new(&ReporterConfig::default(), quiet_news(), idle_generator());
    let ticket = workflow.begin_news_fetch();
    workflow.finish_news_fetch(ticket, vec![article("A", "s"), article("B", "s")]);
    let old_batch = workflow.batch_id();
    assert!(workflow.toggle_article(1, true));

    let ticket = workflow.begin_news_fetch();
    assert!(workflow.articles().is_empty());
    workflow.finish_news_fetch(ticket, vec![article("C", "s"), article("D", "s")]);

    assert!(!workflow.is_selected(1));
    assert!(workflow.selected_articles().is_empty());
    assert!(!workflow.toggle_article_in_batch(old_batch, 0, true));
    assert!(!workflow.is_selected(0));
    assert!(workflow.toggle_article_in_batch(workflow.batch_id(), 0, true));
    assert!(workflow.is_selected(0));
}

#[test]
fn test_toggle_outside_current_list_is_ignored() {
    let mut workflow = Workflow::new(&ReporterConfig::default(), quiet_news(), idle_generator());
    let ticket = workflow.begin_news_fetch();
    workflow.finish_news_fetch(ticket, vec![article("Only", "s")]);

    assert!(!workflow.toggle_article(5, true));
    assert!(workflow.selected_articles().is_empty());
}

#[test]
fn test_second_submission_while_pending_is_busy() {
    let mut workflow = Workflow::new(&ReporterConfig::default(), quiet_news(), idle_generator());
    let ticket = workflow.begin_submission().expect("first submission starts");
    assert_eq!(workflow.state(), WorkflowState::Submitting);
    assert!(matches!(workflow.begin_submission(), Err(ReportError::Busy)));

    assert_eq!(
        workflow.finish_submission(ticket, Ok(report("Sanaa, Yemen", "first"))),
        Completion::Applied
    );
    assert_eq!(workflow.saved_text(), Some("first"));
}

#[test]
fn test_restarted_submission_discards_older_result() {
    let mut workflow = Workflow::new(&ReporterConfig::default(), quiet_news(), idle_generator());
    let older = workflow.begin_submission().unwrap();
    let newer = workflow.restart_submission().unwrap();

    assert_eq!(
        workflow.finish_submission(newer, Ok(report("Sanaa, Yemen", "newer"))),
        Completion::Applied
    );
    assert_eq!(
        workflow.finish_submission(older, Ok(report("Sanaa, Yemen", "older"))),
        Completion::Discarded
    );
    assert_eq!(workflow.saved_text(), Some("newer"));
}

#[test]
fn test_cancelled_submission_result_is_discarded() {
    let mut workflow = Workflow::new(&ReporterConfig::default(), quiet_news(), idle_generator());
    let ticket = workflow.begin_submission().unwrap();
    assert!(workflow.cancel_submission());
    assert_eq!(workflow.state(), WorkflowState::Idle);
    assert!(!workflow.cancel_submission());

    assert_eq!(
        workflow.finish_submission(ticket, Ok(report("Sanaa, Yemen", "late"))),
        Completion::Discarded
    );
    assert!(workflow.report().is_none());
}

#[tokio::test]
async fn test_cancel_edit_restores_saved_text() {
    let mut workflow = ready_workflow("Sanaa, Yemen", "Original report").await;

    assert!(workflow.open_edit());
    assert_eq!(workflow.state(), WorkflowState::Editing);
    assert!(workflow.insert_markup(MarkupKind::Bold, 0, 8));
    assert_eq!(workflow.draft_text(), Some("**Original** report"));
    assert!(workflow.cancel_edit());
    assert_eq!(workflow.saved_text(), Some("Original report"));

    assert!(workflow.open_edit());
    assert!(workflow.set_draft("Rewritten"));
    assert!(workflow.cancel_edit());

    assert_eq!(workflow.state(), WorkflowState::ReportReady);
    assert_eq!(workflow.saved_text(), Some("Original report"));
    assert!(workflow.draft_text().is_none());
}

#[tokio::test]
async fn test_save_edit_commits_draft_with_markup() {
    let mut workflow = ready_workflow("Sanaa, Yemen", "Outage in Sanaa").await;

    assert!(workflow.open_edit());
    assert!(workflow.insert_markup(MarkupKind::Bold, 10, 15));
    assert_eq!(workflow.draft_text(), Some("Outage in **Sanaa**"));
    assert!(workflow.save_edit());

    assert_eq!(workflow.saved_text(), Some("Outage in **Sanaa**"));
    assert_eq!(workflow.state(), WorkflowState::ReportReady);
}

#[test]
fn test_edit_requires_a_report() {
    let mut workflow = Workflow::new(&ReporterConfig::default(), quiet_news(), idle_generator());
    assert!(!workflow.open_edit());
    assert!(!workflow.save_edit());
    assert!(workflow.export_pdf().is_none());
    assert!(workflow.export_docx().unwrap().is_none());
}

#[tokio::test]
async fn test_exports_are_named_after_report_location() {
    let workflow = ready_workflow("Lagos, Nigeria", "# Lagos\n\nFibre cut on the coast.").await;

    let pdf = workflow.export_pdf().expect("pdf produced");
    assert_eq!(pdf.filename, "network-outage-report-Lagos-Nigeria.pdf");
    assert!(pdf.bytes.starts_with(b"%PDF"));

    let docx = workflow.export_docx().unwrap().expect("docx produced");
    assert_eq!(docx.filename, "network-outage-report-Lagos-Nigeria.docx");
    assert!(docx.bytes.starts_with(b"PK"));
}

#[tokio::test]
async fn test_share_reads_saved_text_not_draft() {
    let mut workflow = ready_workflow("Sanaa, Yemen", "Saved body").await;
    workflow.open_edit();
    workflow.set_draft("Unsaved draft body");

    let mut clipboard = MockClipboard::new();
    clipboard
        .expect_set_text()
        .times(1)
        .withf(|text| text.starts_with("Saved body...") && !text.contains("Unsaved"))
        .returning(|_| Ok(()));

    let copied = workflow.share(&clipboard).unwrap().expect("report present");
    assert!(copied.contains("Network outage report: Sanaa, Yemen"));
    assert_eq!(workflow.take_notice().as_deref(), Some("Share text copied to clipboard"));
    assert!(workflow.take_notice().is_none());
}

fn png_bytes(color: [u8; 3]) -> Vec<u8> {
    let img = RgbImage::from_pixel(2, 2, Rgb(color));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

/// Captures each request; answers with a fixed report.
fn capturing_generator(sink: Arc<Mutex<Vec<ReportRequest>>>) -> MockReportGenerator {
    let mut generator = MockReportGenerator::new();
    generator.expect_generate_report().returning(move |request| {
        sink.lock().unwrap().push(request.clone());
        Ok(report("Sanaa, Yemen", "with photo"))
    });
    generator
}

#[tokio::test]
async fn test_selected_image_is_sent_with_submission() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(&png_bytes([200, 10, 10])).unwrap();

    let captured = Arc::new(Mutex::new(Vec::new()));
    let mut workflow = Workflow::new(
        &ReporterConfig::default(),
        quiet_news(),
        capturing_generator(Arc::clone(&captured)),
    );

    assert_eq!(workflow.select_image(Some(file.path())).await, Completion::Applied);
    assert!(workflow.image_preview().unwrap().starts_with("data:image/png;base64,"));
    assert_eq!(workflow.submit().await, Completion::Applied);

    assert_eq!(workflow.select_image(None).await, Completion::Applied);
    assert!(workflow.image_preview().is_none());
    assert!(workflow.input().image_base64.is_none());
    assert_eq!(workflow.submit().await, Completion::Applied);

    let requests = captured.lock().unwrap();
    assert_eq!(requests.len(), 2);
    let payload = requests[0].image_base64.as_deref().expect("image attached");
    assert!(payload.starts_with("iVBORw0KGgo"));
    assert!(requests[1].image_base64.is_none());
}

#[tokio::test]
async fn test_unreadable_image_is_dropped_from_submission() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"not an image").unwrap();

    let captured = Arc::new(Mutex::new(Vec::new()));
    let mut workflow = Workflow::new(
        &ReporterConfig::default(),
        quiet_news(),
        capturing_generator(Arc::clone(&captured)),
    );

    assert_eq!(workflow.select_image(Some(file.path())).await, Completion::Failed);
    assert_eq!(workflow.submit().await, Completion::Applied);
    assert!(captured.lock().unwrap()[0].image_base64.is_none());
}

#[test]
fn test_superseded_image_encode_does_not_overwrite_newer_selection() {
    let mut workflow = Workflow::new(&ReporterConfig::default(), quiet_news(), idle_generator());
    let older = workflow.begin_image();
    let newer = workflow.begin_image();

    let newer_image = encode_bytes(&png_bytes([0, 0, 255])).unwrap();
    let newer_payload = newer_image.payload.clone();
    assert_eq!(workflow.finish_image(newer, Ok(newer_image)), Completion::Applied);
    assert_eq!(
        workflow.finish_image(older, encode_bytes(&png_bytes([255, 0, 0]))),
        Completion::Discarded
    );
    assert_eq!(
        workflow.input().image_base64.as_deref(),
        Some(newer_payload.as_str())
    );

    let cleared = workflow.begin_image();
    assert!(workflow.input().image_base64.is_none());
    assert_eq!(
        workflow.finish_image(cleared, Err(EncodeError::UnsupportedType)),
        Completion::Failed
    );
    assert!(workflow.image_preview().is_none());
}

/// Answers only after `delay`, longer than any test timeout.
struct SlowGenerator {
    delay: Duration,
}

#[async_trait]
impl ReportGenerator for SlowGenerator {
    async fn generate_report(&self, request: &ReportRequest) -> Result<ReportResult, ReportError> {
        tokio::time::sleep(self.delay).await;
        Ok(report(&request.location, "too late"))
    }
}

#[tokio::test]
async fn test_submission_times_out_back_to_idle() {
    let config = ReporterConfig {
        request_timeout_secs: 1,
        ..Default::default()
    };
    let mut workflow = Workflow::new(
        &config,
        quiet_news(),
        SlowGenerator {
            delay: Duration::from_secs(3),
        },
    );

    assert_eq!(workflow.submit().await, Completion::Failed);
    assert_eq!(workflow.state(), WorkflowState::Idle);
    assert!(workflow.report().is_none());
    let message = workflow.error().expect("timeout surfaced");
    assert!(message.contains("http://localhost:8000"), "got: {message}");
}
