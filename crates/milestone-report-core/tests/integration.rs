use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use milestone_report_core::browser::{Browser, BrowserLauncher, LocalLauncher, PdfOptions};
use milestone_report_core::html::build_report_html;
use milestone_report_core::html::template::Interpolation;
use milestone_report_core::{MilestoneReportData, RenderError, RenderOptions, render_with};
use tempfile::TempDir;

/// Path to the fixtures directory relative to the crate root.
fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

fn template_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../templates/milestone-report.html")
}

fn load_fixture(name: &str) -> MilestoneReportData {
    let path = fixtures_dir().join(name);
    let raw = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("failed to read {}: {e}", path.display()));
    serde_json::from_str(&raw).unwrap_or_else(|e| panic!("invalid fixture {name}: {e}"))
}

/// Builds HTML from the shipped template with an empty asset root.
fn build_fixture_html(name: &str) -> String {
    let assets = TempDir::new().unwrap();
    build_report_html(
        &load_fixture(name),
        &template_path(),
        assets.path(),
        Interpolation::Escape,
    )
    .expect("template builds")
}

fn options(template: &Path, assets: &Path) -> RenderOptions {
    RenderOptions {
        template_path: template.to_path_buf(),
        asset_root: assets.to_path_buf(),
        interpolation: Interpolation::Escape,
        pdf: PdfOptions::default(),
        timeout: Duration::from_secs(5),
    }
}

#[derive(Debug, Clone, Copy)]
enum Behavior {
    Pdf,
    Crash,
    NotPdf,
    Hang,
    LaunchFails,
}

#[derive(Debug, Clone)]
struct MockLauncher {
    behavior: Behavior,
    launches: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
    printed_html: Arc<Mutex<Option<String>>>,
}

impl MockLauncher {
    fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            launches: Arc::new(AtomicUsize::new(0)),
            closes: Arc::new(AtomicUsize::new(0)),
            printed_html: Arc::new(Mutex::new(None)),
        }
    }

    fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

struct MockBrowser {
    behavior: Behavior,
    closes: Arc<AtomicUsize>,
    printed_html: Arc<Mutex<Option<String>>>,
}

impl BrowserLauncher for MockLauncher {
    type Browser = MockBrowser;

    async fn launch(&self) -> milestone_report_core::Result<MockBrowser> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        if let Behavior::LaunchFails = self.behavior {
            return Err(RenderError::ExecutableNotFound("mock".into()));
        }
        Ok(MockBrowser {
            behavior: self.behavior,
            closes: self.closes.clone(),
            printed_html: self.printed_html.clone(),
        })
    }
}

impl Browser for MockBrowser {
    async fn print_to_pdf(
        &mut self,
        html: &str,
        _options: &PdfOptions,
    ) -> milestone_report_core::Result<Vec<u8>> {
        *self.printed_html.lock().unwrap() = Some(html.to_string());
        match self.behavior {
            Behavior::Pdf => Ok(b"%PDF-1.7\n%mock\n%%EOF\n".to_vec()),
            Behavior::Crash => Err(RenderError::Render("page crashed".into())),
            Behavior::NotPdf => Ok(b"<html>not a pdf</html>".to_vec()),
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(Vec::new())
            }
            Behavior::LaunchFails => unreachable!("browser never launched"),
        }
    }

    async fn close(&mut self) -> milestone_report_core::Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn count(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}

#[test]
fn approved_report_html_has_full_score_and_green_verdict() {
    let html = build_fixture_html("approved.json");

    assert!(html.contains("<span class=\"score-value\">4/4</span>"));
    assert!(html.contains("class=\"verdict-banner verdict-approved\""));
    assert!(html.contains("#16a34a 0%, #15803d 100%"));
    assert!(html.contains("The milestone was delivered in full and verified."));
    assert!(!html.contains("Why rejected"));
    assert!(html.contains("05 Aug 2025"));

    // Template stylesheet is embedded; fallback logo is used.
    assert!(html.contains(".verdict-banner {"));
    assert!(html.contains("src=\"data:image/svg+xml;base64,"));
}

#[test]
fn approved_report_html_includes_demo_block_with_link() {
    let html = build_fixture_html("approved.json");

    assert_eq!(count(&html, "class=\"demo-block\""), 1);
    assert!(html.contains("href=\"https://demo.example.org/run/42\""));
}

#[test]
fn justification_blocks_only_for_non_empty_text() {
    let html = build_fixture_html("approved.json");

    assert_eq!(count(&html, "class=\"justification\""), 2);
    assert_eq!(
        count(&html, "All listed deliverables are present in the release."),
        1
    );
    assert_eq!(count(&html, "Demo and repository are publicly accessible."), 1);
}

#[test]
fn rejected_report_html_uses_red_scheme_and_suggested_changes() {
    let html = build_fixture_html("rejected.json");

    assert!(html.contains("class=\"verdict-banner verdict-rejected\""));
    assert!(html.contains("#dc2626 0%, #b91c1c 100%"));
    assert!(html.contains("The final audit report was not delivered."));
    assert_eq!(count(&html, "class=\"suggested-changes\""), 1);
    assert!(html.contains("Publish the final audit and a remediation plan."));
    assert!(!html.contains("Should not appear in a rejected report."));
}

#[test]
fn rejected_report_html_scores_defaulted_ratings() {
    let html = build_fixture_html("rejected.json");

    // "2" + "3" + "" (defaults to "1") + "2" = 0.5 + 0 + 1 + 0.5
    assert!(html.contains("<span class=\"score-value\">2/4</span>"));
    assert_eq!(count(&html, ">Partially Met</span>"), 2);
    assert_eq!(count(&html, ">Not Met</span>"), 1);
    assert_eq!(count(&html, ">Fully Met</span>"), 1);
}

#[test]
fn rejected_report_html_omits_demo_and_invalid_date() {
    let html = build_fixture_html("rejected.json");

    assert!(!html.contains("class=\"demo-block\""));
    assert!(!html.contains("should-not-appear"));
    assert!(html.contains("<div class=\"report-date\"></div>"));
    assert!(!html.contains("Invalid Date"));
}

#[test]
fn rejected_without_suggested_changes_has_no_block() {
    let mut data = load_fixture("rejected.json");
    data.suggested_changes = String::new();

    let assets = TempDir::new().unwrap();
    let html =
        build_report_html(&data, &template_path(), assets.path(), Interpolation::Escape).unwrap();
    assert!(!html.contains("class=\"suggested-changes\""));
}

#[test]
fn logo_in_asset_root_is_embedded_as_png() {
    let assets = TempDir::new().unwrap();
    std::fs::create_dir_all(assets.path().join("assets")).unwrap();
    std::fs::write(assets.path().join("assets/logo.png"), b"\x89PNG\r\n\x1a\n").unwrap();

    let html = build_report_html(
        &load_fixture("approved.json"),
        &template_path(),
        assets.path(),
        Interpolation::Escape,
    )
    .unwrap();
    assert!(html.contains("src=\"data:image/png;base64,iVBORw0KGgo=\""));
}

#[tokio::test]
async fn successful_render_returns_pdf_and_closes_once() {
    let assets = TempDir::new().unwrap();
    let launcher = MockLauncher::new(Behavior::Pdf);

    let pdf = render_with(
        &load_fixture("approved.json"),
        &launcher,
        &options(&template_path(), assets.path()),
    )
    .await
    .expect("render succeeds");

    assert!(pdf.starts_with(b"%PDF"));
    assert_eq!(launcher.launches(), 1);
    assert_eq!(launcher.closes(), 1);

    let printed = launcher.printed_html.lock().unwrap().clone().unwrap();
    assert!(printed.contains("4/4"));
}

#[tokio::test]
async fn failed_render_still_closes_browser_once() {
    let assets = TempDir::new().unwrap();
    let launcher = MockLauncher::new(Behavior::Crash);

    let err = render_with(
        &load_fixture("approved.json"),
        &launcher,
        &options(&template_path(), assets.path()),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, RenderError::Render(_)));
    assert_eq!(launcher.closes(), 1);
}

#[tokio::test]
async fn non_pdf_output_is_extraction_error_and_closes_once() {
    let assets = TempDir::new().unwrap();
    let launcher = MockLauncher::new(Behavior::NotPdf);

    let err = render_with(
        &load_fixture("approved.json"),
        &launcher,
        &options(&template_path(), assets.path()),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, RenderError::Extraction(_)));
    assert_eq!(launcher.closes(), 1);
}

#[tokio::test]
async fn hung_render_times_out_and_closes_once() {
    let assets = TempDir::new().unwrap();
    let launcher = MockLauncher::new(Behavior::Hang);
    let mut opts = options(&template_path(), assets.path());
    opts.timeout = Duration::from_millis(50);

    let err = render_with(&load_fixture("approved.json"), &launcher, &opts)
        .await
        .unwrap_err();

    assert!(matches!(err, RenderError::Timeout(d) if d == Duration::from_millis(50)));
    assert_eq!(launcher.closes(), 1);
}

#[tokio::test]
async fn missing_template_fails_before_launch() {
    let assets = TempDir::new().unwrap();
    let launcher = MockLauncher::new(Behavior::Pdf);

    let err = render_with(
        &load_fixture("approved.json"),
        &launcher,
        &options(&assets.path().join("missing.html"), assets.path()),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, RenderError::Template { .. }));
    assert_eq!(launcher.launches(), 0);
    assert_eq!(launcher.closes(), 0);
}

#[tokio::test]
async fn launch_failure_propagates_without_close() {
    let assets = TempDir::new().unwrap();
    let launcher = MockLauncher::new(Behavior::LaunchFails);

    let err = render_with(
        &load_fixture("approved.json"),
        &launcher,
        &options(&template_path(), assets.path()),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, RenderError::ExecutableNotFound(_)));
    assert_eq!(launcher.launches(), 1);
    assert_eq!(launcher.closes(), 0);
}

/// Local browser that actually starts, if this host has one.
fn working_local_browser() -> Option<PathBuf> {
    let exe = milestone_report_core::browser::local::discover()?;
    let ok = std::process::Command::new(&exe)
        .arg("--version")
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false);
    ok.then_some(exe)
}

#[tokio::test]
#[ignore = "needs a chromium-family browser; run with --ignored"]
async fn end_to_end_render_with_local_browser() {
    let exe = working_local_browser().expect("a runnable chromium-family browser on this host");

    let assets = TempDir::new().unwrap();
    let launcher = LocalLauncher::new(Some(exe));
    let mut opts = options(&template_path(), assets.path());
    opts.timeout = Duration::from_secs(90);

    let pdf = render_with(&load_fixture("approved.json"), &launcher, &opts)
        .await
        .expect("real browser renders the report");

    assert!(!pdf.is_empty());
    assert_eq!(&pdf[..4], b"%PDF");
}
