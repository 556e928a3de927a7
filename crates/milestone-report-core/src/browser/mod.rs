//! Headless browser acquisition and printing.
//!
//! A render call launches exactly one browser session through a
//! [`BrowserLauncher`], prints one page with it and closes it. Two launch
//! strategies exist, selected by a single configuration flag:
//!
//!   - `Serverless`: a Chromium build resolved from an explicit path or a
//!     downloadable pack, launched with flags suited to constrained sandboxes
//!   - `Local`: a browser installed on the host, found on `PATH`

pub mod chromium;
pub mod local;
pub mod serverless;

use std::future::Future;
use std::time::Duration;

use crate::error::Result;

pub use chromium::ChromiumBrowser;
pub use local::LocalLauncher;
pub use serverless::ServerlessLauncher;

/// Page geometry and print settings for PDF output.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfOptions {
    pub paper_width_mm: f32,
    pub paper_height_mm: f32,
    pub print_background: bool,
    pub margin_top_mm: f32,
    pub margin_right_mm: f32,
    pub margin_bottom_mm: f32,
    pub margin_left_mm: f32,
    /// How long the page may keep loading resources before it is printed.
    pub network_idle_budget: Duration,
}

impl Default for PdfOptions {
    /// A4, backgrounds printed, 20mm top/bottom and 15mm left/right margins.
    fn default() -> Self {
        Self {
            paper_width_mm: 210.0,
            paper_height_mm: 297.0,
            print_background: true,
            margin_top_mm: 20.0,
            margin_right_mm: 15.0,
            margin_bottom_mm: 20.0,
            margin_left_mm: 15.0,
            network_idle_budget: Duration::from_millis(5_000),
        }
    }
}

impl PdfOptions {
    /// Print stylesheet enforcing the page size, margins and background mode.
    pub fn page_css(&self) -> String {
        let adjust = if self.print_background { "exact" } else { "economy" };
        format!(
            "@page {{ size: {}mm {}mm; margin: {}mm {}mm {}mm {}mm; }}\n\
             html, body {{ -webkit-print-color-adjust: {adjust}; print-color-adjust: {adjust}; }}\n",
            self.paper_width_mm,
            self.paper_height_mm,
            self.margin_top_mm,
            self.margin_right_mm,
            self.margin_bottom_mm,
            self.margin_left_mm,
        )
    }
}

/// Insert the print stylesheet into `html`, before `</head>` when present.
pub fn with_print_css(html: &str, options: &PdfOptions) -> String {
    let style = format!("<style data-print-options>\n{}</style>\n", options.page_css());
    match html.find("</head>") {
        Some(pos) => {
            let mut out = String::with_capacity(html.len() + style.len());
            out.push_str(&html[..pos]);
            out.push_str(&style);
            out.push_str(&html[pos..]);
            out
        }
        None => format!("{style}{html}"),
    }
}

/// An open browser session owned by a single render call.
pub trait Browser: Send {
    /// Load `html`, wait for the page to settle and print it to PDF bytes.
    fn print_to_pdf(
        &mut self,
        html: &str,
        options: &PdfOptions,
    ) -> impl Future<Output = Result<Vec<u8>>> + Send;

    /// Terminate the session. Must be safe to call after a failed print.
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;
}

/// Capability to start a [`Browser`] session.
pub trait BrowserLauncher: Send + Sync {
    type Browser: Browser;

    fn launch(&self) -> impl Future<Output = Result<Self::Browser>> + Send;
}

/// Environment-selected launch strategy.
#[derive(Debug, Clone)]
pub enum LaunchStrategy {
    Serverless(ServerlessLauncher),
    Local(LocalLauncher),
}

impl LaunchStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            LaunchStrategy::Serverless(_) => "serverless",
            LaunchStrategy::Local(_) => "local",
        }
    }
}

impl BrowserLauncher for LaunchStrategy {
    type Browser = ChromiumBrowser;

    async fn launch(&self) -> Result<ChromiumBrowser> {
        match self {
            LaunchStrategy::Serverless(launcher) => launcher.launch().await,
            LaunchStrategy::Local(launcher) => launcher.launch().await,
        }
    }
}
