//! The render pipeline: build → acquire → print → release.
//!
//! Release is unconditional once a browser has been acquired. The browser is
//! closed exactly once whether printing succeeded, failed, produced bytes
//! that are not a PDF, or ran out of time. A template failure happens before
//! acquisition, so no browser is launched for it.

use std::path::PathBuf;
use std::time::Duration;

use tracing::{info, warn};

use crate::browser::{Browser, BrowserLauncher, PdfOptions};
use crate::config::RenderConfig;
use crate::error::{RenderError, Result};
use crate::html::build_report_html;
use crate::html::template::Interpolation;
use crate::report::model::MilestoneReportData;
use crate::report::summary::RenderedReport;

const PDF_MAGIC: &[u8] = b"%PDF";

/// Everything a render needs apart from the browser launcher.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub template_path: PathBuf,
    pub asset_root: PathBuf,
    pub interpolation: Interpolation,
    pub pdf: PdfOptions,
    pub timeout: Duration,
}

impl From<&RenderConfig> for RenderOptions {
    fn from(config: &RenderConfig) -> Self {
        Self {
            template_path: config.template_path.clone(),
            asset_root: config.asset_root.clone(),
            interpolation: config.interpolation,
            pdf: config.pdf.clone(),
            timeout: config.timeout,
        }
    }
}

/// Render a milestone report to PDF bytes using the configured strategy.
pub async fn render_html_to_pdf(
    data: &MilestoneReportData,
    config: &RenderConfig,
) -> Result<Vec<u8>> {
    let launcher = config.launch_strategy();
    info!(strategy = launcher.name(), "rendering milestone report");
    render_with(data, &launcher, &RenderOptions::from(config)).await
}

/// Render and fingerprint a milestone report.
pub async fn render_report(
    data: &MilestoneReportData,
    config: &RenderConfig,
) -> Result<RenderedReport> {
    let pdf = render_html_to_pdf(data, config).await?;
    let score = data.normalize().score;
    Ok(RenderedReport::new(pdf, score, data.final_recommendation))
}

/// Render with an explicit launcher.
pub async fn render_with<L>(
    data: &MilestoneReportData,
    launcher: &L,
    options: &RenderOptions,
) -> Result<Vec<u8>>
where
    L: BrowserLauncher,
{
    let html = build_report_html(
        data,
        &options.template_path,
        &options.asset_root,
        options.interpolation,
    )?;

    let mut browser = launcher.launch().await?;

    let printed = match tokio::time::timeout(
        options.timeout,
        print_checked(&mut browser, &html, &options.pdf),
    )
    .await
    {
        Ok(result) => result,
        Err(_) => Err(RenderError::Timeout(options.timeout)),
    };

    let closed = browser.close().await;

    match (printed, closed) {
        (Ok(pdf), Ok(())) => {
            info!(size = pdf.len(), "milestone report rendered");
            Ok(pdf)
        }
        (Ok(pdf), Err(err)) => {
            warn!(error = %err, "browser did not close cleanly after render");
            Ok(pdf)
        }
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(close_err)) => {
            warn!(error = %close_err, "browser did not close cleanly after failed render");
            Err(err)
        }
    }
}

async fn print_checked<B: Browser>(
    browser: &mut B,
    html: &str,
    options: &PdfOptions,
) -> Result<Vec<u8>> {
    let pdf = browser.print_to_pdf(html, options).await?;
    if !pdf.starts_with(PDF_MAGIC) {
        return Err(RenderError::Extraction(format!(
            "output is not a pdf ({} bytes)",
            pdf.len()
        )));
    }
    Ok(pdf)
}
