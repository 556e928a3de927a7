use std::path::PathBuf;
use std::time::Duration;

/// Failures that abort a single render call.
///
/// Malformed report data is never an error here: ratings, dates and enums are
/// defaulted during normalization. Everything below is fatal to the call and
/// is returned after the browser session (if any) has been released.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The HTML template could not be read. There is no fallback template.
    #[error("failed to load report template {path}: {source}")]
    Template {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No browser executable could be resolved for the active strategy.
    #[error("no headless browser executable found ({0})")]
    ExecutableNotFound(String),

    /// The serverless Chromium pack could not be fetched or unpacked.
    #[error("failed to fetch chromium pack from {url}: {message}")]
    PackDownload { url: String, message: String },

    /// The browser process could not be started or prepared.
    #[error("failed to launch browser: {0}")]
    Launch(String),

    /// The page could not be loaded or printed.
    #[error("browser failed to render page: {0}")]
    Render(String),

    /// The browser finished but produced no usable PDF.
    #[error("pdf extraction failed: {0}")]
    Extraction(String),

    /// The whole render exceeded its time budget.
    #[error("render timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RenderError>;
