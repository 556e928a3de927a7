pub mod browser;
pub mod config;
pub mod error;
pub mod html;
pub mod pipeline;
pub mod report;

pub use config::RenderConfig;
pub use error::{RenderError, Result};
pub use pipeline::{RenderOptions, render_html_to_pdf, render_report, render_with};
pub use report::model::MilestoneReportData;
