use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::report::model::Recommendation;
use crate::report::score::format_score;

/// A finished PDF together with the facts callers need to store and index it.
#[derive(Debug, Clone)]
pub struct RenderedReport {
    pub pdf: Vec<u8>,
    pub summary: RenderSummary,
}

/// Serializable description of a rendered report.
///
/// The digest depends only on the PDF bytes, so callers can use it as a
/// content address when uploading to object storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderSummary {
    pub size_bytes: u64,
    pub sha256: String,
    pub criteria_score: f64,
    pub score_display: String,
    pub recommendation: Recommendation,
}

impl RenderedReport {
    pub fn new(pdf: Vec<u8>, criteria_score: f64, recommendation: Recommendation) -> Self {
        let digest = Sha256::digest(&pdf);
        let summary = RenderSummary {
            size_bytes: pdf.len() as u64,
            sha256: hex::encode(digest),
            criteria_score,
            score_display: format_score(criteria_score),
            recommendation,
        };
        Self { pdf, summary }
    }
}

/// Human-readable one-screen summary.
pub fn render_text(summary: &RenderSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!("Recommendation: {}\n", summary.recommendation));
    out.push_str(&format!("Criteria score: {}\n", summary.score_display));
    out.push_str(&format!("PDF size: {} bytes\n", summary.size_bytes));
    out.push_str(&format!("SHA-256: {}\n", summary.sha256));
    out
}
