//! Report template materialization.
//!
//! The visual design lives in an external HTML template. Only its first
//! `<style>` block is used; the document structure is generated here from the
//! normalized report so that conditional sections stay in code.

use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{RenderError, Result};
use crate::html::date::format_date_dd_mmm_yyyy;
use crate::report::model::{NormalizedReport, Recommendation};
use crate::report::score::RatingColor;

static STYLE_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<style[^>]*>(.*?)</style>").expect("valid style regex"));

/// How free-text report fields are inserted into markup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Interpolation {
    /// HTML-escape every user-supplied value.
    #[default]
    Escape,
    /// Insert values exactly as submitted. Callers must pre-sanitize.
    Verbatim,
}

impl Interpolation {
    pub fn apply<'a>(self, value: &'a str) -> Cow<'a, str> {
        match self {
            Interpolation::Escape => escape_html(value),
            Interpolation::Verbatim => Cow::Borrowed(value),
        }
    }
}

/// Escape the five HTML-significant characters.
pub fn escape_html(value: &str) -> Cow<'_, str> {
    if !value.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(value);
    }
    let mut out = String::with_capacity(value.len() + 16);
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    Cow::Owned(out)
}

/// Body of the first `<style>` element, or empty when there is none.
pub fn extract_style(markup: &str) -> String {
    STYLE_BLOCK
        .captures(markup)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Stylesheet taken from a report template file.
#[derive(Debug, Clone)]
pub struct TemplateSource {
    path: Option<PathBuf>,
    css: String,
}

impl TemplateSource {
    /// Load a template from disk. A missing or unreadable file is fatal.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let markup = fs::read_to_string(path).map_err(|source| RenderError::Template {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            path: Some(path.to_path_buf()),
            css: extract_style(&markup),
        })
    }

    pub fn from_markup(markup: &str) -> Self {
        Self {
            path: None,
            css: extract_style(markup),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn css(&self) -> &str {
        &self.css
    }
}

/// Verdict banner colors: gradient start, gradient end, accent.
fn verdict_scheme(recommendation: Recommendation) -> (&'static str, &'static str, &'static str) {
    match recommendation {
        Recommendation::Approved => ("#16a34a", "#15803d", "#bbf7d0"),
        Recommendation::Rejected => ("#dc2626", "#b91c1c", "#fecaca"),
    }
}

fn yes_no_color(yes: bool) -> RatingColor {
    if yes {
        RatingColor::Success
    } else {
        RatingColor::Danger
    }
}

fn has_text(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Build the complete report document.
pub fn build_html(
    report: &NormalizedReport<'_>,
    template: &TemplateSource,
    logo_data_url: &str,
    mode: Interpolation,
) -> String {
    let data = report.data;
    let text = |value: &str| mode.apply(value).into_owned();
    let date = format_date_dd_mmm_yyyy(&data.date);

    let mut html = String::with_capacity(template.css().len() + 8 * 1024);

    html.push_str(&format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Milestone Report - {title}</title>
<style>{css}</style>
</head>
<body>
<main class="report">
<header class="report-header">
  <img class="logo" src="{logo}" alt="Deep Funding logo">
  <div class="heading">
    <h1>Milestone Review Report</h1>
    <p class="subtitle">{title}</p>
  </div>
  <div class="report-date">{date}</div>
</header>
"#,
        title = text(&data.proposal_title),
        css = template.css(),
        logo = logo_data_url,
        date = date,
    ));

    let verified = data.verification_status.is_yes();
    html.push_str(&format!(
        r#"<section class="meta">
  <div class="meta-item"><span class="meta-label">Reviewer</span><span class="meta-value">{reviewer}</span></div>
  <div class="meta-item"><span class="meta-label">Proposal ID</span><span class="meta-value">{proposal_id}</span></div>
  <div class="meta-item"><span class="meta-label">Proposal</span><span class="meta-value"><a href="{proposal_link}">{proposal_link}</a></span></div>
  <div class="meta-item"><span class="meta-label">Milestone</span><span class="meta-value">#{milestone_number} {milestone_title}</span></div>
  <div class="meta-item"><span class="meta-label">Milestone Budget</span><span class="meta-value">{budget}</span></div>
  <div class="meta-item"><span class="meta-label">Review Date</span><span class="meta-value">{date}</span></div>
  <div class="meta-item"><span class="meta-label">Verification</span><span class="badge" style="background:{verified_color}">{verified}</span></div>
</section>
"#,
        reviewer = text(&data.reviewer_handle),
        proposal_id = text(&data.proposal_id),
        proposal_link = text(&data.proposal_link),
        milestone_number = text(&data.milestone_number),
        milestone_title = text(&data.milestone_title),
        budget = text(&data.milestone_budget_amount),
        date = date,
        verified_color = yes_no_color(verified),
        verified = data.verification_status.as_str(),
    ));

    html.push_str(&format!(
        r#"<section class="milestone">
  <h2>Milestone Description</h2>
  <p class="description">{description}</p>
  <h3>Deliverable</h3>
  <p><a class="deliverable-link" href="{deliverable}">{deliverable}</a></p>
</section>
"#,
        description = text(&data.milestone_description_from_proposal),
        deliverable = text(&data.deliverable_link),
    ));

    if data.demo_provided.is_yes() {
        html.push_str("<section class=\"demo-block\">\n  <h3>Demo Provided</h3>\n");
        if has_text(&data.test_run_link) {
            html.push_str(&format!(
                "  <p>Test run: <a class=\"test-run-link\" href=\"{link}\">{link}</a></p>\n",
                link = text(&data.test_run_link),
            ));
        }
        html.push_str("</section>\n");
    }

    html.push_str(&format!(
        r#"<section class="criteria">
  <div class="score-card">
    <span class="score-label">Criteria Score</span>
    <span class="score-value">{score}</span>
  </div>
"#,
        score = report.score_display(),
    ));

    for evaluation in &report.criteria {
        html.push_str(&format!(
            r#"  <div class="criterion">
    <div class="criterion-head"><span class="criterion-title">{title}</span><span class="badge" style="background:{color}">{label}</span></div>
"#,
            title = evaluation.criterion.title(),
            color = evaluation.rating.color(),
            label = evaluation.rating.label(),
        ));
        if has_text(evaluation.justification) {
            html.push_str(&format!(
                "    <div class=\"justification\">{}</div>\n",
                text(evaluation.justification)
            ));
        }
        html.push_str("  </div>\n");
    }
    html.push_str("</section>\n");

    let recommendation = data.final_recommendation;
    let (from, to, accent) = verdict_scheme(recommendation);
    let modifier = match recommendation {
        Recommendation::Approved => "approved",
        Recommendation::Rejected => "rejected",
    };
    html.push_str(&format!(
        r#"<section class="verdict-banner verdict-{modifier}" style="background:linear-gradient(135deg, {from} 0%, {to} 100%);border-left:6px solid {accent}">
  <h2>Final Recommendation: {verdict}</h2>
"#,
        verdict = recommendation.as_str(),
    ));

    match recommendation {
        Recommendation::Approved => {
            if has_text(&data.approved_why) {
                html.push_str(&format!(
                    "  <div class=\"rationale\"><h3>Why approved</h3><p>{}</p></div>\n",
                    text(&data.approved_why)
                ));
            }
        }
        Recommendation::Rejected => {
            if has_text(&data.rejected_why) {
                html.push_str(&format!(
                    "  <div class=\"rationale\"><h3>Why rejected</h3><p>{}</p></div>\n",
                    text(&data.rejected_why)
                ));
            }
            if has_text(&data.suggested_changes) {
                html.push_str(&format!(
                    "  <div class=\"suggested-changes\"><h3>Suggested changes</h3><p>{}</p></div>\n",
                    text(&data.suggested_changes)
                ));
            }
        }
    }

    html.push_str(
        "</section>\n<footer class=\"report-footer\">Deep Funding Review Circle</footer>\n</main>\n</body>\n</html>\n",
    );
    html
}
