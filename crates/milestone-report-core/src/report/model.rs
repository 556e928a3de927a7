use serde::{Deserialize, Deserializer, Serialize};

use crate::report::score::{self, Rating};

/// One reviewer evaluation of a project milestone.
///
/// This is the JSON record posted by the milestone-report submission form.
/// Deserialization is lenient: every field is optional, numeric fields may
/// arrive as strings or numbers, and unknown enum values fall back to the
/// conservative variant. The record is never mutated by the renderer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MilestoneReportData {
    #[serde(deserialize_with = "display_string")]
    pub reviewer_handle: String,
    #[serde(deserialize_with = "display_string")]
    pub proposal_link: String,
    #[serde(deserialize_with = "display_string")]
    pub proposal_title: String,
    #[serde(deserialize_with = "display_string")]
    pub proposal_id: String,
    #[serde(deserialize_with = "display_string")]
    pub milestone_title: String,
    #[serde(deserialize_with = "display_string")]
    pub milestone_number: String,
    #[serde(deserialize_with = "display_string")]
    pub milestone_budget_amount: String,
    #[serde(deserialize_with = "display_string")]
    pub date: String,

    pub demo_provided: YesNo,
    #[serde(deserialize_with = "display_string")]
    pub test_run_link: String,
    pub verification_status: YesNo,

    #[serde(deserialize_with = "display_string")]
    pub milestone_description_from_proposal: String,
    #[serde(deserialize_with = "display_string")]
    pub deliverable_link: String,

    #[serde(deserialize_with = "display_string")]
    pub q_deliverables_met: String,
    #[serde(deserialize_with = "display_string")]
    pub q_quality_completeness: String,
    #[serde(deserialize_with = "display_string")]
    pub q_evidence_accessibility: String,
    #[serde(deserialize_with = "display_string")]
    pub q_budget_alignment: String,

    #[serde(deserialize_with = "display_string")]
    pub j_deliverables_met: String,
    #[serde(deserialize_with = "display_string")]
    pub j_quality_completeness: String,
    #[serde(deserialize_with = "display_string")]
    pub j_evidence_accessibility: String,
    #[serde(deserialize_with = "display_string")]
    pub j_budget_alignment: String,

    pub final_recommendation: Recommendation,
    #[serde(deserialize_with = "display_string")]
    pub approved_why: String,
    #[serde(deserialize_with = "display_string")]
    pub rejected_why: String,
    #[serde(deserialize_with = "display_string")]
    pub suggested_changes: String,
}

/// Yes/No form answer. Anything other than `"Yes"` reads as `No`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<String>")]
pub enum YesNo {
    Yes,
    #[default]
    No,
}

impl YesNo {
    pub fn is_yes(self) -> bool {
        self == YesNo::Yes
    }

    pub fn as_str(self) -> &'static str {
        match self {
            YesNo::Yes => "Yes",
            YesNo::No => "No",
        }
    }
}

impl From<Option<String>> for YesNo {
    fn from(value: Option<String>) -> Self {
        match value.as_deref().map(str::trim) {
            Some("Yes") => YesNo::Yes,
            _ => YesNo::No,
        }
    }
}

/// Final verdict. Anything other than `"Approved"` reads as `Rejected`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<String>")]
pub enum Recommendation {
    Approved,
    #[default]
    Rejected,
}

impl Recommendation {
    pub fn as_str(self) -> &'static str {
        match self {
            Recommendation::Approved => "Approved",
            Recommendation::Rejected => "Rejected",
        }
    }
}

impl From<Option<String>> for Recommendation {
    fn from(value: Option<String>) -> Self {
        match value.as_deref().map(str::trim) {
            Some("Approved") => Recommendation::Approved,
            _ => Recommendation::Rejected,
        }
    }
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four evaluation criteria, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Criterion {
    DeliverablesMet,
    QualityCompleteness,
    EvidenceAccessibility,
    BudgetAlignment,
}

impl Criterion {
    pub const ALL: [Criterion; 4] = [
        Criterion::DeliverablesMet,
        Criterion::QualityCompleteness,
        Criterion::EvidenceAccessibility,
        Criterion::BudgetAlignment,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Criterion::DeliverablesMet => "Deliverables Met",
            Criterion::QualityCompleteness => "Quality & Completeness",
            Criterion::EvidenceAccessibility => "Evidence Accessibility",
            Criterion::BudgetAlignment => "Budget Alignment",
        }
    }
}

/// A criterion with its normalized rating and the reviewer's justification.
#[derive(Debug, Clone, Copy)]
pub struct CriterionEvaluation<'a> {
    pub criterion: Criterion,
    pub rating: Rating,
    pub justification: &'a str,
}

/// Render-time view of a report: ratings defaulted, score computed.
#[derive(Debug, Clone)]
pub struct NormalizedReport<'a> {
    pub data: &'a MilestoneReportData,
    pub criteria: [CriterionEvaluation<'a>; 4],
    pub score: f64,
}

impl<'a> NormalizedReport<'a> {
    pub fn score_display(&self) -> String {
        score::format_score(self.score)
    }
}

impl MilestoneReportData {
    /// Raw rating codes in criterion order.
    pub fn rating_codes(&self) -> [&str; 4] {
        [
            &self.q_deliverables_met,
            &self.q_quality_completeness,
            &self.q_evidence_accessibility,
            &self.q_budget_alignment,
        ]
    }

    fn justifications(&self) -> [&str; 4] {
        [
            &self.j_deliverables_met,
            &self.j_quality_completeness,
            &self.j_evidence_accessibility,
            &self.j_budget_alignment,
        ]
    }

    /// Default missing ratings to Fully Met and compute the criteria score.
    ///
    /// Each rating is defaulted independently; the score is computed over the
    /// defaulted codes so that badges and score always agree.
    pub fn normalize(&self) -> NormalizedReport<'_> {
        let codes = self.rating_codes().map(default_rating_code);
        let justifications = self.justifications();

        let criteria = std::array::from_fn(|i| CriterionEvaluation {
            criterion: Criterion::ALL[i],
            rating: Rating::from_code(codes[i]),
            justification: justifications[i],
        });

        NormalizedReport {
            data: self,
            criteria,
            score: score::criteria_score(codes),
        }
    }
}

fn default_rating_code(code: &str) -> &str {
    if code.is_empty() { "1" } else { code }
}

/// Accepts a string, number, bool or null and keeps its display form.
fn display_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(s)) => s,
        Some(other) => other.to_string(),
    })
}
