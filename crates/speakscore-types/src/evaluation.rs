//! Evaluation result types produced by the dual-standard evaluator

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One criterion's score and justification, as returned by the oracle
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CriterionAssessment {
    pub score: f64,
    pub comment: String,
}

/// A recurrent language error with a suggested correction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommonError {
    pub issue: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    pub fix: String,
}

/// Outcome of one standard's evaluation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluationStatus {
    Ok,
    Failed,
}

/// A full per-standard evaluation. Immutable once constructed; a failed
/// standard keeps its slot in the response with `overall` and `cefr` unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardEvaluation {
    pub standard_id: String,
    pub label: String,
    pub overall: Option<f64>,
    pub cefr: Option<String>,
    #[serde(default)]
    pub criteria: BTreeMap<String, CriterionAssessment>,
    #[serde(default)]
    pub criterion_labels: BTreeMap<String, String>,
    #[serde(default)]
    pub common_errors: Vec<CommonError>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub evidence_quotes: Vec<String>,
    pub status: EvaluationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StandardEvaluation {
    /// Placeholder entry for a standard whose oracle call or validation
    /// failed. Downstream rendering never has to branch on a missing entry.
    pub fn failed(standard_id: &str, label: &str, error: impl Into<String>) -> Self {
        Self {
            standard_id: standard_id.to_string(),
            label: label.to_string(),
            overall: None,
            cefr: None,
            criteria: BTreeMap::new(),
            criterion_labels: BTreeMap::new(),
            common_errors: Vec::new(),
            recommendations: Vec::new(),
            evidence_quotes: Vec::new(),
            status: EvaluationStatus::Failed,
            error: Some(error.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == EvaluationStatus::Ok
    }
}

/// Deterministic reconciliation of the per-standard CEFR estimates
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CrosswalkSummary {
    pub consensus_cefr: String,
    pub notes: String,
    pub strengths: Vec<String>,
    pub focus: Vec<String>,
}

/// Session metadata echoed into the evaluation response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    pub id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_sec: i64,
    pub turns: u32,
}

/// The unit persisted into a report: both standards, the crosswalk, and
/// denormalized convenience fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DualEvaluationResponse {
    pub session: SessionInfo,
    pub standards: Vec<StandardEvaluation>,
    pub crosswalk: CrosswalkSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warnings: Option<Vec<String>>,
    pub session_id: String,
    pub cefr_level: String,
    pub generated_at: DateTime<Utc>,
}

impl DualEvaluationResponse {
    pub fn standard(&self, standard_id: &str) -> Option<&StandardEvaluation> {
        self.standards.iter().find(|s| s.standard_id == standard_id)
    }
}
