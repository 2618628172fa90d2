//! CEFR crosswalk aggregator
//!
//! Reconciles the independently scored standards into one consensus CEFR
//! band plus strengths/focus lists. Deterministic, no model call, and
//! symmetric under the order of its inputs: standards are processed sorted
//! by id.

use speakscore_types::{
    cefr_sublevel, CrosswalkSummary, StandardDefinition, StandardEvaluation,
};
use tracing::debug;

/// Tunable reconciliation thresholds. The exact cutoffs are policy, not
/// constants: the disagreement rule in particular is configurable because
/// the source material only pins "at most one sub-level" loosely.
#[derive(Debug, Clone)]
pub struct CrosswalkPolicy {
    /// Estimates within this many sub-levels take the higher band;
    /// anything wider falls back to the conservative one.
    pub max_sublevel_gap: i32,
    /// Normalized score (score / scale.max) at or above which a criterion
    /// counts as a strength.
    pub strength_threshold: f64,
    /// Normalized score at or below which a criterion is a focus area.
    pub focus_threshold: f64,
    /// Smallest normalized cross-standard dimension gap worth citing in the
    /// notes.
    pub gap_note_threshold: f64,
}

impl Default for CrosswalkPolicy {
    fn default() -> Self {
        Self {
            max_sublevel_gap: 1,
            strength_threshold: 0.75,
            focus_threshold: 0.5,
            gap_note_threshold: 0.15,
        }
    }
}

const UNDETERMINED: &str = "Undetermined";

/// Reconcile per-standard evaluations into one crosswalk summary.
pub fn reconcile(
    standards: &[StandardEvaluation],
    definitions: &[StandardDefinition],
    policy: &CrosswalkPolicy,
) -> CrosswalkSummary {
    let mut ok: Vec<&StandardEvaluation> = standards.iter().filter(|s| s.is_ok()).collect();
    ok.sort_by(|a, b| a.standard_id.cmp(&b.standard_id));

    let (strengths, focus) = strengths_and_focus(&ok, definitions, policy);

    match ok.as_slice() {
        [] => CrosswalkSummary {
            consensus_cefr: UNDETERMINED.to_string(),
            notes: "No standard produced a usable evaluation.".to_string(),
            strengths,
            focus,
        },
        [only] => {
            let consensus = only.cefr.clone().unwrap_or_else(|| UNDETERMINED.to_string());
            CrosswalkSummary {
                notes: format!(
                    "Only {} produced a result; the consensus CEFR {consensus} relies on a \
                     single standard.",
                    only.label
                ),
                consensus_cefr: consensus,
                strengths,
                focus,
            }
        }
        [first, second, ..] => {
            let (consensus, mut notes) = consensus_of_pair(first, second, policy);
            if let Some(gap_note) = dimension_gap_note(first, second, definitions, policy) {
                notes.push(' ');
                notes.push_str(&gap_note);
            }
            CrosswalkSummary {
                consensus_cefr: consensus,
                notes,
                strengths,
                focus,
            }
        }
    }
}

/// Consensus band for two successful standards plus the base note
fn consensus_of_pair(
    first: &StandardEvaluation,
    second: &StandardEvaluation,
    policy: &CrosswalkPolicy,
) -> (String, String) {
    let first_cefr = first.cefr.as_deref().unwrap_or(UNDETERMINED);
    let second_cefr = second.cefr.as_deref().unwrap_or(UNDETERMINED);

    let (first_level, second_level) = match (cefr_sublevel(first_cefr), cefr_sublevel(second_cefr))
    {
        (Some(a), Some(b)) => (a, b),
        (Some(_), None) => {
            return (
                first_cefr.to_string(),
                format!(
                    "{} reported an unrecognized CEFR estimate; the consensus follows {}.",
                    second.label, first.label
                ),
            )
        }
        (None, Some(_)) => {
            return (
                second_cefr.to_string(),
                format!(
                    "{} reported an unrecognized CEFR estimate; the consensus follows {}.",
                    first.label, second.label
                ),
            )
        }
        (None, None) => {
            return (
                UNDETERMINED.to_string(),
                "Neither standard reported a recognizable CEFR estimate.".to_string(),
            )
        }
    };

    let gap = (first_level - second_level).abs();
    debug!(first_cefr, second_cefr, gap, "Reconciling CEFR estimates");

    if gap <= policy.max_sublevel_gap {
        // Agreement within one sub-level: the higher estimate stands.
        let higher = if first_level >= second_level {
            first_cefr
        } else {
            second_cefr
        };
        let notes = if gap == 0 {
            format!("Both standards agree on CEFR {higher}.")
        } else {
            format!(
                "{} ({first_cefr}) and {} ({second_cefr}) agree within {}; \
                 consensus CEFR {higher}.",
                first.label,
                second.label,
                sublevel_count(policy.max_sublevel_gap)
            )
        };
        (higher.to_string(), notes)
    } else {
        // Substantial disagreement: favor the conservative estimate.
        let lower = if first_level <= second_level {
            first_cefr
        } else {
            second_cefr
        };
        let notes = format!(
            "{} ({first_cefr}) and {} ({second_cefr}) disagree by more than {}; \
             adopting the more conservative CEFR {lower}.",
            first.label,
            second.label,
            sublevel_count(policy.max_sublevel_gap)
        );
        (lower.to_string(), notes)
    }
}

fn sublevel_count(count: i32) -> String {
    if count == 1 {
        "one sub-level".to_string()
    } else {
        format!("{count} sub-levels")
    }
}

/// Cite the largest normalized gap between the standards' comparable
/// (position-paired) dimensions, when it clears the policy threshold.
fn dimension_gap_note(
    first: &StandardEvaluation,
    second: &StandardEvaluation,
    definitions: &[StandardDefinition],
    policy: &CrosswalkPolicy,
) -> Option<String> {
    let first_def = definitions.iter().find(|d| d.id == first.standard_id)?;
    let second_def = definitions.iter().find(|d| d.id == second.standard_id)?;

    let mut largest: Option<(String, String, f64)> = None;
    let pairs = first_def.criteria.len().min(second_def.criteria.len());
    for index in 0..pairs {
        let a = &first_def.criteria[index];
        let b = &second_def.criteria[index];
        let (Some(score_a), Some(score_b)) =
            (first.criteria.get(&a.id), second.criteria.get(&b.id))
        else {
            continue;
        };
        let gap =
            (score_a.score / first_def.scale.max - score_b.score / second_def.scale.max).abs();
        if largest.as_ref().map_or(true, |(_, _, g)| gap > *g) {
            largest = Some((a.label.clone(), b.label.clone(), gap));
        }
    }

    let (label_a, label_b, gap) = largest?;
    if gap < policy.gap_note_threshold {
        return None;
    }
    Some(format!(
        "Largest cross-standard gap: {label_a} vs {label_b} ({:.0}% of scale).",
        gap * 100.0
    ))
}

/// Strength and focus lists across the surviving standards, deduplicated by
/// label and sorted for order-independence.
fn strengths_and_focus(
    ok: &[&StandardEvaluation],
    definitions: &[StandardDefinition],
    policy: &CrosswalkPolicy,
) -> (Vec<String>, Vec<String>) {
    let mut strengths = Vec::new();
    let mut focus = Vec::new();

    for evaluation in ok {
        let Some(def) = definitions.iter().find(|d| d.id == evaluation.standard_id) else {
            continue;
        };
        for criterion in &def.criteria {
            let Some(assessment) = evaluation.criteria.get(&criterion.id) else {
                continue;
            };
            let normalized = assessment.score / def.scale.max;
            if normalized >= policy.strength_threshold {
                strengths.push(criterion.label.clone());
            } else if normalized <= policy.focus_threshold {
                focus.push(criterion.label.clone());
            }
        }
    }

    (dedupe_sorted(strengths), dedupe_sorted(focus))
}

fn dedupe_sorted(mut labels: Vec<String>) -> Vec<String> {
    labels.sort();
    labels.dedup_by(|a, b| a.eq_ignore_ascii_case(b));
    labels
}
