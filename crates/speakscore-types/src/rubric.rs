//! Rubric definitions for the configured assessment standards
//!
//! Each standard carries its own criteria, score scale and CEFR band table.
//! The two built-in standards mirror the TOEFL iBT Speaking (0-4) and IELTS
//! Speaking (0-9) rubrics.

use serde::{Deserialize, Serialize};

pub const TOEFL_STANDARD_ID: &str = "toefl";
pub const IELTS_STANDARD_ID: &str = "ielts";

/// Inclusive score bounds for a standard
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreScale {
    pub min: f64,
    pub max: f64,
}

impl ScoreScale {
    pub fn contains(&self, score: f64) -> bool {
        score >= self.min && score <= self.max
    }
}

/// One scored dimension of a standard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Criterion {
    pub id: String,
    pub label: String,
    /// Relative weight; weights are normalized at aggregation time and need
    /// not sum to 1.
    pub weight: f64,
}

impl Criterion {
    pub fn new(id: &str, label: &str, weight: f64) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            weight,
        }
    }
}

/// Upper-bound-inclusive CEFR band table row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CefrBand {
    pub max_score: f64,
    pub label: String,
}

/// A complete scoring rubric for one assessment standard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardDefinition {
    pub id: String,
    pub label: String,
    pub scale: ScoreScale,
    pub criteria: Vec<Criterion>,
    pub cefr_bands: Vec<CefrBand>,
}

impl StandardDefinition {
    /// Map an overall score into a CEFR label. Total over `[min, max]`:
    /// the first band whose upper bound covers the score wins, and anything
    /// at or above the last bound takes the top band.
    pub fn cefr_for(&self, overall: f64) -> String {
        for band in &self.cefr_bands {
            if overall <= band.max_score {
                return band.label.clone();
            }
        }
        self.cefr_bands
            .last()
            .map(|b| b.label.clone())
            .unwrap_or_else(|| "Undetermined".to_string())
    }

    pub fn criterion(&self, id: &str) -> Option<&Criterion> {
        self.criteria.iter().find(|c| c.id == id)
    }
}

/// TOEFL-like standard: four criteria on a 0-4 scale
pub fn toefl_standard() -> StandardDefinition {
    StandardDefinition {
        id: TOEFL_STANDARD_ID.to_string(),
        label: "TOEFL Speaking (0-4)".to_string(),
        scale: ScoreScale { min: 0.0, max: 4.0 },
        criteria: vec![
            Criterion::new("delivery", "Delivery", 0.25),
            Criterion::new("language_use", "Language Use", 0.35),
            Criterion::new("topic_dev", "Topic Development", 0.25),
            Criterion::new("task", "Task Fulfillment", 0.15),
        ],
        cefr_bands: vec![
            CefrBand {
                max_score: 1.0,
                label: "A1/A2".to_string(),
            },
            CefrBand {
                max_score: 2.0,
                label: "B1".to_string(),
            },
            CefrBand {
                max_score: 3.0,
                label: "B2".to_string(),
            },
            CefrBand {
                max_score: 3.5,
                label: "C1".to_string(),
            },
            CefrBand {
                max_score: 4.0,
                label: "C2".to_string(),
            },
        ],
    }
}

/// IELTS-like standard: four equally weighted criteria on a 0-9 band scale
pub fn ielts_standard() -> StandardDefinition {
    StandardDefinition {
        id: IELTS_STANDARD_ID.to_string(),
        label: "IELTS Speaking (0-9)".to_string(),
        scale: ScoreScale { min: 0.0, max: 9.0 },
        criteria: vec![
            Criterion::new("fluency_coherence", "Fluency & Coherence", 1.0),
            Criterion::new("lexical", "Lexical Resource", 1.0),
            Criterion::new("grammar", "Grammatical Range & Accuracy", 1.0),
            Criterion::new("pron", "Pronunciation", 1.0),
        ],
        cefr_bands: vec![
            CefrBand {
                max_score: 2.5,
                label: "A1".to_string(),
            },
            CefrBand {
                max_score: 3.5,
                label: "A2".to_string(),
            },
            CefrBand {
                max_score: 5.0,
                label: "B1".to_string(),
            },
            CefrBand {
                max_score: 6.5,
                label: "B2".to_string(),
            },
            CefrBand {
                max_score: 8.0,
                label: "C1".to_string(),
            },
            CefrBand {
                max_score: 9.0,
                label: "C2".to_string(),
            },
        ],
    }
}

/// The standards every evaluation runs against, in a fixed order
pub fn default_standards() -> Vec<StandardDefinition> {
    vec![toefl_standard(), ielts_standard()]
}

/// Parse a CEFR label into a sub-level index used for crosswalk distance math.
///
/// Full bands are two sub-levels apart (A1=0, A2=2, B1=4, B2=6, C1=8, C2=10);
/// a `+` suffix adds one, and the composite TOEFL bottom band `A1/A2` sits
/// between A1 and A2. Returns `None` for anything unrecognized.
pub fn cefr_sublevel(label: &str) -> Option<i32> {
    let normalized = label.trim().to_ascii_uppercase();
    if normalized == "A1/A2" {
        return Some(1);
    }
    let (base, plus) = match normalized.strip_suffix('+') {
        Some(stripped) => (stripped, 1),
        None => (normalized.as_str(), 0),
    };
    let band = match base {
        "A1" => 0,
        "A2" => 1,
        "B1" => 2,
        "B2" => 3,
        "C1" => 4,
        "C2" => 5,
        _ => return None,
    };
    Some(band * 2 + plus)
}
