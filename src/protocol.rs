//! Public request/response structs for the HTTP endpoints (serde ready).
//! Field names match what the page scripts send and read.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{Label, PredictionResult};
use crate::error::AppError;
use crate::scoring::Answer;

/// Query string or form body of `/predict/`.
#[derive(Debug, Deserialize)]
pub struct PredictQuery {
    pub tweet: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PredictOut {
    pub prediction: String,
    pub rating: u8,
    pub confidence: f32,
    pub probabilities: [f32; 3],
}

impl From<PredictionResult> for PredictOut {
    fn from(r: PredictionResult) -> Self {
        Self {
            prediction: r.sentence,
            rating: r.label.into(),
            confidence: r.confidence,
            probabilities: r.probabilities,
        }
    }
}

// Numbers arrive as raw strings so that a malformed value gets our own 400
// body instead of the extractor's plain-text rejection.
#[derive(Debug, Deserialize)]
pub struct TrainingQuery {
    pub rating: Option<String>,
    pub n_samples: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TrainingOut {
    pub training_samples: Vec<String>,
}

/// `n_tweets` is what the challenge page sends; `n_samples` is accepted too.
#[derive(Debug, Deserialize)]
pub struct TestQuery {
    pub n_tweets: Option<String>,
    pub n_samples: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TestOut {
    pub test_tweets: Vec<String>,
    pub test_ids: Vec<u64>,
}

/// Explicit answers for `/api/results/`, keyed by sample id.
#[derive(Debug, Deserialize)]
pub struct ResultsIn {
    pub answers: Vec<AnswerIn>,
}

/// `label` stays raw here so an out-of-range value is reported as such
/// rather than as a body deserialization failure.
#[derive(Debug, Deserialize)]
pub struct AnswerIn {
    pub id: u64,
    pub label: Value,
}

impl ResultsIn {
    pub fn into_answers(self) -> Result<Vec<Answer>, AppError> {
        self.answers
            .into_iter()
            .map(|a| {
                let raw = match a.label {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                Ok(Answer { id: a.id, label: Label::parse(&raw)? })
            })
            .collect()
    }
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
    pub sessions: usize,
}
