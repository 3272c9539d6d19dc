//! Core behaviors shared by the HTTP handlers.
//!
//! This includes:
//!   - the prediction pipeline (clean → lemmatize → encode → classify → sentence)
//!   - precomputing the model's labels over the test split
//!   - resolving the caller's session and scoring submitted answers

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::dataset::{Dataset, PredictionTable};
use crate::domain::{Label, PredictionResult, ScoreReport};
use crate::encoder::SequenceEncoder;
use crate::error::AppError;
use crate::model::{argmax, Classifier};
use crate::normalize::{normalize, Lemmatizer};
use crate::scoring::score;
use crate::session::ChallengeSession;
use crate::state::AppState;
use crate::util::{format_significant, trunc_for_log};

/// Wraps normalizer, encoder and classifier into a single call.
#[derive(Clone)]
pub struct Predictor {
  lemmatizer: Arc<dyn Lemmatizer>,
  encoder: Arc<SequenceEncoder>,
  classifier: Arc<dyn Classifier>,
}

impl Predictor {
  pub fn new(
    lemmatizer: Arc<dyn Lemmatizer>,
    encoder: Arc<SequenceEncoder>,
    classifier: Arc<dyn Classifier>,
  ) -> Self {
    Self { lemmatizer, encoder, classifier }
  }

  #[instrument(level = "debug", skip(self, text), fields(text_len = text.len()))]
  pub fn predict(&self, text: &str) -> Result<PredictionResult, AppError> {
    let normalized = normalize(text, self.lemmatizer.as_ref());
    let sequence = self.encoder.encode(&normalized);
    let probabilities = self.classifier.predict_proba(&sequence)?;
    let label = Label::from_index(argmax(&probabilities))
      .ok_or_else(|| AppError::ExternalModelFailure("classifier returned no label".into()))?;
    let confidence = probabilities[label.index()] * 100.0;
    let sentence = format!(
      "I'm {}% sure that's {}.",
      format_significant(confidence as f64, 4),
      label.describe()
    );
    debug!(target: "tweetrater", normalized = %trunc_for_log(&normalized, 120), %label, confidence, "Prediction");
    Ok(PredictionResult { label, confidence, probabilities, sentence })
  }

  /// Model label for every test sample, as the offline prediction table would hold it.
  #[instrument(level = "info", skip_all, fields(test = dataset.test_ids().len()))]
  pub fn precompute_test_predictions(&self, dataset: &Dataset) -> Result<PredictionTable, AppError> {
    let mut table = HashMap::with_capacity(dataset.test_ids().len());
    for sample in dataset.test_samples() {
      table.insert(sample.id, self.predict(&sample.text)?.label);
    }
    info!(target: "tweetrater", rows = table.len(), "Precomputed test-split predictions");
    Ok(table)
  }
}

/// Run a prediction for the HTTP layer.
#[instrument(level = "info", skip(state, text), fields(text_len = text.len()))]
pub async fn do_predict(state: &AppState, text: &str) -> Result<PredictionResult, AppError> {
  state.predictor.predict(text)
}

/// The caller's current challenge batch. Missing or empty sessions have nothing to score.
#[instrument(level = "debug", skip(state))]
pub async fn active_session(state: &AppState, token: Option<&str>) -> Result<ChallengeSession, AppError> {
  let session = match token {
    Some(t) => state.challenges.session(t).await,
    None => None,
  };
  match session {
    Some(s) if !s.is_empty() => Ok(s),
    _ => Err(AppError::NoActiveChallenge),
  }
}

/// Score decoded answers against the stored ground truth and model predictions.
pub fn score_answers(
  state: &AppState,
  session: &ChallengeSession,
  answers: &HashMap<u64, Label>,
) -> Result<ScoreReport, AppError> {
  score(session, answers, state.challenges.dataset().ground_truth(), &state.predictions)
}
