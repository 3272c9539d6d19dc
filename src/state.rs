//! Application state: prediction pipeline, dataset, prediction table and session store.
//!
//! This module owns:
//!   - the predictor (lemmatizer + encoder + classifier)
//!   - the challenge store (dataset + per-token sessions)
//!   - the model's labels over the test split
//!   - the effective configuration
//!
//! Artifacts come from the configured JSON files. Without any configured
//! artifacts the built-in demo bundle from `seeds` is used.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::config::AppConfig;
use crate::dataset::{load_json, Dataset, DatasetArtifact, PredictionTable};
use crate::encoder::{SequenceEncoder, TokenizerArtifact};
use crate::error::ArtifactError;
use crate::logic::Predictor;
use crate::model::{ConvClassifier, ModelArtifact};
use crate::normalize::RuleLemmatizer;
use crate::seeds::{demo_dataset, demo_model, demo_tokenizer};
use crate::session::ChallengeStore;

pub struct AppState {
    pub config: AppConfig,
    pub predictor: Predictor,
    pub challenges: ChallengeStore,
    pub predictions: PredictionTable,
}

impl AppState {
    /// Build state from configuration: load artifacts, validate them against each
    /// other, and precompute predictions when no table was exported.
    #[instrument(level = "info", skip_all)]
    pub fn from_config(config: AppConfig) -> Result<Self, ArtifactError> {
        let paths = &config.artifacts;
        let (tokenizer, model, dataset): (TokenizerArtifact, ModelArtifact, DatasetArtifact) =
            if paths.is_empty() {
                info!(target: "tweetrater", "No artifacts configured. Using built-in demo bundle.");
                (demo_tokenizer(), demo_model(), demo_dataset())
            } else {
                match (&paths.tokenizer, &paths.model, &paths.dataset) {
                    (Some(t), Some(m), Some(d)) => (load_json(t)?, load_json(m)?, load_json(d)?),
                    _ => {
                        return Err(ArtifactError::Incomplete(
                            "tokenizer, model and dataset must be configured together".into(),
                        ))
                    }
                }
            };

        let classifier = ConvClassifier::new(model)?;
        let encoder = SequenceEncoder::from_artifact(&tokenizer);
        if encoder.max_index() as usize >= classifier.vocab_size() {
            return Err(ArtifactError::Shape(format!(
                "vocabulary index {} exceeds embedding table of {} rows",
                encoder.max_index(),
                classifier.vocab_size()
            )));
        }
        if encoder.max_len() < classifier.kernel_size() {
            return Err(ArtifactError::Shape(format!(
                "max_sequence_length {} is shorter than kernel size {}",
                encoder.max_len(),
                classifier.kernel_size()
            )));
        }

        // Tokenizer-provided lemma exceptions override the built-in ones.
        let lemmatizer = RuleLemmatizer::with_defaults().with_exceptions(tokenizer.lemmas);

        let predictor = Predictor::new(
            Arc::new(lemmatizer),
            Arc::new(encoder),
            Arc::new(classifier),
        );

        let dataset = Arc::new(Dataset::new(dataset)?);
        let predictions = match &paths.predictions {
            Some(p) => load_json::<PredictionTable>(p)?,
            None => predictor.precompute_test_predictions(&dataset)?,
        };
        let missing = dataset.test_ids().iter().filter(|id| !predictions.contains_key(*id)).count();
        if missing > 0 {
            return Err(ArtifactError::Incomplete(format!(
                "prediction table lacks {missing} test samples"
            )));
        }
        if predictions.len() > dataset.test_ids().len() {
            warn!(target: "tweetrater", rows = predictions.len(), test = dataset.test_ids().len(), "Prediction table has rows outside the test split");
        }

        let challenges = ChallengeStore::new(
            dataset,
            config.challenge.session_policy,
            config.challenge.max_sessions,
        );
        info!(target: "tweetrater", policy = ?config.challenge.session_policy, max_sessions = config.challenge.max_sessions, "Challenge store ready");

        Ok(Self { config, predictor, challenges, predictions })
    }
}
