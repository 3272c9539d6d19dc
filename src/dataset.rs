//! Backing tweet dataset: texts, ground-truth ratings and the train/test split.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::info;

use crate::domain::{Label, TextSample};
use crate::error::ArtifactError;

/// Model label per test sample id, computed offline or at startup.
pub type PredictionTable = HashMap<u64, Label>;

#[derive(Clone, Debug, Deserialize)]
pub struct LabeledSample {
  pub id: u64,
  pub text: String,
  pub rating: Label,
}

/// Dataset bundle as exported by the training pipeline.
#[derive(Clone, Debug, Deserialize)]
pub struct DatasetArtifact {
  pub samples: Vec<LabeledSample>,
  pub train_ids: Vec<u64>,
  pub test_ids: Vec<u64>,
}

#[derive(Debug)]
pub struct Dataset {
  texts: HashMap<u64, String>,
  ground_truth: HashMap<u64, Label>,
  train_by_rating: [Vec<u64>; 3],
  test_ids: Vec<u64>,
}

impl Dataset {
  pub fn new(a: DatasetArtifact) -> Result<Self, ArtifactError> {
    let mut texts = HashMap::with_capacity(a.samples.len());
    let mut ground_truth = HashMap::with_capacity(a.samples.len());
    for s in a.samples {
      if texts.insert(s.id, s.text).is_some() {
        return Err(ArtifactError::Shape(format!("duplicate sample id {}", s.id)));
      }
      ground_truth.insert(s.id, s.rating);
    }

    let check_split = |name: &str, ids: &[u64]| -> Result<(), ArtifactError> {
      let mut seen = HashSet::new();
      for id in ids {
        if !texts.contains_key(id) {
          return Err(ArtifactError::Shape(format!("{name} references unknown sample {id}")));
        }
        if !seen.insert(*id) {
          return Err(ArtifactError::Shape(format!("{name} lists sample {id} twice")));
        }
      }
      Ok(())
    };
    check_split("train_ids", &a.train_ids)?;
    check_split("test_ids", &a.test_ids)?;

    let mut train_by_rating: [Vec<u64>; 3] = Default::default();
    for id in a.train_ids {
      if let Some(label) = ground_truth.get(&id) {
        train_by_rating[label.index()].push(id);
      }
    }

    info!(
      target: "tweetrater",
      samples = texts.len(),
      train_inoffensive = train_by_rating[0].len(),
      train_offensive = train_by_rating[1].len(),
      train_hate = train_by_rating[2].len(),
      test = a.test_ids.len(),
      "Dataset loaded"
    );
    Ok(Self { texts, ground_truth, train_by_rating, test_ids: a.test_ids })
  }

  pub fn text(&self, id: u64) -> Option<&str> {
    self.texts.get(&id).map(String::as_str)
  }

  pub fn ground_truth(&self) -> &HashMap<u64, Label> {
    &self.ground_truth
  }

  /// Training sample ids whose stored rating equals `rating`.
  pub fn training_pool(&self, rating: Label) -> &[u64] {
    &self.train_by_rating[rating.index()]
  }

  pub fn test_ids(&self) -> &[u64] {
    &self.test_ids
  }

  pub fn sample(&self, id: u64) -> Option<TextSample> {
    self.text(id).map(|t| TextSample { id, text: t.to_string() })
  }

  pub fn test_samples(&self) -> impl Iterator<Item = TextSample> + '_ {
    self.test_ids.iter().filter_map(|id| self.sample(*id))
  }
}

/// Read and deserialize a JSON artifact.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
  let shown = path.display().to_string();
  let raw = std::fs::read_to_string(path)
    .map_err(|source| ArtifactError::Io { path: shown.clone(), source })?;
  let parsed = serde_json::from_str(&raw).map_err(|source| ArtifactError::Json { path: shown.clone(), source })?;
  info!(target: "tweetrater", path = %shown, bytes = raw.len(), "Loaded artifact");
  Ok(parsed)
}
