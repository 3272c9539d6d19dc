//! Domain models: the label set, dataset samples, predictions and score reports.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// The three classification outcomes of the model and of the human raters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Label {
  Inoffensive,
  Offensive,
  HateSpeech,
}

impl Label {
  pub const ALL: [Label; 3] = [Label::Inoffensive, Label::Offensive, Label::HateSpeech];

  pub fn index(self) -> usize {
    match self {
      Label::Inoffensive => 0,
      Label::Offensive => 1,
      Label::HateSpeech => 2,
    }
  }

  pub fn from_index(i: usize) -> Option<Label> {
    Label::ALL.get(i).copied()
  }

  /// Tail of the prediction sentence, e.g. "not offensive".
  pub fn describe(self) -> &'static str {
    match self {
      Label::Inoffensive => "not offensive",
      Label::Offensive => "offensive",
      Label::HateSpeech => "hate speech",
    }
  }

  pub fn name(self) -> &'static str {
    match self {
      Label::Inoffensive => "inoffensive",
      Label::Offensive => "offensive",
      Label::HateSpeech => "hate speech",
    }
  }

  /// Parse a label submitted as text ("0", "1" or "2").
  pub fn parse(raw: &str) -> Result<Label, AppError> {
    raw.trim()
      .parse::<usize>()
      .ok()
      .and_then(Label::from_index)
      .ok_or_else(|| AppError::LabelOutOfRange(raw.to_string()))
  }
}

impl TryFrom<u8> for Label {
  type Error = String;

  fn try_from(v: u8) -> Result<Self, Self::Error> {
    Label::from_index(v as usize).ok_or_else(|| format!("label must be 0, 1 or 2 (got {v})"))
  }
}

impl From<Label> for u8 {
  fn from(l: Label) -> u8 {
    l.index() as u8
  }
}

impl fmt::Display for Label {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.index())
  }
}

/// A dataset row as served to the quiz. `id` is its position in the backing dataset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSample {
  pub id: u64,
  pub text: String,
}

/// Output of one prediction request.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PredictionResult {
  pub label: Label,
  /// Probability of `label`, as a percentage.
  pub confidence: f32,
  pub probabilities: [f32; 3],
  pub sentence: String,
}

/// One aligned line of the results table.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScoreRow {
  pub id: u64,
  pub text: String,
  pub user: Label,
  pub model: Label,
  pub truth: Label,
}

impl ScoreRow {
  pub fn user_correct(&self) -> bool { self.user == self.truth }
  pub fn model_correct(&self) -> bool { self.model == self.truth }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScoreReport {
  pub rows: Vec<ScoreRow>,
  pub model_accuracy: f64,
  pub user_accuracy: f64,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_accepts_only_the_three_labels() {
    assert_eq!(Label::parse("0").unwrap(), Label::Inoffensive);
    assert_eq!(Label::parse(" 2 ").unwrap(), Label::HateSpeech);
    assert!(matches!(Label::parse("3"), Err(AppError::LabelOutOfRange(_))));
    assert!(matches!(Label::parse("-1"), Err(AppError::LabelOutOfRange(_))));
    assert!(matches!(Label::parse("offensive"), Err(AppError::LabelOutOfRange(_))));
  }

  #[test]
  fn labels_serialize_as_integers() {
    assert_eq!(serde_json::to_string(&Label::Offensive).unwrap(), "1");
    let l: Label = serde_json::from_str("2").unwrap();
    assert_eq!(l, Label::HateSpeech);
    assert!(serde_json::from_str::<Label>("7").is_err());
  }
}
