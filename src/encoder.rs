//! Fixed-length integer encoding of normalized text with a pre-fit vocabulary.
//!
//! Word splitting follows the Keras `Tokenizer` defaults the vocabulary was fit
//! with: lowercase, punctuation filtered to spaces, split on whitespace. Index 0
//! is reserved for padding.

use std::collections::HashMap;

use serde::Deserialize;

const FILTERS: &str = "!\"#$%&()*+,-./:;<=>?@[\\]^_`{|}~\t\n";

/// Tokenizer artifact as written by the training pipeline.
#[derive(Clone, Debug, Deserialize)]
pub struct TokenizerArtifact {
  pub word_index: HashMap<String, u32>,
  pub max_sequence_length: usize,
  #[serde(default)]
  pub oov_token: Option<String>,
  /// Optional lemma exceptions (form -> lemma) for the lemmatizer.
  #[serde(default)]
  pub lemmas: HashMap<String, String>,
}

#[derive(Clone, Debug)]
pub struct SequenceEncoder {
  word_index: HashMap<String, u32>,
  max_len: usize,
  oov_index: Option<u32>,
}

impl SequenceEncoder {
  pub fn new(word_index: HashMap<String, u32>, max_len: usize, oov_token: Option<&str>) -> Self {
    let oov_index = oov_token.and_then(|t| word_index.get(t).copied());
    Self { word_index, max_len, oov_index }
  }

  pub fn from_artifact(a: &TokenizerArtifact) -> Self {
    Self::new(a.word_index.clone(), a.max_sequence_length, a.oov_token.as_deref())
  }

  pub fn max_len(&self) -> usize { self.max_len }

  /// Largest index the encoder can emit.
  pub fn max_index(&self) -> u32 {
    self.word_index.values().copied().max().unwrap_or(0)
  }

  /// Map words to indices without padding. Unknown words are dropped unless an
  /// OOV token is configured.
  pub fn text_to_sequence(&self, text: &str) -> Vec<u32> {
    let lowered: String = text
      .to_lowercase()
      .chars()
      .map(|c| if FILTERS.contains(c) { ' ' } else { c })
      .collect();
    lowered
      .split_whitespace()
      .filter_map(|w| self.word_index.get(w).copied().or(self.oov_index))
      .collect()
  }

  /// Encode to exactly `max_len` indices: pad with 0 on the right, truncate on the right.
  pub fn encode(&self, text: &str) -> Vec<u32> {
    let mut seq = self.text_to_sequence(text);
    seq.resize(self.max_len, 0);
    seq
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn encoder(max_len: usize, oov: Option<&str>) -> SequenceEncoder {
    let mut idx = HashMap::new();
    idx.insert("<oov>".to_string(), 1);
    idx.insert("you".to_string(), 2);
    idx.insert("be".to_string(), 3);
    idx.insert("great".to_string(), 4);
    SequenceEncoder::new(idx, max_len, oov)
  }

  #[test]
  fn pads_on_the_right() {
    assert_eq!(encoder(6, None).encode("You be GREAT!"), vec![2, 3, 4, 0, 0, 0]);
  }

  #[test]
  fn truncates_on_the_right() {
    assert_eq!(encoder(2, None).encode("you be great"), vec![2, 3]);
  }

  #[test]
  fn unknown_words_are_dropped_without_oov() {
    assert_eq!(encoder(4, None).text_to_sequence("you really be"), vec![2, 3]);
  }

  #[test]
  fn unknown_words_map_to_oov_when_configured() {
    assert_eq!(encoder(4, Some("<oov>")).text_to_sequence("you really be"), vec![2, 1, 3]);
  }

  #[test]
  fn filters_split_words() {
    assert_eq!(encoder(4, None).text_to_sequence("you,be.great"), vec![2, 3, 4]);
  }

  #[test]
  fn empty_text_is_all_padding() {
    assert_eq!(encoder(3, None).encode(""), vec![0, 0, 0]);
  }
}
