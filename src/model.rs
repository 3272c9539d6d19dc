//! Tweet classifier: embedding → 1-D convolution (ReLU) → global max pool → dense → softmax.
//!
//! Weights come from a JSON artifact exported by the training pipeline. The
//! forward pass is pure and the struct is immutable, so one instance is shared
//! by every request.

use serde::Deserialize;

use crate::error::{AppError, ArtifactError};

/// Number of output classes.
pub const N_CLASSES: usize = 3;

/// Anything that turns an encoded sequence into a 3-way probability vector.
pub trait Classifier: Send + Sync {
  fn predict_proba(&self, sequence: &[u32]) -> Result<[f32; N_CLASSES], AppError>;
}

#[derive(Clone, Debug, Deserialize)]
pub struct ModelArtifact {
  /// One row per vocabulary index; row 0 is the padding vector.
  pub embedding: Vec<Vec<f32>>,
  pub conv: ConvLayer,
  pub dense: DenseLayer,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ConvLayer {
  pub kernel_size: usize,
  /// `[filter][offset][embedding_dim]`
  pub weights: Vec<Vec<Vec<f32>>>,
  pub bias: Vec<f32>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct DenseLayer {
  /// `[filter][class]`
  pub weights: Vec<Vec<f32>>,
  pub bias: Vec<f32>,
}

#[derive(Clone, Debug)]
pub struct ConvClassifier {
  embedding: Vec<Vec<f32>>,
  conv: ConvLayer,
  dense: DenseLayer,
}

impl ConvClassifier {
  /// Validate layer shapes against each other.
  pub fn new(a: ModelArtifact) -> Result<Self, ArtifactError> {
    let dim = a.embedding.first().map(|r| r.len()).unwrap_or(0);
    if dim == 0 {
      return Err(ArtifactError::Shape("embedding table is empty".into()));
    }
    if let Some(i) = a.embedding.iter().position(|r| r.len() != dim) {
      return Err(ArtifactError::Shape(format!("embedding row {i} does not have {dim} columns")));
    }
    let k = a.conv.kernel_size;
    if k == 0 {
      return Err(ArtifactError::Shape("kernel_size must be positive".into()));
    }
    let filters = a.conv.weights.len();
    if filters == 0 || a.conv.bias.len() != filters {
      return Err(ArtifactError::Shape(format!(
        "conv has {filters} filters but {} biases",
        a.conv.bias.len()
      )));
    }
    for (f, w) in a.conv.weights.iter().enumerate() {
      if w.len() != k || w.iter().any(|row| row.len() != dim) {
        return Err(ArtifactError::Shape(format!("conv filter {f} is not {k}x{dim}")));
      }
    }
    if a.dense.weights.len() != filters || a.dense.weights.iter().any(|r| r.len() != N_CLASSES) {
      return Err(ArtifactError::Shape(format!("dense weights must be {filters}x{N_CLASSES}")));
    }
    if a.dense.bias.len() != N_CLASSES {
      return Err(ArtifactError::Shape(format!("dense bias must have {N_CLASSES} entries")));
    }
    Ok(Self { embedding: a.embedding, conv: a.conv, dense: a.dense })
  }

  pub fn vocab_size(&self) -> usize { self.embedding.len() }

  pub fn kernel_size(&self) -> usize { self.conv.kernel_size }
}

impl Classifier for ConvClassifier {
  fn predict_proba(&self, sequence: &[u32]) -> Result<[f32; N_CLASSES], AppError> {
    let k = self.conv.kernel_size;
    if sequence.len() < k {
      return Err(AppError::ExternalModelFailure(format!(
        "sequence length {} is shorter than kernel size {k}",
        sequence.len()
      )));
    }
    let rows = sequence
      .iter()
      .map(|&idx| {
        self.embedding.get(idx as usize).ok_or_else(|| {
          AppError::ExternalModelFailure(format!("token index {idx} outside embedding table"))
        })
      })
      .collect::<Result<Vec<_>, _>>()?;

    // Conv + ReLU + global max pool. ReLU output is >= 0 so 0 is a safe floor.
    let mut pooled = vec![0f32; self.conv.weights.len()];
    for (f, filter) in self.conv.weights.iter().enumerate() {
      for window in rows.windows(k) {
        let mut acc = self.conv.bias[f];
        for (emb, w) in window.iter().zip(filter) {
          acc += emb.iter().zip(w).map(|(x, y)| x * y).sum::<f32>();
        }
        if acc > pooled[f] {
          pooled[f] = acc;
        }
      }
    }

    let mut logits = [0f32; N_CLASSES];
    for (c, logit) in logits.iter_mut().enumerate() {
      *logit = self.dense.bias[c]
        + pooled.iter().zip(&self.dense.weights).map(|(p, w)| p * w[c]).sum::<f32>();
    }
    let probs = softmax(logits);
    if probs.iter().any(|p| !p.is_finite()) {
      return Err(AppError::ExternalModelFailure("non-finite classifier output".into()));
    }
    Ok(probs)
  }
}

fn softmax(logits: [f32; N_CLASSES]) -> [f32; N_CLASSES] {
  let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
  let mut out = logits.map(|l| (l - max).exp());
  let sum: f32 = out.iter().sum();
  for p in out.iter_mut() {
    *p /= sum;
  }
  out
}

/// Index of the largest probability; the first maximum wins ties.
pub fn argmax(probs: &[f32; N_CLASSES]) -> usize {
  let mut best = 0;
  for (i, p) in probs.iter().enumerate() {
    if *p > probs[best] {
      best = i;
    }
  }
  best
}

#[cfg(test)]
mod tests {
  use super::*;

  // 3 words + padding, dim 2, two filters of width 2.
  fn artifact() -> ModelArtifact {
    ModelArtifact {
      embedding: vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0], vec![0.5, 0.5]],
      conv: ConvLayer {
        kernel_size: 2,
        weights: vec![
          vec![vec![1.0, 0.0], vec![1.0, 0.0]],
          vec![vec![0.0, 1.0], vec![0.0, 1.0]],
        ],
        bias: vec![0.0, 0.0],
      },
      dense: DenseLayer {
        weights: vec![vec![0.0, 2.0, 0.0], vec![0.0, 0.0, 2.0]],
        bias: vec![0.5, 0.0, 0.0],
      },
    }
  }

  #[test]
  fn probabilities_sum_to_one() {
    let m = ConvClassifier::new(artifact()).unwrap();
    let p = m.predict_proba(&[1, 3, 0, 0]).unwrap();
    let sum: f32 = p.iter().sum();
    assert!((sum - 1.0).abs() < 1e-5);
    assert!(p.iter().all(|x| (0.0..=1.0).contains(x)));
  }

  #[test]
  fn padding_only_input_prefers_bias_class() {
    let m = ConvClassifier::new(artifact()).unwrap();
    let p = m.predict_proba(&[0, 0, 0]).unwrap();
    assert_eq!(argmax(&p), 0);
  }

  #[test]
  fn activations_drive_the_label() {
    let m = ConvClassifier::new(artifact()).unwrap();
    assert_eq!(argmax(&m.predict_proba(&[1, 1, 0]).unwrap()), 1);
    assert_eq!(argmax(&m.predict_proba(&[2, 2, 0]).unwrap()), 2);
  }

  #[test]
  fn out_of_vocab_index_is_a_model_failure() {
    let m = ConvClassifier::new(artifact()).unwrap();
    assert!(matches!(m.predict_proba(&[9, 0]), Err(AppError::ExternalModelFailure(_))));
  }

  #[test]
  fn short_sequence_is_a_model_failure() {
    let m = ConvClassifier::new(artifact()).unwrap();
    assert!(matches!(m.predict_proba(&[1]), Err(AppError::ExternalModelFailure(_))));
  }

  #[test]
  fn shape_mismatch_is_rejected() {
    let mut a = artifact();
    a.dense.bias.pop();
    assert!(matches!(ConvClassifier::new(a), Err(ArtifactError::Shape(_))));
    let mut a = artifact();
    a.conv.weights[1].pop();
    assert!(matches!(ConvClassifier::new(a), Err(ArtifactError::Shape(_))));
  }

  #[test]
  fn argmax_prefers_first_on_ties() {
    assert_eq!(argmax(&[0.4, 0.4, 0.2]), 0);
    assert_eq!(argmax(&[0.2, 0.4, 0.4]), 1);
  }
}
