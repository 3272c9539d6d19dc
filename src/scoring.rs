//! Challenge scoring: user and model accuracy against ground truth, plus the
//! aligned comparison table shown on the results page.

use std::collections::HashMap;

use tracing::{info, instrument};

use crate::domain::{Label, ScoreReport, ScoreRow};
use crate::error::AppError;
use crate::session::ChallengeSession;

/// Prefix of the positional form fields posted by the challenge page.
pub const FORM_FIELD_PREFIX: &str = "user-label-";

/// One explicit answer keyed by sample identifier.
#[derive(Clone, Debug)]
pub struct Answer {
  pub id: u64,
  pub label: Label,
}

/// Score the session against stored ground truth and stored model predictions.
#[instrument(level = "info", skip_all, fields(session_size = session.len(), answers = user_labels.len()))]
pub fn score(
  session: &ChallengeSession,
  user_labels: &HashMap<u64, Label>,
  ground_truth: &HashMap<u64, Label>,
  predictions: &HashMap<u64, Label>,
) -> Result<ScoreReport, AppError> {
  if session.is_empty() {
    return Err(AppError::NoActiveChallenge);
  }
  let n = session.len();
  let received = user_labels.len();
  if received != n || session.samples.iter().any(|s| !user_labels.contains_key(&s.id)) {
    return Err(AppError::AnswerCountMismatch { expected: n, received });
  }

  let mut rows = Vec::with_capacity(n);
  for sample in &session.samples {
    let truth = *ground_truth.get(&sample.id).ok_or(AppError::MissingReference { id: sample.id })?;
    let model = *predictions.get(&sample.id).ok_or(AppError::MissingReference { id: sample.id })?;
    rows.push(ScoreRow {
      id: sample.id,
      text: sample.text.clone(),
      user: user_labels[&sample.id],
      model,
      truth,
    });
  }

  let model_hits = rows.iter().filter(|r| r.model_correct()).count();
  let user_hits = rows.iter().filter(|r| r.user_correct()).count();
  let report = ScoreReport {
    model_accuracy: percentage(model_hits, n),
    user_accuracy: percentage(user_hits, n),
    rows,
  };
  info!(
    target: "challenge",
    model_accuracy = report.model_accuracy,
    user_accuracy = report.user_accuracy,
    "Challenge scored"
  );
  Ok(report)
}

fn percentage(hits: usize, total: usize) -> f64 {
  hits as f64 / total as f64 * 100.0
}

/// Decode the challenge form: `user-label-{i}` is the answer for the i-th
/// sample of the session, in session order. Every index must be present and
/// no other `user-label-` fields may appear.
pub fn answers_from_form(
  form: &HashMap<String, String>,
  session: &ChallengeSession,
) -> Result<HashMap<u64, Label>, AppError> {
  let expected = session.len();
  let received = form.keys().filter(|k| k.starts_with(FORM_FIELD_PREFIX)).count();
  if received != expected {
    return Err(AppError::AnswerCountMismatch { expected, received });
  }
  let mut out = HashMap::with_capacity(expected);
  for (i, sample) in session.samples.iter().enumerate() {
    let raw = form
      .get(&format!("{FORM_FIELD_PREFIX}{i}"))
      .ok_or(AppError::AnswerCountMismatch { expected, received })?;
    out.insert(sample.id, Label::parse(raw)?);
  }
  Ok(out)
}

/// Collect explicit `(id, label)` answers; an id given twice is rejected.
pub fn answers_from_list(answers: &[Answer]) -> Result<HashMap<u64, Label>, AppError> {
  let mut out = HashMap::with_capacity(answers.len());
  for a in answers {
    if out.insert(a.id, a.label).is_some() {
      return Err(AppError::DuplicateAnswer { id: a.id });
    }
  }
  Ok(out)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::TextSample;
  use crate::domain::Label::{HateSpeech as H, Inoffensive as I, Offensive as O};

  fn session(ids: &[u64]) -> ChallengeSession {
    ChallengeSession::from_samples(ids.iter().map(|&id| TextSample { id, text: format!("t{id}") }).collect())
  }

  fn table(pairs: &[(u64, Label)]) -> HashMap<u64, Label> {
    pairs.iter().copied().collect()
  }

  #[test]
  fn three_sample_scenario() {
    let s = session(&[10, 11, 12]);
    let truth = table(&[(10, I), (11, O), (12, H)]);
    let model = table(&[(10, I), (11, O), (12, O)]);
    let user = table(&[(10, I), (11, H), (12, H)]);
    let r = score(&s, &user, &truth, &model).unwrap();

    assert!((r.model_accuracy - 66.666_666).abs() < 0.01);
    assert!((r.user_accuracy - 66.666_666).abs() < 0.01);
    assert_eq!(crate::util::format_significant(r.model_accuracy, 4), "66.67");

    let ids: Vec<u64> = r.rows.iter().map(|row| row.id).collect();
    assert_eq!(ids, vec![10, 11, 12]);
    // sample 2: user wrong, model right
    assert!(!r.rows[1].user_correct());
    assert!(r.rows[1].model_correct());
    // sample 3: user right, model wrong
    assert!(r.rows[2].user_correct());
    assert!(!r.rows[2].model_correct());
  }

  #[test]
  fn perfect_and_zero_user_accuracy() {
    let s = session(&[1, 2, 3, 4]);
    let truth = table(&[(1, I), (2, O), (3, H), (4, I)]);
    let model = truth.clone();
    let r = score(&s, &truth, &truth, &model).unwrap();
    assert_eq!(r.user_accuracy, 100.0);
    assert_eq!(r.model_accuracy, 100.0);

    let wrong = table(&[(1, O), (2, H), (3, I), (4, H)]);
    let r = score(&s, &wrong, &truth, &model).unwrap();
    assert_eq!(r.user_accuracy, 0.0);
  }

  #[test]
  fn answer_count_must_match_session() {
    let s = session(&[1, 2]);
    let truth = table(&[(1, I), (2, O)]);
    let err = score(&s, &table(&[(1, I)]), &truth, &truth).unwrap_err();
    assert!(matches!(err, AppError::AnswerCountMismatch { expected: 2, received: 1 }));
    // right count, wrong ids
    let err = score(&s, &table(&[(1, I), (9, O)]), &truth, &truth).unwrap_err();
    assert!(matches!(err, AppError::AnswerCountMismatch { .. }));
  }

  #[test]
  fn empty_session_has_no_challenge() {
    let s = session(&[]);
    let err = score(&s, &HashMap::new(), &HashMap::new(), &HashMap::new()).unwrap_err();
    assert!(matches!(err, AppError::NoActiveChallenge));
  }

  #[test]
  fn missing_prediction_is_internal() {
    let s = session(&[1]);
    let truth = table(&[(1, I)]);
    let err = score(&s, &truth, &truth, &HashMap::new()).unwrap_err();
    assert!(matches!(err, AppError::MissingReference { id: 1 }));
  }

  #[test]
  fn form_answers_map_positionally() {
    let s = session(&[42, 7]);
    let form: HashMap<String, String> = [("user-label-0", "2"), ("user-label-1", "0")]
      .iter()
      .map(|(k, v)| (k.to_string(), v.to_string()))
      .collect();
    let answers = answers_from_form(&form, &s).unwrap();
    assert_eq!(answers[&42], H);
    assert_eq!(answers[&7], I);
  }

  #[test]
  fn form_with_gap_is_rejected() {
    let s = session(&[42, 7]);
    let form: HashMap<String, String> = [("user-label-0", "2"), ("user-label-5", "0")]
      .iter()
      .map(|(k, v)| (k.to_string(), v.to_string()))
      .collect();
    assert!(matches!(answers_from_form(&form, &s), Err(AppError::AnswerCountMismatch { .. })));

    let short: HashMap<String, String> = HashMap::from([("user-label-0".to_string(), "1".to_string())]);
    assert!(matches!(
      answers_from_form(&short, &s),
      Err(AppError::AnswerCountMismatch { expected: 2, received: 1 })
    ));
  }

  #[test]
  fn form_label_out_of_range() {
    let s = session(&[1]);
    let form = HashMap::from([("user-label-0".to_string(), "3".to_string())]);
    assert!(matches!(answers_from_form(&form, &s), Err(AppError::LabelOutOfRange(_))));
  }

  #[test]
  fn explicit_answers_reject_duplicates() {
    let ok = answers_from_list(&[Answer { id: 1, label: O }, Answer { id: 2, label: H }]).unwrap();
    assert_eq!(ok.len(), 2);
    let dup = answers_from_list(&[Answer { id: 1, label: O }, Answer { id: 1, label: H }]);
    assert!(matches!(dup, Err(AppError::DuplicateAnswer { id: 1 })));
  }
}
