//! Challenge session store.
//!
//! Each browser gets an opaque session token; the store remembers the batch of
//! test tweets it was last shown so the submitted answers can be scored against
//! exactly that batch. Training examples are stateless and drawn straight from
//! the dataset.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use crate::dataset::Dataset;
use crate::domain::{Label, TextSample};
use crate::error::AppError;

/// What a second `sample_test` does to a session that already holds tweets.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionPolicy {
  /// The session becomes exactly the new batch.
  #[default]
  Replace,
  /// The new batch (disjoint from the current one) is appended.
  Append,
}

#[derive(Clone, Debug)]
pub struct ChallengeSession {
  pub samples: Vec<TextSample>,
  // Store-wide tick of the last write, used for eviction order.
  touched: u64,
}

impl ChallengeSession {
  fn empty(touched: u64) -> Self {
    Self { samples: Vec::new(), touched }
  }

  pub fn from_samples(samples: Vec<TextSample>) -> Self {
    Self { samples, touched: 0 }
  }

  pub fn len(&self) -> usize { self.samples.len() }

  pub fn is_empty(&self) -> bool { self.samples.is_empty() }

  pub fn contains(&self, id: u64) -> bool {
    self.samples.iter().any(|s| s.id == id)
  }
}

pub struct ChallengeStore {
  dataset: Arc<Dataset>,
  sessions: RwLock<HashMap<String, ChallengeSession>>,
  policy: SessionPolicy,
  max_sessions: usize,
  clock: AtomicU64,
}

impl ChallengeStore {
  pub fn new(dataset: Arc<Dataset>, policy: SessionPolicy, max_sessions: usize) -> Self {
    Self {
      dataset,
      sessions: RwLock::new(HashMap::new()),
      policy,
      max_sessions: max_sessions.max(1),
      clock: AtomicU64::new(0),
    }
  }

  pub fn dataset(&self) -> &Dataset {
    &self.dataset
  }

  /// Clear the session to empty (creating it if needed).
  #[instrument(level = "debug", skip(self))]
  pub async fn reset_session(&self, token: &str) {
    let mut sessions = self.sessions.write().await;
    self.make_room(&mut sessions, token);
    sessions.insert(token.to_string(), ChallengeSession::empty(self.tick()));
  }

  /// Draw `n` distinct training texts rated `rating`. Rejects when the pool is too small.
  #[instrument(level = "debug", skip(self, rng))]
  pub fn sample_training<R: Rng + ?Sized>(
    &self,
    rating: Label,
    n: usize,
    rng: &mut R,
  ) -> Result<Vec<String>, AppError> {
    let pool = self.dataset.training_pool(rating);
    if n > pool.len() {
      return Err(AppError::SampleExhausted { requested: n, available: pool.len() });
    }
    Ok(pool
      .choose_multiple(rng, n)
      .filter_map(|id| self.dataset.text(*id).map(str::to_string))
      .collect())
  }

  /// Draw `n` distinct test samples and store them into the session according to the policy.
  #[instrument(level = "debug", skip(self, rng))]
  pub async fn sample_test<R: Rng + ?Sized>(
    &self,
    token: &str,
    n: usize,
    rng: &mut R,
  ) -> Result<Vec<TextSample>, AppError> {
    let mut sessions = self.sessions.write().await;
    let current = sessions.get(token);

    let pool: Vec<u64> = match (self.policy, current) {
      (SessionPolicy::Append, Some(s)) => self
        .dataset
        .test_ids()
        .iter()
        .copied()
        .filter(|id| !s.contains(*id))
        .collect(),
      _ => self.dataset.test_ids().to_vec(),
    };
    if n > pool.len() {
      return Err(AppError::SampleExhausted { requested: n, available: pool.len() });
    }

    let batch: Vec<TextSample> = pool
      .choose_multiple(rng, n)
      .filter_map(|id| self.dataset.sample(*id))
      .collect();

    self.make_room(&mut sessions, token);
    let tick = self.tick();
    let session = sessions.entry(token.to_string()).or_insert_with(|| ChallengeSession::empty(tick));
    match self.policy {
      SessionPolicy::Replace => session.samples = batch.clone(),
      SessionPolicy::Append => session.samples.extend(batch.iter().cloned()),
    }
    session.touched = tick;
    debug!(target: "challenge", token, drawn = batch.len(), session_size = session.len(), "Test batch stored");
    Ok(batch)
  }

  /// Snapshot of a session, if it exists.
  pub async fn session(&self, token: &str) -> Option<ChallengeSession> {
    self.sessions.read().await.get(token).cloned()
  }

  pub async fn session_count(&self) -> usize {
    self.sessions.read().await.len()
  }

  fn tick(&self) -> u64 {
    self.clock.fetch_add(1, Ordering::Relaxed)
  }

  // Evict the least recently touched session when a new token would exceed the cap.
  fn make_room(&self, sessions: &mut HashMap<String, ChallengeSession>, token: &str) {
    if sessions.contains_key(token) || sessions.len() < self.max_sessions {
      return;
    }
    let oldest = sessions
      .iter()
      .min_by_key(|(_, s)| s.touched)
      .map(|(k, _)| k.clone());
    if let Some(victim) = oldest {
      sessions.remove(&victim);
      info!(target: "challenge", evicted = %victim, "Session store full; evicted oldest session");
    }
  }
}

#[cfg(test)]
mod tests {
  use std::collections::HashSet;

  use rand::rngs::StdRng;
  use rand::SeedableRng;

  use super::*;
  use crate::dataset::{DatasetArtifact, LabeledSample};

  fn dataset() -> Arc<Dataset> {
    let mut samples = Vec::new();
    for id in 0..30u64 {
      let rating = Label::from_index((id % 3) as usize).unwrap();
      samples.push(LabeledSample { id, text: format!("tweet number {id}"), rating });
    }
    Arc::new(
      Dataset::new(DatasetArtifact {
        samples,
        train_ids: (0..20).collect(),
        test_ids: (20..30).collect(),
      })
      .unwrap(),
    )
  }

  fn store(policy: SessionPolicy) -> ChallengeStore {
    ChallengeStore::new(dataset(), policy, 8)
  }

  #[test]
  fn training_samples_match_rating_without_duplicates() {
    let s = store(SessionPolicy::Replace);
    let mut rng = StdRng::seed_from_u64(7);
    for rating in Label::ALL {
      let texts = s.sample_training(rating, 5, &mut rng).unwrap();
      assert_eq!(texts.len(), 5);
      let unique: HashSet<_> = texts.iter().collect();
      assert_eq!(unique.len(), 5);
      for t in &texts {
        let id: u64 = t.rsplit(' ').next().unwrap().parse().unwrap();
        assert_eq!(id % 3, rating.index() as u64);
        assert!(id < 20, "training sample drawn from test split");
      }
    }
  }

  #[test]
  fn training_request_beyond_pool_is_rejected() {
    let s = store(SessionPolicy::Replace);
    let mut rng = StdRng::seed_from_u64(1);
    // ids 0..20 rated 1 are 1,4,7,10,13,16,19
    let err = s.sample_training(Label::Offensive, 8, &mut rng).unwrap_err();
    assert!(matches!(err, AppError::SampleExhausted { requested: 8, available: 7 }));
  }

  #[tokio::test]
  async fn replace_policy_keeps_only_latest_batch() {
    let s = store(SessionPolicy::Replace);
    let mut rng = StdRng::seed_from_u64(3);
    let first = s.sample_test("tab", 4, &mut rng).await.unwrap();
    assert_eq!(first.len(), 4);
    let ids: HashSet<u64> = first.iter().map(|t| t.id).collect();
    assert_eq!(ids.len(), 4);
    assert!(ids.iter().all(|id| (20..30).contains(id)));

    let second = s.sample_test("tab", 3, &mut rng).await.unwrap();
    let session = s.session("tab").await.unwrap();
    assert_eq!(session.len(), 3);
    assert_eq!(session.samples, second);
  }

  #[tokio::test]
  async fn append_policy_grows_without_duplicates() {
    let s = store(SessionPolicy::Append);
    let mut rng = StdRng::seed_from_u64(5);
    s.sample_test("tab", 4, &mut rng).await.unwrap();
    s.sample_test("tab", 4, &mut rng).await.unwrap();
    let session = s.session("tab").await.unwrap();
    assert_eq!(session.len(), 8);
    let ids: HashSet<u64> = session.samples.iter().map(|t| t.id).collect();
    assert_eq!(ids.len(), 8);

    let err = s.sample_test("tab", 3, &mut rng).await.unwrap_err();
    assert!(matches!(err, AppError::SampleExhausted { requested: 3, available: 2 }));
    assert_eq!(s.session("tab").await.unwrap().len(), 8);
  }

  #[tokio::test]
  async fn reset_clears_the_session() {
    let s = store(SessionPolicy::Replace);
    let mut rng = StdRng::seed_from_u64(9);
    s.sample_test("tab", 2, &mut rng).await.unwrap();
    s.reset_session("tab").await;
    assert!(s.session("tab").await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn sessions_are_isolated_per_token() {
    let s = store(SessionPolicy::Replace);
    let mut rng = StdRng::seed_from_u64(11);
    s.sample_test("a", 2, &mut rng).await.unwrap();
    s.sample_test("b", 5, &mut rng).await.unwrap();
    assert_eq!(s.session("a").await.unwrap().len(), 2);
    assert_eq!(s.session("b").await.unwrap().len(), 5);
  }

  #[tokio::test]
  async fn store_evicts_oldest_session_when_full() {
    let s = ChallengeStore::new(dataset(), SessionPolicy::Replace, 2);
    s.reset_session("first").await;
    s.reset_session("second").await;
    s.reset_session("third").await;
    assert_eq!(s.session_count().await, 2);
    assert!(s.session("first").await.is_none());
    assert!(s.session("third").await.is_some());
  }
}
