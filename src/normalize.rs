//! Tweet cleaning and lemmatization.
//!
//! Raw tweets carry handles, links, hashtag marks and encoding debris from the
//! scrape (`ï¿½...`, emoji code remnants like `128514`, `_UNDEF`). All of those
//! are replaced by a space before the text is split and lemmatized.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

/// `@handle` mentions.
pub static MENTION: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"@\w+").expect("mention pattern"));

/// Links, markup characters and scrape debris.
pub static NOISE: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r#"https?://\S*|ï¿½\S*\d*|\x{FFFD}\S*\d*|128\d{3}|_*UNDEF|[#&()"]"#)
    .expect("noise pattern")
});

/// Reduces a single token to its base form.
pub trait Lemmatizer: Send + Sync {
  fn lemmatize(&self, token: &str) -> String;
}

/// Lowercasing lemmatizer with an exception table and a few English suffix rules.
#[derive(Clone, Debug, Default)]
pub struct RuleLemmatizer {
  exceptions: HashMap<String, String>,
}

impl RuleLemmatizer {
  pub fn new(exceptions: HashMap<String, String>) -> Self {
    let exceptions = exceptions
      .into_iter()
      .map(|(k, v)| (k.to_lowercase(), v.to_lowercase()))
      .collect();
    Self { exceptions }
  }

  pub fn with_defaults() -> Self {
    Self::new(DEFAULT_EXCEPTIONS.iter().map(|(a, b)| (a.to_string(), b.to_string())).collect())
  }

  /// Add (or override) exceptions.
  pub fn with_exceptions(mut self, extra: HashMap<String, String>) -> Self {
    self
      .exceptions
      .extend(extra.into_iter().map(|(k, v)| (k.to_lowercase(), v.to_lowercase())));
    self
  }
}

/// Irregular English forms the suffix rules get wrong.
const DEFAULT_EXCEPTIONS: &[(&str, &str)] = &[
      ("am", "be"), ("is", "be"), ("are", "be"), ("was", "be"), ("were", "be"), ("been", "be"),
      ("has", "have"), ("had", "have"), ("does", "do"), ("did", "do"), ("done", "do"),
      ("went", "go"), ("gone", "go"), ("men", "man"), ("women", "woman"), ("people", "person"),
      ("children", "child"), ("better", "good"), ("best", "good"), ("worse", "bad"), ("worst", "bad"),
];

impl Lemmatizer for RuleLemmatizer {
  fn lemmatize(&self, token: &str) -> String {
    let lower = token.to_lowercase();
    if let Some(lemma) = self.exceptions.get(&lower) {
      return lemma.clone();
    }
    if !lower.chars().all(|c| c.is_alphabetic()) {
      return lower;
    }
    let n = lower.chars().count();
    if n > 4 && lower.ends_with("ies") {
      return format!("{}y", &lower[..lower.len() - 3]);
    }
    if n > 4 && (lower.ends_with("ches") || lower.ends_with("shes") || lower.ends_with("xes")) {
      return lower[..lower.len() - 2].to_string();
    }
    if n > 3 && lower.ends_with('s') && !lower.ends_with("ss") && !lower.ends_with("us") && !lower.ends_with("is") {
      return lower[..lower.len() - 1].to_string();
    }
    lower
  }
}

/// Replace every stripped pattern with a space.
pub fn clean(text: &str) -> String {
  let without_mentions = MENTION.replace_all(text, " ");
  NOISE.replace_all(&without_mentions, " ").into_owned()
}

/// Clean, split on whitespace and lemmatize; tokens are re-joined with single spaces.
pub fn normalize(text: &str, lemmatizer: &dyn Lemmatizer) -> String {
  clean(text)
    .split_whitespace()
    .map(|tok| lemmatizer.lemmatize(tok))
    .filter(|lemma| !lemma.is_empty())
    .collect::<Vec<_>>()
    .join(" ")
}
