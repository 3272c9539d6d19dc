//! Built-in demo artifacts so the app is usable without exported model files.
//!
//! The demo vocabulary is split into three word groups, one per label. Each
//! word's embedding is the one-hot vector of its group, and each convolution
//! filter counts group words within a two-token window, so the demo network
//! picks the label whose words cluster most densely in the tweet.

use std::collections::HashMap;

use crate::dataset::{DatasetArtifact, LabeledSample};
use crate::domain::Label;
use crate::encoder::TokenizerArtifact;
use crate::model::{ConvLayer, DenseLayer, ModelArtifact, N_CLASSES};

const DEMO_MAX_SEQUENCE_LENGTH: usize = 30;
const DEMO_TRAIN_PER_LABEL: usize = 10;

const NEUTRAL_WORDS: &[&str] = &[
  "love", "lovely", "day", "good", "great", "happy", "friend", "thank", "game", "coffee",
  "morning", "weekend", "music", "have", "you", "fun", "nice", "win", "team", "read", "book",
  "sun", "beach", "dinner", "family", "park", "proud",
];
const OFFENSIVE_WORDS: &[&str] = &[
  "stupid", "idiot", "dumb", "clown", "trash", "moron", "loser", "shut", "ugly", "pathetic",
  "garbage", "jerk",
];
const HATE_WORDS: &[&str] = &[
  "vermin", "subhuman", "scum", "exterminate", "die", "filth", "parasite", "disease", "plague",
  "infest",
];

const INOFFENSIVE_TWEETS: &[&str] = &[
  "Good morning everyone, coffee first then the world",
  "Thanks for the lovely dinner last night @sam",
  "Our team finally got the win today!",
  "Reading a great book on the beach #weekend",
  "Happy birthday to my best friend, have fun",
  "New music friday is the best day of the week",
  "The sun is out and the family is at the park",
  "Nice game last night, proud of the team",
  "Can't wait for the weekend https://t.co/abc123",
  "Love this little coffee shop on the corner",
  "Who else is watching the game tonight?",
  "That stupid cat knocked my coffee over again lol",
  "Thank you all for the birthday wishes",
  "Sunday morning pancakes with the family",
  "Finished my book, time to read another one",
  "Great music at the park this afternoon",
  "So proud of my little sister today",
  "Beach day with friends, see you there",
];
const OFFENSIVE_TWEETS: &[&str] = &[
  "You are such a stupid clown",
  "Shut up you pathetic loser",
  "What an idiot, delete your account",
  "This referee is trash and a moron",
  "Nobody asked you, ugly jerk",
  "Dumb take from a dumb person",
  "Your team is garbage and so are you",
  "Absolute clowns running this show",
  "@troll go away you pathetic idiot",
  "What a loser, cry more",
  "Only a moron would believe that",
  "Shut up already, nobody likes you",
  "You look ugly and you sound dumb",
  "Stop being such a pathetic jerk",
  "What a garbage opinion from a clown",
  "Imagine being this stupid in public",
  "Another idiot with a trash take",
  "Go cry somewhere else, loser",
];
const HATE_TWEETS: &[&str] = &[
  "Those people are vermin and should leave",
  "They are subhuman scum, every one of them",
  "Filth like them should just die",
  "They infest this town like a plague",
  "Parasites, the lot of them, exterminate them",
  "They are a disease on society",
  "Scum like that deserve to die",
  "Get rid of those vermin before they spread",
  "Subhuman parasites everywhere you look",
  "They are nothing but filth and disease",
  "That kind are a plague, get them out",
  "Vermin like them have no place here",
  "Their kind spread disease wherever they go",
  "Exterminate the scum before it is too late",
  "Parasites like that should die out",
  "They breed like vermin, it is a plague",
  "Filthy subhuman parasites, all of them",
  "Send the scum back, they infest everything",
];

fn word_groups() -> [&'static [&'static str]; N_CLASSES] {
  [NEUTRAL_WORDS, OFFENSIVE_WORDS, HATE_WORDS]
}

/// Vocabulary with indices starting at 1 (0 is padding).
pub fn demo_tokenizer() -> TokenizerArtifact {
  let mut word_index = HashMap::new();
  let mut next = 1u32;
  for group in word_groups() {
    for w in group {
      word_index.insert(w.to_string(), next);
      next += 1;
    }
  }
  TokenizerArtifact {
    word_index,
    max_sequence_length: DEMO_MAX_SEQUENCE_LENGTH,
    oov_token: None,
    lemmas: HashMap::new(),
  }
}

pub fn demo_model() -> ModelArtifact {
  let mut embedding = vec![vec![0.0; N_CLASSES]];
  for (class, group) in word_groups().iter().enumerate() {
    for _ in group.iter() {
      let mut row = vec![0.0; N_CLASSES];
      row[class] = 1.0;
      embedding.push(row);
    }
  }
  let one_hot = |c: usize| -> Vec<f32> { (0..N_CLASSES).map(|i| if i == c { 1.0 } else { 0.0 }).collect() };
  let weights: Vec<Vec<Vec<f32>>> = (0..N_CLASSES).map(|c| vec![one_hot(c), one_hot(c)]).collect();
  let dense: Vec<Vec<f32>> = (0..N_CLASSES)
    .map(|c| one_hot(c).into_iter().map(|x| x * 2.0).collect::<Vec<f32>>())
    .collect();
  ModelArtifact {
    embedding,
    conv: ConvLayer { kernel_size: 2, weights, bias: vec![0.0; N_CLASSES] },
    // A small bias toward "inoffensive" so text without known words is not flagged.
    dense: DenseLayer { weights: dense, bias: vec![0.5, 0.0, 0.0] },
  }
}

/// Eighteen tweets per label; the first ten of each are training data.
pub fn demo_dataset() -> DatasetArtifact {
  let mut samples = Vec::new();
  let mut train_ids = Vec::new();
  let mut test_ids = Vec::new();
  let groups = [
    (Label::Inoffensive, INOFFENSIVE_TWEETS),
    (Label::Offensive, OFFENSIVE_TWEETS),
    (Label::HateSpeech, HATE_TWEETS),
  ];
  for (rating, tweets) in groups {
    for (i, text) in tweets.iter().enumerate() {
      let id = samples.len() as u64;
      samples.push(LabeledSample { id, text: text.to_string(), rating });
      if i < DEMO_TRAIN_PER_LABEL {
        train_ids.push(id);
      } else {
        test_ids.push(id);
      }
    }
  }
  DatasetArtifact { samples, train_ids, test_ids }
}

/// Prediction pipeline built from the demo tokenizer and model.
#[cfg(test)]
pub fn demo_predictor() -> Result<crate::logic::Predictor, crate::error::ArtifactError> {
  use std::sync::Arc;

  use crate::encoder::SequenceEncoder;
  use crate::model::ConvClassifier;
  use crate::normalize::RuleLemmatizer;

  let tok = demo_tokenizer();
  let classifier = ConvClassifier::new(demo_model())?;
  Ok(crate::logic::Predictor::new(
    Arc::new(RuleLemmatizer::with_defaults()),
    Arc::new(SequenceEncoder::from_artifact(&tok)),
    Arc::new(classifier),
  ))
}
