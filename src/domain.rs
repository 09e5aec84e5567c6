//! Domain models: cards, the token payload, validated results, judgments and drafts.

use serde::{Deserialize, Serialize};

use crate::error::{QuizError, Result};
use crate::shuffle::is_permutation;

/// Version stamped on quizzes produced by this service.
pub const QUIZ_VERSION: &str = "1.0";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Card {
  pub id: String,
  pub question: String,
  pub answer: String,
}

impl Card {
  /// Both sides carry text once surrounding whitespace is removed.
  pub fn is_complete(&self) -> bool {
    !self.question.trim().is_empty() && !self.answer.trim().is_empty()
  }

  /// At least one side carries text.
  pub fn is_touched(&self) -> bool {
    !self.question.trim().is_empty() || !self.answer.trim().is_empty()
  }
}

/// Everything a token carries: a quiz, plus the result fields once someone took it.
///
/// Card order is the canonical order. Absent optional fields are omitted from the JSON
/// so that `decode(encode(x)) == x` holds field for field.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct QuizData {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub title: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub instructions: Option<String>,
  pub cards: Vec<Card>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub created_at: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub version: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub user_answers: Option<Vec<String>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub shuffle_order: Option<Vec<usize>>,
}

impl QuizData {
  pub fn new(cards: Vec<Card>) -> Self {
    Self { cards, ..Self::default() }
  }

  /// True only when both result fields are present. One of them alone counts as no results.
  pub fn has_results(&self) -> bool {
    self.user_answers.is_some() && self.shuffle_order.is_some()
  }

  /// The shareable variant with both result fields dropped.
  pub fn without_results(&self) -> QuizData {
    QuizData {
      title: self.title.clone(),
      instructions: self.instructions.clone(),
      cards: self.cards.clone(),
      created_at: self.created_at.clone(),
      version: self.version.clone(),
      user_answers: None,
      shuffle_order: None,
    }
  }

  /// Attach one respondent's answers (presentation order) and the order they were shown in.
  pub fn with_results(&self, user_answers: Vec<String>, shuffle_order: Vec<usize>) -> QuizData {
    QuizData {
      user_answers: Some(user_answers),
      shuffle_order: Some(shuffle_order),
      ..self.without_results()
    }
  }
}

/// A result set whose invariants have been checked:
/// `user_answers.len() == shuffle_order.len() == quiz.cards.len()` and the order is a permutation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Results {
  pub quiz: QuizData,
  pub user_answers: Vec<String>,
  pub shuffle_order: Vec<usize>,
}

impl Results {
  pub fn try_from_data(data: QuizData) -> Result<Self> {
    let (user_answers, shuffle_order) = match (&data.user_answers, &data.shuffle_order) {
      (Some(a), Some(o)) => (a.clone(), o.clone()),
      _ => return Err(QuizError::MissingResults),
    };
    let n = data.cards.len();
    if user_answers.len() != n || shuffle_order.len() != n {
      return Err(QuizError::Decoding(format!(
        "result fields do not match the card count ({} answers, {} order entries, {} cards)",
        user_answers.len(),
        shuffle_order.len(),
        n
      )));
    }
    if !is_permutation(&shuffle_order, n) {
      return Err(QuizError::Decoding("shuffle order is not a permutation of the cards".into()));
    }
    Ok(Self { quiz: data.without_results(), user_answers, shuffle_order })
  }

  /// (original card, answer) pairs in presentation order.
  pub fn answered_cards(&self) -> impl Iterator<Item = (&Card, &str)> + '_ {
    self
      .shuffle_order
      .iter()
      .zip(self.user_answers.iter())
      .map(move |(&idx, ans)| (&self.quiz.cards[idx], ans.as_str()))
  }

  pub fn to_data(&self) -> QuizData {
    self.quiz.with_results(self.user_answers.clone(), self.shuffle_order.clone())
  }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Score {
  Correct,
  Unsure,
  Incorrect,
}

impl Score {
  /// Parse the wire value; anything outside the three allowed values is rejected.
  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "correct" => Some(Score::Correct),
      "unsure" => Some(Score::Unsure),
      "incorrect" => Some(Score::Incorrect),
      _ => None,
    }
  }

  /// Points in halves: correct = 2, unsure = 1, incorrect = 0.
  pub fn half_points(self) -> u64 {
    match self {
      Score::Correct => 2,
      Score::Unsure => 1,
      Score::Incorrect => 0,
    }
  }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Judgment {
  pub score: Score,
  pub rationale: String,
}

/// Editor state as typed by the author; blank cards are still present.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct QuizDraft {
  #[serde(default)]
  pub title: String,
  #[serde(default)]
  pub instructions: String,
  #[serde(default)]
  pub cards: Vec<Card>,
}

impl QuizDraft {
  /// Anything worth persisting: a non-blank title, instructions or card side.
  pub fn has_content(&self) -> bool {
    !self.title.trim().is_empty()
      || !self.instructions.trim().is_empty()
      || self.cards.iter().any(Card::is_touched)
  }
}
