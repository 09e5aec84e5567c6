//! Quiz session flows: build-and-share, take-quiz, view-results.
//!
//! Everything here delegates to the codec, the shuffle engine, the judge and the scorer.
//! The only state is a [`QuizSession`] held for one quiz-taking attempt.

use std::collections::HashSet;

use futures::future::join_all;
use rand::Rng;
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::codec::{decode_envelope, encode};
use crate::domain::{Card, Judgment, QuizData, QuizDraft, Results, QUIZ_VERSION};
use crate::error::{QuizError, Result};
use crate::judge::{judge_or_fallback, Judge};
use crate::scoring::{summarize, Summary};
use crate::shuffle::{is_permutation, shuffle};

pub const QUIZ_PREFIX: &str = "/quiz/";
pub const RESULTS_PREFIX: &str = "/results/";

/// A freshly encoded token and the path that carries it.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct SharedLink {
  pub token: String,
  pub path: String,
}

/// Shareable path for a quiz. Result fields, if any, are dropped first.
pub fn share_link(quiz: &QuizData) -> Result<SharedLink> {
  let token = encode(&quiz.without_results())?;
  Ok(SharedLink { path: format!("{}{}", QUIZ_PREFIX, token), token })
}

/// Results path carrying the quiz plus one respondent's answers and order.
pub fn results_link(results: &Results) -> Result<SharedLink> {
  let token = encode(&results.to_data())?;
  Ok(SharedLink { path: format!("{}{}", RESULTS_PREFIX, token), token })
}

/// Turn editor state into a quiz: drop incomplete cards, fill missing or repeated ids,
/// stamp metadata.
#[instrument(level = "info", skip(draft), fields(cards_in = draft.cards.len()))]
pub fn prepare_share(draft: &QuizDraft, created_at: &str) -> Result<(QuizData, SharedLink)> {
  let mut seen: HashSet<String> = HashSet::new();
  let cards: Vec<Card> = draft
    .cards
    .iter()
    .filter(|c| c.is_complete())
    .map(|c| {
      let id = if c.id.trim().is_empty() || seen.contains(&c.id) { Uuid::new_v4().to_string() } else { c.id.clone() };
      seen.insert(id.clone());
      Card { id, question: c.question.clone(), answer: c.answer.clone() }
    })
    .collect();
  if cards.is_empty() {
    return Err(QuizError::Validation("Add some cards first!".into()));
  }

  let non_empty = |s: &str| if s.is_empty() { None } else { Some(s.to_string()) };
  let quiz = QuizData {
    title: non_empty(&draft.title),
    instructions: non_empty(&draft.instructions),
    cards,
    created_at: Some(created_at.to_string()),
    version: Some(QUIZ_VERSION.to_string()),
    user_answers: None,
    shuffle_order: None,
  };
  let link = share_link(&quiz)?;
  info!(cards = quiz.cards.len(), token_len = link.token.len(), "Quiz ready to share");
  Ok((quiz, link))
}

// -------- Take quiz --------

/// Where a session stands after an accepted answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Progress {
  /// Next presented position to answer.
  Next(usize),
  Finished,
}

/// One attempt at a quiz: presentation order plus answers collected so far.
#[derive(Clone, Debug)]
pub struct QuizSession {
  quiz: QuizData,
  presented: Vec<Card>,
  order: Vec<usize>,
  answers: Vec<String>,
  position: usize,
}

impl QuizSession {
  /// Decode a quiz path/token and shuffle it for a new attempt.
  #[instrument(level = "info", skip(input, rng), fields(input_len = input.len()))]
  pub fn start<R: Rng + ?Sized>(input: &str, rng: &mut R) -> Result<Self> {
    let quiz = decode_envelope(input)?.without_results();
    Ok(Self::from_quiz(quiz, rng))
  }

  pub fn from_quiz<R: Rng + ?Sized>(quiz: QuizData, rng: &mut R) -> Self {
    let s = shuffle(&quiz.cards, rng);
    let answers = vec![String::new(); s.order.len()];
    Self { quiz, presented: s.presented, order: s.order, answers, position: 0 }
  }

  pub fn quiz(&self) -> &QuizData {
    &self.quiz
  }

  pub fn presented(&self) -> &[Card] {
    &self.presented
  }

  pub fn shuffle_order(&self) -> &[usize] {
    &self.order
  }

  pub fn len(&self) -> usize {
    self.presented.len()
  }

  pub fn is_empty(&self) -> bool {
    self.presented.is_empty()
  }

  /// Zero-based presented position awaiting an answer.
  pub fn position(&self) -> usize {
    self.position
  }

  pub fn current_card(&self) -> Option<&Card> {
    self.presented.get(self.position)
  }

  pub fn is_complete(&self) -> bool {
    self.position >= self.presented.len()
  }

  /// Record the answer for the current card and move on. Blank answers are refused.
  pub fn submit_answer(&mut self, answer: &str) -> Result<Progress> {
    if self.is_complete() {
      return Err(QuizError::Validation("All cards have already been answered".into()));
    }
    let trimmed = answer.trim();
    if trimmed.is_empty() {
      return Err(QuizError::Validation("Please enter an answer".into()));
    }
    self.answers[self.position] = trimmed.to_string();
    self.position += 1;
    Ok(if self.is_complete() { Progress::Finished } else { Progress::Next(self.position) })
  }

  /// Start over with a fresh order and no answers.
  pub fn retake<R: Rng + ?Sized>(&mut self, rng: &mut R) {
    *self = Self::from_quiz(self.quiz.clone(), rng);
  }

  /// Freeze the attempt into a result set and its results link.
  pub fn finish(&self) -> Result<(Results, SharedLink)> {
    if !self.is_complete() {
      return Err(QuizError::Validation(format!(
        "{} of {} cards answered",
        self.position,
        self.presented.len()
      )));
    }
    submit_answers(&self.quiz, self.answers.clone(), self.order.clone())
  }
}

/// Stateless counterpart of [`QuizSession::finish`] for clients that ran the attempt themselves.
pub fn submit_answers(quiz: &QuizData, user_answers: Vec<String>, shuffle_order: Vec<usize>) -> Result<(Results, SharedLink)> {
  let n = quiz.cards.len();
  if user_answers.len() != n {
    return Err(QuizError::Validation(format!("expected {} answers, got {}", n, user_answers.len())));
  }
  if !is_permutation(&shuffle_order, n) {
    return Err(QuizError::Validation("shuffle order is not a permutation of the cards".into()));
  }
  let user_answers: Vec<String> = user_answers.iter().map(|a| a.trim().to_string()).collect();
  if user_answers.iter().any(|a| a.is_empty()) {
    return Err(QuizError::Validation("Please enter an answer".into()));
  }
  let results = Results::try_from_data(quiz.with_results(user_answers, shuffle_order))?;
  let link = results_link(&results)?;
  info!(cards = n, token_len = link.token.len(), "Results ready");
  Ok((results, link))
}

// -------- View results --------

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResultItem {
  pub question: String,
  pub expected: String,
  pub answer: String,
  pub judgment: Judgment,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResultsView {
  pub title: Option<String>,
  pub instructions: Option<String>,
  /// Presentation order, as the respondent saw the cards.
  pub items: Vec<ResultItem>,
  pub summary: Summary,
  /// Clean quiz link for sharing or retaking.
  pub share: SharedLink,
}

/// Decode a results path/token, judge every answer concurrently, then aggregate.
///
/// All judge calls are issued before any is awaited, and nothing is returned until every
/// one has resolved. Each call already degrades to the exact-match fallback, so the join
/// cannot fail.
#[instrument(level = "info", skip(input, judge), fields(input_len = input.len()))]
pub async fn view_results<J: Judge>(input: &str, judge: &J) -> Result<ResultsView> {
  let data = decode_envelope(input)?;
  if !data.has_results() {
    return Err(QuizError::MissingResults);
  }
  let results = Results::try_from_data(data)?;

  let judgments: Vec<Judgment> = join_all(
    results
      .answered_cards()
      .map(|(card, answer)| judge_or_fallback(judge, &card.question, &card.answer, answer)),
  )
  .await;

  let summary = summarize(&judgments);
  let items = results
    .answered_cards()
    .zip(judgments)
    .map(|((card, answer), judgment)| ResultItem {
      question: card.question.clone(),
      expected: card.answer.clone(),
      answer: answer.to_string(),
      judgment,
    })
    .collect();
  let share = share_link(&results.quiz)?;
  info!(total = summary.total, percentage = summary.percentage, "Results judged");

  Ok(ResultsView {
    title: results.quiz.title.clone(),
    instructions: results.quiz.instructions.clone(),
    items,
    summary,
    share,
  })
}
