//! Token codec: quiz payload <-> URL-safe token.
//!
//! Wire form: JSON, base64 of the UTF-8 bytes, then `+` -> `-`, `/` -> `_`, no `=` padding.
//! Decoding reverses that after re-normalizing whatever a copy/paste may have done to it
//! (standard alphabet, stray padding, whitespace). The typed serde parse is the schema check;
//! nothing partially typed leaves this module.
//!
//! Also hosts the editor's deck-code import/export (plain padded base64 of the quiz JSON).

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::{Card, QuizData, QUIZ_VERSION};
use crate::error::{QuizError, Result};

/// Serialize a quiz (with or without result fields) to a URL-safe token.
#[instrument(level = "debug", skip(quiz), fields(cards = quiz.cards.len(), has_results = quiz.has_results()))]
pub fn encode(quiz: &QuizData) -> Result<String> {
  let json = serde_json::to_string(quiz).map_err(|e| QuizError::Encoding(e.to_string()))?;
  let token: String = STANDARD
    .encode(json.as_bytes())
    .chars()
    .filter_map(|c| match c {
      '+' => Some('-'),
      '/' => Some('_'),
      '=' => None,
      other => Some(other),
    })
    .collect();
  debug!(json_len = json.len(), token_len = token.len(), "Encoded quiz token");
  Ok(token)
}

/// Inverse of [`encode`]. Operates on a bare token; see [`decode_envelope`] for paths/URLs.
#[instrument(level = "debug", skip(token), fields(token_len = token.len()))]
pub fn decode(token: &str) -> Result<QuizData> {
  let mut b64: String = token
    .chars()
    .filter(|c| !c.is_whitespace() && *c != '=')
    .map(|c| match c {
      '-' => '+',
      '_' => '/',
      other => other,
    })
    .collect();
  while b64.len() % 4 != 0 {
    b64.push('=');
  }

  let bytes = STANDARD
    .decode(b64.as_bytes())
    .map_err(|e| QuizError::Decoding(format!("token is not valid base64: {}", e)))?;
  let text = String::from_utf8(bytes)
    .map_err(|e| QuizError::Decoding(format!("token is not valid UTF-8: {}", e)))?;
  let quiz: QuizData = serde_json::from_str(&text)
    .map_err(|e| QuizError::Decoding(format!("invalid quiz data structure: {}", e)))?;

  if quiz.cards.is_empty() {
    return Err(QuizError::Decoding("No valid cards found in quiz data".into()));
  }
  Ok(quiz)
}

/// Pull the bare token out of whatever the caller was handed: a token, a `/quiz/<token>`
/// path, a full URL, or any of those percent-encoded.
pub fn extract_token(input: &str) -> String {
  let trimmed = input.trim();
  let without_fragment = trimmed.split('#').next().unwrap_or_default();
  let without_query = without_fragment.split('?').next().unwrap_or_default();
  let segment = without_query
    .trim_end_matches('/')
    .rsplit('/')
    .next()
    .unwrap_or_default();
  match urlencoding::decode(segment) {
    Ok(decoded) => decoded.into_owned(),
    // Not valid percent-encoding: hand the raw segment to decode and let it report.
    Err(_) => segment.to_string(),
  }
}

/// Envelope-aware entry point used by the session flows.
pub fn decode_envelope(input: &str) -> Result<QuizData> {
  decode(&extract_token(input))
}

// -------- Deck codes (editor import/export) --------

/// Title used for exported decks without one.
pub const UNTITLED_QUIZ: &str = "Untitled Quiz";

/// Payload accepted by [`import_deck`]. Title/instructions may be missing.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImportedDeck {
  pub title: String,
  pub instructions: String,
  pub cards: Vec<Card>,
}

#[derive(Deserialize)]
struct DeckIn {
  #[serde(default)]
  title: Option<String>,
  #[serde(default)]
  instructions: Option<String>,
  cards: Vec<Card>,
}

/// Build a deck code (standard padded base64 of the quiz JSON) for clipboard export.
///
/// Keeps every card with at least one non-blank side.
pub fn export_deck(title: &str, instructions: &str, cards: &[Card], created_at: &str) -> Result<String> {
  let kept: Vec<Card> = cards.iter().filter(|c| c.is_touched()).cloned().collect();
  if kept.is_empty() && title.trim().is_empty() && instructions.trim().is_empty() {
    return Err(QuizError::Validation("No data to export".into()));
  }
  let data = QuizData {
    title: Some(if title.is_empty() { UNTITLED_QUIZ.to_string() } else { title.to_string() }),
    instructions: Some(instructions.to_string()),
    cards: kept,
    created_at: Some(created_at.to_string()),
    version: Some(QUIZ_VERSION.to_string()),
    user_answers: None,
    shuffle_order: None,
  };
  let json = serde_json::to_string(&data).map_err(|e| QuizError::Encoding(e.to_string()))?;
  Ok(STANDARD.encode(json.as_bytes()))
}

/// Accept a deck code or raw JSON. Base64 is tried first.
pub fn import_deck(input: &str) -> Result<ImportedDeck> {
  let trimmed = input.trim();
  let json = STANDARD
    .decode(trimmed.as_bytes())
    .ok()
    .and_then(|bytes| String::from_utf8(bytes).ok())
    .unwrap_or_else(|| trimmed.to_string());

  let deck: DeckIn = serde_json::from_str(&json).map_err(|e| {
    debug!(error = %e, "Deck import rejected");
    QuizError::Validation("Incorrect data format".into())
  })?;
  Ok(ImportedDeck {
    title: deck.title.unwrap_or_default(),
    instructions: deck.instructions.unwrap_or_default(),
    cards: deck.cards,
  })
}
