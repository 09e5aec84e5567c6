//! Client-side key/value persistence: the in-progress draft and the theme preference.
//!
//! The store is injected; nothing here touches ambient global state.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{Card, QuizDraft};

pub const DRAFT_KEY: &str = "flash-draft";
pub const THEME_KEY: &str = "flash-theme";

/// Minimal capability the editor needs from its storage.
pub trait KeyValueStore: Send + Sync {
  fn get(&self, key: &str) -> Option<String>;
  fn set(&self, key: &str, value: String);
}

/// Process-local store; stands in for browser storage in tests and single-user tools.
#[derive(Debug, Default)]
pub struct MemoryStore {
  entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

impl KeyValueStore for MemoryStore {
  fn get(&self, key: &str) -> Option<String> {
    self.entries.lock().ok()?.get(key).cloned()
  }

  fn set(&self, key: &str, value: String) {
    if let Ok(mut entries) = self.entries.lock() {
      entries.insert(key.to_string(), value);
    }
  }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredDraft {
  cards: Vec<Card>,
  title: String,
  instructions: String,
  last_saved: String,
}

/// Persist the draft unless every field is blank. Returns whether anything was written.
pub fn save_draft(store: &dyn KeyValueStore, draft: &QuizDraft, now: &str) -> bool {
  if !draft.has_content() {
    return false;
  }
  let stored = StoredDraft {
    cards: draft.cards.clone(),
    title: draft.title.clone(),
    instructions: draft.instructions.clone(),
    last_saved: now.to_string(),
  };
  match serde_json::to_string(&stored) {
    Ok(json) => {
      store.set(DRAFT_KEY, json);
      true
    }
    Err(e) => {
      debug!(error = %e, "Draft not serializable; skipped");
      false
    }
  }
}

/// Read the draft once at start-up. A value that does not parse counts as no draft.
pub fn load_draft(store: &dyn KeyValueStore) -> Option<QuizDraft> {
  let raw = store.get(DRAFT_KEY)?;
  match serde_json::from_str::<StoredDraft>(&raw) {
    Ok(d) => Some(QuizDraft { title: d.title, instructions: d.instructions, cards: d.cards }),
    Err(e) => {
      debug!(error = %e, "Discarding unreadable draft");
      None
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Theme {
  #[default]
  Default,
  Ocean,
  Jungle,
  Desert,
}

impl Theme {
  /// Class name stored and applied to the page body.
  pub fn class(self) -> &'static str {
    match self {
      Theme::Default => "",
      Theme::Ocean => "theme-ocean",
      Theme::Jungle => "theme-jungle",
      Theme::Desert => "theme-desert",
    }
  }

  pub fn from_class(s: &str) -> Theme {
    match s {
      "theme-ocean" => Theme::Ocean,
      "theme-jungle" => Theme::Jungle,
      "theme-desert" => Theme::Desert,
      _ => Theme::Default,
    }
  }
}

pub fn load_theme(store: &dyn KeyValueStore) -> Theme {
  store.get(THEME_KEY).map(|s| Theme::from_class(&s)).unwrap_or_default()
}

pub fn save_theme(store: &dyn KeyValueStore, theme: Theme) {
  store.set(THEME_KEY, theme.class().to_string());
}
