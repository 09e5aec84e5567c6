//! Loading service configuration (judge prompts + share settings) from TOML and the environment.
//!
//! See `AppConfig` and `Prompts` for expected schema. Every field has a default, so an
//! empty or partial file is fine.

use std::time::Duration;

use serde::Deserialize;
use tracing::{error, info};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct FileConfig {
  #[serde(default)]
  pub prompts: Prompts,
  #[serde(default)]
  pub share: ShareCfg,
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct ShareCfg {
  /// Origin prefixed to share paths, e.g. "https://flash.example". Empty means relative paths.
  #[serde(default)]
  pub base_url: String,
}

/// Prompts used by the model judge.
/// Placeholders: `{question}`, `{correct_answer}`, `{user_answer}`.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  pub judge_system: String,
  pub judge_user_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      judge_system: "You are scoring a flashcard quiz answer. Respond ONLY with strict JSON.".into(),
      judge_user_template: concat!(
        "Question: \"{question}\"\n",
        "Correct Answer: \"{correct_answer}\"\n",
        "User's Answer: \"{user_answer}\"\n\n",
        "Score the user's answer as one of:\n",
        "- \"correct\": Answer is right or essentially equivalent\n",
        "- \"unsure\": Answer is partially correct or ambiguous\n",
        "- \"incorrect\": Answer is wrong\n\n",
        "Provide a brief rationale (max 20 words) explaining the scoring.\n\n",
        "Respond in this exact JSON format:\n",
        "{\"score\": \"correct|unsure|incorrect\", \"rationale\": \"Brief explanation of scoring\"}"
      )
      .into(),
    }
  }
}

/// Effective runtime settings after merging the TOML file and environment variables.
#[derive(Clone, Debug)]
pub struct AppConfig {
  pub prompts: Prompts,
  pub public_base_url: String,
  pub judge_url: Option<String>,
  pub judge_timeout: Duration,
  pub static_dir: String,
}

pub const DEFAULT_JUDGE_TIMEOUT_SECS: u64 = 20;

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      prompts: Prompts::default(),
      public_base_url: String::new(),
      judge_url: None,
      judge_timeout: Duration::from_secs(DEFAULT_JUDGE_TIMEOUT_SECS),
      static_dir: "./static".into(),
    }
  }
}

impl AppConfig {
  /// FLASH_CONFIG_PATH (TOML) first, then PUBLIC_BASE_URL / JUDGE_URL / JUDGE_TIMEOUT_SECS / STATIC_DIR.
  pub fn from_env() -> Self {
    let file = load_file_config_from_env().unwrap_or_default();
    let mut cfg = AppConfig {
      prompts: file.prompts,
      public_base_url: file.share.base_url,
      ..AppConfig::default()
    };

    if let Ok(base) = std::env::var("PUBLIC_BASE_URL") {
      cfg.public_base_url = base;
    }
    cfg.public_base_url = cfg.public_base_url.trim_end_matches('/').to_string();
    cfg.judge_url = std::env::var("JUDGE_URL").ok().filter(|u| !u.trim().is_empty());
    if let Some(secs) = std::env::var("JUDGE_TIMEOUT_SECS").ok().and_then(|s| s.parse::<u64>().ok()) {
      cfg.judge_timeout = Duration::from_secs(secs);
    }
    if let Ok(dir) = std::env::var("STATIC_DIR") {
      cfg.static_dir = dir;
    }
    cfg
  }
}

pub fn parse_file_config(s: &str) -> Result<FileConfig, toml::de::Error> {
  toml::from_str::<FileConfig>(s)
}

/// Attempt to load `FileConfig` from FLASH_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_file_config_from_env() -> Option<FileConfig> {
  let path = std::env::var("FLASH_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_file_config(&s) {
      Ok(cfg) => {
        info!(target: "flash_quiz", %path, "Loaded config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "flash_quiz", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "flash_quiz", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_file_uses_defaults() {
    let cfg = parse_file_config("").unwrap();
    assert!(cfg.prompts.judge_user_template.contains("{user_answer}"));
    assert_eq!(cfg.share.base_url, "");
  }

  #[test]
  fn partial_prompt_override_keeps_other_defaults() {
    let cfg = parse_file_config(
      r#"
      [prompts]
      judge_system = "Be lenient."

      [share]
      base_url = "https://flash.example"
      "#,
    )
    .unwrap();
    assert_eq!(cfg.prompts.judge_system, "Be lenient.");
    assert_eq!(cfg.prompts.judge_user_template, Prompts::default().judge_user_template);
    assert_eq!(cfg.share.base_url, "https://flash.example");
  }

  #[test]
  fn malformed_toml_is_an_error() {
    assert!(parse_file_config("[prompts\njudge_system = 1").is_err());
  }
}
