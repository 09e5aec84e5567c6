//! Judging client: one question / expected answer / user answer triple per call.
//!
//! Every way a judge can fail (transport, timeout, non-2xx, malformed body, missing field,
//! out-of-range score) collapses into [`JudgeUnavailable`]. Callers go through
//! [`judge_or_fallback`], which makes exactly one attempt and then degrades to exact matching.

use std::future::Future;
use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{error, instrument, warn};

use crate::config::Prompts;
use crate::domain::{Judgment, Score};
use crate::error::JudgeUnavailable;
use crate::openai::OpenAI;

/// Rationale attached to every fallback judgment; lets the UI tell matching from judging.
pub const FALLBACK_RATIONALE: &str = "AI unavailable - used exact text matching";

/// Anything that can judge a single answer.
pub trait Judge {
  fn judge(
    &self,
    question: &str,
    expected: &str,
    answer: &str,
  ) -> impl Future<Output = Result<Judgment, JudgeUnavailable>> + Send;
}

/// Case-insensitive, surrounding-whitespace-insensitive exact match.
pub fn fallback_judgment(expected: &str, answer: &str) -> Judgment {
  let matched = answer.trim().to_lowercase() == expected.trim().to_lowercase();
  Judgment {
    score: if matched { Score::Correct } else { Score::Incorrect },
    rationale: FALLBACK_RATIONALE.to_string(),
  }
}

/// Single attempt; never fails.
#[instrument(level = "debug", skip_all, fields(question_len = question.len(), answer_len = answer.len()))]
pub async fn judge_or_fallback<J: Judge>(judge: &J, question: &str, expected: &str, answer: &str) -> Judgment {
  match judge.judge(question, expected, answer).await {
    Ok(j) => j,
    Err(e) => {
      warn!(target: "judge", error = %e, "Judge unavailable; using exact text matching");
      fallback_judgment(expected, answer)
    }
  }
}

/// Reply shape shared by the judging endpoint and the model. Fields are optional so that a
/// missing one is reported as such instead of as a generic parse error.
#[derive(Debug, Deserialize, Default)]
pub struct RawJudgment {
  #[serde(default)]
  pub score: Option<String>,
  #[serde(default)]
  pub rationale: Option<String>,
}

pub fn validate_reply(raw: RawJudgment) -> Result<Judgment, String> {
  let score = raw.score.ok_or("Invalid response structure: missing score")?;
  let rationale = raw
    .rationale
    .filter(|r| !r.trim().is_empty())
    .ok_or("Invalid response structure: missing rationale")?;
  let score = Score::parse(&score).ok_or_else(|| format!("Invalid score value: {}", score))?;
  Ok(Judgment { score, rationale })
}

// -------- Remote judging endpoint --------

/// Request body of the judging service contract.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRequest {
  #[serde(default)]
  pub question: Option<String>,
  #[serde(default)]
  pub correct_answer: Option<String>,
  #[serde(default)]
  pub user_answer: Option<String>,
}

impl ScoreRequest {
  pub fn new(question: &str, correct_answer: &str, user_answer: &str) -> Self {
    Self {
      question: Some(question.to_string()),
      correct_answer: Some(correct_answer.to_string()),
      user_answer: Some(user_answer.to_string()),
    }
  }

  /// All three fields present and non-blank, or the validation message.
  pub fn validated(&self) -> Result<(&str, &str, &str), String> {
    fn present(f: &Option<String>) -> Option<&str> {
      f.as_deref().filter(|s| !s.trim().is_empty())
    }
    match (present(&self.question), present(&self.correct_answer), present(&self.user_answer)) {
      (Some(q), Some(c), Some(u)) => Ok((q, c, u)),
      _ => Err("Missing required fields: question, correctAnswer, userAnswer".into()),
    }
  }
}

/// Talks to a judging service speaking the `{question, correctAnswer, userAnswer}` contract.
#[derive(Clone)]
pub struct HttpJudge {
  client: reqwest::Client,
  pub url: String,
}

impl HttpJudge {
  pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, String> {
    let client = reqwest::Client::builder().timeout(timeout).build().map_err(|e| e.to_string())?;
    Ok(Self { client, url: url.into() })
  }

  async fn call(&self, question: &str, expected: &str, answer: &str) -> Result<Judgment, String> {
    let res = self.client.post(&self.url)
      .header(USER_AGENT, "flash-quiz/0.1")
      .header(CONTENT_TYPE, "application/json")
      .json(&ScoreRequest::new(question, expected, answer))
      .send().await.map_err(|e| e.to_string())?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      return Err(format!("judge HTTP {}: {}", status, crate::util::trunc_for_log(&body, 200)));
    }
    let raw: RawJudgment = res.json().await.map_err(|e| e.to_string())?;
    validate_reply(raw)
  }
}

impl Judge for HttpJudge {
  async fn judge(&self, question: &str, expected: &str, answer: &str) -> Result<Judgment, JudgeUnavailable> {
    self.call(question, expected, answer).await.map_err(|e| {
      error!(target: "judge", error = %e, "Remote judge call failed");
      JudgeUnavailable(e)
    })
  }
}

// -------- In-process model judge --------

#[derive(Clone)]
pub struct LlmJudge {
  pub openai: OpenAI,
  pub prompts: Prompts,
}

impl Judge for LlmJudge {
  async fn judge(&self, question: &str, expected: &str, answer: &str) -> Result<Judgment, JudgeUnavailable> {
    self
      .openai
      .judge_answer(&self.prompts, question, expected, answer)
      .await
      .map_err(|e| {
        error!(target: "judge", error = %e, "Model judge failed");
        JudgeUnavailable(e)
      })
  }
}

/// Judge selected at startup from the environment.
#[derive(Clone)]
pub enum JudgeBackend {
  Remote(HttpJudge),
  Llm(LlmJudge),
  /// No judge configured; every call falls back.
  Offline,
}

impl JudgeBackend {
  pub fn name(&self) -> &'static str {
    match self {
      JudgeBackend::Remote(_) => "remote",
      JudgeBackend::Llm(_) => "openai",
      JudgeBackend::Offline => "offline",
    }
  }
}

impl Judge for JudgeBackend {
  async fn judge(&self, question: &str, expected: &str, answer: &str) -> Result<Judgment, JudgeUnavailable> {
    match self {
      JudgeBackend::Remote(h) => h.judge(question, expected, answer).await,
      JudgeBackend::Llm(l) => l.judge(question, expected, answer).await,
      JudgeBackend::Offline => Err(JudgeUnavailable("no judge configured".into())),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use axum::{http::StatusCode, routing::post, Json, Router};
  use pretty_assertions::assert_eq;
  use serde_json::json;

  async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{}/api/score-quiz", addr)
  }

  /// A port that was just bound and released; nothing is listening there.
  async fn closed_port_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/api/score-quiz", addr)
  }

  #[test]
  fn fallback_ignores_case_and_surrounding_whitespace() {
    assert_eq!(
      fallback_judgment("paris", " Paris "),
      Judgment { score: Score::Correct, rationale: FALLBACK_RATIONALE.into() }
    );
    assert_eq!(fallback_judgment("Paris", "Lyon").score, Score::Incorrect);
    // Inner whitespace still counts.
    assert_eq!(fallback_judgment("New York", "NewYork").score, Score::Incorrect);
  }

  #[test]
  fn validate_reply_requires_both_fields() {
    let ok = validate_reply(RawJudgment { score: Some("correct".into()), rationale: Some("Exact.".into()) });
    assert_eq!(ok.unwrap().score, Score::Correct);
    assert!(validate_reply(RawJudgment { score: None, rationale: Some("x".into()) }).is_err());
    assert!(validate_reply(RawJudgment { score: Some("correct".into()), rationale: Some("".into()) }).is_err());
    assert!(validate_reply(RawJudgment { score: Some("right".into()), rationale: Some("x".into()) }).is_err());
  }

  #[test]
  fn score_request_validation() {
    assert!(ScoreRequest::new("q", "a", "b").validated().is_ok());
    assert!(ScoreRequest::new("q", "", "b").validated().is_err());
    assert!(ScoreRequest::new("q", "a", "   ").validated().is_err());
    assert!(ScoreRequest::new(" \t", "a", "b").validated().is_err());
    let missing = ScoreRequest { question: Some("q".into()), ..Default::default() };
    assert!(missing.validated().is_err());
  }

  #[tokio::test]
  async fn transport_failure_falls_back() {
    let judge = HttpJudge::new(closed_port_url().await, Duration::from_secs(2)).unwrap();
    let j = judge_or_fallback(&judge, "Capital of France?", "paris", " Paris ").await;
    assert_eq!(j, Judgment { score: Score::Correct, rationale: FALLBACK_RATIONALE.into() });
  }

  #[tokio::test]
  async fn remote_judgment_is_used_when_valid() {
    let app = Router::new().route(
      "/api/score-quiz",
      post(|Json(req): Json<ScoreRequest>| async move {
        assert_eq!(req.correct_answer.as_deref(), Some("Paris"));
        Json(json!({"score": "unsure", "rationale": "Spelling is off."}))
      }),
    );
    let judge = HttpJudge::new(serve(app).await, Duration::from_secs(5)).unwrap();
    let j = judge_or_fallback(&judge, "Capital of France?", "Paris", "Parris").await;
    assert_eq!(j, Judgment { score: Score::Unsure, rationale: "Spelling is off.".into() });
  }

  #[tokio::test]
  async fn non_success_status_falls_back() {
    let app = Router::new().route(
      "/api/score-quiz",
      post(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
    );
    let judge = HttpJudge::new(serve(app).await, Duration::from_secs(5)).unwrap();
    let j = judge_or_fallback(&judge, "q", "Paris", "Rome").await;
    assert_eq!(j, Judgment { score: Score::Incorrect, rationale: FALLBACK_RATIONALE.into() });
  }

  #[tokio::test]
  async fn malformed_reply_falls_back() {
    let app = Router::new().route(
      "/api/score-quiz",
      post(|| async { Json(json!({"score": "great"})) }),
    );
    let judge = HttpJudge::new(serve(app).await, Duration::from_secs(5)).unwrap();
    assert!(judge.judge("q", "a", "a").await.is_err());
    assert_eq!(judge_or_fallback(&judge, "q", "a", "A").await.rationale, FALLBACK_RATIONALE);
  }

  #[tokio::test]
  async fn timeout_falls_back() {
    let app = Router::new().route(
      "/api/score-quiz",
      post(|| async {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Json(json!({"score": "correct", "rationale": "late"}))
      }),
    );
    let judge = HttpJudge::new(serve(app).await, Duration::from_millis(200)).unwrap();
    let j = judge_or_fallback(&judge, "q", "a", "b").await;
    assert_eq!(j.rationale, FALLBACK_RATIONALE);
  }

  #[tokio::test]
  async fn offline_backend_always_falls_back() {
    let j = judge_or_fallback(&JudgeBackend::Offline, "q", "Tokyo", "tokyo").await;
    assert_eq!(j.score, Score::Correct);
    assert_eq!(j.rationale, FALLBACK_RATIONALE);
  }
}
