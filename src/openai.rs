//! Minimal OpenAI client for answer judging.
//!
//! We only call chat.completions and request a strict JSON object back.
//! Calls are instrumented and log model names, latencies, and response sizes (not contents).
//!
//! NOTE: We never log the API key and we keep payload truncations short to avoid PII leaks.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

use crate::config::Prompts;
use crate::domain::Judgment;
use crate::judge::{validate_reply, RawJudgment};
use crate::util::{fill_template, trunc_for_log};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_JUDGE_MODEL: &str = "gpt-3.5-turbo";

#[derive(Clone)]
pub struct OpenAI {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub judge_model: String,
}

impl OpenAI {
  /// Construct the client if we find OPENAI_API_KEY; otherwise return None.
  pub fn from_env(timeout: Duration) -> Option<Self> {
    let api_key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.trim().is_empty())?;
    let base_url = std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
    let judge_model = std::env::var("OPENAI_JUDGE_MODEL").unwrap_or_else(|_| DEFAULT_JUDGE_MODEL.into());
    Self::new(api_key, base_url, judge_model, timeout)
  }

  pub fn new(api_key: String, base_url: String, judge_model: String, timeout: Duration) -> Option<Self> {
    let client = reqwest::Client::builder().timeout(timeout).build().ok()?;
    Some(Self { client, api_key, base_url, judge_model })
  }

  /// JSON-object chat completion. Generic over the target type T.
  #[instrument(level = "info", skip(self, system, user), fields(model = %model))]
  async fn chat_json<T: for<'a> Deserialize<'a>>(
    &self,
    model: &str,
    system: &str,
    user: &str,
    temperature: f32,
    max_tokens: Option<u32>,
  ) -> Result<T, String> {
    let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
    let req = ChatCompletionRequest {
      model: model.to_string(),
      messages: vec![
        ChatMessageReq { role: "system".into(), content: system.into() },
        ChatMessageReq { role: "user".into(), content: user.into() },
      ],
      temperature,
      response_format: Some(ResponseFormat { r#type: "json_object".into() }),
      max_tokens,
    };

    let res = self.client.post(&url)
      .header(USER_AGENT, "flash-quiz/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req).send().await.map_err(|e| e.to_string())?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_openai_error(&body).unwrap_or_else(|| trunc_for_log(&body, 200));
      return Err(format!("OpenAI HTTP {}: {}", status, msg));
    }

    let body: ChatCompletionResponse = res.json().await.map_err(|e| e.to_string())?;
    if let Some(usage) = &body.usage {
      info!(prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "OpenAI usage");
    }
    let text = body.choices.first()
      .and_then(|c| c.message.content.clone())
      .unwrap_or_default();
    let text = text.trim();
    if text.is_empty() {
      return Err("No response from OpenAI".into());
    }
    debug!(reply = %trunc_for_log(text, 120), "OpenAI raw reply");

    serde_json::from_str::<T>(text).map_err(|e| format!("JSON parse error: {}", e))
  }

  /// Score one flashcard answer as correct / unsure / incorrect with a short rationale.
  #[instrument(level = "info", skip(self, prompts, question, correct_answer, user_answer),
               fields(model = %self.judge_model, question_len = question.len(), answer_len = user_answer.len()))]
  pub async fn judge_answer(
    &self,
    prompts: &Prompts,
    question: &str,
    correct_answer: &str,
    user_answer: &str,
  ) -> Result<Judgment, String> {
    let user = fill_template(
      &prompts.judge_user_template,
      &[
        ("question", question),
        ("correct_answer", correct_answer),
        ("user_answer", user_answer),
      ],
    );
    let start = std::time::Instant::now();
    let result = self
      .chat_json::<RawJudgment>(&self.judge_model, &prompts.judge_system, &user, 0.1, Some(150))
      .await;
    let elapsed = start.elapsed();

    let raw = match result {
      Ok(raw) => raw,
      Err(e) => {
        error!(?elapsed, error = %e, "Model call failed during answer judging");
        return Err(e);
      }
    };
    let judgment = validate_reply(raw)?;
    info!(?elapsed, score = ?judgment.score, "Answer judged by model");
    Ok(judgment)
  }
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  temperature: f32,
  #[serde(skip_serializing_if = "Option::is_none")]
  response_format: Option<ResponseFormat>,
  #[serde(skip_serializing_if = "Option::is_none")]
  max_tokens: Option<u32>,
}
#[derive(Serialize)]
struct ChatMessageReq { role: String, content: String }
#[derive(Serialize)]
struct ResponseFormat { #[serde(rename = "type")] r#type: String }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

/// Try to extract a clean error message from OpenAI error body.
fn extract_openai_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  match serde_json::from_str::<EWrap>(body) {
    Ok(w) => Some(w.error.message),
    Err(_) => None,
  }
}
