//! HTTP endpoint handlers. These are thin wrappers that forward to the session flows.
//! Each handler is instrumented and logs sizes and outcomes, never answer text.

use std::sync::Arc;

use axum::{
  extract::{rejection::JsonRejection, Path, State},
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use tracing::{info, instrument, warn};

use crate::codec::{decode_envelope, export_deck, import_deck, ImportedDeck};
use crate::domain::QuizDraft;
use crate::error::ApiError;
use crate::judge::{fallback_judgment, judge_or_fallback, ScoreRequest};
use crate::protocol::*;
use crate::session::{prepare_share, submit_answers, view_results, QuizSession};
use crate::state::AppState;

fn now_rfc3339() -> String {
  chrono::Utc::now().to_rfc3339()
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
  body.map(|Json(v)| v).map_err(|e| ApiError::BadRequest(e.body_text()))
}

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(HealthOut { ok: true, judge: state.judge.name() })
}

/// Judging service boundary: 400 on missing fields, otherwise always 200 with either the
/// model's judgment or the exact-match fallback.
#[instrument(level = "info", skip(state, body))]
pub async fn http_post_score(
  State(state): State<Arc<AppState>>,
  body: Result<Json<ScoreRequest>, JsonRejection>,
) -> Response {
  let req = match body {
    Ok(Json(req)) => req,
    Err(e) => {
      warn!(target: "judge", error = %e.body_text(), "Score request body rejected");
      return (StatusCode::BAD_REQUEST, Json(ScoreErrorOut { error: e.body_text() })).into_response();
    }
  };
  let (question, correct_answer, user_answer) = match req.validated() {
    Ok(fields) => fields,
    Err(msg) => return (StatusCode::BAD_REQUEST, Json(ScoreErrorOut { error: msg })).into_response(),
  };

  let judgment = match &state.llm {
    Some(llm) => judge_or_fallback(llm, question, correct_answer, user_answer).await,
    None => fallback_judgment(correct_answer, user_answer),
  };
  info!(target: "judge", score = ?judgment.score, "Score request answered");
  Json(judgment).into_response()
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_post_quiz(
  State(state): State<Arc<AppState>>,
  body: Result<Json<QuizDraft>, JsonRejection>,
) -> Result<Json<ShareOut>, ApiError> {
  let draft = json_body(body)?;
  let (quiz, link) = prepare_share(&draft, &now_rfc3339())?;
  Ok(Json(ShareOut { quiz, link: LinkOut::new(link, &state.config.public_base_url) }))
}

#[instrument(level = "info", skip(token), fields(token_len = token.len()))]
pub async fn http_get_quiz(Path(token): Path<String>) -> Result<Json<TakeOut>, ApiError> {
  let session = QuizSession::start(&token, &mut rand::thread_rng())?;
  info!(target: "flash_quiz", cards = session.len(), "Quiz attempt started");
  Ok(Json(TakeOut {
    quiz: session.quiz().clone(),
    presented: session.presented().to_vec(),
    shuffle_order: session.shuffle_order().to_vec(),
  }))
}

#[instrument(level = "info", skip(state, token, body), fields(token_len = token.len()))]
pub async fn http_post_results(
  State(state): State<Arc<AppState>>,
  Path(token): Path<String>,
  body: Result<Json<SubmitIn>, JsonRejection>,
) -> Result<Json<LinkOut>, ApiError> {
  let submitted = json_body(body)?;
  let quiz = decode_envelope(&token)?.without_results();
  let (_, link) = submit_answers(&quiz, submitted.user_answers, submitted.shuffle_order)?;
  Ok(Json(LinkOut::new(link, &state.config.public_base_url)))
}

#[instrument(level = "info", skip(state, token), fields(token_len = token.len(), judge = state.judge.name()))]
pub async fn http_get_results(
  State(state): State<Arc<AppState>>,
  Path(token): Path<String>,
) -> Result<Json<ResultsOut>, ApiError> {
  let view = view_results(&token, &state.judge).await?;
  let share_url = format!("{}{}", state.config.public_base_url, view.share.path);
  Ok(Json(ResultsOut { view, share_url }))
}

#[instrument(level = "info", skip(body))]
pub async fn http_post_deck_export(body: Result<Json<ExportIn>, JsonRejection>) -> Result<Json<ExportOut>, ApiError> {
  let deck = json_body(body)?;
  let code = export_deck(&deck.title, &deck.instructions, &deck.cards, &now_rfc3339())?;
  Ok(Json(ExportOut { code }))
}

#[instrument(level = "info", skip(body))]
pub async fn http_post_deck_import(body: Result<Json<ImportIn>, JsonRejection>) -> Result<Json<ImportedDeck>, ApiError> {
  let input = json_body(body)?;
  Ok(Json(import_deck(&input.code)?))
}
