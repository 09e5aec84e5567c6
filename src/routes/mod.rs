//! Router assembly: HTTP endpoints, static files, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;

/// Build the application router with:
/// - the judging service at `/api/score-quiz`
/// - quiz/results flows under `/api/v1/...`
/// - Static SPA from the configured directory with index fallback, so `/quiz/<token>` and
///   `/results/<token>` land on the frontend
/// - CORS (allow any origin/method/headers) - adjust for production if needed
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    let static_dir = state.config.static_dir.clone();
    let static_service = ServeDir::new(&static_dir)
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new(format!("{}/index.html", static_dir)));

    Router::new()
        .route("/api/v1/health", get(http::http_health))
        .route("/api/score-quiz", post(http::http_post_score))
        .route("/api/v1/quiz", post(http::http_post_quiz))
        .route("/api/v1/quiz/:token", get(http::http_get_quiz))
        .route("/api/v1/quiz/:token/results", post(http::http_post_results))
        .route("/api/v1/results/:token", get(http::http_get_results))
        .route("/api/v1/deck/export", post(http::http_post_deck_export))
        .route("/api/v1/deck/import", post(http::http_post_deck_import))
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Frontend fallback
        .fallback_service(static_service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode;
    use crate::domain::{Card, QuizData};
    use crate::judge::FALLBACK_RATIONALE;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        build_router(Arc::new(AppState::offline()))
    }

    async fn call(req: Request<Body>) -> (StatusCode, Value) {
        let res = app().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    fn quiz() -> QuizData {
        QuizData::new(vec![
            Card { id: "1".into(), question: "Capital of France?".into(), answer: "Paris".into() },
            Card { id: "2".into(), question: "Capital of Japan?".into(), answer: "Tokyo".into() },
        ])
    }

    #[tokio::test]
    async fn health_reports_offline_judge() {
        let (status, body) = call(get("/api/v1/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"ok": true, "judge": "offline"}));
    }

    #[tokio::test]
    async fn score_endpoint_rejects_missing_fields() {
        let (status, body) = call(post_json("/api/score-quiz", json!({"question": "q", "userAnswer": "a"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing required fields: question, correctAnswer, userAnswer");

        let blank = json!({"question": "q", "correctAnswer": "a", "userAnswer": "   "});
        let (status, body) = call(post_json("/api/score-quiz", blank)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing required fields: question, correctAnswer, userAnswer");
    }

    #[tokio::test]
    async fn score_endpoint_falls_back_without_a_model() {
        let req = json!({"question": "Capital of France?", "correctAnswer": "paris", "userAnswer": " Paris "});
        let (status, body) = call(post_json("/api/score-quiz", req)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"score": "correct", "rationale": FALLBACK_RATIONALE}));
    }

    #[tokio::test]
    async fn share_take_submit_view() {
        let draft = json!({
            "title": "Capitals",
            "cards": [
                {"id": "1", "question": "Capital of France?", "answer": "Paris"},
                {"id": "2", "question": "", "answer": ""},
                {"id": "3", "question": "Capital of Japan?", "answer": "Tokyo"}
            ]
        });
        let (status, shared) = call(post_json("/api/v1/quiz", draft)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(shared["quiz"]["cards"].as_array().unwrap().len(), 2);
        let token = shared["token"].as_str().unwrap().to_string();
        assert_eq!(shared["path"], format!("/quiz/{}", token));

        let (status, take) = call(get(&format!("/api/v1/quiz/{}", token))).await;
        assert_eq!(status, StatusCode::OK);
        let order: Vec<usize> = serde_json::from_value(take["shuffleOrder"].clone()).unwrap();
        let answers: Vec<String> = take["presented"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| if c["answer"] == "Paris" { "paris".to_string() } else { "Osaka".to_string() })
            .collect();

        let submit = json!({"userAnswers": answers, "shuffleOrder": order});
        let (status, link) = call(post_json(&format!("/api/v1/quiz/{}/results", token), submit)).await;
        assert_eq!(status, StatusCode::OK);
        let results_token = link["token"].as_str().unwrap().to_string();
        assert!(link["path"].as_str().unwrap().starts_with("/results/"));

        let (status, view) = call(get(&format!("/api/v1/results/{}", results_token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["summary"]["percentage"], 50);
        assert_eq!(view["summary"]["correct"], 1);
        assert_eq!(view["summary"]["incorrect"], 1);
        assert_eq!(view["share"]["token"], token);
        assert_eq!(view["shareUrl"], format!("/quiz/{}", token));
    }

    #[tokio::test]
    async fn share_rejects_drafts_without_cards() {
        let (status, body) = call(post_json("/api/v1/quiz", json!({"title": "nothing", "cards": []}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_error");
    }

    #[tokio::test]
    async fn corrupt_quiz_token_is_bad_request() {
        let (status, body) = call(get("/api/v1/quiz/not-a-real-token")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "decoding_error");
    }

    #[tokio::test]
    async fn plain_token_has_no_results() {
        let token = encode(&quiz()).unwrap();
        let (status, body) = call(get(&format!("/api/v1/results/{}", token))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "missing_results");
    }

    #[tokio::test]
    async fn submit_rejects_blank_answers() {
        let token = encode(&quiz()).unwrap();
        let submit = json!({"userAnswers": ["Paris", "  "], "shuffleOrder": [0, 1]});
        let (status, _) = call(post_json(&format!("/api/v1/quiz/{}/results", token), submit)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn deck_export_then_import() {
        let deck = json!({"title": "", "cards": [{"id": "1", "question": "q", "answer": "a"}]});
        let (status, out) = call(post_json("/api/v1/deck/export", deck)).await;
        assert_eq!(status, StatusCode::OK);
        let (status, imported) = call(post_json("/api/v1/deck/import", json!({"code": out["code"]}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(imported["title"], "Untitled Quiz");
        assert_eq!(imported["cards"][0]["answer"], "a");
    }
}
