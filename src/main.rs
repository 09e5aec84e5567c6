//! Flash Quiz · backend
//!
//! - Axum HTTP API for sharing, taking and judging quizzes
//! - Optional OpenAI integration (via environment variables)
//! - Static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT                : u16 (default 3000)
//!   OPENAI_API_KEY      : enables the model judge if present
//!   OPENAI_BASE_URL     : default "https://api.openai.com/v1"
//!   OPENAI_JUDGE_MODEL  : default "gpt-3.5-turbo"
//!   JUDGE_URL           : remote judging service used for results views
//!   JUDGE_TIMEOUT_SECS  : per judge call timeout (default 20)
//!   FLASH_CONFIG_PATH   : path to TOML config (prompts + share base URL)
//!   PUBLIC_BASE_URL     : prefix for absolute share links
//!   STATIC_DIR          : frontend directory (default "./static")
//!   LOG_LEVEL           : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT          : "pretty" (default) or "json"

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, instrument};

use flash_quiz::{build_router, telemetry, AppState};

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Config, OpenAI client and results judge.
  let state = Arc::new(AppState::from_env());

  // Build the HTTP router with routes, CORS and tracing layers.
  let app = build_router(state.clone());

  // Read port from env or default to 3000.
  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "flash_quiz", %addr, judge = state.judge.name(), "HTTP server listening");
  axum::serve(listener, app).await?;
  Ok(())
}
