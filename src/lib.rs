//! Flash quiz backend: self-contained quiz links, shuffled quiz taking, and answer judging
//! with an exact-match fallback.
//!
//! Everything a quiz needs travels inside its link token, so the server keeps no quiz
//! state. Results tokens carry the respondent's answers and the shuffle order alongside
//! the original cards.

pub mod codec;
pub mod config;
pub mod domain;
pub mod error;
pub mod judge;
pub mod openai;
pub mod protocol;
pub mod routes;
pub mod schedule;
pub mod scoring;
pub mod session;
pub mod shuffle;
pub mod state;
pub mod storage;
pub mod telemetry;
pub mod util;

pub use codec::{decode, decode_envelope, encode, export_deck, extract_token, import_deck};
pub use domain::{Card, Judgment, QuizData, QuizDraft, Results, Score};
pub use error::{ApiError, JudgeUnavailable, QuizError};
pub use judge::{fallback_judgment, judge_or_fallback, HttpJudge, Judge, JudgeBackend, LlmJudge};
pub use routes::build_router;
pub use scoring::{summarize, Summary};
pub use session::{prepare_share, submit_answers, view_results, QuizSession, ResultsView, SharedLink};
pub use state::AppState;
