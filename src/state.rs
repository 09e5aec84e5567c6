//! Application state: effective config, the judge used for results, and the model judge
//! behind the judging endpoint.
//!
//! Judge selection for results views:
//!   - JUDGE_URL set        -> remote judging service (`HttpJudge`)
//!   - OPENAI_API_KEY set   -> in-process model judge
//!   - neither              -> offline; every answer goes through exact matching

use tracing::{error, info, instrument, warn};

use crate::config::AppConfig;
use crate::judge::{HttpJudge, JudgeBackend, LlmJudge};
use crate::openai::OpenAI;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    /// Used by the results flow.
    pub judge: JudgeBackend,
    /// Used by the judging endpoint; None means every request gets the fallback.
    pub llm: Option<LlmJudge>,
}

impl AppState {
    /// Build state from env: load config, init the OpenAI client, pick the results judge.
    #[instrument(level = "info", skip_all)]
    pub fn from_env() -> Self {
        let config = AppConfig::from_env();
        let llm = OpenAI::from_env(config.judge_timeout).map(|openai| LlmJudge {
            openai,
            prompts: config.prompts.clone(),
        });
        if let Some(l) = &llm {
            info!(target: "flash_quiz", base_url = %l.openai.base_url, model = %l.openai.judge_model, "OpenAI enabled.");
        } else {
            warn!(target: "flash_quiz", "OpenAI disabled (no OPENAI_API_KEY). Judging falls back to exact matching.");
        }
        Self::new(config, llm)
    }

    pub fn new(config: AppConfig, llm: Option<LlmJudge>) -> Self {
        let judge = match &config.judge_url {
            Some(url) => match HttpJudge::new(url.clone(), config.judge_timeout) {
                Ok(h) => JudgeBackend::Remote(h),
                Err(e) => {
                    error!(target: "flash_quiz", %url, error = %e, "Could not build judge client; judging offline");
                    JudgeBackend::Offline
                }
            },
            None => match &llm {
                Some(l) => JudgeBackend::Llm(l.clone()),
                None => JudgeBackend::Offline,
            },
        };
        info!(target: "flash_quiz", judge = judge.name(), "Results judge selected");
        Self { config, judge, llm }
    }

    /// Offline state with defaults; every judgment is the exact-match fallback.
    pub fn offline() -> Self {
        Self::new(AppConfig::default(), None)
    }
}
