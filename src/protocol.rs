//! Public protocol structs for the HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::{Card, QuizData};
use crate::session::{ResultsView, SharedLink};

/// Share/results link as returned to clients: relative path plus absolute URL when a
/// public base URL is configured.
#[derive(Debug, Serialize)]
pub struct LinkOut {
    pub token: String,
    pub path: String,
    pub url: String,
}

impl LinkOut {
    pub fn new(link: SharedLink, base_url: &str) -> Self {
        let url = format!("{}{}", base_url, link.path);
        Self { token: link.token, path: link.path, url }
    }
}

#[derive(Debug, Serialize)]
pub struct ShareOut {
    pub quiz: QuizData,
    #[serde(flatten)]
    pub link: LinkOut,
}

/// Start of a quiz-taking attempt: the quiz, its cards in presentation order, and the
/// order to send back with the answers.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TakeOut {
    pub quiz: QuizData,
    pub presented: Vec<Card>,
    pub shuffle_order: Vec<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitIn {
    pub user_answers: Vec<String>,
    pub shuffle_order: Vec<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsOut {
    #[serde(flatten)]
    pub view: ResultsView,
    pub share_url: String,
}

#[derive(Debug, Deserialize)]
pub struct ExportIn {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub instructions: String,
    #[serde(default)]
    pub cards: Vec<Card>,
}

#[derive(Debug, Serialize)]
pub struct ExportOut {
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct ImportIn {
    pub code: String,
}

/// Error body of the judging endpoint.
#[derive(Debug, Serialize)]
pub struct ScoreErrorOut {
    pub error: String,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
    pub judge: &'static str,
}
