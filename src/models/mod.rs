mod question;

pub use question::{AnswerRecord, Question};

use serde::Serialize;

/// Lifecycle of a quiz session. There is no way back to `NotStarted`;
/// restarting builds a fresh session and goes straight to `InProgress`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GameStatus {
    NotStarted,
    InProgress,
    Finished,
}
