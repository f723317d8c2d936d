use serde::Serialize;

/// One quiz item. `id` is assigned by the loader, unique within a bank and
/// stable for the lifetime of a session, so answers can be correlated back
/// to questions after the bank has been shuffled.
#[derive(Debug, Clone, Serialize)]
pub struct Question {
    pub id: u32,
    pub text: String,
    /// Insertion order is display order; the A/B/C/D labels shown to the
    /// user are derived from position and never stored.
    pub options: Vec<String>,
    pub correct_answer: usize,
    pub time_limit_seconds: u32,
}

/// One user response (or non-response) to a question, frozen at
/// submit/timeout time.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerRecord {
    /// Lookup key into the session bank, not an index into it.
    pub question_id: u32,
    /// `None` means the question timed out unanswered.
    pub selected_option: Option<usize>,
    pub is_correct: bool,
}
