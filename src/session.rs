//! The quiz session engine: the single source of truth for question order,
//! position, both countdowns, answers and score. The presentation layer only
//! ever reads snapshots and forwards actions back in; it never mutates state.

use std::error::Error;
use std::fmt;

use log::debug;
use rand::Rng;
use serde::Serialize;

use crate::models::{AnswerRecord, GameStatus, Question};

/// How many questions a session samples from the bank.
pub const DEFAULT_SAMPLE_SIZE: usize = 5;
/// Session-wide time budget in seconds.
pub const DEFAULT_GLOBAL_SECONDS: u32 = 300;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// `start` was asked to sample from a bank with no questions.
    EmptyBank,
    /// An action was invoked from a state that forbids it. This is a caller
    /// programming error; the session is left untouched.
    InvalidTransition {
        action: &'static str,
        status: GameStatus,
    },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::EmptyBank => write!(f, "cannot start a session with an empty bank"),
            SessionError::InvalidTransition { action, status } => {
                write!(f, "{} is not valid while {:?}", action, status)
            }
        }
    }
}

impl Error for SessionError {}

/// Uniformly shuffled ordering of `bank`, truncated to `min(k, |bank|)`.
///
/// Partial Fisher-Yates: each output slot i swaps with a uniformly random
/// element from i onward, so every k-permutation is equally likely.
pub fn select_random_subset<R: Rng>(bank: &[Question], k: usize, rng: &mut R) -> Vec<Question> {
    let mut pool: Vec<Question> = bank.to_vec();
    let take = k.min(pool.len());
    for i in 0..take {
        let j = rng.random_range(i..pool.len());
        pool.swap(i, j);
    }
    pool.truncate(take);
    pool
}

/// Read-only view of the current question, for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    pub text: String,
    pub options: Vec<String>,
    pub time_limit_seconds: u32,
}

/// One line of the finished-session review: an answer joined back to its
/// question by id.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewEntry {
    pub question: Question,
    pub selected_option: Option<usize>,
    pub is_correct: bool,
}

/// Read-only state snapshot emitted after every transition. Time values are
/// integer seconds; `mm:ss` formatting is a presentation concern.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub status: GameStatus,
    pub question: Option<QuestionView>,
    pub global_seconds_remaining: u32,
    pub question_seconds_remaining: u32,
    pub current_index: usize,
    pub total_questions: usize,
    pub score: usize,
    pub pending_choice: Option<usize>,
    /// Populated once `Finished`, in presentation order.
    pub review: Vec<ReviewEntry>,
}

/// One timed quiz attempt.
///
/// Driven from outside: a once-per-second ticker calls [`Session::tick_global`]
/// then [`Session::tick_question`] while `InProgress`, and user actions arrive
/// through [`Session::select_option`] and [`Session::submit`]. All operations
/// are synchronous O(1) updates; a rejected action leaves the session
/// unchanged.
pub struct Session {
    status: GameStatus,
    bank: Vec<Question>,
    current_index: usize,
    pending_choice: Option<usize>,
    global_seconds_remaining: u32,
    question_seconds_remaining: u32,
    score: usize,
    answers: Vec<AnswerRecord>,
    sample_size: usize,
    global_time_limit: u32,
}

impl Session {
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_SAMPLE_SIZE, DEFAULT_GLOBAL_SECONDS)
    }

    pub fn with_limits(sample_size: usize, global_seconds: u32) -> Self {
        Self {
            status: GameStatus::NotStarted,
            bank: Vec::new(),
            current_index: 0,
            pending_choice: None,
            global_seconds_remaining: global_seconds,
            question_seconds_remaining: 0,
            score: 0,
            answers: Vec::new(),
            sample_size,
            global_time_limit: global_seconds,
        }
    }

    /// Start a fresh attempt from any state, sampling a new subset of `bank`.
    /// The previous attempt's state is discarded wholesale, never reset in
    /// place.
    pub fn start<R: Rng>(&mut self, bank: &[Question], rng: &mut R) -> Result<(), SessionError> {
        if bank.is_empty() {
            return Err(SessionError::EmptyBank);
        }
        let sampled = select_random_subset(bank, self.sample_size, rng);
        let first_limit = sampled[0].time_limit_seconds;
        debug!(
            "starting session: {} of {} questions, {}s budget",
            sampled.len(),
            bank.len(),
            self.global_time_limit
        );
        *self = Self {
            status: GameStatus::InProgress,
            bank: sampled,
            current_index: 0,
            pending_choice: None,
            global_seconds_remaining: self.global_time_limit,
            question_seconds_remaining: first_limit,
            score: 0,
            answers: Vec::new(),
            sample_size: self.sample_size,
            global_time_limit: self.global_time_limit,
        };
        Ok(())
    }

    /// Record a pending (unsubmitted) choice for the current question,
    /// overwriting any prior one. A no-op once the per-question clock is at
    /// zero: the question is locked, and a late click must not race the
    /// timeout transition.
    pub fn select_option(&mut self, index: usize) -> Result<(), SessionError> {
        self.require_in_progress("select_option")?;
        if self.question_seconds_remaining == 0 {
            return Ok(());
        }
        let Some(question) = self.current_question() else {
            return Ok(());
        };
        if index < question.options.len() {
            self.pending_choice = Some(index);
        }
        Ok(())
    }

    /// Freeze the pending choice into an [`AnswerRecord`] and advance. A
    /// no-op when there is no pending choice or the question is locked.
    pub fn submit(&mut self) -> Result<(), SessionError> {
        self.require_in_progress("submit")?;
        if self.question_seconds_remaining == 0 {
            return Ok(());
        }
        let Some(choice) = self.pending_choice else {
            return Ok(());
        };
        let question = &self.bank[self.current_index];
        let is_correct = choice == question.correct_answer;
        self.answers.push(AnswerRecord {
            question_id: question.id,
            selected_option: Some(choice),
            is_correct,
        });
        if is_correct {
            self.score += 1;
        }
        self.advance();
        Ok(())
    }

    /// Decrement the session-wide countdown; at zero the whole session
    /// finishes. Must be called before [`Session::tick_question`] within the
    /// same tick so that global expiry wins over a per-question advance.
    pub fn tick_global(&mut self) -> Result<(), SessionError> {
        self.require_in_progress("tick_global")?;
        self.global_seconds_remaining = self.global_seconds_remaining.saturating_sub(1);
        if self.global_seconds_remaining == 0 {
            self.complete();
        }
        Ok(())
    }

    /// Decrement the per-question countdown; at zero the current question is
    /// recorded as unanswered and the session advances.
    pub fn tick_question(&mut self) -> Result<(), SessionError> {
        self.require_in_progress("tick_question")?;
        self.question_seconds_remaining = self.question_seconds_remaining.saturating_sub(1);
        if self.question_seconds_remaining == 0 {
            let question = &self.bank[self.current_index];
            self.answers.push(AnswerRecord {
                question_id: question.id,
                selected_option: None,
                is_correct: false,
            });
            self.advance();
        }
        Ok(())
    }

    /// End the session early. Both countdowns stop because the driver stops
    /// ticking anything that is not `InProgress`.
    pub fn finish(&mut self) -> Result<(), SessionError> {
        self.require_in_progress("finish")?;
        self.complete();
        Ok(())
    }

    /// Move to the next question, or finish if none remain. Shared by submit
    /// and per-question timeout.
    fn advance(&mut self) {
        if self.current_index + 1 < self.bank.len() {
            self.current_index += 1;
            self.pending_choice = None;
            self.question_seconds_remaining = self.bank[self.current_index].time_limit_seconds;
        } else {
            self.complete();
        }
    }

    fn complete(&mut self) {
        debug!(
            "session finished: score {}/{}",
            self.score,
            self.bank.len()
        );
        self.status = GameStatus::Finished;
    }

    fn require_in_progress(&self, action: &'static str) -> Result<(), SessionError> {
        if self.status == GameStatus::InProgress {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                action,
                status: self.status,
            })
        }
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn total_questions(&self) -> usize {
        self.bank.len()
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.bank.get(self.current_index)
    }

    pub fn pending_choice(&self) -> Option<usize> {
        self.pending_choice
    }

    pub fn global_seconds_remaining(&self) -> u32 {
        self.global_seconds_remaining
    }

    pub fn question_seconds_remaining(&self) -> u32 {
        self.question_seconds_remaining
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn answers(&self) -> &[AnswerRecord] {
        self.answers.as_slice()
    }

    pub fn bank(&self) -> &[Question] {
        self.bank.as_slice()
    }

    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    /// Build the read-only snapshot the presentation layer renders from.
    pub fn snapshot(&self) -> Snapshot {
        let question = match self.status {
            GameStatus::InProgress => self.current_question().map(|q| QuestionView {
                text: q.text.clone(),
                options: q.options.clone(),
                time_limit_seconds: q.time_limit_seconds,
            }),
            _ => None,
        };
        let review = if self.status == GameStatus::Finished {
            self.review()
        } else {
            Vec::new()
        };
        Snapshot {
            status: self.status,
            question,
            global_seconds_remaining: self.global_seconds_remaining,
            question_seconds_remaining: self.question_seconds_remaining,
            current_index: self.current_index,
            total_questions: self.bank.len(),
            score: self.score,
            pending_choice: self.pending_choice,
            review,
        }
    }

    /// Join answers back to their questions by id, in presentation order.
    /// Questions the session never reached (global timeout) appear with no
    /// answer.
    fn review(&self) -> Vec<ReviewEntry> {
        self.bank
            .iter()
            .map(|question| {
                let answer = self.answers.iter().find(|a| a.question_id == question.id);
                ReviewEntry {
                    question: question.clone(),
                    selected_option: answer.and_then(|a| a.selected_option),
                    is_correct: answer.is_some_and(|a| a.is_correct),
                }
            })
            .collect()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn question(id: u32, correct: usize, limit: u32) -> Question {
        Question {
            id,
            text: format!("question {}", id),
            options: vec!["a".into(), "b".into(), "c".into()],
            correct_answer: correct,
            time_limit_seconds: limit,
        }
    }

    fn bank(n: u32) -> Vec<Question> {
        (1..=n).map(|id| question(id, 1, 30)).collect()
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    fn started(bank_size: u32) -> Session {
        let mut session = Session::new();
        session.start(&bank(bank_size), &mut rng()).unwrap();
        session
    }

    #[test]
    fn start_samples_min_of_five_and_bank_size() {
        for n in [1u32, 3, 5, 12] {
            let session = started(n);
            assert_eq!(session.total_questions(), (n as usize).min(5));
            let mut ids: Vec<u32> = session.bank().iter().map(|q| q.id).collect();
            ids.sort_unstable();
            ids.dedup();
            assert_eq!(ids.len(), session.total_questions(), "duplicate ids for n={}", n);
        }
    }

    #[test]
    fn start_rejects_empty_bank() {
        let mut session = Session::new();
        assert_eq!(session.start(&[], &mut rng()), Err(SessionError::EmptyBank));
        assert_eq!(session.status(), GameStatus::NotStarted);
    }

    #[test]
    fn start_arms_both_countdowns() {
        let session = started(5);
        assert_eq!(session.status(), GameStatus::InProgress);
        assert_eq!(session.global_seconds_remaining(), DEFAULT_GLOBAL_SECONDS);
        assert_eq!(session.question_seconds_remaining(), 30);
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.score(), 0);
        assert!(session.answers().is_empty());
    }

    #[test]
    fn subset_is_a_permutation_of_bank_elements() {
        let pool = bank(10);
        let subset = select_random_subset(&pool, 5, &mut rng());
        assert_eq!(subset.len(), 5);
        for q in &subset {
            assert!(pool.iter().any(|p| p.id == q.id));
        }
    }

    #[test]
    fn subset_larger_than_bank_returns_everything() {
        let pool = bank(3);
        let subset = select_random_subset(&pool, 5, &mut rng());
        assert_eq!(subset.len(), 3);
    }

    #[test]
    fn actions_outside_in_progress_are_invalid_transitions() {
        let mut session = Session::new();
        assert!(matches!(
            session.submit(),
            Err(SessionError::InvalidTransition { action: "submit", .. })
        ));
        assert!(matches!(
            session.tick_global(),
            Err(SessionError::InvalidTransition { .. })
        ));
        assert!(matches!(
            session.select_option(0),
            Err(SessionError::InvalidTransition { .. })
        ));
        assert!(matches!(
            session.finish(),
            Err(SessionError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn select_overwrites_pending_choice() {
        let mut session = started(5);
        session.select_option(0).unwrap();
        session.select_option(2).unwrap();
        assert_eq!(session.pending_choice(), Some(2));
        assert!(session.answers().is_empty());
    }

    #[test]
    fn select_ignores_out_of_range_index() {
        let mut session = started(5);
        session.select_option(7).unwrap();
        assert_eq!(session.pending_choice(), None);
    }

    #[test]
    fn submit_without_pending_choice_is_a_no_op() {
        let mut session = started(5);
        session.submit().unwrap();
        assert_eq!(session.current_index(), 0);
        assert!(session.answers().is_empty());
    }

    #[test]
    fn submit_records_answer_and_advances() {
        let mut session = started(5);
        let first_id = session.current_question().unwrap().id;
        session.select_option(1).unwrap();
        session.submit().unwrap();
        assert_eq!(session.current_index(), 1);
        assert_eq!(session.pending_choice(), None);
        assert_eq!(session.question_seconds_remaining(), 30);
        assert_eq!(session.answers().len(), 1);
        let record = &session.answers()[0];
        assert_eq!(record.question_id, first_id);
        assert_eq!(record.selected_option, Some(1));
        assert!(record.is_correct);
        assert_eq!(session.score(), 1);
    }

    #[test]
    fn score_always_matches_correct_answer_count() {
        let mut session = started(5);
        let choices = [1usize, 0, 1, 2, 1];
        for choice in choices {
            session.select_option(choice).unwrap();
            session.submit().unwrap();
            let counted = session.answers().iter().filter(|a| a.is_correct).count();
            assert_eq!(session.score(), counted);
        }
        assert_eq!(session.status(), GameStatus::Finished);
        assert_eq!(session.score(), 3);
    }

    #[test]
    fn answering_all_correctly_finishes_with_full_score() {
        let mut session = started(5);
        for _ in 0..5 {
            let correct = session.current_question().unwrap().correct_answer;
            session.select_option(correct).unwrap();
            session.submit().unwrap();
        }
        assert_eq!(session.status(), GameStatus::Finished);
        assert_eq!(session.score(), 5);
        assert_eq!(session.answers().len(), 5);
        assert!(session.answers().iter().all(|a| a.is_correct));
    }

    #[test]
    fn question_timeout_records_unanswered_and_advances() {
        let pool = vec![question(1, 0, 2), question(2, 0, 2)];
        let mut session = Session::with_limits(2, 300);
        session.start(&pool, &mut rng()).unwrap();
        let first_id = session.current_question().unwrap().id;

        session.tick_question().unwrap();
        assert_eq!(session.question_seconds_remaining(), 1);
        assert!(session.answers().is_empty());

        session.tick_question().unwrap();
        assert_eq!(session.current_index(), 1);
        // The next question's clock is re-armed from its own limit.
        assert_eq!(session.question_seconds_remaining(), 2);
        assert_eq!(session.answers().len(), 1);
        assert_eq!(session.answers()[0].question_id, first_id);
        assert_eq!(session.answers()[0].selected_option, None);
        assert!(!session.answers()[0].is_correct);
    }

    #[test]
    fn idle_session_times_out_question_by_question() {
        // Two questions, user never touches anything; the session finishes
        // after the sum of the two time limits.
        let pool = vec![question(1, 0, 2), question(2, 0, 3)];
        let mut session = Session::with_limits(2, 300);
        session.start(&pool, &mut rng()).unwrap();

        for _ in 0..5 {
            assert_eq!(session.status(), GameStatus::InProgress);
            session.tick_global().unwrap();
            session.tick_question().unwrap();
        }
        assert_eq!(session.status(), GameStatus::Finished);
        assert_eq!(session.score(), 0);
        assert_eq!(session.answers().len(), 2);
        assert!(session.answers().iter().all(|a| a.selected_option.is_none()));
    }

    #[test]
    fn global_timeout_finishes_regardless_of_position() {
        let mut session = started(5);
        for _ in 0..300 {
            session.tick_global().unwrap();
        }
        assert_eq!(session.status(), GameStatus::Finished);
        assert_eq!(session.current_index(), 0);
    }

    #[test]
    fn global_zero_wins_over_question_zero() {
        // Both clocks hit zero on the same tick: the session must finish
        // without advancing or appending a timeout record.
        let mut session = Session::with_limits(5, 1);
        let pool = vec![question(1, 0, 1), question(2, 0, 1)];
        session.start(&pool, &mut rng()).unwrap();

        session.tick_global().unwrap();
        assert_eq!(session.status(), GameStatus::Finished);
        assert!(matches!(
            session.tick_question(),
            Err(SessionError::InvalidTransition { .. })
        ));
        assert_eq!(session.current_index(), 0);
        assert!(session.answers().is_empty());
    }

    #[test]
    fn locked_question_ignores_select_and_submit() {
        // A zero clock models the window between the per-question timeout
        // and the driver's next tick; a late click must not mutate anything.
        let mut pool = bank(2);
        for q in &mut pool {
            q.time_limit_seconds = 0;
        }
        let mut session = Session::with_limits(2, 300);
        session.start(&pool, &mut rng()).unwrap();
        assert_eq!(session.question_seconds_remaining(), 0);

        session.select_option(1).unwrap();
        session.submit().unwrap();
        assert_eq!(session.pending_choice(), None);
        assert!(session.answers().is_empty());
        assert_eq!(session.score(), 0);
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.status(), GameStatus::InProgress);
    }

    #[test]
    fn pending_choice_is_discarded_on_timeout() {
        let pool = vec![question(1, 0, 1), question(2, 0, 30)];
        let mut session = Session::with_limits(2, 300);
        session.start(&pool, &mut rng()).unwrap();

        // Select on the first question, then let its clock run out; the
        // pending choice must not leak into the timeout record.
        session.select_option(0).unwrap();
        while session.question_seconds_remaining() > 0
            && session.status() == GameStatus::InProgress
            && session.current_index() == 0
        {
            session.tick_question().unwrap();
        }
        assert_eq!(session.answers().len(), 1);
        assert_eq!(session.answers()[0].selected_option, None);
        assert!(!session.answers()[0].is_correct);
    }

    #[test]
    fn answers_never_outrun_position_while_in_progress() {
        let mut session = started(5);
        for _ in 0..3 {
            assert!(session.answers().len() <= session.current_index() + 1);
            session.select_option(0).unwrap();
            session.submit().unwrap();
        }
        assert!(session.answers().len() <= session.current_index() + 1);
    }

    #[test]
    fn restart_discards_previous_attempt() {
        let mut session = started(5);
        session.select_option(1).unwrap();
        session.submit().unwrap();
        session.finish().unwrap();
        assert_eq!(session.status(), GameStatus::Finished);

        let mut rng = rng();
        session.start(&bank(12), &mut rng).unwrap();
        assert_eq!(session.status(), GameStatus::InProgress);
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.score(), 0);
        assert!(session.answers().is_empty());
        assert_eq!(session.global_seconds_remaining(), DEFAULT_GLOBAL_SECONDS);
    }

    #[test]
    fn snapshot_reports_review_only_when_finished() {
        let mut session = started(2);
        let snap = session.snapshot();
        assert_eq!(snap.status, GameStatus::InProgress);
        assert!(snap.question.is_some());
        assert!(snap.review.is_empty());

        session.finish().unwrap();
        let snap = session.snapshot();
        assert_eq!(snap.status, GameStatus::Finished);
        assert!(snap.question.is_none());
        assert_eq!(snap.review.len(), 2);
        assert!(snap.review.iter().all(|e| e.selected_option.is_none()));
    }
}
