//! # mdquiz
//!
//! A timed multiple-choice quiz for the terminal. Question banks come from
//! a Markdown document (`## ` blocks with `- 问题:` / `- 选项A..D:` /
//! `- 正确答案:` / `- 时间限制:` lines) or a JSON array; each session
//! samples a random subset and runs it under a session-wide countdown plus
//! a per-question countdown.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use mdquiz::{Quiz, QuizError};
//!
//! fn main() -> Result<(), QuizError> {
//!     let quiz = Quiz::from_path("questions.md")?;
//!     quiz.run()?;
//!     Ok(())
//! }
//! ```

mod audio;
mod data;
mod models;
mod session;
pub mod terminal;
mod ui;

use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use log::debug;
use rand::Rng;

pub use audio::{BgmConfig, BgmDirective, BgmPlayer};
pub use data::{
    load_question_bank, parse_json_questions, parse_markdown_questions, BankParseError, LoadError,
    DEFAULT_TIME_LIMIT_SECONDS, MAX_OPTIONS,
};
pub use models::{AnswerRecord, GameStatus, Question};
pub use session::{
    select_random_subset, QuestionView, ReviewEntry, Session, SessionError, Snapshot,
    DEFAULT_GLOBAL_SECONDS, DEFAULT_SAMPLE_SIZE,
};

/// Error type for quiz operations.
#[derive(Debug)]
pub enum QuizError {
    /// Error loading the question bank.
    Load(LoadError),
    /// The session engine rejected an action.
    Session(SessionError),
    /// IO error during quiz execution.
    Io(io::Error),
}

impl std::fmt::Display for QuizError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuizError::Load(e) => write!(f, "Failed to load questions: {}", e),
            QuizError::Session(e) => write!(f, "Session error: {}", e),
            QuizError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for QuizError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            QuizError::Load(e) => Some(e),
            QuizError::Session(e) => Some(e),
            QuizError::Io(e) => Some(e),
        }
    }
}

impl From<LoadError> for QuizError {
    fn from(err: LoadError) -> Self {
        QuizError::Load(err)
    }
}

impl From<SessionError> for QuizError {
    fn from(err: SessionError) -> Self {
        QuizError::Session(err)
    }
}

impl From<io::Error> for QuizError {
    fn from(err: io::Error) -> Self {
        QuizError::Io(err)
    }
}

/// The engine ticks once per second while a session is in progress.
const TICK_RATE: Duration = Duration::from_secs(1);

/// A quiz instance that can be run in the terminal.
///
/// Owns the full bank, the session engine and the background-music sibling.
/// The terminal loop is the only clock: it forwards key presses and
/// once-per-second ticks into the engine and redraws from engine snapshots.
pub struct Quiz {
    bank: Vec<Question>,
    session: Session,
    bgm: BgmPlayer,
    result_scroll: usize,
}

impl Quiz {
    /// Create a quiz over a pre-parsed bank. Fails with
    /// [`SessionError::EmptyBank`] so an unusable bank is reported at load
    /// time, before any session starts.
    pub fn new(bank: Vec<Question>) -> Result<Self, QuizError> {
        if bank.is_empty() {
            return Err(QuizError::Session(SessionError::EmptyBank));
        }
        Ok(Self {
            bank,
            session: Session::new(),
            bgm: BgmPlayer::new(BgmConfig::default()),
            result_scroll: 0,
        })
    }

    /// Load a quiz from a Markdown (`.md`) or JSON question-bank file.
    pub fn from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self, QuizError> {
        Self::new(load_question_bank(path)?)
    }

    /// Override the sample size and the session-wide time budget. Only
    /// meaningful before the first session starts.
    pub fn set_limits(&mut self, sample_size: usize, global_seconds: u32) {
        self.session = Session::with_limits(sample_size, global_seconds);
    }

    pub fn set_bgm(&mut self, config: BgmConfig) {
        self.bgm = BgmPlayer::new(config);
    }

    pub fn mute(&mut self) {
        self.bgm.set_muted(true);
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Run the quiz in the terminal. Takes over the screen and returns when
    /// the user quits.
    pub fn run(mut self) -> Result<(), QuizError> {
        let mut term = terminal::init()?;
        let result = run_event_loop(&mut term, &mut self);
        terminal::restore()?;
        result
    }
}

fn run_event_loop(terminal: &mut terminal::QuizTerminal, quiz: &mut Quiz) -> Result<(), QuizError> {
    let mut rng = rand::rng();
    let mut last_tick = Instant::now();

    loop {
        let snapshot = quiz.session.snapshot();
        let ctx = ui::ViewContext {
            planned_questions: quiz.session.sample_size().min(quiz.bank.len()),
            muted: quiz.bgm.is_muted(),
            result_scroll: quiz.result_scroll,
        };
        terminal.draw(|frame| ui::render(frame, &snapshot, &ctx))?;

        // Wait for input, but never past the next tick deadline.
        let timeout = TICK_RATE.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && handle_input(quiz, key.code, &mut rng)? {
                    break;
                }
            }
        }

        if last_tick.elapsed() >= TICK_RATE {
            last_tick = Instant::now();
            tick(quiz, &mut rng)?;
        }
    }

    Ok(())
}

/// One wall-clock second: global countdown first, then the per-question
/// countdown only if the session survived it. Global expiry must win when
/// both clocks hit zero on the same tick.
fn tick<R: Rng>(quiz: &mut Quiz, rng: &mut R) -> Result<(), QuizError> {
    if quiz.session.status() != GameStatus::InProgress {
        return Ok(());
    }
    quiz.session.tick_global()?;
    if quiz.session.status() == GameStatus::InProgress {
        quiz.session.tick_question()?;
    }
    if quiz.session.status() == GameStatus::Finished {
        apply_bgm(quiz.bgm.on_status(GameStatus::Finished, rng));
    }
    Ok(())
}

/// Playback is delegated to the host environment; the core only records
/// what the sibling player decided.
fn apply_bgm(directive: Option<BgmDirective>) {
    if let Some(directive) = directive {
        debug!("bgm directive: {:?}", directive);
    }
}

/// Returns true if the app should exit.
fn handle_input<R: Rng>(quiz: &mut Quiz, key: KeyCode, rng: &mut R) -> Result<bool, QuizError> {
    match quiz.session.status() {
        GameStatus::NotStarted => handle_welcome_input(quiz, key, rng),
        GameStatus::InProgress => handle_quiz_input(quiz, key, rng),
        GameStatus::Finished => handle_result_input(quiz, key, rng),
    }
}

fn handle_welcome_input<R: Rng>(
    quiz: &mut Quiz,
    key: KeyCode,
    rng: &mut R,
) -> Result<bool, QuizError> {
    match key {
        KeyCode::Enter => {
            start_session(quiz, rng)?;
            Ok(false)
        }
        KeyCode::Char('m') | KeyCode::Char('M') => {
            quiz.bgm.toggle_muted();
            Ok(false)
        }
        KeyCode::Char('q') | KeyCode::Char('Q') => Ok(true),
        _ => Ok(false),
    }
}

fn handle_quiz_input<R: Rng>(
    quiz: &mut Quiz,
    key: KeyCode,
    rng: &mut R,
) -> Result<bool, QuizError> {
    match key {
        KeyCode::Up | KeyCode::Char('k') => {
            move_selection(quiz, false)?;
            Ok(false)
        }
        KeyCode::Down | KeyCode::Char('j') => {
            move_selection(quiz, true)?;
            Ok(false)
        }
        KeyCode::Enter | KeyCode::Char(' ') => {
            quiz.session.submit()?;
            if quiz.session.status() == GameStatus::Finished {
                apply_bgm(quiz.bgm.on_status(GameStatus::Finished, rng));
            }
            Ok(false)
        }
        KeyCode::Char('m') | KeyCode::Char('M') => {
            quiz.bgm.toggle_muted();
            Ok(false)
        }
        KeyCode::Char('q') | KeyCode::Char('Q') => Ok(true),
        _ => Ok(false),
    }
}

fn handle_result_input<R: Rng>(
    quiz: &mut Quiz,
    key: KeyCode,
    rng: &mut R,
) -> Result<bool, QuizError> {
    match key {
        KeyCode::Down | KeyCode::Char('j') => {
            let max = quiz.session.snapshot().review.len().saturating_mul(3);
            quiz.result_scroll = (quiz.result_scroll + 1).min(max);
            Ok(false)
        }
        KeyCode::Up | KeyCode::Char('k') => {
            quiz.result_scroll = quiz.result_scroll.saturating_sub(1);
            Ok(false)
        }
        KeyCode::Char('r') | KeyCode::Char('R') => {
            start_session(quiz, rng)?;
            Ok(false)
        }
        KeyCode::Char('q') | KeyCode::Char('Q') => Ok(true),
        _ => Ok(false),
    }
}

/// Start (or restart) a session: a fresh sample of the bank, both countdowns
/// re-armed, and the BGM sibling notified.
fn start_session<R: Rng>(quiz: &mut Quiz, rng: &mut R) -> Result<(), QuizError> {
    quiz.session.start(&quiz.bank, rng)?;
    quiz.result_scroll = 0;
    apply_bgm(quiz.bgm.on_status(GameStatus::InProgress, rng));
    Ok(())
}

/// Move the pending choice up or down the option list, wrapping around.
/// Selection goes through the engine so the per-question lock applies.
fn move_selection(quiz: &mut Quiz, forward: bool) -> Result<(), QuizError> {
    let Some(question) = quiz.session.current_question() else {
        return Ok(());
    };
    let len = question.options.len();
    let next = match quiz.session.pending_choice() {
        Some(i) if forward => (i + 1) % len,
        Some(i) => (i + len - 1) % len,
        None if forward => 0,
        None => len - 1,
    };
    quiz.session.select_option(next)?;
    Ok(())
}
