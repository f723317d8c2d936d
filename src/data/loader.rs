use std::error::Error;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::Deserialize;

use crate::data::markdown::{
    parse_markdown_questions, BankParseError, DEFAULT_TIME_LIMIT_SECONDS, MAX_OPTIONS,
};
use crate::models::Question;

/// Error loading a question bank from disk.
#[derive(Debug)]
pub enum LoadError {
    Io { path: PathBuf, source: io::Error },
    Json(serde_json::Error),
    Bank(BankParseError),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io { path, source } => {
                write!(f, "failed to read {}: {}", path.display(), source)
            }
            LoadError::Json(e) => write!(f, "failed to parse question JSON: {}", e),
            LoadError::Bank(e) => write!(f, "invalid question bank: {}", e),
        }
    }
}

impl Error for LoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            LoadError::Io { source, .. } => Some(source),
            LoadError::Json(e) => Some(e),
            LoadError::Bank(e) => Some(e),
        }
    }
}

impl From<BankParseError> for LoadError {
    fn from(err: BankParseError) -> Self {
        LoadError::Bank(err)
    }
}

impl From<serde_json::Error> for LoadError {
    fn from(err: serde_json::Error) -> Self {
        LoadError::Json(err)
    }
}

/// Load a question bank, dispatching on the file extension: `.md` /
/// `.markdown` goes through the Markdown parser, anything else is treated
/// as JSON.
pub fn load_question_bank<P: AsRef<Path>>(path: P) -> Result<Vec<Question>, LoadError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let is_markdown = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("md") || ext.eq_ignore_ascii_case("markdown"));

    let questions = if is_markdown {
        parse_markdown_questions(&content)?
    } else {
        parse_json_questions(&content)?
    };

    debug!("loaded {} questions from {}", questions.len(), path.display());
    Ok(questions)
}

/// On-disk JSON shape, matching the bundled `questions.json` convention.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawQuestion {
    text: String,
    options: Vec<String>,
    correct_answer: usize,
    #[serde(default)]
    time_limit: u32,
}

/// Parse a JSON question array, applying the same defaults and structural
/// checks as the Markdown path. Ids are assigned sequentially from 1; any id
/// in the source is ignored.
pub fn parse_json_questions(content: &str) -> Result<Vec<Question>, LoadError> {
    let raw: Vec<RawQuestion> = serde_json::from_str(content)?;
    raw.into_iter()
        .enumerate()
        .map(|(index, raw)| normalize(raw, index + 1).map_err(LoadError::from))
        .collect()
}

fn normalize(raw: RawQuestion, position: usize) -> Result<Question, BankParseError> {
    if raw.text.trim().is_empty() {
        return Err(BankParseError::MissingPrompt { block: position });
    }
    if raw.options.is_empty() {
        return Err(BankParseError::NoOptions { block: position });
    }
    // The Markdown path caps options at the A-D markers by construction;
    // JSON must enforce the same bound or the option labels run out.
    if raw.options.len() > MAX_OPTIONS {
        return Err(BankParseError::TooManyOptions { block: position });
    }

    let correct_answer = if raw.correct_answer < raw.options.len() {
        raw.correct_answer
    } else {
        warn!(
            "question {}: correct answer {} out of range, defaulting to first option",
            position, raw.correct_answer
        );
        0
    };

    Ok(Question {
        id: position as u32,
        text: raw.text,
        options: raw.options,
        correct_answer,
        time_limit_seconds: if raw.time_limit > 0 {
            raw.time_limit
        } else {
            DEFAULT_TIME_LIMIT_SECONDS
        },
    })
}
