//! Parser for the Markdown question-bank convention.
//!
//! A bank document is a sequence of `## ` blocks, each carrying `- 问题:`
//! (prompt), `- 选项A:` through `- 选项D:` (options), `- 正确答案:` (a
//! single letter) and `- 时间限制:` (seconds) lines. Anything before the
//! first heading is ignored.

use std::error::Error;
use std::fmt;

use log::warn;

use crate::models::Question;

/// Fallback per-question countdown when a block has no usable `- 时间限制:`.
pub const DEFAULT_TIME_LIMIT_SECONDS: u32 = 30;

/// The format labels options A through D; nothing can address a fifth one.
pub const MAX_OPTIONS: usize = 4;

const PROMPT_MARKER: &str = "- 问题:";
const OPTION_MARKERS: [&str; 4] = ["- 选项A:", "- 选项B:", "- 选项C:", "- 选项D:"];
const ANSWER_MARKER: &str = "- 正确答案:";
const TIME_LIMIT_MARKER: &str = "- 时间限制:";

/// A question block that cannot yield a minimally usable question.
///
/// Missing answer letters and time limits are filled with documented
/// defaults instead; only structural problems are errors. `block` is the
/// 1-based position of the offending `## ` block in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BankParseError {
    /// The block has no `- 问题:` line (or an empty one).
    MissingPrompt { block: usize },
    /// The block has none of `- 选项A:` through `- 选项D:`.
    NoOptions { block: usize },
    /// More options than the A-D labels can address. Only reachable through
    /// the JSON path; Markdown blocks carry at most four option markers.
    TooManyOptions { block: usize },
}

impl fmt::Display for BankParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BankParseError::MissingPrompt { block } => {
                write!(f, "question block {} has no prompt text", block)
            }
            BankParseError::NoOptions { block } => {
                write!(f, "question block {} has no options", block)
            }
            BankParseError::TooManyOptions { block } => {
                write!(f, "question block {} has more than four options", block)
            }
        }
    }
}

impl Error for BankParseError {}

/// Parse a Markdown question-bank document into questions, in document
/// order, with ids assigned sequentially from 1 regardless of anything the
/// source text says.
pub fn parse_markdown_questions(content: &str) -> Result<Vec<Question>, BankParseError> {
    split_blocks(content)
        .iter()
        .enumerate()
        .map(|(index, block)| parse_block(block, index + 1))
        .collect()
}

/// Split the document into `## ` blocks, dropping leading content.
fn split_blocks(content: &str) -> Vec<Vec<&str>> {
    let mut blocks: Vec<Vec<&str>> = Vec::new();
    let mut current: Option<Vec<&str>> = None;

    for line in content.lines() {
        if line.starts_with("## ") {
            if let Some(block) = current.take() {
                blocks.push(block);
            }
            current = Some(Vec::new());
        } else if let Some(block) = current.as_mut() {
            block.push(line);
        }
    }
    if let Some(block) = current {
        blocks.push(block);
    }
    blocks
}

fn parse_block(lines: &[&str], block: usize) -> Result<Question, BankParseError> {
    let mut text: Option<String> = None;
    let mut raw_options: [Option<String>; 4] = Default::default();
    let mut answer_letter: Option<String> = None;
    let mut time_limit: Option<u32> = None;

    for line in lines {
        if let Some(rest) = line.strip_prefix(PROMPT_MARKER) {
            text = Some(rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix(ANSWER_MARKER) {
            answer_letter = Some(rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix(TIME_LIMIT_MARKER) {
            // Zero and garbage both fall back to the default.
            time_limit = rest.trim().parse::<u32>().ok().filter(|secs| *secs > 0);
        } else {
            for (slot, marker) in OPTION_MARKERS.iter().enumerate() {
                if let Some(rest) = line.strip_prefix(marker) {
                    raw_options[slot] = Some(rest.trim().to_string());
                    break;
                }
            }
        }
    }

    let text = text
        .filter(|t| !t.is_empty())
        .ok_or(BankParseError::MissingPrompt { block })?;

    // Compact whichever of A..D were present, preserving A->D order. A block
    // with only A and C yields a 2-option question whose second slot holds
    // what the source labeled C; the index is authoritative downstream.
    let options: Vec<String> = raw_options.into_iter().flatten().collect();
    if options.is_empty() {
        return Err(BankParseError::NoOptions { block });
    }

    let correct_answer = match answer_letter.as_deref() {
        Some("A") => 0,
        Some("B") => 1,
        Some("C") => 2,
        Some("D") => 3,
        other => {
            warn!(
                "block {}: unrecognized answer letter {:?}, defaulting to first option",
                block, other
            );
            0
        }
    };
    // An answer letter pointing past the compacted options is as unusable
    // as an unrecognized one; fail closed to the first option.
    let correct_answer = if correct_answer < options.len() {
        correct_answer
    } else {
        warn!(
            "block {}: answer letter points past the {} available options, defaulting to first",
            block,
            options.len()
        );
        0
    };

    Ok(Question {
        id: block as u32,
        text,
        options,
        correct_answer,
        time_limit_seconds: time_limit.unwrap_or(DEFAULT_TIME_LIMIT_SECONDS),
    })
}
