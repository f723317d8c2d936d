mod loader;
mod markdown;

pub use loader::{load_question_bank, parse_json_questions, LoadError};
pub use markdown::{
    parse_markdown_questions, BankParseError, DEFAULT_TIME_LIMIT_SECONDS, MAX_OPTIONS,
};
