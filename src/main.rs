use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use mdquiz::{BgmConfig, Quiz, DEFAULT_GLOBAL_SECONDS, DEFAULT_SAMPLE_SIZE};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Question-bank file (.md or .json)
    #[arg(short, long)]
    questions: PathBuf,

    /// How many questions to sample per session
    #[arg(short = 'n', long, default_value_t = DEFAULT_SAMPLE_SIZE)]
    count: usize,

    /// Session-wide time budget in seconds
    #[arg(short, long, default_value_t = DEFAULT_GLOBAL_SECONDS)]
    time_limit: u32,

    /// JSON playlist config for background music
    #[arg(long)]
    bgm_config: Option<PathBuf>,

    /// Start with background music muted
    #[arg(long)]
    mute: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let mut quiz = match Quiz::from_path(&args.questions) {
        Ok(quiz) => quiz,
        Err(e) => {
            eprintln!("Failed to load {}: {}", args.questions.display(), e);
            return ExitCode::FAILURE;
        }
    };
    quiz.set_limits(args.count, args.time_limit);

    if let Some(path) = &args.bgm_config {
        match BgmConfig::load(path) {
            Ok(config) => quiz.set_bgm(config),
            Err(e) => {
                eprintln!("Failed to load BGM config {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        }
    }
    if args.mute {
        quiz.mute();
    }

    if let Err(e) = quiz.run() {
        eprintln!("Error running quiz: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
