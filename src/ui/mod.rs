mod quiz;
mod result;
mod welcome;

use ratatui::{prelude::*, widgets::Block};

use crate::models::GameStatus;
use crate::session::Snapshot;

/// Presentation-only state that the engine snapshot deliberately does not
/// carry: the planned sample size for the welcome screen, the audio mute
/// flag, and the review scroll offset.
pub struct ViewContext {
    pub planned_questions: usize,
    pub muted: bool,
    pub result_scroll: usize,
}

pub fn render(frame: &mut Frame, snapshot: &Snapshot, ctx: &ViewContext) {
    let area = frame.area();
    frame.render_widget(Block::default().bg(Color::Reset), area);

    match snapshot.status {
        GameStatus::NotStarted => welcome::render(frame, area, snapshot, ctx),
        GameStatus::InProgress => quiz::render(frame, area, snapshot, ctx),
        GameStatus::Finished => result::render(frame, area, snapshot, ctx),
    }
}

/// `mm:ss` display for integer seconds.
fn format_time(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
