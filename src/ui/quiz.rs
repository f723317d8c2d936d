use ratatui::{
    prelude::*,
    widgets::{Paragraph, Wrap},
};

use crate::session::Snapshot;
use crate::ui::{format_time, ViewContext};

const OPTION_LABELS: [char; 4] = ['A', 'B', 'C', 'D'];

pub fn render(frame: &mut Frame, area: Rect, snapshot: &Snapshot, ctx: &ViewContext) {
    let chunks = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(4),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .margin(2)
    .split(area);

    render_header(frame, chunks[0], snapshot, ctx);

    let Some(question) = snapshot.question.as_ref() else {
        return;
    };
    let locked = snapshot.question_seconds_remaining == 0;

    render_question_text(frame, chunks[1], &question.text);
    render_options(
        frame,
        chunks[2],
        &question.options,
        snapshot.pending_choice,
        locked,
    );
    render_controls(frame, chunks[3], snapshot, locked);
}

fn render_header(frame: &mut Frame, area: Rect, snapshot: &Snapshot, ctx: &ViewContext) {
    let halves =
        Layout::horizontal([Constraint::Fill(1), Constraint::Length(8)]).split(area);

    let question_clock_color = if snapshot.question_seconds_remaining <= 5 {
        Color::Red
    } else {
        Color::DarkGray
    };
    let mut spans = vec![
        Span::styled(
            format!("total {}", format_time(snapshot.global_seconds_remaining)),
            Style::default().fg(Color::DarkGray),
        ),
        Span::raw("  ·  "),
        Span::styled(
            format!(
                "question {}",
                format_time(snapshot.question_seconds_remaining)
            ),
            Style::default().fg(question_clock_color),
        ),
    ];
    if ctx.muted {
        spans.push(Span::styled("  ·  muted", Style::default().fg(Color::DarkGray)));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), halves[0]);

    let progress = format!(
        "{}/{}",
        snapshot.current_index + 1,
        snapshot.total_questions
    );
    let widget = Paragraph::new(progress)
        .alignment(Alignment::Right)
        .fg(Color::DarkGray);
    frame.render_widget(widget, halves[1]);
}

fn render_question_text(frame: &mut Frame, area: Rect, text: &str) {
    let widget = Paragraph::new(text)
        .wrap(Wrap { trim: true })
        .fg(Color::White)
        .bold();
    frame.render_widget(widget, area);
}

fn render_options(
    frame: &mut Frame,
    area: Rect,
    options: &[String],
    pending: Option<usize>,
    locked: bool,
) {
    let mut lines: Vec<Line> = Vec::with_capacity(options.len() * 2);

    for (index, option) in options.iter().enumerate() {
        let is_pending = pending == Some(index);
        let style = if locked {
            Style::default().fg(Color::DarkGray)
        } else if is_pending {
            Style::default().fg(Color::Cyan).bold()
        } else {
            Style::default().fg(Color::Gray)
        };
        let marker = if is_pending { ">" } else { " " };

        lines.push(Line::from(vec![
            Span::styled(format!(" {} ", marker), style),
            Span::styled(format!("{}. ", OPTION_LABELS[index]), style),
            Span::styled(option.as_str(), style),
        ]));
        lines.push(Line::from(""));
    }

    frame.render_widget(Paragraph::new(lines), area);
}

fn render_controls(frame: &mut Frame, area: Rect, snapshot: &Snapshot, locked: bool) {
    let text = if locked {
        "time's up - waiting for next question".to_string()
    } else {
        let submit_label = if snapshot.current_index + 1 < snapshot.total_questions {
            "next"
        } else {
            "finish"
        };
        format!("j/k select  ·  enter {}  ·  m mute  ·  q quit", submit_label)
    };
    let widget = Paragraph::new(text)
        .alignment(Alignment::Center)
        .fg(Color::DarkGray);
    frame.render_widget(widget, area);
}
