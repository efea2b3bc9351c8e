use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Padding, Paragraph, Wrap},
};
use tokio::time::Instant;

use crate::session::{Feedback, QuizSession};

/// Questions per test, as served by the backend.
const QUESTIONS_PER_TEST: u32 = 10;

pub fn render(frame: &mut Frame, area: Rect, session: &QuizSession, now: Instant) {
    let Some(question) = session.current_question() else {
        let waiting = Paragraph::new("Waiting for question...")
            .alignment(Alignment::Center)
            .fg(Color::Yellow);
        frame.render_widget(waiting, area);
        return;
    };

    let chunks = Layout::vertical([
        Constraint::Length(1), // Progress
        Constraint::Length(1), // Feedback
        Constraint::Fill(1),
        Constraint::Length(3), // Word
        Constraint::Length(2), // Time and score
        Constraint::Length(3), // Input
        Constraint::Fill(1),
        Constraint::Length(1), // Controls
    ])
    .margin(1)
    .split(area);

    render_progress(frame, chunks[0], session.solved_count());
    if let Some(feedback) = session.feedback_at(now) {
        render_feedback(frame, chunks[1], feedback);
    }
    render_word(frame, chunks[3], &question.english);
    render_status(frame, chunks[4], session.remaining_time(), session.score());
    render_input(frame, chunks[5], session.answer_input(), session.is_submitting());
    render_controls(frame, chunks[7]);
}

fn render_progress(frame: &mut Frame, area: Rect, solved: u32) {
    let widget = Paragraph::new(format!("{solved}/{QUESTIONS_PER_TEST}"))
        .alignment(Alignment::Center)
        .fg(Color::DarkGray);
    frame.render_widget(widget, area);
}

fn render_feedback(frame: &mut Frame, area: Rect, feedback: &Feedback) {
    let color = if feedback.correct {
        Color::Green
    } else {
        Color::Red
    };
    let widget = Paragraph::new(feedback.text.as_str())
        .alignment(Alignment::Center)
        .style(Style::default().fg(color).bold());
    frame.render_widget(widget, area);
}

fn render_word(frame: &mut Frame, area: Rect, english: &str) {
    let widget = Paragraph::new(english)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .fg(Color::White)
        .bold();
    frame.render_widget(widget, area);
}

fn render_status(frame: &mut Frame, area: Rect, remaining_time: f64, score: f64) {
    let seconds = remaining_time.max(0.0).floor() as u64;
    let time_color = if seconds <= 5 {
        Color::Red
    } else {
        Color::Gray
    };

    let lines = vec![
        Line::from(Span::styled(format!("{seconds}s"), Style::default().fg(time_color))),
        Line::from(Span::styled(
            format!("{score:.0} pts"),
            Style::default().fg(Color::Cyan),
        )),
    ];
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), area);
}

fn render_input(frame: &mut Frame, area: Rect, input: &str, submitting: bool) {
    let border = if submitting {
        Color::DarkGray
    } else {
        Color::Cyan
    };
    let text = if input.is_empty() {
        Span::styled("Type the Korean meaning", Style::default().fg(Color::DarkGray))
    } else {
        Span::styled(input, Style::default().fg(Color::White))
    };

    let widget = Paragraph::new(Line::from(text))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border))
                .padding(Padding::horizontal(1)),
        );
    frame.render_widget(widget, area);
}

fn render_controls(frame: &mut Frame, area: Rect) {
    let widget = Paragraph::new("type your answer  ·  enter submit  ·  esc quit")
        .alignment(Alignment::Center)
        .fg(Color::DarkGray);
    frame.render_widget(widget, area);
}
