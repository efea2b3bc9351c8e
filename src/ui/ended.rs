use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Padding, Paragraph},
};

use crate::session::{QuizSession, SaveStatus};

const WORD_COLUMN_WIDTH: usize = 20;

pub fn render(frame: &mut Frame, area: Rect, session: &QuizSession, scroll: usize) {
    let chunks = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(7),
        Constraint::Fill(1),
        Constraint::Length(2),
    ])
    .margin(1)
    .split(area);

    render_summary(frame, chunks[1], session);
    render_wrong_answers(frame, chunks[2], session, scroll);
    render_controls(frame, chunks[3]);
}

fn render_summary(frame: &mut Frame, area: Rect, session: &QuizSession) {
    let reason = session.end_reason();
    let reason_color = match reason {
        Some(r) if r.is_failure() => Color::Red,
        _ => Color::DarkGray,
    };

    let mut content = vec![
        Line::from(Span::styled(
            "TEST OVER",
            Style::default().fg(Color::Cyan).bold(),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!("{:.0} pts", session.score()),
            Style::default().fg(Color::Magenta).bold(),
        )),
        Line::from(Span::styled(
            format!(
                "{} solved · {} wrong",
                session.solved_count(),
                session.wrong_answers().len()
            ),
            Style::default().fg(Color::Gray),
        )),
    ];

    if let Some(reason) = reason {
        content.push(Line::from(Span::styled(
            reason.to_string(),
            Style::default().fg(reason_color),
        )));
    }

    if let Some(line) = save_line(session.save_status()) {
        content.push(line);
    }

    let widget = Paragraph::new(content).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Color::DarkGray),
    );
    frame.render_widget(widget, area);
}

fn save_line(status: Option<&SaveStatus>) -> Option<Line<'static>> {
    let (text, color) = match status? {
        SaveStatus::Saving => ("Saving result...".to_string(), Color::Yellow),
        SaveStatus::Saved => ("Result saved".to_string(), Color::Green),
        SaveStatus::Failed(e) => (format!("Result not saved: {e}"), Color::Red),
    };
    Some(Line::from(Span::styled(text, Style::default().fg(color))))
}

fn render_wrong_answers(frame: &mut Frame, area: Rect, session: &QuizSession, scroll: usize) {
    let lines: Vec<Line> = if session.wrong_answers().is_empty() {
        vec![Line::from(Span::styled(
            "No wrong answers",
            Style::default().fg(Color::Green),
        ))]
    } else {
        session
            .wrong_answers()
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                Line::from(vec![
                    Span::styled(
                        format!("{:2}. ", index + 1),
                        Style::default().fg(Color::DarkGray),
                    ),
                    Span::styled(
                        format!("{:<width$}", entry.question, width = WORD_COLUMN_WIDTH),
                        Style::default().fg(Color::White),
                    ),
                    Span::styled(
                        format!("{} ", entry.user_answer),
                        Style::default().fg(Color::Red).crossed_out(),
                    ),
                    Span::styled(
                        entry.correct_answer.clone(),
                        Style::default().fg(Color::Green),
                    ),
                ])
            })
            .collect()
    };

    let widget = Paragraph::new(lines)
        .block(
            Block::default()
                .title(" Wrong answers ")
                .title_style(Style::default().fg(Color::Cyan))
                .padding(Padding::horizontal(1)),
        )
        .scroll((scroll as u16, 0));
    frame.render_widget(widget, area);
}

fn render_controls(frame: &mut Frame, area: Rect) {
    let widget = Paragraph::new("j/k scroll  ·  enter or q exit")
        .alignment(Alignment::Center)
        .fg(Color::DarkGray);
    frame.render_widget(widget, area);
}
