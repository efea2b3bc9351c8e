use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};

pub fn render(frame: &mut Frame, area: Rect, remaining: u32) {
    let chunks = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(9),
        Constraint::Fill(1),
    ])
    .split(area);

    let content = vec![
        Line::from(""),
        Line::from(Span::styled(
            "GET READY",
            Style::default().fg(Color::Cyan).bold(),
        )),
        Line::from(""),
        Line::from(""),
        Line::from(Span::styled(
            remaining.to_string(),
            Style::default().fg(Color::White).bold(),
        )),
        Line::from(""),
        Line::from("esc to leave".fg(Color::DarkGray)),
    ];

    let widget = Paragraph::new(content).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Color::DarkGray),
    );

    frame.render_widget(widget, chunks[1]);
}
