mod countdown;
mod ended;
mod playing;

use ratatui::{prelude::*, widgets::Block};
use tokio::time::Instant;

use crate::session::{Phase, QuizSession};

pub fn render(frame: &mut Frame, session: &QuizSession, scroll: usize, now: Instant) {
    let area = frame.area();
    frame.render_widget(Block::default().bg(Color::Reset), area);

    match session.phase() {
        Phase::Countdown => countdown::render(frame, area, session.countdown_remaining()),
        Phase::Playing => playing::render(frame, area, session, now),
        Phase::Ended(_) => ended::render(frame, area, session, scroll),
    }
}
