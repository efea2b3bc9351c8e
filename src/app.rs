//! Interactive quiz screen: renders the shared session and feeds key presses
//! to the controller while it runs in the background.

use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tokio::time::Instant;
use tracing::debug;

use crate::error::Error;
use crate::session::{Phase, QuizSession, SessionController, SessionSummary};
use crate::terminal::TerminalGuard;
use crate::ui;

const INPUT_POLL: Duration = Duration::from_millis(50);

/// What a key press asks the event loop to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Continue,
    Submit,
    /// Leave a running session.
    Quit,
    /// Close the end screen.
    Exit,
}

/// Run one quiz session in the terminal until the user closes the end
/// screen.
pub async fn play(controller: SessionController) -> Result<SessionSummary, Error> {
    let mut terminal = TerminalGuard::enter()?;

    let driver = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.run().await })
    };

    let result = run_event_loop(&mut terminal, &controller).await;
    drop(terminal);

    if result.is_err() {
        controller.quit().await;
    }
    let summary = driver.await?;
    result?;
    Ok(summary)
}

async fn run_event_loop(
    terminal: &mut TerminalGuard,
    controller: &SessionController,
) -> Result<(), Error> {
    let session = controller.session();
    let mut scroll = 0usize;

    loop {
        {
            let session = session.lock().await;
            let now = Instant::now();
            terminal.draw(|frame| ui::render(frame, &session, scroll, now))?;
        }

        if !event::poll(INPUT_POLL)? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        let input = {
            let mut session = session.lock().await;
            handle_input(&mut session, key, &mut scroll)
        };

        match input {
            Input::Continue => {}
            Input::Submit => {
                let controller = controller.clone();
                tokio::spawn(async move { controller.submit().await });
            }
            Input::Quit => {
                debug!("user left the session");
                controller.quit().await;
            }
            Input::Exit => break,
        }
    }

    Ok(())
}

/// Apply a key press to the session and report what else needs doing.
pub fn handle_input(session: &mut QuizSession, key: KeyEvent, scroll: &mut usize) -> Input {
    let ctrl_c =
        key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL);

    match session.phase() {
        Phase::Countdown => match key.code {
            _ if ctrl_c => Input::Quit,
            KeyCode::Esc => Input::Quit,
            _ => Input::Continue,
        },
        Phase::Playing => match key.code {
            _ if ctrl_c => Input::Quit,
            KeyCode::Esc => Input::Quit,
            KeyCode::Enter => Input::Submit,
            KeyCode::Backspace => {
                session.input_pop();
                Input::Continue
            }
            KeyCode::Char(c) => {
                session.input_push(c);
                Input::Continue
            }
            _ => Input::Continue,
        },
        Phase::Ended(_) => match key.code {
            _ if ctrl_c => Input::Exit,
            KeyCode::Down | KeyCode::Char('j') => {
                let max_scroll = session.wrong_answers().len().saturating_sub(1);
                *scroll = (*scroll + 1).min(max_scroll);
                Input::Continue
            }
            KeyCode::Up | KeyCode::Char('k') => {
                *scroll = scroll.saturating_sub(1);
                Input::Continue
            }
            KeyCode::Enter | KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => {
                Input::Exit
            }
            _ => Input::Continue,
        },
    }
}
