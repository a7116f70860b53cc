// src/ui/mod.rs
//
// Terminal front end for the monitor.
// One cooperative loop multiplexes terminal input with the session's poll
// and watchdog timers. Nothing here runs in parallel.

pub mod view;

use std::io::{self, Stdout};

use anyhow::Context;
use crossterm::{
    event::{
        DisableMouseCapture, EnableMouseCapture, Event, EventStream, KeyCode, KeyEvent,
        KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen, SetTitle,
    },
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::logging;
use crate::session::{SerialSession, UiEvent};
use view::{HitMap, Target, ViewState};

const PAGE: usize = 10;

/// What a key press or click asks the shell to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Dispatch(UiEvent),
    ScrollUp(usize),
    ScrollDown(usize),
    Quit,
}

/// Map a key press to a command. Any key dismisses the about panel.
pub fn map_key(key: KeyEvent, session: &SerialSession) -> Option<Command> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    if session.about_visible() {
        return Some(Command::Dispatch(UiEvent::HideAbout));
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Command::Quit);
    }

    let command = match key.code {
        KeyCode::Char('q') | KeyCode::Esc => Command::Quit,
        KeyCode::Enter => Command::Dispatch(session.toggle_event()),
        KeyCode::Char('r') => Command::Dispatch(UiEvent::Refresh),
        KeyCode::Char('c') => Command::Dispatch(UiEvent::Clear),
        KeyCode::Char('a') => Command::Dispatch(UiEvent::ShowAbout),
        KeyCode::Right => return next_port(session, 1).map(Command::Dispatch),
        KeyCode::Left => return next_port(session, -1).map(Command::Dispatch),
        KeyCode::Up => Command::Dispatch(UiEvent::BaudChanged(session.baud().next())),
        KeyCode::Down => Command::Dispatch(UiEvent::BaudChanged(session.baud().prev())),
        KeyCode::PageUp => Command::ScrollUp(PAGE),
        KeyCode::PageDown => Command::ScrollDown(PAGE),
        _ => return None,
    };
    Some(command)
}

/// Map a left click to a command using the regions of the last frame.
pub fn map_click(mouse: MouseEvent, hits: &HitMap, session: &SerialSession) -> Option<Command> {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {}
        MouseEventKind::ScrollUp => return Some(Command::ScrollUp(1)),
        MouseEventKind::ScrollDown => return Some(Command::ScrollDown(1)),
        _ => return None,
    }
    if session.about_visible() {
        return Some(Command::Dispatch(UiEvent::HideAbout));
    }

    let event = match hits.target_at(mouse.column, mouse.row)? {
        Target::Port => return next_port(session, 1).map(Command::Dispatch),
        Target::Refresh => UiEvent::Refresh,
        Target::Clear => UiEvent::Clear,
        Target::Baud => UiEvent::BaudChanged(session.baud().next()),
        Target::Connect => session.toggle_event(),
        Target::Credits => UiEvent::ShowAbout,
    };
    Some(Command::Dispatch(event))
}

fn next_port(session: &SerialSession, step: isize) -> Option<UiEvent> {
    let count = session.ports().len() as isize;
    if count == 0 {
        return None;
    }
    let current = session.selected_port().unwrap_or(0) as isize;
    let next = (current + step).rem_euclid(count) as usize;
    Some(UiEvent::PortChanged(next))
}

/// Owns the terminal while the UI runs; restores it on drop.
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalGuard {
    fn new() -> anyhow::Result<Self> {
        enable_raw_mode().context("Failed to enable raw mode")?;
        logging::set_stderr_enabled(false);
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
            .context("Failed to enter alternate screen")?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))
            .context("Failed to create terminal")?;
        Ok(Self { terminal })
    }

    fn set_title(&mut self, title: &str) -> io::Result<()> {
        execute!(self.terminal.backend_mut(), SetTitle(title))
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        // Best effort cleanup
        let _ = disable_raw_mode();
        let _ = execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        );
        let _ = self.terminal.show_cursor();
        logging::set_stderr_enabled(true);
    }
}

enum Step {
    Input(Option<io::Result<Event>>),
    Timer(UiEvent),
}

/// Run the monitor until the user quits. Expects `session.startup()` to have run.
pub async fn run(session: &mut SerialSession) -> anyhow::Result<()> {
    let mut guard = TerminalGuard::new()?;
    let mut events = EventStream::new();
    let mut view = ViewState::default();
    let mut hits = HitMap::default();
    let mut title = String::new();

    loop {
        let current_title = session.window_title();
        if current_title != title {
            guard.set_title(&current_title)?;
            title = current_title;
        }
        guard
            .terminal
            .draw(|frame| hits = view::render(frame, session, &view))
            .context("Failed to draw frame")?;

        let step = tokio::select! {
            input = events.next() => Step::Input(input),
            tick = session.next_timer() => Step::Timer(tick),
        };

        let command = match step {
            Step::Timer(tick) => Some(Command::Dispatch(tick)),
            Step::Input(None) => Some(Command::Quit),
            Step::Input(Some(Err(e))) => {
                return Err(e).context("Failed to read terminal input");
            }
            Step::Input(Some(Ok(Event::Key(key)))) => map_key(key, session),
            Step::Input(Some(Ok(Event::Mouse(mouse)))) => map_click(mouse, &hits, session),
            Step::Input(Some(Ok(_))) => None,
        };

        match command {
            Some(Command::Dispatch(event)) => {
                let before = session.scrollback().len();
                session.dispatch(event);
                if session.scrollback().len() < before {
                    view = ViewState::default();
                }
            }
            Some(Command::ScrollUp(lines)) => view.scroll_up(lines, session.scrollback().len()),
            Some(Command::ScrollDown(lines)) => {
                view.scroll_down(lines, session.scrollback().len())
            }
            Some(Command::Quit) => break,
            None => {}
        }
    }

    Ok(())
}
