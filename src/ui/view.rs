// src/ui/view.rs
//
// Rendering of the monitor window. Pure function of session + view state;
// returns the screen regions that accept mouse clicks.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::session::{SerialSession, APP_NAME};

pub const CREDITS: &str = "Matteo Floria";

/// Scroll position of the scrollback.
///
/// `None` follows the newest line. Once scrolled, the window is pinned to an
/// absolute line index so new lines do not move it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ViewState {
    pub pinned_end: Option<usize>,
}

impl ViewState {
    pub fn scroll_up(&mut self, lines: usize, total: usize) {
        if total == 0 {
            return;
        }
        let end = self.pinned_end.unwrap_or(total).min(total);
        self.pinned_end = Some(end.saturating_sub(lines).max(1));
    }

    pub fn scroll_down(&mut self, lines: usize, total: usize) {
        self.pinned_end = match self.pinned_end {
            Some(end) if end + lines < total => Some(end + lines),
            _ => None,
        };
    }

    /// Exclusive end of the visible slice for a log of `total` lines
    pub fn end(&self, total: usize) -> usize {
        self.pinned_end.unwrap_or(total).min(total)
    }
}

/// Clickable regions from the last frame
#[derive(Debug, Default, Clone, Copy)]
pub struct HitMap {
    pub port: Rect,
    pub refresh: Rect,
    pub clear: Rect,
    pub baud: Rect,
    pub connect: Rect,
    pub credits: Rect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Port,
    Refresh,
    Clear,
    Baud,
    Connect,
    Credits,
}

impl HitMap {
    pub fn target_at(&self, column: u16, row: u16) -> Option<Target> {
        let pos = Position::new(column, row);
        [
            (self.port, Target::Port),
            (self.refresh, Target::Refresh),
            (self.clear, Target::Clear),
            (self.baud, Target::Baud),
            (self.connect, Target::Connect),
            (self.credits, Target::Credits),
        ]
        .into_iter()
        .find(|(rect, _)| rect.contains(pos))
        .map(|(_, target)| target)
    }
}

pub fn render(frame: &mut Frame, session: &SerialSession, view: &ViewState) -> HitMap {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Selectors and buttons
            Constraint::Length(1), // Device description
            Constraint::Min(3),    // Scrollback
            Constraint::Length(3), // Connect / Disconnect
            Constraint::Length(1), // Credits
        ])
        .split(frame.area());

    let bar = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(16),    // Port selector
            Constraint::Length(11), // Refresh
            Constraint::Length(9),  // Clear
            Constraint::Length(14), // Baud selector
            Constraint::Length(5),  // Indicator
        ])
        .split(chunks[0]);

    render_port_selector(frame, bar[0], session);
    render_button(frame, bar[1], "Refresh", Color::White);
    render_button(frame, bar[2], "Clear", Color::White);
    render_selector(frame, bar[3], " Baud Rate ", &session.baud().to_string());
    render_indicator(frame, bar[4], session.indicator());

    frame.render_widget(
        Paragraph::new(session.device_label()).style(Style::default().fg(Color::Gray)),
        chunks[1],
    );

    render_scrollback(frame, chunks[2], session, view);

    let connect_colour = if session.is_open() {
        Color::Red
    } else {
        Color::Green
    };
    render_button(frame, chunks[3], session.button_label(), connect_colour);

    frame.render_widget(
        Paragraph::new(CREDITS)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray)),
        chunks[4],
    );

    if session.about_visible() {
        render_about(frame);
    }

    HitMap {
        port: bar[0],
        refresh: bar[1],
        clear: bar[2],
        baud: bar[3],
        connect: chunks[3],
        credits: chunks[4],
    }
}

fn render_port_selector(frame: &mut Frame, area: Rect, session: &SerialSession) {
    let selected = session.selected_port().and_then(|i| session.ports().get(i));
    let (title, value) = match selected {
        Some(port) => (
            format!(" Port ({}) ", port.port_type.label()),
            format!("\u{25c0} {} \u{25b6}", port.system_name),
        ),
        None => (" Port ".to_string(), "(no ports)".to_string()),
    };
    render_selector(frame, area, &title, &value);
}

fn render_selector(frame: &mut Frame, area: Rect, title: &str, value: &str) {
    let paragraph = Paragraph::new(value.to_string())
        .block(Block::default().borders(Borders::ALL).title(title.to_string()))
        .style(Style::default().fg(Color::White));
    frame.render_widget(paragraph, area);
}

fn render_button(frame: &mut Frame, area: Rect, label: &str, colour: Color) {
    let paragraph = Paragraph::new(Span::styled(
        label.to_string(),
        Style::default().fg(colour).add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(paragraph, area);
}

fn render_indicator(frame: &mut Frame, area: Rect, on: bool) {
    let colour = if on { Color::Green } else { Color::Red };
    let paragraph = Paragraph::new(Span::styled("\u{25cf}", Style::default().fg(colour)))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(paragraph, area);
}

fn render_scrollback(frame: &mut Frame, area: Rect, session: &SerialSession, view: &ViewState) {
    let lines = session.scrollback().lines();
    let height = area.height.saturating_sub(2) as usize;
    let end = view.end(lines.len());
    let start = end.saturating_sub(height);

    let visible: Vec<Line> = lines[start..end]
        .iter()
        .map(|l| Line::from(l.as_str()))
        .collect();

    let below = lines.len() - end;
    let title = if below > 0 {
        format!(" Scrollback (-{}) ", below)
    } else {
        " Scrollback ".to_string()
    };

    frame.render_widget(
        Paragraph::new(visible).block(Block::default().borders(Borders::ALL).title(title)),
        area,
    );
}

fn about_text() -> Vec<Line<'static>> {
    vec![
        Line::from(Span::styled(
            APP_NAME,
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(format!("Version {}", env!("CARGO_PKG_VERSION"))),
        Line::from(format!("\u{a9} 2025 {}", CREDITS)),
        Line::from(""),
        Line::from("Licensed under GPL-3.0"),
        Line::from("https://www.gnu.org/licenses/gpl-3.0.en.html"),
        Line::from(""),
        Line::from("Powered by: Rust, ratatui, serialport"),
        Line::from(""),
        Line::from(Span::styled(
            "[ OK ]",
            Style::default().fg(Color::Yellow),
        )),
    ]
}

fn render_about(frame: &mut Frame) {
    let text = about_text();
    let area = centered(frame.area(), 52, text.len() as u16 + 2);
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(text)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title(" About ")),
        area,
    );
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}
