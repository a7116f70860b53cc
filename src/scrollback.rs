// src/scrollback.rs
//
// In-memory history of decoded lines shown in the monitor.

/// Append-only history of decoded lines. Only `clear` removes anything.
#[derive(Debug, Default, Clone)]
pub struct ScrollbackLog {
    lines: Vec<String>,
}

impl ScrollbackLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
