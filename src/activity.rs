// src/activity.rs
//
// Traffic indicator state for the poll loop.

/// Two-state traffic indicator. Reflects only the most recent poll tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ActivityMonitor {
    active: bool,
}

impl ActivityMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_poll_tick(&mut self, bytes_read: usize) {
        self.active = bytes_read > 0;
    }

    pub fn on_link_closed(&mut self) {
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}
