// src/session.rs
//
// Application context for the monitor. Owns the port directory client, the
// serial link, the activity indicator and the scrollback, and applies UI
// events to them. Nothing here knows how the state is drawn.

use crate::activity::ActivityMonitor;
use crate::io::serial::{
    BaudRate, ConnectionConfig, LineDecoder, OpenError, PortDescriptor, PortDirectory, SerialLink,
};
use crate::scheduler::RepeatingTask;
use crate::scrollback::ScrollbackLog;
use crate::settings::Settings;

pub const APP_NAME: &str = "ByteMe Serial Monitor";
pub const DEVICE_LABEL: &str = "Device Name:";

/// Discrete UI events. Timer ticks arrive through the same table as user actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiEvent {
    Connect,
    Disconnect,
    Refresh,
    Clear,
    PortChanged(usize),
    BaudChanged(BaudRate),
    PollTick,
    WatchdogTick,
    ShowAbout,
    HideAbout,
}

pub struct SerialSession {
    directory: PortDirectory,
    link: SerialLink,
    activity: ActivityMonitor,
    scrollback: ScrollbackLog,
    decoder: LineDecoder,
    reassemble_partial_lines: bool,

    ports: Vec<PortDescriptor>,
    selected_port: Option<usize>,
    baud: BaudRate,
    device_description: Option<String>,
    about_visible: bool,

    poll_task: RepeatingTask,
    watchdog_task: RepeatingTask,
}

impl SerialSession {
    pub fn new(directory: PortDirectory, link: SerialLink, settings: &Settings) -> Self {
        Self {
            directory,
            link,
            activity: ActivityMonitor::new(),
            scrollback: ScrollbackLog::new(),
            decoder: LineDecoder::new(settings.reassemble_partial_lines),
            reassemble_partial_lines: settings.reassemble_partial_lines,
            ports: Vec::new(),
            selected_port: None,
            baud: settings.baud(),
            device_description: None,
            about_visible: false,
            poll_task: RepeatingTask::new("poll", settings.poll_interval()),
            watchdog_task: RepeatingTask::new("watchdog", settings.watchdog_interval()),
        }
    }

    /// Populate the port selector and start the watchdog. Needs a tokio runtime.
    pub fn startup(&mut self) {
        self.ports = self.directory.list_ports();
        self.selected_port = if self.ports.is_empty() { None } else { Some(0) };
        self.resolve_description();
        self.watchdog_task.start();
        tlog!("[session] Started with {} port(s)", self.ports.len());
    }

    /// Tear down any open link and stop both timers.
    pub fn shutdown(&mut self) {
        if self.link.is_open() {
            self.disconnect();
        }
        self.watchdog_task.stop();
    }

    pub fn dispatch(&mut self, event: UiEvent) {
        match event {
            UiEvent::Connect => self.connect(),
            UiEvent::Disconnect => {
                if self.link.is_open() {
                    self.disconnect();
                }
            }
            UiEvent::Refresh => self.refresh(),
            UiEvent::Clear => self.scrollback.clear(),
            UiEvent::PortChanged(index) => {
                if index < self.ports.len() {
                    self.selected_port = Some(index);
                    self.resolve_description();
                }
            }
            UiEvent::BaudChanged(baud) => self.baud = baud,
            UiEvent::PollTick => self.poll(),
            UiEvent::WatchdogTick => self.watchdog(),
            UiEvent::ShowAbout => self.about_visible = true,
            UiEvent::HideAbout => self.about_visible = false,
        }
    }

    /// The event the connect/disconnect button currently stands for
    pub fn toggle_event(&self) -> UiEvent {
        if self.link.is_open() {
            UiEvent::Disconnect
        } else {
            UiEvent::Connect
        }
    }

    /// Wait for whichever timer fires next.
    pub async fn next_timer(&mut self) -> UiEvent {
        tokio::select! {
            biased;
            _ = self.watchdog_task.tick() => UiEvent::WatchdogTick,
            _ = self.poll_task.tick() => UiEvent::PollTick,
        }
    }

    // ------------------------------------------------------------------------
    // Orchestration rules
    // ------------------------------------------------------------------------

    fn connect(&mut self) {
        if self.link.is_open() {
            return;
        }

        let port = self.selected_port_name().unwrap_or_default().to_string();
        let result = if port.is_empty() {
            Err(OpenError::NoPortSelected)
        } else {
            self.link.open(ConnectionConfig::new(port, self.baud))
        };

        match result {
            Ok(()) => {
                self.decoder = LineDecoder::new(self.reassemble_partial_lines);
                self.poll_task.start();
            }
            Err(e) => {
                tlog!("[session] {}", e);
                self.scrollback.append(e.to_string());
            }
        }
    }

    /// Stop polling before the handle is released, then drop the indicator.
    fn disconnect(&mut self) {
        self.poll_task.stop();
        if let Some(line) = self.decoder.flush() {
            self.scrollback.append(line);
        }
        self.link.close();
        self.activity.on_link_closed();
    }

    fn refresh(&mut self) {
        let previous = self.selected_port_name().map(str::to_string);
        self.ports = self.directory.list_ports();
        self.selected_port = previous
            .and_then(|name| self.ports.iter().position(|p| p.system_name == name))
            .or(if self.ports.is_empty() { None } else { Some(0) });
        self.resolve_description();
    }

    fn poll(&mut self) {
        if !self.link.is_open() {
            return;
        }
        let bytes = self.link.read_available();
        self.activity.on_poll_tick(bytes.len());
        if bytes.is_empty() {
            return;
        }
        for line in self.decoder.feed(&bytes) {
            self.scrollback.append(line);
        }
    }

    fn watchdog(&mut self) {
        let Some(port) = self.link.port_name().map(str::to_string) else {
            return;
        };
        if self.directory.contains(&port) {
            return;
        }

        tlog!("[session] {} vanished, forcing disconnect", port);
        self.disconnect();
        self.device_description = None;
        self.scrollback
            .append(format!("Disconnected: {} no longer available", port));
    }

    fn resolve_description(&mut self) {
        self.device_description = self
            .selected_port_name()
            .and_then(|name| self.directory.describe(name));
    }

    // ------------------------------------------------------------------------
    // View state
    // ------------------------------------------------------------------------

    pub fn ports(&self) -> &[PortDescriptor] {
        &self.ports
    }

    pub fn selected_port(&self) -> Option<usize> {
        self.selected_port
    }

    pub fn selected_port_name(&self) -> Option<&str> {
        self.selected_port
            .and_then(|i| self.ports.get(i))
            .map(|p| p.system_name.as_str())
    }

    pub fn baud(&self) -> BaudRate {
        self.baud
    }

    pub fn is_open(&self) -> bool {
        self.link.is_open()
    }

    pub fn connected_port(&self) -> Option<&str> {
        self.link.port_name()
    }

    pub fn indicator(&self) -> bool {
        self.activity.is_active()
    }

    pub fn scrollback(&self) -> &ScrollbackLog {
        &self.scrollback
    }

    pub fn is_polling(&self) -> bool {
        self.poll_task.is_running()
    }

    pub fn button_label(&self) -> &'static str {
        if self.link.is_open() {
            "Disconnect"
        } else {
            "Connect"
        }
    }

    pub fn device_label(&self) -> String {
        match &self.device_description {
            Some(desc) => format!("{} {}", DEVICE_LABEL, desc),
            None => DEVICE_LABEL.to_string(),
        }
    }

    pub fn about_visible(&self) -> bool {
        self.about_visible
    }

    pub fn window_title(&self) -> String {
        match self.link.port_name() {
            Some(port) => format!("{} \u{25cf} {}", APP_NAME, port),
            None => APP_NAME.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::serial::testing::FakeBus;
    use std::time::Duration;

    fn session_with(bus: &FakeBus, settings: &Settings) -> SerialSession {
        let mut session = SerialSession::new(
            PortDirectory::new(Box::new(bus.clone())),
            SerialLink::new(Box::new(bus.clone())),
            settings,
        );
        session.startup();
        session
    }

    fn session(bus: &FakeBus) -> SerialSession {
        session_with(bus, &Settings::default())
    }

    fn arduino() -> FakeBus {
        FakeBus::with_ports(&[("COM3", "Arduino Uno")])
    }

    #[tokio::test]
    async fn test_startup_selects_first_port() {
        let bus = FakeBus::with_ports(&[("COM3", "Arduino Uno"), ("COM4", "FTDI")]);
        let session = session(&bus);
        assert_eq!(session.ports().len(), 2);
        assert_eq!(session.selected_port_name(), Some("COM3"));
        assert_eq!(session.device_label(), "Device Name: Arduino Uno");
        assert!(session.scrollback().is_empty());
        assert!(!session.indicator());
        assert!(!session.is_open());
        assert_eq!(session.button_label(), "Connect");
        assert_eq!(session.baud(), BaudRate::B9600);
    }

    #[tokio::test]
    async fn test_startup_with_no_ports() {
        let bus = FakeBus::default();
        let session = session(&bus);
        assert!(session.ports().is_empty());
        assert_eq!(session.selected_port(), None);
        assert_eq!(session.device_label(), DEVICE_LABEL);
    }

    #[tokio::test]
    async fn test_startup_with_enumeration_failure() {
        let bus = arduino();
        bus.fail_enumeration("udev unavailable");
        let session = session(&bus);
        assert!(session.ports().is_empty());
        assert_eq!(session.selected_port(), None);
    }

    #[tokio::test]
    async fn test_arduino_scenario() {
        let bus = arduino();
        let mut session = session(&bus);
        session.dispatch(UiEvent::BaudChanged(BaudRate::B9600));
        session.dispatch(UiEvent::Connect);
        assert!(session.is_open());
        assert!(session.is_polling());
        assert_eq!(session.button_label(), "Disconnect");
        assert_eq!(session.window_title(), "ByteMe Serial Monitor \u{25cf} COM3");

        bus.push_read(b"hello\n");
        session.dispatch(UiEvent::PollTick);
        assert_eq!(session.scrollback().lines(), ["hello"]);
        assert!(session.indicator());

        session.dispatch(UiEvent::PollTick);
        assert!(!session.indicator());
        assert_eq!(session.scrollback().lines(), ["hello"]);
    }

    #[tokio::test]
    async fn test_open_failure_scenario() {
        let bus = FakeBus::with_ports(&[("COM9", "Busy thing")]);
        bus.fail_open("COM9", "busy");
        let mut session = session(&bus);
        session.dispatch(UiEvent::Connect);

        assert!(!session.is_open());
        assert!(!session.is_polling());
        assert_eq!(session.button_label(), "Connect");
        assert_eq!(session.scrollback().len(), 1);
        assert!(session.scrollback().lines()[0].contains("COM9"));
        assert!(session.scrollback().lines()[0].contains("busy"));
    }

    #[tokio::test]
    async fn test_connect_without_port_reports_once() {
        let bus = FakeBus::default();
        let mut session = session(&bus);
        session.dispatch(UiEvent::Connect);
        assert!(!session.is_open());
        assert_eq!(session.scrollback().len(), 1);
        assert_eq!(bus.open_calls(), 0);
    }

    #[tokio::test]
    async fn test_connect_while_open_is_ignored() {
        let bus = arduino();
        let mut session = session(&bus);
        session.dispatch(UiEvent::Connect);
        session.dispatch(UiEvent::Connect);
        assert_eq!(bus.open_calls(), 1);
        assert!(session.scrollback().is_empty());
    }

    #[tokio::test]
    async fn test_empty_poll_never_appends() {
        let bus = arduino();
        let mut session = session(&bus);
        session.dispatch(UiEvent::Connect);
        for _ in 0..5 {
            session.dispatch(UiEvent::PollTick);
            assert!(!session.indicator());
        }
        assert!(session.scrollback().is_empty());
    }

    #[tokio::test]
    async fn test_poll_while_closed_is_noop() {
        let bus = arduino();
        let mut session = session(&bus);
        bus.push_read(b"ignored\n");
        session.dispatch(UiEvent::PollTick);
        assert!(session.scrollback().is_empty());
        assert!(!session.indicator());
    }

    #[tokio::test]
    async fn test_poll_emits_each_line_of_a_read() {
        let bus = arduino();
        let mut session = session(&bus);
        session.dispatch(UiEvent::Connect);
        bus.push_read(b"a=1\r\nb=2\r\npart");
        session.dispatch(UiEvent::PollTick);
        assert_eq!(session.scrollback().lines(), ["a=1", "b=2", "part"]);
    }

    #[tokio::test]
    async fn test_reassembly_holds_fragment_until_disconnect() {
        let bus = arduino();
        let settings = Settings {
            reassemble_partial_lines: true,
            ..Settings::default()
        };
        let mut session = session_with(&bus, &settings);
        session.dispatch(UiEvent::Connect);

        bus.push_read(b"hel");
        session.dispatch(UiEvent::PollTick);
        assert!(session.scrollback().is_empty());
        assert!(session.indicator());

        bus.push_read(b"lo\nwor");
        session.dispatch(UiEvent::PollTick);
        assert_eq!(session.scrollback().lines(), ["hello"]);

        session.dispatch(UiEvent::Disconnect);
        assert_eq!(session.scrollback().lines(), ["hello", "wor"]);
    }

    #[tokio::test]
    async fn test_disconnect_sequence() {
        let bus = arduino();
        let mut session = session(&bus);
        session.dispatch(UiEvent::Connect);
        bus.push_read(b"x\n");
        session.dispatch(UiEvent::PollTick);
        assert!(session.indicator());

        session.dispatch(session.toggle_event());
        assert!(!session.is_open());
        assert!(!session.is_polling());
        assert!(!session.indicator());
        assert_eq!(session.button_label(), "Connect");
        assert_eq!(bus.live_handles(), 0);
        assert_eq!(session.window_title(), APP_NAME);

        // Disconnect when closed does nothing
        session.dispatch(UiEvent::Disconnect);
        assert_eq!(session.scrollback().lines(), ["x"]);
    }

    #[tokio::test]
    async fn test_watchdog_forces_disconnect() {
        let bus = arduino();
        let mut session = session(&bus);
        session.dispatch(UiEvent::Connect);
        bus.push_read(b"x\n");
        session.dispatch(UiEvent::PollTick);

        bus.set_ports(&[]);
        session.dispatch(UiEvent::WatchdogTick);

        assert!(!session.is_open());
        assert!(!session.is_polling());
        assert!(!session.indicator());
        assert_eq!(session.device_label(), DEVICE_LABEL);
        let disconnected: Vec<_> = session
            .scrollback()
            .lines()
            .iter()
            .filter(|l| l.starts_with("Disconnected"))
            .collect();
        assert_eq!(disconnected, ["Disconnected: COM3 no longer available"]);

        // A second tick has nothing left to do
        session.dispatch(UiEvent::WatchdogTick);
        assert_eq!(session.scrollback().len(), 2);
    }

    #[tokio::test]
    async fn test_watchdog_is_noop_when_closed_or_present() {
        let bus = arduino();
        let mut session = session(&bus);

        bus.set_ports(&[]);
        session.dispatch(UiEvent::WatchdogTick);
        assert!(session.scrollback().is_empty());

        bus.set_ports(&[("COM3", "Arduino Uno")]);
        session.dispatch(UiEvent::Connect);
        session.dispatch(UiEvent::WatchdogTick);
        assert!(session.is_open());
        assert!(session.scrollback().is_empty());
    }

    #[tokio::test]
    async fn test_watchdog_checks_connected_port_not_selection() {
        let bus = FakeBus::with_ports(&[("COM3", "Arduino Uno"), ("COM4", "FTDI")]);
        let mut session = session(&bus);
        session.dispatch(UiEvent::Connect);
        session.dispatch(UiEvent::PortChanged(1));

        bus.set_ports(&[("COM3", "Arduino Uno")]);
        session.dispatch(UiEvent::WatchdogTick);
        assert!(session.is_open());
        assert_eq!(session.connected_port(), Some("COM3"));
    }

    #[tokio::test]
    async fn test_clear_keeps_link_state() {
        let bus = arduino();
        let mut session = session(&bus);
        session.dispatch(UiEvent::Connect);
        bus.push_read(b"a\nb\n");
        session.dispatch(UiEvent::PollTick);

        session.dispatch(UiEvent::Clear);
        assert!(session.scrollback().is_empty());
        assert!(session.is_open());

        session.dispatch(UiEvent::Disconnect);
        session.dispatch(UiEvent::Clear);
        assert!(session.scrollback().is_empty());
        assert!(!session.is_open());
    }

    #[tokio::test]
    async fn test_refresh_keeps_selection_and_link() {
        let bus = FakeBus::with_ports(&[("COM3", "Arduino Uno"), ("COM4", "FTDI")]);
        let mut session = session(&bus);
        session.dispatch(UiEvent::PortChanged(1));
        session.dispatch(UiEvent::Connect);

        bus.set_ports(&[("COM1", "PCI"), ("COM3", "Arduino Uno"), ("COM4", "FTDI")]);
        session.dispatch(UiEvent::Refresh);
        assert_eq!(session.ports().len(), 3);
        assert_eq!(session.selected_port_name(), Some("COM4"));
        assert_eq!(session.device_label(), "Device Name: FTDI");
        assert!(session.is_open());
    }

    #[tokio::test]
    async fn test_refresh_falls_back_to_first_port() {
        let bus = FakeBus::with_ports(&[("COM3", "Arduino Uno"), ("COM4", "FTDI")]);
        let mut session = session(&bus);
        session.dispatch(UiEvent::PortChanged(1));

        bus.set_ports(&[("COM5", "CH340")]);
        session.dispatch(UiEvent::Refresh);
        assert_eq!(session.selected_port_name(), Some("COM5"));
        assert_eq!(session.device_label(), "Device Name: CH340");

        bus.set_ports(&[]);
        session.dispatch(UiEvent::Refresh);
        assert_eq!(session.selected_port(), None);
        assert_eq!(session.device_label(), DEVICE_LABEL);
    }

    #[tokio::test]
    async fn test_port_changed_resolves_description() {
        let bus = FakeBus::with_ports(&[("COM3", "Arduino Uno"), ("COM4", "FTDI")]);
        let mut session = session(&bus);
        session.dispatch(UiEvent::PortChanged(1));
        assert_eq!(session.device_label(), "Device Name: FTDI");

        // Selected port unplugged since the last refresh
        bus.set_ports(&[("COM3", "Arduino Uno")]);
        session.dispatch(UiEvent::PortChanged(1));
        assert_eq!(session.device_label(), DEVICE_LABEL);

        // Out of range is ignored
        session.dispatch(UiEvent::PortChanged(7));
        assert_eq!(session.selected_port(), Some(1));
    }

    #[tokio::test]
    async fn test_baud_change_applies_on_next_connect() {
        let bus = arduino();
        let settings = Settings {
            default_baud: 115200,
            ..Settings::default()
        };
        let mut session = session_with(&bus, &settings);
        assert_eq!(session.baud(), BaudRate::B115200);
        session.dispatch(UiEvent::BaudChanged(BaudRate::B57600));
        assert_eq!(session.baud(), BaudRate::B57600);
    }

    #[tokio::test]
    async fn test_about_toggle() {
        let bus = arduino();
        let mut session = session(&bus);
        session.dispatch(UiEvent::ShowAbout);
        assert!(session.about_visible());
        session.dispatch(UiEvent::HideAbout);
        assert!(!session.about_visible());
    }

    #[tokio::test]
    async fn test_shutdown_releases_port() {
        let bus = arduino();
        let mut session = session(&bus);
        session.dispatch(UiEvent::Connect);
        session.shutdown();
        assert!(!session.is_open());
        assert_eq!(bus.live_handles(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timers_drive_poll_and_watchdog() {
        let bus = arduino();
        let mut session = session(&bus);

        // Only the watchdog runs while closed
        let start = tokio::time::Instant::now();
        assert_eq!(session.next_timer().await, UiEvent::WatchdogTick);
        assert_eq!(start.elapsed(), Duration::from_millis(1000));

        session.dispatch(UiEvent::Connect);
        let mut polls = 0;
        loop {
            match session.next_timer().await {
                UiEvent::PollTick => polls += 1,
                UiEvent::WatchdogTick => break,
                other => panic!("unexpected {:?}", other),
            }
        }
        assert!(polls >= 9);

        session.dispatch(UiEvent::Disconnect);
        assert_eq!(session.next_timer().await, UiEvent::WatchdogTick);
    }
}
