// src/io/serial/link.rs
//
// Open/closed lifecycle of a single serial connection.
// Reads are non-blocking: only bytes the OS already holds are returned.

use std::fmt;
use std::io::Read;
use std::time::Duration;

use super::utils::{
    to_serialport_data_bits, to_serialport_flow_control, to_serialport_parity,
    to_serialport_stop_bits, FlowControl, Parity,
};

/// Upper bound on a single read call
const MAX_READ: usize = 64 * 1024;

// ============================================================================
// Types and Configuration
// ============================================================================

/// Baud rates offered by the selector
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BaudRate {
    #[default]
    B9600,
    B14400,
    B19200,
    B28800,
    B38400,
    B57600,
    B115200,
}

impl BaudRate {
    pub const ALL: [BaudRate; 7] = [
        BaudRate::B9600,
        BaudRate::B14400,
        BaudRate::B19200,
        BaudRate::B28800,
        BaudRate::B38400,
        BaudRate::B57600,
        BaudRate::B115200,
    ];

    pub fn as_u32(&self) -> u32 {
        match self {
            BaudRate::B9600 => 9600,
            BaudRate::B14400 => 14400,
            BaudRate::B19200 => 19200,
            BaudRate::B28800 => 28800,
            BaudRate::B38400 => 38400,
            BaudRate::B57600 => 57600,
            BaudRate::B115200 => 115200,
        }
    }

    pub fn from_u32(rate: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.as_u32() == rate)
    }

    fn index(&self) -> usize {
        Self::ALL.iter().position(|b| b == self).unwrap_or(0)
    }

    /// Next rate in the selector, wrapping around
    pub fn next(&self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    /// Previous rate in the selector, wrapping around
    pub fn prev(&self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for BaudRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u32())
    }
}

/// Parameters for one connection. Framing is fixed at 8-N-1 without flow control.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub port_name: String,
    pub baud_rate: BaudRate,
    pub data_bits: u8,
    pub parity: Parity,
    pub stop_bits: u8,
    pub flow_control: FlowControl,
}

impl ConnectionConfig {
    pub fn new(port_name: impl Into<String>, baud_rate: BaudRate) -> Self {
        Self {
            port_name: port_name.into(),
            baud_rate,
            data_bits: 8,
            parity: Parity::None,
            stop_bits: 1,
            flow_control: FlowControl::None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum OpenError {
    #[error("Failed to open port: no port selected")]
    NoPortSelected,
    #[error("Port {port} is already open")]
    AlreadyOpen { port: String },
    #[error("Failed to open port {port}: {cause}")]
    Os { port: String, cause: String },
}

// ============================================================================
// OS Seams
// ============================================================================

/// An open OS serial handle. Dropping it releases the port.
pub trait SerialHandle {
    /// Bytes currently buffered by the OS and readable without blocking
    fn bytes_to_read(&mut self) -> std::io::Result<u32>;
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize>;
}

/// Acquires OS handles for a connection config
pub trait PortOpener {
    fn open(&self, config: &ConnectionConfig) -> Result<Box<dyn SerialHandle>, String>;
}

/// Opens ports through the serialport crate
pub struct SystemOpener;

struct SystemHandle(Box<dyn serialport::SerialPort>);

impl SerialHandle for SystemHandle {
    fn bytes_to_read(&mut self) -> std::io::Result<u32> {
        self.0.bytes_to_read().map_err(std::io::Error::from)
    }

    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.0.read(buf)
    }
}

impl PortOpener for SystemOpener {
    fn open(&self, config: &ConnectionConfig) -> Result<Box<dyn SerialHandle>, String> {
        // Reads are gated on bytes_to_read, so the timeout only bounds a racing read.
        let port = serialport::new(&config.port_name, config.baud_rate.as_u32())
            .data_bits(to_serialport_data_bits(config.data_bits))
            .parity(to_serialport_parity(config.parity))
            .stop_bits(to_serialport_stop_bits(config.stop_bits))
            .flow_control(to_serialport_flow_control(config.flow_control))
            .timeout(Duration::from_millis(1))
            .open()
            .map_err(|e| e.to_string())?;
        Ok(Box::new(SystemHandle(port)))
    }
}

// ============================================================================
// Serial Link
// ============================================================================

struct OpenPort {
    config: ConnectionConfig,
    handle: Box<dyn SerialHandle>,
}

/// At most one open connection; `None` means Closed.
pub struct SerialLink {
    opener: Box<dyn PortOpener>,
    port: Option<OpenPort>,
}

impl SerialLink {
    pub fn new(opener: Box<dyn PortOpener>) -> Self {
        Self { opener, port: None }
    }

    pub fn system() -> Self {
        Self::new(Box::new(SystemOpener))
    }

    pub fn open(&mut self, config: ConnectionConfig) -> Result<(), OpenError> {
        if let Some(open) = &self.port {
            return Err(OpenError::AlreadyOpen {
                port: open.config.port_name.clone(),
            });
        }
        if config.port_name.is_empty() {
            return Err(OpenError::NoPortSelected);
        }

        let handle = self.opener.open(&config).map_err(|cause| OpenError::Os {
            port: config.port_name.clone(),
            cause,
        })?;

        tlog!(
            "[serial] Opened {} at {} baud ({}-{}-{})",
            config.port_name,
            config.baud_rate,
            config.data_bits,
            match config.parity {
                Parity::None => 'N',
                Parity::Odd => 'O',
                Parity::Even => 'E',
            },
            config.stop_bits
        );

        self.port = Some(OpenPort { config, handle });
        Ok(())
    }

    /// Whatever the OS has buffered right now; empty when closed or idle.
    pub fn read_available(&mut self) -> Vec<u8> {
        let Some(open) = self.port.as_mut() else {
            return Vec::new();
        };

        let available = match open.handle.bytes_to_read() {
            Ok(n) => n as usize,
            Err(e) => {
                tlog!("[serial] {}: bytes_to_read failed: {}", open.config.port_name, e);
                return Vec::new();
            }
        };
        if available == 0 {
            return Vec::new();
        }

        let mut buf = vec![0u8; available.min(MAX_READ)];
        match open.handle.read(&mut buf) {
            Ok(n) => {
                buf.truncate(n);
                buf
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::TimedOut => Vec::new(),
            Err(e) => {
                tlog!("[serial] {}: read error: {}", open.config.port_name, e);
                Vec::new()
            }
        }
    }

    pub fn close(&mut self) {
        if let Some(open) = self.port.take() {
            tlog!("[serial] Closed {}", open.config.port_name);
        }
    }

    pub fn is_open(&self) -> bool {
        self.port.is_some()
    }

    pub fn port_name(&self) -> Option<&str> {
        self.port.as_ref().map(|p| p.config.port_name.as_str())
    }
}

// ============================================================================
// Tests
// ============================================================================
