// src/io/serial/directory.rs
//
// Enumeration of attached serial ports and their human descriptions.

use super::utils::{describe_port_type, PortKind};

/// Snapshot of one attached serial port
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PortDescriptor {
    /// OS identifier used to open the port (e.g. `COM3`, `/dev/ttyACM0`)
    pub system_name: String,
    pub human_description: String,
    pub port_type: PortKind,
}

/// Source of port enumerations
pub trait PortEnumerator {
    fn available_ports(&self) -> Result<Vec<PortDescriptor>, String>;
}

/// Enumerates ports through the serialport crate.
///
/// On macOS, filters out /dev/tty.* devices and only shows /dev/cu.* devices.
/// The cu (calling unit) devices are non-blocking and preferred for outgoing connections.
/// The tty (terminal) devices block on open waiting for carrier detect.
pub struct SystemPorts;

impl PortEnumerator for SystemPorts {
    fn available_ports(&self) -> Result<Vec<PortDescriptor>, String> {
        let ports = serialport::available_ports().map_err(|e| e.to_string())?;

        Ok(ports
            .into_iter()
            .filter(|_p| {
                #[cfg(target_os = "macos")]
                {
                    !_p.port_name.starts_with("/dev/tty.")
                }
                #[cfg(not(target_os = "macos"))]
                {
                    true
                }
            })
            .map(|p| {
                let (port_type, human_description) = describe_port_type(p.port_type);
                PortDescriptor {
                    system_name: p.port_name,
                    human_description,
                    port_type,
                }
            })
            .collect())
    }
}

/// Client for the OS port list. Every call re-enumerates; nothing is cached.
pub struct PortDirectory {
    enumerator: Box<dyn PortEnumerator>,
}

impl PortDirectory {
    pub fn new(enumerator: Box<dyn PortEnumerator>) -> Self {
        Self { enumerator }
    }

    pub fn system() -> Self {
        Self::new(Box::new(SystemPorts))
    }

    /// Currently attached ports, in OS order. Enumeration failure yields an empty list.
    pub fn list_ports(&self) -> Vec<PortDescriptor> {
        match self.enumerator.available_ports() {
            Ok(ports) => ports,
            Err(e) => {
                tlog!("[ports] Port enumeration unavailable: {}", e);
                Vec::new()
            }
        }
    }

    pub fn describe(&self, system_name: &str) -> Option<String> {
        self.list_ports()
            .into_iter()
            .find(|p| p.system_name == system_name)
            .map(|p| p.human_description)
    }

    pub fn contains(&self, system_name: &str) -> bool {
        self.list_ports().iter().any(|p| p.system_name == system_name)
    }
}
