// src/io/serial/mod.rs
//
// Serial port access for the monitor.
//
// - Port enumeration with human descriptions (directory)
// - One open connection at a time with non-blocking reads (link)
// - Line-feed framing with lossy UTF-8 decoding (lines)

pub mod directory;
pub mod lines;
pub mod link;
pub(crate) mod utils;

#[cfg(test)]
pub(crate) mod testing;

pub use directory::{PortDescriptor, PortDirectory, PortEnumerator, SystemPorts};
pub use lines::LineDecoder;
pub use link::{
    BaudRate, ConnectionConfig, OpenError, PortOpener, SerialHandle, SerialLink, SystemOpener,
};
pub use utils::{FlowControl, Parity, PortKind};
