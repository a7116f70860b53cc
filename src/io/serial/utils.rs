// src/io/serial/utils.rs
//
// Shared helpers for the serial link and port directory.
// Provides the framing types and conversion functions for the serialport crate.

use serialport::{DataBits, FlowControl as SpFlowControl, Parity as SpParity, StopBits};

// ============================================================================
// Types
// ============================================================================

/// Parity setting for serial port configuration
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Parity {
    #[default]
    None,
    Odd,
    Even,
}

/// Flow control setting for serial port configuration
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FlowControl {
    #[default]
    None,
    Software,
    Hardware,
}

/// Coarse classification of an attached port, as reported by the OS
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PortKind {
    Usb,
    Bluetooth,
    Pci,
    Unknown,
}

impl PortKind {
    pub fn label(&self) -> &'static str {
        match self {
            PortKind::Usb => "USB",
            PortKind::Bluetooth => "Bluetooth",
            PortKind::Pci => "PCI",
            PortKind::Unknown => "Unknown",
        }
    }
}

// ============================================================================
// Conversion Functions
// ============================================================================

/// Convert our Parity enum to serialport crate's Parity type
pub fn to_serialport_parity(p: Parity) -> SpParity {
    match p {
        Parity::None => SpParity::None,
        Parity::Odd => SpParity::Odd,
        Parity::Even => SpParity::Even,
    }
}

/// Convert our FlowControl enum to serialport crate's FlowControl type
pub fn to_serialport_flow_control(f: FlowControl) -> SpFlowControl {
    match f {
        FlowControl::None => SpFlowControl::None,
        FlowControl::Software => SpFlowControl::Software,
        FlowControl::Hardware => SpFlowControl::Hardware,
    }
}

/// Convert data bits count to serialport crate's DataBits type
pub fn to_serialport_data_bits(bits: u8) -> DataBits {
    match bits {
        5 => DataBits::Five,
        6 => DataBits::Six,
        7 => DataBits::Seven,
        _ => DataBits::Eight,
    }
}

/// Convert stop bits count to serialport crate's StopBits type
pub fn to_serialport_stop_bits(bits: u8) -> StopBits {
    match bits {
        2 => StopBits::Two,
        _ => StopBits::One,
    }
}

/// Classify a serialport port type and derive its human description.
/// USB ports prefer the product string, then the manufacturer; anything else
/// falls back to the port kind label.
pub fn describe_port_type(port_type: serialport::SerialPortType) -> (PortKind, String) {
    match port_type {
        serialport::SerialPortType::UsbPort(info) => {
            let non_blank = |s: &String| !s.trim().is_empty();
            let description = info
                .product
                .filter(non_blank)
                .or(info.manufacturer.filter(non_blank))
                .unwrap_or_else(|| PortKind::Usb.label().to_string());
            (PortKind::Usb, description)
        }
        serialport::SerialPortType::BluetoothPort => {
            (PortKind::Bluetooth, PortKind::Bluetooth.label().to_string())
        }
        serialport::SerialPortType::PciPort => (PortKind::Pci, PortKind::Pci.label().to_string()),
        serialport::SerialPortType::Unknown => {
            (PortKind::Unknown, PortKind::Unknown.label().to_string())
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
