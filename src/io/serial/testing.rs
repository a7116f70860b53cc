// src/io/serial/testing.rs
//
// Scripted stand-in for the OS serial layer, shared by unit tests.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use super::directory::{PortDescriptor, PortEnumerator};
use super::link::{ConnectionConfig, PortOpener, SerialHandle};
use super::utils::PortKind;

#[derive(Default)]
struct BusState {
    ports: Vec<PortDescriptor>,
    enumeration_error: Option<String>,
    open_failures: HashMap<String, String>,
    reads: VecDeque<Vec<u8>>,
    fail_reads: bool,
    open_calls: usize,
    live_handles: usize,
}

/// Fake port list plus fake handles. Each pushed chunk is returned by exactly one read.
#[derive(Clone, Default)]
pub(crate) struct FakeBus {
    state: Rc<RefCell<BusState>>,
}

impl FakeBus {
    pub fn with_ports(ports: &[(&str, &str)]) -> Self {
        let bus = Self::default();
        bus.set_ports(ports);
        bus
    }

    pub fn set_ports(&self, ports: &[(&str, &str)]) {
        self.state.borrow_mut().ports = ports
            .iter()
            .map(|(name, desc)| PortDescriptor {
                system_name: name.to_string(),
                human_description: desc.to_string(),
                port_type: PortKind::Usb,
            })
            .collect();
    }

    pub fn fail_enumeration(&self, cause: &str) {
        self.state.borrow_mut().enumeration_error = Some(cause.to_string());
    }

    pub fn fail_open(&self, port: &str, cause: &str) {
        self.state
            .borrow_mut()
            .open_failures
            .insert(port.to_string(), cause.to_string());
    }

    pub fn push_read(&self, bytes: &[u8]) {
        self.state.borrow_mut().reads.push_back(bytes.to_vec());
    }

    pub fn fail_reads(&self) {
        self.state.borrow_mut().fail_reads = true;
    }

    pub fn open_calls(&self) -> usize {
        self.state.borrow().open_calls
    }

    pub fn live_handles(&self) -> usize {
        self.state.borrow().live_handles
    }
}

impl PortEnumerator for FakeBus {
    fn available_ports(&self) -> Result<Vec<PortDescriptor>, String> {
        let state = self.state.borrow();
        match &state.enumeration_error {
            Some(cause) => Err(cause.clone()),
            None => Ok(state.ports.clone()),
        }
    }
}

impl PortOpener for FakeBus {
    fn open(&self, config: &ConnectionConfig) -> Result<Box<dyn SerialHandle>, String> {
        let mut state = self.state.borrow_mut();
        state.open_calls += 1;
        if let Some(cause) = state.open_failures.get(&config.port_name) {
            return Err(cause.clone());
        }
        if !state.ports.iter().any(|p| p.system_name == config.port_name) {
            return Err("No such file or directory".to_string());
        }
        state.live_handles += 1;
        Ok(Box::new(FakeHandle { bus: self.clone() }))
    }
}

struct FakeHandle {
    bus: FakeBus,
}

impl SerialHandle for FakeHandle {
    fn bytes_to_read(&mut self) -> std::io::Result<u32> {
        let state = self.bus.state.borrow();
        Ok(state.reads.front().map(|chunk| chunk.len() as u32).unwrap_or(0))
    }

    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let mut state = self.bus.state.borrow_mut();
        if state.fail_reads {
            return Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "device gone"));
        }
        let Some(chunk) = state.reads.pop_front() else {
            return Ok(0);
        };
        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        Ok(n)
    }
}

impl Drop for FakeHandle {
    fn drop(&mut self) {
        self.bus.state.borrow_mut().live_handles -= 1;
    }
}
