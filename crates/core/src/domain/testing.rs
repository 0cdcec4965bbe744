//! In-memory transport double shared by the unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::domain::device::{DeviceError, Result, UsbTransport};

/// Fake transport backed by a register map; records every write and can
/// inject a one-shot write failure.
#[derive(Default)]
pub(crate) struct FakeTransport {
    registers: Mutex<HashMap<(u8, u16, u16), u8>>,
    writes: Mutex<Vec<(u8, u16, u16, Vec<u8>)>>,
    fail_next: AtomicBool,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preload a register value for subsequent reads
    pub fn seed(&self, request: u8, value: u16, index: u16, byte: u8) {
        self.registers
            .lock()
            .unwrap()
            .insert((request, value, index), byte);
    }

    /// Make the next write fail with a transport error
    pub fn fail_next_write(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Every recorded write as (request, value, index, payload)
    pub fn writes(&self) -> Vec<(u8, u16, u16, Vec<u8>)> {
        self.writes.lock().unwrap().clone()
    }

    pub fn last_write(&self) -> Option<(u8, u16, u16, Vec<u8>)> {
        self.writes.lock().unwrap().last().cloned()
    }

    /// Recorded writes for one request code, as (value, index, payload)
    pub fn writes_for(&self, request: u8) -> Vec<(u16, u16, Vec<u8>)> {
        self.writes
            .lock()
            .unwrap()
            .iter()
            .filter(|w| w.0 == request)
            .map(|w| (w.1, w.2, w.3.clone()))
            .collect()
    }
}

impl UsbTransport for FakeTransport {
    fn read_register(&self, request: u8, value: u16, index: u16) -> Result<u8> {
        Ok(*self
            .registers
            .lock()
            .unwrap()
            .get(&(request, value, index))
            .unwrap_or(&0))
    }

    fn write_register(&self, request: u8, value: u16, index: u16, payload: &[u8]) -> Result<()> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(DeviceError::Transport("injected write failure".into()));
        }

        if let [byte] = payload {
            self.registers
                .lock()
                .unwrap()
                .insert((request, value, index), *byte);
        }

        self.writes
            .lock()
            .unwrap()
            .push((request, value, index, payload.to_vec()));
        Ok(())
    }
}
