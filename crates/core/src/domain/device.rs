//! Device abstractions: error taxonomy, the USB transport trait, and the
//! context object that every engine operation borrows.
//!
//! The transport itself is deliberately tiny: the Quartet exposes its whole
//! control surface through vendor control transfers, so a single-byte read
//! and a variable-length write are all the engine ever needs. The real
//! implementation (rusb) lives in the `infra` crate.

use std::sync::Arc;
use thiserror::Error;

use crate::domain::registers::{Control, DeviceModel};

/// Errors that can occur while talking to the device
#[derive(Debug, Error)]
pub enum DeviceError {
    /// USB control transfer failed; never retried by the engine
    #[error("Transport error: {0}")]
    Transport(String),

    /// Matching device was not found on the bus
    #[error("Device not found (vendor {vendor_id:#06x}, product {product_id:#06x})")]
    NotFound { vendor_id: u16, product_id: u16 },

    /// A setter was called with a value outside its documented domain
    #[error("{control} value {value} outside {min}..={max}")]
    OutOfRange {
        control: &'static str,
        value: i32,
        min: i32,
        max: i32,
    },

    /// Channel index does not exist on this device model
    #[error("No mixer channel {0} on this device")]
    UnknownChannel(usize),

    /// Bus index does not exist on this device model
    #[error("No mixer bus {0} on this device")]
    UnknownBus(usize),

    /// Control does not apply to the addressed channel kind
    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),
}

pub type Result<T> = std::result::Result<T, DeviceError>;

/// Raw USB control-transfer primitives supplied by the transport backend.
///
/// `value` and `index` are the wValue/wIndex sub-addressing fields of the
/// control transfer. All scalar controls are one byte on the wire; the bulk
/// mixer-gain write is the only multi-byte payload.
pub trait UsbTransport: Send + Sync {
    /// Read one byte from a device register
    fn read_register(&self, request: u8, value: u16, index: u16) -> Result<u8>;

    /// Write a payload to a device register
    fn write_register(&self, request: u8, value: u16, index: u16, payload: &[u8]) -> Result<()>;
}

/// Context owning the transport handle and the device schema.
///
/// Passed explicitly to every engine operation so the engine holds no
/// process-wide state and can run against a fake transport in tests.
#[derive(Clone)]
pub struct DeviceContext {
    transport: Arc<dyn UsbTransport>,
    model: DeviceModel,
}

impl DeviceContext {
    pub fn new(transport: Arc<dyn UsbTransport>, model: DeviceModel) -> Self {
        Self { transport, model }
    }

    pub fn model(&self) -> &DeviceModel {
        &self.model
    }

    /// Read one byte from a logical control
    pub fn read(&self, control: Control, value: u16, index: u16) -> Result<u8> {
        self.transport.read_register(control.request(), value, index)
    }

    /// Write a single-byte scalar control
    pub fn write_scalar(&self, control: Control, value: u16, index: u16, byte: u8) -> Result<()> {
        self.transport
            .write_register(control.request(), value, index, &[byte])
    }

    /// Write a multi-byte payload (bulk mixer-gain transfer)
    pub fn write_payload(
        &self,
        control: Control,
        value: u16,
        index: u16,
        payload: &[u8],
    ) -> Result<()> {
        self.transport
            .write_register(control.request(), value, index, payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::testing::FakeTransport;

    #[test]
    fn test_context_routes_to_transport() {
        let transport = Arc::new(FakeTransport::new());
        transport.seed(Control::MixerLevel.request(), 0, 3, 48);

        let ctx = DeviceContext::new(transport.clone(), DeviceModel::quartet());
        assert_eq!(ctx.read(Control::MixerLevel, 0, 3).unwrap(), 48);

        ctx.write_scalar(Control::MixerMute, 1, 2, 1).unwrap();
        assert_eq!(
            transport.last_write(),
            Some((Control::MixerMute.request(), 1, 2, vec![1]))
        );
    }

    #[test]
    fn test_transport_failure_propagates() {
        let transport = Arc::new(FakeTransport::new());
        transport.fail_next_write();

        let ctx = DeviceContext::new(transport, DeviceModel::quartet());
        let err = ctx.write_scalar(Control::MixerMute, 0, 0, 1).unwrap_err();
        assert!(matches!(err, DeviceError::Transport(_)));
    }
}
