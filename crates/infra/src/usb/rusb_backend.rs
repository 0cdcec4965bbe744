//! rusb-based hardware transport
//!
//! All device state lives in single-byte vendor registers, read and written
//! through control transfers on endpoint zero. Reads use request type 0xc0
//! (device to host, vendor, device recipient) and writes 0x40.

use std::time::Duration;

use rusb::{Direction, DeviceHandle, GlobalContext, Recipient, RequestType};
use tracing::{info, trace};

use madrigal_core::domain::device::{DeviceError, Result, UsbTransport};
use madrigal_core::domain::registers::DeviceModel;

const CONTROL_TIMEOUT: Duration = Duration::from_millis(500);

/// Control transport over a claimed USB device handle
pub struct RusbTransport {
    handle: DeviceHandle<GlobalContext>,
    timeout: Duration,
}

impl RusbTransport {
    /// Open the first attached device matching the model's vendor and
    /// product IDs
    pub fn open(model: &DeviceModel) -> Result<Self> {
        let handle = rusb::open_device_with_vid_pid(model.vendor_id, model.product_id)
            .ok_or(DeviceError::NotFound {
                vendor_id: model.vendor_id,
                product_id: model.product_id,
            })?;

        info!(
            vendor_id = format_args!("{:#06x}", model.vendor_id),
            product_id = format_args!("{:#06x}", model.product_id),
            product = model.product_name,
            "Opened USB device"
        );

        Ok(Self {
            handle,
            timeout: CONTROL_TIMEOUT,
        })
    }
}

impl UsbTransport for RusbTransport {
    fn read_register(&self, request: u8, value: u16, index: u16) -> Result<u8> {
        let request_type = rusb::request_type(Direction::In, RequestType::Vendor, Recipient::Device);
        let mut buf = [0u8; 1];

        let read = self
            .handle
            .read_control(request_type, request, value, index, &mut buf, self.timeout)
            .map_err(|e| DeviceError::Transport(e.to_string()))?;
        if read != 1 {
            return Err(DeviceError::Transport(format!(
                "short control read: {read} bytes"
            )));
        }

        trace!(request, value, index, byte = buf[0], "control read");
        Ok(buf[0])
    }

    fn write_register(&self, request: u8, value: u16, index: u16, payload: &[u8]) -> Result<()> {
        let request_type =
            rusb::request_type(Direction::Out, RequestType::Vendor, Recipient::Device);

        self.handle
            .write_control(request_type, request, value, index, payload, self.timeout)
            .map_err(|e| DeviceError::Transport(e.to_string()))?;

        trace!(request, value, index, len = payload.len(), "control write");
        Ok(())
    }
}
