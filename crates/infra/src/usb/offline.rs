//! In-memory simulated device
//!
//! Backs the transport trait with a register map so the application can run
//! without hardware attached. Scalar writes are echoed into the map, which
//! makes a later refresh read back exactly what was set; bulk gain vectors
//! are accepted and dropped, as on hardware they are write-only anyway.

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::{debug, trace};

use madrigal_core::domain::device::{Result, UsbTransport};
use madrigal_core::domain::registers::{Control, DeviceModel};

pub struct OfflineTransport {
    registers: Mutex<HashMap<(u8, u16, u16), u8>>,
}

impl OfflineTransport {
    /// Create a simulated device with factory-like settings: every mixer
    /// fader at 0 dB, every pan centered, speakers fed from the first line
    /// pair
    pub fn new(model: &DeviceModel) -> Self {
        let mut registers = HashMap::new();

        for bus in 0..model.mixer_buses as u16 {
            for ch in 0..=model.master_index {
                // 0 dB on the wire
                registers.insert((Control::MixerLevel.request(), bus, ch), 48);
                registers.insert((Control::MixerPan.request(), bus, ch), 64);
            }
        }

        registers.insert((Control::OutputLineSelect.request(), 0, 0), 1);
        registers.insert((Control::OutputConfig.request(), 0, 0), 1);

        debug!(product = model.product_name, "simulated device initialized");
        Self {
            registers: Mutex::new(registers),
        }
    }
}

impl UsbTransport for OfflineTransport {
    fn read_register(&self, request: u8, value: u16, index: u16) -> Result<u8> {
        let byte = self
            .registers
            .lock()
            .unwrap()
            .get(&(request, value, index))
            .copied()
            .unwrap_or(0);
        trace!(request, value, index, byte, "simulated read");
        Ok(byte)
    }

    fn write_register(&self, request: u8, value: u16, index: u16, payload: &[u8]) -> Result<()> {
        trace!(request, value, index, len = payload.len(), "simulated write");
        if let [byte] = payload {
            self.registers
                .lock()
                .unwrap()
                .insert((request, value, index), *byte);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use madrigal_core::domain::device::DeviceContext;
    use madrigal_core::domain::mixer::{Channel, LevelDb, MixerBus};
    use std::sync::Arc;

    #[test]
    fn test_defaults_read_back_as_unity_center() {
        let model = DeviceModel::quartet();
        let ctx = DeviceContext::new(Arc::new(OfflineTransport::new(&model)), model);

        let mut bus = MixerBus::new(0, ctx.model()).unwrap();
        bus.refresh(&ctx).unwrap();

        assert_eq!(bus.strip(Channel::Input(0)).unwrap().level, LevelDb::UNITY);
        assert_eq!(bus.master(), LevelDb::UNITY);
    }

    #[test]
    fn test_scalar_writes_echo_into_refresh() {
        let model = DeviceModel::quartet();
        let ctx = DeviceContext::new(Arc::new(OfflineTransport::new(&model)), model);

        let mut bus = MixerBus::new(1, ctx.model()).unwrap();
        bus.set_level(&ctx, Channel::Input(2), LevelDb::new(-24).unwrap())
            .unwrap();

        let mut fresh = MixerBus::new(1, ctx.model()).unwrap();
        fresh.refresh(&ctx).unwrap();
        assert_eq!(
            fresh.strip(Channel::Input(2)).unwrap().level,
            LevelDb::new(-24).unwrap()
        );
    }
}
