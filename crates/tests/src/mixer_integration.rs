//! Integration tests for the mixer gain engine
//!
//! These tests drive the public engine API against a recording transport and
//! check what actually reaches the wire: full scalar-then-bulk sequences,
//! payload contents, and the interplay of solo, mute, and the master fader.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use madrigal_core::domain::outputs::{LineOutput, OutputBank};
use madrigal_core::domain::{
    Channel, Control, DeviceContext, DeviceError, DeviceModel, LevelDb, MixerBus, Pan,
    UsbTransport,
};
use madrigal_infra::usb::OfflineTransport;

/// Records every control transfer and serves seeded register reads
#[derive(Default)]
struct RecordingTransport {
    registers: Mutex<HashMap<(u8, u16, u16), u8>>,
    writes: Mutex<Vec<(u8, u16, u16, Vec<u8>)>>,
    fail_next: AtomicBool,
}

impl RecordingTransport {
    fn seed(&self, request: u8, value: u16, index: u16, byte: u8) {
        self.registers
            .lock()
            .unwrap()
            .insert((request, value, index), byte);
    }

    fn fail_next_write(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    fn writes(&self) -> Vec<(u8, u16, u16, Vec<u8>)> {
        self.writes.lock().unwrap().clone()
    }

    fn payloads_for(&self, request: u8) -> Vec<(u16, u16, Vec<u8>)> {
        self.writes()
            .into_iter()
            .filter(|w| w.0 == request)
            .map(|w| (w.1, w.2, w.3))
            .collect()
    }
}

impl UsbTransport for RecordingTransport {
    fn read_register(
        &self,
        request: u8,
        value: u16,
        index: u16,
    ) -> Result<u8, DeviceError> {
        Ok(self
            .registers
            .lock()
            .unwrap()
            .get(&(request, value, index))
            .copied()
            .unwrap_or(0))
    }

    fn write_register(
        &self,
        request: u8,
        value: u16,
        index: u16,
        payload: &[u8],
    ) -> Result<(), DeviceError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(DeviceError::Transport("injected failure".to_string()));
        }
        self.writes
            .lock()
            .unwrap()
            .push((request, value, index, payload.to_vec()));
        Ok(())
    }
}

fn setup() -> (Arc<RecordingTransport>, DeviceContext) {
    let transport = Arc::new(RecordingTransport::default());
    let ctx = DeviceContext::new(transport.clone(), DeviceModel::quartet());
    (transport, ctx)
}

fn word(payload: &[u8], channel: usize) -> u16 {
    u16::from_be_bytes([payload[channel * 2], payload[channel * 2 + 1]])
}

// ============================================================================
// BULK GAIN VECTOR CONTENTS
// ============================================================================

#[test]
fn test_minus_twelve_center_produces_expected_word() {
    let (transport, ctx) = setup();
    let mut bus = MixerBus::new(0, ctx.model()).unwrap();

    bus.set_level(&ctx, Channel::Input(0), LevelDb::new(-12).unwrap())
        .unwrap();

    let bulk = transport.payloads_for(Control::MixerGains.request());
    assert_eq!(bulk.len(), 2);

    let (left, right) = (&bulk[0].2, &bulk[1].2);
    assert_eq!(left.len(), 28);

    // -12 dB at center pan lands on the logarithmic grid at 1457 both sides
    assert_eq!(word(left, 0), 1457);
    assert_eq!(word(right, 0), 1457);
}

#[test]
fn test_master_at_floor_silences_entire_bus() {
    let (transport, ctx) = setup();
    let mut bus = MixerBus::new(1, ctx.model()).unwrap();

    bus.set_master_level(&ctx, LevelDb::FLOOR).unwrap();

    let bulk = transport.payloads_for(Control::MixerGains.request());
    assert_eq!(bulk.len(), 2);

    // bus 1 addresses wIndex 2 (left) and 3 (right)
    assert_eq!(bulk[0].1, 2);
    assert_eq!(bulk[1].1, 3);
    assert!(bulk[0].2.iter().all(|&b| b == 0));
    assert!(bulk[1].2.iter().all(|&b| b == 0));
}

#[test]
fn test_single_solo_silences_everything_else() {
    let (transport, ctx) = setup();
    let mut bus = MixerBus::new(0, ctx.model()).unwrap();

    bus.set_solo(&ctx, Channel::Input(2), true).unwrap();

    let bulk = transport.payloads_for(Control::MixerGains.request());
    let left = &bulk[bulk.len() - 2].2;

    for ch in 0..12 {
        if ch == 2 {
            assert_ne!(word(left, ch), 0);
        } else {
            assert_eq!(word(left, ch), 0);
        }
    }
    // software return word in the trailer is silenced too
    assert_eq!(word(left, 12), 0);
}

#[test]
fn test_mute_overrides_solo_on_same_channel() {
    let (transport, ctx) = setup();
    let mut bus = MixerBus::new(0, ctx.model()).unwrap();

    bus.set_solo(&ctx, Channel::Input(5), true).unwrap();
    bus.set_mute(&ctx, Channel::Input(5), true).unwrap();

    let bulk = transport.payloads_for(Control::MixerGains.request());
    let left = &bulk[bulk.len() - 2].2;

    assert!(left.iter().all(|&b| b == 0));
}

#[test]
fn test_trailer_is_asymmetric_between_sides() {
    let (transport, ctx) = setup();
    let mut bus = MixerBus::new(0, ctx.model()).unwrap();

    bus.set_level(&ctx, Channel::SoftwareReturn, LevelDb::UNITY)
        .unwrap();

    let bulk = transport.payloads_for(Control::MixerGains.request());
    let (left, right) = (&bulk[0].2, &bulk[1].2);

    // software return at unity: 8192 leads the left trailer, trails the right
    assert_eq!(word(left, 12), 8192);
    assert_eq!(word(left, 13), 0);
    assert_eq!(word(right, 12), 0);
    assert_eq!(word(right, 13), 8192);
}

// ============================================================================
// FAILURE AND VALIDATION PATHS
// ============================================================================

#[test]
fn test_out_of_domain_level_never_reaches_wire() {
    let (transport, _) = setup();

    assert!(matches!(
        LevelDb::new(7),
        Err(DeviceError::OutOfRange { .. })
    ));
    assert!(matches!(
        Pan::new(65),
        Err(DeviceError::OutOfRange { .. })
    ));
    assert!(transport.writes().is_empty());
}

#[test]
fn test_transport_failure_aborts_before_mirror_update() {
    let (transport, ctx) = setup();
    let mut bus = MixerBus::new(0, ctx.model()).unwrap();
    transport.fail_next_write();

    let err = bus
        .set_mute(&ctx, Channel::Input(0), true)
        .unwrap_err();

    assert!(matches!(err, DeviceError::Transport(_)));
    assert!(!bus.strip(Channel::Input(0)).unwrap().mute);
    assert!(transport.writes().is_empty());
}

#[test]
fn test_line_level_mismatch_is_surfaced_not_fatal() {
    let (transport, ctx) = setup();

    // line 3/4 pair: sub-lines 2 and 3 disagree
    transport.seed(Control::OutputLineLevel.request(), 0, 2, 0);
    transport.seed(Control::OutputLineLevel.request(), 0, 3, 1);

    let mut line = LineOutput::new(3).unwrap();
    let mismatch = line.refresh(&ctx).unwrap();

    let mismatch = mismatch.expect("divergent registers should be reported");
    assert_eq!(mismatch.line_index, 2);
    assert_eq!((mismatch.primary, mismatch.secondary), (0, 1));
}

#[test]
fn test_bank_refresh_survives_mismatches() {
    let (transport, ctx) = setup();
    transport.seed(Control::OutputLineLevel.request(), 0, 1, 1);

    let mut bank = OutputBank::new();
    let mismatches = bank.refresh(&ctx).unwrap();

    assert_eq!(mismatches.len(), 1);
    assert!(transport.writes().is_empty());
}

// ============================================================================
// OFFLINE ROUND TRIP
// ============================================================================

#[test]
fn test_offline_device_round_trip() {
    let model = DeviceModel::quartet();
    let ctx = DeviceContext::new(Arc::new(OfflineTransport::new(&model)), model);

    let mut bus = MixerBus::new(0, ctx.model()).unwrap();
    bus.refresh(&ctx).unwrap();
    assert_eq!(bus.master(), LevelDb::UNITY);

    bus.set_level(&ctx, Channel::Input(3), LevelDb::new(-30).unwrap())
        .unwrap();
    bus.set_pan(&ctx, Channel::Input(3), Pan::new(40).unwrap())
        .unwrap();

    // a fresh mirror sees the scalar settings the device stored
    let mut fresh = MixerBus::new(0, ctx.model()).unwrap();
    fresh.refresh(&ctx).unwrap();
    let strip = fresh.strip(Channel::Input(3)).unwrap();
    assert_eq!(strip.level, LevelDb::new(-30).unwrap());
    assert_eq!(strip.pan, Some(Pan::new(40).unwrap()));
}
