//! Binary layout of the bulk mixer-gain transfer.
//!
//! One recompute produces two payloads per bus, one per stereo side. Each
//! payload carries a big-endian 16-bit gain word per input channel in fixed
//! channel order, then a 4-byte software-return trailer. The trailer is
//! asymmetric: the left payload ends `[swr, 0]`, the right payload `[0,
//! swr]`. That layout is an observed wire-format fact of the firmware and is
//! reproduced exactly, not derived.

/// Stereo side of a bulk gain payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left = 0,
    Right = 1,
}

impl Side {
    /// wIndex sub-address for this side of a bus's bulk write
    pub fn wire_index(self, bus: usize) -> u16 {
        (bus * 2 + self as usize) as u16
    }
}

/// Payload length for a given input channel count: one word per channel
/// plus the software-return trailer
pub fn payload_len(channels: usize) -> usize {
    channels * 2 + 4
}

/// Assemble the two stereo-side payloads for one bus.
///
/// `input_gains` holds the quantized (left, right) pair for every input
/// channel in wire order; `swr_gain` is the quantized software-return gain
/// (the software return has no pan, so one value serves both sides).
pub fn encode_bus_payloads(input_gains: &[(u16, u16)], swr_gain: u16) -> (Vec<u8>, Vec<u8>) {
    let len = payload_len(input_gains.len());
    let mut left = Vec::with_capacity(len);
    let mut right = Vec::with_capacity(len);

    for &(l, r) in input_gains {
        left.extend_from_slice(&l.to_be_bytes());
        right.extend_from_slice(&r.to_be_bytes());
    }

    // The software return occupies two words per payload, one per side;
    // the unused side is zero-padded.
    left.extend_from_slice(&swr_gain.to_be_bytes());
    left.extend_from_slice(&0u16.to_be_bytes());

    right.extend_from_slice(&0u16.to_be_bytes());
    right.extend_from_slice(&swr_gain.to_be_bytes());

    (left, right)
}
