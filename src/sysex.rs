//! SysEx frame construction for the device's proprietary config protocol.
//!
//! Pure functions, no I/O. Frames are always `F0 <mfr-id> <command> <payload>
//! F7`; per-encoder config rides the bulk-transfer command in numbered parts
//! of at most [`PART_SIZE_BYTES`] payload bytes each.

use crate::constants::{commands, MFR_ID, PART_SIZE_BYTES};

pub const SYSEX_START: u8 = 0xF0;
pub const SYSEX_END: u8 = 0xF7;

/// Build the global push-config frame.
///
/// Entries must be supplied in ascending address order: the firmware is
/// order-sensitive for the global block (but not for per-encoder blocks).
/// [`DeviceSettings::entries`](crate::device_settings::DeviceSettings::entries)
/// already yields that order.
pub fn encode_global(entries: &[(u8, u8)]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(6 + entries.len() * 2);
    frame.push(SYSEX_START);
    frame.extend_from_slice(&MFR_ID);
    frame.push(commands::PUSH_CONF);
    for &(address, value) in entries {
        frame.push(address);
        frame.push(value);
    }
    frame.push(SYSEX_END);
    frame
}

/// Split `(address, value)` pairs into numbered bulk-transfer frames.
///
/// The flattened byte stream is chunked into parts of at most
/// [`PART_SIZE_BYTES`]; each frame carries `0x00, tag, part (1-based),
/// total_parts, chunk_len` ahead of its chunk. An empty payload yields no
/// frames at all, so an encoder with nothing dirty transmits nothing.
pub fn encode_bulk(tag: u8, pairs: &[(u8, u8)]) -> Vec<Vec<u8>> {
    let mut payload = Vec::with_capacity(pairs.len() * 2);
    for &(address, value) in pairs {
        payload.push(address);
        payload.push(value);
    }

    if payload.is_empty() {
        return Vec::new();
    }

    let total_parts = payload.len().div_ceil(PART_SIZE_BYTES);

    payload
        .chunks(PART_SIZE_BYTES)
        .enumerate()
        .map(|(i, chunk)| {
            let mut frame = Vec::with_capacity(11 + chunk.len());
            frame.push(SYSEX_START);
            frame.extend_from_slice(&MFR_ID);
            frame.push(commands::BULK_XFER);
            frame.push(0x00);
            frame.push(tag);
            frame.push((i + 1) as u8);
            frame.push(total_parts as u8);
            frame.push(chunk.len() as u8);
            frame.extend_from_slice(chunk);
            frame.push(SYSEX_END);
            frame
        })
        .collect()
}
