//! HID report descriptors for both layouts and a small walker that measures them.
//!
//! The walker only understands what it needs to answer one question: how many
//! input bits does a given report id declare? That number has to match the
//! payload the codec emits, otherwise the host reads garbage.

use std::collections::BTreeMap;
use thiserror::Error;

/// Report id carried by every input report of both layouts
pub const REPORT_ID: u8 = 1;

/// Custom layout: 4 x 16 bit axes, 2 x 8 bit triggers, 10 buttons, 1 hat (13 bytes)
pub const CUSTOM_DESCRIPTOR: &[u8] = &[
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x05, // Usage (Game Pad)
    0xa1, 0x01, // Collection (Application)
    0x85, 0x01, //  Report ID (1)
    0x09, 0x01, //  Usage (Pointer)
    0xa1, 0x00, //  Collection (Physical)
    0x09, 0x30, //   Usage (X)
    0x09, 0x31, //   Usage (Y)
    0x09, 0x33, //   Usage (Rx)
    0x09, 0x34, //   Usage (Ry)
    0x16, 0x01, 0x80, //   Logical Minimum (-32767)
    0x26, 0xff, 0x7f, //   Logical Maximum (32767)
    0x75, 0x10, //   Report Size (16)
    0x95, 0x04, //   Report Count (4)
    0x81, 0x02, //   Input (Data,Var,Abs)
    0x05, 0x01, //   Usage Page (Generic Desktop)
    0x09, 0x32, //   Usage (Z)
    0x09, 0x35, //   Usage (Rz)
    0x15, 0x00, //   Logical Minimum (0)
    0x26, 0xff, 0x00, //   Logical Maximum (255)
    0x75, 0x08, //   Report Size (8)
    0x95, 0x02, //   Report Count (2)
    0x81, 0x02, //   Input (Data,Var,Abs)
    0x05, 0x09, //   Usage Page (Button)
    0x19, 0x01, //   Usage Minimum (1)
    0x29, 0x0a, //   Usage Maximum (10)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x01, //   Logical Maximum (1)
    0x75, 0x01, //   Report Size (1)
    0x95, 0x0a, //   Report Count (10)
    0x81, 0x02, //   Input (Data,Var,Abs)
    0x75, 0x06, //   Report Size (6)
    0x95, 0x01, //   Report Count (1)
    0x81, 0x03, //   Input (Const,Var,Abs)
    0x05, 0x01, //   Usage Page (Generic Desktop)
    0x09, 0x39, //   Usage (Hat switch)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x07, //   Logical Maximum (7)
    0x35, 0x00, //   Physical Minimum (0)
    0x46, 0x3b, 0x01, //   Physical Maximum (315)
    0x65, 0x14, //   Unit (EnglishRotation: deg)
    0x75, 0x04, //   Report Size (4)
    0x95, 0x01, //   Report Count (1)
    0x81, 0x42, //   Input (Data,Var,Abs,Null)
    0x65, 0x00, //   Unit (None)
    0x75, 0x04, //   Report Size (4)
    0x95, 0x01, //   Report Count (1)
    0x81, 0x03, //   Input (Const,Var,Abs)
    0xc0, //  End Collection
    0xc0, // End Collection
];

/// Extended layout: 16 buttons, 1 hat, three pointer pairs of 16 bit axes (15 bytes)
pub const EXTENDED_DESCRIPTOR: &[u8] = &[
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x05, // Usage (Game Pad)
    0xa1, 0x01, // Collection (Application)
    0x85, 0x01, //  Report ID (1)
    0x05, 0x09, //  Usage Page (Button)
    0x19, 0x01, //  Usage Minimum (1)
    0x29, 0x10, //  Usage Maximum (16)
    0x15, 0x00, //  Logical Minimum (0)
    0x25, 0x01, //  Logical Maximum (1)
    0x75, 0x01, //  Report Size (1)
    0x95, 0x10, //  Report Count (16)
    0x81, 0x02, //  Input (Data,Var,Abs)
    0x05, 0x01, //  Usage Page (Generic Desktop)
    0x09, 0x39, //  Usage (Hat switch)
    0x15, 0x00, //  Logical Minimum (0)
    0x25, 0x07, //  Logical Maximum (7)
    0x35, 0x00, //  Physical Minimum (0)
    0x46, 0x3b, 0x01, //  Physical Maximum (315)
    0x65, 0x14, //  Unit (EnglishRotation: deg)
    0x75, 0x04, //  Report Size (4)
    0x95, 0x01, //  Report Count (1)
    0x81, 0x42, //  Input (Data,Var,Abs,Null)
    0x65, 0x00, //  Unit (None)
    0x75, 0x04, //  Report Size (4)
    0x95, 0x01, //  Report Count (1)
    0x81, 0x03, //  Input (Const,Var,Abs)
    0x45, 0x00, //  Physical Maximum (0)
    0x16, 0x01, 0x80, //  Logical Minimum (-32767)
    0x26, 0xff, 0x7f, //  Logical Maximum (32767)
    0x75, 0x10, //  Report Size (16)
    0x95, 0x02, //  Report Count (2)
    0x09, 0x01, //  Usage (Pointer)
    0xa1, 0x00, //  Collection (Physical)
    0x09, 0x30, //   Usage (X)
    0x09, 0x31, //   Usage (Y)
    0x81, 0x02, //   Input (Data,Var,Abs)
    0xc0, //  End Collection
    0x09, 0x01, //  Usage (Pointer)
    0xa1, 0x00, //  Collection (Physical)
    0x09, 0x33, //   Usage (Rx)
    0x09, 0x34, //   Usage (Ry)
    0x81, 0x02, //   Input (Data,Var,Abs)
    0xc0, //  End Collection
    0x09, 0x01, //  Usage (Pointer)
    0xa1, 0x00, //  Collection (Physical)
    0x09, 0x32, //   Usage (Z)
    0x09, 0x35, //   Usage (Rz)
    0x81, 0x02, //   Input (Data,Var,Abs)
    0xc0, //  End Collection
    0xc0, // End Collection
];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("report descriptor ended unexpectedly at byte {0}")]
    UnexpectedEof(usize),
    #[error("report descriptor contains a long item (0xFE), which is not supported")]
    LongItemUnsupported,
    #[error("global Push/Pop stack underflow")]
    GlobalStackUnderflow,
    #[error("unbalanced collection stack")]
    UnbalancedCollections,
}

#[derive(Debug, Clone, Copy, Default)]
struct GlobalState {
    report_id: u8,
    report_size: u32,
    report_count: u32,
}

fn parse_unsigned(data: &[u8]) -> u32 {
    match *data {
        [] => 0,
        [b0] => b0 as u32,
        [b0, b1] => u16::from_le_bytes([b0, b1]) as u32,
        [b0, b1, b2, b3] => u32::from_le_bytes([b0, b1, b2, b3]),
        _ => 0,
    }
}

/// Sums the input bits declared per report id.
///
/// Descriptors without a Report ID item land under id 0.
pub fn input_bits_per_report(bytes: &[u8]) -> Result<BTreeMap<u8, u32>, DescriptorError> {
    let mut global = GlobalState::default();
    let mut global_stack: Vec<GlobalState> = Vec::new();
    let mut depth = 0usize;
    let mut bits = BTreeMap::new();

    let mut cursor = 0usize;
    while let Some(&prefix) = bytes.get(cursor) {
        cursor += 1;

        if prefix == 0xfe {
            return Err(DescriptorError::LongItemUnsupported);
        }

        let data_len = match prefix & 0b11 {
            3 => 4,
            n => n as usize,
        };
        let data = bytes
            .get(cursor..cursor + data_len)
            .ok_or(DescriptorError::UnexpectedEof(cursor))?;
        cursor += data_len;

        let item_type = (prefix >> 2) & 0b11;
        let tag = (prefix >> 4) & 0b1111;

        match (item_type, tag) {
            // Input
            (0, 8) => {
                *bits.entry(global.report_id).or_insert(0) +=
                    global.report_size * global.report_count;
            }
            // Collection / End Collection
            (0, 10) => depth += 1,
            (0, 12) => {
                depth = depth
                    .checked_sub(1)
                    .ok_or(DescriptorError::UnbalancedCollections)?;
            }
            (1, 7) => global.report_size = parse_unsigned(data),
            (1, 8) => global.report_id = parse_unsigned(data) as u8,
            (1, 9) => global.report_count = parse_unsigned(data),
            (1, 10) => global_stack.push(global),
            (1, 11) => {
                global = global_stack
                    .pop()
                    .ok_or(DescriptorError::GlobalStackUnderflow)?;
            }
            _ => {}
        }
    }

    if depth != 0 {
        return Err(DescriptorError::UnbalancedCollections);
    }
    Ok(bits)
}

/// Input bits declared for one report id, zero if the id never appears.
pub fn input_report_bits(bytes: &[u8], report_id: u8) -> Result<u32, DescriptorError> {
    Ok(input_bits_per_report(bytes)?
        .get(&report_id)
        .copied()
        .unwrap_or(0))
}
