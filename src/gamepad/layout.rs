//! Report codecs for the two supported descriptor variants.
//!
//! A layout is picked once at startup and owned by the engine as a trait object;
//! encoding never branches on the variant per call.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug, Display};

use super::descriptor::{CUSTOM_DESCRIPTOR, EXTENDED_DESCRIPTOR, REPORT_ID};
use super::state::{GamepadState, HatDirection};

/// Which descriptor variant the device presents
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum LayoutKind {
    /// 10 buttons, 1 hat, 4 axes, 2 triggers in 13 bytes
    #[default]
    Custom,
    /// 16 buttons, 1 hat, 6 axes in 15 bytes
    Extended,
}

impl LayoutKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LayoutKind::Custom => "custom",
            LayoutKind::Extended => "extended",
        }
    }

    pub fn build(self) -> Box<dyn ReportLayout> {
        match self {
            LayoutKind::Custom => Box::new(CustomLayout),
            LayoutKind::Extended => Box::new(ExtendedLayout),
        }
    }
}

impl Display for LayoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Slot counts of a layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutShape {
    pub buttons: usize,
    pub hats: usize,
    pub axes: usize,
    pub triggers: usize,
}

/// An encoded input report. Built on demand, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    id: u8,
    payload: Vec<u8>,
}

impl Report {
    pub fn new(id: u8, payload: Vec<u8>) -> Self {
        Self { id, payload }
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Report id followed by the payload, as a HID gadget expects it
    pub fn to_wire(&self) -> Vec<u8> {
        let mut wire = Vec::with_capacity(self.payload.len() + 1);
        wire.push(self.id);
        wire.extend_from_slice(&self.payload);
        wire
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:02x}]", self.id)?;
        for byte in &self.payload {
            write!(f, " {byte:02x}")?;
        }
        Ok(())
    }
}

/// Encode-state-to-report capability shared by both variants
pub trait ReportLayout: Send + Sync + Debug + 'static {
    fn kind(&self) -> LayoutKind;

    fn shape(&self) -> LayoutShape;

    /// HID report descriptor matching [`ReportLayout::encode`] bit for bit
    fn descriptor(&self) -> &'static [u8];

    /// Payload length in bytes, excluding the report id
    fn report_len(&self) -> usize;

    /// Encodes a snapshot created for this layout's shape
    fn encode(&self, state: &GamepadState) -> Report;
}

fn hat_nibble(state: &GamepadState) -> u8 {
    state
        .hats()
        .first()
        .copied()
        .unwrap_or(HatDirection::Centered)
        .code()
        & 0x0f
}

fn put_axes(out: &mut [u8], axes: &[i16]) {
    for (chunk, axis) in out.chunks_exact_mut(2).zip(axes) {
        chunk.copy_from_slice(&axis.to_le_bytes());
    }
}

pub const CUSTOM_REPORT_LEN: usize = 13;

/// Axes, triggers, buttons, hat:
///
/// ```text
/// 0..8   four axes, i16 little endian
/// 8..10  two triggers, u8
/// 10..12 button bits, button i at bit i
/// 12     hat code in the low nibble
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct CustomLayout;

impl ReportLayout for CustomLayout {
    fn kind(&self) -> LayoutKind {
        LayoutKind::Custom
    }

    fn shape(&self) -> LayoutShape {
        LayoutShape {
            buttons: 10,
            hats: 1,
            axes: 4,
            triggers: 2,
        }
    }

    fn descriptor(&self) -> &'static [u8] {
        CUSTOM_DESCRIPTOR
    }

    fn report_len(&self) -> usize {
        CUSTOM_REPORT_LEN
    }

    fn encode(&self, state: &GamepadState) -> Report {
        let mut buf = [0u8; CUSTOM_REPORT_LEN];
        put_axes(&mut buf[0..8], state.axes());
        for (slot, trigger) in buf[8..10].iter_mut().zip(state.triggers()) {
            *slot = *trigger;
        }
        buf[10..12].copy_from_slice(&state.button_bits().to_le_bytes());
        buf[12] = hat_nibble(state);
        Report::new(REPORT_ID, buf.to_vec())
    }
}

pub const EXTENDED_REPORT_LEN: usize = 15;

/// Buttons, hat, then three pointer pairs:
///
/// ```text
/// 0..2   button bits, button i at bit i
/// 2      hat code in the low nibble, high nibble padding
/// 3..15  six axes (X, Y, Rx, Ry, Z, Rz), i16 little endian
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtendedLayout;

impl ReportLayout for ExtendedLayout {
    fn kind(&self) -> LayoutKind {
        LayoutKind::Extended
    }

    fn shape(&self) -> LayoutShape {
        LayoutShape {
            buttons: 16,
            hats: 1,
            axes: 6,
            triggers: 0,
        }
    }

    fn descriptor(&self) -> &'static [u8] {
        EXTENDED_DESCRIPTOR
    }

    fn report_len(&self) -> usize {
        EXTENDED_REPORT_LEN
    }

    fn encode(&self, state: &GamepadState) -> Report {
        let mut buf = [0u8; EXTENDED_REPORT_LEN];
        buf[0..2].copy_from_slice(&state.button_bits().to_le_bytes());
        buf[2] = hat_nibble(state);
        put_axes(&mut buf[3..15], state.axes());
        Report::new(REPORT_ID, buf.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gamepad::descriptor::input_report_bits;

    fn state_for(layout: &dyn ReportLayout) -> GamepadState {
        GamepadState::new(layout.shape())
    }

    #[test]
    fn default_custom_report_is_centered_and_zeroed() {
        let layout = CustomLayout;
        let report = layout.encode(&state_for(&layout));
        assert_eq!(report.id(), 1);
        let mut expected = [0u8; 13];
        expected[12] = 8;
        assert_eq!(report.payload(), &expected);
    }

    #[test]
    fn custom_button_bits_split_across_two_bytes() {
        let layout = CustomLayout;
        let mut state = state_for(&layout);
        let pressed = [true, false, true, false, false, false, false, false, true, false];
        state.buttons_mut().copy_from_slice(&pressed);
        let report = layout.encode(&state);
        assert_eq!(report.payload()[10], 0b0000_0101);
        assert_eq!(report.payload()[11], 0b0000_0001);
    }

    #[test]
    fn custom_axes_are_little_endian() {
        let layout = CustomLayout;
        let mut state = state_for(&layout);
        state.axes_mut().copy_from_slice(&[1, -1, -500, 32767]);
        state.hats_mut()[0] = HatDirection::Left;
        let payload = layout.encode(&state).payload().to_vec();
        assert_eq!(&payload[0..2], &[0x01, 0x00]);
        assert_eq!(&payload[2..4], &[0xff, 0xff]);
        assert_eq!(&payload[4..6], &(-500i16).to_le_bytes());
        assert_eq!(&payload[6..8], &[0xff, 0x7f]);
        assert_eq!(&payload[8..10], &[0, 0]);
        assert_eq!(payload[12], 6);
    }

    #[test]
    fn extended_layout_packs_buttons_hat_then_axes() {
        let layout = ExtendedLayout;
        let mut state = state_for(&layout);
        state.buttons_mut()[15] = true;
        state.buttons_mut()[3] = true;
        state.hats_mut()[0] = HatDirection::DownRight;
        state.axes_mut()[5] = -2;
        let payload = layout.encode(&state).payload().to_vec();
        assert_eq!(payload.len(), 15);
        assert_eq!(&payload[0..2], &[0b0000_1000, 0b1000_0000]);
        assert_eq!(payload[2], 3);
        assert_eq!(&payload[13..15], &[0xfe, 0xff]);
        assert!(payload[3..13].iter().all(|b| *b == 0));
    }

    #[test]
    fn every_layout_matches_its_descriptor() {
        for kind in [LayoutKind::Custom, LayoutKind::Extended] {
            let layout = kind.build();
            let report = layout.encode(&state_for(layout.as_ref()));
            assert_eq!(report.payload().len(), layout.report_len());
            assert_eq!(
                input_report_bits(layout.descriptor(), report.id()),
                Ok(layout.report_len() as u32 * 8),
                "{kind} layout"
            );
        }
    }

    #[test]
    fn wire_form_prefixes_report_id() {
        let report = Report::new(1, vec![0xaa, 0xbb]);
        assert_eq!(report.to_wire(), vec![1, 0xaa, 0xbb]);
        assert_eq!(report.to_string(), "[01] aa bb");
    }
}
