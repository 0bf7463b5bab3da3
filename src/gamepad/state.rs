use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

use super::layout::LayoutShape;

/// Logical range declared for every 16 bit axis
pub const AXIS_MIN: i16 = -32767;
pub const AXIS_MAX: i16 = 32767;

/// Eight compass directions plus the released position.
///
/// The discriminants are the codes carried on the wire and in the report nibble.
/// `Centered` lies outside the descriptor's logical range (0..=7), which the
/// null-state flag turns into "no direction" on the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum HatDirection {
    Up = 0,
    UpRight = 1,
    Right = 2,
    DownRight = 3,
    Down = 4,
    DownLeft = 5,
    Left = 6,
    UpLeft = 7,
    #[default]
    Centered = 8,
}

impl HatDirection {
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Narrows any integer to a direction; everything outside 0..=7 is centered.
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => HatDirection::Up,
            1 => HatDirection::UpRight,
            2 => HatDirection::Right,
            3 => HatDirection::DownRight,
            4 => HatDirection::Down,
            5 => HatDirection::DownLeft,
            6 => HatDirection::Left,
            7 => HatDirection::UpLeft,
            _ => HatDirection::Centered,
        }
    }
}

impl Display for HatDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HatDirection::Up => "up",
            HatDirection::UpRight => "up-right",
            HatDirection::Right => "right",
            HatDirection::DownRight => "down-right",
            HatDirection::Down => "down",
            HatDirection::DownLeft => "down-left",
            HatDirection::Left => "left",
            HatDirection::UpLeft => "up-left",
            HatDirection::Centered => "centered",
        };
        write!(f, "{name}")
    }
}

/// Complete controller snapshot, sized by the layout it was created for.
///
/// Only the state engine hands out mutable access; everything else sees
/// read-only slices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GamepadState {
    buttons: Vec<bool>,
    hats: Vec<HatDirection>,
    axes: Vec<i16>,
    triggers: Vec<u8>,
}

impl GamepadState {
    /// All buttons released, hats centered, axes and triggers at zero
    pub fn new(shape: LayoutShape) -> Self {
        Self {
            buttons: vec![false; shape.buttons],
            hats: vec![HatDirection::Centered; shape.hats],
            axes: vec![0; shape.axes],
            triggers: vec![0; shape.triggers],
        }
    }

    pub fn buttons(&self) -> &[bool] {
        &self.buttons
    }

    pub fn hats(&self) -> &[HatDirection] {
        &self.hats
    }

    pub fn axes(&self) -> &[i16] {
        &self.axes
    }

    pub fn triggers(&self) -> &[u8] {
        &self.triggers
    }

    pub(crate) fn buttons_mut(&mut self) -> &mut [bool] {
        &mut self.buttons
    }

    pub(crate) fn hats_mut(&mut self) -> &mut [HatDirection] {
        &mut self.hats
    }

    pub(crate) fn axes_mut(&mut self) -> &mut [i16] {
        &mut self.axes
    }

    /// Button bits, bit i set iff button i is pressed. Buttons past 16 are ignored.
    pub fn button_bits(&self) -> u16 {
        self.buttons
            .iter()
            .take(16)
            .enumerate()
            .filter(|(_, pressed)| **pressed)
            .fold(0u16, |bits, (i, _)| bits | (1 << i))
    }
}

/// Saturates to the declared logical range -32767..=32767.
///
/// -32768 fits an `i16` but lies outside the range both descriptors declare,
/// so it is stored (and read back) as -32767.
pub fn narrow_axis(value: i64) -> i16 {
    value.clamp(AXIS_MIN as i64, AXIS_MAX as i64) as i16
}
