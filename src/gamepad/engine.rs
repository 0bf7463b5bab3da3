use tracing::{debug, info, warn};

use super::descriptor::input_report_bits;
use super::error::GamepadError;
use super::layout::{LayoutKind, Report, ReportLayout};
use super::sink::HidSink;
use super::state::{narrow_axis, GamepadState, HatDirection};

/// Owns the authoritative controller state and publishes it as HID reports.
///
/// Mutation goes through `&mut self`, so whoever owns the engine is the single
/// writer. The RPC dispatcher owns it for the lifetime of the process.
pub struct Gamepad {
    layout: Box<dyn ReportLayout>,
    state: GamepadState,
    sink: Box<dyn HidSink>,
    published: u64,
}

impl Gamepad {
    /// Builds an engine with default state after checking that the layout's
    /// descriptor declares exactly the bytes its codec emits.
    pub fn new(
        layout: Box<dyn ReportLayout>,
        sink: Box<dyn HidSink>,
    ) -> Result<Self, GamepadError> {
        let state = GamepadState::new(layout.shape());
        let encoded = layout.encode(&state);
        let declared_bits = input_report_bits(layout.descriptor(), encoded.id())?;
        let encoded_bits = (encoded.payload().len() * 8) as u32;
        if declared_bits != encoded_bits {
            return Err(GamepadError::DescriptorMismatch {
                layout: layout.kind().as_str(),
                declared_bits,
                encoded_bits,
            });
        }

        info!(
            "Gamepad ready: {} layout, {:?}, {} byte reports",
            layout.kind(),
            layout.shape(),
            layout.report_len()
        );
        Ok(Self {
            layout,
            state,
            sink,
            published: 0,
        })
    }

    pub fn with_kind(kind: LayoutKind, sink: Box<dyn HidSink>) -> Result<Self, GamepadError> {
        Self::new(kind.build(), sink)
    }

    pub fn layout(&self) -> &dyn ReportLayout {
        self.layout.as_ref()
    }

    pub fn state(&self) -> &GamepadState {
        &self.state
    }

    /// Number of reports handed to the sink so far
    pub fn published(&self) -> u64 {
        self.published
    }

    pub fn button(&self, index: usize) -> Result<bool, GamepadError> {
        slot("button", self.state.buttons(), index).copied()
    }

    pub fn set_button(&mut self, index: usize, pressed: bool) -> Result<(), GamepadError> {
        *slot_mut("button", self.state.buttons_mut(), index)? = pressed;
        Ok(())
    }

    pub fn hat(&self, index: usize) -> Result<HatDirection, GamepadError> {
        slot("hat", self.state.hats(), index).copied()
    }

    pub fn set_hat(&mut self, index: usize, direction: HatDirection) -> Result<(), GamepadError> {
        *slot_mut("hat", self.state.hats_mut(), index)? = direction;
        Ok(())
    }

    pub fn axis(&self, index: usize) -> Result<i16, GamepadError> {
        slot("axis", self.state.axes(), index).copied()
    }

    /// Stores `value` saturated to the declared axis range
    pub fn set_axis(&mut self, index: usize, value: i64) -> Result<(), GamepadError> {
        let narrowed = narrow_axis(value);
        if i64::from(narrowed) != value {
            debug!("Axis {} value {} saturated to {}", index, value, narrowed);
        }
        *slot_mut("axis", self.state.axes_mut(), index)? = narrowed;
        Ok(())
    }

    /// Encodes the current state and hands it to the sink.
    ///
    /// Never fails: a sink error is logged and the report is still returned.
    pub fn send_state(&mut self) -> Report {
        let report = self.layout.encode(&self.state);
        if let Err(e) = self.sink.send_report(&report) {
            warn!("HID sink rejected report {}: {}", report, e);
        }
        self.published += 1;
        debug!("Published report #{}: {}", self.published, report);
        report
    }
}

impl std::fmt::Debug for Gamepad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gamepad")
            .field("layout", &self.layout.kind())
            .field("state", &self.state)
            .field("published", &self.published)
            .finish()
    }
}

fn slot<'a, T>(field: &'static str, values: &'a [T], index: usize) -> Result<&'a T, GamepadError> {
    let len = values.len();
    values
        .get(index)
        .ok_or(GamepadError::IndexOutOfRange { field, index, len })
}

fn slot_mut<'a, T>(
    field: &'static str,
    values: &'a mut [T],
    index: usize,
) -> Result<&'a mut T, GamepadError> {
    let len = values.len();
    values
        .get_mut(index)
        .ok_or(GamepadError::IndexOutOfRange { field, index, len })
}
