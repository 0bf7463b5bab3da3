//! Gamepad subsystem: authoritative device state and its HID reports
//!
//! ```text
//! RPC ──► Gamepad (engine) ──► ReportLayout (codec) ──► HidSink
//!          GamepadState          Report                  /dev/hidgN, log
//! ```
//!
//! 1. [`state`] - controller snapshot and hat directions
//! 2. [`layout`] - the two report encodings, selected once at startup
//! 3. [`descriptor`] - report descriptors and the walker that checks them
//! 4. [`engine`] - index-addressed getters/setters and `send_state`
//! 5. [`sink`] - transmit targets for encoded reports

pub mod descriptor;
pub mod engine;
pub mod error;
pub mod layout;
pub mod sink;
pub mod state;

pub use engine::Gamepad;
pub use error::GamepadError;
pub use layout::{LayoutKind, LayoutShape, Report, ReportLayout};
pub use sink::{HidSink, RecordingSink, SinkConfig};
pub use state::{GamepadState, HatDirection};
