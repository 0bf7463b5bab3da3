//! Remote-controlled virtual gamepad.
//!
//! A host process drives the gamepad state over line-delimited JSON-RPC; the
//! device side keeps the state and publishes it as HID input reports.
//!
//! ```text
//! host ──► JoystickClient ──► serial/TCP/stdio ──► RpcServer ──► Dispatcher
//!                                                                  │
//!                                    HidSink ◄── ReportLayout ◄── Gamepad
//! ```

pub mod config;
pub mod gamepad;
pub mod rpc;

pub use config::Config;
pub use gamepad::{Gamepad, GamepadError, HatDirection, LayoutKind};
pub use rpc::{Dispatcher, JoystickClient, RpcServer};
