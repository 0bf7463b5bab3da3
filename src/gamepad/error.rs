//! Error definitions for the gamepad state engine

use thiserror::Error;

/// Errors raised by the state engine and the report codec
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GamepadError {
    /// An index addressed a slot the active layout does not have
    #[error("{field} index {index} out of range (layout has {len})")]
    IndexOutOfRange {
        field: &'static str,
        index: usize,
        len: usize,
    },

    /// The report descriptor declares a different size than the codec emits
    #[error("{layout} descriptor declares {declared_bits} input bits, codec emits {encoded_bits}")]
    DescriptorMismatch {
        layout: &'static str,
        declared_bits: u32,
        encoded_bits: u32,
    },

    /// The report descriptor itself could not be walked
    #[error("Invalid report descriptor: {0}")]
    Descriptor(#[from] super::descriptor::DescriptorError),
}
