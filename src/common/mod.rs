//! Common types and constants shared across the codec
//!
//! Wire-level constants for the ensemble format live here so the field
//! codec, the dataset payloads and the ensemble framer agree on them.

pub mod cli;
pub mod error;

pub use cli::{CommonArgs, ToolArgs, ToolCommand};
pub use error::{CodecError, CodecResult, DecodeReason};

/// Ensemble framing constants
pub mod framing {
    /// Sync byte repeated at the start of every ensemble
    pub const SYNC_BYTE: u8 = 0x80;
    /// Number of sync bytes in the ensemble header
    pub const HEADER_START_COUNT: usize = 16;
    /// Sync bytes + ensemble number + complement + payload size + complement
    pub const ENSEMBLE_HEADER_LEN: usize = 32;
    /// Trailing checksum field (only the low 16 bits are used)
    pub const CHECKSUM_SIZE: usize = 4;
    /// Offset of the ensemble number within the header
    pub const ENSEMBLE_NUMBER_OFFSET: usize = 16;
    /// Offset of the payload size within the header
    pub const PAYLOAD_SIZE_OFFSET: usize = 24;
    /// Upper bound on datasets walked in one ensemble
    pub const MAX_NUM_DATA_SETS: usize = 20;
    /// Number of fields in a dataset header, counting the name as one
    pub const NUM_DATASET_HEADER_ELEMENTS: usize = 6;
    /// Width of every int32/float32 field
    pub const BYTES_IN_WORD: usize = 4;
    /// Length of the standard `E0000xx\0` identifiers
    pub const DEFAULT_NAME_LENGTH: usize = 8;
}

/// Beams in a beam-coordinate profile dataset
pub const DEFAULT_NUM_BEAMS_BEAM: usize = 4;

/// Beams in a single-beam (vertical) dataset
pub const DEFAULT_NUM_BEAMS_NONBEAM: usize = 1;

/// Largest beam count a flat record may carry
pub const MAX_BEAMS: usize = 4;

/// Marker for a velocity the instrument could not measure
pub const BAD_VELOCITY: f32 = 88.888;

/// Marker for a velocity that was never filled in
pub const EMPTY_VELOCITY: f32 = -0.0;

/// Element kind tag stored in a dataset header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Float,
    Int,
    Byte,
}

impl ValueType {
    pub const FLOAT_TAG: i32 = 10;
    pub const INT_TAG: i32 = 20;
    pub const BYTE_TAG: i32 = 50;

    /// Interpret a raw header tag. Unrecognised tags are treated as float width.
    pub fn from_tag(tag: i32) -> Self {
        match tag {
            Self::INT_TAG => Self::Int,
            Self::BYTE_TAG => Self::Byte,
            _ => Self::Float,
        }
    }

    /// Tag written to the wire
    pub fn tag(self) -> i32 {
        match self {
            Self::Float => Self::FLOAT_TAG,
            Self::Int => Self::INT_TAG,
            Self::Byte => Self::BYTE_TAG,
        }
    }

    /// Bytes per element
    pub fn element_width(self) -> usize {
        match self {
            Self::Byte => 1,
            Self::Float | Self::Int => framing::BYTES_IN_WORD,
        }
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Float => write!(f, "FLOAT"),
            Self::Int => write!(f, "INT"),
            Self::Byte => write!(f, "BYTE"),
        }
    }
}
