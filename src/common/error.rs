//! Error types for the ensemble codec
//!
//! Every failure is local to one ensemble or one dataset block. Callers
//! processing a stream use [`CodecError::reason`] to decide whether to
//! skip and resync or stop.

use thiserror::Error;

/// Coarse classification of a codec failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeReason {
    /// Sync run missing or a complement check failed
    MalformedHeader,
    /// Stored checksum differs from the recomputed one
    ChecksumMismatch,
    /// Dataset name not in the catalogue
    UnknownDataSet,
    /// Declared sizes exceed the bytes available
    Truncated,
    /// Element counts do not fit the dataset schema
    FieldCountMismatch,
    /// Caller supplied inconsistent data (encode side, JSON, rows)
    InvalidInput,
}

/// Codec errors
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Buffer too short: need {needed} bytes at offset {offset}, have {available}")]
    BufferTooShort {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("No ensemble sync pattern at offset {offset}")]
    MissingSync { offset: usize },

    #[error("{field} complement mismatch: value {value:#010x}, complement {complement:#010x}")]
    ComplementMismatch {
        field: &'static str,
        value: i32,
        complement: i32,
    },

    #[error("Checksum mismatch: stored {stored:04x}, computed {computed:04x}")]
    ChecksumMismatch { stored: u16, computed: u16 },

    #[error("Ensemble truncated: declared {declared} bytes, {available} available")]
    TruncatedEnsemble { declared: usize, available: usize },

    #[error("Dataset {name} truncated: declared {declared} bytes, {available} available")]
    TruncatedDataSet {
        name: String,
        declared: usize,
        available: usize,
    },

    #[error("More than {max} datasets in one ensemble")]
    TooManyDataSets { max: usize },

    #[error("Negative {field} in header: {value}")]
    NegativeLength { field: &'static str, value: i32 },

    #[error(
        "Dataset {name}: {elements} elements do not fit {scalars} scalar words and {arrays} per-beam arrays"
    )]
    UnexpectedBeamCount {
        name: String,
        elements: usize,
        scalars: usize,
        arrays: usize,
    },

    #[error("Dataset {name}: value type tag {tag} is not valid for this dataset")]
    UnexpectedValueType { name: String, tag: i32 },

    #[error("Name length mismatch: header declares {declared}, name has {actual} bytes")]
    NameLengthMismatch { declared: usize, actual: usize },

    #[error("Dataset name is not ASCII")]
    InvalidName,

    #[error("Dataset {name} has no field {field}")]
    UnknownField { name: String, field: String },

    #[error("Field {field}: expected {expected} values, got {actual}")]
    FieldShape {
        field: String,
        expected: usize,
        actual: usize,
    },

    #[error("Unknown dataset {name}")]
    UnknownDataSet { name: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid JSON document: {0}")]
    InvalidJson(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CodecError {
    /// Create a buffer-too-short error
    pub fn too_short(offset: usize, needed: usize, available: usize) -> Self {
        Self::BufferTooShort {
            offset,
            needed,
            available,
        }
    }

    /// Create a JSON shape error
    pub fn invalid_json(msg: impl Into<String>) -> Self {
        Self::InvalidJson(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an unknown-field error
    pub fn unknown_field(name: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnknownField {
            name: name.into(),
            field: field.into(),
        }
    }

    /// Reason code for stream-level policy decisions
    pub fn reason(&self) -> DecodeReason {
        match self {
            Self::MissingSync { .. }
            | Self::ComplementMismatch { .. }
            | Self::NegativeLength { .. } => DecodeReason::MalformedHeader,
            Self::ChecksumMismatch { .. } => DecodeReason::ChecksumMismatch,
            Self::UnknownDataSet { .. } => DecodeReason::UnknownDataSet,
            Self::BufferTooShort { .. }
            | Self::TruncatedEnsemble { .. }
            | Self::TruncatedDataSet { .. } => DecodeReason::Truncated,
            Self::UnexpectedBeamCount { .. }
            | Self::UnexpectedValueType { .. }
            | Self::TooManyDataSets { .. } => DecodeReason::FieldCountMismatch,
            Self::NameLengthMismatch { .. }
            | Self::InvalidName
            | Self::UnknownField { .. }
            | Self::FieldShape { .. }
            | Self::Json(_)
            | Self::InvalidJson(_)
            | Self::Io(_)
            | Self::Config(_) => DecodeReason::InvalidInput,
        }
    }
}

/// Result type alias using CodecError
pub type CodecResult<T> = Result<T, CodecError>;
