//! Low-level wire codec
//!
//! Field primitives, the dataset sub-header and the payload checksum.

pub mod checksum;
pub mod field;
pub mod header;

pub use checksum::{checksum, ChecksumCalculator};
pub use header::{data_set_size, header_size, DataSetHeader, FIXED_HEADER_LEN};
