//! Conversions from foreign record formats into native datasets
//!
//! - [`prti`]: DVL-mode PRTI01/PRTI02 sentences
//! - [`pd0`]: PD0 ensemble sections
//! - [`row`]: named-column rows from a database or CSV export

pub mod pd0;
pub mod prti;
pub mod row;

pub use pd0::{
    ensemble_record_from_pd0, FromPd0, Pd0BottomTrack, Pd0Coordinate, Pd0Correlation,
    Pd0EchoIntensity, Pd0VariableLeader, Pd0Velocity,
};
pub use prti::{Prti01Sentence, Prti02Sentence, PrtiFields, PRTI01_ID, PRTI02_ID};
pub use row::DataRow;
