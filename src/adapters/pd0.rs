//! Conversion from PD0 ensemble sections
//!
//! PD0 decoding is done elsewhere; these structs carry the raw integer
//! fields of the relevant sections in PD0 units. Conversions scale them to
//! native units (metres, m/s, degrees, Pa) and reorder bin-major PD0 cell
//! arrays into beam-major grids.

use serde::{Deserialize, Serialize};

use crate::common::{CodecError, CodecResult, BAD_VELOCITY};
use crate::dataset::{BeamGrid, DataSetKind, Record};

/// PD0 velocity value meaning "no measurement"
pub const PD0_BAD_VELOCITY: i16 = -32768;

/// Build a native dataset from a PD0 section
pub trait FromPd0<Src>: Sized {
    fn from_pd0(src: &Src) -> CodecResult<Self>;
}

/// Coordinate frame of PD0 velocities (EX command bits 4-3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Pd0Coordinate {
    #[default]
    Beam,
    Instrument,
    Ship,
    Earth,
}

impl Pd0Coordinate {
    /// Native grid kind carrying velocities in this frame
    pub fn velocity_kind(self) -> DataSetKind {
        match self {
            Self::Beam => DataSetKind::BeamVelocity,
            Self::Instrument | Self::Ship => DataSetKind::InstrumentVelocity,
            Self::Earth => DataSetKind::EarthVelocity,
        }
    }

    /// Bottom Track array carrying velocities in this frame
    fn bottom_track_key(self) -> &'static str {
        match self {
            Self::Beam => "BeamVelocity",
            Self::Instrument | Self::Ship => "InstrumentVelocity",
            Self::Earth => "EarthVelocity",
        }
    }
}

fn velocity(mm_s: i16) -> f32 {
    if mm_s == PD0_BAD_VELOCITY {
        BAD_VELOCITY
    } else {
        f32::from(mm_s) / 1000.0
    }
}

fn check_beams(section: &str, expected: usize, actual: usize) -> CodecResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(CodecError::FieldShape {
            field: section.to_string(),
            expected,
            actual,
        })
    }
}

/// Bottom-track section (ID 0x0600), per-beam arrays
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Pd0BottomTrack {
    pub coordinate: Pd0Coordinate,
    pub pings_per_ensemble: u16,
    /// Range to bottom, cm
    pub range_cm: Vec<u32>,
    /// Bottom velocity, mm/s
    pub velocity_mm_s: Vec<i16>,
    /// Correlation magnitude, counts 0-255
    pub correlation: Vec<u8>,
    /// Evaluation amplitude, counts
    pub amplitude: Vec<u8>,
    /// Percent good
    pub percent_good: Vec<u8>,
}

impl FromPd0<Pd0BottomTrack> for Record {
    fn from_pd0(src: &Pd0BottomTrack) -> CodecResult<Self> {
        let beams = src.range_cm.len();
        for (name, len) in [
            ("BT velocity", src.velocity_mm_s.len()),
            ("BT correlation", src.correlation.len()),
            ("BT amplitude", src.amplitude.len()),
            ("BT percent good", src.percent_good.len()),
        ] {
            check_beams(name, beams, len)?;
        }

        let good_key = match src.coordinate {
            Pd0Coordinate::Beam => "BeamGood",
            Pd0Coordinate::Instrument | Pd0Coordinate::Ship => "InstrumentGood",
            Pd0Coordinate::Earth => "EarthGood",
        };
        Record::builder(DataSetKind::BottomTrack)
            .beams(beams)
            .scalar("ActualPingCount", f32::from(src.pings_per_ensemble))
            .array("Range", src.range_cm.iter().map(|&cm| cm as f32 / 100.0))
            .array(
                src.coordinate.bottom_track_key(),
                src.velocity_mm_s.iter().map(|&v| velocity(v)),
            )
            .array(
                "Correlation",
                src.correlation.iter().map(|&c| f32::from(c) / 255.0),
            )
            .array("Amplitude", src.amplitude.iter().map(|&a| f32::from(a)))
            .array(good_key, src.percent_good.iter().map(|&p| f32::from(p)))
            .build()
    }
}

/// Velocity section (ID 0x0100), `cells[bin][beam]` in mm/s
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Pd0Velocity {
    pub coordinate: Pd0Coordinate,
    pub cells: Vec<Vec<i16>>,
}

impl FromPd0<Pd0Velocity> for BeamGrid {
    fn from_pd0(src: &Pd0Velocity) -> CodecResult<Self> {
        let rows: Vec<Vec<f32>> = src
            .cells
            .iter()
            .map(|bin| bin.iter().map(|&v| velocity(v)).collect())
            .collect();
        BeamGrid::from_bin_major(src.coordinate.velocity_kind(), &rows)
    }
}

/// Correlation section (ID 0x0200), `cells[bin][beam]` counts 0-255
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Pd0Correlation {
    pub cells: Vec<Vec<u8>>,
}

impl FromPd0<Pd0Correlation> for BeamGrid {
    fn from_pd0(src: &Pd0Correlation) -> CodecResult<Self> {
        let rows: Vec<Vec<f32>> = src
            .cells
            .iter()
            .map(|bin| bin.iter().map(|&c| f32::from(c) / 255.0).collect())
            .collect();
        BeamGrid::from_bin_major(DataSetKind::Correlation, &rows)
    }
}

/// Echo intensity section (ID 0x0300), `cells[bin][beam]` counts
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Pd0EchoIntensity {
    pub cells: Vec<Vec<u8>>,
}

impl FromPd0<Pd0EchoIntensity> for BeamGrid {
    fn from_pd0(src: &Pd0EchoIntensity) -> CodecResult<Self> {
        let rows: Vec<Vec<f32>> = src
            .cells
            .iter()
            .map(|bin| bin.iter().map(|&a| f32::from(a)).collect())
            .collect();
        BeamGrid::from_bin_major(DataSetKind::Amplitude, &rows)
    }
}

/// Variable leader (ID 0x0080)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Pd0VariableLeader {
    pub ensemble_number: u16,
    pub ensemble_number_msb: u8,
    /// RTC, two-digit year
    pub rtc_year: u8,
    pub rtc_month: u8,
    pub rtc_day: u8,
    pub rtc_hour: u8,
    pub rtc_minute: u8,
    pub rtc_second: u8,
    pub rtc_hundredths: u8,
    /// m/s
    pub speed_of_sound: u16,
    /// Decimetres
    pub depth_of_transducer: u16,
    /// 0.01 degree
    pub heading: u16,
    /// 0.01 degree
    pub pitch: i16,
    /// 0.01 degree
    pub roll: i16,
    /// ppt
    pub salinity: u16,
    /// 0.01 degree C
    pub temperature: i16,
    /// Decapascal
    pub pressure: u32,
}

impl Pd0VariableLeader {
    /// Full 24-bit ensemble number
    pub fn full_ensemble_number(&self) -> i32 {
        (i32::from(self.ensemble_number_msb) << 16) | i32::from(self.ensemble_number)
    }
}

impl FromPd0<Pd0VariableLeader> for Record {
    /// Ancillary dataset
    fn from_pd0(src: &Pd0VariableLeader) -> CodecResult<Self> {
        Record::builder(DataSetKind::Ancillary)
            .scalar("Heading", f32::from(src.heading) / 100.0)
            .scalar("Pitch", f32::from(src.pitch) / 100.0)
            .scalar("Roll", f32::from(src.roll) / 100.0)
            .scalar("WaterTemp", f32::from(src.temperature) / 100.0)
            .scalar("Salinity", f32::from(src.salinity))
            .scalar("Pressure", src.pressure as f32 * 10.0)
            .scalar("TransducerDepth", f32::from(src.depth_of_transducer) / 10.0)
            .scalar("SpeedOfSound", f32::from(src.speed_of_sound))
            .build()
    }
}

/// Ensemble dataset from the variable leader and profile dimensions
pub fn ensemble_record_from_pd0(
    src: &Pd0VariableLeader,
    num_bins: usize,
    num_beams: usize,
) -> CodecResult<Record> {
    let dim = |n: usize, name: &str| {
        i32::try_from(n).map_err(|_| CodecError::FieldShape {
            field: name.to_string(),
            expected: i32::MAX as usize,
            actual: n,
        })
    };
    Record::builder(DataSetKind::Ensemble)
        .scalar("EnsembleNumber", src.full_ensemble_number())
        .scalar("NumBins", dim(num_bins, "NumBins")?)
        .scalar("NumBeams", dim(num_beams, "NumBeams")?)
        .scalar("Year", 2000 + i32::from(src.rtc_year))
        .scalar("Month", i32::from(src.rtc_month))
        .scalar("Day", i32::from(src.rtc_day))
        .scalar("Hour", i32::from(src.rtc_hour))
        .scalar("Minute", i32::from(src.rtc_minute))
        .scalar("Second", i32::from(src.rtc_second))
        .scalar("HSec", i32::from(src.rtc_hundredths))
        .build()
}
