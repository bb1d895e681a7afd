//! Field schemas for flat (scalar/array) datasets
//!
//! A flat dataset is an ordered list of 4-byte words. Each schema entry is a
//! scalar, a fixed-length array or a per-beam array; per-beam arrays are
//! unrolled beam 0..n in place. Word `k` of the payload lives at
//! `header_size(NameLength) + k * 4`. The same layout drives decode, encode,
//! JSON keys and database column names.

use crate::common::{ValueType, MAX_BEAMS};

/// Storage type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Float,
    Int,
}

impl FieldType {
    pub fn from_value_type(vt: ValueType) -> Self {
        match vt {
            ValueType::Int => Self::Int,
            ValueType::Float | ValueType::Byte => Self::Float,
        }
    }
}

/// How many words a field occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldShape {
    /// One word
    Scalar,
    /// A fixed number of words regardless of beam count
    Fixed(usize),
    /// One word per beam
    PerBeam,
}

/// One named field of a flat dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Field name, also used as JSON key and row column prefix
    pub key: &'static str,
    pub ty: FieldType,
    pub shape: FieldShape,
}

impl FieldSpec {
    /// Words taken by this field for a given beam count
    pub fn words(&self, beams: usize) -> usize {
        match self.shape {
            FieldShape::Scalar => 1,
            FieldShape::Fixed(n) => n,
            FieldShape::PerBeam => beams,
        }
    }
}

const fn float(key: &'static str) -> FieldSpec {
    FieldSpec {
        key,
        ty: FieldType::Float,
        shape: FieldShape::Scalar,
    }
}

const fn float_beams(key: &'static str) -> FieldSpec {
    FieldSpec {
        key,
        ty: FieldType::Float,
        shape: FieldShape::PerBeam,
    }
}

const fn int(key: &'static str) -> FieldSpec {
    FieldSpec {
        key,
        ty: FieldType::Int,
        shape: FieldShape::Scalar,
    }
}

const fn int_fixed(key: &'static str, n: usize) -> FieldSpec {
    FieldSpec {
        key,
        ty: FieldType::Int,
        shape: FieldShape::Fixed(n),
    }
}

/// Position of a field within a laid-out record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSlot {
    pub spec: FieldSpec,
    /// Index of the field's first word in the payload
    pub word: usize,
    /// Number of words
    pub len: usize,
}

/// Ordered field list of one flat dataset type
#[derive(Debug, PartialEq)]
pub struct RecordSchema {
    pub value_type: ValueType,
    pub fields: &'static [FieldSpec],
    /// Scalar field that mirrors the beam count, if any
    pub beam_field: Option<&'static str>,
}

impl RecordSchema {
    /// Words that do not depend on the beam count
    pub fn scalar_words(&self) -> usize {
        self.fields
            .iter()
            .filter(|f| f.shape != FieldShape::PerBeam)
            .map(|f| f.words(0))
            .sum()
    }

    /// Number of per-beam arrays
    pub fn per_beam_arrays(&self) -> usize {
        self.fields
            .iter()
            .filter(|f| f.shape == FieldShape::PerBeam)
            .count()
    }

    pub fn has_beams(&self) -> bool {
        self.per_beam_arrays() > 0
    }

    /// Total payload words for a beam count
    pub fn words(&self, beams: usize) -> usize {
        self.scalar_words() + self.per_beam_arrays() * beams
    }

    /// Beam count implied by a payload of `elements` words.
    ///
    /// Returns `None` if the words do not split into whole beams or the
    /// beam count is outside `1..=MAX_BEAMS`. Schemas without per-beam
    /// arrays report 0 beams and accept any payload at least as long as
    /// their scalar words.
    pub fn beams_for(&self, elements: usize) -> Option<usize> {
        let scalars = self.scalar_words();
        let arrays = self.per_beam_arrays();
        if arrays == 0 {
            return (elements >= scalars).then_some(0);
        }
        let rest = elements.checked_sub(scalars)?;
        if rest % arrays != 0 {
            return None;
        }
        let beams = rest / arrays;
        (1..=MAX_BEAMS).contains(&beams).then_some(beams)
    }

    /// Lay out every field for a beam count
    pub fn layout(&self, beams: usize) -> impl Iterator<Item = FieldSlot> + '_ {
        let mut word = 0;
        self.fields.iter().map(move |spec| {
            let len = spec.words(beams);
            let slot = FieldSlot {
                spec: *spec,
                word,
                len,
            };
            word += len;
            slot
        })
    }

    /// Find a field's slot by key
    pub fn slot(&self, key: &str, beams: usize) -> Option<FieldSlot> {
        self.layout(beams).find(|s| s.spec.key == key)
    }
}

pub static BOTTOM_TRACK: RecordSchema = RecordSchema {
    value_type: ValueType::Float,
    fields: &[
        float("FirstPingTime"),
        float("LastPingTime"),
        float("Heading"),
        float("Pitch"),
        float("Roll"),
        float("WaterTemp"),
        float("SystemTemp"),
        float("Salinity"),
        float("Pressure"),
        float("TransducerDepth"),
        float("SpeedOfSound"),
        float("Status"),
        float("NumBeams"),
        float("ActualPingCount"),
        float_beams("Range"),
        float_beams("SNR"),
        float_beams("Amplitude"),
        float_beams("Correlation"),
        float_beams("BeamVelocity"),
        float_beams("BeamGood"),
        float_beams("InstrumentVelocity"),
        float_beams("InstrumentGood"),
        float_beams("EarthVelocity"),
        float_beams("EarthGood"),
    ],
    beam_field: Some("NumBeams"),
};

pub static RANGE_TRACKING: RecordSchema = RecordSchema {
    value_type: ValueType::Float,
    fields: &[
        float("NumBeams"),
        float_beams("SNR"),
        float_beams("Range"),
        float_beams("Pings"),
        float_beams("Amplitude"),
        float_beams("Correlation"),
        float_beams("BeamVelocity"),
        float_beams("InstrumentVelocity"),
        float_beams("EarthVelocity"),
    ],
    beam_field: Some("NumBeams"),
};

pub static ENSEMBLE: RecordSchema = RecordSchema {
    value_type: ValueType::Int,
    fields: &[
        int("EnsembleNumber"),
        int("NumBins"),
        int("NumBeams"),
        int("DesiredPingCount"),
        int("ActualPingCount"),
        int("Status"),
        int("Year"),
        int("Month"),
        int("Day"),
        int("Hour"),
        int("Minute"),
        int("Second"),
        int("HSec"),
        int_fixed("SerialNumber", 8),
        int("Firmware"),
        int("SubsystemConfig"),
        int("Status2"),
    ],
    beam_field: None,
};

pub static ANCILLARY: RecordSchema = RecordSchema {
    value_type: ValueType::Float,
    fields: &[
        float("FirstBinRange"),
        float("BinSize"),
        float("FirstPingTime"),
        float("LastPingTime"),
        float("Heading"),
        float("Pitch"),
        float("Roll"),
        float("WaterTemp"),
        float("SystemTemp"),
        float("Salinity"),
        float("Pressure"),
        float("TransducerDepth"),
        float("SpeedOfSound"),
    ],
    beam_field: None,
};

pub static SYSTEM_SETUP: RecordSchema = RecordSchema {
    value_type: ValueType::Float,
    fields: &[
        float("BtSamplesPerSecond"),
        float("BtSystemFreqHz"),
        float("BtCPCE"),
        float("BtNCE"),
        float("BtRepeatN"),
        float("WpSamplesPerSecond"),
        float("WpSystemFreqHz"),
        float("WpCPCE"),
        float("WpNCE"),
        float("WpRepeatN"),
        float("WpLagSamples"),
        float("Voltage"),
        float("XmtVoltage"),
        float("BtBroadband"),
        float("BtLagLength"),
        float("BtNarrowband"),
        float("BtBeamMux"),
        float("WpBroadband"),
        float("WpLagLength"),
        float("WpTransmitBandwidth"),
        float("WpReceiveBandwidth"),
    ],
    beam_field: None,
};

pub static EARTH_WATER_MASS: RecordSchema = RecordSchema {
    value_type: ValueType::Float,
    fields: &[
        float("VelocityEast"),
        float("VelocityNorth"),
        float("VelocityVertical"),
        float("WaterMassDepthLayer"),
    ],
    beam_field: None,
};

pub static INSTRUMENT_WATER_MASS: RecordSchema = RecordSchema {
    value_type: ValueType::Float,
    fields: &[
        float("VelocityX"),
        float("VelocityY"),
        float("VelocityZ"),
        float("VelocityQ"),
        float("WaterMassDepthLayer"),
    ],
    beam_field: None,
};
