//! Catalogue of known dataset types
//!
//! Variant order is the canonical emission order inside an encoded
//! ensemble. Decode does not depend on it; it dispatches on the name.

use crate::common::ValueType;

use super::schema::{
    RecordSchema, ANCILLARY, BOTTOM_TRACK, EARTH_WATER_MASS, ENSEMBLE, INSTRUMENT_WATER_MASS,
    RANGE_TRACKING, SYSTEM_SETUP,
};

/// Payload addressing mode of a dataset type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Beam-major bin grid: `(bin, beam)` at word `beam * bins + bin`
    Grid,
    /// Sequential scalar/array words described by a [`RecordSchema`]
    Record,
    /// Raw bytes (NMEA text)
    Bytes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DataSetKind {
    BeamVelocity,
    EarthVelocity,
    InstrumentVelocity,
    Amplitude,
    Correlation,
    GoodBeam,
    GoodEarth,
    Ensemble,
    Ancillary,
    BottomTrack,
    Nmea,
    SystemSetup,
    RangeTracking,
    EarthWaterMass,
    InstrumentWaterMass,
}

impl DataSetKind {
    /// Every kind in emission order
    pub const ALL: [DataSetKind; 15] = [
        Self::BeamVelocity,
        Self::EarthVelocity,
        Self::InstrumentVelocity,
        Self::Amplitude,
        Self::Correlation,
        Self::GoodBeam,
        Self::GoodEarth,
        Self::Ensemble,
        Self::Ancillary,
        Self::BottomTrack,
        Self::Nmea,
        Self::SystemSetup,
        Self::RangeTracking,
        Self::EarthWaterMass,
        Self::InstrumentWaterMass,
    ];

    /// Wire name including NUL terminator
    pub fn name(self) -> &'static str {
        match self {
            Self::BeamVelocity => "E000001\0",
            Self::InstrumentVelocity => "E000002\0",
            Self::EarthVelocity => "E000003\0",
            Self::Amplitude => "E000004\0",
            Self::Correlation => "E000005\0",
            Self::GoodBeam => "E000006\0",
            Self::GoodEarth => "E000007\0",
            Self::Ensemble => "E000008\0",
            Self::Ancillary => "E000009\0",
            Self::BottomTrack => "E000010\0",
            Self::Nmea => "E000011\0",
            Self::SystemSetup => "E000014\0",
            Self::RangeTracking => "E000015\0",
            Self::EarthWaterMass => "E000018\0",
            Self::InstrumentWaterMass => "E000019\0",
        }
    }

    /// Name without NUL padding
    pub fn id(self) -> &'static str {
        self.name().trim_end_matches('\0')
    }

    /// Look up a kind by wire name; trailing NULs are ignored
    pub fn from_name(name: &str) -> Option<Self> {
        let id = name.trim_end_matches('\0');
        Self::ALL.into_iter().find(|k| k.id() == id)
    }

    pub fn layout(self) -> Layout {
        match self {
            Self::BeamVelocity
            | Self::EarthVelocity
            | Self::InstrumentVelocity
            | Self::Amplitude
            | Self::Correlation
            | Self::GoodBeam
            | Self::GoodEarth => Layout::Grid,
            Self::Nmea => Layout::Bytes,
            Self::Ensemble
            | Self::Ancillary
            | Self::BottomTrack
            | Self::SystemSetup
            | Self::RangeTracking
            | Self::EarthWaterMass
            | Self::InstrumentWaterMass => Layout::Record,
        }
    }

    /// Value type written when this kind is encoded from scratch
    pub fn value_type(self) -> ValueType {
        match self {
            Self::GoodBeam | Self::GoodEarth => ValueType::Int,
            Self::Nmea => ValueType::Byte,
            _ => match self.schema() {
                Some(schema) => schema.value_type,
                None => ValueType::Float,
            },
        }
    }

    /// Field schema for flat record kinds
    pub fn schema(self) -> Option<&'static RecordSchema> {
        match self {
            Self::Ensemble => Some(&ENSEMBLE),
            Self::Ancillary => Some(&ANCILLARY),
            Self::BottomTrack => Some(&BOTTOM_TRACK),
            Self::SystemSetup => Some(&SYSTEM_SETUP),
            Self::RangeTracking => Some(&RANGE_TRACKING),
            Self::EarthWaterMass => Some(&EARTH_WATER_MASS),
            Self::InstrumentWaterMass => Some(&INSTRUMENT_WATER_MASS),
            _ => None,
        }
    }

    /// Key of this dataset in the ensemble JSON document
    pub fn json_key(self) -> &'static str {
        match self {
            Self::BeamVelocity => "BeamVelocityData",
            Self::EarthVelocity => "EarthVelocityData",
            Self::InstrumentVelocity => "InstrumentVelocityData",
            Self::Amplitude => "AmplitudeData",
            Self::Correlation => "CorrelationData",
            Self::GoodBeam => "GoodBeamData",
            Self::GoodEarth => "GoodEarthData",
            Self::Ensemble => "EnsembleData",
            Self::Ancillary => "AncillaryData",
            Self::BottomTrack => "BottomTrackData",
            Self::Nmea => "NmeaData",
            Self::SystemSetup => "SystemSetupData",
            Self::RangeTracking => "RangeTrackingData",
            Self::EarthWaterMass => "EarthWaterMassData",
            Self::InstrumentWaterMass => "InstrumentWaterMassData",
        }
    }

    /// Availability flag key in the ensemble JSON document
    pub fn avail_key(self) -> String {
        format!("Is{}Avail", self.json_key().trim_end_matches("Data"))
    }
}

impl std::fmt::Display for DataSetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.json_key().trim_end_matches("Data"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_eight_bytes() {
        for kind in DataSetKind::ALL {
            assert_eq!(kind.name().len(), 8, "{:?}", kind);
        }
    }

    #[test]
    fn test_from_name_round_trip() {
        for kind in DataSetKind::ALL {
            assert_eq!(DataSetKind::from_name(kind.name()), Some(kind));
            assert_eq!(DataSetKind::from_name(kind.id()), Some(kind));
        }
        assert_eq!(DataSetKind::from_name("E000099\0"), None);
    }

    #[test]
    fn test_display_ids_have_no_nul() {
        for kind in DataSetKind::ALL {
            assert!(!kind.id().contains('\0'), "{:?}", kind);
            assert_eq!(kind.name(), format!("{}\0", kind.id()));
        }
    }

    #[test]
    fn test_bottom_track_id() {
        assert_eq!(DataSetKind::BottomTrack.name(), "E000010\0");
        assert_eq!(DataSetKind::InstrumentVelocity.id(), "E000002");
        assert_eq!(DataSetKind::EarthVelocity.id(), "E000003");
    }

    #[test]
    fn test_emission_order() {
        let mut sorted = DataSetKind::ALL;
        sorted.sort();
        assert_eq!(sorted, DataSetKind::ALL);
        assert!(DataSetKind::EarthVelocity < DataSetKind::InstrumentVelocity);
        assert!(DataSetKind::Ancillary < DataSetKind::BottomTrack);
        assert!(DataSetKind::BottomTrack < DataSetKind::Nmea);
    }

    #[test]
    fn test_layouts_and_types() {
        assert_eq!(DataSetKind::Amplitude.layout(), Layout::Grid);
        assert_eq!(DataSetKind::Nmea.layout(), Layout::Bytes);
        assert_eq!(DataSetKind::BottomTrack.layout(), Layout::Record);
        assert_eq!(DataSetKind::GoodBeam.value_type(), ValueType::Int);
        assert_eq!(DataSetKind::Ensemble.value_type(), ValueType::Int);
        assert_eq!(DataSetKind::BottomTrack.value_type(), ValueType::Float);
        assert!(DataSetKind::Correlation.schema().is_none());
    }

    #[test]
    fn test_json_keys() {
        assert_eq!(DataSetKind::BottomTrack.json_key(), "BottomTrackData");
        assert_eq!(DataSetKind::BottomTrack.avail_key(), "IsBottomTrackAvail");
        assert_eq!(DataSetKind::Ensemble.avail_key(), "IsEnsembleAvail");
        assert_eq!(DataSetKind::GoodEarth.to_string(), "GoodEarth");
    }
}
