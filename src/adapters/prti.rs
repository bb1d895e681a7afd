//! DVL-mode PRTI01 / PRTI02 sentences
//!
//! The sentences themselves are parsed elsewhere; these types hold the
//! already-split integer fields in instrument units and convert them into
//! native datasets. PRTI01 reports velocities in instrument coordinates
//! (X, Y, Z, Q), PRTI02 in earth coordinates (East, North, Up, Q).

use serde::{Deserialize, Serialize};

use crate::common::{CodecResult, BAD_VELOCITY, DEFAULT_NUM_BEAMS_BEAM};
use crate::dataset::{DataSetKind, Record};
use crate::ensemble::Ensemble;

/// Sentence ID of the instrument-coordinate sentence
pub const PRTI01_ID: &str = "PRTI01";
/// Sentence ID of the earth-coordinate sentence
pub const PRTI02_ID: &str = "PRTI02";

/// Velocity field value meaning "no measurement"
pub const PRTI_BAD_VELOCITY: i32 = -32768;

/// mm/s to m/s, mapping the bad-velocity marker
fn velocity(mm_s: i32) -> f32 {
    if mm_s == PRTI_BAD_VELOCITY {
        BAD_VELOCITY
    } else {
        mm_s as f32 / 1000.0
    }
}

fn metres(mm: i32) -> f32 {
    mm as f32 / 1000.0
}

fn hundredths(v: i32) -> f32 {
    v as f32 / 100.0
}

/// Fields shared by both sentence types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PrtiFields {
    /// Time since start of ping, hundredths of a second
    pub start_time: i32,
    pub sample_number: i32,
    /// Water temperature, hundredths of a degree C
    pub temperature: i32,
    /// Bottom-track velocity, mm/s (X/Y/Z/Q or E/N/U/Q)
    pub bottom_track_velocity: [i32; 4],
    /// Depth to bottom, mm
    pub bottom_depth: i32,
    /// Water-mass velocity, mm/s
    pub water_mass_velocity: [i32; 4],
    /// Depth of the water-mass layer, mm
    pub water_mass_depth: i32,
    /// Instrument status bits
    pub status: u32,
}

/// Instrument-coordinate sentence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Prti01Sentence {
    #[serde(flatten)]
    pub fields: PrtiFields,
}

/// Earth-coordinate sentence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Prti02Sentence {
    #[serde(flatten)]
    pub fields: PrtiFields,
}

fn bottom_track(fields: &PrtiFields, velocity_key: &str) -> CodecResult<Record> {
    let time = hundredths(fields.start_time);
    let depth = metres(fields.bottom_depth);
    Record::builder(DataSetKind::BottomTrack)
        .beams(DEFAULT_NUM_BEAMS_BEAM)
        .scalar("FirstPingTime", time)
        .scalar("LastPingTime", time)
        .scalar("WaterTemp", hundredths(fields.temperature))
        .scalar("Status", fields.status as f32)
        .array("Range", [depth; DEFAULT_NUM_BEAMS_BEAM])
        .array(velocity_key, fields.bottom_track_velocity.map(velocity))
        .build()
}

/// Bottom Track with instrument velocities and the bottom depth on every beam
pub fn bottom_track_from_prti01(s: &Prti01Sentence) -> CodecResult<Record> {
    bottom_track(&s.fields, "InstrumentVelocity")
}

/// Bottom Track with earth velocities and the bottom depth on every beam
pub fn bottom_track_from_prti02(s: &Prti02Sentence) -> CodecResult<Record> {
    bottom_track(&s.fields, "EarthVelocity")
}

pub fn instrument_water_mass_from_prti01(s: &Prti01Sentence) -> CodecResult<Record> {
    let [x, y, z, q] = s.fields.water_mass_velocity.map(velocity);
    Record::builder(DataSetKind::InstrumentWaterMass)
        .scalar("VelocityX", x)
        .scalar("VelocityY", y)
        .scalar("VelocityZ", z)
        .scalar("VelocityQ", q)
        .scalar("WaterMassDepthLayer", metres(s.fields.water_mass_depth))
        .build()
}

/// Earth water mass; the Q component has no earth-frame field and is dropped
pub fn earth_water_mass_from_prti02(s: &Prti02Sentence) -> CodecResult<Record> {
    let [east, north, up, _] = s.fields.water_mass_velocity.map(velocity);
    Record::builder(DataSetKind::EarthWaterMass)
        .scalar("VelocityEast", east)
        .scalar("VelocityNorth", north)
        .scalar("VelocityVertical", up)
        .scalar("WaterMassDepthLayer", metres(s.fields.water_mass_depth))
        .build()
}

fn ensemble_record(fields: &PrtiFields) -> CodecResult<Record> {
    Record::builder(DataSetKind::Ensemble)
        .scalar("EnsembleNumber", fields.sample_number)
        .scalar("NumBeams", DEFAULT_NUM_BEAMS_BEAM as i32)
        .scalar("Status", fields.status as i32)
        .build()
}

/// Whole ensemble for one PRTI01 sentence
pub fn ensemble_from_prti01(s: &Prti01Sentence) -> CodecResult<Ensemble> {
    Ok(Ensemble::new(s.fields.sample_number)
        .with(ensemble_record(&s.fields)?)
        .with(bottom_track_from_prti01(s)?)
        .with(instrument_water_mass_from_prti01(s)?))
}

/// Whole ensemble for one PRTI02 sentence
pub fn ensemble_from_prti02(s: &Prti02Sentence) -> CodecResult<Ensemble> {
    Ok(Ensemble::new(s.fields.sample_number)
        .with(ensemble_record(&s.fields)?)
        .with(bottom_track_from_prti02(s)?)
        .with(earth_water_mass_from_prti02(s)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> PrtiFields {
        PrtiFields {
            start_time: 123_456,
            sample_number: 1001,
            temperature: 1_525,
            bottom_track_velocity: [250, -100, PRTI_BAD_VELOCITY, 5],
            bottom_depth: 20_500,
            water_mass_velocity: [1_000, 2_000, -3_000, 0],
            water_mass_depth: 4_000,
            status: 0x0004,
        }
    }

    #[test]
    fn test_bottom_track_prti01() {
        let bt = bottom_track_from_prti01(&Prti01Sentence { fields: fields() }).unwrap();
        assert_eq!(bt.get_f32("FirstPingTime"), Some(1234.56));
        assert_eq!(bt.get_f32("WaterTemp"), Some(15.25));
        assert_eq!(bt.get_f32("Status"), Some(4.0));
        assert_eq!(bt.array_f32("Range"), Some(vec![20.5; 4]));
        assert_eq!(
            bt.array_f32("InstrumentVelocity"),
            Some(vec![0.25, -0.1, BAD_VELOCITY, 0.005])
        );
        assert_eq!(bt.array_f32("EarthVelocity"), Some(vec![0.0; 4]));
    }

    #[test]
    fn test_bottom_track_prti02_uses_earth_frame() {
        let bt = bottom_track_from_prti02(&Prti02Sentence { fields: fields() }).unwrap();
        assert_eq!(bt.array_f32("EarthVelocity").unwrap()[0], 0.25);
        assert_eq!(bt.array_f32("InstrumentVelocity"), Some(vec![0.0; 4]));
    }

    #[test]
    fn test_water_mass() {
        let iwm = instrument_water_mass_from_prti01(&Prti01Sentence { fields: fields() }).unwrap();
        assert_eq!(iwm.get_f32("VelocityZ"), Some(-3.0));
        assert_eq!(iwm.get_f32("WaterMassDepthLayer"), Some(4.0));

        let ewm = earth_water_mass_from_prti02(&Prti02Sentence { fields: fields() }).unwrap();
        assert_eq!(ewm.get_f32("VelocityNorth"), Some(2.0));
    }

    #[test]
    fn test_ensemble_from_prti01_encodes() {
        let ens = ensemble_from_prti01(&Prti01Sentence { fields: fields() }).unwrap();
        assert_eq!(ens.ensemble_number(), 1001);
        assert_eq!(ens.len(), 3);
        let decoded = Ensemble::decode(&ens.encode().unwrap()).unwrap();
        assert!(decoded.is_valid());
        assert_eq!(decoded.ensemble, ens);
    }

    #[test]
    fn test_ids() {
        assert_eq!(PRTI01_ID.len(), 6);
        assert_eq!(PRTI02_ID, "PRTI02");
    }
}
