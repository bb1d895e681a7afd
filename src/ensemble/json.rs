//! Ensemble JSON document
//!
//! ```json
//! {
//!   "EnsembleNumber": 42,
//!   "IsBeamVelocityAvail": false,
//!   "IsBottomTrackAvail": true,
//!   "BottomTrackData": { "ValueType": 10, "Heading": 12.5, ... }
//! }
//! ```
//!
//! Every kind gets an `Is*Avail` flag; only available datasets get a
//! `*Data` object.

use serde_json::{Map, Value as Json};

use crate::common::{CodecError, CodecResult};
use crate::dataset::{json as dataset_json, DataSetKind};

use super::Ensemble;

const ENSEMBLE_NUMBER: &str = "EnsembleNumber";

/// Ensemble as a JSON object
pub fn to_json(ensemble: &Ensemble) -> Json {
    let mut obj = Map::new();
    obj.insert(ENSEMBLE_NUMBER.into(), Json::from(ensemble.ensemble_number()));
    for kind in DataSetKind::ALL {
        obj.insert(kind.avail_key(), Json::Bool(ensemble.is_available(kind)));
    }
    for data_set in ensemble.data_sets() {
        obj.insert(
            data_set.kind().json_key().into(),
            dataset_json::to_json(data_set),
        );
    }
    Json::Object(obj)
}

/// Rebuild an ensemble from its JSON object.
///
/// A dataset is read when its `Is*Avail` flag is true, or when the flag is
/// absent and its `*Data` object is present.
pub fn from_json(value: &Json) -> CodecResult<Ensemble> {
    let obj = value
        .as_object()
        .ok_or_else(|| CodecError::invalid_json("ensemble is not an object"))?;
    let number = obj
        .get(ENSEMBLE_NUMBER)
        .and_then(Json::as_i64)
        .and_then(|n| i32::try_from(n).ok())
        .ok_or_else(|| CodecError::invalid_json("EnsembleNumber missing or not an int32"))?;

    let mut ensemble = Ensemble::new(number);
    for kind in DataSetKind::ALL {
        let data = obj.get(kind.json_key());
        let avail = match obj.get(&kind.avail_key()) {
            Some(flag) => flag.as_bool().ok_or_else(|| {
                CodecError::invalid_json(format!("{} is not a boolean", kind.avail_key()))
            })?,
            None => data.is_some(),
        };
        if !avail {
            continue;
        }
        let data = data.ok_or_else(|| {
            CodecError::invalid_json(format!("{} flagged available but missing", kind.json_key()))
        })?;
        ensemble.add_data_set(dataset_json::from_json(kind, data)?);
    }
    Ok(ensemble)
}

impl Ensemble {
    /// Serialize to a JSON string
    pub fn to_json_string(&self, pretty: bool) -> CodecResult<String> {
        let json = to_json(self);
        let s = if pretty {
            serde_json::to_string_pretty(&json)?
        } else {
            serde_json::to_string(&json)?
        };
        Ok(s)
    }

    /// Parse from a JSON string
    pub fn from_json_str(s: &str) -> CodecResult<Self> {
        let json: Json = serde_json::from_str(s)?;
        from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{BeamGrid, NmeaData, Record};
    use serde_json::json;

    fn sample() -> Ensemble {
        Ensemble::new(42)
            .with(
                Record::builder(DataSetKind::BottomTrack)
                    .scalar("Heading", 12.5f32)
                    .array("Range", [10.1f32, 10.2, 10.3, 10.4])
                    .build()
                    .unwrap(),
            )
            .with(
                BeamGrid::from_fn(DataSetKind::BeamVelocity, 4, 4, |bin, beam| {
                    bin as f32 * 0.1 - beam as f32
                })
                .unwrap(),
            )
            .with(NmeaData::new("$GPHDT,1.0,T*1C\r\n").unwrap())
    }

    #[test]
    fn test_flags_and_keys() {
        let json = to_json(&sample());
        assert_eq!(json["EnsembleNumber"], json!(42));
        assert_eq!(json["IsBottomTrackAvail"], json!(true));
        assert_eq!(json["IsAmplitudeAvail"], json!(false));
        assert!(json.get("AmplitudeData").is_none());
        assert_eq!(json["BottomTrackData"]["Heading"], json!(12.5));
    }

    #[test]
    fn test_string_round_trip() {
        let ens = sample();
        for pretty in [false, true] {
            let s = ens.to_json_string(pretty).unwrap();
            assert_eq!(Ensemble::from_json_str(&s).unwrap(), ens);
        }
    }

    #[test]
    fn test_avail_false_ignores_data() {
        let mut json = to_json(&sample());
        json["IsBottomTrackAvail"] = json!(false);
        let ens = from_json(&json).unwrap();
        assert!(!ens.is_available(DataSetKind::BottomTrack));
        assert!(ens.is_available(DataSetKind::Nmea));
    }

    #[test]
    fn test_flag_without_data_rejected() {
        let json = json!({ "EnsembleNumber": 1, "IsAncillaryAvail": true });
        assert!(from_json(&json).is_err());
        assert!(from_json(&json!({ "IsAncillaryAvail": false })).is_err());
    }
}
