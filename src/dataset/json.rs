//! JSON projection of datasets
//!
//! Every dataset object starts with its header keys (`ValueType`,
//! `NumElements`, `ElementsMultiplier`, `Imag`, `NameLength`, `Name`).
//! Record fields follow under their schema keys, so no per-type key list
//! exists outside [`super::schema`]. Grids store their cells under `Data`
//! as `[bin][beam]` rows and NMEA text is stored under `NmeaData`.
//!
//! On input the header is rebuilt from the content. `Imag` is carried over
//! for every dataset. Records also take `ValueType` and `ElementsMultiplier`
//! back, so a decoded record with a non-canonical header re-encodes to the
//! same bytes. Grids take `ElementsMultiplier` only when they have no bins;
//! otherwise the rows give the beam count.

use serde_json::{json, Map, Value as Json};

use crate::common::{CodecError, CodecResult};

use super::grid::BeamGrid;
use super::kind::{DataSetKind, Layout};
use super::nmea::NmeaData;
use super::record::Record;
use super::schema::{FieldShape, FieldType};
use super::value::Value;
use super::DataSet;

mod keys {
    pub const VALUE_TYPE: &str = "ValueType";
    pub const NUM_ELEMENTS: &str = "NumElements";
    pub const ELEMENTS_MULTIPLIER: &str = "ElementsMultiplier";
    pub const IMAG: &str = "Imag";
    pub const NAME_LENGTH: &str = "NameLength";
    pub const NAME: &str = "Name";
    pub const GRID_DATA: &str = "Data";
    pub const NMEA_DATA: &str = "NmeaData";
    pub const TRAILING: &str = "TrailingWords";
}

/// Dataset as a JSON object
pub fn to_json(ds: &DataSet) -> Json {
    let header = ds.header();
    let mut obj = Map::new();
    obj.insert(keys::VALUE_TYPE.into(), json!(header.value_type_tag()));
    obj.insert(keys::NUM_ELEMENTS.into(), json!(header.num_elements()));
    obj.insert(
        keys::ELEMENTS_MULTIPLIER.into(),
        json!(header.elements_multiplier()),
    );
    obj.insert(keys::IMAG.into(), json!(header.imag()));
    obj.insert(keys::NAME_LENGTH.into(), json!(header.name_length()));
    obj.insert(keys::NAME.into(), json!(header.name()));

    match ds {
        DataSet::Record(r) => {
            for slot in r.schema().layout(r.num_beams()) {
                let vals = &r.words()[slot.word..slot.word + slot.len];
                let v = match slot.spec.shape {
                    FieldShape::Scalar => vals[0].to_json(),
                    _ => Json::Array(vals.iter().map(|v| v.to_json()).collect()),
                };
                obj.insert(slot.spec.key.into(), v);
            }
            if !r.trailing_words().is_empty() {
                obj.insert(keys::TRAILING.into(), json!(r.trailing_words()));
            }
        }
        DataSet::Grid(g) => {
            let rows: Vec<Json> = (0..g.num_bins())
                .map(|bin| {
                    Json::Array(
                        (0..g.num_beams())
                            .filter_map(|beam| g.get(bin, beam))
                            .map(Value::to_json)
                            .collect(),
                    )
                })
                .collect();
            obj.insert(keys::GRID_DATA.into(), Json::Array(rows));
        }
        DataSet::Nmea(n) => {
            obj.insert(keys::NMEA_DATA.into(), json!(n.text()));
        }
    }
    Json::Object(obj)
}

/// Rebuild a dataset of `kind` from its JSON object
pub fn from_json(kind: DataSetKind, value: &Json) -> CodecResult<DataSet> {
    let obj = value
        .as_object()
        .ok_or_else(|| CodecError::invalid_json(format!("{} is not an object", kind)))?;
    match kind.layout() {
        Layout::Record => record_from_json(kind, obj).map(DataSet::Record),
        Layout::Grid => grid_from_json(kind, obj).map(DataSet::Grid),
        Layout::Bytes => {
            let text = obj
                .get(keys::NMEA_DATA)
                .and_then(Json::as_str)
                .ok_or_else(|| CodecError::invalid_json("NmeaData missing or not a string"))?;
            Ok(DataSet::Nmea(NmeaData::new(text)?))
        }
    }
}

fn imag(obj: &Map<String, Json>) -> CodecResult<i32> {
    match obj.get(keys::IMAG) {
        None => Ok(0),
        Some(v) => v
            .as_i64()
            .and_then(|i| i32::try_from(i).ok())
            .ok_or_else(|| CodecError::invalid_json("Imag is not an int32")),
    }
}

fn number(ty: FieldType, key: &str, v: &Json) -> CodecResult<Value> {
    Value::from_json(ty, v)
        .ok_or_else(|| CodecError::invalid_json(format!("{} is not a valid number", key)))
}

fn record_from_json(kind: DataSetKind, obj: &Map<String, Json>) -> CodecResult<Record> {
    let schema = kind.schema().ok_or_else(|| CodecError::UnknownDataSet {
        name: kind.id().to_string(),
    })?;
    let mut builder = Record::builder(kind).imag(imag(obj)?);

    for spec in schema.fields {
        let Some(v) = obj.get(spec.key) else {
            continue;
        };
        builder = match spec.shape {
            FieldShape::Scalar => builder.scalar(spec.key, number(spec.ty, spec.key, v)?),
            FieldShape::Fixed(_) | FieldShape::PerBeam => {
                let items = v.as_array().ok_or_else(|| {
                    CodecError::invalid_json(format!("{} is not an array", spec.key))
                })?;
                let vals = items
                    .iter()
                    .map(|item| number(spec.ty, spec.key, item))
                    .collect::<CodecResult<Vec<_>>>()?;
                builder.array(spec.key, vals)
            }
        };
    }

    if let Some(v) = obj.get(keys::TRAILING) {
        let words = v
            .as_array()
            .and_then(|items| {
                items
                    .iter()
                    .map(|w| w.as_u64().and_then(|w| u32::try_from(w).ok()))
                    .collect::<Option<Vec<u32>>>()
            })
            .ok_or_else(|| CodecError::invalid_json("TrailingWords must be uint32 values"))?;
        builder = builder.trailing_words(words);
    }
    let record = builder.build()?;

    let tag = obj
        .get(keys::VALUE_TYPE)
        .map(|v| {
            v.as_i64()
                .and_then(|t| i32::try_from(t).ok())
                .ok_or_else(|| CodecError::invalid_json("ValueType is not an int32"))
        })
        .transpose()?;
    let multiplier = obj
        .get(keys::ELEMENTS_MULTIPLIER)
        .map(|v| {
            v.as_u64()
                .and_then(|m| usize::try_from(m).ok())
                .ok_or_else(|| CodecError::invalid_json("ElementsMultiplier is not a count"))
        })
        .transpose()?;
    if tag.is_none() && multiplier.is_none() {
        return Ok(record);
    }
    let tag = tag.unwrap_or_else(|| record.header().value_type_tag());
    let multiplier = multiplier.unwrap_or_else(|| record.header().elements_multiplier());
    record.with_wire_layout(tag, multiplier)
}

fn grid_from_json(kind: DataSetKind, obj: &Map<String, Json>) -> CodecResult<BeamGrid> {
    let ty = FieldType::from_value_type(kind.value_type());
    let rows = obj
        .get(keys::GRID_DATA)
        .and_then(Json::as_array)
        .ok_or_else(|| CodecError::invalid_json(format!("{}: Data missing", kind)))?;

    let declared_beams = obj
        .get(keys::ELEMENTS_MULTIPLIER)
        .and_then(Json::as_u64)
        .map(|b| b as usize);
    let beams = match rows.first() {
        Some(row) => row.as_array().map(Vec::len).unwrap_or(0),
        None => declared_beams.unwrap_or(crate::common::DEFAULT_NUM_BEAMS_BEAM),
    };

    let mut cells = vec![Value::zero(ty); rows.len() * beams];
    for (bin, row) in rows.iter().enumerate() {
        let row = row
            .as_array()
            .ok_or_else(|| CodecError::invalid_json(format!("{}: row {} is not an array", kind, bin)))?;
        if row.len() != beams {
            return Err(CodecError::FieldShape {
                field: kind.id().to_string(),
                expected: beams,
                actual: row.len(),
            });
        }
        for (beam, v) in row.iter().enumerate() {
            cells[beam * rows.len() + bin] = number(ty, keys::GRID_DATA, v)?;
        }
    }
    let grid = BeamGrid::from_beam_major(kind, rows.len(), beams, cells)?;
    Ok(grid.with_imag(imag(obj)?))
}
