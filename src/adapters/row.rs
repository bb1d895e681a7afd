//! Named-column rows (database and CSV exports)
//!
//! Scalars map to a column named after the field key. Array element `i`
//! maps to `Key{i}`, e.g. `Range0`..`Range3`. Missing columns read as zero.

use std::collections::{BTreeMap, HashMap};

use crate::common::CodecResult;
use crate::dataset::{DataSetKind, FieldShape, FieldType, Record, Value};

/// Read access to one row of named numeric columns
pub trait DataRow {
    fn value(&self, column: &str) -> Option<f64>;
}

impl DataRow for HashMap<String, f64> {
    fn value(&self, column: &str) -> Option<f64> {
        self.get(column).copied()
    }
}

impl DataRow for BTreeMap<String, f64> {
    fn value(&self, column: &str) -> Option<f64> {
        self.get(column).copied()
    }
}

fn column_value(ty: FieldType, v: f64) -> Value {
    match ty {
        FieldType::Float => Value::Float(v as f32),
        FieldType::Int => Value::Int(v as i32),
    }
}

fn column_name(key: &str, shape: FieldShape, i: usize) -> String {
    match shape {
        FieldShape::Scalar => key.to_string(),
        FieldShape::Fixed(_) | FieldShape::PerBeam => format!("{}{}", key, i),
    }
}

impl Record {
    /// Build a record of `kind` with `beams` beams from a row.
    ///
    /// The beam-count field is derived from `beams`, not read from the row.
    pub fn from_row(kind: DataSetKind, beams: usize, row: &impl DataRow) -> CodecResult<Record> {
        let mut builder = Record::builder(kind);
        let Some(schema) = kind.schema() else {
            // Let the builder report the non-record kind
            return builder.build();
        };
        if schema.has_beams() {
            builder = builder.beams(beams);
        }
        for slot in schema.layout(if schema.has_beams() { beams } else { 0 }) {
            if Some(slot.spec.key) == schema.beam_field {
                continue;
            }
            let vals: Vec<Value> = (0..slot.len)
                .map(|i| {
                    let column = column_name(slot.spec.key, slot.spec.shape, i);
                    column_value(slot.spec.ty, row.value(&column).unwrap_or(0.0))
                })
                .collect();
            builder = match slot.spec.shape {
                FieldShape::Scalar => builder.scalar(slot.spec.key, vals[0]),
                _ => builder.array(slot.spec.key, vals),
            };
        }
        builder.build()
    }

    /// Row columns for this record, in schema order
    pub fn to_row(&self) -> Vec<(String, f64)> {
        let mut columns = Vec::with_capacity(self.words().len());
        for slot in self.schema().layout(self.num_beams()) {
            for i in 0..slot.len {
                let value = self.words()[slot.word + i];
                let v = match value {
                    Value::Float(f) => f64::from(f),
                    Value::Int(n) => f64::from(n),
                };
                columns.push((column_name(slot.spec.key, slot.spec.shape, i), v));
            }
        }
        columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bottom_track_from_row() {
        let mut row = HashMap::new();
        row.insert("Heading".to_string(), 12.5);
        row.insert("Range0".to_string(), 10.1);
        row.insert("Range3".to_string(), 10.4);
        row.insert("NumBeams".to_string(), 99.0);
        let bt = Record::from_row(DataSetKind::BottomTrack, 4, &row).unwrap();
        assert_eq!(bt.get_f32("Heading"), Some(12.5));
        assert_eq!(bt.get_f32("NumBeams"), Some(4.0));
        assert_eq!(bt.array_f32("Range"), Some(vec![10.1, 0.0, 0.0, 10.4]));
    }

    #[test]
    fn test_int_columns_keep_precision() {
        let mut row = BTreeMap::new();
        row.insert("EnsembleNumber".to_string(), 16_777_217.0);
        row.insert("SerialNumber7".to_string(), 9.0);
        let ens = Record::from_row(DataSetKind::Ensemble, 0, &row).unwrap();
        assert_eq!(ens.get_i32("EnsembleNumber"), Some(16_777_217));
        assert_eq!(ens.array_i32("SerialNumber").unwrap()[7], 9);
    }

    #[test]
    fn test_row_round_trip() {
        let rt = Record::builder(DataSetKind::RangeTracking)
            .array("Range", [1.5f32, 2.5])
            .array("SNR", [30.0f32, 31.0])
            .build()
            .unwrap();
        let row: HashMap<String, f64> = rt.to_row().into_iter().collect();
        assert_eq!(row["Range1"], 2.5);
        assert_eq!(row["NumBeams"], 2.0);
        let back = Record::from_row(DataSetKind::RangeTracking, 2, &row).unwrap();
        assert_eq!(back, rt);
    }

    #[test]
    fn test_grid_kind_rejected() {
        let row: HashMap<String, f64> = HashMap::new();
        assert!(Record::from_row(DataSetKind::Amplitude, 4, &row).is_err());
    }
}
