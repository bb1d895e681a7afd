//! Flat fixed-layout datasets (Bottom Track, Ancillary, System Setup, ...)
//!
//! A [`Record`] stores its payload words in wire order, so the same
//! [`RecordSchema`] layout drives both directions: word `k` is read from and
//! written to `block_start + header_size(NameLength) + k * 4`.
//!
//! Records are built through [`RecordBuilder`], which checks that every
//! per-beam array has exactly one value per beam. After `build()` a record
//! is read-only; use [`Record::to_builder`] to derive a modified copy.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};

use crate::codec::field::{read_u32, write_u32};
use crate::codec::DataSetHeader;
use crate::common::framing::BYTES_IN_WORD;
use crate::common::{CodecError, CodecResult, ValueType, DEFAULT_NUM_BEAMS_BEAM, MAX_BEAMS};

use super::kind::DataSetKind;
use super::schema::{FieldShape, RecordSchema};
use super::value::Value;

/// A decoded or constructed flat dataset
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    kind: DataSetKind,
    schema: &'static RecordSchema,
    header: DataSetHeader,
    num_beams: usize,
    words: Vec<Value>,
    /// Words past the end of the schema, kept verbatim
    trailing: Vec<u32>,
}

impl Record {
    /// Start building a record of the given kind
    pub fn builder(kind: DataSetKind) -> RecordBuilder {
        RecordBuilder::new(kind)
    }

    pub fn kind(&self) -> DataSetKind {
        self.kind
    }

    pub fn schema(&self) -> &'static RecordSchema {
        self.schema
    }

    pub fn header(&self) -> &DataSetHeader {
        &self.header
    }

    /// Beam count of the per-beam arrays; 0 when the schema has none
    pub fn num_beams(&self) -> usize {
        self.num_beams
    }

    /// All schema words in wire order
    pub fn words(&self) -> &[Value] {
        &self.words
    }

    /// Words beyond the schema (newer firmware), raw bits
    pub fn trailing_words(&self) -> &[u32] {
        &self.trailing
    }

    /// All values of a field (one for scalars)
    pub fn values(&self, key: &str) -> Option<&[Value]> {
        let slot = self.schema.slot(key, self.num_beams)?;
        self.words.get(slot.word..slot.word + slot.len)
    }

    /// Value of a scalar field
    pub fn get(&self, key: &str) -> Option<Value> {
        let slot = self.schema.slot(key, self.num_beams)?;
        if slot.spec.shape != FieldShape::Scalar {
            return None;
        }
        self.words.get(slot.word).copied()
    }

    pub fn get_f32(&self, key: &str) -> Option<f32> {
        self.get(key).map(Value::as_f32)
    }

    pub fn get_i32(&self, key: &str) -> Option<i32> {
        self.get(key).map(Value::as_i32)
    }

    /// Array field as floats
    pub fn array_f32(&self, key: &str) -> Option<Vec<f32>> {
        self.values(key)
            .map(|vals| vals.iter().map(|v| v.as_f32()).collect())
    }

    /// Array field as ints
    pub fn array_i32(&self, key: &str) -> Option<Vec<i32>> {
        self.values(key)
            .map(|vals| vals.iter().map(|v| v.as_i32()).collect())
    }

    /// Byte offset of payload word `word` relative to the block start
    pub fn word_offset(&self, word: usize) -> usize {
        self.header.header_len() + word * BYTES_IN_WORD
    }

    /// Header plus payload bytes
    pub fn encoded_len(&self) -> usize {
        self.header.total_len()
    }

    /// Encode into `buf` starting at `offset`, returning bytes written
    pub fn encode_into(&self, buf: &mut [u8], offset: usize) -> CodecResult<usize> {
        self.header.encode_into(buf, offset)?;
        for (k, value) in self.words.iter().enumerate() {
            write_u32(buf, offset + self.word_offset(k), value.to_bits())?;
        }
        let base = self.words.len();
        for (k, bits) in self.trailing.iter().enumerate() {
            write_u32(buf, offset + self.word_offset(base + k), *bits)?;
        }
        Ok(self.encoded_len())
    }

    /// Encode into a fresh buffer
    pub fn encode(&self) -> CodecResult<Vec<u8>> {
        let mut buf = vec![0u8; self.encoded_len()];
        self.encode_into(&mut buf, 0)?;
        Ok(buf)
    }

    /// Decode the payload of a block whose header has already been read.
    ///
    /// `offset` is the start of the block (the header), not the payload.
    pub fn decode(
        kind: DataSetKind,
        header: DataSetHeader,
        buf: &[u8],
        offset: usize,
    ) -> CodecResult<Self> {
        let schema = kind.schema().ok_or_else(|| CodecError::UnknownDataSet {
            name: kind.id().to_string(),
        })?;
        if header.value_type() == ValueType::Byte {
            return Err(CodecError::UnexpectedValueType {
                name: kind.id().to_string(),
                tag: header.value_type_tag(),
            });
        }

        let elements = header
            .num_elements()
            .saturating_mul(header.elements_multiplier());
        let num_beams =
            schema
                .beams_for(elements)
                .ok_or_else(|| CodecError::UnexpectedBeamCount {
                    name: kind.id().to_string(),
                    elements,
                    scalars: schema.scalar_words(),
                    arrays: schema.per_beam_arrays(),
                })?;

        super::check_fits(&header, buf, offset)?;

        let payload = offset + header.header_len();
        let mut words = Vec::with_capacity(schema.words(num_beams));
        for slot in schema.layout(num_beams) {
            for i in 0..slot.len {
                let bits = read_u32(buf, payload + (slot.word + i) * BYTES_IN_WORD)?;
                words.push(Value::from_bits(slot.spec.ty, bits));
            }
        }
        let mut trailing = Vec::with_capacity(elements - words.len());
        for k in words.len()..elements {
            trailing.push(read_u32(buf, payload + k * BYTES_IN_WORD)?);
        }

        let record = Self {
            kind,
            schema,
            header,
            num_beams,
            words,
            trailing,
        };
        if let Some(field) = schema.beam_field {
            let declared = record.get_f32(field).unwrap_or_default();
            if declared != num_beams as f32 {
                return Err(CodecError::UnexpectedBeamCount {
                    name: kind.id().to_string(),
                    elements,
                    scalars: schema.scalar_words(),
                    arrays: schema.per_beam_arrays(),
                });
            }
        }
        Ok(record)
    }

    /// Same record with a different header value-type tag and element split.
    ///
    /// Decoded headers may split the words as `NumElements x ElementsMultiplier`
    /// in any way; the product must still equal the word count.
    pub fn with_wire_layout(
        mut self,
        value_type_tag: i32,
        elements_multiplier: usize,
    ) -> CodecResult<Self> {
        if value_type_tag == ValueType::BYTE_TAG {
            return Err(CodecError::UnexpectedValueType {
                name: self.kind.id().to_string(),
                tag: value_type_tag,
            });
        }
        let total = self.words.len() + self.trailing.len();
        if elements_multiplier == 0 || total % elements_multiplier != 0 {
            return Err(CodecError::FieldShape {
                field: "ElementsMultiplier".to_string(),
                expected: total,
                actual: elements_multiplier,
            });
        }
        self.header = self.header.with_layout(
            value_type_tag,
            total / elements_multiplier,
            elements_multiplier,
        );
        Ok(self)
    }

    /// Builder pre-filled with this record's contents
    pub fn to_builder(&self) -> RecordBuilder {
        let mut builder = RecordBuilder::new(self.kind)
            .imag(self.header.imag())
            .trailing_words(self.trailing.clone());
        if self.schema.has_beams() {
            builder = builder.beams(self.num_beams);
        }
        for slot in self.schema.layout(self.num_beams) {
            let vals = self.words[slot.word..slot.word + slot.len].to_vec();
            builder.fields.insert(slot.spec.key.to_string(), vals);
        }
        builder
    }

    /// Timestamp of an Ensemble dataset (`Year`..`HSec`)
    pub fn ensemble_time(&self) -> Option<NaiveDateTime> {
        if self.kind != DataSetKind::Ensemble {
            return None;
        }
        let part = |key: &str| self.get_i32(key).and_then(|v| u32::try_from(v).ok());
        NaiveDate::from_ymd_opt(self.get_i32("Year")?, part("Month")?, part("Day")?)?
            .and_hms_milli_opt(
                part("Hour")?,
                part("Minute")?,
                part("Second")?,
                part("HSec")?.checked_mul(10)?,
            )
    }
}

/// Builder for [`Record`]
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    kind: DataSetKind,
    beams: Option<usize>,
    imag: i32,
    fields: HashMap<String, Vec<Value>>,
    trailing: Vec<u32>,
}

impl RecordBuilder {
    pub fn new(kind: DataSetKind) -> Self {
        Self {
            kind,
            beams: None,
            imag: 0,
            fields: HashMap::new(),
            trailing: Vec::new(),
        }
    }

    /// Set the beam count explicitly
    pub fn beams(mut self, beams: usize) -> Self {
        self.beams = Some(beams);
        self
    }

    /// Set the reserved image tag
    pub fn imag(mut self, imag: i32) -> Self {
        self.imag = imag;
        self
    }

    /// Set a scalar field
    pub fn scalar(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), vec![value.into()]);
        self
    }

    /// Set an array field (per-beam or fixed length)
    pub fn array<V: Into<Value>>(mut self, key: &str, values: impl IntoIterator<Item = V>) -> Self {
        self.fields
            .insert(key.to_string(), values.into_iter().map(Into::into).collect());
        self
    }

    /// Words appended after the schema fields
    pub fn trailing_words(mut self, words: Vec<u32>) -> Self {
        self.trailing = words;
        self
    }

    fn resolve_beams(&self, schema: &RecordSchema) -> CodecResult<usize> {
        if !schema.has_beams() {
            return Ok(0);
        }
        let beams = self
            .beams
            .or_else(|| {
                schema
                    .fields
                    .iter()
                    .filter(|f| f.shape == FieldShape::PerBeam)
                    .find_map(|f| self.fields.get(f.key).map(Vec::len))
            })
            .unwrap_or(DEFAULT_NUM_BEAMS_BEAM);
        if !(1..=MAX_BEAMS).contains(&beams) {
            return Err(CodecError::FieldShape {
                field: schema.beam_field.unwrap_or("beams").to_string(),
                expected: MAX_BEAMS,
                actual: beams,
            });
        }
        Ok(beams)
    }

    /// Validate and freeze
    pub fn build(self) -> CodecResult<Record> {
        let kind = self.kind;
        let schema = kind.schema().ok_or_else(|| CodecError::UnknownDataSet {
            name: kind.id().to_string(),
        })?;
        let num_beams = self.resolve_beams(schema)?;

        for key in self.fields.keys() {
            if !schema.fields.iter().any(|f| f.key == key) {
                return Err(CodecError::unknown_field(kind.id(), key.as_str()));
            }
        }

        let mut words = Vec::with_capacity(schema.words(num_beams));
        for slot in schema.layout(num_beams) {
            match self.fields.get(slot.spec.key) {
                Some(vals) if vals.len() != slot.len => {
                    return Err(CodecError::FieldShape {
                        field: slot.spec.key.to_string(),
                        expected: slot.len,
                        actual: vals.len(),
                    });
                }
                Some(vals) => words.extend(vals.iter().map(|v| v.coerce(slot.spec.ty))),
                None => words.extend((0..slot.len).map(|_| Value::zero(slot.spec.ty))),
            }
        }

        if let Some(field) = schema.beam_field {
            if let Some(slot) = schema.slot(field, num_beams) {
                let declared = self.fields.get(field).and_then(|v| v.first().copied());
                if let Some(v) = declared {
                    if v.as_f32() != num_beams as f32 {
                        return Err(CodecError::FieldShape {
                            field: field.to_string(),
                            expected: num_beams,
                            actual: v.as_f32().max(0.0) as usize,
                        });
                    }
                }
                words[slot.word] = Value::Int(num_beams as i32).coerce(slot.spec.ty);
            }
        }

        let header = DataSetHeader::new(
            schema.value_type,
            words.len() + self.trailing.len(),
            1,
            kind.name(),
        )?
        .with_imag(self.imag);

        Ok(Record {
            kind,
            schema,
            header,
            num_beams,
            words,
            trailing: self.trailing,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::header_size;

    fn bottom_track() -> Record {
        Record::builder(DataSetKind::BottomTrack)
            .scalar("Heading", 12.5f32)
            .scalar("Pitch", -1.0f32)
            .scalar("Roll", 0.25f32)
            .scalar("Status", 0.0f32)
            .array("Range", [10.1f32, 10.2, 10.3, 10.4])
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_fills_beam_field_and_header() {
        let bt = bottom_track();
        assert_eq!(bt.num_beams(), 4);
        assert_eq!(bt.get_f32("NumBeams"), Some(4.0));
        assert_eq!(bt.header().num_elements(), 54);
        assert_eq!(bt.header().elements_multiplier(), 1);
        assert_eq!(bt.header().name(), "E000010\0");
        assert_eq!(bt.encoded_len(), 54 * 4 + 28);
        assert_eq!(bt.array_f32("SNR"), Some(vec![0.0; 4]));
    }

    #[test]
    fn test_heading_at_sequential_offset() {
        let bt = bottom_track();
        let bytes = bt.encode().unwrap();
        let heading_at = header_size(8) + 2 * 4;
        assert_eq!(&bytes[heading_at..heading_at + 4], &12.5f32.to_le_bytes());
        // Range[2] is word 14 + 2
        let range2_at = header_size(8) + 16 * 4;
        assert_eq!(&bytes[range2_at..range2_at + 4], &10.3f32.to_le_bytes());
    }

    #[test]
    fn test_encode_decode_identity() {
        let bt = bottom_track();
        let bytes = bt.encode().unwrap();
        let header = DataSetHeader::decode(&bytes, 0).unwrap();
        let decoded = Record::decode(DataSetKind::BottomTrack, header, &bytes, 0).unwrap();
        assert_eq!(decoded, bt);
        assert_eq!(decoded.get_f32("Heading"), Some(12.5));
        assert_eq!(decoded.array_f32("Range").unwrap()[2], 10.3);
    }

    #[test]
    fn test_wrong_array_length_rejected() {
        let err = Record::builder(DataSetKind::BottomTrack)
            .beams(4)
            .array("Range", [1.0f32, 2.0, 3.0])
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            CodecError::FieldShape {
                expected: 4,
                actual: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = Record::builder(DataSetKind::Ancillary)
            .scalar("Yaw", 1.0f32)
            .build()
            .unwrap_err();
        assert!(matches!(err, CodecError::UnknownField { .. }));
    }

    #[test]
    fn test_conflicting_beam_field_rejected() {
        let err = Record::builder(DataSetKind::RangeTracking)
            .beams(2)
            .scalar("NumBeams", 3.0f32)
            .build()
            .unwrap_err();
        assert!(matches!(err, CodecError::FieldShape { .. }));
    }

    #[test]
    fn test_beam_count_inferred_from_arrays() {
        let rt = Record::builder(DataSetKind::RangeTracking)
            .array("Range", [5.0f32, 6.0])
            .build()
            .unwrap();
        assert_eq!(rt.num_beams(), 2);
        assert_eq!(rt.header().num_elements(), 17);
    }

    #[test]
    fn test_unexpected_beam_count_on_decode() {
        let header = DataSetHeader::new(ValueType::Float, 55, 1, "E000010\0").unwrap();
        let mut buf = header.encode();
        buf.resize(header.total_len(), 0);
        let err = Record::decode(DataSetKind::BottomTrack, header, &buf, 0).unwrap_err();
        assert!(matches!(err, CodecError::UnexpectedBeamCount { .. }));
    }

    #[test]
    fn test_beam_field_disagreeing_with_elements() {
        let bt = bottom_track();
        let mut bytes = bt.encode().unwrap();
        let num_beams_at = header_size(8) + 12 * 4;
        bytes[num_beams_at..num_beams_at + 4].copy_from_slice(&3.0f32.to_le_bytes());
        let header = DataSetHeader::decode(&bytes, 0).unwrap();
        assert!(Record::decode(DataSetKind::BottomTrack, header, &bytes, 0).is_err());
    }

    #[test]
    fn test_trailing_words_preserved() {
        let anc = Record::builder(DataSetKind::Ancillary)
            .scalar("Heading", 90.0f32)
            .trailing_words(vec![0xdead_beef, 1])
            .build()
            .unwrap();
        assert_eq!(anc.header().num_elements(), 15);
        let bytes = anc.encode().unwrap();
        let header = DataSetHeader::decode(&bytes, 0).unwrap();
        let decoded = Record::decode(DataSetKind::Ancillary, header, &bytes, 0).unwrap();
        assert_eq!(decoded.trailing_words(), &[0xdead_beef, 1]);
        assert_eq!(decoded, anc);
    }

    #[test]
    fn test_to_builder_round_trip() {
        let bt = bottom_track();
        let copy = bt.to_builder().scalar("Heading", 13.0f32).build().unwrap();
        assert_eq!(copy.get_f32("Heading"), Some(13.0));
        assert_eq!(copy.array_f32("Range"), bt.array_f32("Range"));
    }

    #[test]
    fn test_ensemble_record_ints_and_time() {
        let ens = Record::builder(DataSetKind::Ensemble)
            .scalar("EnsembleNumber", 42)
            .scalar("Year", 2026)
            .scalar("Month", 10)
            .scalar("Day", 18)
            .scalar("Hour", 12)
            .scalar("Minute", 30)
            .scalar("Second", 5)
            .scalar("HSec", 50)
            .array("SerialNumber", [1, 2, 3, 4, 5, 6, 7, 8])
            .build()
            .unwrap();
        assert_eq!(ens.header().value_type(), ValueType::Int);
        assert_eq!(ens.get_i32("EnsembleNumber"), Some(42));
        let t = ens.ensemble_time().unwrap();
        assert_eq!(t.to_string(), "2026-10-18 12:30:05.500");
        assert!(bottom_track().ensemble_time().is_none());
    }

    #[test]
    fn test_out_of_range_hsec_has_no_time() {
        let rec = Record::builder(DataSetKind::Ensemble)
            .scalar("Year", 2026)
            .scalar("Month", 10)
            .scalar("Day", 18)
            .scalar("HSec", 500_000_000)
            .build()
            .unwrap();
        let bytes = crate::ensemble::Ensemble::new(1).with(rec).encode().unwrap();
        let decoded = crate::ensemble::Ensemble::decode(&bytes).unwrap();
        assert!(decoded.is_valid());
        assert_eq!(decoded.ensemble.time(), None);
    }

    #[test]
    fn test_decode_rejects_header_larger_than_buffer() {
        let anc = Record::builder(DataSetKind::Ancillary).build().unwrap();
        let bytes = anc.encode().unwrap();
        let header = DataSetHeader::new(
            ValueType::Float,
            usize::MAX / 8,
            1,
            DataSetKind::Ancillary.name(),
        )
        .unwrap();
        let err = Record::decode(DataSetKind::Ancillary, header, &bytes, 0).unwrap_err();
        assert!(matches!(err, CodecError::TruncatedDataSet { .. }));
    }

    #[test]
    fn test_wire_layout_split() {
        let bt = bottom_track();
        let split = bt.clone().with_wire_layout(ValueType::INT_TAG, 2).unwrap();
        assert_eq!(split.header().num_elements(), 27);
        assert_eq!(split.header().elements_multiplier(), 2);
        assert_eq!(split.header().value_type_tag(), 20);
        assert_eq!(split.words(), bt.words());

        assert!(bt.clone().with_wire_layout(ValueType::FLOAT_TAG, 5).is_err());
        assert!(matches!(
            bt.with_wire_layout(ValueType::BYTE_TAG, 1),
            Err(CodecError::UnexpectedValueType { .. })
        ));
    }

    #[test]
    fn test_scalar_accessor_rejects_arrays() {
        let bt = bottom_track();
        assert!(bt.get("Range").is_none());
        assert!(bt.values("Range").is_some());
        assert!(bt.get("Missing").is_none());
    }
}
