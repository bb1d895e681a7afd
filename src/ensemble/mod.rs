//! Ensemble container and codec
//!
//! An [`Ensemble`] holds at most one dataset per [`DataSetKind`]. Encoding
//! emits the present datasets in kind order, frames them with an
//! [`EnsembleHeader`] and appends the payload checksum. Decoding walks the
//! payload block by block, skipping unknown names, and reports the stored
//! and recomputed checksums alongside the parsed data.

pub mod header;
pub mod json;
pub mod scanner;

pub use header::{has_sync, EnsembleHeader};
pub use scanner::{find_sync, AsyncEnsembleReader, EnsembleScanner};

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::codec::field::{read_u32, write_u32};
use crate::codec::{checksum, DataSetHeader};
use crate::common::framing::{CHECKSUM_SIZE, ENSEMBLE_HEADER_LEN, MAX_NUM_DATA_SETS};
use crate::common::{CodecError, CodecResult};
use crate::dataset::{decode_block, BeamGrid, Block, DataSet, DataSetKind, NmeaData, Record};

/// What to do with an ensemble whose checksum does not match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumPolicy {
    /// Return the parsed data with `is_valid() == false`
    #[default]
    Keep,
    /// Fail with [`CodecError::ChecksumMismatch`]
    Discard,
}

/// Decoder settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    pub checksum_policy: ChecksumPolicy,
    /// Blocks walked before the payload is considered malformed
    pub max_data_sets: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            checksum_policy: ChecksumPolicy::Keep,
            max_data_sets: MAX_NUM_DATA_SETS,
        }
    }
}

/// A decoded ensemble plus framing diagnostics
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedEnsemble {
    pub ensemble: Ensemble,
    /// Low 16 bits of the trailing checksum field
    pub stored_checksum: u16,
    /// Checksum recomputed over the payload
    pub computed_checksum: u16,
    /// IDs of blocks skipped because their name is unknown
    pub skipped: Vec<String>,
    /// Bytes consumed: header + payload + checksum
    pub length: usize,
}

impl DecodedEnsemble {
    pub fn is_valid(&self) -> bool {
        self.stored_checksum == self.computed_checksum
    }
}

/// One instrument sample
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Ensemble {
    ensemble_number: i32,
    data_sets: BTreeMap<DataSetKind, DataSet>,
}

impl Ensemble {
    pub fn new(ensemble_number: i32) -> Self {
        Self {
            ensemble_number,
            data_sets: BTreeMap::new(),
        }
    }

    pub fn ensemble_number(&self) -> i32 {
        self.ensemble_number
    }

    pub fn set_ensemble_number(&mut self, ensemble_number: i32) {
        self.ensemble_number = ensemble_number;
    }

    /// Attach a dataset, returning the one it replaces
    pub fn add_data_set(&mut self, data_set: impl Into<DataSet>) -> Option<DataSet> {
        let data_set = data_set.into();
        self.data_sets.insert(data_set.kind(), data_set)
    }

    /// Builder-style [`Ensemble::add_data_set`]
    pub fn with(mut self, data_set: impl Into<DataSet>) -> Self {
        self.add_data_set(data_set);
        self
    }

    pub fn remove_data_set(&mut self, kind: DataSetKind) -> Option<DataSet> {
        self.data_sets.remove(&kind)
    }

    pub fn is_available(&self, kind: DataSetKind) -> bool {
        self.data_sets.contains_key(&kind)
    }

    pub fn get(&self, kind: DataSetKind) -> Option<&DataSet> {
        self.data_sets.get(&kind)
    }

    /// Present datasets in emission order
    pub fn data_sets(&self) -> impl Iterator<Item = &DataSet> {
        self.data_sets.values()
    }

    /// Kinds present, in emission order
    pub fn kinds(&self) -> impl Iterator<Item = DataSetKind> + '_ {
        self.data_sets.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.data_sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data_sets.is_empty()
    }

    pub fn grid(&self, kind: DataSetKind) -> Option<&BeamGrid> {
        self.get(kind).and_then(DataSet::as_grid)
    }

    pub fn record(&self, kind: DataSetKind) -> Option<&Record> {
        self.get(kind).and_then(DataSet::as_record)
    }

    pub fn beam_velocity(&self) -> Option<&BeamGrid> {
        self.grid(DataSetKind::BeamVelocity)
    }

    pub fn amplitude(&self) -> Option<&BeamGrid> {
        self.grid(DataSetKind::Amplitude)
    }

    pub fn correlation(&self) -> Option<&BeamGrid> {
        self.grid(DataSetKind::Correlation)
    }

    pub fn ensemble_data(&self) -> Option<&Record> {
        self.record(DataSetKind::Ensemble)
    }

    pub fn ancillary(&self) -> Option<&Record> {
        self.record(DataSetKind::Ancillary)
    }

    pub fn bottom_track(&self) -> Option<&Record> {
        self.record(DataSetKind::BottomTrack)
    }

    pub fn nmea(&self) -> Option<&NmeaData> {
        self.get(DataSetKind::Nmea).and_then(DataSet::as_nmea)
    }

    /// Sample time from the Ensemble dataset, if present
    pub fn time(&self) -> Option<NaiveDateTime> {
        self.ensemble_data().and_then(Record::ensemble_time)
    }

    /// Sum of the encoded block lengths
    pub fn payload_size(&self) -> usize {
        self.data_sets.values().map(DataSet::encoded_len).sum()
    }

    pub fn encoded_len(&self) -> usize {
        EnsembleHeader::new(self.ensemble_number, self.payload_size()).total_len()
    }

    /// Frame every present dataset into one ensemble
    pub fn encode(&self) -> CodecResult<Vec<u8>> {
        let header = EnsembleHeader::new(self.ensemble_number, self.payload_size());
        let mut buf = vec![0u8; header.total_len()];
        header.encode_into(&mut buf, 0)?;

        let mut cursor = ENSEMBLE_HEADER_LEN;
        for data_set in self.data_sets.values() {
            cursor += data_set.encode_into(&mut buf, cursor)?;
        }

        let crc = checksum(&buf[header.payload_range()]);
        write_u32(&mut buf, cursor, u32::from(crc))?;
        Ok(buf)
    }

    /// Decode one ensemble starting at `buf[0]` with default options
    pub fn decode(buf: &[u8]) -> CodecResult<DecodedEnsemble> {
        Self::decode_with(buf, &DecodeOptions::default())
    }

    /// Decode one ensemble starting at `buf[0]`
    pub fn decode_with(buf: &[u8], opts: &DecodeOptions) -> CodecResult<DecodedEnsemble> {
        let header = EnsembleHeader::decode(buf, 0)?;
        let length = header.total_len();
        if buf.len() < length {
            return Err(CodecError::TruncatedEnsemble {
                declared: length,
                available: buf.len(),
            });
        }

        let payload_end = header.payload_range().end;
        let mut ensemble = Ensemble::new(header.ensemble_number);
        let mut skipped = Vec::new();
        let mut cursor = ENSEMBLE_HEADER_LEN;
        let mut blocks = 0;
        while cursor < payload_end {
            if blocks == opts.max_data_sets {
                return Err(CodecError::TooManyDataSets {
                    max: opts.max_data_sets,
                });
            }
            blocks += 1;

            let (block, len) = decode_block(buf, cursor, payload_end)?;
            match block {
                Block::Known(data_set) => {
                    if let Some(old) = ensemble.add_data_set(data_set) {
                        debug!(
                            ensemble = header.ensemble_number,
                            kind = %old.kind(),
                            "Duplicate dataset, keeping the later one"
                        );
                    }
                }
                Block::Unknown(h) => {
                    warn!(
                        ensemble = header.ensemble_number,
                        name = h.id(),
                        bytes = len,
                        "Skipping unknown dataset"
                    );
                    skipped.push(h.id().to_string());
                }
            }
            cursor += len;
        }

        let stored_checksum = read_u32(buf, payload_end)? as u16;
        let computed_checksum = checksum(&buf[header.payload_range()]);
        if stored_checksum != computed_checksum {
            warn!(
                ensemble = header.ensemble_number,
                stored = stored_checksum,
                computed = computed_checksum,
                "Checksum mismatch"
            );
            if opts.checksum_policy == ChecksumPolicy::Discard {
                return Err(CodecError::ChecksumMismatch {
                    stored: stored_checksum,
                    computed: computed_checksum,
                });
            }
        }

        Ok(DecodedEnsemble {
            ensemble,
            stored_checksum,
            computed_checksum,
            skipped,
            length,
        })
    }
}

/// Check the framing and checksum of the ensemble at `buf[0]` without
/// decoding its datasets
pub fn verify_checksum(buf: &[u8]) -> CodecResult<bool> {
    let header = EnsembleHeader::decode(buf, 0)?;
    if buf.len() < header.total_len() {
        return Err(CodecError::TruncatedEnsemble {
            declared: header.total_len(),
            available: buf.len(),
        });
    }
    let range = header.payload_range();
    let stored = read_u32(buf, range.end)? as u16;
    Ok(stored == checksum(&buf[range]))
}

/// Append one encoded dataset block to an encoded ensemble in place.
///
/// The block goes after the existing payload; the payload size, its
/// complement and the checksum are rewritten. Bytes after the ensemble in
/// `buf` are dropped.
pub fn add_data_set_bytes(buf: &mut Vec<u8>, block: &[u8]) -> CodecResult<()> {
    let block_header = DataSetHeader::decode(block, 0)?;
    if block_header.total_len() != block.len() {
        return Err(CodecError::TruncatedDataSet {
            name: block_header.id().to_string(),
            declared: block_header.total_len(),
            available: block.len(),
        });
    }

    let header = EnsembleHeader::decode(buf, 0)?;
    if buf.len() < header.total_len() {
        return Err(CodecError::TruncatedEnsemble {
            declared: header.total_len(),
            available: buf.len(),
        });
    }

    buf.truncate(header.payload_range().end);
    buf.extend_from_slice(block);
    let grown = EnsembleHeader::new(header.ensemble_number, header.payload_size + block.len());
    grown.encode_into(buf, 0)?;
    let crc = checksum(&buf[grown.payload_range()]);
    buf.extend_from_slice(&u32::from(crc).to_le_bytes()[..CHECKSUM_SIZE]);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ValueType;

    fn bottom_track() -> Record {
        Record::builder(DataSetKind::BottomTrack)
            .scalar("Heading", 12.5f32)
            .scalar("Pitch", -1.0f32)
            .scalar("Roll", 0.25f32)
            .scalar("Status", 0.0f32)
            .beams(4)
            .array("Range", [10.1f32, 10.2, 10.3, 10.4])
            .build()
            .unwrap()
    }

    #[test]
    fn test_empty_ensemble() {
        let bytes = Ensemble::new(5).encode().unwrap();
        assert_eq!(bytes.len(), 36);
        assert_eq!(&bytes[32..36], &[0, 0, 0, 0]);
        let decoded = Ensemble::decode(&bytes).unwrap();
        assert!(decoded.ensemble.is_empty());
        assert_eq!(decoded.ensemble.ensemble_number(), 5);
        assert!(decoded.is_valid());
    }

    #[test]
    fn test_payload_size_is_sum_of_blocks() {
        let ens = Ensemble::new(1)
            .with(bottom_track())
            .with(BeamGrid::new(DataSetKind::Amplitude, 3, 4).unwrap());
        let bytes = ens.encode().unwrap();
        let header = EnsembleHeader::decode(&bytes, 0).unwrap();
        assert_eq!(header.payload_size, (54 * 4 + 28) + (3 * 4 * 4 + 28));
        assert_eq!(bytes.len(), ens.encoded_len());
    }

    #[test]
    fn test_emission_order() {
        let ens = Ensemble::new(1)
            .with(bottom_track())
            .with(BeamGrid::new(DataSetKind::Amplitude, 1, 1).unwrap());
        let bytes = ens.encode().unwrap();
        // Amplitude precedes Bottom Track regardless of insertion order
        assert_eq!(&bytes[32 + 20..32 + 28], b"E000004\0");
    }

    #[test]
    fn test_round_trip_and_checksum_field() {
        let ens = Ensemble::new(42).with(bottom_track());
        let bytes = ens.encode().unwrap();
        let decoded = Ensemble::decode(&bytes).unwrap();
        assert_eq!(decoded.ensemble, ens);
        assert_eq!(decoded.length, bytes.len());
        let tail = &bytes[bytes.len() - 4..];
        assert_eq!(&tail[2..], &[0, 0]);
        assert!(verify_checksum(&bytes).unwrap());
    }

    #[test]
    fn test_checksum_policy() {
        let mut bytes = Ensemble::new(42).with(bottom_track()).encode().unwrap();
        // Heading, word 2 of the Bottom Track payload
        bytes[32 + 28 + 8] ^= 0x01;
        let kept = Ensemble::decode(&bytes).unwrap();
        assert!(!kept.is_valid());
        let discard = DecodeOptions {
            checksum_policy: ChecksumPolicy::Discard,
            ..DecodeOptions::default()
        };
        assert!(matches!(
            Ensemble::decode_with(&bytes, &discard),
            Err(CodecError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_truncated_ensemble() {
        let bytes = Ensemble::new(1).with(bottom_track()).encode().unwrap();
        assert!(matches!(
            Ensemble::decode(&bytes[..bytes.len() - 1]),
            Err(CodecError::TruncatedEnsemble { .. })
        ));
    }

    #[test]
    fn test_max_data_sets_cap() {
        let ens = Ensemble::new(1)
            .with(bottom_track())
            .with(BeamGrid::new(DataSetKind::Amplitude, 1, 1).unwrap());
        let bytes = ens.encode().unwrap();
        let opts = DecodeOptions {
            max_data_sets: 1,
            ..DecodeOptions::default()
        };
        assert!(matches!(
            Ensemble::decode_with(&bytes, &opts),
            Err(CodecError::TooManyDataSets { max: 1 })
        ));
    }

    #[test]
    fn test_add_data_set_bytes_rejects_partial_block() {
        let mut bytes = Ensemble::new(1).encode().unwrap();
        let header = DataSetHeader::new(ValueType::Float, 4, 1, "E000009\0").unwrap();
        let partial = header.encode();
        assert!(add_data_set_bytes(&mut bytes, &partial).is_err());
    }

    #[test]
    fn test_add_data_set_bytes_grows_payload() {
        let mut bytes = Ensemble::new(3).encode().unwrap();
        let block = bottom_track().encode().unwrap();
        add_data_set_bytes(&mut bytes, &block).unwrap();
        let decoded = Ensemble::decode(&bytes).unwrap();
        assert!(decoded.is_valid());
        assert!(decoded.ensemble.is_available(DataSetKind::BottomTrack));
        assert_eq!(decoded.ensemble.bottom_track(), Some(&bottom_track()));
    }
}
