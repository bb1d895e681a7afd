//! Dataset blocks carried inside an ensemble payload
//!
//! Each block is a [`DataSetHeader`] followed by a payload whose layout
//! depends on the dataset kind:
//!
//! - grids ([`BeamGrid`]): beam-major `(bin, beam)` cells
//! - records ([`Record`]): sequential words described by a [`RecordSchema`]
//! - NMEA ([`NmeaData`]): raw sentence bytes
//!
//! [`decode_block`] dispatches on the embedded name and reports unknown
//! names as [`Block::Unknown`] so the caller can skip them.

pub mod grid;
pub mod json;
pub mod kind;
pub mod nmea;
pub mod record;
pub mod schema;
pub mod value;

pub use grid::BeamGrid;
pub use kind::{DataSetKind, Layout};
pub use nmea::NmeaData;
pub use record::{Record, RecordBuilder};
pub use schema::{FieldShape, FieldSpec, FieldType, RecordSchema};
pub use value::Value;

use crate::codec::DataSetHeader;
use crate::common::{CodecError, CodecResult};

/// One decoded dataset of a known kind
#[derive(Debug, Clone, PartialEq)]
pub enum DataSet {
    Grid(BeamGrid),
    Record(Record),
    Nmea(NmeaData),
}

impl DataSet {
    pub fn kind(&self) -> DataSetKind {
        match self {
            Self::Grid(g) => g.kind(),
            Self::Record(r) => r.kind(),
            Self::Nmea(_) => DataSetKind::Nmea,
        }
    }

    pub fn header(&self) -> &DataSetHeader {
        match self {
            Self::Grid(g) => g.header(),
            Self::Record(r) => r.header(),
            Self::Nmea(n) => n.header(),
        }
    }

    /// Block size: header plus payload
    pub fn encoded_len(&self) -> usize {
        self.header().total_len()
    }

    pub fn encode_into(&self, buf: &mut [u8], offset: usize) -> CodecResult<usize> {
        match self {
            Self::Grid(g) => g.encode_into(buf, offset),
            Self::Record(r) => r.encode_into(buf, offset),
            Self::Nmea(n) => n.encode_into(buf, offset),
        }
    }

    pub fn encode(&self) -> CodecResult<Vec<u8>> {
        let mut buf = vec![0u8; self.encoded_len()];
        self.encode_into(&mut buf, 0)?;
        Ok(buf)
    }

    pub fn as_grid(&self) -> Option<&BeamGrid> {
        match self {
            Self::Grid(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_nmea(&self) -> Option<&NmeaData> {
        match self {
            Self::Nmea(n) => Some(n),
            _ => None,
        }
    }
}

impl From<BeamGrid> for DataSet {
    fn from(g: BeamGrid) -> Self {
        Self::Grid(g)
    }
}

impl From<Record> for DataSet {
    fn from(r: Record) -> Self {
        Self::Record(r)
    }
}

impl From<NmeaData> for DataSet {
    fn from(n: NmeaData) -> Self {
        Self::Nmea(n)
    }
}

/// Result of reading one block from a payload
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Known(DataSet),
    /// Name not in the catalogue; the header is kept for logging
    Unknown(DataSetHeader),
}

/// Fail unless the whole block described by `header` lies inside `buf`
/// starting at `offset`
pub(crate) fn check_fits(header: &DataSetHeader, buf: &[u8], offset: usize) -> CodecResult<()> {
    let available = buf.len().saturating_sub(offset);
    if header.total_len() > available {
        return Err(CodecError::TruncatedDataSet {
            name: header.id().to_string(),
            declared: header.total_len(),
            available,
        });
    }
    Ok(())
}

/// Decode the block at `offset`, never reading at or past `end`.
///
/// Returns the block and its total length in bytes.
pub fn decode_block(buf: &[u8], offset: usize, end: usize) -> CodecResult<(Block, usize)> {
    let bounded = &buf[..end.min(buf.len())];
    let header = DataSetHeader::decode(bounded, offset)?;
    let total = header.total_len();
    check_fits(&header, bounded, offset)?;

    let block = match DataSetKind::from_name(header.name()) {
        None => Block::Unknown(header),
        Some(kind) => Block::Known(match kind.layout() {
            Layout::Grid => DataSet::Grid(BeamGrid::decode(kind, header, bounded, offset)?),
            Layout::Record => DataSet::Record(Record::decode(kind, header, bounded, offset)?),
            Layout::Bytes => DataSet::Nmea(NmeaData::decode(header, bounded, offset)?),
        }),
    };
    Ok((block, total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ValueType;

    #[test]
    fn test_decode_known_block() {
        let grid = BeamGrid::new(DataSetKind::Correlation, 2, 4).unwrap();
        let bytes = grid.encode().unwrap();
        let (block, len) = decode_block(&bytes, 0, bytes.len()).unwrap();
        assert_eq!(len, bytes.len());
        assert_eq!(block, Block::Known(DataSet::Grid(grid)));
    }

    #[test]
    fn test_decode_unknown_block() {
        let header = DataSetHeader::new(ValueType::Float, 3, 1, "E000099\0").unwrap();
        let mut bytes = header.encode();
        bytes.resize(header.total_len(), 0x11);
        let (block, len) = decode_block(&bytes, 0, bytes.len()).unwrap();
        assert_eq!(len, 28 + 12);
        assert!(matches!(block, Block::Unknown(h) if h.id() == "E000099"));
    }

    #[test]
    fn test_block_past_end_is_truncated() {
        let nmea = NmeaData::new("$GPHDT,1.0,T*1C\r\n").unwrap();
        let mut bytes = nmea.encode().unwrap();
        bytes.extend_from_slice(&[0u8; 8]);
        let end = nmea.encoded_len() - 1;
        let err = decode_block(&bytes, 0, end).unwrap_err();
        assert!(matches!(err, CodecError::TruncatedDataSet { .. }));
    }

    #[test]
    fn test_data_set_accessors() {
        let ds: DataSet = NmeaData::new("x").unwrap().into();
        assert_eq!(ds.kind(), DataSetKind::Nmea);
        assert!(ds.as_nmea().is_some());
        assert!(ds.as_grid().is_none());
        assert_eq!(ds.encode().unwrap().len(), ds.encoded_len());
    }
}
