//! Beam-major bin grids (velocities, amplitude, correlation, good pings)
//!
//! Cell `(bin, beam)` is word `beam * NumElements + bin` of the payload.
//! The header carries the dimensions: `NumElements` = bins,
//! `ElementsMultiplier` = beams. A whole beam is therefore one contiguous
//! run of words, which [`BeamGrid::beam`] exposes as a slice.

use crate::codec::field::{read_u32, write_u32};
use crate::codec::DataSetHeader;
use crate::common::framing::BYTES_IN_WORD;
use crate::common::{CodecError, CodecResult, ValueType, MAX_BEAMS};

use super::kind::DataSetKind;
use super::schema::FieldType;
use super::value::Value;

/// Bin x beam grid of one value type
#[derive(Debug, Clone, PartialEq)]
pub struct BeamGrid {
    kind: DataSetKind,
    header: DataSetHeader,
    ty: FieldType,
    /// Beam-major storage
    values: Vec<Value>,
}

impl BeamGrid {
    /// Grid with every cell zero
    pub fn new(kind: DataSetKind, bins: usize, beams: usize) -> CodecResult<Self> {
        Self::from_fn(kind, bins, beams, |_, _| 0.0f32)
    }

    /// Grid filled from `f(bin, beam)`
    pub fn from_fn<V, F>(kind: DataSetKind, bins: usize, beams: usize, mut f: F) -> CodecResult<Self>
    where
        V: Into<Value>,
        F: FnMut(usize, usize) -> V,
    {
        let mut values = Vec::with_capacity(bins * beams);
        for beam in 0..beams {
            for bin in 0..bins {
                values.push(f(bin, beam).into());
            }
        }
        Self::from_beam_major(kind, bins, beams, values)
    }

    /// Grid from values already in wire (beam-major) order
    pub fn from_beam_major(
        kind: DataSetKind,
        bins: usize,
        beams: usize,
        values: Vec<Value>,
    ) -> CodecResult<Self> {
        check_kind(kind)?;
        check_beams(kind, bins, beams)?;
        if values.len() != bins * beams {
            return Err(CodecError::FieldShape {
                field: kind.id().to_string(),
                expected: bins * beams,
                actual: values.len(),
            });
        }
        let value_type = kind.value_type();
        let ty = FieldType::from_value_type(value_type);
        let header = DataSetHeader::new(value_type, bins, beams, kind.name())?;
        Ok(Self {
            kind,
            header,
            ty,
            values: values.into_iter().map(|v| v.coerce(ty)).collect(),
        })
    }

    /// Grid from rows indexed `[bin][beam]`
    pub fn from_bin_major<V: Into<Value> + Copy>(
        kind: DataSetKind,
        rows: &[Vec<V>],
    ) -> CodecResult<Self> {
        let beams = rows.first().map(Vec::len).unwrap_or(0);
        if let Some(bad) = rows.iter().find(|r| r.len() != beams) {
            return Err(CodecError::FieldShape {
                field: kind.id().to_string(),
                expected: beams,
                actual: bad.len(),
            });
        }
        Self::from_fn(kind, rows.len(), beams, |bin, beam| rows[bin][beam])
    }

    /// Replace the reserved image tag
    pub fn with_imag(mut self, imag: i32) -> Self {
        self.header = self.header.with_imag(imag);
        self
    }

    pub fn kind(&self) -> DataSetKind {
        self.kind
    }

    pub fn header(&self) -> &DataSetHeader {
        &self.header
    }

    pub fn field_type(&self) -> FieldType {
        self.ty
    }

    pub fn num_bins(&self) -> usize {
        self.header.num_elements()
    }

    pub fn num_beams(&self) -> usize {
        self.header.elements_multiplier()
    }

    /// Word index of a cell
    #[inline]
    pub fn index(&self, bin: usize, beam: usize) -> usize {
        beam * self.num_bins() + bin
    }

    /// Byte offset of a cell relative to the block start
    #[inline]
    pub fn offset(&self, bin: usize, beam: usize) -> usize {
        self.header.header_len() + self.index(bin, beam) * BYTES_IN_WORD
    }

    pub fn get(&self, bin: usize, beam: usize) -> Option<Value> {
        if bin >= self.num_bins() || beam >= self.num_beams() {
            return None;
        }
        self.values.get(self.index(bin, beam)).copied()
    }

    pub fn get_f32(&self, bin: usize, beam: usize) -> Option<f32> {
        self.get(bin, beam).map(Value::as_f32)
    }

    /// All bins of one beam
    pub fn beam(&self, beam: usize) -> Option<&[Value]> {
        if beam >= self.num_beams() {
            return None;
        }
        let bins = self.num_bins();
        self.values.get(beam * bins..(beam + 1) * bins)
    }

    /// All beams of one bin
    pub fn bin(&self, bin: usize) -> Option<Vec<Value>> {
        (0..self.num_beams()).map(|beam| self.get(bin, beam)).collect()
    }

    /// Values in wire order
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn encoded_len(&self) -> usize {
        self.header.total_len()
    }

    pub fn encode_into(&self, buf: &mut [u8], offset: usize) -> CodecResult<usize> {
        self.header.encode_into(buf, offset)?;
        for beam in 0..self.num_beams() {
            for bin in 0..self.num_bins() {
                let value = self.values[self.index(bin, beam)];
                write_u32(buf, offset + self.offset(bin, beam), value.to_bits())?;
            }
        }
        Ok(self.encoded_len())
    }

    pub fn encode(&self) -> CodecResult<Vec<u8>> {
        let mut buf = vec![0u8; self.encoded_len()];
        self.encode_into(&mut buf, 0)?;
        Ok(buf)
    }

    /// Decode the cells of a block whose header has been read at `offset`
    pub fn decode(
        kind: DataSetKind,
        header: DataSetHeader,
        buf: &[u8],
        offset: usize,
    ) -> CodecResult<Self> {
        check_kind(kind)?;
        let ty = match header.value_type() {
            ValueType::Byte => {
                return Err(CodecError::UnexpectedValueType {
                    name: kind.id().to_string(),
                    tag: header.value_type_tag(),
                })
            }
            vt => FieldType::from_value_type(vt),
        };
        let bins = header.num_elements();
        let beams = header.elements_multiplier();
        check_beams(kind, bins, beams)?;
        super::check_fits(&header, buf, offset)?;

        let mut grid = Self {
            kind,
            header,
            ty,
            values: Vec::with_capacity(bins * beams),
        };
        for beam in 0..beams {
            for bin in 0..bins {
                let bits = read_u32(buf, offset + grid.offset(bin, beam))?;
                grid.values.push(Value::from_bits(ty, bits));
            }
        }
        Ok(grid)
    }
}

fn check_kind(kind: DataSetKind) -> CodecResult<()> {
    if kind.layout() == super::kind::Layout::Grid {
        Ok(())
    } else {
        Err(CodecError::UnknownDataSet {
            name: kind.id().to_string(),
        })
    }
}

fn check_beams(kind: DataSetKind, bins: usize, beams: usize) -> CodecResult<()> {
    if (1..=MAX_BEAMS).contains(&beams) {
        return Ok(());
    }
    Err(CodecError::UnexpectedBeamCount {
        name: kind.id().to_string(),
        elements: bins.saturating_mul(beams),
        scalars: 0,
        arrays: bins,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::header_size;

    fn sample() -> BeamGrid {
        BeamGrid::from_fn(DataSetKind::Amplitude, 3, 4, |bin, beam| {
            (beam * 10 + bin) as f32
        })
        .unwrap()
    }

    #[test]
    fn test_beam_major_offsets() {
        let grid = sample();
        let h = header_size(8);
        assert_eq!(grid.offset(0, 0), h);
        assert_eq!(grid.offset(1, 0), h + 4);
        assert_eq!(grid.offset(0, 1), h + 3 * 4);
        assert_eq!(grid.offset(2, 3), h + (3 * 3 + 2) * 4);
    }

    #[test]
    fn test_cell_bytes_at_offset() {
        let grid = sample();
        let bytes = grid.encode().unwrap();
        for beam in 0..4 {
            for bin in 0..3 {
                let at = grid.offset(bin, beam);
                let expected = ((beam * 10 + bin) as f32).to_le_bytes();
                assert_eq!(&bytes[at..at + 4], &expected, "bin {} beam {}", bin, beam);
            }
        }
    }

    #[test]
    fn test_encode_decode_identity() {
        let grid = sample();
        let bytes = grid.encode().unwrap();
        assert_eq!(bytes.len(), 3 * 4 * 4 + 28);
        let header = DataSetHeader::decode(&bytes, 0).unwrap();
        let decoded = BeamGrid::decode(DataSetKind::Amplitude, header, &bytes, 0).unwrap();
        assert_eq!(decoded, grid);
        assert_eq!(decoded.get_f32(2, 1), Some(12.0));
    }

    #[test]
    fn test_beam_slice_and_bin_row() {
        let grid = sample();
        let beam2: Vec<f32> = grid.beam(2).unwrap().iter().map(|v| v.as_f32()).collect();
        assert_eq!(beam2, vec![20.0, 21.0, 22.0]);
        let bin1: Vec<f32> = grid.bin(1).unwrap().iter().map(|v| v.as_f32()).collect();
        assert_eq!(bin1, vec![1.0, 11.0, 21.0, 31.0]);
        assert!(grid.get(3, 0).is_none());
        assert!(grid.beam(4).is_none());
    }

    #[test]
    fn test_good_beam_is_int() {
        let grid = BeamGrid::from_fn(DataSetKind::GoodBeam, 2, 4, |_, _| 7).unwrap();
        assert_eq!(grid.header().value_type(), ValueType::Int);
        let bytes = grid.encode().unwrap();
        assert_eq!(&bytes[28..32], &7i32.to_le_bytes());
    }

    #[test]
    fn test_from_bin_major_transposes() {
        let rows = vec![vec![1.0f32, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]];
        let grid = BeamGrid::from_bin_major(DataSetKind::BeamVelocity, &rows).unwrap();
        assert_eq!(grid.num_bins(), 3);
        assert_eq!(grid.num_beams(), 2);
        let wire: Vec<f32> = grid.values().iter().map(|v| v.as_f32()).collect();
        assert_eq!(wire, vec![1.0, 3.0, 5.0, 2.0, 4.0, 6.0]);
    }

    #[test]
    fn test_zero_bins_allowed() {
        let grid = BeamGrid::new(DataSetKind::Correlation, 0, 4).unwrap();
        assert_eq!(grid.encoded_len(), 28);
    }

    #[test]
    fn test_bad_beam_count_rejected() {
        assert!(matches!(
            BeamGrid::new(DataSetKind::Correlation, 2, 5),
            Err(CodecError::UnexpectedBeamCount { .. })
        ));
        assert!(BeamGrid::new(DataSetKind::BottomTrack, 2, 4).is_err());
    }

    #[test]
    fn test_decode_truncated_block() {
        let bytes = sample().encode().unwrap();
        let header = DataSetHeader::decode(&bytes, 0).unwrap();
        let err =
            BeamGrid::decode(DataSetKind::Amplitude, header, &bytes[..bytes.len() - 1], 0)
                .unwrap_err();
        assert!(matches!(err, CodecError::TruncatedDataSet { .. }));
    }

    #[test]
    fn test_decode_oversized_header_rejected_up_front() {
        let bytes = sample().encode().unwrap();
        let header = DataSetHeader::new(
            ValueType::Float,
            usize::MAX / 8,
            4,
            DataSetKind::Amplitude.name(),
        )
        .unwrap();
        let err = BeamGrid::decode(DataSetKind::Amplitude, header, &bytes, 0).unwrap_err();
        assert!(matches!(
            err,
            CodecError::TruncatedDataSet { available, .. } if available == bytes.len()
        ));
    }
}
