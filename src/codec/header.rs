//! Dataset sub-header
//!
//! Every dataset block inside an ensemble payload starts with:
//!
//! ```text
//! offset  size         field
//! 0       4            ValueType          (FLOAT=10, INT=20, BYTE=50)
//! 4       4            NumElements        (bins, or byte count)
//! 8       4            ElementsMultiplier (beams)
//! 12      4            Imag               (reserved, round-tripped)
//! 16      4            NameLength
//! 20      NameLength   Name               (ASCII, e.g. "E000010\0")
//! ```
//!
//! The payload follows immediately, `NumElements * ElementsMultiplier`
//! elements of the header's value-type width.

use crate::codec::field::{read_bytes, read_i32, write_bytes, write_i32};
use crate::common::framing::{BYTES_IN_WORD, NUM_DATASET_HEADER_ELEMENTS};
use crate::common::{CodecError, CodecResult, ValueType};

/// Bytes taken by the five int32 fields ahead of the name
pub const FIXED_HEADER_LEN: usize = BYTES_IN_WORD * (NUM_DATASET_HEADER_ELEMENTS - 1);

/// Size of a dataset header carrying a name of `name_length` bytes
#[inline]
pub const fn header_size(name_length: usize) -> usize {
    name_length + FIXED_HEADER_LEN
}

/// Size of a whole dataset block (header + payload)
pub fn data_set_size(
    value_type: ValueType,
    name_length: usize,
    num_elements: usize,
    elements_multiplier: usize,
) -> usize {
    num_elements
        .saturating_mul(elements_multiplier)
        .saturating_mul(value_type.element_width())
        .saturating_add(header_size(name_length))
}

/// Decoded or constructed dataset header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSetHeader {
    value_type: i32,
    num_elements: usize,
    elements_multiplier: usize,
    imag: i32,
    name: String,
}

impl DataSetHeader {
    /// Build a header for a dataset that is about to be encoded
    pub fn new(
        value_type: ValueType,
        num_elements: usize,
        elements_multiplier: usize,
        name: &str,
    ) -> CodecResult<Self> {
        if !name.is_ascii() {
            return Err(CodecError::InvalidName);
        }
        Ok(Self {
            value_type: value_type.tag(),
            num_elements,
            elements_multiplier,
            imag: 0,
            name: name.to_string(),
        })
    }

    /// Build a header from raw wire fields.
    ///
    /// `name_length` must equal the byte length of `name`; a mismatch would
    /// produce a corrupt frame so it is rejected.
    pub fn from_parts(
        value_type: i32,
        num_elements: i32,
        elements_multiplier: i32,
        imag: i32,
        name_length: i32,
        name: &str,
    ) -> CodecResult<Self> {
        let num_elements = non_negative("NumElements", num_elements)?;
        let elements_multiplier = non_negative("ElementsMultiplier", elements_multiplier)?;
        let name_length = non_negative("NameLength", name_length)?;
        if name_length != name.len() {
            return Err(CodecError::NameLengthMismatch {
                declared: name_length,
                actual: name.len(),
            });
        }
        if !name.is_ascii() {
            return Err(CodecError::InvalidName);
        }
        Ok(Self {
            value_type,
            num_elements,
            elements_multiplier,
            imag,
            name: name.to_string(),
        })
    }

    /// Replace the value-type tag and the element split
    pub fn with_layout(
        mut self,
        value_type: i32,
        num_elements: usize,
        elements_multiplier: usize,
    ) -> Self {
        self.value_type = value_type;
        self.num_elements = num_elements;
        self.elements_multiplier = elements_multiplier;
        self
    }

    /// Replace the reserved image tag
    pub fn with_imag(mut self, imag: i32) -> Self {
        self.imag = imag;
        self
    }

    /// Raw value type tag as stored on the wire
    pub fn value_type_tag(&self) -> i32 {
        self.value_type
    }

    pub fn value_type(&self) -> ValueType {
        ValueType::from_tag(self.value_type)
    }

    pub fn num_elements(&self) -> usize {
        self.num_elements
    }

    pub fn elements_multiplier(&self) -> usize {
        self.elements_multiplier
    }

    pub fn imag(&self) -> i32 {
        self.imag
    }

    pub fn name_length(&self) -> usize {
        self.name.len()
    }

    /// Full name including any NUL padding
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name with trailing NUL padding removed, e.g. `E000010`
    pub fn id(&self) -> &str {
        self.name.trim_end_matches('\0')
    }

    /// Bytes taken by this header
    pub fn header_len(&self) -> usize {
        header_size(self.name_length())
    }

    /// Bytes of payload following this header
    pub fn payload_len(&self) -> usize {
        self.num_elements
            .saturating_mul(self.elements_multiplier)
            .saturating_mul(self.value_type().element_width())
    }

    /// Header plus payload
    pub fn total_len(&self) -> usize {
        self.payload_len().saturating_add(self.header_len())
    }

    /// Write the header into `buf` at `offset`, returning bytes written
    pub fn encode_into(&self, buf: &mut [u8], offset: usize) -> CodecResult<usize> {
        write_i32(buf, offset, self.value_type)?;
        write_i32(buf, offset + 4, wire_count(self.num_elements))?;
        write_i32(buf, offset + 8, wire_count(self.elements_multiplier))?;
        write_i32(buf, offset + 12, self.imag)?;
        write_i32(buf, offset + 16, wire_count(self.name_length()))?;
        write_bytes(buf, offset + FIXED_HEADER_LEN, self.name.as_bytes())?;
        Ok(self.header_len())
    }

    /// Encode the header into a fresh buffer
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = vec![0u8; self.header_len()];
        // Buffer is sized from the header itself, so this cannot run short.
        let _ = self.encode_into(&mut buf, 0);
        buf
    }

    /// Decode a header starting at `offset`
    pub fn decode(buf: &[u8], offset: usize) -> CodecResult<Self> {
        let value_type = read_i32(buf, offset)?;
        let num_elements = read_i32(buf, offset + 4)?;
        let elements_multiplier = read_i32(buf, offset + 8)?;
        let imag = read_i32(buf, offset + 12)?;
        let name_length = read_i32(buf, offset + 16)?;
        let len = non_negative("NameLength", name_length)?;
        let raw = read_bytes(buf, offset + FIXED_HEADER_LEN, len)?;
        let name = std::str::from_utf8(raw).map_err(|_| CodecError::InvalidName)?;
        Self::from_parts(
            value_type,
            num_elements,
            elements_multiplier,
            imag,
            name_length,
            name,
        )
    }
}

fn non_negative(field: &'static str, value: i32) -> CodecResult<usize> {
    usize::try_from(value).map_err(|_| CodecError::NegativeLength { field, value })
}

fn wire_count(value: usize) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_size_formula() {
        for n in [0usize, 1, 6, 8, 64] {
            assert_eq!(header_size(n), n + 20);
        }
    }

    #[test]
    fn test_data_set_size() {
        assert_eq!(data_set_size(ValueType::Float, 8, 4, 4), 92);
        assert_eq!(data_set_size(ValueType::Byte, 8, 10, 1), 38);
    }

    #[test]
    fn test_encode_layout() {
        let header = DataSetHeader::new(ValueType::Float, 54, 1, "E000010\0").unwrap();
        let bytes = header.encode();
        assert_eq!(bytes.len(), 28);
        assert_eq!(&bytes[0..4], &10i32.to_le_bytes());
        assert_eq!(&bytes[4..8], &54i32.to_le_bytes());
        assert_eq!(&bytes[8..12], &1i32.to_le_bytes());
        assert_eq!(&bytes[12..16], &0i32.to_le_bytes());
        assert_eq!(&bytes[16..20], &8i32.to_le_bytes());
        assert_eq!(&bytes[20..28], b"E000010\0");
    }

    #[test]
    fn test_decode_at_offset() {
        let header = DataSetHeader::new(ValueType::Int, 30, 4, "E000006\0")
            .unwrap()
            .with_imag(3);
        let mut buf = vec![0xAAu8; 5];
        buf.extend_from_slice(&header.encode());
        let decoded = DataSetHeader::decode(&buf, 5).unwrap();
        assert_eq!(decoded, header);
        assert_eq!(decoded.imag(), 3);
        assert_eq!(decoded.id(), "E000006");
        assert_eq!(decoded.payload_len(), 30 * 4 * 4);
        assert_eq!(decoded.total_len(), 30 * 4 * 4 + 28);
    }

    #[test]
    fn test_name_length_mismatch() {
        let err = DataSetHeader::from_parts(10, 1, 1, 0, 8, "E000010").unwrap_err();
        assert!(matches!(
            err,
            CodecError::NameLengthMismatch {
                declared: 8,
                actual: 7
            }
        ));
    }

    #[test]
    fn test_negative_counts_rejected() {
        let err = DataSetHeader::from_parts(10, -1, 1, 0, 8, "E000010\0").unwrap_err();
        assert!(matches!(
            err,
            CodecError::NegativeLength {
                field: "NumElements",
                ..
            }
        ));
    }

    #[test]
    fn test_decode_truncated_name() {
        let header = DataSetHeader::new(ValueType::Float, 1, 1, "E000009\0").unwrap();
        let bytes = header.encode();
        assert!(DataSetHeader::decode(&bytes[..24], 0).is_err());
    }

    #[test]
    fn test_unknown_value_type_round_trips() {
        let header = DataSetHeader::from_parts(99, 2, 1, 0, 4, "ABC\0").unwrap();
        assert_eq!(header.value_type(), ValueType::Float);
        let decoded = DataSetHeader::decode(&header.encode(), 0).unwrap();
        assert_eq!(decoded.value_type_tag(), 99);
    }

    #[test]
    fn test_non_ascii_name_rejected() {
        assert!(matches!(
            DataSetHeader::new(ValueType::Float, 1, 1, "É00001\0"),
            Err(CodecError::InvalidName)
        ));
    }
}
