//! NMEA text dataset
//!
//! The payload is the raw sentence text, one byte per element, usually
//! several `$...*hh\r\n` sentences back to back.

use crate::codec::field::read_bytes;
use crate::codec::field::write_bytes;
use crate::codec::DataSetHeader;
use crate::common::{CodecResult, ValueType};

use super::kind::DataSetKind;

#[derive(Debug, Clone, PartialEq)]
pub struct NmeaData {
    header: DataSetHeader,
    bytes: Vec<u8>,
}

impl NmeaData {
    /// Dataset holding `text` verbatim
    pub fn new(text: &str) -> CodecResult<Self> {
        Self::from_bytes(text.as_bytes().to_vec())
    }

    pub fn from_bytes(bytes: Vec<u8>) -> CodecResult<Self> {
        let header =
            DataSetHeader::new(ValueType::Byte, bytes.len(), 1, DataSetKind::Nmea.name())?;
        Ok(Self { header, bytes })
    }

    /// Dataset from individual sentences, each terminated with CRLF
    pub fn from_sentences<'a>(sentences: impl IntoIterator<Item = &'a str>) -> CodecResult<Self> {
        let mut text = String::new();
        for s in sentences {
            text.push_str(s.trim_end());
            text.push_str("\r\n");
        }
        Self::new(&text)
    }

    pub fn header(&self) -> &DataSetHeader {
        &self.header
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Payload as text; invalid UTF-8 is replaced
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }

    /// Non-empty sentences with line endings and NUL padding stripped
    pub fn sentences(&self) -> Vec<String> {
        self.text()
            .split('\n')
            .map(|s| s.trim_end_matches(['\r', '\0']).trim_start_matches('\0'))
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn encoded_len(&self) -> usize {
        self.header.total_len()
    }

    pub fn encode_into(&self, buf: &mut [u8], offset: usize) -> CodecResult<usize> {
        let header_len = self.header.encode_into(buf, offset)?;
        write_bytes(buf, offset + header_len, &self.bytes)?;
        Ok(self.encoded_len())
    }

    pub fn encode(&self) -> CodecResult<Vec<u8>> {
        let mut buf = vec![0u8; self.encoded_len()];
        self.encode_into(&mut buf, 0)?;
        Ok(buf)
    }

    /// Read the payload of a block whose header was read at `offset`
    pub fn decode(header: DataSetHeader, buf: &[u8], offset: usize) -> CodecResult<Self> {
        super::check_fits(&header, buf, offset)?;
        let bytes = read_bytes(buf, offset + header.header_len(), header.payload_len())?.to_vec();
        Ok(Self { header, bytes })
    }
}
