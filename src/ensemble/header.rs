//! Ensemble header
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │  Sync: 16 x 0x80                 (16 B)  │
//! │  EnsembleNumber       i32 LE      (4 B)  │
//! │  !EnsembleNumber      i32 LE      (4 B)  │
//! │  PayloadSize          i32 LE      (4 B)  │
//! │  !PayloadSize         i32 LE      (4 B)  │
//! ├──────────────────────────────────────────┤
//! │  Payload (dataset blocks)                │
//! ├──────────────────────────────────────────┤
//! │  Checksum  u32 LE, low 16 bits   (4 B)   │
//! └──────────────────────────────────────────┘
//! ```

use crate::codec::field::{read_bytes, read_i32, write_i32};
use crate::common::framing::{
    CHECKSUM_SIZE, ENSEMBLE_HEADER_LEN, ENSEMBLE_NUMBER_OFFSET, HEADER_START_COUNT,
    PAYLOAD_SIZE_OFFSET, SYNC_BYTE,
};
use crate::common::{CodecError, CodecResult};

/// The 32 fixed bytes in front of every ensemble payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnsembleHeader {
    pub ensemble_number: i32,
    pub payload_size: usize,
}

impl EnsembleHeader {
    pub fn new(ensemble_number: i32, payload_size: usize) -> Self {
        Self {
            ensemble_number,
            payload_size,
        }
    }

    /// Header + payload + checksum
    pub fn total_len(&self) -> usize {
        ENSEMBLE_HEADER_LEN + self.payload_size + CHECKSUM_SIZE
    }

    /// Byte range of the payload relative to the ensemble start
    pub fn payload_range(&self) -> std::ops::Range<usize> {
        ENSEMBLE_HEADER_LEN..ENSEMBLE_HEADER_LEN + self.payload_size
    }

    /// Write the header at `offset`
    pub fn encode_into(&self, buf: &mut [u8], offset: usize) -> CodecResult<()> {
        let len = buf.len();
        let sync = buf
            .get_mut(offset..offset + HEADER_START_COUNT)
            .ok_or_else(|| CodecError::too_short(offset, ENSEMBLE_HEADER_LEN, len))?;
        sync.fill(SYNC_BYTE);
        let size = i32::try_from(self.payload_size).map_err(|_| CodecError::FieldShape {
            field: "PayloadSize".to_string(),
            expected: i32::MAX as usize,
            actual: self.payload_size,
        })?;
        write_i32(buf, offset + ENSEMBLE_NUMBER_OFFSET, self.ensemble_number)?;
        write_i32(buf, offset + ENSEMBLE_NUMBER_OFFSET + 4, !self.ensemble_number)?;
        write_i32(buf, offset + PAYLOAD_SIZE_OFFSET, size)?;
        write_i32(buf, offset + PAYLOAD_SIZE_OFFSET + 4, !size)?;
        Ok(())
    }

    pub fn to_bytes(&self) -> CodecResult<[u8; ENSEMBLE_HEADER_LEN]> {
        let mut buf = [0u8; ENSEMBLE_HEADER_LEN];
        self.encode_into(&mut buf, 0)?;
        Ok(buf)
    }

    /// Parse and self-check the header at `offset`
    pub fn decode(buf: &[u8], offset: usize) -> CodecResult<Self> {
        if !has_sync(buf, offset) {
            // Distinguish a short buffer from a wrong pattern
            read_bytes(buf, offset, HEADER_START_COUNT)?;
            return Err(CodecError::MissingSync { offset });
        }

        let ensemble_number = read_i32(buf, offset + ENSEMBLE_NUMBER_OFFSET)?;
        let complement = read_i32(buf, offset + ENSEMBLE_NUMBER_OFFSET + 4)?;
        if complement != !ensemble_number {
            return Err(CodecError::ComplementMismatch {
                field: "EnsembleNumber",
                value: ensemble_number,
                complement,
            });
        }

        let payload_size = read_i32(buf, offset + PAYLOAD_SIZE_OFFSET)?;
        let complement = read_i32(buf, offset + PAYLOAD_SIZE_OFFSET + 4)?;
        if complement != !payload_size {
            return Err(CodecError::ComplementMismatch {
                field: "PayloadSize",
                value: payload_size,
                complement,
            });
        }
        let payload_size = usize::try_from(payload_size).map_err(|_| CodecError::NegativeLength {
            field: "PayloadSize",
            value: payload_size,
        })?;

        Ok(Self {
            ensemble_number,
            payload_size,
        })
    }
}

/// True if the 16-byte sync run starts at `offset`
pub fn has_sync(buf: &[u8], offset: usize) -> bool {
    buf.get(offset..offset.saturating_add(HEADER_START_COUNT))
        .is_some_and(|run| run.len() == HEADER_START_COUNT && run.iter().all(|&b| b == SYNC_BYTE))
}
