//! Primitive field access at byte offsets
//!
//! All multi-byte fields are 4 bytes little-endian. Reads and writes are
//! bounds checked and report [`CodecError::BufferTooShort`] instead of
//! panicking.

use crate::common::framing::BYTES_IN_WORD;
use crate::common::{CodecError, CodecResult};

#[inline]
fn word(buf: &[u8], offset: usize) -> CodecResult<[u8; BYTES_IN_WORD]> {
    let end = offset
        .checked_add(BYTES_IN_WORD)
        .ok_or_else(|| CodecError::too_short(offset, BYTES_IN_WORD, buf.len()))?;
    let bytes = buf
        .get(offset..end)
        .ok_or_else(|| CodecError::too_short(offset, BYTES_IN_WORD, buf.len()))?;
    Ok([bytes[0], bytes[1], bytes[2], bytes[3]])
}

#[inline]
fn word_mut(buf: &mut [u8], offset: usize) -> CodecResult<&mut [u8]> {
    let len = buf.len();
    let end = offset
        .checked_add(BYTES_IN_WORD)
        .ok_or_else(|| CodecError::too_short(offset, BYTES_IN_WORD, len))?;
    buf.get_mut(offset..end)
        .ok_or_else(|| CodecError::too_short(offset, BYTES_IN_WORD, len))
}

/// Read a little-endian int32
#[inline]
pub fn read_i32(buf: &[u8], offset: usize) -> CodecResult<i32> {
    Ok(i32::from_le_bytes(word(buf, offset)?))
}

/// Read a little-endian IEEE-754 float32
#[inline]
pub fn read_f32(buf: &[u8], offset: usize) -> CodecResult<f32> {
    Ok(f32::from_le_bytes(word(buf, offset)?))
}

/// Read the raw 32 bits of a field without interpreting them
#[inline]
pub fn read_u32(buf: &[u8], offset: usize) -> CodecResult<u32> {
    Ok(u32::from_le_bytes(word(buf, offset)?))
}

/// Read a single byte
#[inline]
pub fn read_u8(buf: &[u8], offset: usize) -> CodecResult<u8> {
    buf.get(offset)
        .copied()
        .ok_or_else(|| CodecError::too_short(offset, 1, buf.len()))
}

/// Write a little-endian int32
#[inline]
pub fn write_i32(buf: &mut [u8], offset: usize, value: i32) -> CodecResult<()> {
    word_mut(buf, offset)?.copy_from_slice(&value.to_le_bytes());
    Ok(())
}

/// Write a little-endian IEEE-754 float32
#[inline]
pub fn write_f32(buf: &mut [u8], offset: usize, value: f32) -> CodecResult<()> {
    word_mut(buf, offset)?.copy_from_slice(&value.to_le_bytes());
    Ok(())
}

/// Write raw 32 bits
#[inline]
pub fn write_u32(buf: &mut [u8], offset: usize, value: u32) -> CodecResult<()> {
    word_mut(buf, offset)?.copy_from_slice(&value.to_le_bytes());
    Ok(())
}

/// Write a single byte
#[inline]
pub fn write_u8(buf: &mut [u8], offset: usize, value: u8) -> CodecResult<()> {
    let len = buf.len();
    let slot = buf
        .get_mut(offset)
        .ok_or_else(|| CodecError::too_short(offset, 1, len))?;
    *slot = value;
    Ok(())
}

/// Borrow `len` bytes starting at `offset`
#[inline]
pub fn read_bytes(buf: &[u8], offset: usize, len: usize) -> CodecResult<&[u8]> {
    offset
        .checked_add(len)
        .and_then(|end| buf.get(offset..end))
        .ok_or_else(|| CodecError::too_short(offset, len, buf.len()))
}

/// Copy `src` into the buffer at `offset`
#[inline]
pub fn write_bytes(buf: &mut [u8], offset: usize, src: &[u8]) -> CodecResult<()> {
    let len = buf.len();
    let dst = offset
        .checked_add(src.len())
        .and_then(|end| buf.get_mut(offset..end))
        .ok_or_else(|| CodecError::too_short(offset, src.len(), len))?;
    dst.copy_from_slice(src);
    Ok(())
}
