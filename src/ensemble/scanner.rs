//! Locating ensembles in a byte stream
//!
//! Recorded files and serial captures contain ensembles back to back,
//! sometimes with line noise or partial writes between them. Both readers
//! here search for the 16-byte sync run, check the header complements and
//! only then hand a whole frame to [`Ensemble::decode_with`]. A header that
//! fails its self-check is treated as a false sync: the readers step one
//! byte past it and search again.

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::debug;

use crate::common::framing::{ENSEMBLE_HEADER_LEN, HEADER_START_COUNT, SYNC_BYTE};
use crate::common::{CodecError, CodecResult};

use super::{DecodeOptions, DecodedEnsemble, Ensemble, EnsembleHeader};

/// Frames larger than this are treated as corrupt headers
pub const MAX_ENSEMBLE_LEN: usize = 16 * 1024 * 1024;

const READ_CHUNK: usize = 64 * 1024;

/// Offset of the first full sync run at or after `from`
pub fn find_sync(buf: &[u8], from: usize) -> Option<usize> {
    let mut run = 0;
    for (i, &b) in buf.iter().enumerate().skip(from) {
        if b == SYNC_BYTE {
            run += 1;
            if run == HEADER_START_COUNT {
                return Some(i + 1 - HEADER_START_COUNT);
            }
        } else {
            run = 0;
        }
    }
    None
}

/// Length of the trailing run of sync bytes, capped below a full run
fn partial_sync_tail(buf: &[u8]) -> usize {
    buf.iter()
        .rev()
        .take(HEADER_START_COUNT - 1)
        .take_while(|&&b| b == SYNC_BYTE)
        .count()
}

/// Header at `buf[0]` if it passes its self-check and is of sane length
fn frame_header(buf: &[u8]) -> Option<EnsembleHeader> {
    EnsembleHeader::decode(buf, 0)
        .ok()
        .filter(|h| h.total_len() <= MAX_ENSEMBLE_LEN)
}

/// Iterator over the ensembles in an in-memory buffer
///
/// Yields `Err` for frames whose header is sound but whose content fails to
/// decode; those frames are skipped as a whole.
#[derive(Debug)]
pub struct EnsembleScanner<'a> {
    buf: &'a [u8],
    pos: usize,
    opts: DecodeOptions,
    bytes_skipped: usize,
}

impl<'a> EnsembleScanner<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self::with_options(buf, DecodeOptions::default())
    }

    pub fn with_options(buf: &'a [u8], opts: DecodeOptions) -> Self {
        Self {
            buf,
            pos: 0,
            opts,
            bytes_skipped: 0,
        }
    }

    /// Bytes that were not part of any framed ensemble
    pub fn bytes_skipped(&self) -> usize {
        self.bytes_skipped
    }

    /// Current read position
    pub fn position(&self) -> usize {
        self.pos
    }
}

impl Iterator for EnsembleScanner<'_> {
    type Item = CodecResult<DecodedEnsemble>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let Some(start) = find_sync(self.buf, self.pos) else {
                self.bytes_skipped += self.buf.len() - self.pos;
                self.pos = self.buf.len();
                return None;
            };
            self.bytes_skipped += start - self.pos;
            let rest = &self.buf[start..];

            let header = match frame_header(rest) {
                Some(h) if rest.len() >= h.total_len() => h,
                _ => {
                    debug!(offset = start, "No valid ensemble at sync, resyncing");
                    self.bytes_skipped += 1;
                    self.pos = start + 1;
                    continue;
                }
            };

            self.pos = start + header.total_len();
            return Some(Ensemble::decode_with(&rest[..header.total_len()], &self.opts));
        }
    }
}

/// Reads ensembles from an async byte source
///
/// ```no_run
/// # async fn run() -> adcp_rs::common::CodecResult<()> {
/// use adcp_rs::ensemble::AsyncEnsembleReader;
///
/// let file = tokio::fs::File::open("capture.ens").await?;
/// let mut reader = AsyncEnsembleReader::new(file);
/// while let Some(decoded) = reader.next_ensemble().await? {
///     println!("{}", decoded.ensemble.ensemble_number());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct AsyncEnsembleReader<R> {
    reader: R,
    buffer: BytesMut,
    opts: DecodeOptions,
    bytes_skipped: u64,
    eof: bool,
}

impl<R: AsyncRead + Unpin> AsyncEnsembleReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_options(reader, DecodeOptions::default())
    }

    pub fn with_options(reader: R, opts: DecodeOptions) -> Self {
        Self {
            reader,
            buffer: BytesMut::with_capacity(READ_CHUNK),
            opts,
            bytes_skipped: 0,
            eof: false,
        }
    }

    /// Bytes discarded while searching for ensembles
    pub fn bytes_skipped(&self) -> u64 {
        self.bytes_skipped
    }

    fn discard(&mut self, n: usize) {
        self.buffer.advance(n);
        self.bytes_skipped += n as u64;
    }

    /// Take one complete frame out of the buffer, if there is one
    fn next_frame(&mut self) -> Option<BytesMut> {
        loop {
            match find_sync(&self.buffer, 0) {
                Some(start) => self.discard(start),
                None => {
                    let keep = partial_sync_tail(&self.buffer);
                    self.discard(self.buffer.len() - keep);
                    return None;
                }
            }
            if self.buffer.len() < ENSEMBLE_HEADER_LEN {
                return None;
            }
            let Some(header) = frame_header(&self.buffer) else {
                debug!(skipped = self.bytes_skipped, "No valid ensemble at sync, resyncing");
                self.discard(1);
                continue;
            };
            if self.buffer.len() < header.total_len() {
                return None;
            }
            return Some(self.buffer.split_to(header.total_len()));
        }
    }

    /// Next ensemble, or `Ok(None)` at end of input.
    ///
    /// A frame that is cut off by end of input is reported once as
    /// [`CodecError::TruncatedEnsemble`].
    pub async fn next_ensemble(&mut self) -> CodecResult<Option<DecodedEnsemble>> {
        loop {
            if let Some(frame) = self.next_frame() {
                return Ensemble::decode_with(&frame, &self.opts).map(Some);
            }

            if self.eof {
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                let available = self.buffer.len();
                let header = frame_header(&self.buffer);
                self.discard(available);
                return match header {
                    Some(h) => Err(CodecError::TruncatedEnsemble {
                        declared: h.total_len(),
                        available,
                    }),
                    None => Ok(None),
                };
            }

            self.buffer.reserve(READ_CHUNK);
            if self.reader.read_buf(&mut self.buffer).await? == 0 {
                self.eof = true;
            }
        }
    }
}
