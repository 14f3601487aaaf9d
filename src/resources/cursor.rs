//! Sequential little-endian reader with nested length-prefixed frames.
//!
//! A frame starts with a `u32` byte length. [`ByteCursor::push`] records where
//! the frame ends and [`ByteCursor::skip`] jumps there, whatever was left
//! unread. Every primitive read is bounded by the innermost open frame, so a
//! malformed length can never make the parser read into its neighbours.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("read of {wanted} bytes at offset {offset} exceeds limit {limit}")]
    UnexpectedEof {
        offset: usize,
        wanted: usize,
        limit: usize,
    },
    #[error("frame at offset {offset} ends at {end}, beyond enclosing limit {limit}")]
    FrameOverrun {
        offset: usize,
        end: usize,
        limit: usize,
    },
    #[error("skip at offset {offset} without an open frame")]
    UnbalancedSkip { offset: usize },
}

pub type ParseResult<T> = Result<T, ParseError>;

#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    bytes: &'a [u8],
    offset: usize,
    /// Absolute end offsets of the open frames, innermost last.
    bookmarks: Vec<usize>,
}

impl<'a> ByteCursor<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            offset: 0,
            bookmarks: Vec::new(),
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn depth(&self) -> usize {
        self.bookmarks.len()
    }

    /// End of the innermost open frame, or of the buffer.
    pub fn limit(&self) -> usize {
        self.bookmarks.last().copied().unwrap_or(self.bytes.len())
    }

    pub fn remaining(&self) -> usize {
        self.limit().saturating_sub(self.offset)
    }

    fn take(&mut self, wanted: usize) -> ParseResult<&'a [u8]> {
        let limit = self.limit();
        let end = self
            .offset
            .checked_add(wanted)
            .filter(|end| *end <= limit)
            .ok_or(ParseError::UnexpectedEof {
                offset: self.offset,
                wanted,
                limit,
            })?;
        let bytes: &'a [u8] = self.bytes;
        let span = &bytes[self.offset..end];
        self.offset = end;
        Ok(span)
    }

    fn take_array<const N: usize>(&mut self) -> ParseResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> ParseResult<u8> {
        Ok(self.take_array::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> ParseResult<u16> {
        Ok(u16::from_le_bytes(self.take_array()?))
    }

    pub fn read_u32(&mut self) -> ParseResult<u32> {
        Ok(u32::from_le_bytes(self.take_array()?))
    }

    pub fn read_i32(&mut self) -> ParseResult<i32> {
        Ok(i32::from_le_bytes(self.take_array()?))
    }

    pub fn read_f32(&mut self) -> ParseResult<f32> {
        Ok(f32::from_le_bytes(self.take_array()?))
    }

    pub fn read_f32s<const N: usize>(&mut self) -> ParseResult<[f32; N]> {
        let mut out = [0.0; N];
        for value in out.iter_mut() {
            *value = self.read_f32()?;
        }
        Ok(out)
    }

    /// Reads a `u32`-length-prefixed string. Trailing NUL padding is dropped
    /// and invalid UTF-8 is replaced rather than rejected.
    pub fn read_string(&mut self) -> ParseResult<String> {
        let len = self.read_u32()? as usize;
        let raw = self.take(len)?;
        let end = raw.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
        Ok(String::from_utf8_lossy(&raw[..end]).into_owned())
    }

    /// Reads a frame length and opens a frame ending that many bytes after it.
    pub fn push(&mut self) -> ParseResult<()> {
        let len = self.read_u32()? as usize;
        let limit = self.limit();
        let end = self.offset.saturating_add(len);
        if end > limit {
            return Err(ParseError::FrameOverrun {
                offset: self.offset,
                end,
                limit,
            });
        }
        self.bookmarks.push(end);
        Ok(())
    }

    /// Closes the innermost frame and moves to its end, discarding unread bytes.
    pub fn skip(&mut self) -> ParseResult<()> {
        let end = self.bookmarks.pop().ok_or(ParseError::UnbalancedSkip {
            offset: self.offset,
        })?;
        if end > self.offset {
            log::debug!(
                "discarding {} unread bytes at offset {}",
                end - self.offset,
                self.offset
            );
        }
        self.offset = end;
        Ok(())
    }
}
