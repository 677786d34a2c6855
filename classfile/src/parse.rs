use byteorder::{BigEndian, ByteOrder};
use thiserror::Error;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Error)]
pub enum ParseError {
    /// The input ended early; `needed` more bytes were required at `offset`.
    #[error("unexpected end of input at offset {offset}: {needed} more byte(s) needed")]
    Incomplete { offset: usize, needed: usize },
    /// A byte did not match what the format requires.
    #[error("unexpected byte at offset {0}")]
    Error(usize),
}

pub type ParseResult<T> = Result<T, ParseError>;

/// A forward-only big-endian cursor over a borrowed byte slice.
///
/// Every slice handed out by the parser borrows from the original input, so
/// large payloads never get copied. Offsets in errors are absolute, even for
/// parsers produced by [`ByteParser::split`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ByteParser<'src> {
    pub src: &'src [u8],
    pub offset: usize,
    base: usize,
}

impl<'src> ByteParser<'src> {
    pub fn new(src: &'src [u8]) -> Self {
        ByteParser {
            src,
            offset: 0,
            base: 0,
        }
    }

    pub fn remaining(&self) -> usize {
        self.src.len() - self.offset
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Absolute offset of the cursor in the outermost input.
    pub fn position(&self) -> usize {
        self.base + self.offset
    }

    fn incomplete(&self, len: usize) -> ParseError {
        ParseError::Incomplete {
            offset: self.position(),
            needed: len - self.remaining(),
        }
    }

    /// Takes `tag.len()` bytes and returns an error if the bytes did not match.
    /// The cursor does not move on failure.
    pub fn expect(&mut self, tag: &[u8]) -> ParseResult<()> {
        if self.remaining() < tag.len() {
            return Err(self.incomplete(tag.len()));
        }

        for (i, &byte) in tag.iter().enumerate() {
            if self.src[self.offset + i] != byte {
                return Err(ParseError::Error(self.position() + i));
            }
        }

        self.offset += tag.len();
        Ok(())
    }

    /// Takes `len` bytes, and errors if there were not enough bytes remaining.
    pub fn take(&mut self, len: usize) -> ParseResult<&'src [u8]> {
        if self.remaining() < len {
            Err(self.incomplete(len))
        } else {
            let res = &self.src[self.offset..self.offset + len];
            self.offset += len;
            Ok(res)
        }
    }

    /// Takes `len` bytes and returns a parser bounded to exactly those bytes.
    pub fn split(&mut self, len: usize) -> ParseResult<ByteParser<'src>> {
        let base = self.position();
        let src = self.take(len)?;
        Ok(ByteParser {
            src,
            offset: 0,
            base,
        })
    }

    /// Like `take`, but does not advance the parser.
    pub fn peek(&self, len: usize) -> ParseResult<&'src [u8]> {
        if self.remaining() < len {
            Err(self.incomplete(len))
        } else {
            Ok(&self.src[self.offset..self.offset + len])
        }
    }

    /// Applies `func` exactly `len` times, and returns a vector of the items
    /// produced by `func`.
    pub fn seq<F, T, E>(&mut self, len: usize, mut func: F) -> Result<Vec<T>, E>
    where
        F: FnMut(&mut Self) -> Result<T, E>,
    {
        let mut vec = Vec::with_capacity(len);
        for _ in 0..len {
            vec.push(func(self)?);
        }
        Ok(vec)
    }

    pub fn parse_u8(&mut self) -> ParseResult<u8> {
        self.take(1).map(|b| b[0])
    }

    pub fn parse_u16(&mut self) -> ParseResult<u16> {
        self.take(2).map(BigEndian::read_u16)
    }

    pub fn parse_u32(&mut self) -> ParseResult<u32> {
        self.take(4).map(BigEndian::read_u32)
    }

    pub fn parse_u64(&mut self) -> ParseResult<u64> {
        self.take(8).map(BigEndian::read_u64)
    }

    pub fn parse_i32(&mut self) -> ParseResult<i32> {
        self.take(4).map(BigEndian::read_i32)
    }

    pub fn parse_i64(&mut self) -> ParseResult<i64> {
        self.take(8).map(BigEndian::read_i64)
    }

    pub fn parse_f32(&mut self) -> ParseResult<f32> {
        self.take(4).map(|b| f32::from_bits(BigEndian::read_u32(b)))
    }

    pub fn parse_f64(&mut self) -> ParseResult<f64> {
        self.take(8).map(|b| f64::from_bits(BigEndian::read_u64(b)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expect_leaves_cursor_on_mismatch() {
        let mut parser = ByteParser::new(b"abcdefgh");
        parser.expect(b"abcd").unwrap();
        assert_eq!(parser.expect(b"ex"), Err(ParseError::Error(4)));
        assert_eq!(parser.remaining(), 4);
    }

    #[test]
    fn test_take_incomplete() {
        let mut parser = ByteParser::new(b"foo");
        assert_eq!(
            parser.take(5),
            Err(ParseError::Incomplete {
                offset: 0,
                needed: 2
            })
        );
        assert_eq!(parser.take(3), Ok(&b"foo"[..]));
        assert!(parser.is_empty());
    }

    #[test]
    fn test_split_reports_absolute_offsets() {
        let mut parser = ByteParser::new(b"\x00\x01\x02\x03\x04");
        parser.parse_u16().unwrap();
        let mut inner = parser.split(2).unwrap();
        assert_eq!(inner.parse_u8(), Ok(2));
        assert_eq!(
            inner.parse_u16(),
            Err(ParseError::Incomplete {
                offset: 3,
                needed: 1
            })
        );
        assert_eq!(parser.position(), 4);
    }

    #[test]
    fn test_big_endian_numbers() {
        let mut parser = ByteParser::new(b"\xCA\xFE\xBA\xBE\xFF\xFF\xFF\xFE");
        assert_eq!(parser.parse_u32(), Ok(0xCAFE_BABE));
        assert_eq!(parser.parse_i32(), Ok(-2));
    }
}
