//! Modified UTF-8, the string encoding of `Utf8` pool entries.
//!
//! It differs from standard UTF-8 in two ways: NUL is written as the overlong
//! pair `C0 80`, and supplementary characters are written as a surrogate pair
//! with each surrogate encoded as its own three byte sequence.

use crate::{parse::ByteParser, ClassError, ClassResult};
use std::borrow::Cow;

/// Collects output bytes, staying borrowed from the input for as long as the
/// output is byte-for-byte identical to it.
struct CowBuilder<'a> {
    src: &'a [u8],
    owned: Option<Vec<u8>>,
    pos: usize,
}

impl<'a> CowBuilder<'a> {
    fn new(src: &'a [u8]) -> Self {
        CowBuilder {
            src,
            owned: None,
            pos: 0,
        }
    }

    fn push(&mut self, byte: u8) {
        match &mut self.owned {
            Some(vec) => vec.push(byte),
            None if self.src.get(self.pos) == Some(&byte) => self.pos += 1,
            None => {
                let mut vec = self.src[..self.pos].to_vec();
                vec.push(byte);
                self.owned = Some(vec);
            }
        }
    }

    fn extend(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.push(byte);
        }
    }

    fn into_inner(self) -> Cow<'a, [u8]> {
        match self.owned {
            Some(vec) => Cow::Owned(vec),
            None => Cow::Borrowed(&self.src[..self.pos]),
        }
    }
}

fn is_continuation(byte: u8) -> bool {
    byte & 0xc0 == 0x80
}

/// Whether `tail` holds the rest of a surrogate pair whose first byte was
/// `ED`: the high surrogate's last two bytes, then a whole low surrogate.
fn is_pair_tail(tail: &[u8]) -> bool {
    tail[0] & 0xf0 == 0xa0
        && is_continuation(tail[1])
        && tail[2] == 0xed
        && tail[3] & 0xf0 == 0xb0
        && is_continuation(tail[4])
}

/// Decodes modified UTF-8.
///
/// A surrogate that is not half of a pair has no `str` representation. Such
/// input fails with [`ClassError::UnpairedSurrogate`], but only once the rest
/// of it has been checked, so that callers can keep the bytes verbatim.
pub fn parse_mutf8(bytes: &[u8]) -> ClassResult<Cow<'_, str>> {
    let mut parser = ByteParser::new(bytes);
    let mut builder = CowBuilder::new(bytes);
    let mut unpaired = None;

    macro_rules! invalid {
        ($byte:expr) => {
            return Err(ClassError::InvalidModifiedUtf8 {
                offset: parser.offset - 1,
                byte: $byte,
            })
        };
    }

    while !parser.is_empty() {
        let start = parser.offset;
        let b1 = parser.parse_u8()?;
        if b1 == 0 || b1 >= 0xf0 {
            invalid!(b1);
        }

        if b1 & 0x80 == 0 {
            // 0xxxxxxx
            builder.push(b1);
        } else if b1 & 0xe0 == 0xc0 {
            // 110xxxxx 10xxxxxx
            let b2 = parser.parse_u8()?;
            if !is_continuation(b2) {
                invalid!(b2);
            }

            // NUL is stored overlong; everything else passes through
            if b1 == 0xc0 && b2 == 0x80 {
                builder.push(0);
            } else if b1 < 0xc2 {
                invalid!(b1);
            } else {
                builder.push(b1);
                builder.push(b2);
            }
        } else if b1 == 0xed && parser.peek(5).map(is_pair_tail).unwrap_or(false) {
            // 11101101 1010xxxx 10xxxxxx 11101101 1011yyyy 10yyyyyy
            let tail = parser.take(5)?;
            let scalar = 0x10000
                + ((tail[0] as u32 & 0x0f) << 16)
                + ((tail[1] as u32 & 0x3f) << 10)
                + ((tail[3] as u32 & 0x0f) << 6)
                + (tail[4] as u32 & 0x3f);
            let ch = match std::char::from_u32(scalar) {
                Some(ch) => ch,
                None => invalid!(tail[4]),
            };

            let mut utf8 = [0; 4];
            builder.extend(ch.encode_utf8(&mut utf8).as_bytes());
        } else if b1 & 0xf0 == 0xe0 {
            // 1110xxxx 10xxxxxx 10xxxxxx
            let b2 = parser.parse_u8()?;
            if !is_continuation(b2) {
                invalid!(b2);
            }

            let b3 = parser.parse_u8()?;
            if !is_continuation(b3) {
                invalid!(b3);
            }

            // ED A0..ED BF encode U+D800..U+DFFF
            if b1 == 0xed && b2 >= 0xa0 {
                unpaired.get_or_insert(start);
            }

            builder.push(b1);
            builder.push(b2);
            builder.push(b3);
        } else {
            invalid!(b1);
        }
    }

    if let Some(offset) = unpaired {
        return Err(ClassError::UnpairedSurrogate { offset });
    }

    // Overlong three byte forms survive the checks above, so the result
    // still has to be validated.
    match builder.into_inner() {
        Cow::Borrowed(slice) => std::str::from_utf8(slice).map(Cow::Borrowed),
        Cow::Owned(vec) => String::from_utf8(vec)
            .map(Cow::Owned)
            .map_err(|err| err.utf8_error()),
    }
    .map_err(|err| ClassError::InvalidModifiedUtf8 {
        offset: err.valid_up_to(),
        byte: bytes.get(err.valid_up_to()).copied().unwrap_or(0),
    })
}

/// Encodes `text` as modified UTF-8, borrowing when no rewriting is needed.
pub fn encode_mutf8(text: &str) -> Cow<'_, [u8]> {
    let needs_rewrite = text.chars().any(|ch| ch == '\0' || ch as u32 > 0xffff);
    if !needs_rewrite {
        return Cow::Borrowed(text.as_bytes());
    }

    let mut out = Vec::with_capacity(text.len() + 4);
    for ch in text.chars() {
        match ch {
            '\0' => out.extend_from_slice(&[0xc0, 0x80]),
            ch if ch as u32 > 0xffff => {
                let mut units = [0; 2];
                for &unit in ch.encode_utf16(&mut units).iter() {
                    out.push(0xe0 | (unit >> 12) as u8);
                    out.push(0x80 | ((unit >> 6) & 0x3f) as u8);
                    out.push(0x80 | (unit & 0x3f) as u8);
                }
            }
            ch => {
                let mut utf8 = [0; 4];
                out.extend_from_slice(ch.encode_utf8(&mut utf8).as_bytes());
            }
        }
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mutf8_normal() {
        let string = "Hello, world!";
        match parse_mutf8(string.as_bytes()) {
            Ok(Cow::Borrowed(text)) => assert_eq!(text, string),
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn test_mutf8_non_latin() {
        let string = "Здравствуй, мир 한국어";
        match parse_mutf8(string.as_bytes()) {
            Ok(Cow::Borrowed(text)) => assert_eq!(text, string),
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn test_mutf8_supplementary() {
        let string = &[0x41, 0xed, 0xa0, 0xb4, 0xed, 0xbc, 0xb9];
        match parse_mutf8(string) {
            Ok(Cow::Owned(text)) => assert_eq!(text, "A𝌹"),
            other => panic!("{:?}", other),
        }
        assert_eq!(&*encode_mutf8("A𝌹"), &string[..]);
    }

    #[test]
    fn test_mutf8_overlong_nul() {
        let string = b"foo\xc0\x80bar\xc0\x80baz";
        assert_eq!(
            parse_mutf8(string).unwrap(),
            Cow::<str>::Owned(String::from("foo\0bar\0baz"))
        );
        assert_eq!(&*encode_mutf8("foo\0bar\0baz"), &string[..]);
    }

    #[test]
    fn test_mutf8_invalid_nul() {
        let string = b"foo\0bar";
        assert_eq!(
            parse_mutf8(string),
            Err(ClassError::InvalidModifiedUtf8 { offset: 3, byte: 0 })
        );
    }

    #[test]
    fn test_mutf8_unpaired_surrogates() {
        // high surrogate with nothing after it
        assert_eq!(
            parse_mutf8(&[b'a', 0xed, 0xa0, 0x80]),
            Err(ClassError::UnpairedSurrogate { offset: 1 })
        );
        // low surrogate on its own
        assert_eq!(
            parse_mutf8(&[0xed, 0xb0, 0x80]),
            Err(ClassError::UnpairedSurrogate { offset: 0 })
        );
        // high surrogate followed by an ordinary character
        assert_eq!(
            parse_mutf8(&[0xed, 0xa0, 0x80, b'x', 0xed, 0xa0, 0xb4, 0xed, 0xbc, 0xb9]),
            Err(ClassError::UnpairedSurrogate { offset: 0 })
        );
    }

    #[test]
    fn test_mutf8_structure_checked_before_surrogates() {
        assert_eq!(
            parse_mutf8(&[0xed, 0xb0, 0x80, 0xe0, 0x41]),
            Err(ClassError::InvalidModifiedUtf8 { offset: 4, byte: 0x41 })
        );
    }

    #[test]
    fn test_encode_borrows_plain_text() {
        assert!(matches!(encode_mutf8("java/lang/Object"), Cow::Borrowed(_)));
    }
}
