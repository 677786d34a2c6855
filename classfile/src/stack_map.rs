//! The `StackMapTable` attribute.
//!
//! ```txt
//! VerificationType {
//!     tag: u8,
//!     data: match tag {
//!         0 => Top,
//!         1 => Integer,
//!         2 => Float,
//!         3 => Double,
//!         4 => Long,
//!         5 => Null,
//!         6 => UninitializedThis,
//!         7 => Object {
//!             index: u16,
//!         },
//!         8 => Uninitialized {
//!             offset: u16,
//!         },
//!     }
//! }
//!
//! StackMapFrame {
//!     frame_type: u8,
//!     frame: match frame_type {
//!         0..=63 => StackMapFrame::Same {}
//!         64..=127 => StackMapFrame::SameLocalsOneStackItem {
//!             stack: VerificationType
//!         }
//!         128..=246 => reserved
//!         247 => StackMapFrame::SameLocalsOneStackItemExtended {
//!             offset_delta: u16
//!             stack: VerificationType
//!         }
//!         248..=250 => StackMapFrame::Chop {
//!             offset_delta: u16
//!         }
//!         251 => StackMapFrame::SameExtended {
//!             offset_delta: u16
//!         }
//!         252..=254 => StackMapFrame::Append {
//!             offset_delta: u16
//!             locals: [VerificationType; frame_type - 251]
//!         }
//!         255 => StackMapFrame::Full {
//!             offset_delta: u16
//!             locals_count: u16
//!             locals: [VerificationType; locals_count]
//!             stack_count: u16
//!             stack: [VerificationType; stack_count]
//!         }
//!     },
//! }
//! ```
//!
//! Object types keep their raw pool index: they are addressed the same way the
//! bytecode addresses the pool, and the pool builder never moves an entry.

use crate::{
    constant::PoolIndex,
    parse::ByteParser,
    write::ByteWriter,
    ClassError, ClassResult,
};
use std::ops::RangeInclusive;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum VerificationType {
    Top,
    Integer,
    Float,
    Double,
    Long,
    Null,
    UninitializedThis,
    Object(PoolIndex),
    /// The offset of the `new` instruction that created the object.
    Uninitialized(u16),
}

/// A frame. Where the offset delta is folded into `frame_type` the byte is
/// kept as is.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum StackMapFrame {
    Same {
        frame_type: u8,
    },
    SameLocalsOneStackItem {
        frame_type: u8,
        stack: VerificationType,
    },
    SameLocalsOneStackItemExtended {
        offset_delta: u16,
        stack: VerificationType,
    },
    /// Removes the last `251 - frame_type` locals.
    Chop {
        frame_type: u8,
        offset_delta: u16,
    },
    SameExtended {
        offset_delta: u16,
    },
    Append {
        offset_delta: u16,
        locals: Box<[VerificationType]>,
    },
    Full {
        offset_delta: u16,
        locals: Box<[VerificationType]>,
        stack: Box<[VerificationType]>,
    },
}

impl StackMapFrame {
    pub fn offset_delta(&self) -> u16 {
        match *self {
            StackMapFrame::Same { frame_type } => frame_type as u16,
            StackMapFrame::SameLocalsOneStackItem { frame_type, .. } => {
                (frame_type as u16).saturating_sub(64)
            }
            StackMapFrame::SameLocalsOneStackItemExtended { offset_delta, .. }
            | StackMapFrame::Chop { offset_delta, .. }
            | StackMapFrame::SameExtended { offset_delta }
            | StackMapFrame::Append { offset_delta, .. }
            | StackMapFrame::Full { offset_delta, .. } => offset_delta,
        }
    }
}

pub fn parse_verification_type(input: &mut ByteParser<'_>) -> ClassResult<VerificationType> {
    Ok(match input.parse_u8()? {
        0 => VerificationType::Top,
        1 => VerificationType::Integer,
        2 => VerificationType::Float,
        3 => VerificationType::Double,
        4 => VerificationType::Long,
        5 => VerificationType::Null,
        6 => VerificationType::UninitializedThis,
        7 => VerificationType::Object(input.parse_u16()? as usize),
        8 => VerificationType::Uninitialized(input.parse_u16()?),

        other => return Err(ClassError::UnknownVerificationType(other)),
    })
}

fn parse_verification_types(
    input: &mut ByteParser<'_>,
    len: usize,
) -> ClassResult<Box<[VerificationType]>> {
    input.seq(len, parse_verification_type).map(Into::into)
}

pub fn parse_stack_map_frame(input: &mut ByteParser<'_>) -> ClassResult<StackMapFrame> {
    let frame_type = input.parse_u8()?;

    Ok(match frame_type {
        0..=63 => StackMapFrame::Same { frame_type },
        64..=127 => StackMapFrame::SameLocalsOneStackItem {
            frame_type,
            stack: parse_verification_type(input)?,
        },
        247 => StackMapFrame::SameLocalsOneStackItemExtended {
            offset_delta: input.parse_u16()?,
            stack: parse_verification_type(input)?,
        },
        248..=250 => StackMapFrame::Chop {
            frame_type,
            offset_delta: input.parse_u16()?,
        },
        251 => StackMapFrame::SameExtended {
            offset_delta: input.parse_u16()?,
        },
        252..=254 => {
            let offset_delta = input.parse_u16()?;
            let locals = parse_verification_types(input, frame_type as usize - 251)?;
            StackMapFrame::Append {
                offset_delta,
                locals,
            }
        }
        255 => {
            let offset_delta = input.parse_u16()?;
            let locals_len = input.parse_u16()? as usize;
            let locals = parse_verification_types(input, locals_len)?;
            let stack_len = input.parse_u16()? as usize;
            let stack = parse_verification_types(input, stack_len)?;
            StackMapFrame::Full {
                offset_delta,
                locals,
                stack,
            }
        }
        other => return Err(ClassError::UnknownStackMapFrameType(other)),
    })
}

pub fn parse_stack_map_table(input: &mut ByteParser<'_>) -> ClassResult<Box<[StackMapFrame]>> {
    let len = input.parse_u16()? as usize;
    input.seq(len, parse_stack_map_frame).map(Into::into)
}

pub fn write_verification_type(out: &mut ByteWriter, ty: &VerificationType) -> ClassResult<()> {
    match *ty {
        VerificationType::Top => out.write_u8(0),
        VerificationType::Integer => out.write_u8(1),
        VerificationType::Float => out.write_u8(2),
        VerificationType::Double => out.write_u8(3),
        VerificationType::Long => out.write_u8(4),
        VerificationType::Null => out.write_u8(5),
        VerificationType::UninitializedThis => out.write_u8(6),
        VerificationType::Object(index) => {
            out.write_u8(7);
            out.write_index(index)?;
        }
        VerificationType::Uninitialized(offset) => {
            out.write_u8(8);
            out.write_u16(offset);
        }
    }
    Ok(())
}

fn write_verification_types(
    out: &mut ByteWriter,
    types: &[VerificationType],
) -> ClassResult<()> {
    types
        .iter()
        .try_for_each(|ty| write_verification_type(out, ty))
}

/// The frame type byte of a compact frame has to fall in the range of its
/// form, or the frame reads back as something else.
fn check_frame_type(
    frame_type: u8,
    range: RangeInclusive<u8>,
    form: &'static str,
) -> ClassResult<u8> {
    if range.contains(&frame_type) {
        Ok(frame_type)
    } else {
        Err(ClassError::FrameTypeMismatch { frame_type, form })
    }
}

pub fn write_stack_map_frame(out: &mut ByteWriter, frame: &StackMapFrame) -> ClassResult<()> {
    match frame {
        StackMapFrame::Same { frame_type } => {
            out.write_u8(check_frame_type(*frame_type, 0..=63, "same")?);
        }
        StackMapFrame::SameLocalsOneStackItem { frame_type, stack } => {
            out.write_u8(check_frame_type(
                *frame_type,
                64..=127,
                "same_locals_1_stack_item",
            )?);
            write_verification_type(out, stack)?;
        }
        StackMapFrame::SameLocalsOneStackItemExtended {
            offset_delta,
            stack,
        } => {
            out.write_u8(247);
            out.write_u16(*offset_delta);
            write_verification_type(out, stack)?;
        }
        StackMapFrame::Chop {
            frame_type,
            offset_delta,
        } => {
            out.write_u8(check_frame_type(*frame_type, 248..=250, "chop")?);
            out.write_u16(*offset_delta);
        }
        StackMapFrame::SameExtended { offset_delta } => {
            out.write_u8(251);
            out.write_u16(*offset_delta);
        }
        StackMapFrame::Append {
            offset_delta,
            locals,
        } => {
            if locals.is_empty() || locals.len() > 3 {
                return Err(ClassError::TooLarge {
                    what: "appended locals",
                    len: locals.len(),
                });
            }
            out.write_u8(251 + locals.len() as u8);
            out.write_u16(*offset_delta);
            write_verification_types(out, locals)?;
        }
        StackMapFrame::Full {
            offset_delta,
            locals,
            stack,
        } => {
            out.write_u8(255);
            out.write_u16(*offset_delta);
            out.write_len_u16(locals.len(), "frame locals")?;
            write_verification_types(out, locals)?;
            out.write_len_u16(stack.len(), "frame stack")?;
            write_verification_types(out, stack)?;
        }
    }
    Ok(())
}

pub fn write_stack_map_table(out: &mut ByteWriter, frames: &[StackMapFrame]) -> ClassResult<()> {
    out.write_len_u16(frames.len(), "stack map frames")?;
    frames
        .iter()
        .try_for_each(|frame| write_stack_map_frame(out, frame))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_types_are_preserved() {
        let bytes = [
            0x00, 0x04, // 4 frames
            0x05, // same, delta 5
            0x42, 0x07, 0x00, 0x09, // same locals one stack item, delta 2, Object #9
            0xf9, 0x00, 0x10, // chop 2, delta 16
            0xfd, 0x00, 0x03, 0x01, 0x04, // append Integer Long
        ];
        let mut input = ByteParser::new(&bytes);
        let frames = parse_stack_map_table(&mut input).unwrap();
        assert!(input.is_empty());
        assert_eq!(
            &*frames,
            &[
                StackMapFrame::Same { frame_type: 5 },
                StackMapFrame::SameLocalsOneStackItem {
                    frame_type: 0x42,
                    stack: VerificationType::Object(9),
                },
                StackMapFrame::Chop {
                    frame_type: 0xf9,
                    offset_delta: 16,
                },
                StackMapFrame::Append {
                    offset_delta: 3,
                    locals: vec![VerificationType::Integer, VerificationType::Long].into(),
                },
            ][..]
        );
        assert_eq!(frames[1].offset_delta(), 2);

        let mut out = ByteWriter::new();
        write_stack_map_table(&mut out, &frames).unwrap();
        assert_eq!(out.as_bytes(), &bytes[..]);
    }

    #[test]
    fn test_reserved_frame_type() {
        let mut input = ByteParser::new(&[0x80]);
        assert_eq!(
            parse_stack_map_frame(&mut input),
            Err(ClassError::UnknownStackMapFrameType(0x80))
        );
    }

    #[test]
    fn test_frame_type_outside_its_form() {
        let frame = StackMapFrame::SameLocalsOneStackItem {
            frame_type: 12,
            stack: VerificationType::Integer,
        };
        assert_eq!(frame.offset_delta(), 0);
        assert_eq!(
            write_stack_map_frame(&mut ByteWriter::new(), &frame),
            Err(ClassError::FrameTypeMismatch {
                frame_type: 12,
                form: "same_locals_1_stack_item",
            })
        );
        assert!(
            write_stack_map_frame(&mut ByteWriter::new(), &StackMapFrame::Same { frame_type: 64 })
                .is_err()
        );
    }

    #[test]
    fn test_unknown_verification_type() {
        let mut input = ByteParser::new(&[0xff, 0x00, 0x00, 0x00, 0x00, 0x01, 0x09]);
        assert_eq!(
            parse_stack_map_frame(&mut input),
            Err(ClassError::UnknownVerificationType(9))
        );
    }
}
