//! Annotations, as carried by the `Runtime*Annotations` family of attributes
//! and by `AnnotationDefault`.
//!
//! ```txt
//! Annotation {
//!     type_index: u16,
//!     num_element_value_pairs: u16,
//!     element_value_pairs: [{ element_name_index: u16, value: ElementValue }; num_element_value_pairs],
//! }
//!
//! ElementValue {
//!     tag: u8,
//!     value: match tag {
//!         'B' | 'C' | 'D' | 'F' | 'I' | 'J' | 'S' | 'Z' | 's' => const_value_index: u16,
//!         'e' => { type_name_index: u16, const_name_index: u16 },
//!         'c' => class_info_index: u16,
//!         '@' => Annotation,
//!         '[' => { num_values: u16, values: [ElementValue; num_values] },
//!     },
//! }
//!
//! TypeAnnotation {
//!     target_type: u8,
//!     target_info: [u8; depends on target_type],
//!     type_path: { path_length: u8, path: [{ kind: u8, argument_index: u8 }; path_length] },
//!     annotation: Annotation,
//! }
//! ```

use crate::{
    attribute::{parse_index, parse_name, write_name, ConstantValue},
    builder::PoolBuilder,
    constant::ConstantPool,
    parse::ByteParser,
    write::ByteWriter,
    ClassError, ClassResult,
};
use std::borrow::Cow;

#[derive(Clone, Debug, PartialEq)]
pub struct Annotation<'src> {
    /// Field descriptor of the annotation type, like `Ljava/lang/Deprecated;`.
    pub type_name: Cow<'src, str>,
    pub values: Box<[ElementValuePair<'src>]>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ElementValuePair<'src> {
    pub name: Cow<'src, str>,
    pub value: ElementValue<'src>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ElementValue<'src> {
    /// A primitive or string constant. `tag` is kept because `B`, `C`, `I`,
    /// `S` and `Z` all share the `Integer` pool kind.
    Const {
        tag: u8,
        value: ConstantValue<'src>,
    },
    Enum {
        type_name: Cow<'src, str>,
        const_name: Cow<'src, str>,
    },
    /// A return descriptor, like `Ljava/lang/Object;` or `V`.
    Class(Cow<'src, str>),
    Annotation(Box<Annotation<'src>>),
    Array(Box<[ElementValue<'src>]>),
}

/// An annotation on a use of a type. Where the type appears is kept as the
/// raw `target_info` and `type_path` bytes.
#[derive(Clone, Debug, PartialEq)]
pub struct TypeAnnotation<'src> {
    pub target_type: u8,
    pub target_info: &'src [u8],
    pub type_path: &'src [u8],
    pub annotation: Annotation<'src>,
}

pub fn parse_element_value<'src>(
    input: &mut ByteParser<'src>,
    pool: &ConstantPool<'src>,
) -> ClassResult<ElementValue<'src>> {
    let tag = input.parse_u8()?;
    Ok(match tag {
        b'B' | b'C' | b'I' | b'S' | b'Z' => ElementValue::Const {
            tag,
            value: ConstantValue::Integer(pool.get(parse_index(input)?)?),
        },
        b'D' => ElementValue::Const {
            tag,
            value: ConstantValue::Double(pool.get(parse_index(input)?)?),
        },
        b'F' => ElementValue::Const {
            tag,
            value: ConstantValue::Float(pool.get(parse_index(input)?)?),
        },
        b'J' => ElementValue::Const {
            tag,
            value: ConstantValue::Long(pool.get(parse_index(input)?)?),
        },
        // Unlike the ConstantValue attribute, this points straight at the Utf8.
        b's' => ElementValue::Const {
            tag,
            value: ConstantValue::String(parse_name(input, pool, ConstantPool::utf8)?),
        },
        b'e' => ElementValue::Enum {
            type_name: parse_name(input, pool, ConstantPool::utf8)?,
            const_name: parse_name(input, pool, ConstantPool::utf8)?,
        },
        b'c' => ElementValue::Class(parse_name(input, pool, ConstantPool::utf8)?),
        b'@' => ElementValue::Annotation(Box::new(parse_annotation(input, pool)?)),
        b'[' => {
            let len = input.parse_u16()? as usize;
            ElementValue::Array(input.seq(len, |input| parse_element_value(input, pool))?.into())
        }
        other => return Err(ClassError::UnknownElementValueTag(other as char)),
    })
}

pub fn parse_annotation<'src>(
    input: &mut ByteParser<'src>,
    pool: &ConstantPool<'src>,
) -> ClassResult<Annotation<'src>> {
    let type_name = parse_name(input, pool, ConstantPool::utf8)?;
    let len = input.parse_u16()? as usize;
    let values = input.seq(len, |input| {
        Ok::<_, ClassError>(ElementValuePair {
            name: parse_name(input, pool, ConstantPool::utf8)?,
            value: parse_element_value(input, pool)?,
        })
    })?;

    Ok(Annotation {
        type_name,
        values: values.into(),
    })
}

pub fn parse_annotations<'src>(
    input: &mut ByteParser<'src>,
    pool: &ConstantPool<'src>,
) -> ClassResult<Box<[Annotation<'src>]>> {
    let len = input.parse_u16()? as usize;
    input
        .seq(len, |input| parse_annotation(input, pool))
        .map(Into::into)
}

pub fn parse_parameter_annotations<'src>(
    input: &mut ByteParser<'src>,
    pool: &ConstantPool<'src>,
) -> ClassResult<Box<[Box<[Annotation<'src>]>]>> {
    let len = input.parse_u8()? as usize;
    input
        .seq(len, |input| parse_annotations(input, pool))
        .map(Into::into)
}

/// Skips over a `target_info` structure, which is sized by `target_type`.
fn skip_target_info(input: &mut ByteParser<'_>, target_type: u8) -> ClassResult<()> {
    match target_type {
        // type parameter, formal parameter
        0x00 | 0x01 | 0x16 => input.take(1)?,
        // supertype, throws, catch, offset
        0x10 | 0x17 | 0x42..=0x46 => input.take(2)?,
        // type parameter bound
        0x11 | 0x12 => input.take(2)?,
        // empty
        0x13..=0x15 => input.take(0)?,
        // local variable: table_length, then (start_pc, length, index) per entry
        0x40 | 0x41 => {
            let len = input.parse_u16()? as usize;
            input.take(len * 6)?
        }
        // type argument: offset, type_argument_index
        0x47..=0x4b => input.take(3)?,
        other => return Err(ClassError::UnknownTypeAnnotationTarget(other)),
    };
    Ok(())
}

pub fn parse_type_annotation<'src>(
    input: &mut ByteParser<'src>,
    pool: &ConstantPool<'src>,
) -> ClassResult<TypeAnnotation<'src>> {
    let src = input.src;

    let target_type = input.parse_u8()?;
    let start = input.offset;
    skip_target_info(input, target_type)?;
    let target_info = &src[start..input.offset];

    let start = input.offset;
    let path_len = input.parse_u8()? as usize;
    input.take(path_len * 2)?;
    let type_path = &src[start..input.offset];

    Ok(TypeAnnotation {
        target_type,
        target_info,
        type_path,
        annotation: parse_annotation(input, pool)?,
    })
}

pub fn parse_type_annotations<'src>(
    input: &mut ByteParser<'src>,
    pool: &ConstantPool<'src>,
) -> ClassResult<Box<[TypeAnnotation<'src>]>> {
    let len = input.parse_u16()? as usize;
    input
        .seq(len, |input| parse_type_annotation(input, pool))
        .map(Into::into)
}

pub fn write_element_value(
    out: &mut ByteWriter,
    pool: &mut PoolBuilder<'_>,
    value: &ElementValue<'_>,
) -> ClassResult<()> {
    match value {
        ElementValue::Const { tag, value } => {
            out.write_u8(*tag);
            let index = match value {
                ConstantValue::String(text) if *tag == b's' => pool.utf8_info(text)?,
                value => value.intern(pool)?,
            };
            out.write_index(index)?;
        }
        ElementValue::Enum {
            type_name,
            const_name,
        } => {
            out.write_u8(b'e');
            write_name(out, pool, type_name, PoolBuilder::utf8_info)?;
            write_name(out, pool, const_name, PoolBuilder::utf8_info)?;
        }
        ElementValue::Class(descriptor) => {
            out.write_u8(b'c');
            write_name(out, pool, descriptor, PoolBuilder::utf8_info)?;
        }
        ElementValue::Annotation(annotation) => {
            out.write_u8(b'@');
            write_annotation(out, pool, annotation)?;
        }
        ElementValue::Array(values) => {
            out.write_u8(b'[');
            out.write_len_u16(values.len(), "array element values")?;
            for value in values.iter() {
                write_element_value(out, pool, value)?;
            }
        }
    }
    Ok(())
}

pub fn write_annotation(
    out: &mut ByteWriter,
    pool: &mut PoolBuilder<'_>,
    annotation: &Annotation<'_>,
) -> ClassResult<()> {
    write_name(out, pool, &annotation.type_name, PoolBuilder::utf8_info)?;
    out.write_len_u16(annotation.values.len(), "element value pairs")?;
    for pair in annotation.values.iter() {
        write_name(out, pool, &pair.name, PoolBuilder::utf8_info)?;
        write_element_value(out, pool, &pair.value)?;
    }
    Ok(())
}

pub fn write_annotations(
    out: &mut ByteWriter,
    pool: &mut PoolBuilder<'_>,
    annotations: &[Annotation<'_>],
) -> ClassResult<()> {
    out.write_len_u16(annotations.len(), "annotations")?;
    annotations
        .iter()
        .try_for_each(|annotation| write_annotation(out, pool, annotation))
}

pub fn write_parameter_annotations(
    out: &mut ByteWriter,
    pool: &mut PoolBuilder<'_>,
    parameters: &[Box<[Annotation<'_>]>],
) -> ClassResult<()> {
    out.write_len_u8(parameters.len(), "annotated parameters")?;
    parameters
        .iter()
        .try_for_each(|annotations| write_annotations(out, pool, annotations))
}

pub fn write_type_annotations(
    out: &mut ByteWriter,
    pool: &mut PoolBuilder<'_>,
    annotations: &[TypeAnnotation<'_>],
) -> ClassResult<()> {
    out.write_len_u16(annotations.len(), "type annotations")?;
    for annotation in annotations {
        out.write_u8(annotation.target_type);
        out.write_bytes(annotation.target_info);
        out.write_bytes(annotation.type_path);
        write_annotation(out, pool, &annotation.annotation)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constant::{parse_constant_pool, CONSTANT_INTEGER, CONSTANT_UTF8};

    fn utf8(bytes: &mut Vec<u8>, text: &str) {
        bytes.push(CONSTANT_UTF8);
        bytes.extend_from_slice(&(text.len() as u16).to_be_bytes());
        bytes.extend_from_slice(text.as_bytes());
    }

    #[test]
    fn test_annotation_resolves_names() {
        let mut bytes = vec![0x00, 0x05];
        utf8(&mut bytes, "La/Marker;"); // 1
        utf8(&mut bytes, "value"); // 2
        bytes.extend_from_slice(&[CONSTANT_INTEGER, 0, 0, 0, 7]); // 3
        utf8(&mut bytes, "hi"); // 4
        let pool = parse_constant_pool(&mut ByteParser::new(&bytes)).unwrap();

        let body = [
            0x00, 0x01, // type
            0x00, 0x02, // 2 pairs
            0x00, 0x02, b'Z', 0x00, 0x03, // value = true
            0x00, 0x02, b'[', 0x00, 0x01, b's', 0x00, 0x04, // value = {"hi"}
        ];
        let mut input = ByteParser::new(&body);
        let annotation = parse_annotation(&mut input, &pool).unwrap();
        assert!(input.is_empty());
        assert_eq!(annotation.type_name, "La/Marker;");
        assert_eq!(
            annotation.values[0].value,
            ElementValue::Const {
                tag: b'Z',
                value: ConstantValue::Integer(7),
            }
        );
        assert_eq!(
            annotation.values[1].value,
            ElementValue::Array(
                vec![ElementValue::Const {
                    tag: b's',
                    value: ConstantValue::String("hi".into()),
                }]
                .into()
            )
        );

        let mut builder = PoolBuilder::from_pool(&pool);
        let mut out = ByteWriter::new();
        write_annotation(&mut out, &mut builder, &annotation).unwrap();
        assert_eq!(out.as_bytes(), &body[..]);
        assert_eq!(builder.len(), pool.len());
    }

    #[test]
    fn test_type_annotation_keeps_raw_target() {
        let mut bytes = vec![0x00, 0x02];
        utf8(&mut bytes, "La/NonNull;");
        let pool = parse_constant_pool(&mut ByteParser::new(&bytes)).unwrap();

        let body = [
            0x40, 0x00, 0x01, 0x00, 0x02, 0x00, 0x05, 0x00, 0x01, // localvar target
            0x01, 0x03, 0x00, // type path: one array step
            0x00, 0x01, 0x00, 0x00, // annotation
        ];
        let mut input = ByteParser::new(&body);
        let annotation = parse_type_annotation(&mut input, &pool).unwrap();
        assert!(input.is_empty());
        assert_eq!(annotation.target_type, 0x40);
        assert_eq!(annotation.target_info, &body[1..9]);
        assert_eq!(annotation.type_path, &body[9..12]);
    }

    #[test]
    fn test_unknown_element_tag() {
        let bytes = [0x00, 0x01];
        let pool = parse_constant_pool(&mut ByteParser::new(&bytes)).unwrap();
        assert_eq!(
            parse_element_value(&mut ByteParser::new(b"q\x00\x01"), &pool),
            Err(ClassError::UnknownElementValueTag('q'))
        );
    }
}
