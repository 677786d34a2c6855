//! Reading, writing and renaming JVM class files.
//!
//! [`Class::parse`] decodes a class file into an immutable aggregate whose
//! large byte payloads borrow from the input buffer. [`Class::to_bytes`]
//! encodes it again, and [`rename::rename`] produces a new aggregate in which
//! every reference to a binary class name has been rewritten consistently.

pub mod access;
pub mod annotation;
pub mod attribute;
pub mod builder;
pub mod class;
pub mod constant;
pub mod member;
pub mod module;
mod mutf8;
pub mod parse;
pub mod rename;
pub mod signature;
pub mod stack_map;
pub mod write;

pub use crate::{
    class::Class,
    constant::{ConstantPool, PoolIndex},
    mutf8::*,
    parse::{ParseError, ParseResult},
    signature::SignatureError,
};

use thiserror::Error;

pub type ClassResult<T> = Result<T, ClassError>;

#[derive(Clone, Debug, Eq, PartialEq, Hash, Error)]
pub enum ClassError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    // Constant pool parsing errors
    #[error("unrecognized constant pool tag {tag} at index {index}")]
    UnknownConstantTag { tag: u8, index: usize },
    #[error("unrecognized method handle kind {0}")]
    UnknownMethodHandleKind(u8),
    #[error("constant pool count must be at least 1")]
    ConstantPoolTooSmall,

    // Class parse errors
    #[error("bad magic {0:#010x}, not a class file")]
    WrongMagic(u32),

    // Attribute parse errors
    #[error("unrecognized verification type tag {0}")]
    UnknownVerificationType(u8),
    #[error("unrecognized stack map frame type {0}")]
    UnknownStackMapFrameType(u8),
    #[error("unrecognized annotation element value tag {0:?}")]
    UnknownElementValueTag(char),
    #[error("unrecognized type annotation target type {0:#04x}")]
    UnknownTypeAnnotationTarget(u8),
    #[error("frame type {frame_type} does not belong to a {form} frame")]
    FrameTypeMismatch { frame_type: u8, form: &'static str },
    #[error("attribute {name} declares {declared} byte(s) but its contents span {consumed}")]
    AttributeLength {
        name: String,
        declared: usize,
        consumed: usize,
    },

    // General errors
    #[error("constant pool index {index} is out of bounds for a pool of {len} slots")]
    InvalidPoolIndex { index: usize, len: usize },
    #[error("constant pool entry {index} is not a {expected} entry")]
    InvalidPoolType { index: usize, expected: &'static str },
    #[error("invalid modified UTF-8 byte {byte:#04x} at offset {offset}")]
    InvalidModifiedUtf8 { offset: usize, byte: u8 },
    #[error("unpaired surrogate at offset {offset} in modified UTF-8")]
    UnpairedSurrogate { offset: usize },
    #[error(transparent)]
    Signature(#[from] SignatureError),

    // Encoding errors
    #[error("{what} of {len} does not fit its field in the class file format")]
    TooLarge { what: &'static str, len: usize },
    #[error("constant pool is full")]
    PoolOverflow,

    /// A name handed to the renamer has no `Utf8` entry in the pool it came
    /// from. Decoded classes never produce this; it means an aggregate was
    /// assembled inconsistently.
    #[error("internal error: `{0}` has no entry in the constant pool")]
    UnresolvedName(String),
}
