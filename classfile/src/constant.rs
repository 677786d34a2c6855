//! # Constant Pool
//! Entries in the constant pool start at 1, and indices into the pool are
//! likewise 1-based. Each entry is comprised of a 1-byte tag, followed by a
//! variable length of bytes decided by the type of constant.
//!
//! ### Oddities
//! Utf8 constants aren't actually UTF-8, but a slightly modified UTF-8 as
//! described in §4.4.7
//!
//! Long and Double entries take up two slots in the constant pool, but the
//! upper entry is never directly referenced.
//! ```txt
//! Utf8               (1)  length: u16, data: [u8; length]
//! Integer            (3)  data: i32
//! Float              (4)  data: f32
//! Long               (5)  data: i64
//! Double             (6)  data: f64
//! Class              (7)  name: u16
//! String             (8)  utf8: u16
//! FieldRef           (9)  class: u16, name_and_type: u16
//! MethodRef          (10) class: u16, name_and_type: u16
//! InterfaceMethodRef (11) class: u16, name_and_type: u16
//! NameAndType        (12) name: u16, descriptor: u16
//! MethodHandle       (15) kind: u8, reference: u16
//! MethodType         (16) descriptor: u16
//! Dynamic            (17) bootstrap_method_attr: u16, name_and_type: u16
//! InvokeDynamic      (18) bootstrap_method_attr: u16, name_and_type: u16
//! Module             (19) name: u16
//! Package            (20) name: u16
//! ```

use crate::{
    mutf8::{encode_mutf8, parse_mutf8},
    parse::ByteParser,
    write::ByteWriter,
    ClassError, ClassResult,
};
use std::borrow::Cow;

pub type PoolIndex = usize;

pub const CONSTANT_UTF8: u8 = 1;
pub const CONSTANT_INTEGER: u8 = 3;
pub const CONSTANT_FLOAT: u8 = 4;
pub const CONSTANT_LONG: u8 = 5;
pub const CONSTANT_DOUBLE: u8 = 6;
pub const CONSTANT_CLASS: u8 = 7;
pub const CONSTANT_STRING: u8 = 8;
pub const CONSTANT_FIELD_REF: u8 = 9;
pub const CONSTANT_METHOD_REF: u8 = 10;
pub const CONSTANT_INTERFACE_METHOD_REF: u8 = 11;
pub const CONSTANT_NAME_AND_TYPE: u8 = 12;
pub const CONSTANT_METHOD_HANDLE: u8 = 15;
pub const CONSTANT_METHOD_TYPE: u8 = 16;
pub const CONSTANT_DYNAMIC: u8 = 17;
pub const CONSTANT_INVOKE_DYNAMIC: u8 = 18;
pub const CONSTANT_MODULE: u8 = 19;
pub const CONSTANT_PACKAGE: u8 = 20;

// Symbolic references by an instruction sequence to fields or methods are
// indicated by C.x:T, where x and T are the name and descriptor of the field
// or method, and C is the class or interface in which the field or method is
// to be found.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum MethodHandleKind {
    /// getfield C.f:T
    GetField = 1,
    /// getstatic C.f:T
    GetStatic = 2,
    /// putfield C.f:T
    PutField = 3,
    /// putstatic C.f:T
    PutStatic = 4,
    /// invokevirtual C.m:(A*)T
    InvokeVirtual = 5,
    /// invokestatic C.m:(A*)T
    InvokeStatic = 6,
    /// invokespecial C.m:(A*)T
    InvokeSpecial = 7,
    /// new C; dup; invokespecial C.<init>:(A*)void
    NewInvokeSpecial = 8,
    /// invokeinterface C.m:(A*)T
    InvokeInterface = 9,
}

impl MethodHandleKind {
    pub fn from(ty: u8) -> ClassResult<MethodHandleKind> {
        Ok(match ty {
            1 => MethodHandleKind::GetField,
            2 => MethodHandleKind::GetStatic,
            3 => MethodHandleKind::PutField,
            4 => MethodHandleKind::PutStatic,
            5 => MethodHandleKind::InvokeVirtual,
            6 => MethodHandleKind::InvokeStatic,
            7 => MethodHandleKind::InvokeSpecial,
            8 => MethodHandleKind::NewInvokeSpecial,
            9 => MethodHandleKind::InvokeInterface,
            other => return Err(ClassError::UnknownMethodHandleKind(other)),
        })
    }
}

#[derive(Clone, Debug)]
pub enum Constant<'src> {
    /// Occupies slot 0 and the upper half of every 64-bit entry. It never
    /// appears in the encoded pool.
    Nothing,

    Utf8(Cow<'src, str>),
    /// A `Utf8` entry holding an unpaired surrogate, which `str` cannot
    /// represent. The modified UTF-8 bytes are kept and written back as is.
    Utf8Bytes(&'src [u8]),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),

    Class(PoolIndex),
    String(PoolIndex),
    MethodType(PoolIndex),
    Module(PoolIndex),
    Package(PoolIndex),

    FieldRef {
        class: PoolIndex,
        name_and_type: PoolIndex,
    },
    MethodRef {
        class: PoolIndex,
        name_and_type: PoolIndex,
    },
    InterfaceMethodRef {
        class: PoolIndex,
        name_and_type: PoolIndex,
    },
    NameAndType {
        name: PoolIndex,
        descriptor: PoolIndex,
    },

    MethodHandle {
        kind: MethodHandleKind,
        reference: PoolIndex,
    },

    Dynamic {
        bootstrap_method_attr: PoolIndex,
        name_and_type: PoolIndex,
    },
    InvokeDynamic {
        bootstrap_method_attr: PoolIndex,
        name_and_type: PoolIndex,
    },
}

impl<'src> Constant<'src> {
    pub fn tag(&self) -> u8 {
        match self {
            Constant::Nothing => 0,
            Constant::Utf8(_) | Constant::Utf8Bytes(_) => CONSTANT_UTF8,
            Constant::Integer(_) => CONSTANT_INTEGER,
            Constant::Float(_) => CONSTANT_FLOAT,
            Constant::Long(_) => CONSTANT_LONG,
            Constant::Double(_) => CONSTANT_DOUBLE,
            Constant::Class(_) => CONSTANT_CLASS,
            Constant::String(_) => CONSTANT_STRING,
            Constant::MethodType(_) => CONSTANT_METHOD_TYPE,
            Constant::Module(_) => CONSTANT_MODULE,
            Constant::Package(_) => CONSTANT_PACKAGE,
            Constant::FieldRef { .. } => CONSTANT_FIELD_REF,
            Constant::MethodRef { .. } => CONSTANT_METHOD_REF,
            Constant::InterfaceMethodRef { .. } => CONSTANT_INTERFACE_METHOD_REF,
            Constant::NameAndType { .. } => CONSTANT_NAME_AND_TYPE,
            Constant::MethodHandle { .. } => CONSTANT_METHOD_HANDLE,
            Constant::Dynamic { .. } => CONSTANT_DYNAMIC,
            Constant::InvokeDynamic { .. } => CONSTANT_INVOKE_DYNAMIC,
        }
    }

    /// Human readable name of this kind of entry.
    pub fn kind(&self) -> &'static str {
        kind_name(self.tag())
    }

    pub fn is_nothing(&self) -> bool {
        self == &Constant::Nothing
    }

    /// Long and Double entries occupy two pool slots.
    pub fn is_wide(&self) -> bool {
        matches!(self, Constant::Long(_) | Constant::Double(_))
    }

    pub fn as_utf8(&self) -> Option<&str> {
        match self {
            Constant::Utf8(data) => Some(data),
            _ => None,
        }
    }

    /// Value equality as used for pool deduplication: floating point values
    /// compare by bit pattern so that NaN payloads are preserved.
    pub fn same_value(&self, other: &Constant<'_>) -> bool {
        match (self, other) {
            (Constant::Float(a), Constant::Float(b)) => a.to_bits() == b.to_bits(),
            (Constant::Double(a), Constant::Double(b)) => a.to_bits() == b.to_bits(),
            (Constant::Utf8(a), Constant::Utf8(b)) => a == b,
            (Constant::Utf8Bytes(a), Constant::Utf8Bytes(b)) => a == b,
            (Constant::Integer(a), Constant::Integer(b)) => a == b,
            (Constant::Long(a), Constant::Long(b)) => a == b,
            (Constant::Class(a), Constant::Class(b))
            | (Constant::String(a), Constant::String(b))
            | (Constant::MethodType(a), Constant::MethodType(b))
            | (Constant::Module(a), Constant::Module(b))
            | (Constant::Package(a), Constant::Package(b)) => a == b,
            (
                Constant::NameAndType { name, descriptor },
                Constant::NameAndType {
                    name: other_name,
                    descriptor: other_descriptor,
                },
            ) => name == other_name && descriptor == other_descriptor,
            _ => false,
        }
    }
}

/// Floating point entries compare by bit pattern, so a pool holding NaN is
/// still equal to itself.
impl PartialEq for Constant<'_> {
    fn eq(&self, other: &Constant<'_>) -> bool {
        match (self, other) {
            (Constant::Nothing, Constant::Nothing) => true,
            (
                Constant::FieldRef {
                    class,
                    name_and_type,
                },
                Constant::FieldRef {
                    class: other_class,
                    name_and_type: other_name_and_type,
                },
            )
            | (
                Constant::MethodRef {
                    class,
                    name_and_type,
                },
                Constant::MethodRef {
                    class: other_class,
                    name_and_type: other_name_and_type,
                },
            )
            | (
                Constant::InterfaceMethodRef {
                    class,
                    name_and_type,
                },
                Constant::InterfaceMethodRef {
                    class: other_class,
                    name_and_type: other_name_and_type,
                },
            ) => class == other_class && name_and_type == other_name_and_type,
            (
                Constant::MethodHandle { kind, reference },
                Constant::MethodHandle {
                    kind: other_kind,
                    reference: other_reference,
                },
            ) => kind == other_kind && reference == other_reference,
            (
                Constant::Dynamic {
                    bootstrap_method_attr,
                    name_and_type,
                },
                Constant::Dynamic {
                    bootstrap_method_attr: other_bootstrap,
                    name_and_type: other_name_and_type,
                },
            )
            | (
                Constant::InvokeDynamic {
                    bootstrap_method_attr,
                    name_and_type,
                },
                Constant::InvokeDynamic {
                    bootstrap_method_attr: other_bootstrap,
                    name_and_type: other_name_and_type,
                },
            ) => bootstrap_method_attr == other_bootstrap && name_and_type == other_name_and_type,
            _ => self.same_value(other),
        }
    }
}

pub fn kind_name(tag: u8) -> &'static str {
    match tag {
        CONSTANT_UTF8 => "Utf8",
        CONSTANT_INTEGER => "Integer",
        CONSTANT_FLOAT => "Float",
        CONSTANT_LONG => "Long",
        CONSTANT_DOUBLE => "Double",
        CONSTANT_CLASS => "Class",
        CONSTANT_STRING => "String",
        CONSTANT_FIELD_REF => "FieldRef",
        CONSTANT_METHOD_REF => "MethodRef",
        CONSTANT_INTERFACE_METHOD_REF => "InterfaceMethodRef",
        CONSTANT_NAME_AND_TYPE => "NameAndType",
        CONSTANT_METHOD_HANDLE => "MethodHandle",
        CONSTANT_METHOD_TYPE => "MethodType",
        CONSTANT_DYNAMIC => "Dynamic",
        CONSTANT_INVOKE_DYNAMIC => "InvokeDynamic",
        CONSTANT_MODULE => "Module",
        CONSTANT_PACKAGE => "Package",
        _ => "Nothing",
    }
}

/// Values that can be fetched out of a pool slot directly by type.
pub trait PoolValue<'a>: Sized {
    const EXPECTED: &'static str;

    fn from_constant(constant: &'a Constant<'_>) -> Option<Self>;
}

impl<'a> PoolValue<'a> for i32 {
    const EXPECTED: &'static str = "Integer";

    fn from_constant(constant: &'a Constant<'_>) -> Option<Self> {
        match *constant {
            Constant::Integer(value) => Some(value),
            _ => None,
        }
    }
}

impl<'a> PoolValue<'a> for i64 {
    const EXPECTED: &'static str = "Long";

    fn from_constant(constant: &'a Constant<'_>) -> Option<Self> {
        match *constant {
            Constant::Long(value) => Some(value),
            _ => None,
        }
    }
}

impl<'a> PoolValue<'a> for f32 {
    const EXPECTED: &'static str = "Float";

    fn from_constant(constant: &'a Constant<'_>) -> Option<Self> {
        match *constant {
            Constant::Float(value) => Some(value),
            _ => None,
        }
    }
}

impl<'a> PoolValue<'a> for f64 {
    const EXPECTED: &'static str = "Double";

    fn from_constant(constant: &'a Constant<'_>) -> Option<Self> {
        match *constant {
            Constant::Double(value) => Some(value),
            _ => None,
        }
    }
}

impl<'a> PoolValue<'a> for &'a str {
    const EXPECTED: &'static str = "Utf8";

    fn from_constant(constant: &'a Constant<'_>) -> Option<Self> {
        constant.as_utf8()
    }
}

/// A decoded constant pool. Slot 0 is always [`Constant::Nothing`], as is the
/// slot after every Long and Double, so `len()` is the `constant_pool_count`
/// of the class file.
#[derive(Clone, Debug, PartialEq)]
pub struct ConstantPool<'src> {
    entries: Vec<Constant<'src>>,
}

impl<'src> ConstantPool<'src> {
    /// Only the pool builder and the decoder construct pools, so that slot 0
    /// and the wide-entry padding are always in place.
    pub(crate) fn from_entries(entries: Vec<Constant<'src>>) -> Self {
        ConstantPool { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.len() <= 1
    }

    pub fn entries(&self) -> &[Constant<'src>] {
        &self.entries
    }

    /// Iterates the occupied slots with their indices.
    pub fn iter(&self) -> impl Iterator<Item = (PoolIndex, &Constant<'src>)> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| !entry.is_nothing())
    }

    pub fn entry(&self, index: PoolIndex) -> ClassResult<&Constant<'src>> {
        self.entries.get(index).ok_or(ClassError::InvalidPoolIndex {
            index,
            len: self.entries.len(),
        })
    }

    /// The tag of the entry at `index`, or 0 for an unusable slot.
    pub fn tag(&self, index: PoolIndex) -> ClassResult<u8> {
        self.entry(index).map(Constant::tag)
    }

    /// Fetches the value at `index` as `T`, failing if the slot holds another
    /// kind of entry.
    pub fn get<'a, T: PoolValue<'a>>(&'a self, index: PoolIndex) -> ClassResult<T> {
        T::from_constant(self.entry(index)?).ok_or(ClassError::InvalidPoolType {
            index,
            expected: T::EXPECTED,
        })
    }

    pub fn utf8(&self, index: PoolIndex) -> ClassResult<&Cow<'src, str>> {
        match self.entry(index)? {
            Constant::Utf8(data) => Ok(data),
            _ => Err(ClassError::InvalidPoolType {
                index,
                expected: "Utf8",
            }),
        }
    }

    pub fn class_name(&self, index: PoolIndex) -> ClassResult<&Cow<'src, str>> {
        match *self.entry(index)? {
            Constant::Class(name) => self.utf8(name),
            _ => Err(ClassError::InvalidPoolType {
                index,
                expected: "Class",
            }),
        }
    }

    pub fn module_name(&self, index: PoolIndex) -> ClassResult<&Cow<'src, str>> {
        match *self.entry(index)? {
            Constant::Module(name) => self.utf8(name),
            _ => Err(ClassError::InvalidPoolType {
                index,
                expected: "Module",
            }),
        }
    }

    pub fn package_name(&self, index: PoolIndex) -> ClassResult<&Cow<'src, str>> {
        match *self.entry(index)? {
            Constant::Package(name) => self.utf8(name),
            _ => Err(ClassError::InvalidPoolType {
                index,
                expected: "Package",
            }),
        }
    }

    pub fn string(&self, index: PoolIndex) -> ClassResult<&Cow<'src, str>> {
        match *self.entry(index)? {
            Constant::String(utf8) => self.utf8(utf8),
            _ => Err(ClassError::InvalidPoolType {
                index,
                expected: "String",
            }),
        }
    }

    /// Resolves a `NameAndType` entry to its name and descriptor.
    pub fn name_and_type(
        &self,
        index: PoolIndex,
    ) -> ClassResult<(&Cow<'src, str>, &Cow<'src, str>)> {
        match *self.entry(index)? {
            Constant::NameAndType { name, descriptor } => {
                Ok((self.utf8(name)?, self.utf8(descriptor)?))
            }
            _ => Err(ClassError::InvalidPoolType {
                index,
                expected: "NameAndType",
            }),
        }
    }

    /// Index of the first `Utf8` entry equal to `text`.
    pub fn find_utf8(&self, text: &str) -> Option<PoolIndex> {
        self.entries
            .iter()
            .position(|entry| entry.as_utf8() == Some(text))
    }

    pub fn write(&self, out: &mut ByteWriter) -> ClassResult<()> {
        out.write_len_u16(self.entries.len(), "constant pool count")?;
        for entry in self.entries.iter().skip(1) {
            write_constant(out, entry)?;
        }
        Ok(())
    }
}

fn parse_index(input: &mut ByteParser<'_>) -> ClassResult<PoolIndex> {
    Ok(input.parse_u16()? as PoolIndex)
}

pub fn parse_constant<'src>(
    input: &mut ByteParser<'src>,
    index: PoolIndex,
) -> ClassResult<Constant<'src>> {
    Ok(match input.parse_u8()? {
        CONSTANT_UTF8 => {
            let len = input.parse_u16()? as usize;
            let bytes = input.take(len)?;
            match parse_mutf8(bytes) {
                Ok(text) => Constant::Utf8(text),
                Err(ClassError::UnpairedSurrogate { offset }) => {
                    tracing::debug!(
                        index,
                        offset,
                        "keeping Utf8 entry with an unpaired surrogate as bytes"
                    );
                    Constant::Utf8Bytes(bytes)
                }
                Err(err) => return Err(err),
            }
        }
        CONSTANT_INTEGER => input.parse_i32().map(Constant::Integer)?,
        CONSTANT_FLOAT => input.parse_f32().map(Constant::Float)?,
        CONSTANT_LONG => input.parse_i64().map(Constant::Long)?,
        CONSTANT_DOUBLE => input.parse_f64().map(Constant::Double)?,

        CONSTANT_CLASS => parse_index(input).map(Constant::Class)?,
        CONSTANT_STRING => parse_index(input).map(Constant::String)?,
        CONSTANT_METHOD_TYPE => parse_index(input).map(Constant::MethodType)?,
        CONSTANT_MODULE => parse_index(input).map(Constant::Module)?,
        CONSTANT_PACKAGE => parse_index(input).map(Constant::Package)?,

        CONSTANT_FIELD_REF => Constant::FieldRef {
            class: parse_index(input)?,
            name_and_type: parse_index(input)?,
        },

        CONSTANT_METHOD_REF => Constant::MethodRef {
            class: parse_index(input)?,
            name_and_type: parse_index(input)?,
        },

        CONSTANT_INTERFACE_METHOD_REF => Constant::InterfaceMethodRef {
            class: parse_index(input)?,
            name_and_type: parse_index(input)?,
        },

        CONSTANT_NAME_AND_TYPE => Constant::NameAndType {
            name: parse_index(input)?,
            descriptor: parse_index(input)?,
        },

        CONSTANT_METHOD_HANDLE => Constant::MethodHandle {
            kind: MethodHandleKind::from(input.parse_u8()?)?,
            reference: parse_index(input)?,
        },

        CONSTANT_DYNAMIC => Constant::Dynamic {
            bootstrap_method_attr: parse_index(input)?,
            name_and_type: parse_index(input)?,
        },

        CONSTANT_INVOKE_DYNAMIC => Constant::InvokeDynamic {
            bootstrap_method_attr: parse_index(input)?,
            name_and_type: parse_index(input)?,
        },

        tag => return Err(ClassError::UnknownConstantTag { tag, index }),
    })
}

pub fn parse_constant_pool<'src>(input: &mut ByteParser<'src>) -> ClassResult<ConstantPool<'src>> {
    let count = match input.parse_u16()? as usize {
        0 => return Err(ClassError::ConstantPoolTooSmall),
        count => count,
    };

    let mut consts = Vec::with_capacity(count);

    // First slot is unused. Everything uses 1-based indices into the pool.
    consts.push(Constant::Nothing);

    while consts.len() < count {
        let constant = parse_constant(input, consts.len())?;
        let is_wide = constant.is_wide();

        consts.push(constant);
        if is_wide && consts.len() < count {
            consts.push(Constant::Nothing);
        }
    }

    tracing::trace!(count, "parsed constant pool");
    Ok(ConstantPool::from_entries(consts))
}

fn write_constant(out: &mut ByteWriter, constant: &Constant<'_>) -> ClassResult<()> {
    if constant.is_nothing() {
        return Ok(());
    }

    out.write_u8(constant.tag());
    match *constant {
        Constant::Nothing => {}
        Constant::Utf8(ref data) => {
            let bytes = encode_mutf8(data);
            out.write_len_u16(bytes.len(), "Utf8 constant length")?;
            out.write_bytes(&bytes);
        }
        Constant::Utf8Bytes(bytes) => {
            out.write_len_u16(bytes.len(), "Utf8 constant length")?;
            out.write_bytes(bytes);
        }
        Constant::Integer(value) => out.write_i32(value),
        Constant::Float(value) => out.write_f32(value),
        Constant::Long(value) => out.write_i64(value),
        Constant::Double(value) => out.write_f64(value),
        Constant::Class(index)
        | Constant::String(index)
        | Constant::MethodType(index)
        | Constant::Module(index)
        | Constant::Package(index) => out.write_index(index)?,
        Constant::FieldRef {
            class,
            name_and_type,
        }
        | Constant::MethodRef {
            class,
            name_and_type,
        }
        | Constant::InterfaceMethodRef {
            class,
            name_and_type,
        } => {
            out.write_index(class)?;
            out.write_index(name_and_type)?;
        }
        Constant::NameAndType { name, descriptor } => {
            out.write_index(name)?;
            out.write_index(descriptor)?;
        }
        Constant::MethodHandle { kind, reference } => {
            out.write_u8(kind as u8);
            out.write_index(reference)?;
        }
        Constant::Dynamic {
            bootstrap_method_attr,
            name_and_type,
        }
        | Constant::InvokeDynamic {
            bootstrap_method_attr,
            name_and_type,
        } => {
            out.write_index(bootstrap_method_attr)?;
            out.write_index(name_and_type)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool_bytes() -> Vec<u8> {
        let mut bytes = vec![0x00, 0x07];
        // 1: Utf8 "Hello"
        bytes.extend_from_slice(&[CONSTANT_UTF8, 0x00, 0x05]);
        bytes.extend_from_slice(b"Hello");
        // 2: Long 1 (occupies 2 and 3)
        bytes.extend_from_slice(&[CONSTANT_LONG, 0, 0, 0, 0, 0, 0, 0, 1]);
        // 4: Class #1
        bytes.extend_from_slice(&[CONSTANT_CLASS, 0x00, 0x01]);
        // 5: Double 0.5 (occupies 5 and 6)
        bytes.extend_from_slice(&[CONSTANT_DOUBLE]);
        bytes.extend_from_slice(&0.5f64.to_bits().to_be_bytes());
        bytes
    }

    #[test]
    fn test_wide_entries_take_two_slots() {
        let bytes = pool_bytes();
        let pool = parse_constant_pool(&mut ByteParser::new(&bytes)).unwrap();

        assert_eq!(pool.len(), 7);
        assert_eq!(pool.get::<i64>(2), Ok(1));
        assert_eq!(pool.tag(3), Ok(0));
        assert_eq!(pool.class_name(4).map(|name| &**name), Ok("Hello"));
        assert_eq!(pool.get::<f64>(5), Ok(0.5));
        assert_eq!(pool.iter().count(), 4);
    }

    #[test]
    fn test_pool_write_is_inverse_of_parse() {
        let bytes = pool_bytes();
        let pool = parse_constant_pool(&mut ByteParser::new(&bytes)).unwrap();
        let mut out = ByteWriter::new();
        pool.write(&mut out).unwrap();
        assert_eq!(out.as_bytes(), &bytes[..]);
    }

    #[test]
    fn test_unpaired_surrogate_kept_as_bytes() {
        // 1: Utf8 "\u{D800}", 2: String #1
        let bytes = [
            0x00, 0x03, CONSTANT_UTF8, 0x00, 0x03, 0xed, 0xa0, 0x80, CONSTANT_STRING, 0x00, 0x01,
        ];
        let pool = parse_constant_pool(&mut ByteParser::new(&bytes)).unwrap();
        assert_eq!(pool.entry(1), Ok(&Constant::Utf8Bytes(&[0xed, 0xa0, 0x80])));
        assert_eq!(pool.tag(1), Ok(CONSTANT_UTF8));
        assert!(pool.utf8(1).is_err());

        let mut out = ByteWriter::new();
        pool.write(&mut out).unwrap();
        assert_eq!(out.as_bytes(), &bytes[..]);
    }

    #[test]
    fn test_unknown_tag_reports_index() {
        let bytes = [0x00, 0x03, CONSTANT_INTEGER, 0, 0, 0, 1, 2, 0, 0];
        assert_eq!(
            parse_constant_pool(&mut ByteParser::new(&bytes)),
            Err(ClassError::UnknownConstantTag { tag: 2, index: 2 })
        );
    }

    #[test]
    fn test_resolvers_check_kind() {
        let bytes = pool_bytes();
        let pool = parse_constant_pool(&mut ByteParser::new(&bytes)).unwrap();
        assert_eq!(
            pool.utf8(4),
            Err(ClassError::InvalidPoolType {
                index: 4,
                expected: "Utf8"
            })
        );
        assert_eq!(
            pool.entry(9),
            Err(ClassError::InvalidPoolIndex { index: 9, len: 7 })
        );
    }
}
