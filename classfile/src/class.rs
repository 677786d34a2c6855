//! # Class file binary format
//!
//! All numbers in this format are big-endian
//!
//! ```txt
//! Class {
//!     // 0xCAFEBABE
//!     magic: u32,
//!     minor_version: u16,
//!     major_version: u16,
//!
//!     constant_pool_count: u16,
//!     constant_pool: [Constant; constant_pool_count - 1],
//!
//!     access_flags: u16,
//!     this_class: u16,
//!     super_class: u16,
//!
//!     interfaces_count: u16,
//!     interfaces: [u16; interfaces_count],
//!
//!     fields_count: u16,
//!     fields: [Field; fields_count],
//!
//!     methods_count: u16,
//!     methods: [Method; methods_count],
//!
//!     attributes_count: u16,
//!     attributes: [Attribute; attributes_count],
//! }
//! ```

use crate::{
    access::AccessFlags,
    attribute::{
        parse_attributes, parse_name, parse_names, parse_optional_name, write_attributes,
        write_name, write_names, write_optional_name, Attribute,
    },
    builder::PoolBuilder,
    constant::{parse_constant_pool, ConstantPool},
    member::{parse_members, write_members, Field, Method},
    parse::{ByteParser, ParseResult},
    write::ByteWriter,
    ClassError, ClassResult,
};
use std::borrow::Cow;

/// The class file magic: `0xCAFEBABE`
pub const CLASS_MAGIC: u32 = 0xCAFE_BABE;

/// Version of the class file.
///
/// Versions are denoted as `M.m` where `M` is the
/// major version and `m` is the minor version. The version can be ordered
/// lexicographically.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Version {
    pub major: u16,
    pub minor: u16,
}

pub fn parse_version(input: &mut ByteParser<'_>) -> ParseResult<Version> {
    let minor = input.parse_u16()?;
    let major = input.parse_u16()?;
    Ok(Version { minor, major })
}

/// A decoded class file.
///
/// Every name is resolved through the pool, and large payloads (bytecode,
/// unrecognized attributes) borrow from the buffer the class was parsed from.
/// `pool` is kept so that re-encoding preserves every index the bytecode
/// refers to.
#[derive(Clone, Debug, PartialEq)]
pub struct Class<'src> {
    pub version: Version,
    pub pool: ConstantPool<'src>,
    pub access: AccessFlags,

    pub this_class: Cow<'src, str>,
    /// `None` only for `java/lang/Object` and `module-info`.
    pub super_class: Option<Cow<'src, str>>,
    pub interfaces: Box<[Cow<'src, str>]>,

    pub fields: Box<[Field<'src>]>,
    pub methods: Box<[Method<'src>]>,
    pub attributes: Box<[Attribute<'src>]>,
}

pub fn parse_class<'src>(input: &mut ByteParser<'src>) -> ClassResult<Class<'src>> {
    let magic = input.parse_u32()?;
    if magic != CLASS_MAGIC {
        return Err(ClassError::WrongMagic(magic));
    }

    let version = parse_version(input)?;
    tracing::trace!(major = version.major, minor = version.minor, "parsed class header");

    let pool = parse_constant_pool(input)?;
    let access = AccessFlags(input.parse_u16()?);
    let this_class = parse_name(input, &pool, ConstantPool::class_name)?;
    let super_class = parse_optional_name(input, &pool, ConstantPool::class_name)?;
    let interfaces = parse_names(input, &pool, ConstantPool::class_name)?;

    let fields = parse_members(input, &pool)?;
    let methods = parse_members(input, &pool)?;
    let attributes = parse_attributes(input, &pool)?;

    tracing::trace!(
        class = %this_class,
        fields = fields.len(),
        methods = methods.len(),
        "parsed class"
    );

    Ok(Class {
        version,
        pool,
        access,
        this_class,
        super_class,
        interfaces,
        fields,
        methods,
        attributes,
    })
}

impl<'src> Class<'src> {
    pub fn parse(src: &'src [u8]) -> ClassResult<Class<'src>> {
        parse_class(&mut ByteParser::new(src))
    }

    /// Encodes the class. Entries of the original pool keep their indices;
    /// names that are not in it yet are appended.
    pub fn to_bytes(&self) -> ClassResult<Vec<u8>> {
        let mut pool = PoolBuilder::from_pool(&self.pool);

        // The body goes first, since it decides what the pool holds.
        let mut body = ByteWriter::new();
        body.write_u16(self.access.0);
        write_name(&mut body, &mut pool, &self.this_class, PoolBuilder::class_info)?;
        write_optional_name(
            &mut body,
            &mut pool,
            self.super_class.as_deref(),
            PoolBuilder::class_info,
        )?;
        write_names(&mut body, &mut pool, &self.interfaces, PoolBuilder::class_info)?;
        write_members(&mut body, &mut pool, &self.fields, "fields")?;
        write_members(&mut body, &mut pool, &self.methods, "methods")?;
        write_attributes(&mut body, &mut pool, &self.attributes)?;

        let pool = pool.build();
        let mut out = ByteWriter::new();
        out.write_u32(CLASS_MAGIC);
        out.write_u16(self.version.minor);
        out.write_u16(self.version.major);
        pool.write(&mut out)?;
        out.write_bytes(body.as_bytes());

        tracing::trace!(
            class = %self.this_class,
            pool = pool.len(),
            len = out.len(),
            "encoded class"
        );
        Ok(out.into_inner())
    }

    /// The first class-level attribute with the given name.
    pub fn attribute(&self, name: &str) -> Option<&Attribute<'src>> {
        self.attributes.iter().find(|attribute| attribute.name() == name)
    }

    pub fn field(&self, name: &str) -> Option<&Field<'src>> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// The first method with the given name. Overloads share a name, so pass
    /// a descriptor to pick one.
    pub fn method(&self, name: &str, descriptor: Option<&str>) -> Option<&Method<'src>> {
        self.methods.iter().find(|method| {
            method.name == name && descriptor.map_or(true, |d| method.descriptor == d)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrong_magic() {
        let bytes = [0xca, 0xfe, 0xd0, 0x0d, 0x00, 0x00, 0x00, 0x34];
        assert_eq!(
            Class::parse(&bytes),
            Err(ClassError::WrongMagic(0xcafe_d00d))
        );
    }

    #[test]
    fn test_truncated_header() {
        let bytes = [0xca, 0xfe, 0xba, 0xbe, 0x00, 0x00];
        assert!(matches!(
            Class::parse(&bytes),
            Err(ClassError::Parse(crate::ParseError::Incomplete { offset: 6, needed: 2 }))
        ));
    }
}
