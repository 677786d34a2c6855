//! Fields and methods share one layout:
//!
//! ```txt
//! Member {
//!     access:           u16
//!     name:             u16
//!     descriptor:       u16
//!     attributes_count: u16
//!     attributes:       [Attribute; attributes_count]
//! }
//! ```

use crate::{
    access::AccessFlags,
    attribute::{parse_attributes, parse_name, write_attributes, write_name, Attribute},
    builder::PoolBuilder,
    constant::ConstantPool,
    parse::ByteParser,
    write::ByteWriter,
    ClassResult,
};
use std::borrow::Cow;

#[derive(Clone, Debug, PartialEq)]
pub struct Member<'src> {
    pub access: AccessFlags,
    pub name: Cow<'src, str>,
    /// A field descriptor for fields, a method descriptor for methods.
    pub descriptor: Cow<'src, str>,
    pub attributes: Box<[Attribute<'src>]>,
}

pub type Field<'src> = Member<'src>;
pub type Method<'src> = Member<'src>;

impl<'src> Member<'src> {
    /// The first attribute with the given name.
    pub fn attribute(&self, name: &str) -> Option<&Attribute<'src>> {
        self.attributes.iter().find(|attribute| attribute.name() == name)
    }
}

pub fn parse_member<'src>(
    input: &mut ByteParser<'src>,
    pool: &ConstantPool<'src>,
) -> ClassResult<Member<'src>> {
    Ok(Member {
        access: AccessFlags(input.parse_u16()?),
        name: parse_name(input, pool, ConstantPool::utf8)?,
        descriptor: parse_name(input, pool, ConstantPool::utf8)?,
        attributes: parse_attributes(input, pool)?,
    })
}

pub fn parse_members<'src>(
    input: &mut ByteParser<'src>,
    pool: &ConstantPool<'src>,
) -> ClassResult<Box<[Member<'src>]>> {
    let len = input.parse_u16()? as usize;
    input
        .seq(len, |input| parse_member(input, pool))
        .map(Into::into)
}

pub fn write_member(
    out: &mut ByteWriter,
    pool: &mut PoolBuilder<'_>,
    member: &Member<'_>,
) -> ClassResult<()> {
    out.write_u16(member.access.0);
    write_name(out, pool, &member.name, PoolBuilder::utf8_info)?;
    write_name(out, pool, &member.descriptor, PoolBuilder::utf8_info)?;
    write_attributes(out, pool, &member.attributes)
}

pub fn write_members(
    out: &mut ByteWriter,
    pool: &mut PoolBuilder<'_>,
    members: &[Member<'_>],
    what: &'static str,
) -> ClassResult<()> {
    out.write_len_u16(members.len(), what)?;
    members
        .iter()
        .try_for_each(|member| write_member(out, pool, member))
}
