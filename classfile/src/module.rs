//! The `Module` attribute of a `module-info` class.
//!
//! ```txt
//! Module {
//!     module_name_index: u16,
//!     module_flags: u16,
//!     module_version_index: u16,
//!     requires_count: u16,
//!     requires: [{ index: u16, flags: u16, version_index: u16 }; requires_count],
//!     exports_count: u16,
//!     exports: [{ index: u16, flags: u16, to_count: u16, to: [u16; to_count] }; exports_count],
//!     opens_count: u16,
//!     opens: [{ index: u16, flags: u16, to_count: u16, to: [u16; to_count] }; opens_count],
//!     uses_count: u16,
//!     uses: [u16; uses_count],
//!     provides_count: u16,
//!     provides: [{ index: u16, with_count: u16, with: [u16; with_count] }; provides_count],
//! }
//! ```

use crate::{
    access::AccessFlags,
    attribute::{parse_name, parse_names, parse_optional_name, write_name, write_names, write_optional_name},
    builder::PoolBuilder,
    constant::ConstantPool,
    parse::ByteParser,
    write::ByteWriter,
    ClassError, ClassResult,
};
use std::borrow::Cow;

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ModuleAttribute<'src> {
    pub name: Cow<'src, str>,
    pub flags: AccessFlags,
    pub version: Option<Cow<'src, str>>,
    pub requires: Box<[Requires<'src>]>,
    pub exports: Box<[Export<'src>]>,
    pub opens: Box<[Export<'src>]>,
    /// Binary names of the services this module uses.
    pub uses: Box<[Cow<'src, str>]>,
    pub provides: Box<[Provides<'src>]>,
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Requires<'src> {
    pub module: Cow<'src, str>,
    pub flags: AccessFlags,
    pub version: Option<Cow<'src, str>>,
}

/// An `exports` or `opens` directive. An empty `to` list means the package
/// is exported or opened to every module.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Export<'src> {
    pub package: Cow<'src, str>,
    pub flags: AccessFlags,
    pub to: Box<[Cow<'src, str>]>,
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Provides<'src> {
    pub service: Cow<'src, str>,
    pub with: Box<[Cow<'src, str>]>,
}

fn parse_export<'src>(
    input: &mut ByteParser<'src>,
    pool: &ConstantPool<'src>,
) -> ClassResult<Export<'src>> {
    Ok(Export {
        package: parse_name(input, pool, ConstantPool::package_name)?,
        flags: AccessFlags(input.parse_u16()?),
        to: parse_names(input, pool, ConstantPool::module_name)?,
    })
}

fn parse_exports<'src>(
    input: &mut ByteParser<'src>,
    pool: &ConstantPool<'src>,
) -> ClassResult<Box<[Export<'src>]>> {
    let len = input.parse_u16()? as usize;
    input
        .seq(len, |input| parse_export(input, pool))
        .map(Into::into)
}

pub fn parse_module<'src>(
    input: &mut ByteParser<'src>,
    pool: &ConstantPool<'src>,
) -> ClassResult<ModuleAttribute<'src>> {
    let name = parse_name(input, pool, ConstantPool::module_name)?;
    let flags = AccessFlags(input.parse_u16()?);
    let version = parse_optional_name(input, pool, ConstantPool::utf8)?;

    let requires_len = input.parse_u16()? as usize;
    let requires = input.seq(requires_len, |input| {
        Ok::<_, ClassError>(Requires {
            module: parse_name(input, pool, ConstantPool::module_name)?,
            flags: AccessFlags(input.parse_u16()?),
            version: parse_optional_name(input, pool, ConstantPool::utf8)?,
        })
    })?;

    let exports = parse_exports(input, pool)?;
    let opens = parse_exports(input, pool)?;
    let uses = parse_names(input, pool, ConstantPool::class_name)?;

    let provides_len = input.parse_u16()? as usize;
    let provides = input.seq(provides_len, |input| {
        Ok::<_, ClassError>(Provides {
            service: parse_name(input, pool, ConstantPool::class_name)?,
            with: parse_names(input, pool, ConstantPool::class_name)?,
        })
    })?;

    Ok(ModuleAttribute {
        name,
        flags,
        version,
        requires: requires.into(),
        exports,
        opens,
        uses,
        provides: provides.into(),
    })
}

fn write_exports(
    out: &mut ByteWriter,
    pool: &mut PoolBuilder<'_>,
    exports: &[Export<'_>],
) -> ClassResult<()> {
    out.write_len_u16(exports.len(), "module exports")?;
    for export in exports {
        write_name(out, pool, &export.package, PoolBuilder::package_info)?;
        out.write_u16(export.flags.0);
        write_names(out, pool, &export.to, PoolBuilder::module_info)?;
    }
    Ok(())
}

pub fn write_module(
    out: &mut ByteWriter,
    pool: &mut PoolBuilder<'_>,
    module: &ModuleAttribute<'_>,
) -> ClassResult<()> {
    write_name(out, pool, &module.name, PoolBuilder::module_info)?;
    out.write_u16(module.flags.0);
    write_optional_name(out, pool, module.version.as_deref(), PoolBuilder::utf8_info)?;

    out.write_len_u16(module.requires.len(), "module requires")?;
    for requires in module.requires.iter() {
        write_name(out, pool, &requires.module, PoolBuilder::module_info)?;
        out.write_u16(requires.flags.0);
        write_optional_name(out, pool, requires.version.as_deref(), PoolBuilder::utf8_info)?;
    }

    write_exports(out, pool, &module.exports)?;
    write_exports(out, pool, &module.opens)?;
    write_names(out, pool, &module.uses, PoolBuilder::class_info)?;

    out.write_len_u16(module.provides.len(), "module provides")?;
    for provides in module.provides.iter() {
        write_name(out, pool, &provides.service, PoolBuilder::class_info)?;
        write_names(out, pool, &provides.with, PoolBuilder::class_info)?;
    }
    Ok(())
}
