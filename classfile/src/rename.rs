//! Consistent renaming of every binary class name in a class.
//!
//! A name can be spelled in many places: `Class` pool entries, descriptors in
//! `NameAndType` and `MethodType` entries, member descriptors, signatures, and
//! several attributes. All of them end up as `Utf8` pool entries, so the
//! renamer decides a new text for each `Utf8` slot it reaches (once, and
//! remembers the answer) and then overwrites those slots in a copy of the
//! pool. Every index keeps its meaning, which keeps the bytecode valid.
//!
//! Annotations, constant values and the other attributes that do not carry a
//! `Class` reference are copied as they are.

use crate::{
    attribute::{Attribute, Code, EnclosingMethod, ExceptionHandler, InnerClass, LocalVariable,
        NameAndType, RecordComponent},
    builder::PoolBuilder,
    class::Class,
    constant::{Constant, PoolIndex},
    member::Member,
    module::{ModuleAttribute, Provides},
    signature, ClassError, ClassResult,
};
use std::{borrow::Cow, collections::HashMap};

/// The result of [`rename`].
#[derive(Clone, Debug, PartialEq)]
pub struct Renamed<'src> {
    pub class: Class<'src>,
    /// Whether any name was actually replaced. When this is false `class`
    /// is equal to the input.
    pub changed: bool,
}

/// Renames every binary name in `class` for which `mapper` returns a
/// different name.
///
/// `mapper` sees slash separated binary names like `java/lang/Object`, and
/// must answer the same way every time it is asked about the same name.
pub fn rename<'src, F>(class: &Class<'src>, mapper: F) -> ClassResult<Renamed<'src>>
where
    F: FnMut(&str) -> Option<String>,
{
    Renamer {
        class,
        mapper,
        renamed: HashMap::new(),
        changed: false,
    }
    .run()
}

struct Renamer<'a, 'src, F> {
    class: &'a Class<'src>,
    mapper: F,
    /// The text each visited `Utf8` slot should have afterwards.
    renamed: HashMap<PoolIndex, Cow<'src, str>>,
    changed: bool,
}

impl<'a, 'src, F> Renamer<'a, 'src, F>
where
    F: FnMut(&str) -> Option<String>,
{
    fn run(mut self) -> ClassResult<Renamed<'src>> {
        let class = self.class;

        let methods = self.rename_members(&class.methods)?;
        let fields = self.rename_members(&class.fields)?;
        let attributes = self.rename_attributes(&class.attributes)?;

        let interfaces = class
            .interfaces
            .iter()
            .map(|name| self.rename_binary(name))
            .collect::<ClassResult<_>>()?;
        let this_class = self.rename_binary(&class.this_class)?;
        let super_class = self.rename_optional_binary(class.super_class.as_deref())?;

        for entry in class.pool.entries() {
            match *entry {
                Constant::NameAndType { descriptor, .. } | Constant::MethodType(descriptor) => {
                    self.rename_descriptor_at(descriptor)?;
                }
                Constant::Class(name) => {
                    self.rename_binary_at(name)?;
                }
                _ => {}
            }
        }

        // Slots are only overwritten now that every lookup above has seen the
        // original pool.
        let mut pool = PoolBuilder::from_pool(&class.pool);
        let mut replaced = 0;
        for (&index, text) in &self.renamed {
            if class.pool.utf8(index)? != text {
                pool.set_utf8(index, text.clone())?;
                replaced += 1;
            }
        }

        tracing::debug!(
            class = %class.this_class,
            visited = self.renamed.len(),
            replaced,
            "renamed class"
        );

        Ok(Renamed {
            class: Class {
                version: class.version,
                pool: pool.build(),
                access: class.access,
                this_class,
                super_class,
                interfaces,
                fields,
                methods,
                attributes,
            },
            changed: self.changed,
        })
    }

    fn find(&self, text: &str) -> ClassResult<PoolIndex> {
        self.class
            .pool
            .find_utf8(text)
            .ok_or_else(|| ClassError::UnresolvedName(text.to_owned()))
    }

    fn rename_descriptor(&mut self, descriptor: &str) -> ClassResult<Cow<'src, str>> {
        let index = self.find(descriptor)?;
        self.rename_descriptor_at(index)
    }

    fn rename_descriptor_at(&mut self, index: PoolIndex) -> ClassResult<Cow<'src, str>> {
        if let Some(text) = self.renamed.get(&index) {
            return Ok(text.clone());
        }

        let original = self.class.pool.utf8(index)?.clone();
        let text = match signature::rename(&original, &mut self.mapper)? {
            Some(renamed) => {
                tracing::debug!(from = %original, to = %renamed, "renamed descriptor");
                self.changed = true;
                Cow::Owned(renamed)
            }
            None => original,
        };

        self.renamed.insert(index, text.clone());
        Ok(text)
    }

    fn rename_binary(&mut self, name: &str) -> ClassResult<Cow<'src, str>> {
        let index = self.find(name)?;
        self.rename_binary_at(index)
    }

    fn rename_optional_binary(&mut self, name: Option<&str>) -> ClassResult<Option<Cow<'src, str>>> {
        name.map(|name| self.rename_binary(name)).transpose()
    }

    fn rename_binary_at(&mut self, index: PoolIndex) -> ClassResult<Cow<'src, str>> {
        if let Some(text) = self.renamed.get(&index) {
            return Ok(text.clone());
        }

        let original = self.class.pool.utf8(index)?.clone();

        // Array classes are named by their descriptor.
        if original.starts_with('[') {
            return self.rename_descriptor_at(index);
        }

        let text = match (self.mapper)(&original) {
            Some(renamed) if renamed != *original => {
                tracing::debug!(from = %original, to = %renamed, "renamed class");
                self.changed = true;
                Cow::Owned(renamed)
            }
            _ => original,
        };

        self.renamed.insert(index, text.clone());
        Ok(text)
    }

    fn rename_binaries(&mut self, names: &[Cow<'src, str>]) -> ClassResult<Box<[Cow<'src, str>]>> {
        names.iter().map(|name| self.rename_binary(name)).collect()
    }

    fn rename_members(&mut self, members: &[Member<'src>]) -> ClassResult<Box<[Member<'src>]>> {
        members
            .iter()
            .map(|member| {
                Ok(Member {
                    access: member.access,
                    name: member.name.clone(),
                    descriptor: self.rename_descriptor(&member.descriptor)?,
                    attributes: self.rename_attributes(&member.attributes)?,
                })
            })
            .collect()
    }

    fn rename_attributes(
        &mut self,
        attributes: &[Attribute<'src>],
    ) -> ClassResult<Box<[Attribute<'src>]>> {
        attributes
            .iter()
            .map(|attribute| self.rename_attribute(attribute))
            .collect()
    }

    fn rename_local_variables(
        &mut self,
        table: &[LocalVariable<'src>],
    ) -> ClassResult<Box<[LocalVariable<'src>]>> {
        table
            .iter()
            .map(|variable| {
                Ok(LocalVariable {
                    descriptor: self.rename_descriptor(&variable.descriptor)?,
                    ..variable.clone()
                })
            })
            .collect()
    }

    fn rename_attribute(&mut self, attribute: &Attribute<'src>) -> ClassResult<Attribute<'src>> {
        Ok(match attribute {
            Attribute::Signature(signature) => {
                Attribute::Signature(self.rename_descriptor(signature)?)
            }

            Attribute::EnclosingMethod(enclosing) => Attribute::EnclosingMethod(EnclosingMethod {
                class: self.rename_binary(&enclosing.class)?,
                method: match &enclosing.method {
                    Some(method) => Some(NameAndType {
                        name: method.name.clone(),
                        descriptor: self.rename_descriptor(&method.descriptor)?,
                    }),
                    None => None,
                },
            }),

            Attribute::InnerClasses(classes) => Attribute::InnerClasses(
                classes
                    .iter()
                    .map(|class| {
                        Ok(InnerClass {
                            inner_class: self.rename_binary(&class.inner_class)?,
                            outer_class: self.rename_optional_binary(class.outer_class.as_deref())?,
                            inner_name: class.inner_name.clone(),
                            inner_access: class.inner_access,
                        })
                    })
                    .collect::<ClassResult<_>>()?,
            ),

            Attribute::LocalVariableTable(table) => {
                Attribute::LocalVariableTable(self.rename_local_variables(table)?)
            }
            Attribute::LocalVariableTypeTable(table) => {
                Attribute::LocalVariableTypeTable(self.rename_local_variables(table)?)
            }

            Attribute::Record(components) => Attribute::Record(
                components
                    .iter()
                    .map(|component| {
                        Ok(RecordComponent {
                            name: component.name.clone(),
                            descriptor: self.rename_descriptor(&component.descriptor)?,
                            attributes: self.rename_attributes(&component.attributes)?,
                        })
                    })
                    .collect::<ClassResult<_>>()?,
            ),

            Attribute::Code(code) => Attribute::Code(Code {
                max_stack: code.max_stack,
                max_locals: code.max_locals,
                code: code.code,
                exception_table: code
                    .exception_table
                    .iter()
                    .map(|handler| {
                        Ok(ExceptionHandler {
                            start_pc: handler.start_pc,
                            end_pc: handler.end_pc,
                            handler_pc: handler.handler_pc,
                            catch_type: self.rename_optional_binary(handler.catch_type.as_deref())?,
                        })
                    })
                    .collect::<ClassResult<_>>()?,
                attributes: self.rename_attributes(&code.attributes)?,
            }),

            // These name `Class` entries, which the pool pass renames anyway.
            Attribute::Exceptions(names) => Attribute::Exceptions(self.rename_binaries(names)?),
            Attribute::NestMembers(names) => Attribute::NestMembers(self.rename_binaries(names)?),
            Attribute::PermittedSubclasses(names) => {
                Attribute::PermittedSubclasses(self.rename_binaries(names)?)
            }
            Attribute::NestHost(name) => Attribute::NestHost(self.rename_binary(name)?),
            Attribute::ModuleMainClass(name) => {
                Attribute::ModuleMainClass(self.rename_binary(name)?)
            }
            Attribute::Module(module) => Attribute::Module(ModuleAttribute {
                uses: self.rename_binaries(&module.uses)?,
                provides: module
                    .provides
                    .iter()
                    .map(|provides| {
                        Ok(Provides {
                            service: self.rename_binary(&provides.service)?,
                            with: self.rename_binaries(&provides.with)?,
                        })
                    })
                    .collect::<ClassResult<_>>()?,
                ..module.clone()
            }),

            other => other.clone(),
        })
    }
}
