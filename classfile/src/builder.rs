//! The mutable side of the constant pool.
//!
//! Encoding a [`Class`](crate::Class) and renaming one both need to map
//! resolved names back to pool indices. [`PoolBuilder`] starts from a copy of
//! a decoded pool, so every existing index keeps its meaning (bytecode refers
//! to the pool by index), and only appends entries that are not already
//! present.
//!
//! Lookups are a linear scan over the pool, which makes each insertion
//! `O(pool size)`. Pools are small enough in practice that this has not
//! mattered.

use crate::{
    constant::{Constant, ConstantPool, PoolIndex},
    ClassError, ClassResult,
};
use std::borrow::Cow;

/// The largest number of slots a pool can have, since the count is a `u16`.
pub const MAX_POOL_LEN: usize = u16::MAX as usize;

#[derive(Clone, Debug, PartialEq)]
pub struct PoolBuilder<'src> {
    entries: Vec<Constant<'src>>,
}

impl<'src> Default for PoolBuilder<'src> {
    fn default() -> Self {
        PoolBuilder::new()
    }
}

impl<'src> PoolBuilder<'src> {
    pub fn new() -> Self {
        PoolBuilder {
            entries: vec![Constant::Nothing],
        }
    }

    pub fn from_pool(pool: &ConstantPool<'src>) -> Self {
        PoolBuilder {
            entries: pool.entries().to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.len() <= 1
    }

    pub fn entry(&self, index: PoolIndex) -> Option<&Constant<'src>> {
        self.entries.get(index)
    }

    pub fn build(self) -> ConstantPool<'src> {
        ConstantPool::from_entries(self.entries)
    }

    /// Replaces the text of the `Utf8` entry at `index` in place. Every
    /// reference to the slot sees the new text.
    pub(crate) fn set_utf8(&mut self, index: PoolIndex, text: Cow<'src, str>) -> ClassResult<()> {
        let len = self.entries.len();
        match self.entries.get_mut(index) {
            Some(Constant::Utf8(slot)) => {
                *slot = text;
                Ok(())
            }
            Some(_) => Err(ClassError::InvalidPoolType {
                index,
                expected: "Utf8",
            }),
            None => Err(ClassError::InvalidPoolIndex { index, len }),
        }
    }

    fn push(&mut self, constant: Constant<'src>) -> ClassResult<PoolIndex> {
        let slots = if constant.is_wide() { 2 } else { 1 };
        if self.entries.len() + slots > MAX_POOL_LEN {
            return Err(ClassError::PoolOverflow);
        }

        let index = self.entries.len();
        let is_wide = constant.is_wide();
        self.entries.push(constant);
        if is_wide {
            self.entries.push(Constant::Nothing);
        }
        Ok(index)
    }

    fn find(&self, constant: &Constant<'_>) -> Option<PoolIndex> {
        self.entries
            .iter()
            .position(|entry| entry.same_value(constant))
    }

    fn intern(&mut self, constant: Constant<'src>) -> ClassResult<PoolIndex> {
        match self.find(&constant) {
            Some(index) => Ok(index),
            None => self.push(constant),
        }
    }

    fn utf8_eq(&self, index: PoolIndex, text: &str) -> bool {
        self.entries.get(index).and_then(Constant::as_utf8) == Some(text)
    }

    /// Finds an entry of the kind selected by `refers` whose referenced
    /// `Utf8` equals `text`, or appends `make(utf8_index)`.
    fn intern_named(
        &mut self,
        text: &str,
        refers: fn(&Constant<'_>) -> Option<PoolIndex>,
        make: fn(PoolIndex) -> Constant<'src>,
    ) -> ClassResult<PoolIndex> {
        let existing = self.entries.iter().position(|entry| match refers(entry) {
            Some(name) => self.utf8_eq(name, text),
            None => false,
        });

        match existing {
            Some(index) => Ok(index),
            None => {
                let name = self.utf8_info(text)?;
                self.push(make(name))
            }
        }
    }

    pub fn utf8_info(&mut self, text: &str) -> ClassResult<PoolIndex> {
        match self.entries.iter().position(|entry| entry.as_utf8() == Some(text)) {
            Some(index) => Ok(index),
            None => self.push(Constant::Utf8(Cow::Owned(text.to_owned()))),
        }
    }

    pub fn integer_info(&mut self, value: i32) -> ClassResult<PoolIndex> {
        self.intern(Constant::Integer(value))
    }

    pub fn float_info(&mut self, value: f32) -> ClassResult<PoolIndex> {
        self.intern(Constant::Float(value))
    }

    pub fn long_info(&mut self, value: i64) -> ClassResult<PoolIndex> {
        self.intern(Constant::Long(value))
    }

    pub fn double_info(&mut self, value: f64) -> ClassResult<PoolIndex> {
        self.intern(Constant::Double(value))
    }

    /// Two `Class` entries are the same if their names are equal.
    pub fn class_info(&mut self, name: &str) -> ClassResult<PoolIndex> {
        self.intern_named(
            name,
            |entry| match *entry {
                Constant::Class(name) => Some(name),
                _ => None,
            },
            Constant::Class,
        )
    }

    pub fn string_info(&mut self, value: &str) -> ClassResult<PoolIndex> {
        self.intern_named(
            value,
            |entry| match *entry {
                Constant::String(utf8) => Some(utf8),
                _ => None,
            },
            Constant::String,
        )
    }

    pub fn module_info(&mut self, name: &str) -> ClassResult<PoolIndex> {
        self.intern_named(
            name,
            |entry| match *entry {
                Constant::Module(name) => Some(name),
                _ => None,
            },
            Constant::Module,
        )
    }

    pub fn package_info(&mut self, name: &str) -> ClassResult<PoolIndex> {
        self.intern_named(
            name,
            |entry| match *entry {
                Constant::Package(name) => Some(name),
                _ => None,
            },
            Constant::Package,
        )
    }

    pub fn method_type_info(&mut self, descriptor: &str) -> ClassResult<PoolIndex> {
        self.intern_named(
            descriptor,
            |entry| match *entry {
                Constant::MethodType(descriptor) => Some(descriptor),
                _ => None,
            },
            Constant::MethodType,
        )
    }

    /// Two `NameAndType` entries are the same if both their names and their
    /// descriptors are equal.
    pub fn name_and_type_info(&mut self, name: &str, descriptor: &str) -> ClassResult<PoolIndex> {
        let existing = self.entries.iter().position(|entry| match *entry {
            Constant::NameAndType {
                name: n,
                descriptor: d,
            } => self.utf8_eq(n, name) && self.utf8_eq(d, descriptor),
            _ => false,
        });

        match existing {
            Some(index) => Ok(index),
            None => {
                let name = self.utf8_info(name)?;
                let descriptor = self.utf8_info(descriptor)?;
                self.push(Constant::NameAndType { name, descriptor })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_are_deduplicated_by_value() {
        let mut pool = PoolBuilder::new();
        let object = pool.class_info("java/lang/Object").unwrap();
        assert_eq!(object, 2);
        assert_eq!(pool.utf8_info("java/lang/Object"), Ok(1));
        assert_eq!(pool.class_info("java/lang/Object"), Ok(object));
        assert_eq!(pool.len(), 3);
    }

    #[test]
    fn test_wide_entries_reserve_a_slot() {
        let mut pool = PoolBuilder::new();
        assert_eq!(pool.long_info(7), Ok(1));
        assert_eq!(pool.integer_info(7), Ok(3));
        assert_eq!(pool.double_info(f64::NAN), Ok(4));
        assert_eq!(pool.double_info(f64::NAN), Ok(4));
        assert_eq!(pool.len(), 6);
    }

    #[test]
    fn test_kinds_do_not_alias() {
        let mut pool = PoolBuilder::new();
        let class = pool.class_info("a/B").unwrap();
        let string = pool.string_info("a/B").unwrap();
        let package = pool.package_info("a/B").unwrap();
        assert_ne!(class, string);
        assert_ne!(string, package);
        assert_eq!(pool.entry(string), Some(&Constant::String(1)));
        assert_eq!(pool.entry(package), Some(&Constant::Package(1)));
    }

    #[test]
    fn test_name_and_type_matches_both_parts() {
        let mut pool = PoolBuilder::new();
        let a = pool.name_and_type_info("run", "()V").unwrap();
        let b = pool.name_and_type_info("run", "(I)V").unwrap();
        assert_ne!(a, b);
        assert_eq!(pool.name_and_type_info("run", "()V"), Ok(a));
    }

    #[test]
    fn test_set_utf8_rejects_other_kinds() {
        let mut pool = PoolBuilder::new();
        let class = pool.class_info("a/B").unwrap();
        assert!(pool.set_utf8(class, "x/Y".into()).is_err());
        pool.set_utf8(1, "x/Y".into()).unwrap();
        assert_eq!(pool.class_info("x/Y"), Ok(class));
    }
}
