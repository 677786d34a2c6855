use std::{fmt, ops::*};

/// The `access_flags` word of a class, member, inner class or parameter.
///
/// Several bits mean different things depending on where the word appears
/// (`0x0020` is `super` on a class and `synchronized` on a method), so the
/// keywords are rendered per context.
#[derive(Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct AccessFlags(pub u16);

impl AccessFlags {
    pub fn is(self, flag: u16) -> bool {
        self.0 & flag == flag
    }

    pub fn class_keywords(self) -> Vec<&'static str> {
        self.keywords(&[
            (ACC_PUBLIC, "public"),
            (ACC_FINAL, "final"),
            (ACC_SUPER, "super"),
            (ACC_INTERFACE, "interface"),
            (ACC_ABSTRACT, "abstract"),
            (ACC_SYNTHETIC, "synthetic"),
            (ACC_ANNOTATION, "annotation"),
            (ACC_ENUM, "enum"),
            (ACC_MODULE, "module"),
        ])
    }

    pub fn inner_class_keywords(self) -> Vec<&'static str> {
        self.keywords(&[
            (ACC_PUBLIC, "public"),
            (ACC_PRIVATE, "private"),
            (ACC_PROTECTED, "protected"),
            (ACC_STATIC, "static"),
            (ACC_FINAL, "final"),
            (ACC_INTERFACE, "interface"),
            (ACC_ABSTRACT, "abstract"),
            (ACC_SYNTHETIC, "synthetic"),
            (ACC_ANNOTATION, "annotation"),
            (ACC_ENUM, "enum"),
        ])
    }

    pub fn field_keywords(self) -> Vec<&'static str> {
        self.keywords(&[
            (ACC_PUBLIC, "public"),
            (ACC_PRIVATE, "private"),
            (ACC_PROTECTED, "protected"),
            (ACC_STATIC, "static"),
            (ACC_FINAL, "final"),
            (ACC_VOLATILE, "volatile"),
            (ACC_TRANSIENT, "transient"),
            (ACC_SYNTHETIC, "synthetic"),
            (ACC_ENUM, "enum"),
        ])
    }

    pub fn method_keywords(self) -> Vec<&'static str> {
        self.keywords(&[
            (ACC_PUBLIC, "public"),
            (ACC_PRIVATE, "private"),
            (ACC_PROTECTED, "protected"),
            (ACC_STATIC, "static"),
            (ACC_FINAL, "final"),
            (ACC_SYNCHRONIZED, "synchronized"),
            (ACC_BRIDGE, "bridge"),
            (ACC_VARARGS, "varargs"),
            (ACC_NATIVE, "native"),
            (ACC_ABSTRACT, "abstract"),
            (ACC_STRICT, "strictfp"),
            (ACC_SYNTHETIC, "synthetic"),
        ])
    }

    fn keywords(self, table: &[(u16, &'static str)]) -> Vec<&'static str> {
        table
            .iter()
            .filter(|&&(flag, _)| self.is(flag))
            .map(|&(_, keyword)| keyword)
            .collect()
    }
}

impl fmt::Debug for AccessFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessFlags({:#06x})", self.0)
    }
}

impl BitOr for AccessFlags {
    type Output = AccessFlags;

    fn bitor(self, other: Self) -> Self {
        AccessFlags(self.0 | other.0)
    }
}

impl BitAnd for AccessFlags {
    type Output = AccessFlags;

    fn bitand(self, other: Self) -> Self {
        AccessFlags(self.0 & other.0)
    }
}

impl BitXor for AccessFlags {
    type Output = AccessFlags;

    fn bitxor(self, other: Self) -> Self {
        AccessFlags(self.0 ^ other.0)
    }
}

/// Marked or implicitly public in source.
pub const ACC_PUBLIC: u16 = 0x0001;
/// Marked private in source.
pub const ACC_PRIVATE: u16 = 0x0002;
/// Marked protected in source.
pub const ACC_PROTECTED: u16 = 0x0004;
/// Is an interface, not a class.
pub const ACC_INTERFACE: u16 = 0x0200;
/// Declared as an annotation type.
pub const ACC_ANNOTATION: u16 = 0x2000;
/// Declared as an enum type.
pub const ACC_ENUM: u16 = 0x4000;
/// Is a module, not a class or interface.
pub const ACC_MODULE: u16 = 0x8000;
/// Declared static.
pub const ACC_STATIC: u16 = 0x0008;
/// Declared final; must not be overridden.
pub const ACC_FINAL: u16 = 0x0010;
/// Declared abstract; no implementation is provided.
pub const ACC_ABSTRACT: u16 = 0x0400;
/// Declared volatile; cannot be cached.
pub const ACC_VOLATILE: u16 = 0x0040;
/// Declared transient; not written or read by a persistent object manager.
pub const ACC_TRANSIENT: u16 = 0x0080;
/// Treat superclass methods specially when invoked by the invokespecial
/// instruction.
pub const ACC_SUPER: u16 = 0x0020;
/// Declared synchronized; invocation is wrapped by a monitor use.
pub const ACC_SYNCHRONIZED: u16 = 0x0020;
/// Declared with variable number of arguments.
pub const ACC_VARARGS: u16 = 0x0080;
/// Declared native; implemented in a language other than Java.
pub const ACC_NATIVE: u16 = 0x0100;
/// Declared strictfp; floating-point mode is FP-strict.
pub const ACC_STRICT: u16 = 0x0800;
/// A bridge method, generated by the compiler.
pub const ACC_BRIDGE: u16 = 0x0040;
/// Declared synthetic; not present in the source code.
pub const ACC_SYNTHETIC: u16 = 0x1000;

// Module, `requires`, `exports` and `opens` flags.
pub const ACC_OPEN: u16 = 0x0020;
pub const ACC_TRANSITIVE: u16 = 0x0020;
pub const ACC_STATIC_PHASE: u16 = 0x0040;
/// Implicitly declared in source.
pub const ACC_MANDATED: u16 = 0x8000;
