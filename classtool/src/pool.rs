//! Utilities for grabbing strings, or formatting data from a class constant
//! pool.

use crate::style::Painter;
use classfile::{
    constant::{Constant, ConstantPool},
    PoolIndex,
};

pub const WRONG_TYPE_MESSAGE: &str = "<wrong type>";

pub fn get_str<'a>(pool: &'a ConstantPool<'_>, index: PoolIndex) -> &'a str {
    pool.utf8(index).map_or(WRONG_TYPE_MESSAGE, |text| &**text)
}

pub fn get_class_name<'a>(pool: &'a ConstantPool<'_>, index: PoolIndex) -> &'a str {
    pool.class_name(index).map_or(WRONG_TYPE_MESSAGE, |text| &**text)
}

fn get_member(pool: &ConstantPool<'_>, class: PoolIndex, name_and_type: PoolIndex) -> String {
    format!(
        "{}.{}",
        get_class_name(pool, class),
        get_name_and_type(pool, name_and_type)
    )
}

fn get_name_and_type(pool: &ConstantPool<'_>, index: PoolIndex) -> String {
    match pool.name_and_type(index) {
        Ok((name, descriptor)) => format!("{}:{}", name, descriptor),
        Err(_) => WRONG_TYPE_MESSAGE.to_owned(),
    }
}

/// One pool slot, split into the parts `dump -c` prints.
#[derive(Clone, Debug, PartialEq)]
pub struct ConstantLine {
    pub kind: &'static str,
    pub style: &'static str,
    /// The literal value, or the indices the entry refers to.
    pub operands: String,
    /// What the referenced entries resolve to.
    pub comment: Option<String>,
}

pub fn describe(pool: &ConstantPool<'_>, constant: &Constant<'_>) -> ConstantLine {
    let line = |style, operands: String, comment: Option<String>| ConstantLine {
        kind: constant.kind(),
        style,
        operands,
        comment,
    };

    match *constant {
        Constant::Nothing => line("comment", "<nothing>".to_owned(), None),
        Constant::Utf8(ref text) => line("pool.val.utf8", format!("{:?}", text), None),
        Constant::Utf8Bytes(bytes) => line(
            "pool.val.utf8",
            format!("{:?}", String::from_utf8_lossy(bytes)),
            Some("unpaired surrogate".to_owned()),
        ),
        Constant::Integer(value) => line("pool.val.int", value.to_string(), None),
        Constant::Float(value) => line("pool.val.float", format!("{:?}f", value), None),
        Constant::Long(value) => line("pool.val.long", format!("{}l", value), None),
        Constant::Double(value) => line("pool.val.double", format!("{:?}d", value), None),

        Constant::Class(name) => line(
            "pool.ref.class",
            format!("#{}", name),
            Some(get_str(pool, name).to_owned()),
        ),
        Constant::String(utf8) => line(
            "pool.ref.string",
            format!("#{}", utf8),
            Some(format!("{:?}", get_str(pool, utf8))),
        ),
        Constant::MethodType(descriptor) => line(
            "pool.ref.dynamic.method_type",
            format!("#{}", descriptor),
            Some(get_str(pool, descriptor).to_owned()),
        ),
        Constant::Module(name) => line(
            "pool.ref.module",
            format!("#{}", name),
            Some(get_str(pool, name).to_owned()),
        ),
        Constant::Package(name) => line(
            "pool.ref.package",
            format!("#{}", name),
            Some(get_str(pool, name).to_owned()),
        ),

        Constant::FieldRef {
            class,
            name_and_type,
        } => line(
            "pool.ref.member.field",
            format!("#{} #{}", class, name_and_type),
            Some(get_member(pool, class, name_and_type)),
        ),
        Constant::MethodRef {
            class,
            name_and_type,
        } => line(
            "pool.ref.member.method",
            format!("#{} #{}", class, name_and_type),
            Some(get_member(pool, class, name_and_type)),
        ),
        Constant::InterfaceMethodRef {
            class,
            name_and_type,
        } => line(
            "pool.ref.member.interface_method",
            format!("#{} #{}", class, name_and_type),
            Some(get_member(pool, class, name_and_type)),
        ),
        Constant::NameAndType { name, descriptor } => line(
            "pool.ref.name_and_type",
            format!("#{} #{}", name, descriptor),
            Some(format!("{}:{}", get_str(pool, name), get_str(pool, descriptor))),
        ),

        Constant::MethodHandle { kind, reference } => {
            let comment = match pool.entry(reference) {
                Ok(&Constant::FieldRef {
                    class,
                    name_and_type,
                })
                | Ok(&Constant::MethodRef {
                    class,
                    name_and_type,
                })
                | Ok(&Constant::InterfaceMethodRef {
                    class,
                    name_and_type,
                }) => get_member(pool, class, name_and_type),
                _ => WRONG_TYPE_MESSAGE.to_owned(),
            };
            line(
                "pool.ref.dynamic.method_handle",
                format!("{:?} #{}", kind, reference),
                Some(comment),
            )
        }
        Constant::Dynamic {
            bootstrap_method_attr,
            name_and_type,
        } => line(
            "pool.ref.dynamic.constant",
            format!("#{}:#{}", bootstrap_method_attr, name_and_type),
            Some(get_name_and_type(pool, name_and_type)),
        ),
        Constant::InvokeDynamic {
            bootstrap_method_attr,
            name_and_type,
        } => line(
            "pool.ref.dynamic.invoke",
            format!("#{}:#{}", bootstrap_method_attr, name_and_type),
            Some(get_name_and_type(pool, name_and_type)),
        ),
    }
}

/// Renders a slot the way `dump -c` prints it.
pub fn format_constant(
    pool: &ConstantPool<'_>,
    index: PoolIndex,
    constant: &Constant<'_>,
    painter: Painter,
) -> String {
    let line = describe(pool, constant);
    let mut out = format!(
        "{} = {} {}",
        painter.paint("pool.index", format!("{:>6}", format!("#{}", index))),
        painter.paint(line.style, format!("{:<18}", line.kind)),
        line.operands
    );
    if let Some(comment) = line.comment {
        out.push_str(&format!(" {}", painter.paint("comment", format!("// {}", comment))));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use classfile::builder::PoolBuilder;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_describe_resolves_references() {
        let mut builder = PoolBuilder::new();
        let class = builder.class_info("a/b/C").unwrap();
        let nat = builder.name_and_type_info("run", "()V").unwrap();
        let pool = builder.build();

        let method = Constant::MethodRef {
            class,
            name_and_type: nat,
        };
        assert_eq!(
            describe(&pool, &method),
            ConstantLine {
                kind: "MethodRef",
                style: "pool.ref.member.method",
                operands: format!("#{} #{}", class, nat),
                comment: Some("a/b/C.run:()V".to_owned()),
            }
        );
    }

    #[test]
    fn test_describe_tolerates_bad_references() {
        let pool = PoolBuilder::new().build();
        let line = describe(&pool, &Constant::Class(7));
        assert_eq!(line.comment.as_deref(), Some(WRONG_TYPE_MESSAGE));
    }
}
