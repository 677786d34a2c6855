use crate::{pool::format_constant, style::Painter};
use classfile::{attribute::Attribute, member::Member, Class};
use std::fmt::{self, Write};

/// Splits one field type off the front of a descriptor and renders it as
/// Java source would spell it.
fn java_type(painter: Painter, descriptor: &str) -> Option<(String, &str)> {
    let element = descriptor.trim_start_matches('[');
    let dimensions = descriptor.len() - element.len();
    let (ty, rest) = element_type(painter, element)?;
    Some((ty + &"[]".repeat(dimensions), rest))
}

fn element_type(painter: Painter, descriptor: &str) -> Option<(String, &str)> {
    let (first, rest) = (descriptor.chars().next()?, descriptor.get(1..)?);
    let primitive = match first {
        'B' => "byte",
        'C' => "char",
        'D' => "double",
        'F' => "float",
        'I' => "int",
        'J' => "long",
        'S' => "short",
        'Z' => "boolean",
        'V' => "void",
        'L' => {
            let end = rest.find(';')?;
            let name = painter.paint("type.object", rest[..end].replace('/', "."));
            return Some((name, &rest[end + 1..]));
        }
        _ => return None,
    };
    Some((painter.paint("type", primitive), rest))
}

fn field_type(painter: Painter, descriptor: &str) -> String {
    match java_type(painter, descriptor) {
        Some((ty, "")) => ty,
        _ => painter.paint("type.descriptor", descriptor),
    }
}

/// `void run(int, a.b.C)` for a method descriptor, or the raw descriptor if
/// it does not parse.
fn method_decl(painter: Painter, name: &str, descriptor: &str) -> String {
    let parse = || -> Option<String> {
        let mut rest = descriptor.strip_prefix('(')?;
        let mut params = Vec::new();
        while !rest.starts_with(')') {
            let (param, tail) = java_type(painter, rest)?;
            params.push(param);
            rest = tail;
        }
        let (ret, tail) = java_type(painter, &rest[1..])?;
        if !tail.is_empty() {
            return None;
        }
        Some(format!("{} {}({})", ret, name, params.join(", ")))
    };
    parse().unwrap_or_else(|| {
        format!("{} {}", name, painter.paint("type.descriptor", descriptor))
    })
}

fn attribute_names(
    out: &mut String,
    painter: Painter,
    depth: usize,
    attributes: &[Attribute<'_>],
) -> fmt::Result {
    if attributes.is_empty() {
        return Ok(());
    }

    let names = attributes
        .iter()
        .map(|attribute| match attribute {
            Attribute::Unknown { name, .. } => {
                painter.paint("attribute.unknown", format!("?{}", name))
            }
            other => painter.paint("attribute", other.name()),
        })
        .collect::<Vec<_>>();
    writeln!(
        out,
        "{:indent$}{} {}",
        "",
        painter.paint("comment", "//"),
        names.join(", "),
        indent = depth * 4
    )
}

fn keywords(out: &mut String, painter: Painter, keywords: &[&str]) -> fmt::Result {
    for keyword in keywords {
        write!(out, "{} ", painter.paint("access", keyword))?;
    }
    Ok(())
}

fn member(out: &mut String, painter: Painter, member: &Member<'_>, is_method: bool) -> fmt::Result {
    attribute_names(out, painter, 1, &member.attributes)?;
    write!(out, "    ")?;
    if is_method {
        keywords(out, painter, &member.access.method_keywords())?;
        writeln!(out, "{};", method_decl(painter, &member.name, &member.descriptor))
    } else {
        keywords(out, painter, &member.access.field_keywords())?;
        writeln!(out, "{} {};", field_type(painter, &member.descriptor), member.name)
    }
}

pub fn dump_class(class: &Class<'_>, painter: Painter) -> Result<String, fmt::Error> {
    let mut out = String::new();

    attribute_names(&mut out, painter, 0, &class.attributes)?;
    writeln!(
        out,
        "{}",
        painter.paint(
            "comment",
            format!("// Version {}.{}", class.version.major, class.version.minor)
        )
    )?;

    let mut has_kind = false;
    for keyword in class.access.class_keywords() {
        let path = match keyword {
            "interface" | "annotation" | "enum" | "module" => {
                has_kind = true;
                "access.class"
            }
            _ => "access",
        };
        write!(out, "{} ", painter.paint(path, keyword))?;
    }
    if !has_kind {
        write!(out, "{} ", painter.paint("access.class", "class"))?;
    }
    write!(out, "{}", painter.paint("type.object", class.this_class.replace('/', ".")))?;

    if let Some(super_class) = class.super_class.as_deref() {
        if super_class != "java/lang/Object" {
            write!(
                out,
                " {} {}",
                painter.paint("extends", "extends"),
                painter.paint("type.object", super_class.replace('/', "."))
            )?;
        }
    }

    if !class.interfaces.is_empty() {
        let names = class
            .interfaces
            .iter()
            .map(|name| painter.paint("type.object", name.replace('/', ".")))
            .collect::<Vec<_>>();
        write!(out, " {} {}", painter.paint("extends", "implements"), names.join(", "))?;
    }
    writeln!(out, " {{")?;

    for field in class.fields.iter() {
        member(&mut out, painter, field, false)?;
    }
    if !class.fields.is_empty() && !class.methods.is_empty() {
        writeln!(out)?;
    }
    for method in class.methods.iter() {
        member(&mut out, painter, method, true)?;
    }
    writeln!(out, "}}")?;

    Ok(out)
}

pub fn dump_pool(class: &Class<'_>, painter: Painter) -> String {
    let mut out = String::new();
    for (index, constant) in class.pool.iter() {
        out.push_str(&format_constant(&class.pool, index, constant, painter));
        out.push('\n');
    }
    out
}
