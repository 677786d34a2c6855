//! # Attribute Formats
//!
//! ## General Form
//! Every attribute starts with an index into the constant pool naming its
//! kind, followed by the byte length of the *rest* of the attribute, not
//! including those first six bytes.
//!
//! ```txt
//! AttributeInfo {
//!     name_index: u16,
//!     length: u32,
//!     info: [u8; length],
//! }
//! ```
//!
//! Each attribute is decoded from a parser bounded to exactly `length` bytes,
//! and the decoder must consume all of them. Kinds that are not listed in
//! [`Attribute`] are kept as [`Attribute::Unknown`] with their payload
//! untouched, so newer class files still round-trip.
//!
//! Names and class references are resolved to strings while decoding and
//! interned into a [`PoolBuilder`] when encoding. The only raw pool indices
//! left are the ones the bytecode machinery addresses directly: stack map
//! object types and bootstrap methods.

use crate::{
    access::AccessFlags,
    annotation::{
        parse_annotations, parse_element_value, parse_parameter_annotations,
        parse_type_annotations, write_annotations, write_element_value,
        write_parameter_annotations, write_type_annotations, Annotation, ElementValue,
        TypeAnnotation,
    },
    builder::PoolBuilder,
    constant::{Constant, ConstantPool, PoolIndex},
    module::{parse_module, write_module, ModuleAttribute},
    parse::ByteParser,
    stack_map::{parse_stack_map_table, write_stack_map_table, StackMapFrame},
    write::ByteWriter,
    ClassError, ClassResult,
};
use std::borrow::Cow;

/// Resolves a pool index to the name it stands for, checking the entry kind.
pub(crate) type Resolver<'src> =
    for<'p> fn(&'p ConstantPool<'src>, PoolIndex) -> ClassResult<&'p Cow<'src, str>>;

/// Interns a name as a pool entry of some kind, returning its index.
pub(crate) type Interner<'p> = fn(&mut PoolBuilder<'p>, &str) -> ClassResult<PoolIndex>;

pub(crate) fn parse_index(input: &mut ByteParser<'_>) -> ClassResult<PoolIndex> {
    Ok(input.parse_u16()? as PoolIndex)
}

pub(crate) fn parse_name<'src>(
    input: &mut ByteParser<'_>,
    pool: &ConstantPool<'src>,
    resolve: Resolver<'src>,
) -> ClassResult<Cow<'src, str>> {
    let index = parse_index(input)?;
    resolve(pool, index).map(Cow::clone)
}

/// Like [`parse_name`], but index 0 means absent.
pub(crate) fn parse_optional_name<'src>(
    input: &mut ByteParser<'_>,
    pool: &ConstantPool<'src>,
    resolve: Resolver<'src>,
) -> ClassResult<Option<Cow<'src, str>>> {
    match parse_index(input)? {
        0 => Ok(None),
        index => resolve(pool, index).map(|name| Some(name.clone())),
    }
}

/// A `u16` count followed by that many names.
pub(crate) fn parse_names<'src>(
    input: &mut ByteParser<'_>,
    pool: &ConstantPool<'src>,
    resolve: Resolver<'src>,
) -> ClassResult<Box<[Cow<'src, str>]>> {
    let len = input.parse_u16()? as usize;
    input
        .seq(len, |input| parse_name(input, pool, resolve))
        .map(Into::into)
}

pub(crate) fn write_name<'p>(
    out: &mut ByteWriter,
    pool: &mut PoolBuilder<'p>,
    name: &str,
    intern: Interner<'p>,
) -> ClassResult<()> {
    let index = intern(pool, name)?;
    out.write_index(index)
}

pub(crate) fn write_optional_name<'p>(
    out: &mut ByteWriter,
    pool: &mut PoolBuilder<'p>,
    name: Option<&str>,
    intern: Interner<'p>,
) -> ClassResult<()> {
    match name {
        Some(name) => write_name(out, pool, name, intern),
        None => out.write_index(0),
    }
}

pub(crate) fn write_names<'p>(
    out: &mut ByteWriter,
    pool: &mut PoolBuilder<'p>,
    names: &[Cow<'_, str>],
    intern: Interner<'p>,
) -> ClassResult<()> {
    out.write_len_u16(names.len(), "names")?;
    names
        .iter()
        .try_for_each(|name| write_name(out, pool, name, intern))
}

/// The value of a `ConstantValue` attribute or of a constant annotation
/// element.
#[derive(Clone, Debug)]
pub enum ConstantValue<'src> {
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    String(Cow<'src, str>),
}

impl<'src> ConstantValue<'src> {
    pub fn resolve(pool: &ConstantPool<'src>, index: PoolIndex) -> ClassResult<Self> {
        Ok(match *pool.entry(index)? {
            Constant::Integer(value) => ConstantValue::Integer(value),
            Constant::Float(value) => ConstantValue::Float(value),
            Constant::Long(value) => ConstantValue::Long(value),
            Constant::Double(value) => ConstantValue::Double(value),
            Constant::String(_) => ConstantValue::String(pool.string(index)?.clone()),
            _ => {
                return Err(ClassError::InvalidPoolType {
                    index,
                    expected: "constant value",
                })
            }
        })
    }

    pub fn intern(&self, pool: &mut PoolBuilder<'_>) -> ClassResult<PoolIndex> {
        match *self {
            ConstantValue::Integer(value) => pool.integer_info(value),
            ConstantValue::Float(value) => pool.float_info(value),
            ConstantValue::Long(value) => pool.long_info(value),
            ConstantValue::Double(value) => pool.double_info(value),
            ConstantValue::String(ref value) => pool.string_info(value),
        }
    }
}

impl PartialEq for ConstantValue<'_> {
    fn eq(&self, other: &ConstantValue<'_>) -> bool {
        match (self, other) {
            (ConstantValue::Integer(a), ConstantValue::Integer(b)) => a == b,
            (ConstantValue::Float(a), ConstantValue::Float(b)) => a.to_bits() == b.to_bits(),
            (ConstantValue::Long(a), ConstantValue::Long(b)) => a == b,
            (ConstantValue::Double(a), ConstantValue::Double(b)) => a.to_bits() == b.to_bits(),
            (ConstantValue::String(a), ConstantValue::String(b)) => a == b,
            _ => false,
        }
    }
}

/// An exception handler, active for `start_pc..end_pc`.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ExceptionHandler<'src> {
    pub start_pc: u16,
    pub end_pc: u16,
    pub handler_pc: u16,
    /// `None` catches everything, as used for `finally`.
    pub catch_type: Option<Cow<'src, str>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Code<'src> {
    /// The maximum amount of items on the operand stack
    pub max_stack: u16,
    /// The maximum amount of local variables, including method paramaters. The
    /// greatest local variable index is `max_locals - 1` for all types except
    /// `long` or `double`.
    pub max_locals: u16,

    /// The bytecode, borrowed from the class file.
    pub code: &'src [u8],
    pub exception_table: Box<[ExceptionHandler<'src>]>,
    /// Usually `LineNumberTable`, `LocalVariableTable`,
    /// `LocalVariableTypeTable`, and `StackMapTable`.
    pub attributes: Box<[Attribute<'src>]>,
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct InnerClass<'src> {
    pub inner_class: Cow<'src, str>,
    /// `None` for local and anonymous classes.
    pub outer_class: Option<Cow<'src, str>>,
    /// `None` for anonymous classes.
    pub inner_name: Option<Cow<'src, str>>,
    pub inner_access: AccessFlags,
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct NameAndType<'src> {
    pub name: Cow<'src, str>,
    pub descriptor: Cow<'src, str>,
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct EnclosingMethod<'src> {
    pub class: Cow<'src, str>,
    /// `None` if the class is not enclosed by a method, such as a class
    /// declared in an initializer.
    pub method: Option<NameAndType<'src>>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct LineNumber {
    pub start_pc: u16,
    pub line_number: u16,
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct LocalVariable<'src> {
    /// The variable has a value in `start_pc..start_pc + length`.
    pub start_pc: u16,
    pub length: u16,
    pub name: Cow<'src, str>,
    /// A field descriptor in a `LocalVariableTable`, a field signature in a
    /// `LocalVariableTypeTable`.
    pub descriptor: Cow<'src, str>,
    pub index: u16,
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct BootstrapMethod {
    pub method_ref: PoolIndex,
    pub arguments: Box<[PoolIndex]>,
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct MethodParameter<'src> {
    pub name: Option<Cow<'src, str>>,
    pub access: AccessFlags,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RecordComponent<'src> {
    pub name: Cow<'src, str>,
    pub descriptor: Cow<'src, str>,
    pub attributes: Box<[Attribute<'src>]>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Attribute<'src> {
    /// The value of a constant field.
    ///
    /// | Field type                      | Constant pool entry type |
    /// |:-------------------------------:|:------------------------:|
    /// | long                            | Long                     |
    /// | float                           | Float                    |
    /// | double                          | Double                   |
    /// | int, short, char, byte, boolean | Integer                  |
    /// | String                          | String                   |
    ConstantValue(ConstantValue<'src>),

    /// The bytecode of a method that is neither `native` nor `abstract`.
    Code(Code<'src>),

    /// Verifier type state at branch targets.
    StackMapTable(Box<[StackMapFrame]>),

    /// Binary names of the checked exceptions a method declares.
    Exceptions(Box<[Cow<'src, str>]>),

    InnerClasses(Box<[InnerClass<'src>]>),

    /// The enclosing method of a local or anonymous class.
    EnclosingMethod(EnclosingMethod<'src>),

    Synthetic,
    Deprecated,

    /// A class, method, or field signature, depending on what the attribute
    /// was declared on.
    Signature(Cow<'src, str>),

    SourceFile(Cow<'src, str>),

    /// Arbitrary extended debugging data, borrowed from the class file.
    SourceDebugExtension(&'src [u8]),

    /// Maps bytecode offsets to source lines, in file order.
    LineNumberTable(Box<[LineNumber]>),

    /// Type-erased local variable table.
    LocalVariableTable(Box<[LocalVariable<'src>]>),
    /// Fully elaborated local variable table.
    LocalVariableTypeTable(Box<[LocalVariable<'src>]>),

    RuntimeVisibleAnnotations(Box<[Annotation<'src>]>),
    RuntimeInvisibleAnnotations(Box<[Annotation<'src>]>),
    RuntimeVisibleParameterAnnotations(Box<[Box<[Annotation<'src>]>]>),
    RuntimeInvisibleParameterAnnotations(Box<[Box<[Annotation<'src>]>]>),
    RuntimeVisibleTypeAnnotations(Box<[TypeAnnotation<'src>]>),
    RuntimeInvisibleTypeAnnotations(Box<[TypeAnnotation<'src>]>),
    AnnotationDefault(ElementValue<'src>),

    BootstrapMethods(Box<[BootstrapMethod]>),
    MethodParameters(Box<[MethodParameter<'src>]>),

    Module(ModuleAttribute<'src>),
    /// Every package of a module, exported or not.
    ModulePackages(Box<[Cow<'src, str>]>),
    ModuleMainClass(Cow<'src, str>),

    NestHost(Cow<'src, str>),
    NestMembers(Box<[Cow<'src, str>]>),
    PermittedSubclasses(Box<[Cow<'src, str>]>),
    Record(Box<[RecordComponent<'src>]>),

    /// An attribute this crate does not understand, carried verbatim.
    Unknown {
        name: Cow<'src, str>,
        data: &'src [u8],
    },
}

impl<'src> Attribute<'src> {
    pub fn name(&self) -> &str {
        match self {
            Attribute::ConstantValue(_) => "ConstantValue",
            Attribute::Code(_) => "Code",
            Attribute::StackMapTable(_) => "StackMapTable",
            Attribute::Exceptions(_) => "Exceptions",
            Attribute::InnerClasses(_) => "InnerClasses",
            Attribute::EnclosingMethod(_) => "EnclosingMethod",
            Attribute::Synthetic => "Synthetic",
            Attribute::Deprecated => "Deprecated",
            Attribute::Signature(_) => "Signature",
            Attribute::SourceFile(_) => "SourceFile",
            Attribute::SourceDebugExtension(_) => "SourceDebugExtension",
            Attribute::LineNumberTable(_) => "LineNumberTable",
            Attribute::LocalVariableTable(_) => "LocalVariableTable",
            Attribute::LocalVariableTypeTable(_) => "LocalVariableTypeTable",
            Attribute::RuntimeVisibleAnnotations(_) => "RuntimeVisibleAnnotations",
            Attribute::RuntimeInvisibleAnnotations(_) => "RuntimeInvisibleAnnotations",
            Attribute::RuntimeVisibleParameterAnnotations(_) => {
                "RuntimeVisibleParameterAnnotations"
            }
            Attribute::RuntimeInvisibleParameterAnnotations(_) => {
                "RuntimeInvisibleParameterAnnotations"
            }
            Attribute::RuntimeVisibleTypeAnnotations(_) => "RuntimeVisibleTypeAnnotations",
            Attribute::RuntimeInvisibleTypeAnnotations(_) => "RuntimeInvisibleTypeAnnotations",
            Attribute::AnnotationDefault(_) => "AnnotationDefault",
            Attribute::BootstrapMethods(_) => "BootstrapMethods",
            Attribute::MethodParameters(_) => "MethodParameters",
            Attribute::Module(_) => "Module",
            Attribute::ModulePackages(_) => "ModulePackages",
            Attribute::ModuleMainClass(_) => "ModuleMainClass",
            Attribute::NestHost(_) => "NestHost",
            Attribute::NestMembers(_) => "NestMembers",
            Attribute::PermittedSubclasses(_) => "PermittedSubclasses",
            Attribute::Record(_) => "Record",
            Attribute::Unknown { name, .. } => name,
        }
    }
}

// ExceptionHandler {
//     start_pc: u16,
//     end_pc: u16,
//     handler_pc: u16,
//     catch_type: u16,
// }
//
// Attribute::Code {
//     max_stack: u16,
//     max_locals: u16,
//     code_length: u32,
//     code: [u8; code_length],
//     exception_table_length: u16,
//     exception_table: [ExceptionHandler; exception_table_length],
//     attributes_count: u16,
//     attributes: [AttributeInfo; attributes_count],
// }
fn parse_code<'src>(
    input: &mut ByteParser<'src>,
    pool: &ConstantPool<'src>,
) -> ClassResult<Code<'src>> {
    let max_stack = input.parse_u16()?;
    let max_locals = input.parse_u16()?;
    let code_length = input.parse_u32()? as usize;
    let code = input.take(code_length)?;

    let exceptions_len = input.parse_u16()? as usize;
    let exception_table = input.seq(exceptions_len, |input| {
        Ok::<_, ClassError>(ExceptionHandler {
            start_pc: input.parse_u16()?,
            end_pc: input.parse_u16()?,
            handler_pc: input.parse_u16()?,
            catch_type: parse_optional_name(input, pool, ConstantPool::class_name)?,
        })
    })?;

    let attributes = parse_attributes(input, pool)?;

    Ok(Code {
        max_stack,
        max_locals,
        code,
        exception_table: exception_table.into(),
        attributes,
    })
}

// InnerClass {
//     inner_class_info_index: u16,
//     outer_class_info_index: u16,
//     inner_name_index: u16,
//     inner_class_access_flags: u16,
// }
fn parse_inner_class<'src>(
    input: &mut ByteParser<'src>,
    pool: &ConstantPool<'src>,
) -> ClassResult<InnerClass<'src>> {
    Ok(InnerClass {
        inner_class: parse_name(input, pool, ConstantPool::class_name)?,
        outer_class: parse_optional_name(input, pool, ConstantPool::class_name)?,
        inner_name: parse_optional_name(input, pool, ConstantPool::utf8)?,
        inner_access: AccessFlags(input.parse_u16()?),
    })
}

// Attribute::EnclosingMethod {
//     class_index: u16,
//     method_index: u16,
// }
fn parse_enclosing_method<'src>(
    input: &mut ByteParser<'src>,
    pool: &ConstantPool<'src>,
) -> ClassResult<EnclosingMethod<'src>> {
    let class = parse_name(input, pool, ConstantPool::class_name)?;
    let method = match parse_index(input)? {
        0 => None,
        index => {
            let (name, descriptor) = pool.name_and_type(index)?;
            Some(NameAndType {
                name: name.clone(),
                descriptor: descriptor.clone(),
            })
        }
    };
    Ok(EnclosingMethod { class, method })
}

// LineNumber {
//     start_pc: u16,
//     line_number: u16,
// }
//
// Attribute::LineNumberTable {
//     line_number_table_length: u16,
//     line_number_table: [LineNumber; line_number_table_length],
// }
fn parse_line_number_table(input: &mut ByteParser<'_>) -> ClassResult<Box<[LineNumber]>> {
    let len = input.parse_u16()? as usize;
    let table = input.seq(len, |input| {
        Ok::<_, ClassError>(LineNumber {
            start_pc: input.parse_u16()?,
            line_number: input.parse_u16()?,
        })
    })?;
    Ok(table.into())
}

// LocalVariable {
//     start_pc: u16,
//     length: u16,
//     name_index: u16,
//     descriptor_index: u16,
//     index: u16,
// }
fn parse_local_variable_table<'src>(
    input: &mut ByteParser<'src>,
    pool: &ConstantPool<'src>,
) -> ClassResult<Box<[LocalVariable<'src>]>> {
    let len = input.parse_u16()? as usize;
    let table = input.seq(len, |input| {
        Ok::<_, ClassError>(LocalVariable {
            start_pc: input.parse_u16()?,
            length: input.parse_u16()?,
            name: parse_name(input, pool, ConstantPool::utf8)?,
            descriptor: parse_name(input, pool, ConstantPool::utf8)?,
            index: input.parse_u16()?,
        })
    })?;
    Ok(table.into())
}

// BootstrapMethod {
//     bootstrap_method_ref: u16,
//     num_bootstrap_arguments: u16,
//     bootstrap_arguments: [u16; num_bootstrap_arguments],
// }
fn parse_bootstrap_methods(input: &mut ByteParser<'_>) -> ClassResult<Box<[BootstrapMethod]>> {
    let len = input.parse_u16()? as usize;
    let methods = input.seq(len, |input| {
        let method_ref = parse_index(input)?;
        let arguments_len = input.parse_u16()? as usize;
        let arguments = input.seq(arguments_len, parse_index)?;
        Ok::<_, ClassError>(BootstrapMethod {
            method_ref,
            arguments: arguments.into(),
        })
    })?;
    Ok(methods.into())
}

// Attribute::MethodParameters {
//     parameters_count: u8,
//     parameters: [{ name_index: u16, access_flags: u16 }; parameters_count],
// }
fn parse_method_parameters<'src>(
    input: &mut ByteParser<'src>,
    pool: &ConstantPool<'src>,
) -> ClassResult<Box<[MethodParameter<'src>]>> {
    let len = input.parse_u8()? as usize;
    let parameters = input.seq(len, |input| {
        Ok::<_, ClassError>(MethodParameter {
            name: parse_optional_name(input, pool, ConstantPool::utf8)?,
            access: AccessFlags(input.parse_u16()?),
        })
    })?;
    Ok(parameters.into())
}

// RecordComponent {
//     name_index: u16,
//     descriptor_index: u16,
//     attributes_count: u16,
//     attributes: [AttributeInfo; attributes_count],
// }
fn parse_record<'src>(
    input: &mut ByteParser<'src>,
    pool: &ConstantPool<'src>,
) -> ClassResult<Box<[RecordComponent<'src>]>> {
    let len = input.parse_u16()? as usize;
    let components = input.seq(len, |input| {
        Ok::<_, ClassError>(RecordComponent {
            name: parse_name(input, pool, ConstantPool::utf8)?,
            descriptor: parse_name(input, pool, ConstantPool::utf8)?,
            attributes: parse_attributes(input, pool)?,
        })
    })?;
    Ok(components.into())
}

/// Decodes the body of a known attribute kind, or returns `None` for a kind
/// this crate does not understand.
fn parse_known<'src>(
    name: &str,
    input: &mut ByteParser<'src>,
    pool: &ConstantPool<'src>,
) -> ClassResult<Option<Attribute<'src>>> {
    Ok(Some(match name {
        "ConstantValue" => Attribute::ConstantValue(ConstantValue::resolve(
            pool,
            parse_index(input)?,
        )?),
        "Code" => Attribute::Code(parse_code(input, pool)?),
        "StackMapTable" => Attribute::StackMapTable(parse_stack_map_table(input)?),
        "Exceptions" => Attribute::Exceptions(parse_names(input, pool, ConstantPool::class_name)?),
        "InnerClasses" => {
            let len = input.parse_u16()? as usize;
            let classes = input.seq(len, |input| parse_inner_class(input, pool))?;
            Attribute::InnerClasses(classes.into())
        }
        "EnclosingMethod" => Attribute::EnclosingMethod(parse_enclosing_method(input, pool)?),
        "Synthetic" => Attribute::Synthetic,
        "Deprecated" => Attribute::Deprecated,
        "Signature" => Attribute::Signature(parse_name(input, pool, ConstantPool::utf8)?),
        "SourceFile" => Attribute::SourceFile(parse_name(input, pool, ConstantPool::utf8)?),
        "SourceDebugExtension" => {
            Attribute::SourceDebugExtension(input.take(input.remaining())?)
        }
        "LineNumberTable" => Attribute::LineNumberTable(parse_line_number_table(input)?),
        "LocalVariableTable" => {
            Attribute::LocalVariableTable(parse_local_variable_table(input, pool)?)
        }
        "LocalVariableTypeTable" => {
            Attribute::LocalVariableTypeTable(parse_local_variable_table(input, pool)?)
        }
        "RuntimeVisibleAnnotations" => {
            Attribute::RuntimeVisibleAnnotations(parse_annotations(input, pool)?)
        }
        "RuntimeInvisibleAnnotations" => {
            Attribute::RuntimeInvisibleAnnotations(parse_annotations(input, pool)?)
        }
        "RuntimeVisibleParameterAnnotations" => {
            Attribute::RuntimeVisibleParameterAnnotations(parse_parameter_annotations(input, pool)?)
        }
        "RuntimeInvisibleParameterAnnotations" => Attribute::RuntimeInvisibleParameterAnnotations(
            parse_parameter_annotations(input, pool)?,
        ),
        "RuntimeVisibleTypeAnnotations" => {
            Attribute::RuntimeVisibleTypeAnnotations(parse_type_annotations(input, pool)?)
        }
        "RuntimeInvisibleTypeAnnotations" => {
            Attribute::RuntimeInvisibleTypeAnnotations(parse_type_annotations(input, pool)?)
        }
        "AnnotationDefault" => Attribute::AnnotationDefault(parse_element_value(input, pool)?),
        "BootstrapMethods" => Attribute::BootstrapMethods(parse_bootstrap_methods(input)?),
        "MethodParameters" => Attribute::MethodParameters(parse_method_parameters(input, pool)?),
        "Module" => Attribute::Module(parse_module(input, pool)?),
        "ModulePackages" => {
            Attribute::ModulePackages(parse_names(input, pool, ConstantPool::package_name)?)
        }
        "ModuleMainClass" => {
            Attribute::ModuleMainClass(parse_name(input, pool, ConstantPool::class_name)?)
        }
        "NestHost" => Attribute::NestHost(parse_name(input, pool, ConstantPool::class_name)?),
        "NestMembers" => Attribute::NestMembers(parse_names(input, pool, ConstantPool::class_name)?),
        "PermittedSubclasses" => {
            Attribute::PermittedSubclasses(parse_names(input, pool, ConstantPool::class_name)?)
        }
        "Record" => Attribute::Record(parse_record(input, pool)?),
        _ => return Ok(None),
    }))
}

pub fn parse_attribute<'src>(
    input: &mut ByteParser<'src>,
    pool: &ConstantPool<'src>,
) -> ClassResult<Attribute<'src>> {
    let name = parse_name(input, pool, ConstantPool::utf8)?;
    let len = input.parse_u32()? as usize;
    let mut body = input.split(len)?;

    let attribute = match parse_known(&name, &mut body, pool)? {
        Some(attribute) => attribute,
        None => {
            tracing::debug!(name = %name, len, "passing through unrecognized attribute");
            let data = body.take(len)?;
            Attribute::Unknown { name, data }
        }
    };

    if !body.is_empty() {
        return Err(ClassError::AttributeLength {
            name: attribute.name().to_owned(),
            declared: len,
            consumed: body.offset,
        });
    }

    Ok(attribute)
}

pub fn parse_attributes<'src>(
    input: &mut ByteParser<'src>,
    pool: &ConstantPool<'src>,
) -> ClassResult<Box<[Attribute<'src>]>> {
    let len = input.parse_u16()? as usize;
    input
        .seq(len, |input| parse_attribute(input, pool))
        .map(Into::into)
}

fn write_local_variable_table(
    out: &mut ByteWriter,
    pool: &mut PoolBuilder<'_>,
    table: &[LocalVariable<'_>],
) -> ClassResult<()> {
    out.write_len_u16(table.len(), "local variables")?;
    for variable in table {
        out.write_u16(variable.start_pc);
        out.write_u16(variable.length);
        write_name(out, pool, &variable.name, PoolBuilder::utf8_info)?;
        write_name(out, pool, &variable.descriptor, PoolBuilder::utf8_info)?;
        out.write_u16(variable.index);
    }
    Ok(())
}

fn write_body(
    out: &mut ByteWriter,
    pool: &mut PoolBuilder<'_>,
    attribute: &Attribute<'_>,
) -> ClassResult<()> {
    match attribute {
        Attribute::ConstantValue(value) => {
            let index = value.intern(pool)?;
            out.write_index(index)?;
        }
        Attribute::Code(code) => {
            out.write_u16(code.max_stack);
            out.write_u16(code.max_locals);
            out.write_len_u32(code.code.len(), "code length")?;
            out.write_bytes(code.code);
            out.write_len_u16(code.exception_table.len(), "exception handlers")?;
            for handler in code.exception_table.iter() {
                out.write_u16(handler.start_pc);
                out.write_u16(handler.end_pc);
                out.write_u16(handler.handler_pc);
                write_optional_name(
                    out,
                    pool,
                    handler.catch_type.as_deref(),
                    PoolBuilder::class_info,
                )?;
            }
            write_attributes(out, pool, &code.attributes)?;
        }
        Attribute::StackMapTable(frames) => write_stack_map_table(out, frames)?,
        Attribute::Exceptions(names)
        | Attribute::NestMembers(names)
        | Attribute::PermittedSubclasses(names) => {
            write_names(out, pool, names, PoolBuilder::class_info)?
        }
        Attribute::InnerClasses(classes) => {
            out.write_len_u16(classes.len(), "inner classes")?;
            for class in classes.iter() {
                write_name(out, pool, &class.inner_class, PoolBuilder::class_info)?;
                write_optional_name(
                    out,
                    pool,
                    class.outer_class.as_deref(),
                    PoolBuilder::class_info,
                )?;
                write_optional_name(
                    out,
                    pool,
                    class.inner_name.as_deref(),
                    PoolBuilder::utf8_info,
                )?;
                out.write_u16(class.inner_access.0);
            }
        }
        Attribute::EnclosingMethod(enclosing) => {
            write_name(out, pool, &enclosing.class, PoolBuilder::class_info)?;
            match &enclosing.method {
                Some(method) => {
                    let index = pool.name_and_type_info(&method.name, &method.descriptor)?;
                    out.write_index(index)?;
                }
                None => out.write_index(0)?,
            }
        }
        Attribute::Synthetic | Attribute::Deprecated => {}
        Attribute::Signature(text) | Attribute::SourceFile(text) => {
            write_name(out, pool, text, PoolBuilder::utf8_info)?
        }
        Attribute::SourceDebugExtension(data) => out.write_bytes(data),
        Attribute::LineNumberTable(table) => {
            out.write_len_u16(table.len(), "line numbers")?;
            for entry in table.iter() {
                out.write_u16(entry.start_pc);
                out.write_u16(entry.line_number);
            }
        }
        Attribute::LocalVariableTable(table) | Attribute::LocalVariableTypeTable(table) => {
            write_local_variable_table(out, pool, table)?
        }
        Attribute::RuntimeVisibleAnnotations(annotations)
        | Attribute::RuntimeInvisibleAnnotations(annotations) => {
            write_annotations(out, pool, annotations)?
        }
        Attribute::RuntimeVisibleParameterAnnotations(parameters)
        | Attribute::RuntimeInvisibleParameterAnnotations(parameters) => {
            write_parameter_annotations(out, pool, parameters)?
        }
        Attribute::RuntimeVisibleTypeAnnotations(annotations)
        | Attribute::RuntimeInvisibleTypeAnnotations(annotations) => {
            write_type_annotations(out, pool, annotations)?
        }
        Attribute::AnnotationDefault(value) => write_element_value(out, pool, value)?,
        Attribute::BootstrapMethods(methods) => {
            out.write_len_u16(methods.len(), "bootstrap methods")?;
            for method in methods.iter() {
                out.write_index(method.method_ref)?;
                out.write_len_u16(method.arguments.len(), "bootstrap arguments")?;
                for &argument in method.arguments.iter() {
                    out.write_index(argument)?;
                }
            }
        }
        Attribute::MethodParameters(parameters) => {
            out.write_len_u8(parameters.len(), "method parameters")?;
            for parameter in parameters.iter() {
                write_optional_name(
                    out,
                    pool,
                    parameter.name.as_deref(),
                    PoolBuilder::utf8_info,
                )?;
                out.write_u16(parameter.access.0);
            }
        }
        Attribute::Module(module) => write_module(out, pool, module)?,
        Attribute::ModulePackages(packages) => {
            write_names(out, pool, packages, PoolBuilder::package_info)?
        }
        Attribute::ModuleMainClass(name) | Attribute::NestHost(name) => {
            write_name(out, pool, name, PoolBuilder::class_info)?
        }
        Attribute::Record(components) => {
            out.write_len_u16(components.len(), "record components")?;
            for component in components.iter() {
                write_name(out, pool, &component.name, PoolBuilder::utf8_info)?;
                write_name(out, pool, &component.descriptor, PoolBuilder::utf8_info)?;
                write_attributes(out, pool, &component.attributes)?;
            }
        }
        Attribute::Unknown { data, .. } => out.write_bytes(data),
    }
    Ok(())
}

pub fn write_attribute(
    out: &mut ByteWriter,
    pool: &mut PoolBuilder<'_>,
    attribute: &Attribute<'_>,
) -> ClassResult<()> {
    write_name(out, pool, attribute.name(), PoolBuilder::utf8_info)?;
    let position = out.reserve_u32();
    write_body(out, pool, attribute)?;
    out.patch_len(position, "attribute length")
}

pub fn write_attributes(
    out: &mut ByteWriter,
    pool: &mut PoolBuilder<'_>,
    attributes: &[Attribute<'_>],
) -> ClassResult<()> {
    out.write_len_u16(attributes.len(), "attributes")?;
    attributes
        .iter()
        .try_for_each(|attribute| write_attribute(out, pool, attribute))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constant::{parse_constant_pool, CONSTANT_CLASS, CONSTANT_UTF8};

    fn utf8(bytes: &mut Vec<u8>, text: &str) {
        bytes.push(CONSTANT_UTF8);
        bytes.extend_from_slice(&(text.len() as u16).to_be_bytes());
        bytes.extend_from_slice(text.as_bytes());
    }

    // 1 Code, 2 LineNumberTable, 3 Vendor, 4 a/Ex, 5 Class #4, 6 Signature
    fn pool_bytes() -> Vec<u8> {
        let mut bytes = vec![0x00, 0x07];
        utf8(&mut bytes, "Code");
        utf8(&mut bytes, "LineNumberTable");
        utf8(&mut bytes, "Vendor");
        utf8(&mut bytes, "a/Ex");
        bytes.extend_from_slice(&[CONSTANT_CLASS, 0x00, 0x04]);
        utf8(&mut bytes, "Signature");
        bytes
    }

    #[test]
    fn test_code_with_nested_attributes() {
        let pool_bytes = pool_bytes();
        let pool = parse_constant_pool(&mut ByteParser::new(&pool_bytes)).unwrap();

        let attr = [
            0x00, 0x01, 0x00, 0x00, 0x00, 0x27, // Code, 39 bytes
            0x00, 0x02, 0x00, 0x01, // max_stack, max_locals
            0x00, 0x00, 0x00, 0x01, 0xb1, // return
            0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x05, // catch a/Ex
            0x00, 0x02, // 2 attributes
            0x00, 0x02, 0x00, 0x00, 0x00, 0x06, 0x00, 0x01, 0x00, 0x00, 0x00, 0x07, // lines
            0x00, 0x03, 0x00, 0x00, 0x00, 0x00, // Vendor, empty
        ];
        let mut input = ByteParser::new(&attr);
        let attribute = parse_attribute(&mut input, &pool).unwrap();
        assert!(input.is_empty());

        let code = match &attribute {
            Attribute::Code(code) => code,
            other => panic!("{:?}", other),
        };
        assert_eq!(code.code, &[0xb1]);
        assert_eq!(code.exception_table[0].catch_type.as_deref(), Some("a/Ex"));
        assert_eq!(
            &*code.attributes,
            &[
                Attribute::LineNumberTable(
                    vec![LineNumber {
                        start_pc: 0,
                        line_number: 7
                    }]
                    .into()
                ),
                Attribute::Unknown {
                    name: "Vendor".into(),
                    data: &[],
                },
            ][..]
        );

        let mut builder = PoolBuilder::from_pool(&pool);
        let mut out = ByteWriter::new();
        write_attribute(&mut out, &mut builder, &attribute).unwrap();
        assert_eq!(out.as_bytes(), &attr[..]);
        assert_eq!(builder.build(), pool);
    }

    #[test]
    fn test_unknown_attribute_is_verbatim() {
        let pool_bytes = pool_bytes();
        let pool = parse_constant_pool(&mut ByteParser::new(&pool_bytes)).unwrap();

        let attr = [0x00, 0x03, 0x00, 0x00, 0x00, 0x03, 0xde, 0xad, 0x00];
        let attribute = parse_attribute(&mut ByteParser::new(&attr), &pool).unwrap();
        match attribute {
            Attribute::Unknown { ref name, data } => {
                assert_eq!(name, "Vendor");
                assert_eq!(data, &attr[6..]);
                assert!(std::ptr::eq(data.as_ptr(), attr[6..].as_ptr()));
            }
            ref other => panic!("{:?}", other),
        }
    }

    #[test]
    fn test_declared_length_must_match() {
        let pool_bytes = pool_bytes();
        let pool = parse_constant_pool(&mut ByteParser::new(&pool_bytes)).unwrap();

        // a Signature attribute claiming 3 bytes
        let attr = [0x00, 0x06, 0x00, 0x00, 0x00, 0x03, 0x00, 0x04, 0x00];
        assert_eq!(
            parse_attribute(&mut ByteParser::new(&attr), &pool),
            Err(ClassError::AttributeLength {
                name: "Signature".to_owned(),
                declared: 3,
                consumed: 2,
            })
        );

        // and one claiming 1
        let attr = [0x00, 0x06, 0x00, 0x00, 0x00, 0x01, 0x00, 0x04];
        assert!(matches!(
            parse_attribute(&mut ByteParser::new(&attr), &pool),
            Err(ClassError::Parse(_))
        ));
    }
}
