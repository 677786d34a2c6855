use classfile::{
    access::AccessFlags,
    attribute::{
        Attribute, Code, EnclosingMethod, ExceptionHandler, InnerClass, LocalVariable,
        NameAndType, RecordComponent,
    },
    builder::PoolBuilder,
    class::Version,
    constant::{parse_constant_pool, Constant, CONSTANT_LONG},
    member::Member,
    parse::ByteParser,
    rename::rename,
    write::ByteWriter,
    Class, ClassError,
};
use pretty_assertions::assert_eq;

/// A tiny assembler for hand written class files.
#[derive(Default)]
struct Asm(Vec<u8>);

impl Asm {
    fn u8(mut self, value: u8) -> Self {
        self.0.push(value);
        self
    }

    fn u16(mut self, value: u16) -> Self {
        self.0.extend_from_slice(&value.to_be_bytes());
        self
    }

    fn u32(mut self, value: u32) -> Self {
        self.0.extend_from_slice(&value.to_be_bytes());
        self
    }

    fn utf8(self, text: &str) -> Self {
        let mut asm = self.u8(1).u16(text.len() as u16);
        asm.0.extend_from_slice(text.as_bytes());
        asm
    }
}

/// ```java
/// class a.b.C implements x.Other {
///     private List<C> value;
///     public void run(C c) { return; }
/// }
/// ```
fn sample() -> Vec<u8> {
    Asm::default()
        .u32(0xCAFE_BABE)
        .u16(0)
        .u16(52)
        // pool
        .u16(18)
        .utf8("a/b/C") // 1
        .u8(7)
        .u16(1) // 2
        .utf8("java/lang/Object") // 3
        .u8(7)
        .u16(3) // 4
        .utf8("value") // 5
        .utf8("La/b/C;") // 6
        .utf8("run") // 7
        .utf8("(La/b/C;)V") // 8
        .utf8("Code") // 9
        .u8(12)
        .u16(7)
        .u16(8) // 10
        .u8(10)
        .u16(2)
        .u16(10) // 11
        .u8(5)
        .u32(0)
        .u32(1) // 12, 13
        .utf8("Signature") // 14
        .utf8("Ljava/util/List<La/b/C;>;") // 15
        .utf8("x/Other") // 16
        .u8(7)
        .u16(16) // 17
        // access, this, super
        .u16(0x0021)
        .u16(2)
        .u16(4)
        // interfaces
        .u16(1)
        .u16(17)
        // fields
        .u16(1)
        .u16(0x0002)
        .u16(5)
        .u16(6)
        .u16(1)
        .u16(14)
        .u32(2)
        .u16(15)
        // methods
        .u16(1)
        .u16(0x0001)
        .u16(7)
        .u16(8)
        .u16(1)
        .u16(9)
        .u32(13)
        .u16(1)
        .u16(2)
        .u32(1)
        .u8(0xb1)
        .u16(0)
        .u16(0)
        // attributes
        .u16(0)
        .0
}

#[test]
fn decodes_sample() {
    let bytes = sample();
    let class = Class::parse(&bytes).unwrap();

    assert_eq!(class.version.major, 52);
    assert_eq!(class.this_class, "a/b/C");
    assert_eq!(class.super_class.as_deref(), Some("java/lang/Object"));
    assert_eq!(class.interfaces.len(), 1);
    assert_eq!(class.interfaces[0], "x/Other");

    assert_eq!(class.pool.len(), 18);
    assert_eq!(class.pool.tag(12).unwrap(), CONSTANT_LONG);
    assert_eq!(class.pool.get::<i64>(12).unwrap(), 1);
    assert!(class.pool.entry(13).unwrap().is_nothing());

    let field = class.field("value").unwrap();
    assert_eq!(field.descriptor, "La/b/C;");
    assert_eq!(
        field.attribute("Signature"),
        Some(&Attribute::Signature("Ljava/util/List<La/b/C;>;".into()))
    );

    let method = class.method("run", Some("(La/b/C;)V")).unwrap();
    match method.attribute("Code") {
        Some(Attribute::Code(code)) => {
            assert_eq!((code.max_stack, code.max_locals), (1, 2));
            assert_eq!(code.code, &[0xb1][..]);
        }
        other => panic!("expected a Code attribute, got {:?}", other),
    }
}

#[test]
fn re_encodes_byte_for_byte() {
    let bytes = sample();
    let class = Class::parse(&bytes).unwrap();
    assert_eq!(class.to_bytes().unwrap(), bytes);
}

#[test]
fn truncated_class_is_an_error() {
    let bytes = sample();
    for len in [3, 10, 40, bytes.len() - 1] {
        assert!(
            Class::parse(&bytes[..len]).is_err(),
            "prefix of {} bytes decoded",
            len
        );
    }
}

#[test]
fn pool_with_reserved_slot() {
    let bytes = Asm::default()
        .u16(3)
        .utf8("Hello")
        .u8(3)
        .u32(42)
        .0;
    let pool = parse_constant_pool(&mut ByteParser::new(&bytes)).unwrap();

    assert_eq!(pool.len(), 3);
    assert_eq!(pool.tag(1).unwrap(), 1);
    assert_eq!(pool.get::<&str>(1).unwrap(), "Hello");
    assert_eq!(pool.get::<i32>(2).unwrap(), 42);
    assert_eq!(
        pool.get::<i32>(1),
        Err(ClassError::InvalidPoolType {
            index: 1,
            expected: "Integer"
        })
    );
}

#[test]
fn wide_entries_take_two_slots_in_the_count() {
    let mut builder = PoolBuilder::new();
    builder.utf8_info("a").unwrap();
    assert_eq!(builder.double_info(1.5).unwrap(), 2);
    assert_eq!(builder.utf8_info("b").unwrap(), 4);

    let pool = builder.build();
    let mut out = ByteWriter::new();
    pool.write(&mut out).unwrap();
    assert_eq!(&out.as_bytes()[..2], &[0x00, 0x05]);

    let parsed = parse_constant_pool(&mut ByteParser::new(out.as_bytes())).unwrap();
    assert_eq!(parsed, pool);
    assert_eq!(parsed.entry(3).unwrap(), &Constant::Nothing);
}

#[test]
fn rename_is_consistent() {
    let bytes = sample();
    let class = Class::parse(&bytes).unwrap();

    let renamed = rename(&class, |name| match name {
        "a/b/C" => Some("x/y/Z".to_owned()),
        _ => None,
    })
    .unwrap();
    assert!(renamed.changed);

    let out = renamed.class.to_bytes().unwrap();
    let class = Class::parse(&out).unwrap();

    assert_eq!(class.this_class, "x/y/Z");
    assert_eq!(class.super_class.as_deref(), Some("java/lang/Object"));
    assert_eq!(class.fields[0].descriptor, "Lx/y/Z;");
    assert_eq!(
        class.fields[0].attributes[0],
        Attribute::Signature("Ljava/util/List<Lx/y/Z;>;".into())
    );
    assert_eq!(class.methods[0].descriptor, "(Lx/y/Z;)V");
    assert_eq!(class.pool.name_and_type(10).unwrap().1, "(Lx/y/Z;)V");

    // Slots are rewritten in place, nothing is appended.
    assert_eq!(class.pool.len(), 18);
    assert!(class
        .pool
        .entries()
        .iter()
        .filter_map(Constant::as_utf8)
        .all(|text| !text.contains("a/b/C")));
}

#[test]
fn rename_without_answers_changes_nothing() {
    let bytes = sample();
    let class = Class::parse(&bytes).unwrap();

    let renamed = rename(&class, |_| None).unwrap();
    assert!(!renamed.changed);
    assert_eq!(renamed.class, class);
    assert_eq!(renamed.class.to_bytes().unwrap(), bytes);
}

#[test]
fn rename_leaves_other_packages_alone() {
    let bytes = sample();
    let class = Class::parse(&bytes).unwrap();

    let renamed = rename(&class, |name| {
        name.strip_prefix("x/").map(|rest| format!("moved/{}", rest))
    })
    .unwrap();
    assert!(renamed.changed);
    assert_eq!(renamed.class.interfaces[0], "moved/Other");
    assert_eq!(renamed.class.this_class, "a/b/C");
    assert_eq!(renamed.class.methods[0].descriptor, "(La/b/C;)V");
}

fn inner_classes(package: &str) -> Attribute<'static> {
    Attribute::InnerClasses(
        vec![
            InnerClass {
                inner_class: format!("{}/C$1Local", package).into(),
                outer_class: None,
                inner_name: Some("Local".into()),
                inner_access: AccessFlags(0),
            },
            InnerClass {
                inner_class: format!("{}/C$Entry", package).into(),
                outer_class: Some(format!("{}/C", package).into()),
                inner_name: Some("Entry".into()),
                inner_access: AccessFlags(0x0008),
            },
        ]
        .into(),
    )
}

fn enclosing_method(package: &str) -> Attribute<'static> {
    Attribute::EnclosingMethod(EnclosingMethod {
        class: format!("{}/C", package).into(),
        method: Some(NameAndType {
            name: "run".into(),
            descriptor: format!("(L{}/C;)V", package).into(),
        }),
    })
}

fn record(package: &str) -> Attribute<'static> {
    Attribute::Record(
        vec![RecordComponent {
            name: "next".into(),
            descriptor: format!("L{}/C;", package).into(),
            attributes: vec![Attribute::Signature(
                format!("Ljava/util/Optional<L{}/C;>;", package).into(),
            )]
            .into(),
        }]
        .into(),
    )
}

fn local_variables(package: &str) -> [Attribute<'static>; 2] {
    [
        Attribute::LocalVariableTable(
            vec![LocalVariable {
                start_pc: 0,
                length: 3,
                name: "self".into(),
                descriptor: format!("L{}/C;", package).into(),
                index: 0,
            }]
            .into(),
        ),
        Attribute::LocalVariableTypeTable(
            vec![LocalVariable {
                start_pc: 0,
                length: 3,
                name: "items".into(),
                descriptor: format!("Ljava/util/List<L{}/C;>;", package).into(),
                index: 1,
            }]
            .into(),
        ),
    ]
}

/// A record `a.b.C` with a local class, a nested class, and a method whose
/// body has a typed handler, a `finally` handler and local variable tables.
fn nested_kinds() -> Vec<u8> {
    let code = Code {
        max_stack: 1,
        max_locals: 2,
        code: &[0x00, 0x00, 0xb1],
        exception_table: vec![
            ExceptionHandler {
                start_pc: 0,
                end_pc: 2,
                handler_pc: 2,
                catch_type: Some("a/b/Failure".into()),
            },
            ExceptionHandler {
                start_pc: 0,
                end_pc: 2,
                handler_pc: 2,
                catch_type: None,
            },
        ]
        .into(),
        attributes: local_variables("a/b").to_vec().into(),
    };

    let class = Class {
        version: Version {
            major: 60,
            minor: 0,
        },
        pool: PoolBuilder::new().build(),
        access: AccessFlags(0x0031),
        this_class: "a/b/C".into(),
        super_class: Some("java/lang/Record".into()),
        interfaces: Box::new([]),
        fields: Box::new([]),
        methods: vec![Member {
            access: AccessFlags(0x0001),
            name: "run".into(),
            descriptor: "(La/b/C;)V".into(),
            attributes: vec![Attribute::Code(code)].into(),
        }]
        .into(),
        attributes: vec![
            inner_classes("a/b"),
            enclosing_method("a/b"),
            record("a/b"),
        ]
        .into(),
    };
    class.to_bytes().unwrap()
}

#[test]
fn rename_reaches_nested_records() {
    let bytes = nested_kinds();
    let class = Class::parse(&bytes).unwrap();

    let renamed = rename(&class, |name| {
        name.strip_prefix("a/b/").map(|rest| format!("x/y/{}", rest))
    })
    .unwrap();
    assert!(renamed.changed);

    let out = renamed.class.to_bytes().unwrap();
    let again = Class::parse(&out).unwrap();

    assert_eq!(again.this_class, "x/y/C");
    assert_eq!(again.super_class.as_deref(), Some("java/lang/Record"));
    assert_eq!(again.methods[0].descriptor, "(Lx/y/C;)V");
    assert_eq!(again.attributes[0], inner_classes("x/y"));
    assert_eq!(again.attributes[1], enclosing_method("x/y"));
    assert_eq!(again.attributes[2], record("x/y"));

    match again.methods[0].attribute("Code") {
        Some(Attribute::Code(code)) => {
            assert_eq!(
                code.exception_table[0].catch_type.as_deref(),
                Some("x/y/Failure")
            );
            assert_eq!(code.exception_table[1].catch_type, None);
            assert_eq!(&code.attributes[..], &local_variables("x/y")[..]);
        }
        other => panic!("expected a Code attribute, got {:?}", other),
    }

    assert_eq!(again.pool.len(), class.pool.len());
    let stale = again
        .pool
        .entries()
        .iter()
        .filter_map(Constant::as_utf8)
        .filter(|text| text.contains("a/b/"))
        .collect::<Vec<_>>();
    assert_eq!(stale, Vec::<&str>::new());
}

#[test]
fn unpaired_surrogate_survives_a_round_trip() {
    // "\uD800" as javac writes it, referenced by a String constant
    let bytes = Asm::default()
        .u32(0xCAFE_BABE)
        .u16(0)
        .u16(52)
        .u16(7)
        .utf8("a/b/C") // 1
        .u8(7)
        .u16(1) // 2
        .utf8("java/lang/Object") // 3
        .u8(7)
        .u16(3) // 4
        .u8(1)
        .u16(3)
        .u8(0xed)
        .u8(0xa0)
        .u8(0x80) // 5
        .u8(8)
        .u16(5) // 6
        .u16(0x0021)
        .u16(2)
        .u16(4)
        .u16(0)
        .u16(0)
        .u16(0)
        .u16(0)
        .0;

    let class = Class::parse(&bytes).unwrap();
    assert_eq!(
        class.pool.entry(5).unwrap(),
        &Constant::Utf8Bytes(&[0xed, 0xa0, 0x80])
    );
    assert_eq!(class.to_bytes().unwrap(), bytes);

    let renamed = rename(&class, |name| {
        name.strip_prefix("a/b/").map(|rest| format!("x/y/{}", rest))
    })
    .unwrap();
    let out = renamed.class.to_bytes().unwrap();
    let again = Class::parse(&out).unwrap();
    assert_eq!(again.this_class, "x/y/C");
    assert_eq!(again.pool.entry(5), class.pool.entry(5));
}
