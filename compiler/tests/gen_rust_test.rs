use kiwigen_compiler::{
    compile_schema_to_rust,
    types::{Definition, DefinitionKind, Field, FieldType, PrimitiveType, Schema},
    ExtraField, ExtraFields, KiwiError,
};

fn field(name: &str, type_: Option<FieldType>, is_array: bool, value: u64) -> Field {
    Field {
        name: name.to_owned(),
        raw_type: None,
        type_,
        is_array,
        value,
    }
}

fn primitive(primitive: PrimitiveType) -> Option<FieldType> {
    Some(FieldType::Primitive(primitive))
}

fn example_schema() -> Schema {
    Schema::new(vec![
        Definition {
            name:   "Type".to_owned(),
            kind:   DefinitionKind::Enum,
            fields: vec![
                field("FLAT", None, false, 0),
                field("ROUND", None, false, 1),
                field("POINTED", None, false, 2),
            ],
        },
        Definition {
            name:   "Color".to_owned(),
            kind:   DefinitionKind::Struct,
            fields: vec![
                field("red", primitive(PrimitiveType::Byte), false, 1),
                field("alpha", primitive(PrimitiveType::Float), false, 2),
                field("label", primitive(PrimitiveType::String), false, 3),
            ],
        },
        Definition {
            name:   "Example".to_owned(),
            kind:   DefinitionKind::Message,
            fields: vec![
                field("clientID", primitive(PrimitiveType::Uint), false, 1),
                field("type", Some(FieldType::Reference(0)), false, 2),
                field("colors", Some(FieldType::Reference(1)), true, 3),
                field("parent", Some(FieldType::Reference(2)), false, 4),
                field("visible", primitive(PrimitiveType::Bool), false, 5),
                field("tags", primitive(PrimitiveType::Int64), true, 6),
            ],
        },
    ])
}

#[test]
fn test_generates_enum_newtype() {
    let code = compile_schema_to_rust(&example_schema(), None, &ExtraFields::new()).unwrap();

    assert!(code.starts_with("// Code generated by kiwigen. DO NOT EDIT.\n"));
    assert!(!code.contains("\nuse "));
    assert!(code.contains("pub struct Type(pub u64);"));
    assert!(code.contains("    pub const FLAT: Type = Type(0);"));
    assert!(code.contains("    pub const ROUND: Type = Type(1);"));
    assert!(code.contains("    pub const POINTED: Type = Type(2);"));
}

#[test]
fn test_generates_struct_decoder() {
    let code = compile_schema_to_rust(&example_schema(), None, &ExtraFields::new()).unwrap();

    assert!(code.contains(
        "pub struct Color {\n    pub red: u8,\n    pub alpha: f64,\n    pub label: ::std::string::String,\n}"
    ));
    assert!(code.contains(
        "impl Color {\n    pub fn decode(bb: &mut ::kiwigen_codec::ByteBuffer<'_>) \
         -> ::core::result::Result<Self, ::kiwigen_codec::BoundsError> {"
    ));
    assert!(code.contains("        ::core::result::Result::Ok(result)\n"));
    assert!(code.contains("        result.red = bb.read_byte()?;"));
    assert!(code.contains("        result.alpha = bb.read_var_float()?;"));
    assert!(code.contains("        result.label = bb.read_string()?.to_string_lossy();"));
}

#[test]
fn test_generates_message_decoder() {
    let code = compile_schema_to_rust(&example_schema(), None, &ExtraFields::new()).unwrap();

    assert!(code.contains("    pub client_id: ::core::option::Option<u64>,"));
    assert!(code.contains("    pub type_: ::core::option::Option<Type>,"));
    assert!(code.contains("    pub colors: ::core::option::Option<::std::vec::Vec<Color>>,"));
    assert!(code.contains("    pub parent: ::core::option::Option<::std::boxed::Box<Example>>,"));
    assert!(code.contains("    pub visible: ::core::option::Option<bool>,"));
    assert!(code.contains("    pub tags: ::core::option::Option<::std::vec::Vec<i64>>,"));

    assert!(code.contains("            match bb.read_var_uint()? {\n                0 => break,"));
    assert!(code.contains("                1 => result.client_id = ::core::option::Option::Some(bb.read_var_uint()?),"));
    assert!(code.contains("                2 => result.type_ = ::core::option::Option::Some(Type(bb.read_var_uint()?)),"));
    assert!(code.contains("                3 => result.colors = ::core::option::Option::Some({"));
    assert!(code.contains("values.push(Color::decode(bb)?);"));
    assert!(code.contains(
        "                4 => result.parent = ::core::option::Option::Some(::std::boxed::Box::new(Example::decode(bb)?)),"
    ));
    assert!(code.contains("                5 => result.visible = ::core::option::Option::Some(bb.read_byte()? != 0),"));
    assert!(code.contains("values.push(bb.read_var_int64()?);"));
    assert!(code.contains("                _ => {}"));
}

#[test]
fn test_splices_extra_fields() {
    let extras = ExtraField::group(vec![
        ExtraField::parse("Color:cache:Option<std::sync::Arc<Vec<u8>>>").unwrap(),
        ExtraField::parse("Color:dirty:bool").unwrap(),
        ExtraField::parse("Missing:x:u8").unwrap(),
    ]);
    let code = compile_schema_to_rust(&example_schema(), None, &extras).unwrap();

    assert!(code.contains(
        "    pub label: ::std::string::String,\n    pub cache: Option<std::sync::Arc<Vec<u8>>>,\n    pub dirty: bool,\n}"
    ));
    assert!(!code.contains("pub x: u8"));
}

#[test]
fn test_wraps_in_module() {
    let code = compile_schema_to_rust(&example_schema(), Some("figma"), &ExtraFields::new()).unwrap();

    assert!(code.contains("\npub mod figma {\n"));
    assert!(code.ends_with("}"));
}

#[test]
fn test_struct_with_nested_struct_and_array() {
    let schema = Schema::new(vec![
        Definition {
            name:   "Point".to_owned(),
            kind:   DefinitionKind::Struct,
            fields: vec![field("x", primitive(PrimitiveType::Float), false, 1)],
        },
        Definition {
            name:   "Path".to_owned(),
            kind:   DefinitionKind::Struct,
            fields: vec![
                field("start", Some(FieldType::Reference(0)), false, 1),
                field("points", Some(FieldType::Reference(0)), true, 2),
            ],
        },
    ]);
    let code = compile_schema_to_rust(&schema, None, &ExtraFields::new()).unwrap();

    assert!(code.contains("    pub start: ::std::boxed::Box<Point>,\n    pub points: ::std::vec::Vec<Point>,"));
    assert!(code.contains("        result.start = ::std::boxed::Box::new(Point::decode(bb)?);"));
    assert!(code.contains("        result.points = {\n            let size = bb.read_var_uint()?;"));
}

#[test]
fn test_unresolved_field_is_an_error() {
    let schema = Schema::new(vec![Definition {
        name:   "Broken".to_owned(),
        kind:   DefinitionKind::Struct,
        fields: vec![field("x", None, false, 1)],
    }]);
    assert!(matches!(
        compile_schema_to_rust(&schema, None, &ExtraFields::new()),
        Err(KiwiError::UnresolvedField { .. })
    ));
}

#[test]
fn test_dangling_reference_is_an_error() {
    let schema = Schema::new(vec![Definition {
        name:   "Broken".to_owned(),
        kind:   DefinitionKind::Message,
        fields: vec![field("x", Some(FieldType::Reference(5)), false, 1)],
    }]);
    assert!(matches!(
        compile_schema_to_rust(&schema, None, &ExtraFields::new()),
        Err(KiwiError::InvalidTypeReference { raw_type: 5, .. })
    ));
}

#[test]
fn test_colliding_names_get_distinct_identifiers() {
    let schema = Schema::new(vec![
        Definition {
            name:   "Status".to_owned(),
            kind:   DefinitionKind::Enum,
            fields: vec![field("ok", None, false, 0), field("OK", None, false, 1)],
        },
        Definition {
            name:   "Pair".to_owned(),
            kind:   DefinitionKind::Struct,
            fields: vec![
                field("fooBar", primitive(PrimitiveType::Byte), false, 1),
                field("foo_bar", primitive(PrimitiveType::Byte), false, 2),
            ],
        },
        Definition {
            name:   "PAIR".to_owned(),
            kind:   DefinitionKind::Message,
            fields: vec![field("inner", Some(FieldType::Reference(2)), false, 1)],
        },
    ]);
    let code = compile_schema_to_rust(&schema, None, &ExtraFields::new()).unwrap();

    assert!(code.contains("    pub const OK: Status = Status(0);\n    pub const OK_: Status = Status(1);"));
    assert!(code.contains("    pub foo_bar: u8,\n    pub foo_bar_: u8,"));
    assert!(code.contains("        result.foo_bar_ = bb.read_byte()?;"));
    assert!(code.contains("pub struct Pair_ {"));
    assert!(code.contains("::std::boxed::Box<Pair_>"));
    assert!(code.contains("::std::boxed::Box::new(Pair_::decode(bb)?)"));
}

/// Definitions named after the types generated code relies on.
#[test]
fn test_definitions_cannot_shadow_generated_paths() {
    let names = ["Result", "Option", "Box", "Vec", "String", "ByteBuffer", "BoundsError", "Default"];
    let schema = Schema::new(
        names
            .iter()
            .map(|name| Definition {
                name:   name.to_string(),
                kind:   DefinitionKind::Struct,
                fields: vec![],
            })
            .collect(),
    );
    let code = compile_schema_to_rust(&schema, None, &ExtraFields::new()).unwrap();

    for line in code.lines().filter(|line| !line.starts_with("pub struct") && !line.starts_with("impl ")) {
        for name in names {
            let bare = format!("{}<", name);
            let path = line.replace(&format!("::{}", name), "");
            assert!(!path.contains(&bare) && !path.contains(&format!("{}::", name)), "{:?} uses bare {}", line, name);
        }
    }
}

// The checked-in fixture is both compared against fresh generator output and
// compiled into this test crate, so the generated code is known to build.
#[allow(dead_code)]
mod shapes {
    include!("fixtures/shapes.rs");
}

/// enum Result { OK = 0; ok = 1; FAILED = 2; }
/// struct Point { float x; float y; }
/// message Shape { Result kind = 1; Point[] points = 2; string name = 3; Shape parent = 4; }
fn shapes_schema() -> Schema {
    Schema::new(vec![
        Definition {
            name:   "Result".to_owned(),
            kind:   DefinitionKind::Enum,
            fields: vec![
                field("OK", None, false, 0),
                field("ok", None, false, 1),
                field("FAILED", None, false, 2),
            ],
        },
        Definition {
            name:   "Point".to_owned(),
            kind:   DefinitionKind::Struct,
            fields: vec![
                field("x", primitive(PrimitiveType::Float), false, 1),
                field("y", primitive(PrimitiveType::Float), false, 2),
            ],
        },
        Definition {
            name:   "Shape".to_owned(),
            kind:   DefinitionKind::Message,
            fields: vec![
                field("kind", Some(FieldType::Reference(0)), false, 1),
                field("points", Some(FieldType::Reference(1)), true, 2),
                field("name", primitive(PrimitiveType::String), false, 3),
                field("parent", Some(FieldType::Reference(2)), false, 4),
            ],
        },
    ])
}

#[test]
fn test_output_matches_compiled_fixture() {
    let code = compile_schema_to_rust(&shapes_schema(), None, &ExtraFields::new()).unwrap();
    pretty_assertions::assert_eq!(code, include_str!("fixtures/shapes.rs"));
}

#[test]
fn test_compiled_fixture_decodes_messages() {
    use shapes::{Point, Shape};

    let bytes = [
        1, 2, // kind = FAILED
        2, 2, 0x7F, 0, 0, 0, 0, 0, 0x7F, 0, 0, 0, // points = [(1, 0), (0, 1)]
        3, b'h', b'i', 0, // name = "hi"
        4, 3, b'p', 0, 0, // parent = { name = "p" }
        7, // unknown tag, skipped
        0, // end of message
        42,
    ];
    let mut bb = kiwigen_codec::ByteBuffer::new(&bytes);
    let shape = Shape::decode(&mut bb).expect("decode failed");

    assert_eq!(shape.kind, Some(shapes::Result::FAILED));
    assert_eq!(shapes::Result::OK_, shapes::Result(1));
    assert_eq!(
        shape.points,
        Some(vec![Point { x: 1.0, y: 0.0 }, Point { x: 0.0, y: 1.0 }])
    );
    assert_eq!(shape.name.as_deref(), Some("hi"));
    assert_eq!(
        shape.parent,
        Some(Box::new(Shape {
            name: Some("p".to_owned()),
            ..Shape::default()
        }))
    );
    assert_eq!(bb.remaining(), 1);

    let mut truncated = kiwigen_codec::ByteBuffer::new(&bytes[..6]);
    assert!(Shape::decode(&mut truncated).is_err());
}
