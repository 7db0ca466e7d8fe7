use serde::Serialize;

/// Built-in field types, in wire order. A negative raw type `t` names
/// `PRIMITIVE_TYPES[!t]`.
pub const PRIMITIVE_TYPES: [PrimitiveType; 8] = [
    PrimitiveType::Bool,
    PrimitiveType::Byte,
    PrimitiveType::Int,
    PrimitiveType::Uint,
    PrimitiveType::Float,
    PrimitiveType::String,
    PrimitiveType::Int64,
    PrimitiveType::Uint64,
];

/// Definition kinds, in wire order. The kind byte indexes this list.
pub const DEFINITION_KINDS: [DefinitionKind; 3] = [
    DefinitionKind::Enum,
    DefinitionKind::Struct,
    DefinitionKind::Message,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    Bool,
    Byte,
    Int,
    Uint,
    Float,
    String,
    Int64,
    Uint64,
}

impl PrimitiveType {
    pub fn from_index(index: usize) -> Option<PrimitiveType> {
        PRIMITIVE_TYPES.get(index).copied()
    }

    /// The name used for this type in `.kiwi` source.
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveType::Bool   => "bool",
            PrimitiveType::Byte   => "byte",
            PrimitiveType::Int    => "int",
            PrimitiveType::Uint   => "uint",
            PrimitiveType::Float  => "float",
            PrimitiveType::String => "string",
            PrimitiveType::Int64  => "int64",
            PrimitiveType::Uint64 => "uint64",
        }
    }
}

/// The resolved type of a struct or message field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FieldType {
    Primitive(PrimitiveType),
    /// Index of another definition in [Schema::definitions].
    Reference(usize),
}

impl FieldType {
    /// Resolves a raw type code against a table of `definition_count`
    /// definitions. Negative codes are complemented into a primitive index,
    /// the rest index the definition table directly, so a field may name a
    /// definition that comes after it in the stream.
    pub fn from_raw(raw_type: i64, definition_count: usize) -> Option<FieldType> {
        if raw_type < 0 {
            usize::try_from(!raw_type)
                .ok()
                .and_then(PrimitiveType::from_index)
                .map(FieldType::Primitive)
        } else {
            usize::try_from(raw_type)
                .ok()
                .filter(|&index| index < definition_count)
                .map(FieldType::Reference)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DefinitionKind {
    Enum    = 0,
    Struct  = 1,
    Message = 2,
}

impl DefinitionKind {
    pub fn from_byte(byte: u8) -> Option<DefinitionKind> {
        DEFINITION_KINDS.get(usize::from(byte)).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub name:     String,
    /// Type code as read from the stream. `None` for enum members.
    pub raw_type: Option<i64>,
    /// Filled in once the whole definition table is known.
    pub type_:    Option<FieldType>,
    pub is_array: bool,
    /// Ordinal for enum members, field index for structs and messages.
    pub value:    u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Definition {
    pub name:   String,
    pub kind:   DefinitionKind,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schema {
    pub definitions: Vec<Definition>,
}

impl Schema {
    pub fn new(definitions: Vec<Definition>) -> Schema {
        Schema { definitions }
    }

    pub fn definition(&self, index: usize) -> Option<&Definition> {
        self.definitions.get(index)
    }

    pub fn find_definition(&self, name: &str) -> Option<&Definition> {
        self.definitions.iter().find(|def| def.name == name)
    }

    /// The primitive's `.kiwi` name, or the name of the referenced definition.
    /// `None` if the reference points outside this schema.
    pub fn type_name(&self, type_: FieldType) -> Option<&str> {
        match type_ {
            FieldType::Primitive(primitive) => Some(primitive.name()),
            FieldType::Reference(index) => self.definition(index).map(|def| def.name.as_str()),
        }
    }
}

#[test]
fn resolve_primitive_codes() {
    assert_eq!(FieldType::from_raw(-1, 0), Some(FieldType::Primitive(PrimitiveType::Bool)));
    assert_eq!(FieldType::from_raw(-6, 0), Some(FieldType::Primitive(PrimitiveType::String)));
    assert_eq!(FieldType::from_raw(-8, 0), Some(FieldType::Primitive(PrimitiveType::Uint64)));
    assert_eq!(FieldType::from_raw(-9, 0), None);
    assert_eq!(FieldType::from_raw(i64::MIN, 100), None);
}

#[test]
fn resolve_reference_codes() {
    assert_eq!(FieldType::from_raw(0, 2), Some(FieldType::Reference(0)));
    assert_eq!(FieldType::from_raw(1, 2), Some(FieldType::Reference(1)));
    assert_eq!(FieldType::from_raw(2, 2), None);
    assert_eq!(FieldType::from_raw(0, 0), None);
}

#[test]
fn kind_bytes() {
    assert_eq!(DefinitionKind::from_byte(0), Some(DefinitionKind::Enum));
    assert_eq!(DefinitionKind::from_byte(1), Some(DefinitionKind::Struct));
    assert_eq!(DefinitionKind::from_byte(2), Some(DefinitionKind::Message));
    assert_eq!(DefinitionKind::from_byte(3), None);
    assert_eq!(DefinitionKind::from_byte(255), None);
}

#[test]
fn type_names() {
    let schema = Schema::new(vec![Definition {
        name:   "Point".to_owned(),
        kind:   DefinitionKind::Struct,
        fields: vec![],
    }]);
    assert_eq!(schema.type_name(FieldType::Primitive(PrimitiveType::Float)), Some("float"));
    assert_eq!(schema.type_name(FieldType::Reference(0)), Some("Point"));
    assert_eq!(schema.type_name(FieldType::Reference(1)), None);
    assert!(schema.find_definition("Point").is_some());
    assert!(schema.find_definition("Line").is_none());
}
