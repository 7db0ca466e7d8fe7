use std::collections::{HashMap, HashSet};

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, warn};

use crate::{
    error::KiwiError,
    lookup::KindTable,
    types::{Definition, DefinitionKind, Field, FieldType, PrimitiveType, Schema},
    utils::quote,
};

lazy_static! {
    static ref EXTRA_FIELD:    Regex = Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*):([A-Za-z_][A-Za-z0-9_]*):\s*(\S.*)$").unwrap();
    static ref NON_IDENTIFIER: Regex = Regex::new(r"[^A-Za-z0-9_]+").unwrap();
}

const RUST_KEYWORDS: [&str; 38] = [
    "as", "async", "await", "break", "const", "continue", "crate", "dyn",
    "else", "enum", "extern", "false", "fn", "for", "if", "impl", "in",
    "let", "loop", "match", "mod", "move", "mut", "pub", "ref", "return",
    "self", "Self", "static", "struct", "super", "trait", "true", "type",
    "unsafe", "use", "where", "while",
];

/// A field that is not part of the schema but should be added to a generated
/// struct or message, e.g. to carry application state next to decoded data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraField {
    /// Name of the definition to add the field to.
    pub target:    String,
    pub name:      String,
    /// Rust type, copied verbatim into the declaration.
    pub type_text: String,
}

/// Extra fields keyed by the name of the definition they belong to.
pub type ExtraFields = HashMap<String, Vec<ExtraField>>;

impl ExtraField {
    /// Parses `StructName:FieldName:FieldType`. The type part may itself
    /// contain colons, e.g. `Node:cache:std::sync::Arc<Cache>`.
    pub fn parse(text: &str) -> Result<ExtraField, KiwiError> {
        let caps = EXTRA_FIELD
            .captures(text.trim())
            .ok_or_else(|| KiwiError::InvalidExtraField(quote(text)))?;
        Ok(ExtraField {
            target:    caps[1].to_owned(),
            name:      caps[2].to_owned(),
            type_text: caps[3].trim_end().to_owned(),
        })
    }

    /// Groups fields by target, keeping the order they were given in.
    pub fn group<I>(fields: I) -> ExtraFields
    where
        I: IntoIterator<Item = ExtraField>,
    {
        let mut grouped = ExtraFields::new();
        for field in fields {
            grouped.entry(field.target.clone()).or_default().push(field);
        }
        grouped
    }
}

/// Converts a string to PascalCase.
/// - If the string contains underscores, it splits on underscores and converts each word
///   so that its first letter is uppercase and the rest lowercase.
/// - If the string is fully uppercase, only the first letter stays uppercase.
/// - Otherwise, it ensures only the first letter is uppercase.
fn to_pascal_case(s: &str) -> String {
    fn capitalize(word: &str, lower_rest: bool) -> String {
        let mut chars = word.chars();
        match chars.next() {
            None => String::new(),
            Some(first) if lower_rest => first.to_uppercase().to_string() + &chars.as_str().to_lowercase(),
            Some(first) => first.to_uppercase().to_string() + chars.as_str(),
        }
    }

    if s.contains('_') {
        s.split('_')
            .filter(|word| !word.is_empty())
            .map(|word| capitalize(word, true))
            .collect::<String>()
    } else {
        capitalize(s, s == s.to_uppercase())
    }
}

/// Converts a string to snake_case without splitting acronyms
/// ("sessionID" becomes "session_id").
fn to_snake_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut snake = String::new();
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                let prev = chars[i - 1];
                if (!prev.is_uppercase() && prev != '_')
                    || (prev.is_uppercase() && i + 1 < chars.len() && chars[i + 1].is_lowercase())
                {
                    snake.push('_');
                }
            }
            snake.extend(c.to_lowercase());
        } else {
            snake.push(c);
        }
    }
    snake
}

/// Replaces anything that cannot appear in an identifier.
fn sanitize_identifier(s: &str) -> String {
    let cleaned = NON_IDENTIFIER.replace_all(s, "_");
    match cleaned.chars().next() {
        None => "unnamed".to_owned(),
        Some(c) if c.is_ascii_digit() => format!("_{}", cleaned),
        Some(_) => cleaned.into_owned(),
    }
}

/// Escapes Rust reserved keywords by suffixing with an underscore.
fn escape_rust_keyword(s: String) -> String {
    if RUST_KEYWORDS.contains(&s.as_str()) || s == "_" {
        format!("{}_", s)
    } else {
        s
    }
}

fn type_ident(name: &str) -> String {
    escape_rust_keyword(to_pascal_case(&sanitize_identifier(name)))
}

fn field_ident(name: &str) -> String {
    escape_rust_keyword(to_snake_case(&sanitize_identifier(name)))
}

fn const_ident(name: &str) -> String {
    to_snake_case(&sanitize_identifier(name)).to_uppercase()
}

/// Appends underscores until `ident` is not in `taken`, then claims it.
/// Distinct schema names can map to one identifier (`a` and `A` are both
/// `A` as constants).
fn unique_ident(mut ident: String, taken: &mut HashSet<String>) -> String {
    while taken.contains(&ident) {
        ident.push('_');
    }
    taken.insert(ident.clone());
    ident
}

// Generated code names every type and trait it needs by full path, so a
// definition called `Result`, `Default` or `ByteBuffer` cannot shadow it.
const RESULT: &str = "::core::result::Result";
const OPTION: &str = "::core::option::Option";
const BOX: &str = "::std::boxed::Box";
const VEC: &str = "::std::vec::Vec";
const BYTE_BUFFER: &str = "::kiwigen_codec::ByteBuffer";
const BOUNDS_ERROR: &str = "::kiwigen_codec::BoundsError";

fn primitive_type(primitive: PrimitiveType) -> &'static str {
    match primitive {
        PrimitiveType::Bool   => "bool",
        PrimitiveType::Byte   => "u8",
        PrimitiveType::Int    => "i64",
        PrimitiveType::Uint   => "u64",
        PrimitiveType::Float  => "f64",
        PrimitiveType::String => "::std::string::String",
        PrimitiveType::Int64  => "i64",
        PrimitiveType::Uint64 => "u64",
    }
}

fn primitive_reader(primitive: PrimitiveType) -> &'static str {
    match primitive {
        PrimitiveType::Bool   => "bb.read_byte()? != 0",
        PrimitiveType::Byte   => "bb.read_byte()?",
        PrimitiveType::Int    => "bb.read_var_int()?",
        PrimitiveType::Uint   => "bb.read_var_uint()?",
        PrimitiveType::Float  => "bb.read_var_float()?",
        PrimitiveType::String => "bb.read_string()?.to_string_lossy()",
        PrimitiveType::Int64  => "bb.read_var_int64()?",
        PrimitiveType::Uint64 => "bb.read_var_uint64()?",
    }
}

/// Reads a length-prefixed run of `element` as one block expression.
fn array_block(element: &str, indent: &str) -> String {
    format!(
        "{{\n\
         {i}    let size = bb.read_var_uint()?;\n\
         {i}    let mut values = {v}::with_capacity(::core::cmp::min(::core::convert::TryFrom::try_from(size).unwrap_or(usize::MAX), bb.remaining()));\n\
         {i}    for _ in 0..size {{\n\
         {i}        values.push({e});\n\
         {i}    }}\n\
         {i}    values\n\
         {i}}}",
        i = indent,
        e = element,
        v = VEC,
    )
}

/// Compiles a decoded schema into Rust type definitions with a `decode`
/// routine per struct and message, reading through `kiwigen_codec::ByteBuffer`.
///
/// Enums become open newtypes over their ordinal so unknown members still
/// decode. Message fields are `Option`s that stay `None` unless their tag is
/// seen. `extras` adds fields to the named structs and messages; they are
/// left at their `Default` value by `decode`.
///
/// If `module` is given, everything is wrapped in `pub mod <module> { .. }`.
pub fn compile_schema_to_rust(
    schema: &Schema,
    module: Option<&str>,
    extras: &ExtraFields,
) -> Result<String, KiwiError> {
    let mut taken = HashSet::new();
    let type_names = schema
        .definitions
        .iter()
        .map(|definition| unique_ident(type_ident(&definition.name), &mut taken))
        .collect();
    let generator = RustGenerator {
        schema,
        kinds: KindTable::new(schema),
        extras,
        type_names,
    };
    let mut rust_code: Vec<String> = Vec::new();

    debug!(definitions = schema.definitions.len(), ?module, "generating Rust source");

    for target in extras.keys() {
        if !generator.kinds.is_struct(target) {
            warn!("extra fields for {} ignored: no struct or message by that name", quote(target));
        }
    }

    rust_code.push("// Code generated by kiwigen. DO NOT EDIT.".to_string());
    rust_code.push("".to_string());

    if let Some(name) = module {
        rust_code.push(format!("pub mod {} {{", field_ident(name)));
        rust_code.push("".to_string());
    }

    for (index, definition) in schema.definitions.iter().enumerate() {
        match definition.kind {
            DefinitionKind::Enum => rust_code.push(generator.generate_enum(index, definition)),
            DefinitionKind::Struct | DefinitionKind::Message => {
                rust_code.push(generator.generate_struct(index, definition)?)
            }
        }
    }

    if module.is_some() {
        rust_code.push("}".to_string());
    }

    Ok(rust_code.join("\n"))
}

struct RustGenerator<'a> {
    schema:     &'a Schema,
    kinds:      KindTable<'a>,
    extras:     &'a ExtraFields,
    /// Rust type name of each definition, by index.
    type_names: Vec<String>,
}

impl<'a> RustGenerator<'a> {
    /// Generates an open enum: a newtype over the ordinal with one associated
    /// constant per member.
    fn generate_enum(&self, index: usize, definition: &Definition) -> String {
        let enum_name = &self.type_names[index];
        let mut lines = vec![
            "#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]".to_string(),
            format!("pub struct {}(pub u64);", enum_name),
            "".to_string(),
            format!("impl {} {{", enum_name),
        ];
        let mut taken = HashSet::new();
        for member in &definition.fields {
            lines.push(format!(
                "    pub const {}: {} = {}({});",
                unique_ident(const_ident(&member.name), &mut taken),
                enum_name,
                enum_name,
                member.value
            ));
        }
        lines.push("}".to_string());
        lines.push("".to_string());
        lines.join("\n")
    }

    fn generate_struct(&self, index: usize, definition: &Definition) -> Result<String, KiwiError> {
        let struct_name = &self.type_names[index];
        let is_message = definition.kind == DefinitionKind::Message;

        let mut taken = HashSet::new();
        let field_names: Vec<String> = definition
            .fields
            .iter()
            .map(|field| unique_ident(field_ident(&field.name), &mut taken))
            .collect();

        let mut lines = vec![
            "#[derive(Debug, Clone, PartialEq, Default)]".to_string(),
            format!("pub struct {} {{", struct_name),
        ];
        for (field, field_name) in definition.fields.iter().zip(&field_names) {
            let type_ = self.field_type(definition, field)?;
            lines.push(format!(
                "    pub {}: {},",
                field_name,
                self.declared_type(definition, field, type_)?
            ));
        }
        for extra in self.extras.get(&definition.name).into_iter().flatten() {
            let extra_name = unique_ident(escape_rust_keyword(extra.name.clone()), &mut taken);
            lines.push(format!("    pub {}: {},", extra_name, extra.type_text));
        }
        lines.push("}".to_string());
        lines.push("".to_string());

        lines.push(format!("impl {} {{", struct_name));
        lines.push(format!(
            "    pub fn decode(bb: &mut {}<'_>) -> {}<Self, {}> {{",
            BYTE_BUFFER, RESULT, BOUNDS_ERROR
        ));
        lines.push("        let mut result = <Self as ::core::default::Default>::default();".to_string());

        if is_message {
            lines.push("        loop {".to_string());
            lines.push("            match bb.read_var_uint()? {".to_string());
            lines.push("                0 => break,".to_string());
            for (field, field_name) in definition.fields.iter().zip(&field_names) {
                let type_ = self.field_type(definition, field)?;
                lines.push(format!(
                    "                {} => result.{} = {}::Some({}),",
                    field.value,
                    field_name,
                    OPTION,
                    self.read_value(definition, field, type_, "                ")?
                ));
            }
            lines.push("                _ => {}".to_string());
            lines.push("            }".to_string());
            lines.push("        }".to_string());
        } else {
            for (field, field_name) in definition.fields.iter().zip(&field_names) {
                let type_ = self.field_type(definition, field)?;
                lines.push(format!(
                    "        result.{} = {};",
                    field_name,
                    self.read_value(definition, field, type_, "        ")?
                ));
            }
        }

        lines.push(format!("        {}::Ok(result)", RESULT));
        lines.push("    }".to_string());
        lines.push("}".to_string());
        lines.push("".to_string());

        Ok(lines.join("\n"))
    }

    fn field_type(&self, definition: &Definition, field: &Field) -> Result<FieldType, KiwiError> {
        field.type_.ok_or_else(|| KiwiError::UnresolvedField {
            definition: definition.name.clone(),
            field:      field.name.clone(),
        })
    }

    /// Name of the Rust type for one element of `type_`.
    fn element_type(&self, definition: &Definition, field: &Field, type_: FieldType) -> Result<String, KiwiError> {
        match type_ {
            FieldType::Primitive(primitive) => Ok(primitive_type(primitive).to_string()),
            FieldType::Reference(index) => match self.type_names.get(index) {
                Some(name) => Ok(name.clone()),
                None => Err(KiwiError::InvalidTypeReference {
                    definition: definition.name.clone(),
                    field:      field.name.clone(),
                    raw_type:   i64::try_from(index).unwrap_or(i64::MAX),
                }),
            },
        }
    }

    /// References to structs and messages are boxed so messages may nest
    /// themselves.
    fn is_boxed(&self, type_: FieldType) -> bool {
        matches!(type_, FieldType::Reference(_)) && !self.kinds.is_enum_type(self.schema, type_)
    }

    fn declared_type(&self, definition: &Definition, field: &Field, type_: FieldType) -> Result<String, KiwiError> {
        let element = self.element_type(definition, field, type_)?;
        let base = if field.is_array {
            format!("{}<{}>", VEC, element)
        } else if self.is_boxed(type_) {
            format!("{}<{}>", BOX, element)
        } else {
            element
        };
        Ok(if definition.kind == DefinitionKind::Message {
            format!("{}<{}>", OPTION, base)
        } else {
            base
        })
    }

    fn read_element(&self, definition: &Definition, field: &Field, type_: FieldType) -> Result<String, KiwiError> {
        match type_ {
            FieldType::Primitive(primitive) => Ok(primitive_reader(primitive).to_string()),
            FieldType::Reference(_) => {
                let name = self.element_type(definition, field, type_)?;
                if self.kinds.is_enum_type(self.schema, type_) {
                    Ok(format!("{}(bb.read_var_uint()?)", name))
                } else {
                    Ok(format!("{}::decode(bb)?", name))
                }
            }
        }
    }

    fn read_value(
        &self,
        definition: &Definition,
        field: &Field,
        type_: FieldType,
        indent: &str,
    ) -> Result<String, KiwiError> {
        let element = self.read_element(definition, field, type_)?;
        Ok(if field.is_array {
            array_block(&element, indent)
        } else if self.is_boxed(type_) {
            format!("{}::new({})", BOX, element)
        } else {
            element
        })
    }
}
