use std::collections::HashSet;

use crate::types::{DefinitionKind, FieldType, Schema};

/// Name-based kind lookups over a decoded schema.
///
/// Built once from a resolved [Schema] and handed to whatever needs to ask
/// "is this name an enum?" while walking it. Messages count as structs here:
/// both are decoded through their own `decode` routine, while enums are read
/// as a bare ordinal.
#[derive(Debug, Clone, Default)]
pub struct KindTable<'a> {
    enums:   HashSet<&'a str>,
    structs: HashSet<&'a str>,
}

impl<'a> KindTable<'a> {
    pub fn new(schema: &'a Schema) -> KindTable<'a> {
        let mut table = KindTable::default();
        for def in &schema.definitions {
            match def.kind {
                DefinitionKind::Enum => table.enums.insert(def.name.as_str()),
                DefinitionKind::Struct | DefinitionKind::Message => {
                    table.structs.insert(def.name.as_str())
                }
            };
        }
        table
    }

    pub fn is_enum(&self, name: &str) -> bool {
        self.enums.contains(name)
    }

    pub fn is_struct(&self, name: &str) -> bool {
        self.structs.contains(name)
    }

    /// True when `type_` names an enum definition of `schema`.
    pub fn is_enum_type(&self, schema: &Schema, type_: FieldType) -> bool {
        match type_ {
            FieldType::Primitive(_) => false,
            FieldType::Reference(_) => schema.type_name(type_).map_or(false, |name| self.is_enum(name)),
        }
    }
}
