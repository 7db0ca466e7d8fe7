//! kiwigen-compiler
//!
//! This crate implements:
//!  1) `decode_binary_schema`: binary Kiwi schema → resolved `Schema` tree,
//!  2) `KindTable`: enum / struct lookups over a decoded schema,
//!  3) Code generation (`compile_schema_to_rust` → `String`),
//!  4) Error types (`KiwiError`).

pub mod error;
pub mod types;
pub mod utils;
pub mod decoder;
pub mod lookup;
pub mod gen_rust;

pub use decoder::decode_binary_schema;
pub use decoder::decode_to_json;
pub use decoder::schema_to_json;
pub use error::KiwiError;
pub use gen_rust::{compile_schema_to_rust, ExtraField, ExtraFields};
pub use lookup::KindTable;
pub use types::{Definition, DefinitionKind, Field, FieldType, PrimitiveType, Schema};
