use kiwigen_codec::ByteBuffer;
use tracing::{debug, trace};

use crate::{
    error::{bounds, KiwiError},
    types::{Definition, DefinitionKind, Field, FieldType, Schema},
};

/// Decode a binary schema buffer into a `Schema`.
///
/// Decoding runs in two passes. The first reads every definition with its
/// fields' raw type codes; the second resolves those codes once the whole
/// definition table is known, so fields may reference definitions that come
/// later in the buffer.
///
/// Returns `Err(KiwiError)` on any short read, an unknown definition kind, or
/// a type code that names neither a primitive nor a definition. Nothing is
/// returned for a partially decoded buffer.
pub fn decode_binary_schema(buffer: &[u8]) -> Result<Schema, KiwiError> {
    let mut bb = ByteBuffer::new(buffer);

    let definition_count = bb.read_var_uint().map_err(bounds("definition count"))?;
    debug!(definition_count, bytes = buffer.len(), "decoding binary schema");

    let mut definitions = Vec::with_capacity(capacity_hint(definition_count, &bb));
    for _ in 0..definition_count {
        definitions.push(read_definition(&mut bb)?);
    }

    resolve_types(&mut definitions)?;

    if !bb.is_empty() {
        debug!(trailing = bb.remaining(), "ignoring bytes after the last definition");
    }

    Ok(Schema::new(definitions))
}

/// Decode a binary schema buffer into a pretty-printed JSON string.
pub fn decode_to_json(buffer: &[u8]) -> Result<String, KiwiError> {
    let schema = decode_binary_schema(buffer)?;
    schema_to_json(&schema)
}

/// Pretty-prints an already decoded schema as JSON.
pub fn schema_to_json(schema: &Schema) -> Result<String, KiwiError> {
    Ok(serde_json::to_string_pretty(schema)?)
}

fn read_definition(bb: &mut ByteBuffer<'_>) -> Result<Definition, KiwiError> {
    let name = bb
        .read_string()
        .map_err(bounds("definition name"))?
        .to_string_lossy();

    let kind_byte = bb.read_byte().map_err(bounds("definition kind"))?;
    let kind = DefinitionKind::from_byte(kind_byte).ok_or_else(|| {
        KiwiError::InvalidDefinitionKind {
            definition: name.clone(),
            kind:       kind_byte,
        }
    })?;

    let field_count = bb.read_var_uint().map_err(bounds("field count"))?;
    let mut fields = Vec::with_capacity(capacity_hint(field_count, bb));

    for _ in 0..field_count {
        let field_name = bb
            .read_string()
            .map_err(bounds("field name"))?
            .to_string_lossy();

        // Enum members carry a type code on the wire too; it is meaningless.
        let raw_type = bb.read_var_int().map_err(bounds("field type"))?;

        let array_flag = bb.read_byte().map_err(bounds("field array flag"))?;

        let value = bb.read_var_uint().map_err(bounds("field value"))?;

        fields.push(Field {
            name:     field_name,
            raw_type: (kind != DefinitionKind::Enum).then_some(raw_type),
            type_:    None,
            is_array: (array_flag & 1) != 0,
            value,
        });
    }

    trace!(name = %name, ?kind, fields = fields.len(), "read definition");

    Ok(Definition { name, kind, fields })
}

fn resolve_types(definitions: &mut [Definition]) -> Result<(), KiwiError> {
    let definition_count = definitions.len();

    for definition in definitions.iter_mut() {
        for field in definition.fields.iter_mut() {
            let Some(raw_type) = field.raw_type else {
                continue;
            };
            let resolved = FieldType::from_raw(raw_type, definition_count).ok_or_else(|| {
                KiwiError::InvalidTypeReference {
                    definition: definition.name.clone(),
                    field:      field.name.clone(),
                    raw_type,
                }
            })?;
            field.type_ = Some(resolved);
        }
    }

    Ok(())
}

/// Every definition and field takes at least one byte, so a count larger than
/// what is left cannot be honest. Clamp the allocation to it.
fn capacity_hint(count: u64, bb: &ByteBuffer<'_>) -> usize {
    usize::try_from(count).unwrap_or(usize::MAX).min(bb.remaining())
}
