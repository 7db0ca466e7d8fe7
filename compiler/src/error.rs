use kiwigen_codec::BoundsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KiwiError {
    #[error("failed to read {context}: {source}")]
    Bounds {
        context: &'static str,
        source:  BoundsError,
    },

    #[error("invalid definition kind {kind} for definition {definition:?}")]
    InvalidDefinitionKind {
        definition: String,
        kind:       u8,
    },

    #[error("invalid type {raw_type} for field {field:?} of definition {definition:?}")]
    InvalidTypeReference {
        definition: String,
        field:      String,
        raw_type:   i64,
    },

    #[error("field {field:?} of definition {definition:?} has no resolved type")]
    UnresolvedField {
        definition: String,
        field:      String,
    },

    #[error("invalid extra field {0}: expected StructName:FieldName:FieldType")]
    InvalidExtraField(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Wraps a short read with what was being decoded when it happened.
pub(crate) fn bounds(context: &'static str) -> impl FnOnce(BoundsError) -> KiwiError {
    move |source| KiwiError::Bounds { context, source }
}
