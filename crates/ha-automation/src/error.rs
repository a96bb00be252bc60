//! Codec errors
//!
//! Every failure is a deterministic function of the input object. Errors carry
//! enough context (discriminator, field, expected and actual type, list index)
//! to diagnose a bad document without re-parsing it.

use thiserror::Error;

use crate::registry::{FieldType, UnionKind};

/// Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors raised while decoding a Trigger, Condition or Action object
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    /// The object lacks the key that selects its variant
    #[error("{union} object did not have `{key}` key")]
    MissingDiscriminator { union: UnionKind, key: &'static str },

    /// The discriminator value (or, for actions, the key set) matches no variant
    #[error("no match for {union} {value}")]
    UnrecognizedVariant { union: UnionKind, value: String },

    /// A field's wire value cannot be coerced to its declared type
    #[error("{discriminator:?} expects {expected} for field {field}, but input had {actual}")]
    FieldTypeMismatch {
        discriminator: String,
        field: String,
        expected: FieldType,
        actual: String,
    },

    /// A nested condition list is not an array of objects
    #[error("{discriminator:?} field {field}{} was {actual}, not {}", index_suffix(.index), expected_shape(.index))]
    MalformedNestedList {
        discriminator: String,
        field: String,
        index: Option<usize>,
        actual: String,
    },

    /// Condition nesting went past the decoder's limit
    #[error("conditions nested deeper than the maximum of {max_depth}")]
    NestingTooDeep { max_depth: usize },

    /// A nested condition failed to decode
    #[error("{field} entry {index} could not be decoded as condition: {source}")]
    InCondition {
        field: String,
        index: usize,
        #[source]
        source: Box<CodecError>,
    },
}

fn index_suffix(index: &Option<usize>) -> String {
    index.map(|i| format!(" entry {i}")).unwrap_or_default()
}

fn expected_shape(index: &Option<usize>) -> &'static str {
    match index {
        Some(_) => "an object",
        None => "an array",
    }
}

/// Error kind, independent of nesting context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MissingDiscriminator,
    UnrecognizedVariant,
    FieldTypeMismatch,
    MalformedNestedList,
    NestingTooDeep,
}

impl CodecError {
    /// The innermost error, skipping nested-condition context
    pub fn root(&self) -> &CodecError {
        let mut err = self;
        while let CodecError::InCondition { source, .. } = err {
            err = source;
        }
        err
    }

    /// Kind of the innermost error
    pub fn kind(&self) -> ErrorKind {
        match self {
            CodecError::MissingDiscriminator { .. } => ErrorKind::MissingDiscriminator,
            CodecError::UnrecognizedVariant { .. } => ErrorKind::UnrecognizedVariant,
            CodecError::FieldTypeMismatch { .. } => ErrorKind::FieldTypeMismatch,
            CodecError::MalformedNestedList { .. } => ErrorKind::MalformedNestedList,
            CodecError::NestingTooDeep { .. } => ErrorKind::NestingTooDeep,
            CodecError::InCondition { source, .. } => source.kind(),
        }
    }

    /// Indices of the nested condition lists the error occurred in, outermost first
    pub fn path(&self) -> Vec<usize> {
        let mut path = Vec::new();
        let mut err = self;
        while let CodecError::InCondition { index, source, .. } = err {
            path.push(*index);
            err = source;
        }
        path
    }
}
