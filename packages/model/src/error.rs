//! Error types for the document model

use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

/// Invalid schema definitions and nodes the schema does not allow
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("root node not defined")]
    MissingRoot,

    #[error("invalid node type: {0}")]
    InvalidNodeType(String),

    #[error("malformed input: {0}")]
    Malformed(String),

    #[error("cannot create {0} from a value")]
    NotImplemented(String),
}

/// Broken parent/child links and unresolvable positions
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StructureError {
    #[error("node does not have a parent")]
    NoParent,

    #[error("node is not in the parent")]
    NotInParent,

    #[error("node is not in the container")]
    NotInContainer,

    #[error("node does not exist in this tree")]
    UnknownNode,

    #[error("node is already attached to a parent")]
    AlreadyAttached,

    #[error("would create cycle")]
    CycleDetected,

    #[error("path is empty")]
    EmptyPath,

    #[error("child index {index} out of bounds (len {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("offset {offset} out of bounds (len {len})")]
    OffsetOutOfBounds { offset: usize, len: usize },

    #[error("node is not an element")]
    NotAnElement,

    #[error("range start is after range end")]
    InvertedRange,

    #[error("range boundaries do not share a parent")]
    UnbalancedRange,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Structure error: {0}")]
    Structure(#[from] StructureError),

    #[error("Not implemented: {0}")]
    NotImplemented(&'static str),
}
