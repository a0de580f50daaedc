//! Error types for the editor

use thiserror::Error;
use treetext_model::ModelError;

pub type EditorResult<T> = Result<T, EditorError>;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<treetext_model::SchemaError> for EditorError {
    fn from(e: treetext_model::SchemaError) -> Self {
        EditorError::Model(e.into())
    }
}
