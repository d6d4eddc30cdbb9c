//! Error types for the relation layer
//!
//! Boot-time errors (`MissingLocalKey`, `MissingForeignKey`) describe a schema
//! mismatch and are never retried. Query-time errors (`MissingSelectedKey`,
//! `MissingLocalKeyValue`) are caused by the caller's column selection and are
//! surfaced before anything is attached to a parent.

use thiserror::Error;

/// Result type alias for relation operations
pub type ModelResult<T> = Result<T, ModelError>;

/// Error types for relation and preload operations
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ModelError {
    /// The resolved local key is not a declared field on the declaring model
    #[error("Missing local key '{key}' on model '{model}' for relation '{relation}'")]
    MissingLocalKey {
        model: String,
        relation: String,
        key: String,
    },

    /// The resolved foreign key is not a declared field on the related (or through) model
    #[error("Missing foreign key '{key}' on model '{model}' for relation '{relation}'")]
    MissingForeignKey {
        model: String,
        relation: String,
        key: String,
    },

    /// A batch query cannot group rows because its key column was not selected
    #[error("Cannot preload '{relation}': the key column '{key}' was excluded from the selected columns")]
    MissingSelectedKey { relation: String, key: String },

    /// A parent instance has no value for the key a relation needs
    #[error("Cannot preload '{relation}': value of '{model}.{key}' is undefined. Make sure '{key}' is selected")]
    MissingLocalKeyValue {
        model: String,
        relation: String,
        key: String,
    },

    /// Mutation is not defined for this relation kind
    #[error("Cannot save or create through '{relation}': {kind} relations are read-only")]
    RelationSaveUnsupported { relation: String, kind: String },

    /// A model name could not be resolved in the registry
    #[error("Model '{0}' is not registered")]
    UnknownModel(String),

    /// A relation name is not declared on the model
    #[error("Relation '{relation}' is not defined on model '{model}'")]
    UnknownRelation { model: String, relation: String },

    /// The requested connection name is not configured
    #[error("Connection '{0}' is not configured")]
    UnknownConnection(String),

    /// A dotted preload path is malformed or too deep
    #[error("Invalid preload path: {0}")]
    InvalidPreloadPath(String),

    /// Database connection or query error
    #[error("Database error: {0}")]
    Database(String),

    /// Query building error
    #[error("Query error: {0}")]
    Query(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Schema declaration error (invalid identifiers, duplicate columns)
    #[error("Schema error: {0}")]
    Schema(String),
}

impl ModelError {
    /// Returns true for errors detected while booting a relation
    pub fn is_boot_error(&self) -> bool {
        matches!(
            self,
            ModelError::MissingLocalKey { .. } | ModelError::MissingForeignKey { .. }
        )
    }
}

// Convert from sqlx errors
impl From<sqlx::Error> for ModelError {
    fn from(err: sqlx::Error) -> Self {
        ModelError::Database(err.to_string())
    }
}

// Convert from serde_json errors
impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boot_errors_name_model_and_key() {
        let err = ModelError::MissingForeignKey {
            model: "Post".to_string(),
            relation: "posts".to_string(),
            key: "userId".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("Post"));
        assert!(message.contains("userId"));
        assert!(err.is_boot_error());
    }

    #[test]
    fn test_query_errors_are_not_boot_errors() {
        let err = ModelError::MissingLocalKeyValue {
            model: "User".to_string(),
            relation: "posts".to_string(),
            key: "id".to_string(),
        };
        assert!(!err.is_boot_error());
        assert!(err.to_string().contains("User.id"));
    }

    #[test]
    fn test_serde_error_conversion() {
        let err: ModelError = serde_json::from_str::<i64>("not a number").unwrap_err().into();
        assert!(matches!(err, ModelError::Serialization(_)));
    }
}
