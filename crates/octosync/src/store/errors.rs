use sea_orm::DbErr;
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from sea-orm.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// Record not found.
    #[error("Not found: {context}")]
    NotFound { context: String },

    /// Duplicate record (identity key conflict).
    #[error("Already exists: {context}")]
    Duplicate { context: String },

    /// Invalid input data.
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },
}

impl StoreError {
    /// Create a NotFound error for a node id lookup.
    pub fn not_found_by_node_id(entity: &str, node_id: &str) -> Self {
        Self::NotFound {
            context: format!("{entity} node_id={node_id}"),
        }
    }

    /// Create a NotFound error for a name lookup.
    pub fn not_found_by_name(entity: &str, name: &str) -> Self {
        Self::NotFound {
            context: format!("{entity} name={name}"),
        }
    }

    /// Create a Duplicate error for a node id conflict.
    pub fn duplicate_node_id(entity: &str, node_id: &str) -> Self {
        Self::Duplicate {
            context: format!("{entity} node_id={node_id}"),
        }
    }

    /// Create an InvalidInput error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
