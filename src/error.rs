//! Error types for the library catalog

use thiserror::Error;
use uuid::Uuid;

use crate::models::EntityKind;

/// Main application error type.
///
/// Validation failures and delete guards are not errors: they come back as
/// [`FormOutcome`](crate::services::FormOutcome) and
/// [`DeleteOutcome`](crate::services::DeleteOutcome) so the caller can redisplay
/// the form or confirmation page.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Missing record of the given kind, e.g. "Book copy <id> not found"
    pub fn not_found(kind: EntityKind, id: Uuid) -> Self {
        AppError::NotFound(format!("{} {} not found", kind, id))
    }

    /// True when the request targeted a record that does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_names_the_kind() {
        let id = Uuid::nil();
        let err = AppError::not_found(EntityKind::BookInstance, id);
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), format!("Not found: Book copy {} not found", id));
    }
}
