use sqlx::error::ErrorKind;

use crate::application::repos::RepoError;

/// SQLSTATE raised when `statement_timeout` cancels a query.
const QUERY_CANCELED: &str = "57014";

/// Classify a driver error into the storage errors the services distinguish.
pub fn map_sqlx_error(err: sqlx::Error) -> RepoError {
    match err {
        sqlx::Error::Database(db) => {
            if db.code().as_deref() == Some(QUERY_CANCELED) {
                return RepoError::Timeout;
            }
            match db.kind() {
                ErrorKind::UniqueViolation
                | ErrorKind::ForeignKeyViolation
                | ErrorKind::NotNullViolation
                | ErrorKind::CheckViolation => RepoError::Integrity {
                    message: db.message().to_string(),
                },
                _ => RepoError::from_persistence(db),
            }
        }
        sqlx::Error::PoolTimedOut => RepoError::Timeout,
        other => RepoError::from_persistence(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_exhaustion_is_a_timeout() {
        assert!(matches!(
            map_sqlx_error(sqlx::Error::PoolTimedOut),
            RepoError::Timeout
        ));
    }

    #[test]
    fn other_driver_errors_are_persistence_failures() {
        let mapped = map_sqlx_error(sqlx::Error::RowNotFound);
        assert!(matches!(mapped, RepoError::Persistence(message) if message.contains("no rows")));
    }
}
