use rusqlite::ErrorCode;
use thiserror::Error;

/// Failures of repository operations. Expected outcomes (`NotFound`,
/// `Conflict`, `Validation`) are handled by callers; `Pool` and `Sql` are
/// storage faults.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("SQL error: {0}")]
    Sql(rusqlite::Error),

    #[error("Not found")]
    NotFound,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation failed: {0}")]
    Validation(String),
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(ErrorCode::ConstraintViolation) => RepositoryError::Conflict(err.to_string()),
            _ => RepositoryError::Sql(err),
        }
    }
}

pub type RepoResult<T> = Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn unique_violation_is_conflict() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (name TEXT UNIQUE); INSERT INTO t VALUES ('a');")
            .unwrap();
        let err: RepositoryError = conn
            .execute("INSERT INTO t VALUES ('a')", [])
            .unwrap_err()
            .into();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[test]
    fn syntax_error_is_sql() {
        let conn = Connection::open_in_memory().unwrap();
        let err: RepositoryError = conn.execute("SELEC nonsense", []).unwrap_err().into();
        assert!(matches!(err, RepositoryError::Sql(_)));
    }
}
