//! Business logic. Handlers stay thin and delegate here.

pub mod issuance;
pub mod operators;
pub mod pricing;
pub mod products;
pub mod reports;
pub mod restocks;
pub mod stock;

use crate::errors::ServiceError;
use sea_orm::{sqlx, DbErr, RuntimeErr, SqlErr};
use tracing::{error, warn};

/// Error codes for a transaction the database aborted to break a deadlock or
/// a serialization clash (Postgres), or because the file was busy (SQLite).
const LOCK_CONFLICT_CODES: [&str; 4] = ["40P01", "40001", "5", "517"];

fn is_lock_conflict_code(code: &str) -> bool {
    LOCK_CONFLICT_CODES.contains(&code)
}

fn is_lock_conflict(err: &DbErr) -> bool {
    match err {
        DbErr::Exec(RuntimeErr::SqlxError(sqlx::Error::Database(db)))
        | DbErr::Query(RuntimeErr::SqlxError(sqlx::Error::Database(db)))
        | DbErr::Conn(RuntimeErr::SqlxError(sqlx::Error::Database(db))) => db
            .code()
            .is_some_and(|code| is_lock_conflict_code(&code)),
        _ => false,
    }
}

fn lock_conflict(err: &DbErr, what: &str) -> ServiceError {
    warn!(error = %err, entity = what, "transaction aborted by a concurrent writer");
    ServiceError::ConcurrentModification(format!(
        "{} was changed by a concurrent request; retry the request",
        what
    ))
}

/// Maps a failed write. Unique-key violations and aborted transactions
/// become a 409.
pub(crate) fn write_error(err: DbErr, what: &str) -> ServiceError {
    if let Some(SqlErr::UniqueConstraintViolation(detail)) = err.sql_err() {
        return ServiceError::Conflict(format!("{} already exists ({})", what, detail));
    }
    if is_lock_conflict(&err) {
        return lock_conflict(&err, what);
    }
    error!(error = %err, entity = what, "database write failed");
    ServiceError::DatabaseError(err)
}

/// Logs a failed read and wraps it.
pub(crate) fn read_error(err: DbErr, what: &str) -> ServiceError {
    if is_lock_conflict(&err) {
        return lock_conflict(&err, what);
    }
    error!(error = %err, entity = what, "database read failed");
    ServiceError::DatabaseError(err)
}

pub(crate) fn commit_error(err: DbErr, what: &str) -> ServiceError {
    if is_lock_conflict(&err) {
        return lock_conflict(&err, what);
    }
    error!(error = %err, entity = what, "transaction commit failed");
    ServiceError::DatabaseError(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn deadlock_and_serialization_codes_are_conflicts() {
        assert!(is_lock_conflict_code("40P01"));
        assert!(is_lock_conflict_code("40001"));
        assert!(is_lock_conflict_code("5"));
        // unique violation is handled separately, other failures stay 500
        assert!(!is_lock_conflict_code("23505"));
        assert!(!is_lock_conflict_code("08006"));
    }

    #[test]
    fn other_database_failures_stay_internal() {
        let err = write_error(DbErr::Custom("disk full".into()), "issue");
        assert_matches!(err, ServiceError::DatabaseError(_));
        assert!(!err.is_retryable());

        let err = commit_error(DbErr::Custom("connection reset".into()), "issue");
        assert_matches!(err, ServiceError::DatabaseError(_));
    }
}
