use rusqlite::ffi;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("username already taken")]
    DuplicateUsername,

    #[error("message content is empty")]
    ContentEmpty,

    #[error("user {0} does not exist")]
    OwnerNotFound(i64),

    #[error("DB lock poisoned: {0}")]
    LockPoisoned(String),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Extended SQLite result code of a constraint failure, if that is what `err` is.
pub(crate) fn constraint_code(err: &rusqlite::Error) -> Option<i32> {
    match err {
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation => {
            Some(e.extended_code)
        }
        _ => None,
    }
}

pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    constraint_code(err) == Some(ffi::SQLITE_CONSTRAINT_UNIQUE)
}

pub(crate) fn is_foreign_key_violation(err: &rusqlite::Error) -> bool {
    constraint_code(err) == Some(ffi::SQLITE_CONSTRAINT_FOREIGNKEY)
}
