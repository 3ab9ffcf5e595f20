use thiserror::Error;

use crate::types::Tier;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(rusqlite::Error),

    #[error("not found")]
    NotFound,

    #[error("already exists")]
    AlreadyExists,

    #[error("token lookup collision")]
    TokenLookupCollision,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden")]
    Forbidden,

    #[error("invalid token format")]
    InvalidTokenFormat,

    #[error("token expired")]
    TokenExpired,

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("content limit reached: {count} of {limit} items on the {tier} tier")]
    QuotaExceeded { tier: Tier, count: i64, limit: i64 },

    #[error("storage error: {0}")]
    Storage(String),
}

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        match e {
            rusqlite::Error::SqliteFailure(ref err, _)
                if err.code == rusqlite::ErrorCode::ConstraintViolation
                    && err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                Error::AlreadyExists
            }
            e => Error::Database(e),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
