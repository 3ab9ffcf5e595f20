mod helpers;
mod middleware;
mod token;

pub use helpers::{TokenValidationError, ValidatedToken, validate_token};
pub use middleware::{AuthError, RequireAccount};
pub use token::{
    SESSION_TOKEN_TTL_DAYS, TokenGenerator, hash_password, parse_token, verify_password,
};
