use thiserror::Error;

/// Error for UserId parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UserIdError {
    #[error("Invalid UUID format: {0}")]
    InvalidFormat(String),
}

/// Error for Username validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UsernameError {
    #[error("Username must not be empty")]
    Empty,
}

/// Error for Twitter identifier validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TwitterIdError {
    #[error("Twitter id must not be empty")]
    Empty,
}

/// Top-level error for all user record operations
#[derive(Debug, Clone, Error)]
pub enum UserError {
    #[error("Invalid username: {0}")]
    InvalidUsername(#[from] UsernameError),

    #[error("Invalid Twitter id: {0}")]
    InvalidTwitterId(#[from] TwitterIdError),

    #[error("User record {0} has neither local nor Twitter credentials")]
    MissingIdentity(String),

    #[error("User not found: {0}")]
    NotFound(String),

    #[error("Username already exists: {0}")]
    UsernameAlreadyExists(String),

    #[error("Twitter account already linked: {0}")]
    TwitterIdAlreadyLinked(String),

    // Infrastructure errors
    #[error("Database error: {0}")]
    DatabaseError(String),
}
