use thiserror::Error;

/// All errors that can occur in shelfwise-core.
#[derive(Debug, Error)]
pub enum ShelfError {
    #[error("Book not found: {0}")]
    BookNotFound(String),

    #[error("Review not found: {0}")]
    ReviewNotFound(String),

    #[error("Reading challenge not found: {0}")]
    ChallengeNotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl ShelfError {
    /// Whether the error means "the referenced entity does not exist".
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::BookNotFound(_) | Self::ReviewNotFound(_) | Self::ChallengeNotFound(_)
        )
    }

    /// Process exit code the CLI reports for this error.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            e if e.is_not_found() => ExitCode::NotFound,
            Self::ValidationError(_) => ExitCode::InvalidArgs,
            _ => ExitCode::GeneralError,
        }
    }
}

/// Exit codes used by the `shelfwise` binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    NotFound = 2,
    InvalidArgs = 3,
    ConfirmRequired = 8,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

pub type Result<T> = std::result::Result<T, ShelfError>;
