use std::backtrace::Backtrace;
use std::fmt::{Display, Formatter};

use axum::response::{IntoResponse, Response};
use axum::Json;
use http::status::StatusCode;
use serde_json::json;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub backtrace: Backtrace,
    pub user: Option<Uuid>,
}

impl std::error::Error for Error {}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            backtrace: Backtrace::capture(),
            user: None,
        }
    }

    pub fn new_with(kind: ErrorKind, user: Option<Uuid>) -> Self {
        Self {
            kind,
            backtrace: Backtrace::capture(),
            user,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(user) = self.user {
            write!(f, ", user: {}", user)?;
        }
        if self.backtrace.status() == std::backtrace::BacktraceStatus::Captured {
            write!(f, ", {}", self.backtrace)?;
        }
        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ErrorKind {
    #[error("unexpected error")]
    StdIoError(#[from] std::io::Error),

    #[error("unexpected error")]
    Unexpected,

    #[error("config error: {0}")]
    ConfigError(#[from] config::ConfigError),

    #[error("failed parsing value from string: {0}")]
    ParsingError(String),

    #[error("http error: {0}")]
    HttpError(#[from] http::Error),

    #[error("other error: {0}")]
    Other(String),

    #[error("bad input: {0}")]
    BadInput(String),

    #[error("forbidden")]
    Forbidden,

    #[error("authentication failed: {0}")]
    AuthFailed(String),
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("an account with that username already exists: {0}")]
    UserAlreadyExists(String),
    #[error("gallery not found for user: {0}")]
    GalleryNotFound(String),
    #[error("image not found in gallery: {0}")]
    ItemNotFound(Uuid),
    #[error("post not found: {0}")]
    PostNotFound(String),
    #[error("image is already posted: {0}")]
    AlreadyPosted(Uuid),

    #[error("db error: {0}")]
    DbError(String),

    #[error("sled db error: {0}")]
    SledError(#[from] sled::Error),
    #[error("sled transaction error: {0}")]
    SledTransactionError(#[from] sled::transaction::TransactionError<Box<ErrorKind>>),

    #[error("passwordhash error: {0}")]
    PasswordHashError(#[from] argon2::password_hash::Error),

    #[error("json decode error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("toml decode error: {0}")]
    TomlError(#[from] toml::de::Error),
    #[error("pot decode error: {0}")]
    PotError(#[from] pot::Error),

    #[error("uuid error: {0}")]
    UuidError(#[from] uuid::Error),
}

impl From<String> for Error {
    fn from(e: String) -> Self {
        Self::new(ErrorKind::Other(e))
    }
}

impl From<argon2::password_hash::Error> for Error {
    fn from(e: argon2::password_hash::Error) -> Self {
        Self::new(ErrorKind::PasswordHashError(e))
    }
}

impl From<uuid::Error> for Error {
    fn from(e: uuid::Error) -> Self {
        Self::new(ErrorKind::UuidError(e))
    }
}

impl From<sled::Error> for Error {
    fn from(e: sled::Error) -> Self {
        Self::new(ErrorKind::SledError(e))
    }
}

impl From<sled::transaction::TransactionError<Box<ErrorKind>>> for Error {
    fn from(e: sled::transaction::TransactionError<Box<ErrorKind>>) -> Self {
        match e {
            // aborts carry our own error kind, unwrap it back out
            sled::transaction::TransactionError::Abort(kind) => Self::new(*kind),
            e => Self::new(ErrorKind::SledTransactionError(e)),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::new(ErrorKind::JsonError(e))
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Self::new(ErrorKind::TomlError(e))
    }
}

impl From<pot::Error> for Error {
    fn from(e: pot::Error) -> Self {
        Self::new(ErrorKind::PotError(e))
    }
}

impl From<config::ConfigError> for Error {
    fn from(e: config::ConfigError) -> Self {
        Self::new(ErrorKind::ConfigError(e))
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::new(ErrorKind::StdIoError(e))
    }
}

impl From<ErrorKind> for Error {
    fn from(k: ErrorKind) -> Self {
        Self::new(k)
    }
}

fn json_error(status: StatusCode, message: impl AsRef<str>) -> Response {
    (status, Json(json!({ "error": message.as_ref() }))).into_response()
}

/// Implements conversion into a JSON response for all error variants.
///
/// Validation problems map to 400, missing records to 404, auth failures
/// to 401, identity mismatches to 403 and duplicate signups to 409.
/// Everything else is a 500 with a generic body; backtraces and user
/// context never leave the application logs.
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match &self.kind {
            ErrorKind::BadInput(_) | ErrorKind::ParsingError(_) => {
                tracing::trace!("{}", self.to_string());
                json_error(StatusCode::BAD_REQUEST, self.kind.to_string())
            }
            ErrorKind::Forbidden => {
                tracing::debug!("{}", self.to_string());
                json_error(StatusCode::FORBIDDEN, self.kind.to_string())
            }
            ErrorKind::AuthFailed(_) | ErrorKind::InvalidCredentials => {
                tracing::debug!("{}", self.to_string());
                json_error(StatusCode::UNAUTHORIZED, self.kind.to_string())
            }
            ErrorKind::UserAlreadyExists(_) | ErrorKind::AlreadyPosted(_) => {
                tracing::debug!("{}", self.to_string());
                json_error(StatusCode::CONFLICT, self.kind.to_string())
            }
            ErrorKind::GalleryNotFound(_)
            | ErrorKind::ItemNotFound(_)
            | ErrorKind::PostNotFound(_) => {
                tracing::debug!("{}", self.to_string());
                json_error(StatusCode::NOT_FOUND, self.kind.to_string())
            }
            _ => {
                tracing::error!("{}", self.to_string());
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
            }
        }
    }
}
