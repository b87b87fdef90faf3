use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::error::Error;
use std::fmt::{Display, Formatter};

#[macro_export]
macro_rules! unauthorized_err {
    ($($arg:tt)*) => {
        $crate::error::TimeshiftError::new($crate::error::TimeshiftErrorKind::Unauthorized, format!($($arg)*))
    };
}

pub use unauthorized_err;

#[macro_export]
macro_rules! forbidden_err {
    ($($arg:tt)*) => {
        $crate::error::TimeshiftError::new($crate::error::TimeshiftErrorKind::Forbidden, format!($($arg)*))
    };
}

pub use forbidden_err;

#[macro_export]
macro_rules! not_found_err {
    ($($arg:tt)*) => {
        $crate::error::TimeshiftError::new($crate::error::TimeshiftErrorKind::NotFound, format!($($arg)*))
    };
}

pub use not_found_err;

#[macro_export]
macro_rules! bad_request_err {
    ($($arg:tt)*) => {
        $crate::error::TimeshiftError::new($crate::error::TimeshiftErrorKind::BadRequest, format!($($arg)*))
    };
}

pub use bad_request_err;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TimeshiftErrorKind {
    /// Missing or wrong side-channel credential.
    Unauthorized,
    /// Authenticated but insufficient access level.
    Forbidden,
    /// No matching channel or stream.
    NotFound,
    /// Unsupported feature, non-XC provider or upstream failure.
    BadRequest,
}

impl TimeshiftErrorKind {
    // Credential failures map to 403, the platform mixes 401 and 403 for
    // the same failure and we settle on one status.
    pub const fn status(self) -> StatusCode {
        match self {
            Self::Unauthorized | Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::BadRequest => StatusCode::BAD_REQUEST,
        }
    }
}

#[derive(Debug)]
pub struct TimeshiftError {
    pub kind: TimeshiftErrorKind,
    pub message: String,
}

impl TimeshiftError {
    pub const fn new(kind: TimeshiftErrorKind, message: String) -> Self {
        Self { kind, message }
    }
}

impl Display for TimeshiftError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Timeshift error: {}", self.message)
    }
}

impl Error for TimeshiftError {}

impl IntoResponse for TimeshiftError {
    fn into_response(self) -> Response {
        (self.kind.status(), self.message).into_response()
    }
}

/// Error raised by the host's settings storage, opaque to this plugin.
#[derive(Debug)]
pub struct SettingsError {
    pub message: String,
}

impl SettingsError {
    pub const fn new(message: String) -> Self {
        Self { message }
    }
}

impl Display for SettingsError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Settings error: {}", self.message)
    }
}

impl Error for SettingsError {}
