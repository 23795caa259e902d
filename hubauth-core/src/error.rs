use crate::http::response::{IntoResponse, Response};
use crate::http::{Json, StatusCode};

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Helper to create a JSON error response with a standard `{ "error": message }` body.
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let body = serde_json::json!({ "error": message.into() });
    (status, Json(body)).into_response()
}

/// Which class of failure stopped an operation module from starting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or missing configuration, detected before any network call.
    Configuration,
    /// The identity provider's discovery endpoint failed or returned garbage.
    Discovery,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Configuration => write!(f, "configuration error"),
            ErrorKind::Discovery => write!(f, "discovery error"),
        }
    }
}

/// Error returned by an [`OperationModule`](crate::OperationModule) that
/// failed to construct.
///
/// Carries a kind tag so callers can tell configuration mistakes from
/// provider outages without parsing messages, plus the underlying cause.
#[derive(Debug)]
pub struct ModuleError {
    kind: ErrorKind,
    message: String,
    source: Option<BoxError>,
}

impl ModuleError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    pub fn discovery(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Discovery, message)
    }

    /// Attach the lower-level error that caused this one.
    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ModuleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ModuleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// The only error [`Controller::new`](crate::Controller::new) returns.
///
/// Names the module that failed and keeps its [`ModuleError`] as the source,
/// so the full causal chain survives. The process must not serve traffic
/// after receiving one.
#[derive(Debug)]
pub struct InitializationError {
    module: String,
    cause: ModuleError,
}

impl InitializationError {
    pub fn new(module: impl Into<String>, cause: ModuleError) -> Self {
        Self {
            module: module.into(),
            cause,
        }
    }

    /// Name of the module whose construction failed.
    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn kind(&self) -> ErrorKind {
        self.cause.kind()
    }

    pub fn cause(&self) -> &ModuleError {
        &self.cause
    }

    pub fn into_cause(self) -> ModuleError {
        self.cause
    }
}

impl std::fmt::Display for InitializationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "failed to initialize {} operations: {}",
            self.module, self.cause
        )
    }
}

impl std::error::Error for InitializationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.cause)
    }
}

/// Request-time error returned by REST handlers.
pub enum HttpError {
    BadRequest(String),
    NotFound(String),
    Unauthorized(String),
    /// An upstream dependency (e.g. the identity provider) failed.
    BadGateway(String),
    Internal(String),
    Custom {
        status: StatusCode,
        body: serde_json::Value,
    },
}

impl HttpError {
    fn status(&self) -> StatusCode {
        match self {
            HttpError::BadRequest(_) => StatusCode::BAD_REQUEST,
            HttpError::NotFound(_) => StatusCode::NOT_FOUND,
            HttpError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            HttpError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            HttpError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            HttpError::Custom { status, .. } => *status,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            HttpError::Custom { body, .. } => (status, Json(body)).into_response(),
            HttpError::BadRequest(msg)
            | HttpError::NotFound(msg)
            | HttpError::Unauthorized(msg)
            | HttpError::BadGateway(msg)
            | HttpError::Internal(msg) => error_response(status, msg),
        }
    }
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpError::BadRequest(msg) => write!(f, "Bad Request: {msg}"),
            HttpError::NotFound(msg) => write!(f, "Not Found: {msg}"),
            HttpError::Unauthorized(msg) => write!(f, "Unauthorized: {msg}"),
            HttpError::BadGateway(msg) => write!(f, "Bad Gateway: {msg}"),
            HttpError::Internal(msg) => write!(f, "Internal Error: {msg}"),
            HttpError::Custom { status, body } => write!(f, "Custom Error ({status}): {body}"),
        }
    }
}

impl std::fmt::Debug for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        <Self as std::fmt::Display>::fmt(self, f)
    }
}

impl From<crate::storage::StorageError> for HttpError {
    fn from(err: crate::storage::StorageError) -> Self {
        HttpError::Internal(err.to_string())
    }
}
