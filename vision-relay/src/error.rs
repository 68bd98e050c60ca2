//! Error types for the relay.

use axum::http::StatusCode;
use serde_json::{json, Value};

use crate::config::ConfigurationError;

/// Coarse classification of a failed invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MethodNotAllowed,
    InvalidInput,
    Configuration,
    UpstreamTimeout,
    UpstreamError,
    Internal,
}

impl ErrorKind {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorKind::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorKind::Configuration => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            ErrorKind::UpstreamError => StatusCode::BAD_GATEWAY,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MethodNotAllowed => "method_not_allowed",
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::Configuration => "configuration",
            ErrorKind::UpstreamTimeout => "upstream_timeout",
            ErrorKind::UpstreamError => "upstream_error",
            ErrorKind::Internal => "internal",
        }
    }
}

/// Error types for a relay invocation.
///
/// The display strings are the messages returned to the caller.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Method Not Allowed")]
    MethodNotAllowed,

    #[error("Dados em falta na requisição.")]
    MissingFields,

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("A API demorou demasiado a responder (Timeout).")]
    UpstreamTimeout,

    #[error("Erro na comunicação com a API do Hugging Face: {message}")]
    Upstream {
        message: String,
        /// Upstream response body, when one was received.
        details: Option<String>,
    },

    #[error("Ocorreu um erro interno: {0}")]
    Internal(String),
}

impl Error {
    pub fn upstream(message: impl Into<String>) -> Self {
        Error::Upstream {
            message: message.into(),
            details: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MethodNotAllowed => ErrorKind::MethodNotAllowed,
            Error::MissingFields => ErrorKind::InvalidInput,
            Error::Configuration(_) => ErrorKind::Configuration,
            Error::UpstreamTimeout => ErrorKind::UpstreamTimeout,
            Error::Upstream { .. } => ErrorKind::UpstreamError,
            Error::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.kind().status()
    }

    /// JSON body returned to the caller.
    pub fn to_body(&self) -> Value {
        match self {
            Error::Upstream {
                details: Some(details),
                ..
            } => json!({ "error": self.to_string(), "details": details }),
            _ => json!({ "error": self.to_string() }),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
