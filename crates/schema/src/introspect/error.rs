use serde::Serialize;
use thiserror::Error;

/// Which step of an introspection failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntrospectionErrorKind {
    Timeout,
    Network,
    Authentication,
    HttpStatus,
    InvalidJson,
    QueryErrors,
    MissingSchema,
    SchemaBuild,
}

/// Failure to introspect an external endpoint. Always surfaced to the caller.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct IntrospectionError {
    pub kind: IntrospectionErrorKind,
    pub message: String,
    pub endpoint: String,
    /// HTTP status, present only for authentication and status failures.
    pub status_code: Option<u16>,
}

impl IntrospectionError {
    pub(crate) fn new(
        kind: IntrospectionErrorKind,
        endpoint: &str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            endpoint: endpoint.to_string(),
            status_code: None,
        }
    }

    pub(crate) fn with_status(mut self, status: u16) -> Self {
        self.status_code = Some(status);
        self
    }
}
