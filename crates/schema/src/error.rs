use apollo_compiler::validation::DiagnosticList;
use thiserror::Error;

/// Failure to turn SDL into a valid schema.
#[derive(Debug, Error)]
pub enum SchemaBuildError {
    #[error("{}", .0.join("; "))]
    Invalid(Vec<String>),
}

impl SchemaBuildError {
    pub fn messages(&self) -> &[String] {
        match self {
            Self::Invalid(messages) => messages,
        }
    }
}

/// Plain messages of a diagnostic list, without source snippets.
pub(crate) fn diagnostic_messages(errors: &DiagnosticList) -> Vec<String> {
    errors.iter().map(|diag| diag.to_json().message).collect()
}
