//! Two-phase query validation: syntax first, then semantics against a schema.

use apollo_compiler::ast;
use apollo_compiler::validation::Valid;
use apollo_compiler::{ExecutableDocument, Schema};
use serde::Serialize;

use crate::error::diagnostic_messages;

const QUERY_PATH: &str = "query.graphql";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationErrorKind {
    Syntax,
    Validation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
}

impl ValidationOutcome {
    fn ok() -> Self {
        Self { valid: true, errors: Vec::new() }
    }

    fn failed(errors: Vec<ValidationError>) -> Self {
        Self { valid: false, errors }
    }

    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.message.clone()).collect()
    }
}

/// Parse and validate `query`, keeping the executable document on success.
///
/// A syntax failure yields exactly one error; semantic validation reports all of them.
pub fn validated_document(
    schema: &Valid<Schema>,
    query: &str,
) -> Result<Valid<ExecutableDocument>, ValidationOutcome> {
    let document = match ast::Document::parse(query, QUERY_PATH) {
        Ok(doc) => doc,
        Err(with_errors) => {
            let message = diagnostic_messages(&with_errors.errors)
                .into_iter()
                .next()
                .unwrap_or_else(|| "Syntax Error: unable to parse query".to_string());
            return Err(ValidationOutcome::failed(vec![ValidationError {
                kind: ValidationErrorKind::Syntax,
                message,
            }]));
        }
    };

    document.to_executable_validate(schema).map_err(|with_errors| {
        let errors = diagnostic_messages(&with_errors.errors)
            .into_iter()
            .map(|message| ValidationError { kind: ValidationErrorKind::Validation, message })
            .collect();
        ValidationOutcome::failed(errors)
    })
}

/// Validate `query` against `schema`. Never panics; every failure is in the outcome.
pub fn validate(schema: &Valid<Schema>, query: &str) -> ValidationOutcome {
    match validated_document(schema, query) {
        Ok(_) => ValidationOutcome::ok(),
        Err(outcome) => outcome,
    }
}
