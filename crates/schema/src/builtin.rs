//! The schema served in-process when no external endpoint is connected.

use std::path::Path;

use apollo_compiler::validation::Valid;
use apollo_compiler::Schema;

use crate::error::{diagnostic_messages, SchemaBuildError};

pub const BUILTIN_SDL: &str = include_str!("../data/builtin.graphql");

/// Sample requests shown alongside the built-in schema.
pub const EXAMPLE_QUERIES: &[&str] = &[
    "Show me all products with their categories",
    "Which products are out of stock?",
    "List every order with the customer name and total",
    "What has Alice Johnson ordered?",
    "Show the products in the Books category",
    "Cancel order order-4",
];

/// Parse and validate SDL into an executable schema.
pub fn parse_sdl(sdl: &str, path: impl AsRef<Path>) -> Result<Valid<Schema>, SchemaBuildError> {
    Schema::parse_and_validate(sdl, path)
        .map_err(|with_errors| SchemaBuildError::Invalid(diagnostic_messages(&with_errors.errors)))
}

pub fn builtin_schema() -> Result<Valid<Schema>, SchemaBuildError> {
    parse_sdl(BUILTIN_SDL, "builtin.graphql")
}
