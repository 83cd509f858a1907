pub mod analysis;
pub mod builtin;
pub mod error;
pub mod introspect;
pub mod render;
pub mod validate;

pub use analysis::{analyze, AnalysisSummary, OperationKind, SchemaAnalysis};
pub use builtin::{builtin_schema, parse_sdl, BUILTIN_SDL, EXAMPLE_QUERIES};
pub use error::SchemaBuildError;
pub use introspect::{
    IntrospectionCache, IntrospectionError, IntrospectionErrorKind, IntrospectionOptions,
    IntrospectionResult, Introspector,
};
pub use render::render_context;
pub use validate::{validate, validated_document, ValidationError, ValidationOutcome};

/// Re-exported so dependents can name schema types without a direct dependency.
pub use apollo_compiler;
