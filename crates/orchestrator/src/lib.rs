pub mod context;
pub mod orchestrator;
pub mod step;

pub use context::{ActiveSchema, SchemaContext, SchemaSource};
pub use orchestrator::{looks_like_graphql, OrchestrationError, QueryOrchestrator, MAX_RETRIES};
pub use step::{AiQueryResponse, QueryStep, ValidationStatus};
