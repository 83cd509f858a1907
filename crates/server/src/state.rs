use std::sync::Arc;

use nlgql_core::Config;
use nlgql_orchestrator::{QueryOrchestrator, SchemaContext};

pub struct AppState {
    pub config: Config,
    pub schema: Arc<SchemaContext>,
    /// `None` when no AI provider is configured; `/ai-query` then answers 503.
    pub orchestrator: Option<QueryOrchestrator>,
}
