//! Server startup: shared state initialization and the listen loop.

use std::sync::Arc;

use nlgql_core::Config;
use nlgql_execution::CatalogResolver;
use nlgql_llm::{AiProvider, ChatAiProvider};
use nlgql_orchestrator::{ActiveSchema, QueryOrchestrator, SchemaContext};
use nlgql_schema::{IntrospectionCache, Introspector};
use tracing::{info, warn};

use crate::router::build_router;
use crate::state::AppState;

/// Build `AppState`: built-in schema, demo resolver, introspector and AI provider.
pub fn build_app_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let builtin = ActiveSchema::builtin()?;
    info!(
        "Built-in schema ready ({} types, {} entry points)",
        builtin.analysis.types.len(),
        builtin.analysis.entry_points.len()
    );

    let resolver = Arc::new(CatalogResolver::sample()?);
    let introspector = Introspector::new(
        config.introspection.timeout(),
        Arc::new(IntrospectionCache::new(config.introspection.cache_ttl())),
    );
    let schema = Arc::new(SchemaContext::new(
        builtin,
        resolver,
        introspector,
        config.execution.remote_timeout(),
    ));

    let orchestrator = match ChatAiProvider::from_config(config) {
        Ok(provider) => {
            info!("AI provider ready: {}", provider.name());
            Some(QueryOrchestrator::new(Arc::new(provider)))
        }
        Err(e) => {
            warn!("AI provider not available: {}; POST /ai-query will be disabled", e);
            None
        }
    };

    Ok(Arc::new(AppState {
        config: config.clone(),
        schema,
        orchestrator,
    }))
}

pub async fn serve(config: &Config) -> anyhow::Result<()> {
    config.log_summary();
    let state = build_app_state(config)?;
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://localhost:{}", config.server.port);
    info!("API docs at http://localhost:{}/docs", config.server.port);
    axum::serve(listener, app).await?;

    Ok(())
}
