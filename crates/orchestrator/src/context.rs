//! The schema currently answering queries, and switching between schemas.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use nlgql_execution::{ExecutionBackend, LocalBackend, RemoteBackend, Resolver};
use nlgql_schema::apollo_compiler::validation::Valid;
use nlgql_schema::apollo_compiler::Schema;
use nlgql_schema::{
    analyze, builtin_schema, render_context, IntrospectionError, IntrospectionOptions,
    Introspector, SchemaAnalysis, SchemaBuildError, BUILTIN_SDL,
};
use tracing::info;

/// Where the active schema came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaSource {
    BuiltIn,
    Remote {
        endpoint: String,
        /// Forwarded on every proxied query.
        headers: HashMap<String, String>,
    },
}

/// Schema, SDL, analysis and rendered prompt context, always swapped together.
pub struct ActiveSchema {
    pub schema: Arc<Valid<Schema>>,
    pub sdl: String,
    pub analysis: SchemaAnalysis,
    pub llm_context: String,
    pub source: SchemaSource,
}

impl fmt::Debug for ActiveSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveSchema")
            .field("source", &self.source)
            .field("types", &self.analysis.types.len())
            .finish()
    }
}

impl ActiveSchema {
    pub fn new(schema: Arc<Valid<Schema>>, sdl: impl Into<String>, source: SchemaSource) -> Self {
        let analysis = analyze(&schema);
        let llm_context = render_context(&analysis);
        Self {
            schema,
            sdl: sdl.into(),
            analysis,
            llm_context,
            source,
        }
    }

    /// The bundled demo catalog schema.
    pub fn builtin() -> Result<Self, SchemaBuildError> {
        Ok(Self::new(
            Arc::new(builtin_schema()?),
            BUILTIN_SDL,
            SchemaSource::BuiltIn,
        ))
    }

    pub fn endpoint(&self) -> Option<&str> {
        match &self.source {
            SchemaSource::BuiltIn => None,
            SchemaSource::Remote { endpoint, .. } => Some(endpoint),
        }
    }

    pub fn is_builtin(&self) -> bool {
        self.source == SchemaSource::BuiltIn
    }
}

/// Process-wide holder of the active schema.
///
/// Readers take an `Arc` snapshot; connect/disconnect swap the whole snapshot.
pub struct SchemaContext {
    active: RwLock<Arc<ActiveSchema>>,
    builtin: Arc<ActiveSchema>,
    resolver: Arc<dyn Resolver>,
    introspector: Introspector,
    remote_timeout: Duration,
}

impl SchemaContext {
    /// Start on `builtin`, resolved locally by `resolver`.
    pub fn new(
        builtin: ActiveSchema,
        resolver: Arc<dyn Resolver>,
        introspector: Introspector,
        remote_timeout: Duration,
    ) -> Self {
        let builtin = Arc::new(builtin);
        Self {
            active: RwLock::new(Arc::clone(&builtin)),
            builtin,
            resolver,
            introspector,
            remote_timeout,
        }
    }

    pub fn snapshot(&self) -> Arc<ActiveSchema> {
        Arc::clone(&self.active.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn replace(&self, next: Arc<ActiveSchema>) {
        *self.active.write().unwrap_or_else(PoisonError::into_inner) = next;
    }

    /// Introspect `endpoint` and make it the active schema.
    ///
    /// On failure the active schema is left as it was.
    pub async fn connect(
        &self,
        endpoint: &str,
        headers: HashMap<String, String>,
    ) -> Result<Arc<ActiveSchema>, IntrospectionError> {
        let options = IntrospectionOptions::new(endpoint).with_headers(headers.clone());
        let result = self.introspector.introspect(&options).await?;

        let next = Arc::new(ActiveSchema::new(
            Arc::clone(&result.schema),
            result.sdl.clone(),
            SchemaSource::Remote {
                endpoint: endpoint.to_string(),
                headers,
            },
        ));
        self.replace(Arc::clone(&next));

        info!(
            endpoint,
            types = next.analysis.types.len(),
            "active schema switched to endpoint"
        );
        Ok(next)
    }

    /// Restore the built-in schema.
    pub fn disconnect(&self) {
        self.replace(Arc::clone(&self.builtin));
        info!("active schema restored to built-in");
    }

    /// Local executor for the built-in schema, HTTP proxy for a connected endpoint.
    pub fn backend_for(&self, active: &ActiveSchema) -> Box<dyn ExecutionBackend> {
        match &active.source {
            SchemaSource::BuiltIn => Box::new(LocalBackend::new(
                Arc::clone(&active.schema),
                Arc::clone(&self.resolver),
            )),
            SchemaSource::Remote { endpoint, headers } => Box::new(
                RemoteBackend::new(endpoint.clone(), headers.clone())
                    .with_timeout(self.remote_timeout),
            ),
        }
    }
}
