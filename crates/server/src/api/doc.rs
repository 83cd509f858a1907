//! OpenAPI documentation aggregator, served via Scalar UI at `/docs`.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "nlgql API",
        version = "0.1.0",
        description = "Natural-language to GraphQL: generation, validation, execution and endpoint introspection.",
    ),
    tags(
        (name = "Health", description = "Server liveness and active configuration"),
        (name = "Query", description = "Natural-language query pipeline"),
        (name = "Schema", description = "Active schema analysis and endpoint switching"),
    ),
    paths(
        crate::api::health::health,
        crate::api::ai_query::ai_query,
        crate::api::endpoint::connect_endpoint,
        crate::api::endpoint::disconnect_endpoint,
        crate::api::schema_info::schema_info,
    ),
    components(schemas(
        crate::api::health::HealthResponse,
        crate::api::ai_query::AiQueryRequest,
        crate::api::endpoint::ConnectRequest,
        crate::api::endpoint::ConnectResponse,
        crate::api::endpoint::ConnectErrorResponse,
        crate::api::endpoint::DisconnectResponse,
        crate::api::schema_info::SchemaInfoResponse,
        nlgql_orchestrator::AiQueryResponse,
        nlgql_orchestrator::QueryStep,
        nlgql_orchestrator::ValidationStatus,
    ))
)]
pub struct ApiDoc;
