use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for JanK Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::terms::list_terms,
        crate::routes::terms::create_term,
        crate::routes::terms::delete_term,
        crate::routes::websocket::ws_handler,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::term::CreateTermRequest,
            crate::dto::term::TermResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "terms", description = "Catalogue of secret terms"),
        (name = "players", description = "WebSocket operations for player devices"),
    )
)]
pub struct ApiDoc;
