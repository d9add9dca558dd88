use utoipa::OpenApi;

/// Aggregated OpenAPI documentation for the tasks API
#[derive(OpenApi)]
#[openapi(nest(
    (path = "/api/tasks", api = domain_tasks::handlers::ApiDoc)
))]
pub struct ApiDoc;
