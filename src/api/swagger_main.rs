use crate::dto;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(info(
    title = "Taskboard REST API",
    description = "CRUD over tasks and their owning users, with token-based login"
))]
struct TaskboardApi;

/// Constructs the route on the API that renders the swagger UI and returns the OpenAPI schema.
/// Merges in OpenAPI definitions from other locations in the app, such as the [dto] package.
pub fn build_documentation() -> SwaggerUi {
    let mut api_docs = TaskboardApi::openapi();
    api_docs.merge(dto::OpenApiSchemas::openapi());

    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api_docs)
}
