//! OpenAPI document for the HTTP API, browsable through Swagger UI.

use crate::server::{ServerRouter, routes::PostsApi};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub const SWAGGER_UI_PATH: &str = "/api/v1/docs/swagger";
pub const OPENAPI_JSON_PATH: &str = "/api/v1/docs/openapi.json";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bulletin API",
        description = "Create, read, update and soft-delete short text posts."
    ),
    nest((path = "/api/v1", api = PostsApi))
)]
pub struct ApiDoc;

pub fn routes() -> ServerRouter {
    SwaggerUi::new(SWAGGER_UI_PATH)
        .url(OPENAPI_JSON_PATH, ApiDoc::openapi())
        .into()
}
