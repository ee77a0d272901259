pub mod auth;
pub mod log;
pub mod search;
pub mod task;
pub mod user;

pub use auth::*;
pub use log::*;
pub use search::*;
pub use task::*;
pub use user::*;

use crate::domain;
use crate::routing_utils::{BasicErrorResponse, ValidationErrorSchema};
use utoipa::OpenApi;

/// Schema definitions merged into the API documentation by
/// [swagger_main][crate::api::swagger_main]
#[derive(OpenApi)]
#[openapi(
    components(
        schemas(
            user::UserInput,
            user::UserOutput,
            task::TaskInput,
            task::TaskOutput,
            search::SearchRequest,
            auth::LoginRequest,
            auth::LoginSuccess,
            log::ChangeLogOutput,
            domain::user::Country,
            domain::task::TaskStatus,
            domain::auth::Role,
            ValidationErrorSchema,
        ),
        responses(BasicErrorResponse)
    )
)]
pub struct OpenApiSchemas;
