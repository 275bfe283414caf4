mod v1;

use axum::Router;
use axum::routing::get;
use utoipa_axum::router::OpenApiRouter;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn api_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest("/v1", v1::routes(config))
}

/// The Maven repository tree. Registered as a plain route because of the
/// catch-all segment; `HEAD` is answered by the same handler.
pub fn repository_routes() -> Router<AppState> {
    Router::new().route(
        "/repository/{*path}",
        get(handlers::repository::get_repository_file),
    )
}
