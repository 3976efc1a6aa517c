//! Operator REST API: route handlers, DTOs, and router composition.
//!
//! Guild endpoints are mounted under `/api/v1`. With the `swagger-ui`
//! feature the OpenAPI document is served at `/swagger-ui`.

pub mod dto;
pub mod handlers;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI document of the operator surface.
#[derive(Debug, OpenApi)]
#[openapi(
    info(title = "voice-forge", description = "Operator API of the voice channel bot"),
    paths(
        handlers::system::health_handler,
        handlers::guild::list_settings,
        handlers::guild::list_channels,
    ),
    components(schemas(
        dto::SettingDto,
        dto::SettingsResponse,
        dto::CreatedChannelDto,
        dto::ChannelsResponse,
        handlers::system::HealthResponse,
        crate::error::ErrorResponse,
        crate::error::ErrorBody,
    ))
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
}
