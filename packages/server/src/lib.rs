pub mod banner;
pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod seed;
pub mod state;
pub mod utils;

use axum::http::HeaderValue;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_scalar::{Scalar, Servable as ScalarServable};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::CorsConfig;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Banner Service API",
        version = "1.0.0",
        description = "Feature-flagged promotional banners selected by an exact (feature, tag-set) match"
    ),
    paths(
        handlers::auth::register_user,
        handlers::auth::register_admin,
        handlers::auth::login,
        handlers::banner::list_banners,
        handlers::banner::create_banner,
        handlers::banner::update_banner,
        handlers::banner::delete_banner,
        handlers::user_banner::get_user_banner,
    ),
    components(schemas(
        error::ErrorBody,
        models::auth::RegisterRequest,
        models::auth::RegisterResponse,
        models::auth::LoginRequest,
        models::auth::LoginResponse,
        models::banner::CreateBannerRequest,
        models::banner::CreateBannerResponse,
        models::banner::UpdateBannerRequest,
        models::banner::BannerResponse,
        models::banner::BannerContentResponse,
    )),
    tags(
        (name = "Auth", description = "Registration, login, and token issuance"),
        (name = "Banners", description = "Banner administration and user-facing resolution"),
    ),
    modifiers(&SecurityAddon),
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_default();
        components.add_security_scheme(
            "jwt",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allow_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(config.max_age))
}

/// Build the application router.
pub fn build_router(state: AppState) -> axum::Router {
    let cors = cors_layer(&state.config.server.cors);

    axum::Router::new()
        .nest("/api", routes::api_routes())
        .layer(cors)
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
}
