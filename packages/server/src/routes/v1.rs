use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/banner", banner_routes())
        .nest("/user_banner", user_banner_routes())
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/user_register", post(handlers::auth::register_user))
        .route("/admin_register", post(handlers::auth::register_admin))
        .route("/login", post(handlers::auth::login))
}

fn banner_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::banner::list_banners).post(handlers::banner::create_banner),
        )
        .route(
            "/{id}",
            patch(handlers::banner::update_banner).delete(handlers::banner::delete_banner),
        )
}

fn user_banner_routes() -> Router<AppState> {
    Router::new().route("/", get(handlers::user_banner::get_user_banner))
}
