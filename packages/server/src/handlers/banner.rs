use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::banner::*;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/v1/banner",
    tag = "Banners",
    operation_id = "listBanners",
    summary = "List all banners",
    description = "Returns banner aggregates ordered by feature id. Admin only.",
    params(ListBannersQuery),
    responses(
        (status = 200, description = "List of banners", body = Vec<BannerResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_banners(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListBannersQuery>,
) -> Result<Json<Vec<BannerResponse>>, AppError> {
    auth_user.require_admin()?;

    let offset = query.offset.unwrap_or(DEFAULT_OFFSET);
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, 1_000);

    let banners = state.banners.list_banners(offset, limit).await?;

    Ok(Json(banners.into_iter().map(BannerResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/v1/banner",
    tag = "Banners",
    operation_id = "createBanner",
    summary = "Create a new banner",
    description = "Creates the banner aggregate (content, feature and tag associations) in one transaction. The referenced feature and every tag must exist. Admin only.",
    request_body = CreateBannerRequest,
    responses(
        (status = 201, description = "Banner created", body = CreateBannerResponse),
        (status = 400, description = "Validation error or unknown feature/tag (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(feature_id = payload.feature_id))]
pub async fn create_banner(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateBannerRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_admin()?;
    validate_create_banner(&payload)?;

    let created = state.banners.create_banner(payload.into()).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateBannerResponse {
            banner_id: created.id,
        }),
    ))
}

#[utoipa::path(
    patch,
    path = "/api/v1/banner/{id}",
    tag = "Banners",
    operation_id = "updateBanner",
    summary = "Update an existing banner",
    description = "Partial update: absent fields are left unchanged, a supplied tag set replaces the prior set in full, and `is_active` is rewritten on every call. Admin only.",
    params(("id" = i32, Path, description = "Banner ID")),
    request_body = UpdateBannerRequest,
    responses(
        (status = 200, description = "Banner updated"),
        (status = 400, description = "Validation error or unknown feature/tag (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Banner not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_banner(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateBannerRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_admin()?;
    validate_update_banner(&payload)?;

    state.banners.update_banner(id, payload.into()).await?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    delete,
    path = "/api/v1/banner/{id}",
    tag = "Banners",
    operation_id = "deleteBanner",
    summary = "Delete a banner",
    description = "Deletes the banner together with its content and tag associations in one transaction. Admin only.",
    params(("id" = i32, Path, description = "Banner ID")),
    responses(
        (status = 204, description = "Banner deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Banner not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_banner(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_admin()?;

    state.banners.delete_banner(id).await?;

    Ok(StatusCode::NO_CONTENT)
}
