use axum::Json;
use axum::extract::{Query, State};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::banner::{BannerContentResponse, UserBannerQuery};
use crate::models::shared::parse_id_list;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/v1/user_banner",
    tag = "Banners",
    operation_id = "getUserBanner",
    summary = "Resolve the banner for a feature and tag set",
    description = "Returns the content of the banner whose tag set matches the request exactly. Served from the revision cache unless `use_last_revision` is set, in which case the cache is refreshed. Inactive banners are visible to admins only.",
    params(UserBannerQuery),
    responses(
        (status = 200, description = "Banner content", body = BannerContentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Banner inactive (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "No matching banner (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(feature_id = query.feature_id))]
pub async fn get_user_banner(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<UserBannerQuery>,
) -> Result<Json<BannerContentResponse>, AppError> {
    let tag_ids = parse_id_list(&query.tag_ids)?;

    let content = state
        .banners
        .resolve_banner(
            query.feature_id,
            tag_ids,
            query.use_last_revision.unwrap_or(false),
            auth_user.is_admin,
        )
        .await?;

    Ok(Json(content.into()))
}
