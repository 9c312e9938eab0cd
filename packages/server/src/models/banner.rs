use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::banner::{Banner, BannerContent, BannerPatch, NewBanner};
use crate::error::AppError;

use super::shared::validate_id_list;

pub const DEFAULT_OFFSET: u64 = 0;
pub const DEFAULT_LIMIT: u64 = 100;

const TITLE_MAX: usize = 256;
const TEXT_MAX: usize = 10_000;
const URL_MAX: usize = 2_048;

#[derive(Deserialize, ToSchema)]
pub struct CreateBannerRequest {
    /// Tags the banner is shown under. The set must match a lookup exactly.
    #[schema(example = json!([1, 2]))]
    pub tag_ids: Vec<i32>,
    /// Feature the banner belongs to.
    #[schema(example = 1)]
    pub feature_id: i32,
    pub title: String,
    pub text: String,
    #[schema(example = "https://example.com/promo")]
    pub url: String,
    #[serde(default)]
    pub is_active: bool,
}

/// PATCH body. Absent fields are left unchanged; a supplied tag set replaces
/// the prior set in full. `is_active` is rewritten on every update.
#[derive(Deserialize, Default, ToSchema)]
pub struct UpdateBannerRequest {
    pub tag_ids: Option<Vec<i32>>,
    pub feature_id: Option<i32>,
    pub title: Option<String>,
    pub text: Option<String>,
    pub url: Option<String>,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Serialize, ToSchema)]
pub struct BannerResponse {
    pub banner_id: i32,
    pub tag_ids: Vec<i32>,
    pub feature_id: i32,
    pub title: String,
    pub text: String,
    pub url: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, ToSchema)]
pub struct CreateBannerResponse {
    /// ID of the newly created banner.
    #[schema(example = 7)]
    pub banner_id: i32,
}

/// Rendered banner payload served to end users.
#[derive(Serialize, ToSchema)]
pub struct BannerContentResponse {
    pub title: String,
    pub text: String,
    pub url: String,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListBannersQuery {
    /// Number of banners to skip (default 0).
    pub offset: Option<u64>,
    /// Maximum number of banners to return (default 100).
    pub limit: Option<u64>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserBannerQuery {
    /// Feature to look the banner up under.
    pub feature_id: i32,
    /// Comma-separated tag ids, e.g. `1,2,3`. Order is irrelevant.
    pub tag_ids: String,
    /// Skip the cache and force a fresh resolution.
    pub use_last_revision: Option<bool>,
}

impl From<Banner> for BannerResponse {
    fn from(banner: Banner) -> Self {
        Self {
            banner_id: banner.id,
            tag_ids: banner.tag_ids,
            feature_id: banner.feature_id,
            title: banner.content.title,
            text: banner.content.text,
            url: banner.content.url,
            is_active: banner.is_active,
            created_at: banner.created_at,
            updated_at: banner.updated_at,
        }
    }
}

impl From<BannerContent> for BannerContentResponse {
    fn from(content: BannerContent) -> Self {
        Self {
            title: content.title,
            text: content.text,
            url: content.url,
        }
    }
}

impl From<CreateBannerRequest> for NewBanner {
    fn from(req: CreateBannerRequest) -> Self {
        Self {
            feature_id: req.feature_id,
            tag_ids: req.tag_ids,
            content: BannerContent {
                title: req.title.trim().to_string(),
                text: req.text,
                url: req.url,
            },
            is_active: req.is_active,
        }
    }
}

impl From<UpdateBannerRequest> for BannerPatch {
    fn from(req: UpdateBannerRequest) -> Self {
        Self {
            feature_id: req.feature_id,
            tag_ids: req.tag_ids,
            title: req.title.map(|t| t.trim().to_string()),
            text: req.text,
            url: req.url,
            is_active: req.is_active,
        }
    }
}

pub fn validate_create_banner(req: &CreateBannerRequest) -> Result<(), AppError> {
    if req.feature_id < 1 {
        return Err(AppError::Validation("feature_id must be positive".into()));
    }
    validate_id_list(&req.tag_ids, "tag_id")?;
    validate_title(&req.title)?;
    validate_text(&req.text)?;
    validate_url(&req.url)?;
    Ok(())
}

pub fn validate_update_banner(req: &UpdateBannerRequest) -> Result<(), AppError> {
    if let Some(feature_id) = req.feature_id
        && feature_id < 1
    {
        return Err(AppError::Validation("feature_id must be positive".into()));
    }
    if let Some(ref tag_ids) = req.tag_ids {
        validate_id_list(tag_ids, "tag_id")?;
    }
    if let Some(ref title) = req.title {
        validate_title(title)?;
    }
    if let Some(ref text) = req.text {
        validate_text(text)?;
    }
    if let Some(ref url) = req.url {
        validate_url(url)?;
    }
    Ok(())
}

fn validate_title(title: &str) -> Result<(), AppError> {
    let title = title.trim();
    if title.is_empty() || title.chars().count() > TITLE_MAX {
        return Err(AppError::Validation(
            "Title must be 1-256 characters".into(),
        ));
    }
    Ok(())
}

fn validate_text(text: &str) -> Result<(), AppError> {
    if text.trim().is_empty() || text.len() > TEXT_MAX {
        return Err(AppError::Validation(
            "Text must be non-empty and at most 10000 bytes".into(),
        ));
    }
    Ok(())
}

fn validate_url(url: &str) -> Result<(), AppError> {
    if url.len() > URL_MAX || !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(AppError::Validation(
            "Url must be an http(s) URL of at most 2048 bytes".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_req() -> CreateBannerRequest {
        CreateBannerRequest {
            tag_ids: vec![1, 2],
            feature_id: 1,
            title: "t".into(),
            text: "x".into(),
            url: "http://u".into(),
            is_active: true,
        }
    }

    #[test]
    fn create_request_happy_path() {
        assert!(validate_create_banner(&create_req()).is_ok());
    }

    #[test]
    fn create_request_rejects_bad_fields() {
        let mut req = create_req();
        req.feature_id = 0;
        assert!(validate_create_banner(&req).is_err());

        let mut req = create_req();
        req.tag_ids = vec![];
        assert!(validate_create_banner(&req).is_err());

        let mut req = create_req();
        req.url = "ftp://u".into();
        assert!(validate_create_banner(&req).is_err());

        let mut req = create_req();
        req.title = "   ".into();
        assert!(validate_create_banner(&req).is_err());
    }

    #[test]
    fn update_request_checks_only_supplied_fields() {
        let req = UpdateBannerRequest {
            text: Some("new".into()),
            ..Default::default()
        };
        assert!(validate_update_banner(&req).is_ok());

        let req = UpdateBannerRequest {
            url: Some("nope".into()),
            ..Default::default()
        };
        assert!(validate_update_banner(&req).is_err());

        let req = UpdateBannerRequest {
            tag_ids: Some(vec![1, 1]),
            ..Default::default()
        };
        assert!(validate_update_banner(&req).is_err());
    }

    #[test]
    fn patch_mapping_keeps_absent_fields_unset() {
        let patch: BannerPatch = UpdateBannerRequest {
            text: Some("new".into()),
            is_active: true,
            ..Default::default()
        }
        .into();

        assert_eq!(patch.text.as_deref(), Some("new"));
        assert!(patch.title.is_none());
        assert!(patch.url.is_none());
        assert!(patch.feature_id.is_none());
        assert!(patch.tag_ids.is_none());
        assert!(patch.is_active);
    }
}
