use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::*;
use serde::{Deserialize, Serialize};

use crate::entity::{banner, banner_tag, content};

use super::error::BannerError;

/// Rendered payload of a banner, owned 1:1 by it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BannerContent {
    pub title: String,
    pub text: String,
    pub url: String,
}

/// A fully hydrated banner aggregate: the banner row, its content, and its
/// tag sequence read back from the association rows in ascending order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Banner {
    pub id: i32,
    pub feature_id: i32,
    pub tag_ids: Vec<i32>,
    pub content: BannerContent,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for [`create`]. Tag ids must be non-empty and duplicate-free; the
/// validator guarantees both before the store is reached.
#[derive(Clone, Debug)]
pub struct NewBanner {
    pub feature_id: i32,
    pub tag_ids: Vec<i32>,
    pub content: BannerContent,
    pub is_active: bool,
}

/// Partial update for [`update`]. `None` leaves the attribute unchanged;
/// `Some` rewrites it. A supplied tag set replaces the prior set in full.
/// `is_active` is rewritten on every update.
#[derive(Clone, Debug, Default)]
pub struct BannerPatch {
    pub feature_id: Option<i32>,
    pub tag_ids: Option<Vec<i32>>,
    pub title: Option<String>,
    pub text: Option<String>,
    pub url: Option<String>,
    pub is_active: bool,
}

/// Persist a new banner aggregate in one transaction: content first (its
/// generated id is embedded in the banner row), then the banner, then one
/// association row per tag. Any failure rolls the whole transaction back.
pub async fn create<C>(db: &C, new: NewBanner) -> Result<Banner, BannerError>
where
    C: ConnectionTrait + TransactionTrait,
{
    let mut tag_ids = new.tag_ids;
    tag_ids.sort_unstable();

    let txn = db.begin().await?;

    let content_row = content::ActiveModel {
        title: Set(new.content.title),
        text: Set(new.content.text),
        url: Set(new.content.url),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let now = chrono::Utc::now();
    let banner_row = banner::ActiveModel {
        feature_id: Set(new.feature_id),
        content_id: Set(content_row.id),
        is_active: Set(new.is_active),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let links = tag_ids.iter().map(|&tag_id| banner_tag::ActiveModel {
        banner_id: Set(banner_row.id),
        tag_id: Set(tag_id),
    });
    banner_tag::Entity::insert_many(links).exec(&txn).await?;

    txn.commit().await?;

    Ok(Banner {
        id: banner_row.id,
        feature_id: banner_row.feature_id,
        tag_ids,
        content: BannerContent {
            title: content_row.title,
            text: content_row.text,
            url: content_row.url,
        },
        is_active: banner_row.is_active,
        created_at: banner_row.created_at,
        updated_at: banner_row.updated_at,
    })
}

/// Apply a partial update in one transaction. `is_active` and `updated_at`
/// are always rewritten; `feature_id` and the content fields only when the
/// patch supplies them; a supplied tag set deletes all prior association
/// rows and inserts the new set. First failure aborts and rolls back.
pub async fn update<C>(db: &C, id: i32, patch: BannerPatch) -> Result<(), BannerError>
where
    C: ConnectionTrait + TransactionTrait,
{
    let txn = db.begin().await?;

    let existing = banner::Entity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or(BannerError::NoSuchBanner)?;
    let content_id = existing.content_id;

    let mut active: banner::ActiveModel = existing.into();
    active.is_active = Set(patch.is_active);
    active.updated_at = Set(chrono::Utc::now());
    if let Some(feature_id) = patch.feature_id {
        active.feature_id = Set(feature_id);
    }
    active.update(&txn).await?;

    if patch.title.is_some() || patch.text.is_some() || patch.url.is_some() {
        let mut content_active = content::ActiveModel {
            id: Set(content_id),
            ..Default::default()
        };
        if let Some(title) = patch.title {
            content_active.title = Set(title);
        }
        if let Some(text) = patch.text {
            content_active.text = Set(text);
        }
        if let Some(url) = patch.url {
            content_active.url = Set(url);
        }
        content_active.update(&txn).await?;
    }

    if let Some(mut tag_ids) = patch.tag_ids {
        tag_ids.sort_unstable();

        banner_tag::Entity::delete_many()
            .filter(banner_tag::Column::BannerId.eq(id))
            .exec(&txn)
            .await?;

        let links = tag_ids.iter().map(|&tag_id| banner_tag::ActiveModel {
            banner_id: Set(id),
            tag_id: Set(tag_id),
        });
        banner_tag::Entity::insert_many(links).exec(&txn).await?;
    }

    txn.commit().await?;
    Ok(())
}

/// Delete a banner and everything it owns (association rows and the content
/// row) in one transaction, returning the prior projection.
pub async fn delete<C>(db: &C, id: i32) -> Result<Banner, BannerError>
where
    C: ConnectionTrait + TransactionTrait,
{
    let txn = db.begin().await?;

    let row = banner::Entity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or(BannerError::NoSuchBanner)?;
    let content_id = row.content_id;

    let prior = hydrate(&txn, vec![row])
        .await?
        .pop()
        .ok_or(BannerError::NoSuchBanner)?;

    banner_tag::Entity::delete_many()
        .filter(banner_tag::Column::BannerId.eq(id))
        .exec(&txn)
        .await?;
    banner::Entity::delete_by_id(id).exec(&txn).await?;
    content::Entity::delete_by_id(content_id).exec(&txn).await?;

    txn.commit().await?;
    Ok(prior)
}

/// List banner aggregates ordered by feature id.
pub async fn list<C: ConnectionTrait>(
    db: &C,
    offset: u64,
    limit: u64,
) -> Result<Vec<Banner>, BannerError> {
    let rows = banner::Entity::find()
        .order_by_asc(banner::Column::FeatureId)
        .offset(Some(offset))
        .limit(Some(limit))
        .all(db)
        .await?;

    hydrate(db, rows).await
}

/// Load every banner aggregate hosted by a feature. Backs the matcher.
pub async fn find_by_feature<C: ConnectionTrait>(
    db: &C,
    feature_id: i32,
) -> Result<Vec<Banner>, BannerError> {
    let rows = banner::Entity::find()
        .filter(banner::Column::FeatureId.eq(feature_id))
        .all(db)
        .await?;

    hydrate(db, rows).await
}

/// Attach content and ascending tag sequences to raw banner rows.
async fn hydrate<C: ConnectionTrait>(
    db: &C,
    rows: Vec<banner::Model>,
) -> Result<Vec<Banner>, BannerError> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let content_ids: Vec<i32> = rows.iter().map(|row| row.content_id).collect();
    let banner_ids: Vec<i32> = rows.iter().map(|row| row.id).collect();

    let contents: HashMap<i32, content::Model> = content::Entity::find()
        .filter(content::Column::Id.is_in(content_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|row| (row.id, row))
        .collect();

    let mut tag_ids_by_banner: HashMap<i32, Vec<i32>> = HashMap::new();
    let links = banner_tag::Entity::find()
        .filter(banner_tag::Column::BannerId.is_in(banner_ids))
        .order_by_asc(banner_tag::Column::TagId)
        .all(db)
        .await?;
    for link in links {
        tag_ids_by_banner
            .entry(link.banner_id)
            .or_default()
            .push(link.tag_id);
    }

    rows.into_iter()
        .map(|row| {
            let content = contents.get(&row.content_id).ok_or_else(|| {
                BannerError::Transaction(DbErr::RecordNotFound(format!(
                    "content {} for banner {}",
                    row.content_id, row.id
                )))
            })?;

            Ok(Banner {
                id: row.id,
                feature_id: row.feature_id,
                tag_ids: tag_ids_by_banner.remove(&row.id).unwrap_or_default(),
                content: BannerContent {
                    title: content.title.clone(),
                    text: content.text.clone(),
                    url: content.url.clone(),
                },
                is_active: row.is_active,
                created_at: row.created_at,
                updated_at: row.updated_at,
            })
        })
        .collect()
}
