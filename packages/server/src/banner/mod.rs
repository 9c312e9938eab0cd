//! Banner resolution and persistence core.
//!
//! [`BannerService`] is the whole public contract: administrative CRUD over
//! the banner aggregate and the cached read path used by end-user lookups.
//! The HTTP layer hands it already-authenticated, already-parsed values and
//! renders whatever comes back.

pub mod cache;
pub mod error;
pub mod matcher;
pub mod store;
pub mod validator;

pub use cache::{CacheKey, RevisionCache};
pub use error::BannerError;
pub use store::{Banner, BannerContent, BannerPatch, NewBanner};

use std::sync::Arc;

use sea_orm::DatabaseConnection;

#[derive(Clone)]
pub struct BannerService {
    db: DatabaseConnection,
    cache: Arc<RevisionCache>,
}

impl BannerService {
    /// Wire the service to its persistence handle and the process-wide
    /// revision cache.
    pub fn new(db: DatabaseConnection, cache: Arc<RevisionCache>) -> Self {
        Self { db, cache }
    }

    /// Validate the feature and tag references, then persist the aggregate
    /// transactionally.
    pub async fn create_banner(&self, banner: NewBanner) -> Result<Banner, BannerError> {
        if banner.tag_ids.is_empty() {
            return Err(BannerError::Validation("tag_ids must not be empty".into()));
        }

        validator::validate_feature(&self.db, banner.feature_id).await?;
        validator::validate_tags(&self.db, &banner.tag_ids).await?;

        store::create(&self.db, banner).await
    }

    /// Apply a partial update. References are validated only for the
    /// attributes the patch actually supplies.
    pub async fn update_banner(&self, id: i32, patch: BannerPatch) -> Result<(), BannerError> {
        if let Some(ref tag_ids) = patch.tag_ids
            && tag_ids.is_empty()
        {
            return Err(BannerError::Validation("tag_ids must not be empty".into()));
        }

        if let Some(feature_id) = patch.feature_id {
            validator::validate_feature(&self.db, feature_id).await?;
        }
        if let Some(ref tag_ids) = patch.tag_ids {
            validator::validate_tags(&self.db, tag_ids).await?;
        }

        store::update(&self.db, id, patch).await
    }

    /// Delete the banner and everything it owns, returning the prior
    /// projection. The cached revision is left to age out.
    pub async fn delete_banner(&self, id: i32) -> Result<Banner, BannerError> {
        store::delete(&self.db, id).await
    }

    pub async fn list_banners(&self, offset: u64, limit: u64) -> Result<Vec<Banner>, BannerError> {
        store::list(&self.db, offset, limit).await
    }

    /// Resolve the banner for an exact (feature, tag-set) lookup.
    ///
    /// Without `use_last_revision` a live cache entry short-circuits the
    /// store; a miss resolves through the matcher and writes the envelope
    /// back. With `use_last_revision` the matcher always runs and the
    /// envelope is unconditionally refreshed. The visibility gate runs on
    /// every call, cached or fresh: inactive banners are visible to admins
    /// only.
    pub async fn resolve_banner(
        &self,
        feature_id: i32,
        tag_ids: Vec<i32>,
        use_last_revision: bool,
        is_admin: bool,
    ) -> Result<BannerContent, BannerError> {
        let key = CacheKey::new(feature_id, tag_ids);

        if !use_last_revision
            && let Some(revision) = self.cache.get(&key)
        {
            let content: BannerContent = serde_json::from_value(revision.payload)
                .map_err(|err| BannerError::CacheCorruption(err.to_string()))?;
            visibility_gate(revision.is_active, is_admin)?;
            return Ok(content);
        }

        let banner = matcher::resolve(&self.db, feature_id, key.tag_ids().to_vec()).await?;
        self.cache.insert(key, &banner.content, banner.is_active);

        visibility_gate(banner.is_active, is_admin)?;
        Ok(banner.content)
    }
}

/// Inactive banners are served to admins only.
fn visibility_gate(is_active: bool, is_admin: bool) -> Result<(), BannerError> {
    if !is_active && !is_admin {
        return Err(BannerError::Inactive);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{banner, banner_tag, content, feature, tag};
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
    use std::time::Duration;

    fn service(db: DatabaseConnection) -> BannerService {
        BannerService::new(db, Arc::new(RevisionCache::new(Duration::from_secs(300))))
    }

    fn content_model(id: i32, title: &str) -> content::Model {
        content::Model {
            id,
            title: title.into(),
            text: "x".into(),
            url: "http://u".into(),
        }
    }

    fn banner_model(id: i32, feature_id: i32, content_id: i32, is_active: bool) -> banner::Model {
        let now = chrono::Utc::now();
        banner::Model {
            id,
            feature_id,
            content_id,
            is_active,
            created_at: now,
            updated_at: now,
        }
    }

    fn links(banner_id: i32, tag_ids: &[i32]) -> Vec<banner_tag::Model> {
        tag_ids
            .iter()
            .map(|&tag_id| banner_tag::Model { banner_id, tag_id })
            .collect()
    }

    /// Create with tags [2,1], then resolve with the permuted set [1,2]: the
    /// created content comes back, and the second identical call is served
    /// from the cache without touching the store (the mock has no further
    /// result sets, so any extra read would miss).
    #[tokio::test]
    async fn round_trip_then_cached_resolve() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            // create: validator reads
            .append_query_results([[feature::Model { id: 1 }]])
            .append_query_results([[tag::Model { id: 1 }, tag::Model { id: 2 }]])
            // create: inserts
            .append_query_results([[content_model(7, "t")]])
            .append_query_results([[banner_model(3, 1, 7, true)]])
            // first resolve: store read
            .append_query_results([[banner_model(3, 1, 7, true)]])
            .append_query_results([[content_model(7, "t")]])
            .append_query_results([links(3, &[1, 2])])
            .append_exec_results([
                MockExecResult {
                    last_insert_id: 7,
                    rows_affected: 1,
                },
                MockExecResult {
                    last_insert_id: 3,
                    rows_affected: 1,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 2,
                },
            ])
            .into_connection();

        let service = service(db);

        let created = service
            .create_banner(NewBanner {
                feature_id: 1,
                tag_ids: vec![2, 1],
                content: BannerContent {
                    title: "t".into(),
                    text: "x".into(),
                    url: "http://u".into(),
                },
                is_active: true,
            })
            .await
            .unwrap();
        assert_eq!(created.tag_ids, vec![1, 2]);

        let first = service.resolve_banner(1, vec![1, 2], false, false).await.unwrap();
        assert_eq!(first.title, "t");
        assert_eq!(first.url, "http://u");

        let second = service.resolve_banner(1, vec![2, 1], false, false).await.unwrap();
        assert_eq!(second, first);
    }

    /// Bypass invokes the store even when the cache is populated, and the
    /// refreshed envelope is what later non-bypass reads observe.
    #[tokio::test]
    async fn bypass_always_hits_the_store_and_refreshes() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[banner_model(3, 1, 7, true)]])
            .append_query_results([[content_model(7, "v1")]])
            .append_query_results([links(3, &[1])])
            .append_query_results([[banner_model(3, 1, 7, true)]])
            .append_query_results([[content_model(7, "v2")]])
            .append_query_results([links(3, &[1])])
            .into_connection();

        let service = service(db);

        let v1 = service.resolve_banner(1, vec![1], true, false).await.unwrap();
        assert_eq!(v1.title, "v1");

        let v2 = service.resolve_banner(1, vec![1], true, false).await.unwrap();
        assert_eq!(v2.title, "v2");

        // No result sets left: this must be a cache hit.
        let cached = service.resolve_banner(1, vec![1], false, false).await.unwrap();
        assert_eq!(cached.title, "v2");
    }

    /// An admin and a non-admin reading the same cached envelope get
    /// different outcomes; the gate runs on every call.
    #[tokio::test]
    async fn visibility_gate_reevaluated_on_cache_hits() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[banner_model(3, 1, 7, false)]])
            .append_query_results([[content_model(7, "hidden")]])
            .append_query_results([links(3, &[1])])
            .into_connection();

        let service = service(db);

        let seen = service.resolve_banner(1, vec![1], false, true).await.unwrap();
        assert_eq!(seen.title, "hidden");

        let err = service.resolve_banner(1, vec![1], false, false).await.unwrap_err();
        assert!(matches!(err, BannerError::Inactive));

        let again = service.resolve_banner(1, vec![1], false, true).await.unwrap();
        assert_eq!(again.title, "hidden");
    }

    /// A create referencing an unknown tag fails validation before the
    /// store runs; nothing is written.
    #[tokio::test]
    async fn create_with_unknown_tag_writes_nothing() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[feature::Model { id: 1 }]])
            .append_query_results([[tag::Model { id: 1 }]])
            .into_connection();

        let service = BannerService::new(
            db.clone(),
            Arc::new(RevisionCache::new(Duration::from_secs(300))),
        );

        let err = service
            .create_banner(NewBanner {
                feature_id: 1,
                tag_ids: vec![1, 999],
                content: BannerContent {
                    title: "t".into(),
                    text: "x".into(),
                    url: "http://u".into(),
                },
                is_active: true,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, BannerError::NoSuchTag));

        let log = format!("{:?}", db.into_transaction_log());
        assert!(!log.contains("INSERT"));
    }

    /// A cached envelope that fails its shape check is fatal for the
    /// request; there is no silent fallback to the store.
    #[tokio::test]
    async fn corrupt_cached_payload_fails_the_request() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let cache = Arc::new(RevisionCache::new(Duration::from_secs(300)));
        cache.insert(CacheKey::new(1, vec![1]), &serde_json::json!({"nope": 1}), true);

        let service = BannerService::new(db, cache);

        let err = service.resolve_banner(1, vec![1], false, false).await.unwrap_err();
        assert!(matches!(err, BannerError::CacheCorruption(_)));
    }

    /// Resolving a lookup no banner satisfies is a miss, not an empty hit.
    #[tokio::test]
    async fn unmatched_lookup_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<banner::Model>::new()])
            .into_connection();

        let service = service(db);

        let err = service.resolve_banner(9, vec![1], false, false).await.unwrap_err();
        assert!(matches!(err, BannerError::NoSuchBanner));
    }

    /// An empty tag set in a patch is rejected before any validator or
    /// store round trip.
    #[tokio::test]
    async fn update_with_empty_tag_set_is_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let service = service(db);

        let err = service
            .update_banner(
                3,
                BannerPatch {
                    tag_ids: Some(Vec::new()),
                    is_active: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BannerError::Validation(_)));
    }
}
