use sea_orm::ConnectionTrait;

use super::error::BannerError;
use super::store::{self, Banner};

/// Resolve the banner whose stored tag set matches the request exactly.
///
/// The requested ids are normalized to ascending order, every banner hosted
/// by the feature is loaded (each already carrying its ascending tag
/// sequence), and the first exact sequence match wins. Subset and superset
/// matches never qualify. O(banners-for-feature x tags) per call; a feature
/// is expected to host few banners.
pub async fn resolve<C: ConnectionTrait>(
    db: &C,
    feature_id: i32,
    mut tag_ids: Vec<i32>,
) -> Result<Banner, BannerError> {
    tag_ids.sort_unstable();

    let candidates = store::find_by_feature(db, feature_id).await?;

    candidates
        .into_iter()
        .find(|banner| banner.tag_ids == tag_ids)
        .ok_or(BannerError::NoSuchBanner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{banner, banner_tag, content};
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};

    fn feature_with_two_banners() -> DatabaseConnection {
        let now = chrono::Utc::now();
        let banner_row = |id: i32, content_id: i32| banner::Model {
            id,
            feature_id: 1,
            content_id,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let content_row = |id: i32, title: &str| content::Model {
            id,
            title: title.into(),
            text: "x".into(),
            url: "http://u".into(),
        };
        let link = |banner_id: i32, tag_id: i32| banner_tag::Model { banner_id, tag_id };

        // Banner 1 carries tags {1,2}; banner 2 carries {1,2,3}.
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[banner_row(1, 10), banner_row(2, 20)]])
            .append_query_results([[content_row(10, "narrow"), content_row(20, "wide")]])
            .append_query_results([[
                link(1, 1),
                link(1, 2),
                link(2, 1),
                link(2, 2),
                link(2, 3),
            ]])
            .into_connection()
    }

    #[tokio::test]
    async fn exact_set_match_ignores_supersets() {
        let db = feature_with_two_banners();

        let found = resolve(&db, 1, vec![1, 2]).await.unwrap();
        assert_eq!(found.id, 1);
        assert_eq!(found.content.title, "narrow");
    }

    #[tokio::test]
    async fn request_order_is_irrelevant() {
        let db = feature_with_two_banners();

        let found = resolve(&db, 1, vec![3, 1, 2]).await.unwrap();
        assert_eq!(found.id, 2);
        assert_eq!(found.content.title, "wide");
    }

    #[tokio::test]
    async fn subset_request_does_not_match() {
        let db = feature_with_two_banners();

        let err = resolve(&db, 1, vec![1]).await.unwrap_err();
        assert!(matches!(err, BannerError::NoSuchBanner));
    }

    #[tokio::test]
    async fn feature_without_banners_is_a_miss() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<banner::Model>::new()])
            .into_connection();

        let err = resolve(&db, 99, vec![1, 2]).await.unwrap_err();
        assert!(matches!(err, BannerError::NoSuchBanner));
    }
}
