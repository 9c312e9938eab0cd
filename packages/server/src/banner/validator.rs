use sea_orm::*;

use crate::entity::{feature, tag};

use super::error::BannerError;

/// Confirm the feature exists in the registry.
pub async fn validate_feature<C: ConnectionTrait>(
    db: &C,
    feature_id: i32,
) -> Result<(), BannerError> {
    feature::Entity::find_by_id(feature_id)
        .one(db)
        .await
        .map_err(|_| BannerError::NoSuchFeature)?
        .ok_or(BannerError::NoSuchFeature)?;

    Ok(())
}

/// Confirm every requested tag exists in the registry.
///
/// Fetches the tags by id and compares the sorted returned id set against
/// the sorted requested set; a count mismatch (which also covers duplicate
/// ids in the request) or any differing id fails with `NoSuchTag`.
pub async fn validate_tags<C: ConnectionTrait>(
    db: &C,
    tag_ids: &[i32],
) -> Result<(), BannerError> {
    let found = tag::Entity::find()
        .filter(tag::Column::Id.is_in(tag_ids.iter().copied()))
        .order_by_asc(tag::Column::Id)
        .all(db)
        .await
        .map_err(|_| BannerError::NoSuchTag)?;

    if found.len() != tag_ids.len() {
        return Err(BannerError::NoSuchTag);
    }

    let mut requested = tag_ids.to_vec();
    requested.sort_unstable();

    let found_ids: Vec<i32> = found.into_iter().map(|row| row.id).collect();
    if requested != found_ids {
        return Err(BannerError::NoSuchTag);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn feature_present_passes() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[feature::Model { id: 1 }]])
            .into_connection();

        assert!(validate_feature(&db, 1).await.is_ok());
    }

    #[tokio::test]
    async fn feature_absent_fails() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<feature::Model>::new()])
            .into_connection();

        let err = validate_feature(&db, 7).await.unwrap_err();
        assert!(matches!(err, BannerError::NoSuchFeature));
    }

    #[tokio::test]
    async fn all_tags_present_passes_in_any_request_order() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[tag::Model { id: 1 }, tag::Model { id: 2 }]])
            .into_connection();

        assert!(validate_tags(&db, &[2, 1]).await.is_ok());
    }

    #[tokio::test]
    async fn missing_tag_fails_on_count() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[tag::Model { id: 1 }]])
            .into_connection();

        let err = validate_tags(&db, &[1, 999]).await.unwrap_err();
        assert!(matches!(err, BannerError::NoSuchTag));
    }

    #[tokio::test]
    async fn duplicate_request_ids_fail() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[tag::Model { id: 1 }]])
            .into_connection();

        let err = validate_tags(&db, &[1, 1]).await.unwrap_err();
        assert!(matches!(err, BannerError::NoSuchTag));
    }
}
