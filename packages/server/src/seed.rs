use sea_orm::sea_query::{Index, PostgresQueryBuilder};
use sea_orm::*;
use tracing::info;

use crate::entity::banner;

/// Ensure required database indexes exist.
///
/// SeaORM's schema-sync doesn't create plain secondary indexes, so we create
/// them manually on startup.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Resolution loads every banner hosted by a feature:
    // SELECT ... FROM banner WHERE feature_id = ?
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_banner_feature_id")
        .table(banner::Entity)
        .col(banner::Column::FeatureId)
        .to_string(PostgresQueryBuilder);

    match db.execute_unprepared(&stmt).await {
        Ok(_) => {
            info!("Ensured index idx_banner_feature_id exists");
        }
        Err(e) => {
            tracing::warn!("Failed to create index idx_banner_feature_id: {}", e);
        }
    }

    Ok(())
}
