use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "banner")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub feature_id: i32,
    pub content_id: i32,
    pub is_active: bool,

    #[sea_orm(belongs_to, from = "feature_id", to = "id")]
    pub feature: BelongsTo<super::feature::Entity>,

    #[sea_orm(belongs_to, from = "content_id", to = "id")]
    pub content: BelongsTo<super::content::Entity>,

    #[sea_orm(has_many, via = "banner_tag")]
    pub tags: HasMany<super::tag::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
