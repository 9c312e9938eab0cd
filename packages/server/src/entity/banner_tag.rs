use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "banner_tag")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub banner_id: i32,
    #[sea_orm(primary_key)]
    pub tag_id: i32,

    #[sea_orm(belongs_to, from = "banner_id", to = "id")]
    pub banner: BelongsTo<super::banner::Entity>,
    #[sea_orm(belongs_to, from = "tag_id", to = "id")]
    pub tag: BelongsTo<super::tag::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
