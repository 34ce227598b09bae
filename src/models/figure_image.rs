use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "figure_images")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub figure_id: i32,
    pub url: String,
    pub is_thumbnail: bool,
    pub sort_order: i32,
    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::figure::Entity",
        from = "Column::FigureId",
        to = "super::figure::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Figure,
}

impl Related<super::figure::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Figure.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for crate::domain::figure::FigureImage {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            figure_id: model.figure_id,
            url: model.url,
            is_thumbnail: model.is_thumbnail,
            sort_order: model.sort_order,
        }
    }
}
