use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "figures")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub name_en: Option<String>,
    pub name_ja: Option<String>,
    pub manufacturer_id: Option<i32>,
    pub series_id: Option<i32>,
    pub character_id: Option<i32>,
    pub category_id: Option<i32>,
    pub scale_id: Option<i32>,
    pub size: Option<String>,
    pub material: Option<String>,
    pub sculptors: Option<String>,  // JSON array
    pub paint_work: Option<String>, // JSON array
    /// `YYYY-MM-DD` literal; not guaranteed to be a calendar date
    pub release_date: Option<String>,
    #[sea_orm(default_value = "unknown")]
    pub release_precision: String,
    pub price_krw: Option<i64>,
    pub price_jpy: Option<i64>,
    pub price_usd: Option<f64>,
    pub description: Option<String>,
    pub specification: Option<String>,
    pub is_limited: bool,
    pub is_adult: bool,
    pub created_by: Option<i32>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::figure_image::Entity")]
    Images,
    #[sea_orm(has_many = "super::acquisition::Entity")]
    Acquisitions,
}

impl Related<super::figure_image::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Images.def()
    }
}

impl Related<super::acquisition::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Acquisitions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
