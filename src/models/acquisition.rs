use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "acquisitions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub figure_id: i32,
    pub shop_id: Option<i32>,
    /// Lifecycle status.
    /// Valid values:
    /// - `reserved`: Pre-ordered, usually with a deposit
    /// - `ordered`: Bought, waiting for delivery
    /// - `owned`: In the collection
    pub status: String,
    pub total_price: i64,
    pub deposit_price: Option<i64>,
    // Milestone dates (YYYY-MM-DD); presence = milestone reached
    pub deposit_paid_at: Option<String>,
    pub balance_paid_at: Option<String>,
    pub paid_at: Option<String>,
    pub delivered_at: Option<String>,
    pub memo: Option<String>,
    pub created_at: String,
    pub updated_at: String,
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
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::figure::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Figure.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
