//! SeaORM implementation of AcquisitionRepository

use async_trait::async_trait;
use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::domain::acquisition::{
    Acquisition, AcquisitionPatch, AcquisitionStatus, TrackedFigure, validate_amounts,
};
use crate::domain::figure::MasterKind;
use crate::domain::{AcquisitionRepository, CreateAcquisitionInput, DomainError};
use crate::models::acquisition::{self, ActiveModel, Column, Entity as AcquisitionEntity};
use crate::models::figure;

use super::figure_repository::summaries;
use super::master_data_repository::find_entry;

/// SeaORM-based implementation of AcquisitionRepository
pub struct SeaOrmAcquisitionRepository {
    db: DatabaseConnection,
}

impl SeaOrmAcquisitionRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find_model(&self, user_id: i32, id: i32) -> Result<acquisition::Model, DomainError> {
        AcquisitionEntity::find_by_id(id)
            .filter(Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or(DomainError::NotFound)
    }

    async fn check_shop(&self, shop_id: Option<i32>) -> Result<(), DomainError> {
        if let Some(shop_id) = shop_id
            && find_entry(&self.db, MasterKind::Shop, shop_id).await?.is_none()
        {
            return Err(DomainError::Validation(format!("Unknown shop id {}", shop_id)));
        }
        Ok(())
    }

    async fn track(&self, models: Vec<acquisition::Model>) -> Result<Vec<TrackedFigure>, DomainError> {
        let mut figure_ids: Vec<i32> = models.iter().map(|m| m.figure_id).collect();
        figure_ids.sort_unstable();
        figure_ids.dedup();
        let figures = summaries(&self.db, figure_ids).await?;

        let mut tracked = Vec::with_capacity(models.len());
        for model in models {
            let Some(figure) = figures.get(&model.figure_id).cloned() else {
                tracing::warn!(
                    "Acquisition {} references missing figure {}",
                    model.id,
                    model.figure_id
                );
                continue;
            };
            tracked.push(TrackedFigure {
                acquisition: to_domain(model),
                figure,
            });
        }
        Ok(tracked)
    }
}

fn parse_date(value: Option<String>, field: &str, id: i32) -> Option<NaiveDate> {
    let value = value?;
    match NaiveDate::parse_from_str(&value, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            tracing::warn!("Acquisition {} has unparseable {} '{}'", id, field, value);
            None
        }
    }
}

fn format_date(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format("%Y-%m-%d").to_string())
}

fn to_domain(model: acquisition::Model) -> Acquisition {
    let status = model.status.parse().unwrap_or_else(|_| {
        tracing::warn!(
            "Acquisition {} has unknown status '{}'",
            model.id,
            model.status
        );
        AcquisitionStatus::Reserved
    });
    let id = model.id;
    Acquisition {
        id,
        user_id: model.user_id,
        figure_id: model.figure_id,
        shop_id: model.shop_id,
        status,
        total_price: model.total_price,
        deposit_price: model.deposit_price,
        deposit_paid_at: parse_date(model.deposit_paid_at, "deposit_paid_at", id),
        balance_paid_at: parse_date(model.balance_paid_at, "balance_paid_at", id),
        paid_at: parse_date(model.paid_at, "paid_at", id),
        delivered_at: parse_date(model.delivered_at, "delivered_at", id),
        memo: model.memo,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

#[async_trait]
impl AcquisitionRepository for SeaOrmAcquisitionRepository {
    async fn find_for_user(&self, user_id: i32) -> Result<Vec<TrackedFigure>, DomainError> {
        let models = AcquisitionEntity::find()
            .filter(Column::UserId.eq(user_id))
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .all(&self.db)
            .await?;
        self.track(models).await
    }

    async fn find_by_id(
        &self,
        user_id: i32,
        id: i32,
    ) -> Result<Option<TrackedFigure>, DomainError> {
        let model = AcquisitionEntity::find_by_id(id)
            .filter(Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;
        match model {
            Some(model) => Ok(self.track(vec![model]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn create(
        &self,
        user_id: i32,
        input: CreateAcquisitionInput,
    ) -> Result<Acquisition, DomainError> {
        validate_amounts(input.total_price, input.deposit_price)?;

        if figure::Entity::find_by_id(input.figure_id)
            .one(&self.db)
            .await?
            .is_none()
        {
            return Err(DomainError::Validation(format!(
                "Unknown figure id {}",
                input.figure_id
            )));
        }
        self.check_shop(input.shop_id).await?;

        let now = chrono::Utc::now().to_rfc3339();
        let model = ActiveModel {
            user_id: Set(user_id),
            figure_id: Set(input.figure_id),
            shop_id: Set(input.shop_id),
            status: Set(input.status.as_str().to_string()),
            total_price: Set(input.total_price),
            deposit_price: Set(input.deposit_price),
            deposit_paid_at: Set(format_date(input.deposit_paid_at)),
            balance_paid_at: Set(None),
            paid_at: Set(format_date(input.paid_at)),
            delivered_at: Set(None),
            memo: Set(input.memo),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        tracing::info!(
            "User {} now tracks figure {} (acquisition {})",
            user_id,
            model.figure_id,
            model.id
        );
        Ok(to_domain(model))
    }

    async fn patch(
        &self,
        user_id: i32,
        id: i32,
        patch: AcquisitionPatch,
    ) -> Result<Acquisition, DomainError> {
        let model = self.find_model(user_id, id).await?;
        let current = to_domain(model.clone());
        if patch.is_empty() {
            return Ok(current);
        }

        let next = patch.applied_to(&current);
        validate_amounts(next.total_price, next.deposit_price)?;
        if let Some(shop_id) = patch.shop_id {
            self.check_shop(shop_id).await?;
        }
        if next.status < current.status {
            tracing::info!(
                "Acquisition {} moved back from {} to {}",
                id,
                current.status,
                next.status
            );
        }
        // Persist what actually changed, milestone side effects included.
        let patch = AcquisitionPatch::between(&current, &next);
        if patch.is_empty() {
            return Ok(current);
        }

        let mut active: ActiveModel = model.into();
        if let Some(status) = patch.status {
            active.status = Set(status.as_str().to_string());
        }
        if let Some(shop_id) = patch.shop_id {
            active.shop_id = Set(shop_id);
        }
        if let Some(total) = patch.total_price {
            active.total_price = Set(total);
        }
        if let Some(deposit) = patch.deposit_price {
            active.deposit_price = Set(deposit);
        }
        if let Some(date) = patch.deposit_paid_at {
            active.deposit_paid_at = Set(format_date(date));
        }
        if let Some(date) = patch.balance_paid_at {
            active.balance_paid_at = Set(format_date(date));
        }
        if let Some(date) = patch.paid_at {
            active.paid_at = Set(format_date(date));
        }
        if let Some(date) = patch.delivered_at {
            active.delivered_at = Set(format_date(date));
        }
        if let Some(memo) = patch.memo {
            active.memo = Set(memo);
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        Ok(to_domain(active.update(&self.db).await?))
    }

    async fn delete(&self, user_id: i32, id: i32) -> Result<(), DomainError> {
        let model = self.find_model(user_id, id).await?;
        AcquisitionEntity::delete_by_id(model.id)
            .exec(&self.db)
            .await?;
        Ok(())
    }
}
