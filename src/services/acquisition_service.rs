//! Acquisition workflows on top of [`AcquisitionRepository`].
//!
//! Mutations are computed in memory by the domain transition functions and
//! persisted as a patch that carries only the changed fields.

use chrono::NaiveDate;

use crate::domain::acquisition::{
    AcquisitionPatch, AcquisitionView, AmountEdit, Milestone, apply_amount_edit, apply_milestone,
};
use crate::domain::timeline::{DateField, Timeline, TimelineQuery, available_years};
use crate::domain::{AcquisitionRepository, CreateAcquisitionInput, DomainError};

/// Local calendar date used to stamp milestones
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

pub async fn list(
    repo: &dyn AcquisitionRepository,
    user_id: i32,
) -> Result<Vec<AcquisitionView>, DomainError> {
    Ok(repo
        .find_for_user(user_id)
        .await?
        .into_iter()
        .map(AcquisitionView::from)
        .collect())
}

pub async fn get(
    repo: &dyn AcquisitionRepository,
    user_id: i32,
    id: i32,
) -> Result<AcquisitionView, DomainError> {
    repo.find_by_id(user_id, id)
        .await?
        .map(AcquisitionView::from)
        .ok_or(DomainError::NotFound)
}

pub async fn create(
    repo: &dyn AcquisitionRepository,
    user_id: i32,
    input: CreateAcquisitionInput,
) -> Result<AcquisitionView, DomainError> {
    let created = repo.create(user_id, input).await?;
    get(repo, user_id, created.id).await
}

pub async fn update(
    repo: &dyn AcquisitionRepository,
    user_id: i32,
    id: i32,
    patch: AcquisitionPatch,
) -> Result<AcquisitionView, DomainError> {
    repo.patch(user_id, id, patch).await?;
    get(repo, user_id, id).await
}

/// Toggle one milestone date, applying its side effects.
pub async fn toggle_milestone(
    repo: &dyn AcquisitionRepository,
    user_id: i32,
    id: i32,
    milestone: Milestone,
    today: NaiveDate,
) -> Result<AcquisitionView, DomainError> {
    let current = repo
        .find_by_id(user_id, id)
        .await?
        .ok_or(DomainError::NotFound)?
        .acquisition;

    let next = apply_milestone(&current, milestone, today);
    tracing::debug!(
        "Acquisition {}: toggled {:?} to {:?}",
        id,
        milestone,
        next.milestone(milestone)
    );
    update(repo, user_id, id, AcquisitionPatch::between(&current, &next)).await
}

pub async fn edit_amount(
    repo: &dyn AcquisitionRepository,
    user_id: i32,
    id: i32,
    edit: AmountEdit,
) -> Result<AcquisitionView, DomainError> {
    let current = repo
        .find_by_id(user_id, id)
        .await?
        .ok_or(DomainError::NotFound)?
        .acquisition;

    let next = apply_amount_edit(&current, edit)?;
    update(repo, user_id, id, AcquisitionPatch::between(&current, &next)).await
}

pub async fn remove(
    repo: &dyn AcquisitionRepository,
    user_id: i32,
    id: i32,
) -> Result<(), DomainError> {
    repo.delete(user_id, id).await
}

pub async fn timeline(
    repo: &dyn AcquisitionRepository,
    user_id: i32,
    query: TimelineQuery,
) -> Result<Timeline, DomainError> {
    let entries = repo.find_for_user(user_id).await?;
    Ok(Timeline::build(&entries, query))
}

pub async fn years(
    repo: &dyn AcquisitionRepository,
    user_id: i32,
    field: DateField,
) -> Result<Vec<i32>, DomainError> {
    let entries = repo.find_for_user(user_id).await?;
    Ok(available_years(&entries, field))
}
