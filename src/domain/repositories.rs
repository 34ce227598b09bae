//! Repository trait definitions
//!
//! These traits define the contract for data access.
//! Implementations live in the infrastructure layer.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;

use super::DomainError;
use super::acquisition::{Acquisition, AcquisitionPatch, AcquisitionStatus, TrackedFigure};
use super::figure::{Figure, FigureImage, ImageInput, MasterEntry, MasterKind, UpdateFigureInput};

/// Filter criteria for master data lookups
#[derive(Debug, Default, Clone, Deserialize)]
pub struct MasterFilter {
    /// Name prefix for typeahead
    pub q: Option<String>,
    /// Parent row (series id for characters)
    pub parent_id: Option<i32>,
    pub limit: Option<u64>,
}

/// Repository trait for master data (series, characters, manufacturers, ...)
#[async_trait]
pub trait MasterDataRepository: Send + Sync {
    /// Search entries of one kind, ordered by name
    async fn search(
        &self,
        kind: MasterKind,
        filter: MasterFilter,
    ) -> Result<Vec<MasterEntry>, DomainError>;

    async fn find_by_id(&self, kind: MasterKind, id: i32)
    -> Result<Option<MasterEntry>, DomainError>;

    /// Create a new entry; duplicate names within a kind are rejected
    async fn create(
        &self,
        kind: MasterKind,
        name: String,
        parent_id: Option<i32>,
    ) -> Result<MasterEntry, DomainError>;

    async fn rename(&self, kind: MasterKind, id: i32, name: String)
    -> Result<MasterEntry, DomainError>;
}

/// Filter criteria for catalog queries
#[derive(Debug, Default, Clone, Deserialize)]
pub struct FigureFilter {
    /// Substring of the name (any locale)
    pub q: Option<String>,
    pub series_id: Option<i32>,
    pub manufacturer_id: Option<i32>,
    pub category_id: Option<i32>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

/// Paginated result with total count
#[derive(Debug)]
pub struct PaginatedFigures {
    pub figures: Vec<Figure>,
    pub total: u64,
}

/// Repository trait for catalog figures and their images.
///
/// Creation goes through the transactional registration service.
#[async_trait]
pub trait FigureRepository: Send + Sync {
    async fn find_all(&self, filter: FigureFilter) -> Result<PaginatedFigures, DomainError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<Figure>, DomainError>;

    async fn update(&self, id: i32, input: UpdateFigureInput) -> Result<Figure, DomainError>;

    async fn delete(&self, id: i32) -> Result<(), DomainError>;

    /// Images ordered by sort order
    async fn list_images(&self, figure_id: i32) -> Result<Vec<FigureImage>, DomainError>;

    /// Append an image after the existing ones
    async fn add_image(&self, figure_id: i32, input: ImageInput)
    -> Result<FigureImage, DomainError>;

    /// Flag one image as thumbnail, clearing the others
    async fn set_thumbnail(
        &self,
        figure_id: i32,
        image_id: i32,
    ) -> Result<Vec<FigureImage>, DomainError>;

    /// Rewrite sort orders to follow `image_ids`, which must name every image once
    async fn reorder_images(
        &self,
        figure_id: i32,
        image_ids: Vec<i32>,
    ) -> Result<Vec<FigureImage>, DomainError>;

    async fn delete_image(&self, figure_id: i32, image_id: i32) -> Result<(), DomainError>;
}

/// Input for creating an acquisition
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAcquisitionInput {
    pub figure_id: i32,
    pub shop_id: Option<i32>,
    #[serde(default = "default_status")]
    pub status: AcquisitionStatus,
    pub total_price: i64,
    pub deposit_price: Option<i64>,
    pub deposit_paid_at: Option<NaiveDate>,
    pub paid_at: Option<NaiveDate>,
    pub memo: Option<String>,
}

fn default_status() -> AcquisitionStatus {
    AcquisitionStatus::Reserved
}

/// Repository trait for acquisitions, always scoped to one user
#[async_trait]
pub trait AcquisitionRepository: Send + Sync {
    /// All of a user's acquisitions with their figures
    async fn find_for_user(&self, user_id: i32) -> Result<Vec<TrackedFigure>, DomainError>;

    async fn find_by_id(
        &self,
        user_id: i32,
        id: i32,
    ) -> Result<Option<TrackedFigure>, DomainError>;

    async fn create(
        &self,
        user_id: i32,
        input: CreateAcquisitionInput,
    ) -> Result<Acquisition, DomainError>;

    /// Persist only the fields present in `patch`
    async fn patch(
        &self,
        user_id: i32,
        id: i32,
        patch: AcquisitionPatch,
    ) -> Result<Acquisition, DomainError>;

    async fn delete(&self, user_id: i32, id: i32) -> Result<(), DomainError>;
}
