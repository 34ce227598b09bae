//! Application state containing repositories and shared resources

use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::domain::{AcquisitionRepository, FigureRepository, MasterDataRepository};
use crate::infrastructure::storage::ObjectStorage;
use crate::infrastructure::{
    SeaOrmAcquisitionRepository, SeaOrmFigureRepository, SeaOrmMasterDataRepository,
};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection, used by the transactional services
    db: DatabaseConnection,
    pub figure_repo: Arc<dyn FigureRepository>,
    pub master_repo: Arc<dyn MasterDataRepository>,
    pub acquisition_repo: Arc<dyn AcquisitionRepository>,
    /// Image object store
    pub storage: Arc<ObjectStorage>,
}

impl AppState {
    /// Create a new AppState with all repositories initialized
    pub fn new(db: DatabaseConnection, storage: ObjectStorage) -> Self {
        let figure_repo = Arc::new(SeaOrmFigureRepository::new(db.clone()));
        let master_repo = Arc::new(SeaOrmMasterDataRepository::new(db.clone()));
        let acquisition_repo = Arc::new(SeaOrmAcquisitionRepository::new(db.clone()));

        Self {
            db,
            figure_repo,
            master_repo,
            acquisition_repo,
            storage: Arc::new(storage),
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

// Implement FromRef to allow extracting DatabaseConnection from AppState
impl axum::extract::FromRef<AppState> for DatabaseConnection {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}
