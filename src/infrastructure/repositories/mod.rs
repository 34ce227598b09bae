//! Repository implementations using SeaORM

pub mod acquisition_repository;
pub mod figure_repository;
pub mod master_data_repository;

pub use acquisition_repository::SeaOrmAcquisitionRepository;
pub use figure_repository::SeaOrmFigureRepository;
pub use master_data_repository::SeaOrmMasterDataRepository;
