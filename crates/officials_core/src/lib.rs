//! Core domain logic for the provincial officials admin module.
//! This crate is the single source of truth for record, image and schema
//! invariants; hosts (CLI, web) only translate input and render outcomes.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod storage;

pub use config::AppConfig;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::official::{NewOfficial, Official, OfficialId, Position};
pub use model::validation::{OfficialForm, ValidatedOfficial, ValidationErrors};
pub use repo::official_repo::{
    OfficialListQuery, OfficialRepository, RepoError, RepoResult, SqliteOfficialRepository,
};
pub use service::official_service::{
    ActionKind, ActionOutcome, ListingFilters, OfficialListing, OfficialService,
    OfficialServiceError, ServiceResult,
};
pub use storage::{ImageStore, StorageError, UploadedImage};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
