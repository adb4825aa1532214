//! Core data access for the feedback site.
//! This crate owns the store's read/write policy and the document contract.

pub mod config;
pub mod db;
pub mod env;
pub mod fixtures;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{CollectionPaths, ConfigError, ConfigResult, StoreConfig};
pub use env::{classify_host, EnvironmentProbe, Mode, ModeSetting};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::category::{category_slug, Category, CategoryId};
pub use model::feedback::{CategoryLabel, FeedbackItem};
pub use repo::document::{Document, DocumentData, FieldValue, Fields, WriteBatch, WriteOp};
pub use repo::document_repo::{
    DocumentRepository, RepoError, RepoResult, SqliteDocumentRepository,
};
pub use service::admin::{
    rules_console_url, rules_instructions, security_rules, seed_store, SeedFailure, SeedReport,
    SeedStep,
};
pub use service::feedback_store::{
    DataSource, FallbackReason, FeedbackStore, Loaded, ReadPolicy, StoreError, StoreResult,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
