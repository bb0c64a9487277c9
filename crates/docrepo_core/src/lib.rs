//! Document repository core: query builder, session-scoped store client,
//! entity identity and bulk loading over an embedded SQLite document store.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;
pub mod store;

pub use config::{StoreConfig, StoreLocation};
pub use logging::{default_log_level, init_logging, logging_status, LogError};
pub use model::company::{Company, CompanyDetail, CompanyInput, COMPANY_COLLECTION};
pub use model::entity::{Document, Entity};
pub use model::identity::generate_id;
pub use model::person::{Gender, Person, PersonInput, PERSON_COLLECTION};
pub use repo::document_repo::{QueryBuilder, Repository};
pub use repo::error::{RepoError, RepoResult};
pub use repo::pagination::{Page, PaginationParams, RawPagination};
pub use repo::predicate::{QuerySpec, SpatialPredicate};
pub use service::company_service::CompanyService;
pub use service::person_service::{PersonFilter, PersonService, SeedSummary};
pub use service::{ServiceError, ServiceResult};
pub use store::{DocumentStore, Session};
