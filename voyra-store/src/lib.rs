pub mod audit_repo;
pub mod catalog_repo;
pub mod reservation_repo;
pub mod rule_repo;

pub use audit_repo::InMemoryAuditLogRepository;
pub use catalog_repo::InMemoryCatalogRepository;
pub use reservation_repo::InMemoryReservationRepository;
pub use rule_repo::{InMemoryCommissionRepository, InMemoryPriceRuleRepository};
