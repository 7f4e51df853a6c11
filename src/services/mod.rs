pub mod duplicate_resolver;
pub mod health_service;
pub mod store;
pub mod user_migration_service;
