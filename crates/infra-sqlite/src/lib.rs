// Jobmatch Infrastructure - SQLite Adapter
// Implements: JobRepository (upsert-by-fingerprint, filtered listing)

mod connection;
mod error;
mod job_repository;
mod migration;

pub use connection::{create_pool, open_database};
pub use job_repository::SqliteJobRepository;
pub use migration::run_migrations;
