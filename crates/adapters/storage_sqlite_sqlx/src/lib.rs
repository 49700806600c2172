//! # mistguard-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the storage port traits defined in `mistguard-app::ports`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Map between domain types and database rows
//!
//! ## Dependency rule
//! Depends on `mistguard-app` (for port traits) and `mistguard-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

mod codec;
pub mod error;
pub mod event_repo;
pub mod journal;
pub mod parameter_repo;
pub mod pool;

pub use event_repo::SqliteBathroomEventRepository;
pub use journal::SqliteJournal;
pub use parameter_repo::SqliteParameterRepository;
pub use pool::{Config, Database};
