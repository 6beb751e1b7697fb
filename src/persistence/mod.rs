//! Persistence layer: SQLite store for users, sessions, rooms, and the
//! ledger.
//!
//! [`Database`] owns the `sqlx::SqlitePool`. The query modules are plain
//! async functions over `&mut SqliteConnection` so the service layer can
//! compose several of them inside one transaction.

pub mod ledger;
pub mod models;
pub mod rooms;
pub mod sessions;
pub mod sqlite;
pub mod users;

pub use sqlite::Database;
