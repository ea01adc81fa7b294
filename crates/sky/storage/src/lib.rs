//! Sky Storage Layer
//!
//! Persistence for users, devices and role sets. [`SqliteStorage`] is the
//! diesel-backed production store; [`MemoryStorage`] satisfies the same
//! contract in memory.

mod error;
mod memory;
mod models;
mod schema;
mod sqlite;
mod traits;

pub use error::*;
pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;
pub use traits::*;

use diesel_migrations::{EmbeddedMigrations, embed_migrations};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Check the affected-row count of an id-keyed write.
///
/// Zero rows maps to `not_found`. More than one row means the primary key
/// is not unique and the process cannot continue safely.
pub(crate) fn expect_single_row(
    affected: usize,
    op: &str,
    not_found: impl FnOnce() -> StoreError,
) -> Result<()> {
    match affected {
        0 => Err(not_found()),
        1 => Ok(()),
        n => panic!("want 1 row {op}, got {n}"),
    }
}
