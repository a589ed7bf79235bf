//! # warden-storage
//!
//! The Database collaborator consumed by the gate and invitation components.
//!
//! | Backend | Use |
//! |---------|-----|
//! | [`MemoryDatabase`] | Tests and single-process development |
//! | [`SqliteDatabase`] | Persistent deployments (sqlx) |
//!
//! Both backends implement invitation redemption as a single conditional
//! update, so concurrent redemptions of one code admit exactly one winner.

pub mod database;
pub mod memory;
pub mod sqlite;

pub use database::{Database, connect};
pub use memory::MemoryDatabase;
pub use sqlite::SqliteDatabase;
