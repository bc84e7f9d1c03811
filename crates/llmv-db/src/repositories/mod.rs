//! Repository implementations using `SQLite`.
//!
//! These implementations encapsulate all SQL queries and database access.
//! The `SqlitePool` is confined to this module and never exposed through
//! the port trait signatures.

mod row_mappers;
mod sqlite_registry;
mod sqlite_result_sink;

pub use sqlite_registry::{ImportSummary, SqliteRegistry};
pub use sqlite_result_sink::SqliteResultSink;
