//! Storage traits and implementations.
//!
//! This module provides the append-only record store abstraction. The
//! `RecordStore` trait is implemented in memory for development and testing,
//! and on `PostgreSQL` for production.

pub mod postgres;
pub mod record_store;
pub mod table;

pub use postgres::PostgresRecordStore;
pub use record_store::{InMemoryRecordStore, RecordStore, StoreError, StoredRow};
pub use table::Table;
