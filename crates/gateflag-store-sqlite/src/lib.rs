// crates/gateflag-store-sqlite/src/lib.rs
// ============================================================================
// Module: Gateflag SQLite Store
// Description: Public API surface for the durable SQLite-backed adapter.
// Purpose: Expose `SqliteAdapter` and its configuration.
// Dependencies: crate::store
// ============================================================================

//! ## Overview
//! A durable [`gateflag_core::Adapter`] backed by `SQLite` in WAL mode. Gate
//! values round-trip through the same JSON shape [`gateflag_core::GateValues`]
//! already derives, so the schema is a thin key/value table rather than a
//! bespoke relational model.

pub mod store;

pub use store::SqliteAdapter;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteSyncMode;
