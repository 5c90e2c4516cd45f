// crates/gateflag-adapters-net/src/lib.rs
// ============================================================================
// Module: Gateflag Network Adapters
// Description: Public API surface for the HTTP and key-value Adapter
//              implementations.
// Purpose: Let Gateflag run against a remote engine over HTTP, or against any
//          flat key-value store, without either concern living in core.
// Dependencies: crate::{http, kv}
// ============================================================================

//! ## Overview
//! Two `Adapter` implementations that reach outside the process: an HTTP
//! client adapter for talking to a remote Gateflag-compatible engine, and a
//! generic adapter over a small [`kv::KeyValueBackend`] trait with an
//! in-memory backend for tests and demos.

pub mod http;
pub mod kv;

pub use http::HttpAdapter;
pub use http::HttpAdapterError;
pub use kv::InMemoryKeyValueBackend;
pub use kv::KeyValueAdapter;
pub use kv::KeyValueBackend;
pub use kv::KeyValueBackendError;
