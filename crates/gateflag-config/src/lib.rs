// crates/gateflag-config/src/lib.rs
// ============================================================================
// Module: Gateflag Config Library
// Description: Public API surface for configuration loading.
// Purpose: Expose GateflagConfig and ConfigError.
// Dependencies: crate::config
// ============================================================================

//! ## Overview
//! Fail-closed TOML configuration loading: which `Adapter` and `Instrumenter`
//! an application should construct, and their backend-specific settings. This
//! crate only describes the choice; constructing the concrete adapter or
//! instrumenter from it is left to the application, which already depends on
//! whichever of `gateflag-store-sqlite` / `gateflag-adapters-net` /
//! `gateflag-telemetry` it needs.

pub mod config;

pub use config::AdapterConfig;
pub use config::ConfigError;
pub use config::GateflagConfig;
pub use config::HttpAdapterConfig;
pub use config::InstrumenterConfig;
pub use config::SqliteAdapterConfig;
