//! Asset types loaded from the asset root.

/// Startup configuration deserialised from `config.json`.
pub mod startup_config;
