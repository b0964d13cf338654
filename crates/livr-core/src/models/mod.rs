//! Data models: configuration, supplier profiles and extraction results.

pub mod config;
pub mod delivery;
pub mod profile;
