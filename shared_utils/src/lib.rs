//! Small utilities shared by the dashboard crates: environment access and
//! the TOML configuration file.

pub mod config;
pub mod env;
