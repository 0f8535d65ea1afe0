//! CLI command modules.

pub mod health;
pub mod http;
pub mod nodes;
