pub mod backend;
pub mod cli;
pub mod config;
pub mod formatter;
pub mod mapping;
pub mod models;
pub mod resolution;
pub mod step;

pub use lodestar_common::protocol;
pub use resolution::engine::LocatorEngine;
