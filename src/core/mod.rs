//! Core resolution logic.

pub mod cache;
pub mod index;
pub mod merge;
pub mod resolver;
pub mod series_config;
pub mod tags;
pub mod usage;
