//! Data models.

pub mod catalog;
pub mod config;
pub mod ids;
pub mod info;
