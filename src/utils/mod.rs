//! Utility functions.

pub mod paths;
pub mod text;
