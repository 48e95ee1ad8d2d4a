//! External service integrations.

pub mod catalog;
pub mod library;
pub mod shoko;
