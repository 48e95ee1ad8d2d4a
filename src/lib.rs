//! Anime Resolver Library
//!
//! Resolves catalogue series, episodes, files and groups into a
//! Show / Season / Episode / File hierarchy addressable by id and by path.

pub mod cli;
pub mod core;
pub mod error;
pub mod models;
pub mod preflight;
pub mod services;
pub mod utils;

pub use error::{Error, Result};
