//! Config command implementation.

use crate::models::config::{default_config_path, Config};
use crate::{Error, Result};
use colored::Colorize;

/// Print the effective configuration as TOML, with the API key masked.
pub fn print_config(config: &Config) -> Result<()> {
    let mut shown = config.clone();
    if shown.server.api_key.is_some() {
        shown.server.api_key = Some("********".to_string());
    }
    let text = toml::to_string_pretty(&shown).map_err(|e| Error::Config(e.to_string()))?;

    println!(
        "{} {}",
        "# Configuration file:".dimmed(),
        default_config_path().display().to_string().dimmed()
    );
    println!("{}", text);
    Ok(())
}
