//! Checks run before commands that talk to the catalogue server.

mod server;

use crate::models::config::Config;
use colored::Colorize;

/// Outcome of a single check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Passed(String),
    Failed { reason: String, hint: String },
    /// Not attempted because the configuration is already known to be unusable.
    Skipped,
}

#[derive(Debug, Clone)]
pub struct Check {
    pub name: &'static str,
    pub status: CheckStatus,
}

impl Check {
    pub fn passed(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            status: CheckStatus::Passed(detail.into()),
        }
    }

    pub fn failed(name: &'static str, reason: impl Into<String>, hint: impl Into<String>) -> Self {
        Self {
            name,
            status: CheckStatus::Failed {
                reason: reason.into(),
                hint: hint.into(),
            },
        }
    }

    pub fn skipped(name: &'static str) -> Self {
        Self {
            name,
            status: CheckStatus::Skipped,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.status, CheckStatus::Failed { .. })
    }
}

/// Every check run against one configuration, in order.
#[derive(Debug, Default)]
pub struct PreflightReport {
    pub checks: Vec<Check>,
}

impl PreflightReport {
    /// Check the server settings, then reach the server if they look usable.
    pub async fn run(config: &Config) -> Self {
        let mut checks = vec![
            server::check_url(&config.server),
            server::check_api_key(&config.server),
        ];
        let connection = if checks.iter().any(Check::is_failure) {
            Check::skipped(server::CONNECTION)
        } else {
            server::check_connection(&config.server).await
        };
        checks.push(connection);
        Self { checks }
    }

    pub fn failures(&self) -> usize {
        self.checks.iter().filter(|c| c.is_failure()).count()
    }

    pub fn passed(&self) -> bool {
        self.failures() == 0
    }

    pub fn print(&self) {
        let width = self.checks.iter().map(|c| c.name.len()).max().unwrap_or(0);
        for check in &self.checks {
            let name = format!("{:<width$}", check.name, width = width);
            match &check.status {
                CheckStatus::Passed(detail) => {
                    println!("  {}  {}  {}", "ok     ".green(), name.bold(), detail)
                }
                CheckStatus::Failed { reason, hint } => {
                    println!("  {}  {}  {}", "failed ".red(), name.bold(), reason);
                    println!("  {}  {}  {}", "       ", " ".repeat(width), hint.yellow());
                }
                CheckStatus::Skipped => {
                    println!("  {}  {}", "skipped".dimmed(), name.dimmed())
                }
            }
        }
    }
}
