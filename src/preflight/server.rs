//! Catalogue server preflight checks.

use super::Check;
use crate::models::config::ServerConfig;
use crate::services::shoko::ShokoClient;

const URL: &str = "Server URL";
const API_KEY: &str = "API key";
pub(super) const CONNECTION: &str = "Catalogue server";

/// Check that a server URL is configured and looks like one.
pub fn check_url(server: &ServerConfig) -> Check {
    let url = server.url.trim();
    if url.is_empty() {
        Check::failed(
            URL,
            "not configured",
            "Set server.url in config.toml or the SHOKO_URL environment variable",
        )
    } else if !(url.starts_with("http://") || url.starts_with("https://")) {
        Check::failed(
            URL,
            format!("'{}' is not an http(s) URL", url),
            "Use a URL such as http://localhost:8111",
        )
    } else {
        Check::passed(URL, url)
    }
}

/// Check that an API key is configured.
pub fn check_api_key(server: &ServerConfig) -> Check {
    match server.api_key.as_deref().map(str::trim) {
        Some(key) if !key.is_empty() => Check::passed(API_KEY, "configured"),
        _ => Check::failed(
            API_KEY,
            "not configured",
            "Set SHOKO_API_KEY environment variable",
        ),
    }
}

/// Check that the server answers.
pub async fn check_connection(server: &ServerConfig) -> Check {
    match ShokoClient::from_server(server) {
        Ok(client) => match client.ping().await {
            Ok(version) => Check::passed(CONNECTION, format!("version {}", version.version)),
            Err(crate::Error::Server { status, .. }) if status == 401 || status == 403 => {
                Check::failed(
                    CONNECTION,
                    "API key rejected",
                    "Check your SHOKO_API_KEY environment variable",
                )
            }
            Err(_) => Check::failed(
                CONNECTION,
                "connection failed",
                "Check that the server is running and reachable",
            ),
        },
        Err(e) => Check::failed(CONNECTION, e.to_string(), "Fix the configuration"),
    }
}
