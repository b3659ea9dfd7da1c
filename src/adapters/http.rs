//! Shared blocking HTTP plumbing for the remote sources.

use std::time::Duration;

use reqwest::blocking::Client;
use tracing::debug;

use crate::domain::error::FetchError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

const USER_AGENT: &str = concat!(
    "Mozilla/5.0 (compatible; crisiswatch/",
    env!("CARGO_PKG_VERSION"),
    ")"
);

pub fn build_client(timeout: Duration) -> Result<Client, FetchError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| FetchError::Network {
            source_name: "http".into(),
            reason: format!("failed to build client: {}", e),
        })
}

/// GET `url` and return the body; non-2xx statuses are errors.
pub fn get_text(client: &Client, source_name: &str, url: &str) -> Result<String, FetchError> {
    debug!(source = source_name, url, "GET");

    let resp = client.get(url).send().map_err(|e| network_error(source_name, &e))?;
    let status = resp.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            source_name: source_name.to_string(),
            status: status.as_u16(),
        });
    }
    resp.text().map_err(|e| network_error(source_name, &e))
}

fn network_error(source_name: &str, err: &reqwest::Error) -> FetchError {
    let reason = if err.is_timeout() {
        "request timed out".to_string()
    } else {
        err.to_string()
    };
    FetchError::Network {
        source_name: source_name.to_string(),
        reason,
    }
}
