//! Shared HTTP clients, one per base URL.
//!
//! Reusing a `reqwest::Client` keeps connections, DNS results and TLS sessions alive
//! between completion calls. Each client is configured with:
//! - `pool_idle_timeout`: idle connections kept for 90 seconds
//! - `pool_max_idle_per_host`: up to 10 idle connections per host
//! - `tcp_keepalive`: keepalive probes every 60 seconds
//! - `timeout`: 120 seconds for a whole request

use crate::fibchat::client_wrapper::ClientError;
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

static HTTP_CLIENT_POOL: OnceLock<Mutex<HashMap<String, reqwest::Client>>> = OnceLock::new();

/// Get or create the shared client for `base_url`.
pub fn get_http_client(base_url: &str) -> Result<reqwest::Client, ClientError> {
    let pool = HTTP_CLIENT_POOL.get_or_init(|| Mutex::new(HashMap::new()));
    let mut pool = pool
        .lock()
        .map_err(|_| ClientError::Transport("HTTP client pool lock poisoned".to_string()))?;

    if let Some(client) = pool.get(base_url) {
        return Ok(client.clone());
    }

    let client = reqwest::ClientBuilder::new()
        .pool_idle_timeout(Some(Duration::from_secs(90)))
        .pool_max_idle_per_host(10)
        .tcp_keepalive(Some(Duration::from_secs(60)))
        .timeout(Duration::from_secs(120))
        .build()
        .map_err(|e| ClientError::Transport(format!("failed to build HTTP client: {}", e)))?;

    log::debug!("Created pooled HTTP client for {}", base_url);
    pool.insert(base_url.to_string(), client.clone());
    Ok(client)
}
