//! Server configuration from environment variables

use crate::store::{InMemoryPollStore, JsonFilePollStore, PollStore};
use crate::types::DEFAULT_QUESTION_DURATION_MS;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

pub const DEFAULT_PORT: u16 = 5000;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    /// JSON file for poll history (None = keep in memory)
    pub poll_store_path: Option<PathBuf>,
    /// Countdown for questions sent without a duration
    pub default_question_duration_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            poll_store_path: None,
            default_question_duration_ms: DEFAULT_QUESTION_DURATION_MS,
        }
    }
}

impl ServerConfig {
    /// Load config from environment variables:
    /// LIVEPOLL_HOST, PORT, POLL_STORE_PATH, DEFAULT_QUESTION_DURATION_MS
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let host = parse_var("LIVEPOLL_HOST").unwrap_or(defaults.host);
        let port = parse_var("PORT").unwrap_or(defaults.port);
        let poll_store_path = non_empty_var("POLL_STORE_PATH").map(PathBuf::from);
        let default_question_duration_ms = match parse_var::<u64>("DEFAULT_QUESTION_DURATION_MS") {
            Some(0) => {
                tracing::warn!("DEFAULT_QUESTION_DURATION_MS must be > 0, using default");
                defaults.default_question_duration_ms
            }
            Some(ms) => ms,
            None => defaults.default_question_duration_ms,
        };

        Self {
            host,
            port,
            poll_store_path,
            default_question_duration_ms,
        }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn build_store(&self) -> Arc<dyn PollStore> {
        match &self.poll_store_path {
            Some(path) => {
                tracing::info!("Saving polls to {}", path.display());
                Arc::new(JsonFilePollStore::new(path))
            }
            None => {
                tracing::warn!("POLL_STORE_PATH not set - poll history is kept in memory only");
                Arc::new(InMemoryPollStore::new())
            }
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = non_empty_var(key)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring invalid {}={}", key, raw);
            None
        }
    }
}
