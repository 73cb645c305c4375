//! Server and client configuration.

use std::env;
use std::sync::LazyLock;
use std::time::Duration;

use tracing::warn;
use url::Url;

use crate::infra::client::ClientError;

pub const DEFAULT_LISTEN: &str = "127.0.0.1:3000";
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:3000/";
const DEFAULT_MAX_WS_CONNECTIONS: usize = 32;
const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

static DEFAULT_SERVER: LazyLock<Result<Url, url::ParseError>> =
    LazyLock::new(|| Url::parse(DEFAULT_SERVER_URL));

#[derive(Debug, Clone)]
pub struct ServerConfig {
    listen: String,
    allow_remote: bool,
    max_ws_connections: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl ServerConfig {
    pub fn listen(&self) -> &str {
        &self.listen
    }

    pub fn allow_remote(&self) -> bool {
        self.allow_remote
    }

    pub fn max_ws_connections(&self) -> usize {
        self.max_ws_connections
    }

    pub fn from_env() -> Self {
        let allow_remote = env_bool("PLACE_ALLOW_REMOTE").unwrap_or(false);
        let listen = env::var("PLACE_LISTEN")
            .ok()
            .and_then(non_empty)
            .or_else(|| listen_from_port(allow_remote))
            .unwrap_or_else(|| DEFAULT_LISTEN.to_string());
        let max_ws_connections = match parse_env_usize(
            "PLACE_MAX_WS_CONNECTIONS",
            DEFAULT_MAX_WS_CONNECTIONS,
        ) {
            0 => {
                warn!("PLACE_MAX_WS_CONNECTIONS must be at least 1; using default");
                DEFAULT_MAX_WS_CONNECTIONS
            }
            parsed => parsed,
        };

        Self {
            listen,
            allow_remote,
            max_ws_connections,
        }
    }

    pub fn with_listen(mut self, listen: impl Into<String>) -> Self {
        self.listen = listen.into();
        self
    }

    pub fn with_allow_remote(mut self, allow: bool) -> Self {
        self.allow_remote = allow;
        self
    }

    pub fn with_max_ws_connections(mut self, max: usize) -> Self {
        self.max_ws_connections = max.max(1);
        self
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    server: Url,
    poll_interval: Duration,
}

impl ClientConfig {
    pub fn server(&self) -> &Url {
        &self.server
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn from_env() -> Result<Self, ClientError> {
        let server = match env::var("PLACE_SERVER").ok().and_then(non_empty) {
            Some(value) => match parse_server_url(&value) {
                Ok(url) => url,
                Err(err) => {
                    warn!(value = %value, error = %err, "Invalid PLACE_SERVER; using default");
                    default_server_url()?
                }
            },
            None => default_server_url()?,
        };
        let poll_interval = Duration::from_millis(
            match parse_env_u64("PLACE_POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS) {
                0 => DEFAULT_POLL_INTERVAL_MS,
                ms => ms,
            },
        );
        Ok(Self {
            server,
            poll_interval,
        })
    }

    pub fn with_server(mut self, server: Url) -> Self {
        self.server = server;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        if !interval.is_zero() {
            self.poll_interval = interval;
        }
        self
    }
}

/// Accepts `host:port` shorthand as well as full `http(s)://` URLs.
pub fn parse_server_url(value: &str) -> Result<Url, url::ParseError> {
    let trimmed = value.trim();
    let mut url = if trimmed.contains("://") {
        Url::parse(trimmed)?
    } else {
        Url::parse(&format!("http://{trimmed}"))?
    };
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn default_server_url() -> Result<Url, ClientError> {
    DEFAULT_SERVER
        .clone()
        .map_err(|e| ClientError::InvalidUrl(format!("{DEFAULT_SERVER_URL}: {e}")))
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn env_bool(key: &str) -> Option<bool> {
    env::var(key)
        .ok()
        .and_then(|value| match value.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => {
                warn!(value = %value, key, "Invalid boolean config; ignoring");
                None
            }
        })
}

fn listen_from_port(allow_remote: bool) -> Option<String> {
    let value = env::var("PORT").ok().and_then(non_empty)?;
    match value.parse::<u16>() {
        Ok(port) => {
            let host = if allow_remote { "0.0.0.0" } else { "127.0.0.1" };
            Some(format!("{host}:{port}"))
        }
        Err(_) => {
            warn!(value = %value, "Invalid PORT; using default listen address");
            None
        }
    }
}

fn parse_env_usize(key: &str, default: usize) -> usize {
    let Some(value) = env::var(key).ok().and_then(non_empty) else {
        return default;
    };
    match value.parse::<usize>() {
        Ok(parsed) => parsed,
        Err(_) => {
            warn!(value = %value, key, "Invalid numeric config; using default");
            default
        }
    }
}

fn parse_env_u64(key: &str, default: u64) -> u64 {
    let Some(value) = env::var(key).ok().and_then(non_empty) else {
        return default;
    };
    match value.parse::<u64>() {
        Ok(parsed) => parsed,
        Err(_) => {
            warn!(value = %value, key, "Invalid numeric config; using default");
            default
        }
    }
}
