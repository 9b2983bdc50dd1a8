//! Process-wide configuration.
//!
//! Built once at startup from the environment (and CLI overrides in
//! `main`), then passed by reference to the listener and the generation
//! adapter. Nothing here changes after startup.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use anyhow::{Context, Result};

/// Default TCP port when `PORT` is not set.
pub const DEFAULT_PORT: u16 = 5000;

/// Hard bound on one generation backend call.
pub const BACKEND_TIMEOUT: Duration = Duration::from_secs(60);

/// Requests longer than this are cut off at the limit.
pub const MAX_REQUEST_BYTES: usize = 64 * 1024;

const DEFAULT_PROGRAM: &str = "ollama";
const DEFAULT_MODEL: &str = "kimi-k2:1t-cloud";

/// Top-level configuration for the server.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the listener binds to. The host is always all interfaces.
    pub listen_addr: SocketAddr,

    /// Generation backend settings.
    pub backend: BackendConfig,

    /// Optional deadline for reading one request. `None` waits for the
    /// peer indefinitely.
    pub read_timeout: Option<Duration>,

    /// Maximum number of request bytes read from one connection.
    pub max_request_bytes: usize,
}

/// How to reach the external generation backend.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Program to execute (looked up on `PATH`).
    pub program: String,

    /// Model name passed to the program.
    pub model: String,

    /// Maximum time to wait for the program.
    pub timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_PROGRAM.into(),
            model: DEFAULT_MODEL.into(),
            timeout: BACKEND_TIMEOUT,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: all_interfaces(DEFAULT_PORT),
            backend: BackendConfig::default(),
            read_timeout: None,
            max_request_bytes: MAX_REQUEST_BYTES,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults.
    ///
    /// Reads `PORT`, `LLM_PROGRAM`, `LLM_MODEL` and `READ_TIMEOUT_SECONDS`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(port) = lookup("PORT") {
            let port: u16 = port
                .trim()
                .parse()
                .with_context(|| format!("Invalid PORT value: '{port}'"))?;
            config.listen_addr = all_interfaces(port);
        }

        if let Some(program) = lookup("LLM_PROGRAM") {
            config.backend.program = program;
        }

        if let Some(model) = lookup("LLM_MODEL") {
            config.backend.model = model;
        }

        if let Some(secs) = lookup("READ_TIMEOUT_SECONDS") {
            let secs: u64 = secs
                .trim()
                .parse()
                .with_context(|| format!("Invalid READ_TIMEOUT_SECONDS value: '{secs}'"))?;
            config.read_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        Ok(config)
    }

    /// Replace the listen port, keeping the all-interfaces host.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.listen_addr = all_interfaces(port);
        self
    }
}

const fn all_interfaces(port: u16) -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port)
}
