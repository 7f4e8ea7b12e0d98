// ⚙️ Server Configuration - JSON file + environment overrides
//
// Resolution order:
// 1. Built-in defaults
// 2. JSON file ($BUDGET_CONFIG, else ./budget.json when present)
// 3. BUDGET_HOST / BUDGET_PORT / BUDGET_SESSION_IDLE_MINUTES

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::BudgetError;
use crate::session;

pub const CONFIG_ENV: &str = "BUDGET_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "budget.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Sessions untouched for longer than this are dropped
    #[serde(default = "default_session_idle_minutes")]
    pub session_idle_minutes: i64,

    /// Directory served under /static
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_session_idle_minutes() -> i64 {
    120
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("web")
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: default_host(),
            port: default_port(),
            session_idle_minutes: default_session_idle_minutes(),
            static_dir: default_static_dir(),
        }
    }
}

impl ServerConfig {
    /// Load from a JSON file. Missing keys take their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Reading config file: {}", path.display()))?;
        let config: ServerConfig = serde_json::from_str(&raw)
            .with_context(|| format!("Parsing config JSON in {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Explicit path if given (it must load), else ./budget.json if it exists, else defaults
    pub fn load_with_fallback(path: Option<&Path>) -> Result<Self> {
        if let Some(explicit) = path {
            return Self::load(explicit);
        }

        let default_path = Path::new(DEFAULT_CONFIG_FILE);
        if default_path.exists() {
            return Self::load(default_path);
        }

        Ok(Self::default())
    }

    /// Full resolution used by the server binary
    pub fn from_env() -> Result<Self> {
        let path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let mut config = Self::load_with_fallback(path.as_deref())?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply BUDGET_* overrides from any key lookup (the process env in production)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), BudgetError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("BUDGET_HOST") {
            self.host = host;
        }

        if let Some(port) = lookup("BUDGET_PORT") {
            self.port = port
                .trim()
                .parse()
                .map_err(|_| BudgetError::Config(format!("BUDGET_PORT is not a port: {}", port)))?;
        }

        if let Some(minutes) = lookup("BUDGET_SESSION_IDLE_MINUTES") {
            self.session_idle_minutes = minutes.trim().parse().map_err(|_| {
                BudgetError::Config(format!(
                    "BUDGET_SESSION_IDLE_MINUTES is not a number: {}",
                    minutes
                ))
            })?;
        }

        self.validate()
    }

    pub fn validate(&self) -> Result<(), BudgetError> {
        if self.port == 0 {
            return Err(BudgetError::Config("port must be non-zero".to_string()));
        }
        session::idle_timeout(self.session_idle_minutes)?;
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
