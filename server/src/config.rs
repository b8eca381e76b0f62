use std::{env, path::PathBuf};

use machine_learning::artifact::DEFAULT_MODEL_PATH;

use crate::{Result, ServerErr};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;

/// Where to listen and which model to serve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub model_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
        }
    }
}

impl ServerConfig {
    /// Builds the configuration from the `HOST`, `PORT` and `MODEL_PATH` variables.
    ///
    /// # Returns
    /// The configuration or an error if `PORT` isn't a valid port number.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Same as `from_env`, reading the variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup("HOST") {
            config.host = host;
        }

        if let Some(port) = lookup("PORT") {
            config.port = port.trim().parse::<u16>().map_err(|e| ServerErr::InvalidVar {
                var: "PORT",
                reason: format!("{e}"),
                value: port,
            })?;
        }

        if let Some(path) = lookup("MODEL_PATH") {
            config.model_path = PathBuf::from(path);
        }

        Ok(config)
    }

    /// Returns the `host:port` address to bind.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
