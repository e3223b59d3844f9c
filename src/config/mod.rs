pub mod cli;
pub mod toml_config;

use crate::config::cli::LocalDataSource;
use crate::config::toml_config::TomlConfig;
use crate::core::search::LimitPolicy;
use crate::core::ConfigProvider;
use crate::utils::error::{CityError, Result};
use crate::utils::logger::LogFormat;
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

pub const DEFAULT_BIND: &str = "0.0.0.0:5000";
pub const DEFAULT_WORKERS: usize = 4;
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 120;
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 1024;
pub const DEFAULT_DATA_FILE: &str = "cities.json";

/// Effective settings after defaults, the TOML file and CLI/env overrides
/// have been layered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind: String,
    pub workers: usize,
    pub timeout_seconds: u64,
    pub concurrency_limit: usize,
    pub data_dir: String,
    pub data_file: String,
    pub default_limit: usize,
    pub max_limit: usize,
    pub log_format: LogFormat,
    pub verbose: bool,
    pub monitor: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let limits = LimitPolicy::default();
        Self {
            bind: DEFAULT_BIND.to_string(),
            workers: DEFAULT_WORKERS,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
            data_dir: ".".to_string(),
            data_file: DEFAULT_DATA_FILE.to_string(),
            default_limit: limits.default_limit,
            max_limit: limits.max_limit,
            log_format: LogFormat::Compact,
            verbose: false,
            monitor: false,
        }
    }
}

impl ServerConfig {
    pub fn apply_file(&mut self, file: &TomlConfig) {
        let server = &file.server;
        if let Some(bind) = &server.bind {
            self.bind = bind.clone();
        }
        if let Some(workers) = server.workers {
            self.workers = workers;
        }
        if let Some(timeout) = server.timeout_seconds {
            self.timeout_seconds = timeout;
        }
        if let Some(limit) = server.concurrency_limit {
            self.concurrency_limit = limit;
        }
        if let Some(dir) = &file.data.dir {
            self.data_dir = dir.clone();
        }
        if let Some(data_file) = &file.data.file {
            self.data_file = data_file.clone();
        }
        if let Some(default_limit) = file.search.default_limit {
            self.default_limit = default_limit;
        }
        if let Some(max_limit) = file.search.max_limit {
            self.max_limit = max_limit;
        }
        if let Some(format) = file.logging.format {
            self.log_format = format;
        }
        if let Some(verbose) = file.logging.verbose {
            self.verbose = verbose;
        }
        if let Some(enabled) = file.monitoring.enabled {
            self.monitor = enabled;
        }
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        validation::validate_socket_addr("server.bind", &self.bind)
    }

    pub fn data_source(&self) -> LocalDataSource {
        LocalDataSource::new(self.data_dir.clone(), self.data_file.clone())
    }
}

impl ConfigProvider for ServerConfig {
    fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds
    }

    fn concurrency_limit(&self) -> usize {
        self.concurrency_limit
    }

    fn default_limit(&self) -> usize {
        self.default_limit
    }

    fn max_limit(&self) -> usize {
        self.max_limit
    }
}

impl Validate for ServerConfig {
    fn validate(&self) -> Result<()> {
        self.socket_addr()?;
        validation::validate_range("server.workers", self.workers, 1, 256)?;
        validation::validate_range("server.timeout_seconds", self.timeout_seconds, 1, 3600)?;
        validation::validate_at_least("server.concurrency_limit", self.concurrency_limit, 1)?;
        validation::validate_path("data.dir", &self.data_dir)?;
        validation::validate_dataset_file("data.file", &self.data_file)?;
        validation::validate_at_least("search.max_limit", self.max_limit, 1)?;

        if self.default_limit > self.max_limit {
            return Err(CityError::InvalidConfigValueError {
                field: "search.default_limit".to_string(),
                value: self.default_limit.to_string(),
                reason: format!("must not exceed search.max_limit ({})", self.max_limit),
            });
        }

        Ok(())
    }
}

#[cfg(feature = "cli")]
pub use args::{CliConfig, Command, ServeOptions};

#[cfg(feature = "cli")]
mod args {
    use super::*;
    use clap::{Args, Parser, Subcommand};

    #[derive(Debug, Clone, Parser)]
    #[command(name = "city-search")]
    #[command(about = "City search API over a static cities dataset", version)]
    pub struct CliConfig {
        #[command(subcommand)]
        pub command: Command,
    }

    #[derive(Debug, Clone, Subcommand)]
    pub enum Command {
        /// Load the dataset and serve the HTTP API
        Serve(ServeOptions),
        /// Load and index the dataset, print a summary and exit
        Load(ServeOptions),
    }

    impl Command {
        pub fn options(&self) -> &ServeOptions {
            match self {
                Command::Serve(options) | Command::Load(options) => options,
            }
        }
    }

    #[derive(Debug, Clone, Default, Args)]
    pub struct ServeOptions {
        /// Path to a TOML settings file
        #[arg(short, long, env = "CITY_SEARCH_CONFIG")]
        pub config: Option<String>,

        /// Address and port to bind
        #[arg(short, long, env = "CITY_SEARCH_BIND")]
        pub bind: Option<String>,

        /// Number of runtime worker threads
        #[arg(short, long, env = "CITY_SEARCH_WORKERS")]
        pub workers: Option<usize>,

        /// Per-request timeout in seconds
        #[arg(short, long, env = "CITY_SEARCH_TIMEOUT")]
        pub timeout: Option<u64>,

        #[arg(long, env = "CITY_SEARCH_CONCURRENCY_LIMIT")]
        pub concurrency_limit: Option<usize>,

        /// Directory holding the dataset file
        #[arg(long, env = "CITY_SEARCH_DATA_DIR")]
        pub data_dir: Option<String>,

        /// Dataset file name (JSON array or JSON Lines)
        #[arg(long, env = "CITY_SEARCH_DATA_FILE")]
        pub data_file: Option<String>,

        #[arg(long, env = "CITY_SEARCH_DEFAULT_LIMIT")]
        pub default_limit: Option<usize>,

        #[arg(long, env = "CITY_SEARCH_MAX_LIMIT")]
        pub max_limit: Option<usize>,

        #[arg(long, value_enum, env = "CITY_SEARCH_LOG_FORMAT")]
        pub log_format: Option<LogFormat>,

        #[arg(short, long, env = "CITY_SEARCH_VERBOSE", help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, env = "CITY_SEARCH_MONITOR", help = "Log CPU and memory usage while loading")]
        pub monitor: bool,
    }

    impl ServeOptions {
        /// 預設值 <- TOML 檔案 <- 命令列/環境變數
        pub fn resolve(&self) -> Result<ServerConfig> {
            let mut config = ServerConfig::default();

            if let Some(path) = &self.config {
                let file = TomlConfig::from_file(path)?;
                config.apply_file(&file);
            }

            self.apply_overrides(&mut config);
            Ok(config)
        }

        pub fn apply_overrides(&self, config: &mut ServerConfig) {
            if let Some(bind) = &self.bind {
                config.bind = bind.clone();
            }
            if let Some(workers) = self.workers {
                config.workers = workers;
            }
            if let Some(timeout) = self.timeout {
                config.timeout_seconds = timeout;
            }
            if let Some(limit) = self.concurrency_limit {
                config.concurrency_limit = limit;
            }
            if let Some(dir) = &self.data_dir {
                config.data_dir = dir.clone();
            }
            if let Some(file) = &self.data_file {
                config.data_file = file.clone();
            }
            if let Some(default_limit) = self.default_limit {
                config.default_limit = default_limit;
            }
            if let Some(max_limit) = self.max_limit {
                config.max_limit = max_limit;
            }
            if let Some(format) = self.log_format {
                config.log_format = format;
            }
            config.verbose |= self.verbose;
            config.monitor |= self.monitor;
        }
    }
}
