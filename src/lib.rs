pub mod config;
pub mod core;
pub mod domain;
pub mod probe;
pub mod server;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, Command, ServeOptions};

pub use config::{cli::LocalDataSource, ServerConfig};
pub use crate::core::{engine::LoadEngine, index::MemoryStore, search::SearchService};
pub use utils::error::{CityError, Result};
