pub mod engine;
pub mod index;
pub mod loader;
pub mod search;

pub use crate::domain::model::{
    AutocompleteResponse, City, DatasetFormat, HealthReport, LoadSummary, SearchResponse,
    SkippedRecord,
};
pub use crate::domain::ports::{CityStore, ConfigProvider, DataSource};
pub use crate::utils::error::Result;
