use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;

/// A city record from the dataset.
///
/// Only `id` and `name` are interpreted; every other field is kept as-is and
/// returned unchanged by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    #[serde(deserialize_with = "deserialize_city_id")]
    pub id: u64,
    pub name: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl City {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            extra: serde_json::Map::new(),
        }
    }

    pub fn with_field(mut self, key: &str, value: serde_json::Value) -> Self {
        self.extra.insert(key.to_string(), value);
        self
    }

    pub fn name_key(&self) -> String {
        self.name.to_lowercase()
    }
}

// id 可能是整數或數字字串
fn deserialize_city_id<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(u64),
        Text(String),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Number(id) => Ok(id),
        RawId::Text(text) => text
            .trim()
            .parse::<u64>()
            .map_err(|_| serde::de::Error::custom(format!("invalid city id: {:?}", text))),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub count: usize,
    pub results: Vec<City>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutocompleteResponse {
    pub query: String,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub store: String,
    pub data_file: String,
    pub total_cities: usize,
    pub total_keys: usize,
    pub loaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetFormat {
    JsonArray,
    JsonLines,
}

impl std::fmt::Display for DatasetFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatasetFormat::JsonArray => write!(f, "JSON array"),
            DatasetFormat::JsonLines => write!(f, "JSONL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRecord {
    /// 1-based array position or line number.
    pub position: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadSummary {
    pub source: String,
    pub format: DatasetFormat,
    pub loaded: usize,
    pub skipped: usize,
    pub distinct_cities: usize,
    pub distinct_names: usize,
    pub total_keys: usize,
    pub elapsed: Duration,
    pub loaded_at: DateTime<Utc>,
}
