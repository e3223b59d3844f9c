use crate::core::{
    AutocompleteResponse, City, CityStore, ConfigProvider, HealthReport, SearchResponse,
};
use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub const DEFAULT_LIMIT: usize = 10;
pub const MAX_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryError(pub String);

impl std::fmt::Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated search term: the trimmed input and its lowercase index key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedQuery {
    pub display: String,
    pub key: String,
}

pub fn normalize_query(raw: Option<&str>) -> std::result::Result<NormalizedQuery, QueryError> {
    let trimmed = raw.unwrap_or("").trim();
    if trimmed.is_empty() {
        return Err(QueryError("Query parameter \"q\" required".to_string()));
    }

    Ok(NormalizedQuery {
        display: trimmed.to_string(),
        key: trimmed.to_lowercase(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitPolicy {
    pub default_limit: usize,
    pub max_limit: usize,
}

impl Default for LimitPolicy {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            max_limit: MAX_LIMIT,
        }
    }
}

impl LimitPolicy {
    pub fn from_config<C: ConfigProvider>(config: &C) -> Self {
        Self {
            default_limit: config.default_limit(),
            max_limit: config.max_limit(),
        }
    }

    pub fn parse_limit(&self, raw: Option<&str>) -> std::result::Result<usize, QueryError> {
        let limit = match raw.map(str::trim) {
            None | Some("") => self.default_limit,
            Some(value) => value.parse::<usize>().map_err(|_| {
                QueryError("Query parameter \"limit\" must be a non-negative integer".to_string())
            })?,
        };
        Ok(limit.min(self.max_limit))
    }
}

/// Query side of the API, on top of any [`CityStore`].
#[derive(Clone)]
pub struct SearchService {
    store: Arc<dyn CityStore>,
    data_file: String,
    loaded_at: DateTime<Utc>,
}

impl SearchService {
    pub fn new(store: Arc<dyn CityStore>, data_file: impl Into<String>, loaded_at: DateTime<Utc>) -> Self {
        Self {
            store,
            data_file: data_file.into(),
            loaded_at,
        }
    }

    /// Exact-name matches first, then the remaining prefix matches, each
    /// group in ascending id order.
    async fn matching_ids(&self, query: &NormalizedQuery, limit: usize) -> Result<Vec<u64>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let mut ids = self.store.ids_by_name(&query.key).await?;
        ids.truncate(limit);

        let prefix_ids = self.store.ids_by_prefix(&query.key, limit + ids.len()).await?;
        for id in prefix_ids {
            if ids.len() >= limit {
                break;
            }
            if !ids.contains(&id) {
                ids.push(id);
            }
        }

        Ok(ids)
    }

    pub async fn search(&self, query: &NormalizedQuery, limit: usize) -> Result<SearchResponse> {
        let ids = self.matching_ids(query, limit).await?;
        let results = self.store.get_many(&ids).await?;
        tracing::debug!("search '{}' matched {} cities", query.key, results.len());

        Ok(SearchResponse {
            query: query.display.clone(),
            count: results.len(),
            results,
        })
    }

    pub async fn autocomplete(
        &self,
        query: &NormalizedQuery,
        limit: usize,
    ) -> Result<AutocompleteResponse> {
        let ids = self.matching_ids(query, limit).await?;
        let suggestions = self
            .store
            .get_many(&ids)
            .await?
            .into_iter()
            .map(|city| city.name)
            .collect();

        Ok(AutocompleteResponse {
            query: query.display.clone(),
            suggestions,
        })
    }

    pub async fn city(&self, id: u64) -> Result<Option<City>> {
        self.store.get(id).await
    }

    pub async fn health(&self) -> Result<HealthReport> {
        self.store.ping().await?;

        Ok(HealthReport {
            status: "ok".to_string(),
            store: "loaded".to_string(),
            data_file: self.data_file.clone(),
            total_cities: self.store.city_count().await?,
            total_keys: self.store.key_count().await?,
            loaded_at: self.loaded_at,
        })
    }
}
