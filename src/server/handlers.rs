use crate::core::search::{normalize_query, LimitPolicy, QueryError, SearchService};
use crate::core::{AutocompleteResponse, City, HealthReport, SearchResponse};
use crate::utils::error::CityError;
use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub search: SearchService,
    pub limits: LimitPolicy,
}

impl AppState {
    pub fn new(search: SearchService, limits: LimitPolicy) -> Arc<Self> {
        Arc::new(Self { search, limits })
    }
}

// --- Error Handling ---
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound(String),
    Internal(CityError),
}

impl From<QueryError> for AppError {
    fn from(err: QueryError) -> Self {
        AppError::BadRequest(err.0)
    }
}

impl From<CityError> for AppError {
    fn from(err: CityError) -> Self {
        AppError::Internal(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            AppError::BadRequest(s) => (StatusCode::BAD_REQUEST, s),
            AppError::NotFound(s) => (StatusCode::NOT_FOUND, s),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(serde_json::json!({ "error": msg }))).into_response()
    }
}

type QueryPairs = Result<Query<Vec<(String, String)>>, QueryRejection>;

/// Raw query string; `limit` stays a string so a bad value becomes a 400
/// with our own message instead of the extractor's rejection.
///
/// 重複的參數只取第一個值 (`?q=a&q=b` 以 `a` 查詢)。
#[derive(Debug, Default, PartialEq)]
pub struct SearchParams {
    pub q: Option<String>,
    pub limit: Option<String>,
}

impl SearchParams {
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "q" => &mut params.q,
                "limit" => &mut params.limit,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        params
    }

    fn extract(query: QueryPairs) -> Result<Self, AppError> {
        match query {
            Ok(Query(pairs)) => Ok(Self::from_pairs(pairs)),
            Err(rejection) => Err(AppError::BadRequest(rejection.body_text())),
        }
    }
}

/// `/city/<id>` 只接受純數字 (不含正負號)。
fn parse_city_id(raw: &str) -> Option<u64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

pub async fn index_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "City Search API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "/search": "Search cities by name (e.g., /search?q=shanghai&limit=10)",
            "/city/<id>": "Get city by ID (e.g., /city/1796236)",
            "/autocomplete": "Fast name autocomplete (e.g., /autocomplete?q=sh)",
            "/health": "Health check"
        }
    }))
}

pub async fn health_handler(State(state): State<Arc<AppState>>) -> Response {
    match state.search.health().await {
        Ok(report) => Json::<HealthReport>(report).into_response(),
        Err(e) => {
            tracing::warn!("⚠️  Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({
                    "status": "error",
                    "store": "unavailable",
                    "error": e.to_string(),
                })),
            )
                .into_response()
        }
    }
}

pub async fn search_handler(
    State(state): State<Arc<AppState>>,
    query: QueryPairs,
) -> Result<Json<SearchResponse>, AppError> {
    let params = SearchParams::extract(query)?;
    let query = normalize_query(params.q.as_deref())?;
    let limit = state.limits.parse_limit(params.limit.as_deref())?;

    Ok(Json(state.search.search(&query, limit).await?))
}

pub async fn autocomplete_handler(
    State(state): State<Arc<AppState>>,
    query: QueryPairs,
) -> Result<Json<AutocompleteResponse>, AppError> {
    let params = SearchParams::extract(query)?;
    let query = normalize_query(params.q.as_deref())?;
    let limit = state.limits.parse_limit(params.limit.as_deref())?;

    Ok(Json(state.search.autocomplete(&query, limit).await?))
}

pub async fn city_handler(
    State(state): State<Arc<AppState>>,
    raw_id: Result<Path<String>, PathRejection>,
) -> Result<Json<City>, AppError> {
    let not_found = || AppError::NotFound("City not found".to_string());

    // 非整數 id 與不存在的 id 一樣回 404
    let id = raw_id
        .ok()
        .and_then(|Path(raw)| parse_city_id(&raw))
        .ok_or_else(not_found)?;
    state.search.city(id).await?.map(Json).ok_or_else(not_found)
}

pub async fn fallback_handler() -> AppError {
    AppError::NotFound("Not found".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_search_params_keep_first_value() {
        let params = SearchParams::from_pairs(pairs(&[
            ("q", "sh"),
            ("limit", "2"),
            ("q", "zz"),
            ("limit", "50"),
            ("callback", "x"),
        ]));

        assert_eq!(params.q.as_deref(), Some("sh"));
        assert_eq!(params.limit.as_deref(), Some("2"));
    }

    #[test]
    fn test_search_params_missing_keys() {
        assert_eq!(SearchParams::from_pairs(Vec::new()), SearchParams::default());
    }

    #[test]
    fn test_parse_city_id_digits_only() {
        assert_eq!(parse_city_id("2988507"), Some(2988507));
        assert_eq!(parse_city_id("005"), Some(5));
        assert_eq!(parse_city_id("+5"), None);
        assert_eq!(parse_city_id("-5"), None);
        assert_eq!(parse_city_id(" 5"), None);
        assert_eq!(parse_city_id(""), None);
        assert_eq!(parse_city_id("99999999999999999999999"), None);
    }
}
