pub mod handlers;

use crate::core::ConfigProvider;
use crate::utils::error::{CityError, Result};
use axum::{
    error_handling::HandleErrorLayer,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use handlers::AppState;
use std::{any::Any, future::Future, net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::{
    limit::ConcurrencyLimitLayer, load_shed::LoadShedLayer, timeout::TimeoutLayer, BoxError,
    ServiceBuilder,
};
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};

#[derive(Debug, Clone, Copy)]
pub struct ServerLimits {
    pub request_timeout: Duration,
    pub concurrency_limit: usize,
}

impl ServerLimits {
    pub fn from_config<C: ConfigProvider>(config: &C) -> Self {
        Self {
            request_timeout: Duration::from_secs(config.timeout_seconds()),
            concurrency_limit: config.concurrency_limit(),
        }
    }
}

async fn map_middleware_error(err: BoxError) -> impl IntoResponse {
    if err.is::<tower::timeout::error::Elapsed>() {
        (
            StatusCode::REQUEST_TIMEOUT,
            Json(serde_json::json!({ "error": "request timed out" })),
        )
    } else if err.is::<tower::load_shed::error::Overloaded>() {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "error": "service overloaded" })),
        )
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": format!("Unhandled internal error: {}", err) })),
        )
    }
}

fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    tracing::error!("💥 Request handler panicked: {}", detail);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": "Internal server error" })),
    )
        .into_response()
}

fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::index_handler))
        .route("/health", get(handlers::health_handler))
        .route("/search", get(handlers::search_handler))
        .route("/autocomplete", get(handlers::autocomplete_handler))
        .route("/city/:id", get(handlers::city_handler))
        .fallback(handlers::fallback_handler)
        .with_state(state)
}

/// 建立完整的 API router。
///
/// 限流 / 逾時堆疊包住整個路由表一次，所有路由共用同一個 semaphore；
/// `Router::layer` 會替每條路由各自套一份，不能用在這裡。
pub fn router(state: Arc<AppState>, limits: ServerLimits) -> Router {
    // HandleErrorLayer 必須包住會失敗的 layer
    let guarded = ServiceBuilder::new()
        .layer(HandleErrorLayer::<_, ()>::new(map_middleware_error))
        .layer(LoadShedLayer::new())
        .layer(ConcurrencyLimitLayer::new(limits.concurrency_limit))
        .layer(TimeoutLayer::new(limits.request_timeout))
        .service(routes(state));

    Router::new()
        .fallback_service(guarded)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

pub async fn bind(addr: SocketAddr) -> Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .map_err(|e| CityError::ServerError {
            message: format!("failed to bind {}: {}", addr, e),
        })
}

/// Serves `app` on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let local_addr = listener.local_addr()?;
    tracing::info!("🚀 City Search API listening on {}", local_addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async move {
            shutdown.await;
            tracing::info!("shutting down gracefully");
        })
        .await
        .map_err(|e| CityError::ServerError {
            message: format!("server error: {}", e),
        })
}

/// Resolves on Ctrl-C, or SIGTERM on unix (what `docker stop` sends).
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install CTRL+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Multi-thread runtime with a fixed number of worker threads.
pub fn build_runtime(workers: usize) -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(workers)
        .thread_name("city-search-worker")
        .enable_all()
        .build()
        .map_err(|e| CityError::ServerError {
            message: format!("failed to start runtime: {}", e),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limits_follow_config() {
        let config = crate::ServerConfig {
            timeout_seconds: 30,
            concurrency_limit: 8,
            default_limit: 5,
            max_limit: 20,
            ..Default::default()
        };

        let limits = ServerLimits::from_config(&config);
        assert_eq!(limits.request_timeout, Duration::from_secs(30));
        assert_eq!(limits.concurrency_limit, 8);

        let policy = crate::core::search::LimitPolicy::from_config(&config);
        assert_eq!(policy.parse_limit(None).unwrap(), 5);
        assert_eq!(policy.parse_limit(Some("500")).unwrap(), 20);
    }

    #[test]
    fn test_panic_payload_becomes_json_500() {
        let response = handle_panic(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = handle_panic(Box::new(String::from("boom")));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_runtime_uses_requested_workers() {
        let runtime = build_runtime(2).unwrap();
        assert_eq!(runtime.metrics().num_workers(), 2);
    }

    #[tokio::test]
    async fn test_bind_conflict_is_server_error() {
        let first = bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
        let taken = first.local_addr().unwrap();

        let err = bind(taken).await.unwrap_err();
        assert!(matches!(err, CityError::ServerError { .. }));
        assert_eq!(err.exit_code(), 4);
    }
}
