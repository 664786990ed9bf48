pub mod error;
pub mod health;
pub mod predict;
pub mod pricing;
pub mod window;

use axum::{
    error_handling::HandleErrorLayer,
    http::{header, Method},
    routing::{get, post},
    BoxError, Router,
};
use std::time::Duration;
use tower::{timeout::TimeoutLayer, ServiceBuilder};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::{app::AppState, config::Config, render::STATIC_PREFIX};
use error::ApiError;

pub fn router(state: AppState, cfg: &Config) -> Router {
    let mut router = Router::new()
        .route("/predict", post(predict::predict))
        .route("/predict_revenue", post(window::predict_revenue))
        .route("/predict_wastage", post(window::predict_wastage))
        .route("/predict_combined", post(window::predict_combined))
        .route("/update_price", post(pricing::update_price))
        .route("/price", get(pricing::current_price))
        .route("/health", get(health::health_check))
        .route("/healthz", get(health::liveness_check))
        .nest_service(STATIC_PREFIX, ServeDir::new(&cfg.charts.static_dir))
        .with_state(state);

    if cfg.server.enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE]);
        router = router.layer(cors);
    }

    let router = router.layer(axum::extract::DefaultBodyLimit::max(64 * 1024));
    with_timeout(router, Duration::from_secs(cfg.server.request_timeout_secs))
        .layer(CatchPanicLayer::custom(error::panic_response))
        .layer(TraceLayer::new_for_http())
}

/// Bounds each request; an elapsed deadline answers 408 with the JSON error body
pub(crate) fn with_timeout(router: Router, timeout: Duration) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(HandleErrorLayer::new(handle_middleware_error))
            .layer(TimeoutLayer::new(timeout)),
    )
}

async fn handle_middleware_error(err: BoxError) -> ApiError {
    if err.is::<tower::timeout::error::Elapsed>() {
        ApiError::RequestTimeout
    } else {
        ApiError::InternalError(format!("middleware failure: {err}"))
    }
}

#[cfg(feature = "metrics")]
pub fn with_metrics(app: Router) -> Router {
    use axum_prometheus::PrometheusMetricLayer;
    let (layer, handle) = PrometheusMetricLayer::pair();

    let metrics_router =
        Router::new().route("/metrics", get(move || async move { handle.render() }));

    app.layer(layer).merge(metrics_router)
}
