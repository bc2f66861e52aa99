use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::controllers::{chat::ChatController, health, usage::UsageController};
use crate::domain::auth::JwtVerifier;
use crate::infrastructure::auth::{identity_middleware, request_id_middleware, X_REQUEST_ID};
use crate::infrastructure::config::Config;
use crate::infrastructure::db::DbPool;

/// CORS policy for browser clients. An empty origin list allows any origin.
pub fn cors_layer(allowed_origins: &[String]) -> Result<CorsLayer, header::InvalidHeaderValue> {
    let origins = if allowed_origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        let values = allowed_origins
            .iter()
            .map(|origin| origin.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()?;
        AllowOrigin::list(values)
    };

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .expose_headers([HeaderName::from_static(X_REQUEST_ID)]))
}

/// Assemble all routes with their middleware
pub fn build_router(
    pool: Arc<DbPool>,
    verifier: Arc<JwtVerifier>,
    usage_controller: Arc<UsageController>,
    chat_controller: Arc<ChatController>,
    cors: CorsLayer,
) -> Router {
    // Usage routes (identity optional)
    let usage_routes = Router::new()
        .route("/api/usage", get(UsageController::get_usage))
        .route("/api/usage/reset", post(UsageController::reset_usage))
        .with_state(usage_controller)
        .layer(middleware::from_fn_with_state(
            verifier.clone(),
            identity_middleware,
        ));

    // Chat routes (identity optional)
    let chat_routes = Router::new()
        .route("/api/chat", post(ChatController::stream_chat))
        .with_state(chat_controller)
        .layer(middleware::from_fn_with_state(verifier, identity_middleware));

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::health_ready))
        .with_state(pool)
        .merge(usage_routes)
        .merge(chat_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(middleware::from_fn(request_id_middleware)),
        )
}

/// Serve the router until a shutdown signal arrives
pub async fn start_http_server(
    config: Arc<Config>,
    app: Router,
) -> Result<(), Box<dyn std::error::Error>> {
    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.host, config.port)).await?;

    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
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

    tracing::info!("Shutdown signal received");
}
