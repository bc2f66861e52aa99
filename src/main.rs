use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use chatquota_backend::controllers::{chat::ChatController, usage::UsageController};
use chatquota_backend::domain::auth::JwtVerifier;
use chatquota_backend::domain::chat::ChatService;
use chatquota_backend::domain::usage::UsageService;
use chatquota_backend::infrastructure::config::{Config, LogFormat};
use chatquota_backend::infrastructure::db::{check_connection, create_pool, run_migrations};
use chatquota_backend::infrastructure::http::{build_router, cors_layer, start_http_server};
use chatquota_backend::infrastructure::jobs::spawn_usage_purge;
use chatquota_backend::infrastructure::repositories::{
    OpenAiChatRepository, UsageRepository, UserRepository,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    init_logging(&config);

    tracing::info!(
        "Starting chat quota backend on {}:{}",
        config.host,
        config.port
    );

    // Create database connection pool
    let pool = create_pool(&config.database_url).await?;
    tracing::info!("Database connection pool created");

    check_connection(&pool).await?;
    tracing::info!("Database connection verified");

    run_migrations(&pool).await?;
    tracing::info!("Database migrations applied");

    let limits = config.daily_limits();
    tracing::info!(
        guest = limits.guest,
        free = limits.free,
        premium = limits.premium,
        "Daily limits configured"
    );

    let pool = Arc::new(pool);
    let config = Arc::new(config);

    // === DEPENDENCY INJECTION SETUP ===
    // 1. Instantiate repositories (inject db pool / http client)
    tracing::info!("Instantiating repositories...");
    let usage_repo = Arc::new(UsageRepository::new(pool.clone()));
    let user_repo = Arc::new(UserRepository::new(pool.clone()));
    let chat_repo = Arc::new(OpenAiChatRepository::new(
        reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?,
        config.chat_api_base_url.clone(),
        config.chat_api_key.clone(),
        config.chat_model.clone(),
    ));

    // 2. Instantiate services (inject repositories)
    tracing::info!("Instantiating services...");
    let usage_service = Arc::new(UsageService::new(usage_repo, user_repo, limits));
    let chat_service = Arc::new(ChatService::new(chat_repo, usage_service.clone()));

    // 3. Instantiate controllers (inject services)
    tracing::info!("Instantiating controllers...");
    let usage_controller = Arc::new(UsageController::new(usage_service.clone(), config.clone()));
    let chat_controller = Arc::new(ChatController::new(chat_service));
    let verifier = Arc::new(JwtVerifier::new(&config.jwt_secret));

    // 4. Background jobs
    let purge_job = spawn_usage_purge(
        usage_service,
        Duration::from_secs(config.usage_purge_interval_secs),
    );

    let cors = cors_layer(&config.cors_allowed_origins)?;
    let app = build_router(
        pool.clone(),
        verifier,
        usage_controller,
        chat_controller,
        cors,
    );

    // Start HTTP server with all routes
    let result = start_http_server(config, app).await;

    if let Some(job) = purge_job {
        job.abort();
    }
    pool.close().await;
    tracing::info!("Database pool closed");

    result
}

fn init_logging(config: &Config) {
    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "chatquota_backend=debug,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "chatquota_backend=debug,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
