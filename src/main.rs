use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{error_handling::HandleErrorLayer, http::StatusCode};
use tower::{BoxError, ServiceBuilder};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use barbershop_booking_service::{
    auth::NonceCache, create_router, services::database::create_database_service, AppState,
    Config, NotificationClient,
};

// Error handler
async fn handle_error(error: BoxError) -> (StatusCode, String) {
    if error.is::<tower::timeout::error::Elapsed>() {
        (
            StatusCode::REQUEST_TIMEOUT,
            "Request took too long".to_string(),
        )
    } else if error.is::<tower::load_shed::error::Overloaded>() {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            "Service is overloaded, try again later".to_string(),
        )
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Unhandled internal error: {}", error),
        )
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!("Invalid configuration: {}", err);
            std::process::exit(1);
        }
    };

    #[cfg(feature = "sentry-monitoring")]
    let _sentry_guard = std::env::var("SENTRY_DSN").ok().map(|dsn| {
        info!("Sentry error tracking enabled");
        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    // Initialize the database service
    let database =
        create_database_service(&config.data_dir).expect("Failed to initialize database service");

    let notifier = NotificationClient::new(
        config.notification_webhook_url.as_deref(),
        config.notification_signing_key.clone(),
    )
    .expect("Failed to initialize notification client");

    if config.gateway_secret.is_some() {
        info!("Actor header signatures will be verified");
    } else {
        warn!("No gateway secret provided - actor headers are trusted as sent");
    }

    if config.is_production {
        info!("Running in PRODUCTION mode");
    } else {
        info!("Running in DEVELOPMENT mode");
    }

    // Create shared application state
    let app_state = Arc::new(AppState {
        database,
        notifier: Arc::new(notifier),
        policy: config.scheduling_policy(),
        gateway_secret: config.gateway_secret.clone(),
        signature_max_skew_secs: config.signature_max_skew_secs,
        utc_offset: chrono::Duration::minutes(i64::from(config.utc_offset_minutes)),
        nonces: Mutex::new(NonceCache::default()),
    });

    let app = create_router(app_state).layer(
        ServiceBuilder::new()
            .layer(HandleErrorLayer::new(handle_error))
            .load_shed()
            .concurrency_limit(config.concurrency_limit)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::new().allow_origin(Any)),
    );

    let addr = config.bind_addr();
    info!("Server listening on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    // Set up signal handler for graceful shutdown
    let shutdown = async {
        let ctrl_c = async {
            tokio::signal::ctrl_c()
                .await
                .expect("Failed to install Ctrl+C handler");
        };

        #[cfg(unix)]
        let terminate = async {
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("Failed to install SIGTERM handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                info!("Received interrupt signal, starting graceful shutdown");
            },
            _ = terminate => {
                info!("Received terminate signal, starting graceful shutdown");
            },
        }
    };

    // Start server with graceful shutdown
    info!("Server is ready to accept connections");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .expect("Failed to start server");

    info!("Server has been gracefully shut down");
}
