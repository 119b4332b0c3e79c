//! SubjectAI billing service binary.
//!
//! Loads configuration from the environment, connects to PostgreSQL, wires
//! the Stripe and Supabase adapters into the billing router and serves it.

use std::net::AddrParseError;
use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;
use tokio::signal;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use subjectai_billing::adapters::auth::{SupabaseAuthConfig, SupabaseSessionValidator};
use subjectai_billing::adapters::http::billing::{billing_router, BillingAppState};
use subjectai_billing::adapters::http::middleware::AuthState;
use subjectai_billing::adapters::postgres::{
    PostgresSubscriberRepository, PostgresWebhookEventRepository,
};
use subjectai_billing::adapters::stripe::{StripeClientFactory, DEFAULT_STRIPE_API_BASE_URL};
use subjectai_billing::config::{AppConfig, ConfigError, ServerConfig, ValidationError};
use subjectai_billing::ports::{PaymentProviderFactory, WebhookEventRepository};

/// How long processed webhook keys are kept. Stripe stops retrying after 3 days.
const WEBHOOK_EVENT_RETENTION_DAYS: i64 = 30;

const WEBHOOK_CLEANUP_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Invalid configuration: {0}")]
    Validation(#[from] ValidationError),

    #[error("Invalid listen address: {0}")]
    Address(#[from] AddrParseError),

    #[error("Database connection failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    let config = AppConfig::load()?;
    init_tracing(&config.server);
    config.validate()?;

    tracing::info!(
        environment = ?config.server.environment,
        stripe_mode = ?config.payment.default_mode(),
        price_map_valid = config.payment.price_map().is_valid(),
        "Starting SubjectAI billing service"
    );

    // Database
    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.connect_timeout())
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");
    }

    // Stripe
    let factory = Arc::new(StripeClientFactory::new(
        config
            .payment
            .stripe_api_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_STRIPE_API_BASE_URL.to_string()),
    ));
    let default_key = config
        .payment
        .default_api_key()
        .ok_or(ValidationError::MissingRequired("STRIPE_API_KEY or STRIPE_TEST_KEY"))?;

    // Auth
    let validator: AuthState = Arc::new(SupabaseSessionValidator::new(
        SupabaseAuthConfig::new(config.auth.supabase_jwt_secret.clone())
            .with_audience(config.auth.audience.clone()),
    ));

    let webhook_events = Arc::new(PostgresWebhookEventRepository::new(pool.clone()));
    spawn_webhook_event_cleanup(webhook_events.clone());

    let state = BillingAppState {
        payment_provider: factory.for_api_key(default_key),
        payment_providers: factory,
        subscribers: Arc::new(PostgresSubscriberRepository::new(pool)),
        webhook_events,
        webhook_candidates: Arc::new(config.payment.webhook_candidates()),
        settings: Arc::new(config.payment.billing_settings()),
    };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .merge(billing_router(validator, &config.server.cors_origins_list()))
        .with_state(state)
        .layer(TimeoutLayer::new(config.server.request_timeout()))
        .layer(TraceLayer::new_for_http());

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn init_tracing(server: &ServerConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&server.log_level));

    if server.log_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn spawn_webhook_event_cleanup(repository: Arc<dyn WebhookEventRepository>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(WEBHOOK_CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            let cutoff = chrono::Utc::now() - chrono::Duration::days(WEBHOOK_EVENT_RETENTION_DAYS);
            match repository.delete_before(cutoff).await {
                Ok(deleted) => {
                    tracing::debug!(deleted, "Pruned processed webhook events");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to prune processed webhook events");
                }
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
