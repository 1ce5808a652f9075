//! AMSync Payments server.
//!
//! Loads configuration from the environment, wires adapters to ports and
//! serves the HTTP API.

use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, HeaderValue, Method};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use amsync_payments::adapters::audit::InMemoryEntitlementAuditLog;
use amsync_payments::adapters::auth::{JwtConfig, JwtSessionValidator};
use amsync_payments::adapters::gateway::{HttpGatewayConfig, HttpPaymentGateway, MockPaymentGateway};
use amsync_payments::adapters::http::{app_router, AuthState, PaymentAppState, PaymentDependencies};
use amsync_payments::adapters::ledger::{
    CachedTransactionLedger, FileLedgerStore, InMemoryLedgerStore, RedisTransactionLedger,
};
use amsync_payments::adapters::profile::{InMemoryProfileRepository, PostgresProfileRepository};
use amsync_payments::application::handlers::{
    CheckoutSettings, PollingSettings, ReconcilerSettings, WebhookSettings,
};
use amsync_payments::config::{
    AppConfig, GatewayBackend, LedgerBackend, LogFormat, ProfileStoreBackend, ServerConfig,
};
use amsync_payments::domain::foundation::Timestamp;
use amsync_payments::domain::payment::Amount;
use amsync_payments::ports::{PaymentGateway, ProfileRepository, TransactionLedger};

/// How often expired ledger entries are swept.
const LEDGER_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    init_tracing(&config.server);
    config.validate()?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.server.environment,
        "Starting AMSync payments server"
    );

    let currency = config.gateway.currency()?;
    let gateway = build_gateway(&config)?;
    let ledger = build_ledger(&config).await?;
    let profiles = build_profile_store(&config).await?;
    let validator: AuthState = Arc::new(JwtSessionValidator::new(JwtConfig::new(
        config.auth.jwt_secret.clone(),
        config.auth.issuer.clone(),
        config.auth.audience.clone(),
    )));

    spawn_ledger_sweeper(ledger.clone());

    let state = PaymentAppState::new(PaymentDependencies {
        gateway,
        ledger,
        profiles,
        audit_log: Arc::new(InMemoryEntitlementAuditLog::new()),
        payment_method: config.gateway.payment_method.clone(),
        webhook_secret: config.gateway.webhook_secret().map(str::to_owned),
        checkout: CheckoutSettings {
            currency: currency.clone(),
            callback_url: config.gateway.callback_url.clone(),
            return_url: config.gateway.return_url.clone(),
        },
        webhook: WebhookSettings {
            require_signature: config.is_production(),
            default_currency: currency.clone(),
        },
        reconciler: ReconcilerSettings {
            verify_with_gateway: config.reconciler.verify_with_gateway,
            plan_amount: Amount::whole(config.reconciler.plan_amount),
            plan_context: config.reconciler.plan_context.clone(),
            currency,
            dashboard_countdown_secs: config.reconciler.dashboard_countdown_secs,
            payment_countdown_secs: config.reconciler.payment_countdown_secs,
            home_redirect_delay_secs: config.reconciler.home_redirect_delay_secs,
        },
        polling: PollingSettings {
            interval: config.polling.interval(),
            timeout: config.polling.timeout(),
        },
    });

    let app = app_router(state, validator)
        .layer(TimeoutLayer::new(config.server.request_timeout()))
        .layer(build_cors(&config.server))
        .layer(TraceLayer::new_for_http());

    let addr = config.server.socket_addr()?;
    tracing::info!(%addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing(server: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&server.log_level));

    let registry = tracing_subscriber::registry().with(filter);
    match server.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

fn build_gateway(config: &AppConfig) -> anyhow::Result<Arc<dyn PaymentGateway>> {
    match config.gateway.backend {
        GatewayBackend::Http => {
            let gateway = HttpPaymentGateway::new(
                HttpGatewayConfig::new(&config.gateway.base_url, &config.gateway.api_key)
                    .with_environment(&config.gateway.environment)
                    .with_timeout(config.gateway.timeout()),
            )?;
            tracing::info!(gateway = %config.gateway.name, "Using HTTP payment gateway");
            Ok(Arc::new(gateway))
        }
        GatewayBackend::Mock => {
            tracing::warn!("Using mock payment gateway");
            Ok(Arc::new(MockPaymentGateway::new()))
        }
    }
}

async fn build_ledger(config: &AppConfig) -> anyhow::Result<Arc<dyn TransactionLedger>> {
    let retention = config.ledger.retention();
    match config.ledger.backend {
        LedgerBackend::Memory => {
            tracing::warn!("Transaction ledger is in memory; entries are lost on restart");
            Ok(Arc::new(CachedTransactionLedger::with_retention(
                InMemoryLedgerStore::new(),
                retention,
            )))
        }
        LedgerBackend::File => {
            tracing::info!(path = %config.ledger.file_path.display(), "Using file transaction ledger");
            Ok(Arc::new(CachedTransactionLedger::with_retention(
                FileLedgerStore::new(&config.ledger.file_path),
                retention,
            )))
        }
        LedgerBackend::Redis => {
            let url = config
                .ledger
                .redis_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("ledger.redis_url is required for the redis ledger"))?;
            let client = redis::Client::open(url)?;
            let conn = client.get_multiplexed_tokio_connection().await?;
            tracing::info!("Using Redis transaction ledger");
            Ok(Arc::new(
                RedisTransactionLedger::new(conn).with_retention(retention),
            ))
        }
    }
}

async fn build_profile_store(config: &AppConfig) -> anyhow::Result<Arc<dyn ProfileRepository>> {
    let store = &config.profile_store;
    match store.backend {
        ProfileStoreBackend::Memory => {
            tracing::warn!("Profile store is in memory; entitlements are lost on restart");
            Ok(Arc::new(InMemoryProfileRepository::new()))
        }
        ProfileStoreBackend::Postgres => {
            let url = store.database_url.as_deref().ok_or_else(|| {
                anyhow::anyhow!("profile_store.database_url is required for postgres")
            })?;
            let pool = PgPoolOptions::new()
                .min_connections(store.min_connections)
                .max_connections(store.max_connections)
                .acquire_timeout(store.acquire_timeout())
                .connect(url)
                .await?;
            let repo = PostgresProfileRepository::new(pool);
            if store.run_migrations {
                repo.migrate().await?;
                tracing::info!("Profile store migrations applied");
            }
            Ok(Arc::new(repo))
        }
    }
}

fn build_cors(server: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = server
        .cors_origins_list()
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
}

fn spawn_ledger_sweeper(ledger: Arc<dyn TransactionLedger>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(LEDGER_SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            if let Err(e) = ledger.sweep_expired(Timestamp::now()).await {
                tracing::warn!(error = %e, "Ledger sweep failed");
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
