//! Lexbot server binary
//!
//! Loads configuration, connects to PostgreSQL, builds the LLM provider and
//! CRM clients, then serves the chat and lead routers over axum.

use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use lexbot::adapters::ai::build_provider;
use lexbot::adapters::crm::{GeimserConfig, GeimserDispatcher, XelIntakeClient, XelIntakeConfig};
use lexbot::adapters::http::{chat_router, lead_router, ChatAppState, LeadAppState};
use lexbot::adapters::postgres::{PostgresConversationStore, PostgresLeadRepository};
use lexbot::application::{ChatTurnHandler, LeadRecorder};
use lexbot::config::{AppConfig, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    init_tracing(&config.server.log_level);
    info!(
        environment = ?config.server.environment,
        "starting lexbot"
    );

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("database migrations applied");
    }

    let provider = build_provider(&config.ai)?;
    info!(provider = provider.name(), "llm provider ready");

    let crm_timeout = Duration::from_secs(config.crm.timeout_secs);
    let intake: Arc<XelIntakeClient> = Arc::new(XelIntakeClient::new(
        XelIntakeConfig::new(
            config.crm.intake_url.clone(),
            config.crm.resolved_intake_token(),
        )
        .with_timeout(crm_timeout),
    ));
    let dispatcher = Arc::new(GeimserDispatcher::new(
        GeimserConfig::new(
            config.crm.ingest_url.clone(),
            config.crm.resolved_ingest_key(),
        )
        .with_timeout(crm_timeout),
    ));

    let store = Arc::new(PostgresConversationStore::new(pool.clone()));
    let repository = Arc::new(PostgresLeadRepository::new(pool));
    let recorder = Arc::new(LeadRecorder::new(repository, &config.leads));

    let chat_turn = Arc::new(ChatTurnHandler::new(
        store,
        provider,
        recorder.clone(),
        intake.clone(),
        config.leads.max_history_messages,
        config.server.is_production(),
    ));

    let app = Router::new()
        .merge(chat_router().with_state(ChatAppState::new(chat_turn)))
        .merge(lead_router().with_state(LeadAppState::new(dispatcher, recorder, intake)))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.server))
        .layer(TimeoutLayer::new(config.server.request_timeout()));

    let addr = config.server.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "listening");

    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(log_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

/// Permissive CORS when no origins are configured, an explicit allow
/// list otherwise. Misconfigured origin values are skipped with a log
/// line rather than refusing to boot.
fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins = config.cors_origins_list();
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(parsed)
        .allow_methods(Any)
        .allow_headers(Any)
}
