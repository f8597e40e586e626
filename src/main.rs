use std::sync::{Arc, Mutex};

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use randevu::config::AppConfig;
use randevu::db;
use randevu::handlers;
use randevu::services::agent::http::HttpAgentGateway;
use randevu::services::intent;
use randevu::services::messaging::twilio::TwilioWhatsAppProvider;
use randevu::services::sessions::SessionStore;
use randevu::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    tracing::info!("using agent at {}", config.agent_base_url);
    let agent = HttpAgentGateway::new(config.agent_base_url.clone());

    let messaging = TwilioWhatsAppProvider::new(
        config.twilio_account_sid.clone(),
        config.twilio_auth_token.clone(),
        config.twilio_whatsapp_number.clone(),
    );

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        agent: Box::new(agent),
        messaging: Box::new(messaging),
        sessions: SessionStore::new(),
        handlers: intent::registry(),
    });

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/webhook/whatsapp", post(handlers::webhook::whatsapp_webhook))
        .route("/api/appointments", get(handlers::appointments::list_appointments))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
