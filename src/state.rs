use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::config::AppConfig;
use crate::services::agent::AgentGateway;
use crate::services::intent::IntentHandler;
use crate::services::messaging::MessagingProvider;
use crate::services::sessions::SessionStore;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub agent: Box<dyn AgentGateway>,
    pub messaging: Box<dyn MessagingProvider>,
    pub sessions: SessionStore,
    pub handlers: Vec<Box<dyn IntentHandler>>,
}
