mod barber;
mod confirm;
mod date;
mod location;
mod name;
mod service;
mod time;

use crate::models::{AgentResponse, Session};
use crate::state::AppState;

/// One unit of booking logic bound to a single intent label. A handler
/// reads the extracted slot values, mutates the session, may call the
/// booking collaborators, and advances the state when its step completes.
/// Missing or malformed slots make a handler no-op rather than fail the
/// turn.
pub trait IntentHandler: Send + Sync {
    fn intent_key(&self) -> &'static str;

    fn handle(
        &self,
        state: &AppState,
        session: &mut Session,
        response: &AgentResponse,
    ) -> anyhow::Result<()>;
}

/// The fixed handler set. One handler per intent label; intents without a
/// handler leave the session untouched.
pub fn registry() -> Vec<Box<dyn IntentHandler>> {
    vec![
        Box::new(location::ProvideLocation),
        Box::new(barber::SelectBarber),
        Box::new(name::ProvideName),
        Box::new(service::ProvideService),
        Box::new(date::ProvideDate),
        Box::new(time::ProvideTime),
        Box::new(confirm::ConfirmAppointment),
    ]
}

/// Invoke the single handler whose key matches the classified intent,
/// case-insensitively.
pub fn dispatch(
    state: &AppState,
    session: &mut Session,
    response: &AgentResponse,
) -> anyhow::Result<()> {
    for handler in &state.handlers {
        if handler.intent_key().eq_ignore_ascii_case(&response.intent) {
            return handler.handle(state, session, response);
        }
    }
    Ok(())
}
