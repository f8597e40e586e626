use super::IntentHandler;
use crate::models::{AgentResponse, BookingState, Session};
use crate::state::AppState;

/// Resolves the customer's 1-based pick against the candidate list. A list
/// supplied by the agent in `barber_options` takes precedence over the one
/// stored on the session; a non-numeric or out-of-range pick changes
/// nothing.
pub struct SelectBarber;

impl IntentHandler for SelectBarber {
    fn intent_key(&self) -> &'static str {
        "select_barber"
    }

    fn handle(
        &self,
        _state: &AppState,
        session: &mut Session,
        response: &AgentResponse,
    ) -> anyhow::Result<()> {
        let Some(info) = response.extracted_info.as_ref() else {
            return Ok(());
        };
        let Some(raw) = info.get_str("barber_selection") else {
            return Ok(());
        };

        let index = match raw.trim().parse::<usize>() {
            Ok(selection) if selection >= 1 => selection - 1,
            _ => {
                tracing::warn!(selection = %raw, "barber selection is not a valid number");
                return Ok(());
            }
        };

        if let Some(options) = info.get_list("barber_options") {
            if let Some(id) = options.get(index).and_then(|o| o.get("id")).and_then(|v| v.as_i64()) {
                session.selected_business_id = Some(id);
                session.state = BookingState::AwaitingName;
                return Ok(());
            }
        }

        if let Some(candidate) = session.available_businesses.get(index) {
            session.selected_business_id = Some(candidate.id);
            session.state = BookingState::AwaitingName;
        } else {
            tracing::warn!(
                selection = %raw,
                candidates = session.available_businesses.len(),
                "barber selection out of range"
            );
        }
        Ok(())
    }
}
