use std::sync::Arc;

use crate::models::{AgentRequest, AgentResponse, BookingState, ExtractedInfo};
use crate::services::intent;
use crate::state::AppState;

/// Words that count as an unambiguous booking confirmation. Checked as
/// substrings of the lower-cased message; "e" alone also confirms.
const AFFIRMATIONS: [&str; 4] = ["evet", "onay", "tamam", "yes"];

/// Process one inbound message for a (phone, business) conversation.
///
/// The returned response carries the reply text to relay to the customer.
/// Classifier unavailability degrades to `AgentResponse::failure()`; only
/// infrastructure faults inside a handler surface as errors.
pub async fn handle_incoming(
    state: &Arc<AppState>,
    phone: &str,
    business_id: i64,
    message: &str,
) -> anyhow::Result<AgentResponse> {
    let session = state.sessions.get_or_create(phone, business_id);

    // Fast path: a plain "yes" while awaiting confirmation books directly,
    // without a round trip to the agent.
    let awaiting_confirmation = {
        let session = session.lock().unwrap();
        session.state == BookingState::AwaitingConfirmation
    };
    if awaiting_confirmation && is_affirmation(message) {
        tracing::info!(phone, "fast-path confirmation");
        let response = AgentResponse {
            ok: true,
            intent: "confirm_appointment".to_string(),
            reply: "Onayınız alındı, randevunuz oluşturuluyor.".to_string(),
            next_state: Some("completed".to_string()),
            extracted_info: Some(ExtractedInfo::default()),
        };
        let mut session = session.lock().unwrap();
        intent::dispatch(state, &mut session, &response)?;
        return Ok(response);
    }

    let request = {
        let session = session.lock().unwrap();
        AgentRequest {
            business_id,
            from_number: phone.to_string(),
            message: message.to_string(),
            session_id: Some(format!("{phone}_{business_id}")),
            current_state: Some(session.state.as_str().to_string()),
            customer_id: session.customer_id,
        }
    };

    let response = match state.agent.respond(&request).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, phone, "agent gateway call failed");
            return Ok(AgentResponse::failure());
        }
    };

    let mut session = session.lock().unwrap();

    if let Some(label) = response.next_state.as_deref() {
        match BookingState::from_label(label) {
            Some(next) => session.state = next,
            None => tracing::warn!(label, "ignoring unrecognized next_state"),
        }
    }

    if let Some(info) = response.extracted_info.as_ref() {
        // Mirror the location onto the session even when the turn was not
        // classified as provide_location, so a mislabeled turn still lands
        // the field.
        if let Some(location) = info.get_str("location_preference") {
            session.selected_location = Some(location);
        }

        intent::dispatch(state, &mut session, &response)?;
    }

    tracing::info!(
        phone,
        intent = %response.intent,
        state = session.state.as_str(),
        "turn processed"
    );

    Ok(response)
}

fn is_affirmation(message: &str) -> bool {
    let lower = message.trim().to_lowercase();
    lower == "e" || AFFIRMATIONS.iter().any(|word| lower.contains(word))
}
