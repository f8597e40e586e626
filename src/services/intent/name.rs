use super::IntentHandler;
use crate::db::queries;
use crate::models::{AgentResponse, BookingState, Session};
use crate::state::AppState;

/// Resolves the customer's identity: normalizes the phone, finds or creates
/// the customer record under the target business.
pub struct ProvideName;

impl IntentHandler for ProvideName {
    fn intent_key(&self) -> &'static str {
        "provide_name"
    }

    fn handle(
        &self,
        state: &AppState,
        session: &mut Session,
        response: &AgentResponse,
    ) -> anyhow::Result<()> {
        let Some(info) = response.extracted_info.as_ref() else {
            return Ok(());
        };
        let Some(name) = info.get_str("customer_name") else {
            return Ok(());
        };
        let name = name.trim();

        let phone = if session.phone.starts_with('+') {
            session.phone.clone()
        } else {
            format!("+{}", session.phone)
        };

        let business_id = session.target_business_id();
        let customer = {
            let db = state.db.lock().unwrap();
            queries::create_or_fetch_customer(&db, name, &phone, business_id)?
        };

        tracing::info!(customer = customer.id, business = business_id, "customer resolved");

        session.customer_id = Some(customer.id);
        session.state = BookingState::AwaitingService;
        Ok(())
    }
}
