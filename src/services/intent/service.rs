use rust_decimal::Decimal;

use super::IntentHandler;
use crate::db::queries;
use crate::models::{AgentResponse, BookingState, Session};
use crate::state::AppState;

/// Matches the customer's free-text service preference against the target
/// business's catalog and aggregates duration and price over the matches.
///
/// Matching is deliberately coarse: a service matches when the preference
/// contains the first token of its name, case-insensitively, so "haircut
/// and beard" picks up both "Haircut" and "Beard Trim". The selection
/// replaces any previous one wholesale.
pub struct ProvideService;

impl IntentHandler for ProvideService {
    fn intent_key(&self) -> &'static str {
        "provide_service"
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
        let Some(preference) = info.get_str("service_preference") else {
            return Ok(());
        };
        let preference = preference.to_lowercase();

        let services = {
            let db = state.db.lock().unwrap();
            queries::list_active_services(&db, session.target_business_id())?
        };

        session.selected_service_ids.clear();
        let mut total_duration = 0i32;
        let mut total_price = Decimal::ZERO;
        let mut currency: Option<String> = None;

        for service in &services {
            let name = service.name.to_lowercase();
            let Some(token) = name.split_whitespace().next() else {
                continue;
            };
            if preference.contains(token) {
                session.selected_service_ids.push(service.id);
                total_duration += service.duration_minutes;
                if let Some(price) = service.price {
                    total_price += price;
                }
                if currency.is_none() {
                    currency = service.currency.clone();
                }
            }
        }

        // No match falls back to the first catalog entry; an empty catalog
        // leaves the selection empty.
        if session.selected_service_ids.is_empty() {
            if let Some(first) = services.first() {
                session.selected_service_ids.push(first.id);
                total_duration = first.duration_minutes;
                total_price = first.price.unwrap_or(Decimal::ZERO);
                currency = first.currency.clone();
            }
        }

        session.total_duration_minutes = Some(total_duration);
        session.total_price = Some(total_price);
        session.total_currency = currency;
        session.state = BookingState::AwaitingDate;
        Ok(())
    }
}
