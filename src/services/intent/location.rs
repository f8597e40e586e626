use super::IntentHandler;
use crate::db::queries;
use crate::models::{AgentResponse, BookingState, Session};
use crate::state::AppState;

/// Resolves "City" or "City,District" into a list of business candidates
/// the customer can pick from by number.
pub struct ProvideLocation;

impl IntentHandler for ProvideLocation {
    fn intent_key(&self) -> &'static str {
        "provide_location"
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
        let Some(raw) = info.get_str("location_preference") else {
            return Ok(());
        };

        session.selected_location = Some(raw.clone());

        let (city, district) = match raw.split_once(',') {
            Some((city, district)) => (city.trim(), Some(district.trim())),
            None => (raw.trim(), None),
        };

        let candidates = {
            let db = state.db.lock().unwrap();
            match district.filter(|d| !d.is_empty()) {
                Some(district) => queries::find_businesses_by_city_and_district(&db, city, district)?,
                None => queries::find_businesses_by_city(&db, city)?,
            }
        };

        tracing::info!(city, candidates = candidates.len(), "location search");

        session.available_businesses = candidates;
        session.state = BookingState::AwaitingBarberSelection;
        Ok(())
    }
}
