use chrono::{Duration, Local, NaiveTime};

use super::IntentHandler;
use crate::db::queries;
use crate::models::{AgentResponse, BookingState, NewAppointment, Session};
use crate::services::booking;
use crate::state::AppState;

/// Turns the accumulated session slots into a booking. Missing slots are
/// filled with defaults: the business's first active service, noon on the
/// selected date, or an hour from now. A failed booking is logged and
/// absorbed; the session stays in place so the customer can try again.
pub struct ConfirmAppointment;

impl IntentHandler for ConfirmAppointment {
    fn intent_key(&self) -> &'static str {
        "confirm_appointment"
    }

    fn handle(
        &self,
        state: &AppState,
        session: &mut Session,
        _response: &AgentResponse,
    ) -> anyhow::Result<()> {
        let Some(customer_id) = session.customer_id else {
            return Ok(());
        };
        let business_id = session.target_business_id();

        let service_id = match session.selected_service_ids.first().copied() {
            Some(id) => Some(id),
            None => {
                let db = state.db.lock().unwrap();
                queries::list_active_services(&db, business_id)?
                    .first()
                    .map(|s| s.id)
            }
        };
        let Some(service_id) = service_id else {
            tracing::warn!(business = business_id, "no service to book against");
            return Ok(());
        };

        let start_time = match (session.selected_time, session.selected_date) {
            (Some(time), _) => time,
            (None, Some(date)) => date.and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap_or_default()),
            (None, None) => Local::now().naive_local() + Duration::hours(1),
        };

        let request = NewAppointment {
            customer_id,
            service_id,
            start_time,
            notes: None,
        };

        let created = {
            let db = state.db.lock().unwrap();
            booking::create_appointment(&db, &request, business_id)
        };

        match created {
            Ok(appointment) => {
                tracing::info!(
                    appointment = %appointment.id,
                    business = business_id,
                    start = %appointment.start_time,
                    "appointment created"
                );
                session.state = BookingState::Completed;
            }
            Err(e) => {
                // Absorbed: the customer gets no failure signal here.
                tracing::error!(error = %e, business = business_id, "appointment creation failed");
            }
        }

        Ok(())
    }
}
