use chrono::NaiveTime;

use super::IntentHandler;
use crate::models::{AgentResponse, BookingState, Session};
use crate::state::AppState;

/// Combines the requested time of day with the already-selected date.
/// Accepts `HH:MM` and compact `HHMM`; garbage defaults to 09:00. Without
/// a selected date the time cannot be anchored and is dropped, but the
/// dialogue still advances to confirmation.
pub struct ProvideTime;

impl IntentHandler for ProvideTime {
    fn intent_key(&self) -> &'static str {
        "provide_time"
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
        let Some(raw) = info.get_str("time_preference") else {
            return Ok(());
        };

        let time = parse_time(raw.trim()).unwrap_or_else(|| {
            tracing::warn!(time = %raw, "unparseable time preference, defaulting to 09:00");
            NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default()
        });

        match session.selected_date {
            Some(date) => session.selected_time = Some(date.and_time(time)),
            None => tracing::warn!("time provided before a date, not storing"),
        }

        session.state = BookingState::AwaitingConfirmation;
        Ok(())
    }
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    if let Some((hour, minute)) = raw.split_once(':') {
        NaiveTime::from_hms_opt(hour.trim().parse().ok()?, minute.trim().parse().ok()?, 0)
    } else if raw.len() == 4 && raw.chars().all(|c| c.is_ascii_digit()) {
        NaiveTime::from_hms_opt(raw[..2].parse().ok()?, raw[2..].parse().ok()?, 0)
    } else {
        None
    }
}
