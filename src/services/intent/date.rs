use chrono::{Local, NaiveDate};

use super::IntentHandler;
use crate::models::{AgentResponse, BookingState, Session};
use crate::state::AppState;

/// Stores the requested calendar date. Accepts `YYYY-MM-DD` and
/// `DD.MM.YYYY`; anything unparseable falls back to today rather than
/// bouncing the turn back to the customer.
pub struct ProvideDate;

impl IntentHandler for ProvideDate {
    fn intent_key(&self) -> &'static str {
        "provide_date"
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
        let Some(raw) = info.get_str("date_preference") else {
            return Ok(());
        };

        let date = parse_date(raw.trim()).unwrap_or_else(|| {
            tracing::warn!(date = %raw, "unparseable date preference, defaulting to today");
            Local::now().date_naive()
        });

        session.selected_date = Some(date);
        session.state = BookingState::AwaitingTime;
        Ok(())
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    if raw.contains('.') {
        let mut parts = raw.split('.');
        let day = parts.next()?.trim().parse().ok()?;
        let month = parts.next()?.trim().parse().ok()?;
        let year = parts.next()?.trim().parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, day)
    } else {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dotted() {
        assert_eq!(parse_date("15.03.2025"), NaiveDate::from_ymd_opt(2025, 3, 15));
        assert_eq!(parse_date("1.9.2025"), NaiveDate::from_ymd_opt(2025, 9, 1));
    }

    #[test]
    fn test_parse_iso() {
        assert_eq!(parse_date("2025-03-15"), NaiveDate::from_ymd_opt(2025, 3, 15));
    }

    #[test]
    fn test_parse_garbage() {
        assert_eq!(parse_date("not-a-date"), None);
        assert_eq!(parse_date("32.13.2025"), None);
        assert_eq!(parse_date(""), None);
    }
}
