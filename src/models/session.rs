use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::Business;

/// Position in the booking dialogue. The agent suggests transitions by
/// label; handlers advance the state when their step completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingState {
    Initial,
    AwaitingLocation,
    AwaitingBarberSelection,
    AwaitingName,
    AwaitingService,
    AwaitingDate,
    AwaitingTime,
    AwaitingConfirmation,
    Completed,
}

impl BookingState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingState::Initial => "INITIAL",
            BookingState::AwaitingLocation => "AWAITING_LOCATION",
            BookingState::AwaitingBarberSelection => "AWAITING_BARBER_SELECTION",
            BookingState::AwaitingName => "AWAITING_NAME",
            BookingState::AwaitingService => "AWAITING_SERVICE",
            BookingState::AwaitingDate => "AWAITING_DATE",
            BookingState::AwaitingTime => "AWAITING_TIME",
            BookingState::AwaitingConfirmation => "AWAITING_CONFIRMATION",
            BookingState::Completed => "COMPLETED",
        }
    }

    /// Parse a state label suggested by the agent. Labels arrive in mixed
    /// case and occasionally with Turkish accented letters ("AWAİTİNG_DATE"),
    /// so the label is upper-cased and transliterated before matching.
    /// Unknown labels yield `None` and leave the caller's state untouched.
    pub fn from_label(raw: &str) -> Option<Self> {
        let folded: String = raw
            .to_uppercase()
            .chars()
            .map(|c| match c {
                'İ' => 'I',
                'Ğ' => 'G',
                'Ü' => 'U',
                'Ş' => 'S',
                'Ö' => 'O',
                'Ç' => 'C',
                _ => c,
            })
            .collect();

        match folded.as_str() {
            "INITIAL" => Some(BookingState::Initial),
            "AWAITING_LOCATION" => Some(BookingState::AwaitingLocation),
            "AWAITING_BARBER_SELECTION" => Some(BookingState::AwaitingBarberSelection),
            "AWAITING_NAME" => Some(BookingState::AwaitingName),
            "AWAITING_SERVICE" => Some(BookingState::AwaitingService),
            "AWAITING_DATE" => Some(BookingState::AwaitingDate),
            "AWAITING_TIME" => Some(BookingState::AwaitingTime),
            "AWAITING_CONFIRMATION" => Some(BookingState::AwaitingConfirmation),
            "COMPLETED" => Some(BookingState::Completed),
            _ => None,
        }
    }
}

/// Per-(phone, business) conversation record. Created lazily on the first
/// inbound message and kept for the lifetime of the process; a completed
/// booking leaves the record in place so a repeat customer keeps their
/// identity and selections.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub phone: String,
    pub business_id: i64,
    pub state: BookingState,
    pub customer_id: Option<i64>,
    /// Branch the customer was routed to, when it differs from the
    /// business that received the message.
    pub selected_business_id: Option<i64>,
    pub selected_location: Option<String>,
    /// Candidates produced by the last location search, indexed by the
    /// customer's 1-based selection.
    pub available_businesses: Vec<Business>,
    pub selected_date: Option<NaiveDate>,
    pub selected_time: Option<NaiveDateTime>,
    pub selected_service_ids: Vec<i64>,
    pub total_duration_minutes: Option<i32>,
    pub total_price: Option<Decimal>,
    pub total_currency: Option<String>,
}

impl Session {
    pub fn new(phone: &str, business_id: i64) -> Self {
        Self {
            phone: phone.to_string(),
            business_id,
            state: BookingState::Initial,
            customer_id: None,
            selected_business_id: None,
            selected_location: None,
            available_businesses: Vec::new(),
            selected_date: None,
            selected_time: None,
            selected_service_ids: Vec::new(),
            total_duration_minutes: None,
            total_price: None,
            total_currency: None,
        }
    }

    /// Business the booking targets: the branch the customer picked, or the
    /// business the conversation started in.
    pub fn target_business_id(&self) -> i64 {
        self.selected_business_id.unwrap_or(self.business_id)
    }

    /// Clear all booking progress but keep the identity of the record.
    /// Not called automatically; a completed session is reused as-is for
    /// repeat bookings.
    pub fn reset(&mut self) {
        self.state = BookingState::Initial;
        self.customer_id = None;
        self.selected_business_id = None;
        self.selected_location = None;
        self.available_businesses.clear();
        self.selected_date = None;
        self.selected_time = None;
        self.selected_service_ids.clear();
        self.total_duration_minutes = None;
        self.total_price = None;
        self.total_currency = None;
    }
}
