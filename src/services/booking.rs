use chrono::{Duration, Utc};
use rusqlite::Connection;

use crate::db::queries;
use crate::models::{Appointment, AppointmentStatus, NewAppointment};

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("business not found or inactive: {0}")]
    BusinessNotFound(i64),

    #[error("customer not found: {0}")]
    CustomerNotFound(i64),

    #[error("service not found or inactive: {0}")]
    ServiceNotFound(i64),

    #[error("requested time slot is no longer available")]
    SlotTaken,

    #[error("database error: {0}")]
    Database(#[from] anyhow::Error),
}

/// Create an appointment for a business after validating every referenced
/// record and the slot itself. Price and currency are copied from the
/// service at booking time; a service without a currency books in TRY.
pub fn create_appointment(
    conn: &Connection,
    request: &NewAppointment,
    business_id: i64,
) -> Result<Appointment, BookingError> {
    let business = queries::find_business(conn, business_id)?
        .filter(|b| b.active)
        .ok_or(BookingError::BusinessNotFound(business_id))?;

    let customer = queries::find_customer(conn, request.customer_id, business.id)?
        .ok_or(BookingError::CustomerNotFound(request.customer_id))?;

    let service = queries::find_service(conn, request.service_id, business.id)?
        .filter(|s| s.active)
        .ok_or(BookingError::ServiceNotFound(request.service_id))?;

    let end_time = request.start_time + Duration::minutes(i64::from(service.duration_minutes));

    if queries::has_overlapping_appointment(conn, business.id, &request.start_time, &end_time)? {
        return Err(BookingError::SlotTaken);
    }

    let appointment = Appointment {
        id: uuid::Uuid::new_v4().to_string(),
        business_id: business.id,
        customer_id: customer.id,
        service_id: service.id,
        start_time: request.start_time,
        end_time,
        status: AppointmentStatus::Pending,
        total_price: service.price,
        currency: service
            .currency
            .clone()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| "TRY".to_string()),
        notes: request.notes.clone(),
        created_at: Utc::now().naive_utc(),
    };

    queries::insert_appointment(conn, &appointment)?;

    Ok(appointment)
}
