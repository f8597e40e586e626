use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::Appointment;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct AppointmentsQuery {
    pub business_id: Option<i64>,
}

/// Diagnostic listing of a business's appointments. Defaults to the first
/// active business, the same one the webhook routes conversations to.
pub async fn list_appointments(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AppointmentsQuery>,
) -> Result<Json<Vec<Appointment>>, AppError> {
    let db = state.db.lock().unwrap();

    let business_id = match query.business_id {
        Some(id) => {
            queries::find_business(&db, id)?
                .ok_or_else(|| AppError::NotFound(format!("business {id}")))?
                .id
        }
        None => match queries::find_active_businesses(&db)?.first() {
            Some(business) => business.id,
            None => return Ok(Json(Vec::new())),
        },
    };

    Ok(Json(queries::list_appointments(&db, business_id)?))
}
