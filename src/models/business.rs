use serde::{Deserialize, Serialize};

/// A bookable business (a barber shop branch). Conversations start against
/// one business but may be routed to another via the location flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Business {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub city: String,
    pub district: Option<String>,
    pub active: bool,
}
