use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One entry of a business's service catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceItem {
    pub id: i64,
    pub business_id: i64,
    pub name: String,
    pub duration_minutes: i32,
    pub price: Option<Decimal>,
    pub currency: Option<String>,
    pub active: bool,
}
