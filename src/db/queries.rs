use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;

use crate::models::{Appointment, AppointmentStatus, Business, Customer, ServiceItem};

const DT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn parse_datetime(raw: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(raw, DT_FORMAT).unwrap_or_else(|_| Utc::now().naive_utc())
}

fn parse_price(raw: Option<String>) -> Option<Decimal> {
    raw.and_then(|s| s.parse().ok())
}

// ── Businesses ──

fn business_from_row(row: &Row) -> rusqlite::Result<Business> {
    Ok(Business {
        id: row.get(0)?,
        name: row.get(1)?,
        phone: row.get(2)?,
        city: row.get(3)?,
        district: row.get(4)?,
        active: row.get(5)?,
    })
}

pub fn insert_business(
    conn: &Connection,
    name: &str,
    phone: &str,
    city: &str,
    district: Option<&str>,
    active: bool,
) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO businesses (name, phone, city, district, active) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![name, phone, city, district, active],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn find_business(conn: &Connection, id: i64) -> anyhow::Result<Option<Business>> {
    let business = conn
        .query_row(
            "SELECT id, name, phone, city, district, active FROM businesses WHERE id = ?1",
            params![id],
            business_from_row,
        )
        .optional()?;
    Ok(business)
}

pub fn find_active_businesses(conn: &Connection) -> anyhow::Result<Vec<Business>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, phone, city, district, active FROM businesses
         WHERE active = 1 ORDER BY id",
    )?;
    let rows = stmt.query_map([], business_from_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn find_businesses_by_city(conn: &Connection, city: &str) -> anyhow::Result<Vec<Business>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, phone, city, district, active FROM businesses
         WHERE active = 1 AND city = ?1 COLLATE NOCASE ORDER BY id",
    )?;
    let rows = stmt.query_map(params![city], business_from_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn find_businesses_by_city_and_district(
    conn: &Connection,
    city: &str,
    district: &str,
) -> anyhow::Result<Vec<Business>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, phone, city, district, active FROM businesses
         WHERE active = 1 AND city = ?1 COLLATE NOCASE AND district = ?2 COLLATE NOCASE
         ORDER BY id",
    )?;
    let rows = stmt.query_map(params![city, district], business_from_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

// ── Customers ──

fn customer_from_row(row: &Row) -> rusqlite::Result<Customer> {
    Ok(Customer {
        id: row.get(0)?,
        business_id: row.get(1)?,
        name: row.get(2)?,
        phone: row.get(3)?,
    })
}

/// Get-or-create keyed by (business, phone). An existing customer keeps
/// their stored name; the freshly extracted one is not written over it.
pub fn create_or_fetch_customer(
    conn: &Connection,
    name: &str,
    phone: &str,
    business_id: i64,
) -> anyhow::Result<Customer> {
    let existing = conn
        .query_row(
            "SELECT id, business_id, name, phone FROM customers
             WHERE business_id = ?1 AND phone = ?2",
            params![business_id, phone],
            customer_from_row,
        )
        .optional()?;

    if let Some(customer) = existing {
        return Ok(customer);
    }

    conn.execute(
        "INSERT INTO customers (business_id, name, phone) VALUES (?1, ?2, ?3)",
        params![business_id, name, phone],
    )?;

    Ok(Customer {
        id: conn.last_insert_rowid(),
        business_id,
        name: name.to_string(),
        phone: phone.to_string(),
    })
}

pub fn find_customer(
    conn: &Connection,
    id: i64,
    business_id: i64,
) -> anyhow::Result<Option<Customer>> {
    let customer = conn
        .query_row(
            "SELECT id, business_id, name, phone FROM customers
             WHERE id = ?1 AND business_id = ?2",
            params![id, business_id],
            customer_from_row,
        )
        .optional()?;
    Ok(customer)
}

// ── Services ──

fn service_from_row(row: &Row) -> rusqlite::Result<ServiceItem> {
    Ok(ServiceItem {
        id: row.get(0)?,
        business_id: row.get(1)?,
        name: row.get(2)?,
        duration_minutes: row.get(3)?,
        price: parse_price(row.get(4)?),
        currency: row.get(5)?,
        active: row.get(6)?,
    })
}

pub fn insert_service(
    conn: &Connection,
    business_id: i64,
    name: &str,
    duration_minutes: i32,
    price: Option<Decimal>,
    currency: Option<&str>,
    active: bool,
) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO services (business_id, name, duration_minutes, price, currency, active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            business_id,
            name,
            duration_minutes,
            price.map(|p| p.to_string()),
            currency,
            active
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list_active_services(conn: &Connection, business_id: i64) -> anyhow::Result<Vec<ServiceItem>> {
    let mut stmt = conn.prepare(
        "SELECT id, business_id, name, duration_minutes, price, currency, active FROM services
         WHERE business_id = ?1 AND active = 1 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![business_id], service_from_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn find_service(
    conn: &Connection,
    id: i64,
    business_id: i64,
) -> anyhow::Result<Option<ServiceItem>> {
    let service = conn
        .query_row(
            "SELECT id, business_id, name, duration_minutes, price, currency, active FROM services
             WHERE id = ?1 AND business_id = ?2",
            params![id, business_id],
            service_from_row,
        )
        .optional()?;
    Ok(service)
}

// ── Appointments ──

fn appointment_from_row(row: &Row) -> rusqlite::Result<Appointment> {
    let start: String = row.get(4)?;
    let end: String = row.get(5)?;
    let status: String = row.get(6)?;
    let created: String = row.get(9)?;
    Ok(Appointment {
        id: row.get(0)?,
        business_id: row.get(1)?,
        customer_id: row.get(2)?,
        service_id: row.get(3)?,
        start_time: parse_datetime(&start),
        end_time: parse_datetime(&end),
        status: AppointmentStatus::parse(&status),
        total_price: parse_price(row.get(7)?),
        currency: row.get(8)?,
        created_at: parse_datetime(&created),
        notes: row.get(10)?,
    })
}

pub fn insert_appointment(conn: &Connection, appointment: &Appointment) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO appointments
         (id, business_id, customer_id, service_id, start_time, end_time, status, total_price, currency, notes, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            appointment.id,
            appointment.business_id,
            appointment.customer_id,
            appointment.service_id,
            appointment.start_time.format(DT_FORMAT).to_string(),
            appointment.end_time.format(DT_FORMAT).to_string(),
            appointment.status.as_str(),
            appointment.total_price.map(|p| p.to_string()),
            appointment.currency,
            appointment.notes,
            appointment.created_at.format(DT_FORMAT).to_string(),
        ],
    )?;
    Ok(())
}

/// True when a non-cancelled appointment of the business overlaps the
/// [start, end) window.
pub fn has_overlapping_appointment(
    conn: &Connection,
    business_id: i64,
    start: &NaiveDateTime,
    end: &NaiveDateTime,
) -> anyhow::Result<bool> {
    let overlapping: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM appointments
         WHERE business_id = ?1 AND status != 'cancelled'
           AND start_time < ?3 AND end_time > ?2",
        params![
            business_id,
            start.format(DT_FORMAT).to_string(),
            end.format(DT_FORMAT).to_string()
        ],
        |row| row.get(0),
    )?;
    Ok(overlapping)
}

pub fn list_appointments(conn: &Connection, business_id: i64) -> anyhow::Result<Vec<Appointment>> {
    let mut stmt = conn.prepare(
        "SELECT id, business_id, customer_id, service_id, start_time, end_time, status, total_price, currency, created_at, notes
         FROM appointments WHERE business_id = ?1 ORDER BY start_time",
    )?;
    let rows = stmt.query_map(params![business_id], appointment_from_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}
