pub mod agent;
pub mod appointment;
pub mod business;
pub mod customer;
pub mod service;
pub mod session;

pub use agent::{AgentRequest, AgentResponse, ExtractedInfo};
pub use appointment::{Appointment, AppointmentStatus, NewAppointment};
pub use business::Business;
pub use customer::Customer;
pub use service::ServiceItem;
pub use session::{BookingState, Session};
