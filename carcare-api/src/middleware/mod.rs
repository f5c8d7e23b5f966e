pub mod auth;

pub use auth::{guard, session_gate, Access, BookingAccess, BookingScope};
