pub mod booking;
pub mod email;
pub mod repository;
pub mod results;
pub mod service;

pub use booking::{Booking, BookingFilter, BookingPatch, NewBooking, UpsertPlan};
pub use results::{DeleteResult, InsertResult, UpdateResult};
pub use service::{Service, ServiceSummary};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Storage failure: {0}")]
    StorageError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
