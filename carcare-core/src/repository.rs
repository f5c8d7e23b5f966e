use async_trait::async_trait;
use uuid::Uuid;

use crate::booking::{Booking, BookingFilter, BookingPatch, NewBooking};
use crate::results::{DeleteResult, InsertResult, UpdateResult};
use crate::service::{Service, ServiceSummary};
use crate::CoreResult;

/// Read access to the service catalog
#[async_trait]
pub trait ServiceRepository: Send + Sync {
    async fn list_services(&self) -> CoreResult<Vec<Service>>;

    async fn get_service_summary(&self, id: Uuid) -> CoreResult<Option<ServiceSummary>>;
}

/// Repository trait for booking documents
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn create_booking(&self, booking: NewBooking) -> CoreResult<InsertResult>;

    async fn list_bookings(&self, filter: &BookingFilter) -> CoreResult<Vec<Booking>>;

    async fn get_booking(&self, id: Uuid) -> CoreResult<Option<Booking>>;

    /// Merges `patch` into the booking, inserting a new document under `id` if none exists.
    async fn upsert_booking(&self, id: Uuid, patch: BookingPatch) -> CoreResult<UpdateResult>;

    async fn delete_booking(&self, id: Uuid) -> CoreResult<DeleteResult>;
}

/// Server-side record of sessions ended before their token expired.
#[async_trait]
pub trait SessionRegistry: Send + Sync {
    /// Marks the token id as revoked. Entries only need to outlive the token itself.
    async fn revoke(&self, token_id: Uuid, ttl_seconds: u64) -> CoreResult<()>;

    async fn is_revoked(&self, token_id: Uuid) -> CoreResult<bool>;
}
