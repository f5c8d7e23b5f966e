//! In-process stores, used by tests and when no Redis URL is configured.

use async_trait::async_trait;
use carcare_core::repository::{BookingRepository, ServiceRepository, SessionRegistry};
use carcare_core::{
    Booking, BookingFilter, BookingPatch, CoreResult, DeleteResult, InsertResult, NewBooking,
    Service, ServiceSummary, UpdateResult, UpsertPlan,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Clone, Default)]
pub struct MemoryServiceRepository {
    services: Arc<RwLock<Vec<Service>>>,
}

impl MemoryServiceRepository {
    pub fn with_services(services: Vec<Service>) -> Self {
        Self {
            services: Arc::new(RwLock::new(services)),
        }
    }
}

#[async_trait]
impl ServiceRepository for MemoryServiceRepository {
    async fn list_services(&self) -> CoreResult<Vec<Service>> {
        Ok(self.services.read().await.clone())
    }

    async fn get_service_summary(&self, id: Uuid) -> CoreResult<Option<ServiceSummary>> {
        let services = self.services.read().await;
        Ok(services.iter().find(|s| s.id == id).map(ServiceSummary::from))
    }
}

/// Bookings in insertion order.
#[derive(Clone, Default)]
pub struct MemoryBookingRepository {
    bookings: Arc<RwLock<Vec<Booking>>>,
}

impl MemoryBookingRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookingRepository for MemoryBookingRepository {
    async fn create_booking(&self, booking: NewBooking) -> CoreResult<InsertResult> {
        let booking = booking.into_booking(Uuid::new_v4());
        let id = booking.id;
        self.bookings.write().await.push(booking);
        Ok(InsertResult::new(id))
    }

    async fn list_bookings(&self, filter: &BookingFilter) -> CoreResult<Vec<Booking>> {
        let bookings = self.bookings.read().await;
        Ok(bookings.iter().filter(|b| filter.matches(b)).cloned().collect())
    }

    async fn get_booking(&self, id: Uuid) -> CoreResult<Option<Booking>> {
        let bookings = self.bookings.read().await;
        Ok(bookings.iter().find(|b| b.id == id).cloned())
    }

    async fn upsert_booking(&self, id: Uuid, patch: BookingPatch) -> CoreResult<UpdateResult> {
        // Held across read and write, like the row lock in the Postgres store
        let mut bookings = self.bookings.write().await;
        let position = bookings.iter().position(|b| b.id == id);
        let current = position.map(|i| bookings[i].clone());

        let plan = UpsertPlan::new(current, id, patch)?;
        let result = plan.result(id);

        match plan {
            UpsertPlan::Insert(booking) => bookings.push(booking),
            UpsertPlan::Update(booking) => {
                if let Some(i) = position {
                    bookings[i] = booking;
                }
            }
            UpsertPlan::Unchanged => {}
        }

        Ok(result)
    }

    async fn delete_booking(&self, id: Uuid) -> CoreResult<DeleteResult> {
        let mut bookings = self.bookings.write().await;
        let before = bookings.len();
        bookings.retain(|b| b.id != id);
        Ok(DeleteResult::new((before - bookings.len()) as u64))
    }
}

#[derive(Clone, Default)]
pub struct MemorySessionRegistry {
    revoked: Arc<RwLock<HashMap<Uuid, Instant>>>,
}

impl MemorySessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRegistry for MemorySessionRegistry {
    async fn revoke(&self, token_id: Uuid, ttl_seconds: u64) -> CoreResult<()> {
        let now = Instant::now();
        let mut revoked = self.revoked.write().await;
        // Expired entries are dropped on write so the map stays bounded by live tokens
        revoked.retain(|_, until| *until > now);
        revoked.insert(token_id, now + Duration::from_secs(ttl_seconds));
        Ok(())
    }

    async fn is_revoked(&self, token_id: Uuid) -> CoreResult<bool> {
        let revoked = self.revoked.read().await;
        Ok(revoked
            .get(&token_id)
            .is_some_and(|until| *until > Instant::now()))
    }
}
