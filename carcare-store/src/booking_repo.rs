use async_trait::async_trait;
use carcare_core::repository::BookingRepository;
use carcare_core::{
    Booking, BookingFilter, BookingPatch, CoreError, CoreResult, DeleteResult, InsertResult, NewBooking,
    UpdateResult, UpsertPlan,
};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, info};
use uuid::Uuid;

use crate::document::{db_error, DocumentRow};

/// Insert, lose the race to a concurrent insert, then merge as an update.
const UPSERT_ATTEMPTS: usize = 2;

pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn create_booking(&self, booking: NewBooking) -> CoreResult<InsertResult> {
        let booking = booking.into_booking(Uuid::new_v4());

        sqlx::query("INSERT INTO service_bookings (id, doc) VALUES ($1, $2)")
            .bind(booking.id)
            .bind(Json(booking.document()))
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(InsertResult::new(booking.id))
    }

    async fn list_bookings(&self, filter: &BookingFilter) -> CoreResult<Vec<Booking>> {
        let rows = match filter {
            BookingFilter::All => {
                sqlx::query_as::<_, DocumentRow>(
                    "SELECT id, doc FROM service_bookings ORDER BY created_at",
                )
                .fetch_all(&self.pool)
                .await
            }
            BookingFilter::ByEmail(email) => {
                sqlx::query_as::<_, DocumentRow>(
                    "SELECT id, doc FROM service_bookings WHERE doc->>'email' = $1 ORDER BY created_at",
                )
                .bind(email)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(db_error)?;

        rows.into_iter().map(DocumentRow::into_model).collect()
    }

    async fn get_booking(&self, id: Uuid) -> CoreResult<Option<Booking>> {
        let row = sqlx::query_as::<_, DocumentRow>("SELECT id, doc FROM service_bookings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        row.map(DocumentRow::into_model).transpose()
    }

    async fn upsert_booking(&self, id: Uuid, patch: BookingPatch) -> CoreResult<UpdateResult> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        for _ in 0..UPSERT_ATTEMPTS {
            let current = lock_booking(&mut tx, id).await?;
            let plan = UpsertPlan::new(current, id, patch.clone())?;

            let applied = match &plan {
                UpsertPlan::Insert(booking) => {
                    let outcome = sqlx::query(
                        "INSERT INTO service_bookings (id, doc) VALUES ($1, $2) ON CONFLICT (id) DO NOTHING",
                    )
                    .bind(booking.id)
                    .bind(Json(booking.document()))
                    .execute(&mut *tx)
                    .await
                    .map_err(db_error)?;
                    outcome.rows_affected() == 1
                }
                UpsertPlan::Update(booking) => {
                    sqlx::query("UPDATE service_bookings SET doc = $1, updated_at = NOW() WHERE id = $2")
                        .bind(Json(booking.document()))
                        .bind(booking.id)
                        .execute(&mut *tx)
                        .await
                        .map_err(db_error)?;
                    true
                }
                UpsertPlan::Unchanged => true,
            };

            if applied {
                tx.commit().await.map_err(db_error)?;
                if matches!(plan, UpsertPlan::Insert(_)) {
                    info!("Booking {} created by upsert", id);
                }
                return Ok(plan.result(id));
            }

            // A concurrent upsert inserted the row first; merge into it instead
            debug!("Booking {} appeared during upsert, retrying as update", id);
        }

        Err(CoreError::StorageError(format!("booking {} could not be upserted", id)))
    }

    async fn delete_booking(&self, id: Uuid) -> CoreResult<DeleteResult> {
        let outcome = sqlx::query("DELETE FROM service_bookings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(DeleteResult::new(outcome.rows_affected()))
    }
}

/// Row lock so a concurrent merge cannot be lost between read and write.
async fn lock_booking(tx: &mut Transaction<'_, Postgres>, id: Uuid) -> CoreResult<Option<Booking>> {
    sqlx::query_as::<_, DocumentRow>("SELECT id, doc FROM service_bookings WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(db_error)?
        .map(DocumentRow::into_model::<Booking>)
        .transpose()
}
