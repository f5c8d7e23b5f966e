use axum::{
    extract::State,
    Json,
    routing::{delete, get, patch, post},
    Router,
};
use carcare_core::{Booking, BookingPatch, DeleteResult, InsertResult, NewBooking, UpdateResult};
use carcare_shared::Masked;
use tracing::info;
use uuid::Uuid;
use crate::{
    error::{AppError, AppJson, AppPath},
    middleware::{guard, BookingAccess, BookingScope},
    state::AppState,
};

pub fn routes(state: &AppState) -> Router<AppState> {
    let access = BookingAccess::from(state.auth.booking_gate);

    Router::new()
        .route("/service-bookings", guard(access.create, post(create_booking), state))
        .route("/service-bookings", guard(access.list, get(list_bookings), state))
        .route("/service-bookings/{id}", guard(access.read, get(get_booking), state))
        .route("/service-bookings/{id}", guard(access.update, patch(update_booking), state))
        .route("/service-bookings/{id}", guard(access.delete, delete(delete_booking), state))
}

async fn create_booking(
    State(state): State<AppState>,
    AppJson(booking): AppJson<NewBooking>,
) -> Result<Json<InsertResult>, AppError> {
    booking.validate()?;
    let email = booking.email.clone();

    let result = state.bookings.create_booking(booking).await?;

    info!("Booking {} created for {}", result.inserted_id, Masked(&email));
    Ok(Json(result))
}

async fn list_bookings(
    State(state): State<AppState>,
    BookingScope(filter): BookingScope,
) -> Result<Json<Vec<Booking>>, AppError> {
    let bookings = state.bookings.list_bookings(&filter).await?;
    Ok(Json(bookings))
}

/// Responds with `null` when no booking has this id.
async fn get_booking(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<Option<Booking>>, AppError> {
    let booking = state.bookings.get_booking(id).await?;
    Ok(Json(booking))
}

async fn update_booking(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(changes): AppJson<BookingPatch>,
) -> Result<Json<UpdateResult>, AppError> {
    let result = state.bookings.upsert_booking(id, changes).await?;

    if let Some(upserted) = result.upserted_id {
        info!("Booking {} inserted by update", upserted);
    }
    Ok(Json(result))
}

async fn delete_booking(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<DeleteResult>, AppError> {
    let result = state.bookings.delete_booking(id).await?;

    info!("Delete booking {}: {} removed", id, result.deleted_count);
    Ok(Json(result))
}
