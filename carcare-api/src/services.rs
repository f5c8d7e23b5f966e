use axum::{
    extract::State,
    Json,
    routing::get,
    Router,
};
use carcare_core::{Service, ServiceSummary};
use uuid::Uuid;
use crate::{error::{AppError, AppPath}, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/car-services", get(list_services))
        .route("/car-services/{id}", get(get_service))
}

async fn list_services(State(state): State<AppState>) -> Result<Json<Vec<Service>>, AppError> {
    let services = state.services.list_services().await?;
    Ok(Json(services))
}

/// Responds with `null` when no service has this id.
async fn get_service(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<Option<ServiceSummary>>, AppError> {
    let service = state.services.get_service_summary(id).await?;
    Ok(Json(service))
}
