use std::sync::Arc;
use axum::http::HeaderValue;
use carcare_core::repository::{BookingRepository, ServiceRepository, SessionRegistry};
use carcare_store::app_config::BookingGate;
use crate::token::TokenService;

#[derive(Clone)]
pub struct AuthConfig {
    pub tokens: TokenService,
    pub booking_gate: BookingGate,
}

#[derive(Clone)]
pub struct AppState {
    pub services: Arc<dyn ServiceRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub sessions: Arc<dyn SessionRegistry>,
    pub auth: AuthConfig,
    pub allowed_origins: Arc<Vec<HeaderValue>>,
}

impl AppState {
    pub fn new(
        services: Arc<dyn ServiceRepository>,
        bookings: Arc<dyn BookingRepository>,
        sessions: Arc<dyn SessionRegistry>,
        auth: AuthConfig,
        allowed_origins: &[String],
    ) -> Self {
        let allowed_origins = allowed_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                    None
                }
            })
            .collect();

        Self {
            services,
            bookings,
            sessions,
            auth,
            allowed_origins: Arc::new(allowed_origins),
        }
    }
}
