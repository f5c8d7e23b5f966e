use axum::{
    routing::get,
    Router,
    http::{header, Method},
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod bookings;
pub mod error;
pub mod middleware;
pub mod services;
pub mod session;
pub mod state;
pub mod token;

pub use state::{AppState, AuthConfig};

pub fn app(state: AppState) -> Router {
    // Credentialed CORS: the session cookie has to cross origins, so origins are listed explicitly
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(state.allowed_origins.iter().cloned()))
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true);

    Router::new()
        .route("/", get(liveness))
        .merge(services::routes())
        .merge(bookings::routes(&state))
        .merge(auth::routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn liveness() -> &'static str {
    "server is running"
}
