use axum::{
    extract::State,
    Json,
    routing::post,
    Router,
};
use axum_extra::extract::cookie::CookieJar;
use carcare_core::email::validate_email;
use carcare_shared::Masked;
use serde::Serialize;
use tracing::{info, warn};
use crate::{
    error::{AppError, AppJson},
    session::{removal_cookie, session_cookie, SESSION_COOKIE},
    state::AppState,
    token::TokenRequest,
};

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub success: bool,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/jwt", post(issue_token))
        .route("/logout", post(logout))
}

async fn issue_token(
    State(state): State<AppState>,
    jar: CookieJar,
    AppJson(req): AppJson<TokenRequest>,
) -> Result<(CookieJar, Json<SessionResponse>), AppError> {
    validate_email(&req.email)?;

    let token = state.auth.tokens.issue(&req.email)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    info!("Session issued for {}", Masked(&req.email));

    Ok((jar.add(session_cookie(token)), Json(SessionResponse { success: true })))
}

async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<SessionResponse>) {
    // Revoke the presented token server-side; a token that does not even carry
    // our signature has nothing to revoke.
    let presented = jar.get(SESSION_COOKIE).map(|cookie| cookie.value().to_owned());
    if let Some(token) = presented {
        if let Ok(claims) = state.auth.tokens.inspect(&token) {
            let ttl = claims.remaining_seconds();
            if ttl > 0 {
                match state.sessions.revoke(claims.jti, ttl).await {
                    Ok(()) => info!("Session ended for {}", Masked(&claims.email)),
                    // The cookie is cleared regardless
                    Err(e) => warn!("Failed to revoke session {}: {}", claims.jti, e),
                }
            }
        }
    }

    (jar.add(removal_cookie()), Json(SessionResponse { success: true }))
}
