use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::{from_fn_with_state, Next},
    response::Response,
    routing::MethodRouter,
};
use axum_extra::extract::cookie::CookieJar;
use carcare_core::BookingFilter;
use carcare_shared::Masked;
use serde::Deserialize;
use tracing::debug;

use crate::error::{AppError, AppQuery};
use crate::session::SESSION_COOKIE;
use crate::state::AppState;
use crate::token::SessionClaims;
use carcare_store::app_config::BookingGate;

// ============================================================================
// Route access declarations
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Session,
}

/// Access declared for each booking route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingAccess {
    pub create: Access,
    pub list: Access,
    pub read: Access,
    pub update: Access,
    pub delete: Access,
}

impl From<BookingGate> for BookingAccess {
    fn from(gate: BookingGate) -> Self {
        let others = match gate {
            BookingGate::ListOnly => Access::Public,
            BookingGate::All => Access::Session,
        };

        Self {
            create: others,
            // Gated under every policy
            list: Access::Session,
            read: others,
            update: others,
            delete: others,
        }
    }
}

/// Puts `route` behind the session gate when `access` asks for it.
pub fn guard(access: Access, route: MethodRouter<AppState>, state: &AppState) -> MethodRouter<AppState> {
    match access {
        Access::Public => route,
        Access::Session => route.route_layer(from_fn_with_state(state.clone(), session_gate)),
    }
}

// ============================================================================
// Session gate
// ============================================================================

pub async fn session_gate(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    // 1. Extract token from the session cookie
    let token = jar
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_owned())
        .ok_or_else(AppError::unauthorized)?;

    // 2. Verify signature and expiry
    let claims = state.auth.tokens.verify(&token).map_err(|e| {
        debug!("Rejected session token: {}", e);
        AppError::unauthorized()
    })?;

    // 3. Tokens ended by logout stay dead until they expire
    if state.sessions.is_revoked(claims.jti).await? {
        debug!("Rejected revoked session for {}", Masked(&claims.email));
        return Err(AppError::unauthorized());
    }

    // 4. Inject claims into request extensions
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

// ============================================================================
// Ownership check
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct BookingQuery {
    pub email: Option<String>,
}

/// The set of bookings the authenticated caller may list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingScope(pub BookingFilter);

impl BookingScope {
    /// An empty `email` parameter counts as no parameter.
    pub fn resolve(claims: &SessionClaims, requested: Option<&str>, gate: BookingGate) -> Result<Self, AppError> {
        match requested.filter(|email| !email.is_empty()) {
            Some(email) if email != claims.email => Err(AppError::forbidden()),
            Some(email) => Ok(Self(BookingFilter::ByEmail(email.to_owned()))),
            None => match gate {
                BookingGate::ListOnly => Ok(Self(BookingFilter::All)),
                BookingGate::All => Ok(Self(BookingFilter::ByEmail(claims.email.clone()))),
            },
        }
    }
}

impl FromRequestParts<AppState> for BookingScope {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let claims = parts
            .extensions
            .get::<SessionClaims>()
            .cloned()
            .ok_or_else(AppError::unauthorized)?;

        let AppQuery(query) = AppQuery::<BookingQuery>::from_request_parts(parts, state).await?;

        let scope = Self::resolve(&claims, query.email.as_deref(), state.auth.booking_gate);
        if scope.is_err() {
            debug!("Ownership check failed for {}", Masked(&claims.email));
        }
        scope
    }
}
