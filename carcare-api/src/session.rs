use axum_extra::extract::cookie::{Cookie, SameSite};

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "token";

/// Session cookie for a freshly issued token.
///
/// The front-end is served from a different origin, so the cookie has to be
/// `SameSite=None`, which browsers only accept together with `Secure`.
pub fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::None)
        .path("/")
        .build()
}

/// Same attributes with an empty value, `Max-Age=0` and an expiry in the past.
pub fn removal_cookie() -> Cookie<'static> {
    let mut cookie = session_cookie(String::new());
    cookie.make_removal();
    cookie
}
