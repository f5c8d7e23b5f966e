use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use carcare_api::{app, token::TokenService, AppState, AuthConfig};
use carcare_core::Service;
use carcare_store::{
    app_config::BookingGate, MemoryBookingRepository, MemoryServiceRepository, MemorySessionRegistry,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

const SECRET: &str = "test-secret";

fn seed_services() -> Vec<Service> {
    vec![
        serde_json::from_value(json!({
            "_id": "6b0ab6c4-0a6f-4a5e-9f2c-3c1f1b6a0001",
            "title": "Full Car Repair",
            "price": "200.00",
            "service_id": "01",
            "img": "https://example.com/repair.jpg",
            "description": "Everything, fixed.",
        }))
        .unwrap(),
        serde_json::from_value(json!({
            "_id": "6b0ab6c4-0a6f-4a5e-9f2c-3c1f1b6a0002",
            "title": "Engine Repair",
            "price": 150,
            "service_id": "02",
        }))
        .unwrap(),
    ]
}

fn test_state(gate: BookingGate, tokens: TokenService) -> AppState {
    AppState::new(
        Arc::new(MemoryServiceRepository::with_services(seed_services())),
        Arc::new(MemoryBookingRepository::new()),
        Arc::new(MemorySessionRegistry::new()),
        AuthConfig {
            tokens,
            booking_gate: gate,
        },
        &["http://localhost:5173".to_string()],
    )
}

fn test_app(gate: BookingGate) -> Router {
    app(test_state(gate, TokenService::new(SECRET, 3600).unwrap()))
}

struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl TestResponse {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("response body is JSON")
    }

    fn text(&self) -> String {
        String::from_utf8(self.body.clone()).unwrap()
    }

    fn session_cookie(&self) -> Option<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with("token="))
            .map(str::to_owned)
    }
}

async fn send(router: &Router, req: Request<Body>) -> TestResponse {
    let response = router.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec();
    TestResponse { status, headers, body }
}

fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("token={}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Logs in through the API and returns the raw token from the cookie.
async fn login(router: &Router, email: &str) -> String {
    let res = send(router, request("POST", "/jwt", None, Some(json!({ "email": email })))).await;
    assert_eq!(res.status, StatusCode::OK);
    let cookie = res.session_cookie().expect("session cookie set");
    cookie
        .trim_start_matches("token=")
        .split(';')
        .next()
        .unwrap()
        .to_string()
}

async fn create_booking(router: &Router, token: Option<&str>, body: Value) -> Uuid {
    let res = send(router, request("POST", "/service-bookings", token, Some(body))).await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.text());
    serde_json::from_value(res.json()["insertedId"].clone()).unwrap()
}

#[tokio::test]
async fn test_liveness() {
    let router = test_app(BookingGate::ListOnly);
    let res = send(&router, request("GET", "/", None, None)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.text(), "server is running");
}

#[tokio::test]
async fn test_list_services_and_summary_projection() {
    let router = test_app(BookingGate::ListOnly);

    let res = send(&router, request("GET", "/car-services", None, None)).await;
    assert_eq!(res.status, StatusCode::OK);
    let services = res.json();
    assert_eq!(services.as_array().unwrap().len(), 2);
    assert_eq!(services[0]["description"], "Everything, fixed.");
    assert_eq!(services[1]["price"], 150);

    let res = send(
        &router,
        request("GET", "/car-services/6b0ab6c4-0a6f-4a5e-9f2c-3c1f1b6a0001", None, None),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(
        res.json(),
        json!({
            "_id": "6b0ab6c4-0a6f-4a5e-9f2c-3c1f1b6a0001",
            "title": "Full Car Repair",
            "price": "200.00",
            "service_id": "01",
        })
    );
}

#[tokio::test]
async fn test_services_are_served_as_stored() {
    let sparse: Service = serde_json::from_value(json!({
        "_id": "6b0ab6c4-0a6f-4a5e-9f2c-3c1f1b6a0003",
        "price": "call us",
        "service_id": 3,
    }))
    .unwrap();
    let mut state = test_state(BookingGate::ListOnly, TokenService::new(SECRET, 3600).unwrap());
    state.services = Arc::new(MemoryServiceRepository::with_services(vec![sparse]));
    let router = app(state);

    let res = send(&router, request("GET", "/car-services", None, None)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(
        res.json(),
        json!([{ "_id": "6b0ab6c4-0a6f-4a5e-9f2c-3c1f1b6a0003", "price": "call us", "service_id": 3 }])
    );

    let res = send(
        &router,
        request("GET", "/car-services/6b0ab6c4-0a6f-4a5e-9f2c-3c1f1b6a0003", None, None),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(
        res.json(),
        json!({ "_id": "6b0ab6c4-0a6f-4a5e-9f2c-3c1f1b6a0003", "price": "call us", "service_id": 3 })
    );
}

#[tokio::test]
async fn test_missing_service_is_null_and_bad_id_is_rejected() {
    let router = test_app(BookingGate::ListOnly);

    let res = send(&router, request("GET", &format!("/car-services/{}", Uuid::new_v4()), None, None)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json(), Value::Null);

    let res = send(&router, request("GET", "/car-services/not-an-id", None, None)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.json()["error"].is_string());
}

#[tokio::test]
async fn test_issue_token_sets_cross_site_cookie() {
    let router = test_app(BookingGate::ListOnly);
    let res = send(&router, request("POST", "/jwt", None, Some(json!({ "email": "a@b.com" })))).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json(), json!({ "success": true }));

    let cookie = res.session_cookie().unwrap();
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Secure"));
    assert!(cookie.contains("SameSite=None"));
}

#[tokio::test]
async fn test_issue_token_rejects_bad_claims() {
    let router = test_app(BookingGate::ListOnly);

    let res = send(&router, request("POST", "/jwt", None, Some(json!({ "email": "nope" })))).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.session_cookie().is_none());

    let res = send(&router, request("POST", "/jwt", None, Some(json!({ "user": "a@b.com" })))).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_booking_list_requires_session() {
    let router = test_app(BookingGate::ListOnly);

    let res = send(&router, request("GET", "/service-bookings?email=a@b.com", None, None)).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.json(), json!({ "error": "Unauthorized access" }));

    let res = send(&router, request("GET", "/service-bookings", Some("garbage"), None)).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_signed_with_other_secret_is_rejected() {
    let router = test_app(BookingGate::ListOnly);
    let forged = TokenService::new("someone-else", 3600).unwrap().issue("a@b.com").unwrap();

    let res = send(&router, request("GET", "/service-bookings?email=a@b.com", Some(&forged), None)).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let tokens = TokenService::with_ttl(SECRET, chrono::Duration::seconds(-120));
    let expired = tokens.issue("a@b.com").unwrap();
    let router = app(test_state(BookingGate::ListOnly, tokens));

    let res = send(&router, request("GET", "/service-bookings?email=a@b.com", Some(&expired), None)).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_other_users_bookings_are_forbidden() {
    let router = test_app(BookingGate::ListOnly);
    let token = login(&router, "a@b.com").await;

    let res = send(&router, request("GET", "/service-bookings?email=c@d.com", Some(&token), None)).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(res.json(), json!({ "error": "Forbidden access" }));
}

#[tokio::test]
async fn test_own_bookings_are_listed() {
    let router = test_app(BookingGate::ListOnly);
    create_booking(&router, None, json!({ "email": "a@b.com", "date": "2024-01-01" })).await;
    create_booking(&router, None, json!({ "email": "c@d.com", "date": "2024-01-02" })).await;
    create_booking(&router, None, json!({ "email": "a@b.com", "date": "2024-01-03" })).await;

    let token = login(&router, "a@b.com").await;
    let res = send(&router, request("GET", "/service-bookings?email=a@b.com", Some(&token), None)).await;

    assert_eq!(res.status, StatusCode::OK);
    let bookings = res.json();
    let bookings = bookings.as_array().unwrap();
    assert_eq!(bookings.len(), 2);
    assert!(bookings.iter().all(|b| b["email"] == "a@b.com"));
}

#[tokio::test]
async fn test_list_only_gate_leaves_unfiltered_listing_open_to_any_session() {
    let router = test_app(BookingGate::ListOnly);
    create_booking(&router, None, json!({ "email": "a@b.com" })).await;
    create_booking(&router, None, json!({ "email": "c@d.com" })).await;

    let token = login(&router, "a@b.com").await;
    let res = send(&router, request("GET", "/service-bookings", Some(&token), None)).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json().as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_empty_email_filter_is_ignored() {
    let router = test_app(BookingGate::ListOnly);
    create_booking(&router, None, json!({ "email": "a@b.com" })).await;
    create_booking(&router, None, json!({ "email": "c@d.com" })).await;

    let token = login(&router, "a@b.com").await;
    let res = send(&router, request("GET", "/service-bookings?email=", Some(&token), None)).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json().as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_all_gate_protects_every_booking_route() {
    let router = test_app(BookingGate::All);

    let res = send(&router, request("POST", "/service-bookings", None, Some(json!({ "email": "a@b.com" })))).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let token = login(&router, "a@b.com").await;
    let mine = create_booking(&router, Some(&token), json!({ "email": "a@b.com" })).await;
    create_booking(&router, Some(&token), json!({ "email": "c@d.com" })).await;

    for (method, body) in [("GET", None), ("PATCH", Some(json!({ "status": "confirmed" }))), ("DELETE", None)] {
        let res = send(&router, request(method, &format!("/service-bookings/{}", mine), None, body)).await;
        assert_eq!(res.status, StatusCode::UNAUTHORIZED, "{} without session", method);
    }

    let res = send(&router, request("GET", &format!("/service-bookings/{}", mine), Some(&token), None)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["email"], "a@b.com");

    // Without an email filter the listing is scoped to the caller
    let res = send(&router, request("GET", "/service-bookings", Some(&token), None)).await;
    let bookings = res.json();
    assert_eq!(bookings.as_array().unwrap().len(), 1);
    assert_eq!(bookings[0]["email"], "a@b.com");
}

#[tokio::test]
async fn test_create_then_fetch_booking() {
    let router = test_app(BookingGate::ListOnly);
    let id = create_booking(&router, None, json!({ "email": "x@y.com", "date": "2024-01-01" })).await;

    let res = send(&router, request("GET", &format!("/service-bookings/{}", id), None, None)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(
        res.json(),
        json!({ "_id": id.to_string(), "email": "x@y.com", "date": "2024-01-01" })
    );
}

#[tokio::test]
async fn test_create_booking_validates_body() {
    let router = test_app(BookingGate::ListOnly);

    let cases = [
        json!({ "date": "2024-01-01" }),
        json!({ "email": "not-an-email" }),
        json!({ "email": "x@y.com", "_id": "chosen-by-client" }),
    ];
    for body in cases {
        let res = send(&router, request("POST", "/service-bookings", None, Some(body.clone()))).await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST, "{}", body);
    }
}

#[tokio::test]
async fn test_missing_booking_is_null() {
    let router = test_app(BookingGate::ListOnly);
    let res = send(&router, request("GET", &format!("/service-bookings/{}", Uuid::new_v4()), None, None)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json(), Value::Null);
}

#[tokio::test]
async fn test_update_merges_and_upserts() {
    let router = test_app(BookingGate::ListOnly);
    let id = create_booking(&router, None, json!({ "email": "x@y.com", "date": "2024-01-01" })).await;
    let uri = format!("/service-bookings/{}", id);

    let res = send(&router, request("PATCH", &uri, None, Some(json!({ "status": "confirmed" })))).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(
        res.json(),
        json!({ "acknowledged": true, "matchedCount": 1, "modifiedCount": 1, "upsertedCount": 0, "upsertedId": null })
    );

    let res = send(&router, request("PATCH", &uri, None, Some(json!({ "status": "confirmed" })))).await;
    assert_eq!(res.json()["modifiedCount"], 0);

    let res = send(&router, request("GET", &uri, None, None)).await;
    assert_eq!(res.json()["status"], "confirmed");
    assert_eq!(res.json()["date"], "2024-01-01");

    let fresh = Uuid::new_v4();
    let res = send(
        &router,
        request("PATCH", &format!("/service-bookings/{}", fresh), None, Some(json!({ "email": "n@m.com" }))),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["upsertedId"], fresh.to_string());
    assert_eq!(res.json()["upsertedCount"], 1);
}

#[tokio::test]
async fn test_update_cannot_insert_without_email() {
    let router = test_app(BookingGate::ListOnly);
    let res = send(
        &router,
        request("PATCH", &format!("/service-bookings/{}", Uuid::new_v4()), None, Some(json!({ "status": "x" }))),
    )
    .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_booking() {
    let router = test_app(BookingGate::ListOnly);
    let id = create_booking(&router, None, json!({ "email": "x@y.com" })).await;
    let uri = format!("/service-bookings/{}", id);

    let res = send(&router, request("DELETE", &uri, None, None)).await;
    assert_eq!(res.json(), json!({ "acknowledged": true, "deletedCount": 1 }));

    // Deleting again removes nothing and is not an error
    let res = send(&router, request("DELETE", &uri, None, None)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["deletedCount"], 0);

    let res = send(&router, request("DELETE", "/service-bookings/123", None, None)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_logout_is_idempotent_and_clears_cookie() {
    let router = test_app(BookingGate::ListOnly);

    for _ in 0..2 {
        let res = send(&router, request("POST", "/logout", None, None)).await;
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.json(), json!({ "success": true }));

        let cookie = res.session_cookie().expect("removal cookie");
        assert!(cookie.starts_with("token=;"));
        assert!(cookie.contains("Max-Age=0"));
    }
}

#[tokio::test]
async fn test_logout_revokes_token() {
    let router = test_app(BookingGate::ListOnly);
    let token = login(&router, "a@b.com").await;
    let uri = "/service-bookings?email=a@b.com";

    let res = send(&router, request("GET", uri, Some(&token), None)).await;
    assert_eq!(res.status, StatusCode::OK);

    let res = send(&router, request("POST", "/logout", Some(&token), None)).await;
    assert_eq!(res.status, StatusCode::OK);

    // A captured copy of the cookie no longer works
    let res = send(&router, request("GET", uri, Some(&token), None)).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    // A new login does
    let fresh = login(&router, "a@b.com").await;
    let res = send(&router, request("GET", uri, Some(&fresh), None)).await;
    assert_eq!(res.status, StatusCode::OK);
}

#[tokio::test]
async fn test_cors_preflight_allows_credentials_for_listed_origin() {
    let router = test_app(BookingGate::ListOnly);
    let req = Request::builder()
        .method("OPTIONS")
        .uri("/service-bookings")
        .header(header::ORIGIN, "http://localhost:5173")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
        .body(Body::empty())
        .unwrap();

    let res = send(&router, req).await;
    assert_eq!(
        res.headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "http://localhost:5173"
    );
    assert_eq!(
        res.headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
        "true"
    );
}
