use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use tro_api::state::ReturnPages;
use tro_api::{app, AppState};
use tro_booking::{BookingEngine, MemoryStore, DEFAULT_TTL_SECONDS};
use tro_catalog::models::{NewBus, NewRoute};
use tro_catalog::CatalogRepository;
use tro_core::payment::{CheckoutGateway, CheckoutRequest, CheckoutSession};
use tro_core::{CoreError, CoreResult};

struct StubGateway {
    fail: bool,
}

#[async_trait]
impl CheckoutGateway for StubGateway {
    async fn initiate(&self, request: &CheckoutRequest) -> CoreResult<CheckoutSession> {
        if self.fail {
            return Err(CoreError::Gateway("declined".into()));
        }
        Ok(CheckoutSession {
            checkout_url: format!("https://checkout.test/{}", request.client_reference),
        })
    }
}

struct TestEnv {
    app: Router,
    engine: Arc<BookingEngine>,
    catalog: Arc<dyn CatalogRepository>,
    route_id: Uuid,
    bus_id: Uuid,
}

impl TestEnv {
    /// Second router over the same engine, different gateway behavior.
    fn app_with_gateway(&self, gateway: Arc<dyn CheckoutGateway>) -> Router {
        app(AppState {
            engine: self.engine.clone(),
            catalog: self.catalog.clone(),
            gateway,
            pages: pages(),
        })
    }
}

fn pages() -> ReturnPages {
    ReturnPages {
        confirmation_url: "https://tickets.test/confirmed".into(),
        error_url: "https://tickets.test/failed".into(),
    }
}

async fn env_with_gateway(gateway: Arc<dyn CheckoutGateway>) -> TestEnv {
    let store = Arc::new(MemoryStore::new());
    let catalog: Arc<dyn CatalogRepository> = store.clone();
    let region = catalog.create_region("Greater Accra").await.unwrap();
    let route = catalog
        .create_route(&NewRoute {
            pickup: "Accra".into(),
            destination: "Kumasi".into(),
            fare_minor: 7500,
            region_id: region.id,
        })
        .await
        .unwrap();
    let bus = catalog
        .create_bus(&NewBus {
            number_plate: "GR 1234-24".into(),
            capacity: 10,
            bus_type: "VIP".into(),
        })
        .await
        .unwrap();

    let engine = Arc::new(BookingEngine::new(store, catalog.clone(), DEFAULT_TTL_SECONDS));
    let app = app(AppState {
        engine: engine.clone(),
        catalog: catalog.clone(),
        gateway,
        pages: pages(),
    });
    TestEnv {
        app,
        engine,
        catalog,
        route_id: route.id,
        bus_id: bus.id,
    }
}

async fn env() -> TestEnv {
    env_with_gateway(Arc::new(StubGateway { fail: false })).await
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn booking_body(env: &TestEnv, seats: &[&str]) -> Value {
    json!({
        "route_id": env.route_id,
        "bus_id": env.bus_id,
        "travel_date": "2025-09-01",
        "seats": seats,
        "passenger": {
            "name": "Ama Mensah",
            "phone": "+233201112222",
            "emergency_contact": "+233200000001"
        }
    })
}

async fn create_booking(env: &TestEnv, seats: &[&str]) -> Value {
    let (status, body) = send(
        &env.app,
        json_request("POST", "/v1/bookings", booking_body(env, seats)),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "unexpected response: {body}");
    body
}

fn callback_payload(reference: &str, success: bool) -> Value {
    let flag = if success { "Success" } else { "Failed" };
    json!({
        "ResponseCode": if success { "0000" } else { "2001" },
        "Status": flag,
        "Data": {
            "ClientReference": reference,
            "Status": flag,
            "CheckoutId": "chk-1",
            "Amount": 225.0
        }
    })
}

#[tokio::test]
async fn booking_returns_a_checkout_url() {
    let env = env().await;
    let body = create_booking(&env, &["2", "3"]).await;

    assert_eq!(body["status"], "pending");
    assert_eq!(body["total_minor"], 15_000);
    let reference = body["client_reference"].as_str().unwrap();
    assert_eq!(
        body["checkout_url"].as_str().unwrap(),
        format!("https://checkout.test/{reference}")
    );
}

#[tokio::test]
async fn availability_tracks_the_booking_lifecycle() {
    let env = env().await;
    let booking = create_booking(&env, &["4"]).await;
    let uri = format!(
        "/v1/availability?route_id={}&bus_id={}&travel_date=2025-09-01",
        env.route_id, env.bus_id
    );

    let (status, report) = send(&env.app, get_request(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(report["pending"].as_array().unwrap().contains(&json!("4")));

    let reference = booking["client_reference"].as_str().unwrap();
    let (status, _) = send(
        &env.app,
        json_request(
            "POST",
            "/v1/payments/hubtel/callback",
            callback_payload(reference, true),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, report) = send(&env.app, get_request(&uri)).await;
    assert!(report["occupied"].as_array().unwrap().contains(&json!("4")));
    assert!(!report["pending"].as_array().unwrap().contains(&json!("4")));
}

#[tokio::test]
async fn successful_callback_marks_the_booking_paid() {
    let env = env().await;
    let booking = create_booking(&env, &["1"]).await;
    let id = booking["booking_id"].as_str().unwrap();
    let reference = booking["client_reference"].as_str().unwrap();

    let (status, _) = send(
        &env.app,
        json_request(
            "POST",
            "/v1/payments/hubtel/callback",
            callback_payload(reference, true),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, fetched) = send(&env.app, get_request(&format!("/v1/bookings/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["status"], "paid");
    assert_eq!(fetched["payment"]["method"], "gateway");
    assert_eq!(fetched["payment"]["amount_paid_minor"], 22_500);
}

#[tokio::test]
async fn failed_callback_frees_the_seats() {
    let env = env().await;
    let booking = create_booking(&env, &["5"]).await;
    let reference = booking["client_reference"].as_str().unwrap();

    let (status, _) = send(
        &env.app,
        json_request(
            "POST",
            "/v1/payments/hubtel/callback",
            callback_payload(reference, false),
        ),
    )
    .await;
    // The gateway is always acknowledged.
    assert_eq!(status, StatusCode::OK);

    let id = booking["booking_id"].as_str().unwrap();
    let (_, fetched) = send(&env.app, get_request(&format!("/v1/bookings/{id}"))).await;
    assert_eq!(fetched["status"], "rejected");
    assert_eq!(fetched["rejection_reason"], "Payment failed");

    // Seat 5 is bookable again.
    create_booking(&env, &["5"]).await;
}

#[tokio::test]
async fn overlapping_seats_conflict() {
    let env = env().await;
    create_booking(&env, &["6", "7"]).await;

    let (status, body) = send(
        &env.app,
        json_request("POST", "/v1/bookings", booking_body(&env, &["7"])),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("taken"));
}

#[tokio::test]
async fn gateway_refusal_does_not_strand_the_seats() {
    let env = env().await;
    let failing = env.app_with_gateway(Arc::new(StubGateway { fail: true }));

    let (status, _) = send(
        &failing,
        json_request("POST", "/v1/bookings", booking_body(&env, &["8"])),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);

    // The reservation was rejected, so the seat is immediately available.
    create_booking(&env, &["8"]).await;
}

#[tokio::test]
async fn admin_endpoints_require_a_role() {
    let env = env().await;
    let booking = create_booking(&env, &["9"]).await;
    let id = booking["booking_id"].as_str().unwrap();

    let (status, _) = send(
        &env.app,
        json_request(
            "POST",
            &format!("/v1/admin/bookings/{id}/approve"),
            Value::Null,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let request = Request::builder()
        .method("POST")
        .uri(format!("/v1/admin/bookings/{id}/approve"))
        .header("x-admin-role", "admin")
        .body(Body::empty())
        .unwrap();
    let (status, approved) = send(&env.app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["status"], "approved");
}

#[tokio::test]
async fn purge_needs_a_super_admin() {
    let env = env().await;
    let booking = create_booking(&env, &["10"]).await;
    let id = booking["booking_id"].as_str().unwrap();

    let forbidden = Request::builder()
        .method("DELETE")
        .uri(format!("/v1/admin/bookings/{id}"))
        .header("x-admin-role", "admin")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&env.app, forbidden).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let allowed = Request::builder()
        .method("DELETE")
        .uri(format!("/v1/admin/bookings/{id}"))
        .header("x-admin-role", "super-admin")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&env.app, allowed).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&env.app, get_request(&format!("/v1/bookings/{id}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_builds_the_catalog_over_http() {
    let env = env().await;

    let region = Request::builder()
        .method("POST")
        .uri("/v1/admin/regions")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-admin-role", "admin")
        .body(Body::from(
            serde_json::to_vec(&json!({"name": "Ashanti"})).unwrap(),
        ))
        .unwrap();
    let (status, region) = send(&env.app, region).await;
    assert_eq!(status, StatusCode::OK);

    let route = Request::builder()
        .method("POST")
        .uri("/v1/admin/routes")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-admin-role", "admin")
        .body(Body::from(
            serde_json::to_vec(&json!({
                "pickup": "Kumasi",
                "destination": "Tamale",
                "fare_minor": 12_000,
                "region_id": region["id"]
            }))
            .unwrap(),
        ))
        .unwrap();
    let (status, _) = send(&env.app, route).await;
    assert_eq!(status, StatusCode::OK);

    let (status, routes) = send(
        &env.app,
        get_request(&format!("/v1/routes?region_id={}", region["id"].as_str().unwrap())),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let routes = routes.as_array().unwrap();
    assert_eq!(routes.len(), 1);
    assert_eq!(routes[0]["destination"], "Tamale");
}

#[tokio::test]
async fn route_with_a_nonpositive_fare_is_rejected() {
    let env = env().await;
    let request = Request::builder()
        .method("POST")
        .uri("/v1/admin/routes")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-admin-role", "admin")
        .body(Body::from(
            serde_json::to_vec(&json!({
                "pickup": "Accra",
                "destination": "Cape Coast",
                "fare_minor": 0,
                "region_id": Uuid::new_v4()
            }))
            .unwrap(),
        ))
        .unwrap();
    let (status, body) = send(&env.app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("fare"));
}

#[tokio::test]
async fn unusable_callback_is_still_acknowledged() {
    let env = env().await;
    let (status, _) = send(
        &env.app,
        json_request(
            "POST",
            "/v1/payments/hubtel/callback",
            json!({"Status": "Success"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn return_redirect_picks_the_right_page() {
    let env = env().await;
    let response = env
        .app
        .clone()
        .oneshot(get_request("/v1/payments/hubtel/return?clientreference=abc"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers()[header::LOCATION],
        "https://tickets.test/confirmed?ref=abc"
    );

    let response = env
        .app
        .clone()
        .oneshot(get_request(
            "/v1/payments/hubtel/return?clientreference=abc&error=cancelled",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers()[header::LOCATION],
        "https://tickets.test/failed"
    );
}
