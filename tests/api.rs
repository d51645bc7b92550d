use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use bilty_desk::auth::session::UserDirectory;
use bilty_desk::backend::{Backend, MemoryBackend};
use bilty_desk::build_app;
use bilty_desk::config::Config;
use bilty_desk::state::AppState;
use bilty_desk::store::DataStore;

async fn app() -> Router {
    let backend: Arc<dyn Backend> = Arc::new(MemoryBackend::new());
    let store = DataStore::load(backend.as_ref()).await.expect("load");
    build_app(AppState::new(backend, store, Config::in_memory(), UserDirectory::default()))
}

async fn send(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(format!("/bilty-desk{uri}"));
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request");

    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn login(app: &Router, email: &str) -> String {
    let (status, body) = send(app, "POST", "/users/login", None, Some(json!({ "email": email }))).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["access_token"].as_str().expect("token").to_string()
}

#[tokio::test]
async fn health_needs_no_token() {
    let app = app().await;
    let response = app
        .clone()
        .oneshot(Request::builder().uri("/bilty-desk/health").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn unknown_email_is_rejected() {
    let app = app().await;
    let (status, body) = send(&app, "POST", "/users/login", None, Some(json!({ "email": "nobody@bilty.com" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid credentials");
}

#[tokio::test]
async fn me_lists_the_role_modules() {
    let app = app().await;
    let token = login(&app, "accounts@bilty.com").await;

    let (status, body) = send(&app, "GET", "/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "Accountant");
    assert_eq!(body["modules"], json!(["dashboard", "billing", "reports"]));
}

#[tokio::test]
async fn data_routes_require_a_token() {
    let app = app().await;
    let (status, body) = send(&app, "GET", "/sellers", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthorized");

    let (status, _) = send(&app, "GET", "/sellers", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn roles_are_confined_to_their_modules() {
    let app = app().await;
    let accountant = login(&app, "accounts@bilty.com").await;

    let (status, _) = send(&app, "GET", "/schedules", Some(&accountant), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&app, "POST", "/reload", Some(&accountant), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, "GET", "/billing-records", Some(&accountant), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn invalid_seller_reports_each_field() {
    let app = app().await;
    let token = login(&app, "entry@bilty.com").await;

    let payload = json!({ "name": "", "mobileNumber": "123", "address": "Vashi", "shopName": "" });
    let (status, body) = send(&app, "POST", "/sellers", Some(&token), Some(payload)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["fields"]["name"].is_string());
    assert!(body["fields"]["shopName"].is_string());
    assert!(body["fields"]["mobileNumber"].is_string());
    assert!(body["fields"]["address"].is_null());
}

#[tokio::test]
async fn duplicate_vehicle_number_conflicts() {
    let app = app().await;
    let token = login(&app, "admin@bilty.com").await;
    let vehicle = json!({
        "transportName": "Shree Transport",
        "driverName": "Suresh",
        "vehicleNo": "MH 12 AB 1234",
        "driverMobile": "9822011223",
    });

    let (status, body) = send(&app, "POST", "/vehicles", Some(&token), Some(vehicle.clone())).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["vehicleNo"], "MH12AB1234");
    assert_eq!(body["vehicleNoDisplay"], "MH 12 AB 1234");

    let (status, _) = send(&app, "POST", "/vehicles", Some(&token), Some(vehicle)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn bilty_round_trip_through_the_api() {
    let app = app().await;
    let token = login(&app, "admin@bilty.com").await;

    let seller = json!({ "name": "Ramesh", "mobileNumber": "9876543210", "address": "Vashi", "shopName": "Patil Traders" });
    let (status, seller) = send(&app, "POST", "/sellers", Some(&token), Some(seller)).await;
    assert_eq!(status, StatusCode::CREATED);

    let submission = json!({
        "sellerId": seller["id"],
        "transport": {
            "transportName": "Shree Transport",
            "driverName": "Suresh",
            "vehicleNo": "MH12AB1234",
            "driverMobile": "9822011223"
        },
        "rent": 5000.0,
        "advance": 1000.0,
        "productDetails": [{ "productName": "Tomato", "unitType": "kg", "quantity": 500.0 }]
    });
    let (status, bilty) = send(&app, "POST", "/bilties", Some(&token), Some(submission)).await;
    assert_eq!(status, StatusCode::CREATED, "{bilty}");
    assert_eq!(bilty["totalCratesBags"], 10.0);
    assert_eq!(bilty["remaining"], 4000.0);
    assert_eq!(bilty["vehicleNo"], "MH12AB1234");
    assert_eq!(bilty["sellerName"], "Ramesh");
    assert_eq!(bilty["deliveryAddress"], "Vashi");

    let id = bilty["id"].as_str().expect("id").to_string();
    let (status, list) = send(&app, "GET", "/bilties?search=mh12", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().map(Vec::len), Some(1));

    let (status, moved) = send(&app, "PATCH", &format!("/bilties/{id}/status"), Some(&token), Some(json!({ "status": "In Transit" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(moved["status"], "In Transit");

    let (status, dashboard) = send(&app, "GET", "/dashboard", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dashboard["totalBiltiesToday"], 1);
    assert_eq!(dashboard["totalVehiclesActive"], 1);
    assert_eq!(dashboard["totalAdvancePaid"], 1000.0);

    let (status, _) = send(&app, "DELETE", &format!("/bilties/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "GET", &format!("/bilties/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn export_is_a_csv_attachment() {
    let app = app().await;
    let token = login(&app, "admin@bilty.com").await;

    let seller = json!({ "name": "Patil, Ramesh", "address": "Vashi", "shopName": "Patil Traders" });
    let (_, seller) = send(&app, "POST", "/sellers", Some(&token), Some(seller)).await;
    let record = json!({
        "vehicleNo": "mh12ab1234",
        "date": "2026-10-06",
        "amount": 1000.0,
        "advance": 1500.0,
        "sellerId": seller["id"]
    });
    let (status, record) = send(&app, "POST", "/billing-records", Some(&token), Some(record)).await;
    assert_eq!(status, StatusCode::CREATED, "{record}");
    assert_eq!(record["netAmount"], 0.0);

    let request = Request::builder()
        .uri("/bilty-desk/billing-records/export")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().expect("header").to_string();
    assert!(disposition.starts_with("attachment; filename=\"billing-records-"));

    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    let csv = String::from_utf8(bytes.to_vec()).expect("utf8");
    let mut rows = csv.lines();
    assert_eq!(rows.next(), Some("Vehicle No,Date,Seller,Amount,Advance,Net Amount,Status"));
    assert_eq!(rows.next(), Some("MH12AB1234,6 Oct 2026,\"Patil, Ramesh\",1000,1500,0,Pending"));
}
