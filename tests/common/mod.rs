// tests/common/mod.rs

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{HeaderMap, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use reqwest::Url;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

use fallball_connector::{
    app,
    common::oauth1::{authorization_header, OAuthCredentials},
    config::{AppState, Settings},
};

pub const OAUTH_KEY: &str = "connector-key";
pub const OAUTH_SECRET: &str = "connector-secret";
pub const INSTANCE_ID: &str = "instance-1";
pub const RESELLER: &str = "reseller-test";
pub const RESELLER_TOKEN: &str = "reseller-token";
pub const TENANT_ID: &str = "tenant-1";

pub fn settings(fallball_url: &str) -> Settings {
    let raw = json!({
        "debug": true,
        "fallball_service_url": fallball_url,
        "fallball_service_authorization_token": "service-token",
        "oauth_key": OAUTH_KEY,
        "oauth_secret": OAUTH_SECRET,
        "diskspace_resource": "DISKSPACE",
        "devices_resource": "DEVICES",
        "users_resource": "USERS",
        "gold_users_resource": "GOLD_USERS",
        "request_timeout_secs": 5,
        "oa_retry_attempts": 3
    });
    Settings::from_json(&raw.to_string()).unwrap()
}

pub fn router(fallball: &MockServer) -> Router {
    app::router(AppState::new(settings(&fallball.uri())).unwrap())
}

/// O revendedor de teste existe e tem token.
pub async fn mount_reseller(fallball: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/resellers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "name": RESELLER, "rid": INSTANCE_ID, "token": RESELLER_TOKEN }
        ])))
        .mount(fallball)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/resellers/{}", RESELLER)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": RESELLER,
            "rid": INSTANCE_ID,
            "token": RESELLER_TOKEN,
            "clients_amount": 1,
            "storage": { "limit": 1000000, "usage": 10 }
        })))
        .mount(fallball)
        .await;
}

/// `GET /aps/2/resources/{id}` no OA.
pub async fn mount_oa_resource(oa: &MockServer, id: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/aps/2/resources/{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(oa)
        .await;
}

pub async fn mount_notification_manager(oa: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/aps/2/resources"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "aps": { "id": "nm-1" } }])))
        .mount(oa)
        .await;
}

/// Pedido assinado como o OA o faria.
pub fn signed_request(http_method: &str, uri: &str, oa: &MockServer, body: Option<Value>) -> Request<Body> {
    signed_request_with(http_method, uri, oa, body, OAUTH_SECRET)
}

pub fn signed_request_with(
    http_method: &str,
    uri: &str,
    oa: &MockServer,
    body: Option<Value>,
    secret: &str,
) -> Request<Body> {
    let url = Url::parse(&format!("http://localhost{}", uri)).unwrap();
    let credentials = OAuthCredentials::new(OAUTH_KEY, secret);

    Request::builder()
        .method(http_method)
        .uri(uri)
        .header("host", "localhost")
        .header("authorization", authorization_header(http_method, &url, &credentials))
        .header("aps-instance-id", INSTANCE_ID)
        .header("aps-controller-uri", format!("{}/", oa.uri()))
        .header("aps-transaction-id", "tx-1")
        .header("content-type", "application/json")
        .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
        .unwrap()
}

pub async fn send(router: Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, headers, body)
}

pub fn tenant_payload() -> Value {
    json!({
        "aps": { "id": TENANT_ID, "subscription": "555", "type": "http://fallball.io/tenant/1.0" },
        "account": { "aps": { "id": "42" } },
        "accountinfo": { "addressPostal": { "postalCode": "12345" } },
        "DISKSPACE": { "limit": 100 }
    })
}
