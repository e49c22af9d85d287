// tests/connector_api.rs

mod common;

use axum::{body::Body, http::{Request, StatusCode}};
use serde_json::json;
use wiremock::{
    matchers::{body_partial_json, method, path, path_regex},
    Mock, MockServer, ResponseTemplate,
};

use common::*;
use fallball_connector::common::naming::user_id_for_email;

const CLIENT_PATH: &str = "/resellers/reseller-test/clients/acme-sub555";

async fn mount_tenant_name(oa: &MockServer) {
    mount_oa_resource(oa, TENANT_ID, json!({ "aps": { "id": TENANT_ID }, "tenantId": "acme-sub555" })).await;
}

async fn mount_client(fallball: &MockServer, limit: i64) {
    Mock::given(method("GET"))
        .and(path(CLIENT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "acme-sub555",
            "email": "a@acme.io",
            "is_integrated": true,
            "storage": { "limit": limit, "usage": 42 },
            "users_amount": 4,
            "users_by_type": { "default": 3, "gold": 1 }
        })))
        .mount(fallball)
        .await;
}

// A aplicação declara só a classe de usuários normal
async fn mount_user_schema(oa: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/aps/2/application"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": { "schema": "/aps/2/types/user-type" }
        })))
        .expect(1)
        .mount(oa)
        .await;
    Mock::given(method("GET"))
        .and(path("/aps/2/types/user-type"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "properties": { "resource": { "enum": ["USERS"] } }
        })))
        .expect(1)
        .mount(oa)
        .await;
}

// ---
// Autenticação
// ---

#[tokio::test]
async fn health_check_is_public() {
    let fallball = MockServer::start().await;
    let request = Request::builder().uri("/connector/v1").body(Body::empty()).unwrap();
    let (status, _, body) = send(router(&fallball), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn trailing_slash_reaches_the_same_route() {
    let fallball = MockServer::start().await;
    let request = Request::builder().uri("/connector/v1/").body(Body::empty()).unwrap();
    let (status, _, body) = send(router(&fallball), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn signature_covers_the_path_with_trailing_slash() {
    let fallball = MockServer::start().await;
    let oa = MockServer::start().await;
    mount_reseller(&fallball).await;
    mount_tenant_name(&oa).await;

    Mock::given(method("DELETE"))
        .and(path(CLIENT_PATH))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&fallball)
        .await;

    let request = signed_request("DELETE", "/connector/v1/tenant/tenant-1/", &oa, None);
    let (status, _, _) = send(router(&fallball), request).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn root_describes_the_service() {
    let fallball = MockServer::start().await;
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let (status, _, body) = send(router(&fallball), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], "fallball_connector");
}

#[tokio::test]
async fn unsigned_requests_are_rejected() {
    let fallball = MockServer::start().await;
    let oa = MockServer::start().await;
    mount_reseller(&fallball).await;

    let mut request = signed_request("GET", "/connector/v1/tenant/tenant-1", &oa, None);
    request.headers_mut().remove("authorization");
    let (status, _, _) = send(router(&fallball), request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_secret_is_rejected() {
    let fallball = MockServer::start().await;
    let oa = MockServer::start().await;
    mount_reseller(&fallball).await;

    let request = signed_request_with("GET", "/connector/v1/tenant/tenant-1", &oa, None, "other-secret");
    let (status, _, _) = send(router(&fallball), request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_instance_is_rejected() {
    let fallball = MockServer::start().await;
    let oa = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/resellers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&fallball)
        .await;

    let request = signed_request("GET", "/connector/v1/tenant/tenant-1", &oa, None);
    let (status, _, _) = send(router(&fallball), request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn reseller_without_token_is_forbidden() {
    let fallball = MockServer::start().await;
    let oa = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/resellers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "name": RESELLER, "rid": INSTANCE_ID }
        ])))
        .mount(&fallball)
        .await;
    Mock::given(method("GET"))
        .and(path("/resellers/reseller-test"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&fallball)
        .await;

    let request = signed_request("GET", "/connector/v1/tenant/tenant-1", &oa, None);
    let (status, _, _) = send(router(&fallball), request).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

// ---
// Aplicação
// ---

#[tokio::test]
async fn new_application_creates_a_reseller() {
    let fallball = MockServer::start().await;
    let oa = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/resellers/reseller-[0-9a-f]+$"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&fallball)
        .await;
    Mock::given(method("POST"))
        .and(path("/resellers"))
        .and(body_partial_json(json!({ "rid": INSTANCE_ID, "storage": { "limit": 1000000 } })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
        .expect(1)
        .mount(&fallball)
        .await;

    let payload = json!({ "aps": { "type": "http://fallball.io/app/1.0", "id": "app-1" } });
    let request = signed_request("POST", "/connector/v1/app", &oa, Some(payload));
    let (status, _, body) = send(router(&fallball), request).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({ "aps": { "type": "http://fallball.io/app/1.0", "id": "app-1" } }));
}

#[tokio::test]
async fn only_the_owner_can_delete_the_application() {
    let fallball = MockServer::start().await;
    let oa = MockServer::start().await;
    mount_reseller(&fallball).await;
    Mock::given(method("DELETE"))
        .and(path("/resellers/reseller-test"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&fallball)
        .await;

    let request = signed_request("DELETE", "/connector/v1/app/someone-else", &oa, None);
    let (status, _, _) = send(router(&fallball), request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let request = signed_request("DELETE", "/connector/v1/app/reseller-test", &oa, None);
    let (status, _, _) = send(router(&fallball), request).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

// ---
// Tenant
// ---

#[tokio::test]
async fn usage_counters_follow_the_declared_user_classes() {
    let fallball = MockServer::start().await;
    let oa = MockServer::start().await;
    mount_reseller(&fallball).await;
    mount_tenant_name(&oa).await;
    mount_client(&fallball, 100).await;
    mount_user_schema(&oa).await;

    let request = signed_request("GET", "/connector/v1/tenant/tenant-1", &oa, None);
    let (status, _, body) = send(router(&fallball), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "DISKSPACE": { "usage": 42 },
            "DEVICES": { "usage": 0 },
            "USERS": { "usage": 3 }
        })
    );
}

#[tokio::test]
async fn users_change_pushes_counters_and_notifies_the_account() {
    let fallball = MockServer::start().await;
    let oa = MockServer::start().await;
    mount_reseller(&fallball).await;
    mount_tenant_name(&oa).await;
    mount_client(&fallball, 100).await;
    mount_user_schema(&oa).await;
    mount_notification_manager(&oa).await;

    Mock::given(method("PUT"))
        .and(path("/aps/2/application/tenant/tenant-1"))
        .and(body_partial_json(json!({ "USERS": { "usage": 3 }, "DISKSPACE": { "usage": 42 } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&oa)
        .await;
    Mock::given(method("GET"))
        .and(path("/aps/2/resources/tenant-1/account"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "aps": { "id": "acc-42" } }])))
        .mount(&oa)
        .await;
    Mock::given(method("POST"))
        .and(path("/aps/2/resources/nm-1/notifications"))
        .and(body_partial_json(json!({ "status": "ready", "accountId": "acc-42" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&oa)
        .await;

    let request = signed_request("POST", "/connector/v1/tenant/tenant-1/onUsersChange", &oa, Some(json!({})));
    let (status, _, body) = send(router(&fallball), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));
}

#[tokio::test]
async fn storage_limit_update_ignores_zero() {
    let fallball = MockServer::start().await;
    let oa = MockServer::start().await;
    mount_reseller(&fallball).await;
    mount_tenant_name(&oa).await;

    Mock::given(method("PUT"))
        .and(path(CLIENT_PATH))
        .and(body_partial_json(json!({ "name": "acme-sub555", "storage": { "limit": 500 } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&fallball)
        .await;

    let app = router(&fallball);
    let request = signed_request("PUT", "/connector/v1/tenant/tenant-1", &oa, Some(json!({ "DISKSPACE": { "limit": 500 } })));
    let (status, _, _) = send(app.clone(), request).await;
    assert_eq!(status, StatusCode::OK);

    let request = signed_request("PUT", "/connector/v1/tenant/tenant-1", &oa, Some(json!({ "DISKSPACE": { "limit": 0 } })));
    let (status, _, _) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn deleting_a_tenant_removes_the_client() {
    let fallball = MockServer::start().await;
    let oa = MockServer::start().await;
    mount_reseller(&fallball).await;
    mount_tenant_name(&oa).await;

    Mock::given(method("DELETE"))
        .and(path(CLIENT_PATH))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&fallball)
        .await;

    let request = signed_request("DELETE", "/connector/v1/tenant/tenant-1", &oa, None);
    let (status, _, _) = send(router(&fallball), request).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn storage_errors_keep_their_status() {
    let fallball = MockServer::start().await;
    let oa = MockServer::start().await;
    mount_reseller(&fallball).await;
    mount_tenant_name(&oa).await;

    Mock::given(method("DELETE"))
        .and(path(CLIENT_PATH))
        .respond_with(ResponseTemplate::new(404).set_body_string("\"Client not found\""))
        .mount(&fallball)
        .await;

    let request = signed_request("DELETE", "/connector/v1/tenant/tenant-1", &oa, None);
    let (status, _, body) = send(router(&fallball), request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Client not found");
}

#[tokio::test]
async fn admin_login_falls_back_to_the_login_form() {
    let fallball = MockServer::start().await;
    let oa = MockServer::start().await;
    mount_reseller(&fallball).await;

    Mock::given(method("GET"))
        .and(path("/aps/2/resources/tenant-1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&oa)
        .await;
    Mock::given(method("GET"))
        .and(path(format!(
            "/resellers/reseller-test/clients/fake_client/users/{}/link",
            user_id_for_email("does-not-exist@non-existing.local")
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("https://fallball.io/login")))
        .expect(1)
        .mount(&fallball)
        .await;

    let request = signed_request("GET", "/connector/v1/tenant/tenant-1/adminlogin", &oa, None);
    let (status, headers, body) = send(router(&fallball), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["content-type"], "text/plain");
    assert_eq!(body, json!("https://fallball.io/login"));
}

// ---
// Usuários
// ---

#[tokio::test]
async fn assigning_a_gold_user() {
    let fallball = MockServer::start().await;
    let oa = MockServer::start().await;
    mount_reseller(&fallball).await;
    mount_tenant_name(&oa).await;
    mount_client(&fallball, 100).await;
    mount_notification_manager(&oa).await;
    mount_oa_resource(
        &oa,
        "oa-user-1",
        json!({
            "aps": { "id": "oa-user-1" },
            "email": "john@acme.io",
            "isAccountAdmin": false,
            "displayName": "John"
        }),
    )
    .await;

    Mock::given(method("POST"))
        .and(path("/resellers/reseller-test/clients/acme-sub555/users"))
        .and(body_partial_json(json!({
            "email": "john@acme.io",
            "user_id": user_id_for_email("john@acme.io"),
            "admin": false,
            "profile_type": "gold",
            "storage": { "limit": 20 }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
        .expect(1)
        .mount(&fallball)
        .await;
    Mock::given(method("POST"))
        .and(path("/aps/2/resources/nm-1/notifications"))
        .and(body_partial_json(json!({
            "userId": "oa-user-1",
            "link": "/v/pa/ccp-users/viewUser/r/oa-user-1",
            "message": { "message": "Fallball assigned to user" },
            "details": { "message": "Fallball was assigned to John" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&oa)
        .await;

    let payload = json!({
        "aps": { "type": "http://fallball.io/user/1.0" },
        "tenant": { "aps": { "id": TENANT_ID } },
        "user": { "aps": { "id": "oa-user-1" } },
        "resource": "GOLD_USERS"
    });
    let request = signed_request("POST", "/connector/v1/user", &oa, Some(payload));
    let (status, _, body) = send(router(&fallball), request).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({ "userId": "john@acme.io" }));
}

#[tokio::test]
async fn users_of_a_client_without_quota_get_zero() {
    let fallball = MockServer::start().await;
    let oa = MockServer::start().await;
    mount_reseller(&fallball).await;
    mount_tenant_name(&oa).await;
    mount_client(&fallball, 0).await;
    mount_notification_manager(&oa).await;
    mount_oa_resource(
        &oa,
        "oa-user-1",
        json!({ "aps": { "id": "oa-user-1" }, "email": "john@acme.io", "isAccountAdmin": true, "displayName": "John" }),
    )
    .await;

    Mock::given(method("POST"))
        .and(path("/resellers/reseller-test/clients/acme-sub555/users"))
        .and(body_partial_json(json!({ "admin": true, "profile_type": "default", "storage": { "limit": 0 } })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
        .expect(1)
        .mount(&fallball)
        .await;
    Mock::given(method("POST"))
        .and(path("/aps/2/resources/nm-1/notifications"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&oa)
        .await;

    let payload = json!({
        "aps": { "type": "http://fallball.io/user/1.0" },
        "tenant": { "aps": { "id": TENANT_ID } },
        "user": { "aps": { "id": "oa-user-1" } }
    });
    let request = signed_request("POST", "/connector/v1/user", &oa, Some(payload));
    let (status, _, _) = send(router(&fallball), request).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn user_payload_needs_a_tenant() {
    let fallball = MockServer::start().await;
    let oa = MockServer::start().await;
    mount_reseller(&fallball).await;

    let payload = json!({
        "aps": { "type": "http://fallball.io/user/1.0" },
        "user": { "aps": { "id": "oa-user-1" } }
    });
    let request = signed_request("POST", "/connector/v1/user", &oa, Some(payload));
    let (status, _, body) = send(router(&fallball), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Missing tenant in request");
}

#[tokio::test]
async fn removing_a_user() {
    let fallball = MockServer::start().await;
    let oa = MockServer::start().await;
    mount_reseller(&fallball).await;
    mount_tenant_name(&oa).await;
    mount_notification_manager(&oa).await;
    mount_oa_resource(
        &oa,
        "svc-user-1",
        json!({ "aps": { "id": "svc-user-1" }, "tenant": { "aps": { "id": TENANT_ID } }, "userId": "john@acme.io" }),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/aps/2/resources/svc-user-1/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "aps": { "id": "oa-user-1" }, "displayName": "John" }
        ])))
        .mount(&oa)
        .await;

    Mock::given(method("DELETE"))
        .and(path(format!(
            "/resellers/reseller-test/clients/acme-sub555/users/{}",
            user_id_for_email("john@acme.io")
        )))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&fallball)
        .await;
    Mock::given(method("POST"))
        .and(path("/aps/2/resources/nm-1/notifications"))
        .and(body_partial_json(json!({
            "message": { "message": "Fallball unassigned from user" },
            "details": { "message": "Fallball service was unassigned from John" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&oa)
        .await;

    let request = signed_request("DELETE", "/connector/v1/user/svc-user-1", &oa, None);
    let (status, _, _) = send(router(&fallball), request).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn changing_user_class_resyncs_usage() {
    let fallball = MockServer::start().await;
    let oa = MockServer::start().await;
    mount_reseller(&fallball).await;
    mount_tenant_name(&oa).await;
    mount_client(&fallball, 100).await;
    mount_user_schema(&oa).await;
    mount_notification_manager(&oa).await;
    mount_oa_resource(
        &oa,
        "svc-user-1",
        json!({ "aps": { "id": "svc-user-1" }, "tenant": { "aps": { "id": TENANT_ID } }, "userId": "john@acme.io" }),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/aps/2/resources/svc-user-1/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "aps": { "id": "oa-user-1" }, "displayName": "John" }
        ])))
        .mount(&oa)
        .await;
    Mock::given(method("GET"))
        .and(path("/aps/2/resources/svc-user-1/tenant"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "aps": { "id": TENANT_ID } }])))
        .mount(&oa)
        .await;

    let user_path = format!(
        "/resellers/reseller-test/clients/acme-sub555/users/{}",
        user_id_for_email("john@acme.io")
    );
    Mock::given(method("GET"))
        .and(path(user_path.clone()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "email": "john@acme.io",
            "admin": false,
            "storage": { "limit": 10, "usage": 1 },
            "profile_type": "default"
        })))
        .mount(&fallball)
        .await;
    Mock::given(method("PUT"))
        .and(path(user_path))
        .and(body_partial_json(json!({ "profile_type": "gold", "storage": { "limit": 20 } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&fallball)
        .await;
    Mock::given(method("PUT"))
        .and(path("/aps/2/application/tenant/tenant-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&oa)
        .await;
    Mock::given(method("POST"))
        .and(path("/aps/2/resources/nm-1/notifications"))
        .and(body_partial_json(json!({ "details": { "message": "Fallball service was modified for John" } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&oa)
        .await;

    let request = signed_request(
        "PUT",
        "/connector/v1/user/svc-user-1",
        &oa,
        Some(json!({ "resource": "GOLD_USERS" })),
    );
    let (status, _, body) = send(router(&fallball), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));
}

#[tokio::test]
async fn user_login_redirects_to_the_service() {
    let fallball = MockServer::start().await;
    let oa = MockServer::start().await;
    mount_reseller(&fallball).await;
    mount_tenant_name(&oa).await;
    mount_oa_resource(
        &oa,
        "svc-user-1",
        json!({ "aps": { "id": "svc-user-1" }, "tenant": { "aps": { "id": TENANT_ID } }, "userId": "john@acme.io" }),
    )
    .await;
    Mock::given(method("GET"))
        .and(path(format!(
            "/resellers/reseller-test/clients/acme-sub555/users/{}/link",
            user_id_for_email("john@acme.io")
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("https://fallball.io/login?token=abc")))
        .mount(&fallball)
        .await;

    let request = signed_request("GET", "/connector/v1/user/svc-user-1/userlogin", &oa, None);
    let (status, _, body) = send(router(&fallball), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "redirectUrl": "https://fallball.io/login?token=abc" }));
}
