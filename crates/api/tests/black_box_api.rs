use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::json;

use assetflow_auth::JwtClaims;
use assetflow_core::EmailAddress;
use assetflow_payments::MockGateway;

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(jwt_secret: &str) -> Self {
        // Build app (same router as prod), but bind to an ephemeral port.
        let app = assetflow_api::app::build_app(jwt_secret, Arc::new(MockGateway));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(jwt_secret: &str, email: &str, name: &str) -> String {
    let now = Utc::now();
    let claims = JwtClaims {
        sub: EmailAddress::parse(email).unwrap(),
        name: name.to_string(),
        iat: now.timestamp(),
        exp: (now + ChronoDuration::minutes(10)).timestamp(),
    };

    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn("test-secret").await;

    let client = reqwest::Client::new();
    let res = client
        .get(format!("{}/assets", srv.base_url))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn issued_token_is_accepted() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/jwt", srv.base_url))
        .json(&json!({ "email": "hr@company.com", "name": "HR" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    let token = body["token"].as_str().unwrap().to_string();

    let res = client
        .get(format!("{}/assets", srv.base_url))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn asset_request_lifecycle_over_http() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let client = reqwest::Client::new();
    let token = mint_jwt(jwt_secret, "hr@company.com", "HR");

    // Create an asset with a single unit.
    let res = client
        .post(format!("{}/assets", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "product_name": "Laptop",
            "product_type": "Returnable",
            "product_quantity": 1,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    let asset_id = body["id"].as_str().unwrap().to_string();

    // The provider is the authenticated caller.
    let res = client
        .get(format!("{}/asset/{}", srv.base_url, asset_id))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["email"], "hr@company.com");

    // Request it.
    let res = client
        .post(format!("{}/asset/request", srv.base_url))
        .json(&json!({
            "requestedAssetId": asset_id,
            "requester_info": { "email": "emp@company.com", "name": "Emp" },
            "note": "need it",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    let request_id = body["id"].as_str().unwrap().to_string();

    // A second active request for the same asset is a duplicate.
    let res = client
        .post(format!("{}/asset/request", srv.base_url))
        .json(&json!({
            "requestedAssetId": asset_id,
            "requester_info": { "email": "emp@company.com", "name": "Emp" },
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "duplicate_request");

    // Approve takes the last unit out of stock.
    let res = client
        .patch(format!("{}/asset/request/approve", srv.base_url))
        .json(&json!({ "reqId": request_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(format!("{}/asset/{}", srv.base_url, asset_id))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["product_quantity"], 0);
    assert_eq!(body["availability"], "Out of stock");

    // Return puts it back.
    let res = client
        .patch(format!("{}/asset/request/return", srv.base_url))
        .json(&json!({ "reqId": request_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(format!("{}/asset/{}", srv.base_url, asset_id))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["product_quantity"], 1);
    assert_eq!(body["availability"], "Available");

    // The HR inbox saw the whole history.
    let res = client
        .get(format!("{}/assets/all-requests/hr@company.com", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["count"], 1);
    assert_eq!(body["items"][0]["status"], "return");
}

#[tokio::test]
async fn duplicate_employee_registration_conflicts() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    let register = json!({ "email": "emp@company.com", "name": "Emp", "role": "employee" });
    let res = client
        .post(format!("{}/employees", srv.base_url))
        .json(&register)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .post(format!("{}/employees", srv.base_url))
        .json(&register)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "duplicate_employee");
}

#[tokio::test]
async fn team_membership_over_http() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();
    let token = mint_jwt("test-secret", "hr@company.com", "HR");

    for (email, name, role) in [
        ("hr@company.com", "HR", "hr"),
        ("emp@company.com", "Emp", "employee"),
    ] {
        let res = client
            .post(format!("{}/employees", srv.base_url))
            .json(&json!({ "email": email, "name": name, "role": role }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    let res = client
        .post(format!("{}/teams/single", srv.base_url))
        .json(&json!({ "hrEmail": "hr@company.com", "empEmail": "emp@company.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    let membership_id = body["id"].as_str().unwrap().to_string();

    // The member sees their team and their join flag.
    let res = client
        .get(format!("{}/company-info/emp@company.com", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["hr_info"]["email"], "hr@company.com");
    assert!(!body["teamId"].as_str().unwrap().is_empty());

    let res = client
        .get(format!("{}/employee/emp@company.com", srv.base_url))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["isJoin"], true);

    let res = client
        .get(format!("{}/my-team/hr@company.com", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["count"], 1);

    // Removal unwinds everything.
    let res = client
        .delete(format!("{}/team/{}", srv.base_url, membership_id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(format!("{}/employee/emp@company.com", srv.base_url))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["isJoin"], false);
}

#[tokio::test]
async fn seat_purchase_updates_the_member_limit() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/employees", srv.base_url))
        .json(&json!({ "email": "hr@company.com", "name": "HR", "role": "hr" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .patch(format!("{}/employee/payment/hr@company.com", srv.base_url))
        .json(&json!({ "price": 8 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(format!("{}/employee/hr@company.com", srv.base_url))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["member_limit"], 10);
}

#[tokio::test]
async fn payment_intent_round_trip() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let client = reqwest::Client::new();
    let token = mint_jwt(jwt_secret, "hr@company.com", "HR");

    let res = client
        .post(format!("{}/create-payment-intent", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "price": 8 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body["clientSecret"].as_str().unwrap().contains("secret"));

    let res = client
        .post(format!("{}/create-payment-intent", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "price": 0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_ids_are_rejected() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/asset/not-a-uuid", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_id");
}
