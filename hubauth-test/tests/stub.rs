use std::time::Duration;

use http::StatusCode;
use hubauth_test::StubOidcProvider;
use serde_json::{json, Value};

#[tokio::test]
async fn serves_discovery_document() {
    let stub = StubOidcProvider::start().await;

    let doc: Value = reqwest::get(format!("{}/.well-known/openid-configuration", stub.url()))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(doc["issuer"], stub.url());
    assert_eq!(doc["token_endpoint"], format!("{}/oauth2/token", stub.url()));
    assert_eq!(doc["id_token_signing_alg_values_supported"], json!(["RS256"]));
    assert_eq!(stub.discovery_hits(), 1);
}

#[tokio::test]
async fn configurable_failure_modes() {
    let stub = StubOidcProvider::builder()
        .discovery_status(StatusCode::INTERNAL_SERVER_ERROR)
        .algorithms(&["ES256"])
        .start()
        .await;

    let resp = reqwest::get(format!("{}/.well-known/openid-configuration", stub.url()))
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 500);
    let doc: Value = resp.json().await.unwrap();
    assert_eq!(doc["id_token_signing_alg_values_supported"], json!(["ES256"]));
}

#[tokio::test]
async fn raw_body_and_delay() {
    let stub = StubOidcProvider::builder()
        .discovery_body("not json")
        .discovery_delay(Duration::from_millis(50))
        .start()
        .await;

    let started = std::time::Instant::now();
    let text = reqwest::get(format!("{}/.well-known/openid-configuration", stub.url()))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(text, "not json");
    assert!(started.elapsed() >= Duration::from_millis(50));
}

#[tokio::test]
async fn records_token_requests() {
    let stub = StubOidcProvider::builder()
        .token_response(json!({"access_token": "a", "token_type": "Bearer"}))
        .start()
        .await;

    let body: Value = reqwest::Client::new()
        .post(format!("{}/oauth2/token", stub.url()))
        .form(&[("grant_type", "authorization_code"), ("code", "xyz")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["access_token"], "a");
    let requests = stub.token_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["code"], "xyz");
    assert_eq!(requests[0]["grant_type"], "authorization_code");
}
