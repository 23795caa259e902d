use std::time::Duration;

use hubauth::{ErrorKind, MemProvider, OperationConfig};
use hubauth_test::{StubOidcProvider, TestApp};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

fn config(url: &str) -> OperationConfig {
    OperationConfig::new(url, MemProvider::shared()).with_client("hub", "s3cret")
}

#[test]
fn default_registry_lists_the_oidc_module() {
    assert_eq!(hubauth::default_registry().names(), vec!["hub-auth-rest"]);
}

#[tokio::test]
async fn new_controller_against_stub_provider() {
    let stub = StubOidcProvider::start().await;

    let controller = hubauth::new_controller(&config(stub.url())).await.unwrap();

    let paths: Vec<_> = controller.operations().iter().map(|h| h.path()).collect();
    assert_eq!(paths, vec!["/oauth2/request", "/oauth2/callback"]);
}

#[tokio::test]
async fn new_controller_reports_the_failed_module() {
    let err = hubauth::new_controller(&config("BadURL")).await.unwrap_err();

    assert_eq!(err.module(), "hub-auth-rest");
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[tokio::test]
async fn traced_router_serves_handlers() {
    let stub = StubOidcProvider::start().await;
    let controller = hubauth::new_controller(&config(stub.url())).await.unwrap();
    let app = TestApp::new(hubauth::router(&controller));

    app.get("/oauth2/request")
        .query("scope", "profile")
        .send()
        .await
        .assert_found();
    app.get("/unknown").send().await.assert_not_found();
}

#[tokio::test]
async fn serves_over_tcp_until_shutdown() {
    let stub = StubOidcProvider::start().await;
    let controller = hubauth::new_controller(&config(stub.url())).await.unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();
    let server = tokio::spawn(hubauth::serve_with_shutdown(
        listener,
        hubauth::router(&controller),
        async move {
            let _ = rx.await;
        },
    ));

    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();
    let resp = client
        .get(format!("http://{addr}/oauth2/request?scope=profile"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 302);

    let resp = client
        .get(format!("http://{addr}/oauth2/callback?code=c"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);

    drop(client);
    tx.send(()).unwrap();
    let result = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server did not shut down");
    assert!(result.unwrap().is_ok());
}
