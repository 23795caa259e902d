use hubauth_core::http::{Body, Method, Request, State, StatusCode};
use hubauth_core::{register, Handler};
use http_body_util::BodyExt;
use tower::ServiceExt;

async fn greet(State(name): State<String>) -> String {
    format!("hello {name}")
}

async fn create() -> StatusCode {
    StatusCode::CREATED
}

fn request(method: Method, uri: &str) -> Request {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_string(resp: hubauth_core::http::response::Response) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[test]
fn handler_exposes_method_and_path() {
    let handler = Handler::post("/items", create, ());
    assert_eq!(*handler.method(), Method::POST);
    assert_eq!(handler.path(), "/items");
    assert_eq!(
        format!("{handler:?}"),
        "Handler { method: POST, path: \"/items\", .. }"
    );
}

#[tokio::test]
async fn call_invokes_with_bound_state() {
    let handler = Handler::get("/greet", greet, "alice".to_string());
    let resp = handler.call(request(Method::GET, "/greet")).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_string(resp).await, "hello alice");
}

#[tokio::test]
async fn call_rejects_other_methods() {
    let handler = Handler::get("/greet", greet, "alice".to_string());
    let resp = handler.call(request(Method::POST, "/greet")).await;
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn register_merges_methods_on_same_path() {
    let handlers = vec![
        Handler::get("/items", greet, "bob".to_string()),
        Handler::post("/items", create, ()),
    ];
    let router = register(hubauth_core::http::Router::new(), &handlers);

    let resp = router.clone().oneshot(request(Method::GET, "/items")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_string(resp).await, "hello bob");

    let resp = router.clone().oneshot(request(Method::POST, "/items")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = router.oneshot(request(Method::GET, "/missing")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
