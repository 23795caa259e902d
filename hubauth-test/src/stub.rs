use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use http::StatusCode;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Form fields of one request received by the stub token endpoint.
pub type TokenRequestRecord = HashMap<String, String>;

struct StubState {
    issuer: String,
    discovery_status: StatusCode,
    discovery_body: Option<String>,
    discovery_delay: Option<Duration>,
    algorithms: Vec<String>,
    token_status: StatusCode,
    token_body: Value,
    discovery_hits: AtomicUsize,
    token_requests: Mutex<Vec<TokenRequestRecord>>,
}

/// Configures a [`StubOidcProvider`] before it starts listening.
pub struct StubOidcProviderBuilder {
    issuer: Option<String>,
    discovery_status: StatusCode,
    discovery_body: Option<String>,
    discovery_delay: Option<Duration>,
    algorithms: Vec<String>,
    token_status: StatusCode,
    token_body: Value,
}

impl Default for StubOidcProviderBuilder {
    fn default() -> Self {
        Self {
            issuer: None,
            discovery_status: StatusCode::OK,
            discovery_body: None,
            discovery_delay: None,
            algorithms: vec!["RS256".to_string()],
            token_status: StatusCode::OK,
            token_body: json!({
                "access_token": "stub-access-token",
                "id_token": "stub-id-token",
                "token_type": "Bearer",
                "expires_in": 3600,
            }),
        }
    }
}

impl StubOidcProviderBuilder {
    /// Status of the discovery response (default `200`).
    pub fn discovery_status(mut self, status: StatusCode) -> Self {
        self.discovery_status = status;
        self
    }

    /// Serve this raw body instead of the generated discovery document.
    pub fn discovery_body(mut self, body: impl Into<String>) -> Self {
        self.discovery_body = Some(body.into());
        self
    }

    /// Sleep this long before answering discovery.
    pub fn discovery_delay(mut self, delay: Duration) -> Self {
        self.discovery_delay = Some(delay);
        self
    }

    /// Advertised `id_token_signing_alg_values_supported` (default `["RS256"]`).
    pub fn algorithms(mut self, algorithms: &[&str]) -> Self {
        self.algorithms = algorithms.iter().map(|a| a.to_string()).collect();
        self
    }

    /// Advertise a different `issuer` than the server's own base URL.
    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Status of the token endpoint response (default `200`).
    pub fn token_status(mut self, status: StatusCode) -> Self {
        self.token_status = status;
        self
    }

    /// JSON body of the token endpoint response.
    pub fn token_response(mut self, body: Value) -> Self {
        self.token_body = body;
        self
    }

    /// Bind `127.0.0.1:0` and start serving.
    pub async fn start(self) -> StubOidcProvider {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind stub OIDC provider");
        let addr = listener.local_addr().expect("stub has no local address");
        let base_url = format!("http://{addr}");

        let state = Arc::new(StubState {
            issuer: self.issuer.unwrap_or_else(|| base_url.clone()),
            discovery_status: self.discovery_status,
            discovery_body: self.discovery_body,
            discovery_delay: self.discovery_delay,
            algorithms: self.algorithms,
            token_status: self.token_status,
            token_body: self.token_body,
            discovery_hits: AtomicUsize::new(0),
            token_requests: Mutex::new(Vec::new()),
        });

        let router = Router::new()
            .route("/.well-known/openid-configuration", get(discovery))
            .route("/oauth2/token", post(token))
            .with_state(state.clone());

        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!(error = %e, "stub OIDC provider stopped");
            }
        });

        StubOidcProvider {
            addr,
            base_url,
            state,
            task,
        }
    }
}

/// A minimal OpenID provider for tests.
///
/// Serves `/.well-known/openid-configuration` (with `issuer` equal to its
/// own base URL unless overridden) and `POST /oauth2/token`. The server is
/// stopped when the value is dropped.
pub struct StubOidcProvider {
    addr: SocketAddr,
    base_url: String,
    state: Arc<StubState>,
    task: JoinHandle<()>,
}

impl StubOidcProvider {
    pub fn builder() -> StubOidcProviderBuilder {
        StubOidcProviderBuilder::default()
    }

    /// Start a well-behaved provider.
    pub async fn start() -> Self {
        Self::builder().start().await
    }

    /// Base URL, e.g. `http://127.0.0.1:49152`.
    pub fn url(&self) -> &str {
        &self.base_url
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Number of discovery requests served so far.
    pub fn discovery_hits(&self) -> usize {
        self.state.discovery_hits.load(Ordering::SeqCst)
    }

    /// Form bodies received by the token endpoint, oldest first.
    pub fn token_requests(&self) -> Vec<TokenRequestRecord> {
        self.state.token_requests.lock().unwrap().clone()
    }
}

impl Drop for StubOidcProvider {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn discovery(State(state): State<Arc<StubState>>) -> Response {
    state.discovery_hits.fetch_add(1, Ordering::SeqCst);
    if let Some(delay) = state.discovery_delay {
        tokio::time::sleep(delay).await;
    }

    if let Some(body) = &state.discovery_body {
        return (
            state.discovery_status,
            [(http::header::CONTENT_TYPE, "application/json")],
            body.clone(),
        )
            .into_response();
    }

    let issuer = &state.issuer;
    let doc = json!({
        "issuer": issuer,
        "authorization_endpoint": format!("{issuer}/oauth2/auth"),
        "token_endpoint": format!("{issuer}/oauth2/token"),
        "jwks_uri": format!("{issuer}/oauth2/certs"),
        "userinfo_endpoint": format!("{issuer}/oauth2/userinfo"),
        "response_types_supported": ["code"],
        "subject_types_supported": ["public"],
        "id_token_signing_alg_values_supported": state.algorithms,
    });
    (state.discovery_status, Json(doc)).into_response()
}

async fn token(
    State(state): State<Arc<StubState>>,
    Form(form): Form<TokenRequestRecord>,
) -> Response {
    state.token_requests.lock().unwrap().push(form);
    (state.token_status, Json(state.token_body.clone())).into_response()
}
