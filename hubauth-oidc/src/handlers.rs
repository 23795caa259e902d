use std::sync::Arc;

use hubauth_core::http::header::{self, HeaderName};
use hubauth_core::http::response::IntoResponse;
use hubauth_core::http::{Json, Query, State, StatusCode};
use hubauth_core::HttpError;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::state::StateStore;

pub const REQUEST_PATH: &str = "/oauth2/request";
pub const CALLBACK_PATH: &str = "/oauth2/callback";

/// Token responses must not be cached (RFC 6749 §5.1).
const TOKEN_HEADERS: [(HeaderName, &str); 2] = [
    (header::CACHE_CONTROL, "no-store"),
    (header::PRAGMA, "no-cache"),
];

/// Everything the two handlers share, built once by discovery.
pub(crate) struct OperationState {
    pub http: reqwest::Client,
    pub authorization_endpoint: Url,
    pub token_endpoint: String,
    pub client_id: String,
    pub client_secret: String,
    pub callback_url: String,
    pub states: StateStore,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AuthRequestParams {
    pub scope: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CallbackParams {
    pub state: Option<String>,
    pub code: Option<String>,
}

/// Token endpoint response, as sent by the provider.
#[derive(Debug, Deserialize)]
struct ProviderTokenResponse {
    access_token: String,
    #[serde(default)]
    id_token: Option<String>,
    #[serde(default = "default_token_type")]
    token_type: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// Tokens handed back to the caller of the callback endpoint.
#[derive(Debug, Serialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    pub id_token: String,
    pub token_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
}

fn required(value: Option<String>, name: &str) -> Result<String, HttpError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| HttpError::BadRequest(format!("missing '{name}' parameter")))
}

/// GET /oauth2/request
pub(crate) async fn create_auth_request(
    State(state): State<Arc<OperationState>>,
    Query(params): Query<AuthRequestParams>,
) -> Result<impl IntoResponse, HttpError> {
    let scope = required(params.scope, "scope")?;
    let oauth_state = state.states.issue(&scope)?;

    let mut location = state.authorization_endpoint.clone();
    location
        .query_pairs_mut()
        .append_pair("response_type", "code")
        .append_pair("client_id", &state.client_id)
        .append_pair("redirect_uri", &state.callback_url)
        .append_pair("scope", &format!("openid {scope}"))
        .append_pair("state", &oauth_state);

    debug!(%scope, "Redirecting to identity provider");
    Ok((StatusCode::FOUND, [(header::LOCATION, String::from(location))]))
}

/// GET /oauth2/callback
pub(crate) async fn handle_auth_callback(
    State(state): State<Arc<OperationState>>,
    Query(params): Query<CallbackParams>,
) -> Result<impl IntoResponse, HttpError> {
    let oauth_state = required(params.state, "state")?;
    let code = required(params.code, "code")?;

    if !state.states.consume(&oauth_state)? {
        warn!("Callback with unknown or reused state");
        return Err(HttpError::BadRequest("invalid oauth state".into()));
    }

    let tokens = exchange_code(&state, &code).await?;
    debug!(token_type = %tokens.token_type, "Authorization code exchanged");
    Ok((TOKEN_HEADERS, Json(tokens)))
}

async fn exchange_code(state: &OperationState, code: &str) -> Result<TokenResponse, HttpError> {
    let form = [
        ("grant_type", "authorization_code"),
        ("code", code),
        ("redirect_uri", state.callback_url.as_str()),
        ("client_id", state.client_id.as_str()),
        ("client_secret", state.client_secret.as_str()),
    ];

    let upstream = |e: reqwest::Error| {
        warn!(error = %e, "Token endpoint request failed");
        HttpError::BadGateway(format!("token exchange failed: {e}"))
    };

    let response = state
        .http
        .post(&state.token_endpoint)
        .form(&form)
        .send()
        .await
        .map_err(upstream)?;

    let status = response.status();
    if !status.is_success() {
        warn!(%status, "Token endpoint rejected the authorization code");
        return Err(HttpError::BadGateway(format!(
            "token endpoint returned HTTP {}",
            status.as_u16()
        )));
    }

    let body: ProviderTokenResponse = response.json().await.map_err(upstream)?;
    let id_token = body
        .id_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| HttpError::BadGateway("token response has no id_token".into()))?;

    Ok(TokenResponse {
        access_token: body.access_token,
        id_token,
        token_type: body.token_type,
        expires_in: body.expires_in,
    })
}
