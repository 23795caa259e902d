//! Re-exports of the HTTP types operation modules build handlers from, so
//! module crates don't need to pin their own axum version.

pub use axum::body::Body;
pub use axum::extract::{Query, Request, State};
pub use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri};
pub use axum::{Json, Router};

pub mod response {
    pub use axum::response::{IntoResponse, Redirect, Response};
}

pub mod routing {
    pub use axum::routing::{delete, get, patch, post, put, MethodRouter};
}
