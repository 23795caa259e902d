//! Test utilities for hub-auth.
//!
//! - [`TestApp`] drives a router in-process through `tower::ServiceExt::oneshot`.
//! - [`StubOidcProvider`] is a real HTTP server on `127.0.0.1:0` that serves
//!   a discovery document and a token endpoint, with knobs to make either
//!   misbehave.

mod app;
mod stub;

pub use app::{TestApp, TestRequest, TestResponse};
pub use stub::{StubOidcProvider, StubOidcProviderBuilder, TokenRequestRecord};
