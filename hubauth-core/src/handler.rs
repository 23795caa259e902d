use axum::handler::Handler as AxumHandler;
use tower::ServiceExt;

use crate::http::response::Response;
use crate::http::routing::{self, MethodRouter};
use crate::http::{Method, Request, Router};

/// A REST endpoint ready for router registration: HTTP method, path pattern,
/// and the request-handling capability with its state already bound.
///
/// Immutable once built. Cloning is cheap (the bound route is reference
/// counted internally by axum).
///
/// ```ignore
/// let handler = Handler::get("/oauth2/request", create_request, state.clone());
/// assert_eq!(*handler.method(), Method::GET);
/// ```
#[derive(Clone)]
pub struct Handler {
    method: Method,
    path: String,
    route: MethodRouter,
}

macro_rules! handler_ctor {
    ($($name:ident => $method:ident),* $(,)?) => {
        $(
            #[doc = concat!("Build a `", stringify!($method), "` handler bound to `state`.")]
            pub fn $name<H, T, S>(path: impl Into<String>, handler: H, state: S) -> Self
            where
                H: AxumHandler<T, S>,
                T: 'static,
                S: Clone + Send + Sync + 'static,
            {
                Self {
                    method: Method::$method,
                    path: path.into(),
                    route: routing::$name(handler).with_state(state),
                }
            }
        )*
    };
}

impl Handler {
    handler_ctor! {
        get => GET,
        post => POST,
        put => PUT,
        delete => DELETE,
        patch => PATCH,
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// The bound axum route fragment.
    pub fn route(&self) -> &MethodRouter {
        &self.route
    }

    /// Invoke the handler directly, bypassing any router.
    ///
    /// Requests with a method other than [`method()`](Self::method) get
    /// `405 Method Not Allowed`, as they would through a router.
    pub async fn call(&self, request: Request) -> Response {
        match self.route.clone().oneshot(request).await {
            Ok(response) => response,
            Err(never) => match never {},
        }
    }
}

impl std::fmt::Debug for Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handler")
            .field("method", &self.method)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Register every handler on `router`, in order.
///
/// Handlers sharing a path are merged onto one route so distinct methods on
/// the same path coexist; registering the same method twice on one path is a
/// programming error and panics inside axum.
pub fn register(router: Router, handlers: &[Handler]) -> Router {
    let mut merged: Vec<(&str, MethodRouter)> = Vec::new();
    for handler in handlers {
        match merged.iter().position(|(path, _)| *path == handler.path()) {
            Some(pos) => {
                let combined = merged[pos].1.clone().merge(handler.route.clone());
                merged[pos].1 = combined;
            }
            None => merged.push((handler.path(), handler.route.clone())),
        }
    }

    merged
        .into_iter()
        .fold(router, |router, (path, route)| router.route(path, route))
}
