//! hub-auth REST service.
//!
//! Wires the operation modules shipped with hub-auth into one
//! [`Controller`] and serves its handlers over HTTP.
//!
//! ```ignore
//! let config = OperationConfig::new("https://idp.example.com", MemProvider::shared());
//! let controller = hubauth::new_controller(&config).await?;
//! hubauth::serve(hubauth::router(&controller), "0.0.0.0:8080").await?;
//! ```

use std::future::Future;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub use hubauth_core::{
    init_tracing, Controller, ErrorKind, HubAuthConfig, InitializationError, MemProvider,
    ModuleRegistry, ServiceSettings,
};
pub use hubauth_oidc as oidc;
pub use hubauth_oidc::{AuthOperations, OperationConfig};

/// Every operation module hub-auth ships, in serving order.
pub fn default_registry() -> ModuleRegistry<OperationConfig> {
    ModuleRegistry::new().with(AuthOperations)
}

/// Build the controller from the default modules.
///
/// Fails, and serves nothing, if any module cannot start.
pub async fn new_controller(config: &OperationConfig) -> Result<Controller, InitializationError> {
    Controller::new(config, &default_registry()).await
}

/// All controller handlers on one router, with request tracing.
pub fn router(controller: &Controller) -> Router {
    controller.router().layer(TraceLayer::new_for_http())
}

/// Serve `app` on `addr` until Ctrl-C (or SIGTERM on unix).
pub async fn serve(app: Router, addr: &str) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "hub-auth listening");
    serve_with_shutdown(listener, app, shutdown_signal()).await
}

/// Serve on an already bound listener until `shutdown` resolves.
pub async fn serve_with_shutdown(
    listener: TcpListener,
    app: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("hub-auth stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}
