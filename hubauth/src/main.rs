use std::process::ExitCode;

use hubauth::{HubAuthConfig, MemProvider, OperationConfig, ServiceSettings};
use tracing::{error, info};

const DEFAULT_PROFILE: &str = "dev";

#[tokio::main]
async fn main() -> ExitCode {
    let profile = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_PROFILE.to_string());

    let settings = match HubAuthConfig::load(&profile).and_then(|c| ServiceSettings::from_config(&c)) {
        Ok(settings) => settings,
        Err(e) => {
            // tracing is not installed yet
            eprintln!("hub-auth-rest: invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    hubauth::init_tracing(&settings.log);
    info!(%profile, host_url = %settings.host_url, "Starting hub-auth-rest");

    let config = OperationConfig::from_settings(&settings.oidc, MemProvider::shared());
    let controller = match hubauth::new_controller(&config).await {
        Ok(controller) => controller,
        Err(e) => {
            error!(module = e.module(), kind = %e.kind(), error = %e, "Controller initialization failed");
            return ExitCode::FAILURE;
        }
    };

    for handler in controller.operations() {
        info!(method = %handler.method(), path = handler.path(), "Registered handler");
    }

    if let Err(e) = hubauth::serve(hubauth::router(&controller), &settings.host_url).await {
        error!(error = %e, "Server error");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
