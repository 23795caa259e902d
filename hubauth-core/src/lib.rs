//! Core of the hub-auth REST service.
//!
//! Operation modules each expose a set of REST [`Handler`]s. The
//! [`Controller`] constructs every module registered in a
//! [`ModuleRegistry`], fails fast if any of them cannot start, and hands the
//! flattened handler list to whoever owns the HTTP listener.
//!
//! # Example
//!
//! ```ignore
//! use hubauth_core::{Controller, ModuleRegistry};
//!
//! let registry = ModuleRegistry::new().with(AuthOperations);
//! let controller = Controller::new(&config, &registry).await?;
//! let app = controller.router();
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod handler;
pub mod http;
pub mod logging;
pub mod storage;

pub use config::{ConfigError, HubAuthConfig, ServiceSettings};
pub use controller::{Controller, ModuleRegistry, OperationModule};
pub use error::{error_response, ErrorKind, HttpError, InitializationError, ModuleError};
pub use handler::{register, Handler};
pub use logging::init_tracing;
pub use storage::{MemProvider, MemStore, Provider, StorageError, Store};

pub mod prelude {
    //! Re-exports of the types operation modules are written against.
    pub use crate::http::response::{IntoResponse, Response};
    pub use crate::http::{Json, Query, State, StatusCode};
    pub use crate::{Handler, HttpError, ModuleError, OperationModule, Provider, Store};
}
