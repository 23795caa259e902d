use std::future::Future;
use std::pin::Pin;

use tracing::{error, info};

use crate::error::{InitializationError, ModuleError};
use crate::handler::{register, Handler};
use crate::http::Router;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A coherent set of REST endpoints built from a shared configuration `C`.
///
/// `construct` is called exactly once per [`Controller::new`]. It may perform
/// network I/O (OIDC discovery, ...) and must bound it with a finite timeout.
/// On success it returns the module's handlers in registration order.
///
/// # Example
///
/// ```ignore
/// struct HealthModule;
///
/// impl OperationModule<AppConfig> for HealthModule {
///     fn name(&self) -> &str {
///         "health"
///     }
///
///     async fn construct(&self, _config: &AppConfig) -> Result<Vec<Handler>, ModuleError> {
///         Ok(vec![Handler::get("/healthcheck", health, ())])
///     }
/// }
/// ```
pub trait OperationModule<C>: Send + Sync + 'static {
    /// Identifier used in logs and in [`InitializationError::module`].
    fn name(&self) -> &str;

    fn construct(
        &self,
        config: &C,
    ) -> impl Future<Output = Result<Vec<Handler>, ModuleError>> + Send;
}

/// Object-safe wrapper for `OperationModule`.
trait OperationModuleErased<C>: Send + Sync {
    fn name(&self) -> &str;

    fn construct<'a>(
        &'a self,
        config: &'a C,
    ) -> BoxFuture<'a, Result<Vec<Handler>, ModuleError>>;
}

impl<C, M: OperationModule<C>> OperationModuleErased<C> for M {
    fn name(&self) -> &str {
        OperationModule::name(self)
    }

    fn construct<'a>(
        &'a self,
        config: &'a C,
    ) -> BoxFuture<'a, Result<Vec<Handler>, ModuleError>> {
        Box::pin(OperationModule::construct(self, config))
    }
}

/// Module built from a closure, see [`ModuleRegistry::with_fn`].
struct FnModule<F> {
    name: String,
    build: F,
}

impl<C, F, Fut> OperationModule<C> for FnModule<F>
where
    C: Clone + Send + Sync + 'static,
    F: Fn(C) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<Handler>, ModuleError>> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn construct(
        &self,
        config: &C,
    ) -> impl Future<Output = Result<Vec<Handler>, ModuleError>> + Send {
        (self.build)(config.clone())
    }
}

/// Ordered, caller-supplied list of operation modules.
///
/// The controller has no compile-time knowledge of which modules exist;
/// whoever bootstraps the process decides by filling the registry.
pub struct ModuleRegistry<C> {
    modules: Vec<Box<dyn OperationModuleErased<C>>>,
}

impl<C: 'static> ModuleRegistry<C> {
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
        }
    }

    /// Append a module. Modules are constructed in the order they are added.
    pub fn with(mut self, module: impl OperationModule<C>) -> Self {
        self.modules.push(Box::new(module));
        self
    }

    /// Append a module built from an async closure taking an owned copy of
    /// the configuration.
    pub fn with_fn<F, Fut>(self, name: impl Into<String>, build: F) -> Self
    where
        C: Clone + Send + Sync,
        F: Fn(C) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<Handler>, ModuleError>> + Send,
    {
        self.with(FnModule {
            name: name.into(),
            build,
        })
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Module names in construction order.
    pub fn names(&self) -> Vec<&str> {
        self.modules.iter().map(|m| m.name()).collect()
    }
}

impl<C: 'static> Default for ModuleRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Composition root: turns a configuration into one flat, ready-to-serve
/// list of handlers.
///
/// Built once at startup and read-only afterwards, so it can be shared
/// across threads without synchronization.
#[derive(Debug, Clone)]
pub struct Controller {
    handlers: Vec<Handler>,
}

impl Controller {
    /// Construct every registered module once, in order, and collect their
    /// handlers.
    ///
    /// All-or-nothing: the first module that fails aborts construction and
    /// its error is returned wrapped in an [`InitializationError`] naming the
    /// module. Later modules are never constructed. Handlers are kept
    /// verbatim: no filtering, deduplication or reordering.
    pub async fn new<C: Sync + 'static>(
        config: &C,
        registry: &ModuleRegistry<C>,
    ) -> Result<Self, InitializationError> {
        if registry.is_empty() {
            return Err(InitializationError::new(
                "registry",
                ModuleError::configuration("no operation modules registered"),
            ));
        }

        let mut handlers = Vec::new();
        for module in &registry.modules {
            let name = module.name();
            match module.construct(config).await {
                Ok(module_handlers) => {
                    info!(module = name, handlers = module_handlers.len(), "Operation module ready");
                    handlers.extend(module_handlers);
                }
                Err(err) => {
                    error!(module = name, kind = %err.kind(), error = %err, "Operation module failed to start");
                    return Err(InitializationError::new(name, err));
                }
            }
        }

        Ok(Self { handlers })
    }

    /// All controller endpoints, in module construction order.
    pub fn operations(&self) -> &[Handler] {
        &self.handlers
    }

    /// Register all handlers on a fresh router.
    pub fn router(&self) -> Router {
        register(Router::new(), &self.handlers)
    }
}
