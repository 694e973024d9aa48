// compute/mod.rs - Compute module binding and loader
//
// A compute module exposes a single stateless call that advances the grid by
// one generation. The relay only ever sees it through `ComputeModule` and
// obtains it through a `ModuleLoader` when handling `init`.

mod life;

pub use life::{LifeModule, Rule, Topology};

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::error::{ComputeError, LoadError};

/// One generation transition over the textual step payloads in `codec`.
///
/// Implementations must not keep cell or grid state between calls.
pub trait ComputeModule: Send + Sync {
    fn compute_step(&self, request: &str) -> Result<String, ComputeError>;
}

/// Adapts a closure into a compute module.
pub struct FnModule<F>(pub F);

impl<F> ComputeModule for FnModule<F>
where
    F: Fn(&str) -> Result<String, ComputeError> + Send + Sync,
{
    fn compute_step(&self, request: &str) -> Result<String, ComputeError> {
        (self.0)(request)
    }
}

/// Resolves a module locator and activates the module it names.
#[async_trait]
pub trait ModuleLoader: Send + Sync {
    async fn load(&self, locator: &str) -> Result<Arc<dyn ComputeModule>, LoadError>;
}

pub type ModuleFactory = Arc<dyn Fn() -> Result<Arc<dyn ComputeModule>, LoadError> + Send + Sync>;

pub const RULE_PREFIX: &str = "rule:";
pub const TORUS_SUFFIX: &str = "@torus";

/// Loader for the modules shipped with this crate.
///
/// Locators:
/// - `life` - B3/S23 on a bounded grid
/// - `life-torus` - B3/S23 with wraparound edges
/// - `rule:B36/S23` / `rule:B36/S23@torus` - any Life-like rule
/// - names added with [`BuiltinLoader::register`]
#[derive(Clone)]
pub struct BuiltinLoader {
    factories: HashMap<String, ModuleFactory>,
}

impl BuiltinLoader {
    pub fn new() -> Self {
        let mut loader = Self { factories: HashMap::new() };
        loader.register("life", || Ok(Arc::new(LifeModule::default()) as Arc<dyn ComputeModule>));
        loader.register("life-torus", || {
            let module = LifeModule::new(Rule::conway(), Topology::Toroidal);
            Ok(Arc::new(module) as Arc<dyn ComputeModule>)
        });
        loader
    }

    /// Adds or replaces a named module.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> Result<Arc<dyn ComputeModule>, LoadError> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
        self
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    fn load_rule(notation: &str) -> Result<Arc<dyn ComputeModule>, LoadError> {
        let (rule, topology) = match notation.strip_suffix(TORUS_SUFFIX) {
            Some(rule) => (rule, Topology::Toroidal),
            None => (notation, Topology::Bounded),
        };
        let rule: Rule = rule.parse()?;
        Ok(Arc::new(LifeModule::new(rule, topology)))
    }
}

impl Default for BuiltinLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BuiltinLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuiltinLoader").field("modules", &self.names()).finish()
    }
}

#[async_trait]
impl ModuleLoader for BuiltinLoader {
    async fn load(&self, locator: &str) -> Result<Arc<dyn ComputeModule>, LoadError> {
        let locator = locator.trim();
        debug!(locator, "resolving compute module");

        if let Some(factory) = self.factories.get(locator) {
            return factory();
        }
        match locator.strip_prefix(RULE_PREFIX) {
            Some(notation) => Self::load_rule(notation),
            None => Err(LoadError::UnknownModule(locator.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{StepRequest, decode_response, encode_request};
    use crate::grid::GridSize;

    fn blinker_request() -> String {
        encode_request(&StepRequest {
            alive_cells: [(1, 2), (2, 2), (3, 2)].into_iter().collect(),
            grid_size: GridSize::new(5, 5).unwrap(),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn loads_builtin_modules() {
        let loader = BuiltinLoader::new();
        for locator in ["life", " life-torus ", "rule:B36/S23", "rule:b3/s23@torus"] {
            let module = loader.load(locator).await.unwrap();
            let output = module.compute_step(&blinker_request()).unwrap();
            let response = decode_response(&output).unwrap();
            assert_eq!(response.alive_cells.len(), 3, "locator {locator}");
        }
    }

    #[tokio::test]
    async fn unknown_locator_fails() {
        let err = BuiltinLoader::new().load("/pkg/missing.wasm").await.err().unwrap();
        assert_eq!(err, LoadError::UnknownModule("/pkg/missing.wasm".into()));
    }

    #[tokio::test]
    async fn bad_rule_fails() {
        let err = BuiltinLoader::new().load("rule:B9/S23").await.err().unwrap();
        assert!(matches!(err, LoadError::InvalidRule { .. }));
    }

    #[tokio::test]
    async fn registered_module_overrides() {
        let mut loader = BuiltinLoader::new();
        loader.register("echo", || {
            let echo = FnModule(|req: &str| Ok::<_, ComputeError>(req.to_string()));
            Ok(Arc::new(echo) as Arc<dyn ComputeModule>)
        });
        assert!(loader.names().contains(&"echo"));
        let module = loader.load("echo").await.unwrap();
        assert_eq!(module.compute_step("x").unwrap(), "x");
    }
}
