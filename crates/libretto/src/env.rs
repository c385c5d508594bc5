//! The host environment: module loading and path equivalence.
//!
//! Module paths are opaque strings to the VM; only the environment knows
//! whether two of them name the same script and how to turn one into a
//! compiled [`Module`]. Hosts with real storage implement [`Environment`]
//! themselves (resolving relative references against `current`, caching,
//! whatever they need); [`MemoryEnvironment`] covers tests and hosts that
//! preload everything.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::instruction::Module;

/// Host-provided module loader and path-equivalence oracle.
///
/// Both operations may fail; failures propagate out of the `next_output`
/// call that triggered them.
pub trait Environment {
    /// Semantic equality of module identifiers. Implementations may
    /// normalise paths or resolve aliases.
    fn module_path_equals(&mut self, a: &str, b: &str) -> Result<bool>;

    /// Load (compiling if necessary) the module named `target`. `current`
    /// is the path of the module issuing the load, for resolving relative
    /// references.
    fn load_module(&mut self, target: &str, current: &str) -> Result<Arc<Module>>;
}

/// An environment over a map of preloaded modules, with literal string
/// equality as path equivalence.
#[derive(Default)]
pub struct MemoryEnvironment {
    modules: HashMap<String, Arc<Module>>,
}

impl MemoryEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a compiled module under its own path.
    pub fn insert(&mut self, module: Module) {
        self.modules.insert(module.path.clone(), Arc::new(module));
    }

    /// Compile script text and register it under `path`.
    pub fn insert_source(&mut self, path: impl Into<String>, source: &str) -> Result<()> {
        self.insert(Module::compile(path, source)?);
        Ok(())
    }
}

impl Environment for MemoryEnvironment {
    fn module_path_equals(&mut self, a: &str, b: &str) -> Result<bool> {
        Ok(a == b)
    }

    fn load_module(&mut self, target: &str, _current: &str) -> Result<Arc<Module>> {
        self.modules
            .get(target)
            .cloned()
            .ok_or_else(|| Error::Environment(format!("unknown module '{target}'")))
    }
}
