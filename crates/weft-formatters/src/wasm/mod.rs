//! Plugin components run on the wasmtime component runtime.
//!
//! [`ComponentLoader`] compiles a component from the path named by a
//! [`PluginReference`] and binds its `format` export:
//!
//! ```wit
//! record options {
//!     width: u32,
//!     variables: list<tuple<string, string>>,
//! }
//!
//! format: func(source: list<u8>, options: options) -> result<list<u8>, string>;
//! ```
//!
//! References are either plain paths or `file://` URLs. Text-format
//! components (`.wat`) are accepted as well as binaries.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;
use wasmtime::component::{Component, ComponentType, Linker, Lower, TypedFunc};
use wasmtime::{Engine, Store};

use crate::backend::PluginReference;
use crate::error::FormatError;
use crate::options::FormatOptions;
use crate::plugin::{PluginInstance, PluginLoader};

const WASM_TARGET: &str = "weft_formatters::wasm";

/// Name of the operation every plugin component exports.
pub const FORMAT_EXPORT: &str = "format";

const FILE_SCHEME: &str = "file://";

/// The `options` record handed to a plugin.
#[derive(Debug, ComponentType, Lower)]
#[component(record)]
struct WasmOptions {
    width: u32,
    variables: Vec<(String, String)>,
}

impl From<&FormatOptions> for WasmOptions {
    fn from(options: &FormatOptions) -> Self {
        Self {
            width: u32::try_from(options.width).unwrap_or(u32::MAX),
            variables: options
                .variables
                .iter()
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
        }
    }
}

type FormatFunc = TypedFunc<(Vec<u8>, WasmOptions), (Result<Vec<u8>, String>,)>;

/// Loads plugin components with a shared wasmtime engine.
#[derive(Clone, Default)]
pub struct ComponentLoader {
    engine: Engine,
}

impl std::fmt::Debug for ComponentLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentLoader").finish_non_exhaustive()
    }
}

impl ComponentLoader {
    /// Creates a loader with the default engine configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn instantiate(&self, path: &Path) -> wasmtime::Result<ComponentInstance> {
        let component = Component::from_file(&self.engine, path)?;
        let linker = Linker::<()>::new(&self.engine);
        let mut store = Store::new(&self.engine, ());
        let instance = linker.instantiate(&mut store, &component)?;
        let format = instance.get_typed_func(&mut store, FORMAT_EXPORT)?;
        Ok(ComponentInstance {
            store: Mutex::new(store),
            format,
        })
    }
}

impl PluginLoader for ComponentLoader {
    fn load(&self, reference: &PluginReference) -> Result<Arc<dyn PluginInstance>, FormatError> {
        let path = component_path(reference)?;
        debug!(
            target: WASM_TARGET,
            plugin = %reference,
            path = %path.display(),
            "instantiating plugin component"
        );
        let instance = self
            .instantiate(&path)
            .map_err(|err| FormatError::PluginLoad {
                plugin_id: reference.to_string(),
                message: format!("{err:#}"),
            })?;
        Ok(Arc::new(instance))
    }
}

/// Resolves a plugin reference to the component file it names.
fn component_path(reference: &PluginReference) -> Result<PathBuf, FormatError> {
    let raw = reference.as_str();
    if let Some(path) = raw.strip_prefix(FILE_SCHEME) {
        return Ok(PathBuf::from(path));
    }
    if raw.contains("://") {
        return Err(FormatError::PluginLoad {
            plugin_id: raw.to_owned(),
            message: String::from("unsupported plugin reference; expected a path or file:// URL"),
        });
    }
    Ok(PathBuf::from(raw))
}

/// One instantiated component with its own store.
struct ComponentInstance {
    store: Mutex<Store<()>>,
    format: FormatFunc,
}

impl PluginInstance for ComponentInstance {
    fn format(&self, source: &[u8], options: &FormatOptions) -> Result<Vec<u8>, String> {
        let mut store = self.store.lock().unwrap_or_else(PoisonError::into_inner);
        let params = (source.to_vec(), WasmOptions::from(options));
        let (result,) = self
            .format
            .call(&mut *store, params)
            .map_err(|err| format!("plugin trapped: {err:#}"))?;
        self.format
            .post_return(&mut *store)
            .map_err(|err| format!("plugin trapped: {err:#}"))?;
        result
    }
}

#[cfg(test)]
mod tests;
