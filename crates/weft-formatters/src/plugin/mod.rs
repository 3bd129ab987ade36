//! Plugin component loading and invocation.
//!
//! A plugin component exports one operation,
//! `format(source, options) -> result<bytes, message>`. This module defines
//! that boundary as the [`PluginInstance`] trait and leaves instantiation to a
//! [`PluginLoader`]; [`crate::wasm::ComponentLoader`] is the wasmtime one.
//!
//! [`PluginPool`] owns the instances of one run. Each plugin reference is
//! loaded at most once, including failed loads, which are remembered and
//! reported again for every region that needs the plugin. Calls into an
//! instance are serialised per reference unless the instance declares that
//! its host isolates concurrent calls.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use tracing::debug;

use crate::backend::PluginReference;
use crate::error::FormatError;
use crate::options::FormatOptions;

/// Tracing target for plugin operations.
const PLUGIN_TARGET: &str = "weft_formatters::plugin";

/// A loaded plugin component.
pub trait PluginInstance: Send + Sync {
    /// Formats `source`, returning the formatted bytes or the plugin's error
    /// message.
    ///
    /// # Errors
    ///
    /// Returns the human-readable message carried by the plugin's error
    /// variant.
    fn format(&self, source: &[u8], options: &FormatOptions) -> Result<Vec<u8>, String>;

    /// Returns whether concurrent calls into this instance are isolated by
    /// the host, allowing them to run without serialisation.
    fn call_isolated(&self) -> bool {
        false
    }
}

/// Instantiates plugin components.
pub trait PluginLoader: Send + Sync {
    /// Loads the component behind `reference`.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::PluginLoad`] when the component cannot be
    /// found or instantiated.
    fn load(&self, reference: &PluginReference) -> Result<Arc<dyn PluginInstance>, FormatError>;
}

/// Loader that refuses every plugin, for runs without a component runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailablePluginLoader;

impl PluginLoader for UnavailablePluginLoader {
    fn load(&self, reference: &PluginReference) -> Result<Arc<dyn PluginInstance>, FormatError> {
        Err(FormatError::PluginLoad {
            plugin_id: reference.to_string(),
            message: String::from("no plugin component runtime is available"),
        })
    }
}

type LoadOutcome = Result<Arc<dyn PluginInstance>, String>;

#[derive(Default)]
struct PluginSlot {
    instance: OnceLock<LoadOutcome>,
    calls: Mutex<()>,
}

/// Run-scoped cache of plugin instances.
pub struct PluginPool {
    loader: Arc<dyn PluginLoader>,
    slots: Mutex<HashMap<PluginReference, Arc<PluginSlot>>>,
}

impl std::fmt::Debug for PluginPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("PluginPool")
            .field("plugins", &slots.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl PluginPool {
    /// Creates an empty pool backed by `loader`.
    #[must_use]
    pub fn new(loader: Arc<dyn PluginLoader>) -> Self {
        Self {
            loader,
            slots: Mutex::default(),
        }
    }

    /// Formats `source` with the plugin behind `reference`, loading it on
    /// first use.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::PluginLoad`] when the plugin could not be
    /// loaded (now or on an earlier call) and [`FormatError::PluginFailed`]
    /// when the plugin returns its error variant.
    pub fn format(
        &self,
        reference: &PluginReference,
        source: &[u8],
        options: &FormatOptions,
    ) -> Result<Vec<u8>, FormatError> {
        let slot = self.slot(reference);
        let loaded = slot.instance.get_or_init(|| {
            debug!(target: PLUGIN_TARGET, plugin = %reference, "loading plugin");
            self.loader.load(reference).map_err(|err| match err {
                FormatError::PluginLoad { message, .. } => message,
                other => other.to_string(),
            })
        });
        let instance = loaded.as_ref().map_err(|message| FormatError::PluginLoad {
            plugin_id: reference.to_string(),
            message: message.clone(),
        })?;

        let result = if instance.call_isolated() {
            instance.format(source, options)
        } else {
            let _serialised = slot.calls.lock().unwrap_or_else(PoisonError::into_inner);
            instance.format(source, options)
        };
        result.map_err(|message| FormatError::PluginFailed {
            plugin_id: reference.to_string(),
            message,
        })
    }

    fn slot(&self, reference: &PluginReference) -> Arc<PluginSlot> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(reference.clone()).or_default())
    }
}
