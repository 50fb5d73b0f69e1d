//! Plugin registry and capability interfaces.
//!
//! # Lifecycle
//! The process-wide registry is populated once by [`initialize`] before any
//! concurrent use, looked up read-only through [`registry`], and torn down by
//! [`shutdown`]. Code that needs an isolated registry (tests, tools) can build
//! its own [`Registry`] and pass it explicitly.
//!
//! # Interfaces
//! - [`ResamplerInterface`] - bulk sample rate conversion (`"IResampler"`)

pub mod builtin;
pub mod interface;
pub mod library;
pub mod registry;

use std::sync::{Arc, PoisonError, RwLock};

use tracing::{error, info, warn};

pub use builtin::{RubatoResampler, rubato_plugin};
pub use interface::{Interface, Quality, Resampler, ResamplerInterface};
pub use library::PluginLibrary;
pub use registry::{Factory, Instance, Plugin, PluginBuilder, Registry, TagEntry};

use crate::config::EngineConfig;
use crate::error::RegistryError;

static REGISTRY: RwLock<Option<Arc<Registry>>> = RwLock::new(None);

/// Builds the process-wide registry from the built-in plugins and the
/// libraries listed in `config`. Libraries that fail to load are skipped.
///
/// Calling it again returns the existing registry.
pub fn initialize(config: &EngineConfig) -> Result<Arc<Registry>, RegistryError> {
    let mut slot = REGISTRY.write().unwrap_or_else(PoisonError::into_inner);
    if let Some(registry) = slot.as_ref() {
        warn!("Plugin registry already initialized");
        return Ok(registry.clone());
    }

    let registry = Arc::new(Registry::new());
    registry.load(rubato_plugin())?;

    for path in &config.plugin_paths {
        match registry.load_library(path) {
            Ok(name) => info!("Loaded plugin '{}' from {}", name, path.display()),
            Err(e) => error!("Skipping plugin {}: {}", path.display(), e),
        }
    }

    info!("Plugin registry ready: {:?}", registry.tags());
    *slot = Some(registry.clone());
    Ok(registry)
}

/// The process-wide registry.
pub fn registry() -> Result<Arc<Registry>, RegistryError> {
    let slot = REGISTRY.read().unwrap_or_else(PoisonError::into_inner);
    slot.clone().ok_or_else(|| {
        error!("Plugin registry used before initialization");
        RegistryError::NotInitialized
    })
}

/// Unloads every plugin and clears the process-wide registry.
///
/// Fails, leaving the registry in place, while plugin objects are alive.
pub fn shutdown() -> Result<(), RegistryError> {
    let mut slot = REGISTRY.write().unwrap_or_else(PoisonError::into_inner);
    let Some(registry) = slot.as_ref() else {
        return Ok(());
    };
    registry.shutdown()?;
    *slot = None;
    info!("Plugin registry shut down");
    Ok(())
}
