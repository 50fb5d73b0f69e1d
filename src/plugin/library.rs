//! Shared-library plugins.
//!
//! A plugin library exports two entry points: `plugin_create`, returning a
//! heap-allocated [`Plugin`] descriptor, and `plugin_destroy`, releasing a
//! descriptor produced by `plugin_create`. [`export_plugin!`] generates both.
//! The library and the host must be built against the same version of this
//! crate with the same compiler.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, error};

use super::registry::Plugin;
use crate::error::RegistryError;

pub type PluginCreate = unsafe extern "C" fn() -> *mut Plugin;
pub type PluginDestroy = unsafe extern "C" fn(*mut Plugin);

const CREATE_SYMBOL: &[u8] = b"plugin_create\0";
const DESTROY_SYMBOL: &[u8] = b"plugin_destroy\0";

/// A mapped plugin library. Unmapped when the last reference is dropped.
pub struct PluginLibrary {
    path: PathBuf,
    _library: libloading::Library,
}

impl PluginLibrary {
    /// Maps the library at `path` and reads its plugin descriptor.
    pub fn open(path: &Path) -> Result<(Plugin, PluginLibrary), RegistryError> {
        let library = unsafe { libloading::Library::new(path) }.map_err(|e| {
            error!("Failed to open plugin library {}: {}", path.display(), e);
            RegistryError::Library(format!("{}: {}", path.display(), e))
        })?;

        let plugin = unsafe {
            let create: libloading::Symbol<PluginCreate> =
                library.get(CREATE_SYMBOL).map_err(|e| missing_symbol(path, e))?;
            let destroy: libloading::Symbol<PluginDestroy> =
                library.get(DESTROY_SYMBOL).map_err(|e| missing_symbol(path, e))?;

            let raw = create();
            if raw.is_null() {
                error!("plugin_create in {} returned null", path.display());
                return Err(RegistryError::Library(format!(
                    "{}: plugin_create returned null",
                    path.display()
                )));
            }
            // The descriptor is released by the library that allocated it.
            let plugin = (*raw).clone();
            destroy(raw);
            plugin
        };

        debug!(
            "Opened plugin library {} providing '{}'",
            path.display(),
            plugin.name()
        );
        Ok((
            plugin,
            PluginLibrary {
                path: path.to_path_buf(),
                _library: library,
            },
        ))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn missing_symbol(path: &Path, e: libloading::Error) -> RegistryError {
    error!("Plugin library {} lacks an entry point: {}", path.display(), e);
    RegistryError::Library(format!("{}: {}", path.display(), e))
}

impl fmt::Debug for PluginLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginLibrary")
            .field("path", &self.path)
            .finish()
    }
}

/// Exports `plugin_create` and `plugin_destroy` for a function building a
/// [`Plugin`].
///
/// # Example
///
/// ```ignore
/// fn plugin() -> Plugin {
///     Plugin::builder("my-resampler", env!("CARGO_PKG_VERSION"), "Custom resampler")
///         .provides::<ResamplerInterface, _>("MyResampler", || Box::new(MyResampler))
///         .build()
/// }
///
/// wavexplorer::export_plugin!(plugin);
/// ```
#[macro_export]
macro_rules! export_plugin {
    ($constructor:path) => {
        #[unsafe(no_mangle)]
        #[allow(improper_ctypes_definitions)]
        pub extern "C" fn plugin_create() -> *mut $crate::plugin::Plugin {
            ::std::boxed::Box::into_raw(::std::boxed::Box::new($constructor()))
        }

        /// # Safety
        /// `plugin` must come from `plugin_create` of this library.
        #[unsafe(no_mangle)]
        #[allow(improper_ctypes_definitions)]
        pub unsafe extern "C" fn plugin_destroy(plugin: *mut $crate::plugin::Plugin) {
            if !plugin.is_null() {
                drop(unsafe { ::std::boxed::Box::from_raw(plugin) });
            }
        }
    };
}
