//! Plugin registry mapping interface tags to constructor/destructor pairs.
//!
//! A [`Plugin`] describes a named unit that provides one or more interfaces.
//! Loading it into a [`Registry`] makes each of its tags resolvable through
//! [`Registry::factory_for`]. The returned [`Factory`] carries the constructor
//! together with the destructor registered alongside it, and every object it
//! builds is wrapped in an [`Instance`] that releases through that destructor.
//!
//! # Usage
//!
//! ```ignore
//! let plugin = Plugin::builder("rubato", "1.0.0", "Rubato sample rate converters")
//!     .provides::<ResamplerInterface, _>("RubatoResampler", || Box::new(RubatoResampler))
//!     .build();
//!
//! let registry = Registry::new();
//! registry.load(plugin)?;
//!
//! let factory = registry.factory_for::<ResamplerInterface>()?;
//! let mut resampler = factory.create(); // released on drop
//! ```
//!
//! # Thread Safety
//! Tags and plugin records live in `DashMap`s, so lookups after startup are
//! lock-free reads. Registration is expected to happen before concurrent use.

use std::any::Any;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;
use tracing::{debug, error, trace, warn};

use super::interface::Interface;
use super::library::PluginLibrary;
use crate::error::RegistryError;

type Constructor<O> = Arc<dyn Fn() -> Box<O> + Send + Sync>;
type Destructor<O> = Arc<dyn Fn(Box<O>) + Send + Sync>;
type Erased = Arc<dyn Any + Send + Sync>;

/// Constructor and destructor for one interface, resolved together.
///
/// The pair cannot be split: objects are only obtainable through
/// [`Factory::create`], and they are only released through the destructor
/// that was registered with the constructor that built them.
pub struct Factory<O: ?Sized> {
    tag: &'static str,
    provider: String,
    plugin: String,
    create: Constructor<O>,
    destroy: Destructor<O>,
    live: Arc<AtomicUsize>,
    library: Option<Arc<PluginLibrary>>,
}

impl<O: ?Sized> Clone for Factory<O> {
    fn clone(&self) -> Self {
        Self {
            tag: self.tag,
            provider: self.provider.clone(),
            plugin: self.plugin.clone(),
            create: self.create.clone(),
            destroy: self.destroy.clone(),
            live: self.live.clone(),
            library: self.library.clone(),
        }
    }
}

impl<O: ?Sized> Factory<O> {
    pub fn tag(&self) -> &'static str {
        self.tag
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn plugin(&self) -> &str {
        &self.plugin
    }

    /// Builds a new object, released through the paired destructor when the
    /// returned [`Instance`] is dropped.
    pub fn create(&self) -> Instance<O> {
        trace!("Allocating {} [{}]", self.provider, self.tag);
        let object = (self.create)();
        self.live.fetch_add(1, Ordering::AcqRel);
        Instance {
            object: Some(object),
            provider: self.provider.clone(),
            tag: self.tag,
            destroy: self.destroy.clone(),
            live: self.live.clone(),
            _library: self.library.clone(),
        }
    }
}

impl<O: ?Sized> fmt::Debug for Factory<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Factory")
            .field("tag", &self.tag)
            .field("provider", &self.provider)
            .field("plugin", &self.plugin)
            .finish()
    }
}

/// An object obtained from a [`Factory`], owned until dropped.
pub struct Instance<O: ?Sized> {
    object: Option<Box<O>>,
    provider: String,
    tag: &'static str,
    destroy: Destructor<O>,
    live: Arc<AtomicUsize>,
    // Keeps the providing library mapped while its code may still run.
    _library: Option<Arc<PluginLibrary>>,
}

impl<O: ?Sized> Deref for Instance<O> {
    type Target = O;

    fn deref(&self) -> &O {
        match &self.object {
            Some(object) => object,
            None => unreachable!("instance used after release"),
        }
    }
}

impl<O: ?Sized> DerefMut for Instance<O> {
    fn deref_mut(&mut self) -> &mut O {
        match &mut self.object {
            Some(object) => object,
            None => unreachable!("instance used after release"),
        }
    }
}

impl<O: ?Sized> Drop for Instance<O> {
    fn drop(&mut self) {
        if let Some(object) = self.object.take() {
            trace!("Freeing {} [{}]", self.provider, self.tag);
            (self.destroy)(object);
            self.live.fetch_sub(1, Ordering::AcqRel);
        }
    }
}

/// Bookkeeping shared by every factory of one loaded plugin.
struct Owner {
    name: String,
    live: Arc<AtomicUsize>,
    library: Option<Arc<PluginLibrary>>,
}

/// Attaches an unbound factory to the plugin that is loading it.
fn rebind<I: Interface>(factory: &(dyn Any + Send + Sync), owner: &Owner) -> Option<Erased> {
    let factory = factory.downcast_ref::<Factory<I::Object>>()?;
    Some(Arc::new(Factory {
        plugin: owner.name.clone(),
        live: owner.live.clone(),
        library: owner.library.clone(),
        ..factory.clone()
    }))
}

/// One interface implementation contributed by a plugin.
#[derive(Clone)]
pub struct TagEntry {
    tag: &'static str,
    provider: String,
    factory: Erased,
    rebind: fn(&(dyn Any + Send + Sync), &Owner) -> Option<Erased>,
}

impl TagEntry {
    fn new<I, C, D>(provider: &str, create: C, destroy: D) -> Self
    where
        I: Interface,
        C: Fn() -> Box<I::Object> + Send + Sync + 'static,
        D: Fn(Box<I::Object>) + Send + Sync + 'static,
    {
        let factory: Factory<I::Object> = Factory {
            tag: I::TAG,
            provider: provider.to_string(),
            plugin: String::new(),
            create: Arc::new(create),
            destroy: Arc::new(destroy),
            live: Arc::new(AtomicUsize::new(0)),
            library: None,
        };
        Self {
            tag: I::TAG,
            provider: provider.to_string(),
            factory: Arc::new(factory),
            rebind: rebind::<I>,
        }
    }

    pub fn tag(&self) -> &'static str {
        self.tag
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }
}

impl fmt::Debug for TagEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TagEntry")
            .field("tag", &self.tag)
            .field("provider", &self.provider)
            .finish()
    }
}

/// A named, versioned unit providing interface implementations.
#[derive(Debug, Clone)]
pub struct Plugin {
    name: String,
    version: String,
    description: String,
    entries: Vec<TagEntry>,
}

impl Plugin {
    pub fn builder(
        name: impl Into<String>,
        version: impl Into<String>,
        description: impl Into<String>,
    ) -> PluginBuilder {
        PluginBuilder {
            plugin: Plugin {
                name: name.into(),
                version: version.into(),
                description: description.into(),
                entries: Vec::new(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn entries(&self) -> &[TagEntry] {
        &self.entries
    }
}

pub struct PluginBuilder {
    plugin: Plugin,
}

impl PluginBuilder {
    /// Registers an interface with an explicit destructor.
    pub fn add_tag<I, C, D>(mut self, provider: &str, create: C, destroy: D) -> Self
    where
        I: Interface,
        C: Fn() -> Box<I::Object> + Send + Sync + 'static,
        D: Fn(Box<I::Object>) + Send + Sync + 'static,
    {
        self.plugin
            .entries
            .push(TagEntry::new::<I, C, D>(provider, create, destroy));
        self
    }

    /// Registers an interface whose objects are released by dropping them.
    pub fn provides<I, C>(self, provider: &str, create: C) -> Self
    where
        I: Interface,
        C: Fn() -> Box<I::Object> + Send + Sync + 'static,
    {
        self.add_tag::<I, C, _>(provider, create, drop)
    }

    pub fn build(self) -> Plugin {
        self.plugin
    }
}

struct PluginRecord {
    version: String,
    live: Arc<AtomicUsize>,
    library: Option<Arc<PluginLibrary>>,
}

struct RegisteredTag {
    plugin: String,
    provider: String,
    factory: Erased,
}

/// Registry of loaded plugins and the interfaces they provide.
#[derive(Default)]
pub struct Registry {
    tags: DashMap<String, RegisteredTag>,
    plugins: DashMap<String, PluginRecord>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("tags", &self.tags())
            .field("plugins", &self.plugins())
            .finish()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every interface of `plugin`. A tag already provided by another
    /// plugin is taken over by this one. Reloading a plugin of the same name
    /// unloads the previous one first.
    pub fn load(&self, plugin: Plugin) -> Result<(), RegistryError> {
        self.load_with_library(plugin, None)
    }

    /// Opens a shared library exporting `plugin_create`/`plugin_destroy` and
    /// loads the plugin it describes. Returns the plugin name.
    pub fn load_library(&self, path: impl AsRef<Path>) -> Result<String, RegistryError> {
        let (plugin, library) = PluginLibrary::open(path.as_ref())?;
        let name = plugin.name().to_string();
        self.load_with_library(plugin, Some(Arc::new(library)))?;
        Ok(name)
    }

    fn load_with_library(
        &self,
        plugin: Plugin,
        library: Option<Arc<PluginLibrary>>,
    ) -> Result<(), RegistryError> {
        if self.plugins.contains_key(&plugin.name) {
            warn!("Plugin '{}' is already loaded, replacing it", plugin.name);
            self.unload(&plugin.name)?;
        }

        let owner = Owner {
            name: plugin.name.clone(),
            live: Arc::new(AtomicUsize::new(0)),
            library,
        };

        for entry in &plugin.entries {
            self.insert_tag(entry, &owner)?;
        }

        debug!(
            "Loaded plugin '{}' {} ({}), {} interfaces",
            plugin.name,
            plugin.version,
            plugin.description,
            plugin.entries.len()
        );
        self.plugins.insert(
            plugin.name,
            PluginRecord {
                version: plugin.version,
                live: owner.live,
                library: owner.library,
            },
        );
        Ok(())
    }

    /// Registers a single interface under `plugin`, creating the plugin
    /// record when it does not exist yet.
    pub fn add_tag<I, C, D>(
        &self,
        plugin: &str,
        provider: &str,
        create: C,
        destroy: D,
    ) -> Result<(), RegistryError>
    where
        I: Interface,
        C: Fn() -> Box<I::Object> + Send + Sync + 'static,
        D: Fn(Box<I::Object>) + Send + Sync + 'static,
    {
        let owner = {
            let record = self
                .plugins
                .entry(plugin.to_string())
                .or_insert_with(|| PluginRecord {
                    version: String::new(),
                    live: Arc::new(AtomicUsize::new(0)),
                    library: None,
                });
            Owner {
                name: plugin.to_string(),
                live: record.live.clone(),
                library: record.library.clone(),
            }
        };
        let entry = TagEntry::new::<I, C, D>(provider, create, destroy);
        self.insert_tag(&entry, &owner)
    }

    fn insert_tag(&self, entry: &TagEntry, owner: &Owner) -> Result<(), RegistryError> {
        let factory = (entry.rebind)(entry.factory.as_ref(), owner).ok_or_else(|| {
            error!("Interface '{}' has a malformed factory", entry.tag);
            RegistryError::InterfaceTypeMismatch(entry.tag.to_string())
        })?;

        let registered = RegisteredTag {
            plugin: owner.name.clone(),
            provider: entry.provider.clone(),
            factory,
        };
        if let Some(previous) = self.tags.insert(entry.tag.to_string(), registered) {
            warn!(
                "Interface '{}' from '{}' replaced by '{}' from '{}'",
                entry.tag, previous.provider, entry.provider, owner.name
            );
        }
        trace!(
            "Registered {} [{}] for '{}'",
            entry.provider, entry.tag, owner.name
        );
        Ok(())
    }

    /// Resolves the constructor/destructor pair registered for `I`.
    pub fn factory_for<I: Interface>(&self) -> Result<Factory<I::Object>, RegistryError> {
        let Some(registered) = self.tags.get(I::TAG) else {
            error!("No plugin provides interface '{}'", I::TAG);
            return Err(RegistryError::UnknownInterface(I::TAG.to_string()));
        };

        match registered.factory.downcast_ref::<Factory<I::Object>>() {
            Some(factory) => Ok(factory.clone()),
            None => {
                error!(
                    "Interface '{}' from '{}' does not match the requested object type",
                    I::TAG, registered.plugin
                );
                Err(RegistryError::InterfaceTypeMismatch(I::TAG.to_string()))
            }
        }
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags.contains_key(tag)
    }

    pub fn tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.tags.iter().map(|e| e.key().clone()).collect();
        tags.sort();
        tags
    }

    pub fn plugins(&self) -> Vec<String> {
        let mut names: Vec<String> = self.plugins.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn plugin_version(&self, name: &str) -> Option<String> {
        self.plugins.get(name).map(|record| record.version.clone())
    }

    /// Number of objects created from `plugin` that are still alive.
    pub fn live_instances(&self, plugin: &str) -> Option<usize> {
        self.plugins
            .get(plugin)
            .map(|record| record.live.load(Ordering::Acquire))
    }

    /// Removes a plugin and the interfaces it still provides.
    ///
    /// Fails while objects created from it are alive.
    pub fn unload(&self, name: &str) -> Result<(), RegistryError> {
        let live = self.live_instances(name).ok_or_else(|| {
            error!("Cannot unload unknown plugin '{}'", name);
            RegistryError::UnknownPlugin(name.to_string())
        })?;
        if live > 0 {
            error!("Cannot unload plugin '{}': {} live instances", name, live);
            return Err(RegistryError::PluginBusy {
                name: name.to_string(),
                live,
            });
        }

        // Factories go before the record so library code outlives them.
        self.tags.retain(|_, registered| registered.plugin != name);
        if let Some((_, record)) = self.plugins.remove(name) {
            match &record.library {
                Some(library) => debug!(
                    "Unloaded plugin '{}' from {}",
                    name,
                    library.path().display()
                ),
                None => debug!("Unloaded plugin '{}'", name),
            }
        }
        Ok(())
    }

    /// Unloads every plugin. Fails without unloading anything while any
    /// plugin still has live instances.
    pub fn shutdown(&self) -> Result<(), RegistryError> {
        let busy = self.plugins.iter().find_map(|entry| {
            let live = entry.live.load(Ordering::Acquire);
            (live > 0).then(|| (entry.key().clone(), live))
        });
        if let Some((name, live)) = busy {
            error!("Registry shutdown blocked by '{}' with {} live instances", name, live);
            return Err(RegistryError::PluginBusy { name, live });
        }

        self.tags.clear();
        self.plugins.clear();
        debug!("Plugin registry shut down");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    trait Greeter: Send {
        fn greet(&self) -> String;
    }

    struct GreeterInterface;

    impl Interface for GreeterInterface {
        const TAG: &'static str = "IGreeter";
        type Object = dyn Greeter;
    }

    struct Hello(&'static str);

    impl Greeter for Hello {
        fn greet(&self) -> String {
            format!("hello from {}", self.0)
        }
    }

    trait Counter: Send {}

    struct MismatchedInterface;

    impl Interface for MismatchedInterface {
        const TAG: &'static str = "IGreeter";
        type Object = dyn Counter;
    }

    fn greeter_plugin(name: &'static str) -> Plugin {
        Plugin::builder(name, "1.0.0", "Test greeter")
            .provides::<GreeterInterface, _>("Hello", move || {
                Box::new(Hello(name)) as Box<dyn Greeter>
            })
            .build()
    }

    #[test]
    fn test_unknown_interface() {
        let registry = Registry::new();
        let err = registry.factory_for::<GreeterInterface>().unwrap_err();
        assert_eq!(err, RegistryError::UnknownInterface("IGreeter".to_string()));
    }

    #[test]
    fn test_registered_interface_round_trip() {
        let registry = Registry::new();
        registry.load(greeter_plugin("first")).unwrap();

        let factory = registry.factory_for::<GreeterInterface>().unwrap();
        assert_eq!(factory.provider(), "Hello");
        assert_eq!(factory.plugin(), "first");

        let greeter = factory.create();
        assert_eq!(greeter.greet(), "hello from first");
        assert_eq!(registry.live_instances("first"), Some(1));
        drop(greeter);
        assert_eq!(registry.live_instances("first"), Some(0));
    }

    #[test]
    fn test_objects_are_released_by_paired_destructor() {
        static RELEASED: AtomicBool = AtomicBool::new(false);

        let registry = Registry::new();
        registry
            .add_tag::<GreeterInterface, _, _>(
                "manual",
                "Hello",
                || Box::new(Hello("manual")) as Box<dyn Greeter>,
                |object| {
                    RELEASED.store(true, Ordering::SeqCst);
                    drop(object);
                },
            )
            .unwrap();

        let factory = registry.factory_for::<GreeterInterface>().unwrap();
        {
            let _greeter = factory.create();
            assert!(!RELEASED.load(Ordering::SeqCst));
        }
        assert!(RELEASED.load(Ordering::SeqCst));
    }

    #[test]
    fn test_last_registration_wins() {
        let registry = Registry::new();
        registry.load(greeter_plugin("first")).unwrap();
        registry.load(greeter_plugin("second")).unwrap();

        let factory = registry.factory_for::<GreeterInterface>().unwrap();
        assert_eq!(factory.create().greet(), "hello from second");
        assert_eq!(registry.plugins(), vec!["first", "second"]);
    }

    #[test]
    fn test_object_type_mismatch() {
        let registry = Registry::new();
        registry.load(greeter_plugin("first")).unwrap();

        let err = registry.factory_for::<MismatchedInterface>().unwrap_err();
        assert_eq!(
            err,
            RegistryError::InterfaceTypeMismatch("IGreeter".to_string())
        );
    }

    #[test]
    fn test_unload_refuses_live_instances() {
        let registry = Registry::new();
        registry.load(greeter_plugin("first")).unwrap();

        let greeter = registry.factory_for::<GreeterInterface>().unwrap().create();
        assert_eq!(
            registry.unload("first"),
            Err(RegistryError::PluginBusy {
                name: "first".to_string(),
                live: 1
            })
        );
        assert!(registry.shutdown().is_err());

        drop(greeter);
        registry.unload("first").unwrap();
        assert!(!registry.contains("IGreeter"));
        assert_eq!(
            registry.unload("first"),
            Err(RegistryError::UnknownPlugin("first".to_string()))
        );
    }

    #[test]
    fn test_shutdown_clears_everything() {
        let registry = Registry::new();
        registry.load(greeter_plugin("first")).unwrap();
        registry.shutdown().unwrap();
        assert!(registry.tags().is_empty());
        assert!(registry.plugins().is_empty());
    }

    #[test]
    fn test_missing_library() {
        let registry = Registry::new();
        let err = registry
            .load_library("/nonexistent/libmissing_plugin.so")
            .unwrap_err();
        assert!(matches!(err, RegistryError::Library(_)));
    }
}
