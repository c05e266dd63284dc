use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use crate::backend::ChardevBackend;
use crate::chardev::{Chardev, ChardevClass, ChardevDriver, ChardevKind};
use crate::error::ChardevError;
use crate::null::NullChardev;
use crate::opts::ChardevOpts;
use crate::string::StringChardev;

/// A registered backend type
#[derive(Clone, Copy)]
pub struct ChardevType {
    kind: ChardevKind,
    parse: fn(&ChardevOpts) -> Result<ChardevBackend, ChardevError>,
    instantiate: fn() -> Box<dyn ChardevDriver>,
}

impl ChardevType {
    /// Describe the type implemented by `T`
    pub fn of<T: ChardevClass>() -> Self {
        Self {
            kind: T::KIND,
            parse: T::parse,
            instantiate: instantiate::<T>,
        }
    }

    pub fn kind(&self) -> ChardevKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }
}

fn instantiate<T: ChardevClass>() -> Box<dyn ChardevDriver> {
    Box::new(T::instantiate())
}

impl std::fmt::Debug for ChardevType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChardevType").field("kind", &self.kind).finish()
    }
}

/// Backend types known to the host, and the devices created from them.
///
/// Starts empty; call [`ChardevRegistry::register_builtin_types`] (or use
/// [`ChardevRegistry::with_builtin_types`]) during host initialization.
#[derive(Default)]
pub struct ChardevRegistry {
    types: RwLock<HashMap<&'static str, ChardevType>>,
    devices: RwLock<HashMap<String, Arc<Chardev>>>,
}

impl ChardevRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in backend types
    pub fn with_builtin_types() -> Result<Self, ChardevError> {
        let registry = Self::new();
        registry.register_builtin_types()?;
        Ok(registry)
    }

    pub fn register_builtin_types(&self) -> Result<(), ChardevError> {
        self.register_type(ChardevType::of::<StringChardev>())?;
        self.register_type(ChardevType::of::<NullChardev>())?;
        Ok(())
    }

    pub fn register_type(&self, ty: ChardevType) -> Result<(), ChardevError> {
        let mut types = write_lock(&self.types);
        if types.contains_key(ty.name()) {
            return Err(ChardevError::DuplicateType(ty.name().to_string()));
        }
        debug!("Registered chardev type {}", ty.name());
        types.insert(ty.name(), ty);
        Ok(())
    }

    /// Names of all registered types
    pub fn type_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = read_lock(&self.types).keys().copied().collect();
        names.sort_unstable();
        names
    }

    fn lookup(&self, backend: &str) -> Result<ChardevType, ChardevError> {
        read_lock(&self.types)
            .get(backend)
            .copied()
            .ok_or_else(|| ChardevError::UnknownBackend(backend.to_string()))
    }

    /// Run the backend's option parser without creating a device
    pub fn parse(&self, opts: &ChardevOpts) -> Result<ChardevBackend, ChardevError> {
        let ty = self.lookup(opts.backend())?;
        (ty.parse)(opts)
    }

    /// Parse, instantiate, open and store a device.
    ///
    /// Nothing is stored unless every step succeeds.
    pub fn create(&self, opts: &ChardevOpts) -> Result<Arc<Chardev>, ChardevError> {
        let id = opts.id().ok_or(ChardevError::MissingId)?.to_string();
        let ty = self.lookup(opts.backend())?;
        let backend = (ty.parse)(opts)?;

        let mut devices = write_lock(&self.devices);
        if devices.contains_key(&id) {
            return Err(ChardevError::DuplicateId(id));
        }

        let chardev = Chardev::new(id.clone(), (ty.instantiate)());
        chardev.open(&backend)?;

        let chardev = Arc::new(chardev);
        devices.insert(id, chardev.clone());
        Ok(chardev)
    }

    pub fn get(&self, id: &str) -> Result<Arc<Chardev>, ChardevError> {
        read_lock(&self.devices)
            .get(id)
            .cloned()
            .ok_or_else(|| ChardevError::NotFound(id.to_string()))
    }

    /// Remove a device from the registry
    pub fn remove(&self, id: &str) -> bool {
        write_lock(&self.devices).remove(id).is_some()
    }

    pub fn contains(&self, id: &str) -> bool {
        read_lock(&self.devices).contains_key(id)
    }

    /// List all device ids, sorted
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = read_lock(&self.devices).keys().cloned().collect();
        ids.sort();
        ids
    }
}

fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
