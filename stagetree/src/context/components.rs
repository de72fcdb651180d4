//! Registry of shared ("static") component instances.
//!
//! Components are created by the caller (typically one per configured
//! instance name) and looked up by stage handlers during traversal.
//! Dropping a registry entry releases the component, running its `Drop`
//! implementation; for a result table component that flushes any
//! unsaved cells.

use parking_lot::{Mutex, RwLock};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

type SharedComponent = Arc<dyn Any + Send + Sync>;

/// A named registry of shared components.
#[derive(Default)]
pub struct ComponentRegistry {
    components: RwLock<HashMap<String, SharedComponent>>,
}

impl ComponentRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a component under `name`.
    ///
    /// Returns true if an existing component with the same name was replaced.
    pub fn insert<T: Send + 'static>(&self, name: impl Into<String>, component: T) -> bool {
        let name = name.into();
        let shared: SharedComponent = Arc::new(Mutex::new(component));
        let replaced = self.components.write().insert(name.clone(), shared);
        debug!(component = %name, replaced = replaced.is_some(), "Registered static component");
        replaced.is_some()
    }

    /// Looks up a component by name and type.
    ///
    /// Returns `None` if no component is registered under `name` or if it
    /// has a different type.
    #[must_use]
    pub fn get<T: Send + 'static>(&self, name: &str) -> Option<Arc<Mutex<T>>> {
        let shared = self.components.read().get(name).cloned()?;
        shared.downcast::<Mutex<T>>().ok()
    }

    /// Checks if a component is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.components.read().contains_key(name)
    }

    /// Removes a component, returning true if it existed.
    pub fn remove(&self, name: &str) -> bool {
        let removed = self.components.write().remove(name);
        removed.is_some()
    }

    /// Returns the registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.components.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Returns the number of registered components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.components.read().len()
    }

    /// Returns true if no components are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.read().is_empty()
    }

    /// Drops every registered component and leaves the registry empty.
    ///
    /// Components are dropped after the registry lock is released, so a
    /// component's `Drop` may safely touch the registry.
    pub fn clear(&self) {
        let drained = std::mem::take(&mut *self.components.write());
        debug!(count = drained.len(), "Releasing static components");
        drop(drained);
    }
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("names", &self.names())
            .finish()
    }
}
