//! Model type registry.
//!
//! Maps a [`ModelTypeId`] to the [`ModelFactory`] that builds it. A type may
//! be registered once; a second registration is refused rather than
//! overwriting the first.

use crate::inference::{ModelFactory, ModelTypeId};
use crate::manager::error::ManagerError;
use parking_lot::RwLock;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Thread-safe catalog of registered model types.
pub struct ModelRegistry {
    factories: RwLock<HashMap<ModelTypeId, Arc<dyn ModelFactory>>>,
}

impl ModelRegistry {
    /// Creates a new empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            factories: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a factory under the identifier it reports.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::DuplicateType`] if the identifier is taken; the
    /// existing registration is left in place.
    pub fn register(
        &self,
        factory: impl ModelFactory + 'static,
    ) -> Result<ModelTypeId, ManagerError> {
        self.register_arc(Arc::new(factory))
    }

    /// Registers a factory wrapped in Arc
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::DuplicateType`] if the identifier is taken.
    pub fn register_arc(
        &self,
        factory: Arc<dyn ModelFactory>,
    ) -> Result<ModelTypeId, ManagerError> {
        let model_type = factory.model_type();
        let mut factories = self.factories.write();
        match factories.entry(model_type.clone()) {
            Entry::Occupied(_) => Err(ManagerError::DuplicateType(model_type)),
            Entry::Vacant(slot) => {
                debug!(model_type = %model_type, "Registering model type");
                slot.insert(factory);
                Ok(model_type)
            }
        }
    }

    /// Removes a model type. Instances already built from it are unaffected.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::UnknownType`] if the type is not registered.
    pub fn unregister(&self, model_type: &ModelTypeId) -> Result<(), ManagerError> {
        debug!(model_type = %model_type, "Unregistering model type");
        self.factories
            .write()
            .remove(model_type)
            .map(|_| ())
            .ok_or_else(|| ManagerError::UnknownType(model_type.clone()))
    }

    /// Looks up the factory for a model type.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::UnknownType`] if the type is not registered.
    pub fn resolve(&self, model_type: &ModelTypeId) -> Result<Arc<dyn ModelFactory>, ManagerError> {
        self.factories
            .read()
            .get(model_type)
            .cloned()
            .ok_or_else(|| ManagerError::UnknownType(model_type.clone()))
    }

    /// Returns true if the type is registered
    pub fn contains(&self, model_type: &ModelTypeId) -> bool {
        self.factories.read().contains_key(model_type)
    }

    /// Lists all registered type identifiers, sorted
    pub fn list_types(&self) -> Vec<ModelTypeId> {
        let mut types: Vec<_> = self.factories.read().keys().cloned().collect();
        types.sort();
        types
    }

    /// Returns the number of registered types
    pub fn len(&self) -> usize {
        self.factories.read().len()
    }

    /// Returns true if no types are registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}
