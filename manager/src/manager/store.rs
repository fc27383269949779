//! Named instance storage.

use crate::manager::error::ManagerError;
use crate::manager::instance::Instance;
use parking_lot::RwLock;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Thread-safe map from instance name to live instance.
///
/// Every mutation happens under one write lock, so an instance is either
/// fully present (model built, config bound) or absent. Removed instances
/// stay alive only as long as an in-flight call still holds them.
#[derive(Default)]
pub(crate) struct InstanceStore {
    instances: RwLock<BTreeMap<String, Arc<Instance>>>,
}

impl InstanceStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Adds an instance unless its name is taken.
    pub(crate) fn insert(&self, instance: Instance) -> Result<(), ManagerError> {
        let mut instances = self.instances.write();
        match instances.entry(instance.name().to_string()) {
            Entry::Occupied(slot) => Err(ManagerError::DuplicateInstance(slot.key().clone())),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(instance));
                Ok(())
            }
        }
    }

    /// Binds the instance to its name, returning whatever it displaced.
    pub(crate) fn replace(&self, instance: Instance) -> Option<Arc<Instance>> {
        self.instances
            .write()
            .insert(instance.name().to_string(), Arc::new(instance))
    }

    pub(crate) fn get(&self, name: &str) -> Result<Arc<Instance>, ManagerError> {
        self.instances
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| ManagerError::UnknownInstance(name.to_string()))
    }

    pub(crate) fn remove(&self, name: &str) -> Result<Arc<Instance>, ManagerError> {
        self.instances
            .write()
            .remove(name)
            .ok_or_else(|| ManagerError::UnknownInstance(name.to_string()))
    }

    /// Removes every instance, returning how many there were.
    pub(crate) fn clear(&self) -> usize {
        let drained = std::mem::take(&mut *self.instances.write());
        drained.len()
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.instances.read().contains_key(name)
    }

    /// Sorted snapshot of the live names.
    pub(crate) fn names(&self) -> Vec<String> {
        self.instances.read().keys().cloned().collect()
    }

    /// Snapshot of the live instances in name order.
    pub(crate) fn snapshot(&self) -> Vec<Arc<Instance>> {
        self.instances.read().values().cloned().collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.instances.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::{InferenceError, LanguageModel, Message, ModelConfig, ModelTypeId};
    use async_trait::async_trait;

    struct NullModel;

    #[async_trait]
    impl LanguageModel for NullModel {
        async fn generate(&self, _messages: &[Message]) -> Result<String, InferenceError> {
            Ok(String::new())
        }
    }

    fn instance(name: &str, model: &'static str) -> Instance {
        Instance::new(
            name.to_string(),
            ModelTypeId::from_static(model),
            ModelConfig::new(),
            Box::new(NullModel),
        )
    }

    #[test]
    fn insert_rejects_duplicate_names() {
        let store = InstanceStore::new();
        store.insert(instance("alpha", "first")).unwrap();

        let err = store.insert(instance("alpha", "second")).unwrap_err();
        assert_eq!(err, ManagerError::DuplicateInstance("alpha".to_string()));
        assert_eq!(
            store.get("alpha").unwrap().info().model_type,
            ModelTypeId::from_static("first")
        );
    }

    #[test]
    fn replace_returns_displaced_instance() {
        let store = InstanceStore::new();
        assert!(store.replace(instance("alpha", "first")).is_none());

        let old = store.replace(instance("alpha", "second")).unwrap();
        assert_eq!(old.info().model_type, ModelTypeId::from_static("first"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn remove_and_get_report_unknown_names() {
        let store = InstanceStore::new();
        store.insert(instance("alpha", "m")).unwrap();

        store.remove("alpha").unwrap();
        assert!(!store.contains("alpha"));
        assert!(matches!(
            store.get("alpha"),
            Err(ManagerError::UnknownInstance(ref name)) if name == "alpha"
        ));
        assert!(store.remove("alpha").is_err());
    }

    #[test]
    fn names_are_sorted_snapshots() {
        let store = InstanceStore::new();
        store.insert(instance("charlie", "m")).unwrap();
        store.insert(instance("alpha", "m")).unwrap();

        let names = store.names();
        store.insert(instance("bravo", "m")).unwrap();

        assert_eq!(names, vec!["alpha", "charlie"]);
        assert_eq!(store.snapshot().len(), 3);
        assert_eq!(store.clear(), 3);
        assert!(store.names().is_empty());
    }
}
