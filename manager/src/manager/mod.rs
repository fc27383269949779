//! The model manager.
//!
//! [`ModelManager`] ties together the type registry, the instance store and
//! the dispatcher. It is cheap to clone; clones share the same state.

pub mod context;
pub mod dispatch;
pub mod error;
pub mod instance;
pub mod registry;
mod store;

pub use context::ContextPolicy;
pub use dispatch::{BatchResults, DispatchOptions};
pub use error::ManagerError;
pub use instance::InstanceInfo;
pub use registry::ModelRegistry;

use crate::inference::{Message, ModelConfig, ModelFactory, ModelType, ModelTypeId, TypedFactory};
use crate::infrastructure::audit::{log_audit, AuditEvent};
use crate::infrastructure::config::{ManagerSettings, Settings};
use instance::Instance;
use std::collections::BTreeMap;
use std::sync::Arc;
use store::InstanceStore;
use tracing::info;

/// Registry, instance lifecycle and dispatch for pluggable language models.
#[derive(Clone)]
pub struct ModelManager {
    inner: Arc<Inner>,
}

struct Inner {
    registry: ModelRegistry,
    instances: InstanceStore,
    settings: ManagerSettings,
}

impl ModelManager {
    /// Creates a manager with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::with_settings(ManagerSettings::default())
    }

    /// Creates a manager with explicit settings.
    #[must_use]
    pub fn with_settings(settings: ManagerSettings) -> Self {
        Self {
            inner: Arc::new(Inner {
                registry: ModelRegistry::new(),
                instances: InstanceStore::new(),
                settings,
            }),
        }
    }

    /// Creates a manager from loaded application settings.
    ///
    /// ```
    /// use chorus_manager::infrastructure::config::Settings;
    /// use chorus_manager::manager::ModelManager;
    /// use std::time::Duration;
    ///
    /// let settings = Settings::with_overrides(&[("manager.generation_timeout_ms", "250")])
    ///     .expect("Failed to load configuration");
    /// let manager = ModelManager::from_settings(&settings);
    /// assert_eq!(
    ///     manager.settings().generation_timeout(),
    ///     Some(Duration::from_millis(250))
    /// );
    /// ```
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self::with_settings(settings.manager.clone())
    }

    /// Settings this manager was built with.
    #[must_use]
    pub fn settings(&self) -> &ManagerSettings {
        &self.inner.settings
    }

    // ------------------------------------------------------------------
    // Registry
    // ------------------------------------------------------------------

    /// Registers a [`ModelType`] under the identifier derived from its type.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::DuplicateType`] if it is already registered.
    pub fn register_model_type<M: ModelType>(&self) -> Result<ModelTypeId, ManagerError> {
        self.register_factory(TypedFactory::<M>::new())
    }

    /// Registers an arbitrary factory under the identifier it reports.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::DuplicateType`] if the identifier is taken.
    pub fn register_factory(
        &self,
        factory: impl ModelFactory + 'static,
    ) -> Result<ModelTypeId, ManagerError> {
        let model_type = self.inner.registry.register(factory)?;
        log_audit(&AuditEvent::ModelTypeRegistered {
            model_type: model_type.to_string(),
        });
        Ok(model_type)
    }

    /// Removes a model type. Existing instances of it keep working.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::UnknownType`] if it is not registered.
    pub fn unregister_model_type(&self, model_type: &ModelTypeId) -> Result<(), ManagerError> {
        self.inner.registry.unregister(model_type)?;
        log_audit(&AuditEvent::ModelTypeUnregistered {
            model_type: model_type.to_string(),
        });
        Ok(())
    }

    /// Returns true if the model type is registered.
    #[must_use]
    pub fn is_registered(&self, model_type: &ModelTypeId) -> bool {
        self.inner.registry.contains(model_type)
    }

    /// Sorted list of registered model types.
    #[must_use]
    pub fn model_types(&self) -> Vec<ModelTypeId> {
        self.inner.registry.list_types()
    }

    // ------------------------------------------------------------------
    // Instance lifecycle
    // ------------------------------------------------------------------

    /// Builds a new instance of a registered type and binds it to `name`.
    ///
    /// The factory runs once here; configuration problems surface now, not on
    /// first use.
    ///
    /// # Errors
    ///
    /// - [`ManagerError::DuplicateInstance`] if `name` is taken.
    /// - [`ManagerError::UnknownType`] if the type is not registered.
    /// - [`ManagerError::Config`] if the factory rejects `config`.
    pub fn instantiate_model(
        &self,
        name: impl Into<String>,
        model_type: &ModelTypeId,
        config: ModelConfig,
    ) -> Result<(), ManagerError> {
        let name = name.into();
        if self.inner.instances.contains(&name) {
            return Err(ManagerError::DuplicateInstance(name));
        }
        let instance = self.build_instance(name, model_type, config)?;
        let name = instance.name().to_string();
        self.inner.instances.insert(instance)?;

        info!(instance = %name, model_type = %model_type, "Instantiated model");
        log_audit(&AuditEvent::InstanceCreated {
            instance: name,
            model_type: model_type.to_string(),
        });
        Ok(())
    }

    /// Instantiates a [`ModelType`] by its derived identifier.
    ///
    /// # Errors
    ///
    /// Same as [`ModelManager::instantiate_model`].
    pub fn instantiate<M: ModelType>(
        &self,
        name: impl Into<String>,
        config: ModelConfig,
    ) -> Result<(), ManagerError> {
        self.instantiate_model(name, &M::model_type_id(), config)
    }

    /// Binds a freshly built instance to `name`, discarding any instance and
    /// history previously bound to it. Returns true if one was replaced.
    ///
    /// # Errors
    ///
    /// [`ManagerError::UnknownType`] or [`ManagerError::Config`]; on error the
    /// existing instance is untouched.
    pub fn replace_model(
        &self,
        name: impl Into<String>,
        model_type: &ModelTypeId,
        config: ModelConfig,
    ) -> Result<bool, ManagerError> {
        let instance = self.build_instance(name.into(), model_type, config)?;
        let name = instance.name().to_string();
        let replaced = self.inner.instances.replace(instance).is_some();

        info!(instance = %name, model_type = %model_type, replaced, "Bound model");
        let event = if replaced {
            AuditEvent::InstanceReplaced {
                instance: name,
                model_type: model_type.to_string(),
            }
        } else {
            AuditEvent::InstanceCreated {
                instance: name,
                model_type: model_type.to_string(),
            }
        };
        log_audit(&event);
        Ok(replaced)
    }

    /// Discards an instance together with its model object and history.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::UnknownInstance`] if `name` is not bound.
    pub fn remove_model(&self, name: &str) -> Result<(), ManagerError> {
        self.inner.instances.remove(name)?;
        info!(instance = %name, "Removed model");
        log_audit(&AuditEvent::InstanceRemoved {
            instance: name.to_string(),
        });
        Ok(())
    }

    /// Removes every instance. Registered types are kept.
    pub fn reset(&self) -> usize {
        let removed = self.inner.instances.clear();
        info!(removed, "Reset model instances");
        log_audit(&AuditEvent::ManagerReset { removed });
        removed
    }

    /// Snapshot of one instance.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::UnknownInstance`] if `name` is not bound.
    pub fn instance(&self, name: &str) -> Result<InstanceInfo, ManagerError> {
        Ok(self.inner.instances.get(name)?.info())
    }

    /// Returns true if `name` is bound.
    #[must_use]
    pub fn contains_instance(&self, name: &str) -> bool {
        self.inner.instances.contains(name)
    }

    /// Sorted snapshot of live instance names.
    #[must_use]
    pub fn instance_names(&self) -> Vec<String> {
        self.inner.instances.names()
    }

    /// Number of live instances.
    #[must_use]
    pub fn instance_count(&self) -> usize {
        self.inner.instances.len()
    }

    // ------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------

    /// Ordered snapshot of an instance's history.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::UnknownInstance`] if `name` is not bound.
    pub fn get_history(&self, name: &str) -> Result<Vec<Message>, ManagerError> {
        Ok(self.inner.instances.get(name)?.history())
    }

    /// History snapshot of every live instance, keyed by name.
    #[must_use]
    pub fn get_all_histories(&self) -> BTreeMap<String, Vec<Message>> {
        self.inner
            .instances
            .snapshot()
            .into_iter()
            .map(|instance| (instance.name().to_string(), instance.history()))
            .collect()
    }

    /// Empties one instance's history after any in-flight call on it commits.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::UnknownInstance`] if `name` is not bound.
    pub async fn clear_history(&self, name: &str) -> Result<usize, ManagerError> {
        let instance = self.inner.instances.get(name)?;
        let messages = instance.clear_history().await;
        log_audit(&AuditEvent::HistoryCleared {
            instance: name.to_string(),
            messages,
        });
        Ok(messages)
    }

    fn build_instance(
        &self,
        name: String,
        model_type: &ModelTypeId,
        config: ModelConfig,
    ) -> Result<Instance, ManagerError> {
        let factory = self.inner.registry.resolve(model_type)?;
        let model = factory
            .create(&config)
            .map_err(|cause| ManagerError::Config {
                model_type: model_type.clone(),
                cause,
            })?;
        Ok(Instance::new(name, model_type.clone(), config, model))
    }
}

impl Default for ModelManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ModelManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelManager")
            .field("types", &self.inner.registry.len())
            .field("instances", &self.inner.instances.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::{ConfigError, InferenceError, LanguageModel};
    use async_trait::async_trait;

    struct EchoModel {
        prefix: String,
    }

    #[async_trait]
    impl LanguageModel for EchoModel {
        async fn generate(&self, messages: &[Message]) -> Result<String, InferenceError> {
            let last = messages.last().map_or("", Message::content);
            Ok(format!("{}{last}", self.prefix))
        }
    }

    impl ModelType for EchoModel {
        fn from_config(config: &ModelConfig) -> Result<Self, ConfigError> {
            if config.get_bool("reject") == Some(true) {
                return Err(ConfigError::Rejected("told to".to_string()));
            }
            Ok(Self {
                prefix: config.get_str("prefix").unwrap_or_default().to_string(),
            })
        }
    }

    fn manager() -> ModelManager {
        let manager = ModelManager::new();
        manager.register_model_type::<EchoModel>().unwrap();
        manager
    }

    #[test]
    fn register_twice_fails_and_keeps_catalog() {
        let manager = manager();
        let err = manager.register_model_type::<EchoModel>().unwrap_err();
        assert_eq!(err, ManagerError::DuplicateType(EchoModel::model_type_id()));
        assert_eq!(manager.model_types(), vec![EchoModel::model_type_id()]);
    }

    #[test]
    fn instantiate_rejects_duplicate_name_and_keeps_original() {
        let manager = manager();
        manager
            .instantiate::<EchoModel>("alpha", ModelConfig::new().with("prefix", "a:"))
            .unwrap();

        let err = manager
            .instantiate::<EchoModel>("alpha", ModelConfig::new().with("prefix", "b:"))
            .unwrap_err();
        assert_eq!(err, ManagerError::DuplicateInstance("alpha".to_string()));
        assert_eq!(
            manager.instance("alpha").unwrap().config.get_str("prefix"),
            Some("a:")
        );
    }

    #[test]
    fn instantiate_unknown_type_creates_nothing() {
        let manager = ModelManager::new();
        let err = manager
            .instantiate_model("alpha", &ModelTypeId::from_static("ghost"), ModelConfig::new())
            .unwrap_err();
        assert_eq!(err, ManagerError::UnknownType(ModelTypeId::from_static("ghost")));
        assert_eq!(manager.instance_count(), 0);
    }

    #[test]
    fn config_rejection_surfaces_at_instantiation() {
        let manager = manager();
        let err = manager
            .instantiate::<EchoModel>("alpha", ModelConfig::new().with("reject", true))
            .unwrap_err();
        assert!(matches!(
            err,
            ManagerError::Config { cause: ConfigError::Rejected(_), .. }
        ));
        assert!(!manager.contains_instance("alpha"));
    }

    #[test]
    fn unregister_blocks_new_instances_only() {
        let manager = manager();
        manager
            .instantiate::<EchoModel>("alpha", ModelConfig::new())
            .unwrap();
        manager
            .unregister_model_type(&EchoModel::model_type_id())
            .unwrap();

        assert!(manager.contains_instance("alpha"));
        assert!(matches!(
            manager.instantiate::<EchoModel>("beta", ModelConfig::new()),
            Err(ManagerError::UnknownType(_))
        ));
    }

    #[tokio::test]
    async fn replace_model_discards_history() {
        let manager = manager();
        manager
            .instantiate::<EchoModel>("alpha", ModelConfig::new())
            .unwrap();
        manager.use_model("alpha", "hello", true, true).await.unwrap();
        assert_eq!(manager.get_history("alpha").unwrap().len(), 2);

        let replaced = manager
            .replace_model(
                "alpha",
                &EchoModel::model_type_id(),
                ModelConfig::new().with("prefix", "v2:"),
            )
            .unwrap();
        assert!(replaced);
        assert!(manager.get_history("alpha").unwrap().is_empty());
        assert_eq!(manager.use_model("alpha", "x", false, false).await.unwrap(), "v2:x");
    }

    #[test]
    fn replace_model_with_bad_config_keeps_existing() {
        let manager = manager();
        manager
            .instantiate::<EchoModel>("alpha", ModelConfig::new().with("prefix", "a:"))
            .unwrap();
        let err = manager
            .replace_model(
                "alpha",
                &EchoModel::model_type_id(),
                ModelConfig::new().with("reject", true),
            )
            .unwrap_err();
        assert!(matches!(err, ManagerError::Config { .. }));
        assert_eq!(
            manager.instance("alpha").unwrap().config.get_str("prefix"),
            Some("a:")
        );
    }

    #[test]
    fn remove_and_reset_drop_instances() {
        let manager = manager();
        for name in ["alpha", "beta", "gamma"] {
            manager
                .instantiate::<EchoModel>(name, ModelConfig::new())
                .unwrap();
        }

        manager.remove_model("beta").unwrap();
        assert_eq!(manager.instance_names(), vec!["alpha", "gamma"]);
        assert_eq!(
            manager.remove_model("beta").unwrap_err(),
            ManagerError::UnknownInstance("beta".to_string())
        );

        assert_eq!(manager.reset(), 2);
        assert!(manager.instance_names().is_empty());
        assert!(manager.get_all_histories().is_empty());
        assert_eq!(manager.model_types().len(), 1);
    }

    #[tokio::test]
    async fn clear_history_empties_one_instance() {
        let manager = manager();
        manager
            .instantiate::<EchoModel>("alpha", ModelConfig::new())
            .unwrap();
        manager
            .instantiate::<EchoModel>("beta", ModelConfig::new())
            .unwrap();
        manager.use_model("alpha", "a", true, true).await.unwrap();
        manager.use_model("beta", "b", true, true).await.unwrap();

        assert_eq!(manager.clear_history("alpha").await.unwrap(), 2);
        let histories = manager.get_all_histories();
        assert!(histories["alpha"].is_empty());
        assert_eq!(histories["beta"].len(), 2);
    }

    #[test]
    fn instance_info_reports_binding() {
        let manager = manager();
        manager
            .instantiate::<EchoModel>("alpha", ModelConfig::new().with("prefix", "p"))
            .unwrap();

        let info = manager.instance("alpha").unwrap();
        assert_eq!(info.name, "alpha");
        assert_eq!(info.model_type.short_name(), "EchoModel");
        assert_eq!(info.history_len, 0);
    }

    #[test]
    fn from_settings_carries_manager_section() {
        let loaded = Settings::new().unwrap();
        assert_eq!(ModelManager::from_settings(&loaded).settings(), &loaded.manager);

        let settings =
            Settings::with_overrides(&[("manager.generation_timeout_ms", "1500")]).unwrap();
        let manager = ModelManager::from_settings(&settings);
        assert_eq!(
            manager.settings().generation_timeout(),
            Some(std::time::Duration::from_millis(1_500))
        );
        // Clones share the same settings.
        assert_eq!(manager.clone().settings(), manager.settings());
    }
}
