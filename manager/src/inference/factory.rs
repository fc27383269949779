//! Model type identity and construction.
//!
//! A registered model type is a [`ModelFactory`]: something that knows its
//! own [`ModelTypeId`] and can build a live [`LanguageModel`] from a
//! [`ModelConfig`]. Most implementations implement [`ModelType`] and let
//! [`TypedFactory`] derive both from the Rust type; closures can be registered
//! under an explicit identifier through [`FnFactory`].

use crate::inference::config::{ConfigError, ModelConfig};
use crate::inference::provider::LanguageModel;
use serde::{Serialize, Serializer};
use std::any::TypeId;
use std::borrow::Cow;
use std::fmt;
use std::marker::PhantomData;

/// Identifier of a registered model family.
///
/// Identifiers derived from a Rust type carry its [`TypeId`], so two types
/// whose paths print the same (two versions of one crate, say) never collide.
/// Identifiers built from a plain string compare by the string alone and are
/// never equal to a type-derived one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelTypeId {
    name: Cow<'static, str>,
    rust_type: Option<TypeId>,
}

impl ModelTypeId {
    /// Creates an identifier from a static string without allocating.
    #[must_use]
    pub const fn from_static(id: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(id),
            rust_type: None,
        }
    }

    /// Creates an identifier from an owned or borrowed string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            name: Cow::Owned(id.into()),
            rust_type: None,
        }
    }

    /// Derives the identifier of a Rust type, named by its fully qualified path.
    #[must_use]
    pub fn of<M: ?Sized + 'static>() -> Self {
        Self::for_type::<M>(std::any::type_name::<M>())
    }

    /// Identifier of the Rust type `M` displayed under `name`.
    #[must_use]
    pub fn for_type<M: ?Sized + 'static>(name: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
            rust_type: Some(TypeId::of::<M>()),
        }
    }

    /// The display name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// The Rust type behind a type-derived identifier.
    #[must_use]
    pub fn rust_type(&self) -> Option<TypeId> {
        self.rust_type
    }

    /// The last path segment, e.g. `OpenRouterModel` for
    /// `my_crate::models::OpenRouterModel`.
    #[must_use]
    pub fn short_name(&self) -> &str {
        let path = self.name.split('<').next().unwrap_or(&self.name);
        path.rsplit("::").next().unwrap_or(path)
    }
}

impl fmt::Display for ModelTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Serializes as the display name.
impl Serialize for ModelTypeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name)
    }
}

impl From<&'static str> for ModelTypeId {
    fn from(id: &'static str) -> Self {
        Self::from_static(id)
    }
}

impl From<String> for ModelTypeId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

/// A model implementation that can be built directly from configuration.
pub trait ModelType: LanguageModel + Sized + 'static {
    /// Builds the model, rejecting unusable configuration up front.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the configuration cannot be used.
    fn from_config(config: &ModelConfig) -> Result<Self, ConfigError>;

    /// Identifier this type registers under. Defaults to the type itself,
    /// displayed as its path.
    #[must_use]
    fn model_type_id() -> ModelTypeId {
        ModelTypeId::of::<Self>()
    }
}

/// Object-safe constructor stored in the model registry.
pub trait ModelFactory: Send + Sync {
    /// Identifier of the model family this factory builds.
    fn model_type(&self) -> ModelTypeId;

    /// Builds a fresh, exclusively owned model object.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the configuration is rejected.
    fn create(&self, config: &ModelConfig) -> Result<Box<dyn LanguageModel>, ConfigError>;
}

/// Factory for a [`ModelType`], identified by the type itself.
pub struct TypedFactory<M> {
    _model: PhantomData<fn() -> M>,
}

impl<M: ModelType> TypedFactory<M> {
    /// Creates the factory.
    #[must_use]
    pub fn new() -> Self {
        Self {
            _model: PhantomData,
        }
    }
}

impl<M: ModelType> Default for TypedFactory<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: ModelType> ModelFactory for TypedFactory<M> {
    fn model_type(&self) -> ModelTypeId {
        M::model_type_id()
    }

    fn create(&self, config: &ModelConfig) -> Result<Box<dyn LanguageModel>, ConfigError> {
        Ok(Box::new(M::from_config(config)?))
    }
}

/// Factory backed by a closure and an explicit identifier.
pub struct FnFactory<F, M> {
    id: ModelTypeId,
    build: F,
    _model: PhantomData<fn() -> M>,
}

impl<F, M> FnFactory<F, M>
where
    F: Fn(&ModelConfig) -> Result<M, ConfigError> + Send + Sync,
    M: LanguageModel + 'static,
{
    /// Creates a factory that registers under `id` and builds with `build`.
    pub fn new(id: impl Into<ModelTypeId>, build: F) -> Self {
        Self {
            id: id.into(),
            build,
            _model: PhantomData,
        }
    }
}

impl<F, M> ModelFactory for FnFactory<F, M>
where
    F: Fn(&ModelConfig) -> Result<M, ConfigError> + Send + Sync,
    M: LanguageModel + 'static,
{
    fn model_type(&self) -> ModelTypeId {
        self.id.clone()
    }

    fn create(&self, config: &ModelConfig) -> Result<Box<dyn LanguageModel>, ConfigError> {
        Ok(Box::new((self.build)(config)?))
    }
}
