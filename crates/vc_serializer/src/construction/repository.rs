use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use vc_utils::hash::IndexMap;

use crate::construction::ObjectConstructor;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::metadata::ClassMetadata;
use crate::naming::{PropertyNamingStrategy, default_naming_strategy};
use crate::types::Type;
use crate::value::{Data, InputView, Object};

/// An external store of existing objects, such as a database mapper.
pub trait ObjectRepository: Send + Sync {
    /// The identifier property names of `class`, `None` if the repository
    /// does not manage it.
    fn identifier_fields(&self, class: &str) -> Option<Vec<String>>;

    /// Looks up an object by its identifier values, keyed by property name.
    fn find(&self, class: &str, id: &IndexMap<String, Data>) -> Result<Option<Box<dyn Object>>>;
}

/// What happens when the repository has no object for the identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackStrategy {
    /// Delegate to the fallback constructor.
    #[default]
    Fallback,
    /// Deserialize to `null`.
    Null,
    /// Fail with a runtime error.
    Error,
}

/// Loads existing objects from an [`ObjectRepository`].
///
/// Identifier values are read from the input using the serialized names of
/// the identifier properties. Classes the repository does not manage, and
/// input lacking an identifier, go to the fallback.
#[derive(Clone)]
pub struct RepositoryObjectConstructor {
    repository: Arc<dyn ObjectRepository>,
    fallback: Arc<dyn ObjectConstructor>,
    strategy: FallbackStrategy,
    naming: Arc<dyn PropertyNamingStrategy>,
}

impl RepositoryObjectConstructor {
    pub fn new(repository: Arc<dyn ObjectRepository>, fallback: Arc<dyn ObjectConstructor>) -> Self {
        Self {
            repository,
            fallback,
            strategy: FallbackStrategy::default(),
            naming: default_naming_strategy(),
        }
    }

    pub fn with_strategy(mut self, strategy: FallbackStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Uses the naming strategy the visitors use.
    pub fn with_naming(mut self, naming: Arc<dyn PropertyNamingStrategy>) -> Self {
        self.naming = naming;
        self
    }

    fn identifier(
        &self,
        metadata: &ClassMetadata,
        fields: &[String],
        input: &dyn InputView,
    ) -> Option<IndexMap<String, Data>> {
        let mut id = IndexMap::with_capacity_and_hasher(fields.len(), Default::default());
        for field in fields {
            let name = match metadata.property(field) {
                Some(property) => self.naming.translate_name(property),
                None => field.clone(),
            };
            let value = input.get_field(&name)?;
            id.insert(field.clone(), value.to_data());
        }
        Some(id)
    }
}

impl ObjectConstructor for RepositoryObjectConstructor {
    fn construct(
        &self,
        metadata: &ClassMetadata,
        input: &dyn InputView,
        ty: &Type,
        context: &mut Context,
    ) -> Result<Option<Box<dyn Object>>> {
        let Some(fields) = self.repository.identifier_fields(metadata.name()) else {
            return self.fallback.construct(metadata, input, ty, context);
        };
        let Some(id) = self.identifier(metadata, &fields, input) else {
            return self.fallback.construct(metadata, input, ty, context);
        };

        if let Some(object) = self.repository.find(metadata.name(), &id)? {
            return Ok(Some(object));
        }
        match self.strategy {
            FallbackStrategy::Fallback => self.fallback.construct(metadata, input, ty, context),
            FallbackStrategy::Null => Ok(None),
            FallbackStrategy::Error => Err(Error::runtime(format!(
                "entity of class `{}` can not be found",
                metadata.name()
            ))),
        }
    }
}
