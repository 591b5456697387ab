use alloc::boxed::Box;
use alloc::string::ToString;
use alloc::sync::Arc;

use crate::construction::ObjectConstructor;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::metadata::{ClassMetadata, Instantiator};
use crate::types::Type;
use crate::value::{InputView, Object};

/// Creates blank instances through an [`Instantiator`].
///
/// No user initialization runs: every field the input does not carry keeps
/// the blank value the instantiator chose.
#[derive(Clone)]
pub struct FreshObjectConstructor {
    instantiator: Arc<dyn Instantiator>,
}

impl FreshObjectConstructor {
    pub fn new(instantiator: Arc<dyn Instantiator>) -> Self {
        Self { instantiator }
    }
}

impl ObjectConstructor for FreshObjectConstructor {
    fn construct(
        &self,
        metadata: &ClassMetadata,
        _input: &dyn InputView,
        _ty: &Type,
        _context: &mut Context,
    ) -> Result<Option<Box<dyn Object>>> {
        if metadata.is_abstract() {
            return Err(Error::NotInstantiable(metadata.name().to_string()));
        }
        match self.instantiator.instantiate(metadata.name()) {
            Some(object) => Ok(Some(object)),
            None => Err(Error::NotInstantiable(metadata.name().to_string())),
        }
    }
}
