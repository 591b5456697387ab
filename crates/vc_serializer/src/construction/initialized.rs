use alloc::boxed::Box;
use alloc::sync::Arc;

use crate::construction::ObjectConstructor;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::metadata::ClassMetadata;
use crate::types::Type;
use crate::value::{InputView, Object, Value};

/// Deserializes the root object into the [`Context::TARGET`] attribute.
///
/// The target is taken out of the context at depth 1; nested objects and
/// calls without a target go to the fallback.
#[derive(Clone)]
pub struct InitializedObjectConstructor {
    fallback: Arc<dyn ObjectConstructor>,
}

impl InitializedObjectConstructor {
    pub fn new(fallback: Arc<dyn ObjectConstructor>) -> Self {
        Self { fallback }
    }
}

impl ObjectConstructor for InitializedObjectConstructor {
    fn construct(
        &self,
        metadata: &ClassMetadata,
        input: &dyn InputView,
        ty: &Type,
        context: &mut Context,
    ) -> Result<Option<Box<dyn Object>>> {
        if context.depth() == 1 && context.has_attribute(Context::TARGET) {
            return match context.take_attribute::<Value>(Context::TARGET) {
                Some(Value::Object(target)) => Ok(Some(target)),
                _ => Err(Error::logic("the `target` attribute must hold an object value")),
            };
        }
        self.fallback.construct(metadata, input, ty, context)
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::sync::Arc;

    use super::InitializedObjectConstructor;
    use crate::construction::{FreshObjectConstructor, ObjectConstructor};
    use crate::context::Context;
    use crate::error::ErrorKind;
    use crate::metadata::{ClassMetadata, ClassRegistry};
    use crate::types::Type;
    use crate::value::{Data, DynamicObject};

    fn constructor() -> InitializedObjectConstructor {
        let mut registry = ClassRegistry::new();
        registry.register_with(ClassMetadata::new("User"), || Box::new(DynamicObject::new("User")));
        InitializedObjectConstructor::new(Arc::new(FreshObjectConstructor::new(Arc::new(registry))))
    }

    #[test]
    fn target_is_used_at_the_root_only() {
        let constructor = constructor();
        let meta = ClassMetadata::new("User");
        let ty = Type::new("User");

        let mut context = Context::new();
        context
            .set_target(DynamicObject::new("User").with("name", "kept"))
            .unwrap();

        context.increase_depth();
        context.increase_depth();
        let nested = constructor.construct(&meta, &Data::Null, &ty, &mut context).unwrap().unwrap();
        assert!(nested.get_field("name").is_none());

        context.decrease_depth();
        let root = constructor.construct(&meta, &Data::Null, &ty, &mut context).unwrap().unwrap();
        assert_eq!(root.get_field("name").unwrap().as_str(), Some("kept"));
        assert!(!context.has_attribute(Context::TARGET));
    }

    #[test]
    fn non_object_target_is_rejected() {
        let constructor = constructor();
        let mut context = Context::new();
        context.set_attribute(Context::TARGET, 5_i64).unwrap();
        context.increase_depth();

        let err = constructor
            .construct(&ClassMetadata::new("User"), &Data::Null, &Type::new("User"), &mut context)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Logic);
    }
}
