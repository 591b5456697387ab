use crate::context::{Context, Frame};
use crate::exclusion::ExclusionStrategy;
use crate::metadata::{ClassMetadata, PropertyMetadata};

/// Honors the `max_depth` of the properties leading to the current position.
///
/// Frames are walked from the root, leaving out the innermost one. For the
/// n-th property frame with a `max_depth`, the traversal is too deep when
/// `depth - n > max_depth`. Both classes and properties are checked.
#[derive(Debug, Clone, Copy, Default)]
pub struct DepthExclusionStrategy;

impl DepthExclusionStrategy {
    fn is_too_deep(context: &Context) -> bool {
        let depth = context.depth();
        let frames = context.metadata_stack();
        let Some((_, outer)) = frames.split_last() else {
            return false;
        };

        let mut nth = 0;
        for frame in outer {
            let Frame::Property(property) = frame else {
                continue;
            };
            nth += 1;
            if let Some(max_depth) = property.max_depth()
                && depth.saturating_sub(nth) > max_depth
            {
                return true;
            }
        }
        false
    }
}

impl ExclusionStrategy for DepthExclusionStrategy {
    fn should_skip_class(&self, _metadata: &ClassMetadata, context: &Context) -> bool {
        Self::is_too_deep(context)
    }

    fn should_skip_property(&self, _metadata: &PropertyMetadata, context: &Context) -> bool {
        Self::is_too_deep(context)
    }
}

#[cfg(test)]
mod tests {
    use alloc::sync::Arc;

    use super::DepthExclusionStrategy;
    use crate::context::Context;
    use crate::exclusion::ExclusionStrategy;
    use crate::metadata::{ClassMetadata, PropertyMetadata};

    // Mimics the navigator on A.b -> B.c -> C.d -> D with max depth 2 on `b`.
    #[test]
    fn entry_property_limits_the_chain() {
        let mut context = Context::new();
        let class = |name: &str| Arc::new(ClassMetadata::new(name));
        let prop = |name: &str| Arc::new(PropertyMetadata::new("X", name));
        let strategy = DepthExclusionStrategy;

        let visit = |context: &mut Context, name: &str| -> bool {
            context.increase_depth();
            let meta = class(name);
            let skip = strategy.should_skip_class(&meta, context);
            context.push_class_metadata(meta);
            skip
        };

        assert!(!visit(&mut context, "A"));
        context.push_property_metadata(Arc::new(PropertyMetadata::new("A", "b").with_max_depth(2)));
        assert!(!visit(&mut context, "B"));
        context.push_property_metadata(prop("c"));
        assert!(!visit(&mut context, "C"));

        assert!(!strategy.should_skip_property(&PropertyMetadata::new("C", "d"), &context));
        context.push_property_metadata(prop("d"));
        assert!(visit(&mut context, "D"));
    }
}
