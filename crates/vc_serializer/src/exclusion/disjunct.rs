use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::context::Context;
use crate::exclusion::ExclusionStrategy;
use crate::metadata::{ClassMetadata, PropertyMetadata};

/// Skips when any delegate skips, asking them in order.
#[derive(Default)]
pub struct DisjunctExclusionStrategy {
    delegates: Vec<Box<dyn ExclusionStrategy>>,
}

impl DisjunctExclusionStrategy {
    pub fn new(delegates: Vec<Box<dyn ExclusionStrategy>>) -> Self {
        Self { delegates }
    }

    pub fn add_strategy(&mut self, strategy: Box<dyn ExclusionStrategy>) {
        self.delegates.push(strategy);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.delegates.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.delegates.is_empty()
    }
}

impl ExclusionStrategy for DisjunctExclusionStrategy {
    fn should_skip_class(&self, metadata: &ClassMetadata, context: &Context) -> bool {
        self.delegates
            .iter()
            .any(|d| d.should_skip_class(metadata, context))
    }

    fn should_skip_property(&self, metadata: &PropertyMetadata, context: &Context) -> bool {
        self.delegates
            .iter()
            .any(|d| d.should_skip_property(metadata, context))
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::vec;
    use core::cell::Cell;

    use alloc::rc::Rc;

    use super::DisjunctExclusionStrategy;
    use crate::context::Context;
    use crate::exclusion::ExclusionStrategy;
    use crate::metadata::{ClassMetadata, PropertyMetadata};

    #[test]
    fn first_skip_short_circuits() {
        let calls = Rc::new(Cell::new(0));
        let counted = Rc::clone(&calls);

        let never = (
            |_: &ClassMetadata, _: &Context| false,
            |_: &PropertyMetadata, _: &Context| false,
        );
        let always = (
            |_: &ClassMetadata, _: &Context| true,
            |_: &PropertyMetadata, _: &Context| true,
        );
        let counting = (
            move |_: &ClassMetadata, _: &Context| {
                counted.set(counted.get() + 1);
                false
            },
            |_: &PropertyMetadata, _: &Context| false,
        );

        let strategy = DisjunctExclusionStrategy::new(vec![
            Box::new(never),
            Box::new(always),
            Box::new(counting),
        ]);
        let context = Context::new();

        assert!(strategy.should_skip_class(&ClassMetadata::new("Foo"), &context));
        assert_eq!(calls.get(), 0);
        assert!(strategy.should_skip_property(&PropertyMetadata::new("Foo", "a"), &context));
    }

    #[test]
    fn empty_never_skips() {
        let strategy = DisjunctExclusionStrategy::default();
        assert!(!strategy.should_skip_class(&ClassMetadata::new("Foo"), &Context::new()));
    }
}
