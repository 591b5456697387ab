use alloc::sync::Arc;
use alloc::vec::Vec;

use vc_utils::hash::IndexMap;

use crate::context::Context;
use crate::error::Result;
use crate::metadata::{ClassMetadata, PropertyMetadata};
use crate::naming::{PropertyNamingStrategy, default_naming_strategy};
use crate::types::Type;
use crate::value::{Data, Key};
use crate::visitor::{DeserializationVisitor, SerializationVisitor};

// -----------------------------------------------------------------------------
// ArraySerializationVisitor

/// Builds the neutral [`Data`] tree.
///
/// Objects become maps keyed by serialized property names, so the result can
/// be handed to any serde format.
pub struct ArraySerializationVisitor {
    naming: Arc<dyn PropertyNamingStrategy>,
}

impl Default for ArraySerializationVisitor {
    fn default() -> Self {
        Self::new(default_naming_strategy())
    }
}

impl ArraySerializationVisitor {
    pub fn new(naming: Arc<dyn PropertyNamingStrategy>) -> Self {
        Self { naming }
    }
}

impl SerializationVisitor for ArraySerializationVisitor {
    type Output = Data;

    fn format(&self) -> &str {
        "array"
    }

    fn visit_null(&mut self, _ty: &Type, _context: &Context) -> Result<Data> {
        Ok(Data::Null)
    }

    fn visit_boolean(&mut self, value: bool, _ty: &Type, _context: &Context) -> Result<Data> {
        Ok(Data::Bool(value))
    }

    fn visit_integer(&mut self, value: i64, _ty: &Type, _context: &Context) -> Result<Data> {
        Ok(Data::Int(value))
    }

    fn visit_double(&mut self, value: f64, _ty: &Type, _context: &Context) -> Result<Data> {
        Ok(Data::Float(value))
    }

    fn visit_string(&mut self, value: &str, _ty: &Type, _context: &Context) -> Result<Data> {
        Ok(Data::String(value.into()))
    }

    fn visit_array(&mut self, items: Vec<Data>, _ty: &Type, _context: &Context) -> Result<Data> {
        Ok(Data::List(items))
    }

    fn visit_hash(
        &mut self,
        entries: Vec<(Key, Data)>,
        _ty: &Type,
        _context: &Context,
    ) -> Result<Data> {
        Ok(Data::Map(entries.into_iter().collect()))
    }

    fn visit_object(
        &mut self,
        _metadata: &ClassMetadata,
        properties: Vec<(Arc<PropertyMetadata>, Data)>,
        _ty: &Type,
        _context: &Context,
    ) -> Result<Data> {
        let mut map = IndexMap::with_capacity_and_hasher(properties.len(), Default::default());
        for (property, value) in properties {
            match value {
                Data::Map(inner) if property.is_inline() => map.extend(inner),
                value => {
                    map.insert(Key::from(self.naming.translate_name(&property)), value);
                }
            }
        }
        Ok(Data::Map(map))
    }

    fn visit_custom(&mut self, data: Data, _ty: &Type, _context: &Context) -> Result<Data> {
        Ok(data)
    }
}

// -----------------------------------------------------------------------------
// ArrayDeserializationVisitor

/// Reads the neutral [`Data`] tree.
pub struct ArrayDeserializationVisitor {
    naming: Arc<dyn PropertyNamingStrategy>,
}

impl Default for ArrayDeserializationVisitor {
    fn default() -> Self {
        Self::new(default_naming_strategy())
    }
}

impl ArrayDeserializationVisitor {
    pub fn new(naming: Arc<dyn PropertyNamingStrategy>) -> Self {
        Self { naming }
    }
}

impl DeserializationVisitor for ArrayDeserializationVisitor {
    fn format(&self) -> &str {
        "array"
    }

    fn naming(&self) -> &dyn PropertyNamingStrategy {
        &*self.naming
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;
    use alloc::vec;
    use alloc::vec::Vec;

    use super::{ArrayDeserializationVisitor, ArraySerializationVisitor};
    use crate::context::Context;
    use crate::error::ErrorKind;
    use crate::metadata::ClassMetadata;
    use crate::types::Type;
    use crate::value::{Data, InputView, Key};
    use crate::visitor::{DeserializationVisitor, SerializationVisitor};

    #[test]
    fn empty_object_is_an_empty_map() {
        let mut visitor = ArraySerializationVisitor::default();
        let out = visitor
            .visit_object(&ClassMetadata::new("Empty"), vec![], &Type::new("Empty"), &Context::new())
            .unwrap();

        assert_eq!(out, Data::Map(Default::default()));
    }

    #[test]
    fn lists_and_maps_stand_in_for_each_other() {
        let mut visitor = ArrayDeserializationVisitor::default();
        let context = Context::new();
        let ty = Type::new(Type::ARRAY);

        let list = Data::List(vec![Data::from("a"), Data::from("b")]);
        let keys: Vec<Key> = visitor
            .visit_hash(&list, &ty, &context)
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, [Key::Int(0), Key::Int(1)]);

        let map = Data::map([("x", Data::Int(1)), ("y", Data::Int(2))]);
        let values: Vec<Data> = visitor
            .visit_array(&map, &ty, &context)
            .unwrap()
            .into_iter()
            .map(|v| InputView::to_data(v))
            .collect();
        assert_eq!(values, [Data::Int(1), Data::Int(2)]);

        let err = visitor.visit_array(&Data::Int(3), &ty, &context).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Runtime);
    }

    #[test]
    fn object_input_must_be_a_map() {
        let mut visitor = ArrayDeserializationVisitor::default();
        let class = ClassMetadata::new("User");

        let err = visitor
            .visit_object(&class, &Data::from("x"), &Context::new())
            .unwrap_err();
        assert!(err.to_string().contains("object of class `User`"));
    }
}
