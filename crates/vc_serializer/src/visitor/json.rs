use alloc::string::ToString;
use alloc::sync::Arc;
use alloc::vec::Vec;

use serde_json::{Map, Number, Value as Json};

use crate::context::Context;
use crate::error::{Error, Result};
use crate::metadata::{ClassMetadata, PropertyMetadata};
use crate::naming::{PropertyNamingStrategy, default_naming_strategy};
use crate::types::Type;
use crate::value::{Data, Key};
use crate::visitor::{DeserializationVisitor, SerializationVisitor};

fn number(value: f64) -> Result<Json> {
    Number::from_f64(value)
        .map(Json::Number)
        .ok_or_else(|| Error::unexpected("finite double", value.to_string()))
}

/// Converts the neutral tree into JSON.
///
/// Fails on non-finite floats, which JSON cannot represent.
pub fn data_to_json(data: Data) -> Result<Json> {
    Ok(match data {
        Data::Null => Json::Null,
        Data::Bool(b) => Json::Bool(b),
        Data::Int(i) => Json::from(i),
        Data::Float(f) => number(f)?,
        Data::String(s) => Json::String(s),
        Data::List(list) => Json::Array(list.into_iter().map(data_to_json).collect::<Result<_>>()?),
        Data::Map(map) => {
            let mut out = Map::with_capacity(map.len());
            for (k, v) in map {
                out.insert(k.to_string(), data_to_json(v)?);
            }
            Json::Object(out)
        }
    })
}

// -----------------------------------------------------------------------------
// JsonSerializationVisitor

/// Builds a [`serde_json::Value`].
///
/// Empty maps and objects are written as `{}`, empty lists as `[]`.
pub struct JsonSerializationVisitor {
    naming: Arc<dyn PropertyNamingStrategy>,
}

impl Default for JsonSerializationVisitor {
    fn default() -> Self {
        Self::new(default_naming_strategy())
    }
}

impl JsonSerializationVisitor {
    pub fn new(naming: Arc<dyn PropertyNamingStrategy>) -> Self {
        Self { naming }
    }
}

impl SerializationVisitor for JsonSerializationVisitor {
    type Output = Json;

    fn format(&self) -> &str {
        "json"
    }

    fn visit_null(&mut self, _ty: &Type, _context: &Context) -> Result<Json> {
        Ok(Json::Null)
    }

    fn visit_boolean(&mut self, value: bool, _ty: &Type, _context: &Context) -> Result<Json> {
        Ok(Json::Bool(value))
    }

    fn visit_integer(&mut self, value: i64, _ty: &Type, _context: &Context) -> Result<Json> {
        Ok(Json::from(value))
    }

    fn visit_double(&mut self, value: f64, _ty: &Type, _context: &Context) -> Result<Json> {
        number(value)
    }

    fn visit_string(&mut self, value: &str, _ty: &Type, _context: &Context) -> Result<Json> {
        Ok(Json::String(value.into()))
    }

    fn visit_array(&mut self, items: Vec<Json>, _ty: &Type, _context: &Context) -> Result<Json> {
        Ok(Json::Array(items))
    }

    fn visit_hash(
        &mut self,
        entries: Vec<(Key, Json)>,
        _ty: &Type,
        _context: &Context,
    ) -> Result<Json> {
        let mut map = Map::with_capacity(entries.len());
        for (key, value) in entries {
            map.insert(key.to_string(), value);
        }
        Ok(Json::Object(map))
    }

    fn visit_object(
        &mut self,
        _metadata: &ClassMetadata,
        properties: Vec<(Arc<PropertyMetadata>, Json)>,
        _ty: &Type,
        _context: &Context,
    ) -> Result<Json> {
        let mut map = Map::with_capacity(properties.len());
        for (property, value) in properties {
            match value {
                Json::Object(inner) if property.is_inline() => map.extend(inner),
                value => {
                    map.insert(self.naming.translate_name(&property), value);
                }
            }
        }
        Ok(Json::Object(map))
    }

    fn visit_custom(&mut self, data: Data, _ty: &Type, _context: &Context) -> Result<Json> {
        data_to_json(data)
    }
}

// -----------------------------------------------------------------------------
// JsonDeserializationVisitor

/// Reads a [`serde_json::Value`].
///
/// JSON object keys that are canonical integers become integer keys.
pub struct JsonDeserializationVisitor {
    naming: Arc<dyn PropertyNamingStrategy>,
}

impl Default for JsonDeserializationVisitor {
    fn default() -> Self {
        Self::new(default_naming_strategy())
    }
}

impl JsonDeserializationVisitor {
    pub fn new(naming: Arc<dyn PropertyNamingStrategy>) -> Self {
        Self { naming }
    }

    /// Parses a JSON document.
    pub fn prepare(&self, input: &str) -> Result<Json> {
        serde_json::from_str(input).map_err(Error::from)
    }
}

impl DeserializationVisitor for JsonDeserializationVisitor {
    fn format(&self) -> &str {
        "json"
    }

    fn naming(&self) -> &dyn PropertyNamingStrategy {
        &*self.naming
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;
    use alloc::sync::Arc;
    use alloc::vec;

    use serde_json::json;

    use super::{JsonDeserializationVisitor, JsonSerializationVisitor, data_to_json};
    use crate::context::Context;
    use crate::error::ErrorKind;
    use crate::metadata::{ClassMetadata, PropertyMetadata};
    use crate::types::Type;
    use crate::value::{Data, InputView, Key};
    use crate::visitor::{DeserializationVisitor, SerializationVisitor};

    #[test]
    fn inline_properties_are_merged() {
        let mut visitor = JsonSerializationVisitor::default();
        let context = Context::new();
        let class = ClassMetadata::new("Order");

        let properties = vec![
            (Arc::new(PropertyMetadata::new("Order", "orderId")), json!(7)),
            (
                Arc::new(PropertyMetadata::new("Order", "address").with_inline(true)),
                json!({ "city": "Oslo" }),
            ),
        ];
        let out = visitor
            .visit_object(&class, properties, &Type::new("Order"), &context)
            .unwrap();

        assert_eq!(out, json!({ "order_id": 7, "city": "Oslo" }));
    }

    #[test]
    fn hash_keys_become_strings() {
        let mut visitor = JsonSerializationVisitor::default();
        let context = Context::new();
        let entries = vec![(Key::Int(1), json!("a")), (Key::from("b"), json!(2))];

        let out = visitor.visit_hash(entries, &Type::new(Type::ARRAY), &context).unwrap();
        assert_eq!(out.to_string(), r#"{"1":"a","b":2}"#);
    }

    #[test]
    fn non_finite_doubles_are_rejected() {
        assert_eq!(data_to_json(Data::Float(f64::NAN)).unwrap_err().kind(), ErrorKind::Runtime);
    }

    #[test]
    fn property_lookup_uses_the_naming_strategy() {
        let mut visitor = JsonDeserializationVisitor::default();
        let context = Context::new();
        let input = visitor.prepare(r#"{ "created_at": "now" }"#).unwrap();
        let property = PropertyMetadata::new("Post", "createdAt");

        let field = visitor.visit_property(&property, &input, &context).unwrap();
        assert_eq!(field.to_data(), Data::from("now"));
    }
}
