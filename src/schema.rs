//! Schema Node model: the JSON-Schema subset the union compiler reads.
//!
//! Nodes are immutable once loaded; the graph in [`crate::resolve`] owns them and
//! everything downstream borrows.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Null,
    Boolean,
    Object,
    Array,
    Number,
    String,
    Integer,
}

/// The `type` keyword: either a single kind or a list of kinds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "OneOrMany", into = "OneOrMany")]
pub struct TypeSet(pub Vec<Kind>);

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(Kind),
    Many(Vec<Kind>),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(rename = "$ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "TypeSet::is_empty")]
    pub type_: TypeSet,

    #[serde(default, deserialize_with = "subschema::list", skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<Schema>,

    /// `None` when the keyword is absent, which is distinct from `{}`.
    #[serde(default, deserialize_with = "subschema::optional_map", skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, Schema>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_: Option<Vec<Value>>,

    #[serde(default, deserialize_with = "subschema::map", skip_serializing_if = "IndexMap::is_empty")]
    pub definitions: IndexMap<String, Schema>,

    #[serde(rename = "$defs", default, deserialize_with = "subschema::map", skip_serializing_if = "IndexMap::is_empty")]
    pub defs: IndexMap<String, Schema>,

    /// Opt-in marker for tagged-union generation.
    #[serde(rename = "x-tagged-union", default, skip_serializing_if = "std::ops::Not::not")]
    pub tagged_union: bool,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl From<OneOrMany> for TypeSet {
    fn from(value: OneOrMany) -> Self {
        match value {
            OneOrMany::One(kind) => Self(vec![kind]),
            OneOrMany::Many(kinds) => Self(kinds),
        }
    }
}

impl From<TypeSet> for OneOrMany {
    fn from(value: TypeSet) -> Self {
        match value.0.as_slice() {
            [kind] => OneOrMany::One(*kind),
            _ => OneOrMany::Many(value.0),
        }
    }
}

impl TypeSet {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    /// Exactly one declared kind, and it is `kind`.
    pub fn is_exactly(&self, kind: Kind) -> bool {
        matches!(self.0.as_slice(), [k] if *k == kind)
    }
}

impl Schema {
    pub fn from_value(value: Value) -> Result<Self, String> {
        crate::path_de::from_value_with_path(value)
    }

    pub fn is_reference(&self) -> bool {
        self.reference.is_some()
    }

    pub fn is_object(&self) -> bool {
        self.type_.is_exactly(Kind::Object)
    }

    pub fn is_required(&self, property: &str) -> bool {
        self.required.iter().any(|name| name == property)
    }

    pub fn property(&self, name: &str) -> Option<&Schema> {
        self.properties.as_ref().and_then(|props| props.get(name))
    }

    /// Property names in declaration order; empty when `properties` is absent.
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.properties
            .iter()
            .flat_map(|props| props.keys().map(String::as_str))
    }

    pub fn has_properties(&self) -> bool {
        self.properties.as_ref().is_some_and(|props| !props.is_empty())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

/// Subschema positions also accept boolean schemas (`true` / `false`). Both load as an
/// empty schema: neither is an object nor a string, so analysis rejects them wherever a
/// branch or discriminant is expected.
mod subschema {
    use std::fmt;

    use indexmap::IndexMap;
    use serde::de::{self, Deserializer, MapAccess, Visitor};
    use serde::Deserialize;

    use super::Schema;

    struct Subschema(Schema);

    impl<'de> Deserialize<'de> for Subschema {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            struct SubschemaVisitor;

            impl<'de> Visitor<'de> for SubschemaVisitor {
                type Value = Subschema;

                fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str("a schema object or a boolean schema")
                }

                fn visit_bool<E: de::Error>(self, _: bool) -> Result<Subschema, E> {
                    Ok(Subschema(Schema::default()))
                }

                fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Subschema, A::Error> {
                    Schema::deserialize(de::value::MapAccessDeserializer::new(map)).map(Subschema)
                }
            }

            deserializer.deserialize_any(SubschemaVisitor)
        }
    }

    pub(super) fn list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Schema>, D::Error> {
        let items = Vec::<Subschema>::deserialize(deserializer)?;
        Ok(items.into_iter().map(|item| item.0).collect())
    }

    pub(super) fn map<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<IndexMap<String, Schema>, D::Error> {
        let entries = IndexMap::<String, Subschema>::deserialize(deserializer)?;
        Ok(entries.into_iter().map(|(name, item)| (name, item.0)).collect())
    }

    pub(super) fn optional_map<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<IndexMap<String, Schema>>, D::Error> {
        let entries = Option::<IndexMap<String, Subschema>>::deserialize(deserializer)?;
        Ok(entries.map(|entries| entries.into_iter().map(|(name, item)| (name, item.0)).collect()))
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn type_accepts_string_or_list() {
        let single = Schema::from_value(json!({ "type": "object" })).unwrap();
        assert!(single.is_object());

        let many = Schema::from_value(json!({ "type": ["object", "null"] })).unwrap();
        assert!(!many.is_object());
        assert_eq!(many.type_.0, vec![Kind::Object, Kind::Null]);
    }

    #[test]
    fn properties_keep_declaration_order() {
        let s = Schema::from_value(json!({
            "type": "object",
            "properties": {
                "zeta": { "type": "string" },
                "alpha": { "type": "string" },
                "mid": { "type": "boolean" }
            },
            "required": ["alpha"]
        }))
        .unwrap();
        let names: Vec<&str> = s.property_names().collect();
        assert_eq!(names, ["zeta", "alpha", "mid"]);
        assert!(s.is_required("alpha"));
        assert!(!s.is_required("zeta"));
    }

    #[test]
    fn absent_and_empty_properties_differ() {
        let absent = Schema::from_value(json!({ "type": "object" })).unwrap();
        let empty = Schema::from_value(json!({ "type": "object", "properties": {} })).unwrap();
        assert!(absent.properties.is_none());
        assert!(empty.properties.is_some());
        assert!(!absent.has_properties());
        assert!(!empty.has_properties());
    }

    #[test]
    fn bad_type_reports_json_path() {
        let err = Schema::from_value(json!({
            "properties": { "x": { "type": "float" } }
        }))
        .unwrap_err();
        assert!(err.contains("properties.x.type"), "{err}");
    }

    #[test]
    fn boolean_subschemas_load_as_empty_schemas() {
        let s = Schema::from_value(json!({
            "type": "object",
            "properties": { "anything": true, "name": { "type": "string" } },
            "oneOf": [ false, { "type": "object" } ],
            "definitions": { "Never": false },
            "$defs": { "Any": true }
        }))
        .unwrap();
        let anything = s.property("anything").unwrap();
        assert!(anything.type_.is_empty());
        assert!(!anything.is_object());
        assert!(s.property("name").unwrap().type_.is_exactly(Kind::String));
        assert_eq!(s.one_of.len(), 2);
        assert!(!s.one_of[0].is_object());
        assert!(s.one_of[1].is_object());
        assert!(s.definitions["Never"].type_.is_empty());
        assert!(s.defs["Any"].type_.is_empty());
    }

    #[test]
    fn non_schema_subschema_is_rejected_with_path() {
        let err = Schema::from_value(json!({ "properties": { "x": 3 } })).unwrap_err();
        assert!(err.contains("properties.x"), "{err}");
    }

    #[test]
    fn extension_flag_defaults_off() {
        let s = Schema::from_value(json!({ "type": "object", "x-tagged-union": true })).unwrap();
        assert!(s.tagged_union);
        let s = Schema::from_value(json!({ "type": "object" })).unwrap();
        assert!(!s.tagged_union);
    }
}
