//! A GeoJSON-shaped container: an ordered `features` list plus whatever
//! collection-level metadata the API sent alongside it.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

/// An ordered list of features plus collection-level metadata.
///
/// Features are kept as raw JSON objects; only the `properties` map (and the
/// optional top-level `id`) is ever interpreted downstream. Metadata keys keep
/// the order in which they were received.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureCollection {
    features: Vec<Value>,
    meta: Map<String, Value>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Value>, meta: Map<String, Value>) -> Self {
        Self { features, meta }
    }

    /// Splits a JSON document into features and metadata.
    ///
    /// A missing or non-array `features` field yields an empty feature list, and
    /// a document that is not an object yields an empty collection.
    pub fn from_value(value: Value) -> Self {
        let Value::Object(mut meta) = value else {
            return Self::default();
        };
        let features = match meta.remove("features") {
            Some(Value::Array(features)) => features,
            _ => Vec::new(),
        };
        Self { features, meta }
    }

    pub fn features(&self) -> &[Value] {
        &self.features
    }

    pub fn meta(&self) -> &Map<String, Value> {
        &self.meta
    }

    pub fn into_parts(self) -> (Vec<Value>, Map<String, Value>) {
        (self.features, self.meta)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Serializes back into the document shape it was read from, metadata first.
impl Serialize for FeatureCollection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut document = serializer.serialize_map(Some(self.meta.len() + 1))?;
        for (key, value) in &self.meta {
            document.serialize_entry(key, value)?;
        }
        document.serialize_entry("features", &self.features)?;
        document.end()
    }
}
