use crate::types::feature_collection::FeatureCollection;
use serde_json::Value;
use std::collections::HashSet;

/// Pulls monitoring-location IDs out of a locations collection.
///
/// `properties.id` is preferred over the feature's own `id`; features with
/// neither are skipped. Duplicates are dropped, keeping first-seen order.
pub fn extract_location_ids(collection: &FeatureCollection) -> Vec<String> {
    let mut seen = HashSet::new();
    collection
        .features()
        .iter()
        .filter_map(feature_id)
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

fn feature_id(feature: &Value) -> Option<String> {
    let from_properties = feature
        .get("properties")
        .filter(|props| props.is_object())
        .and_then(|props| props.get("id"))
        .filter(|id| is_truthy(id));

    from_properties
        .or_else(|| feature.get("id").filter(|id| is_truthy(id)))
        .map(id_text)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn id_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn collection(features: Value) -> FeatureCollection {
        FeatureCollection::from_value(json!({ "features": features }))
    }

    #[test]
    fn dedupes_preserving_first_seen_order() {
        let locations = collection(json!([
            {"properties": {"id": "a"}},
            {"properties": {"id": "b"}},
            {"properties": {"id": "a"}},
            {"properties": {"id": "c"}},
            {"properties": {"id": "b"}},
        ]));

        assert_eq!(extract_location_ids(&locations), vec!["a", "b", "c"]);
    }

    #[test]
    fn prefers_properties_id_over_feature_id() {
        let locations = collection(json!([
            {"id": "outer", "properties": {"id": "inner"}},
            {"id": "top-level-only", "properties": {"name": "x"}},
            {"id": "no-properties"},
        ]));

        assert_eq!(
            extract_location_ids(&locations),
            vec!["inner", "top-level-only", "no-properties"]
        );
    }

    #[test]
    fn skips_features_without_a_usable_id() {
        let locations = collection(json!([
            {"properties": {"id": ""}},
            {"properties": {"id": null}, "id": 0},
            {"properties": "not a map"},
            {"geometry": {"type": "Point"}},
            "not even an object",
        ]));

        assert!(extract_location_ids(&locations).is_empty());
    }

    #[test]
    fn falls_back_when_properties_id_is_falsy() {
        let locations = collection(json!([
            {"id": "fallback", "properties": {"id": ""}},
        ]));

        assert_eq!(extract_location_ids(&locations), vec!["fallback"]);
    }

    #[test]
    fn numeric_ids_become_strings() {
        let locations = collection(json!([
            {"properties": {"id": 8313000}},
            {"id": 8313000},
        ]));

        assert_eq!(extract_location_ids(&locations), vec!["8313000"]);
    }
}
