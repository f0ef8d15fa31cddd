use crate::types::feature_collection::FeatureCollection;
use crate::types::time_range::TimeRange;
use log::debug;
use serde_json::{Map, Value};

/// Folds per-batch responses into one combined collection.
///
/// Metadata (every top-level key except `features`) is taken from the first
/// response only; later responses contribute features alone.
#[derive(Debug, Default)]
pub struct BatchAggregator {
    meta: Option<Map<String, Value>>,
    features: Vec<Value>,
    batches: usize,
}

impl BatchAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one batch response and returns how many features it contributed.
    pub fn push(&mut self, response: Value) -> usize {
        self.batches += 1;
        let (features, page_meta) = FeatureCollection::from_value(response).into_parts();
        let contributed = features.len();

        if self.meta.is_none() {
            self.meta = Some(page_meta);
        } else if let Some(meta) = &self.meta {
            for (key, value) in &page_meta {
                if meta.get(key) != Some(value) {
                    debug!(
                        "Batch {} metadata differs from the first batch at key '{}'; keeping the first",
                        self.batches, key
                    );
                }
            }
        }

        self.features.extend(features);
        contributed
    }

    pub fn batches(&self) -> usize {
        self.batches
    }

    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    /// Builds the combined result with its batch provenance fields.
    pub fn finish(self, batch_size: usize, time_range: &TimeRange) -> FeatureCollection {
        let total = self.features.len();
        let mut meta = self.meta.unwrap_or_default();
        meta.insert("numberReturned".to_string(), Value::from(total));
        meta.insert("total_features".to_string(), Value::from(total));
        meta.insert("batch_size".to_string(), Value::from(batch_size));
        meta.insert("batches".to_string(), Value::from(self.batches));
        meta.insert("time_range".to_string(), Value::from(time_range.to_string()));
        FeatureCollection::new(self.features, meta)
    }
}
