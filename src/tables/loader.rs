//! Turns a cached feature collection into a flat, properties-only table.

use crate::tables::error::TableError;
use crate::types::feature_collection::FeatureCollection;
use polars::prelude::*;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;

/// Loads the collection stored at `path` as one row per feature and one column
/// per properties key.
pub fn collection_to_frame(path: &Path) -> Result<DataFrame, TableError> {
    let text =
        std::fs::read_to_string(path).map_err(|e| TableError::Read(path.to_path_buf(), e))?;
    let value: Value =
        serde_json::from_str(&text).map_err(|e| TableError::Decode(path.to_path_buf(), e))?;
    features_to_frame(FeatureCollection::from_value(value).features())
}

/// Flattens the `properties` of each feature into columns.
///
/// Nested objects become dotted column names (`a.b`). Geometry and anything
/// else outside `properties` is dropped. Columns appear in first-seen order.
pub fn features_to_frame(features: &[Value]) -> Result<DataFrame, TableError> {
    let mut names: Vec<String> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut cells: Vec<Vec<Option<&Value>>> = Vec::new();

    for (row, feature) in features.iter().enumerate() {
        let mut flat = Vec::new();
        if let Some(Value::Object(props)) = feature.get("properties") {
            flatten("", props, &mut flat);
        }
        for (name, value) in flat {
            let col_idx = *index.entry(name.clone()).or_insert_with(|| {
                names.push(name);
                cells.push(Vec::new());
                cells.len() - 1
            });
            let column = &mut cells[col_idx];
            if column.len() > row {
                column[row] = Some(value);
            } else {
                column.resize(row, None);
                column.push(Some(value));
            }
        }
    }

    let height = features.len();
    let columns: Vec<Column> = names
        .iter()
        .zip(cells.iter_mut())
        .map(|(name, column)| {
            column.resize(height, None);
            build_column(name, column)
        })
        .collect();

    Ok(DataFrame::new_with_height(height, columns)?)
}

fn flatten<'a>(prefix: &str, map: &'a Map<String, Value>, out: &mut Vec<(String, &'a Value)>) {
    for (key, value) in map {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            Value::Object(nested) if !nested.is_empty() => flatten(&name, nested, out),
            Value::Object(_) => {}
            other => out.push((name, other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Boolean,
    Integer,
    Float,
    Text,
}

fn infer_kind(cells: &[Option<&Value>]) -> Kind {
    let mut present = cells.iter().flatten().filter(|v| !v.is_null()).peekable();
    if present.peek().is_none() {
        return Kind::Text;
    }
    let mut kind = None;
    for value in present {
        let this = match value {
            Value::Bool(_) => Kind::Boolean,
            Value::Number(n) if n.is_i64() => Kind::Integer,
            Value::Number(_) => Kind::Float,
            _ => return Kind::Text,
        };
        kind = Some(match (kind, this) {
            (None, k) => k,
            (Some(a), b) if a == b => a,
            (Some(Kind::Integer), Kind::Float) | (Some(Kind::Float), Kind::Integer) => Kind::Float,
            _ => return Kind::Text,
        });
    }
    kind.unwrap_or(Kind::Text)
}

fn build_column(name: &str, cells: &[Option<&Value>]) -> Column {
    let name: PlSmallStr = name.into();
    match infer_kind(cells) {
        Kind::Boolean => Column::new(
            name,
            cells.iter().map(|c| c.and_then(Value::as_bool)).collect::<Vec<_>>(),
        ),
        Kind::Integer => Column::new(
            name,
            cells.iter().map(|c| c.and_then(Value::as_i64)).collect::<Vec<_>>(),
        ),
        Kind::Float => Column::new(
            name,
            cells.iter().map(|c| c.and_then(Value::as_f64)).collect::<Vec<_>>(),
        ),
        Kind::Text => Column::new(
            name,
            cells.iter().map(|c| c.and_then(cell_text)).collect::<Vec<_>>(),
        ),
    }
}

fn cell_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Daily values and locations, loaded from their cache files.
pub fn load_daily_values_and_locations(
    daily_values_path: &Path,
    locations_path: &Path,
) -> Result<(DataFrame, DataFrame), TableError> {
    Ok((
        collection_to_frame(daily_values_path)?,
        collection_to_frame(locations_path)?,
    ))
}

/// Parameter-code and statistic-code lookup tables.
pub fn load_lookup_tables(
    parameter_codes_path: &Path,
    statistic_codes_path: &Path,
) -> Result<(DataFrame, DataFrame), TableError> {
    Ok((
        collection_to_frame(parameter_codes_path)?,
        collection_to_frame(statistic_codes_path)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn features(value: Value) -> Vec<Value> {
        match value {
            Value::Array(items) => items,
            _ => Vec::new(),
        }
    }

    #[test]
    fn one_row_per_feature_one_column_per_property() {
        let df = features_to_frame(&features(json!([
            {"type": "Feature", "id": "f1", "geometry": {"type": "Point", "coordinates": [1, 2]},
             "properties": {"id": "dv-1", "value": "3.5", "parameter_code": "00060"}},
            {"type": "Feature", "id": "f2",
             "properties": {"id": "dv-2", "value": "4.0", "qualifier": "ICE"}},
        ])))
        .unwrap();

        assert_eq!(df.height(), 2);
        assert_eq!(
            df.get_column_names_str(),
            ["id", "value", "parameter_code", "qualifier"]
        );
        let qualifier = df.column("qualifier").unwrap().str().unwrap();
        assert_eq!(qualifier.get(0), None);
        assert_eq!(qualifier.get(1), Some("ICE"));
        let code = df.column("parameter_code").unwrap().str().unwrap();
        assert_eq!(code.get(1), None);
    }

    #[test]
    fn nested_properties_get_dotted_names() {
        let df = features_to_frame(&features(json!([
            {"properties": {"site": {"name": "Rio Grande", "huc": {"code": "1302"}}}},
        ])))
        .unwrap();

        assert_eq!(df.get_column_names_str(), ["site.name", "site.huc.code"]);
    }

    #[test]
    fn infers_column_types() {
        let df = features_to_frame(&features(json!([
            {"properties": {"count": 1, "ratio": 1, "flag": true, "mixed": 1, "empty": null, "tags": ["a"]}},
            {"properties": {"count": 2, "ratio": 2.5, "flag": false, "mixed": "x", "empty": null, "tags": []}},
        ])))
        .unwrap();

        assert_eq!(df.column("count").unwrap().dtype(), &DataType::Int64);
        assert_eq!(df.column("ratio").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("flag").unwrap().dtype(), &DataType::Boolean);
        assert_eq!(df.column("mixed").unwrap().dtype(), &DataType::String);
        assert_eq!(df.column("empty").unwrap().dtype(), &DataType::String);
        let tags = df.column("tags").unwrap().str().unwrap();
        assert_eq!(tags.get(0), Some(r#"["a"]"#));
        let mixed = df.column("mixed").unwrap().str().unwrap();
        assert_eq!(mixed.get(0), Some("1"));
    }

    #[test]
    fn features_without_properties_still_make_rows() {
        let df = features_to_frame(&features(json!([
            {"properties": {"a": "x"}},
            {"geometry": null},
            {"properties": {"a": "z"}},
        ])))
        .unwrap();

        assert_eq!(df.height(), 3);
        let a = df.column("a").unwrap().str().unwrap();
        assert_eq!(a.get(1), None);
        assert_eq!(a.get(2), Some("z"));
    }

    #[test]
    fn keeps_one_row_per_feature_without_any_properties() {
        let df = features_to_frame(&features(json!([
            {"type": "Feature", "id": "USGS-1"},
            {"type": "Feature", "id": "USGS-2", "properties": {}},
        ])))
        .unwrap();

        assert_eq!(df.shape(), (2, 0));
    }

    #[test]
    fn loads_from_a_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("codes.json");
        std::fs::write(
            &path,
            json!({"features": [{"properties": {"id": "00060", "parameter_name": "Discharge"}}]})
                .to_string(),
        )
        .unwrap();

        let df = collection_to_frame(&path).unwrap();

        assert_eq!(df.shape(), (1, 2));
        assert!(matches!(
            collection_to_frame(&dir.path().join("missing.json")),
            Err(TableError::Read(..))
        ));
    }
}
