use crate::tables::error::TableError;
use crate::tables::{drop_if_present, require_column, with_null_columns, ROW_INDEX};
use polars::prelude::*;

/// Location attributes carried onto every daily value.
pub const LOCATION_COLUMNS: [&str; 6] = [
    "agency_name",
    "monitoring_location_name",
    "country_name",
    "state_name",
    "county_name",
    "site_type",
];

const LOCATION_KEY: &str = "__location_id";

/// Left-joins location attributes onto daily values by location ID.
///
/// Every daily-value row survives, in its original order; rows whose location
/// is unknown get nulls in the location columns. Duplicate location IDs are
/// collapsed to their first occurrence so the join cannot fan out.
pub fn join_daily_values_with_locations(
    daily_values: &DataFrame,
    locations: &DataFrame,
) -> Result<DataFrame, TableError> {
    require_column(daily_values, "daily values", "monitoring_location_id")?;
    require_column(locations, "locations", "id")?;
    let locations = with_null_columns(locations, &LOCATION_COLUMNS)?;

    let mut selection = vec![col("id").cast(DataType::String).alias(LOCATION_KEY)];
    selection.extend(LOCATION_COLUMNS.iter().map(|name| col(*name)));
    let first_of_each: Vec<Expr> = LOCATION_COLUMNS
        .iter()
        .map(|name| col(*name).first())
        .collect();

    let location_attributes = locations
        .lazy()
        .select(selection)
        .group_by_stable([col(LOCATION_KEY)])
        .agg(first_of_each);

    let joined = daily_values
        .clone()
        .lazy()
        .with_row_index(ROW_INDEX, None)
        .with_column(col("monitoring_location_id").cast(DataType::String))
        .join(
            location_attributes,
            [col("monitoring_location_id")],
            [col(LOCATION_KEY)],
            JoinArgs::new(JoinType::Left),
        )
        .sort_by_exprs([col(ROW_INDEX)], SortMultipleOptions::default())
        .collect()?;

    drop_if_present(joined, &[ROW_INDEX, LOCATION_KEY])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn daily_values() -> DataFrame {
        df!(
            "id" => ["dv-1", "dv-2", "dv-3"],
            "monitoring_location_id" => ["USGS-1", "USGS-404", "USGS-2"],
            "value" => ["1.0", "2.0", "3.0"],
        )
        .unwrap()
    }

    fn locations() -> DataFrame {
        df!(
            "id" => ["USGS-2", "USGS-1", "USGS-1"],
            "agency_name" => ["U.S. Geological Survey", "U.S. Geological Survey", "Duplicate"],
            "monitoring_location_name" => ["RIO CHAMA NR CHAMITA, NM", "RIO GRANDE AT OTOWI BRIDGE, NM", "Duplicate"],
            "country_name" => ["United States of America"; 3],
            "state_name" => ["New Mexico"; 3],
            "county_name" => ["Rio Arriba County", "Santa Fe County", "Duplicate"],
            "site_type" => ["Stream"; 3],
            "altitude" => [1.0, 2.0, 3.0],
        )
        .unwrap()
    }

    #[test]
    fn keeps_every_daily_value_in_order() {
        let joined = join_daily_values_with_locations(&daily_values(), &locations()).unwrap();

        assert_eq!(joined.height(), 3);
        let ids = joined.column("id").unwrap().str().unwrap();
        assert_eq!(
            ids.into_iter().collect::<Vec<_>>(),
            vec![Some("dv-1"), Some("dv-2"), Some("dv-3")]
        );
        let names = joined.column("monitoring_location_name").unwrap().str().unwrap();
        assert_eq!(names.get(0), Some("RIO GRANDE AT OTOWI BRIDGE, NM"));
        assert_eq!(names.get(2), Some("RIO CHAMA NR CHAMITA, NM"));
    }

    #[test]
    fn unmatched_locations_get_nulls() {
        let joined = join_daily_values_with_locations(&daily_values(), &locations()).unwrap();

        for column in LOCATION_COLUMNS {
            assert!(
                joined.column(column).unwrap().get(1).unwrap().is_null(),
                "{column} should be null for an unknown location"
            );
        }
    }

    #[test]
    fn brings_in_only_the_selected_columns() {
        let joined = join_daily_values_with_locations(&daily_values(), &locations()).unwrap();

        assert_eq!(
            joined.get_column_names_str(),
            [
                "id",
                "monitoring_location_id",
                "value",
                "agency_name",
                "monitoring_location_name",
                "country_name",
                "state_name",
                "county_name",
                "site_type",
            ]
        );
    }

    #[test]
    fn duplicate_location_ids_do_not_fan_out() {
        let joined = join_daily_values_with_locations(&daily_values(), &locations()).unwrap();

        let agencies = joined.column("agency_name").unwrap().str().unwrap();
        assert_eq!(agencies.get(0), Some("U.S. Geological Survey"));
    }

    #[test]
    fn missing_location_attributes_become_null_columns() {
        let sparse = df!("id" => ["USGS-1"], "site_type" => ["Stream"]).unwrap();

        let joined = join_daily_values_with_locations(&daily_values(), &sparse).unwrap();

        let site_type = joined.column("site_type").unwrap().str().unwrap();
        assert_eq!(site_type.get(0), Some("Stream"));
        assert!(joined.column("state_name").unwrap().get(0).unwrap().is_null());
    }

    #[test]
    fn missing_join_key_is_an_error() {
        let no_key = df!("value" => ["1.0"]).unwrap();

        let err = join_daily_values_with_locations(&no_key, &locations()).unwrap_err();

        assert!(matches!(err, TableError::MissingColumn { column, .. } if column == "monitoring_location_id"));
    }
}
