pub mod feature_collection;
pub mod time_range;
