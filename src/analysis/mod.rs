//! Console reporting over the cleaned dataset.

pub mod summary;
