//! Household datasets: loading, grouping and composition statistics.

pub mod age_groups;
pub mod aggregator;
pub mod loader;
pub mod model;

pub use aggregator::{group_households, HouseholdSummary};
pub use loader::{load_house_data, GeographyKey};
