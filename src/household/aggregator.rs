//! Grouping people into households and household-level statistics.

use super::age_groups::{classify, AgeClass};
use super::model::{HouseholdId, HouseholdTable, Person};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Household id to its members, in first-seen order of the ids.
pub type Households = IndexMap<HouseholdId, Vec<Person>>;

/// Group the rows of `table` by their household column.
///
/// Members keep their source row order.
pub fn group_households(table: &HouseholdTable) -> Households {
    let mut households = Households::new();

    for record in table.iter() {
        households
            .entry(record.household.clone())
            .or_default()
            .push(record.person());
    }

    households
}

fn total_people(households: &Households) -> usize {
    households.values().map(Vec::len).sum()
}

/// Average number of people per household; `0.0` when there are none.
pub fn avg_household_size(households: &Households) -> f64 {
    if households.is_empty() {
        return 0.0;
    }
    total_people(households) as f64 / households.len() as f64
}

/// Average number of adults and of children per household.
///
/// People whose age code is neither an adult nor a child code are left out
/// of both counts. `(0.0, 0.0)` when there are no households.
pub fn avg_adults_kids(households: &Households) -> (f64, f64) {
    if households.is_empty() {
        return (0.0, 0.0);
    }

    let (adults, kids) = households
        .values()
        .flatten()
        .fold((0usize, 0usize), |(adults, kids), person| {
            match classify(&person.age) {
                Some(AgeClass::Adult) => (adults + 1, kids),
                Some(AgeClass::Child) => (adults, kids + 1),
                None => (adults, kids),
            }
        });

    let count = households.len() as f64;
    (adults as f64 / count, kids as f64 / count)
}

/// Composition summary of one household dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseholdSummary {
    /// Dataset label, e.g. "synthetic" or "real".
    pub label: String,
    pub households: usize,
    pub people: usize,
    pub avg_size: f64,
    pub avg_adults: f64,
    pub avg_kids: f64,
    /// People whose age code is neither adult nor child.
    pub unclassified: usize,
}

impl HouseholdSummary {
    pub fn from_households(label: &str, households: &Households) -> Self {
        let (avg_adults, avg_kids) = avg_adults_kids(households);
        let unclassified = households
            .values()
            .flatten()
            .filter(|p| classify(&p.age).is_none())
            .count();

        Self {
            label: label.to_string(),
            households: households.len(),
            people: total_people(households),
            avg_size: avg_household_size(households),
            avg_adults,
            avg_kids,
            unclassified,
        }
    }
}
