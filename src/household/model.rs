//! Household dataset rows.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Household identifier as found in the data: an integer or a string.
///
/// Ids are opaque. Values that are not an `i64` keep their source text, so
/// `"01"` and `1` are different households.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum HouseholdId {
    Number(i64),
    Text(String),
}

struct HouseholdIdVisitor;

impl<'de> Visitor<'de> for HouseholdIdVisitor {
    type Value = HouseholdId;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an integer or string household id")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<HouseholdId, E> {
        Ok(HouseholdId::Number(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<HouseholdId, E> {
        Ok(i64::try_from(v)
            .map(HouseholdId::Number)
            .unwrap_or_else(|_| HouseholdId::Text(v.to_string())))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<HouseholdId, E> {
        Ok(HouseholdId::Text(format!("{:?}", v)))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<HouseholdId, E> {
        Ok(HouseholdId::Text(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<HouseholdId, E> {
        Ok(HouseholdId::Text(v))
    }
}

impl<'de> Deserialize<'de> for HouseholdId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(HouseholdIdVisitor)
    }
}

impl fmt::Display for HouseholdId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HouseholdId::Number(n) => write!(f, "{}", n),
            HouseholdId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for HouseholdId {
    fn from(n: i64) -> Self {
        HouseholdId::Number(n)
    }
}

impl From<&str> for HouseholdId {
    fn from(s: &str) -> Self {
        HouseholdId::Text(s.to_string())
    }
}

/// One person: (age-group code, gender, ethnicity).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Person {
    pub age: String,
    pub gender: String,
    pub ethnicity: String,
}

impl Person {
    pub fn new(age: &str, gender: &str, ethnicity: &str) -> Self {
        Self {
            age: age.to_string(),
            gender: gender.to_string(),
            ethnicity: ethnicity.to_string(),
        }
    }
}

/// Accept categorical codes written either as strings or as numbers.
fn code<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
        Raw::Float(x) => x.to_string(),
    })
}

/// One row of a household dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseholdRecord {
    pub household: HouseholdId,
    #[serde(deserialize_with = "code")]
    pub age: String,
    #[serde(deserialize_with = "code")]
    pub gender: String,
    #[serde(deserialize_with = "code")]
    pub ethnicity: String,
}

impl HouseholdRecord {
    pub fn person(&self) -> Person {
        Person::new(&self.age, &self.gender, &self.ethnicity)
    }
}

/// A deserialized household dataset, rows in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HouseholdTable {
    pub records: Vec<HouseholdRecord>,
}

impl HouseholdTable {
    pub fn new(records: Vec<HouseholdRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HouseholdRecord> {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_household_id_from_json() {
        let ids: Vec<HouseholdId> = serde_json::from_str(r#"[7, "h-12"]"#).unwrap();
        assert_eq!(ids, vec![HouseholdId::Number(7), HouseholdId::from("h-12")]);
        assert_eq!(ids[0].to_string(), "7");
    }

    #[test]
    fn test_household_id_outside_i64_keeps_text() {
        let ids: Vec<HouseholdId> =
            serde_json::from_str(r#"[12345678901234567890, 1.0, "01", 1]"#).unwrap();
        assert_eq!(
            ids,
            vec![
                HouseholdId::from("12345678901234567890"),
                HouseholdId::from("1.0"),
                HouseholdId::from("01"),
                HouseholdId::Number(1),
            ]
        );
    }

    #[test]
    fn test_numeric_codes_accepted() {
        let record: HouseholdRecord = serde_json::from_str(
            r#"{"household": 3, "age": "25t29", "gender": 1, "ethnicity": "white"}"#,
        )
        .unwrap();
        assert_eq!(record.gender, "1");
        assert_eq!(record.person(), Person::new("25t29", "1", "white"));
    }
}
