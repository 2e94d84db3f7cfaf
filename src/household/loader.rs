//! Reading household datasets from disk.

use super::model::{HouseholdId, HouseholdRecord, HouseholdTable};
use crate::error::HouseholdError;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Geography a household dataset belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeographyKey {
    /// Two-letter state abbreviation, e.g. "RI"
    pub state: String,
    /// ZIP code tabulation area, e.g. "02809"
    pub zcta: String,
}

impl GeographyKey {
    pub fn new(state: &str, zcta: &str) -> Self {
        Self {
            state: state.to_uppercase(),
            zcta: zcta.to_string(),
        }
    }

    /// `<root>/<STATE>/<zcta>_household.<extension>`
    pub fn household_file(&self, root: &Path, extension: &str) -> PathBuf {
        root.join(&self.state).join(format!(
            "{}_household.{}",
            self.zcta,
            extension.trim_start_matches('.')
        ))
    }
}

/// A CSV row as raw field text. CSV carries no types, so the household id
/// is kept verbatim instead of being guessed into a number.
#[derive(Debug, Deserialize)]
struct CsvRow {
    household: String,
    age: String,
    gender: String,
    ethnicity: String,
}

impl From<CsvRow> for HouseholdRecord {
    fn from(row: CsvRow) -> Self {
        HouseholdRecord {
            household: HouseholdId::Text(row.household),
            age: row.age,
            gender: row.gender,
            ethnicity: row.ethnicity,
        }
    }
}

fn read_csv(path: &Path) -> Result<Vec<HouseholdRecord>, HouseholdError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| match e.into_kind() {
            csv::ErrorKind::Io(source) => HouseholdError::Io {
                path: path.to_path_buf(),
                source,
            },
            other => HouseholdError::Deserialize {
                path: path.to_path_buf(),
                message: format!("{:?}", other),
            },
        })?;

    reader
        .deserialize::<CsvRow>()
        .map(|row| row.map(HouseholdRecord::from))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| HouseholdError::Deserialize {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

fn read_json(path: &Path) -> Result<Vec<HouseholdRecord>, HouseholdError> {
    let file = File::open(path).map_err(|source| HouseholdError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_reader(BufReader::new(file)).map_err(|e| HouseholdError::Deserialize {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Read one household dataset; the format follows the file extension.
pub fn read_household_table(path: &Path) -> Result<HouseholdTable, HouseholdError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    let table = HouseholdTable::new(match extension.as_deref() {
        Some("csv") => read_csv(path)?,
        Some("json") => read_json(path)?,
        _ => return Err(HouseholdError::UnsupportedFormat(path.to_path_buf())),
    });

    debug!("Read {} household rows from {}", table.len(), path.display());
    if table.is_empty() {
        warn!("Household dataset {} has no rows", path.display());
    }
    Ok(table)
}

/// Load the synthetic and the real household datasets.
pub fn load_house_data(
    synthetic_path: &Path,
    real_path: &Path,
) -> Result<(HouseholdTable, HouseholdTable), HouseholdError> {
    info!("Loading synthetic households from {}", synthetic_path.display());
    let synthetic = read_household_table(synthetic_path)?;

    info!("Loading real households from {}", real_path.display());
    let real = read_household_table(real_path)?;

    Ok((synthetic, real))
}
