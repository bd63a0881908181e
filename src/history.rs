//! Saved estimates. A record is a frozen snapshot: it keeps the input it was
//! computed from so it never changes when the default rates or fees do.

use crate::estimate::{aggregate_costs, CostBreakdown, Estimate, EstimateInput};
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Descriptive details of the car; not used in any calculation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CarDetails {
    pub make: String,
    pub model: String,
    pub year: String,
    /// Chassis or model code
    pub code: String,
}

impl CarDetails {
    /// "make model (year)", skipping blank parts
    pub fn description(&self) -> String {
        let name = [self.make.trim(), self.model.trim()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        match (name.is_empty(), self.year.trim()) {
            (true, "") => String::new(),
            (true, year) => year.to_string(),
            (false, "") => name,
            (false, year) => format!("{} ({})", name, year),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("estimate total is zero, nothing to save")]
    ZeroTotal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EstimateRecord {
    /// Milliseconds since the epoch at creation, bumped if already taken
    pub id: i64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub car: CarDetails,
    pub input: EstimateInput,
    pub breakdown: CostBreakdown,
    /// SHA-256 of the input as JSON, hex encoded
    pub fingerprint: String,
}

impl EstimateRecord {
    /// Freeze an input and its breakdown into a record. Estimates that come to
    /// nothing are refused.
    pub fn finalize(
        input: EstimateInput,
        breakdown: CostBreakdown,
        car: CarDetails,
        now: DateTime<Utc>,
    ) -> Result<Self, RecordError> {
        if breakdown.total_cost.is_zero() {
            return Err(RecordError::ZeroTotal);
        }
        let fingerprint = fingerprint(&input);
        Ok(EstimateRecord {
            id: now.timestamp_millis(),
            created_at: now,
            car,
            input,
            breakdown,
            fingerprint,
        })
    }

    pub fn from_estimate(
        estimate: Estimate,
        car: CarDetails,
        now: DateTime<Utc>,
    ) -> Result<Self, RecordError> {
        EstimateRecord::finalize(estimate.input, estimate.breakdown, car, now)
    }

    /// Recompute from the record's own input, FRT schedule included, and
    /// check nothing drifted.
    pub fn is_consistent(&self) -> bool {
        if fingerprint(&self.input) != self.fingerprint {
            log::warn!("estimate {} input does not match its fingerprint", self.id);
            return false;
        }
        let recomputed = aggregate_costs(&self.input);
        if recomputed != self.breakdown {
            log::warn!(
                "estimate {} recomputes to {} but recorded {}",
                self.id,
                recomputed.total_cost,
                self.breakdown.total_cost
            );
            return false;
        }
        true
    }
}

pub fn fingerprint(input: &EstimateInput) -> String {
    let mut hasher = Sha256::new();
    if let Err(err) = serde_json::to_writer(&mut hasher, input) {
        log::warn!("failed to serialize estimate input for fingerprint: {}", err);
    }
    hex::encode(hasher.finalize())
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to access history {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid history file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("no saved estimate with id {0}")]
    NotFound(i64),
}

/// Where saved estimates live. Submitting and reading back are separate
/// steps: a store may accept a record before it shows up in `records`.
pub trait HistoryStore {
    fn submit(&mut self, record: EstimateRecord) -> Result<(), StoreError>;
    /// Every visible record, newest first
    fn records(&self) -> Result<Vec<EstimateRecord>, StoreError>;
    fn delete(&mut self, id: i64) -> Result<(), StoreError>;
}

fn insert_newest(records: &mut Vec<EstimateRecord>, mut record: EstimateRecord) {
    while records.iter().any(|r| r.id == record.id) {
        record.id += 1;
    }
    records.push(record);
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}

fn remove_by_id(records: &mut Vec<EstimateRecord>, id: i64) -> Result<(), StoreError> {
    let position = records
        .iter()
        .position(|r| r.id == id)
        .ok_or(StoreError::NotFound(id))?;
    records.remove(position);
    Ok(())
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Vec<EstimateRecord>,
}

impl HistoryStore for MemoryStore {
    fn submit(&mut self, record: EstimateRecord) -> Result<(), StoreError> {
        insert_newest(&mut self.records, record);
        Ok(())
    }

    fn records(&self) -> Result<Vec<EstimateRecord>, StoreError> {
        Ok(self.records.clone())
    }

    fn delete(&mut self, id: i64) -> Result<(), StoreError> {
        remove_by_id(&mut self.records, id)
    }
}

/// History kept as a JSON array in a single file. A missing file is an empty
/// history.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Vec<EstimateRecord>, StoreError> {
        if !self.path.exists() {
            log::debug!("No history at {}", self.path.display());
            return Ok(Vec::new());
        }
        let file = File::open(&self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        let records: Vec<EstimateRecord> = serde_json::from_reader(BufReader::new(file))
            .map_err(|source| StoreError::Parse {
                path: self.path.clone(),
                source,
            })?;
        log::info!(
            "Loaded {} saved estimates from {}",
            records.len(),
            self.path.display()
        );
        Ok(records)
    }

    fn write(&self, records: &[EstimateRecord]) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(records).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, json).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        log::info!(
            "Saved {} estimates to {}",
            records.len(),
            self.path.display()
        );
        Ok(())
    }
}

impl HistoryStore for JsonFileStore {
    fn submit(&mut self, record: EstimateRecord) -> Result<(), StoreError> {
        let mut records = self.read()?;
        insert_newest(&mut records, record);
        self.write(&records)
    }

    fn records(&self) -> Result<Vec<EstimateRecord>, StoreError> {
        let mut records = self.read()?;
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(records)
    }

    fn delete(&mut self, id: i64) -> Result<(), StoreError> {
        let mut records = self.read()?;
        remove_by_id(&mut records, id)?;
        self.write(&records)
    }
}
