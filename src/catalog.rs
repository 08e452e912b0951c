//! CSV-backed hostel catalog.
//!
//! The catalog is read-mostly collaborator data: each row is a priced entry
//! whose package price (rent + caution fee + agent fee) is computed at load
//! time and treated as immutable by the booking core.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::Amount;
use crate::model::{Hostel, HostelId, UserId};

/// Errors that can occur when loading the catalog csv.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to open catalog file: {0}")]
    Open(#[source] csv::Error),

    #[error("line {line}: failed to parse row: {source}")]
    Parse { line: usize, source: csv::Error },
}

#[derive(Debug, Deserialize)]
struct HostelRow {
    id: HostelId,
    agent: UserId,
    rent: u64,
    caution_fee: u64,
    agent_fee: u64,
    inspection_fee: u64,
}

/// Read hostel entries from a csv file.
pub fn read_hostels(
    path: impl AsRef<Path>,
) -> Result<impl Iterator<Item = Result<Hostel, CatalogError>>, CatalogError> {
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(CatalogError::Open)?;

    Ok(reader
        .into_deserialize::<HostelRow>()
        .enumerate()
        .map(|(idx, result)| {
            let line = idx + 2; // 1-indexed, skip header
            let row = result.map_err(|source| CatalogError::Parse { line, source })?;
            Ok(Hostel {
                id: row.id,
                agent: row.agent,
                price: Amount::from_minor(row.rent + row.caution_fee + row.agent_fee),
                inspection_fee: Amount::from_minor(row.inspection_fee),
            })
        }))
}

/// In-memory hostel directory keyed by id.
#[derive(Debug, Default)]
pub struct Catalog {
    hostels: HashMap<HostelId, Hostel>,
}

impl Catalog {
    pub fn new(hostels: impl IntoIterator<Item = Hostel>) -> Self {
        Self {
            hostels: hostels.into_iter().map(|h| (h.id, h)).collect(),
        }
    }

    /// Load the catalog from a csv file. Rows that fail to parse are logged
    /// and skipped; a missing or unopenable file is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let mut hostels = HashMap::new();
        for result in read_hostels(path)? {
            match result {
                Ok(hostel) => {
                    hostels.insert(hostel.id, hostel);
                }
                Err(e) => warn!("{e}"),
            }
        }
        Ok(Self { hostels })
    }

    pub fn get(&self, id: HostelId) -> Option<&Hostel> {
        self.hostels.get(&id)
    }

    pub fn len(&self) -> usize {
        self.hostels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hostels.is_empty()
    }
}
