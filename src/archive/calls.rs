use tracing::{info, warn};

use super::store::{SharedStore, StoreError};
use super::types::CallRecord;

pub const ARCHIVE_KEY: &str = "elderShield_savedCalls";
pub const DEFAULT_ARCHIVE_LIMIT: usize = 20;

/// Bounded, newest-first list of saved calls kept under [`ARCHIVE_KEY`].
///
/// Every mutation is a full read-modify-write of the stored list. A missing
/// or unparsable value reads as an empty archive.
#[derive(Clone)]
pub struct CallArchive {
    store: SharedStore,
    limit: usize,
}

impl CallArchive {
    pub fn new(store: SharedStore) -> Self {
        Self::with_limit(store, DEFAULT_ARCHIVE_LIMIT)
    }

    pub fn with_limit(store: SharedStore, limit: usize) -> Self {
        Self { store, limit }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn list(&self) -> Vec<CallRecord> {
        let raw = match self.store.get(ARCHIVE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("call archive unreadable, treating as empty: {}", e);
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<CallRecord>>(&raw) {
            Ok(records) => records,
            Err(e) => {
                warn!("call archive corrupt, treating as empty: {}", e);
                Vec::new()
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<CallRecord> {
        self.list().into_iter().find(|r| r.id == id)
    }

    /// Prepends `record` and keeps only the newest `limit` entries.
    pub fn save(&self, record: CallRecord) -> Result<(), StoreError> {
        let mut records = self.list();
        let id = record.id.clone();
        records.insert(0, record);
        let dropped = records.len().saturating_sub(self.limit);
        records.truncate(self.limit);

        self.write(&records)?;
        info!(id = %id, total = records.len(), dropped, "call saved to archive");
        Ok(())
    }

    /// Removes the record with `id`. Returns false, without writing, if absent.
    pub fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let mut records = self.list();
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            return Ok(false);
        }

        self.write(&records)?;
        info!(id, remaining = records.len(), "call deleted from archive");
        Ok(true)
    }

    fn write(&self, records: &[CallRecord]) -> Result<(), StoreError> {
        let json = serde_json::to_string(records)?;
        self.store.set(ARCHIVE_KEY, &json)
    }
}
