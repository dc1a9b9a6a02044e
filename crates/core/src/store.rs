//! Storage collaborators.
//!
//! The core never owns persistence. It talks to storage through [`RecordStore`] and to the
//! identifier type catalogue through [`IdentifierTypeDirectory`]. Both are held behind
//! `Arc<dyn Trait + Send + Sync>` by the services.
//!
//! [`InMemoryRecordStore`] backs the CLI and the tests; it can be seeded from, and written
//! back to, a YAML fixture of [`PatientRecord`]s.

use crate::config::CoreConfig;
use crate::constants::NHS_NUMBER_SYSTEM;
use crate::record::PatientRecord;
use carelink_types::NhsNumber;
use carelink_uuid::RecordId;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::RwLock;

/// Errors raised by storage collaborators.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record store lock poisoned")]
    LockPoisoned,

    #[error("failed to read record fixture: {0}")]
    FixtureRead(std::io::Error),

    #[error("failed to write record fixture: {0}")]
    FixtureWrite(std::io::Error),

    #[error("invalid record fixture: {0}")]
    FixtureFormat(serde_yaml::Error),

    #[error("duplicate record id in fixture: {0}")]
    DuplicateId(RecordId),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Record persistence as seen by the core.
pub trait RecordStore {
    fn find_by_id(&self, id: &RecordId) -> StoreResult<Option<PatientRecord>>;

    /// Persists `record`, replacing any record with the same id.
    fn save(&self, record: PatientRecord) -> StoreResult<RecordId>;

    fn find_by_identifier(&self, system: &str, value: &str) -> StoreResult<Vec<PatientRecord>>;
}

/// A known identifier type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdentifierType {
    pub system: String,
}

/// Catalogue of identifier systems the service recognises.
pub trait IdentifierTypeDirectory {
    fn lookup_identifier_type(&self, system: &str) -> Option<IdentifierType>;
}

/// Identifier type directory built from configuration.
#[derive(Clone, Debug)]
pub struct KnownIdentifierTypes {
    systems: HashSet<String>,
}

impl KnownIdentifierTypes {
    pub fn new<I, S>(systems: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            systems: systems.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_config(cfg: &CoreConfig) -> Self {
        Self::new(cfg.identifier_systems().iter().map(ToString::to_string))
    }
}

impl IdentifierTypeDirectory for KnownIdentifierTypes {
    fn lookup_identifier_type(&self, system: &str) -> Option<IdentifierType> {
        if self.systems.contains(system) {
            Some(IdentifierType {
                system: system.to_string(),
            })
        } else {
            tracing::debug!(system, "identifier system not in directory");
            None
        }
    }
}

/// Record store held entirely in memory.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    records: RwLock<BTreeMap<RecordId, PatientRecord>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a store from records, rejecting duplicate ids.
    pub fn with_records(records: Vec<PatientRecord>) -> StoreResult<Self> {
        let mut map = BTreeMap::new();
        for record in records {
            let id = record.id.clone();
            if map.insert(id.clone(), record).is_some() {
                return Err(StoreError::DuplicateId(id));
            }
        }
        Ok(Self {
            records: RwLock::new(map),
        })
    }

    /// Parses a YAML sequence of records.
    pub fn from_yaml(yaml_text: &str) -> StoreResult<Self> {
        let records: Vec<PatientRecord> =
            serde_yaml::from_str(yaml_text).map_err(StoreError::FixtureFormat)?;
        Self::with_records(records)
    }

    /// Loads a fixture file. A missing file yields an empty store.
    pub fn load(path: &Path) -> StoreResult<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "record fixture missing, starting empty");
            return Ok(Self::new());
        }
        let text = std::fs::read_to_string(path).map_err(StoreError::FixtureRead)?;
        Self::from_yaml(&text)
    }

    /// Renders every record, ordered by id.
    pub fn to_yaml(&self) -> StoreResult<String> {
        let records = self.records.read().map_err(|_| StoreError::LockPoisoned)?;
        let list: Vec<&PatientRecord> = records.values().collect();
        serde_yaml::to_string(&list).map_err(StoreError::FixtureFormat)
    }

    pub fn write_to(&self, path: &Path) -> StoreResult<()> {
        let yaml = self.to_yaml()?;
        std::fs::write(path, yaml).map_err(StoreError::FixtureWrite)
    }

    pub fn len(&self) -> StoreResult<usize> {
        let records = self.records.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(records.len())
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }
}

impl RecordStore for InMemoryRecordStore {
    fn find_by_id(&self, id: &RecordId) -> StoreResult<Option<PatientRecord>> {
        let records = self.records.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(records.get(id).cloned())
    }

    fn save(&self, record: PatientRecord) -> StoreResult<RecordId> {
        let mut records = self.records.write().map_err(|_| StoreError::LockPoisoned)?;
        let id = record.id.clone();
        records.insert(id.clone(), record);
        Ok(id)
    }

    fn find_by_identifier(&self, system: &str, value: &str) -> StoreResult<Vec<PatientRecord>> {
        if system != NHS_NUMBER_SYSTEM {
            return Ok(Vec::new());
        }
        let records = self.records.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(records
            .values()
            .filter(|r| r.nhs_number.as_ref().map(NhsNumber::as_str) == Some(value))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::SDS_USER_ID_SYSTEM;

    fn record_with_nhs(nhs: &str) -> PatientRecord {
        PatientRecord {
            nhs_number: Some(NhsNumber::parse(nhs).expect("nhs number")),
            ..PatientRecord::new(RecordId::new())
        }
    }

    #[test]
    fn save_then_find_by_id() {
        let store = InMemoryRecordStore::new();
        let record = record_with_nhs("9000000009");
        let id = store.save(record.clone()).expect("save");

        assert_eq!(store.find_by_id(&id).expect("find"), Some(record));
        assert_eq!(store.find_by_id(&RecordId::new()).expect("find"), None);
        assert_eq!(store.len().expect("len"), 1);
    }

    #[test]
    fn find_by_identifier_matches_nhs_number_only() {
        let store = InMemoryRecordStore::new();
        store.save(record_with_nhs("9000000009")).expect("save");
        store.save(record_with_nhs("9000000017")).expect("save");

        let found = store
            .find_by_identifier(NHS_NUMBER_SYSTEM, "9000000009")
            .expect("search");
        assert_eq!(found.len(), 1);

        let found = store
            .find_by_identifier(SDS_USER_ID_SYSTEM, "9000000009")
            .expect("search");
        assert!(found.is_empty());
    }

    #[test]
    fn fixture_round_trips_through_file() {
        let store = InMemoryRecordStore::new();
        store.save(record_with_nhs("9000000009")).expect("save");

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("records.yaml");
        store.write_to(&path).expect("write");

        let reloaded = InMemoryRecordStore::load(&path).expect("load");
        assert_eq!(reloaded.len().expect("len"), 1);
        assert_eq!(
            reloaded.to_yaml().expect("yaml"),
            store.to_yaml().expect("yaml")
        );
    }

    #[test]
    fn missing_fixture_yields_empty_store() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = InMemoryRecordStore::load(&dir.path().join("absent.yaml")).expect("load");
        assert!(store.is_empty().expect("is_empty"));
    }

    #[test]
    fn poisoned_lock_is_reported_not_hidden() {
        let store = std::sync::Arc::new(InMemoryRecordStore::new());
        store.save(record_with_nhs("9000000009")).expect("save");

        let holder = std::sync::Arc::clone(&store);
        let joined = std::thread::spawn(move || {
            let _guard = holder.records.write().expect("lock");
            panic!("writer died holding the lock");
        })
        .join();
        assert!(joined.is_err());

        assert!(matches!(store.len(), Err(StoreError::LockPoisoned)));
        assert!(matches!(store.is_empty(), Err(StoreError::LockPoisoned)));
        assert!(matches!(
            store.find_by_id(&RecordId::new()),
            Err(StoreError::LockPoisoned)
        ));
    }

    #[test]
    fn fixture_rejects_duplicate_ids() {
        let yaml = "- id: 2db211f12a6a4a1e8b8a1c6b1b5c6f10\n- id: 2db211f12a6a4a1e8b8a1c6b1b5c6f10\n";
        let err = InMemoryRecordStore::from_yaml(yaml).expect_err("duplicate");
        assert!(matches!(err, StoreError::DuplicateId(_)));
    }

    #[test]
    fn directory_knows_configured_systems() {
        let directory = KnownIdentifierTypes::from_config(&CoreConfig::default());
        assert_eq!(
            directory.lookup_identifier_type(NHS_NUMBER_SYSTEM),
            Some(IdentifierType {
                system: NHS_NUMBER_SYSTEM.to_string()
            })
        );
        assert_eq!(directory.lookup_identifier_type("urn:unknown"), None);
    }
}
