//! Record store
//!
//! Keeps committed rows per entity type, optionally backed by a JSON file that
//! is rewritten atomically on every commit. Surrogate row ids are sequential
//! per entity type and never reused.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::change_set::Row;
use super::database::{CommitReport, RowRef};
use super::file_io::{read_json, write_json_atomic};
use super::pending::{PendingBatch, PendingChange};
use crate::clock::Timestamp;
use crate::error::{ChronicleError, ChronicleResult};
use crate::models::RowId;
use crate::tracking::Entity;

/// One committed row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRow {
    pub id: RowId,
    pub fields: Row,
    /// Logical identity shared by all versions of a versioned record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logical_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_time: Option<Timestamp>,
}

#[derive(Debug, Clone, Default)]
struct Table {
    last_id: u64,
    rows: BTreeMap<RowId, StoredRow>,
}

/// Serializable store data structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreData {
    tables: Vec<TableData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TableData {
    entity_type: String,
    last_id: u64,
    rows: Vec<StoredRow>,
}

/// Read access the commit hooks need
pub trait VersionLookup {
    /// Effective time of the latest committed version of a logical record
    fn latest_effective_time(&self, entity_type: &str, logical_key: &str) -> Option<Timestamp>;
}

/// Committed rows of every entity type
#[derive(Debug, Default)]
pub struct RecordStore {
    path: Option<PathBuf>,
    tables: BTreeMap<String, Table>,
}

impl RecordStore {
    /// Create a store that lives only in memory
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Create a store backed by a JSON file (call `load` to read it)
    pub fn with_file(path: PathBuf) -> Self {
        Self {
            path: Some(path),
            tables: BTreeMap::new(),
        }
    }

    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }

    /// Load rows from the backing file, if any
    pub fn load(&mut self) -> ChronicleResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let data: StoreData = read_json(path)?;
        self.tables = data
            .tables
            .into_iter()
            .map(|table| {
                let rows = table.rows.into_iter().map(|row| (row.id, row)).collect();
                (
                    table.entity_type,
                    Table {
                        last_id: table.last_id,
                        rows,
                    },
                )
            })
            .collect();

        tracing::debug!(path = %path.display(), tables = self.tables.len(), "record store loaded");
        Ok(())
    }

    /// Write rows to the backing file, if any
    pub fn save(&self) -> ChronicleResult<()> {
        match &self.path {
            Some(path) => write_json_atomic(path, &Self::to_data(&self.tables)),
            None => Ok(()),
        }
    }

    fn to_data(tables: &BTreeMap<String, Table>) -> StoreData {
        StoreData {
            tables: tables
                .iter()
                .map(|(entity_type, table)| TableData {
                    entity_type: entity_type.clone(),
                    last_id: table.last_id,
                    rows: table.rows.values().cloned().collect(),
                })
                .collect(),
        }
    }

    /// Get a raw row by id
    pub fn find_row(&self, entity_type: &str, id: RowId) -> Option<&StoredRow> {
        self.tables.get(entity_type)?.rows.get(&id)
    }

    /// All rows of one entity type, in id order
    pub fn rows_of(&self, entity_type: &str) -> Vec<&StoredRow> {
        self.tables
            .get(entity_type)
            .map(|table| table.rows.values().collect())
            .unwrap_or_default()
    }

    /// Count rows of one entity type
    pub fn count(&self, entity_type: &str) -> usize {
        self.tables
            .get(entity_type)
            .map(|table| table.rows.len())
            .unwrap_or(0)
    }

    /// Load an entity by id
    pub fn find<E>(&self, id: RowId) -> ChronicleResult<Option<E>>
    where
        E: Entity + DeserializeOwned,
    {
        self.find_row(E::ENTITY_TYPE, id)
            .map(Self::hydrate::<E>)
            .transpose()
    }

    /// Load an entity by id, failing if it does not exist
    pub fn get<E>(&self, id: RowId) -> ChronicleResult<E>
    where
        E: Entity + DeserializeOwned,
    {
        self.find(id)?
            .ok_or_else(|| ChronicleError::row_not_found(E::ENTITY_TYPE, id.to_string()))
    }

    /// Load every entity of one type
    pub fn all<E>(&self) -> ChronicleResult<Vec<E>>
    where
        E: Entity + DeserializeOwned,
    {
        self.rows_of(E::ENTITY_TYPE)
            .into_iter()
            .map(Self::hydrate::<E>)
            .collect()
    }

    fn hydrate<E>(row: &StoredRow) -> ChronicleResult<E>
    where
        E: Entity + DeserializeOwned,
    {
        let mut entity: E = serde_json::from_value(serde_json::Value::Object(row.fields.clone()))
            .map_err(|e| {
                ChronicleError::Storage(format!(
                    "Failed to decode {} row {}: {}",
                    E::ENTITY_TYPE,
                    row.id,
                    e
                ))
            })?;
        entity.assign_row_id(Some(row.id));
        Ok(entity)
    }

    /// Every version of a logical record, oldest effective time first
    pub fn versions_of(&self, entity_type: &str, logical_key: &str) -> Vec<&StoredRow> {
        let mut versions: Vec<_> = self
            .rows_of(entity_type)
            .into_iter()
            .filter(|row| row.logical_key.as_deref() == Some(logical_key))
            .collect();
        versions.sort_by_key(|row| (row.effective_time, row.id));
        versions
    }

    /// Version with the greatest effective time
    pub fn latest_version(&self, entity_type: &str, logical_key: &str) -> Option<&StoredRow> {
        self.versions_of(entity_type, logical_key).pop()
    }

    /// Version in force at `now`; versions effective in the future are skipped
    pub fn current_version(
        &self,
        entity_type: &str,
        logical_key: &str,
        now: Timestamp,
    ) -> Option<&StoredRow> {
        self.version_effective_at(entity_type, logical_key, now)
    }

    /// Version that was authoritative at `at`
    pub fn version_effective_at(
        &self,
        entity_type: &str,
        logical_key: &str,
        at: Timestamp,
    ) -> Option<&StoredRow> {
        self.versions_of(entity_type, logical_key)
            .into_iter()
            .filter(|row| row.effective_time.is_some_and(|t| t <= at))
            .last()
    }

    /// Typed form of `versions_of`
    pub fn versions<E>(&self, logical_key: &str) -> ChronicleResult<Vec<E>>
    where
        E: Entity + DeserializeOwned,
    {
        self.versions_of(E::ENTITY_TYPE, logical_key)
            .into_iter()
            .map(Self::hydrate::<E>)
            .collect()
    }

    /// Typed form of `latest_version`
    pub fn latest<E>(&self, logical_key: &str) -> ChronicleResult<Option<E>>
    where
        E: Entity + DeserializeOwned,
    {
        self.latest_version(E::ENTITY_TYPE, logical_key)
            .map(Self::hydrate::<E>)
            .transpose()
    }

    /// Typed form of `version_effective_at`
    pub fn effective_at<E>(&self, logical_key: &str, at: Timestamp) -> ChronicleResult<Option<E>>
    where
        E: Entity + DeserializeOwned,
    {
        self.version_effective_at(E::ENTITY_TYPE, logical_key, at)
            .map(Self::hydrate::<E>)
            .transpose()
    }

    /// Write a prepared batch, all or nothing
    ///
    /// Every change is staged on a copy of the tables and the copy is
    /// persisted before it replaces the live tables. Row ids are handed to
    /// inserted entities only once the whole batch has succeeded.
    pub(crate) fn apply(&mut self, batch: PendingBatch<'_>) -> ChronicleResult<CommitReport> {
        let mut staged = self.tables.clone();
        let mut report = CommitReport::default();
        let mut assigned = Vec::new();

        for change in batch.into_changes() {
            match change {
                PendingChange::Insert { entity, change_set } => {
                    let entity_type = entity.entity_type();
                    let table = staged.entry(entity_type.to_string()).or_default();
                    table.last_id += 1;
                    let id = RowId::new(table.last_id);

                    let versioned = entity.as_versioned();
                    let row = StoredRow {
                        id,
                        fields: change_set.into_row(),
                        logical_key: versioned.map(|v| v.logical_key()),
                        effective_time: versioned.and_then(|v| v.effective_time()),
                    };
                    table.rows.insert(id, row);

                    report.inserted.push(RowRef { entity_type, id });
                    assigned.push((entity, id));
                }
                PendingChange::Update {
                    entity, change_set, ..
                } => {
                    let entity_type = entity.entity_type();
                    if entity.as_versioned().is_some() {
                        return Err(ChronicleError::Storage(format!(
                            "Refusing to overwrite committed version {}",
                            entity.describe()
                        )));
                    }
                    let id = Self::require_id(&*entity)?;
                    let row = staged
                        .get_mut(entity_type)
                        .and_then(|table| table.rows.get_mut(&id))
                        .ok_or_else(|| ChronicleError::row_not_found(entity_type, id.to_string()))?;
                    change_set.apply_to(&mut row.fields);

                    report.updated.push(RowRef { entity_type, id });
                }
                PendingChange::Delete { entity } => {
                    let entity_type = entity.entity_type();
                    let id = Self::require_id(&*entity)?;
                    staged
                        .get_mut(entity_type)
                        .and_then(|table| table.rows.remove(&id))
                        .ok_or_else(|| ChronicleError::row_not_found(entity_type, id.to_string()))?;

                    report.deleted.push(RowRef { entity_type, id });
                }
            }
        }

        if let Some(path) = &self.path {
            write_json_atomic(path, &Self::to_data(&staged))?;
        }
        self.tables = staged;

        for (entity, id) in assigned {
            entity.assign_persisted_id(Some(id));
            // A written time is settled; the next edit starts a new version
            if let Some(versioned) = entity.as_versioned_mut() {
                if let Some(at) = versioned.effective_time() {
                    versioned.assign_effective_time(at);
                }
            }
        }

        Ok(report)
    }

    fn require_id(entity: &dyn super::change_set::Persistable) -> ChronicleResult<RowId> {
        entity.persisted_id().ok_or_else(|| {
            ChronicleError::Validation(format!(
                "{} has not been committed yet",
                entity.describe()
            ))
        })
    }
}

impl VersionLookup for RecordStore {
    fn latest_effective_time(&self, entity_type: &str, logical_key: &str) -> Option<Timestamp> {
        self.latest_version(entity_type, logical_key)
            .and_then(|row| row.effective_time)
    }
}
