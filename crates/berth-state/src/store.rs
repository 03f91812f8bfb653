//! StateStore — redb-backed persistence for auxiliary deployments.
//!
//! Provides typed CRUD over auxiliary deployment records and their
//! container records. All values are JSON-serialized into redb's `&[u8]`
//! value columns. The store supports both on-disk and in-memory backends
//! (the latter for testing).
//!
//! Mutations accept an optional [`Txn`] handle; with `None` they
//! auto-commit. A `Txn` dropped without [`Txn::commit`] discards its
//! writes, which is what the orchestrator's rollback paths rely on.

use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use redb::{Database, ReadableDatabase, ReadableTable};
use tracing::debug;
use uuid::Uuid;

use crate::error::{StateError, StateResult};
use crate::tables::*;
use crate::types::*;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// An open write transaction spanning multiple store mutations.
pub struct Txn {
    inner: redb::WriteTransaction,
}

impl Txn {
    /// Commit all mutations issued under this handle.
    pub fn commit(self) -> StateResult<()> {
        self.inner.commit().map_err(map_err!(Transaction))
    }
}

/// Thread-safe state store backed by redb.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    /// Open (or create) a persistent state store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "state store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory state store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory state store opened");
        Ok(store)
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(AUX_DEPLOYMENTS).map_err(map_err!(Table))?;
        txn.open_table(AUX_CONTAINERS).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// Begin a write transaction spanning multiple mutations.
    pub fn begin(&self) -> StateResult<Txn> {
        let inner = self.db.begin_write().map_err(map_err!(Transaction))?;
        Ok(Txn { inner })
    }

    /// Run `f` under the caller's transaction, or an auto-committing one.
    fn with_write<R>(
        &self,
        txn: Option<&mut Txn>,
        f: impl FnOnce(&redb::WriteTransaction) -> StateResult<R>,
    ) -> StateResult<R> {
        match txn {
            Some(t) => f(&t.inner),
            None => {
                let t = self.db.begin_write().map_err(map_err!(Transaction))?;
                let result = f(&t)?;
                t.commit().map_err(map_err!(Transaction))?;
                Ok(result)
            }
        }
    }

    // ── Auxiliary deployments ──────────────────────────────────────

    /// Insert a new record. The store assigns the ID and timestamps.
    pub fn create_aux(
        &self,
        txn: Option<&mut Txn>,
        new: NewAuxDeployment,
    ) -> StateResult<AuxDeployment> {
        let now = epoch_secs();
        let aux = AuxDeployment {
            id: Uuid::new_v4().to_string(),
            deployment_id: new.deployment_id,
            service_ref: new.service_ref,
            name: new.name,
            image: new.image,
            labels: new.labels,
            configs: new.configs,
            volumes: new.volumes,
            run_config: new.run_config,
            enabled: new.enabled,
            created_at: now,
            updated_at: now,
            container: None,
        };
        let value = serde_json::to_vec(&aux).map_err(map_err!(Serialize))?;
        self.with_write(txn, |t| {
            let mut table = t.open_table(AUX_DEPLOYMENTS).map_err(map_err!(Table))?;
            table
                .insert(aux.id.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
            Ok(())
        })?;
        debug!(aux_id = %aux.id, deployment_id = %aux.deployment_id, "aux deployment stored");
        Ok(aux)
    }

    /// Get a record by ID, optionally attaching its container record.
    pub fn get_aux(
        &self,
        id: &str,
        include_container: bool,
    ) -> StateResult<Option<AuxDeployment>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(AUX_DEPLOYMENTS).map_err(map_err!(Table))?;
        let mut aux: AuxDeployment = match table.get(id).map_err(map_err!(Read))? {
            Some(guard) => {
                serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?
            }
            None => return Ok(None),
        };
        if include_container {
            let containers = txn.open_table(AUX_CONTAINERS).map_err(map_err!(Table))?;
            if let Some(guard) = containers.get(id).map_err(map_err!(Read))? {
                let record: ContainerRecord =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                aux.container = Some(record);
            }
        }
        Ok(Some(aux))
    }

    /// List records matching the filter, with container records attached.
    pub fn list_aux(&self, filter: &AuxFilter) -> StateResult<Vec<AuxDeployment>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(AUX_DEPLOYMENTS).map_err(map_err!(Table))?;
        let containers = txn.open_table(AUX_CONTAINERS).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let mut aux: AuxDeployment =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            if !filter.matches(&aux) {
                continue;
            }
            if let Some(guard) = containers.get(aux.id.as_str()).map_err(map_err!(Read))? {
                let record: ContainerRecord =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                aux.container = Some(record);
            }
            results.push(aux);
        }
        Ok(results)
    }

    /// Overwrite a record's base fields. The store bumps `updated_at`.
    ///
    /// Returns the stored copy. A missing record is `NotFound`.
    pub fn update_aux(
        &self,
        txn: Option<&mut Txn>,
        aux: &AuxDeployment,
    ) -> StateResult<AuxDeployment> {
        let mut stored = aux.clone();
        stored.container = None;
        stored.updated_at = epoch_secs();
        let value = serde_json::to_vec(&stored).map_err(map_err!(Serialize))?;
        self.with_write(txn, |t| {
            let mut table = t.open_table(AUX_DEPLOYMENTS).map_err(map_err!(Table))?;
            if table.get(stored.id.as_str()).map_err(map_err!(Read))?.is_none() {
                return Err(StateError::NotFound(stored.id.clone()));
            }
            table
                .insert(stored.id.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
            Ok(())
        })?;
        debug!(aux_id = %stored.id, "aux deployment updated");
        Ok(stored)
    }

    /// Delete a record and its container record. A missing base record
    /// is `NotFound`.
    pub fn delete_aux(&self, txn: Option<&mut Txn>, id: &str) -> StateResult<()> {
        self.with_write(txn, |t| {
            let existed;
            {
                let mut table = t.open_table(AUX_DEPLOYMENTS).map_err(map_err!(Table))?;
                existed = table.remove(id).map_err(map_err!(Write))?.is_some();
            }
            {
                let mut containers = t.open_table(AUX_CONTAINERS).map_err(map_err!(Table))?;
                containers.remove(id).map_err(map_err!(Write))?;
            }
            if existed {
                Ok(())
            } else {
                Err(StateError::NotFound(id.to_string()))
            }
        })?;
        debug!(aux_id = %id, "aux deployment deleted");
        Ok(())
    }

    // ── Container records ──────────────────────────────────────────

    /// Insert or replace the container record for an auxiliary ID.
    ///
    /// The base record must exist; otherwise `NotFound`.
    pub fn put_container(
        &self,
        txn: Option<&mut Txn>,
        aux_id: &str,
        record: &ContainerRecord,
    ) -> StateResult<()> {
        let value = serde_json::to_vec(record).map_err(map_err!(Serialize))?;
        self.with_write(txn, |t| {
            {
                let table = t.open_table(AUX_DEPLOYMENTS).map_err(map_err!(Table))?;
                if table.get(aux_id).map_err(map_err!(Read))?.is_none() {
                    return Err(StateError::NotFound(aux_id.to_string()));
                }
            }
            let mut containers = t.open_table(AUX_CONTAINERS).map_err(map_err!(Table))?;
            containers
                .insert(aux_id, value.as_slice())
                .map_err(map_err!(Write))?;
            Ok(())
        })?;
        debug!(%aux_id, container_id = %record.container_id, "container record stored");
        Ok(())
    }

    /// Remove the container record for an auxiliary ID. A missing record
    /// is `NotFound`.
    pub fn delete_container(&self, txn: Option<&mut Txn>, aux_id: &str) -> StateResult<()> {
        self.with_write(txn, |t| {
            let mut containers = t.open_table(AUX_CONTAINERS).map_err(map_err!(Table))?;
            let existed = containers.remove(aux_id).map_err(map_err!(Write))?.is_some();
            if existed {
                Ok(())
            } else {
                Err(StateError::NotFound(aux_id.to_string()))
            }
        })?;
        debug!(%aux_id, "container record deleted");
        Ok(())
    }
}

/// Current Unix epoch in seconds.
fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store() -> StateStore {
        StateStore::open_in_memory().unwrap()
    }

    fn new_record(deployment_id: &str, service: &str) -> NewAuxDeployment {
        NewAuxDeployment {
            deployment_id: deployment_id.to_string(),
            service_ref: service.to_string(),
            name: service.to_string(),
            image: format!("ghcr.io/org/{service}:1"),
            ..NewAuxDeployment::default()
        }
    }

    #[test]
    fn create_assigns_id_and_timestamps() {
        let store = test_store();
        let aux = store.create_aux(None, new_record("dep-1", "redis")).unwrap();
        assert!(!aux.id.is_empty());
        assert_eq!(aux.created_at, aux.updated_at);

        let read = store.get_aux(&aux.id, false).unwrap().unwrap();
        assert_eq!(read, aux);
    }

    #[test]
    fn get_attaches_container_only_when_asked() {
        let store = test_store();
        let aux = store.create_aux(None, new_record("dep-1", "redis")).unwrap();
        let record = ContainerRecord {
            container_id: "c-1".into(),
            alias: "berth-redis-abc".into(),
        };
        store.put_container(None, &aux.id, &record).unwrap();

        let bare = store.get_aux(&aux.id, false).unwrap().unwrap();
        assert!(bare.container.is_none());

        let with_assets = store.get_aux(&aux.id, true).unwrap().unwrap();
        assert_eq!(with_assets.container, Some(record));
    }

    #[test]
    fn put_container_requires_base_record() {
        let store = test_store();
        let record = ContainerRecord {
            container_id: "c-1".into(),
            alias: "a".into(),
        };
        let result = store.put_container(None, "missing", &record);
        assert!(matches!(result, Err(StateError::NotFound(_))));
    }

    #[test]
    fn update_missing_record_is_not_found() {
        let store = test_store();
        let mut aux = store.create_aux(None, new_record("dep-1", "redis")).unwrap();
        store.delete_aux(None, &aux.id).unwrap();
        aux.name = "renamed".into();
        assert!(matches!(
            store.update_aux(None, &aux),
            Err(StateError::NotFound(_))
        ));
    }

    #[test]
    fn update_bumps_updated_at_and_persists_fields() {
        let store = test_store();
        let mut aux = store.create_aux(None, new_record("dep-1", "redis")).unwrap();
        aux.image = "ghcr.io/org/redis:2".into();
        aux.enabled = true;
        let stored = store.update_aux(None, &aux).unwrap();
        assert!(stored.updated_at >= stored.created_at);

        let read = store.get_aux(&aux.id, false).unwrap().unwrap();
        assert_eq!(read.image, "ghcr.io/org/redis:2");
        assert!(read.enabled);
    }

    #[test]
    fn delete_cascades_container_record() {
        let store = test_store();
        let aux = store.create_aux(None, new_record("dep-1", "redis")).unwrap();
        let record = ContainerRecord {
            container_id: "c-1".into(),
            alias: "a".into(),
        };
        store.put_container(None, &aux.id, &record).unwrap();
        store.delete_aux(None, &aux.id).unwrap();

        assert!(store.get_aux(&aux.id, true).unwrap().is_none());
        // Second delete reports NotFound.
        assert!(matches!(
            store.delete_aux(None, &aux.id),
            Err(StateError::NotFound(_))
        ));
    }

    #[test]
    fn transaction_spans_mutations_and_commits_atomically() {
        let store = test_store();
        let mut txn = store.begin().unwrap();
        let aux = store
            .create_aux(Some(&mut txn), new_record("dep-1", "redis"))
            .unwrap();
        let record = ContainerRecord {
            container_id: "c-1".into(),
            alias: "a".into(),
        };
        store.put_container(Some(&mut txn), &aux.id, &record).unwrap();

        // Not visible before commit.
        assert!(store.get_aux(&aux.id, false).unwrap().is_none());

        txn.commit().unwrap();
        let read = store.get_aux(&aux.id, true).unwrap().unwrap();
        assert_eq!(read.container, Some(record));
    }

    #[test]
    fn dropped_transaction_discards_writes() {
        let store = test_store();
        let id = {
            let mut txn = store.begin().unwrap();
            let aux = store
                .create_aux(Some(&mut txn), new_record("dep-1", "redis"))
                .unwrap();
            aux.id
            // txn dropped without commit
        };
        assert!(store.get_aux(&id, false).unwrap().is_none());
    }

    #[test]
    fn list_applies_filters() {
        let store = test_store();
        let mut a = store.create_aux(None, new_record("dep-1", "redis")).unwrap();
        a.enabled = true;
        a.labels.insert("tier".into(), "cache".into());
        store.update_aux(None, &a).unwrap();
        store.create_aux(None, new_record("dep-1", "postgres")).unwrap();
        store.create_aux(None, new_record("dep-2", "redis")).unwrap();

        let all_dep1 = store.list_aux(&AuxFilter::for_deployment("dep-1")).unwrap();
        assert_eq!(all_dep1.len(), 2);

        let mut enabled = AuxFilter::for_deployment("dep-1");
        enabled.enabled = Some(true);
        let results = store.list_aux(&enabled).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].service_ref, "redis");

        let mut labeled = AuxFilter::default();
        labeled.labels.insert("tier".into(), "cache".into());
        assert_eq!(store.list_aux(&labeled).unwrap().len(), 1);

        let mut by_image = AuxFilter::default();
        by_image.image = Some("ghcr.io/org/postgres:1".into());
        assert_eq!(store.list_aux(&by_image).unwrap().len(), 1);
    }

    #[test]
    fn on_disk_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.redb");
        let id = {
            let store = StateStore::open(&path).unwrap();
            store.create_aux(None, new_record("dep-1", "redis")).unwrap().id
        };
        let store = StateStore::open(&path).unwrap();
        assert!(store.get_aux(&id, false).unwrap().is_some());
    }
}
