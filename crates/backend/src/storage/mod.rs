use foodtour_shared::models::{RouteMutation, RouteMutationStatus, StopId};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

const ROUTE_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("route");

/// Single entry holding the ordered id list of the active route.
const ROUTE_KEY: &str = "active";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] redb::DatabaseError),
    #[error(transparent)]
    Transaction(#[from] redb::TransactionError),
    #[error(transparent)]
    Table(#[from] redb::TableError),
    #[error(transparent)]
    Storage(#[from] redb::StorageError),
    #[error(transparent)]
    Commit(#[from] redb::CommitError),
    #[error("corrupt route entry: {0}")]
    Codec(#[from] serde_json::Error),
}

pub struct RouteStorage {
    db: Database,
    path: PathBuf,
}

impl RouteStorage {
    pub fn open(path: &Path) -> Result<Arc<Self>, StoreError> {
        let db = Database::create(path)?;

        // Ensure table exists
        let write_txn = db.begin_write()?;
        {
            write_txn.open_table(ROUTE_TABLE)?;
        }
        write_txn.commit()?;

        tracing::info!(path = %path.display(), "Opened route database");
        Ok(Arc::new(RouteStorage {
            db,
            path: path.to_path_buf(),
        }))
    }

    /// Stop ids of the active route, in visiting order.
    pub fn route(&self) -> Result<Vec<StopId>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ROUTE_TABLE)?;

        match table.get(ROUTE_KEY)? {
            Some(value) => Ok(serde_json::from_slice(value.value())?),
            None => Ok(Vec::new()),
        }
    }

    pub fn contains(&self, id: StopId) -> Result<bool, StoreError> {
        Ok(self.route()?.contains(&id))
    }

    /// Append `id` unless it is already on the route.
    pub fn add(&self, id: StopId) -> Result<RouteMutation, StoreError> {
        self.update(|ids| {
            if ids.contains(&id) {
                RouteMutationStatus::AlreadyExists
            } else {
                ids.push(id);
                RouteMutationStatus::Added
            }
        })
    }

    pub fn remove(&self, id: StopId) -> Result<RouteMutation, StoreError> {
        self.update(|ids| match ids.iter().position(|&x| x == id) {
            Some(i) => {
                ids.remove(i);
                RouteMutationStatus::Removed
            }
            None => RouteMutationStatus::NotFound,
        })
    }

    pub fn clear(&self) -> Result<RouteMutation, StoreError> {
        self.update(|ids| {
            ids.clear();
            RouteMutationStatus::Cleared
        })
    }

    pub fn db_size_bytes(&self) -> Result<u64, std::io::Error> {
        std::fs::metadata(&self.path).map(|m| m.len())
    }

    /// Read-modify-write of the route inside one write transaction.
    fn update(
        &self,
        apply: impl FnOnce(&mut Vec<StopId>) -> RouteMutationStatus,
    ) -> Result<RouteMutation, StoreError> {
        let write_txn = self.db.begin_write()?;
        let mutation = {
            let mut table = write_txn.open_table(ROUTE_TABLE)?;
            let mut ids: Vec<StopId> = match table.get(ROUTE_KEY)? {
                Some(value) => serde_json::from_slice(value.value())?,
                None => Vec::new(),
            };

            let status = apply(&mut ids);
            let json = serde_json::to_vec(&ids)?;
            table.insert(ROUTE_KEY, json.as_slice())?;
            RouteMutation { status, route: ids }
        };
        write_txn.commit()?;

        tracing::info!(status = ?mutation.status, route = ?mutation.route, "Route updated");
        Ok(mutation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_temp() -> (tempfile::TempDir, Arc<RouteStorage>) {
        let dir = tempfile::tempdir().unwrap();
        let storage = RouteStorage::open(&dir.path().join("route.redb")).unwrap();
        (dir, storage)
    }

    #[test]
    fn test_new_database_has_empty_route() {
        let (_dir, storage) = open_temp();
        assert!(storage.route().unwrap().is_empty());
    }

    #[test]
    fn test_add_is_idempotent_and_keeps_order() {
        let (_dir, storage) = open_temp();
        assert_eq!(storage.add(3).unwrap().status, RouteMutationStatus::Added);
        assert_eq!(storage.add(1).unwrap().status, RouteMutationStatus::Added);
        let again = storage.add(3).unwrap();
        assert_eq!(again.status, RouteMutationStatus::AlreadyExists);
        assert_eq!(again.route, vec![3, 1]);
        assert_eq!(storage.route().unwrap(), vec![3, 1]);
    }

    #[test]
    fn test_remove_reports_missing_ids() {
        let (_dir, storage) = open_temp();
        storage.add(1).unwrap();
        storage.add(2).unwrap();
        let removed = storage.remove(1).unwrap();
        assert_eq!(removed.status, RouteMutationStatus::Removed);
        assert_eq!(removed.route, vec![2]);
        assert_eq!(storage.remove(1).unwrap().status, RouteMutationStatus::NotFound);
        assert!(!storage.contains(1).unwrap());
        assert!(storage.contains(2).unwrap());
    }

    #[test]
    fn test_clear_empties_route() {
        let (_dir, storage) = open_temp();
        storage.add(1).unwrap();
        let cleared = storage.clear().unwrap();
        assert_eq!(cleared.status, RouteMutationStatus::Cleared);
        assert!(cleared.route.is_empty());
        assert!(storage.route().unwrap().is_empty());
    }

    #[test]
    fn test_route_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("route.redb");
        {
            let storage = RouteStorage::open(&path).unwrap();
            storage.add(5).unwrap();
            storage.add(7).unwrap();
        }
        let storage = RouteStorage::open(&path).unwrap();
        assert_eq!(storage.route().unwrap(), vec![5, 7]);
        assert!(storage.db_size_bytes().unwrap() > 0);
    }
}
