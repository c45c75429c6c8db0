use leaselens::auth::{RepositoryError, UserId, UserRecord, UserStore};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Account store backing the bundled server. Production deployments swap in
/// an adapter over the external document database.
#[derive(Default, Clone)]
pub(crate) struct InMemoryUserStore {
    records: Arc<Mutex<HashMap<String, UserRecord>>>,
}

impl UserStore for InMemoryUserStore {
    fn insert(&self, record: UserRecord) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("user store mutex poisoned");
        if guard.contains_key(&record.username) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.username.clone(), record);
        Ok(())
    }

    fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, RepositoryError> {
        let guard = self.records.lock().expect("user store mutex poisoned");
        Ok(guard.get(username).cloned())
    }

    fn find_by_id(&self, id: &UserId) -> Result<Option<UserRecord>, RepositoryError> {
        let guard = self.records.lock().expect("user store mutex poisoned");
        Ok(guard.values().find(|record| &record.id == id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, username: &str) -> UserRecord {
        UserRecord {
            id: UserId(id.to_string()),
            username: username.to_string(),
            password_hash: "hash".to_string(),
        }
    }

    #[test]
    fn insert_rejects_duplicate_usernames() {
        let store = InMemoryUserStore::default();
        store.insert(record("user-000001", "renter")).expect("first insert");
        let err = store
            .insert(record("user-000002", "renter"))
            .expect_err("duplicate username");
        assert!(matches!(err, RepositoryError::Conflict));
    }

    #[test]
    fn lookups_by_username_and_id_agree() {
        let store = InMemoryUserStore::default();
        store.insert(record("user-000001", "renter")).expect("insert");

        let by_name = store
            .find_by_username("renter")
            .expect("lookup succeeds")
            .expect("record present");
        let by_id = store
            .find_by_id(&UserId("user-000001".to_string()))
            .expect("lookup succeeds")
            .expect("record present");
        assert_eq!(by_name, by_id);
        assert!(store
            .find_by_username("stranger")
            .expect("lookup succeeds")
            .is_none());
    }
}
