// Persistent store port for trips, users and saved-list entries
// A missing record is `Ok(None)`; `Err` is reserved for the store itself failing

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::RwLock;

use crate::{
    error::StoreError,
    models::{SavedListEntry, Trip, User, UserId},
};

#[async_trait]
pub trait TripStore: Send + Sync + 'static {
    async fn find_user(&self, id: UserId) -> Result<Option<User>, StoreError>;

    async fn find_trip(&self, id: &str) -> Result<Option<Trip>, StoreError>;

    // One batch lookup; ids with no trip are skipped
    async fn find_trips(&self, ids: &[String]) -> Result<Vec<Trip>, StoreError>;

    // `None` when the store accepted the call but returned no record
    async fn create_trip(&self, trip: Trip) -> Result<Option<Trip>, StoreError>;

    // Entries in the order they were saved
    async fn find_list_entries(&self, user_id: UserId) -> Result<Vec<SavedListEntry>, StoreError>;

    async fn find_list_entry(
        &self,
        user_id: UserId,
        trip_id: &str,
    ) -> Result<Option<SavedListEntry>, StoreError>;

    async fn create_list_entry(
        &self,
        user_id: UserId,
        trip_id: &str,
    ) -> Result<Option<SavedListEntry>, StoreError>;

    // `true` when an entry was removed
    async fn delete_list_entry(&self, user_id: UserId, trip_id: &str) -> Result<bool, StoreError>;
}

#[derive(Default)]
pub struct InMemoryStore {
    users: DashMap<UserId, User>,
    trips: DashMap<String, Trip>,
    entries: RwLock<Vec<SavedListEntry>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_user(&self, user: User) {
        self.users.insert(user.id, user);
    }

    pub fn insert_trip(&self, trip: Trip) {
        self.trips.insert(trip.id.clone(), trip);
    }

    // Seeds an entry with an explicit timestamp, replacing any existing one
    pub fn insert_list_entry(&self, entry: SavedListEntry) {
        let mut entries = self.entries.write();
        entries.retain(|e| !(e.user_id == entry.user_id && e.trip_id == entry.trip_id));
        entries.push(entry);
    }

    pub fn trip_count(&self) -> usize {
        self.trips.len()
    }
}

#[async_trait]
impl TripStore for InMemoryStore {
    async fn find_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn find_trip(&self, id: &str) -> Result<Option<Trip>, StoreError> {
        Ok(self.trips.get(id).map(|t| t.clone()))
    }

    async fn find_trips(&self, ids: &[String]) -> Result<Vec<Trip>, StoreError> {
        Ok(ids
            .iter()
            .filter_map(|id| self.trips.get(id).map(|t| t.clone()))
            .collect())
    }

    async fn create_trip(&self, trip: Trip) -> Result<Option<Trip>, StoreError> {
        if trip.id.is_empty() {
            return Err(StoreError::Rejected("trip id must not be empty".to_string()));
        }
        // trips are shared between users, re-creating one keeps the stored row
        let stored = self.trips.entry(trip.id.clone()).or_insert(trip);
        Ok(Some(stored.clone()))
    }

    async fn find_list_entries(&self, user_id: UserId) -> Result<Vec<SavedListEntry>, StoreError> {
        Ok(self
            .entries
            .read()
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_list_entry(
        &self,
        user_id: UserId,
        trip_id: &str,
    ) -> Result<Option<SavedListEntry>, StoreError> {
        Ok(self
            .entries
            .read()
            .iter()
            .find(|e| e.user_id == user_id && e.trip_id == trip_id)
            .cloned())
    }

    async fn create_list_entry(
        &self,
        user_id: UserId,
        trip_id: &str,
    ) -> Result<Option<SavedListEntry>, StoreError> {
        if !self.users.contains_key(&user_id) {
            return Err(StoreError::Rejected(format!("unknown user {user_id}")));
        }
        if !self.trips.contains_key(trip_id) {
            return Err(StoreError::Rejected(format!("unknown trip {trip_id}")));
        }

        let mut entries = self.entries.write();
        if let Some(existing) = entries
            .iter()
            .find(|e| e.user_id == user_id && e.trip_id == trip_id)
        {
            return Ok(Some(existing.clone()));
        }

        let entry = SavedListEntry {
            user_id,
            trip_id: trip_id.to_string(),
            created_at: Utc::now(),
        };
        entries.push(entry.clone());
        Ok(Some(entry))
    }

    async fn delete_list_entry(&self, user_id: UserId, trip_id: &str) -> Result<bool, StoreError> {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|e| !(e.user_id == user_id && e.trip_id == trip_id));
        Ok(entries.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{trip, user};

    #[tokio::test]
    async fn missing_records_are_none_not_errors() {
        let store = InMemoryStore::new();

        assert_eq!(store.find_user(1).await.unwrap(), None);
        assert_eq!(store.find_trip("nope").await.unwrap(), None);
        assert_eq!(store.find_list_entry(1, "nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn list_entries_are_unique_per_user_and_trip() {
        let store = InMemoryStore::new();
        store.insert_user(user(1));
        store.insert_trip(trip("1", 812.0, 13));

        let first = store.create_list_entry(1, "1").await.unwrap().unwrap();
        let second = store.create_list_entry(1, "1").await.unwrap().unwrap();

        assert_eq!(first, second);
        assert_eq!(store.find_list_entries(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn entries_keep_insertion_order() {
        let store = InMemoryStore::new();
        store.insert_user(user(1));
        store.insert_user(user(2));
        for id in ["3", "1", "2"] {
            store.insert_trip(trip(id, 100.0, 10));
            store.create_list_entry(1, id).await.unwrap();
        }
        store.create_list_entry(2, "1").await.unwrap();

        let ids: Vec<_> = store
            .find_list_entries(1)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.trip_id)
            .collect();
        assert_eq!(ids, ["3", "1", "2"]);
    }

    #[tokio::test]
    async fn entry_requires_known_user_and_trip() {
        let store = InMemoryStore::new();
        store.insert_user(user(1));

        assert!(store.create_list_entry(1, "missing").await.is_err());
        assert!(store.create_list_entry(9, "missing").await.is_err());
    }

    #[tokio::test]
    async fn delete_reports_whether_anything_was_removed() {
        let store = InMemoryStore::new();
        store.insert_user(user(1));
        store.insert_trip(trip("1", 812.0, 13));
        store.create_list_entry(1, "1").await.unwrap();

        assert!(store.delete_list_entry(1, "1").await.unwrap());
        assert!(!store.delete_list_entry(1, "1").await.unwrap());
    }

    #[tokio::test]
    async fn batch_lookup_skips_unknown_ids() {
        let store = InMemoryStore::new();
        store.insert_trip(trip("1", 812.0, 13));

        let found = store
            .find_trips(&["1".to_string(), "2".to_string()])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
    }
}
