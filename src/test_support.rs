// Fixtures and port doubles shared by the unit tests

use std::{
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
    time::Duration,
};

use async_trait::async_trait;

use crate::{
    cache::KeyValueCache,
    error::{CacheError, StoreError},
    models::{SavedListEntry, Trip, User, UserId},
    store::{InMemoryStore, TripStore},
};

pub(crate) fn trip(id: &str, cost: f64, duration: u32) -> Trip {
    Trip {
        id: id.to_string(),
        origin: "CAN".to_string(),
        destination: "BOM".to_string(),
        cost,
        duration,
        kind: "train".to_string(),
        display_name: "from CAN to BOM by train".to_string(),
    }
}

pub(crate) fn user(id: UserId) -> User {
    User {
        id,
        username: "test".to_string(),
    }
}

// Cache whose backend is unreachable
pub(crate) struct FailingCache;

#[async_trait]
impl KeyValueCache for FailingCache {
    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Err(CacheError::Connection("connection refused".to_string()))
    }

    async fn set(&self, _key: &str, _value: String, _ttl: Option<Duration>) -> Result<(), CacheError> {
        Err(CacheError::Connection("connection refused".to_string()))
    }

    async fn delete(&self, _key: &str) -> Result<(), CacheError> {
        Err(CacheError::Connection("connection refused".to_string()))
    }

    async fn ping(&self) -> bool {
        false
    }
}

/// In-memory store that counts calls and can be told to misbehave.
#[derive(Default)]
pub(crate) struct RecordingStore {
    pub inner: InMemoryStore,
    pub find_trip_calls: AtomicUsize,
    pub find_trips_calls: AtomicUsize,
    pub fail_find_user: AtomicBool,
    pub fail_create_trip: AtomicBool,
    pub empty_create_trip: AtomicBool,
    pub empty_create_entry: AtomicBool,
}

impl RecordingStore {
    pub fn with_user(id: UserId) -> Self {
        let store = Self::default();
        store.inner.insert_user(user(id));
        store
    }

    pub fn set(flag: &AtomicBool) {
        flag.store(true, Ordering::SeqCst);
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TripStore for RecordingStore {
    async fn find_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        if self.fail_find_user.load(Ordering::SeqCst) {
            return Err(StoreError::Connection("store offline".to_string()));
        }
        self.inner.find_user(id).await
    }

    async fn find_trip(&self, id: &str) -> Result<Option<Trip>, StoreError> {
        self.find_trip_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.find_trip(id).await
    }

    async fn find_trips(&self, ids: &[String]) -> Result<Vec<Trip>, StoreError> {
        self.find_trips_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.find_trips(ids).await
    }

    async fn create_trip(&self, trip: Trip) -> Result<Option<Trip>, StoreError> {
        if self.fail_create_trip.load(Ordering::SeqCst) {
            return Err(StoreError::Rejected("insert failed".to_string()));
        }
        if self.empty_create_trip.load(Ordering::SeqCst) {
            return Ok(None);
        }
        self.inner.create_trip(trip).await
    }

    async fn find_list_entries(&self, user_id: UserId) -> Result<Vec<SavedListEntry>, StoreError> {
        self.inner.find_list_entries(user_id).await
    }

    async fn find_list_entry(
        &self,
        user_id: UserId,
        trip_id: &str,
    ) -> Result<Option<SavedListEntry>, StoreError> {
        self.inner.find_list_entry(user_id, trip_id).await
    }

    async fn create_list_entry(
        &self,
        user_id: UserId,
        trip_id: &str,
    ) -> Result<Option<SavedListEntry>, StoreError> {
        if self.empty_create_entry.load(Ordering::SeqCst) {
            return Ok(None);
        }
        self.inner.create_list_entry(user_id, trip_id).await
    }

    async fn delete_list_entry(&self, user_id: UserId, trip_id: &str) -> Result<bool, StoreError> {
        self.inner.delete_list_entry(user_id, trip_id).await
    }
}
