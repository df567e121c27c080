// Trip resolution: cache first, then the store, then the provider
// Each resolution makes at most one provider call

use std::{cmp::Ordering, sync::Arc, time::Duration};

use serde::Serialize;
use tracing::debug;

use crate::{
    cache::{get_json, set_json, KeyValueCache},
    error::ServiceError,
    models::Trip,
    provider::TripProvider,
    response::{messages, ApiResponse},
    store::TripStore,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    pub origin: String,
    pub destination: String,
    pub sort_by: Option<String>,
    pub sort_direction: Option<String>,
}

impl SearchQuery {
    pub fn new(origin: &str, destination: &str) -> Self {
        Self {
            origin: origin.to_string(),
            destination: destination.to_string(),
            ..Default::default()
        }
    }

    pub fn sorted(mut self, sort_by: &str, sort_direction: Option<&str>) -> Self {
        self.sort_by = Some(sort_by.to_string());
        self.sort_direction = sort_direction.map(str::to_string);
        self
    }
}

// The cached value is already sorted, so the sort parameters are part of the key
pub fn search_cache_key(query: &SearchQuery) -> String {
    format!(
        "trips:{}:{}:{}:{}",
        query.origin,
        query.destination,
        query.sort_by.as_deref().unwrap_or_default(),
        query.sort_direction.as_deref().unwrap_or_default(),
    )
}

pub fn trip_cache_key(id: &str) -> String {
    format!("trip:{id}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    // Only an explicit "asc" sorts ascending
    pub fn from_param(direction: Option<&str>) -> Self {
        match direction {
            Some("asc") => SortDirection::Asc,
            _ => SortDirection::Desc,
        }
    }

    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchColumn {
    Duration,
    Cost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchSort {
    pub column: SearchColumn,
    pub direction: SortDirection,
}

impl SearchSort {
    /// Picks the ordering for a search result.
    ///
    /// Without a sort key the provider's order is kept. Once a key is chosen
    /// the direction defaults to descending.
    pub fn from_params(sort_by: Option<&str>, sort_direction: Option<&str>) -> Option<Self> {
        let sort_by = sort_by.filter(|s| !s.is_empty())?;
        let column = if sort_by == "fastest" {
            SearchColumn::Duration
        } else {
            SearchColumn::Cost
        };

        Some(Self {
            column,
            direction: SortDirection::from_param(sort_direction),
        })
    }

    pub fn apply(&self, trips: &mut [Trip]) {
        trips.sort_by(|a, b| {
            let ordering = match self.column {
                SearchColumn::Duration => a.duration.cmp(&b.duration),
                SearchColumn::Cost => a.cost.total_cmp(&b.cost),
            };
            self.direction.apply(ordering)
        });
    }
}

pub struct TripResolver {
    cache: Arc<dyn KeyValueCache>,
    store: Arc<dyn TripStore>,
    provider: Arc<dyn TripProvider>,
    ttl: Duration,
}

impl TripResolver {
    pub fn new(
        cache: Arc<dyn KeyValueCache>,
        store: Arc<dyn TripStore>,
        provider: Arc<dyn TripProvider>,
        ttl: Duration,
    ) -> Self {
        Self {
            cache,
            store,
            provider,
            ttl,
        }
    }

    pub async fn resolve_search(&self, query: &SearchQuery) -> ApiResponse {
        match self.search(query).await {
            Ok(trips) => success(&trips, messages::TRIPS_FETCHED),
            Err(err) => err.into_response("resolve_search"),
        }
    }

    pub async fn resolve_by_id(&self, id: &str) -> ApiResponse {
        match self.by_id(id).await {
            Ok(trip) => success(&trip, messages::TRIP_FETCHED),
            Err(err) => err.into_response("resolve_by_id"),
        }
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Trip>, ServiceError> {
        let key = search_cache_key(query);

        if let Some(cached) = get_json::<Vec<Trip>>(self.cache.as_ref(), &key).await? {
            debug!(%key, "search served from cache");
            return Ok(cached);
        }

        let response = self
            .provider
            .search_trips(&query.origin, &query.destination)
            .await?;
        let status = response.status;
        let mut trips = response
            .into_success()
            .ok_or(ServiceError::ProviderUnavailable(status))?;

        if let Some(sort) =
            SearchSort::from_params(query.sort_by.as_deref(), query.sort_direction.as_deref())
        {
            sort.apply(&mut trips);
        }

        set_json(self.cache.as_ref(), &key, &trips, Some(self.ttl)).await?;
        debug!(%key, count = trips.len(), "search resolved from provider");
        Ok(trips)
    }

    async fn by_id(&self, id: &str) -> Result<Trip, ServiceError> {
        let key = trip_cache_key(id);

        if let Some(cached) = get_json::<Trip>(self.cache.as_ref(), &key).await? {
            debug!(%key, "trip served from cache");
            return Ok(cached);
        }

        if let Some(stored) = self.store.find_trip(id).await? {
            set_json(self.cache.as_ref(), &key, &stored, Some(self.ttl)).await?;
            debug!(%key, "trip served from store");
            return Ok(stored);
        }

        // provider-only trips are cached but not persisted
        let response = self.provider.get_trip_by_id(id).await?;
        let status = response.status;
        let fetched = response
            .into_success()
            .ok_or(ServiceError::ProviderUnavailable(status))?;

        set_json(self.cache.as_ref(), &key, &fetched, Some(self.ttl)).await?;
        debug!(%key, "trip resolved from provider");
        Ok(fetched)
    }
}

fn success<T: Serialize>(payload: &T, message: &str) -> ApiResponse {
    match serde_json::to_value(payload) {
        Ok(data) => ApiResponse::success(200, data, message),
        Err(err) => ServiceError::from(err).into_response("serialize"),
    }
}
