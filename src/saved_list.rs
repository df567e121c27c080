// Saved-list aggregation: merges a user's entries with their trips, then
// sorts, paginates and exports the result

use std::{cmp::Ordering, collections::HashMap, sync::Arc};

use chrono::Datelike;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::{
    error::{NotFoundKind, ServiceError},
    export::{ExportFile, ExportFormat, ExportOutcome},
    models::{ListItem, MergedListItem, Trip, UserId},
    provider::TripProvider,
    resolver::SortDirection,
    response::{messages, ApiResponse, PaginationLinks},
    store::TripStore,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub page: usize,
    pub limit: usize,
    pub sort: Option<String>,
    pub sorted_by: Option<String>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            sort: None,
            sorted_by: None,
        }
    }
}

impl ListQuery {
    pub fn sorted(mut self, sorted_by: &str, sort: Option<&str>) -> Self {
        self.sorted_by = Some(sorted_by.to_string());
        self.sort = sort.map(str::to_string);
        self
    }

    pub fn page(mut self, page: usize, limit: usize) -> Self {
        self.page = page;
        self.limit = limit;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListSort {
    Newest,
    Oldest,
    Fastest,
    Cheapest,
}

impl ListSort {
    pub fn parse(sorted_by: Option<&str>) -> Option<Self> {
        match sorted_by? {
            "newest" => Some(ListSort::Newest),
            "oldest" => Some(ListSort::Oldest),
            "fastest" => Some(ListSort::Fastest),
            "cheapest" => Some(ListSort::Cheapest),
            _ => None,
        }
    }
}

/// Orders merged items in place.
///
/// `newest`/`oldest` compare only the day of the month of the save date, so
/// entries saved in different months can interleave. `fastest`/`cheapest`
/// honour `sort`, ascending only for "asc". Unrecognised keys keep merge order.
pub fn sort_merged(items: &mut [MergedListItem], sorted_by: Option<&str>, sort: Option<&str>) {
    let Some(key) = ListSort::parse(sorted_by) else {
        return;
    };
    let direction = SortDirection::from_param(sort);
    let day = |item: &MergedListItem| item.entry.created_at.day();

    match key {
        ListSort::Newest => items.sort_by(|a, b| day(b).cmp(&day(a))),
        ListSort::Oldest => items.sort_by(|a, b| day(a).cmp(&day(b))),
        ListSort::Fastest => {
            items.sort_by(|a, b| direction.apply(compare_numeric(a.duration(), b.duration())))
        }
        ListSort::Cheapest => {
            items.sort_by(|a, b| direction.apply(compare_numeric(a.cost(), b.cost())))
        }
    }
}

// Items without trip data sort below every item that has it
fn compare_numeric(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
    }
}

// Returns the requested page and the total page count
pub fn paginate<T>(items: &[T], page: usize, limit: usize) -> (&[T], usize) {
    let page = page.max(1);
    let limit = limit.max(1);
    let skip = (page - 1).saturating_mul(limit);
    let start = skip.min(items.len());
    let end = skip.saturating_add(limit).min(items.len());

    (&items[start..end], items.len().div_ceil(limit))
}

pub struct SavedListService {
    store: Arc<dyn TripStore>,
    provider: Arc<dyn TripProvider>,
}

impl SavedListService {
    pub fn new(store: Arc<dyn TripStore>, provider: Arc<dyn TripProvider>) -> Self {
        Self { store, provider }
    }

    /// Rejects a save when the trip is already in the user's list.
    ///
    /// Runs ahead of [`SavedListService::add_to_saved_list`], which does not
    /// check for duplicates itself.
    pub async fn ensure_not_saved(&self, user_id: UserId, trip_id: &str) -> Result<(), ApiResponse> {
        match self.store.find_list_entry(user_id, trip_id).await {
            Ok(None) => Ok(()),
            Ok(Some(_)) => Err(ApiResponse::error(
                400,
                "ALREADY_SAVED",
                messages::BAD_REQUEST,
                messages::BAD_REQUEST,
            )),
            Err(err) => Err(ServiceError::from(err).into_response("ensure_not_saved")),
        }
    }

    pub async fn add_to_saved_list(&self, user_id: UserId, trip_id: &str) -> ApiResponse {
        match self.add(user_id, trip_id).await {
            Ok(()) => ApiResponse::success(201, json!({}), messages::TRIP_ADDED),
            Err(err) => err.into_response("add_to_saved_list"),
        }
    }

    pub async fn get_saved_list(&self, user_id: UserId, query: &ListQuery, route: &str) -> ApiResponse {
        match self.page(user_id, query, route).await {
            Ok(response) => response,
            Err(err) => err.into_response("get_saved_list"),
        }
    }

    pub async fn remove_from_saved_list(&self, user_id: UserId, trip_id: &str) -> ApiResponse {
        match self.remove(user_id, trip_id).await {
            Ok(()) => ApiResponse::success(204, json!({}), messages::TRIP_REMOVED),
            Err(err) => err.into_response("remove_from_saved_list"),
        }
    }

    pub async fn export_list(&self, user_id: UserId, format: &str) -> ExportOutcome {
        match self.export(user_id, ExportFormat::parse(format)).await {
            Ok(outcome) => outcome,
            Err(err) => ExportOutcome::Envelope(err.into_response("export_list")),
        }
    }

    async fn require_user(&self, user_id: UserId) -> Result<(), ServiceError> {
        self.store
            .find_user(user_id)
            .await?
            .map(|_| ())
            .ok_or(ServiceError::NotFound(NotFoundKind::User))
    }

    async fn add(&self, user_id: UserId, trip_id: &str) -> Result<(), ServiceError> {
        self.require_user(user_id).await?;

        let trip = match self.store.find_trip(trip_id).await? {
            Some(trip) => trip,
            None => self.persist_from_provider(trip_id).await?,
        };

        // no rollback: a trip created above stays even if this insert fails
        self.store
            .create_list_entry(user_id, &trip.id)
            .await?
            .ok_or_else(|| ServiceError::Internal("list entry was not created".to_string()))?;

        info!(user_id, trip_id = %trip.id, "trip added to saved list");
        Ok(())
    }

    async fn persist_from_provider(&self, trip_id: &str) -> Result<Trip, ServiceError> {
        let response = self.provider.get_trip_by_id(trip_id).await?;
        let status = response.status;
        let fetched = response
            .into_success()
            .ok_or(ServiceError::ProviderUnavailable(status))?;

        let created = self
            .store
            .create_trip(fetched)
            .await?
            .ok_or_else(|| ServiceError::Internal("trip was not created".to_string()))?;
        debug!(trip_id = %created.id, "trip persisted from provider");
        Ok(created)
    }

    async fn remove(&self, user_id: UserId, trip_id: &str) -> Result<(), ServiceError> {
        self.require_user(user_id).await?;

        if self.store.find_list_entry(user_id, trip_id).await?.is_none() {
            return Err(ServiceError::NotFound(NotFoundKind::ListEntry));
        }

        self.store.delete_list_entry(user_id, trip_id).await?;
        info!(user_id, trip_id, "trip removed from saved list");
        Ok(())
    }

    // Entries joined with their trips, in saved order. Skips the trip query
    // entirely for an empty list.
    async fn merged(&self, user_id: UserId) -> Result<Vec<MergedListItem>, ServiceError> {
        self.require_user(user_id).await?;

        let entries = self.store.find_list_entries(user_id).await?;
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<String> = entries.iter().map(|e| e.trip_id.clone()).collect();
        let trips: HashMap<String, Trip> = self
            .store
            .find_trips(&ids)
            .await?
            .into_iter()
            .map(|t| (t.id.clone(), t))
            .collect();

        Ok(entries
            .into_iter()
            .map(|entry| {
                let trip = trips.get(&entry.trip_id).cloned();
                MergedListItem::new(entry, trip)
            })
            .collect())
    }

    async fn page(&self, user_id: UserId, query: &ListQuery, route: &str) -> Result<ApiResponse, ServiceError> {
        let mut merged = self.merged(user_id).await?;
        if merged.is_empty() {
            return Ok(ApiResponse::success(200, json!([]), messages::LIST_FETCHED));
        }

        sort_merged(&mut merged, query.sorted_by.as_deref(), query.sort.as_deref());

        let page = query.page.max(1);
        let limit = query.limit.max(1);
        let (items, total_pages) = paginate(&merged, page, limit);
        let projected: Vec<ListItem> = items.iter().map(MergedListItem::project).collect();

        Ok(ApiResponse::paged(
            200,
            serde_json::to_value(projected)?,
            messages::LIST_FETCHED,
            Some(PaginationLinks::build(route, page, limit, total_pages)),
        ))
    }

    async fn export(&self, user_id: UserId, format: ExportFormat) -> Result<ExportOutcome, ServiceError> {
        let merged = self.merged(user_id).await?;
        if merged.is_empty() {
            return Ok(ExportOutcome::Envelope(ApiResponse::success(
                200,
                Value::Array(Vec::new()),
                messages::LIST_EXPORTED,
            )));
        }

        let projected: Vec<ListItem> = merged.iter().map(MergedListItem::project).collect();
        Ok(ExportOutcome::File(ExportFile::render(&projected, format)?))
    }
}
