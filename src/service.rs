// Process-wide wiring of the cache, store and provider into both engines

use std::sync::Arc;

use tracing::error;

use crate::{
    cache::{KeyValueCache, TtlCache},
    config::AppConfig,
    error::ProviderError,
    export::ExportOutcome,
    models::UserId,
    provider::{HttpTripProvider, TripProvider},
    resolver::{SearchQuery, TripResolver},
    response::ApiResponse,
    saved_list::{ListQuery, SavedListService},
    store::TripStore,
};

/// Entry point for the HTTP layer.
///
/// Build one instance at startup and share it (it is cheap to wrap in an
/// `Arc`); both engines hold clones of the same port handles.
pub struct TripsService {
    cache: Arc<dyn KeyValueCache>,
    resolver: TripResolver,
    saved_list: SavedListService,
}

impl TripsService {
    pub fn new(
        config: &AppConfig,
        cache: Arc<dyn KeyValueCache>,
        store: Arc<dyn TripStore>,
        provider: Arc<dyn TripProvider>,
    ) -> Self {
        let resolver = TripResolver::new(
            cache.clone(),
            store.clone(),
            provider.clone(),
            config.cache.default_ttl(),
        );
        let saved_list = SavedListService::new(store, provider);

        Self {
            cache,
            resolver,
            saved_list,
        }
    }

    // In-memory cache and the HTTP provider from `config`
    pub fn with_defaults(config: &AppConfig, store: Arc<dyn TripStore>) -> Result<Self, ProviderError> {
        let cache = Arc::new(TtlCache::new(config.cache.clone()));
        let provider = Arc::new(HttpTripProvider::new(&config.provider)?);
        Ok(Self::new(config, cache, store, provider))
    }

    pub async fn search(&self, query: &SearchQuery) -> ApiResponse {
        self.resolver.resolve_search(query).await
    }

    pub async fn trip_by_id(&self, id: &str) -> ApiResponse {
        self.resolver.resolve_by_id(id).await
    }

    // Duplicate saves are rejected before the engine runs
    pub async fn save_trip(&self, user_id: UserId, trip_id: &str) -> ApiResponse {
        if let Err(rejection) = self.saved_list.ensure_not_saved(user_id, trip_id).await {
            return rejection;
        }
        self.saved_list.add_to_saved_list(user_id, trip_id).await
    }

    pub async fn saved_trips(&self, user_id: UserId, query: &ListQuery, route: &str) -> ApiResponse {
        self.saved_list.get_saved_list(user_id, query, route).await
    }

    pub async fn remove_trip(&self, user_id: UserId, trip_id: &str) -> ApiResponse {
        self.saved_list.remove_from_saved_list(user_id, trip_id).await
    }

    pub async fn export(&self, user_id: UserId, format: &str) -> ExportOutcome {
        self.saved_list.export_list(user_id, format).await
    }

    pub async fn health(&self) -> bool {
        let alive = self.cache.ping().await;
        if !alive {
            error!("cache connection error");
        }
        alive
    }
}
