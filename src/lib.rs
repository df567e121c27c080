// Trip resolution and saved-list aggregation engine

pub mod cache;
pub mod config;
pub mod error;
pub mod export;
pub mod models;
pub mod provider;
pub mod resolver;
pub mod response;
pub mod saved_list;
pub mod service;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export key types for convenience
pub use cache::{CacheStats, KeyValueCache, TtlCache};
pub use config::{AppConfig, CacheConfig, ProviderConfig};
pub use error::{CacheError, NotFoundKind, ProviderError, ServiceError, StoreError};
pub use export::{ExportFile, ExportFormat, ExportOutcome};
pub use models::{ListItem, MergedListItem, SavedListEntry, Trip, User, UserId};
pub use provider::{HttpTripProvider, ProviderResponse, TripProvider};
pub use resolver::{SearchQuery, TripResolver};
pub use response::{ApiResponse, PaginationLinks, ResponseBody};
pub use saved_list::{ListQuery, SavedListService};
pub use service::TripsService;
pub use store::{InMemoryStore, TripStore};
