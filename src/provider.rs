// Thin client for the external trip-search API
// It makes one call per request. Retries and fallbacks belong to the callers

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{config::ProviderConfig, error::ProviderError, models::Trip};

// Upstream status travels separately from the payload; a non-200 response
// is a failure even when it carried a body
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderResponse<T> {
    pub status: u16,
    pub body: Option<T>,
}

impl<T> ProviderResponse<T> {
    pub fn ok(body: T) -> Self {
        Self {
            status: 200,
            body: Some(body),
        }
    }

    pub fn failed(status: u16) -> Self {
        Self { status, body: None }
    }

    pub fn is_success(&self) -> bool {
        self.status == 200
    }

    // Payload of a successful response
    pub fn into_success(self) -> Option<T> {
        if self.is_success() {
            self.body
        } else {
            None
        }
    }
}

#[async_trait]
pub trait TripProvider: Send + Sync + 'static {
    async fn search_trips(
        &self,
        origin: &str,
        destination: &str,
    ) -> Result<ProviderResponse<Vec<Trip>>, ProviderError>;

    async fn get_trip_by_id(&self, id: &str) -> Result<ProviderResponse<Trip>, ProviderError>;
}

pub struct HttpTripProvider {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl HttpTripProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        let base = config.base_url.trim_end_matches('/');
        if base.is_empty() {
            return Err(ProviderError::InvalidUrl(config.base_url.clone()));
        }

        Ok(Self {
            client,
            endpoint: format!("{base}{}", config.path),
            api_key: config.api_key.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<ProviderResponse<T>, ProviderError> {
        let response = request.header("x-api-key", &self.api_key).send().await?;
        let status = response.status();

        if status != StatusCode::OK {
            debug!(status = status.as_u16(), "trip provider call failed");
            return Ok(ProviderResponse::failed(status.as_u16()));
        }

        let body = response.json::<T>().await?;
        Ok(ProviderResponse::ok(body))
    }
}

#[async_trait]
impl TripProvider for HttpTripProvider {
    async fn search_trips(
        &self,
        origin: &str,
        destination: &str,
    ) -> Result<ProviderResponse<Vec<Trip>>, ProviderError> {
        let request = self
            .client
            .get(&self.endpoint)
            .query(&[("origin", origin), ("destination", destination)]);
        self.fetch(request).await
    }

    async fn get_trip_by_id(&self, id: &str) -> Result<ProviderResponse<Trip>, ProviderError> {
        let request = self.client.get(format!("{}/{id}", self.endpoint));
        self.fetch(request).await
    }
}

// In-process provider double with canned responses and call accounting
pub mod mock_provider {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU16, AtomicUsize, Ordering};

    pub struct MockTripProvider {
        routes: Mutex<HashMap<(String, String), Vec<Trip>>>,
        trips: Mutex<HashMap<String, Trip>>,
        // 0 = answer normally
        forced_status: AtomicU16,
        fail_transport: AtomicUsize,
        search_count: AtomicUsize,
        by_id_count: AtomicUsize,
    }

    impl Default for MockTripProvider {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MockTripProvider {
        pub fn new() -> Self {
            Self {
                routes: Mutex::new(HashMap::new()),
                trips: Mutex::new(HashMap::new()),
                forced_status: AtomicU16::new(0),
                fail_transport: AtomicUsize::new(0),
                search_count: AtomicUsize::new(0),
                by_id_count: AtomicUsize::new(0),
            }
        }

        pub fn add_route(&self, origin: &str, destination: &str, trips: Vec<Trip>) {
            for trip in &trips {
                self.add_trip(trip.clone());
            }
            self.routes
                .lock()
                .insert((origin.to_string(), destination.to_string()), trips);
        }

        pub fn add_trip(&self, trip: Trip) {
            self.trips.lock().insert(trip.id.clone(), trip);
        }

        // Every call answers with `status` until reset with 0
        pub fn set_status(&self, status: u16) {
            self.forced_status.store(status, Ordering::SeqCst);
        }

        pub fn fail_next_requests(&self, count: usize) {
            self.fail_transport.store(count, Ordering::SeqCst);
        }

        pub fn search_count(&self) -> usize {
            self.search_count.load(Ordering::SeqCst)
        }

        pub fn by_id_count(&self) -> usize {
            self.by_id_count.load(Ordering::SeqCst)
        }

        fn check_failures(&self) -> Result<Option<u16>, ProviderError> {
            let pending = self.fail_transport.load(Ordering::SeqCst);
            if pending > 0 {
                self.fail_transport.store(pending - 1, Ordering::SeqCst);
                return Err(ProviderError::Other("connection reset".to_string()));
            }

            match self.forced_status.load(Ordering::SeqCst) {
                0 => Ok(None),
                status => Ok(Some(status)),
            }
        }
    }

    #[async_trait]
    impl TripProvider for MockTripProvider {
        async fn search_trips(
            &self,
            origin: &str,
            destination: &str,
        ) -> Result<ProviderResponse<Vec<Trip>>, ProviderError> {
            self.search_count.fetch_add(1, Ordering::SeqCst);

            if let Some(status) = self.check_failures()? {
                return Ok(ProviderResponse::failed(status));
            }

            let trips = self
                .routes
                .lock()
                .get(&(origin.to_string(), destination.to_string()))
                .cloned()
                .unwrap_or_default();
            Ok(ProviderResponse::ok(trips))
        }

        async fn get_trip_by_id(&self, id: &str) -> Result<ProviderResponse<Trip>, ProviderError> {
            self.by_id_count.fetch_add(1, Ordering::SeqCst);

            if let Some(status) = self.check_failures()? {
                return Ok(ProviderResponse::failed(status));
            }

            Ok(match self.trips.lock().get(id) {
                Some(trip) => ProviderResponse::ok(trip.clone()),
                None => ProviderResponse::failed(404),
            })
        }
    }
}
