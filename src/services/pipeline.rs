//! Fetch pipeline for one location submission.
//!
//! Flow per submission:
//! - `Loading`: the query is recorded and a new generation number taken
//! - current conditions are fetched; failure moves to `Failed` and clears
//!   everything downstream
//! - success moves to `Ready`, persists the query, then fetches the forecast
//!   with the returned coordinates; forecast failure is logged and leaves the
//!   forecast empty
//!
//! Submissions are not cancelled when a newer one starts. Instead each
//! completion checks its generation against the state and is dropped if a
//! newer submission has begun, so the latest query always wins.
//!
//! State is in-memory (`Arc<RwLock<PipelineState>>`) and shared with the view.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::models::{CurrentConditions, ForecastSample};
use crate::services::forecast::fetch_forecast;
use crate::services::openweather::OpenWeatherClient;
use crate::store::kv::SharedStore;
use crate::store::preferences::save_last_location;

// ---------------------------------------------------------------------------
// Pipeline state (in-memory, shared via Arc<RwLock<>>)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStatus {
    Idle,
    Loading,
    Ready,
    Failed,
}

#[derive(Debug, Clone)]
pub struct PipelineState {
    pub status: PipelineStatus,
    /// Query of the newest submission.
    pub query: Option<String>,
    pub current: Option<CurrentConditions>,
    /// Always empty or exactly six samples.
    pub forecast: Vec<ForecastSample>,
    /// User-facing error message, set only in `Failed`.
    pub error: Option<String>,
    pub generation: u64,
    pub last_completed_at: Option<DateTime<Utc>>,
}

impl PipelineState {
    pub fn new() -> Self {
        Self {
            status: PipelineStatus::Idle,
            query: None,
            current: None,
            forecast: Vec::new(),
            error: None,
            generation: 0,
            last_completed_at: None,
        }
    }

    /// Enter `Loading` for a new submission and return its generation.
    fn begin(&mut self, query: &str) -> u64 {
        self.generation += 1;
        self.status = PipelineStatus::Loading;
        self.query = Some(query.to_string());
        self.error = None;
        self.generation
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }
}

impl Default for PipelineState {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared pipeline state handle.
pub type SharedPipelineState = Arc<RwLock<PipelineState>>;

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct WeatherPipeline {
    client: OpenWeatherClient,
    store: SharedStore,
    state: SharedPipelineState,
}

impl WeatherPipeline {
    pub fn new(client: OpenWeatherClient, store: SharedStore) -> Self {
        Self {
            client,
            store,
            state: Arc::new(RwLock::new(PipelineState::new())),
        }
    }

    pub async fn snapshot(&self) -> PipelineState {
        self.state.read().await.clone()
    }

    /// Run the pipeline for one submitted location and return the resulting state.
    ///
    /// A blank query performs no request and leaves the state untouched.
    pub async fn submit(&self, query: &str) -> PipelineState {
        let query = query.trim();
        if query.is_empty() {
            tracing::debug!("Ignoring blank location query");
            return self.snapshot().await;
        }

        let generation = self.state.write().await.begin(query);
        tracing::debug!("Submission #{} for '{}'", generation, query);

        // 1. Current conditions (fatal on failure)
        let current = match self.client.fetch_current(query).await {
            Ok(current) => current,
            Err(e) => {
                tracing::info!("Location lookup for '{}' failed: {}", query, e);
                let mut s = self.state.write().await;
                if !s.is_current(generation) {
                    tracing::debug!("Dropping stale failure for submission #{}", generation);
                    return s.clone();
                }
                s.status = PipelineStatus::Failed;
                s.current = None;
                s.forecast.clear();
                s.error = Some(e.user_message());
                s.last_completed_at = Some(Utc::now());
                return s.clone();
            }
        };

        let coordinates = current.coordinates;
        {
            let mut s = self.state.write().await;
            if !s.is_current(generation) {
                tracing::debug!("Dropping stale conditions for submission #{}", generation);
                return s.clone();
            }
            tracing::info!(
                "Fetched current conditions for '{}' → {} ({:.4}, {:.4})",
                query,
                current.name,
                coordinates.lat,
                coordinates.lon
            );
            s.status = PipelineStatus::Ready;
            s.current = Some(current);
            s.forecast.clear();
            s.last_completed_at = Some(Utc::now());
        }

        if let Err(e) = save_last_location(self.store.as_ref(), query) {
            tracing::warn!("Failed to persist last location '{}': {}", query, e);
        }

        // 2. Forecast (best effort, only after conditions succeeded)
        let forecast = match fetch_forecast(&self.client, coordinates.lat, coordinates.lon).await {
            Ok(samples) => samples,
            Err(e) => {
                tracing::warn!("Forecast for '{}' unavailable: {}", query, e);
                return self.snapshot().await;
            }
        };

        let mut s = self.state.write().await;
        if !s.is_current(generation) {
            tracing::debug!("Dropping stale forecast for submission #{}", generation);
            return s.clone();
        }
        tracing::info!("Fetched {} forecast samples for '{}'", forecast.len(), query);
        s.forecast = forecast;
        s.last_completed_at = Some(Utc::now());
        s.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::LOCATION_NOT_FOUND_MESSAGE;
    use crate::services::forecast::FORECAST_LEN;
    use crate::services::openweather::tests::{current_json, forecast_json};
    use crate::store::kv::{KeyValueStore, MemoryStore};
    use crate::store::preferences::LAST_LOCATION_KEY;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn pipeline_for(server: &MockServer) -> (WeatherPipeline, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let client = OpenWeatherClient::new(&server.uri(), "test-key", "WeatherWidget/test").unwrap();
        (WeatherPipeline::new(client, store.clone()), store)
    }

    async fn mount_current(server: &MockServer, query: &str, name: &str, lat: f64, lon: f64) {
        Mock::given(method("GET"))
            .and(path("/weather"))
            .and(query_param("q", query))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(current_json(name, 280.0, lat, lon)),
            )
            .mount(server)
            .await;
    }

    async fn mount_forecast(server: &MockServer, template: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(template)
            .mount(server)
            .await;
    }

    #[test]
    fn test_initial_state_is_idle() {
        let state = PipelineState::new();
        assert_eq!(state.status, PipelineStatus::Idle);
        assert!(state.current.is_none());
        assert!(state.forecast.is_empty());
    }

    #[test]
    fn test_begin_clears_error_and_bumps_generation() {
        let mut state = PipelineState::new();
        state.error = Some("old".to_string());
        assert_eq!(state.begin("Zurich"), 1);
        assert_eq!(state.begin("Bern"), 2);
        assert_eq!(state.status, PipelineStatus::Loading);
        assert_eq!(state.query.as_deref(), Some("Bern"));
        assert!(state.error.is_none());
        assert!(!state.is_current(1));
    }

    #[tokio::test]
    async fn test_success_with_forecast() {
        let server = MockServer::start().await;
        mount_current(&server, "Zurich", "Zurich", 47.37, 8.55).await;
        Mock::given(method("GET"))
            .and(path("/forecast"))
            .and(query_param("lat", "47.37"))
            .and(query_param("lon", "8.55"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_json(40)))
            .expect(1)
            .mount(&server)
            .await;

        let (pipeline, store) = pipeline_for(&server);
        let state = pipeline.submit("Zurich").await;

        assert_eq!(state.status, PipelineStatus::Ready);
        assert_eq!(state.current.as_ref().map(|c| c.name.as_str()), Some("Zurich"));
        assert_eq!(state.forecast.len(), FORECAST_LEN);
        assert_eq!(state.forecast[4], state.forecast[5]);
        assert!(state.error.is_none());
        assert!(state.last_completed_at.is_some());
        assert_eq!(
            store.get(LAST_LOCATION_KEY).unwrap().as_deref(),
            Some("Zurich")
        );
    }

    #[tokio::test]
    async fn test_forecast_failure_keeps_ready_with_empty_forecast() {
        let server = MockServer::start().await;
        mount_current(&server, "Zurich", "Zurich", 47.37, 8.55).await;
        mount_forecast(&server, ResponseTemplate::new(500)).await;

        let (pipeline, _store) = pipeline_for(&server);
        let state = pipeline.submit("Zurich").await;

        assert_eq!(state.status, PipelineStatus::Ready);
        assert!(state.current.is_some());
        assert!(state.forecast.is_empty());
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn test_short_forecast_series_yields_empty_forecast() {
        let server = MockServer::start().await;
        mount_current(&server, "Zurich", "Zurich", 47.37, 8.55).await;
        mount_forecast(
            &server,
            ResponseTemplate::new(200).set_body_json(forecast_json(12)),
        )
        .await;

        let (pipeline, _store) = pipeline_for(&server);
        let state = pipeline.submit("Zurich").await;

        assert_eq!(state.status, PipelineStatus::Ready);
        assert!(state.forecast.is_empty());
    }

    #[tokio::test]
    async fn test_failure_clears_previous_results() {
        let server = MockServer::start().await;
        mount_current(&server, "Zurich", "Zurich", 47.37, 8.55).await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .and(query_param("q", "Atlantis"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        mount_forecast(
            &server,
            ResponseTemplate::new(200).set_body_json(forecast_json(40)),
        )
        .await;

        let (pipeline, store) = pipeline_for(&server);
        let first = pipeline.submit("Zurich").await;
        assert_eq!(first.status, PipelineStatus::Ready);
        assert_eq!(first.forecast.len(), FORECAST_LEN);

        let state = pipeline.submit("Atlantis").await;
        assert_eq!(state.status, PipelineStatus::Failed);
        assert!(state.current.is_none());
        assert!(state.forecast.is_empty());
        assert_eq!(state.error.as_deref(), Some(LOCATION_NOT_FOUND_MESSAGE));
        // Failed lookups are not remembered
        assert_eq!(
            store.get(LAST_LOCATION_KEY).unwrap().as_deref(),
            Some("Zurich")
        );
    }

    #[tokio::test]
    async fn test_forecast_failure_drops_previous_forecast() {
        let server = MockServer::start().await;
        mount_current(&server, "Zurich", "Zurich", 47.37, 8.55).await;
        mount_current(&server, "Bern", "Bern", 46.95, 7.45).await;
        Mock::given(method("GET"))
            .and(path("/forecast"))
            .and(query_param("lat", "47.37"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_json(40)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/forecast"))
            .and(query_param("lat", "46.95"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let (pipeline, _store) = pipeline_for(&server);
        let first = pipeline.submit("Zurich").await;
        assert_eq!(first.forecast.len(), FORECAST_LEN);

        // Zurich's samples must not linger under Bern's conditions
        let state = pipeline.submit("Bern").await;
        assert_eq!(state.status, PipelineStatus::Ready);
        assert_eq!(state.current.as_ref().map(|c| c.name.as_str()), Some("Bern"));
        assert!(state.forecast.is_empty());
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn test_failure_from_idle() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        // The forecast endpoint must never be reached after a failed lookup
        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_json(40)))
            .expect(0)
            .mount(&server)
            .await;

        let (pipeline, store) = pipeline_for(&server);
        let state = pipeline.submit("Zurich").await;

        assert_eq!(state.status, PipelineStatus::Failed);
        assert!(state.current.is_none());
        assert!(state.forecast.is_empty());
        assert_eq!(store.get(LAST_LOCATION_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_recovers_after_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .and(query_param("q", "Atlantis"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        mount_current(&server, "Bern", "Bern", 46.95, 7.45).await;
        mount_forecast(
            &server,
            ResponseTemplate::new(200).set_body_json(forecast_json(40)),
        )
        .await;

        let (pipeline, _store) = pipeline_for(&server);
        assert_eq!(
            pipeline.submit("Atlantis").await.status,
            PipelineStatus::Failed
        );

        let state = pipeline.submit("Bern").await;
        assert_eq!(state.status, PipelineStatus::Ready);
        assert!(state.error.is_none());
        assert_eq!(state.forecast.len(), FORECAST_LEN);
    }

    #[tokio::test]
    async fn test_blank_query_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let (pipeline, _store) = pipeline_for(&server);
        let state = pipeline.submit("   ").await;

        assert_eq!(state.status, PipelineStatus::Idle);
        assert_eq!(state.generation, 0);
        assert!(state.query.is_none());
    }

    #[tokio::test]
    async fn test_query_is_trimmed() {
        let server = MockServer::start().await;
        mount_current(&server, "Zurich", "Zurich", 47.37, 8.55).await;
        mount_forecast(&server, ResponseTemplate::new(500)).await;

        let (pipeline, store) = pipeline_for(&server);
        let state = pipeline.submit("  Zurich ").await;

        assert_eq!(state.status, PipelineStatus::Ready);
        assert_eq!(state.query.as_deref(), Some("Zurich"));
        assert_eq!(
            store.get(LAST_LOCATION_KEY).unwrap().as_deref(),
            Some("Zurich")
        );
    }

    #[tokio::test]
    async fn test_slow_earlier_submission_does_not_overwrite_later_one() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .and(query_param("q", "Slowtown"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(current_json("Slowtown", 250.0, 10.0, 10.0))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;
        mount_current(&server, "Fastville", "Fastville", 20.0, 20.0).await;
        mount_forecast(
            &server,
            ResponseTemplate::new(200).set_body_json(forecast_json(40)),
        )
        .await;

        let (pipeline, store) = pipeline_for(&server);

        let slow = {
            let pipeline = pipeline.clone();
            tokio::spawn(async move { pipeline.submit("Slowtown").await })
        };
        // Let the slow submission start and take its generation first
        tokio::time::sleep(Duration::from_millis(100)).await;

        let fast = pipeline.submit("Fastville").await;
        assert_eq!(fast.status, PipelineStatus::Ready);

        tokio_test::assert_ok!(slow.await);

        let state = pipeline.snapshot().await;
        assert_eq!(state.status, PipelineStatus::Ready);
        assert_eq!(state.query.as_deref(), Some("Fastville"));
        assert_eq!(
            state.current.as_ref().map(|c| c.name.as_str()),
            Some("Fastville")
        );
        assert_eq!(state.forecast.len(), FORECAST_LEN);
        assert_eq!(
            store.get(LAST_LOCATION_KEY).unwrap().as_deref(),
            Some("Fastville")
        );
    }
}
