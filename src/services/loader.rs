//! Balloon load cycle.
//!
//! One cycle runs fetch → empty check → sample + enrich and ends in exactly
//! one terminal state. The displayed state is a tagged enum so that
//! impossible combinations (loading with an error set, data alongside an
//! error) cannot be represented.
//!
//! Architecture:
//! - State is in-memory (`Arc<RwLock<LoadState>>`) and read by the HTTP handlers
//! - One cycle at a time: `start` takes an owned guard on a shared mutex and
//!   holds it until the terminal state is stored; a second `start` while a
//!   cycle is running fails with `AppError::LoadInProgress`
//! - The pipeline runs in its own task, so a panic inside it becomes
//!   `LoadError::Failed` instead of leaving the state stuck at `Loading`

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use utoipa::ToSchema;

use crate::errors::{AppError, LoadError};
use crate::models::EnrichedPosition;
use crate::services::enrichment::enrich;
use crate::services::positions::TreasureClient;
use crate::services::weather::WeatherClient;

/// What the user currently sees.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LoadState {
    /// A load cycle is running.
    Loading,
    /// The last cycle ended without displayable data.
    Error { message: String },
    /// The last cycle produced enriched balloons.
    Loaded {
        balloons: Vec<EnrichedPosition>,
        loaded_at: DateTime<Utc>,
    },
}

impl LoadState {
    /// Short label for health reporting.
    pub fn label(&self) -> &'static str {
        match self {
            LoadState::Loading => "loading",
            LoadState::Error { .. } => "error",
            LoadState::Loaded { .. } => "loaded",
        }
    }
}

impl From<Result<Vec<EnrichedPosition>, LoadError>> for LoadState {
    fn from(outcome: Result<Vec<EnrichedPosition>, LoadError>) -> Self {
        match outcome {
            Ok(balloons) => LoadState::Loaded {
                balloons,
                loaded_at: Utc::now(),
            },
            Err(e) => {
                if let LoadError::Failed(detail) = &e {
                    tracing::error!("Balloon load cycle failed: {}", detail);
                }
                LoadState::Error {
                    message: e.to_string(),
                }
            }
        }
    }
}

/// Shared load state handle.
pub type SharedLoadState = Arc<RwLock<LoadState>>;

/// Runs load cycles and publishes their outcome.
#[derive(Debug, Clone)]
pub struct BalloonLoader {
    treasure_client: TreasureClient,
    weather_client: WeatherClient,
    state: SharedLoadState,
    in_flight: Arc<Mutex<()>>,
}

impl BalloonLoader {
    pub fn new(treasure_client: TreasureClient, weather_client: WeatherClient) -> Self {
        Self {
            treasure_client,
            weather_client,
            state: Arc::new(RwLock::new(LoadState::Loading)),
            in_flight: Arc::new(Mutex::new(())),
        }
    }

    pub fn state(&self) -> SharedLoadState {
        self.state.clone()
    }

    /// Start a new load cycle in the background.
    ///
    /// The state switches to `Loading` immediately. Returns the handle of
    /// the cycle task, which resolves once the terminal state is stored.
    pub async fn start(&self) -> Result<JoinHandle<()>, AppError> {
        let guard = self
            .in_flight
            .clone()
            .try_lock_owned()
            .map_err(|_| AppError::LoadInProgress)?;

        *self.state.write().await = LoadState::Loading;
        tracing::info!("Balloon load cycle started");

        let loader = self.clone();
        Ok(tokio::spawn(async move {
            let _guard = guard;
            let started = Utc::now();

            let pipeline = loader.clone();
            let outcome = run_isolated(async move {
                let mut rng = StdRng::from_entropy();
                pipeline.load_balloons(&mut rng).await
            })
            .await;

            let next = LoadState::from(outcome);
            tracing::info!(
                "Balloon load cycle finished in {} ms: {}",
                (Utc::now() - started).num_milliseconds(),
                next.label()
            );
            *loader.state.write().await = next;
        }))
    }

    /// Run the pipeline once with the given random source.
    ///
    /// Returns `LoadError::NoData` when no hour produced a valid position.
    pub async fn load_balloons<R: Rng + Send + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Result<Vec<EnrichedPosition>, LoadError> {
        let positions = self.treasure_client.fetch_all_positions().await;
        if positions.is_empty() {
            tracing::warn!("No balloon positions available from any hour");
            return Err(LoadError::NoData);
        }

        Ok(enrich(positions, &self.weather_client, rng).await)
    }
}

/// Run a cycle future in its own task.
///
/// A panic inside the future ends up as `LoadError::Failed` carrying the
/// panic detail.
async fn run_isolated<F>(cycle: F) -> Result<Vec<EnrichedPosition>, LoadError>
where
    F: Future<Output = Result<Vec<EnrichedPosition>, LoadError>> + Send + 'static,
{
    match tokio::spawn(cycle).await {
        Ok(outcome) => outcome,
        Err(e) => Err(LoadError::Failed(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn loader_for(treasure: &MockServer) -> BalloonLoader {
        BalloonLoader::new(
            TreasureClient::new(&treasure.uri()),
            WeatherClient::new("http://unused.test", ""),
        )
    }

    #[tokio::test]
    async fn test_initial_state_is_loading() {
        let loader = BalloonLoader::new(
            TreasureClient::new("http://unused.test"),
            WeatherClient::new("http://unused.test", ""),
        );
        assert_eq!(*loader.state().read().await, LoadState::Loading);
    }

    #[test]
    fn test_state_from_outcome() {
        let state = LoadState::from(Err(LoadError::NoData));
        assert_eq!(
            state,
            LoadState::Error {
                message: "No balloon data available".to_string()
            }
        );
        assert_eq!(state.label(), "error");

        let state = LoadState::from(Ok(Vec::new()));
        assert_eq!(state.label(), "loaded");
    }

    #[test]
    fn test_state_from_failed_outcome() {
        let state = LoadState::from(Err(LoadError::Failed("boom".into())));
        assert_eq!(
            state,
            LoadState::Error {
                message: "Failed to load balloon data".to_string()
            }
        );
        assert_eq!(state.label(), "error");
    }

    #[tokio::test]
    async fn test_run_isolated_maps_panic_to_failed() {
        let outcome = run_isolated(async {
            if true {
                panic!("pipeline blew up");
            }
            Ok(Vec::new())
        })
        .await;

        match outcome {
            Err(LoadError::Failed(detail)) => assert!(detail.contains("panic")),
            other => panic!("expected failed outcome, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_run_isolated_passes_outcome_through() {
        assert_eq!(
            run_isolated(async { Err(LoadError::NoData) }).await,
            Err(LoadError::NoData)
        );
        assert_eq!(run_isolated(async { Ok(Vec::new()) }).await, Ok(Vec::new()));
    }

    #[test]
    fn test_state_serializes_tagged() {
        let json = serde_json::to_value(LoadState::Error {
            message: "Failed to load balloon data".to_string(),
        })
        .unwrap();
        assert_eq!(json["state"], "error");
        assert_eq!(json["message"], "Failed to load balloon data");

        let json = serde_json::to_value(LoadState::Loading).unwrap();
        assert_eq!(json, json!({ "state": "loading" }));
    }

    #[tokio::test]
    async fn test_load_balloons_single_record() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/00.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([[10, 20, 5]])))
            .mount(&server)
            .await;

        let loader = loader_for(&server);
        let mut rng = StdRng::seed_from_u64(1);
        let balloons = loader.load_balloons(&mut rng).await.unwrap();

        assert_eq!(balloons.len(), 1);
        assert_eq!(balloons[0].position.id, "0-0");
        assert!(balloons[0].weather.is_some());
    }

    #[tokio::test]
    async fn test_load_balloons_no_data() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let loader = loader_for(&server);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            loader.load_balloons(&mut rng).await,
            Err(LoadError::NoData)
        );
    }

    #[tokio::test]
    async fn test_start_reaches_error_state_when_all_hours_fail() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let loader = loader_for(&server);
        loader.start().await.unwrap().await.unwrap();

        let state = loader.state();
        assert_eq!(
            *state.read().await,
            LoadState::Error {
                message: "No balloon data available".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_start_reaches_loaded_state() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/04.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([[1, 2, 16], [3, 4, 12]])))
            .mount(&server)
            .await;

        let loader = loader_for(&server);
        loader.start().await.unwrap().await.unwrap();

        match &*loader.state().read().await {
            LoadState::Loaded { balloons, .. } => assert_eq!(balloons.len(), 2),
            other => panic!("expected loaded state, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_start_rejects_overlapping_cycle() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([[1, 2, 3]]))
                    .set_delay(std::time::Duration::from_millis(20)),
            )
            .mount(&server)
            .await;

        let loader = loader_for(&server);
        let first = loader.start().await.unwrap();

        assert!(matches!(
            loader.start().await,
            Err(AppError::LoadInProgress)
        ));
        assert_eq!(*loader.state().read().await, LoadState::Loading);

        first.await.unwrap();
        // Guard released once the first cycle stored its terminal state
        let second = loader.start().await.unwrap();
        second.await.unwrap();
        assert_eq!(loader.state().read().await.label(), "loaded");
    }
}
