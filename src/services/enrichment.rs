//! Sampling and weather enrichment of fetched positions.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::{BalloonPosition, EnrichedPosition};
use crate::services::weather::WeatherClient;

/// Upper bound on balloons enriched (and displayed) per load cycle. Also caps
/// the number of concurrent weather lookups.
pub const MAX_SAMPLED_BALLOONS: usize = 50;

/// Uniformly sample at most `cap` positions.
///
/// The result order is the shuffled order; it carries no relation to the
/// fetch order.
pub fn sample_positions<R: Rng + ?Sized>(
    mut positions: Vec<BalloonPosition>,
    rng: &mut R,
    cap: usize,
) -> Vec<BalloonPosition> {
    positions.shuffle(rng);
    positions.truncate(cap);
    positions
}

/// Sample the fetched positions and attach a weather estimate to each.
///
/// All lookups run concurrently and the call completes once every lookup
/// has resolved, so the slowest lookup bounds the whole step.
pub async fn enrich<R: Rng + ?Sized>(
    positions: Vec<BalloonPosition>,
    weather_client: &WeatherClient,
    rng: &mut R,
) -> Vec<EnrichedPosition> {
    let sampled = sample_positions(positions, rng, MAX_SAMPLED_BALLOONS);

    let lookups = sampled.into_iter().map(|position| async move {
        let weather = weather_client.estimate(position.lat, position.lon).await;
        EnrichedPosition {
            position,
            weather: Some(weather),
        }
    });

    let enriched = futures::future::join_all(lookups).await;
    tracing::debug!("Enriched {} sampled balloons", enriched.len());
    enriched
}
