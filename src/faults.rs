use std::time::Duration;

use rand::{thread_rng, Rng};
use tracing::info;

use crate::error::ApiError;
use crate::router::FaultPolicy;

/// Upper bound (exclusive) for the random pre-response delay, in milliseconds.
const SLEEP_UPPER_MS: u64 = 5000;

/// Injected randomness so tests can script exact delay/failure sequences
/// instead of asserting on statistics.
pub trait RandomSource: Send + Sync {
    /// Uniform value in [0, upper).
    fn below(&self, upper: u64) -> u64;
}

pub struct ThreadRngSource;

impl RandomSource for ThreadRngSource {
    fn below(&self, upper: u64) -> u64 {
        thread_rng().gen_range(0..upper)
    }
}

/// Apply a fault policy before the request is handled. `Ok(())` means
/// delegate to the real handler (possibly after sleeping); `Err` aborts the
/// request with an injected 500. One-shot per request, no retries.
pub async fn apply(policy: FaultPolicy, random: &dyn RandomSource) -> Result<(), ApiError> {
    match policy {
        FaultPolicy::Passthrough => Ok(()),
        FaultPolicy::RandomSleep => {
            random_sleep(random).await;
            Ok(())
        }
        FaultPolicy::RandomFail => {
            if coin_flip(random) {
                Err(ApiError::InjectedFailure)
            } else {
                Ok(())
            }
        }
        // Nested composition: half the requests take the RandomFail path
        // (with its own inner flip, so net 25% failure), the other half
        // sleep and then succeed. The asymmetry is deliberate.
        FaultPolicy::RandomAll => {
            if coin_flip(random) {
                if coin_flip(random) {
                    Err(ApiError::InjectedFailure)
                } else {
                    Ok(())
                }
            } else {
                random_sleep(random).await;
                Ok(())
            }
        }
    }
}

fn coin_flip(random: &dyn RandomSource) -> bool {
    random.below(10) < 5
}

async fn random_sleep(random: &dyn RandomSource) {
    let millis = random.below(SLEEP_UPPER_MS);
    info!("injecting {}ms delay", millis);
    tokio::time::sleep(Duration::from_millis(millis)).await;
}
