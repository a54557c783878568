//! # Side-Effect Runner
//!
//! Side effects of a stage move are an ordered list of independent futures,
//! each wrapped catch-and-log. A failure is recorded and the next effect
//! still runs; nothing here can roll back the primary change.

use shared_types::RemoteError;
use std::future::Future;
use std::pin::Pin;
use tracing::{debug, warn};

type EffectFuture = Pin<Box<dyn Future<Output = Result<(), RemoteError>> + Send>>;

/// One named, fallible side effect.
pub struct SideEffect {
    name: &'static str,
    future: EffectFuture,
}

impl SideEffect {
    /// Wrap a future as a named side effect.
    pub fn new<F>(name: &'static str, future: F) -> Self
    where
        F: Future<Output = Result<(), RemoteError>> + Send + 'static,
    {
        Self {
            name,
            future: Box::pin(future),
        }
    }
}

/// Run the effects in order, logging each failure and continuing.
///
/// Returns the number of effects that failed, for observability only.
pub async fn run_effects(effects: Vec<SideEffect>) -> usize {
    let mut failures = 0;
    for effect in effects {
        match effect.future.await {
            Ok(()) => debug!(effect = effect.name, "Side effect completed"),
            Err(err) => {
                failures += 1;
                warn!(effect = effect.name, error = %err, "Side effect failed");
            }
        }
    }
    failures
}
