//! Optimistic local updates.
//!
//! The tentative change is applied before the backend answers and rolled
//! back if the request fails.
use anyhow::Result;
use log::debug;
use std::future::Future;

/// Apply `tentative` to `state`, await `request`, restore the previous state on error
pub async fn apply<S, F, Fut, T>(state: &mut S, tentative: F, request: Fut) -> Result<T>
where
    S: Clone,
    F: FnOnce(&mut S),
    Fut: Future<Output = Result<T>>,
{
    let snapshot = state.clone();
    tentative(state);

    match request.await {
        Ok(confirmed) => Ok(confirmed),
        Err(e) => {
            debug!("Rolling back optimistic update: {}", e);
            *state = snapshot;
            Err(e)
        }
    }
}
