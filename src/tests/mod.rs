//! Crate-level integration tests and shared test helpers.


use std::time::Duration;

/// Poll `cond` until it holds or roughly two seconds elapse. Used to wait
/// for the dispatch loop to process a structural event.
pub(crate) async fn wait_for(mut cond: impl FnMut() -> bool) -> bool {
    for _ in 0..400 {
        if cond() {
            return true;
        }

        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    false
}
