//! Execution contexts that drive the countdown's ticks.
//!
//! Two [`TickSource`](pomo_core::timer::TickSource) implementations are
//! provided. [`BackgroundTickSource`] runs on a dedicated worker thread and is
//! unaffected by how busy the async runtime is; [`IntervalTickSource`] is a
//! plain interval task on the runtime. One is chosen at initialization by
//! [`select_tick_source`]; they are never active together for one timer.

mod background;
mod interval;

pub use background::BackgroundTickSource;
pub use interval::IntervalTickSource;

use pomo_core::timer::{TickSource, TickSourceKind};
use std::sync::Arc;

/// Builds the tick source for `preference`, falling back to the interval
/// source when the background worker cannot be started.
///
/// # Arguments
///
/// * `preference` - Configured execution context
/// * `runtime` - Runtime the interval source spawns onto
///
/// # Returns
///
/// The selected source. Selection happens once; the result is shared by the
/// engine for its whole life.
pub fn select_tick_source(
    preference: TickSourceKind,
    runtime: tokio::runtime::Handle,
) -> Arc<dyn TickSource> {
    match preference {
        TickSourceKind::Background => match BackgroundTickSource::spawn() {
            Ok(source) => {
                tracing::info!("[TickSource] Using background worker thread");
                Arc::new(source)
            }
            Err(e) => {
                tracing::warn!(
                    "[TickSource] Background worker unavailable, falling back to interval: {}",
                    e
                );
                Arc::new(IntervalTickSource::new(runtime))
            }
        },
        TickSourceKind::Interval => {
            tracing::info!("[TickSource] Using runtime interval");
            Arc::new(IntervalTickSource::new(runtime))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_selection_honours_preference() {
        let handle = tokio::runtime::Handle::current();
        let background = select_tick_source(TickSourceKind::Background, handle.clone());
        assert_eq!(background.name(), "background");
        let interval = select_tick_source(TickSourceKind::Interval, handle);
        assert_eq!(interval.name(), "interval");
    }
}
