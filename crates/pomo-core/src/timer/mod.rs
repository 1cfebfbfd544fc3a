//! Countdown state machine and the seams it is driven through.
//!
//! [`Countdown`] is pure: it never reads a clock or schedules anything itself.
//! Callers pass in the current [`Instant`](std::time::Instant) from a [`Clock`]
//! and drive ticks from a [`TickSource`]. Every operation returns the
//! [`TimerSignal`]s it produced, in order.

pub mod clock;
pub mod countdown;
pub mod signal;
pub mod state;
pub mod tick;
pub mod visibility;

#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;

pub use clock::{Clock, MonotonicClock};
pub use countdown::Countdown;
pub use signal::TimerSignal;
pub use state::{RunState, TimerSnapshot, format_clock};
pub use tick::{TickCallback, TickHandle, TickSource, TickSourceKind};
pub use visibility::Visibility;
