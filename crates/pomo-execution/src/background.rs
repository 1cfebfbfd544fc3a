//! Worker-thread tick source.
//!
//! A single long-lived thread is spawned when the source is created. Tickers
//! are registered over a channel; the thread sleeps until the nearest deadline
//! with `recv_timeout`, so a new registration or shutdown wakes it early.
//! Deadlines are computed from `Instant`, and a callback never fires before its
//! deadline.

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use pomo_core::error::{PomoError, Result};
use pomo_core::timer::{TickCallback, TickHandle, TickSource};
use std::thread;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

enum Command {
    Schedule(Ticker),
    Shutdown,
}

struct Ticker {
    token: CancellationToken,
    period: Duration,
    next_deadline: Instant,
    on_tick: TickCallback,
}

pub struct BackgroundTickSource {
    commands: Sender<Command>,
}

impl BackgroundTickSource {
    /// Spawns the worker thread.
    ///
    /// # Returns
    ///
    /// - `Ok(Self)`: Worker running
    /// - `Err(PomoError::Unavailable)`: The OS refused to create the thread
    pub fn spawn() -> Result<Self> {
        let (tx, rx) = crossbeam_channel::unbounded();
        thread::Builder::new()
            .name("pomo-ticker".to_string())
            .spawn(move || run_worker(rx))
            .map_err(|e| PomoError::unavailable(format!("failed to spawn tick worker: {}", e)))?;
        tracing::debug!("[TickSource] Background worker started");
        Ok(Self { commands: tx })
    }
}

impl TickSource for BackgroundTickSource {
    fn name(&self) -> &'static str {
        "background"
    }

    fn schedule(&self, period: Duration, on_tick: TickCallback) -> Result<TickHandle> {
        if period.is_zero() {
            return Err(PomoError::validation("tick_period", "must be greater than zero"));
        }
        let token = CancellationToken::new();
        let ticker = Ticker {
            token: token.clone(),
            period,
            next_deadline: Instant::now() + period,
            on_tick,
        };
        self.commands
            .send(Command::Schedule(ticker))
            .map_err(|_| PomoError::unavailable("tick worker has stopped"))?;
        Ok(TickHandle::new(token))
    }
}

impl Drop for BackgroundTickSource {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Shutdown);
    }
}

fn run_worker(commands: Receiver<Command>) {
    let mut tickers: Vec<Ticker> = Vec::new();

    loop {
        tickers.retain(|t| !t.token.is_cancelled());

        let received = match tickers.iter().map(|t| t.next_deadline).min() {
            Some(deadline) => {
                let wait = deadline.saturating_duration_since(Instant::now());
                commands.recv_timeout(wait)
            }
            None => commands.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        match received {
            Ok(Command::Schedule(ticker)) => tickers.push(ticker),
            Ok(Command::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }

        let now = Instant::now();
        for ticker in tickers.iter_mut() {
            if ticker.next_deadline > now || ticker.token.is_cancelled() {
                continue;
            }
            (ticker.on_tick)();
            ticker.next_deadline += ticker.period;
            if ticker.next_deadline <= now {
                // The thread was descheduled for more than a period. One call
                // is enough; the countdown catches up from its reference clock.
                ticker.next_deadline = now + ticker.period;
            }
        }
    }

    tracing::debug!("[TickSource] Background worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_callback() -> (Arc<AtomicUsize>, TickCallback) {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        (
            hits,
            Arc::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        )
    }

    #[test]
    fn test_ticks_repeat_until_cancelled() {
        let source = BackgroundTickSource::spawn().unwrap();
        let (hits, callback) = counting_callback();

        let handle = source.schedule(Duration::from_millis(10), callback).unwrap();
        thread::sleep(Duration::from_millis(120));
        handle.cancel();
        let at_cancel = hits.load(Ordering::SeqCst);
        assert!(at_cancel >= 3, "expected several ticks, got {}", at_cancel);

        thread::sleep(Duration::from_millis(60));
        // At most one callback could have been in flight when cancelled
        assert!(hits.load(Ordering::SeqCst) <= at_cancel + 1);
    }

    #[test]
    fn test_no_tick_before_first_period() {
        let source = BackgroundTickSource::spawn().unwrap();
        let (hits, callback) = counting_callback();

        let _handle = source.schedule(Duration::from_millis(300), callback).unwrap();
        thread::sleep(Duration::from_millis(50));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_dropping_handle_stops_ticker() {
        let source = BackgroundTickSource::spawn().unwrap();
        let (hits, callback) = counting_callback();

        let handle = source.schedule(Duration::from_millis(10), callback).unwrap();
        drop(handle);
        thread::sleep(Duration::from_millis(60));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_zero_period_rejected() {
        let source = BackgroundTickSource::spawn().unwrap();
        let (_, callback) = counting_callback();
        assert!(source.schedule(Duration::ZERO, callback).is_err());
    }
}
