use std::io;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// # Clock Simulator
/// Runs a unit of work at a fixed frequency on its own thread.
///
/// Every invocation happens on that one thread, so work that overruns its period delays the
/// next tick rather than overlapping it. A clock that falls more than a full period behind
/// resets its schedule instead of bursting to catch up.
pub struct ClockSimulator {
    hz: NonZeroU32,
    period: Duration,
}

impl ClockSimulator {
    pub fn new(hz: NonZeroU32) -> Self {
        ClockSimulator {
            hz,
            period: Duration::from_nanos(1_000_000_000 / u64::from(hz.get())),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Starts calling `work` once per period until it returns `false` or the returned handle
    /// is cancelled.
    pub fn with_clock_regulation<F>(&self, mut work: F) -> io::Result<ClockHandle>
    where
        F: FnMut() -> bool + Send + 'static,
    {
        let cancelled = Arc::new(AtomicBool::new(false));
        let period = self.period;
        let name = format!("{}hz clock", self.hz);

        let thread = {
            let cancelled = Arc::clone(&cancelled);
            thread::Builder::new().name(name.clone()).spawn(move || {
                log::debug!("{} started", name);
                let mut next_tick = Instant::now();
                while !cancelled.load(Ordering::Acquire) {
                    if !work() {
                        break;
                    }

                    next_tick += period;
                    let now = Instant::now();
                    if next_tick > now {
                        thread::sleep(next_tick - now);
                    } else if now - next_tick > period {
                        next_tick = now;
                    }
                }
                log::debug!("{} stopped", name);
            })?
        };

        Ok(ClockHandle { cancelled, thread })
    }
}

/// Controls a running clock.
pub struct ClockHandle {
    cancelled: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

impl ClockHandle {
    /// Stops scheduling further work. An invocation already underway runs to completion.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Whether the clock has stopped, either on its own or after being cancelled.
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Waits for the clock thread to exit.
    pub fn join(self) {
        if self.thread.join().is_err() {
            log::error!("clock thread panicked");
        }
    }
}
