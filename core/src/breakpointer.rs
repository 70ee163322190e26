use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

struct Flags {
    should_wait: bool,
    waiting: bool,
}

/// # Breakpointer
/// A pause point that the CPU passes through before every step.
///
/// While `should_wait` is set, each call to `wait_for_signal` parks the caller until another
/// thread calls `end_wait`. Changing `should_wait` only affects the next call; it never releases
/// a caller that is already parked.
pub struct Breakpointer {
    flags: Mutex<Flags>,
    signal: Condvar,
}

impl Breakpointer {
    pub fn new(start_wait: bool) -> Self {
        Breakpointer {
            flags: Mutex::new(Flags {
                should_wait: start_wait,
                waiting: false,
            }),
            signal: Condvar::new(),
        }
    }

    pub fn set_should_wait(&self, should_wait: bool) {
        self.lock().should_wait = should_wait;
    }

    pub fn should_wait(&self) -> bool {
        self.lock().should_wait
    }

    /// Whether some thread is currently parked in `wait_for_signal`.
    pub fn is_waiting(&self) -> bool {
        self.lock().waiting
    }

    /// Releases a parked caller. Does nothing if nobody is parked.
    pub fn end_wait(&self) {
        let mut flags = self.lock();
        if flags.waiting {
            flags.waiting = false;
            self.signal.notify_all();
        }
    }

    /// Returns immediately unless `should_wait` is set, otherwise parks until `end_wait`.
    pub fn wait_for_signal(&self) {
        let mut flags = self.lock();
        if !flags.should_wait {
            return;
        }

        flags.waiting = true;
        while flags.waiting {
            flags = self
                .signal
                .wait(flags)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn lock(&self) -> MutexGuard<'_, Flags> {
        self.flags.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Breakpointer {
    fn default() -> Self {
        Self::new(false)
    }
}
