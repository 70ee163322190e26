use std::io;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::clock::{ClockHandle, ClockSimulator};
use crate::constants::{CLOCK_SPEED, TIMER_SPEED};
use crate::cpu::{Cpu, StepResult};

/// How a session drives its CPU.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Instructions per second.
    pub cpu_hz: NonZeroU32,
    /// Timer decrements per second.
    pub timer_hz: NonZeroU32,
    /// Start with the breakpoint armed, so nothing runs until the first `end_wait`.
    pub start_paused: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            cpu_hz: NonZeroU32::new(CLOCK_SPEED).unwrap_or(NonZeroU32::MIN),
            timer_hz: NonZeroU32::new(TIMER_SPEED).unwrap_or(NonZeroU32::MIN),
            start_paused: false,
        }
    }
}

/// # Session
/// A loaded CPU being run by two clocks: one stepping instructions and one ticking timers.
///
/// The instruction clock stops on its own once a step halts or fails, keeping that result as
/// the session's outcome. The timer clock runs until the session is stopped or dropped. Once
/// either has happened no further instruction starts, even one parked at the breakpoint.
pub struct Session {
    cpu: Arc<Cpu>,
    stopping: Arc<AtomicBool>,
    cpu_clock: Option<ClockHandle>,
    timer_clock: Option<ClockHandle>,
    outcome: Arc<Mutex<Option<StepResult>>>,
}

impl Session {
    pub fn start(cpu: Arc<Cpu>, config: &Config) -> io::Result<Session> {
        cpu.set_should_wait(config.start_paused);
        let stopping = Arc::new(AtomicBool::new(false));
        let outcome = Arc::new(Mutex::new(None));

        let cpu_clock = {
            let cpu = Arc::clone(&cpu);
            let stopping = Arc::clone(&stopping);
            let outcome = Arc::clone(&outcome);
            ClockSimulator::new(config.cpu_hz).with_clock_regulation(move || {
                match cpu.step_unless(&stopping) {
                    Some(StepResult::Continue) => true,
                    Some(finished) => {
                        *outcome.lock().unwrap_or_else(PoisonError::into_inner) = Some(finished);
                        false
                    }
                    None => false,
                }
            })?
        };

        let mut session = Session {
            cpu: Arc::clone(&cpu),
            stopping,
            cpu_clock: Some(cpu_clock),
            timer_clock: None,
            outcome,
        };

        // On failure the half started session is dropped, which stops the instruction clock.
        session.timer_clock = Some(
            ClockSimulator::new(config.timer_hz).with_clock_regulation(move || {
                cpu.tick_timers();
                true
            })?,
        );
        Ok(session)
    }

    /// How the program ended, once it has.
    pub fn outcome(&self) -> Option<StepResult> {
        self.outcome
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether instructions are still being stepped.
    pub fn is_running(&self) -> bool {
        self.cpu_clock
            .as_ref()
            .map_or(false, |clock| !clock.is_finished())
    }

    /// Stops both clocks and returns the outcome, if the program had reached one.
    ///
    /// A step parked at the breakpoint is released and returns without executing. A step
    /// parked waiting for a key cannot be interrupted, so the instruction clock's thread is
    /// left to end with it.
    pub fn stop(mut self) -> Option<StepResult> {
        self.cancel();

        if let Some(clock) = self.timer_clock.take() {
            clock.join();
        }
        if let Some(clock) = self.cpu_clock.take() {
            if clock.is_finished() {
                clock.join();
            }
        }

        let outcome = self.outcome();
        log::debug!("session stopped with outcome {:?}", outcome);
        outcome
    }

    fn cancel(&self) {
        self.stopping.store(true, Ordering::Release);
        for clock in self.cpu_clock.iter().chain(self.timer_clock.iter()) {
            clock.cancel();
        }
        self.cpu.set_should_wait(false);
        self.cpu.end_wait();
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.cancel();
    }
}
