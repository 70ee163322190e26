use std::fs;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::breakpointer::Breakpointer;
use crate::constants::MAX_ROM_SIZE;
use crate::error::{ExecError, Fault, LoadError};
use crate::instruction;
use crate::keyboard::Keypad;
use crate::listener::{DebuggerListener, Listeners, MachineState, RenderListener};
use crate::opcode::OperationState;
use crate::speaker::Speaker;
use crate::state::State;

/// What became of a single call to `Cpu::step`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepResult {
    /// An instruction ran; keep stepping.
    Continue,
    /// The program ran off the end of memory or reached a zero opcode.
    Halted,
    /// The instruction could not be executed. The machine is left as the fault found it.
    Fatal(ExecError),
}

/// Everything guarded by the machine lock.
struct Machine {
    state: State,
    speaker: Box<dyn Speaker>,
    beeping: bool,
    loaded: bool,
    // Bumped on every reset so a step parked on the keyboard can tell its machine is gone.
    generation: u64,
}

/// # CPU
/// Owns the machine state and executes it one instruction at a time.
///
/// Stepping, timer ticks and ROM loading are mutually exclusive critical sections over the
/// one machine lock, so a `Cpu` can be shared between an instruction clock, a 60Hz timer clock
/// and a host thread.
///
/// Two places in a step can block:
/// - before anything else, at the breakpoint, while the breakpointer is told to wait
/// - on `Fx0A`, for a key press, with the machine lock released so timers keep ticking
///
/// Listeners are told about copies of the state once the machine lock has been released.
pub struct Cpu {
    machine: Mutex<Machine>,
    keypad: Arc<dyn Keypad>,
    breakpointer: Breakpointer,
    listeners: Listeners,
}

impl Cpu {
    pub fn new(keypad: Arc<dyn Keypad>, speaker: Box<dyn Speaker>) -> Self {
        Cpu {
            machine: Mutex::new(Machine {
                state: State::new(),
                speaker,
                beeping: false,
                loaded: false,
                generation: 0,
            }),
            keypad,
            breakpointer: Breakpointer::new(false),
            listeners: Listeners::new(),
        }
    }

    /// Resets the machine and loads the ROM at `path` into memory at the program start.
    ///
    /// Nothing is reset if the file is missing, unreadable or too large.
    pub fn load_rom(&self, path: &Path) -> Result<(), LoadError> {
        let rom = fs::read(path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => LoadError::NotFound {
                path: path.to_path_buf(),
            },
            _ => LoadError::Io(err),
        })?;
        log::debug!("read {} bytes from {}", rom.len(), path.display());
        self.load_program(&rom)
    }

    /// Resets the machine and copies `rom` into memory at the program start.
    pub fn load_program(&self, rom: &[u8]) -> Result<(), LoadError> {
        if rom.len() > MAX_ROM_SIZE {
            return Err(LoadError::Overflow {
                size: rom.len(),
                max: MAX_ROM_SIZE,
            });
        }

        let snapshot = {
            let mut machine = self.lock();
            let machine = &mut *machine;
            machine.state = State::new();
            let start = machine.state.pc as usize;
            machine.state.memory[start..start + rom.len()].copy_from_slice(rom);
            machine.loaded = true;
            machine.generation += 1;
            if machine.beeping {
                machine.speaker.end_beep();
                machine.beeping = false;
            }
            log::debug!("machine reset with a {} byte program", rom.len());
            OperationState::fetch(&machine.state.memory, machine.state.pc)
                .map(|operation| MachineState::new(&operation, &machine.state))
        };

        if let Some(snapshot) = snapshot {
            self.listeners.fire_machine_state_changed(&snapshot);
        }
        Ok(())
    }

    /// Executes the instruction at PC.
    pub fn step(&self) -> StepResult {
        self.breakpointer.wait_for_signal();
        self.execute_next()
    }

    /// Like `step`, but gives up without executing anything if `stopping` is set once the
    /// breakpoint lets it through.
    pub fn step_unless(&self, stopping: &AtomicBool) -> Option<StepResult> {
        self.breakpointer.wait_for_signal();
        if stopping.load(Ordering::Acquire) {
            return None;
        }
        Some(self.execute_next())
    }

    fn execute_next(&self) -> StepResult {
        let mut machine = self.lock();
        if !machine.loaded {
            let err = ExecError {
                pc: machine.state.pc,
                opcode: 0x0000,
                fault: Fault::NotLoaded,
            };
            log::error!("{}", err);
            return StepResult::Fatal(err);
        }

        let state = &mut machine.state;
        state.draw_flag = false;

        let operation = match OperationState::fetch(&state.memory, state.pc) {
            Some(operation) if operation.opcode != 0x0000 => operation,
            _ => {
                log::info!("program halted at {:#05X}", state.pc);
                return StepResult::Halted;
            }
        };

        log::trace!(
            "{:04X} v{:02X?} i{:04X} pc{:04X}",
            operation.opcode,
            state.v,
            state.i,
            state.pc
        );

        let pc = state.pc;
        state.pc += 0x2;
        if let Err(fault) = instruction::execute(&operation, state, &*self.keypad) {
            let err = ExecError {
                pc,
                opcode: operation.opcode,
                fault,
            };
            log::error!("{}", err);
            return StepResult::Fatal(err);
        }

        if let Some(register) = state.register_needing_key.take() {
            let generation = machine.generation;
            drop(machine);

            let key = self.keypad.wait_for_key_press();

            machine = self.lock();
            if machine.generation != generation {
                log::debug!("machine was reset while waiting for a key");
                return StepResult::Continue;
            }
            machine.state.v[register as usize] = key;
        }

        let snapshot = MachineState::new(&operation, &machine.state);
        let frame = if machine.state.draw_flag {
            Some(machine.state.frame_buffer)
        } else {
            None
        };
        drop(machine);

        self.listeners.fire_machine_state_changed(&snapshot);
        if let Some(frame) = frame {
            self.listeners.fire_render(&frame);
        }
        StepResult::Continue
    }

    /// Counts both timers down once and starts or stops the tone as the sound timer demands.
    pub fn tick_timers(&self) {
        let mut machine = self.lock();
        let machine = &mut *machine;
        machine.state.tick_timers();

        let sounding = machine.state.sound_timer > 0;
        if sounding != machine.beeping {
            if sounding {
                machine.speaker.start_beep();
            } else {
                machine.speaker.end_beep();
            }
            machine.beeping = sounding;
        }
    }

    /// Whether steps should stop at the breakpoint. Takes effect from the next step.
    pub fn set_should_wait(&self, should_wait: bool) {
        self.breakpointer.set_should_wait(should_wait);
    }

    pub fn should_wait(&self) -> bool {
        self.breakpointer.should_wait()
    }

    /// Lets a step parked at the breakpoint run.
    pub fn end_wait(&self) {
        self.breakpointer.end_wait();
    }

    /// Whether a step is currently parked at the breakpoint.
    pub fn is_waiting(&self) -> bool {
        self.breakpointer.is_waiting()
    }

    pub fn add_debugger_listener(&self, listener: impl DebuggerListener + 'static) {
        self.listeners.add_debugger_listener(Box::new(listener));
    }

    pub fn add_render_listener(&self, listener: impl RenderListener + 'static) {
        self.listeners.add_render_listener(Box::new(listener));
    }

    /// A copy of the whole machine state.
    pub fn state(&self) -> State {
        self.lock().state
    }

    fn lock(&self) -> MutexGuard<'_, Machine> {
        self.machine.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
