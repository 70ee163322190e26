use std::sync::mpsc::Sender;
use std::sync::{Mutex, PoisonError};

use crate::opcode::OperationState;
use crate::state::{FrameBuffer, State};

/// A copy of the machine state handed to debugger listeners.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MachineState {
    /// The opcode just executed, or the one at PC after a reset.
    pub current_opcode: u16,
    /// The opcode following `current_opcode` in memory, when there is one.
    pub next_opcode: Option<u16>,
    pub pc: u16,
    pub i: u16,
    pub sp: u8,
    pub v: [u8; 16],
    pub delay_timer: u8,
    pub sound_timer: u8,
}

impl MachineState {
    pub fn new(operation: &OperationState, state: &State) -> Self {
        MachineState {
            current_opcode: operation.opcode,
            next_opcode: operation.next_opcode,
            pc: state.pc,
            i: state.i,
            sp: state.sp,
            v: state.v,
            delay_timer: state.delay_timer,
            sound_timer: state.sound_timer,
        }
    }
}

/// Told about the machine state after every executed step and every reset.
pub trait DebuggerListener: Send {
    fn machine_state_changed(&self, state: &MachineState);
}

/// Told about the frame buffer whenever a step clears the screen or draws a sprite.
pub trait RenderListener: Send {
    fn render(&self, frame: &FrameBuffer);
}

impl<F> DebuggerListener for F
where
    F: Fn(&MachineState) + Send,
{
    fn machine_state_changed(&self, state: &MachineState) {
        self(state)
    }
}

impl<F> RenderListener for F
where
    F: Fn(&FrameBuffer) + Send,
{
    fn render(&self, frame: &FrameBuffer) {
        self(frame)
    }
}

// A hung up receiver just means nobody is watching anymore.
impl DebuggerListener for Sender<MachineState> {
    fn machine_state_changed(&self, state: &MachineState) {
        let _ = self.send(*state);
    }
}

impl RenderListener for Sender<FrameBuffer> {
    fn render(&self, frame: &FrameBuffer) {
        let _ = self.send(*frame);
    }
}

/// # Listeners
/// Fans snapshots out to every registered listener, in registration order.
///
/// Listeners are called synchronously on the CPU's thread with copies of the state. A listener
/// must not register further listeners from inside its callback.
#[derive(Default)]
pub struct Listeners {
    debugger: Mutex<Vec<Box<dyn DebuggerListener>>>,
    render: Mutex<Vec<Box<dyn RenderListener>>>,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_debugger_listener(&self, listener: Box<dyn DebuggerListener>) {
        self.debugger
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    pub fn add_render_listener(&self, listener: Box<dyn RenderListener>) {
        self.render
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    pub fn fire_machine_state_changed(&self, state: &MachineState) {
        for listener in self
            .debugger
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
        {
            listener.machine_state_changed(state);
        }
    }

    pub fn fire_render(&self, frame: &FrameBuffer) {
        for listener in self
            .render
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
        {
            listener.render(frame);
        }
    }
}
