pub use cpu::{Cpu, StepResult};
pub use error::{ExecError, Fault, LoadError};
pub use keyboard::{Keyboard, Keypad};
pub use listener::{DebuggerListener, MachineState, RenderListener};
pub use session::{Config, Session};
pub use speaker::{Mute, Speaker};
pub use state::FrameBuffer;

pub mod breakpointer;
pub mod byte_math;
pub mod clock;
pub mod constants;
pub mod cpu;
pub mod error;
pub mod instruction;
pub mod keyboard;
pub mod listener;
pub mod opcode;
mod operations;
pub mod session;
pub mod speaker;
pub mod state;
