use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading a ROM, before any instruction runs.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("ROM file '{}' not found", path.display())]
    NotFound { path: PathBuf },

    #[error("ROM is too large ({size} bytes), max size is {max} bytes")]
    Overflow { size: usize, max: usize },

    #[error("unable to read ROM: {0}")]
    Io(#[from] io::Error),
}

/// The reason an operation could not complete.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Fault {
    #[error("unknown opcode")]
    UnknownOpcode,

    #[error("call stack overflow")]
    StackOverflow,

    #[error("return with an empty call stack")]
    StackUnderflow,

    #[error("memory access out of bounds at {address:#06X}")]
    MemoryOutOfBounds { address: usize },

    #[error("no program loaded")]
    NotLoaded,
}

/// A fault along with where it happened.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{fault} (opcode {opcode:#06X} at {pc:#05X})")]
pub struct ExecError {
    pub pc: u16,
    pub opcode: u16,
    pub fault: Fault,
}
