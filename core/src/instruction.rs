use crate::error::Fault;
use crate::keyboard::Keypad;
use crate::opcode::OperationState;
use crate::operations::*;
use crate::state::State;

/// An executable instruction. Runs after the program counter has been moved past the opcode.
pub type Operation =
    fn(op: &OperationState, state: &mut State, keypad: &dyn Keypad) -> Result<(), Fault>;

/// Selects the correct Operation for a given Opcode, if there is one
pub fn from_op(op: &OperationState) -> Option<Operation> {
    let operation: Operation = match (op.high_nibble, op.x, op.y, op.n) {
        (0x0, 0x0, 0xE, 0x0) => clr,
        (0x0, 0x0, 0xE, 0xE) => rts,
        (0x0, ..) => sys,
        (0x1, ..) => jump,
        (0x2, ..) => call,
        (0x3, ..) => ske,
        (0x4, ..) => skne,
        (0x5, .., 0x0) => skre,
        (0x6, ..) => load,
        (0x7, ..) => add_kk,
        (0x8, .., 0x0) => mv,
        (0x8, .., 0x1) => or,
        (0x8, .., 0x2) => and,
        (0x8, .., 0x3) => xor,
        (0x8, .., 0x4) => addr,
        (0x8, .., 0x5) => sub,
        (0x8, .., 0x6) => shr,
        (0x8, .., 0x7) => subn,
        (0x8, .., 0xE) => shl,
        (0x9, .., 0x0) => skrne,
        (0xA, ..) => loadi,
        (0xB, ..) => jumpi,
        (0xC, ..) => rand,
        (0xD, ..) => draw,
        (0xE, _, 0x9, 0xE) => skpr,
        (0xE, _, 0xA, 0x1) => skup,
        (0xF, _, 0x0, 0x7) => moved,
        (0xF, _, 0x0, 0xA) => keyd,
        (0xF, _, 0x1, 0x5) => loads,
        (0xF, _, 0x1, 0x8) => ld,
        (0xF, _, 0x1, 0xE) => addi,
        (0xF, _, 0x2, 0x9) => ldspr,
        (0xF, _, 0x3, 0x3) => bcd_store,
        (0xF, _, 0x5, 0x5) => stor,
        (0xF, _, 0x6, 0x5) => read,
        _ => return None,
    };
    Some(operation)
}

/// Runs `op` against `state`, as the CPU does once it has advanced the counter.
pub fn execute(op: &OperationState, state: &mut State, keypad: &dyn Keypad) -> Result<(), Fault> {
    let operation = from_op(op).ok_or(Fault::UnknownOpcode)?;
    operation(op, state, keypad)
}
