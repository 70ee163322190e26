use std::ops::Range;

use crate::byte_math::{add, bcd, flag, subtract};
use crate::constants::{DISPLAY_HEIGHT, DISPLAY_WIDTH, GLYPH_SIZE, MEMORY_SIZE, STACK_SIZE};
use crate::error::Fault;
use crate::keyboard::Keypad;
use crate::opcode::OperationState;
use crate::state::State;

// Every operation runs with the program counter already pointing past its own opcode, so
// jumps set it outright and skips add a further 2.

/// The span of memory `start..start + len`, if it lies entirely within memory.
fn memory_range(start: usize, len: usize) -> Result<Range<usize>, Fault> {
    let end = start + len;
    if end > MEMORY_SIZE {
        Err(Fault::MemoryOutOfBounds {
            address: end - 1,
        })
    } else {
        Ok(start..end)
    }
}

fn skip_if(state: &mut State, condition: bool) -> Result<(), Fault> {
    if condition {
        state.pc += 0x2;
    }
    Ok(())
}

/// clear
pub fn clr(_op: &OperationState, state: &mut State, _keypad: &dyn Keypad) -> Result<(), Fault> {
    state.frame_buffer = [[false; DISPLAY_WIDTH]; DISPLAY_HEIGHT];
    state.draw_flag = true;
    Ok(())
}

/// PC = STACK.pop()
pub fn rts(_op: &OperationState, state: &mut State, _keypad: &dyn Keypad) -> Result<(), Fault> {
    if state.sp == 0 {
        return Err(Fault::StackUnderflow);
    }
    state.sp -= 0x1;
    state.pc = state.stack[state.sp as usize];
    Ok(())
}

/// Calls a machine code routine on the original hardware; ignored.
pub fn sys(op: &OperationState, _state: &mut State, _keypad: &dyn Keypad) -> Result<(), Fault> {
    log::warn!("ignoring machine code routine call to {:#05X}", op.nnn);
    Ok(())
}

/// PC = addr
pub fn jump(op: &OperationState, state: &mut State, _keypad: &dyn Keypad) -> Result<(), Fault> {
    state.pc = op.nnn;
    Ok(())
}

/// STACK.push(PC); PC = addr
pub fn call(op: &OperationState, state: &mut State, _keypad: &dyn Keypad) -> Result<(), Fault> {
    if state.sp as usize >= STACK_SIZE {
        return Err(Fault::StackOverflow);
    }
    state.stack[state.sp as usize] = state.pc;
    state.sp += 0x1;
    state.pc = op.nnn;
    Ok(())
}

/// if Vx == kk then pc += 2
pub fn ske(op: &OperationState, state: &mut State, _keypad: &dyn Keypad) -> Result<(), Fault> {
    let condition = state.v[op.x as usize] == op.low_byte;
    skip_if(state, condition)
}

/// if Vx != kk then pc += 2
pub fn skne(op: &OperationState, state: &mut State, _keypad: &dyn Keypad) -> Result<(), Fault> {
    let condition = state.v[op.x as usize] != op.low_byte;
    skip_if(state, condition)
}

/// if Vx == Vy then pc += 2
pub fn skre(op: &OperationState, state: &mut State, _keypad: &dyn Keypad) -> Result<(), Fault> {
    let condition = state.v[op.x as usize] == state.v[op.y as usize];
    skip_if(state, condition)
}

/// Vx = kk
pub fn load(op: &OperationState, state: &mut State, _keypad: &dyn Keypad) -> Result<(), Fault> {
    state.v[op.x as usize] = op.low_byte;
    Ok(())
}

/// Vx += kk
/// Add kk to Vx; allow for overflow but implicitly drop it
pub fn add_kk(op: &OperationState, state: &mut State, _keypad: &dyn Keypad) -> Result<(), Fault> {
    let (res, _) = add(state.v[op.x as usize], op.low_byte);
    state.v[op.x as usize] = res;
    Ok(())
}

/// Vx = Vy
pub fn mv(op: &OperationState, state: &mut State, _keypad: &dyn Keypad) -> Result<(), Fault> {
    state.v[op.x as usize] = state.v[op.y as usize];
    Ok(())
}

/// Vx |= Vy
pub fn or(op: &OperationState, state: &mut State, _keypad: &dyn Keypad) -> Result<(), Fault> {
    state.v[op.x as usize] |= state.v[op.y as usize];
    Ok(())
}

/// Vx &= Vy
pub fn and(op: &OperationState, state: &mut State, _keypad: &dyn Keypad) -> Result<(), Fault> {
    state.v[op.x as usize] &= state.v[op.y as usize];
    Ok(())
}

/// Vx ^= Vy
pub fn xor(op: &OperationState, state: &mut State, _keypad: &dyn Keypad) -> Result<(), Fault> {
    state.v[op.x as usize] ^= state.v[op.y as usize];
    Ok(())
}

// The ALU operations below compute from the operands as they were, then write VF and finally
// Vx, so Vx wins when x is F.

/// Vx += Vy; VF = carry
pub fn addr(op: &OperationState, state: &mut State, _keypad: &dyn Keypad) -> Result<(), Fault> {
    let (res, carry) = add(state.v[op.x as usize], state.v[op.y as usize]);
    state.v[0xF] = flag(carry);
    state.v[op.x as usize] = res;
    Ok(())
}

/// Vx -= Vy; VF = Vx > Vy
pub fn sub(op: &OperationState, state: &mut State, _keypad: &dyn Keypad) -> Result<(), Fault> {
    let (res, not_borrow) = subtract(state.v[op.x as usize], state.v[op.y as usize]);
    state.v[0xF] = flag(not_borrow);
    state.v[op.x as usize] = res;
    Ok(())
}

/// Vx >>= 1; VF = lsb
pub fn shr(op: &OperationState, state: &mut State, _keypad: &dyn Keypad) -> Result<(), Fault> {
    let vx = state.v[op.x as usize];
    state.v[0xF] = vx & 0x1;
    state.v[op.x as usize] = vx >> 1;
    Ok(())
}

/// Vx = Vy - Vx; VF = Vy > Vx
pub fn subn(op: &OperationState, state: &mut State, _keypad: &dyn Keypad) -> Result<(), Fault> {
    let (res, not_borrow) = subtract(state.v[op.y as usize], state.v[op.x as usize]);
    state.v[0xF] = flag(not_borrow);
    state.v[op.x as usize] = res;
    Ok(())
}

/// Vx <<= 1; VF = msb
pub fn shl(op: &OperationState, state: &mut State, _keypad: &dyn Keypad) -> Result<(), Fault> {
    let vx = state.v[op.x as usize];
    state.v[0xF] = (vx >> 7) & 0x1;
    state.v[op.x as usize] = vx << 1;
    Ok(())
}

/// if Vx != Vy then pc += 2
pub fn skrne(op: &OperationState, state: &mut State, _keypad: &dyn Keypad) -> Result<(), Fault> {
    let condition = state.v[op.x as usize] != state.v[op.y as usize];
    skip_if(state, condition)
}

/// I = addr
pub fn loadi(op: &OperationState, state: &mut State, _keypad: &dyn Keypad) -> Result<(), Fault> {
    state.i = op.nnn;
    Ok(())
}

/// PC = V0 + addr
pub fn jumpi(op: &OperationState, state: &mut State, _keypad: &dyn Keypad) -> Result<(), Fault> {
    state.pc = u16::from(state.v[0x0]) + op.nnn;
    Ok(())
}

/// Vx = rand_byte & kk
pub fn rand(op: &OperationState, state: &mut State, _keypad: &dyn Keypad) -> Result<(), Fault> {
    let rand_byte: u8 = rand::random();
    state.v[op.x as usize] = rand_byte & op.low_byte;
    Ok(())
}

/// draw_sprite(x=Vx y=Vy size=n)
/// XORs a sprite from memory i..i+n at position x, y on the FrameBuffer.
/// The position wraps onto the screen but pixels running off its edges are dropped.
/// Sets VF if any pixels are erased.
pub fn draw(op: &OperationState, state: &mut State, _keypad: &dyn Keypad) -> Result<(), Fault> {
    let sprite = memory_range(state.i as usize, op.n as usize)?;
    let x = state.v[op.x as usize] as usize % DISPLAY_WIDTH;
    let y = state.v[op.y as usize] as usize % DISPLAY_HEIGHT;

    // Reset the flag (used for collision detection)
    state.v[0xF] = 0x0;

    for (row, address) in sprite.enumerate() {
        let py = y + row;
        if py >= DISPLAY_HEIGHT {
            break;
        }
        let line = state.memory[address];
        for bit in 0..8 {
            let px = x + bit;
            if px >= DISPLAY_WIDTH {
                break;
            }
            let sprite_pixel = (line >> (7 - bit)) & 0x1 == 0x1;
            let pixel = &mut state.frame_buffer[py][px];
            if *pixel && sprite_pixel {
                *pixel = false;
                state.v[0xF] = 0x1;
            } else if !*pixel {
                *pixel = sprite_pixel;
            }
        }
    }

    state.draw_flag = true;
    Ok(())
}

/// if Vx.pressed then pc += 2
pub fn skpr(op: &OperationState, state: &mut State, keypad: &dyn Keypad) -> Result<(), Fault> {
    let condition = keypad.is_pressed(state.v[op.x as usize]);
    skip_if(state, condition)
}

/// if !Vx.pressed then pc += 2
pub fn skup(op: &OperationState, state: &mut State, keypad: &dyn Keypad) -> Result<(), Fault> {
    let condition = !keypad.is_pressed(state.v[op.x as usize]);
    skip_if(state, condition)
}

/// Vx = DT
pub fn moved(op: &OperationState, state: &mut State, _keypad: &dyn Keypad) -> Result<(), Fault> {
    state.v[op.x as usize] = state.delay_timer;
    Ok(())
}

/// await keypress for Vx
/// The wait itself happens in the CPU, outside the machine state lock.
pub fn keyd(op: &OperationState, state: &mut State, _keypad: &dyn Keypad) -> Result<(), Fault> {
    state.register_needing_key = Some(op.x);
    Ok(())
}

/// DT = Vx
pub fn loads(op: &OperationState, state: &mut State, _keypad: &dyn Keypad) -> Result<(), Fault> {
    state.delay_timer = state.v[op.x as usize];
    Ok(())
}

/// ST = Vx
pub fn ld(op: &OperationState, state: &mut State, _keypad: &dyn Keypad) -> Result<(), Fault> {
    state.sound_timer = state.v[op.x as usize];
    Ok(())
}

/// I += Vx
pub fn addi(op: &OperationState, state: &mut State, _keypad: &dyn Keypad) -> Result<(), Fault> {
    state.i = state.i.wrapping_add(u16::from(state.v[op.x as usize]));
    Ok(())
}

/// I = Vx * 5
/// Set I to the memory address of the sprite for Vx
/// See constants::SPRITE_SHEET for more details
pub fn ldspr(op: &OperationState, state: &mut State, _keypad: &dyn Keypad) -> Result<(), Fault> {
    state.i = u16::from(state.v[op.x as usize]) * GLYPH_SIZE;
    Ok(())
}

/// mem[I..I+3] = bcd(Vx)
/// Store BCD repr of Vx in memory starting at address i
pub fn bcd_store(op: &OperationState, state: &mut State, _keypad: &dyn Keypad) -> Result<(), Fault> {
    let range = memory_range(state.i as usize, 3)?;
    state.memory[range].copy_from_slice(&bcd(state.v[op.x as usize]));
    Ok(())
}

/// mem[I..=I+x] = V0..=Vx
/// Fill memory starting at address i with V0..=Vx
pub fn stor(op: &OperationState, state: &mut State, _keypad: &dyn Keypad) -> Result<(), Fault> {
    let count = op.x as usize + 1;
    let range = memory_range(state.i as usize, count)?;
    state.memory[range].copy_from_slice(&state.v[..count]);
    Ok(())
}

/// V0..=Vx = mem[I..=I+x]
/// Fill V0..=Vx with memory starting at address i
pub fn read(op: &OperationState, state: &mut State, _keypad: &dyn Keypad) -> Result<(), Fault> {
    let count = op.x as usize + 1;
    let range = memory_range(state.i as usize, count)?;
    state.v[..count].copy_from_slice(&state.memory[range]);
    Ok(())
}
