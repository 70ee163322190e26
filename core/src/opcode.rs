/// # Opcodes
///
/// Chip-8 opcodes are 16 bits each. Their behavior is cased on some combination of:
/// - `(n, _, _, _)` broad categorization; applies to all opcodes
/// - `(_, _, _, n)` specific behavior within a category
/// - `(_, _, n, n)` more specific behavior within a category
/// - `(_, n, n, n)` some fixed function that doesn't require variables (e.g. CLS; clear screen)
///
/// Nibbles not used to determine the operation often (but not always) carry important data.
/// - `(_, n, n, n)` represent a 12-bit address
/// - `(_, _, n, n)` encodes some data that is assigned to and/or compared with Vx
/// - `(_, n, _, _)` refers either to the register Vx or a range of registers V0..Vx
/// - `(_, _, n, _)` refers to the the register Vy
pub trait Opcode {
    /// The Opcode's first nibble.
    /// `[h___]`
    fn high_nibble(&self) -> u8;

    /// The Opcode's second nibble.
    /// `[_x__]`
    fn x(&self) -> u8;

    /// The Opcode's third nibble.
    /// `[__y_]`
    fn y(&self) -> u8;

    /// The Opcode's fourth nibble.
    /// `[___n]`
    fn n(&self) -> u8;

    /// The Opcode's least significant byte.
    /// `[__kk]`
    fn kk(&self) -> u8;

    /// The Opcode without its most significant nibble.
    /// `[_adr]`
    fn addr(&self) -> u16;
}

impl Opcode for u16 {
    fn high_nibble(&self) -> u8 {
        ((self & 0xF000) >> 12) as u8
    }

    fn x(&self) -> u8 {
        ((self & 0x0F00) >> 8) as u8
    }

    fn y(&self) -> u8 {
        ((self & 0x00F0) >> 4) as u8
    }

    fn n(&self) -> u8 {
        (self & 0x000F) as u8
    }

    fn kk(&self) -> u8 {
        (self & 0x00FF) as u8
    }

    fn addr(&self) -> u16 {
        self & 0x0FFF
    }
}

/// Combines two subsequent bytes of memory into a 16-bit opcode.
pub fn combine(high: u8, low: u8) -> u16 {
    u16::from(high) << 8 | u16::from(low)
}

/// # Operation State
/// The decoded view of the instruction at some program counter.
///
/// Rebuilt for every cycle and thrown away once the cycle's listeners have been told about it.
/// `next_opcode` is a lookahead for debugger display only and plays no part in execution.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct OperationState {
    pub opcode: u16,
    /// `[__kk]`, the immediate byte.
    pub low_byte: u8,
    pub nnn: u16,
    pub n: u8,
    pub x: u8,
    pub y: u8,
    pub high_nibble: u8,
    pub next_opcode: Option<u16>,
}

impl OperationState {
    /// Decodes `opcode`, carrying `next_opcode` along for display.
    pub fn decode(opcode: u16, next_opcode: Option<u16>) -> Self {
        OperationState {
            opcode,
            low_byte: opcode.kk(),
            nnn: opcode.addr(),
            n: opcode.n(),
            x: opcode.x(),
            y: opcode.y(),
            high_nibble: opcode.high_nibble(),
            next_opcode,
        }
    }

    /// Decodes the instruction at `pc`.
    ///
    /// Returns `None` if the instruction's two bytes don't both lie within `memory`.
    pub fn fetch(memory: &[u8], pc: u16) -> Option<Self> {
        let pc = pc as usize;
        let opcode = combine(*memory.get(pc)?, *memory.get(pc + 1)?);
        let next_opcode = match (memory.get(pc + 2), memory.get(pc + 3)) {
            (Some(&high), Some(&low)) => Some(combine(high, low)),
            _ => None,
        };
        Some(Self::decode(opcode, next_opcode))
    }
}
