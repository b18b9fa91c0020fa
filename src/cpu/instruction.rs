// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Contains the definition of an ADSP-2100 [Insn], and its decoder
//!
//! Opcodes are 24 bits wide. The top byte picks the instruction class, and
//! the rest is sliced into fields which rarely sit on nibble boundaries.
//! Every 24-bit pattern decodes to something: patterns with no meaning on
//! the 2100 become [Insn::reserved], which executes as a no-op.

pub mod disassembler;

use super::registers::{slot_name, ALU_XOP, ALU_YOP, DREG, MAC_XOP, MAC_YOP, SHIFT_XOP};
use super::status::mnemonic;
use std::fmt::{Display, Formatter, Result};

/// Which computational unit a compute field drives
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Unit {
    Alu,
    Mac,
}

/// An ALU or MAC operation embedded in an instruction
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Compute {
    pub unit: Unit,
    /// Function select, bits 16..13
    pub func: u32,
    /// X operand select, bits 10..8
    pub x: usize,
    /// Y operand select, bits 12..11
    pub y: usize,
    /// Write AF/MF instead of AR/MR
    pub feedback: bool,
}

impl Compute {
    /// Decodes the compute field of `op`. Bit 17 picks the ALU,
    /// and bit 18 the feedback register when `has_feedback` is set.
    pub fn decode(op: u32, has_feedback: bool) -> Self {
        Self {
            unit: if op & 0x02_0000 != 0 { Unit::Alu } else { Unit::Mac },
            func: (op >> 13) & 0xf,
            x: ((op >> 8) & 7) as usize,
            y: ((op >> 11) & 3) as usize,
            feedback: has_feedback && op & 0x04_0000 != 0,
        }
    }
}

/// A shifter operation embedded in an instruction
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Shift {
    /// Function select, bits 14..11
    pub func: u32,
    /// X operand select, bits 10..8
    pub x: usize,
    /// Immediate shift count, if not shifting by SE
    pub imm: Option<i8>,
}

impl Shift {
    pub fn decode(op: u32, imm: bool) -> Self {
        Self {
            func: (op >> 11) & 0xf,
            x: ((op >> 8) & 7) as usize,
            imm: imm.then_some(op as i8),
        }
    }
}

/// An indirect address: index register `i`, post-modified by `m`.
/// Both are absolute, so 0..4 is DAG1 and 4..8 is DAG2.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Addr {
    pub i: usize,
    pub m: usize,
}

impl Addr {
    /// Decodes a 4-bit DAG field starting at `shift`
    pub fn decode(op: u32, shift: u32, dag2: bool) -> Self {
        let offset = if dag2 { 4 } else { 0 };
        Self {
            i: offset + ((op >> (shift + 2)) & 3) as usize,
            m: offset + ((op >> shift) & 3) as usize,
        }
    }
    /// True if this address is generated by DAG2
    pub fn dag2(&self) -> bool {
        self.i >= 4
    }
}

/// A `(group, index)` pair in the register map
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Loc {
    pub group: usize,
    pub index: usize,
}

impl Loc {
    /// A data register, in group 0
    pub fn dreg(index: usize) -> Self {
        Self { group: 0, index }
    }
}

#[allow(non_camel_case_types, missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
/// A decoded ADSP-2100 instruction
pub enum Insn {
    /// | 00 | No operation
    nop,
    /// | 02 | Idle until an interrupt (bit 15)
    idle,
    /// | 03 | Jump or call on the flag-in pin
    jump_fi { addr: u16, call: bool, set: bool },
    /// | 04 | Pop the PC, loop, or counter stacks; push or pop the status stack
    stack { pop_pc: bool, pop_loop: bool, pop_cntr: bool, push_stat: bool, pop_stat: bool },
    /// | 05 | Saturate MR
    sat_mr,
    /// | 06 | DIVS primitive
    divs { x: usize, y: usize },
    /// | 07 | DIVQ primitive
    divq { x: usize },
    /// | 09 | Modify address register
    modify { addr: Addr },
    /// | 0a | Conditional return from subroutine, or interrupt
    ret { cond: u32, rti: bool },
    /// | 0b | Conditional jump or call to the address in I4 through I7
    jump_ind { cond: u32, i: usize, call: bool },
    /// | 0c | Set or clear MSTAT bits
    mode { set: u16, clear: u16 },
    /// | 0d | Move between any two registers
    mov { dst: Loc, src: Loc },
    /// | 0e | Conditional shift
    shift { cond: u32, shift: Shift },
    /// | 0f | Shift by an immediate
    shift_imm { shift: Shift },
    /// | 10 | Shift with a data register move
    shift_mov { shift: Shift, dst: usize, src: usize },
    /// | 11 | Shift with a program memory transfer
    shift_pm { shift: Shift, reg: usize, addr: Addr, write: bool },
    /// | 12 | Shift with a data memory transfer
    shift_dm { shift: Shift, reg: usize, addr: Addr, write: bool },
    /// | 14 | Do until: start a hardware loop
    do_until { addr: u16, cond: u32 },
    /// | 18 | Conditional jump
    jump { cond: u32, addr: u16 },
    /// | 1c | Conditional call
    call { cond: u32, addr: u16 },
    /// | 20 | Conditional ALU/MAC operation
    compute { cond: u32, op: Compute },
    /// | 28 | ALU/MAC operation with a data register move
    compute_mov { op: Compute, dst: usize, src: usize },
    /// | 30 | Load a register with an immediate
    load_imm { dst: Loc, value: u16 },
    /// | 50 | ALU/MAC operation with a program memory transfer
    compute_pm { op: Compute, reg: usize, addr: Addr, write: bool },
    /// | 60 | ALU/MAC operation with a data memory transfer
    compute_dm { op: Compute, reg: usize, addr: Addr, write: bool },
    /// | 80 | Read data memory at an absolute address
    load { dst: Loc, addr: u16 },
    /// | 90 | Write data memory at an absolute address
    store { src: Loc, addr: u16 },
    /// | a0 | Write an immediate to data memory
    store_imm { addr: Addr, value: u16 },
    /// | c0 | ALU/MAC operation with simultaneous data and program memory reads
    dual { op: Compute, dm_reg: usize, dm: Addr, pm_reg: usize, pm: Addr },
    /// Anything else. Executes as a no-op.
    reserved { op: u32 },
}

/// Decodes a mode control field: a 2-bit pair where the high bit enables
/// the change and the low bit is the new value
fn mode_bits(op: u32) -> (u16, u16) {
    use super::status::mstat::*;
    let (mut set, mut clear) = (0, 0);
    for (shift, bit) in [(4, BANK), (6, REVERSE), (8, STICKYV), (10, SATURATE)] {
        match (op >> shift) & 3 {
            3 => set |= bit,
            2 => clear |= bit,
            _ => {}
        }
    }
    (set, clear)
}

impl Insn {
    /// Decodes a 24-bit opcode. Every opcode decodes to something.
    /// # Examples
    /// ```rust
    /// # use adsp::cpu::instruction::Insn;
    /// assert_eq!(Insn::nop, Insn::decode(0x000000));
    /// assert_eq!(Insn::jump { cond: 0xf, addr: 0x123 }, Insn::decode(0x18123f));
    /// assert_eq!(Insn::reserved { op: 0x010000 }, Insn::decode(0x010000));
    /// ```
    #[rustfmt::skip]
    pub fn decode(op: u32) -> Self {
        let op = op & 0xff_ffff;
        let cond = op & 0xf;
        let dag2 = op & 0x01_0000 != 0;
        let reg = ((op >> 4) & 0xf) as usize;
        match op >> 16 {
            0x00 => Insn::nop,
            0x02 if op & 0x8000 != 0 => Insn::idle,
            0x03 => Insn::jump_fi {
                addr: (((op >> 4) & 0xfff) | ((op << 10) & 0x3000)) as u16,
                call: op & 1 != 0,
                set: op & 2 != 0,
            },
            0x04 => Insn::stack {
                pop_pc:    op & 0x10 != 0,
                pop_loop:  op & 0x08 != 0,
                pop_cntr:  op & 0x04 != 0,
                push_stat: op & 0x03 == 0x02,
                pop_stat:  op & 0x03 == 0x03,
            },
            0x05 => Insn::sat_mr,
            0x06 => Insn::divs { x: ((op >> 8) & 7) as usize, y: ((op >> 11) & 3) as usize },
            0x07 => Insn::divq { x: ((op >> 8) & 7) as usize },
            0x09 => Insn::modify { addr: Addr::decode(op, 0, op & 0x10 != 0) },
            0x0a => Insn::ret { cond, rti: op & 0x10 != 0 },
            0x0b => Insn::jump_ind {
                cond,
                i: 4 + ((op >> 6) & 3) as usize,
                call: op & 0x10 != 0,
            },
            0x0c => {
                let (set, clear) = mode_bits(op);
                Insn::mode { set, clear }
            }
            0x0d => Insn::mov {
                dst: Loc { group: ((op >> 10) & 3) as usize, index: reg },
                src: Loc { group: ((op >> 8) & 3) as usize, index: (op & 0xf) as usize },
            },
            0x0e => Insn::shift { cond, shift: Shift::decode(op, false) },
            0x0f => Insn::shift_imm { shift: Shift::decode(op, true) },
            0x10 => Insn::shift_mov { shift: Shift::decode(op, false), dst: reg, src: (op & 0xf) as usize },
            0x11 => Insn::shift_pm {
                shift: Shift::decode(op, false), reg, addr: Addr::decode(op, 0, true), write: op & 0x8000 != 0,
            },
            0x12 | 0x13 => Insn::shift_dm {
                shift: Shift::decode(op, false), reg, addr: Addr::decode(op, 0, dag2), write: op & 0x8000 != 0,
            },
            0x14..=0x17 => Insn::do_until { addr: ((op >> 4) & 0x3fff) as u16, cond },
            0x18..=0x1b => Insn::jump { cond, addr: ((op >> 4) & 0x3fff) as u16 },
            0x1c..=0x1f => Insn::call { cond, addr: ((op >> 4) & 0x3fff) as u16 },
            0x20..=0x27 => Insn::compute { cond, op: Compute::decode(op, true) },
            0x28..=0x2f => Insn::compute_mov { op: Compute::decode(op, true), dst: reg, src: (op & 0xf) as usize },
            0x30..=0x3f => Insn::load_imm {
                dst: Loc { group: ((op >> 18) & 3) as usize, index: (op & 0xf) as usize },
                value: (((op << 14) as i32) >> 18) as u16,
            },
            0x40..=0x4f => Insn::load_imm { dst: Loc::dreg((op & 0xf) as usize), value: (op >> 4) as u16 },
            0x50..=0x5f => Insn::compute_pm {
                op: Compute::decode(op, true), reg, addr: Addr::decode(op, 0, true), write: op & 0x08_0000 != 0,
            },
            0x60..=0x7f => Insn::compute_dm {
                op: Compute::decode(op, true), reg,
                addr: Addr::decode(op, 0, op & 0x10_0000 != 0),
                write: op & 0x08_0000 != 0,
            },
            0x80..=0x8f => Insn::load {
                dst: Loc { group: ((op >> 18) & 3) as usize, index: (op & 0xf) as usize },
                addr: ((op >> 4) & 0x3fff) as u16,
            },
            0x90..=0x9f => Insn::store {
                src: Loc { group: ((op >> 18) & 3) as usize, index: (op & 0xf) as usize },
                addr: ((op >> 4) & 0x3fff) as u16,
            },
            0xa0..=0xbf => Insn::store_imm {
                addr: Addr::decode(op, 0, op & 0x10_0000 != 0),
                value: (op >> 4) as u16,
            },
            0xc0..=0xff => Insn::dual {
                op: Compute::decode(op, false),
                dm_reg: ((op >> 18) & 3) as usize,
                dm: Addr::decode(op, 0, false),
                pm_reg: 4 + ((op >> 20) & 3) as usize,
                pm: Addr::decode(op, 4, true),
            },
            _ => Insn::reserved { op },
        }
    }
}

impl From<u32> for Insn {
    fn from(op: u32) -> Self {
        Insn::decode(op)
    }
}

/// Writes the `IF cond ` prefix, if the condition isn't "always"
struct If(u32);
impl Display for If {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self.0 & 0xf {
            0xf => Ok(()),
            cond => write!(f, "IF {} ", mnemonic(cond)),
        }
    }
}

impl Display for Compute {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self.unit {
            Unit::Alu => {
                let dst = if self.feedback { "AF" } else { "AR" };
                let (x, y) = (ALU_XOP[self.x & 7], ALU_YOP[self.y & 3]);
                match self.func {
                    0x0 => write!(f, "{dst} = {y}"),
                    0x1 => write!(f, "{dst} = {y} + 1"),
                    0x2 => write!(f, "{dst} = {x} + {y} + C"),
                    0x3 => write!(f, "{dst} = {x} + {y}"),
                    0x4 => write!(f, "{dst} = NOT {y}"),
                    0x5 => write!(f, "{dst} = -{y}"),
                    0x6 => write!(f, "{dst} = {x} - {y} + C - 1"),
                    0x7 => write!(f, "{dst} = {x} - {y}"),
                    0x8 => write!(f, "{dst} = {y} - 1"),
                    0x9 => write!(f, "{dst} = {y} - {x}"),
                    0xa => write!(f, "{dst} = {y} - {x} + C - 1"),
                    0xb => write!(f, "{dst} = NOT {x}"),
                    0xc => write!(f, "{dst} = {x} AND {y}"),
                    0xd => write!(f, "{dst} = {x} OR {y}"),
                    0xe => write!(f, "{dst} = {x} XOR {y}"),
                    _   => write!(f, "{dst} = ABS {x}"),
                }
            }
            Unit::Mac => {
                let dst = if self.feedback { "MF" } else { "MR" };
                let (x, y) = (MAC_XOP[self.x & 7], MAC_YOP[self.y & 3]);
                const SIGNS: [&str; 4] = ["SS", "SU", "US", "UU"];
                let signs = SIGNS[(self.func & 3) as usize];
                match self.func {
                    0x0 => write!(f, "NOP"),
                    0x1 => write!(f, "{dst} = {x} * {y} (RND)"),
                    0x2 => write!(f, "{dst} = MR + {x} * {y} (RND)"),
                    0x3 => write!(f, "{dst} = MR - {x} * {y} (RND)"),
                    0x4..=0x7 => write!(f, "{dst} = {x} * {y} ({signs})"),
                    0x8..=0xb => write!(f, "{dst} = MR + {x} * {y} ({signs})"),
                    _         => write!(f, "{dst} = MR - {x} * {y} ({signs})"),
                }
            }
        }
    }
}

impl Display for Shift {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        const NAMES: [&str; 16] = [
            "LSHIFT", "LSHIFT", "LSHIFT", "LSHIFT", "ASHIFT", "ASHIFT", "ASHIFT", "ASHIFT",
            "NORM", "NORM", "NORM", "NORM", "EXP", "EXP", "EXP", "EXPADJ",
        ];
        const MODES: [&str; 16] = [
            "HI", "HI", "LO", "LO", "HI", "HI", "LO", "LO",
            "HI", "HI", "LO", "LO", "HI", "HIX", "LO", "",
        ];
        let func = (self.func & 0xf) as usize;
        let x = SHIFT_XOP[self.x & 7];
        match (func, self.imm) {
            (0xc..=0xe, _) => write!(f, "SE = EXP {x} ({})", MODES[func]),
            (0xf, _) => write!(f, "SB = EXPADJ {x}"),
            (_, Some(imm)) => write!(f, "SR = {}{} {x} BY {imm} ({})", or(func), NAMES[func], MODES[func]),
            (_, None) => write!(f, "SR = {}{} {x} ({})", or(func), NAMES[func], MODES[func]),
        }
    }
}

fn or(func: usize) -> &'static str {
    if func & 1 != 0 {
        "SR OR "
    } else {
        ""
    }
}

impl Display for Addr {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "I{}, M{}", self.i, self.m)
    }
}

impl Display for Loc {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.write_str(&slot_name(self.group, self.index))
    }
}

/// Writes a memory transfer: `reg = DM(I, M)` or `DM(I, M) = reg`
fn transfer(f: &mut Formatter<'_>, space: &str, reg: usize, addr: &Addr, write: bool) -> Result {
    let reg = DREG[reg & 0xf];
    if write {
        write!(f, "{space}({addr}) = {reg}")
    } else {
        write!(f, "{reg} = {space}({addr})")
    }
}

impl Display for Insn {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match *self {
            Insn::nop                   => write!(f, "NOP"),
            Insn::idle                  => write!(f, "IDLE"),
            Insn::jump_fi { addr, call, set } => write!(
                f, "IF {}FLAG_IN {} {addr:04x}",
                if set { "" } else { "NOT " },
                if call { "CALL" } else { "JUMP" },
            ),
            Insn::stack { pop_pc, pop_loop, pop_cntr, push_stat, pop_stat } => {
                let names = [
                    (pop_pc, "POP PC"),
                    (pop_loop, "POP LOOP"),
                    (pop_cntr, "POP CNTR"),
                    (push_stat, "PUSH STS"),
                    (pop_stat, "POP STS"),
                ];
                let list: Vec<_> = names.iter().filter(|(on, _)| *on).map(|(_, n)| *n).collect();
                if list.is_empty() { write!(f, "NOP") } else { write!(f, "{}", list.join(", ")) }
            }
            Insn::sat_mr                => write!(f, "IF MV SAT MR"),
            Insn::divs { x, y }         => write!(f, "DIVS {}, {}", ALU_YOP[y & 3], ALU_XOP[x & 7]),
            Insn::divq { x }            => write!(f, "DIVQ {}", ALU_XOP[x & 7]),
            Insn::modify { addr }       => write!(f, "MODIFY ({addr})"),
            Insn::ret { cond, rti }     => write!(f, "{}{}", If(cond), if rti { "RTI" } else { "RTS" }),
            Insn::jump_ind { cond, i, call } => write!(
                f, "{}{} (I{i})", If(cond), if call { "CALL" } else { "JUMP" },
            ),
            Insn::mode { set, clear }   => write!(f, "MSTAT |= {set:x}, MSTAT &= ~{clear:x}"),
            Insn::mov { dst, src }      => write!(f, "{dst} = {src}"),
            Insn::shift { cond, shift } => write!(f, "{}{shift}", If(cond)),
            Insn::shift_imm { shift }   => write!(f, "{shift}"),
            Insn::shift_mov { shift, dst, src } => write!(f, "{shift}, {} = {}", DREG[dst & 0xf], DREG[src & 0xf]),
            Insn::shift_pm { shift, reg, addr, write } => {
                write!(f, "{shift}, ")?;
                transfer(f, "PM", reg, &addr, write)
            }
            Insn::shift_dm { shift, reg, addr, write } => {
                write!(f, "{shift}, ")?;
                transfer(f, "DM", reg, &addr, write)
            }
            Insn::do_until { addr, cond } => write!(f, "DO {addr:04x} UNTIL {}", match cond {
                0xf => "FOREVER",
                c => mnemonic(c),
            }),
            Insn::jump { cond, addr }   => write!(f, "{}JUMP {addr:04x}", If(cond)),
            Insn::call { cond, addr }   => write!(f, "{}CALL {addr:04x}", If(cond)),
            Insn::compute { cond, op }  => write!(f, "{}{op}", If(cond)),
            Insn::compute_mov { op, dst, src } => write!(f, "{op}, {} = {}", DREG[dst & 0xf], DREG[src & 0xf]),
            Insn::load_imm { dst, value } => write!(f, "{dst} = #{value:04x}"),
            Insn::compute_pm { op, reg, addr, write } => {
                write!(f, "{op}, ")?;
                transfer(f, "PM", reg, &addr, write)
            }
            Insn::compute_dm { op, reg, addr, write } => {
                write!(f, "{op}, ")?;
                transfer(f, "DM", reg, &addr, write)
            }
            Insn::load { dst, addr }    => write!(f, "{dst} = DM({addr:04x})"),
            Insn::store { src, addr }   => write!(f, "DM({addr:04x}) = {src}"),
            Insn::store_imm { addr, value } => write!(f, "DM({addr}) = #{value:04x}"),
            Insn::dual { op, dm_reg, dm, pm_reg, pm } => write!(
                f, "{op}, {} = DM({dm}), {} = PM({pm})", DREG[dm_reg & 0xf], DREG[pm_reg & 0xf],
            ),
            Insn::reserved { op }       => write!(f, "RESERVED {op:06x}"),
        }
    }
}
