// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Data address generators
//!
//! Slots 0..4 belong to DAG1 and slots 4..8 to DAG2. Each index register
//! walks a circular window `[base, base + L)`, where base is the index with
//! the low bits covering L masked off.

use super::{bus::Memory, instruction::Addr, status::mstat, CPU};

/// Address lines on both memory spaces
pub const ADDR_MASK: u16 = 0x3fff;

/// Index, modify, and length registers for both address generators
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Dags {
    i: [u16; 8],
    m: [i16; 8],
    l: [u16; 8],
    base: [u16; 8],
    lmask: [u16; 8],
}

impl Default for Dags {
    fn default() -> Self {
        Self {
            i: [0; 8],
            m: [0; 8],
            l: [0; 8],
            base: [0; 8],
            lmask: [ADDR_MASK; 8],
        }
    }
}

/// The mask which keeps the base of a circular buffer of length `l`.
///
/// Buffers start on a boundary of the smallest power of two that holds them.
/// # Examples
/// ```rust
/// # use adsp::cpu::dag::length_mask;
/// assert_eq!(0x3fff, length_mask(0));
/// assert_eq!(0x3fff, length_mask(1));
/// assert_eq!(0x3ff8, length_mask(5));
/// assert_eq!(0x3ff8, length_mask(8));
/// assert_eq!(0x0000, length_mask(0x3fff));
/// ```
pub fn length_mask(l: u16) -> u16 {
    if l <= 1 {
        ADDR_MASK
    } else {
        ADDR_MASK & !(l.next_power_of_two() - 1)
    }
}

/// Reverses the 14 address bits of `addr`
/// # Examples
/// ```rust
/// # use adsp::cpu::dag::bit_reverse;
/// assert_eq!(0x2000, bit_reverse(0x0001));
/// assert_eq!(0x0001, bit_reverse(0x2000));
/// assert_eq!(0x3fff, bit_reverse(0x3fff));
/// ```
pub fn bit_reverse(addr: u16) -> u16 {
    (addr.reverse_bits() >> 2) & ADDR_MASK
}

impl Dags {
    /// Gets index register `n`
    pub fn i(&self, n: usize) -> u16 {
        self.i[n & 7]
    }
    /// Gets modify register `n`
    pub fn m(&self, n: usize) -> i16 {
        self.m[n & 7]
    }
    /// Gets length register `n`
    pub fn l(&self, n: usize) -> u16 {
        self.l[n & 7]
    }
    /// Gets the base of the window index register `n` walks
    pub fn base(&self, n: usize) -> u16 {
        self.base[n & 7]
    }

    /// Sets index register `n`, and rebases its window
    pub fn set_i(&mut self, n: usize, value: u16) {
        let n = n & 7;
        self.i[n] = value & ADDR_MASK;
        self.base[n] = value & self.lmask[n];
    }

    /// Sets modify register `n` from a 14-bit signed value
    pub fn set_m(&mut self, n: usize, value: u16) {
        self.m[n & 7] = ((value << 2) as i16) >> 2;
    }

    /// Sets length register `n`, and rebases its window
    pub fn set_l(&mut self, n: usize, value: u16) {
        let n = n & 7;
        self.l[n] = value & ADDR_MASK;
        self.lmask[n] = length_mask(self.l[n]);
        self.base[n] = self.i[n] & self.lmask[n];
    }

    /// Steps index register `ireg` by modify register `mreg`, wrapping
    /// inside its window. Returns the address before the step.
    ///
    /// A zero length never wraps.
    pub fn modify(&mut self, ireg: usize, mreg: usize) -> u16 {
        let (ireg, mreg) = (ireg & 7, mreg & 7);
        let old = self.i[ireg];
        let base = self.base[ireg] as i32;
        let l = self.l[ireg] as i32;
        let mut i = old as i32 + self.m[mreg] as i32;
        if i < base {
            i += l;
        } else if i >= base + l {
            i -= l;
        }
        self.i[ireg] = i as u16 & ADDR_MASK;
        old
    }

    /// Raw register arrays `(i, m, l, base)`, for snapshots
    pub(crate) fn raw(&self) -> ([u16; 8], [i16; 8], [u16; 8], [u16; 8]) {
        (self.i, self.m, self.l, self.base)
    }

    /// Restores raw register arrays, recomputing each window's mask
    pub(crate) fn restore(&mut self, i: [u16; 8], m: [i16; 8], l: [u16; 8], base: [u16; 8]) {
        self.i = i.map(|i| i & ADDR_MASK);
        self.m = m;
        self.l = l.map(|l| l & ADDR_MASK);
        self.lmask = self.l.map(length_mask);
        self.base = base.map(|b| b & ADDR_MASK);
    }
}

impl CPU {
    /// Steps the DAG `addr` names, giving the data address to use.
    ///
    /// DAG1 addresses come out bit-reversed while MSTAT's REVERSE bit is set.
    fn data_address(&mut self, addr: Addr) -> u16 {
        let out = self.dag.modify(addr.i, addr.m);
        if !addr.dag2() && self.mstat & mstat::REVERSE != 0 {
            bit_reverse(out)
        } else {
            out
        }
    }

    /// Reads data memory through either DAG
    pub(super) fn data_read(&mut self, bus: &mut impl Memory, addr: Addr) -> u16 {
        let addr = self.data_address(addr);
        bus.read_data(addr)
    }

    /// Writes data memory through either DAG
    pub(super) fn data_write(&mut self, bus: &mut impl Memory, addr: Addr, value: u16) {
        let addr = self.data_address(addr);
        bus.write_data(addr, value)
    }

    /// Reads program memory through DAG2. The low byte of the word lands in PX.
    pub(super) fn pgm_read(&mut self, bus: &mut impl Memory, addr: Addr) -> u16 {
        let addr = self.dag.modify(addr.i, addr.m);
        let word = bus.read_program(addr);
        self.px = (word & 0xff) as u16;
        (word >> 8) as u16
    }

    /// Writes program memory through DAG2, taking the low byte from PX
    pub(super) fn pgm_write(&mut self, bus: &mut impl Memory, addr: Addr, value: u16) {
        let addr = self.dag.modify(addr.i, addr.m);
        bus.write_program(addr, (value as u32) << 8 | self.px as u32);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circular_buffer_wraps() {
        let mut dag = Dags::default();
        dag.set_l(0, 5);
        dag.set_i(0, 0x0103);
        dag.set_m(0, 2);
        assert_eq!(0x0100, dag.base(0));
        assert_eq!(0x0103, dag.modify(0, 0));
        assert_eq!(0x0100, dag.i(0));
        dag.set_m(1, (-1i16) as u16);
        dag.modify(0, 1);
        assert_eq!(0x0104, dag.i(0));
    }

    #[test]
    fn zero_length_is_linear() {
        let mut dag = Dags::default();
        dag.set_i(4, 0x3ffe);
        dag.set_m(4, 3);
        dag.modify(4, 4);
        assert_eq!(0x0001, dag.i(4));
    }

    #[test]
    fn modify_register_is_14_bit_signed() {
        let mut dag = Dags::default();
        dag.set_m(2, 0x3fff);
        assert_eq!(-1, dag.m(2));
        dag.set_m(2, 0x1fff);
        assert_eq!(0x1fff, dag.m(2));
    }
}
