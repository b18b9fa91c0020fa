// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Status registers, flag arithmetic, and condition codes
//!
//! The flag functions are pure: the functional units compute a wide result,
//! then ask these functions which ASTAT bits it implies.

use super::CPU;

/// Bits of the arithmetic status register, ASTAT
pub mod astat {
    /// Shifter input sign
    pub const SS: u16 = 0x80;
    /// MAC overflow
    pub const MV: u16 = 0x40;
    /// Divide quotient
    pub const AQ: u16 = 0x20;
    /// ALU input sign
    pub const AS: u16 = 0x10;
    /// ALU carry
    pub const AC: u16 = 0x08;
    /// ALU overflow
    pub const AV: u16 = 0x04;
    /// ALU negative
    pub const AN: u16 = 0x02;
    /// ALU zero
    pub const AZ: u16 = 0x01;
}

/// Bits of the mode status register, MSTAT
pub mod mstat {
    /// Selects the secondary register bank
    pub const BANK: u16 = 0x01;
    /// Bit-reverses DAG1 addresses
    pub const REVERSE: u16 = 0x02;
    /// Makes AV sticky
    pub const STICKYV: u16 = 0x04;
    /// Saturates AR on overflow
    pub const SATURATE: u16 = 0x08;
    /// Implemented bits
    pub const MASK: u16 = 0x0f;
}

/// Bits of the stack status register, SSTAT
pub mod sstat {
    pub const PC_EMPTY: u16 = 0x01;
    pub const PC_OVER: u16 = 0x02;
    pub const COUNT_EMPTY: u16 = 0x04;
    pub const COUNT_OVER: u16 = 0x08;
    pub const STATUS_EMPTY: u16 = 0x10;
    pub const STATUS_OVER: u16 = 0x20;
    pub const LOOP_EMPTY: u16 = 0x40;
    pub const LOOP_OVER: u16 = 0x80;
    /// Value after reset: every stack empty, no overflows
    pub const RESET: u16 = PC_EMPTY | COUNT_EMPTY | STATUS_EMPTY | LOOP_EMPTY;
}

use astat::*;

/// The ASTAT bits an ALU operation may clear before setting new ones.
///
/// With sticky overflow on, AV survives until software clears it.
pub fn clear_mask(mstat: u16) -> u16 {
    if mstat & mstat::STICKYV != 0 {
        !(AC | AN | AZ)
    } else {
        !(AC | AV | AN | AZ)
    }
}

/// AZ if the low 16 bits of `r` are zero
#[inline(always)]
pub fn z(r: i32) -> u16 {
    ((r & 0xffff) == 0) as u16 * AZ
}

/// AN if bit 15 of `r` is set
#[inline(always)]
pub fn n(r: i32) -> u16 {
    ((r >> 14) & AN as i32) as u16
}

/// AV if adding `s` and `d` to make `r` overflowed 16 bits
#[inline(always)]
pub fn v(s: i32, d: i32, r: i32) -> u16 {
    ((s ^ d ^ r ^ (r >> 1)) >> 13 & AV as i32) as u16
}

/// AC if an addition carried out of bit 15
#[inline(always)]
pub fn c(r: i32) -> u16 {
    ((r >> 13) & AC as i32) as u16
}

/// AC if a subtraction did not borrow
#[inline(always)]
pub fn c_sub(r: i32) -> u16 {
    ((!r >> 13) & AC as i32) as u16
}

/// Flags for a result which only sets N and Z
#[inline(always)]
pub fn nz(r: i32) -> u16 {
    n(r) | z(r)
}

/// Flags for an addition `d + s = r`
#[inline(always)]
pub fn nzvc(s: i32, d: i32, r: i32) -> u16 {
    n(r) | z(r) | v(s, d, r) | c(r)
}

/// Flags for a subtraction `d - s = r`
#[inline(always)]
pub fn nzvc_sub(s: i32, d: i32, r: i32) -> u16 {
    n(r) | z(r) | v(s, d, r) | c_sub(r)
}

/// Evaluates a condition code against an ASTAT value, without side effects.
///
/// Code 14 (counter expired) depends on CNTR, and is handled by
/// [CPU::condition]. Here it always reads false.
///
/// | code | mnemonic | true when
/// |------|----------|------------------
/// |   0  | EQ       | AZ
/// |   1  | NE       | !AZ
/// |   2  | GT       | !((AN ^ AV) \| AZ)
/// |   3  | LE       | (AN ^ AV) \| AZ
/// |   4  | LT       | AN ^ AV
/// |   5  | GE       | !(AN ^ AV)
/// |   6  | AV       | AV
/// |   7  | NOT AV   | !AV
/// |   8  | AC       | AC
/// |   9  | NOT AC   | !AC
/// |  10  | NEG      | AS
/// |  11  | POS      | !AS
/// |  12  | MV       | MV
/// |  13  | NOT MV   | !MV
/// |  14  | CE       | counter expired
/// |  15  | TRUE     | always
#[rustfmt::skip]
pub fn test(astat: u16, code: u32) -> bool {
    let bit = |mask: u16| astat & mask != 0;
    let lt = bit(AN) != bit(AV);
    match code & 0xf {
        0x0 =>  bit(AZ),
        0x1 => !bit(AZ),
        0x2 => !(lt || bit(AZ)),
        0x3 =>   lt || bit(AZ),
        0x4 =>   lt,
        0x5 =>  !lt,
        0x6 =>  bit(AV),
        0x7 => !bit(AV),
        0x8 =>  bit(AC),
        0x9 => !bit(AC),
        0xa =>  bit(AS),
        0xb => !bit(AS),
        0xc =>  bit(MV),
        0xd => !bit(MV),
        0xe => false,
        _   => true,
    }
}

/// Assembler suffix for a condition code
#[rustfmt::skip]
pub fn mnemonic(code: u32) -> &'static str {
    const NAMES: [&str; 16] = [
        "EQ", "NE", "GT", "LE", "LT", "GE", "AV", "NOT AV",
        "AC", "NOT AC", "NEG", "POS", "MV", "NOT MV", "CE", "",
    ];
    NAMES[(code & 0xf) as usize]
}

impl CPU {
    /// Evaluates a condition code.
    ///
    /// Code 14 decrements CNTR and is true once it reaches zero, at which
    /// point the counter stack is popped into CNTR.
    pub(super) fn condition(&mut self, code: u32) -> bool {
        if code & 0xf != 14 {
            return test(self.astat, code);
        }
        self.cntr = self.cntr.wrapping_sub(1) & 0x3fff;
        if self.cntr != 0 {
            return false;
        }
        self.pop_cntr();
        true
    }

    /// Recomputes everything derived from MSTAT
    pub(super) fn mstat_changed(&mut self) {
        self.astat_clear = clear_mask(self.mstat);
    }

    /// Gets the live register bank index
    #[inline(always)]
    pub(super) fn bank(&self) -> usize {
        (self.mstat & mstat::BANK) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sticky_overflow_keeps_av() {
        assert_eq!(clear_mask(0) & AV, 0);
        assert_eq!(clear_mask(mstat::STICKYV) & AV, AV);
        assert_eq!(clear_mask(mstat::STICKYV) & AC, 0);
    }

    #[test]
    fn add_overflow_formula() {
        // 0x7fff + 1: V and N, no carry
        let r = 0x7fff + 1;
        assert_eq!(nzvc(1, 0x7fff, r), AN | AV);
        // 0xffff + 1: zero and carry
        let r = 0xffff + 1;
        assert_eq!(nzvc(1, 0xffff, r), AZ | AC);
    }

    #[test]
    fn subtract_carry_is_not_borrow() {
        // 5 - 3 does not borrow
        let r = 5 - 3;
        assert_eq!(nzvc_sub(3, 5, r) & AC, AC);
        // 3 - 5 borrows
        let r = 3 - 5;
        assert_eq!(nzvc_sub(5, 3, r) & AC, 0);
    }

    #[test]
    fn conditions_complement_in_pairs() {
        for astat in 0..=0xffu16 {
            for code in (0..14).step_by(2) {
                assert_ne!(test(astat, code), test(astat, code + 1), "{astat:02x} {code}");
            }
            assert!(test(astat, 15));
        }
    }
}
