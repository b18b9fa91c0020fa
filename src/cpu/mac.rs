// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! The multiplier/accumulator
//!
//! Products are fractional: the 32-bit product is shifted left once before
//! it meets the 40-bit MR accumulator.

use super::{
    instruction::Compute,
    registers::{Reg, MAC_XOP, MAC_YOP},
    status::astat::MV,
    CPU,
};

/// How the operands of a multiply are interpreted
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Signs {
    /// signed × signed
    SS,
    /// signed × unsigned
    SU,
    /// unsigned × signed
    US,
    /// unsigned × unsigned
    UU,
}

/// What a product does to MR
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Accumulate {
    /// MR = X * Y
    Set,
    /// MR = MR + X * Y
    Add,
    /// MR = MR - X * Y
    Sub,
}

/// One row of the MAC function table
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MacFn {
    pub signs: Signs,
    pub acc: Accumulate,
    /// Round the result to 16 bits, breaking ties to even
    pub round: bool,
}

const fn f(signs: Signs, acc: Accumulate, round: bool) -> Option<MacFn> {
    Some(MacFn { signs, acc, round })
}

/// The MAC function table. Function 0 is a no-op.
#[rustfmt::skip]
pub const MAC_FNS: [Option<MacFn>; 16] = {
    use Accumulate::*;
    use Signs::*;
    [
        None,               f(SS, Set, true),   f(SS, Add, true),   f(SS, Sub, true),
        f(SS, Set, false),  f(SU, Set, false),  f(US, Set, false),  f(UU, Set, false),
        f(SS, Add, false),  f(SU, Add, false),  f(US, Add, false),  f(UU, Add, false),
        f(SS, Sub, false),  f(SU, Sub, false),  f(US, Sub, false),  f(UU, Sub, false),
    ]
};

/// Sign-extends the low 40 bits of `value`
#[inline(always)]
pub fn wrap40(value: i64) -> i64 {
    (value << 24) >> 24
}

/// True if a 40-bit result doesn't fit in 32 signed bits
/// # Examples
/// ```rust
/// # use adsp::cpu::mac::overflows;
/// assert!(!overflows(0x7fff_ffff));
/// assert!(!overflows(-0x8000_0000));
/// assert!(overflows(0x8000_0000));
/// ```
pub fn overflows(value: i64) -> bool {
    !matches!((value >> 31) & 0x1ff, 0 | 0x1ff)
}

/// Runs one MAC function, returning the new 40-bit accumulator value,
/// or None for the no-op function
/// # Examples
/// ```rust
/// # use adsp::cpu::mac::compute;
/// // 0.5 * 0.5 = 0.25
/// assert_eq!(Some(0x2000_0000), compute(4, 0x4000, 0x4000, 0));
/// // a product ending in exactly 0x8000 rounds to even
/// assert_eq!(Some(0), compute(1, 0x0100, 0x0040, 0));
/// ```
pub fn compute(func: u32, x: u16, y: u16, mr: i64) -> Option<i64> {
    let MacFn { signs, acc, round } = MAC_FNS[(func & 0xf) as usize]?;
    let (sx, ux, sy, uy) = (x as i16 as i64, x as i64, y as i16 as i64, y as i64);
    let product = match signs {
        Signs::SS => sx * sy,
        Signs::SU => sx * uy,
        Signs::US => ux * sy,
        Signs::UU => ux * uy,
    } << 1;
    let mut res = match acc {
        Accumulate::Set => product,
        Accumulate::Add => mr + product,
        Accumulate::Sub => mr - product,
    };
    if round {
        res += 0x8000;
        if product & 0xffff == 0x8000 {
            res &= !0x10000;
        }
    }
    Some(wrap40(res))
}

impl CPU {
    /// Performs a MAC operation, writing MF if `feedback` is set, else MR.
    ///
    /// Writing MR updates MV. Writing MF takes bits 31..16 of the result
    /// and leaves the flags alone.
    pub(super) fn mac_op(&mut self, op: Compute) {
        let Compute { func, x, y, feedback, .. } = op;
        let core = self.core();
        let x = core.get(MAC_XOP[x & 7]);
        let y = core.get(MAC_YOP[y & 3]);
        let Some(res) = compute(func, x, y, core.mr()) else {
            return;
        };
        if feedback {
            self.core_mut().set(Reg::Mf, (res >> 16) as u16);
        } else {
            self.astat &= !MV;
            if overflows(res) {
                self.astat |= MV;
            }
            self.core_mut().set_mr(res);
        }
    }

    /// |`05`| Saturates MR if the last MAC overflowed
    pub(super) fn saturate_mr(&mut self) {
        if self.astat & MV == 0 {
            return;
        }
        let core = self.core_mut();
        let (mr2, mr1, mr0) = if core.get(Reg::Mr2) & 0x80 != 0 {
            (0xffff, 0x8000, 0x0000)
        } else {
            (0x0000, 0x7fff, 0xffff)
        };
        core.set(Reg::Mr2, mr2);
        core.set(Reg::Mr1, mr1);
        core.set(Reg::Mr0, mr0);
    }
}
