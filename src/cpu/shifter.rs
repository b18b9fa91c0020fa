// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! The barrel shifter
//!
//! Functions 0..12 place their operand into the high (HI) or low (LO) half
//! of a 32-bit field, shift it by SE or an immediate, and either replace SR
//! or OR into it. The rest derive exponents into SE or SB.
//!
//! |func| operation       |func| operation
//! |----|-----------------|----|-----------------
//! | 0  | LSHIFT (HI)     | 8  | NORM (HI)
//! | 1  | LSHIFT (HI, OR) | 9  | NORM (HI, OR)
//! | 2  | LSHIFT (LO)     | a  | NORM (LO)
//! | 3  | LSHIFT (LO, OR) | b  | NORM (LO, OR)
//! | 4  | ASHIFT (HI)     | c  | EXP (HI)
//! | 5  | ASHIFT (HI, OR) | d  | EXP (HIX)
//! | 6  | ASHIFT (LO)     | e  | EXP (LO)
//! | 7  | ASHIFT (LO, OR) | f  | EXPADJ

use super::{
    instruction::Shift,
    registers::{Reg, SHIFT_XOP},
    status::astat::{AC, AV, SS},
    CPU,
};

/// Logical shift, left for positive counts. Counts past 31 empty the field.
fn logical(xop: u32, sc: i32) -> u32 {
    match sc {
        1..=31 => xop << sc,
        -31..=0 => xop >> -sc,
        _ => 0,
    }
}

/// Arithmetic shift, left for positive counts. Counts past -31 fill with sign.
fn arithmetic(xop: i32, sc: i32) -> u32 {
    (match sc {
        1..=31 => xop << sc,
        32.. => 0,
        -31..=0 => xop >> -sc,
        _ => xop >> 31,
    }) as u32
}

/// Runs one of the SR-producing shifter functions (0..12), giving the
/// value to place in (or OR into) SR
/// # Examples
/// ```rust
/// # use adsp::cpu::shifter::shift;
/// // LSHIFT (HI) by -4
/// assert_eq!(0x0123_4000, shift(0x0, 0x1234, -4, false));
/// // ASHIFT (LO) by -4 keeps the sign
/// assert_eq!(0xffff_f800, shift(0x6, 0x8000, -4, false));
/// // NORM (LO) shifts the other way
/// assert_eq!(0x0000_0800, shift(0xa, 0x8000, 4, false));
/// ```
pub fn shift(func: u32, x: u16, sc: i8, carry: bool) -> u32 {
    let sc = sc as i32;
    let signed = x as i16 as i32;
    match (func >> 1) & 7 {
        0 => logical((x as u32) << 16, sc),
        1 => logical(x as u32, sc),
        2 => arithmetic(signed << 16, sc),
        3 => arithmetic(signed, sc),
        4 => {
            let xop = signed << 16;
            if sc > 0 {
                let xop = ((xop as u32) >> 1 | (carry as u32) << 31) as i32;
                (xop >> (sc - 1).min(31)) as u32
            } else if sc > -32 {
                (xop << -sc) as u32
            } else {
                0
            }
        }
        _ => logical(x as u32, -sc),
    }
}

/// Counts the redundant sign bits of `x`, from 0 to 15
/// # Examples
/// ```rust
/// # use adsp::cpu::shifter::exponent;
/// assert_eq!(0, exponent(0x4000));
/// assert_eq!(0, exponent(0x8000));
/// assert_eq!(3, exponent(0x0800));
/// assert_eq!(15, exponent(0x0000));
/// assert_eq!(15, exponent(0xffff));
/// ```
pub fn exponent(x: u16) -> i16 {
    let xop = (x as i16 as i32) << 16;
    let bits = if xop < 0 { !xop } else { xop | 0x8000 };
    bits.leading_zeros() as i16 - 1
}

impl CPU {
    /// Performs a shifter operation, shifting by its immediate if it has
    /// one, else by SE.
    ///
    /// Only the SR-producing functions have an immediate form.
    pub(super) fn shift_op(&mut self, op: Shift) {
        match op.imm {
            Some(_) if op.func >= 0xc => {}
            Some(sc) => self.shift_by(op, sc),
            None => {
                let sc = self.core().get(Reg::Se) as i8;
                self.shift_by(op, sc);
            }
        }
    }

    fn shift_by(&mut self, op: Shift, sc: i8) {
        let func = op.func & 0xf;
        let x = self.core().get(SHIFT_XOP[op.x & 7]);
        let negative = x & 0x8000 != 0;
        match func {
            0x0..=0xb => {
                let carry = self.astat & AC != 0;
                let mut sr = shift(func, x, sc, carry);
                if func & 1 != 0 {
                    sr |= self.core().sr();
                }
                self.core_mut().set_sr(sr);
            }
            0xc => self.exp_hi(x),
            0xd => {
                if self.astat & AV != 0 {
                    self.core_mut().set(Reg::Se, 1);
                    self.set_ss(!negative);
                } else {
                    self.exp_hi(x);
                }
            }
            0xe => {
                if self.core().get_signed(Reg::Se) == -15 {
                    let run = (if self.astat & SS != 0 {
                        (!x).leading_zeros()
                    } else {
                        x.leading_zeros()
                    }) as i16;
                    self.core_mut().set(Reg::Se, (-15 - run) as u16);
                }
            }
            _ => {
                let exp = exponent(x);
                let core = self.core_mut();
                if exp < -core.get_signed(Reg::Sb) {
                    core.set(Reg::Sb, (-exp) as u16);
                }
            }
        }
    }

    /// EXP (HI): SE gets the negated exponent, SS gets the sign
    fn exp_hi(&mut self, x: u16) {
        self.set_ss(x & 0x8000 != 0);
        self.core_mut().set(Reg::Se, (-exponent(x)) as u16);
    }

    fn set_ss(&mut self, set: bool) {
        if set {
            self.astat |= SS;
        } else {
            self.astat &= !SS;
        }
    }
}
