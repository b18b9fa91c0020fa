// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! The arithmetic/logic unit

use super::{
    instruction::Compute,
    registers::{Reg, ALU_XOP, ALU_YOP},
    status::{astat::*, mstat, nz, nzvc, nzvc_sub},
    CPU,
};

/// Runs one ALU function on unsigned 16-bit operands.
///
/// Takes the incoming ASTAT and the mask of bits the operation may clear,
/// and returns the unsaturated result with the new ASTAT.
///
/// |func| operation     |func| operation
/// |----|---------------|----|---------------
/// | 0  | Y             | 8  | Y - 1
/// | 1  | Y + 1         | 9  | Y - X
/// | 2  | X + Y + C     | a  | Y - X + C - 1
/// | 3  | X + Y         | b  | NOT X
/// | 4  | NOT Y         | c  | X AND Y
/// | 5  | -Y            | d  | X OR Y
/// | 6  | X - Y + C - 1 | e  | X XOR Y
/// | 7  | X - Y         | f  | ABS X
#[rustfmt::skip]
pub fn compute(func: u32, x: u16, y: u16, astat: u16, clear: u16) -> (i32, u16) {
    let (x, y) = (x as i32, y as i32);
    let carry = (astat & AC != 0) as i32;
    let kept = astat & clear;
    match func & 0xf {
        0x0 => (y, kept | nz(y)),
        0x1 => {
            let r = y + 1;
            let extra = match y {
                0x7fff => AV,
                0xffff => AC,
                _ => 0,
            };
            (r, kept | nz(r) | extra)
        }
        0x2 => {
            let y = y + carry;
            let r = x + y;
            (r, kept | nzvc(x, y, r))
        }
        0x3 => { let r = x + y; (r, kept | nzvc(x, y, r)) }
        0x4 => { let r = y ^ 0xffff; (r, kept | nz(r)) }
        0x5 => {
            let r = -y;
            let mut flags = nz(r);
            if y == 0x8000 { flags |= AV }
            if y == 0x0000 { flags |= AC }
            (r, kept | flags)
        }
        0x6 => {
            let y = y - carry + 1;
            let r = x - y;
            (r, kept | nzvc_sub(x, y, r))
        }
        0x7 => { let r = x - y; (r, kept | nzvc_sub(x, y, r)) }
        0x8 => {
            let r = y - 1;
            let extra = match y {
                0x8000 => AV,
                0x0000 => AC,
                _ => 0,
            };
            (r, kept | nz(r) | extra)
        }
        0x9 => { let r = y - x; (r, kept | nzvc_sub(y, x, r)) }
        0xa => {
            let x = x - carry + 1;
            let r = y - x;
            (r, kept | nzvc_sub(y, x, r))
        }
        0xb => { let r = x ^ 0xffff; (r, kept | nz(r)) }
        0xc => { let r = x & y; (r, kept | nz(r)) }
        0xd => { let r = x | y; (r, kept | nz(r)) }
        0xe => { let r = x ^ y; (r, kept | nz(r)) }
        _ => {
            let negative = x & 0x8000 != 0;
            let r = if negative { -x } else { x };
            let mut flags = kept & !AS;
            if x == 0 { flags |= AZ }
            if x == 0x8000 { flags |= AN | AV }
            if negative { flags |= AS }
            (r, flags)
        }
    }
}

/// Clamps an overflowed result to the extreme its carry points at
/// # Examples
/// ```rust
/// # use adsp::cpu::{alu::saturate, status::astat::*};
/// assert_eq!(0x7fff, saturate(0x8000, AV));
/// assert_eq!(0x8000, saturate(0x0000, AV | AC));
/// assert_eq!(0x1234, saturate(0x1234, AC));
/// ```
pub fn saturate(result: u16, astat: u16) -> u16 {
    match (astat & AV != 0, astat & AC != 0) {
        (false, _) => result,
        (true, false) => 0x7fff,
        (true, true) => 0x8000,
    }
}

impl CPU {
    /// Performs an ALU operation, writing AF if `feedback` is set, else AR.
    ///
    /// Only AR saturates, and only on an overflow this operation caused.
    pub(super) fn alu_op(&mut self, op: Compute) {
        let Compute { func, x, y, feedback, .. } = op;
        let core = self.core();
        let x = core.get(ALU_XOP[x & 7]);
        let y = core.get(ALU_YOP[y & 3]);
        // a sticky AV is merged back in after the operation
        let sticky = self.astat & self.astat_clear & AV;
        let (result, flags) = compute(func, x, y, self.astat & !AV, self.astat_clear);
        self.astat = flags | sticky;
        let mut result = result as u16;
        if !feedback && self.mstat & mstat::SATURATE != 0 {
            result = saturate(result, flags);
        }
        let dest = if feedback { Reg::Af } else { Reg::Ar };
        self.core_mut().set(dest, result);
    }

    /// |`06`| DIVS: first step of a signed divide
    pub(super) fn divs(&mut self, x: usize, y: usize) {
        let core = self.core_mut();
        let x = core.get(ALU_XOP[x & 7]);
        let y = core.get(ALU_YOP[y & 3]);
        let ay0 = core.get(Reg::Ay0);
        let temp = x ^ y;
        core.set(Reg::Af, y << 1 | ay0 >> 15);
        core.set(Reg::Ay0, ay0 << 1 | temp >> 15);
        self.astat = (self.astat & !AQ) | ((temp >> 10) & AQ);
    }

    /// |`07`| DIVQ: one quotient bit of a divide
    pub(super) fn divq(&mut self, x: usize) {
        let aq = self.astat & AQ != 0;
        let core = self.core_mut();
        let x = core.get(ALU_XOP[x & 7]) as i32;
        let af = core.get(Reg::Af) as i32;
        let ay0 = core.get(Reg::Ay0);
        let res = if aq { af + x } else { af - x };
        let temp = res ^ x;
        core.set(Reg::Af, (res << 1) as u16 | ay0 >> 15);
        core.set(Reg::Ay0, ay0 << 1 | ((!temp >> 15) & 1) as u16);
        self.astat = (self.astat & !AQ) | ((temp >> 10) as u16 & AQ);
    }
}
