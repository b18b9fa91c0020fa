// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! The register file.
//!
//! The computational registers live in a [Core], and the CPU holds two of
//! them. MSTAT's bank bit picks which one is live. Everything else
//! (address generators, status, stacks) is unbanked and lives on the CPU.
//!
//! Instructions address registers as four groups of sixteen; [REGISTER_MAP]
//! turns a `(group, index)` pair into a [Slot] so the dispatch is data, not code.

use std::fmt::Display;

/// Names one register in a [Core]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Reg {
    Ax0,
    Ax1,
    Mx0,
    Mx1,
    Ay0,
    Ay1,
    My0,
    My1,
    Si,
    Se,
    Ar,
    Mr0,
    Mr1,
    Mr2,
    Sr0,
    Sr1,
    /// ALU feedback register
    Af,
    /// MAC feedback register
    Mf,
    Sb,
    /// Reads as zero, ignores writes
    Zero,
}

impl Reg {
    /// Number of registers in a [Core]
    pub const COUNT: usize = 20;
    /// Every register, in storage order
    #[rustfmt::skip]
    pub const ALL: [Reg; Reg::COUNT] = {
        use Reg::*;
        [
            Ax0, Ax1, Mx0, Mx1, Ay0, Ay1, My0, My1, Si, Se,
            Ar, Mr0, Mr1, Mr2, Sr0, Sr1, Af, Mf, Sb, Zero,
        ]
    };
}

impl Display for Reg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Reg::Ax0 => "AX0",
            Reg::Ax1 => "AX1",
            Reg::Mx0 => "MX0",
            Reg::Mx1 => "MX1",
            Reg::Ay0 => "AY0",
            Reg::Ay1 => "AY1",
            Reg::My0 => "MY0",
            Reg::My1 => "MY1",
            Reg::Si => "SI",
            Reg::Se => "SE",
            Reg::Ar => "AR",
            Reg::Mr0 => "MR0",
            Reg::Mr1 => "MR1",
            Reg::Mr2 => "MR2",
            Reg::Sr0 => "SR0",
            Reg::Sr1 => "SR1",
            Reg::Af => "AF",
            Reg::Mf => "MF",
            Reg::Sb => "SB",
            Reg::Zero => "0",
        };
        f.write_str(name)
    }
}

use Reg::*;

/// ALU X operand select
pub const ALU_XOP: [Reg; 8] = [Ax0, Ax1, Ar, Mr0, Mr1, Mr2, Sr0, Sr1];
/// ALU Y operand select
pub const ALU_YOP: [Reg; 4] = [Ay0, Ay1, Af, Zero];
/// MAC X operand select
pub const MAC_XOP: [Reg; 8] = [Mx0, Mx1, Ar, Mr0, Mr1, Mr2, Sr0, Sr1];
/// MAC Y operand select
pub const MAC_YOP: [Reg; 4] = [My0, My1, Mf, Zero];
/// Shifter X operand select. Slots 0 and 1 both name SI.
pub const SHIFT_XOP: [Reg; 8] = [Si, Si, Ar, Mr0, Mr1, Mr2, Sr0, Sr1];
/// Group 0 of the register map: the data registers
pub const DREG: [Reg; 16] = [
    Ax0, Ax1, Mx0, Mx1, Ay0, Ay1, My0, My1, Si, Se, Ar, Mr0, Mr1, Mr2, Sr0, Sr1,
];

/// One bank of computational registers.
///
/// Every register is held as the 16-bit value a read would return, so the
/// narrow ones (SE, SB, MR2) are stored already sign-extended.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Core {
    regs: [u16; Reg::COUNT],
}

impl Core {
    /// Reads a register
    #[inline(always)]
    pub fn get(&self, reg: Reg) -> u16 {
        self.regs[reg as usize]
    }

    /// Reads a register as a signed value
    #[inline(always)]
    pub fn get_signed(&self, reg: Reg) -> i16 {
        self.regs[reg as usize] as i16
    }

    /// Stores a raw value into a register. Writes to [Reg::Zero] vanish.
    #[inline(always)]
    pub fn set(&mut self, reg: Reg, value: u16) {
        if reg != Zero {
            self.regs[reg as usize] = value;
        }
    }

    /// Stores a value the way a register-file write does, honoring the
    /// width of the narrow registers.
    ///
    /// Writing MR1 also sign-extends it into MR2.
    pub fn load(&mut self, reg: Reg, value: u16) {
        match reg {
            Se | Mr2 => self.set(reg, value as u8 as i8 as u16),
            Sb => self.set(reg, (((value << 11) as i16) >> 11) as u16),
            Mr1 => {
                self.set(Mr1, value);
                self.set(Mr2, ((value as i16) >> 15) as u16);
            }
            _ => self.set(reg, value),
        }
    }

    /// The 40-bit MR accumulator, sign-extended
    pub fn mr(&self) -> i64 {
        let raw = (self.get(Mr0) as i64)
            | (self.get(Mr1) as i64) << 16
            | (self.get(Mr2) as u8 as i64) << 32;
        (raw << 24) >> 24
    }

    /// Stores the low 40 bits of `value` into MR
    pub fn set_mr(&mut self, value: i64) {
        self.set(Mr0, value as u16);
        self.set(Mr1, (value >> 16) as u16);
        self.set(Mr2, (value >> 32) as u8 as i8 as u16);
    }

    /// The 32-bit SR register
    pub fn sr(&self) -> u32 {
        (self.get(Sr1) as u32) << 16 | self.get(Sr0) as u32
    }

    /// Stores SR
    pub fn set_sr(&mut self, value: u32) {
        self.set(Sr0, value as u16);
        self.set(Sr1, (value >> 16) as u16);
    }

    /// Raw register values, in [Reg] order
    pub fn raw(&self) -> &[u16; Reg::COUNT] {
        &self.regs
    }

    /// Mutable raw register values, in [Reg] order
    pub(crate) fn raw_mut(&mut self) -> &mut [u16; Reg::COUNT] {
        &mut self.regs
    }
}

/// What a `(group, index)` pair in the register map refers to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Slot {
    /// A banked computational register
    Data(Reg),
    /// Address generator index register I0..I7
    Index(usize),
    /// Address generator modify register M0..M7
    Modify(usize),
    /// Address generator length register L0..L7
    Length(usize),
    Astat,
    Mstat,
    /// Read-only stack status
    Sstat,
    Imask,
    Icntl,
    /// Loop counter. Writes push the old count first.
    Cntr,
    Px,
    /// Top of the PC stack. Reads pop, writes push.
    PcStack,
    /// Unimplemented slot
    Invalid,
}

const fn dag_group(base: usize) -> [Slot; 16] {
    use Slot::*;
    [
        Index(base),
        Index(base + 1),
        Index(base + 2),
        Index(base + 3),
        Modify(base),
        Modify(base + 1),
        Modify(base + 2),
        Modify(base + 3),
        Length(base),
        Length(base + 1),
        Length(base + 2),
        Length(base + 3),
        Invalid,
        Invalid,
        Invalid,
        Invalid,
    ]
}

const fn data_group() -> [Slot; 16] {
    let mut group = [Slot::Invalid; 16];
    let mut i = 0;
    while i < 16 {
        group[i] = Slot::Data(DREG[i]);
        i += 1;
    }
    group
}

/// The register map, indexed `[group][index]`
#[rustfmt::skip]
pub const REGISTER_MAP: [[Slot; 16]; 4] = {
    use Slot::*;
    [
        data_group(),
        dag_group(0),
        dag_group(4),
        [
            Astat,   Mstat,   Sstat,   Imask,   Icntl,   Cntr,    Data(Reg::Sb), Px,
            Invalid, Invalid, Invalid, Invalid, Invalid, Invalid, Invalid, PcStack,
        ],
    ]
};

/// Looks up a register map entry. Anything off the map is [Slot::Invalid].
pub fn slot(group: usize, index: usize) -> Slot {
    REGISTER_MAP
        .get(group)
        .and_then(|group| group.get(index))
        .copied()
        .unwrap_or(Slot::Invalid)
}

/// Assembler name of a register map entry
pub fn slot_name(group: usize, index: usize) -> String {
    match slot(group, index) {
        Slot::Data(reg) => reg.to_string(),
        Slot::Index(n) => format!("I{n}"),
        Slot::Modify(n) => format!("M{n}"),
        Slot::Length(n) => format!("L{n}"),
        Slot::Astat => "ASTAT".into(),
        Slot::Mstat => "MSTAT".into(),
        Slot::Sstat => "SSTAT".into(),
        Slot::Imask => "IMASK".into(),
        Slot::Icntl => "ICNTL".into(),
        Slot::Cntr => "CNTR".into(),
        Slot::Px => "PX".into(),
        Slot::PcStack => "TOPPCSTACK".into(),
        Slot::Invalid => format!("INVAL{group}:{index:x}"),
    }
}
