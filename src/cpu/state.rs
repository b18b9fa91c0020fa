// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Save-state snapshots
//!
//! A snapshot holds every piece of machine state that affects future
//! execution, in a fixed big-endian layout. Values the CPU derives from
//! others (the flag-clear mask, the cached loop end, DAG window masks) are
//! recomputed on import rather than stored.
//!
//! Host-side settings are not machine state, and survive an import:
//! [ControlFlags](super::ControlFlags), breakpoints, the interrupt vector
//! callback, and the disassembler.

use super::{
    registers::Reg,
    stack::{CntrStack, LoopStack, PcStack, StatStack},
    CPU, IRQ_LINES,
};
use crate::error::{Error, Result};

/// Tags the start of every snapshot
pub const MAGIC: &[u8; 4] = b"ADSP";
/// Layout version
pub const VERSION: u8 = 1;

/// Size of a snapshot, in bytes
pub const SNAPSHOT_LEN: usize = MAGIC.len() + 1
    // pc ppc cntr astat mstat sstat imask icntl px
    + 9 * 2
    // idle, irq_poll
    + 2
    // both register banks
    + 2 * Reg::COUNT * 2
    // i m l base
    + 4 * 8 * 2
    // stacks: pointer, then every slot
    + 1 + PcStack::DEPTH * 2
    + 1 + CntrStack::DEPTH * 2
    + 1 + StatStack::DEPTH * 3 * 2
    + 1 + LoopStack::DEPTH * 4
    // irq_state, irq_latch, flag_in
    + IRQ_LINES * 2 + 1
    // cycle
    + 8;

struct Writer(Vec<u8>);

impl Writer {
    fn u8(&mut self, v: u8) {
        self.0.push(v)
    }
    fn bool(&mut self, v: bool) {
        self.0.push(v as u8)
    }
    fn u16(&mut self, v: u16) {
        self.0.extend_from_slice(&v.to_be_bytes())
    }
    fn u32(&mut self, v: u32) {
        self.0.extend_from_slice(&v.to_be_bytes())
    }
    fn u64(&mut self, v: u64) {
        self.0.extend_from_slice(&v.to_be_bytes())
    }
}

struct Reader<'a>(&'a [u8]);

impl<'a> Reader<'a> {
    fn take<const N: usize>(&mut self) -> Result<[u8; N]> {
        let (head, rest) = self.0.split_at(N.min(self.0.len()));
        let head = head
            .try_into()
            .map_err(|_| invalid("snapshot ended early"))?;
        self.0 = rest;
        Ok(head)
    }
    fn u8(&mut self) -> Result<u8> {
        Ok(self.take::<1>()?[0])
    }
    fn bool(&mut self) -> Result<bool> {
        match self.u8()? {
            0 => Ok(false),
            1 => Ok(true),
            b => Err(invalid(format!("{b:#x} is not a boolean"))),
        }
    }
    fn u16(&mut self) -> Result<u16> {
        self.take().map(u16::from_be_bytes)
    }
    fn u32(&mut self) -> Result<u32> {
        self.take().map(u32::from_be_bytes)
    }
    fn u64(&mut self) -> Result<u64> {
        self.take().map(u64::from_be_bytes)
    }
    fn u16s<const N: usize>(&mut self) -> Result<[u16; N]> {
        let mut out = [0; N];
        for v in out.iter_mut() {
            *v = self.u16()?;
        }
        Ok(out)
    }
    fn bools<const N: usize>(&mut self) -> Result<[bool; N]> {
        let mut out = [false; N];
        for v in out.iter_mut() {
            *v = self.bool()?;
        }
        Ok(out)
    }
}

fn invalid(reason: impl Into<String>) -> Error {
    Error::InvalidSnapshot {
        reason: reason.into(),
    }
}

impl CPU {
    /// Exports the machine state as a snapshot
    /// # Examples
    /// ```rust
    /// # use adsp::prelude::*;
    /// let cpu = CPU::default();
    /// let state = cpu.get_state();
    /// assert_eq!(b"ADSP", &state[..4]);
    /// ```
    pub fn get_state(&self) -> Vec<u8> {
        let mut w = Writer(Vec::with_capacity(SNAPSHOT_LEN));
        w.0.extend_from_slice(MAGIC);
        w.u8(VERSION);
        for v in [
            self.pc, self.ppc, self.cntr, self.astat, self.mstat, self.sstat, self.imask,
            self.icntl, self.px,
        ] {
            w.u16(v);
        }
        w.bool(self.idle);
        w.bool(self.irq_poll);
        for core in &self.banks {
            core.raw().iter().for_each(|&v| w.u16(v));
        }
        let (i, m, l, base) = self.dag.raw();
        i.iter().for_each(|&v| w.u16(v));
        m.iter().for_each(|&v| w.u16(v as u16));
        l.iter().for_each(|&v| w.u16(v));
        base.iter().for_each(|&v| w.u16(v));

        w.u8(self.pc_stack.sp() as u8);
        self.pc_stack.slots().iter().for_each(|&v| w.u16(v));
        w.u8(self.cntr_stack.sp() as u8);
        self.cntr_stack.slots().iter().for_each(|&v| w.u16(v));
        w.u8(self.stat_stack.sp() as u8);
        self.stat_stack.slots().iter().flatten().for_each(|&v| w.u16(v));
        w.u8(self.loop_stack.sp() as u8);
        self.loop_stack.slots().iter().for_each(|&v| w.u32(v));

        self.irq_state.iter().for_each(|&v| w.bool(v));
        self.irq_latch.iter().for_each(|&v| w.bool(v));
        w.bool(self.flag_in);
        w.u64(self.cycle as u64);
        w.0
    }

    /// Imports a snapshot made by [CPU::get_state].
    ///
    /// Returns [Error::SnapshotLength] or [Error::InvalidSnapshot] if the
    /// bytes don't describe a machine, and leaves the CPU untouched.
    /// # Examples
    /// ```rust
    /// # use adsp::prelude::*;
    /// # fn main() -> Result<()> {
    /// let mut cpu = CPU::default();
    /// cpu.set_pc(0x123);
    /// let state = cpu.get_state();
    /// cpu.reset();
    /// cpu.set_state(&state)?;
    /// assert_eq!(0x123, cpu.pc());
    /// assert!(cpu.set_state(&state[1..]).is_err());
    /// # Ok(())
    /// # }
    /// ```
    pub fn set_state(&mut self, state: &[u8]) -> Result<&mut Self> {
        if state.len() != SNAPSHOT_LEN {
            return Err(Error::SnapshotLength {
                expected: SNAPSHOT_LEN,
                got: state.len(),
            });
        }
        let mut r = Reader(state);
        if &r.take::<4>()? != MAGIC {
            return Err(invalid("missing ADSP tag"));
        }
        match r.u8()? {
            VERSION => {}
            v => return Err(invalid(format!("unknown version {v}"))),
        }

        let mut cpu = self.clone();
        [
            cpu.pc, cpu.ppc, cpu.cntr, cpu.astat, cpu.mstat, cpu.sstat, cpu.imask, cpu.icntl,
            cpu.px,
        ] = r.u16s::<9>()?;
        if cpu.mstat > 0xf || cpu.imask > 0xf || cpu.icntl > 0x1f {
            return Err(invalid("mode register out of range"));
        }
        cpu.idle = r.bool()?;
        cpu.irq_poll = r.bool()?;
        for core in cpu.banks.iter_mut() {
            *core.raw_mut() = r.u16s()?;
        }
        let i = r.u16s()?;
        let m = r.u16s::<8>()?.map(|v| v as i16);
        let l = r.u16s()?;
        let base = r.u16s()?;
        cpu.dag.restore(i, m, l, base);

        let sp = r.u8()? as usize;
        if !cpu.pc_stack.restore(r.u16s()?, sp) {
            return Err(invalid("PC stack pointer out of range"));
        }
        let sp = r.u8()? as usize;
        if !cpu.cntr_stack.restore(r.u16s()?, sp) {
            return Err(invalid("counter stack pointer out of range"));
        }
        let sp = r.u8()? as usize;
        let mut slots = [[0; 3]; StatStack::DEPTH];
        for slot in slots.iter_mut() {
            *slot = r.u16s()?;
        }
        if !cpu.stat_stack.restore(slots, sp) {
            return Err(invalid("status stack pointer out of range"));
        }
        let sp = r.u8()? as usize;
        let mut slots = [0; LoopStack::DEPTH];
        for slot in slots.iter_mut() {
            *slot = r.u32()?;
        }
        if !cpu.loop_stack.restore(slots, sp) {
            return Err(invalid("loop stack pointer out of range"));
        }

        cpu.irq_state = r.bools()?;
        cpu.irq_latch = r.bools()?;
        cpu.flag_in = r.bool()?;
        cpu.cycle = r.u64()? as usize;

        cpu.mstat_changed();
        cpu.cache_loop();
        *self = cpu;
        Ok(self)
    }
}
