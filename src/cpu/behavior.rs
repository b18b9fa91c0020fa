// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Contains implementations for each ADSP-2100 [Insn]

use super::{
    bus::Memory,
    instruction::{Addr, Compute, Insn, Loc, Shift, Unit},
    registers::{slot, Slot, DREG},
    status::mstat,
    CPU,
};

impl CPU {
    /// Executes a single [Insn]
    #[rustfmt::skip]
    #[inline(always)]
    pub(super) fn dispatch(&mut self, bus: &mut impl Memory, instruction: Insn) {
        match instruction {
            Insn::nop                                 => {}
            Insn::idle                                => self.idle = true,
            Insn::jump_fi     { addr, call, set }     => self.jump_flag_in(addr, call, set),
            Insn::stack       { pop_pc, pop_loop, pop_cntr, push_stat, pop_stat }
                                                      => self.stack_control(pop_pc, pop_loop, pop_cntr, push_stat, pop_stat),
            Insn::sat_mr                              => self.saturate_mr(),
            Insn::divs        { x, y }                => self.divs(x, y),
            Insn::divq        { x }                   => self.divq(x),
            Insn::modify      { addr }                => { self.dag.modify(addr.i, addr.m); }
            Insn::ret         { cond, rti }           => self.ret(cond, rti),
            Insn::jump_ind    { cond, i, call }       => self.jump_indirect(cond, i, call),
            Insn::mode        { set, clear }          => self.mode_control(set, clear),
            Insn::mov         { dst, src }            => self.move_reg(dst, src),
            Insn::shift       { cond, shift }         => if self.condition(cond) { self.shift_op(shift) },
            Insn::shift_imm   { shift }               => self.shift_op(shift),
            Insn::shift_mov   { shift, dst, src }     => self.shift_move(shift, dst, src),
            Insn::shift_pm    { shift, reg, addr, write } => self.shift_pm(bus, shift, reg, addr, write),
            Insn::shift_dm    { shift, reg, addr, write } => self.shift_dm(bus, shift, reg, addr, write),
            Insn::do_until    { addr, cond }          => self.do_until(addr, cond),
            Insn::jump        { cond, addr }          => self.jump(cond, addr),
            Insn::call        { cond, addr }          => self.call(cond, addr),
            Insn::compute     { cond, op }            => if self.condition(cond) { self.compute(op) },
            Insn::compute_mov { op, dst, src }        => self.compute_move(op, dst, src),
            Insn::load_imm    { dst, value }          => self.write_reg(dst, value),
            Insn::compute_pm  { op, reg, addr, write } => self.compute_pm(bus, op, reg, addr, write),
            Insn::compute_dm  { op, reg, addr, write } => self.compute_dm(bus, op, reg, addr, write),
            Insn::load        { dst, addr }           => self.load_direct(bus, dst, addr),
            Insn::store       { src, addr }           => self.store_direct(bus, src, addr),
            Insn::store_imm   { addr, value }         => self.data_write(bus, addr, value),
            Insn::dual        { op, dm_reg, dm, pm_reg, pm } => self.dual_read(bus, op, dm_reg, dm, pm_reg, pm),
            Insn::reserved    { op }                  => {
                log::debug!("Reserved opcode {op:06x} at {:04x}", self.ppc);
            }
        }
    }

    /// Runs the ALU or MAC half of a compute field
    #[inline(always)]
    pub(super) fn compute(&mut self, op: Compute) {
        match op.unit {
            Unit::Alu => self.alu_op(op),
            Unit::Mac => self.mac_op(op),
        }
    }
}

/// Register file access, through the register map
///
/// |group| contents
/// |-----|---------------------------------------------------------
/// |  0  | data registers AX0..SR1
/// |  1  | DAG1: I0..I3, M0..M3, L0..L3
/// |  2  | DAG2: I4..I7, M4..M7, L4..L7
/// |  3  | ASTAT MSTAT SSTAT IMASK ICNTL CNTR SB PX, TOPPCSTACK at f
impl CPU {
    /// Reads a data register from the live bank
    #[inline(always)]
    pub(super) fn read_dreg(&self, n: usize) -> u16 {
        self.core().get(DREG[n & 0xf])
    }

    /// Writes a data register in the live bank
    #[inline(always)]
    pub(super) fn write_dreg(&mut self, n: usize, value: u16) {
        self.core_mut().load(DREG[n & 0xf], value)
    }

    /// Reads any mapped register. Reading TOPPCSTACK pops it.
    pub(super) fn read_reg(&mut self, loc: Loc) -> u16 {
        match slot(loc.group, loc.index) {
            Slot::Data(reg) => self.core().get(reg),
            Slot::Index(n) => self.dag.i(n),
            Slot::Modify(n) => self.dag.m(n) as u16,
            Slot::Length(n) => self.dag.l(n),
            Slot::Astat => self.astat,
            Slot::Mstat => self.mstat,
            Slot::Sstat => self.sstat,
            Slot::Imask => self.imask,
            Slot::Icntl => self.icntl,
            Slot::Cntr => self.cntr,
            Slot::Px => self.px,
            Slot::PcStack => self.pop_pc(),
            Slot::Invalid => {
                log::warn!("{:04x}: read from unmapped register {loc}", self.ppc);
                0
            }
        }
    }

    /// Writes any mapped register, trimming the value to the register's width.
    ///
    /// Writing CNTR pushes the old count, and writing TOPPCSTACK pushes.
    pub(super) fn write_reg(&mut self, loc: Loc, value: u16) {
        match slot(loc.group, loc.index) {
            Slot::Data(reg) => self.core_mut().load(reg, value),
            Slot::Index(n) => self.dag.set_i(n, value),
            Slot::Modify(n) => self.dag.set_m(n, value),
            Slot::Length(n) => self.dag.set_l(n, value),
            Slot::Astat => self.astat = value & 0xff,
            Slot::Mstat => {
                self.mstat = value & mstat::MASK;
                self.mstat_changed();
            }
            Slot::Imask => {
                self.imask = value & 0xf;
                self.irq_poll = true;
            }
            Slot::Icntl => {
                self.icntl = value & 0x1f;
                self.irq_poll = true;
            }
            Slot::Cntr => {
                self.push_cntr();
                self.cntr = value & 0x3fff;
            }
            Slot::Px => self.px = value & 0xff,
            Slot::PcStack => self.push_pc(value & 0x3fff),
            Slot::Sstat | Slot::Invalid => {
                log::warn!("{:04x}: write to read-only register {loc}", self.ppc);
            }
        }
    }

    /// |`0d`| Moves one register to another
    #[inline(always)]
    pub(super) fn move_reg(&mut self, dst: Loc, src: Loc) {
        let value = self.read_reg(src);
        self.write_reg(dst, value);
    }

    /// |`80`| Loads a register from an absolute data address
    #[inline(always)]
    pub(super) fn load_direct(&mut self, bus: &mut impl Memory, dst: Loc, addr: u16) {
        let value = bus.read_data(addr);
        self.write_reg(dst, value);
    }

    /// |`90`| Stores a register to an absolute data address
    #[inline(always)]
    pub(super) fn store_direct(&mut self, bus: &mut impl Memory, src: Loc, addr: u16) {
        let value = self.read_reg(src);
        bus.write_data(addr, value);
    }
}

/// Program flow
///
/// |opcode| effect
/// |------|---------------------------------------------
/// | `03` | Jump or call on the state of the flag-in pin
/// | `04` | Pop the PC, loop, or counter stacks
/// | `0a` | Conditional return (or return from interrupt)
/// | `0b` | Conditional jump to I
/// | `0c` | Mode control
/// | `14` | DO UNTIL
/// | `18` | Conditional jump
/// | `1c` | Conditional call
impl CPU {
    /// |`03`| Jumps (or calls) if the flag-in pin is `set`
    #[inline(always)]
    pub(super) fn jump_flag_in(&mut self, addr: u16, call: bool, set: bool) {
        if self.flag_in == set {
            if call {
                self.push_pc(self.pc);
            }
            self.pc = addr;
        }
    }

    /// |`04`| Stack control
    #[inline(always)]
    pub(super) fn stack_control(
        &mut self,
        pop_pc: bool,
        pop_loop: bool,
        pop_cntr: bool,
        push_stat: bool,
        pop_stat: bool,
    ) {
        if pop_pc {
            self.pop_pc();
        }
        if pop_loop {
            self.pop_loop();
        }
        if pop_cntr {
            self.pop_cntr();
        }
        if push_stat {
            self.push_stat();
        }
        if pop_stat {
            self.pop_stat();
        }
    }

    /// |`0a`| Returns from a subroutine. RTI also restores the status stack.
    #[inline(always)]
    pub(super) fn ret(&mut self, cond: u32, rti: bool) {
        if self.condition(cond) {
            self.pc = self.pop_pc();
            if rti {
                self.pop_stat();
            }
        }
    }

    /// |`0b`| Jumps or calls to the address in a DAG2 index register
    #[inline(always)]
    pub(super) fn jump_indirect(&mut self, cond: u32, i: usize, call: bool) {
        if self.condition(cond) {
            if call {
                self.push_pc(self.pc);
            }
            self.pc = self.dag.i(i);
        }
    }

    /// |`0c`| Sets, then clears, bits in MSTAT
    #[inline(always)]
    pub(super) fn mode_control(&mut self, set: u16, clear: u16) {
        self.mstat = (self.mstat | set) & !clear & mstat::MASK;
        self.mstat_changed();
    }

    /// |`14`| Starts a hardware loop: the body runs from here to `addr`
    /// until `cond` holds at the end of an iteration
    #[inline(always)]
    pub(super) fn do_until(&mut self, addr: u16, cond: u32) {
        self.push_pc(self.pc);
        self.push_loop((addr as u32) << 4 | (cond & 0xf));
    }

    /// |`18`| Conditional jump
    #[inline(always)]
    pub(super) fn jump(&mut self, cond: u32, addr: u16) {
        if self.condition(cond) {
            self.pc = addr;
        }
    }

    /// |`1c`| Conditional call
    #[inline(always)]
    pub(super) fn call(&mut self, cond: u32, addr: u16) {
        if self.condition(cond) {
            self.push_pc(self.pc);
            self.pc = addr;
        }
    }
}

/// Multifunction instructions
///
/// A data move paired with a computation. Register moves and memory reads
/// sample their source before the computation runs, so both halves see the
/// register file as it was. Memory writes store before the computation, too.
impl CPU {
    /// |`10`| Shift, and move a data register
    pub(super) fn shift_move(&mut self, shift: Shift, dst: usize, src: usize) {
        let value = self.read_dreg(src);
        self.shift_op(shift);
        self.write_dreg(dst, value);
    }

    /// |`11`| Shift, and transfer a data register to or from program memory
    pub(super) fn shift_pm(&mut self, bus: &mut impl Memory, shift: Shift, reg: usize, addr: Addr, write: bool) {
        if write {
            let value = self.read_dreg(reg);
            self.pgm_write(bus, addr, value);
            self.shift_op(shift);
        } else {
            let value = self.pgm_read(bus, addr);
            self.shift_op(shift);
            self.write_dreg(reg, value);
        }
    }

    /// |`12`| Shift, and transfer a data register to or from data memory
    pub(super) fn shift_dm(&mut self, bus: &mut impl Memory, shift: Shift, reg: usize, addr: Addr, write: bool) {
        if write {
            let value = self.read_dreg(reg);
            self.data_write(bus, addr, value);
            self.shift_op(shift);
        } else {
            let value = self.data_read(bus, addr);
            self.shift_op(shift);
            self.write_dreg(reg, value);
        }
    }

    /// |`28`| Compute, and move a data register
    pub(super) fn compute_move(&mut self, op: Compute, dst: usize, src: usize) {
        let value = self.read_dreg(src);
        self.compute(op);
        self.write_dreg(dst, value);
    }

    /// |`50`| Compute, and transfer a data register to or from program memory
    pub(super) fn compute_pm(&mut self, bus: &mut impl Memory, op: Compute, reg: usize, addr: Addr, write: bool) {
        if write {
            let value = self.read_dreg(reg);
            self.pgm_write(bus, addr, value);
            self.compute(op);
        } else {
            let value = self.pgm_read(bus, addr);
            self.compute(op);
            self.write_dreg(reg, value);
        }
    }

    /// |`60`| Compute, and transfer a data register to or from data memory
    pub(super) fn compute_dm(&mut self, bus: &mut impl Memory, op: Compute, reg: usize, addr: Addr, write: bool) {
        if write {
            let value = self.read_dreg(reg);
            self.data_write(bus, addr, value);
            self.compute(op);
        } else {
            let value = self.data_read(bus, addr);
            self.compute(op);
            self.write_dreg(reg, value);
        }
    }

    /// |`c0`| Compute, then read data memory through DAG1 and program memory
    /// through DAG2 at once
    pub(super) fn dual_read(
        &mut self,
        bus: &mut impl Memory,
        op: Compute,
        dm_reg: usize,
        dm: Addr,
        pm_reg: usize,
        pm: Addr,
    ) {
        self.compute(op);
        let dm = self.data_read(bus, dm);
        let pm = self.pgm_read(bus, pm);
        self.write_dreg(dm_reg, dm);
        self.write_dreg(pm_reg, pm);
    }
}
