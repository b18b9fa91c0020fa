// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Decodes and runs instructions


pub mod alu;
pub mod behavior;
pub mod bus;
pub mod dag;
pub mod flags;
pub mod instruction;
pub mod mac;
pub mod registers;
pub mod shifter;
pub mod stack;
pub mod state;
pub mod status;

pub use self::flags::ControlFlags;

use self::{
    bus::Memory,
    dag::Dags,
    instruction::{
        disassembler::{Dis, Disassembler},
        Insn, Loc,
    },
    registers::{Core, Reg},
    stack::{CntrStack, LoopStack, PcStack, StatStack, NO_LOOP},
    status::{clear_mask, sstat},
};
use crate::error::{Error, Result};
use owo_colors::OwoColorize;
use std::fmt::Debug;

/// Number of external interrupt lines
pub const IRQ_LINES: usize = 4;

/// Loop termination code which never terminates
const FOREVER: u32 = 0xf;

/// Maps an interrupt line to the address of its service routine
pub type IrqCallback = fn(usize) -> u16;

/// Represents the internal state of the ADSP-2100 interpreter
#[derive(Clone)]
pub struct CPU {
    /// Flags that control how the CPU behaves, but which aren't inherent to the
    /// ADSP-2100.
    pub flags: ControlFlags,
    // computational registers, two banks
    banks: [Core; 2],
    // address generators
    dag: Dags,
    // program sequencer
    pc: u16,
    ppc: u16,
    cntr: u16,
    // status
    astat: u16,
    astat_clear: u16,
    mstat: u16,
    sstat: u16,
    imask: u16,
    icntl: u16,
    px: u16,
    idle: bool,
    irq_poll: bool,
    // stacks
    pc_stack: PcStack,
    cntr_stack: CntrStack,
    stat_stack: StatStack,
    loop_stack: LoopStack,
    loop_end: u32,
    loop_cond: u32,
    // I/O
    irq_state: [bool; IRQ_LINES],
    irq_latch: [bool; IRQ_LINES],
    irq_callback: Option<IrqCallback>,
    flag_in: bool,
    // Execution data
    cycle: usize,
    breakpoints: Vec<u16>,
    disassembler: Dis,
}

// public interface
impl CPU {
    /// Constructs a new CPU in its reset state
    /// # Examples
    /// ```rust
    /// # use adsp::prelude::*;
    /// let cpu = CPU::new();
    /// assert_eq!(0, cpu.pc());
    /// assert_eq!(0x55, cpu.sstat());
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the program counter
    /// # Examples
    /// ```rust
    /// # use adsp::prelude::*;
    /// let cpu = CPU::default();
    /// assert_eq!(0, cpu.pc());
    /// ```
    pub fn pc(&self) -> u16 {
        self.pc
    }

    /// Sets the program counter, for hosts which boot somewhere other than 0
    pub fn set_pc(&mut self, pc: u16) -> &mut Self {
        self.pc = pc & dag::ADDR_MASK;
        self
    }

    /// Gets the address of the most recently fetched instruction
    pub fn ppc(&self) -> u16 {
        self.ppc
    }

    /// Gets the number of cycles the CPU has executed
    /// # Examples
    /// ```rust
    /// # use adsp::prelude::*;
    /// let cpu = CPU::default();
    /// assert_eq!(0, cpu.cycle());
    /// ```
    pub fn cycle(&self) -> usize {
        self.cycle
    }

    /// Gets the arithmetic status register
    pub fn astat(&self) -> u16 {
        self.astat
    }

    /// Gets the mode status register
    pub fn mstat(&self) -> u16 {
        self.mstat
    }

    /// Gets the stack status register
    /// # Examples
    /// ```rust
    /// # use adsp::prelude::*;
    /// let cpu = CPU::default();
    /// // every stack starts out empty
    /// assert_eq!(0x55, cpu.sstat());
    /// ```
    pub fn sstat(&self) -> u16 {
        self.sstat
    }

    /// Gets the interrupt mask
    pub fn imask(&self) -> u16 {
        self.imask
    }

    /// Gets the interrupt control register
    pub fn icntl(&self) -> u16 {
        self.icntl
    }

    /// Gets the loop counter
    pub fn cntr(&self) -> u16 {
        self.cntr
    }

    /// Gets the PX register, the low byte of the last program memory transfer
    pub fn px(&self) -> u16 {
        self.px
    }

    /// Returns true while the CPU is idling, waiting for an interrupt
    pub fn idle(&self) -> bool {
        self.idle
    }

    /// Gets the state of the flag-in pin
    pub fn flag_in(&self) -> bool {
        self.flag_in
    }

    /// Gets a register from the live bank
    /// # Examples
    /// ```rust
    /// # use adsp::prelude::*;
    /// let mut cpu = CPU::default();
    /// cpu.set_reg(Reg::Ax0, 0x1234);
    /// assert_eq!(0x1234, cpu.reg(Reg::Ax0));
    /// ```
    pub fn reg(&self, reg: Reg) -> u16 {
        self.core().get(reg)
    }

    /// Sets a register in the live bank, honoring its width
    /// # Examples
    /// ```rust
    /// # use adsp::prelude::*;
    /// let mut cpu = CPU::default();
    /// // SE is 8 bits wide
    /// cpu.set_reg(Reg::Se, 0x01ff);
    /// assert_eq!(0xffff, cpu.reg(Reg::Se));
    /// ```
    pub fn set_reg(&mut self, reg: Reg, value: u16) -> &mut Self {
        self.core_mut().load(reg, value);
        self
    }

    /// Gets the 40-bit MR accumulator of the live bank, sign-extended
    pub fn mr(&self) -> i64 {
        self.core().mr()
    }

    /// Gets the 32-bit SR register of the live bank
    pub fn sr(&self) -> u32 {
        self.core().sr()
    }

    /// Gets one of the two register banks. The live one is `mstat() & 1`.
    pub fn bank_regs(&self, bank: usize) -> Option<&Core> {
        self.banks.get(bank)
    }

    /// Gets the address generators
    pub fn dag(&self) -> &Dags {
        &self.dag
    }

    /// Gets the PC stack
    pub fn pc_stack(&self) -> &PcStack {
        &self.pc_stack
    }

    /// Gets the counter stack
    pub fn cntr_stack(&self) -> &CntrStack {
        &self.cntr_stack
    }

    /// Gets the status stack
    pub fn stat_stack(&self) -> &StatStack {
        &self.stat_stack
    }

    /// Gets the loop stack
    pub fn loop_stack(&self) -> &LoopStack {
        &self.loop_stack
    }

    /// Reads a register through the `(group, index)` register map, the way a
    /// register move would. Reading the top of the PC stack pops it.
    ///
    /// Unmapped slots read as 0.
    /// # Examples
    /// ```rust
    /// # use adsp::prelude::*;
    /// let mut cpu = CPU::default();
    /// cpu.write_register(1, 0, 0x0123); // I0
    /// assert_eq!(0x0123, cpu.read_register(1, 0));
    /// assert_eq!(0, cpu.read_register(3, 8)); // unmapped
    /// ```
    pub fn read_register(&mut self, group: usize, index: usize) -> u16 {
        self.read_reg(Loc { group, index })
    }

    /// Writes a register through the `(group, index)` register map, the way
    /// a register move would.
    ///
    /// Writes to unmapped slots and to SSTAT are dropped.
    pub fn write_register(&mut self, group: usize, index: usize, value: u16) -> &mut Self {
        self.write_reg(Loc { group, index }, value);
        self
    }

    /// Drives an interrupt line. Asserting a line also latches it, for lines
    /// ICNTL sets to edge-sensitive.
    ///
    /// If the line doesn't exist, returns [Error::InvalidIrqLine]
    /// # Examples
    /// ```rust
    /// # use adsp::prelude::*;
    /// let mut cpu = CPU::default();
    /// assert!(cpu.set_irq_line(3, true).is_ok());
    /// assert!(cpu.set_irq_line(4, true).is_err());
    /// ```
    pub fn set_irq_line(&mut self, line: usize, state: bool) -> Result<&mut Self> {
        let Some(current) = self.irq_state.get_mut(line) else {
            return Err(Error::InvalidIrqLine { line });
        };
        *current = state;
        if state {
            self.irq_latch[line] = true;
        }
        self.irq_poll = true;
        Ok(self)
    }

    /// Sets the callback which picks the service routine address for an
    /// interrupt line. Without one, each line vectors to its own number.
    pub fn set_irq_vector_callback(&mut self, callback: Option<IrqCallback>) -> &mut Self {
        self.irq_callback = callback;
        self
    }

    /// Sets the state of the flag-in pin
    pub fn set_flag_in(&mut self, state: bool) -> &mut Self {
        self.flag_in = state;
        self
    }

    /// Clears the sticky overflow bits in SSTAT, leaving the empty bits
    /// describing the stacks as they are
    /// # Examples
    /// ```rust
    /// # use adsp::prelude::*;
    /// let mut cpu = CPU::default();
    /// for _ in 0..5 {
    ///     cpu.write_register(3, 5, 1); // CNTR pushes the counter stack
    /// }
    /// assert_ne!(0, cpu.sstat() & 0x08);
    /// cpu.reset_stack_status();
    /// assert_eq!(0, cpu.sstat() & 0x08);
    /// ```
    pub fn reset_stack_status(&mut self) -> &mut Self {
        self.sstat = self.empty_bits();
        self
    }

    /// Resets the CPU to its power-on state.
    ///
    /// Does not touch [ControlFlags], breakpoints, the interrupt vector
    /// callback, or the disassembler.
    /// # Examples
    /// ```rust
    /// # use adsp::prelude::*;
    /// let mut cpu = CPU::default();
    /// cpu.set_pc(0x40).set_reg(Reg::Ar, 5);
    /// cpu.reset();
    /// assert_eq!(0, cpu.pc());
    /// assert_eq!(0, cpu.reg(Reg::Ar));
    /// ```
    pub fn reset(&mut self) {
        *self = CPU {
            flags: self.flags.clone(),
            irq_callback: self.irq_callback,
            breakpoints: std::mem::take(&mut self.breakpoints),
            disassembler: self.disassembler,
            ..Default::default()
        };
    }

    /// Pauses the CPU. [CPU::execute] runs nothing until it's unpaused.
    pub fn halt(&mut self) -> &mut Self {
        self.flags.pause = true;
        self
    }

    /// Set a breakpoint
    pub fn set_break(&mut self, point: u16) -> &mut Self {
        if !self.breakpoints.contains(&point) {
            self.breakpoints.push(point)
        }
        self
    }

    /// Unset a breakpoint
    pub fn unset_break(&mut self, point: u16) -> &mut Self {
        self.breakpoints.retain(|&bp| bp != point);
        self
    }

    /// Gets a slice of breakpoints
    /// # Examples
    /// ```rust
    /// # use adsp::prelude::*;
    /// let mut cpu = CPU::default();
    /// assert_eq!(cpu.breakpoints(), &[]);
    /// cpu.set_break(0x10).set_break(0x10);
    /// assert_eq!(cpu.breakpoints(), &[0x10]);
    /// cpu.unset_break(0x10);
    /// assert_eq!(cpu.breakpoints(), &[]);
    /// ```
    pub fn breakpoints(&self) -> &[u16] {
        self.breakpoints.as_slice()
    }

    /// Unpauses the CPU for a single instruction, even if cpu.flags.pause is set
    /// # Examples
    /// ```rust
    /// # use adsp::prelude::*;
    /// let mut cpu = CPU::default();
    /// let mut bus = bus! {
    ///     Program [0x0000..0x4000] = &[
    ///         0x400010, // AX0 = 0x0001
    ///     ],
    ///     Data    [0x4000..0x8000],
    /// };
    /// cpu.singlestep(&mut bus);
    /// assert_eq!(1, cpu.pc());
    /// assert_eq!(1, cpu.reg(Reg::Ax0));
    /// assert!(cpu.flags.pause);
    /// ```
    pub fn singlestep(&mut self, bus: &mut impl Memory) -> &mut Self {
        self.flags.pause = false;
        self.execute(bus, 1);
        self.flags.pause = true;
        self
    }

    /// Runs for up to `cycles` cycles, returning the number actually consumed.
    ///
    /// Stops early if the CPU is paused, by [CPU::halt] or by reaching a
    /// breakpoint. While idle, the rest of the budget is consumed at once.
    /// # Examples
    /// ```rust
    /// # use adsp::prelude::*;
    /// let mut cpu = CPU::default();
    /// let mut bus = bus! {
    ///     Program [0x0000..0x4000] = &[
    ///         0x000000, // NOP
    ///         0x18000f, // JUMP 0000
    ///     ],
    ///     Data    [0x4000..0x8000],
    /// };
    /// assert_eq!(0x20, cpu.execute(&mut bus, 0x20));
    /// assert_eq!(0, cpu.pc());
    /// assert_eq!(0x20, cpu.cycle());
    /// ```
    pub fn execute(&mut self, bus: &mut impl Memory, cycles: usize) -> usize {
        let mut ran = 0;
        while ran < cycles {
            if self.flags.pause {
                break;
            }
            if self.irq_poll {
                self.check_irqs();
            }
            if self.idle {
                self.cycle += cycles - ran;
                ran = cycles;
                break;
            }
            self.step(bus);
            ran += 1;
            if !self.breakpoints.is_empty() && self.breakpoints.contains(&self.pc) {
                log::debug!("Breakpoint hit at {:04x}", self.pc);
                self.flags.pause = true;
            }
        }
        ran
    }

    /// Dumps the current state of the CPU registers, and the cycle count
    /// # Examples
    /// ```rust
    /// # use adsp::prelude::*;
    /// let cpu = CPU::default();
    /// cpu.dump();
    /// ```
    /// outputs
    /// ```text
    /// PC: 0000, CNTR: 0000, PX: 00, CYC:      0
    /// ASTAT: 00, MSTAT: 0, SSTAT: 55, IMASK: 0, ICNTL: 00
    /// AX0: 0000 AX1: 0000 MX0: 0000 MX1: 0000
    /// AY0: 0000 AY1: 0000 MY0: 0000 MY1: 0000
    /// SI:  0000 SE:  0000 AR:  0000 MR0: 0000
    /// MR1: 0000 MR2: 0000 SR0: 0000 SR1: 0000
    /// AF:  0000 MF:  0000 SB:  0000
    /// I0: 0000 M0: 0000 L0: 0000  I4: 0000 M4: 0000 L4: 0000
    /// ...
    /// ```
    pub fn dump(&self) {
        let core = self.core();
        let regs: String = Reg::ALL[..Reg::COUNT - 1]
            .iter()
            .enumerate()
            .map(|(i, &reg)| {
                format!(
                    "{:<4} {:04x}{}",
                    format!("{reg}:"),
                    core.get(reg),
                    if i % 4 == 3 { "\n" } else { " " }
                )
            })
            .collect();
        let dags: String = (0..4)
            .map(|n| {
                format!(
                    "I{n}: {:04x} M{n}: {:04x} L{n}: {:04x}  I{}: {:04x} M{}: {:04x} L{}: {:04x}\n",
                    self.dag.i(n),
                    self.dag.m(n) as u16,
                    self.dag.l(n),
                    n + 4,
                    self.dag.i(n + 4),
                    n + 4,
                    self.dag.m(n + 4) as u16,
                    n + 4,
                    self.dag.l(n + 4),
                )
            })
            .collect();
        std::println!(
            "PC: {:04x}, CNTR: {:04x}, PX: {:02x}, CYC: {:6}\n\
             ASTAT: {:02x}, MSTAT: {:x}, SSTAT: {:02x}, IMASK: {:x}, ICNTL: {:02x}\n\
             {}\n{}",
            self.pc,
            self.cntr,
            self.px,
            self.cycle,
            self.astat,
            self.mstat,
            self.sstat,
            self.imask,
            self.icntl,
            regs,
            dags.trim_end(),
        );
    }
}

// internals
impl CPU {
    /// The live register bank
    #[inline(always)]
    pub(super) fn core(&self) -> &Core {
        &self.banks[self.bank()]
    }

    /// The live register bank, mutably
    #[inline(always)]
    pub(super) fn core_mut(&mut self) -> &mut Core {
        let bank = self.bank();
        &mut self.banks[bank]
    }

    /// SSTAT's empty bits, as the stacks stand now
    fn empty_bits(&self) -> u16 {
        let mut bits = 0;
        for (empty, bit) in [
            (self.pc_stack.is_empty(), sstat::PC_EMPTY),
            (self.cntr_stack.is_empty(), sstat::COUNT_EMPTY),
            (self.stat_stack.is_empty(), sstat::STATUS_EMPTY),
            (self.loop_stack.is_empty(), sstat::LOOP_EMPTY),
        ] {
            if empty {
                bits |= bit;
            }
        }
        bits
    }

    /// Fetches, decodes, and executes one instruction
    fn step(&mut self, bus: &mut impl Memory) {
        self.ppc = self.pc;
        let op = bus.read_program(self.pc);

        // Print opcode disassembly:
        if self.flags.debug {
            std::println!(
                "{:3} {:04x}: {:06x} {:<36}",
                self.cycle.bright_black(),
                self.pc,
                op,
                self.disassembler.once(op)
            );
        }

        // The loop hardware watches every fetch for the end of the innermost loop
        if self.pc as u32 != self.loop_end {
            self.pc = (self.pc + 1) & dag::ADDR_MASK;
        } else if self.loop_cond & 0xf == FOREVER || !self.condition(self.loop_cond) {
            self.pc = self.pc_stack.top();
        } else {
            self.pop_loop();
            self.pop_pc();
            self.pc = (self.pc + 1) & dag::ADDR_MASK;
        }

        self.cycle += 1;
        self.dispatch(bus, Insn::decode(op));
    }

    /// Takes the highest priority interrupt which is both pending and unmasked
    pub(super) fn check_irqs(&mut self) {
        self.irq_poll = false;
        for line in (0..IRQ_LINES).rev() {
            let edge = self.icntl & (1 << line) != 0;
            let pending = if edge {
                self.irq_latch[line]
            } else {
                self.irq_state[line]
            };
            if pending && self.imask & (1 << line) != 0 {
                self.take_irq(line);
                return;
            }
        }
    }

    fn take_irq(&mut self, line: usize) {
        self.irq_latch[line] = false;
        self.push_pc(self.pc);
        self.push_stat();
        self.idle = false;
        let vector = match self.irq_callback {
            Some(callback) => callback(line),
            None => line as u16,
        };
        log::trace!("Interrupt {line} taken, vector {vector:04x}");
        self.pc = vector & dag::ADDR_MASK;
        if self.icntl & 0x10 != 0 {
            self.imask &= !((2 << line) - 1);
        } else {
            self.imask &= !0xf;
        }
    }
}

impl Debug for CPU {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CPU")
            .field("flags", &self.flags)
            .field("banks", &self.banks)
            .field("dag", &self.dag)
            .field("pc", &self.pc)
            .field("cntr", &self.cntr)
            .field("astat", &self.astat)
            .field("mstat", &self.mstat)
            .field("sstat", &self.sstat)
            .field("imask", &self.imask)
            .field("icntl", &self.icntl)
            .field("px", &self.px)
            .field("idle", &self.idle)
            .field("pc_stack", &self.pc_stack)
            .field("cntr_stack", &self.cntr_stack)
            .field("stat_stack", &self.stat_stack)
            .field("loop_stack", &self.loop_stack)
            .field("irq_state", &self.irq_state)
            .field("irq_latch", &self.irq_latch)
            .field("flag_in", &self.flag_in)
            .field("cycle", &self.cycle)
            .field("breakpoints", &self.breakpoints)
            .finish_non_exhaustive()
    }
}

impl Default for CPU {
    /// Constructs a new CPU in its power-on state, with debug mode off
    ///
    /// | value  | default  | description
    /// |--------|----------|------------
    /// | pc     | `0x0000` | Reset vector
    /// | sstat  | `0x55`   | All four stacks empty
    /// | mstat  | `0x0`    | Bank 0, no bit-reverse, no saturation
    /// | imask  | `0x0`    | Every interrupt masked
    ///
    /// # Examples
    /// ```rust
    /// use adsp::prelude::*;
    /// let mut cpu = CPU::default();
    /// ```
    fn default() -> Self {
        CPU {
            flags: ControlFlags::default(),
            banks: [Core::default(); 2],
            dag: Dags::default(),
            pc: 0,
            ppc: 0,
            cntr: 0,
            astat: 0,
            astat_clear: clear_mask(0),
            mstat: 0,
            sstat: sstat::RESET,
            imask: 0,
            icntl: 0,
            px: 0,
            idle: false,
            irq_poll: false,
            pc_stack: PcStack::default(),
            cntr_stack: CntrStack::default(),
            stat_stack: StatStack::default(),
            loop_stack: LoopStack::default(),
            loop_end: NO_LOOP,
            loop_cond: 0,
            irq_state: [false; IRQ_LINES],
            irq_latch: [false; IRQ_LINES],
            irq_callback: None,
            flag_in: false,
            cycle: 0,
            breakpoints: vec![],
            disassembler: Dis::default(),
        }
    }
}
