// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! This crate implements an interpreter for the Analog Devices ADSP-2100
//! digital signal processor: its ALU, multiplier/accumulator and barrel
//! shifter, the circular-buffer address generators, the hardware stacks and
//! loop sequencer, and interrupt delivery.
//!
//! The core owns no memory. It reaches program and data space through the
//! [Memory](cpu::bus::Memory) trait, and [Bus](cpu::bus::Bus) is a ready-made
//! implementation for hosts and tests.

pub mod cpu;
pub mod error;

/// A [CPU](cpu::CPU), paired with the [Bus](cpu::bus::Bus) it runs on
#[derive(Clone, Debug, Default)]
pub struct Adsp {
    pub cpu: cpu::CPU,
    pub bus: cpu::bus::Bus,
}

impl Adsp {
    /// Constructs a reset CPU on a full-size bus
    pub fn new() -> Self {
        Self {
            cpu: cpu::CPU::new(),
            bus: cpu::bus::Bus::full(),
        }
    }

    /// Runs the CPU on its bus for up to `cycles` cycles
    /// # Examples
    /// ```rust
    /// # use adsp::prelude::*;
    /// # fn main() -> Result<()> {
    /// let mut adsp = Adsp::new();
    /// adsp.bus.load_program_bytes(&[0x18, 0x00, 0x0f])?; // JUMP 0000
    /// assert_eq!(10, adsp.execute(10));
    /// assert_eq!(0, adsp.cpu.pc());
    /// # Ok(())
    /// # }
    /// ```
    pub fn execute(&mut self, cycles: usize) -> usize {
        self.cpu.execute(&mut self.bus, cycles)
    }
}

/// Common imports for adsp
pub mod prelude {
    pub use super::Adsp;
    use super::*;
    pub use crate::bus;
    pub use cpu::{
        bus::{Bus, Memory, Region::*},
        instruction::{
            disassembler::{Dis, Disassembler},
            Insn,
        },
        registers::Reg,
        status::{astat, mstat, sstat},
        ControlFlags, CPU,
    };
    pub use error::Result;
}
