// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Fixed-depth hardware stacks
//!
//! The core has four: PC, loop counter, status, and loop. Each reports into
//! SSTAT: an EMPTY bit which tracks depth zero, and a sticky OVER bit which
//! is set when a push finds the stack full. A full stack drops the push.
//! Popping an empty stack leaves the pointer at zero and yields slot 0.

use super::{status::sstat, CPU};

/// A fixed-capacity stack of `N` entries
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Stack<T, const N: usize> {
    slots: [T; N],
    sp: usize,
}

impl<T: Copy + Default, const N: usize> Default for Stack<T, N> {
    fn default() -> Self {
        Self {
            slots: [T::default(); N],
            sp: 0,
        }
    }
}

impl<T: Copy + Default, const N: usize> Stack<T, N> {
    /// Capacity of the stack
    pub const DEPTH: usize = N;

    /// Pushes a value, returning false if the stack was full and the
    /// value was dropped
    /// # Examples
    /// ```rust
    /// # use adsp::cpu::stack::Stack;
    /// let mut stack = Stack::<u16, 2>::default();
    /// assert!(stack.push(1));
    /// assert!(stack.push(2));
    /// assert!(!stack.push(3));
    /// assert_eq!(2, stack.top());
    /// ```
    pub fn push(&mut self, value: T) -> bool {
        if let Some(slot) = self.slots.get_mut(self.sp) {
            *slot = value;
            self.sp += 1;
            true
        } else {
            false
        }
    }

    /// Pops a value. An empty stack yields slot 0.
    /// # Examples
    /// ```rust
    /// # use adsp::cpu::stack::Stack;
    /// let mut stack = Stack::<u16, 2>::default();
    /// stack.push(0x123);
    /// assert_eq!(0x123, stack.pop());
    /// assert_eq!(0x123, stack.pop());
    /// assert_eq!(0, stack.sp());
    /// ```
    pub fn pop(&mut self) -> T {
        self.sp = self.sp.saturating_sub(1);
        self.slots[self.sp]
    }

    /// Peeks at the top entry. An empty stack yields slot 0.
    pub fn top(&self) -> T {
        self.slots[self.sp.saturating_sub(1)]
    }

    /// Gets the number of entries on the stack
    pub fn sp(&self) -> usize {
        self.sp
    }

    /// Returns true if the stack holds nothing
    pub fn is_empty(&self) -> bool {
        self.sp == 0
    }

    /// Gets every slot, including the ones above the stack pointer
    pub fn slots(&self) -> &[T; N] {
        &self.slots
    }

    /// Replaces the whole stack. Returns false, and does nothing, if `sp`
    /// is past the end of the stack.
    pub(crate) fn restore(&mut self, slots: [T; N], sp: usize) -> bool {
        if sp > N {
            return false;
        }
        *self = Self { slots, sp };
        true
    }
}

/// Return addresses and loop starts
pub type PcStack = Stack<u16, 16>;
/// Saved loop counters
pub type CntrStack = Stack<u16, 4>;
/// Saved `[MSTAT, IMASK, ASTAT]` triples
pub type StatStack = Stack<[u16; 3], 4>;
/// Loop end addresses and conditions, packed `end << 4 | cond`
pub type LoopStack = Stack<u32, 4>;

/// Loop end cached while the loop stack is empty. No fetch address matches it.
pub const NO_LOOP: u32 = 0xffff;

/// Updates SSTAT after a push or pop on one stack
fn report(sstat: &mut u16, pushed: Option<bool>, empty: bool, empty_bit: u16, over_bit: u16) {
    if pushed == Some(false) {
        *sstat |= over_bit;
    }
    if empty {
        *sstat |= empty_bit;
    } else {
        *sstat &= !empty_bit;
    }
}

impl CPU {
    /// Pushes an address onto the PC stack
    pub(super) fn push_pc(&mut self, addr: u16) {
        let pushed = self.pc_stack.push(addr);
        if !pushed {
            log::debug!("PC stack overflow at {:04x}", self.ppc);
        }
        let empty = self.pc_stack.is_empty();
        report(&mut self.sstat, Some(pushed), empty, sstat::PC_EMPTY, sstat::PC_OVER);
    }

    /// Pops an address off the PC stack
    pub(super) fn pop_pc(&mut self) -> u16 {
        let addr = self.pc_stack.pop();
        let empty = self.pc_stack.is_empty();
        report(&mut self.sstat, None, empty, sstat::PC_EMPTY, sstat::PC_OVER);
        addr
    }

    /// Pushes CNTR onto the counter stack
    pub(super) fn push_cntr(&mut self) {
        let pushed = self.cntr_stack.push(self.cntr);
        if !pushed {
            log::debug!("Counter stack overflow at {:04x}", self.ppc);
        }
        let empty = self.cntr_stack.is_empty();
        report(&mut self.sstat, Some(pushed), empty, sstat::COUNT_EMPTY, sstat::COUNT_OVER);
    }

    /// Pops the counter stack into CNTR
    pub(super) fn pop_cntr(&mut self) {
        self.cntr = self.cntr_stack.pop();
        let empty = self.cntr_stack.is_empty();
        report(&mut self.sstat, None, empty, sstat::COUNT_EMPTY, sstat::COUNT_OVER);
    }

    /// Pushes MSTAT, IMASK and ASTAT as one entry
    pub(super) fn push_stat(&mut self) {
        let pushed = self.stat_stack.push([self.mstat, self.imask, self.astat]);
        if !pushed {
            log::debug!("Status stack overflow at {:04x}", self.ppc);
        }
        let empty = self.stat_stack.is_empty();
        report(&mut self.sstat, Some(pushed), empty, sstat::STATUS_EMPTY, sstat::STATUS_OVER);
    }

    /// Pops MSTAT, IMASK and ASTAT together
    pub(super) fn pop_stat(&mut self) {
        let [mstat, imask, astat] = self.stat_stack.pop();
        let empty = self.stat_stack.is_empty();
        report(&mut self.sstat, None, empty, sstat::STATUS_EMPTY, sstat::STATUS_OVER);
        self.mstat = mstat;
        self.mstat_changed();
        self.imask = imask;
        self.irq_poll = true;
        self.astat = astat;
    }

    /// Pushes a packed loop entry, and caches it if it landed
    pub(super) fn push_loop(&mut self, entry: u32) {
        let pushed = self.loop_stack.push(entry);
        if pushed {
            self.loop_end = entry >> 4;
            self.loop_cond = entry & 0xf;
        } else {
            log::debug!("Loop stack overflow at {:04x}", self.ppc);
        }
        let empty = self.loop_stack.is_empty();
        report(&mut self.sstat, Some(pushed), empty, sstat::LOOP_EMPTY, sstat::LOOP_OVER);
    }

    /// Pops the loop stack, and re-caches whatever is now on top
    pub(super) fn pop_loop(&mut self) {
        self.loop_stack.pop();
        let empty = self.loop_stack.is_empty();
        report(&mut self.sstat, None, empty, sstat::LOOP_EMPTY, sstat::LOOP_OVER);
        self.cache_loop();
    }

    /// Refreshes the loop end and condition from the loop stack
    pub(super) fn cache_loop(&mut self) {
        if self.loop_stack.is_empty() {
            self.loop_end = NO_LOOP;
            self.loop_cond = 0;
        } else {
            let top = self.loop_stack.top();
            self.loop_end = top >> 4;
            self.loop_cond = top & 0xf;
        }
    }
}
