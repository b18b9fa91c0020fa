// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Exercises the instruction decode logic.
use super::*;

fn dreg(index: usize) -> Loc {
    Loc::dreg(index)
}

#[rustfmt::skip]
mod control {
    use super::*;
    #[test] fn nop()      { assert_eq!(Insn::nop,  Insn::decode(0x000000)); }
    #[test] fn idle()     { assert_eq!(Insn::idle, Insn::decode(0x028000)); }
    #[test] fn not_idle() { assert_eq!(Insn::reserved { op: 0x020000 }, Insn::decode(0x020000)); }
    #[test] fn unused()   { assert_eq!(Insn::reserved { op: 0x080000 }, Insn::decode(0x080000)); }
    #[test] fn rti()      { assert_eq!(Insn::ret { cond: 0xf, rti: true }, Insn::decode(0x0a001f)); }
    #[test] fn rts_eq()   { assert_eq!(Insn::ret { cond: 0x0, rti: false }, Insn::decode(0x0a0000)); }
    #[test] fn ignores_top_byte() { assert_eq!(Insn::nop, Insn::decode(0xff000000)); }
}

#[rustfmt::skip]
mod flow {
    use super::*;
    #[test] fn jump()     { assert_eq!(Insn::jump { cond: 0xf, addr: 0x123 }, Insn::decode(0x18123f)); }
    #[test] fn call()     { assert_eq!(Insn::call { cond: 0x0, addr: 0x045 }, Insn::decode(0x1c0450)); }
    #[test] fn do_until() { assert_eq!(Insn::do_until { addr: 0x3, cond: 0xe }, Insn::decode(0x14003e)); }
    #[test] fn indirect() { assert_eq!(Insn::jump_ind { cond: 0xf, i: 4, call: false }, Insn::decode(0x0b000f)); }
    #[test] fn indirect_i7() { assert_eq!(Insn::jump_ind { cond: 0x0, i: 7, call: false }, Insn::decode(0x0b00c0)); }
    #[test] fn indirect_call() { assert_eq!(Insn::jump_ind { cond: 0xf, i: 5, call: true }, Insn::decode(0x0b005f)); }
    #[test] fn flag_in()  {
        assert_eq!(Insn::jump_fi { addr: 0x123, call: true, set: true }, Insn::decode(0x031233));
    }
    #[test] fn flag_in_high_bits() {
        assert_eq!(Insn::jump_fi { addr: 0x3000, call: false, set: false }, Insn::decode(0x03000c));
    }
}

#[rustfmt::skip]
mod stack {
    use super::*;
    #[test] fn pop_pc_and_status() {
        assert_eq!(
            Insn::stack { pop_pc: true, pop_loop: false, pop_cntr: false, push_stat: false, pop_stat: true },
            Insn::decode(0x040013)
        );
    }
    #[test] fn push_status() {
        assert_eq!(
            Insn::stack { pop_pc: false, pop_loop: true, pop_cntr: true, push_stat: true, pop_stat: false },
            Insn::decode(0x04000e)
        );
    }
}

#[rustfmt::skip]
mod mode {
    use super::*;
    #[test] fn ena_sec_reg() { assert_eq!(Insn::mode { set: ms::BANK, clear: 0 }, Insn::decode(0x0c0030)); }
    #[test] fn dis_sec_reg() { assert_eq!(Insn::mode { set: 0, clear: ms::BANK }, Insn::decode(0x0c0020)); }
}

#[rustfmt::skip]
mod load {
    use super::*;
    #[test] fn dreg_immediate() { assert_eq!(Insn::load_imm { dst: dreg(5), value: 0x1234 }, Insn::decode(0x412345)); }
    #[test] fn cntr_immediate() {
        assert_eq!(Insn::load_imm { dst: Loc { group: 3, index: 5 }, value: 3 }, Insn::decode(0x3c0035));
    }
    /// Non-data immediates are 14 bits, sign-extended
    #[test] fn sign_extends() {
        assert_eq!(Insn::load_imm { dst: Loc { group: 1, index: 0 }, value: 0xffff }, Insn::decode(0x37fff0));
    }
    #[test] fn direct_store() {
        assert_eq!(Insn::store { src: dreg(12), addr: 0x10 }, Insn::decode(0x90010c));
    }
    #[test] fn direct_load() {
        assert_eq!(Insn::load { dst: dreg(0), addr: 0x3fff }, Insn::decode(0x83fff0));
    }
}

#[rustfmt::skip]
mod address {
    use super::*;
    #[test] fn modify_dag2() { assert_eq!(Insn::modify { addr: Addr { i: 5, m: 6 } }, Insn::decode(0x090016)); }
    #[test] fn modify_dag1() { assert_eq!(Insn::modify { addr: Addr { i: 3, m: 1 } }, Insn::decode(0x09000d)); }
}

mod multifunction {
    use super::*;

    #[test]
    fn dual_read() {
        let op = Compute { unit: Unit::Mac, func: 0, x: 0, y: 0, feedback: false };
        assert_eq!(
            Insn::dual {
                op,
                dm_reg: 2,
                dm: Addr { i: 0, m: 0 },
                pm_reg: 6,
                pm: Addr { i: 4, m: 4 },
            },
            Insn::decode(0xe80000)
        );
    }

    #[test]
    fn compute_with_feedback() {
        // AF = AX0 + AY0
        let op = Compute { unit: Unit::Alu, func: 3, x: 0, y: 0, feedback: true };
        assert_eq!(Insn::compute { cond: 0xf, op }, Insn::decode(0x26600f));
    }

    #[test]
    fn mac_into_mr() {
        // MR = MR + MX0 * MY0 (RND)
        let op = Compute { unit: Unit::Mac, func: 2, x: 0, y: 0, feedback: false };
        assert_eq!(Insn::compute { cond: 0xf, op }, Insn::decode(0x20400f));
    }
}

/// Every 24-bit pattern decodes, and displays, without panicking
#[test]
fn every_opcode_decodes() {
    for op in 0..=0xff_ffffu32 {
        let insn = Insn::decode(op);
        if op & 0x3ff == 0 {
            let _ = insn.to_string();
        }
    }
}

/// Decoding only looks at the low 24 bits
#[test]
fn decode_is_24_bits() {
    for _ in 0..0x1000 {
        let op = random::<u32>();
        assert_eq!(Insn::decode(op & 0xff_ffff), Insn::decode(op));
    }
}
