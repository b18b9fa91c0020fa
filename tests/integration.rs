//! Testing methods on adsp's public API
use adsp::prelude::*;
use std::{collections::hash_map::DefaultHasher, hash::Hash};

#[test]
fn adsp() {
    let adsp = Adsp::default(); // Default
    let adsp2 = adsp.clone(); // Clone
    assert_eq!(adsp.bus, adsp2.bus); // PartialEq
    println!("{adsp:?}"); // Debug
}

#[test]
fn error() {
    let error = adsp::error::Error::InvalidSnapshot {
        reason: "it was a JPEG".to_owned(),
    };
    println!("{error} {error:?}");
}

mod bus {
    use super::*;
    mod region {
        use super::*;
        #[test]
        fn copy() {
            let r1 = Data;
            let r2 = r1;
            assert_eq!(r1, r2);
        }
        #[test]
        #[allow(clippy::clone_on_copy)]
        fn clone() {
            let r1 = Program;
            let r2 = r1.clone();
            assert_eq!(r1, r2);
        }
        #[test]
        fn display() {
            assert_eq!("ProgramData", format!("{Program}{Data}"));
        }
        #[test]
        fn ord() {
            assert!(Program < Data);
        }
        #[test]
        fn hash() {
            let mut hasher = DefaultHasher::new();
            Data.hash(&mut hasher);
            println!("{hasher:?}");
        }
    }
    #[test]
    fn missing_region() {
        let mut bus = bus! {};
        assert!(bus.load_region(Program, &[0]).is_err());
        // reads of unmapped memory come back zero
        assert_eq!(0, bus.read_data(0x1234));
    }
    #[test]
    fn program_words_are_trimmed() {
        let mut bus = Bus::full();
        bus.write_program(0, 0xffff_ffff);
        assert_eq!(0xff_ffff, bus.read_program(0));
    }
}

mod cpu {
    use super::*;

    #[test]
    fn set_break() {
        let mut cpu = CPU::default();
        let point = 0x234;
        assert_eq!(cpu.breakpoints(), &[]);
        // Attempt to set the same breakpoint 100 times
        for _ in 0..100 {
            cpu.set_break(point);
        }
        assert_eq!(cpu.breakpoints(), &[point]);
    }
    #[test]
    fn unset_break() {
        let mut cpu = CPU::default();
        let point = 0x234;
        cpu.set_break(point).unset_break(point);
        assert_eq!(cpu.breakpoints(), &[]);
    }
    #[test]
    fn reset_keeps_host_settings() {
        let mut cpu = CPU::default();
        cpu.set_break(0x10).flags.debug = true;
        cpu.set_pc(0x123);
        cpu.reset();
        assert_eq!(0, cpu.pc());
        assert_eq!(cpu.breakpoints(), &[0x10]);
        assert!(cpu.flags.debug);
    }
    #[test]
    fn reset_state() {
        let cpu = CPU::default();
        assert_eq!(sstat::RESET, cpu.sstat());
        assert_eq!(0, cpu.mstat());
        assert_eq!(0, cpu.imask());
        assert!(cpu.pc_stack().is_empty());
    }
    #[test]
    fn halt() {
        let mut adsp = Adsp::new();
        adsp.cpu.halt();
        assert_eq!(0, adsp.execute(10));
        adsp.cpu.flags.pause();
        assert_eq!(10, adsp.execute(10));
    }
    #[test]
    fn registers_by_slot() {
        let mut cpu = CPU::default();
        // I4
        cpu.write_register(2, 0, 0x100);
        assert_eq!(0x100, cpu.dag().i(4));
        assert_eq!(0x100, cpu.read_register(2, 0));
        // CNTR
        cpu.write_register(3, 5, 10);
        assert_eq!(10, cpu.cntr());
        assert_eq!(1, cpu.cntr_stack().sp());
    }
    #[test]
    fn invalid_irq_line() {
        let mut cpu = CPU::default();
        assert!(cpu.set_irq_line(adsp::cpu::IRQ_LINES, true).is_err());
    }
}

/// Load, multiply with rounding, store
#[test]
fn multiply_and_store() -> Result<()> {
    let mut adsp = Adsp::new();
    adsp.bus.load_region(
        Program,
        &[
            0x440012, // MX0 = #4001
            0x440016, // MY0 = #4001
            0x20200f, // MR = MX0 * MY0 (RND)
            0x90010c, // DM(0010) = MR1
        ],
    )?;
    assert_eq!(4, adsp.execute(4));
    // 0x4001 * 0x4001 << 1 = 0x2001_0002, rounded
    assert_eq!(0x2001_8002, adsp.cpu.mr());
    assert_eq!(0x2001, adsp.bus.read_data(0x10));
    Ok(())
}

/// Two instructions of an FIR tap: a dual read feeds a multiply-accumulate,
/// and the rounded result is stored to data memory
#[test]
fn dual_read_multiply_store() -> Result<()> {
    let mut adsp = Adsp::new();
    adsp.cpu.write_register(2, 0, 0x100); // I4
    adsp.bus.write_data(0, 0x4001);
    adsp.bus.write_program(0x100, 0x4001 << 8);
    adsp.bus.load_region(
        Program,
        &[
            0xe80000, // NOP, MX0 = DM(I0, M0), MY0 = PM(I4, M4)
            0x20400f, // MR = MR + MX0 * MY0 (RND)
            0x90010c, // DM(0010) = MR1
        ],
    )?;
    assert_eq!(3, adsp.execute(3));
    assert_eq!(0x4001, adsp.cpu.reg(Reg::Mx0));
    assert_eq!(0x4001, adsp.cpu.reg(Reg::My0));
    assert_eq!(0x2001, adsp.bus.read_data(0x10));
    Ok(())
}

/// Restoring a snapshot onto a fresh core, then running both,
/// gives the same machine
#[test]
fn snapshot_resumes() -> Result<()> {
    // CNTR = 3; DO 0003 UNTIL CE; AR = AY0 + 1; AY0 = AR
    let program = [0x3c0035, 0x14003e, 0x22200f, 0x0d004a, 0x000000];
    let mut adsp = Adsp::new();
    adsp.bus.load_region(Program, &program)?;
    adsp.execute(4);

    let mut copy = Adsp::new();
    copy.bus = adsp.bus.clone();
    copy.cpu.set_state(&adsp.cpu.get_state())?;

    adsp.execute(4);
    copy.execute(4);
    assert_eq!(adsp.cpu.get_state(), copy.cpu.get_state());
    assert_eq!(adsp.bus, copy.bus);
    assert_eq!(3, copy.cpu.reg(Reg::Ay0));
    Ok(())
}

#[test]
fn disassemble() {
    let dis = Dis::plain();
    assert_eq!("IF EQ JUMP 0123", dis.once(0x181230));
    assert_eq!("AX0 = #1234", dis.once(0x412340));
    assert_eq!("NOP, MX0 = DM(I0, M0), MY0 = PM(I4, M4)", dis.once(0xe80000));
    assert_eq!("RESERVED 010000", dis.once(0x010000));
    assert_eq!(
        Insn::jump { cond: 0, addr: 0x123 },
        Insn::decode(0x181230)
    );
}
