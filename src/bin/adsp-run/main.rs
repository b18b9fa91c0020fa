// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Loads an ADSP-2100 program image, runs it, and dumps the machine state

use adsp::{error::Result, prelude::*};
use gumdrop::*;
use owo_colors::OwoColorize;
use std::{fs::write, path::PathBuf};

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Options, Hash)]
struct Arguments {
    #[options(help = "Show help text")]
    help: bool,
    #[options(help = "Program image to run", free, required)]
    pub file: PathBuf,
    #[options(help = "Number of cycles to run", default = "1000", meta = "N")]
    pub cycles: usize,
    #[options(help = "Enable live disassembly")]
    pub debug: bool,
    #[options(help = "Start address", parse(try_from_str = "parse_hex"))]
    pub pc: u16,
    #[options(
        long = "break",
        help = "Set breakpoints for the emulator to stop at",
        parse(try_from_str = "parse_hex"),
        meta = "BP"
    )]
    pub breakpoints: Vec<u16>,
    #[options(help = "Assert the flag-in pin")]
    pub flag_in: bool,
    #[options(help = "Write a snapshot of the final state to a file")]
    pub snapshot: Option<PathBuf>,
}

fn parse_hex(value: &str) -> std::result::Result<u16, std::num::ParseIntError> {
    u16::from_str_radix(value.trim_start_matches("0x"), 16)
}

fn main() -> Result<()> {
    env_logger::init();
    let options = Arguments::parse_args_default_or_exit();

    let mut adsp = Adsp::new();
    adsp.bus.load_program(&options.file)?;
    adsp.cpu.flags.debug = options.debug;
    adsp.cpu.set_pc(options.pc).set_flag_in(options.flag_in);
    for &point in &options.breakpoints {
        adsp.cpu.set_break(point);
    }

    let ran = adsp.execute(options.cycles);
    if adsp.cpu.flags.pause {
        println!("{}", format_args!("Breakpoint hit at {:04x}", adsp.cpu.pc()).red());
    }
    println!(
        "{}",
        format_args!("Ran {ran} of {} cycles", options.cycles).bright_black()
    );
    adsp.cpu.dump();

    if let Some(path) = &options.snapshot {
        write(path, adsp.cpu.get_state())?;
    }
    Ok(())
}
