// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Disassembles an ADSP-2100 program image of big-endian 24-bit words

use adsp::{error::Result, prelude::*};
use gumdrop::*;
use owo_colors::OwoColorize;
use std::{fs::read, path::PathBuf};

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Options, Hash)]
struct Arguments {
    #[options(help = "Show help text")]
    help: bool,
    #[options(help = "Program image to disassemble", free, required)]
    pub file: PathBuf,
    #[options(help = "Load address of the image, in words", parse(try_from_str = "parse_hex"))]
    pub loadaddr: u16,
    #[options(help = "Start disassembling at word offset...", parse(try_from_str = "parse_hex"))]
    pub offset: u16,
    #[options(help = "Disable colored output")]
    pub plain: bool,
}

fn parse_hex(value: &str) -> std::result::Result<u16, std::num::ParseIntError> {
    u16::from_str_radix(value.trim_start_matches("0x"), 16)
}

fn main() -> Result<()> {
    env_logger::init();
    let options = Arguments::parse_args_default_or_exit();
    let contents = read(&options.file)?;
    if contents.len() % 3 != 0 {
        log::warn!(
            "{} trailing bytes in {} will be ignored",
            contents.len() % 3,
            options.file.display()
        );
    }
    let disassembler = if options.plain {
        Dis::plain()
    } else {
        Dis::default()
    };
    let start = (options.offset as usize * 3).min(contents.len());
    for (addr, word) in contents[start..].chunks_exact(3).enumerate() {
        let insn = u32::from_be_bytes([0, word[0], word[1], word[2]]);
        let addr = (addr + options.offset as usize + options.loadaddr as usize) & 0x3fff;
        println!(
            "{addr:04x}: {} {:<36}",
            format_args!("{insn:06x}").bright_black(),
            disassembler.once(insn),
        );
    }
    Ok(())
}
