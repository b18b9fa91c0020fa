// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! A disassembler for ADSP-2100 opcodes
use super::Insn;
use owo_colors::{OwoColorize, Style};

/// Disassembles ADSP-2100 instructions
pub trait Disassembler {
    /// Disassemble a single 24-bit instruction
    fn once(&self, insn: u32) -> String;
}

/// Disassembles ADSP-2100 instructions, printing them in the provided [owo_colors::Style]s
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dis {
    /// Styles reserved instructions
    pub invalid: Style,
    /// Styles valid instruction
    pub normal: Style,
}

impl Default for Dis {
    fn default() -> Self {
        Self {
            invalid: Style::new().bold().red(),
            normal: Style::new().green(),
        }
    }
}

impl Dis {
    /// A disassembler which doesn't style its output
    pub fn plain() -> Self {
        Self {
            invalid: Style::new(),
            normal: Style::new(),
        }
    }
}

impl Disassembler for Dis {
    fn once(&self, insn: u32) -> String {
        match Insn::decode(insn) {
            insn @ Insn::reserved { .. } => format!("{}", insn.style(self.invalid)),
            insn => format!("{}", insn.style(self.normal)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_output() {
        let dis = Dis::plain();
        assert_eq!("NOP", dis.once(0x000000));
        assert_eq!("IF EQ JUMP 0123", dis.once(0x181230));
        assert_eq!("AX0 = #1234", dis.once(0x412340));
        assert_eq!("RESERVED 010000", dis.once(0x010000));
    }

    #[test]
    fn dual_read() {
        let dis = Dis::plain();
        assert_eq!(
            "NOP, MX0 = DM(I0, M0), MY0 = PM(I4, M4)",
            dis.once(0xe80000)
        );
    }
}
