use std::str::FromStr;

use thiserror::Error;

use crate::word::Word;

/// see:  https://teaching.csse.uwa.edu.au/units/CITS2002/projects/coolinstructions.php
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Opcode {
    Halt = 0,
    Nop,
    Add,
    Sub,
    Mult,
    Div,
    Call,
    Return,
    Jmp,
    Jeq,
    PrintI,
    PrintS,
    PushC,
    PushA,
    PushR,
    PopA,
    PopR,
}

/// How the word following an opcode should be read.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Operand {
    None,
    /// Absolute memory address or jump target
    Address,
    /// Signed immediate
    Constant,
    /// Signed offset from the frame pointer
    Offset,
}

#[derive(Debug, Clone, Copy)]
pub struct InstructionInfo {
    pub opcode: Opcode,
    pub name: &'static str,
    pub operand: Operand,
}

/// Indexed by opcode value
pub const INSTRUCTION_TABLE: [InstructionInfo; 17] = build_table();

const fn op(opcode: Opcode, name: &'static str, operand: Operand) -> InstructionInfo {
    InstructionInfo { opcode, name, operand }
}

const fn build_table() -> [InstructionInfo; 17] {
    use Opcode::*;

    [
        op(Halt, "halt", Operand::None),
        op(Nop, "nop", Operand::None),
        op(Add, "add", Operand::None),
        op(Sub, "sub", Operand::None),
        op(Mult, "mult", Operand::None),
        op(Div, "div", Operand::None),
        op(Call, "call", Operand::Address),
        op(Return, "return", Operand::Offset),
        op(Jmp, "jmp", Operand::Address),
        op(Jeq, "jeq", Operand::Address),
        op(PrintI, "printi", Operand::None),
        op(PrintS, "prints", Operand::None),
        op(PushC, "pushc", Operand::Constant),
        op(PushA, "pusha", Operand::Address),
        op(PushR, "pushr", Operand::Offset),
        op(PopA, "popa", Operand::Address),
        op(PopR, "popr", Operand::Offset),
    ]
}

impl Opcode {
    #[inline(always)]
    pub fn info(self) -> &'static InstructionInfo {
        &INSTRUCTION_TABLE[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.info().name
    }

    pub fn operand(self) -> Operand {
        self.info().operand
    }

    /// Number of words the instruction occupies, opcode included
    pub fn size(self) -> u16 {
        match self.operand() {
            Operand::None => 1,
            _ => 2,
        }
    }
}

impl From<Opcode> for Word {
    fn from(opcode: Opcode) -> Self {
        Word::from_address(opcode as u16)
    }
}

#[inline(always)]
pub fn decode(word: Word) -> Option<Opcode> {
    INSTRUCTION_TABLE
        .get(word.as_address() as usize)
        .map(|info| info.opcode)
}

/// Provides a string representation of the instruction held in `word`.
///
/// `operand` is the word following the opcode; it is ignored for instructions that take none.
pub fn disassemble(word: Word, operand: Option<Word>) -> String {
    let Some(opcode) = decode(word) else {
        return format!("illegal {}", word.as_address());
    };

    match (opcode.operand(), operand) {
        (Operand::None, _) => opcode.name().to_owned(),
        (Operand::Address, Some(arg)) => format!("{:<7}{}", opcode.name(), arg.as_address()),
        (Operand::Constant | Operand::Offset, Some(arg)) => {
            format!("{:<7}{}", opcode.name(), arg.as_signed())
        }
        (_, None) => format!("{:<7}?", opcode.name()),
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown mnemonic '{0}'")]
pub struct UnknownMnemonic(pub String);

impl FromStr for Opcode {
    type Err = UnknownMnemonic;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        INSTRUCTION_TABLE
            .iter()
            .find(|info| info.name.eq_ignore_ascii_case(s))
            .map(|info| info.opcode)
            .ok_or_else(|| UnknownMnemonic(s.to_owned()))
    }
}
