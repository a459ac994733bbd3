use std::io;

use thiserror::Error;

use crate::instructions::disassemble;
use crate::memory::OutOfRange;
use crate::word::Word;

#[derive(Debug, Error)]
pub enum FaultKind {
    #[error("address fault: {0} is outside main memory")]
    Address(i32),
    #[error("stack fault: push with sp at {0}")]
    StackOverflow(i32),
    #[error("stack fault: pop with sp at {0}")]
    StackUnderflow(i32),
    #[error("arithmetic fault: division by zero")]
    Arithmetic,
    #[error("illegal instruction {}", .0.as_address())]
    IllegalInstruction(Word),
    #[error("failed to write program output")]
    Output(#[from] io::Error),
}

impl From<OutOfRange> for FaultKind {
    fn from(err: OutOfRange) -> Self {
        FaultKind::Address(err.0)
    }
}

/// A terminal condition raised while running a program.
///
/// Records where it happened: the address of the faulting instruction, and the instruction
/// itself when it got as far as being fetched. What went wrong is the `kind`, which is also
/// the error's source.
#[derive(Debug, Error)]
#[error("fault at pc {pc}{}", listing(.instruction))]
pub struct Fault {
    pub pc: i32,
    pub instruction: Option<(Word, Option<Word>)>,
    #[source]
    pub kind: FaultKind,
}

impl Fault {
    pub fn kind(&self) -> &FaultKind {
        &self.kind
    }
}

fn listing(instruction: &Option<(Word, Option<Word>)>) -> String {
    match *instruction {
        Some((opcode, operand)) => format!(" ({})", disassemble(opcode, operand).trim_end()),
        None => String::new(),
    }
}
