//! The cool stack machine.
//!
//! 2^16 words of main memory, three control registers (PC, SP, FP) and seventeen instructions.
//! The stack lives at the top of memory and grows down; procedure frames are addressed relative
//! to FP.

use std::io::Write;

use instructions::{decode, disassemble, Operand};

pub mod assembler;
pub mod fault;
pub mod instructions;
pub mod memory;
pub mod regfile;
pub mod stats;
pub mod word;

pub use fault::{Fault, FaultKind};
pub use instructions::Opcode;
pub use memory::{ImageTooLarge, Memory, N_CACHE_WORDS, N_MAIN_MEMORY_WORDS};
pub use regfile::RegFile;
pub use stats::Statistics;
pub use word::Word;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    /// Memory and stack accesses are bounds checked, unknown opcodes fault.
    #[default]
    Hardened,
    /// Addresses wrap at 16 bits and unknown opcodes execute as `nop`.
    Compatible,
}

pub struct Core {
    regs: RegFile,
    memory: Memory,
    halted: Option<Word>,
    count: u64,
}

impl Core {
    pub fn new(mode: Mode) -> Core {
        Core {
            regs: RegFile::new(),
            memory: Memory::new(mode),
            halted: None,
            count: 0,
        }
    }

    /// Clears main memory and copies in a program image. Registers and counters are untouched.
    pub fn load_image(&mut self, image: &[u16]) -> Result<(), ImageTooLarge> {
        self.memory.load_image(image)
    }

    /// Returns the core to its power-on state: registers, memory and counters.
    pub fn reset(&mut self) {
        *self = Core::new(self.memory.mode());
    }

    /// Runs at most `step_limit` instructions.
    pub fn advance(
        &mut self,
        step_limit: u64,
        out: &mut dyn Write,
    ) -> Result<CoreRunResult, Fault> {
        if let Some(result) = self.halted {
            return Ok(CoreRunResult {
                steps: 0,
                reason: Reason::Halted(result),
            });
        }

        let mut steps = 0;
        while steps < step_limit {
            steps += 1;
            if let Some(result) = self.step(out)? {
                return Ok(CoreRunResult {
                    steps,
                    reason: Reason::Halted(result),
                });
            }
        }

        Ok(CoreRunResult {
            steps,
            reason: Reason::Limited,
        })
    }

    pub fn run_until_halt(&mut self, out: &mut dyn Write) -> Result<Word, Fault> {
        loop {
            if let Some(result) = self.step(out)? {
                return Ok(result);
            }
        }
    }

    /// Fetches and executes one instruction.
    ///
    /// Returns the word on top of the stack once the machine has halted.
    pub fn step(&mut self, out: &mut dyn Write) -> Result<Option<Word>, Fault> {
        if let Some(result) = self.halted {
            return Ok(Some(result));
        }

        let pc = self.regs.pc;
        let word = self.memory.read(pc).map_err(|err| Fault {
            pc,
            instruction: None,
            kind: err.into(),
        })?;
        self.regs.pc = pc.wrapping_add(1);
        self.count += 1;

        if log::log_enabled!(log::Level::Trace) {
            log::trace!(
                "{:5}: {:<14} sp={} fp={}",
                pc,
                disassemble(word, self.operand_at(pc, word)),
                self.regs.sp,
                self.regs.fp
            );
        }

        self.execute(word, out).map_err(|kind| Fault {
            pc,
            instruction: Some((word, self.operand_at(pc, word))),
            kind,
        })
    }

    fn execute(&mut self, word: Word, out: &mut dyn Write) -> Result<Option<Word>, FaultKind> {
        let Some(opcode) = decode(word) else {
            return match self.memory.mode() {
                Mode::Hardened => Err(FaultKind::IllegalInstruction(word)),
                Mode::Compatible => Ok(None),
            };
        };

        match opcode {
            Opcode::Halt => {
                // The result of the program is whatever is left on top of the stack
                let result = self.top()?;
                self.halted = Some(result);
                log::debug!("Core executed {} instructions", self.count);
                return Ok(Some(result));
            }
            Opcode::Nop => {}
            Opcode::Add => self.binary(|a, b| Ok(b.wrapping_add(a)))?,
            Opcode::Sub => self.binary(|a, b| Ok(b.wrapping_sub(a)))?,
            Opcode::Mult => self.binary(|a, b| Ok(b.wrapping_mul(a)))?,
            Opcode::Div => self.binary(|a, b| match a {
                0 => Err(FaultKind::Arithmetic),
                _ => Ok(b.wrapping_div(a)),
            })?,
            Opcode::Call => {
                let target = self.fetch()?;
                self.push(Word::from_address(self.regs.pc as u16))?;
                self.push(Word::from_address(self.regs.fp as u16))?;
                self.regs.fp = self.regs.sp;
                self.regs.pc = target.as_address() as i32;
            }
            Opcode::Return => {
                // The slot is relative to the frame being torn down
                let offset = self.fetch()?.as_signed();
                let dest = self.regs.frame(offset);
                let value = self.pop()?;
                self.regs.sp = self.regs.fp;
                self.regs.fp = self.pop()?.as_address() as i32;
                self.regs.pc = self.pop()?.as_address() as i32;
                self.regs.sp = dest;
                self.memory.write(dest, value)?;
            }
            Opcode::Jmp => {
                self.regs.pc = self.fetch()?.as_address() as i32;
            }
            Opcode::Jeq => {
                if self.pop()?.as_signed() == 0 {
                    self.regs.pc = self.fetch()?.as_address() as i32;
                } else {
                    self.regs.pc = self.regs.pc.wrapping_add(1);
                }
            }
            Opcode::PrintI => {
                let value = self.pop()?;
                write!(out, "{}", value.as_signed())?;
            }
            Opcode::PrintS => {
                // TODO: pop an address and print the string stored there once the string
                //       encoding for program images is settled
            }
            Opcode::PushC => {
                let value = self.fetch()?;
                self.push(value)?;
            }
            Opcode::PushA => {
                let addr = self.fetch()?.as_address();
                let value = self.memory.read(addr as i32)?;
                self.push(value)?;
            }
            Opcode::PushR => {
                let offset = self.fetch()?.as_signed();
                let addr = self.regs.frame(offset);
                let value = self.memory.read(addr)?;
                self.push(value)?;
            }
            Opcode::PopA => {
                let addr = self.fetch()?.as_address();
                let value = self.pop()?;
                self.memory.write(addr as i32, value)?;
            }
            Opcode::PopR => {
                let offset = self.fetch()?.as_signed();
                let addr = self.regs.frame(offset);
                let value = self.pop()?;
                self.memory.write(addr, value)?;
            }
        }

        Ok(None)
    }

    /// Reads the operand word at PC and steps over it.
    #[inline(always)]
    fn fetch(&mut self) -> Result<Word, FaultKind> {
        let word = self.memory.read(self.regs.pc)?;
        self.regs.pc = self.regs.pc.wrapping_add(1);
        Ok(word)
    }

    fn push(&mut self, value: Word) -> Result<(), FaultKind> {
        if self.memory.mode() == Mode::Hardened && self.regs.sp <= 0 {
            return Err(FaultKind::StackOverflow(self.regs.sp));
        }
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        self.memory.write(self.regs.sp, value)?;
        Ok(())
    }

    fn pop(&mut self) -> Result<Word, FaultKind> {
        let value = self.top()?;
        self.regs.sp = self.regs.sp.wrapping_add(1);
        Ok(value)
    }

    fn top(&mut self) -> Result<Word, FaultKind> {
        if self.memory.mode() == Mode::Hardened && self.regs.sp >= N_MAIN_MEMORY_WORDS as i32 {
            return Err(FaultKind::StackUnderflow(self.regs.sp));
        }
        Ok(self.memory.read(self.regs.sp)?)
    }

    /// Pops `a` then `b` and pushes `op(a, b)`.
    fn binary(
        &mut self,
        op: impl FnOnce(i16, i16) -> Result<i16, FaultKind>,
    ) -> Result<(), FaultKind> {
        let a = self.pop()?.as_signed();
        let b = self.pop()?.as_signed();
        self.push(Word::from_signed(op(a, b)?))
    }

    /// Operand of the instruction at `pc`, read without touching the counters.
    fn operand_at(&self, pc: i32, word: Word) -> Option<Word> {
        match decode(word)?.operand() {
            Operand::None => None,
            _ => Some(self.memory.peek(pc.wrapping_add(1) as u16)),
        }
    }

    pub fn registers(&self) -> &RegFile {
        &self.regs
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn stats(&self) -> &Statistics {
        self.memory.stats()
    }

    pub fn mode(&self) -> Mode {
        self.memory.mode()
    }

    /// Top of stack at the time the machine halted
    pub fn halted(&self) -> Option<Word> {
        self.halted
    }

    pub fn instructions_executed(&self) -> u64 {
        self.count
    }
}

impl Default for Core {
    fn default() -> Self {
        Core::new(Mode::default())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Reason {
    Limited,
    Halted(Word),
}

pub struct CoreRunResult {
    pub steps: u64,
    pub reason: Reason,
}
