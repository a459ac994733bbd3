use std::ops::Range;

use thiserror::Error;

use crate::stats::Statistics;
use crate::word::Word;
use crate::Mode;

/// 2^16 words of main memory
pub const N_MAIN_MEMORY_WORDS: usize = 1 << 16;

/// Size of the small-but-fast cache memory. Reserved; no cache is modelled yet.
pub const N_CACHE_WORDS: usize = 32;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("address {0} is outside main memory")]
pub struct OutOfRange(pub i32);

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("program image of {0} words does not fit in main memory")]
pub struct ImageTooLarge(pub usize);

/// Main memory, plus the counters that account for every access made by the running program.
///
/// `read` and `write` are the only way the core touches memory. Anything going around them
/// (`load_image`, `peek`) is host-side and deliberately uncounted.
pub struct Memory {
    words: Box<[Word]>,
    stats: Statistics,
    mode: Mode,
}

impl Memory {
    pub fn new(mode: Mode) -> Memory {
        Memory {
            words: vec![Word::ZERO; N_MAIN_MEMORY_WORDS].into_boxed_slice(),
            stats: Statistics::default(),
            mode,
        }
    }

    /// Maps a register-width address onto a memory index.
    ///
    /// Compatible mode truncates to 16 bits, the same thing a 16-bit address bus would do.
    #[inline(always)]
    fn index(&self, address: i32) -> Result<usize, OutOfRange> {
        match self.mode {
            Mode::Hardened => {
                if address >= 0 && (address as usize) < N_MAIN_MEMORY_WORDS {
                    Ok(address as usize)
                } else {
                    Err(OutOfRange(address))
                }
            }
            Mode::Compatible => Ok(address as u16 as usize),
        }
    }

    pub fn read(&mut self, address: i32) -> Result<Word, OutOfRange> {
        self.stats.main_memory_reads += 1;
        let index = self.index(address)?;
        Ok(self.words[index])
    }

    pub fn write(&mut self, address: i32, value: Word) -> Result<(), OutOfRange> {
        self.stats.main_memory_writes += 1;
        let index = self.index(address)?;
        self.words[index] = value;
        Ok(())
    }

    /// Clears memory and copies `image` in from address 0.
    pub fn load_image(&mut self, image: &[u16]) -> Result<(), ImageTooLarge> {
        if image.len() > N_MAIN_MEMORY_WORDS {
            return Err(ImageTooLarge(image.len()));
        }
        self.words.fill(Word::ZERO);
        for (dest, &word) in self.words.iter_mut().zip(image) {
            *dest = Word::from_address(word);
        }
        Ok(())
    }

    /// Uncounted read, for diagnostics and traces.
    pub fn peek(&self, address: u16) -> Word {
        self.words[address as usize]
    }

    /// Uncounted view of a range of memory.
    pub fn dump(&self, range: Range<u16>) -> &[Word] {
        &self.words[range.start as usize..range.end as usize]
    }

    pub fn stats(&self) -> &Statistics {
        &self.stats
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }
}
