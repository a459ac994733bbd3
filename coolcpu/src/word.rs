use core::fmt;

/// A single 16-bit memory cell.
///
/// Nothing in the cell says what it holds. Instructions pick a view at the point of use:
/// `as_address` for memory indices and jump targets, `as_signed` for stack arithmetic.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Word(u16);

impl Word {
    pub const ZERO: Word = Word(0);

    #[inline(always)]
    pub const fn from_address(addr: u16) -> Word {
        Word(addr)
    }

    #[inline(always)]
    pub const fn from_signed(value: i16) -> Word {
        Word(value as u16)
    }

    #[inline(always)]
    pub const fn as_address(self) -> u16 {
        self.0
    }

    #[inline(always)]
    pub const fn as_signed(self) -> i16 {
        self.0 as i16
    }
}

impl From<u16> for Word {
    fn from(addr: u16) -> Self {
        Word::from_address(addr)
    }
}

impl From<i16> for Word {
    fn from(value: i16) -> Self {
        Word::from_signed(value)
    }
}

impl From<Word> for u16 {
    fn from(word: Word) -> Self {
        word.as_address()
    }
}

impl fmt::Debug for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Word({:#06x})", self.0)
    }
}
