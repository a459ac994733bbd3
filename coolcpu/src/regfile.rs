use crate::memory::N_MAIN_MEMORY_WORDS;

/// The three on-cpu control registers.
///
/// These are wider than a memory word: SP starts one past the end of memory, and a frame-relative
/// address may land outside memory before it is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegFile {
    pub(crate) pc: i32,
    pub(crate) sp: i32,
    pub(crate) fp: i32,
}

impl RegFile {
    pub(crate) fn new() -> RegFile {
        RegFile {
            pc: 0,
            sp: N_MAIN_MEMORY_WORDS as i32,
            fp: 0,
        }
    }

    pub fn pc(&self) -> i32 {
        self.pc
    }

    pub fn sp(&self) -> i32 {
        self.sp
    }

    pub fn fp(&self) -> i32 {
        self.fp
    }

    /// FP-relative address
    #[inline(always)]
    pub(crate) fn frame(&self, offset: i16) -> i32 {
        self.fp.wrapping_add(offset as i32)
    }
}

impl Default for RegFile {
    fn default() -> Self {
        RegFile::new()
    }
}
