use core::fmt;

/// Memory traffic counters for one machine instance.
///
/// Only `Memory::read` and `Memory::write` bump these. The cache counters are reserved for a
/// cache that sits in front of main memory; nothing increments them yet, so they report zero.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Statistics {
    pub main_memory_reads: u64,
    pub main_memory_writes: u64,
    pub cache_memory_hits: u64,
    pub cache_memory_misses: u64,
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "@number-of-main-memory-reads\t{}", self.main_memory_reads)?;
        writeln!(f, "@number-of-main-memory-writes\t{}", self.main_memory_writes)?;
        writeln!(f, "@number-of-cache-memory-hits\t{}", self.cache_memory_hits)?;
        writeln!(f, "@number-of-cache-memory-misses\t{}", self.cache_memory_misses)
    }
}
