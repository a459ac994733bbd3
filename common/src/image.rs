//! Program images ("coolexe" files): a flat run of 16-bit little-endian words, loaded verbatim
//! at address 0.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use thiserror::Error;

/// Largest image that fits in main memory
pub const MAX_IMAGE_WORDS: usize = 1 << 16;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot open program image {}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read program image")]
    Read(#[from] io::Error),
    #[error("program image is {0} bytes, more than main memory holds")]
    TooLarge(usize),
}

pub fn read_image<R: Read>(mut reader: R) -> Result<Vec<u16>, LoadError> {
    let mut bytes = Vec::new();
    // one byte over the limit is enough to know the image is too big
    let limit = (MAX_IMAGE_WORDS * 2 + 1) as u64;
    reader.by_ref().take(limit).read_to_end(&mut bytes)?;
    if bytes.len() > MAX_IMAGE_WORDS * 2 {
        return Err(LoadError::TooLarge(bytes.len()));
    }

    if bytes.len() % 2 != 0 {
        log::warn!("program image has a trailing odd byte, ignoring it");
    }

    let mut cursor = &bytes[..bytes.len() & !1];
    let mut words = Vec::with_capacity(bytes.len() / 2);
    while !cursor.is_empty() {
        words.push(cursor.read_u16::<LittleEndian>()?);
    }
    Ok(words)
}

pub fn load_image(path: &Path) -> Result<Vec<u16>, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Open {
        path: path.to_owned(),
        source,
    })?;
    let words = read_image(io::BufReader::new(file))?;
    log::debug!("Loaded {} words from {}", words.len(), path.display());
    Ok(words)
}

pub fn write_image<W: Write>(mut writer: W, words: &[u16]) -> io::Result<()> {
    for &word in words {
        writer.write_u16::<LittleEndian>(word)?;
    }
    writer.flush()
}
