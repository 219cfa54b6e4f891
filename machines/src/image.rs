//! Program image loading.
//!
//! Images are raw binaries copied into board memory at a load address.
//! The loader checks that the image fits in the 64 KiB address space and
//! records a CRC-32 so the frontend can report what it ran.

use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// CRC-32 (private)
// ---------------------------------------------------------------------------

/// CRC-32 lookup table (reflected polynomial 0xEDB88320).
const CRC32_TABLE: [u32; 256] = {
    let mut table = [0u32; 256];
    let mut i = 0u32;
    while i < 256 {
        let mut crc = i;
        let mut j = 0;
        while j < 8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ 0xEDB8_8320;
            } else {
                crc >>= 1;
            }
            j += 1;
        }
        table[i as usize] = crc;
        i += 1;
    }
    table
};

fn crc32(data: &[u8]) -> u32 {
    let mut crc: u32 = 0xFFFF_FFFF;
    for &byte in data {
        let index = ((crc ^ byte as u32) & 0xFF) as usize;
        crc = (crc >> 8) ^ CRC32_TABLE[index];
    }
    crc ^ 0xFFFF_FFFF
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can occur when loading a program image.
#[derive(Debug)]
pub enum ImageLoadError {
    /// Underlying I/O error (file not found, permission denied, etc.)
    Io { path: PathBuf, source: std::io::Error },

    /// The image has no bytes.
    Empty(PathBuf),

    /// The image does not fit between the load address and the top of
    /// the address space.
    TooLarge { len: usize, load_address: u16 },
}

impl std::fmt::Display for ImageLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Empty(path) => write!(f, "{}: image is empty", path.display()),
            Self::TooLarge { len, load_address } => write!(
                f,
                "image of {len} bytes does not fit at 0x{load_address:04X} (max {})",
                0x10000 - *load_address as usize
            ),
        }
    }
}

impl std::error::Error for ImageLoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// ProgramImage
// ---------------------------------------------------------------------------

/// A program ready to be copied into a board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramImage {
    bytes: Vec<u8>,
    load_address: u16,
}

impl ProgramImage {
    /// Read a raw binary from disk.
    pub fn from_file(path: &Path, load_address: u16) -> Result<Self, ImageLoadError> {
        let bytes = std::fs::read(path).map_err(|source| ImageLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if bytes.is_empty() {
            return Err(ImageLoadError::Empty(path.to_path_buf()));
        }
        Self::from_bytes(bytes, load_address)
    }

    /// Wrap bytes already in memory (for tests and embedded programs).
    pub fn from_bytes(bytes: Vec<u8>, load_address: u16) -> Result<Self, ImageLoadError> {
        if load_address as usize + bytes.len() > 0x10000 {
            return Err(ImageLoadError::TooLarge {
                len: bytes.len(),
                load_address,
            });
        }
        Ok(Self {
            bytes,
            load_address,
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn load_address(&self) -> u16 {
        self.load_address
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn crc32(&self) -> u32 {
        crc32(&self.bytes)
    }
}
