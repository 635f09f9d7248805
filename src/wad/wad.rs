//! Doom-format WAD loader.
//!
//! ### Supported files
//! * **IWAD** – main game data shipped by id Software.
//! * **PWAD** – patch WADs (same directory format, different magic).

use std::collections::HashMap;

use byteorder::{LittleEndian as LE, ReadBytesExt};
use std::{
    fs::File,
    io::{self, Read, Seek, SeekFrom},
    path::Path,
};
use thiserror::Error;

/// Size (in bytes) of one directory entry.
const DIR_ENTRY_SIZE: usize = 16;

/// Metadata for a single lump (asset) inside the WAD.
#[derive(Clone, Debug)]
pub struct LumpInfo {
    /// Eight-byte ASCII name, padded with NULs.
    pub name: [u8; 8],
    /// Offset to lump data from the beginning of the file.
    pub offset: u32,
    /// Size of the lump in bytes.
    pub size: u32,
}

/// Entire WAD resident in memory.
#[derive(Debug)]
pub struct Wad {
    /// Directory entries in the exact order they appear in the file.
    pub lumps: Vec<LumpInfo>,
    /// Backing buffer containing the raw file contents.
    bytes: Vec<u8>,
    /// fast name → index lookup
    by_name: HashMap<String, usize>,
}

/// Errors that can be encountered while opening/parsing a WAD.
#[derive(Error, Debug)]
pub enum WadError {
    /// Underlying I/O failure – propagated unchanged.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Header magic wasn't `IWAD` or `PWAD`.
    #[error("not a WAD file (bad magic)")]
    BadMagic,

    /// Directory claims to extend past end-of-file.
    #[error("corrupt WAD: directory extends beyond end of file")]
    DirectoryOutOfBounds,
}

impl Wad {
    /// Load a WAD from disk into memory.
    ///
    /// The entire file is read into a `Vec<u8>` so subsequent lump requests
    /// are just slice operations.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, WadError> {
        let mut file = File::open(path)?;

        let mut id: [u8; 4] = [0; 4];
        file.read_exact(&mut id)?;
        if &id != b"IWAD" && &id != b"PWAD" {
            return Err(WadError::BadMagic);
        }

        let num_lumps = file.read_u32::<LE>()?;
        let dir_offset = file.read_u32::<LE>()?;

        let mut bytes = Vec::new();
        file.seek(SeekFrom::Start(0))?;
        file.read_to_end(&mut bytes)?;

        let dir_end = dir_offset as usize + num_lumps as usize * DIR_ENTRY_SIZE;
        if dir_end > bytes.len() {
            return Err(WadError::DirectoryOutOfBounds);
        }

        let mut lumps = Vec::with_capacity(num_lumps as usize);
        let mut cursor = &bytes[dir_offset as usize..dir_end];

        for _ in 0..num_lumps {
            let offset = cursor.read_u32::<LE>()?;
            let size = cursor.read_u32::<LE>()?;
            let mut name = [0u8; 8];
            cursor.read_exact(&mut name)?;
            lumps.push(LumpInfo { name, offset, size });
        }

        for l in &lumps {
            let end = l.offset as usize + l.size as usize;
            if end > bytes.len() {
                return Err(WadError::DirectoryOutOfBounds);
            }
        }

        let mut by_name = HashMap::with_capacity(lumps.len());
        // scan *backwards* so later lumps override earlier ones
        for (i, l) in lumps.iter().enumerate().rev() {
            by_name
                .entry(Self::lump_name(&l.name).to_owned())
                .or_insert(i);
        }

        Ok(Self {
            lumps,
            bytes,
            by_name,
        })
    }

    /// Convert an eight-byte, NUL-padded lump name into a printable string.
    pub fn lump_name(raw: &[u8; 8]) -> &str {
        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        std::str::from_utf8(&raw[..end]).unwrap_or("\u{fffd}")
    }

    /// Borrow the raw bytes for lump `idx` without copying.
    pub fn lump_bytes(&self, idx: usize) -> &[u8] {
        assert!(idx < self.lumps.len(), "lump index out of bounds");
        let l = &self.lumps[idx];
        &self.bytes[l.offset as usize..(l.offset + l.size) as usize]
    }

    /// Locate a lump by name (case-sensitive). Returns its index in the
    /// directory or `None` if missing.
    pub fn find_lump(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }
}

// ==========================================================================
// Unit tests
// ==========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds a minimal, valid in-memory WAD with the given lumps so tests
    /// don't depend on a shipped IWAD.
    fn build_wad(lumps: &[(&str, &[u8])]) -> Vec<u8> {
        const HEADER_LEN: u32 = 12;

        let mut offsets = Vec::with_capacity(lumps.len());
        let mut data = Vec::new();
        for (_, bytes) in lumps {
            offsets.push(data.len() as u32);
            data.extend_from_slice(bytes);
        }

        let dir_offset = HEADER_LEN + data.len() as u32;

        let mut out = Vec::new();
        out.extend_from_slice(b"IWAD");
        out.extend((lumps.len() as u32).to_le_bytes());
        out.extend(dir_offset.to_le_bytes());
        out.extend_from_slice(&data);

        for ((name, bytes), off) in lumps.iter().zip(&offsets) {
            out.extend((HEADER_LEN + off).to_le_bytes());
            out.extend((bytes.len() as u32).to_le_bytes());
            let mut n = [0u8; 8];
            let bs = name.as_bytes();
            n[..bs.len().min(8)].copy_from_slice(&bs[..bs.len().min(8)]);
            out.extend_from_slice(&n);
        }
        out
    }

    fn write_temp(bytes: &[u8]) -> tempfile::NamedTempFile {
        let f = tempfile::NamedTempFile::new().expect("tempfile");
        std::fs::write(f.path(), bytes).unwrap();
        f
    }

    #[test]
    fn opens_and_reads_header() {
        let bytes = build_wad(&[("FLOOR4_8", &[0u8; 4096]), ("MAP01", &[])]);
        let tmp = write_temp(&bytes);
        let wad = Wad::from_file(tmp.path()).expect("parse");
        assert_eq!(wad.lumps.len(), 2);
    }

    #[test]
    fn finds_lump_by_name() {
        let bytes = build_wad(&[("PLAYPAL", &[7u8; 768])]);
        let tmp = write_temp(&bytes);
        let wad = Wad::from_file(tmp.path()).unwrap();
        let idx = wad.find_lump("PLAYPAL").expect("lump present");
        assert_eq!(wad.lump_bytes(idx), &[7u8; 768][..]);
    }

    #[test]
    fn lump_slice_len_matches_directory() {
        let bytes = build_wad(&[("A", &[1, 2, 3]), ("BB", &[4, 5])]);
        let tmp = write_temp(&bytes);
        let wad = Wad::from_file(tmp.path()).unwrap();
        for (i, l) in wad.lumps.iter().enumerate() {
            assert_eq!(wad.lump_bytes(i).len() as u32, l.size);
        }
    }

    #[test]
    fn rejects_garbage_file() {
        let tmp = write_temp(b"NOTWAD_____");
        let err = Wad::from_file(tmp.path()).unwrap_err();
        assert!(matches!(err, WadError::BadMagic));
    }

    #[test]
    fn directory_entry_out_of_bounds() {
        let mut wad = Vec::<u8>::new();
        wad.extend_from_slice(b"IWAD");
        wad.extend(1u32.to_le_bytes()); // num_lumps
        wad.extend(12u32.to_le_bytes()); // dir_offset, right after header

        wad.extend(1_000u32.to_le_bytes()); // lump offset (past EOF)
        wad.extend(4u32.to_le_bytes()); // lump size
        wad.extend(b"BAD\0\0\0\0\0"); // 8-byte name

        let tmp = write_temp(&wad);
        let err = Wad::from_file(tmp.path()).unwrap_err();
        assert!(matches!(err, WadError::DirectoryOutOfBounds));
    }
}
