//! # Rank File Format
//!
//! Flat binary leaderboard snapshot.
//!
//! ## Format
//!
//! ```text
//! [4 bytes: magic "SKRK"]
//! [4 bytes: version]
//! [4 bytes: entry count N]
//! [4 bytes: CRC32 of the record section]
//!
//! N x record (132 bytes):
//! [32 bytes: name, NUL padded]
//! [32 bytes: unique, NUL padded]
//! [64 bytes: WeaponStatEntry]
//! [4 bytes: stored 1-based position]
//! ```
//!
//! Every integer is little-endian on disk, header and records alike.
//! Any header, length, or checksum mismatch rejects the whole file.

use crate::error::{RankError, RankResult};
use bytemuck::{Pod, Zeroable};
use skirmish_core::WeaponStatEntry;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Magic bytes identifying a rank file.
pub const RANK_MAGIC: [u8; 4] = *b"SKRK";

/// Current rank file format version.
pub const RANK_VERSION: u32 = 1;

/// Bytes reserved for each name field.
pub const NAME_BYTES: usize = 32;

/// Size of the file header.
pub const HEADER_SIZE: usize = std::mem::size_of::<RankFileHeader>();

/// Size of one record.
pub const RECORD_SIZE: usize = std::mem::size_of::<RankRecord>();

/// File header.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct RankFileHeader {
    /// Always [`RANK_MAGIC`].
    pub magic: [u8; 4],
    /// Format version.
    pub version: u32,
    /// Number of records that follow.
    pub count: u32,
    /// CRC32 of the record section.
    pub checksum: u32,
}

/// One persisted leaderboard row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct RankRecord {
    /// Display name, NUL padded.
    pub name: [u8; NAME_BYTES],
    /// Disambiguator, NUL padded.
    pub unique: [u8; NAME_BYTES],
    /// Cumulative counters.
    pub stats: WeaponStatEntry,
    /// 1-based position at save time.
    pub position: u32,
}

impl RankRecord {
    /// Byte-swaps every integer field to little-endian. A no-op on
    /// little-endian hosts.
    #[must_use]
    pub fn to_le(mut self) -> Self {
        self.swap_fields(i32::to_le);
        self.position = self.position.to_le();
        self
    }

    /// Inverse of [`Self::to_le`].
    #[must_use]
    pub fn from_le(mut self) -> Self {
        self.swap_fields(i32::from_le);
        self.position = u32::from_le(self.position);
        self
    }

    fn swap_fields(&mut self, swap: fn(i32) -> i32) {
        let words: &mut [i32] = bytemuck::cast_slice_mut(std::slice::from_mut(&mut self.stats));
        for word in words {
            *word = swap(*word);
        }
    }
}

/// Packs a string into a fixed field, cutting on a char boundary.
#[must_use]
pub fn encode_name(text: &str) -> [u8; NAME_BYTES] {
    let mut out = [0u8; NAME_BYTES];
    let mut end = text.len().min(NAME_BYTES);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    out[..end].copy_from_slice(&text.as_bytes()[..end]);
    out
}

/// Unpacks a fixed field up to its first NUL.
#[must_use]
pub fn decode_name(field: &[u8; NAME_BYTES]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(NAME_BYTES);
    String::from_utf8_lossy(&field[..end]).into_owned()
}

/// Serializes records into a complete rank file image.
#[must_use]
pub fn encode(records: &[RankRecord]) -> Vec<u8> {
    let disk: Vec<RankRecord> = records.iter().map(|r| r.to_le()).collect();
    let body: &[u8] = bytemuck::cast_slice(&disk);
    let header = RankFileHeader {
        magic: RANK_MAGIC,
        version: RANK_VERSION.to_le(),
        count: (records.len() as u32).to_le(),
        checksum: crc32fast::hash(body).to_le(),
    };

    let mut out = Vec::with_capacity(HEADER_SIZE + body.len());
    out.extend_from_slice(bytemuck::bytes_of(&header));
    out.extend_from_slice(body);
    out
}

/// Parses a rank file image.
///
/// # Errors
///
/// Returns `BadMagic`, `VersionMismatch`, `Truncated`, or
/// `ChecksumMismatch`; no records are returned on any error.
pub fn decode(bytes: &[u8]) -> RankResult<Vec<RankRecord>> {
    let header_bytes = bytes.get(..HEADER_SIZE).ok_or(RankError::Truncated {
        expected: HEADER_SIZE,
        actual: bytes.len(),
    })?;
    let header: RankFileHeader = bytemuck::pod_read_unaligned(header_bytes);

    if header.magic != RANK_MAGIC {
        return Err(RankError::BadMagic);
    }
    let version = u32::from_le(header.version);
    if version != RANK_VERSION {
        return Err(RankError::VersionMismatch {
            found: version,
            expected: RANK_VERSION,
        });
    }

    let count = u32::from_le(header.count) as usize;
    let expected = count
        .checked_mul(RECORD_SIZE)
        .and_then(|n| n.checked_add(HEADER_SIZE))
        .ok_or(RankError::Truncated {
            expected: usize::MAX,
            actual: bytes.len(),
        })?;
    if bytes.len() != expected {
        return Err(RankError::Truncated {
            expected,
            actual: bytes.len(),
        });
    }

    let body = &bytes[HEADER_SIZE..];
    let stored = u32::from_le(header.checksum);
    let computed = crc32fast::hash(body);
    if stored != computed {
        return Err(RankError::ChecksumMismatch { stored, computed });
    }

    Ok(body
        .chunks_exact(RECORD_SIZE)
        .map(|chunk| bytemuck::pod_read_unaligned::<RankRecord>(chunk).from_le())
        .collect())
}

/// Writes `bytes` to a sibling temp file, then renames it over `path`.
///
/// # Errors
///
/// Returns `Io` when any step fails.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> RankResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| RankError::from_io(parent, &e))?;
        }
    }

    let tmp = path.with_extension("tmp");
    {
        let mut file = fs::File::create(&tmp).map_err(|e| RankError::from_io(&tmp, &e))?;
        file.write_all(bytes).map_err(|e| RankError::from_io(&tmp, &e))?;
        file.sync_all().map_err(|e| RankError::from_io(&tmp, &e))?;
    }
    fs::rename(&tmp, path).map_err(|e| RankError::from_io(path, &e))
}
