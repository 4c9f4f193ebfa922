//! CHD V5 hunk-map decoding.
//!
//! Compressed maps are Huffman+RLE coded in two phases: first the
//! per-hunk compression types, then the per-hunk payload (length, offset or
//! referenced hunk, CRC-16). The decoded map re-serializes to 12-byte
//! entries whose CRC-16/CCITT must match the value stored in the map header.

use bitreader::BitReader;
use crc::{CRC_16_IBM_3740, Crc};
use romident_core::{IdentError, ReadAt, read_vec_at};

use crate::header::ChdHeader;
use crate::huffman::{HuffmanDecoder, read_bits};

/// CRC-16/CCITT: polynomial 0x1021, initial 0xFFFF, MSB-first, no final xor.
pub const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_IBM_3740);

/// Size of a serialized compressed-map entry.
const MAP_ENTRY_BYTES: usize = 12;

// Compression codes appearing in the type stream. 0-3 select one of the
// header's four codecs; the rest are concrete or run-length pseudo codes.
const COMPRESSION_NONE: u8 = 4;
const COMPRESSION_SELF: u8 = 5;
const COMPRESSION_PARENT: u8 = 6;
const COMPRESSION_RLE_SMALL: u8 = 7;
const COMPRESSION_RLE_LARGE: u8 = 8;
const COMPRESSION_SELF_0: u8 = 9;
const COMPRESSION_SELF_1: u8 = 10;
const COMPRESSION_PARENT_SELF: u8 = 11;
const COMPRESSION_PARENT_0: u8 = 12;
const COMPRESSION_PARENT_1: u8 = 13;

/// How one hunk's data is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HunkKind {
    /// Compressed with the header codec at this index (0..=3).
    Codec(u8),
    /// Stored raw.
    Uncompressed,
    /// Duplicate of another hunk in this file (offset = hunk number).
    SelfRef,
    /// Duplicate of a hunk in the parent file (offset = unit number).
    ParentRef,
}

/// A decoded map entry.
#[derive(Debug, Clone, Copy)]
pub struct MapEntry {
    pub kind: HunkKind,
    /// Compressed length in bytes (0 for self/parent references).
    pub length: u32,
    /// File offset of the data, or the referenced hunk/unit number.
    pub offset: u64,
    /// CRC-16 of the decompressed hunk, when the map carries one.
    pub crc16: Option<u16>,
}

impl MapEntry {
    fn compression_code(&self) -> u8 {
        match self.kind {
            HunkKind::Codec(i) => i,
            HunkKind::Uncompressed => COMPRESSION_NONE,
            HunkKind::SelfRef => COMPRESSION_SELF,
            HunkKind::ParentRef => COMPRESSION_PARENT,
        }
    }
}

/// Read and decode the hunk map described by `header`.
pub fn read_map(header: &ChdHeader, reader: &dyn ReadAt) -> Result<Vec<MapEntry>, IdentError> {
    if header.is_compressed() {
        read_compressed_map(header, reader)
    } else {
        read_uncompressed_map(header, reader)
    }
}

/// Uncompressed files store one 4-byte hunk index per entry.
fn read_uncompressed_map(
    header: &ChdHeader,
    reader: &dyn ReadAt,
) -> Result<Vec<MapEntry>, IdentError> {
    let count = header.total_hunks as usize;
    let raw = read_vec_at(reader, header.map_offset, count * 4)
        .map_err(|_| IdentError::corrupt("CHD map is truncated"))?;

    let mut map = Vec::with_capacity(count);
    for chunk in raw.chunks_exact(4) {
        let index = u32::from_be_bytes(chunk.try_into().unwrap());
        map.push(MapEntry {
            kind: HunkKind::Uncompressed,
            length: header.hunk_bytes,
            offset: index as u64 * header.hunk_bytes as u64,
            crc16: None,
        });
    }
    Ok(map)
}

fn read_compressed_map(
    header: &ChdHeader,
    reader: &dyn ReadAt,
) -> Result<Vec<MapEntry>, IdentError> {
    // 16-byte map header.
    let head = read_vec_at(reader, header.map_offset, 16)
        .map_err(|_| IdentError::corrupt("CHD map header is truncated"))?;
    let compressed_len = u32::from_be_bytes(head[0..4].try_into().unwrap());
    let first_offset = u48_be(&head[4..10]);
    let map_crc = u16::from_be_bytes(head[10..12].try_into().unwrap());
    let length_bits = head[12];
    let self_bits = head[13];
    let parent_bits = head[14];

    if length_bits > 32 || self_bits > 48 || parent_bits > 48 {
        return Err(IdentError::corrupt("CHD map bit widths out of range"));
    }

    let compressed = read_vec_at(reader, header.map_offset + 16, compressed_len as usize)
        .map_err(|_| IdentError::corrupt("CHD map data is truncated"))?;
    let mut bits = BitReader::new(&compressed);

    // 16-symbol, 8-bit-max Huffman tree for the compression-type stream.
    let decoder = HuffmanDecoder::from_tree_rle(&mut bits, 16, 8)?;

    // Phase 1: per-hunk compression types, with run-length codes expanding
    // to repeats of the previous concrete type.
    let count = header.total_hunks as usize;
    let mut types = vec![0u8; count];
    let mut rep_count = 0u32;
    let mut last_comp = 0u8;
    for t in types.iter_mut() {
        if rep_count > 0 {
            *t = last_comp;
            rep_count -= 1;
            continue;
        }
        let value = decoder.decode_one(&mut bits)? as u8;
        match value {
            COMPRESSION_RLE_SMALL => {
                *t = last_comp;
                rep_count = 2 + decoder.decode_one(&mut bits)?;
            }
            COMPRESSION_RLE_LARGE => {
                *t = last_comp;
                rep_count = 2 + 16 + (decoder.decode_one(&mut bits)? << 4);
                rep_count += decoder.decode_one(&mut bits)?;
            }
            0..=COMPRESSION_PARENT_1 => {
                *t = value;
                last_comp = value;
            }
            _ => {
                return Err(IdentError::corrupt(format!(
                    "unknown CHD compression code {value}"
                )));
            }
        }
    }

    // Phase 2: per-hunk payload.
    let hunk_units = (header.hunk_bytes / header.unit_bytes) as u64;
    let mut map = Vec::with_capacity(count);
    let mut cur_offset = first_offset;
    let mut last_self = 0u64;
    let mut last_parent = 0u64;

    for (hunk_index, &t) in types.iter().enumerate() {
        let entry = match t {
            0..=3 => {
                let length = read_bits(&mut bits, length_bits)?;
                let offset = cur_offset;
                cur_offset += length as u64;
                let crc16 = read_bits(&mut bits, 16)? as u16;
                MapEntry {
                    kind: HunkKind::Codec(t),
                    length,
                    offset,
                    crc16: Some(crc16),
                }
            }
            COMPRESSION_NONE => {
                let offset = cur_offset;
                cur_offset += header.hunk_bytes as u64;
                let crc16 = read_bits(&mut bits, 16)? as u16;
                MapEntry {
                    kind: HunkKind::Uncompressed,
                    length: header.hunk_bytes,
                    offset,
                    crc16: Some(crc16),
                }
            }
            COMPRESSION_SELF => {
                let hunk = read_bits_u64(&mut bits, self_bits)?;
                last_self = hunk;
                self_entry(hunk)
            }
            COMPRESSION_SELF_0 => self_entry(last_self),
            COMPRESSION_SELF_1 => {
                last_self += 1;
                self_entry(last_self)
            }
            COMPRESSION_PARENT => {
                let unit = read_bits_u64(&mut bits, parent_bits)?;
                last_parent = unit;
                parent_entry(unit)
            }
            COMPRESSION_PARENT_SELF => {
                let unit =
                    hunk_index as u64 * header.hunk_bytes as u64 / header.unit_bytes as u64;
                last_parent = unit;
                parent_entry(unit)
            }
            COMPRESSION_PARENT_0 => parent_entry(last_parent),
            COMPRESSION_PARENT_1 => {
                last_parent += hunk_units;
                parent_entry(last_parent)
            }
            _ => {
                return Err(IdentError::corrupt(format!(
                    "unknown CHD compression code {t}"
                )));
            }
        };
        map.push(entry);
    }

    // Re-serialize and verify the map CRC.
    let mut serialized = Vec::with_capacity(count * MAP_ENTRY_BYTES);
    for entry in &map {
        serialized.push(entry.compression_code());
        serialized.extend_from_slice(&entry.length.to_be_bytes()[1..4]);
        serialized.extend_from_slice(&entry.offset.to_be_bytes()[2..8]);
        serialized.extend_from_slice(&entry.crc16.unwrap_or(0).to_be_bytes());
    }
    if CRC16.checksum(&serialized) != map_crc {
        return Err(IdentError::corrupt("CHD map CRC-16 mismatch"));
    }

    Ok(map)
}

fn self_entry(hunk: u64) -> MapEntry {
    MapEntry {
        kind: HunkKind::SelfRef,
        length: 0,
        offset: hunk,
        crc16: None,
    }
}

fn parent_entry(unit: u64) -> MapEntry {
    MapEntry {
        kind: HunkKind::ParentRef,
        length: 0,
        offset: unit,
        crc16: None,
    }
}

fn u48_be(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf[2..8].copy_from_slice(&bytes[0..6]);
    u64::from_be_bytes(buf)
}

/// Read up to 48 bits MSB-first into a u64. Zero width yields zero.
fn read_bits_u64(bits: &mut BitReader, width: u8) -> Result<u64, IdentError> {
    if width == 0 {
        return Ok(0);
    }
    if width <= 32 {
        return Ok(read_bits(bits, width)? as u64);
    }
    let high = read_bits(bits, width - 32)? as u64;
    let low = read_bits(bits, 32)? as u64;
    Ok((high << 32) | low)
}
