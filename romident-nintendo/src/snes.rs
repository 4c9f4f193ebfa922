//! SNES (Super Famicom) ROM parsing.
//!
//! The SNES header has no magic; it is found by probing the LoROM, HiROM,
//! and ExHiROM candidate offsets (plus a 512-byte copier-header shift) and
//! accepting the first candidate that passes every validity check.

use serde::Serialize;

use romident_core::util::read_ascii_fixed;
use romident_core::{GameMeta, IdentError, Platform, ReadAt, Region, read_vec_at};

/// Candidate header offsets and the mapping each implies.
const HEADER_CANDIDATES: [(u64, &str); 3] =
    [(0x7FC0, "LoROM"), (0xFFC0, "HiROM"), (0x40FFC0, "ExHiROM")];

/// Copier (SMC) headers are 512 bytes prepended to the ROM.
const COPIER_HEADER_SIZE: u64 = 512;

const TITLE_LEN: usize = 21;
const HEADER_LEN: usize = 32;

/// Shipped carts whose 21-byte title field overflows into the map-mode
/// byte. Stored as title bytes plus the overflow byte; candidates matching
/// one of these are accepted despite the out-of-range map mode.
const KNOWN_TITLE_OVERFLOWS: &[(&[u8; TITLE_LEN], u8)] = &[
    // "CONTRA3 THE ALIEN WARS" (USA): the final 'S' lands on the map-mode
    // byte.
    (b"CONTRA3 THE ALIEN WAR", b'S'),
];

/// Information from a SNES internal header.
#[derive(Debug, Clone, Serialize)]
pub struct SnesInfo {
    pub title: String,
    /// Mapping implied by the accepted header offset.
    pub mapping: String,
    pub map_mode: u8,
    pub cartridge_type: u8,
    /// ROM size declared in the header, in bytes.
    pub declared_rom_size: u64,
    pub ram_size: u64,
    pub destination_code: u8,
    pub version: u8,
    pub checksum: u16,
    pub complement: u16,
    /// Whether a 512-byte copier header precedes the ROM.
    pub copier_header: bool,
    pub region: Region,
}

impl GameMeta for SnesInfo {
    fn platform(&self) -> Platform {
        Platform::Snes
    }

    fn title(&self) -> String {
        self.title.clone()
    }

    fn regions(&self) -> Vec<Region> {
        if self.region == Region::Unknown {
            Vec::new()
        } else {
            vec![self.region]
        }
    }
}

fn region_from_destination(code: u8) -> Region {
    match code {
        0x00 => Region::Japan,
        0x01 => Region::Usa,
        0x02 => Region::Europe,
        0x03..=0x05 => Region::Europe, // Scandinavia variants
        0x06 => Region::France,
        0x07 => Region::Netherlands,
        0x08 => Region::Spain,
        0x09 => Region::Germany,
        0x0A => Region::Italy,
        0x0B => Region::China,
        0x0D => Region::Korea,
        0x0F => Region::Canada,
        0x10 => Region::Brazil,
        0x11 => Region::Australia,
        _ => Region::Unknown,
    }
}

/// Count of printable ASCII characters in the title field.
fn printable_chars(title: &[u8]) -> usize {
    title.iter().filter(|b| (0x20..0x7F).contains(*b)).count()
}

/// Validate the 32-byte header block at one candidate offset. Returns the
/// parsed header when all checks pass.
fn try_candidate(
    buf: &[u8],
    mapping: &'static str,
    copier_header: bool,
    file_size: u64,
) -> Option<SnesInfo> {
    let title_bytes = &buf[0..TITLE_LEN];
    let map_mode = buf[0x15];
    let cartridge_type = buf[0x16];
    let rom_size_code = buf[0x17];
    let ram_size_code = buf[0x18];
    let destination_code = buf[0x19];
    let version = buf[0x1B];
    let complement = u16::from_le_bytes([buf[0x1C], buf[0x1D]]);
    let checksum = u16::from_le_bytes([buf[0x1E], buf[0x1F]]);

    if checksum.wrapping_add(complement) != 0xFFFF {
        return None;
    }

    let map_mode_ok = (0x20..=0x3F).contains(&map_mode);
    let title_overflow = KNOWN_TITLE_OVERFLOWS
        .iter()
        .any(|(title, overflow)| title_bytes == &title[..] && map_mode == *overflow);
    if !map_mode_ok && !title_overflow {
        return None;
    }

    if printable_chars(title_bytes) < 2 {
        return None;
    }

    // Declared sizes are powers of two in KiB; a header declaring far more
    // ROM than the file holds is a false positive.
    if rom_size_code > 0x0D {
        return None;
    }
    let declared_rom_size = 1024u64 << rom_size_code;
    if declared_rom_size > file_size * 2 {
        return None;
    }

    let ram_size = if ram_size_code == 0 || ram_size_code > 0x0C {
        0
    } else {
        1024u64 << ram_size_code
    };

    Some(SnesInfo {
        title: read_ascii_fixed(title_bytes),
        mapping: mapping.to_string(),
        map_mode,
        cartridge_type,
        declared_rom_size,
        ram_size,
        destination_code,
        version,
        checksum,
        complement,
        copier_header,
        region: region_from_destination(destination_code),
    })
}

pub fn parse(reader: &dyn ReadAt, size: u64) -> Result<SnesInfo, IdentError> {
    let copier_header = size % 1024 == COPIER_HEADER_SIZE;
    let shift = if copier_header { COPIER_HEADER_SIZE } else { 0 };
    let rom_size = size - shift;

    for (base, mapping) in HEADER_CANDIDATES {
        let offset = base + shift;
        if offset + HEADER_LEN as u64 > size {
            continue;
        }
        let buf = match read_vec_at(reader, offset, HEADER_LEN) {
            Ok(buf) => buf,
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => continue,
            Err(e) => return Err(IdentError::Io(e)),
        };
        if let Some(info) = try_candidate(&buf, mapping, copier_header, rom_size) {
            return Ok(info);
        }
    }

    Err(IdentError::invalid("no valid SNES header found"))
}

#[cfg(test)]
#[path = "tests/snes_tests.rs"]
mod tests;
