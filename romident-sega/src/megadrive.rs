//! Mega Drive / Genesis ROM parsing.
//!
//! Handles plain dumps, SMD-interleaved dumps (512-byte copier header,
//! 16 KB interleaved blocks), and 32X detection via the "MARS" marker.

use log::debug;
use serde::Serialize;

use romident_core::util::{read_ascii, read_shift_jis};
use romident_core::{GameMeta, IdentError, Platform, ReadAt, Region, read_header, read_vec_at};

/// The system-type field at 0x100 always starts with "SEGA".
const SEGA_MAGIC: &[u8; 4] = b"SEGA";

/// Offset of the header (after the 68000 interrupt vectors).
pub(crate) const HEADER_OFFSET: u64 = 0x100;

/// "MARS" at 0x3C0 marks a 32X cartridge.
const MARS_OFFSET: u64 = 0x3C0;

/// SMD copier header size and interleave block size.
const SMD_HEADER_SIZE: usize = 512;
const SMD_BLOCK_SIZE: usize = 16 * 1024;
const SMD_HALF_BLOCK: usize = SMD_BLOCK_SIZE / 2;

/// Fields of the 0x100-byte Mega Drive header block, shared with the Sega
/// CD parser (the disc system area embeds the same layout at 0x100).
#[derive(Debug, Clone, Serialize)]
pub struct MdHeader {
    /// System type string (e.g. "SEGA MEGA DRIVE", "SEGA GENESIS").
    pub system_type: String,
    /// Copyright / release field (e.g. "(C)SEGA 1991.APR").
    pub copyright: String,
    /// Domestic (Japanese) title, Shift-JIS decoded.
    pub domestic_title: String,
    /// Overseas (international) title.
    pub overseas_title: String,
    /// Serial number (e.g. "GM 00001009-00").
    pub serial_number: String,
    /// ROM checksum (big-endian u16 at +0x8E).
    pub checksum: u16,
    pub device_support: String,
    pub rom_start: u32,
    pub rom_end: u32,
    pub ram_start: u32,
    pub ram_end: u32,
    /// Region support field (e.g. "JUE" or a hex digit).
    pub region_codes: String,
}

/// Parse the header block (bytes 0x100-0x1FF of the ROM or system area).
pub(crate) fn parse_header_block(buf: &[u8]) -> MdHeader {
    MdHeader {
        system_type: read_ascii(&buf[0x00..0x10]),
        copyright: read_ascii(&buf[0x10..0x20]),
        domestic_title: read_shift_jis(&buf[0x20..0x50]),
        overseas_title: read_ascii(&buf[0x50..0x80]),
        serial_number: read_ascii(&buf[0x80..0x8E]),
        checksum: u16::from_be_bytes([buf[0x8E], buf[0x8F]]),
        device_support: read_ascii(&buf[0x90..0xA0]),
        rom_start: u32::from_be_bytes(buf[0xA0..0xA4].try_into().unwrap()),
        rom_end: u32::from_be_bytes(buf[0xA4..0xA8].try_into().unwrap()),
        ram_start: u32::from_be_bytes(buf[0xA8..0xAC].try_into().unwrap()),
        ram_end: u32::from_be_bytes(buf[0xAC..0xB0].try_into().unwrap()),
        region_codes: read_ascii(&buf[0xF0..0xF3]),
    }
}

/// Decode the region field, which comes in two styles: release-letter
/// characters ("JUE") on older carts, or a single hex digit bitfield
/// (bit 0 = Japan, bit 2 = Americas, bit 3 = Europe) on later ones.
pub(crate) fn decode_regions(region_codes: &str) -> Vec<Region> {
    let trimmed = region_codes.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    if trimmed.chars().all(|c| matches!(c, 'J' | 'U' | 'E')) {
        let mut regions = Vec::new();
        for c in trimmed.chars() {
            let region = match c {
                'J' => Region::Japan,
                'U' => Region::Americas,
                'E' => Region::Europe,
                _ => unreachable!(),
            };
            if !regions.contains(&region) {
                regions.push(region);
            }
        }
        return regions;
    }

    // Hex-digit style: only the first character is meaningful.
    let Some(bits) = trimmed.chars().next().and_then(|c| c.to_digit(16)) else {
        return Vec::new();
    };
    let mut regions = Vec::new();
    if bits & 0x1 != 0 {
        regions.push(Region::Japan);
    }
    if bits & 0x4 != 0 {
        regions.push(Region::Americas);
    }
    if bits & 0x8 != 0 {
        regions.push(Region::Europe);
    }
    regions
}

/// Information from a Mega Drive / 32X cartridge.
#[derive(Debug, Clone, Serialize)]
pub struct MegaDriveInfo {
    #[serde(flatten)]
    pub header: MdHeader,
    pub regions: Vec<Region>,
    /// Set when the "MARS" marker identifies a 32X cartridge.
    pub is_32x: bool,
    /// Set when the dump was SMD-interleaved.
    pub interleaved: bool,
}

impl GameMeta for MegaDriveInfo {
    fn platform(&self) -> Platform {
        if self.is_32x {
            Platform::Sega32x
        } else {
            Platform::MegaDrive
        }
    }

    fn title(&self) -> String {
        if self.header.overseas_title.is_empty() {
            self.header.domestic_title.clone()
        } else {
            self.header.overseas_title.clone()
        }
    }

    fn serial(&self) -> String {
        self.header.serial_number.clone()
    }

    fn regions(&self) -> Vec<Region> {
        self.regions.clone()
    }
}

fn build_info(header_block: &[u8], mars: &[u8], interleaved: bool) -> Result<MegaDriveInfo, IdentError> {
    if &header_block[0..4] != SEGA_MAGIC {
        return Err(IdentError::invalid(
            "not a Mega Drive ROM (missing SEGA magic at 0x100)",
        ));
    }
    let header = parse_header_block(header_block);
    let regions = decode_regions(&header.region_codes);
    let is_32x = mars == b"MARS";
    Ok(MegaDriveInfo {
        header,
        regions,
        is_32x,
        interleaved,
    })
}

/// Parse a plain (non-interleaved) dump, falling back to the SMD layout
/// when the plain header is absent but an SMD copier header is present.
pub fn parse(reader: &dyn ReadAt, size: u64) -> Result<MegaDriveInfo, IdentError> {
    let head = read_header(reader, 0, 0x400, "Mega Drive header")?;
    if &head[HEADER_OFFSET as usize..HEADER_OFFSET as usize + 4] == SEGA_MAGIC {
        return build_info(
            &head[HEADER_OFFSET as usize..HEADER_OFFSET as usize + 0x100],
            &head[MARS_OFFSET as usize..MARS_OFFSET as usize + 4],
            false,
        );
    }

    debug!("no plain Mega Drive header, trying SMD layout");
    parse_smd(reader, size)
}

/// Parse an SMD-interleaved dump: 512-byte copier header followed by
/// 16 KB blocks storing odd output bytes in the first half and even
/// output bytes in the second.
pub fn parse_smd(reader: &dyn ReadAt, _size: u64) -> Result<MegaDriveInfo, IdentError> {
    let head = read_header(reader, 0, SMD_HEADER_SIZE, "SMD header")?;
    let valid = head[1] == 0x03
        && head[8] == 0xAA
        && head[9] == 0xBB
        && head[3..8].iter().all(|&b| b == 0);
    if !valid {
        return Err(IdentError::invalid("missing SMD copier header"));
    }

    // The Mega Drive header lives in the first de-interleaved block.
    let block = read_vec_at(reader, SMD_HEADER_SIZE as u64, SMD_BLOCK_SIZE)
        .map_err(|_| IdentError::invalid("SMD dump: first block is truncated"))?;
    let mut plain = vec![0u8; SMD_BLOCK_SIZE];
    for i in 0..SMD_HALF_BLOCK {
        plain[i * 2 + 1] = block[i];
        plain[i * 2] = block[SMD_HALF_BLOCK + i];
    }

    build_info(
        &plain[HEADER_OFFSET as usize..HEADER_OFFSET as usize + 0x100],
        &plain[MARS_OFFSET as usize..MARS_OFFSET as usize + 4],
        true,
    )
}

#[cfg(test)]
#[path = "tests/megadrive_tests.rs"]
mod tests;
