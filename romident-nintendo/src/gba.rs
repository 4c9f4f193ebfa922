//! Game Boy Advance ROM parsing.

use serde::Serialize;

use romident_core::util::read_ascii;
use romident_core::{GameMeta, IdentError, Platform, ReadAt, Region, read_header};

const HEADER_LEN: usize = 0xC0;

/// Fixed value at 0xB2 in every licensed GBA header.
const FIXED_VALUE: u8 = 0x96;

/// Information from a GBA cartridge header.
#[derive(Debug, Clone, Serialize)]
pub struct GbaInfo {
    pub title: String,
    /// Four-character game code, e.g. "AGBE".
    pub game_code: String,
    pub maker_code: String,
    pub version: u8,
    pub header_checksum_valid: bool,
}

impl GameMeta for GbaInfo {
    fn platform(&self) -> Platform {
        Platform::Gba
    }

    fn title(&self) -> String {
        self.title.clone()
    }

    fn serial(&self) -> String {
        if self.game_code.len() == 4 {
            format!("AGB-{}", self.game_code)
        } else {
            String::new()
        }
    }

    fn regions(&self) -> Vec<Region> {
        match self.game_code.as_bytes().get(3) {
            Some(b'J') => vec![Region::Japan],
            Some(b'E') => vec![Region::Usa],
            Some(b'P') | Some(b'X') | Some(b'Y') | Some(b'Z') => vec![Region::Europe],
            Some(b'D') => vec![Region::Germany],
            Some(b'F') => vec![Region::France],
            Some(b'I') => vec![Region::Italy],
            Some(b'S') => vec![Region::Spain],
            Some(b'K') => vec![Region::Korea],
            Some(b'C') => vec![Region::China],
            _ => Vec::new(),
        }
    }
}

pub fn parse(reader: &dyn ReadAt, _size: u64) -> Result<GbaInfo, IdentError> {
    let buf = read_header(reader, 0, HEADER_LEN, "GBA header")?;

    if buf[0xB2] != FIXED_VALUE {
        return Err(IdentError::invalid("missing 0x96 fixed byte at 0xB2"));
    }

    // Complement check over 0xA0..=0xBC.
    let mut checksum: u8 = 0;
    for &b in &buf[0xA0..0xBD] {
        checksum = checksum.wrapping_sub(b);
    }
    checksum = checksum.wrapping_sub(0x19);
    let header_checksum_valid = checksum == buf[0xBD];

    Ok(GbaInfo {
        title: read_ascii(&buf[0xA0..0xAC]),
        game_code: read_ascii(&buf[0xAC..0xB0]),
        maker_code: read_ascii(&buf[0xB0..0xB2]),
        version: buf[0xBC],
        header_checksum_valid,
    })
}
