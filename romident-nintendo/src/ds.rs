//! Nintendo DS / DSi ROM parsing.
//!
//! The DS header has no magic word; validity rests on structural checks of
//! the unit code, device capacity, and game-code character set.

use serde::Serialize;

use romident_core::util::read_ascii;
use romident_core::{GameMeta, IdentError, Platform, ReadAt, Region, read_header};

const HEADER_LEN: usize = 0x20;

/// Information from a DS/DSi cartridge header.
#[derive(Debug, Clone, Serialize)]
pub struct NdsInfo {
    pub title: String,
    /// Four-character game code, e.g. "AXXE".
    pub game_code: String,
    pub maker_code: String,
    /// 0x00 = DS, 0x02 = DS with DSi enhancements, 0x03 = DSi exclusive.
    pub unit_code: u8,
    /// ROM capacity: `128 KiB << device_capacity`.
    pub rom_size: u64,
    pub version: u8,
    /// Destination character (4th game-code char).
    pub destination: char,
}

impl GameMeta for NdsInfo {
    fn platform(&self) -> Platform {
        if self.unit_code == 0x03 {
            Platform::Dsi
        } else {
            Platform::Ds
        }
    }

    fn title(&self) -> String {
        self.title.clone()
    }

    fn serial(&self) -> String {
        if self.game_code.len() == 4 {
            format!("NTR-{}", self.game_code)
        } else {
            String::new()
        }
    }

    fn regions(&self) -> Vec<Region> {
        match self.destination {
            'J' => vec![Region::Japan],
            'E' | 'T' => vec![Region::Usa],
            'P' | 'X' | 'Y' | 'Z' | 'V' => vec![Region::Europe],
            'D' => vec![Region::Germany],
            'F' => vec![Region::France],
            'I' => vec![Region::Italy],
            'S' => vec![Region::Spain],
            'H' => vec![Region::Netherlands],
            'K' => vec![Region::Korea],
            'C' => vec![Region::China],
            'U' => vec![Region::Australia],
            'A' | 'O' => vec![Region::World],
            _ => Vec::new(),
        }
    }
}

pub fn parse(reader: &dyn ReadAt, _size: u64) -> Result<NdsInfo, IdentError> {
    let buf = read_header(reader, 0, HEADER_LEN, "NDS header")?;

    let unit_code = buf[0x12];
    if !matches!(unit_code, 0x00 | 0x02 | 0x03) {
        return Err(IdentError::invalid(format!(
            "unrecognized NDS unit code 0x{unit_code:02X}"
        )));
    }

    let device_capacity = buf[0x14];
    if device_capacity > 0x0F {
        return Err(IdentError::invalid(format!(
            "NDS device capacity {device_capacity} out of range"
        )));
    }

    let code_bytes = &buf[0x0C..0x10];
    if !code_bytes
        .iter()
        .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
    {
        return Err(IdentError::invalid("NDS game code is not alphanumeric"));
    }
    let game_code = read_ascii(code_bytes);

    Ok(NdsInfo {
        title: read_ascii(&buf[0x00..0x0C]),
        destination: game_code.chars().nth(3).unwrap_or(' '),
        game_code,
        maker_code: read_ascii(&buf[0x10..0x12]),
        unit_code,
        rom_size: 128 * 1024 << device_capacity,
        version: buf[0x1E],
    })
}

#[cfg(test)]
#[path = "tests/ds_tests.rs"]
mod tests;
