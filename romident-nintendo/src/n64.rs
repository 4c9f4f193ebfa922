//! Nintendo 64 ROM parsing.
//!
//! Detects the dump byte order (z64/v64/n64), normalizes the header to
//! big-endian, and extracts the title and game code.

use serde::Serialize;

use crate::n64_byteorder::{detect_n64_format, normalize_to_big_endian};
use romident_core::util::read_ascii_fixed;
use romident_core::{GameMeta, IdentError, Platform, ReadAt, Region, read_header};

const HEADER_SIZE: usize = 0x40;

/// Information from an N64 ROM header.
#[derive(Debug, Clone, Serialize)]
pub struct N64Info {
    /// Byte order the file was stored in.
    pub format: String,
    pub title: String,
    /// Category character ('N' = Game Pak, 'D' = 64DD, ...).
    pub category_code: char,
    /// Two-character game id.
    pub game_id: String,
    /// Destination character.
    pub destination_code: char,
    pub version: u8,
    /// CRC pair declared in the header.
    pub crc1: u32,
    pub crc2: u32,
    pub region: Region,
}

impl GameMeta for N64Info {
    fn platform(&self) -> Platform {
        Platform::N64
    }

    fn title(&self) -> String {
        self.title.clone()
    }

    fn serial(&self) -> String {
        if self.game_id.len() == 2
            && self.category_code.is_ascii_graphic()
            && self.destination_code.is_ascii_graphic()
        {
            format!(
                "NUS-{}{}{}-{}",
                self.category_code,
                self.game_id,
                self.destination_code,
                region_suffix(self.region)
            )
        } else {
            String::new()
        }
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
        b'E' | b'N' => Region::Usa,
        b'J' => Region::Japan,
        b'P' | b'X' | b'Y' | b'L' => Region::Europe,
        b'D' => Region::Germany,
        b'F' => Region::France,
        b'S' => Region::Spain,
        b'I' => Region::Italy,
        b'H' => Region::Netherlands,
        b'U' => Region::Australia,
        b'A' | b'W' => Region::World,
        b'B' => Region::Brazil,
        b'K' => Region::Korea,
        b'C' => Region::China,
        _ => Region::Unknown,
    }
}

fn region_suffix(region: Region) -> &'static str {
    match region {
        Region::Usa => "USA",
        Region::Japan => "JPN",
        Region::Europe | Region::Germany | Region::France | Region::Spain | Region::Italy
        | Region::Netherlands | Region::UnitedKingdom => "EUR",
        Region::Australia => "AUS",
        Region::World => "ALL",
        Region::Brazil => "BRA",
        Region::Korea => "KOR",
        Region::China => "CHN",
        _ => "UNK",
    }
}

pub fn parse(reader: &dyn ReadAt, _size: u64) -> Result<N64Info, IdentError> {
    let mut buf = read_header(reader, 0, HEADER_SIZE, "N64 header")?;

    let format = detect_n64_format(&buf).ok_or_else(|| {
        IdentError::invalid(format!(
            "unrecognized N64 magic bytes: [{:02X}, {:02X}, {:02X}, {:02X}]",
            buf[0], buf[1], buf[2], buf[3]
        ))
    })?;

    normalize_to_big_endian(&mut buf, format);

    let crc1 = u32::from_be_bytes(buf[0x10..0x14].try_into().unwrap());
    let crc2 = u32::from_be_bytes(buf[0x14..0x18].try_into().unwrap());
    let title = read_ascii_fixed(&buf[0x20..0x34]);
    let category_code = buf[0x3B] as char;
    let game_id = read_ascii_fixed(&buf[0x3C..0x3E]);
    let destination = buf[0x3E];
    let version = buf[0x3F];

    Ok(N64Info {
        format: format.name().to_string(),
        title,
        category_code,
        game_id,
        destination_code: destination as char,
        version,
        crc1,
        crc2,
        region: region_from_destination(destination),
    })
}

#[cfg(test)]
#[path = "tests/n64_tests.rs"]
mod tests;
