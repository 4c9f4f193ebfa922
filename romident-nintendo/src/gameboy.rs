//! Game Boy / Game Boy Color ROM parsing.

use serde::Serialize;

use romident_core::util::read_ascii;
use romident_core::{GameMeta, IdentError, Platform, ReadAt, Region, read_header};

/// The boot-ROM logo bitmap at 0x104. The console refuses carts without
/// it, which makes it the de-facto magic for the format.
pub const NINTENDO_LOGO: [u8; 48] = [
    0xCE, 0xED, 0x66, 0x66, 0xCC, 0x0D, 0x00, 0x0B, 0x03, 0x73, 0x00, 0x83, 0x00, 0x0C, 0x00,
    0x0D, 0x00, 0x08, 0x11, 0x1F, 0x88, 0x89, 0x00, 0x0E, 0xDC, 0xCC, 0x6E, 0xE6, 0xDD, 0xDD,
    0xD9, 0x99, 0xBB, 0xBB, 0x67, 0x63, 0x6E, 0x0E, 0xEC, 0xCC, 0xDD, 0xDC, 0x99, 0x9F, 0xBB,
    0xB9, 0x33, 0x3E,
];

const HEADER_OFFSET: u64 = 0x100;
const HEADER_LEN: usize = 0x50;

/// Information from a Game Boy cartridge header.
#[derive(Debug, Clone, Serialize)]
pub struct GameBoyInfo {
    pub title: String,
    /// Four-character manufacturer code, only present in the CGB header
    /// layout.
    pub manufacturer_code: String,
    pub cgb_flag: u8,
    pub sgb_support: bool,
    pub cartridge_type: u8,
    pub rom_size: u64,
    pub ram_size: u64,
    /// 0x00 = Japan, 0x01 = overseas.
    pub destination_code: u8,
    pub licensee_code: String,
    pub version: u8,
    pub header_checksum_valid: bool,
    pub color: bool,
}

impl GameMeta for GameBoyInfo {
    fn platform(&self) -> Platform {
        if self.color {
            Platform::GameBoyColor
        } else {
            Platform::GameBoy
        }
    }

    fn title(&self) -> String {
        self.title.clone()
    }

    fn regions(&self) -> Vec<Region> {
        match self.destination_code {
            0x00 => vec![Region::Japan],
            _ => Vec::new(),
        }
    }
}

fn ram_size_bytes(code: u8) -> u64 {
    match code {
        0x02 => 8 * 1024,
        0x03 => 32 * 1024,
        0x04 => 128 * 1024,
        0x05 => 64 * 1024,
        _ => 0,
    }
}

pub fn parse(reader: &dyn ReadAt, _size: u64) -> Result<GameBoyInfo, IdentError> {
    let buf = read_header(reader, HEADER_OFFSET, HEADER_LEN, "Game Boy header")?;

    if buf[0x04..0x34] != NINTENDO_LOGO {
        return Err(IdentError::invalid("missing Nintendo logo at 0x104"));
    }

    let cgb_flag = buf[0x43];
    let color = cgb_flag == 0x80 || cgb_flag == 0xC0;

    // The CGB layout shortens the title to 11 characters and adds a
    // 4-character manufacturer code; older carts use all 16 bytes.
    let (title, manufacturer_code) = if color {
        (
            read_ascii(&buf[0x34..0x3F]),
            read_ascii(&buf[0x3F..0x43]),
        )
    } else {
        (read_ascii(&buf[0x34..0x44]), String::new())
    };

    let old_licensee = buf[0x4B];
    let licensee_code = if old_licensee == 0x33 {
        read_ascii(&buf[0x44..0x46])
    } else {
        format!("{old_licensee:02X}")
    };

    // Header checksum over 0x134..=0x14C: x = x - byte - 1.
    let mut checksum: u8 = 0;
    for &b in &buf[0x34..0x4D] {
        checksum = checksum.wrapping_sub(b).wrapping_sub(1);
    }
    let header_checksum_valid = checksum == buf[0x4D];

    Ok(GameBoyInfo {
        title,
        manufacturer_code,
        cgb_flag,
        sgb_support: buf[0x46] == 0x03,
        cartridge_type: buf[0x47],
        rom_size: 32 * 1024 << buf[0x48].min(8),
        ram_size: ram_size_bytes(buf[0x49]),
        destination_code: buf[0x4A],
        licensee_code,
        version: buf[0x4C],
        header_checksum_valid,
        color,
    })
}

#[cfg(test)]
#[path = "tests/gameboy_tests.rs"]
mod tests;
