//! Sega Dreamcast disc identification from the ISO 9660 system area.

use serde::Serialize;

use romident_core::util::{HeaderDate, read_ascii, read_shift_jis};
use romident_core::{GameMeta, IdentError, Platform, Region};

use crate::saturn::decode_area_codes;

const MAGIC: &[u8; 16] = b"SEGA SEGAKATANA ";

/// Information from a Dreamcast disc header (IP.BIN).
#[derive(Debug, Clone, Serialize)]
pub struct DreamcastInfo {
    pub maker_id: String,
    pub device_info: String,
    /// Raw area symbols, e.g. "JUE".
    pub area_codes: String,
    pub peripherals: String,
    /// Product number, e.g. "MK-51035".
    pub product_number: String,
    pub version: String,
    pub release_date: HeaderDate,
    /// First-read binary, usually "1ST_READ.BIN".
    pub boot_file: String,
    pub company: String,
    pub title: String,
}

impl GameMeta for DreamcastInfo {
    fn platform(&self) -> Platform {
        Platform::Dreamcast
    }

    fn title(&self) -> String {
        self.title.clone()
    }

    fn serial(&self) -> String {
        self.product_number.clone()
    }

    fn regions(&self) -> Vec<Region> {
        decode_area_codes(&self.area_codes)
    }
}

/// Parse the first 2048 bytes of the volume.
pub fn parse(area: &[u8]) -> Result<DreamcastInfo, IdentError> {
    if area.len() < 0x100 {
        return Err(IdentError::invalid("system area too small"));
    }
    if &area[0..16] != MAGIC {
        return Err(IdentError::invalid("missing SEGA SEGAKATANA magic"));
    }

    Ok(DreamcastInfo {
        maker_id: read_ascii(&area[0x10..0x20]),
        device_info: read_ascii(&area[0x20..0x30]),
        area_codes: read_ascii(&area[0x30..0x38]),
        peripherals: read_ascii(&area[0x38..0x40]),
        product_number: read_ascii(&area[0x40..0x4A]),
        version: read_ascii(&area[0x4A..0x50]),
        release_date: HeaderDate::parse_yyyymmdd(&read_ascii(&area[0x50..0x58])),
        boot_file: read_ascii(&area[0x60..0x70]),
        company: read_ascii(&area[0x70..0x80]),
        title: read_shift_jis(&area[0x80..0x100]),
    })
}
