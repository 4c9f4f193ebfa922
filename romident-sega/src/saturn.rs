//! Sega Saturn disc identification from the ISO 9660 system area.

use serde::Serialize;

use romident_core::util::{HeaderDate, read_ascii, read_shift_jis};
use romident_core::{GameMeta, IdentError, Platform, Region};

const MAGIC: &[u8; 16] = b"SEGA SEGASATURN ";

/// Information from a Saturn disc header (IP.BIN).
#[derive(Debug, Clone, Serialize)]
pub struct SaturnInfo {
    pub maker_id: String,
    /// Product number, e.g. "MK-81022".
    pub product_number: String,
    pub version: String,
    pub release_date: HeaderDate,
    pub device_info: String,
    /// Raw area symbols, e.g. "JUE".
    pub area_codes: String,
    pub peripherals: String,
    pub title: String,
}

impl GameMeta for SaturnInfo {
    fn platform(&self) -> Platform {
        Platform::Saturn
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

/// Map Sega area symbols to regions. `U` covers the NTSC Americas and `E`
/// the PAL area.
pub(crate) fn decode_area_codes(codes: &str) -> Vec<Region> {
    let mut regions = Vec::new();
    for c in codes.chars() {
        let region = match c {
            'J' => Region::Japan,
            'T' => Region::Taiwan,
            'U' => Region::Americas,
            'B' => Region::Brazil,
            'K' => Region::Korea,
            'A' => Region::Asia,
            'E' | 'L' => Region::Europe,
            _ => continue,
        };
        if !regions.contains(&region) {
            regions.push(region);
        }
    }
    regions
}

/// Parse the first 2048 bytes of the volume.
pub fn parse(area: &[u8]) -> Result<SaturnInfo, IdentError> {
    if area.len() < 0x100 {
        return Err(IdentError::invalid("system area too small"));
    }
    if &area[0..16] != MAGIC {
        return Err(IdentError::invalid("missing SEGA SEGASATURN magic"));
    }

    Ok(SaturnInfo {
        maker_id: read_ascii(&area[0x10..0x20]),
        product_number: read_ascii(&area[0x20..0x2A]),
        version: read_ascii(&area[0x2A..0x30]),
        release_date: HeaderDate::parse_yyyymmdd(&read_ascii(&area[0x30..0x38])),
        device_info: read_ascii(&area[0x38..0x40]),
        area_codes: read_ascii(&area[0x40..0x4A]),
        peripherals: read_ascii(&area[0x50..0x60]),
        title: read_shift_jis(&area[0x60..0xD0]),
    })
}
