//! Master System / Game Gear ROM parsing ("TMR SEGA" header).

use serde::Serialize;

use romident_core::{GameMeta, IdentError, Platform, ReadAt, Region, read_header};

const HEADER_OFFSET: u64 = 0x7FF0;
const HEADER_LEN: usize = 0x10;
const MAGIC: &[u8; 8] = b"TMR SEGA";

/// Information from a Master System / Game Gear header.
#[derive(Debug, Clone, Serialize)]
pub struct SmsInfo {
    /// Decimal product code assembled from the BCD fields.
    pub product_code: String,
    pub version: u8,
    /// Raw region/size nibble (3/4 = SMS, 5/6/7 = Game Gear).
    pub region_code: u8,
    pub checksum: u16,
    pub game_gear: bool,
}

impl GameMeta for SmsInfo {
    fn platform(&self) -> Platform {
        if self.game_gear {
            Platform::GameGear
        } else {
            Platform::MasterSystem
        }
    }

    fn serial(&self) -> String {
        self.product_code.clone()
    }

    fn regions(&self) -> Vec<Region> {
        match self.region_code {
            3 | 5 => vec![Region::Japan],
            4 | 6 | 7 => vec![Region::World], // export / international
            _ => Vec::new(),
        }
    }
}

fn bcd(byte: u8) -> u32 {
    ((byte >> 4) as u32) * 10 + (byte & 0x0F) as u32
}

pub fn parse(reader: &dyn ReadAt, _size: u64) -> Result<SmsInfo, IdentError> {
    let buf = read_header(reader, HEADER_OFFSET, HEADER_LEN, "TMR SEGA header")?;

    if &buf[0..8] != MAGIC {
        return Err(IdentError::invalid("missing TMR SEGA magic at 0x7FF0"));
    }

    let checksum = u16::from_le_bytes([buf[0x0A], buf[0x0B]]);

    // Product code: BCD digits across 0x7FFC-0x7FFD plus a fifth digit in
    // the high nibble of 0x7FFE; version in its low nibble.
    let product =
        bcd(buf[0x0C]) + bcd(buf[0x0D]) * 100 + ((buf[0x0E] >> 4) as u32) * 10000;
    let version = buf[0x0E] & 0x0F;

    let region_code = buf[0x0F] >> 4;
    let game_gear = match region_code {
        3 | 4 => false,
        5 | 6 | 7 => true,
        other => {
            return Err(IdentError::invalid(format!(
                "unknown SMS/GG region code {other}"
            )));
        }
    };

    Ok(SmsInfo {
        product_code: product.to_string(),
        version,
        region_code,
        checksum,
        game_gear,
    })
}
