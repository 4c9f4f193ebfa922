//! Xbox XBE executable parsing.
//!
//! The certificate embedded in every XBE carries the title name, title id,
//! region flags, and versioning. Addresses in the header are virtual; the
//! certificate's file offset is `cert_addr - base_addr`.

use serde::Serialize;

use romident_core::{GameMeta, IdentError, Platform, ReadAt, Region, read_header, read_vec_at};

const MAGIC: &[u8; 4] = b"XBEH";

const CERT_LEN: usize = 0xB0;

/// Region flag bits in the certificate.
const REGION_NA: u32 = 0x1;
const REGION_JAPAN: u32 = 0x2;
const REGION_REST_OF_WORLD: u32 = 0x4;
const REGION_MANUFACTURING: u32 = 0x8000_0000;

/// Information from an XBE certificate.
#[derive(Debug, Clone, Serialize)]
pub struct XbeInfo {
    /// Title name, UTF-16LE in the certificate.
    pub title: String,
    pub title_id: u32,
    /// Serial formatted as `<publisher>-<number:03>`, e.g. "MS-004".
    pub serial: String,
    /// Unix timestamp from the certificate.
    pub timestamp: u32,
    pub media_types: u32,
    pub region_flags: u32,
    pub ratings: u32,
    pub disc_number: u32,
    pub version: u32,
    pub alternate_title_ids: Vec<u32>,
    /// File offset the XBE was parsed at (non-zero when embedded in an
    /// XISO).
    pub offset: u64,
}

impl GameMeta for XbeInfo {
    fn platform(&self) -> Platform {
        Platform::Xbox
    }

    fn title(&self) -> String {
        self.title.clone()
    }

    fn serial(&self) -> String {
        self.serial.clone()
    }

    fn regions(&self) -> Vec<Region> {
        let mut regions = Vec::new();
        if self.region_flags & REGION_NA != 0 {
            regions.push(Region::Usa);
        }
        if self.region_flags & REGION_JAPAN != 0 {
            regions.push(Region::Japan);
        }
        if self.region_flags & REGION_REST_OF_WORLD != 0 {
            regions.push(Region::World);
        }
        regions
    }
}

/// Serial from the title id: two publisher characters in the high half,
/// a game number in the low half.
fn serial_from_title_id(title_id: u32) -> String {
    let a = (title_id >> 24) as u8;
    let b = (title_id >> 16) as u8;
    let number = title_id & 0xFFFF;
    if a.is_ascii_alphanumeric() && b.is_ascii_alphanumeric() {
        format!("{}{}-{:03}", a as char, b as char, number)
    } else {
        format!("{title_id:08X}")
    }
}

/// Parse an XBE located at `base` within the reader (`base` is 0 for a
/// standalone file, or the file offset inside an XISO).
pub fn parse_at(reader: &dyn ReadAt, base: u64, size: u64) -> Result<XbeInfo, IdentError> {
    let head = read_header(reader, base, 0x120, "XBE header")?;

    if &head[0..4] != MAGIC {
        return Err(IdentError::invalid("missing XBEH magic"));
    }

    let base_addr = u32::from_le_bytes(head[0x104..0x108].try_into().unwrap()) as u64;
    let cert_addr = u32::from_le_bytes(head[0x118..0x11C].try_into().unwrap()) as u64;
    let cert_offset = cert_addr
        .checked_sub(base_addr)
        .ok_or_else(|| IdentError::corrupt("XBE certificate address below base address"))?;
    if size > 0 && cert_offset + CERT_LEN as u64 > size {
        return Err(IdentError::corrupt("XBE certificate is out of bounds"));
    }

    let cert = read_vec_at(reader, base + cert_offset, CERT_LEN)
        .map_err(|_| IdentError::corrupt("XBE certificate is truncated"))?;

    let timestamp = u32::from_le_bytes(cert[0x04..0x08].try_into().unwrap());
    let title_id = u32::from_le_bytes(cert[0x08..0x0C].try_into().unwrap());

    // Title name: 40 UTF-16LE code units at 0x0C.
    let units: Vec<u16> = cert[0x0C..0x5C]
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .take_while(|&u| u != 0)
        .collect();
    let title = String::from_utf16_lossy(&units).trim().to_string();

    let alternate_title_ids: Vec<u32> = cert[0x5C..0x9C]
        .chunks_exact(4)
        .map(|w| u32::from_le_bytes(w.try_into().unwrap()))
        .filter(|&id| id != 0)
        .collect();

    Ok(XbeInfo {
        title,
        title_id,
        serial: serial_from_title_id(title_id),
        timestamp,
        media_types: u32::from_le_bytes(cert[0x9C..0xA0].try_into().unwrap()),
        region_flags: u32::from_le_bytes(cert[0xA0..0xA4].try_into().unwrap())
            & !REGION_MANUFACTURING,
        ratings: u32::from_le_bytes(cert[0xA4..0xA8].try_into().unwrap()),
        disc_number: u32::from_le_bytes(cert[0xA8..0xAC].try_into().unwrap()),
        version: u32::from_le_bytes(cert[0xAC..0xB0].try_into().unwrap()),
        alternate_title_ids,
        offset: base,
    })
}

/// Parse a standalone XBE file.
pub fn parse(reader: &dyn ReadAt, size: u64) -> Result<XbeInfo, IdentError> {
    parse_at(reader, 0, size)
}

#[cfg(test)]
#[path = "tests/xbe_tests.rs"]
pub(crate) mod tests;
