//! Sega CD / Mega CD disc identification from the ISO 9660 system area.
//!
//! The system area begins with one of the known disc id strings and embeds
//! the standard Mega Drive header layout at 0x100.

use serde::Serialize;

use romident_core::util::read_ascii;
use romident_core::{GameMeta, IdentError, Platform, Region};

use crate::megadrive::{MdHeader, decode_regions, parse_header_block};

/// Known disc id strings at offset 0 (16 bytes, space padded).
const DISC_IDS: [&[u8; 16]; 4] = [
    b"SEGADISCSYSTEM  ",
    b"SEGABOOTDISC    ",
    b"SEGADISC        ",
    b"SEGADATADISC    ",
];

/// Information from a Sega CD disc header.
#[derive(Debug, Clone, Serialize)]
pub struct SegaCdInfo {
    /// The disc id string that matched.
    pub disc_id: String,
    /// Volume name at 0x10.
    pub volume_name: String,
    #[serde(flatten)]
    pub header: MdHeader,
    pub regions: Vec<Region>,
}

impl GameMeta for SegaCdInfo {
    fn platform(&self) -> Platform {
        Platform::SegaCd
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

/// Parse the first 2048 bytes of the volume.
pub fn parse(area: &[u8]) -> Result<SegaCdInfo, IdentError> {
    if area.len() < 0x200 {
        return Err(IdentError::invalid("system area too small"));
    }

    let matched = DISC_IDS.iter().find(|id| area[0..16] == id[..]);
    let Some(disc_id) = matched else {
        return Err(IdentError::invalid("no Sega CD disc id"));
    };

    let header = parse_header_block(&area[0x100..0x200]);
    let regions = decode_regions(&header.region_codes);

    Ok(SegaCdInfo {
        disc_id: read_ascii(&disc_id[..]),
        volume_name: read_ascii(&area[0x10..0x20]),
        header,
        regions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_segacd_area() -> Vec<u8> {
        let mut area = vec![b' '; 2048];
        area[0..16].copy_from_slice(b"SEGADISCSYSTEM  ");
        area[0x10..0x19].copy_from_slice(b"SONIC CD ");

        let header = &mut area[0x100..0x200];
        header[0x00..0x0F].copy_from_slice(b"SEGA MEGA DRIVE");
        header[0x10..0x20].copy_from_slice(b"(C)SEGA 1993.SEP");
        header[0x50..0x58].copy_from_slice(b"SONIC CD");
        header[0x80..0x8D].copy_from_slice(b"GM MK-4407-00");
        header[0xF0..0xF3].copy_from_slice(b"JUE");
        area
    }

    #[test]
    fn parses_sega_cd_header() {
        let area = make_segacd_area();
        let info = parse(&area).unwrap();
        assert_eq!(info.platform(), Platform::SegaCd);
        assert_eq!(info.disc_id, "SEGADISCSYSTEM");
        assert_eq!(info.title(), "SONIC CD");
        assert_eq!(info.serial(), "GM MK-4407-00");
        assert_eq!(
            info.regions,
            vec![Region::Japan, Region::Americas, Region::Europe]
        );
    }

    #[test]
    fn accepts_all_known_disc_ids() {
        for id in DISC_IDS {
            let mut area = make_segacd_area();
            area[0..16].copy_from_slice(id);
            assert!(parse(&area).is_ok(), "{:?}", std::str::from_utf8(id));
        }
    }

    #[test]
    fn unknown_disc_id_is_invalid() {
        let mut area = make_segacd_area();
        area[0..16].copy_from_slice(b"SEGAMYSTERYDISC ");
        let err = parse(&area).unwrap_err();
        assert!(err.is_invalid());
    }
}
