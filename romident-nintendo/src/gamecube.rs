//! GameCube / Wii disc header (GCM) parsing, plus the RVZ/WIA container
//! header which embeds an uncompressed copy of the same disc header.

use serde::Serialize;

use romident_core::util::read_ascii;
use romident_core::{GameMeta, IdentError, Platform, ReadAt, Region, read_header};

/// Wii magic word at 0x18.
const WII_MAGIC: u32 = 0x5D1C_9EA3;
/// GameCube magic word at 0x1C.
const GC_MAGIC: u32 = 0xC233_9F3D;

const HEADER_LEN: usize = 0x60;

/// Offset of the embedded, uncompressed disc header inside an RVZ/WIA file.
const RVZ_DISC_HEADER_OFFSET: u64 = 0x58;

/// Information from a GameCube/Wii disc header.
#[derive(Debug, Clone, Serialize)]
pub struct GcmInfo {
    /// Six-character game id (system + game + region + maker).
    pub game_id: String,
    /// System-code character at 0x00. Note the letter namespace here is
    /// distinct from the region byte: 'P' as a system code marks a
    /// TurboGrafx-16 Virtual Console title, while 'P' as the region
    /// character (4th id char) means PAL.
    pub system_code: char,
    pub maker_code: String,
    pub disc_number: u8,
    pub version: u8,
    pub title: String,
    pub wii: bool,
    pub region: Region,
}

impl GameMeta for GcmInfo {
    fn platform(&self) -> Platform {
        if self.wii {
            Platform::Wii
        } else {
            Platform::GameCube
        }
    }

    fn title(&self) -> String {
        self.title.clone()
    }

    fn serial(&self) -> String {
        self.game_id.clone()
    }

    fn regions(&self) -> Vec<Region> {
        if self.region == Region::Unknown {
            Vec::new()
        } else {
            vec![self.region]
        }
    }
}

/// Region from the 4th character of the game id (disc-region namespace).
fn region_from_char(code: u8) -> Region {
    match code {
        b'E' => Region::Usa,
        b'J' => Region::Japan,
        b'P' | b'X' | b'Y' | b'Z' => Region::Europe,
        b'D' => Region::Germany,
        b'F' => Region::France,
        b'I' => Region::Italy,
        b'S' => Region::Spain,
        b'H' => Region::Netherlands,
        b'U' => Region::Australia,
        b'K' | b'Q' | b'T' => Region::Korea,
        b'C' => Region::China,
        b'A' => Region::World,
        b'L' | b'M' => Region::Japan, // JP-import Virtual Console
        _ => Region::Unknown,
    }
}

/// Parse a 0x60-byte disc header already in memory.
fn parse_disc_header(buf: &[u8]) -> Result<GcmInfo, IdentError> {
    let wii_magic = u32::from_be_bytes(buf[0x18..0x1C].try_into().unwrap());
    let gc_magic = u32::from_be_bytes(buf[0x1C..0x20].try_into().unwrap());

    let wii = wii_magic == WII_MAGIC;
    let gc = gc_magic == GC_MAGIC;
    if wii == gc {
        // Neither or both: not a disc header.
        return Err(IdentError::invalid("no GameCube/Wii magic word"));
    }

    let game_id = read_ascii(&buf[0x00..0x06]);
    if game_id.len() != 6 {
        return Err(IdentError::invalid("disc game id is not 6 characters"));
    }

    Ok(GcmInfo {
        system_code: buf[0x00] as char,
        maker_code: read_ascii(&buf[0x04..0x06]),
        disc_number: buf[0x06],
        version: buf[0x07],
        title: read_ascii(&buf[0x20..0x60]),
        wii,
        region: region_from_char(buf[0x03]),
        game_id,
    })
}

/// Parse a plain GCM disc image.
pub fn parse(reader: &dyn ReadAt, _size: u64) -> Result<GcmInfo, IdentError> {
    let buf = read_header(reader, 0, HEADER_LEN, "disc header")?;
    parse_disc_header(&buf)
}

/// Parse an RVZ or WIA container. The first 0x80 bytes of the disc header
/// are stored uncompressed at 0x58, so no decompression is needed for
/// identification.
pub fn parse_rvz(reader: &dyn ReadAt, _size: u64) -> Result<GcmInfo, IdentError> {
    let magic = read_header(reader, 0, 4, "RVZ header")?;
    if &magic[..] != b"RVZ\x01" && &magic[..] != b"WIA\x01" {
        return Err(IdentError::invalid("missing RVZ/WIA magic"));
    }
    let buf = read_header(reader, RVZ_DISC_HEADER_OFFSET, HEADER_LEN, "RVZ disc header")?;
    parse_disc_header(&buf)
}

#[cfg(test)]
#[path = "tests/gamecube_tests.rs"]
mod tests;
