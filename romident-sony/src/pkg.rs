//! PSN PKG package parsing (PS3 / PSP / Vita / PSM).
//!
//! All header fields are big-endian. The package carries a metadata list
//! whose entries include the content type and the location of an embedded
//! PARAM.SFO; Vita-era packages add an extended header whose key id
//! disambiguates PSP/Vita/PSM when the content type alone does not.

use serde::Serialize;

use romident_core::util::read_ascii;
use romident_core::{GameMeta, IdentError, Platform, ReadAt, Region, read_header, read_vec_at};

use crate::sfo::{self, SfoInfo};

const MAGIC: &[u8; 4] = b"\x7FPKG";
const EXT_MAGIC: &[u8; 4] = b"\x7Fext";

const PKG_TYPE_PS3: u16 = 0x0001;
const PKG_TYPE_PSP_VITA: u16 = 0x0002;

/// Metadata entry ids we consume.
const META_CONTENT_TYPE: u32 = 0x02;
const META_SFO: u32 = 0x0E;

/// Offset of the extended header in type-2 packages.
const EXT_HEADER_OFFSET: u64 = 0xC0;

/// Information from a PSN PKG file.
#[derive(Debug, Clone, Serialize)]
pub struct PkgInfo {
    pub platform: Platform,
    /// Full content id, e.g. "UP9000-UCUS98744_00-0000111122223333".
    pub content_id: String,
    pub content_type: u32,
    /// Embedded PARAM.SFO metadata, when present.
    pub sfo: Option<SfoInfo>,
}

impl GameMeta for PkgInfo {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn title(&self) -> String {
        self.sfo.as_ref().map(|s| s.title.clone()).unwrap_or_default()
    }

    fn serial(&self) -> String {
        // The middle segment of the content id is the title id.
        self.content_id
            .split('-')
            .nth(1)
            .map(|seg| seg.split('_').next().unwrap_or(seg).to_string())
            .unwrap_or_default()
    }

    fn regions(&self) -> Vec<Region> {
        match self.content_id.as_bytes().first() {
            Some(b'U') => vec![Region::Usa],
            Some(b'E') => vec![Region::Europe],
            Some(b'J') => vec![Region::Japan],
            Some(b'H') => vec![Region::Asia],
            Some(b'K') => vec![Region::Korea],
            Some(b'I') => vec![Region::World],
            _ => Vec::new(),
        }
    }
}

/// Content types with an unambiguous platform.
fn platform_from_content_type(content_type: u32) -> Option<Platform> {
    match content_type {
        0x06 => Some(Platform::Ps1),
        0x07 | 0x0E | 0x0F | 0x10 => Some(Platform::Psp),
        0x15 | 0x16 | 0x17 => Some(Platform::Vita),
        0x18 | 0x1D => Some(Platform::Psm),
        0x04 | 0x05 | 0x09 | 0x0A | 0x0B | 0x0C | 0x0D => Some(Platform::Ps3),
        _ => None,
    }
}

fn platform_from_key_id(key_id: u32) -> Option<Platform> {
    match key_id {
        0x01 => Some(Platform::Psp),
        0x02 | 0x03 => Some(Platform::Vita),
        0x04 => Some(Platform::Psm),
        _ => None,
    }
}

pub fn parse(reader: &dyn ReadAt, size: u64) -> Result<PkgInfo, IdentError> {
    let head = read_header(reader, 0, 0x60, "PKG header")?;

    if &head[0..4] != MAGIC {
        return Err(IdentError::invalid("missing \\x7FPKG magic"));
    }

    let pkg_type = u16::from_be_bytes(head[0x06..0x08].try_into().unwrap());
    if pkg_type != PKG_TYPE_PS3 && pkg_type != PKG_TYPE_PSP_VITA {
        return Err(IdentError::unsupported(format!(
            "unknown PKG type 0x{pkg_type:04X}"
        )));
    }

    let meta_offset = u32::from_be_bytes(head[0x08..0x0C].try_into().unwrap()) as u64;
    let meta_count = u32::from_be_bytes(head[0x0C..0x10].try_into().unwrap());
    let content_id = read_ascii(&head[0x30..0x54]);

    if meta_count > 256 {
        return Err(IdentError::corrupt("implausible PKG metadata count"));
    }

    // Walk the metadata list for the content type and the embedded SFO.
    let mut content_type = 0u32;
    let mut sfo_location: Option<(u64, usize)> = None;
    let mut at = meta_offset;
    for _ in 0..meta_count {
        let entry_head = read_vec_at(reader, at, 8)
            .map_err(|_| IdentError::corrupt("PKG metadata is truncated"))?;
        let id = u32::from_be_bytes(entry_head[0..4].try_into().unwrap());
        let len = u32::from_be_bytes(entry_head[4..8].try_into().unwrap()) as usize;
        if len > 0x10000 {
            return Err(IdentError::corrupt("implausible PKG metadata entry size"));
        }
        let data = read_vec_at(reader, at + 8, len)
            .map_err(|_| IdentError::corrupt("PKG metadata entry is truncated"))?;

        match id {
            META_CONTENT_TYPE if len >= 4 => {
                content_type = u32::from_be_bytes(data[0..4].try_into().unwrap());
            }
            META_SFO if len >= 8 => {
                let offset = u32::from_be_bytes(data[0..4].try_into().unwrap()) as u64;
                let sfo_len = u32::from_be_bytes(data[4..8].try_into().unwrap()) as usize;
                if offset < size {
                    sfo_location = Some((offset, sfo_len));
                }
            }
            _ => {}
        }
        at += 8 + len as u64;
    }

    let sfo = match sfo_location {
        Some((offset, len)) => {
            let data = read_vec_at(reader, offset, len)
                .map_err(|_| IdentError::corrupt("PKG SFO is truncated"))?;
            sfo::parse(&data).ok()
        }
        None => None,
    };

    let platform = resolve_platform(reader, pkg_type, content_type, sfo.as_ref())?;

    Ok(PkgInfo {
        platform,
        content_id,
        content_type,
        sfo,
    })
}

fn resolve_platform(
    reader: &dyn ReadAt,
    pkg_type: u16,
    content_type: u32,
    sfo: Option<&SfoInfo>,
) -> Result<Platform, IdentError> {
    if let Some(platform) = platform_from_content_type(content_type) {
        return Ok(platform);
    }

    if pkg_type == PKG_TYPE_PSP_VITA {
        // The extended header's key id separates PSP from Vita from PSM.
        let ext = read_vec_at(reader, EXT_HEADER_OFFSET, 0x28)
            .map_err(|_| IdentError::corrupt("PKG extended header is truncated"))?;
        if &ext[0..4] == EXT_MAGIC {
            let key_id = u32::from_be_bytes(ext[0x24..0x28].try_into().unwrap());
            if let Some(platform) = platform_from_key_id(key_id) {
                return Ok(platform);
            }
        }
        // Fall back to whatever the embedded SFO says.
        if let Some(sfo) = sfo {
            return Ok(sfo.platform);
        }
        return Ok(Platform::Psp);
    }

    if let Some(sfo) = sfo {
        return Ok(sfo.platform);
    }
    Ok(Platform::Ps3)
}

#[cfg(test)]
#[path = "tests/pkg_tests.rs"]
mod tests;
