//! Xbox XISO (XDVDFS) disc image identification.
//!
//! The volume descriptor sits at physical offset 0x10000; the root
//! directory is a binary tree of entries. Identification finds
//! `default.xbe` and parses it in place.

use log::debug;
use serde::Serialize;

use romident_core::{GameMeta, IdentError, Platform, ReadAt, Region, read_header, read_vec_at};

use crate::xbe::{self, XbeInfo};

/// Volume descriptor location: sector 32 of 2048-byte sectors.
const VOLUME_DESCRIPTOR_OFFSET: u64 = 32 * 2048;
const VOLUME_MAGIC: &[u8; 20] = b"MICROSOFT*XBOX*MEDIA";

const SECTOR_SIZE: u64 = 2048;

/// Directory-entry terminator in the left/right links.
const LINK_NONE: u16 = 0xFFFF;

/// Information from an XISO image.
#[derive(Debug, Clone, Serialize)]
pub struct XisoInfo {
    /// Name of the boot executable found in the root directory.
    pub boot_file: String,
    /// The parsed boot executable.
    pub xbe: XbeInfo,
}

impl GameMeta for XisoInfo {
    fn platform(&self) -> Platform {
        Platform::Xbox
    }

    fn title(&self) -> String {
        self.xbe.title.clone()
    }

    fn serial(&self) -> String {
        self.xbe.serial.clone()
    }

    fn regions(&self) -> Vec<Region> {
        self.xbe.regions()
    }
}

pub fn parse(reader: &dyn ReadAt, size: u64) -> Result<XisoInfo, IdentError> {
    let descriptor = read_header(reader, VOLUME_DESCRIPTOR_OFFSET, 0x20, "XISO descriptor")?;
    if &descriptor[0..20] != VOLUME_MAGIC {
        return Err(IdentError::invalid("missing MICROSOFT*XBOX*MEDIA magic"));
    }

    let root_sector = u32::from_le_bytes(descriptor[0x14..0x18].try_into().unwrap()) as u64;
    let root_size = u32::from_le_bytes(descriptor[0x18..0x1C].try_into().unwrap()) as usize;
    if root_size == 0 || root_size > 16 * 1024 * 1024 {
        return Err(IdentError::corrupt("implausible XISO root directory size"));
    }

    let root = read_vec_at(reader, root_sector * SECTOR_SIZE, root_size)
        .map_err(|_| IdentError::corrupt("XISO root directory is out of bounds"))?;

    let (start_sector, file_size) = find_entry(&root, "default.xbe")?
        .ok_or_else(|| IdentError::invalid("XISO has no default.xbe"))?;

    debug!("default.xbe at sector {start_sector}, {file_size} bytes");
    let xbe_offset = start_sector as u64 * SECTOR_SIZE;
    if xbe_offset >= size {
        return Err(IdentError::corrupt("default.xbe extent is out of bounds"));
    }

    let xbe = xbe::parse_at(reader, xbe_offset, file_size as u64).map_err(|e| match e {
        // A broken boot binary after a good volume descriptor is damage.
        IdentError::Invalid(msg) => IdentError::Corrupt(msg),
        other => other,
    })?;

    Ok(XisoInfo {
        boot_file: "default.xbe".to_string(),
        xbe,
    })
}

/// Walk the XDVDFS binary tree looking for `name` (case-insensitive).
/// Returns `(start_sector, file_size)`.
fn find_entry(dir: &[u8], name: &str) -> Result<Option<(u32, u32)>, IdentError> {
    let target = name.to_ascii_lowercase();
    let mut stack = vec![0usize]; // entry offsets in dwords
    let mut visited = 0usize;

    while let Some(dword_offset) = stack.pop() {
        visited += 1;
        if visited > 4096 {
            return Err(IdentError::corrupt("XISO directory tree does not terminate"));
        }

        let at = dword_offset * 4;
        let Some(entry) = dir.get(at..at + 14) else {
            return Err(IdentError::corrupt("XISO directory entry out of bounds"));
        };
        let left = u16::from_le_bytes(entry[0..2].try_into().unwrap());
        let right = u16::from_le_bytes(entry[2..4].try_into().unwrap());
        // Sector padding: an all-0xFF entry marks the end of this chunk.
        if left == LINK_NONE && right == LINK_NONE {
            continue;
        }

        let start_sector = u32::from_le_bytes(entry[4..8].try_into().unwrap());
        let file_size = u32::from_le_bytes(entry[8..12].try_into().unwrap());
        let name_len = entry[13] as usize;
        let Some(name_bytes) = dir.get(at + 14..at + 14 + name_len) else {
            return Err(IdentError::corrupt("XISO entry name out of bounds"));
        };

        let entry_name = String::from_utf8_lossy(name_bytes).to_ascii_lowercase();
        if entry_name == target {
            return Ok(Some((start_sector, file_size)));
        }

        for link in [left, right] {
            if link != 0 && link != LINK_NONE {
                stack.push(link as usize);
            }
        }
    }
    Ok(None)
}

#[cfg(test)]
#[path = "tests/xiso_tests.rs"]
mod tests;
