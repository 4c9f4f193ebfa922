//! Nintendo 3DS cartridge image parsing (NCSD container, NCCH partition).

use serde::Serialize;

use romident_core::util::read_ascii;
use romident_core::{GameMeta, IdentError, Platform, ReadAt, Region, read_header, read_vec_at};

/// NCSD media units are 0x200 bytes.
const MEDIA_UNIT: u64 = 0x200;

const NCSD_MAGIC_OFFSET: u64 = 0x100;
const NCCH_MAGIC_OFFSET: u64 = 0x100;
const PARTITION_TABLE_OFFSET: usize = 0x120;
const PARTITION_COUNT: usize = 8;

/// Information from a 3DS NCSD/NCCH image.
#[derive(Debug, Clone, Serialize)]
pub struct N3dsInfo {
    /// Product code from the first NCCH, e.g. "CTR-P-ALGE".
    pub product_code: String,
    /// Title id of the first NCCH partition.
    pub title_id: u64,
    /// Declared image size in bytes.
    pub image_size: u64,
    /// Partitions whose extents fall inside the image.
    pub partition_count: u32,
    /// Set when the NCCH is flagged New-3DS exclusive.
    pub new3ds_exclusive: bool,
    pub region: Region,
}

impl GameMeta for N3dsInfo {
    fn platform(&self) -> Platform {
        if self.new3ds_exclusive {
            Platform::New3ds
        } else {
            Platform::N3ds
        }
    }

    fn serial(&self) -> String {
        self.product_code.clone()
    }

    fn regions(&self) -> Vec<Region> {
        if self.region == Region::Unknown {
            Vec::new()
        } else {
            vec![self.region]
        }
    }
}

/// Region letter is the final character of the game-code segment of the
/// product code ("CTR-P-ALGE" -> 'E').
fn region_from_product_code(code: &str) -> Region {
    let game_code = code.split('-').nth(2).unwrap_or("");
    match game_code.as_bytes().get(3) {
        Some(b'J') => Region::Japan,
        Some(b'E') => Region::Usa,
        Some(b'P') => Region::Europe,
        Some(b'K') => Region::Korea,
        Some(b'C') => Region::China,
        Some(b'T') => Region::Taiwan,
        Some(b'A') => Region::World,
        _ => Region::Unknown,
    }
}

pub fn parse(reader: &dyn ReadAt, size: u64) -> Result<N3dsInfo, IdentError> {
    let ncsd = read_header(reader, 0, 0x160, "NCSD header")?;

    if &ncsd[NCSD_MAGIC_OFFSET as usize..NCSD_MAGIC_OFFSET as usize + 4] != b"NCSD" {
        return Err(IdentError::invalid("missing NCSD magic at 0x100"));
    }

    let image_units = u32::from_le_bytes(ncsd[0x104..0x108].try_into().unwrap()) as u64;
    let image_size = image_units * MEDIA_UNIT;

    // Partition table: 8 pairs of (offset, length) in media units.
    // Entries falling outside the file or the declared image size are
    // excluded from the count; the first partition must be valid.
    let mut partition_count = 0u32;
    let mut first: Option<(u64, u64)> = None;
    for i in 0..PARTITION_COUNT {
        let at = PARTITION_TABLE_OFFSET + i * 8;
        let offset = u32::from_le_bytes(ncsd[at..at + 4].try_into().unwrap()) as u64;
        let length = u32::from_le_bytes(ncsd[at + 4..at + 8].try_into().unwrap()) as u64;
        if offset == 0 && length == 0 {
            continue;
        }
        let start = offset * MEDIA_UNIT;
        let end = (offset + length) * MEDIA_UNIT;
        let in_bounds = start < size && end <= image_size;
        if in_bounds {
            partition_count += 1;
            if i == 0 {
                first = Some((start, end));
            }
        } else if i == 0 {
            return Err(IdentError::invalid("3DS partition 0 is out of bounds"));
        }
    }

    let Some((ncch_base, _)) = first else {
        return Err(IdentError::invalid("3DS image has no partition 0"));
    };

    // NCCH header of partition 0.
    let ncch = read_vec_at(reader, ncch_base, 0x200)
        .map_err(|_| IdentError::invalid("3DS partition 0 is truncated"))?;
    if &ncch[NCCH_MAGIC_OFFSET as usize..NCCH_MAGIC_OFFSET as usize + 4] != b"NCCH" {
        return Err(IdentError::invalid("missing NCCH magic in partition 0"));
    }

    let title_id = u64::from_le_bytes(ncch[0x108..0x110].try_into().unwrap());
    let product_code = read_ascii(&ncch[0x150..0x160]);
    let new3ds_exclusive = ncch[0x188 + 4] & 0x02 != 0;

    Ok(N3dsInfo {
        region: region_from_product_code(&product_code),
        product_code,
        title_id,
        image_size,
        partition_count,
        new3ds_exclusive,
    })
}

#[cfg(test)]
#[path = "tests/n3ds_tests.rs"]
mod tests;
