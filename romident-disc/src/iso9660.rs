use std::io;

use log::debug;
use romident_core::{IdentError, ReadAt};

/// Logical ISO 9660 sector size (user data only).
const LOGICAL_SECTOR_SIZE: u64 = 2048;

/// The Primary Volume Descriptor is always at logical sector 16.
const PVD_SECTOR: u64 = 16;

/// Offset of the root directory record within the PVD.
const PVD_ROOT_RECORD_OFFSET: usize = 156;

/// Physical layout of one CD sector within the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectorFormat {
    /// Bytes per physical sector in the image.
    pub sector_size: u64,
    /// Offset of the 2048 user-data bytes within each physical sector.
    pub data_offset: u64,
}

impl SectorFormat {
    /// Plain 2048-byte sectors (.iso).
    pub const COOKED: SectorFormat = SectorFormat {
        sector_size: 2048,
        data_offset: 0,
    };
    /// Raw 2352-byte MODE1 sectors: 12 sync + 4 header before user data.
    pub const MODE1_RAW: SectorFormat = SectorFormat {
        sector_size: 2352,
        data_offset: 16,
    };
    /// Raw 2352-byte MODE2 Form 1 sectors: sync + header + 8 subheader.
    pub const MODE2_RAW: SectorFormat = SectorFormat {
        sector_size: 2352,
        data_offset: 24,
    };

    pub fn name(&self) -> &'static str {
        match (self.sector_size, self.data_offset) {
            (2048, 0) => "MODE1/2048",
            (2352, 16) => "MODE1/2352",
            (2352, 24) => "MODE2/2352",
            _ => "unknown",
        }
    }
}

/// All probe candidates, tried in order.
const PROBE_FORMATS: [SectorFormat; 3] = [
    SectorFormat::COOKED,
    SectorFormat::MODE1_RAW,
    SectorFormat::MODE2_RAW,
];

/// An ISO 9660 image open for reading.
#[derive(Debug)]
pub struct IsoImage<R: ReadAt> {
    reader: R,
    size: u64,
    format: SectorFormat,
    root_extent: u32,
    root_len: u32,
}

impl<R: ReadAt> IsoImage<R> {
    /// Probe the sector format and parse the Primary Volume Descriptor.
    pub fn open(reader: R, size: u64) -> Result<IsoImage<R>, IdentError> {
        let format = probe_format(&reader)?;
        debug!("ISO 9660 image probed as {}", format.name());

        let mut image = IsoImage {
            reader,
            size,
            format,
            root_extent: 0,
            root_len: 0,
        };

        let pvd = image.read_logical_exact(PVD_SECTOR * LOGICAL_SECTOR_SIZE, 2048)?;
        if &pvd[0..6] != b"\x01CD001" {
            return Err(IdentError::invalid("missing primary volume descriptor"));
        }

        let root = &pvd[PVD_ROOT_RECORD_OFFSET..PVD_ROOT_RECORD_OFFSET + 34];
        image.root_extent = u32::from_le_bytes(root[2..6].try_into().unwrap());
        image.root_len = u32::from_le_bytes(root[10..14].try_into().unwrap());
        Ok(image)
    }

    pub fn format(&self) -> SectorFormat {
        self.format
    }

    /// The first 2048 bytes of the volume (logical sector 0), used by the
    /// Sega disc formats for their boot header.
    pub fn system_area(&self) -> Result<Vec<u8>, IdentError> {
        self.read_logical_exact(0, 2048)
    }

    /// Read a file's full contents by path. Components are separated by
    /// `/`, matched case-insensitively, with any `;version` suffix on
    /// directory entries ignored.
    pub fn read_file(&self, path: &str) -> Result<Vec<u8>, IdentError> {
        let mut extent = self.root_extent;
        let mut len = self.root_len;
        let mut is_dir = true;

        let components: Vec<&str> = path.split('/').filter(|c| !c.is_empty()).collect();
        if components.is_empty() {
            return Err(IdentError::invalid_argument("empty path"));
        }

        for (i, component) in components.iter().enumerate() {
            if !is_dir {
                return Err(IdentError::invalid(format!(
                    "'{}' is not a directory",
                    components[i - 1]
                )));
            }
            let record = self.find_in_directory(extent, len, component)?;
            extent = record.extent;
            len = record.len;
            is_dir = record.is_dir;
        }

        if is_dir {
            return Err(IdentError::invalid(format!("'{path}' is a directory")));
        }
        self.read_logical_exact(extent as u64 * LOGICAL_SECTOR_SIZE, len as usize)
            .map_err(|e| match e {
                IdentError::Invalid(_) => {
                    IdentError::corrupt(format!("'{path}' extends past the end of the image"))
                }
                other => other,
            })
    }

    /// Scan one directory extent for a name (case-insensitive, `;version`
    /// stripped).
    fn find_in_directory(
        &self,
        extent: u32,
        len: u32,
        name: &str,
    ) -> Result<DirRecord, IdentError> {
        let target = name.to_uppercase();
        let sectors = (len as u64).div_ceil(LOGICAL_SECTOR_SIZE);

        for sector_index in 0..sectors {
            let sector_offset = (extent as u64 + sector_index) * LOGICAL_SECTOR_SIZE;
            let remaining = len as u64 - sector_index * LOGICAL_SECTOR_SIZE;
            let in_sector = remaining.min(LOGICAL_SECTOR_SIZE) as usize;
            let data = self
                .read_logical_exact(sector_offset, in_sector)
                .map_err(|e| match e {
                    IdentError::Invalid(_) => {
                        IdentError::corrupt("directory extent extends past the end of the image")
                    }
                    other => other,
                })?;

            let mut pos = 0usize;
            while pos < data.len() {
                let record_len = data[pos] as usize;
                if record_len == 0 {
                    // Rest of this sector is padding; records never
                    // straddle sector boundaries.
                    break;
                }
                if pos + record_len > data.len() || record_len < 34 {
                    return Err(IdentError::corrupt("malformed ISO 9660 directory record"));
                }

                let record = &data[pos..pos + record_len];
                let id_len = record[32] as usize;
                if 33 + id_len > record_len {
                    return Err(IdentError::corrupt("directory record name out of bounds"));
                }
                let id = &record[33..33 + id_len];

                // Skip the "." and ".." pseudo entries.
                if !(id_len == 1 && (id[0] == 0x00 || id[0] == 0x01)) {
                    let id_str = String::from_utf8_lossy(id).to_uppercase();
                    let stripped = id_str.split(';').next().unwrap_or(&id_str);
                    if stripped == target {
                        return Ok(DirRecord {
                            extent: u32::from_le_bytes(record[2..6].try_into().unwrap()),
                            len: u32::from_le_bytes(record[10..14].try_into().unwrap()),
                            is_dir: record[25] & 0x02 != 0,
                        });
                    }
                }
                pos += record_len;
            }
        }

        Err(IdentError::invalid(format!("'{name}' not found")))
    }

    fn read_logical_exact(&self, offset: u64, len: usize) -> Result<Vec<u8>, IdentError> {
        let mut buf = vec![0u8; len];
        self.read_logical(offset, &mut buf).map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                IdentError::invalid("read past end of image")
            } else {
                IdentError::Io(e)
            }
        })?;
        Ok(buf)
    }

    /// Positioned read over the logical 2048-byte-per-sector view,
    /// decomposing into per-sector physical reads for raw formats.
    fn read_logical(&self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        if self.format.sector_size == LOGICAL_SECTOR_SIZE {
            return self.reader.read_exact_at(offset, buf);
        }

        let mut done = 0usize;
        while done < buf.len() {
            let pos = offset + done as u64;
            let sector = pos / LOGICAL_SECTOR_SIZE;
            let within = pos % LOGICAL_SECTOR_SIZE;
            let chunk = ((LOGICAL_SECTOR_SIZE - within) as usize).min(buf.len() - done);
            let physical = sector * self.format.sector_size + self.format.data_offset + within;
            self.reader
                .read_exact_at(physical, &mut buf[done..done + chunk])?;
            done += chunk;
        }
        Ok(())
    }

    /// Logical size of the image in bytes, derived from its physical size.
    pub fn logical_size(&self) -> u64 {
        self.size / self.format.sector_size * LOGICAL_SECTOR_SIZE
    }
}

struct DirRecord {
    extent: u32,
    len: u32,
    is_dir: bool,
}

/// Try each sector format by looking for `CD001` at the physical position
/// the PVD magic would occupy.
fn probe_format(reader: &dyn ReadAt) -> Result<SectorFormat, IdentError> {
    for format in PROBE_FORMATS {
        let magic_offset = PVD_SECTOR * format.sector_size + format.data_offset + 1;
        let mut magic = [0u8; 5];
        match reader.read_exact_at(magic_offset, &mut magic) {
            Ok(()) if &magic == b"CD001" => return Ok(format),
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {}
            Err(e) => return Err(IdentError::Io(e)),
        }
    }
    Err(IdentError::invalid("no ISO 9660 volume descriptor found"))
}

#[cfg(test)]
#[path = "tests/iso9660_tests.rs"]
mod tests;
