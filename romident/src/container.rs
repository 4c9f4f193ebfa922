//! Container layer: plain files, directories, and ZIP archives behind a
//! uniform entry list with per-entry random-access readers.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::debug;
use zip::CompressionMethod;
use zip::ZipArchive;

use romident_core::{HashKind, Hashes, IdentError, ReadAt};

/// One file within a container.
#[derive(Debug, Clone)]
pub struct ContainerEntry {
    /// Relative path, forward-slash normalized.
    pub name: String,
    /// Uncompressed size in bytes.
    pub size: u64,
    /// Hashes already known from archive metadata (ZIP CRC-32).
    pub hashes: Hashes,
}

/// A source of entries with random-access readers.
pub trait Container: std::fmt::Debug {
    /// The entry list, in a deterministic order.
    fn entries(&self) -> &[ContainerEntry];

    /// Open a random-access reader for a named entry.
    fn open_at(&self, name: &str) -> Result<(Box<dyn ReadAt>, u64), IdentError>;

    /// Whether entries are stored compressed (true for ZIP).
    fn compressed(&self) -> bool {
        false
    }
}

/// Open the right container for a path.
pub fn open_container(
    path: &Path,
    decompress_archives: bool,
) -> Result<Box<dyn Container>, IdentError> {
    let metadata = std::fs::metadata(path).map_err(|_| {
        IdentError::invalid_argument(format!("no such path: {}", path.display()))
    })?;

    if metadata.is_dir() {
        return Ok(Box::new(FolderContainer::open(path)?));
    }

    let is_zip = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"));
    if is_zip && decompress_archives {
        return Ok(Box::new(ZipContainer::open(path)?));
    }

    Ok(Box::new(FileContainer::open(path)?))
}

// ---------------------------------------------------------------------------
// Plain file
// ---------------------------------------------------------------------------

/// A single plain file, exposed as one synthetic entry named after its
/// basename.
#[derive(Debug)]
pub struct FileContainer {
    path: PathBuf,
    entries: [ContainerEntry; 1],
}

impl FileContainer {
    pub fn open(path: &Path) -> Result<FileContainer, IdentError> {
        let metadata = std::fs::metadata(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(FileContainer {
            path: path.to_path_buf(),
            entries: [ContainerEntry {
                name,
                size: metadata.len(),
                hashes: Hashes::new(),
            }],
        })
    }
}

impl Container for FileContainer {
    fn entries(&self) -> &[ContainerEntry] {
        &self.entries
    }

    fn open_at(&self, name: &str) -> Result<(Box<dyn ReadAt>, u64), IdentError> {
        if name != self.entries[0].name {
            return Err(IdentError::invalid_argument(format!(
                "no such entry: {name}"
            )));
        }
        let file = File::open(&self.path)?;
        Ok((Box::new(file), self.entries[0].size))
    }
}

// ---------------------------------------------------------------------------
// Folder
// ---------------------------------------------------------------------------

/// A directory tree; every regular file below the root becomes an entry
/// with its relative path. Entries are sorted by name for a deterministic
/// order.
#[derive(Debug)]
pub struct FolderContainer {
    root: PathBuf,
    entries: Vec<ContainerEntry>,
}

impl FolderContainer {
    pub fn open(root: &Path) -> Result<FolderContainer, IdentError> {
        let mut entries = Vec::new();
        walk(root, root, &mut entries)?;
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        debug!("folder container: {} entries under {}", entries.len(), root.display());
        Ok(FolderContainer {
            root: root.to_path_buf(),
            entries,
        })
    }
}

fn walk(dir: &Path, root: &Path, out: &mut Vec<ContainerEntry>) -> Result<(), IdentError> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            walk(&path, root, out)?;
        } else if file_type.is_file() {
            let relative = path.strip_prefix(root).unwrap_or(&path);
            let name = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            out.push(ContainerEntry {
                name,
                size: entry.metadata()?.len(),
                hashes: Hashes::new(),
            });
        }
    }
    Ok(())
}

impl Container for FolderContainer {
    fn entries(&self) -> &[ContainerEntry] {
        &self.entries
    }

    fn open_at(&self, name: &str) -> Result<(Box<dyn ReadAt>, u64), IdentError> {
        let entry = self
            .entries
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| IdentError::invalid_argument(format!("no such entry: {name}")))?;
        let mut path = self.root.clone();
        for component in name.split('/') {
            path.push(component);
        }
        let file = File::open(path)?;
        Ok((Box::new(file), entry.size))
    }
}

// ---------------------------------------------------------------------------
// ZIP
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ZipMethod {
    Stored,
    Deflated,
}

#[derive(Debug)]
struct ZipEntryMeta {
    name: String,
    size: u64,
    data_start: u64,
    compressed_size: u64,
    method: ZipMethod,
}

/// A ZIP archive. Directory entries are omitted; each file entry carries
/// the central directory's CRC-32 as a pre-computed hash.
#[derive(Debug)]
pub struct ZipContainer {
    path: PathBuf,
    entries: Vec<ContainerEntry>,
    meta: Vec<ZipEntryMeta>,
}

impl ZipContainer {
    pub fn open(path: &Path) -> Result<ZipContainer, IdentError> {
        let file = File::open(path)?;
        let mut archive = ZipArchive::new(file)
            .map_err(|e| IdentError::invalid(format!("unreadable ZIP archive: {e}")))?;

        let mut entries = Vec::new();
        let mut meta = Vec::new();
        for index in 0..archive.len() {
            let entry = archive
                .by_index_raw(index)
                .map_err(|e| IdentError::corrupt(format!("ZIP entry {index}: {e}")))?;
            if entry.is_dir() {
                continue;
            }

            let method = match entry.compression() {
                CompressionMethod::Stored => ZipMethod::Stored,
                CompressionMethod::Deflated => ZipMethod::Deflated,
                other => {
                    return Err(IdentError::unsupported(format!(
                        "ZIP compression method {other:?} is not supported"
                    )));
                }
            };

            let name = entry.name().replace('\\', "/");
            let mut hashes = Hashes::new();
            hashes.insert(HashKind::ZipCrc32, format!("{:08x}", entry.crc32()));

            entries.push(ContainerEntry {
                name: name.clone(),
                size: entry.size(),
                hashes,
            });
            meta.push(ZipEntryMeta {
                name,
                size: entry.size(),
                data_start: entry.data_start(),
                compressed_size: entry.compressed_size(),
                method,
            });
        }

        if entries.is_empty() {
            return Err(IdentError::invalid_argument("ZIP archive is empty"));
        }

        Ok(ZipContainer {
            path: path.to_path_buf(),
            entries,
            meta,
        })
    }
}

impl Container for ZipContainer {
    fn entries(&self) -> &[ContainerEntry] {
        &self.entries
    }

    fn open_at(&self, name: &str) -> Result<(Box<dyn ReadAt>, u64), IdentError> {
        let meta = self
            .meta
            .iter()
            .find(|m| m.name == name)
            .ok_or_else(|| IdentError::invalid_argument(format!("no such entry: {name}")))?;

        let file = File::open(&self.path)?;
        match meta.method {
            ZipMethod::Stored => Ok((
                Box::new(StoredEntryReader {
                    file,
                    data_start: meta.data_start,
                    size: meta.size,
                }),
                meta.size,
            )),
            ZipMethod::Deflated => Ok((
                Box::new(LazyZipReader::new(
                    file,
                    meta.data_start,
                    meta.compressed_size,
                    meta.size,
                )?),
                meta.size,
            )),
        }
    }

    fn compressed(&self) -> bool {
        true
    }
}

/// Stored (uncompressed) ZIP entries read straight from the archive file.
struct StoredEntryReader {
    file: File,
    data_start: u64,
    size: u64,
}

impl ReadAt for StoredEntryReader {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        if offset >= self.size {
            return Ok(0);
        }
        let want = buf.len().min((self.size - offset) as usize);
        self.file.read_at(self.data_start + offset, &mut buf[..want])
    }
}

/// Lazy random access over a DEFLATE-compressed ZIP entry.
///
/// The entry arrives as a sequential stream, but format parsers probe at
/// sparse offsets (the SNES header candidates reach 4 MB in). Decompressed
/// bytes accumulate in an append-only buffer behind a mutex, grown just
/// far enough to satisfy each read.
struct LazyZipReader {
    size: u64,
    state: Mutex<InflateState>,
}

struct InflateState {
    decoder: flate2::read::DeflateDecoder<std::io::Take<File>>,
    buffer: Vec<u8>,
    finished: bool,
}

impl LazyZipReader {
    fn new(
        mut file: File,
        data_start: u64,
        compressed_size: u64,
        size: u64,
    ) -> Result<LazyZipReader, IdentError> {
        file.seek(SeekFrom::Start(data_start))?;
        let decoder = flate2::read::DeflateDecoder::new(file.take(compressed_size));
        Ok(LazyZipReader {
            size,
            state: Mutex::new(InflateState {
                decoder,
                buffer: Vec::new(),
                finished: false,
            }),
        })
    }
}

impl ReadAt for LazyZipReader {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        if offset >= self.size {
            return Ok(0);
        }
        let end = (offset + buf.len() as u64).min(self.size) as usize;

        let mut state = self
            .state
            .lock()
            .map_err(|_| io::Error::other("ZIP inflate state poisoned"))?;
        let InflateState {
            decoder,
            buffer,
            finished,
        } = &mut *state;

        let mut chunk = [0u8; 32 * 1024];
        while buffer.len() < end && !*finished {
            let n = decoder.read(&mut chunk)?;
            if n == 0 {
                *finished = true;
                break;
            }
            buffer.extend_from_slice(&chunk[..n]);
        }

        let offset = offset as usize;
        if offset >= buffer.len() {
            return Ok(0);
        }
        let n = buf.len().min(buffer.len() - offset).min(end - offset);
        buf[..n].copy_from_slice(&buffer[offset..offset + n]);
        Ok(n)
    }
}

#[cfg(test)]
#[path = "tests/container_tests.rs"]
pub(crate) mod tests;
