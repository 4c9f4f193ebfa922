//! CHD (MAME "Compressed Hunks of Data") V5 reader.
//!
//! Supports random access over the logical contents of a V5 file: header
//! parse, compressed hunk-map decode, per-hunk codec dispatch with lazy
//! decompression and a single-hunk cache, and CD track enumeration from
//! metadata. Writing, V1-V4 files, and FLAC-compressed audio hunks are out
//! of scope.

use std::io;
use std::sync::{Arc, Mutex};

use log::{debug, trace};
use romident_core::{IdentError, ReadAt, read_vec_at};

pub mod codec;
pub mod header;
pub mod huffman;
pub mod map;
pub mod metadata;
#[cfg(test)]
pub(crate) mod testutil;

pub use codec::CD_FRAME_SIZE;
pub use header::ChdHeader;
pub use map::{HunkKind, MapEntry};
pub use metadata::{MetadataEntry, TrackInfo};

/// Hunks may reference other hunks; real files reference concrete hunks
/// directly, so a deep chain means a reference cycle.
const MAX_SELF_REF_DEPTH: u8 = 8;

struct ChdInner<R> {
    reader: R,
    header: ChdHeader,
    map: Vec<MapEntry>,
    /// Most recently decoded hunk, kept because callers overwhelmingly read
    /// sequentially within a hunk.
    cache: Mutex<Option<(u32, Vec<u8>)>>,
}

/// An open CHD file. Implements [`ReadAt`] over the logical (decompressed)
/// contents; cheap to clone for track readers.
pub struct ChdFile<R: ReadAt> {
    inner: Arc<ChdInner<R>>,
}

impl<R: ReadAt> Clone for ChdFile<R> {
    fn clone(&self) -> Self {
        ChdFile {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: ReadAt> ChdFile<R> {
    /// Open a V5 CHD: parse the header and decode the full hunk map.
    pub fn open(reader: R) -> Result<ChdFile<R>, IdentError> {
        let header = ChdHeader::parse(&reader)?;
        let map = map::read_map(&header, &reader)?;
        debug!(
            "opened CHD: {} hunks of {} bytes, {} logical bytes",
            header.total_hunks, header.hunk_bytes, header.logical_bytes
        );
        Ok(ChdFile {
            inner: Arc::new(ChdInner {
                reader,
                header,
                map,
                cache: Mutex::new(None),
            }),
        })
    }

    pub fn header(&self) -> &ChdHeader {
        &self.inner.header
    }

    /// Logical (decompressed) size in bytes.
    pub fn logical_size(&self) -> u64 {
        self.inner.header.logical_bytes
    }

    /// CD tracks described by the file's metadata. Empty for non-CD images.
    pub fn tracks(&self) -> Result<Vec<ChdTrack<R>>, IdentError> {
        let entries = metadata::read_metadata(&self.inner.reader, self.inner.header.meta_offset)?;
        let infos = metadata::parse_tracks(&entries)?;

        // Tracks are laid out back to back, each padded to a 4-frame
        // boundary within the logical data.
        let mut tracks = Vec::with_capacity(infos.len());
        let mut start_frame = 0u64;
        for info in infos {
            let frames = info.frames as u64;
            tracks.push(ChdTrack {
                info,
                start_frame,
                inner: Arc::clone(&self.inner),
            });
            start_frame += frames.div_ceil(4) * 4;
        }
        Ok(tracks)
    }
}

impl<R: ReadAt> ReadAt for ChdFile<R> {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        read_logical(&self.inner, offset, buf)
    }
}

/// A CD track within a CHD.
pub struct ChdTrack<R: ReadAt> {
    pub info: TrackInfo,
    start_frame: u64,
    inner: Arc<ChdInner<R>>,
}

impl<R: ReadAt> ChdTrack<R> {
    /// Usable data bytes in this track (frames × per-frame data size).
    pub fn logical_size(&self) -> u64 {
        self.info.frames as u64 * self.info.data_size() as u64
    }

    /// Open a reader over the track's data bytes. Each 2448-byte frame of
    /// the underlying image contributes only its data portion (2048 or 2352
    /// bytes depending on track type); sync/subcode bytes are skipped.
    pub fn open(&self) -> ChdTrackReader<R> {
        ChdTrackReader {
            inner: Arc::clone(&self.inner),
            start_frame: self.start_frame,
            data_size: self.info.data_size() as u64,
            total: self.logical_size(),
        }
    }
}

/// Random-access reader over one track's data bytes.
pub struct ChdTrackReader<R: ReadAt> {
    inner: Arc<ChdInner<R>>,
    start_frame: u64,
    data_size: u64,
    total: u64,
}

impl<R: ReadAt> ReadAt for ChdTrackReader<R> {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        if offset >= self.total {
            return Ok(0);
        }
        let want = buf.len().min((self.total - offset) as usize);
        let mut done = 0usize;
        while done < want {
            let pos = offset + done as u64;
            let frame = pos / self.data_size;
            let within = pos % self.data_size;
            let chunk = ((self.data_size - within) as usize).min(want - done);
            let physical =
                (self.start_frame + frame) * CD_FRAME_SIZE as u64 + within;
            let n = read_logical(&self.inner, physical, &mut buf[done..done + chunk])?;
            if n == 0 {
                break;
            }
            done += n;
        }
        Ok(done)
    }
}

/// Service a positioned read against the logical contents, decoding the
/// covering hunks through the single-hunk cache.
fn read_logical<R: ReadAt>(inner: &ChdInner<R>, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
    let logical = inner.header.logical_bytes;
    if offset >= logical {
        return Ok(0);
    }
    let want = buf.len().min((logical - offset) as usize);
    let hunk_bytes = inner.header.hunk_bytes as u64;

    let mut done = 0usize;
    while done < want {
        let pos = offset + done as u64;
        let hunk = (pos / hunk_bytes) as u32;
        let within = (pos % hunk_bytes) as usize;
        let chunk = (hunk_bytes as usize - within).min(want - done);

        let mut cache = inner
            .cache
            .lock()
            .map_err(|_| io::Error::other("CHD hunk cache poisoned"))?;
        let valid = matches!(*cache, Some((num, _)) if num == hunk);
        if !valid {
            let data = decode_hunk(inner, hunk, 0).map_err(io_error)?;
            *cache = Some((hunk, data));
        }
        let (_, data) = cache.as_ref().unwrap();
        buf[done..done + chunk].copy_from_slice(&data[within..within + chunk]);
        done += chunk;
    }
    Ok(done)
}

fn io_error(e: IdentError) -> io::Error {
    match e {
        IdentError::Io(io) => io,
        IdentError::Unsupported(msg) => io::Error::new(io::ErrorKind::Unsupported, msg),
        other => io::Error::new(io::ErrorKind::InvalidData, other.to_string()),
    }
}

/// Decode one hunk to its full `hunk_bytes` size.
fn decode_hunk<R: ReadAt>(inner: &ChdInner<R>, hunk: u32, depth: u8) -> Result<Vec<u8>, IdentError> {
    let entry = *inner
        .map
        .get(hunk as usize)
        .ok_or_else(|| IdentError::corrupt(format!("hunk {hunk} beyond map")))?;
    let hunk_bytes = inner.header.hunk_bytes as usize;
    trace!("decoding hunk {hunk} ({:?})", entry.kind);

    let data = match entry.kind {
        map::HunkKind::Codec(index) => {
            let tag = inner.header.compressors[index as usize];
            if tag == 0 {
                return Err(IdentError::corrupt(format!(
                    "hunk {hunk} uses empty compressor slot {index}"
                )));
            }
            let input = read_vec_at(&inner.reader, entry.offset, entry.length as usize)
                .map_err(|_| IdentError::corrupt(format!("hunk {hunk} data is truncated")))?;
            codec::decompress(tag, &input, hunk_bytes)?
        }
        map::HunkKind::Uncompressed => {
            read_vec_at(&inner.reader, entry.offset, hunk_bytes)
                .map_err(|_| IdentError::corrupt(format!("hunk {hunk} data is truncated")))?
        }
        map::HunkKind::SelfRef => {
            if depth >= MAX_SELF_REF_DEPTH {
                return Err(IdentError::corrupt("CHD self-reference cycle"));
            }
            if entry.offset >= inner.map.len() as u64 {
                return Err(IdentError::corrupt("CHD self-reference beyond map"));
            }
            return decode_hunk(inner, entry.offset as u32, depth + 1);
        }
        map::HunkKind::ParentRef => {
            return Err(IdentError::unsupported(
                "hunk references a parent CHD, which is not available",
            ));
        }
    };

    if let Some(expected) = entry.crc16 {
        let actual = map::CRC16.checksum(&data);
        if actual != expected {
            return Err(IdentError::corrupt(format!(
                "hunk {hunk} CRC-16 mismatch (stored {expected:04x}, computed {actual:04x})"
            )));
        }
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::{TAG_ZLIB, V5_HEADER_LEN, tests::build_header_bytes};
    use crate::map::tests::build_compressed_map;
    use std::io::Write;

    fn deflate(data: &[u8]) -> Vec<u8> {
        let mut encoder =
            flate2::write::DeflateEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    /// Build a two-hunk zlib CHD and read its logical contents back.
    #[test]
    fn reads_zlib_compressed_contents() {
        let hunk_bytes = 4096u32;
        let hunk0: Vec<u8> = (0..hunk_bytes).map(|i| (i % 251) as u8).collect();
        let hunk1: Vec<u8> = (0..hunk_bytes).map(|i| (i % 13) as u8).collect();
        let comp0 = deflate(&hunk0);
        let comp1 = deflate(&hunk1);

        let crc0 = map::CRC16.checksum(&hunk0);
        let crc1 = map::CRC16.checksum(&hunk1);

        // Layout: header | map | hunk data
        let map_entries = [
            (0u8, comp0.len() as u32, crc0),
            (0, comp1.len() as u32, crc1),
        ];
        // first data offset comes after the map; build map once to size it
        let probe = build_compressed_map(&map_entries, 0, hunk_bytes, 24);
        let data_offset = V5_HEADER_LEN as u64 + probe.len() as u64;
        let map_bytes = build_compressed_map(&map_entries, data_offset, hunk_bytes, 24);
        assert_eq!(map_bytes.len(), probe.len());

        let mut file = build_header_bytes(
            [TAG_ZLIB, 0, 0, 0],
            2 * hunk_bytes as u64,
            hunk_bytes,
            hunk_bytes,
            V5_HEADER_LEN as u64,
            0,
        );
        file.extend_from_slice(&map_bytes);
        file.extend_from_slice(&comp0);
        file.extend_from_slice(&comp1);

        let chd = ChdFile::open(file).unwrap();
        assert_eq!(chd.logical_size(), 2 * hunk_bytes as u64);

        let mut out = vec![0u8; 2 * hunk_bytes as usize];
        chd.read_exact_at(0, &mut out).unwrap();
        assert_eq!(&out[..hunk_bytes as usize], &hunk0[..]);
        assert_eq!(&out[hunk_bytes as usize..], &hunk1[..]);

        // Cross-hunk read
        let mut cross = vec![0u8; 100];
        chd.read_exact_at(hunk_bytes as u64 - 50, &mut cross).unwrap();
        assert_eq!(&cross[..50], &hunk0[hunk_bytes as usize - 50..]);
        assert_eq!(&cross[50..], &hunk1[..50]);

        // Reads past the logical end return 0
        let mut past = [0u8; 4];
        assert_eq!(chd.read_at(2 * hunk_bytes as u64, &mut past).unwrap(), 0);
    }

    #[test]
    fn corrupt_hunk_crc_is_fatal() {
        let hunk_bytes = 1024u32;
        let hunk0: Vec<u8> = (0..hunk_bytes).map(|i| (i % 7) as u8).collect();
        let comp0 = deflate(&hunk0);
        // wrong hunk CRC
        let entries = [(0u8, comp0.len() as u32, 0xBEEF)];
        let probe = build_compressed_map(&entries, 0, hunk_bytes, 24);
        let data_offset = V5_HEADER_LEN as u64 + probe.len() as u64;
        let map_bytes = build_compressed_map(&entries, data_offset, hunk_bytes, 24);

        let mut file = build_header_bytes(
            [TAG_ZLIB, 0, 0, 0],
            hunk_bytes as u64,
            hunk_bytes,
            hunk_bytes,
            V5_HEADER_LEN as u64,
            0,
        );
        file.extend_from_slice(&map_bytes);
        file.extend_from_slice(&comp0);

        let chd = ChdFile::open(file).unwrap();
        let mut out = vec![0u8; 16];
        let err = chd.read_at(0, &mut out).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    /// A MODE1_RAW track reader exposes 2352 data bytes per 2448-byte frame.
    #[test]
    fn track_reader_skips_subcode() {
        let frames = 8usize;
        let hunk_bytes = (frames * CD_FRAME_SIZE) as u32;

        let mut hunk = Vec::with_capacity(hunk_bytes as usize);
        for frame in 0..frames {
            hunk.extend((0..2352).map(|i| ((frame * 11 + i) % 241) as u8));
            hunk.extend(std::iter::repeat_n(0xEEu8, 96)); // subcode
        }
        let crc = map::CRC16.checksum(&hunk);
        let comp = deflate(&hunk);

        let entries = [(0u8, comp.len() as u32, crc)];
        let probe = build_compressed_map(&entries, 0, hunk_bytes, 24);

        let track_meta =
            b"TRACK:1 TYPE:MODE1_RAW SUBTYPE:NONE FRAMES:8 PREGAP:0 PGTYPE:MODE1 PGSUB:NONE POSTGAP:0\0";
        let map_offset = V5_HEADER_LEN as u64;
        let data_offset = map_offset + probe.len() as u64;
        let meta_offset = data_offset + comp.len() as u64;

        let map_bytes = build_compressed_map(&entries, data_offset, hunk_bytes, 24);

        let mut file = build_header_bytes(
            [TAG_ZLIB, 0, 0, 0],
            hunk_bytes as u64,
            hunk_bytes,
            2448,
            map_offset,
            meta_offset,
        );
        file.extend_from_slice(&map_bytes);
        file.extend_from_slice(&comp);
        // metadata entry
        file.extend_from_slice(&metadata::TAG_CHT2.to_be_bytes());
        file.push(0x01);
        file.extend_from_slice(&(track_meta.len() as u32).to_be_bytes()[1..4]);
        file.extend_from_slice(&0u64.to_be_bytes());
        file.extend_from_slice(track_meta);

        let chd = ChdFile::open(file).unwrap();
        let tracks = chd.tracks().unwrap();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].info.track_type, "MODE1_RAW");
        assert_eq!(tracks[0].logical_size(), 8 * 2352);

        let reader = tracks[0].open();
        // Read across a frame boundary: last 10 bytes of frame 0's data
        // plus first 10 bytes of frame 1's data.
        let mut buf = [0u8; 20];
        reader.read_exact_at(2352 - 10, &mut buf).unwrap();
        let expect0: Vec<u8> = (2342..2352).map(|i| ((i) % 241) as u8).collect();
        let expect1: Vec<u8> = (0..10).map(|i| ((11 + i) % 241) as u8).collect();
        assert_eq!(&buf[..10], &expect0[..]);
        assert_eq!(&buf[10..], &expect1[..]);

        // No 0xEE subcode byte can appear anywhere in the track data.
        let mut all = vec![0u8; 8 * 2352];
        reader.read_exact_at(0, &mut all).unwrap();
        assert!(all.iter().all(|&b| b != 0xEE));
    }
}
