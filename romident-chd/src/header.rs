//! CHD V5 header parsing.

use romident_core::{IdentError, ReadAt, read_header};

/// Magic tag at offset 0 of every CHD file.
pub const CHD_MAGIC: &[u8; 8] = b"MComprHD";

/// Length of a V5 header. Earlier versions used other lengths.
pub const V5_HEADER_LEN: u32 = 124;

/// Build a FourCC codec tag from its ASCII spelling.
pub const fn make_tag(tag: &[u8; 4]) -> u32 {
    u32::from_be_bytes(*tag)
}

pub const TAG_ZLIB: u32 = make_tag(b"zlib");
pub const TAG_LZMA: u32 = make_tag(b"lzma");
pub const TAG_HUFF: u32 = make_tag(b"huff");
pub const TAG_ZSTD: u32 = make_tag(b"zstd");
pub const TAG_FLAC: u32 = make_tag(b"flac");
pub const TAG_CD_ZLIB: u32 = make_tag(b"cdzl");
pub const TAG_CD_LZMA: u32 = make_tag(b"cdlz");
pub const TAG_CD_ZSTD: u32 = make_tag(b"cdzs");
pub const TAG_CD_FLAC: u32 = make_tag(b"cdfl");

/// Render a codec tag for error messages ("zlib", "0x00000000").
pub fn tag_name(tag: u32) -> String {
    let bytes = tag.to_be_bytes();
    if bytes.iter().all(|b| b.is_ascii_graphic()) {
        bytes.iter().map(|&b| b as char).collect()
    } else {
        format!("0x{tag:08X}")
    }
}

/// Parsed CHD V5 header (124 bytes at offset 0).
#[derive(Debug, Clone)]
pub struct ChdHeader {
    /// Up to four codec FourCCs; 0 marks an unused slot. An all-zero table
    /// means the file is uncompressed.
    pub compressors: [u32; 4],
    /// Logical (decompressed) size of the contents in bytes.
    pub logical_bytes: u64,
    /// Offset of the hunk map.
    pub map_offset: u64,
    /// Offset of the first metadata entry, 0 if none.
    pub meta_offset: u64,
    /// Bytes per hunk.
    pub hunk_bytes: u32,
    /// Bytes per unit (e.g. 2448 for CD frames, 512 for hard disks).
    pub unit_bytes: u32,
    /// SHA-1 of the raw (decompressed) contents.
    pub raw_sha1: [u8; 20],
    /// SHA-1 of the compressed contents and map.
    pub sha1: [u8; 20],
    /// SHA-1 of the parent file's raw contents, all zero if standalone.
    pub parent_sha1: [u8; 20],
    /// Total hunk count, derived from `logical_bytes / hunk_bytes`.
    pub total_hunks: u32,
}

impl ChdHeader {
    /// Read and validate the V5 header at offset 0.
    pub fn parse(reader: &dyn ReadAt) -> Result<ChdHeader, IdentError> {
        let buf = read_header(reader, 0, V5_HEADER_LEN as usize, "CHD header")?;

        if &buf[0..8] != CHD_MAGIC {
            return Err(IdentError::invalid("missing MComprHD magic"));
        }

        let length = u32::from_be_bytes([buf[8], buf[9], buf[10], buf[11]]);
        let version = u32::from_be_bytes([buf[12], buf[13], buf[14], buf[15]]);
        if version != 5 {
            return Err(IdentError::unsupported(format!(
                "CHD version {version} (only V5 is supported)"
            )));
        }
        if length != V5_HEADER_LEN {
            return Err(IdentError::corrupt(format!(
                "CHD V5 header length {length}, expected {V5_HEADER_LEN}"
            )));
        }

        let mut compressors = [0u32; 4];
        for (i, c) in compressors.iter_mut().enumerate() {
            let at = 16 + i * 4;
            *c = u32::from_be_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]]);
        }

        let logical_bytes = u64::from_be_bytes(buf[32..40].try_into().unwrap());
        let map_offset = u64::from_be_bytes(buf[40..48].try_into().unwrap());
        let meta_offset = u64::from_be_bytes(buf[48..56].try_into().unwrap());
        let hunk_bytes = u32::from_be_bytes(buf[56..60].try_into().unwrap());
        let unit_bytes = u32::from_be_bytes(buf[60..64].try_into().unwrap());

        if hunk_bytes == 0 || unit_bytes == 0 {
            return Err(IdentError::corrupt("CHD hunk or unit size is zero"));
        }
        if logical_bytes % unit_bytes as u64 != 0 || hunk_bytes % unit_bytes != 0 {
            return Err(IdentError::corrupt(
                "CHD logical/hunk sizes are not multiples of the unit size",
            ));
        }

        let mut raw_sha1 = [0u8; 20];
        let mut sha1 = [0u8; 20];
        let mut parent_sha1 = [0u8; 20];
        raw_sha1.copy_from_slice(&buf[64..84]);
        sha1.copy_from_slice(&buf[84..104]);
        parent_sha1.copy_from_slice(&buf[104..124]);

        let total_hunks = logical_bytes.div_ceil(hunk_bytes as u64) as u32;

        Ok(ChdHeader {
            compressors,
            logical_bytes,
            map_offset,
            meta_offset,
            hunk_bytes,
            unit_bytes,
            raw_sha1,
            sha1,
            parent_sha1,
            total_hunks,
        })
    }

    /// Whether hunks are stored through codecs (an all-zero compressor
    /// table marks a fully uncompressed file).
    pub fn is_compressed(&self) -> bool {
        self.compressors[0] != 0
    }

    /// Whether this file requires a parent CHD to resolve hunks.
    pub fn has_parent(&self) -> bool {
        self.parent_sha1.iter().any(|&b| b != 0)
    }

    /// SHA-1 of the raw contents as lowercase hex.
    pub fn raw_sha1_hex(&self) -> String {
        hex::encode(self.raw_sha1)
    }

    /// SHA-1 of the compressed file as lowercase hex.
    pub fn sha1_hex(&self) -> String {
        hex::encode(self.sha1)
    }
}
