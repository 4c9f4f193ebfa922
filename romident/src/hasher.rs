//! Streaming content hashing.

use sha1::Digest;

use romident_core::{HashKind, Hashes, IdentError, ReadAt};

const CHUNK_SIZE: usize = 64 * 1024;

/// Compute SHA-1, MD5, and CRC-32 in a single pass from offset 0 to
/// `size`, reading in 64 KB chunks.
pub fn compute_hashes(reader: &dyn ReadAt, size: u64) -> Result<Hashes, IdentError> {
    let mut crc = crc32fast::Hasher::new();
    let mut sha = sha1::Sha1::new();
    let mut md5_ctx = md5::Context::new();

    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut offset = 0u64;
    while offset < size {
        let want = ((size - offset) as usize).min(CHUNK_SIZE);
        reader.read_exact_at(offset, &mut buf[..want])?;
        crc.update(&buf[..want]);
        sha.update(&buf[..want]);
        md5_ctx.consume(&buf[..want]);
        offset += want as u64;
    }

    let mut hashes = Hashes::new();
    hashes.insert(HashKind::Crc32, format!("{:08x}", crc.finalize()));
    hashes.insert(HashKind::Sha1, format!("{:x}", sha.finalize()));
    hashes.insert(HashKind::Md5, format!("{:x}", md5_ctx.compute()));
    Ok(hashes)
}
