//! Hunk codec dispatch.
//!
//! Every codec decompresses one hunk's input bytes to an exact expected
//! size; any short output, trailing garbage, or decoder error is fatal for
//! that hunk. DEFLATE and LZMA decoders are allocated per call, since hunks
//! are independent streams.

use std::io::Read;

use bitreader::BitReader;
use romident_core::IdentError;

use crate::header::{
    TAG_CD_FLAC, TAG_CD_LZMA, TAG_CD_ZLIB, TAG_CD_ZSTD, TAG_FLAC, TAG_HUFF, TAG_LZMA, TAG_ZLIB,
    TAG_ZSTD, tag_name,
};
use crate::huffman::HuffmanDecoder;

/// Bytes of sector data per CD frame.
pub const CD_SECTOR_DATA: usize = 2352;
/// Bytes of subchannel data per CD frame.
pub const CD_SUBCODE_DATA: usize = 96;
/// Bytes per CD frame as stored in a CHD (sector + subcode interleave).
pub const CD_FRAME_SIZE: usize = CD_SECTOR_DATA + CD_SUBCODE_DATA;

/// Decompress one hunk with the codec named by `tag`.
pub fn decompress(tag: u32, input: &[u8], output_len: usize) -> Result<Vec<u8>, IdentError> {
    match tag {
        TAG_ZLIB => inflate(input, output_len),
        TAG_LZMA => lzma_decompress(input, output_len),
        TAG_HUFF => huff_decompress(input, output_len),
        TAG_ZSTD => zstd_decompress(input, output_len),
        TAG_CD_ZLIB => cd_decompress(TAG_ZLIB, input, output_len),
        TAG_CD_LZMA => cd_decompress(TAG_LZMA, input, output_len),
        TAG_CD_ZSTD => cd_decompress(TAG_ZSTD, input, output_len),
        TAG_FLAC | TAG_CD_FLAC => Err(IdentError::unsupported(
            "FLAC not supported (audio only)",
        )),
        other => Err(IdentError::unsupported(format!(
            "unknown CHD codec '{}'",
            tag_name(other)
        ))),
    }
}

/// Raw DEFLATE (no zlib wrapper).
fn inflate(input: &[u8], output_len: usize) -> Result<Vec<u8>, IdentError> {
    let mut out = vec![0u8; output_len];
    let mut decoder = flate2::read::DeflateDecoder::new(input);
    decoder
        .read_exact(&mut out)
        .map_err(|e| IdentError::corrupt(format!("DEFLATE hunk: {e}")))?;
    Ok(out)
}

/// Dictionary size the compressor would have used for this hunk size:
/// the next power of two of the output, at least 4 KiB, 64 KiB by default.
fn lzma_dict_size(output_len: usize) -> u32 {
    if output_len == 0 {
        return 64 * 1024;
    }
    (output_len as u32).next_power_of_two().max(4 * 1024)
}

/// Raw LZMA payload. CHD strips the standard 13-byte header, so it is
/// reconstructed here: properties byte 0x5D (lc=3, lp=0, pb=2), dictionary
/// size, and the uncompressed size as u64 little-endian.
fn lzma_decompress(input: &[u8], output_len: usize) -> Result<Vec<u8>, IdentError> {
    let mut alone = Vec::with_capacity(13 + input.len());
    alone.push(0x5D);
    alone.extend_from_slice(&lzma_dict_size(output_len).to_le_bytes());
    alone.extend_from_slice(&(output_len as u64).to_le_bytes());
    alone.extend_from_slice(input);

    let mut stream = xz2::stream::Stream::new_lzma_decoder(u64::MAX)
        .map_err(|e| IdentError::corrupt(format!("LZMA init: {e}")))?;

    let mut out = Vec::with_capacity(output_len);
    let mut consumed = 0usize;
    while out.len() < output_len {
        let in_before = stream.total_in();
        let out_before = stream.total_out();
        stream
            .process_vec(&alone[consumed..], &mut out, xz2::stream::Action::Run)
            .map_err(|e| IdentError::corrupt(format!("LZMA hunk: {e}")))?;
        consumed += (stream.total_in() - in_before) as usize;
        if stream.total_in() == in_before && stream.total_out() == out_before {
            return Err(IdentError::corrupt("LZMA hunk: truncated stream"));
        }
    }
    Ok(out)
}

/// CHD Huffman codec: 256-symbol tree imported in RLE form, one coded
/// symbol per output byte.
fn huff_decompress(input: &[u8], output_len: usize) -> Result<Vec<u8>, IdentError> {
    let mut bits = BitReader::new(input);
    let decoder = HuffmanDecoder::from_tree_rle(&mut bits, 256, 16)?;
    let mut out = Vec::with_capacity(output_len);
    for _ in 0..output_len {
        out.push(decoder.decode_one(&mut bits)? as u8);
    }
    Ok(out)
}

/// Zstandard frame(s).
fn zstd_decompress(input: &[u8], output_len: usize) -> Result<Vec<u8>, IdentError> {
    let out = zstd::bulk::decompress(input, output_len)
        .map_err(|e| IdentError::corrupt(format!("zstd hunk: {e}")))?;
    if out.len() != output_len {
        return Err(IdentError::corrupt(format!(
            "zstd hunk: expected {output_len} bytes, got {}",
            out.len()
        )));
    }
    Ok(out)
}

/// CD-ROM-framed compound codec.
///
/// A hunk of `frames` CD frames is stored as
/// `ecc_bitmap[(frames+7)/8] || complen_base[2|3] || base stream || subcode
/// stream`, where the base stream decompresses to `frames * 2352` bytes of
/// sector data and the subcode stream (always DEFLATE) to `frames * 96`
/// bytes. A missing subcode stream means all-zero subcode. Output
/// re-interleaves each frame as `sector[2352] || subcode[96]`.
fn cd_decompress(base_tag: u32, input: &[u8], output_len: usize) -> Result<Vec<u8>, IdentError> {
    if output_len % CD_FRAME_SIZE != 0 {
        return Err(IdentError::corrupt(
            "CD hunk size is not a multiple of the frame size",
        ));
    }
    let frames = output_len / CD_FRAME_SIZE;
    let complen_bytes = if output_len < 65536 { 2 } else { 3 };
    let ecc_bytes = frames.div_ceil(8);
    let header_bytes = ecc_bytes + complen_bytes;

    if input.len() < header_bytes {
        return Err(IdentError::corrupt("CD hunk header is truncated"));
    }

    let mut complen_base = ((input[ecc_bytes] as usize) << 8) | input[ecc_bytes + 1] as usize;
    if complen_bytes > 2 {
        complen_base = (complen_base << 8) | input[ecc_bytes + 2] as usize;
    }
    if header_bytes + complen_base > input.len() {
        return Err(IdentError::corrupt("CD hunk base stream is truncated"));
    }

    let sectors = decompress(
        base_tag,
        &input[header_bytes..header_bytes + complen_base],
        frames * CD_SECTOR_DATA,
    )?;

    let sub_input = &input[header_bytes + complen_base..];
    let subcode = if sub_input.is_empty() {
        vec![0u8; frames * CD_SUBCODE_DATA]
    } else {
        inflate(sub_input, frames * CD_SUBCODE_DATA)?
    };

    let mut out = vec![0u8; output_len];
    for frame in 0..frames {
        let dst = &mut out[frame * CD_FRAME_SIZE..];
        dst[..CD_SECTOR_DATA]
            .copy_from_slice(&sectors[frame * CD_SECTOR_DATA..(frame + 1) * CD_SECTOR_DATA]);
        dst[CD_SECTOR_DATA..CD_FRAME_SIZE]
            .copy_from_slice(&subcode[frame * CD_SUBCODE_DATA..(frame + 1) * CD_SUBCODE_DATA]);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn deflate(data: &[u8]) -> Vec<u8> {
        let mut encoder =
            flate2::write::DeflateEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn zlib_codec_round_trip() {
        let data: Vec<u8> = (0..4096u32).map(|i| (i * 31 % 251) as u8).collect();
        let compressed = deflate(&data);
        let out = decompress(TAG_ZLIB, &compressed, data.len()).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn zlib_codec_short_stream_is_corrupt() {
        let data = vec![7u8; 1024];
        let compressed = deflate(&data);
        let err = decompress(TAG_ZLIB, &compressed, 2048).unwrap_err();
        assert!(matches!(err, IdentError::Corrupt(_)));
    }

    #[test]
    fn zstd_codec_round_trip() {
        let data: Vec<u8> = (0..4096u32).map(|i| (i % 7) as u8).collect();
        let compressed = zstd::bulk::compress(&data, 3).unwrap();
        let out = decompress(TAG_ZSTD, &compressed, data.len()).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn lzma_codec_round_trip() {
        let data: Vec<u8> = (0..4096u32).map(|i| (i * 13 % 101) as u8).collect();

        // Encode in .lzma "alone" format, then strip the 13-byte header the
        // way CHD stores the payload.
        let options = xz2::stream::LzmaOptions::new_preset(6).unwrap();
        let mut stream = xz2::stream::Stream::new_lzma_encoder(&options).unwrap();
        let mut encoded = Vec::with_capacity(data.len() + 1024);
        stream
            .process_vec(&data, &mut encoded, xz2::stream::Action::Run)
            .unwrap();
        loop {
            let status = stream
                .process_vec(&[], &mut encoded, xz2::stream::Action::Finish)
                .unwrap();
            if status == xz2::stream::Status::StreamEnd {
                break;
            }
        }

        let out = decompress(TAG_LZMA, &encoded[13..], data.len()).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn huff_codec_decodes_flat_tree() {
        use crate::testutil::BitWriter;

        // 256-symbol tree with every symbol at length 8: codes equal the
        // byte value, so the "compressed" stream is the plain data.
        let mut w = BitWriter::new();
        for _ in 0..256 {
            w.write(15, 5); // literal length 8
        }
        let data = [0x00u8, 0x7F, 0xFF, 0x42];
        for &b in &data {
            w.write(b as u32, 8);
        }
        let input = w.finish();

        let out = decompress(TAG_HUFF, &input, data.len()).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn flac_is_unsupported() {
        let err = decompress(TAG_FLAC, &[], 1024).unwrap_err();
        assert!(matches!(err, IdentError::Unsupported(_)));
        let err = decompress(TAG_CD_FLAC, &[], 1024).unwrap_err();
        assert!(matches!(err, IdentError::Unsupported(_)));
    }

    #[test]
    fn unknown_tag_is_unsupported() {
        let err = decompress(crate::header::make_tag(b"avhu"), &[], 16).unwrap_err();
        assert!(matches!(err, IdentError::Unsupported(_)));
    }

    fn build_cd_hunk(frames: usize, with_subcode: bool) -> (Vec<u8>, Vec<u8>) {
        let mut sectors = Vec::new();
        let mut subcode = Vec::new();
        for frame in 0..frames {
            sectors.extend((0..CD_SECTOR_DATA).map(|i| ((frame * 7 + i) % 251) as u8));
            if with_subcode {
                subcode.extend((0..CD_SUBCODE_DATA).map(|i| ((frame * 3 + i) % 97) as u8));
            } else {
                subcode.extend(std::iter::repeat_n(0u8, CD_SUBCODE_DATA));
            }
        }

        let base = deflate(&sectors);
        let ecc_bytes = frames.div_ceil(8);
        let mut input = vec![0u8; ecc_bytes];
        input.extend_from_slice(&(base.len() as u16).to_be_bytes());
        input.extend_from_slice(&base);
        if with_subcode {
            input.extend_from_slice(&deflate(&subcode));
        }

        let mut expected = Vec::new();
        for frame in 0..frames {
            expected.extend_from_slice(
                &sectors[frame * CD_SECTOR_DATA..(frame + 1) * CD_SECTOR_DATA],
            );
            expected.extend_from_slice(
                &subcode[frame * CD_SUBCODE_DATA..(frame + 1) * CD_SUBCODE_DATA],
            );
        }
        (input, expected)
    }

    #[test]
    fn cd_zlib_reassembles_frames() {
        let frames = 8;
        let (input, expected) = build_cd_hunk(frames, true);
        let out = decompress(TAG_CD_ZLIB, &input, frames * CD_FRAME_SIZE).unwrap();
        assert_eq!(out, expected);
    }

    #[test]
    fn cd_zlib_missing_subcode_is_zero() {
        let frames = 4;
        let (input, expected) = build_cd_hunk(frames, false);
        let out = decompress(TAG_CD_ZLIB, &input, frames * CD_FRAME_SIZE).unwrap();
        assert_eq!(out, expected);
    }

    #[test]
    fn cd_hunk_truncated_base_is_corrupt() {
        let frames = 4;
        let (mut input, _) = build_cd_hunk(frames, true);
        input.truncate(4);
        let err = decompress(TAG_CD_ZLIB, &input, frames * CD_FRAME_SIZE).unwrap_err();
        assert!(matches!(err, IdentError::Corrupt(_)));
    }

    #[test]
    fn lzma_dict_size_bounds() {
        assert_eq!(lzma_dict_size(0), 64 * 1024);
        assert_eq!(lzma_dict_size(100), 4 * 1024);
        assert_eq!(lzma_dict_size(4096), 4096);
        assert_eq!(lzma_dict_size(19584), 32768);
    }
}
