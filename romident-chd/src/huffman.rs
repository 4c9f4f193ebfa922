//! Canonical Huffman decoding for the CHD hunk map and `huff` codec.
//!
//! CHD stores Huffman trees as arrays of code lengths and assigns canonical
//! codes from the longest length upward, so the numerically smallest codes
//! belong to the longest symbols. The map decoder uses a 16-symbol tree with
//! codes up to 8 bits; the `huff` hunk codec uses a 256-symbol tree with
//! codes up to 16 bits.

use bitreader::BitReader;
use romident_core::IdentError;

/// Read `n` bits MSB-first, mapping stream exhaustion to a corrupt-file
/// error (the caller has already validated the surrounding structure).
pub fn read_bits(bits: &mut BitReader, n: u8) -> Result<u32, IdentError> {
    bits.read_u32(n)
        .map_err(|_| IdentError::corrupt("bit stream exhausted"))
}

/// A canonical Huffman decoder over symbols `0..num_codes`.
#[derive(Debug)]
pub struct HuffmanDecoder {
    max_bits: u8,
    /// Per code length: number of symbols and first canonical code value.
    count: Vec<u32>,
    start: Vec<u32>,
    /// Symbols grouped by length, in index order within each group.
    by_length: Vec<Vec<u16>>,
}

impl HuffmanDecoder {
    /// Build a decoder from per-symbol code lengths (0 = absent symbol).
    ///
    /// Codes are assigned canonically starting from the longest length;
    /// symbols sharing a length receive increasing codes in index order.
    pub fn from_lengths(lengths: &[u8], max_bits: u8) -> Result<Self, IdentError> {
        debug_assert!(max_bits <= 24);

        let mut count = vec![0u32; max_bits as usize + 1];
        for &len in lengths {
            if len > max_bits {
                return Err(IdentError::corrupt("Huffman code length exceeds maximum"));
            }
            count[len as usize] += 1;
        }

        // Determine the starting code for each length, longest first. The
        // halving step fails exactly when the lengths do not describe a
        // complete prefix code.
        let mut start = vec![0u32; max_bits as usize + 1];
        let mut cur_start = 0u32;
        for len in (1..=max_bits as usize).rev() {
            let next_start = (cur_start + count[len]) >> 1;
            if len != 1 && next_start * 2 != cur_start + count[len] {
                return Err(IdentError::corrupt("inconsistent Huffman code lengths"));
            }
            start[len] = cur_start;
            cur_start = next_start;
        }

        let mut by_length: Vec<Vec<u16>> = vec![Vec::new(); max_bits as usize + 1];
        for (symbol, &len) in lengths.iter().enumerate() {
            if len > 0 {
                by_length[len as usize].push(symbol as u16);
            }
        }

        Ok(Self {
            max_bits,
            count,
            start,
            by_length,
        })
    }

    /// Import a tree in the RLE form used by the CHD map and `huff` codec.
    ///
    /// Fixed-width values are read from the stream: 0..=7 emit `value + 1`
    /// zero lengths, larger values emit one literal length of `value - 7`.
    /// The value width is the bit width of the largest literal
    /// (4 bits for 8-bit codes, 5 bits for 16-bit codes).
    pub fn from_tree_rle(
        bits: &mut BitReader,
        num_codes: usize,
        max_bits: u8,
    ) -> Result<Self, IdentError> {
        let max_value = 7u32 + max_bits as u32;
        let value_bits = (32 - max_value.leading_zeros()) as u8;

        let mut lengths = vec![0u8; num_codes];
        let mut index = 0usize;
        while index < num_codes {
            let value = read_bits(bits, value_bits)?;
            if value <= 7 {
                // run of zero lengths
                index += value as usize + 1;
                if index > num_codes {
                    return Err(IdentError::corrupt("Huffman RLE run overflows code count"));
                }
            } else if value <= max_value {
                lengths[index] = (value - 7) as u8;
                index += 1;
            } else {
                return Err(IdentError::corrupt("invalid Huffman RLE value"));
            }
        }

        Self::from_lengths(&lengths, max_bits)
    }

    /// Decode one symbol from the stream.
    pub fn decode_one(&self, bits: &mut BitReader) -> Result<u32, IdentError> {
        let mut code = 0u32;
        for len in 1..=self.max_bits as usize {
            code = (code << 1) | read_bits(bits, 1)?;
            let n = self.count[len];
            if n > 0 && code >= self.start[len] && code < self.start[len] + n {
                return Ok(self.by_length[len][(code - self.start[len]) as usize] as u32);
            }
        }
        Err(IdentError::corrupt("invalid Huffman code in stream"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::testutil::BitWriter;

    #[test]
    fn uniform_lengths_decode_as_raw_values() {
        // 16 symbols all at length 4: canonical codes equal the symbol index.
        let lengths = [4u8; 16];
        let decoder = HuffmanDecoder::from_lengths(&lengths, 8).unwrap();

        let mut w = BitWriter::new();
        w.write(0xA, 4);
        w.write(0x3, 4);
        w.write(0xF, 4);
        let data = w.finish();

        let mut bits = BitReader::new(&data);
        assert_eq!(decoder.decode_one(&mut bits).unwrap(), 0xA);
        assert_eq!(decoder.decode_one(&mut bits).unwrap(), 0x3);
        assert_eq!(decoder.decode_one(&mut bits).unwrap(), 0xF);
    }

    #[test]
    fn canonical_assignment_prefers_short_codes_high() {
        // Lengths: symbol 0 -> 1 bit, symbols 1 and 2 -> 2 bits.
        // Longest codes start at 0: sym1=00, sym2=01, sym0=1.
        let decoder = HuffmanDecoder::from_lengths(&[1, 2, 2], 8).unwrap();

        let mut w = BitWriter::new();
        w.write(0b1, 1); // sym0
        w.write(0b00, 2); // sym1
        w.write(0b01, 2); // sym2
        let data = w.finish();

        let mut bits = BitReader::new(&data);
        assert_eq!(decoder.decode_one(&mut bits).unwrap(), 0);
        assert_eq!(decoder.decode_one(&mut bits).unwrap(), 1);
        assert_eq!(decoder.decode_one(&mut bits).unwrap(), 2);
    }

    #[test]
    fn incomplete_code_set_is_rejected() {
        // Three 2-bit codes leave a quarter of the code space dangling.
        let err = HuffmanDecoder::from_lengths(&[2, 2, 2], 8).unwrap_err();
        assert!(matches!(err, IdentError::Corrupt(_)));
    }

    #[test]
    fn rle_tree_import() {
        // 16-symbol tree, max 8 bits -> 4-bit RLE values. Two symbols at
        // length 1 (a complete code), the rest absent via zero runs.
        let mut w = BitWriter::new();
        w.write(3, 4); // 4 zero lengths (symbols 0-3)
        w.write(8, 4); // symbol 4: length 1
        w.write(8, 4); // symbol 5: length 1
        w.write(7, 4); // 8 zero lengths (symbols 6-13)
        w.write(1, 4); // 2 zero lengths (symbols 14-15)
        let data = w.finish();

        let mut bits = BitReader::new(&data);
        let decoder = HuffmanDecoder::from_tree_rle(&mut bits, 16, 8).unwrap();

        // Two symbols of equal length: codes 0 and 1, tie-broken by index.
        let mut w = BitWriter::new();
        w.write(0b0, 1); // symbol 4
        w.write(0b1, 1); // symbol 5
        let data = w.finish();
        let mut bits = BitReader::new(&data);
        assert_eq!(decoder.decode_one(&mut bits).unwrap(), 4);
        assert_eq!(decoder.decode_one(&mut bits).unwrap(), 5);
    }

    #[test]
    fn rle_run_overflow_is_corrupt() {
        let mut w = BitWriter::new();
        w.write(7, 4); // 8 zeros into a 4-code tree
        let data = w.finish();
        let mut bits = BitReader::new(&data);
        let err = HuffmanDecoder::from_tree_rle(&mut bits, 4, 8).unwrap_err();
        assert!(matches!(err, IdentError::Corrupt(_)));
    }

    #[test]
    fn exhausted_stream_is_corrupt() {
        let decoder = HuffmanDecoder::from_lengths(&[1, 2, 2], 8).unwrap();
        let data: [u8; 0] = [];
        let mut bits = BitReader::new(&data);
        assert!(decoder.decode_one(&mut bits).is_err());
    }
}
