use chrono::NaiveDate;
use serde::{Serialize, Serializer};

/// Read an ASCII string from a byte slice.
///
/// Stops at the first zero byte or any other non-printable byte (outside
/// 0x20–0x7E), then strips trailing spaces.
pub fn read_ascii(buf: &[u8]) -> String {
    let mut s = String::with_capacity(buf.len());
    for &b in buf {
        if !(0x20..0x7F).contains(&b) {
            break;
        }
        s.push(b as char);
    }
    s.trim_end_matches(' ').to_string()
}

/// Read a fixed-length ASCII string from a byte slice.
///
/// Non-printable bytes are replaced with spaces, then the result is trimmed.
/// Unlike [`read_ascii`], this does NOT stop at null bytes, which is useful for ROM
/// headers where fields are padded with 0x00 or 0xFF rather than
/// null-terminated.
pub fn read_ascii_fixed(buf: &[u8]) -> String {
    let s: String = buf
        .iter()
        .map(|&b| {
            if (0x20..0x7F).contains(&b) {
                b as char
            } else {
                ' '
            }
        })
        .collect();
    s.trim().to_string()
}

/// Read a Shift-JIS string from a byte slice, used for Sega domestic titles.
///
/// Stops at the first zero byte. Falls back to [`read_ascii`] when the bytes
/// are not valid Shift-JIS.
pub fn read_shift_jis(buf: &[u8]) -> String {
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    let (decoded, _, had_errors) = encoding_rs::SHIFT_JIS.decode(&buf[..end]);
    if had_errors {
        return read_ascii(buf);
    }
    decoded.trim_end_matches(' ').trim_end().to_string()
}

/// A date read from a ROM/disc header, usually in `YYYYMMDD` form.
///
/// Headers frequently carry blank or garbage date fields; any parse failure
/// yields the zero date, distinguishable via [`HeaderDate::is_zero`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeaderDate(Option<NaiveDate>);

impl HeaderDate {
    /// The zero (absent/unparseable) date.
    pub const ZERO: HeaderDate = HeaderDate(None);

    /// Parse a `YYYYMMDD` string. Returns the zero date on any failure.
    pub fn parse_yyyymmdd(s: &str) -> HeaderDate {
        let s = s.trim();
        if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Self::ZERO;
        }
        let year: i32 = match s[0..4].parse() {
            Ok(y) => y,
            Err(_) => return Self::ZERO,
        };
        let month: u32 = match s[4..6].parse() {
            Ok(m) => m,
            Err(_) => return Self::ZERO,
        };
        let day: u32 = match s[6..8].parse() {
            Ok(d) => d,
            Err(_) => return Self::ZERO,
        };
        HeaderDate(NaiveDate::from_ymd_opt(year, month, day))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_none()
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.0
    }
}

impl std::fmt::Display for HeaderDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            None => Ok(()),
        }
    }
}

impl Serialize for HeaderDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Some(date) => serializer.serialize_str(&date.format("%Y-%m-%d").to_string()),
            None => serializer.serialize_none(),
        }
    }
}
