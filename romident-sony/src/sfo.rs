//! PARAM.SFO ("System File Object") parsing.
//!
//! A key-value table used across PSP, PS3, Vita, and PS4 titles. The
//! platform is inferred from the DISC_ID / TITLE_ID serial prefix, with
//! the `PSP2_SYSTEM_VER` key as a decisive Vita marker.

use std::collections::BTreeMap;

use serde::Serialize;

use romident_core::{GameMeta, IdentError, Platform, Region};

const MAGIC: &[u8; 4] = b"\x00PSF";

/// Entry formats in the index table.
const FMT_UTF8_SPECIAL: u16 = 0x0004;
const FMT_UTF8: u16 = 0x0204;
const FMT_U32: u16 = 0x0404;

/// A decoded SFO value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SfoValue {
    Text(String),
    Number(u32),
}

/// Information from a PARAM.SFO file.
#[derive(Debug, Clone, Serialize)]
pub struct SfoInfo {
    pub platform: Platform,
    pub title: String,
    /// DISC_ID, or TITLE_ID when no DISC_ID is present.
    pub serial: String,
    pub category: Option<String>,
    pub app_version: Option<String>,
    /// Decoded `PSP2_SYSTEM_VER`, e.g. "3.60" (Vita only).
    pub system_version: Option<String>,
    /// All decoded entries.
    pub entries: BTreeMap<String, SfoValue>,
}

impl GameMeta for SfoInfo {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn title(&self) -> String {
        self.title.clone()
    }

    fn serial(&self) -> String {
        self.serial.clone()
    }

    fn regions(&self) -> Vec<Region> {
        match region_from_serial(&self.serial) {
            Region::Unknown => Vec::new(),
            region => vec![region],
        }
    }
}

/// Serial-prefix table. The Vita set is the inclusive one (PCSE/PCSF and
/// the NP?? digital prefixes included).
fn platform_from_serial(serial: &str) -> Option<Platform> {
    match serial.get(..4)? {
        "PCSA" | "PCSB" | "PCSC" | "PCSD" | "PCSE" | "PCSF" | "PCSG" | "PCSH" | "PCSI"
        | "VCAS" | "VCJS" | "VLJM" | "VLJS" => Some(Platform::Vita),

        "NPNA" => Some(Platform::Psm),

        "CUSA" => Some(Platform::Ps4),

        "BLUS" | "BLES" | "BLJM" | "BLJS" | "BLAS" | "BLKS" | "BCUS" | "BCES" | "BCED"
        | "BCJS" | "BCAS" | "BCKS" | "NPUA" | "NPEA" | "NPJA" | "NPHA" | "NPUB" | "NPEB"
        | "NPJB" | "NPHB" => Some(Platform::Ps3),

        "ULUS" | "ULES" | "ULJM" | "ULJS" | "ULAS" | "ULKS" | "UCUS" | "UCES" | "UCJS"
        | "UCAS" | "UCKS" | "NPUF" | "NPEF" | "NPJF" | "NPUG" | "NPEG" | "NPJG" | "NPHG"
        | "NPUH" | "NPEH" | "NPJH" | "NPHH" => Some(Platform::Psp),

        _ => None,
    }
}

fn region_from_serial(serial: &str) -> Region {
    let Some(prefix) = serial.get(..4) else {
        return Region::Unknown;
    };
    match prefix {
        "PCSA" | "PCSE" => return Region::Usa,
        "PCSB" | "PCSF" => return Region::Europe,
        "PCSC" | "PCSG" | "VCJS" | "VLJM" | "VLJS" => return Region::Japan,
        "PCSD" | "PCSH" | "VCAS" => return Region::Asia,
        "CUSA" => return Region::Unknown, // CUSA is used worldwide
        _ => {}
    }
    // Classic serials encode the region in the third character.
    match serial.as_bytes()[2] {
        b'U' => Region::Usa,
        b'E' => Region::Europe,
        b'J' | b'P' => Region::Japan,
        b'A' | b'H' => Region::Asia,
        b'K' => Region::Korea,
        _ => Region::Unknown,
    }
}

fn read_cstr(data: &[u8], offset: usize) -> Option<String> {
    let rest = data.get(offset..)?;
    let end = rest.iter().position(|&b| b == 0)?;
    Some(String::from_utf8_lossy(&rest[..end]).to_string())
}

/// Parse PARAM.SFO file contents.
pub fn parse(data: &[u8]) -> Result<SfoInfo, IdentError> {
    if data.len() < 0x14 {
        return Err(IdentError::invalid("SFO too small"));
    }
    if &data[0..4] != MAGIC {
        return Err(IdentError::invalid("missing \\0PSF magic"));
    }

    let key_table = u32::from_le_bytes(data[0x08..0x0C].try_into().unwrap()) as usize;
    let data_table = u32::from_le_bytes(data[0x0C..0x10].try_into().unwrap()) as usize;
    let entry_count = u32::from_le_bytes(data[0x10..0x14].try_into().unwrap()) as usize;

    if entry_count > 4096 {
        return Err(IdentError::corrupt("implausible SFO entry count"));
    }

    let mut entries = BTreeMap::new();
    for i in 0..entry_count {
        let at = 0x14 + i * 16;
        let Some(index) = data.get(at..at + 16) else {
            return Err(IdentError::corrupt("SFO index table is truncated"));
        };
        let key_offset = u16::from_le_bytes(index[0..2].try_into().unwrap()) as usize;
        let format = u16::from_le_bytes(index[2..4].try_into().unwrap());
        let len = u32::from_le_bytes(index[4..8].try_into().unwrap()) as usize;
        let data_offset = u32::from_le_bytes(index[12..16].try_into().unwrap()) as usize;

        let Some(key) = read_cstr(data, key_table + key_offset) else {
            return Err(IdentError::corrupt("SFO key offset out of bounds"));
        };
        let Some(value_bytes) = data.get(data_table + data_offset..data_table + data_offset + len)
        else {
            return Err(IdentError::corrupt("SFO data offset out of bounds"));
        };

        let value = match format {
            FMT_U32 => {
                if len < 4 {
                    return Err(IdentError::corrupt("SFO u32 entry shorter than 4 bytes"));
                }
                SfoValue::Number(u32::from_le_bytes(value_bytes[0..4].try_into().unwrap()))
            }
            FMT_UTF8 | FMT_UTF8_SPECIAL => {
                let end = value_bytes
                    .iter()
                    .position(|&b| b == 0)
                    .unwrap_or(value_bytes.len());
                SfoValue::Text(String::from_utf8_lossy(&value_bytes[..end]).to_string())
            }
            other => {
                return Err(IdentError::corrupt(format!(
                    "unknown SFO entry format 0x{other:04X}"
                )));
            }
        };
        entries.insert(key, value);
    }

    let text = |key: &str| match entries.get(key) {
        Some(SfoValue::Text(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    };

    let title = text("TITLE").unwrap_or_default();
    let serial = text("DISC_ID").or_else(|| text("TITLE_ID")).unwrap_or_default();

    let system_version = match entries.get("PSP2_SYSTEM_VER") {
        Some(SfoValue::Number(v)) => {
            Some(format!("{:x}.{:02x}", (v >> 24) & 0xFF, (v >> 16) & 0xFF))
        }
        _ => None,
    };

    let platform = if system_version.is_some() {
        Platform::Vita
    } else {
        platform_from_serial(&serial).ok_or_else(|| {
            IdentError::invalid(format!("unrecognized SFO serial prefix '{serial}'"))
        })?
    };

    Ok(SfoInfo {
        platform,
        title,
        serial,
        category: text("CATEGORY"),
        app_version: text("APP_VER").or_else(|| text("DISC_VERSION")),
        system_version,
        entries,
    })
}

#[cfg(test)]
#[path = "tests/sfo_tests.rs"]
pub(crate) mod tests;
