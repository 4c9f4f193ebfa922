//! SYSTEM.CNF parsing for PS1 and PS2 discs.
//!
//! A small line-based `KEY = VALUE` file at the disc root. A `BOOT2` key
//! marks a PS2 disc; `BOOT` alone marks a PS1 disc. The disc id is the
//! boot executable's filename.

use serde::Serialize;

use romident_core::{GameMeta, IdentError, Platform, Region};

/// Information from a SYSTEM.CNF file.
#[derive(Debug, Clone, Serialize)]
pub struct SystemCnfInfo {
    pub platform: Platform,
    /// Boot path as written, e.g. `cdrom0:\SLUS_123.45;1`.
    pub boot_path: String,
    /// Executable name with the `;version` suffix stripped,
    /// e.g. "SLUS_123.45".
    pub disc_id: String,
    /// VER key, when present.
    pub version: Option<String>,
    /// VMODE key, when present.
    pub video_mode: Option<String>,
}

impl GameMeta for SystemCnfInfo {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn serial(&self) -> String {
        self.disc_id.clone()
    }

    fn regions(&self) -> Vec<Region> {
        match region_from_prefix(&self.disc_id) {
            Region::Unknown => Vec::new(),
            region => vec![region],
        }
    }
}

/// Map a disc-id prefix to its release region.
fn region_from_prefix(disc_id: &str) -> Region {
    let Some(prefix) = disc_id.get(..4) else {
        return Region::Unknown;
    };
    match prefix.to_uppercase().as_str() {
        "SLUS" | "SCUS" => Region::Usa,
        "SLPS" | "SCPS" | "SLPM" | "SCPM" | "SIPS" | "PAPX" | "PCPX" => Region::Japan,
        "SLES" | "SCES" | "SCED" => Region::Europe,
        "SLKA" | "SCKA" | "SLPK" => Region::Korea,
        "SCAJ" | "SLAJ" => Region::Asia,
        _ => Region::Unknown,
    }
}

/// Extract the filename between the last `:`, `/` or `\` separator and any
/// `;version` suffix.
fn disc_id_from_boot_path(boot_path: &str) -> String {
    let filename = boot_path
        .rsplit(|c: char| c == '\\' || c == '/' || c == ':')
        .next()
        .unwrap_or(boot_path);
    filename
        .split(';')
        .next()
        .unwrap_or(filename)
        .trim()
        .to_string()
}

/// Parse SYSTEM.CNF file contents.
pub fn parse(content: &[u8]) -> Result<SystemCnfInfo, IdentError> {
    let text = String::from_utf8_lossy(content);

    let mut boot: Option<String> = None;
    let mut boot2: Option<String> = None;
    let mut version = None;
    let mut video_mode = None;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim();
        match key.trim().to_uppercase().as_str() {
            "BOOT" => boot = Some(value.to_string()),
            "BOOT2" => boot2 = Some(value.to_string()),
            "VER" => version = Some(value.to_string()),
            "VMODE" => video_mode = Some(value.to_string()),
            _ => {}
        }
    }

    let (platform, boot_path) = match (boot2, boot) {
        (Some(path), _) => (Platform::Ps2, path),
        (None, Some(path)) => (Platform::Ps1, path),
        (None, None) => {
            return Err(IdentError::invalid("SYSTEM.CNF has no BOOT/BOOT2 key"));
        }
    };

    Ok(SystemCnfInfo {
        platform,
        disc_id: disc_id_from_boot_path(&boot_path),
        boot_path,
        version,
        video_mode,
    })
}
