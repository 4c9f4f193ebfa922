//! The identification dispatcher and public entry point.

use std::path::Path;

use log::{debug, trace};
use serde::Serialize;

use romident_chd::ChdFile;
use romident_core::{Hashes, IdentError, ReadAt};
use romident_disc::IsoImage;

use crate::container::open_container;
use crate::hasher::compute_hashes;
use crate::info::{ChdInfo, GameInfo};

const DEFAULT_MAX_HASH_SIZE: i64 = 64 * 1024 * 1024;

/// Options controlling identification.
#[derive(Debug, Clone)]
pub struct IdentifyOptions {
    /// Largest file that gets stream-hashed; negative means no limit.
    pub max_hash_size: i64,
    /// Whether ZIP archives are opened as containers (false treats them as
    /// opaque files).
    pub decompress_archives: bool,
}

impl Default for IdentifyOptions {
    fn default() -> Self {
        Self {
            max_hash_size: DEFAULT_MAX_HASH_SIZE,
            decompress_archives: true,
        }
    }
}

impl IdentifyOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_hash_size(mut self, limit: i64) -> Self {
        self.max_hash_size = limit;
        self
    }

    pub fn decompress_archives(mut self, decompress: bool) -> Self {
        self.decompress_archives = decompress;
        self
    }
}

/// One identified file.
#[derive(Debug, Clone, Serialize)]
pub struct Item {
    /// Entry name (relative path within the container).
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Content hashes, lowercase hex.
    pub hashes: Hashes,
    /// Typed identification, absent when no parser recognized the file.
    pub game_info: Option<GameInfo>,
}

/// The result of identifying one path.
#[derive(Debug, Clone, Serialize)]
pub struct IdentifyResult {
    /// Absolute path that was identified.
    pub path: String,
    /// One item per contained file, in container order.
    pub items: Vec<Item>,
}

/// Identify the file, ZIP archive, or directory at `path`.
pub fn identify(
    path: impl AsRef<Path>,
    options: &IdentifyOptions,
) -> Result<IdentifyResult, IdentError> {
    let path = path.as_ref();
    let container = open_container(path, options.decompress_archives)?;
    let absolute = std::fs::canonicalize(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .to_string_lossy()
        .into_owned();

    let mut items = Vec::with_capacity(container.entries().len());
    for entry in container.entries() {
        debug!("identifying entry '{}' ({} bytes)", entry.name, entry.size);
        let (reader, size) = container.open_at(&entry.name)?;
        let game_info = identify_entry(&entry.name, &reader, size)?;

        let mut hashes = entry.hashes.clone();
        if let Some(GameInfo::Chd(chd)) = &game_info {
            hashes.insert(
                romident_core::HashKind::ChdUncompressedSha1,
                chd.uncompressed_sha1.clone(),
            );
            hashes.insert(
                romident_core::HashKind::ChdCompressedSha1,
                chd.compressed_sha1.clone(),
            );
        }

        // Stream-hash only when no format-supplied hashes exist and the
        // entry is within the size cap.
        let within_cap = options.max_hash_size < 0 || size <= options.max_hash_size as u64;
        if hashes.is_empty() && within_cap {
            hashes = compute_hashes(&reader, size)?;
        }

        items.push(Item {
            name: entry.name.clone(),
            size,
            hashes,
            game_info,
        });
    }

    Ok(IdentifyResult {
        path: absolute,
        items,
    })
}

/// Try the extension's candidate parsers in order. Parser-local rejections
/// are swallowed; structural damage and I/O failures surface.
fn identify_entry(
    name: &str,
    reader: &dyn ReadAt,
    size: u64,
) -> Result<Option<GameInfo>, IdentError> {
    let extension = Path::new(name)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase());
    let Some(extension) = extension else {
        return Ok(None);
    };
    let Some(parsers) = candidates(&extension) else {
        return Ok(None);
    };

    for parser in parsers {
        match parser(reader, size) {
            Ok(info) => {
                trace!("'{name}' identified as {:?}", info.platform());
                return Ok(Some(info));
            }
            Err(e) if e.is_invalid() => {
                debug!("'{name}': candidate rejected: {e}");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(None)
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

type ParseFn = fn(&dyn ReadAt, u64) -> Result<GameInfo, IdentError>;

/// Extension-keyed parser registry; first match wins.
static REGISTRY: &[(&str, &[ParseFn])] = &[
    ("gba", &[parse_gba]),
    ("gb", &[parse_gameboy]),
    ("gbc", &[parse_gameboy]),
    ("nds", &[parse_nds]),
    ("dsi", &[parse_nds]),
    ("ids", &[parse_nds]),
    ("3ds", &[parse_n3ds]),
    ("cci", &[parse_n3ds]),
    ("nes", &[parse_nes]),
    ("sfc", &[parse_snes]),
    ("smc", &[parse_snes]),
    ("z64", &[parse_n64]),
    ("v64", &[parse_n64]),
    ("n64", &[parse_n64]),
    ("md", &[parse_megadrive]),
    ("gen", &[parse_megadrive]),
    ("32x", &[parse_megadrive]),
    ("smd", &[parse_megadrive]),
    ("sms", &[parse_sms]),
    ("gg", &[parse_sms]),
    ("xbe", &[parse_xbe]),
    ("pkg", &[parse_pkg]),
    ("chd", &[parse_chd_chain]),
    ("rvz", &[parse_rvz]),
    ("wia", &[parse_rvz]),
    ("gcm", &[parse_gcm]),
    ("xiso", &[parse_xiso]),
    ("iso", &[parse_xiso, parse_gcm, parse_iso_chain]),
    ("bin", &[parse_iso_chain]),
];

fn candidates(extension: &str) -> Option<&'static [ParseFn]> {
    REGISTRY
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, parsers)| *parsers)
}

fn parse_nes(r: &dyn ReadAt, s: u64) -> Result<GameInfo, IdentError> {
    romident_nintendo::nes::parse(r, s).map(GameInfo::Nes)
}

fn parse_snes(r: &dyn ReadAt, s: u64) -> Result<GameInfo, IdentError> {
    romident_nintendo::snes::parse(r, s).map(GameInfo::Snes)
}

fn parse_gameboy(r: &dyn ReadAt, s: u64) -> Result<GameInfo, IdentError> {
    romident_nintendo::gameboy::parse(r, s).map(GameInfo::GameBoy)
}

fn parse_gba(r: &dyn ReadAt, s: u64) -> Result<GameInfo, IdentError> {
    romident_nintendo::gba::parse(r, s).map(GameInfo::Gba)
}

fn parse_nds(r: &dyn ReadAt, s: u64) -> Result<GameInfo, IdentError> {
    romident_nintendo::ds::parse(r, s).map(GameInfo::Nds)
}

fn parse_n3ds(r: &dyn ReadAt, s: u64) -> Result<GameInfo, IdentError> {
    romident_nintendo::n3ds::parse(r, s).map(GameInfo::N3ds)
}

fn parse_n64(r: &dyn ReadAt, s: u64) -> Result<GameInfo, IdentError> {
    romident_nintendo::n64::parse(r, s).map(GameInfo::N64)
}

fn parse_gcm(r: &dyn ReadAt, s: u64) -> Result<GameInfo, IdentError> {
    romident_nintendo::gamecube::parse(r, s).map(GameInfo::Gcm)
}

fn parse_rvz(r: &dyn ReadAt, s: u64) -> Result<GameInfo, IdentError> {
    romident_nintendo::gamecube::parse_rvz(r, s).map(GameInfo::Gcm)
}

fn parse_megadrive(r: &dyn ReadAt, s: u64) -> Result<GameInfo, IdentError> {
    romident_sega::megadrive::parse(r, s).map(GameInfo::MegaDrive)
}

fn parse_sms(r: &dyn ReadAt, s: u64) -> Result<GameInfo, IdentError> {
    romident_sega::master_system::parse(r, s).map(GameInfo::MasterSystem)
}

fn parse_xbe(r: &dyn ReadAt, s: u64) -> Result<GameInfo, IdentError> {
    romident_microsoft::xbe::parse(r, s).map(GameInfo::Xbe)
}

fn parse_xiso(r: &dyn ReadAt, s: u64) -> Result<GameInfo, IdentError> {
    romident_microsoft::xiso::parse(r, s).map(GameInfo::Xiso)
}

fn parse_pkg(r: &dyn ReadAt, s: u64) -> Result<GameInfo, IdentError> {
    romident_sony::pkg::parse(r, s).map(GameInfo::Pkg)
}

// ---------------------------------------------------------------------------
// Disc-image chains
// ---------------------------------------------------------------------------

/// ISO 9660 chain: open the image, then try the system-area and boot-file
/// parsers. A structurally valid but unrecognized ISO is a rejection, not
/// an error, so the dispatcher yields a null `game_info` for it.
fn parse_iso_chain(reader: &dyn ReadAt, size: u64) -> Result<GameInfo, IdentError> {
    let iso = IsoImage::open(reader, size)?;
    match identify_iso_contents(&iso)? {
        Some(info) => Ok(info),
        None => Err(IdentError::invalid(
            "ISO 9660 volume with no recognized boot metadata",
        )),
    }
}

/// Try the inner disc parsers against an open ISO image: Sega system-area
/// formats first, then SYSTEM.CNF, then PARAM.SFO locations. Parser-local
/// rejections fall through to the next candidate.
fn identify_iso_contents<R: ReadAt>(iso: &IsoImage<R>) -> Result<Option<GameInfo>, IdentError> {
    let area = iso.system_area()?;

    match romident_sega::sega_cd::parse(&area) {
        Ok(info) => return Ok(Some(GameInfo::SegaCd(info))),
        Err(e) if e.is_invalid() => {}
        Err(e) => return Err(e),
    }
    match romident_sega::saturn::parse(&area) {
        Ok(info) => return Ok(Some(GameInfo::Saturn(info))),
        Err(e) if e.is_invalid() => {}
        Err(e) => return Err(e),
    }
    match romident_sega::dreamcast::parse(&area) {
        Ok(info) => return Ok(Some(GameInfo::Dreamcast(info))),
        Err(e) if e.is_invalid() => {}
        Err(e) => return Err(e),
    }

    match iso.read_file("SYSTEM.CNF") {
        Ok(content) => match romident_sony::system_cnf::parse(&content) {
            Ok(info) => return Ok(Some(GameInfo::SystemCnf(info))),
            Err(e) if e.is_invalid() => {}
            Err(e) => return Err(e),
        },
        Err(e) if e.is_invalid() => {}
        Err(e) => return Err(e),
    }

    // PS3 discs keep the SFO under PS3_GAME/; handhelds under PSP_GAME/.
    for sfo_path in ["PSP_GAME/PARAM.SFO", "PS3_GAME/PARAM.SFO"] {
        match iso.read_file(sfo_path) {
            Ok(content) => match romident_sony::sfo::parse(&content) {
                Ok(info) => return Ok(Some(GameInfo::Sfo(info))),
                Err(e) if e.is_invalid() => {}
                Err(e) => return Err(e),
            },
            Err(e) if e.is_invalid() => {}
            Err(e) => return Err(e),
        }
    }

    Ok(None)
}

/// CHD chain: open the CHD, feed the first data track (or, failing that,
/// the raw logical contents) to the ISO chain, and wrap whatever comes
/// back with the header hashes.
fn parse_chd_chain(reader: &dyn ReadAt, _size: u64) -> Result<GameInfo, IdentError> {
    let chd = ChdFile::open(reader)?;
    let uncompressed_sha1 = chd.header().raw_sha1_hex();
    let compressed_sha1 = chd.header().sha1_hex();

    let tracks = chd.tracks()?;
    let mut inner = None;
    if let Some(track) = tracks.iter().find(|t| !t.info.is_audio()) {
        debug!(
            "CHD: trying track {} ({})",
            track.info.number, track.info.track_type
        );
        let track_reader = track.open();
        inner = try_iso_contents(&track_reader, track.logical_size())?;
    }
    if inner.is_none() {
        // Hard-disk images and odd layouts: try the raw logical contents.
        inner = try_iso_contents(&chd, chd.logical_size())?;
    }

    Ok(GameInfo::Chd(ChdInfo {
        uncompressed_sha1,
        compressed_sha1,
        inner: inner.map(Box::new),
    }))
}

/// ISO-chain a reader that may not hold an ISO image at all.
fn try_iso_contents(reader: &dyn ReadAt, size: u64) -> Result<Option<GameInfo>, IdentError> {
    match IsoImage::open(reader, size) {
        Ok(iso) => identify_iso_contents(&iso),
        Err(e) if e.is_invalid() => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
#[path = "tests/ident_tests.rs"]
mod tests;
