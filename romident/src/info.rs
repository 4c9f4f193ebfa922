//! The closed union of parser results.

use serde::Serialize;

use romident_core::{GameMeta, Platform, Region};
use romident_microsoft::xiso::XisoInfo;
use romident_microsoft::XbeInfo;
use romident_nintendo::{
    GameBoyInfo, GbaInfo, GcmInfo, N3dsInfo, N64Info, NdsInfo, NesInfo, SnesInfo,
};
use romident_sega::{DreamcastInfo, MegaDriveInfo, SaturnInfo, SegaCdInfo, SmsInfo};
use romident_sony::{PkgInfo, SfoInfo, SystemCnfInfo};

/// CHD identification wrapper: the header hashes are always available; the
/// inner info is present when the disc contents were recognized.
#[derive(Debug, Clone, Serialize)]
pub struct ChdInfo {
    /// SHA-1 of the raw (decompressed) contents, from the header.
    pub uncompressed_sha1: String,
    /// SHA-1 of the compressed file, from the header.
    pub compressed_sha1: String,
    /// Identification of the disc contents, when one succeeded.
    pub inner: Option<Box<GameInfo>>,
}

/// Typed identification result, tagged by the parser that produced it.
///
/// Consumers needing format-specific fields (e.g. CHD header hashes for
/// DAT matching) match on the variant; generic consumers use the
/// platform/title/serial accessors.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum GameInfo {
    Nes(NesInfo),
    Snes(SnesInfo),
    GameBoy(GameBoyInfo),
    Gba(GbaInfo),
    Nds(NdsInfo),
    N3ds(N3dsInfo),
    N64(N64Info),
    Gcm(GcmInfo),
    MasterSystem(SmsInfo),
    MegaDrive(MegaDriveInfo),
    SegaCd(SegaCdInfo),
    Saturn(SaturnInfo),
    Dreamcast(DreamcastInfo),
    SystemCnf(SystemCnfInfo),
    Sfo(SfoInfo),
    Pkg(PkgInfo),
    Xbe(XbeInfo),
    Xiso(XisoInfo),
    Chd(ChdInfo),
}

impl GameInfo {
    /// The capability view of this info, delegating through the CHD
    /// wrapper. `None` for a CHD whose contents went unidentified.
    fn meta(&self) -> Option<&dyn GameMeta> {
        match self {
            GameInfo::Nes(i) => Some(i),
            GameInfo::Snes(i) => Some(i),
            GameInfo::GameBoy(i) => Some(i),
            GameInfo::Gba(i) => Some(i),
            GameInfo::Nds(i) => Some(i),
            GameInfo::N3ds(i) => Some(i),
            GameInfo::N64(i) => Some(i),
            GameInfo::Gcm(i) => Some(i),
            GameInfo::MasterSystem(i) => Some(i),
            GameInfo::MegaDrive(i) => Some(i),
            GameInfo::SegaCd(i) => Some(i),
            GameInfo::Saturn(i) => Some(i),
            GameInfo::Dreamcast(i) => Some(i),
            GameInfo::SystemCnf(i) => Some(i),
            GameInfo::Sfo(i) => Some(i),
            GameInfo::Pkg(i) => Some(i),
            GameInfo::Xbe(i) => Some(i),
            GameInfo::Xiso(i) => Some(i),
            GameInfo::Chd(chd) => chd.inner.as_deref().and_then(|inner| inner.meta()),
        }
    }

    pub fn platform(&self) -> Option<Platform> {
        self.meta().map(|m| m.platform())
    }

    pub fn title(&self) -> Option<String> {
        self.meta().map(|m| m.title()).filter(|t| !t.is_empty())
    }

    pub fn serial(&self) -> Option<String> {
        self.meta().map(|m| m.serial()).filter(|s| !s.is_empty())
    }

    pub fn regions(&self) -> Vec<Region> {
        self.meta().map(|m| m.regions()).unwrap_or_default()
    }
}
