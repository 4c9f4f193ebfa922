use serde::de::{self, Deserialize, Deserializer};
use serde::{Serialize, Serializer};

/// Platform/console identifiers for all supported systems.
///
/// This enum centralizes console identity (stable string ids, display
/// names, manufacturer) in one place. The string id is part of the
/// serialized output format and must never change for an existing variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    // Nintendo
    Nes,
    Snes,
    N64,
    GameCube,
    Wii,
    WiiU,
    Switch,
    GameBoy,
    GameBoyColor,
    Gba,
    Ds,
    Dsi,
    N3ds,
    New3ds,

    // Sony
    Ps1,
    Ps2,
    Ps3,
    Ps4,
    Ps5,
    Psp,
    Vita,
    Psm,

    // Sega
    MasterSystem,
    MegaDrive,
    SegaCd,
    Sega32x,
    Saturn,
    Dreamcast,
    GameGear,

    // Microsoft
    Xbox,
    Xbox360,
    XboxOne,
    XboxSeries,
}

/// All platform variants in registration order.
const ALL_PLATFORMS: &[Platform] = &[
    Platform::Nes,
    Platform::Snes,
    Platform::N64,
    Platform::GameCube,
    Platform::Wii,
    Platform::WiiU,
    Platform::Switch,
    Platform::GameBoy,
    Platform::GameBoyColor,
    Platform::Gba,
    Platform::Ds,
    Platform::Dsi,
    Platform::N3ds,
    Platform::New3ds,
    Platform::Ps1,
    Platform::Ps2,
    Platform::Ps3,
    Platform::Ps4,
    Platform::Ps5,
    Platform::Psp,
    Platform::Vita,
    Platform::Psm,
    Platform::MasterSystem,
    Platform::MegaDrive,
    Platform::SegaCd,
    Platform::Sega32x,
    Platform::Saturn,
    Platform::Dreamcast,
    Platform::GameGear,
    Platform::Xbox,
    Platform::Xbox360,
    Platform::XboxOne,
    Platform::XboxSeries,
];

impl Platform {
    /// Stable string identifier, used in serialized output and CLI arguments.
    pub fn id(&self) -> &'static str {
        match self {
            Self::Nes => "nes",
            Self::Snes => "snes",
            Self::N64 => "n64",
            Self::GameCube => "gc",
            Self::Wii => "wii",
            Self::WiiU => "wiiu",
            Self::Switch => "switch",
            Self::GameBoy => "gb",
            Self::GameBoyColor => "gbc",
            Self::Gba => "gba",
            Self::Ds => "ds",
            Self::Dsi => "dsi",
            Self::N3ds => "3ds",
            Self::New3ds => "new3ds",
            Self::Ps1 => "ps1",
            Self::Ps2 => "ps2",
            Self::Ps3 => "ps3",
            Self::Ps4 => "ps4",
            Self::Ps5 => "ps5",
            Self::Psp => "psp",
            Self::Vita => "psvita",
            Self::Psm => "psm",
            Self::MasterSystem => "mastersystem",
            Self::MegaDrive => "megadrive",
            Self::SegaCd => "segacd",
            Self::Sega32x => "sega32x",
            Self::Saturn => "saturn",
            Self::Dreamcast => "dreamcast",
            Self::GameGear => "gamegear",
            Self::Xbox => "xbox",
            Self::Xbox360 => "xbox360",
            Self::XboxOne => "xboxone",
            Self::XboxSeries => "xboxseries",
        }
    }

    /// Full display name for the platform.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Nes => "Nintendo Entertainment System",
            Self::Snes => "Super Nintendo Entertainment System",
            Self::N64 => "Nintendo 64",
            Self::GameCube => "Nintendo GameCube",
            Self::Wii => "Nintendo Wii",
            Self::WiiU => "Nintendo Wii U",
            Self::Switch => "Nintendo Switch",
            Self::GameBoy => "Game Boy",
            Self::GameBoyColor => "Game Boy Color",
            Self::Gba => "Game Boy Advance",
            Self::Ds => "Nintendo DS",
            Self::Dsi => "Nintendo DSi",
            Self::N3ds => "Nintendo 3DS",
            Self::New3ds => "New Nintendo 3DS",
            Self::Ps1 => "Sony PlayStation",
            Self::Ps2 => "Sony PlayStation 2",
            Self::Ps3 => "Sony PlayStation 3",
            Self::Ps4 => "Sony PlayStation 4",
            Self::Ps5 => "Sony PlayStation 5",
            Self::Psp => "Sony PlayStation Portable",
            Self::Vita => "Sony PlayStation Vita",
            Self::Psm => "PlayStation Mobile",
            Self::MasterSystem => "Sega Master System",
            Self::MegaDrive => "Sega Mega Drive / Genesis",
            Self::SegaCd => "Sega CD / Mega CD",
            Self::Sega32x => "Sega 32X",
            Self::Saturn => "Sega Saturn",
            Self::Dreamcast => "Sega Dreamcast",
            Self::GameGear => "Sega Game Gear",
            Self::Xbox => "Microsoft Xbox",
            Self::Xbox360 => "Microsoft Xbox 360",
            Self::XboxOne => "Microsoft Xbox One",
            Self::XboxSeries => "Microsoft Xbox Series X|S",
        }
    }

    /// Console manufacturer.
    pub fn manufacturer(&self) -> &'static str {
        match self {
            Self::Nes
            | Self::Snes
            | Self::N64
            | Self::GameCube
            | Self::Wii
            | Self::WiiU
            | Self::Switch
            | Self::GameBoy
            | Self::GameBoyColor
            | Self::Gba
            | Self::Ds
            | Self::Dsi
            | Self::N3ds
            | Self::New3ds => "Nintendo",

            Self::Ps1
            | Self::Ps2
            | Self::Ps3
            | Self::Ps4
            | Self::Ps5
            | Self::Psp
            | Self::Vita
            | Self::Psm => "Sony",

            Self::MasterSystem
            | Self::MegaDrive
            | Self::SegaCd
            | Self::Sega32x
            | Self::Saturn
            | Self::Dreamcast
            | Self::GameGear => "Sega",

            Self::Xbox | Self::Xbox360 | Self::XboxOne | Self::XboxSeries => "Microsoft",
        }
    }

    /// All platform variants.
    pub fn all() -> &'static [Platform] {
        ALL_PLATFORMS
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl Serialize for Platform {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.id())
    }
}

impl<'de> Deserialize<'de> for Platform {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// Error returned when a string is not a known platform id.
#[derive(Debug, Clone)]
pub struct PlatformParseError(pub String);

impl std::fmt::Display for PlatformParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown platform: '{}'", self.0)
    }
}

impl std::error::Error for PlatformParseError {}

impl std::str::FromStr for Platform {
    type Err = PlatformParseError;

    /// Parse a platform from its stable id (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        for &platform in ALL_PLATFORMS {
            if platform.id() == lower {
                return Ok(platform);
            }
        }
        Err(PlatformParseError(s.to_string()))
    }
}
