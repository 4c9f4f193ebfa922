//! Nintendo console format parsers.
//!
//! One module per format family:
//!
//! - NES (iNES / NES 2.0)
//! - SNES (LoROM / HiROM / ExHiROM, copier headers)
//! - Game Boy / Game Boy Color
//! - Game Boy Advance
//! - Nintendo DS / DSi
//! - Nintendo 3DS (NCSD/NCCH)
//! - Nintendo 64 (z64 / v64 / n64 byte orders)
//! - GameCube / Wii disc headers (GCM) and RVZ/WIA containers

pub mod ds;
pub mod gameboy;
pub mod gamecube;
pub mod gba;
pub mod n3ds;
pub mod n64;
pub(crate) mod n64_byteorder;
pub mod nes;
pub mod snes;

pub use ds::NdsInfo;
pub use gameboy::GameBoyInfo;
pub use gamecube::GcmInfo;
pub use gba::GbaInfo;
pub use n3ds::N3dsInfo;
pub use n64::N64Info;
pub use nes::NesInfo;
pub use snes::SnesInfo;
