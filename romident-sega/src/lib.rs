//! Sega console format parsers.
//!
//! - Master System / Game Gear ("TMR SEGA" header)
//! - Mega Drive / Genesis, including SMD-interleaved dumps and 32X
//! - Sega CD (disc system area)
//! - Saturn (disc system area)
//! - Dreamcast (disc system area)

pub mod dreamcast;
pub mod master_system;
pub mod megadrive;
pub mod saturn;
pub mod sega_cd;

pub use dreamcast::DreamcastInfo;
pub use master_system::SmsInfo;
pub use megadrive::MegaDriveInfo;
pub use saturn::SaturnInfo;
pub use sega_cd::SegaCdInfo;
