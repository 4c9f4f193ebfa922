//! ISO 9660 filesystem reading over cooked and raw CD sector images.
//!
//! Handles the three sector layouts disc dumps come in (2048-byte user
//! data, raw MODE1 2352, raw MODE2 2352), probing for the volume
//! descriptor to pick one, then translating logical 2048-byte-sector
//! offsets to physical reads.

pub mod iso9660;

pub use iso9660::{IsoImage, SectorFormat};
