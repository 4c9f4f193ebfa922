pub mod error;
pub mod hashes;
pub mod platform;
pub mod reader;
pub mod region;
pub mod util;

pub use error::IdentError;
pub use hashes::{HashKind, Hashes};
pub use platform::{Platform, PlatformParseError};
pub use reader::{ReadAt, read_header, read_vec_at};
pub use region::Region;
pub use util::HeaderDate;

/// Capability shared by every parser's info struct.
///
/// Identification consumers (DAT matching, scrapers, output formatting) only
/// need these four accessors; format-specific fields stay on the concrete
/// structs and are reached by matching on the `GameInfo` union.
pub trait GameMeta {
    /// Platform/console this file was identified as.
    fn platform(&self) -> Platform;

    /// Title stored in the header. May be empty when the format carries none.
    fn title(&self) -> String {
        String::new()
    }

    /// Vendor serial / product number. May be empty.
    fn serial(&self) -> String {
        String::new()
    }

    /// Release regions declared by the header, mapped into the common
    /// [`Region`] hierarchy. Empty when the format does not declare any.
    fn regions(&self) -> Vec<Region> {
        Vec::new()
    }
}
