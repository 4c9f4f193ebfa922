//! Microsoft Xbox format parsers.
//!
//! - XBE executables (the boot binary of every original Xbox title)
//! - XISO disc images (XDVDFS), identified through their `default.xbe`

pub mod xbe;
pub mod xiso;

pub use xbe::XbeInfo;
