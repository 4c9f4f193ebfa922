//! Sony console format parsers.
//!
//! - SYSTEM.CNF boot configuration (PS1 / PS2 discs)
//! - PARAM.SFO key-value metadata (PSP / PS3 / Vita / PS4)
//! - PSN PKG packages (PS3 / PSP / Vita / PSM)

pub mod pkg;
pub mod sfo;
pub mod system_cnf;

pub use pkg::PkgInfo;
pub use sfo::SfoInfo;
pub use system_cnf::SystemCnfInfo;
