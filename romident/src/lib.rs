//! Console ROM and disc-image identification.
//!
//! One entry point, [`identify`], accepts a path to a plain file, a ZIP
//! archive, or a directory, and returns an identification record per
//! contained file: content hashes plus typed platform metadata when a
//! format parser recognizes the contents.
//!
//! ```no_run
//! let options = romident::IdentifyOptions::default();
//! let result = romident::identify("roms/game.gba", &options)?;
//! for item in &result.items {
//!     println!("{}: {:?}", item.name, item.game_info.as_ref().map(|g| g.platform()));
//! }
//! # Ok::<(), romident_core::IdentError>(())
//! ```

pub mod container;
pub mod hasher;
pub mod ident;
pub mod info;

pub use ident::{IdentifyOptions, IdentifyResult, Item, identify};
pub use info::{ChdInfo, GameInfo};

pub use romident_core::{GameMeta, HashKind, Hashes, IdentError, Platform, Region};
