//! Orchestration layer: rewriting, classification and migration.
//! The CLI only talks to this crate.

pub mod classify;
pub mod defs;
pub mod extract;
pub mod known_mods;
pub mod load_folders;
pub mod migrate;
pub mod mod_meta;
pub mod patcher;
pub mod util;

pub use rimpatch_core::{ModName, ModSet, ModSetCollection, PackageId, Result, RimPatchError};

pub use classify::{classify_dir, Classification, FileModSets};
pub use defs::{extract_defs, ExtractDefsReport};
pub use extract::extract_mod_sets;
pub use known_mods::KnownMods;
pub use migrate::{migrate, MigrateOptions};
pub use mod_meta::{scan_mods, ScanModsReport};
pub use patcher::{patch_dir, patch_document, patch_xml, PatchDirReport};
