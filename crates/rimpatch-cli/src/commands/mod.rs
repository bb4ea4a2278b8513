pub mod extract_defs;
pub mod migrate;
pub mod patch;
pub mod scan_mods;
pub mod schema;
