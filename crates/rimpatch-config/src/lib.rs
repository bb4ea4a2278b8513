use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "rimpatch.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RimPatchConfig {
    pub known_mods: Option<String>,
    pub issues_file: Option<String>,
    pub load_folders_file: Option<String>,
    pub mixed_defs_file: Option<String>,
    pub migrate: Option<MigrateCfg>,
    pub scan_mods: Option<ScanModsCfg>,
    pub schema: Option<SchemaCfg>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MigrateCfg {
    pub dest: Option<String>,
    pub skip_dirs: Option<Vec<String>>,
    pub load_folder_prefix: Option<String>,
    pub overwrite: Option<bool>,
    pub delete_source: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScanModsCfg {
    pub workshop_dir: Option<String>,
    pub out: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchemaCfg {
    pub out_dir: Option<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("{path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Config files in lookup order: CWD first, then the user config dir.
pub fn config_paths() -> Vec<PathBuf> {
    let mut out = Vec::new();
    if let Ok(p) = std::env::current_dir() {
        out.push(p.join(CONFIG_FILE));
    }
    if let Some(base) = dirs::config_dir() {
        out.push(base.join("rimpatch").join(CONFIG_FILE));
    }
    out
}

pub fn load_config() -> Result<RimPatchConfig, ConfigError> {
    load_config_from(&config_paths())
}

/// Merge every readable file in `paths`; earlier files win field by field.
pub fn load_config_from(paths: &[PathBuf]) -> Result<RimPatchConfig, ConfigError> {
    let mut merged = RimPatchConfig::default();
    for path in paths {
        if let Some(cfg) = read_one(path)? {
            merged = merge(merged, cfg);
        }
    }
    Ok(merged)
}

fn read_one(path: &Path) -> Result<Option<RimPatchConfig>, ConfigError> {
    let Ok(s) = std::fs::read_to_string(path) else {
        return Ok(None);
    };
    toml::from_str::<RimPatchConfig>(&s)
        .map(Some)
        .map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

fn merge(mut a: RimPatchConfig, b: RimPatchConfig) -> RimPatchConfig {
    if a.known_mods.is_none() {
        a.known_mods = b.known_mods;
    }
    if a.issues_file.is_none() {
        a.issues_file = b.issues_file;
    }
    if a.load_folders_file.is_none() {
        a.load_folders_file = b.load_folders_file;
    }
    if a.mixed_defs_file.is_none() {
        a.mixed_defs_file = b.mixed_defs_file;
    }
    a.migrate = merge_opt(a.migrate, b.migrate, merge_migrate);
    a.scan_mods = merge_opt(a.scan_mods, b.scan_mods, merge_scan_mods);
    a.schema = merge_opt(a.schema, b.schema, merge_schema);
    a
}

fn merge_opt<T>(a: Option<T>, b: Option<T>, f: fn(T, T) -> T) -> Option<T> {
    match (a, b) {
        (Some(a), Some(b)) => Some(f(a, b)),
        (None, Some(b)) => Some(b),
        (Some(a), None) => Some(a),
        (None, None) => None,
    }
}

fn merge_migrate(mut a: MigrateCfg, b: MigrateCfg) -> MigrateCfg {
    if a.dest.is_none() {
        a.dest = b.dest;
    }
    if a.skip_dirs.is_none() {
        a.skip_dirs = b.skip_dirs;
    }
    if a.load_folder_prefix.is_none() {
        a.load_folder_prefix = b.load_folder_prefix;
    }
    if a.overwrite.is_none() {
        a.overwrite = b.overwrite;
    }
    if a.delete_source.is_none() {
        a.delete_source = b.delete_source;
    }
    a
}
fn merge_scan_mods(mut a: ScanModsCfg, b: ScanModsCfg) -> ScanModsCfg {
    if a.workshop_dir.is_none() {
        a.workshop_dir = b.workshop_dir;
    }
    if a.out.is_none() {
        a.out = b.out;
    }
    a
}
fn merge_schema(mut a: SchemaCfg, b: SchemaCfg) -> SchemaCfg {
    if a.out_dir.is_none() {
        a.out_dir = b.out_dir;
    }
    a
}
