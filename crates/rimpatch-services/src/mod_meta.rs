use std::path::{Path, PathBuf};

use rayon::prelude::*;
use rimpatch_core::{ModName, PackageId, RimPatchError};
use rimpatch_parsers_xml::read_mod_metadata;
use serde::Serialize;

use crate::known_mods::KnownMods;
use crate::Result;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanModsReport {
    pub scanned: usize,
    pub added: usize,
    pub skipped: Vec<String>,
}

/// Entry of `dir` whose name matches `name` ignoring ASCII case.
fn find_entry_ci(dir: &Path, name: &str) -> Option<PathBuf> {
    let exact = dir.join(name);
    if exact.exists() {
        return Some(exact);
    }
    std::fs::read_dir(dir)
        .ok()?
        .filter_map(|e| e.ok())
        .find(|e| e.file_name().to_string_lossy().eq_ignore_ascii_case(name))
        .map(|e| e.path())
}

pub fn about_file(mod_dir: &Path) -> Option<PathBuf> {
    let about = find_entry_ci(mod_dir, "About")?;
    find_entry_ci(&about, "About.xml").filter(|p| p.is_file())
}

fn read_pair(mod_dir: &Path) -> std::result::Result<(ModName, PackageId), String> {
    let path = about_file(mod_dir).ok_or_else(|| "no About/About.xml".to_string())?;
    let text = std::fs::read_to_string(&path).map_err(|e| e.to_string())?;
    let meta = read_mod_metadata(&text).map_err(|e| e.to_string())?;
    meta.complete()
        .ok_or_else(|| "name or packageId missing".to_string())
}

/// Read every mod directory under `mods_dir` and add its name/packageId to `known`.
pub fn scan_mods(mods_dir: &Path, known: &mut KnownMods) -> Result<ScanModsReport> {
    let mut dirs: Vec<PathBuf> = std::fs::read_dir(mods_dir)
        .map_err(|e| RimPatchError::io(mods_dir, e))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    dirs.sort();

    let results: Vec<_> = dirs.par_iter().map(|d| (d, read_pair(d))).collect();

    let mut report = ScanModsReport {
        scanned: dirs.len(),
        ..ScanModsReport::default()
    };
    for (dir, result) in results {
        match result {
            Ok((name, id)) => {
                if known.add(name, id) {
                    report.added += 1;
                }
            }
            Err(reason) => {
                tracing::warn!(event = "mod_meta_skipped", dir = %dir.display(), reason = %reason);
                report.skipped.push(dir.display().to_string());
            }
        }
    }
    tracing::info!(
        event = "scan_mods_done",
        scanned = report.scanned,
        added = report.added,
        skipped = report.skipped.len(),
    );
    Ok(report)
}
