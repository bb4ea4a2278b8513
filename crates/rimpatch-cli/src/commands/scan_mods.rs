use std::path::PathBuf;

use rimpatch_services::{scan_mods, KnownMods};

use super::migrate::DEFAULT_KNOWN_MODS;
use crate::Format;

const DEFAULT_WORKSHOP_DIR: &str =
    "C:\\Program Files (x86)\\Steam\\steamapps\\workshop\\content\\294100";

pub fn run_scan_mods(
    mods_dir: Option<PathBuf>,
    out: Option<PathBuf>,
    format: Format,
) -> color_eyre::Result<()> {
    let cfg = rimpatch_config::load_config()?;
    let scfg = cfg.scan_mods.unwrap_or_default();
    let mods_dir = mods_dir
        .or_else(|| scfg.workshop_dir.map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_WORKSHOP_DIR));
    let out = out
        .or_else(|| scfg.out.map(PathBuf::from))
        .or_else(|| cfg.known_mods.map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_KNOWN_MODS));
    tracing::debug!(event = "scan_mods_args", mods_dir = ?mods_dir, out = ?out);

    let mut known = KnownMods::load_or_default(&out)?;
    known.merge(&KnownMods::with_dlcs());
    let report = scan_mods(&mods_dir, &mut known)?;
    known.to_file(&out)?;

    if format == Format::Json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    for dir in &report.skipped {
        crate::ui_warn!("no usable About.xml in {dir}");
    }
    crate::ui_ok!(
        "scanned {} mods, {} new entries, saved to {}",
        report.scanned,
        report.added,
        out.display()
    );
    Ok(())
}
