use std::path::PathBuf;

use color_eyre::eyre::{bail, WrapErr};
use rimpatch_domain::DirOutcome;
use rimpatch_services::{load_folders::DEFAULT_PREFIX, migrate, KnownMods, MigrateOptions};

use crate::Format;

pub const DEFAULT_KNOWN_MODS: &str = "known-mods.json";
pub const DEFAULT_ISSUES_FILE: &str = "issues.json";
pub const DEFAULT_LOAD_FOLDERS_FILE: &str = "load-folders-records.xml";

#[derive(Debug)]
pub struct MigrateArgs {
    pub src: PathBuf,
    pub dest: Option<PathBuf>,
    pub known_mods: Option<PathBuf>,
    pub skip_dirs: Vec<String>,
    pub prefix: Option<String>,
    pub overwrite: bool,
    pub delete_source: bool,
    pub issues_file: Option<PathBuf>,
    pub load_folders_file: Option<PathBuf>,
    pub format: Format,
}

pub fn run_migrate(args: MigrateArgs) -> color_eyre::Result<()> {
    tracing::debug!(event = "migrate_args", args = ?args);
    let cfg = rimpatch_config::load_config()?;
    let mcfg = cfg.migrate.unwrap_or_default();

    let km_path = args
        .known_mods
        .or_else(|| cfg.known_mods.map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_KNOWN_MODS));
    let known = KnownMods::from_file(&km_path)
        .wrap_err_with(|| format!("cannot load known mods from {}", km_path.display()))?;

    let mut opts = MigrateOptions::new(args.src);
    opts.dest = args.dest.or_else(|| mcfg.dest.map(PathBuf::from));
    opts.skip_dirs = if args.skip_dirs.is_empty() {
        mcfg.skip_dirs.unwrap_or_default()
    } else {
        args.skip_dirs
    };
    opts.load_folder_prefix = args
        .prefix
        .or(mcfg.load_folder_prefix)
        .unwrap_or_else(|| DEFAULT_PREFIX.to_string());
    opts.overwrite = args.overwrite || mcfg.overwrite.unwrap_or(false);
    opts.delete_source = args.delete_source || mcfg.delete_source.unwrap_or(false);
    opts.issues_file = Some(
        args.issues_file
            .or_else(|| cfg.issues_file.map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ISSUES_FILE)),
    );
    opts.load_folders_file = Some(
        args.load_folders_file
            .or_else(|| cfg.load_folders_file.map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOAD_FOLDERS_FILE)),
    );
    if opts.delete_source && opts.dest.is_none() {
        crate::ui_warn!("--delete-source has no effect without a destination");
    }

    let summary = migrate(&opts, &known)?;

    if args.format == Format::Json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        for dir in &summary.dirs {
            match &dir.outcome {
                DirOutcome::Migrated {
                    load_folder,
                    files_written,
                    ..
                } => crate::ui_ok!(
                    "{}: migrated to {load_folder} ({files_written} files)",
                    dir.name
                ),
                DirOutcome::Skipped => crate::ui_info!("{}: no patches, skipped", dir.name),
                DirOutcome::Flagged { issues } => {
                    if !issues.unidentified_mods.is_empty() {
                        let names: Vec<&str> =
                            issues.unidentified_mods.iter().map(|n| n.as_str()).collect();
                        crate::ui_warn!("{}: unknown mods: {}", dir.name, names.join(", "));
                    }
                    if !issues.is_collection.is_empty() {
                        crate::ui_warn!(
                            "{}: files target {} different mod sets",
                            dir.name,
                            issues.is_collection.len()
                        );
                    }
                }
                DirOutcome::ParseFailed { failures } => {
                    for f in failures {
                        crate::ui_err!("{}/{}: {}", dir.name, f.path, f.error);
                    }
                }
                DirOutcome::IoFailed { error } => crate::ui_err!("{}: {error}", dir.name),
            }
        }
        if let Some(path) = &summary.issues_file {
            crate::ui_info!("issues written to {path}");
        }
        if let Some(path) = &summary.load_folders_file {
            crate::ui_info!("LoadFolders records written to {path}");
        }
        crate::ui_ok!(
            "migrated {}, skipped {}, flagged {}, failed {}",
            summary.migrated,
            summary.skipped,
            summary.flagged,
            summary.failed
        );
    }

    if summary.failed > 0 {
        bail!("{} director(ies) failed to migrate", summary.failed);
    }
    Ok(())
}
