//! Batch migration of a patches directory.
//!
//! Every immediate subdirectory of the source is one unit: its `.xml` files
//! are parsed, their FindMod mod sets merged and classified. Units with a
//! single known mod set get a `LoadFolders.xml` record and, when a
//! destination is set, their rewritten files are written to
//! `<dest>/<Dir>/Patches/<Dir>/<subpath>`, with every other file of the unit
//! copied verbatim next to them. Units are processed in parallel and never
//! abort each other.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use rimpatch_core::{ModSetCollection, RimPatchError};
use rimpatch_domain::{
    DirIssues, DirOutcome, DirReport, FailureEntry, MigrationIssues, MigrationSummary,
    SCHEMA_VERSION,
};
use rimpatch_parsers_xml::{
    file_subpaths, is_xml, parse_document, to_xml_file, xml_file_subpaths, Document,
};

use crate::classify::{classify_dir, Classification, FileModSets};
use crate::extract::extract_mod_sets;
use crate::known_mods::KnownMods;
use crate::load_folders::{load_folder_path, load_folder_record, render_fragment, DEFAULT_PREFIX};
use crate::patcher::patch_document;
use crate::util::{to_json_tabs, write_atomic};
use crate::Result;

#[derive(Debug, Clone)]
pub struct MigrateOptions {
    pub src: PathBuf,
    pub dest: Option<PathBuf>,
    pub skip_dirs: Vec<String>,
    pub load_folder_prefix: String,
    pub overwrite: bool,
    pub delete_source: bool,
    pub issues_file: Option<PathBuf>,
    pub load_folders_file: Option<PathBuf>,
}

impl MigrateOptions {
    pub fn new(src: impl Into<PathBuf>) -> Self {
        Self {
            src: src.into(),
            dest: None,
            skip_dirs: Vec::new(),
            load_folder_prefix: DEFAULT_PREFIX.to_string(),
            overwrite: false,
            delete_source: false,
            issues_file: None,
            load_folders_file: None,
        }
    }
}

struct LoadedFile {
    subpath: PathBuf,
    doc: Document,
    mod_sets: ModSetCollection,
}

struct DirResult {
    report: DirReport,
    issues: Option<DirIssues>,
    record: Option<String>,
}

enum Load {
    Parsed(LoadedFile),
    Failed(FailureEntry),
}

fn load_file(dir: &Path, subpath: &Path) -> Result<Load> {
    let path = dir.join(subpath);
    let text = std::fs::read_to_string(&path).map_err(|e| RimPatchError::io(&path, e))?;
    match parse_document(&text) {
        Ok(doc) => {
            let mod_sets = extract_mod_sets(&doc);
            Ok(Load::Parsed(LoadedFile {
                subpath: subpath.to_path_buf(),
                doc,
                mod_sets,
            }))
        }
        Err(e) => Ok(Load::Failed(FailureEntry {
            path: subpath.display().to_string(),
            error: e.to_string(),
        })),
    }
}

/// Subdirectory names of `src` to migrate, sorted.
pub fn list_dirs(src: &Path, skip: &[String]) -> Result<Vec<String>> {
    let mut names: Vec<String> = std::fs::read_dir(src)
        .map_err(|e| RimPatchError::io(src, e))?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_ok_and(|t| t.is_dir()))
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| !skip.iter().any(|s| s == name))
        .collect();
    names.sort();
    Ok(names)
}

/// `<dest>/<Dir>/Patches/<Dir>`
pub fn destination_root(dest: &Path, dir_name: &str) -> PathBuf {
    dest.join(dir_name).join("Patches").join(dir_name)
}

fn write_dir(
    dir: &Path,
    files: Vec<LoadedFile>,
    others: &[PathBuf],
    out_root: &Path,
    overwrite: bool,
) -> Result<usize> {
    if !overwrite {
        if let Some(existing) = files
            .iter()
            .map(|f| &f.subpath)
            .chain(others)
            .map(|sub| out_root.join(sub))
            .find(|p| p.exists())
        {
            return Err(RimPatchError::DestinationExists { path: existing }.into());
        }
    }
    let mut written = 0;
    for mut file in files {
        patch_document(&mut file.doc);
        write_atomic(&out_root.join(&file.subpath), to_xml_file(&file.doc).as_bytes())?;
        written += 1;
    }
    for sub in others {
        let from = dir.join(sub);
        let bytes = std::fs::read(&from).map_err(|e| RimPatchError::io(&from, e))?;
        write_atomic(&out_root.join(sub), &bytes)?;
        tracing::debug!(event = "copied_verbatim", path = %sub.display());
    }
    Ok(written)
}

fn io_failed(name: &str, err: &color_eyre::Report) -> DirResult {
    tracing::error!(event = "dir_io_failed", dir = name, error = %err);
    DirResult {
        report: DirReport {
            name: name.to_string(),
            outcome: DirOutcome::IoFailed {
                error: format!("{err:#}"),
            },
        },
        issues: None,
        record: None,
    }
}

fn process_dir(opts: &MigrateOptions, known: &KnownMods, name: &str) -> DirResult {
    let dir = opts.src.join(name);
    let subpaths = match xml_file_subpaths(&dir) {
        Ok(s) => s,
        Err(e) => return io_failed(name, &e),
    };

    let loads: Result<Vec<Load>> = subpaths.par_iter().map(|sub| load_file(&dir, sub)).collect();
    let loads = match loads {
        Ok(l) => l,
        Err(e) => return io_failed(name, &e),
    };

    let mut files = Vec::new();
    let mut failures = Vec::new();
    for load in loads {
        match load {
            Load::Parsed(f) => files.push(f),
            Load::Failed(f) => failures.push(f),
        }
    }
    if !failures.is_empty() {
        tracing::warn!(event = "dir_parse_failed", dir = name, files = failures.len());
        return DirResult {
            report: DirReport {
                name: name.to_string(),
                outcome: DirOutcome::ParseFailed { failures },
            },
            issues: None,
            record: None,
        };
    }

    let per_file: Vec<FileModSets> = files
        .iter()
        .map(|f| FileModSets {
            subpath: f.subpath.to_string_lossy().replace('\\', "/"),
            mod_sets: f.mod_sets.clone(),
        })
        .collect();
    let mut merged = ModSetCollection::new();
    for f in &per_file {
        merged.merge_with(&f.mod_sets);
    }

    let package_ids = match classify_dir(&merged, &per_file, known) {
        Classification::Issues(issues) => {
            let outcome = if issues.needs_attention() {
                tracing::warn!(event = "dir_flagged", dir = name);
                DirOutcome::Flagged {
                    issues: issues.clone(),
                }
            } else {
                tracing::info!(event = "dir_skipped", dir = name, reason = "no patches");
                DirOutcome::Skipped
            };
            return DirResult {
                report: DirReport {
                    name: name.to_string(),
                    outcome,
                },
                issues: Some(issues),
                record: None,
            };
        }
        Classification::Migratable { package_ids } => package_ids,
    };

    let load_folder = load_folder_path(&opts.load_folder_prefix, name);
    let record = load_folder_record(&package_ids, &load_folder);

    let mut files_written = 0;
    let mut source_deleted = false;
    if let Some(dest) = &opts.dest {
        let out_root = destination_root(dest, name);
        let others = match file_subpaths(&dir, |p| !is_xml(p)) {
            Ok(o) => o,
            Err(e) => return io_failed(name, &e),
        };
        files_written = match write_dir(&dir, files, &others, &out_root, opts.overwrite) {
            Ok(n) => n,
            Err(e) => return io_failed(name, &e),
        };
        if opts.delete_source {
            if let Err(e) = std::fs::remove_dir_all(&dir) {
                let err = color_eyre::Report::new(RimPatchError::io(&dir, e));
                return io_failed(name, &err);
            }
            source_deleted = true;
        }
    }

    tracing::info!(event = "dir_migrated", dir = name, files = files_written, folder = %load_folder);
    DirResult {
        report: DirReport {
            name: name.to_string(),
            outcome: DirOutcome::Migrated {
                package_ids,
                load_folder,
                files_written,
                source_deleted,
            },
        },
        issues: None,
        record: Some(record),
    }
}

/// Migrate every subdirectory of `opts.src` and persist the issues report and
/// load-order fragment where configured.
pub fn migrate(opts: &MigrateOptions, known: &KnownMods) -> Result<MigrationSummary> {
    let names = list_dirs(&opts.src, &opts.skip_dirs)?;
    tracing::info!(event = "migrate_start", src = %opts.src.display(), dirs = names.len());

    let results: Vec<DirResult> = names
        .par_iter()
        .map(|name| process_dir(opts, known, name))
        .collect();

    let mut summary = MigrationSummary {
        schema_version: SCHEMA_VERSION,
        ..MigrationSummary::default()
    };
    let mut issues = MigrationIssues::new();
    let mut records = Vec::new();
    for r in results {
        match &r.report.outcome {
            DirOutcome::Migrated { .. } => summary.migrated += 1,
            DirOutcome::Skipped => summary.skipped += 1,
            DirOutcome::Flagged { .. } => summary.flagged += 1,
            DirOutcome::ParseFailed { .. } | DirOutcome::IoFailed { .. } => summary.failed += 1,
        }
        if let Some(i) = r.issues {
            issues.insert(r.report.name.clone(), i);
        }
        if let Some(rec) = r.record {
            records.push(rec);
        }
        summary.dirs.push(r.report);
    }

    if let Some(path) = &opts.issues_file {
        if !issues.is_empty() {
            write_atomic(path, rimpatch_parsers_xml::normalize_eol(&to_json_tabs(&issues)?).as_bytes())?;
            summary.issues_file = Some(path.display().to_string());
        }
    }
    if let Some(path) = &opts.load_folders_file {
        if !records.is_empty() {
            write_atomic(path, render_fragment(records.iter().map(String::as_str)).as_bytes())?;
            summary.load_folders_file = Some(path.display().to_string());
        }
    }

    tracing::info!(
        event = "migrate_done",
        migrated = summary.migrated,
        skipped = summary.skipped,
        flagged = summary.flagged,
        failed = summary.failed,
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rimpatch_core::{ModName, PackageId};
    use std::fs;

    const HARMONY_PATCH: &str = "<?xml version=\"1.0\" encoding=\"utf-8\"?>
<Patch>
\t<Operation Class=\"PatchOperationFindMod\">
\t\t<mods>
\t\t\t<li>Harmony</li>
\t\t</mods>
\t\t<match Class=\"PatchOperationAdd\">
\t\t\t<xpath>Defs</xpath>
\t\t</match>
\t</Operation>
</Patch>
";

    fn find_mod_patch(mods: &[&str]) -> String {
        let lis: String = mods.iter().map(|m| format!("<li>{m}</li>")).collect();
        format!(
            "<Patch><Operation Class=\"PatchOperationFindMod\"><mods>{lis}</mods><match Class=\"PatchOperationAdd\"/></Operation></Patch>"
        )
    }

    fn put(root: &Path, rel: &str, body: &str) {
        let p = root.join(rel);
        fs::create_dir_all(p.parent().unwrap()).unwrap();
        fs::write(p, body).unwrap();
    }

    fn known() -> KnownMods {
        let mut km = KnownMods::with_dlcs();
        km.add(ModName::new("Harmony"), PackageId::new("656325405"));
        km.add(ModName::new("A"), PackageId::new("a.a"));
        km.add(ModName::new("B"), PackageId::new("b.b"));
        km
    }

    fn outcome<'a>(summary: &'a MigrationSummary, name: &str) -> &'a DirOutcome {
        &summary
            .dirs
            .iter()
            .find(|d| d.name == name)
            .unwrap()
            .outcome
    }

    #[test]
    fn known_single_set_is_migrated_and_recorded() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        put(src.path(), "Harmony/Defs/Things.xml", HARMONY_PATCH);
        put(src.path(), "Harmony/Other.xml", &find_mod_patch(&["Harmony"]));

        let mut opts = MigrateOptions::new(src.path());
        opts.dest = Some(out.path().join("dest"));
        opts.issues_file = Some(out.path().join("issues.json"));
        opts.load_folders_file = Some(out.path().join("records.xml"));
        let summary = migrate(&opts, &known()).unwrap();

        assert_eq!(summary.migrated, 1);
        assert!(summary.issues_file.is_none());
        assert!(!out.path().join("issues.json").exists());
        let records = fs::read_to_string(out.path().join("records.xml")).unwrap();
        assert_eq!(
            records.trim_end(),
            "<li IfModActive=\"656325405\">ModPatches/Harmony</li>"
        );

        let written = fs::read_to_string(
            out.path()
                .join("dest/Harmony/Patches/Harmony/Defs/Things.xml"),
        )
        .unwrap();
        assert!(written.contains("<Operation Class=\"PatchOperationAdd\">"));
        assert!(!written.contains("FindMod"));
        assert!(src.path().join("Harmony").exists());
        assert!(matches!(
            outcome(&summary, "Harmony"),
            DirOutcome::Migrated { files_written: 2, source_deleted: false, .. }
        ));
    }

    #[test]
    fn issues_are_collected_per_directory() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        put(src.path(), "Plain/a.xml", "<Patch><Operation Class=\"PatchOperationAdd\"/></Patch>");
        put(src.path(), "Unknown/a.xml", &find_mod_patch(&["Unknown Mod"]));
        put(src.path(), "Mixed/a.xml", &find_mod_patch(&["A", "B"]));
        put(src.path(), "Mixed/b.xml", &find_mod_patch(&["A"]));

        let mut opts = MigrateOptions::new(src.path());
        opts.issues_file = Some(out.path().join("issues.json"));
        opts.load_folders_file = Some(out.path().join("records.xml"));
        let summary = migrate(&opts, &known()).unwrap();

        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.flagged, 2);
        assert_eq!(summary.migrated, 0);
        assert!(!out.path().join("records.xml").exists());

        let text = fs::read_to_string(out.path().join("issues.json")).unwrap();
        let issues: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(issues["Plain"], serde_json::json!({ "NO_PATCHES": true }));
        assert_eq!(
            issues["Unknown"],
            serde_json::json!({ "UNIDENT_MODS_FOUND": ["Unknown Mod"] })
        );
        assert_eq!(
            issues["Mixed"]["IS_COLLECTION"].as_array().unwrap().len(),
            2
        );
    }

    #[test]
    fn parse_failure_isolates_its_directory() {
        let src = tempfile::tempdir().unwrap();
        put(src.path(), "Broken/a.xml", "<Patch><Operation>");
        put(src.path(), "Harmony/a.xml", HARMONY_PATCH);

        let summary = migrate(&MigrateOptions::new(src.path()), &known()).unwrap();
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.migrated, 1);
        let DirOutcome::ParseFailed { failures } = outcome(&summary, "Broken") else {
            panic!("expected parse failure");
        };
        assert_eq!(failures[0].path, "a.xml");
    }

    #[test]
    fn existing_destination_is_rejected_without_overwrite() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        put(src.path(), "Harmony/a.xml", HARMONY_PATCH);
        put(out.path(), "Harmony/Patches/Harmony/a.xml", "old");

        let mut opts = MigrateOptions::new(src.path());
        opts.dest = Some(out.path().to_path_buf());
        opts.delete_source = true;
        let summary = migrate(&opts, &known()).unwrap();
        assert_eq!(summary.failed, 1);
        assert!(src.path().join("Harmony/a.xml").exists());
        let kept = fs::read_to_string(out.path().join("Harmony/Patches/Harmony/a.xml")).unwrap();
        assert_eq!(kept, "old");

        opts.overwrite = true;
        let summary = migrate(&opts, &known()).unwrap();
        assert_eq!(summary.migrated, 1);
        assert!(!src.path().join("Harmony").exists());
        assert!(matches!(
            outcome(&summary, "Harmony"),
            DirOutcome::Migrated { source_deleted: true, .. }
        ));
    }

    #[test]
    fn deleting_source_keeps_non_xml_files() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        put(src.path(), "Harmony/a.xml", HARMONY_PATCH);
        put(src.path(), "Harmony/README.txt", "notes");
        put(src.path(), "Harmony/Textures/icon.png", "png");

        let mut opts = MigrateOptions::new(src.path());
        opts.dest = Some(out.path().to_path_buf());
        opts.delete_source = true;
        let summary = migrate(&opts, &known()).unwrap();

        assert_eq!(summary.migrated, 1);
        assert!(!src.path().join("Harmony").exists());
        let root = out.path().join("Harmony/Patches/Harmony");
        assert_eq!(fs::read_to_string(root.join("README.txt")).unwrap(), "notes");
        assert_eq!(fs::read_to_string(root.join("Textures/icon.png")).unwrap(), "png");
        assert!(matches!(
            outcome(&summary, "Harmony"),
            DirOutcome::Migrated { files_written: 1, source_deleted: true, .. }
        ));
    }

    #[test]
    fn existing_copy_target_blocks_the_directory() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        put(src.path(), "Harmony/a.xml", HARMONY_PATCH);
        put(src.path(), "Harmony/README.txt", "new");
        put(out.path(), "Harmony/Patches/Harmony/README.txt", "old");

        let mut opts = MigrateOptions::new(src.path());
        opts.dest = Some(out.path().to_path_buf());
        opts.delete_source = true;
        let summary = migrate(&opts, &known()).unwrap();

        assert_eq!(summary.failed, 1);
        assert!(src.path().join("Harmony/README.txt").exists());
        assert!(!out.path().join("Harmony/Patches/Harmony/a.xml").exists());
    }

    #[test]
    fn skipped_dirs_are_not_listed() {
        let src = tempfile::tempdir().unwrap();
        fs::create_dir_all(src.path().join("B")).unwrap();
        fs::create_dir_all(src.path().join("A")).unwrap();
        fs::create_dir_all(src.path().join(".git")).unwrap();
        fs::write(src.path().join("README.md"), "x").unwrap();
        let names = list_dirs(src.path(), &[".git".to_string()]).unwrap();
        assert_eq!(names, ["A", "B"]);
    }
}
