//! Moves patch files that only add whole Defs into a `Defs/` tree.
//!
//! A file qualifies when every operation under its root is a
//! `PatchOperationAdd` with `xpath` equal to `Defs` and a `value`. Such a file
//! at `<Mod>/<Folder>/<rest>` is rewritten as a plain `<Defs>` document at
//! `<Mod>/Defs/<rest>` and the patch file is removed. Files mixing Def adds
//! with other operations are only reported.

use std::path::{Component, Path, PathBuf};

use color_eyre::eyre::WrapErr;
use rayon::prelude::*;
use rimpatch_core::RimPatchError;
use rimpatch_domain::FailureEntry;
use rimpatch_parsers_xml::{
    normalize_eol, parse_document, to_xml_file, xml_file_subpaths, Document, NodeId,
    OperationKind,
};
use serde::Serialize;

use crate::patcher::indent::subtract_indent;
use crate::patcher::unpack::trim_boundaries;
use crate::util::{to_json_tabs, write_atomic};
use crate::Result;

pub const DEFS_DIR: &str = "Defs";
const XPATH: &str = "xpath";
const VALUE: &str = "value";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractDefsReport {
    /// Source subpaths turned into Def files.
    pub moved: Vec<String>,
    /// Subpaths mixing Def adds with other operations.
    pub mixed: Vec<String>,
    pub failures: Vec<FailureEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mixed_file: Option<String>,
}

/// Add operation inserting whole Defs at the document root.
pub fn is_def_add(doc: &Document, op: NodeId) -> bool {
    doc.is_operation(op, OperationKind::Add)
        && doc
            .child_element(op, XPATH)
            .is_some_and(|x| doc.text_content(x).trim() == DEFS_DIR)
        && doc.child_element(op, VALUE).is_some()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefsShape {
    /// No operations at all.
    Empty,
    /// Only Def adds.
    DefsOnly,
    /// Def adds next to other operations.
    Mixed,
    /// No Def adds.
    Other,
}

pub fn defs_shape(doc: &Document) -> DefsShape {
    let Some(root) = doc.root_element() else {
        return DefsShape::Empty;
    };
    let ops = doc.element_children(root);
    if ops.is_empty() {
        return DefsShape::Empty;
    }
    let defs = ops.iter().filter(|op| is_def_add(doc, **op)).count();
    match defs {
        0 => DefsShape::Other,
        n if n == ops.len() => DefsShape::DefsOnly,
        _ => DefsShape::Mixed,
    }
}

/// Replace every operation by the contents of its `value` and rename the root
/// to `Defs`. Expects a [`DefsShape::DefsOnly`] document.
pub fn to_defs_document(doc: &mut Document) {
    let Some(root) = doc.root_element() else {
        return;
    };
    for op in doc.element_children(root) {
        let Some(value) = doc.child_element(op, VALUE) else {
            continue;
        };
        trim_boundaries(doc, value);
        subtract_indent(doc, value, 2);
        let contents = doc.children(value).to_vec();
        doc.replace_with(op, &contents);
    }
    doc.set_tag_name(root, DEFS_DIR);
}

/// `<Mod>/<Folder>/<rest>` becomes `<Mod>/Defs/<rest>`.
pub fn defs_subpath(subpath: &Path) -> Option<PathBuf> {
    let mut parts = subpath.components().filter_map(|c| match c {
        Component::Normal(p) => Some(p),
        _ => None,
    });
    let mod_dir = parts.next()?;
    parts.next()?;
    let rest: PathBuf = parts.collect();
    if rest.as_os_str().is_empty() {
        return None;
    }
    Some(Path::new(mod_dir).join(DEFS_DIR).join(rest))
}

enum FileOutcome {
    Moved(String),
    Mixed(String),
    Untouched,
    Failed(FailureEntry),
}

fn display(sub: &Path) -> String {
    sub.to_string_lossy().replace('\\', "/")
}

fn failed(sub: &Path, error: impl ToString) -> FileOutcome {
    FileOutcome::Failed(FailureEntry {
        path: display(sub),
        error: error.to_string(),
    })
}

fn extract_one(src: &Path, sub: &Path) -> Result<FileOutcome> {
    let from = src.join(sub);
    let text =
        std::fs::read_to_string(&from).wrap_err_with(|| format!("read {}", from.display()))?;
    let mut doc = match parse_document(&text) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::warn!(event = "defs_parse_failed", path = %from.display(), error = %e);
            return Ok(failed(sub, e));
        }
    };
    match defs_shape(&doc) {
        DefsShape::Empty | DefsShape::Other => return Ok(FileOutcome::Untouched),
        DefsShape::Mixed => return Ok(FileOutcome::Mixed(display(sub))),
        DefsShape::DefsOnly => {}
    }
    let Some(target) = defs_subpath(sub) else {
        return Ok(failed(sub, "not inside a <Mod>/<Folder>/ layout"));
    };
    let to = src.join(&target);
    if to.exists() {
        return Ok(failed(sub, RimPatchError::DestinationExists { path: to }));
    }
    to_defs_document(&mut doc);
    write_atomic(&to, to_xml_file(&doc).as_bytes())?;
    std::fs::remove_file(&from).map_err(|e| RimPatchError::io(&from, e))?;
    tracing::debug!(event = "defs_moved", from = %sub.display(), to = %target.display());
    Ok(FileOutcome::Moved(display(sub)))
}

/// Move every Defs-only patch file under `src` into its mod's `Defs/` tree.
/// Mixed files are listed in `mixed_file` when there are any.
pub fn extract_defs(src: &Path, mixed_file: Option<&Path>) -> Result<ExtractDefsReport> {
    let files = xml_file_subpaths(src)?;
    let results: Vec<Result<FileOutcome>> =
        files.par_iter().map(|sub| extract_one(src, sub)).collect();

    let mut report = ExtractDefsReport::default();
    for r in results {
        match r? {
            FileOutcome::Moved(p) => report.moved.push(p),
            FileOutcome::Mixed(p) => report.mixed.push(p),
            FileOutcome::Untouched => {}
            FileOutcome::Failed(f) => report.failures.push(f),
        }
    }

    if let Some(path) = mixed_file {
        if !report.mixed.is_empty() {
            write_atomic(path, normalize_eol(&to_json_tabs(&report.mixed)?).as_bytes())?;
            report.mixed_file = Some(path.display().to_string());
        }
    }
    tracing::info!(
        event = "extract_defs_done",
        src = %src.display(),
        moved = report.moved.len(),
        mixed = report.mixed.len(),
        failed = report.failures.len(),
    );
    Ok(report)
}
