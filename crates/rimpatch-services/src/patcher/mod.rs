//! Rewrites conditional patch operations into their flat equivalents.
//!
//! Post-order passes over the tree until one changes nothing: Sequences that
//! only group operations are spliced into their slot, and outermost FindMods
//! are replaced by their `match` branch. A FindMod exposed by unpacking its
//! enclosing FindMod becomes outermost and is resolved by the next pass.

use std::path::{Path, PathBuf};

use color_eyre::eyre::WrapErr;
use rayon::prelude::*;
use rimpatch_domain::FailureEntry;
use rimpatch_parsers_xml::{
    parse_document, rewrite_post_order, to_xml_file, xml_file_subpaths, Document, NodeId,
    Rewrite, XmlError,
};
use serde::Serialize;

use crate::Result;

pub mod indent;
pub mod matchers;
pub mod unpack;

fn visit(doc: &mut Document, node: NodeId) -> Rewrite {
    if matchers::is_unpackable_sequence(doc, node, node) {
        return unpack::unpack_sequence(doc, node, node);
    }
    if matchers::is_unpackable_find_mod(doc, node) {
        return unpack::unpack_find_mod(doc, node);
    }
    Rewrite::Keep
}

/// Rewrite `doc` in place until no pattern matches. Returns the number of
/// operations flattened.
pub fn patch_document(doc: &mut Document) -> usize {
    let mut total = 0;
    loop {
        let Some(root) = doc.root_element() else {
            return total;
        };
        // every productive pass removes at least one wrapper element
        match rewrite_post_order(doc, root, &mut visit) {
            0 => return total,
            n => total += n,
        }
    }
}

/// Parse, rewrite and serialize one file's text.
pub fn patch_xml(xml: &str) -> std::result::Result<String, XmlError> {
    let mut doc = parse_document(xml)?;
    patch_document(&mut doc);
    Ok(to_xml_file(&doc))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PatchDirReport {
    pub files_written: usize,
    pub operations_flattened: usize,
    pub failures: Vec<FailureEntry>,
}

enum FileResult {
    Written(usize),
    Failed(FailureEntry),
}

fn patch_one(src: &Path, dest: &Path, sub: &Path) -> Result<FileResult> {
    let from = src.join(sub);
    let text = std::fs::read_to_string(&from)
        .wrap_err_with(|| format!("read {}", from.display()))?;
    let mut doc = match parse_document(&text) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::warn!(event = "patch_parse_failed", path = %from.display(), error = %e);
            return Ok(FileResult::Failed(FailureEntry {
                path: sub.display().to_string(),
                error: e.to_string(),
            }));
        }
    };
    let flattened = patch_document(&mut doc);
    crate::util::write_atomic(&dest.join(sub), to_xml_file(&doc).as_bytes())?;
    tracing::debug!(event = "patched", path = %sub.display(), flattened);
    Ok(FileResult::Written(flattened))
}

/// Rewrite every `.xml` under `src` into the mirrored path under `dest`
/// (`src` itself when `dest` is `None`). Files that fail to parse are
/// reported and left alone.
pub fn patch_dir(src: &Path, dest: Option<&Path>) -> Result<PatchDirReport> {
    let dest: PathBuf = dest.unwrap_or(src).to_path_buf();
    let files = xml_file_subpaths(src)?;
    let results: Vec<Result<FileResult>> = files
        .par_iter()
        .map(|sub| patch_one(src, &dest, sub))
        .collect();

    let mut report = PatchDirReport::default();
    for r in results {
        match r? {
            FileResult::Written(n) => {
                report.files_written += 1;
                report.operations_flattened += n;
            }
            FileResult::Failed(f) => report.failures.push(f),
        }
    }
    tracing::info!(
        event = "patch_dir_done",
        src = %src.display(),
        written = report.files_written,
        flattened = report.operations_flattened,
        failed = report.failures.len(),
    );
    Ok(report)
}
