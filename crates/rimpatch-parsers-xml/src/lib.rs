use rimpatch_core::{Result, RimPatchError};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

mod about;
mod parse;
mod traverse;
mod tree;
mod write;

pub use about::{read_mod_metadata, ModMeta};
pub use parse::{parse_document, XmlError};
pub use traverse::{outermost, rewrite_post_order, Rewrite};
pub use tree::{
    Ancestors, Attribute, Document, Element, NodeId, NodeKind, OperationKind, CLASS_ATTR,
};
pub use write::{normalize_eol, serialize, to_xml_file, NATIVE_EOL, XML_DECLARATION};

/// Escape `& < > ' "` for element text and attribute values.
pub use quick_xml::escape::escape;

pub fn is_xml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
}

/// Every `.xml` file under `dir`, as paths relative to `dir`, sorted.
pub fn xml_file_subpaths(dir: &Path) -> Result<Vec<PathBuf>> {
    file_subpaths(dir, is_xml)
}

/// Every file under `dir` accepted by `keep`, as paths relative to `dir`, sorted.
pub fn file_subpaths(dir: &Path, keep: impl Fn(&Path) -> bool) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            match e.into_io_error() {
                Some(io) => RimPatchError::io(path, io),
                None => RimPatchError::Other(format!("cannot walk {}", path.display())),
            }
        })?;
        if !entry.file_type().is_file() || !keep(entry.path()) {
            continue;
        }
        if let Ok(rel) = entry.path().strip_prefix(dir) {
            out.push(rel.to_path_buf());
        }
    }
    tracing::debug!(dir = %dir.display(), files = out.len(), "files collected");
    Ok(out)
}
