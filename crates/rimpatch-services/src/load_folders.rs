use rimpatch_core::PackageId;
use rimpatch_parsers_xml::{escape, NATIVE_EOL};

pub const DEFAULT_PREFIX: &str = "ModPatches";

/// Folder path RimWorld loads for a migrated directory.
pub fn load_folder_path(prefix: &str, dir_name: &str) -> String {
    let prefix = prefix.trim_end_matches(['/', '\\']);
    if prefix.is_empty() {
        dir_name.to_string()
    } else {
        format!("{prefix}/{dir_name}")
    }
}

/// One `LoadFolders.xml` entry gating `folder` on any of `package_ids`.
pub fn load_folder_record(package_ids: &[PackageId], folder: &str) -> String {
    let ids = package_ids
        .iter()
        .map(PackageId::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "<li IfModActive=\"{}\">{}</li>",
        escape(&ids),
        escape(folder)
    )
}

/// Fragment file text: one record per line.
pub fn render_fragment<'a>(records: impl IntoIterator<Item = &'a str>) -> String {
    let mut out = String::new();
    for r in records {
        out.push_str(r);
        out.push_str(NATIVE_EOL);
    }
    out
}
