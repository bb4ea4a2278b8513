use std::io::Write;
use std::path::Path;

use rimpatch_core::RimPatchError;

use crate::Result;

/// Write `bytes` to `path` through a sibling temp file and a rename, creating
/// parent directories as needed.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| RimPatchError::io(parent, e))?;
        }
    }
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp = Path::new(&tmp_name);
    {
        let mut f = std::fs::File::create(tmp).map_err(|e| RimPatchError::io(tmp, e))?;
        f.write_all(bytes).map_err(|e| RimPatchError::io(tmp, e))?;
        f.sync_all().map_err(|e| RimPatchError::io(tmp, e))?;
    }
    std::fs::rename(tmp, path).map_err(|e| RimPatchError::io(path, e))?;
    Ok(())
}

/// Pretty JSON indented with tabs.
pub fn to_json_tabs<T: serde::Serialize>(value: &T) -> Result<String> {
    let mut buf = Vec::new();
    let fmt = serde_json::ser::PrettyFormatter::with_indent(b"\t");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, fmt);
    value.serialize(&mut ser)?;
    Ok(String::from_utf8(buf)?)
}
