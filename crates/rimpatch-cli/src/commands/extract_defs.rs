use std::path::PathBuf;

use color_eyre::eyre::bail;

use crate::Format;

pub const DEFAULT_MIXED_DEFS_FILE: &str = "mixed-defs.json";

pub fn run_extract_defs(
    src: PathBuf,
    mixed_file: Option<PathBuf>,
    format: Format,
) -> color_eyre::Result<()> {
    let cfg = rimpatch_config::load_config()?;
    let mixed_file = mixed_file
        .or_else(|| cfg.mixed_defs_file.map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_MIXED_DEFS_FILE));
    tracing::debug!(event = "extract_defs_args", src = ?src, mixed_file = ?mixed_file);

    let report = rimpatch_services::extract_defs(&src, Some(mixed_file.as_path()))?;

    if format == Format::Json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for f in &report.failures {
            crate::ui_err!("{}: {}", f.path, f.error);
        }
        if let Some(path) = &report.mixed_file {
            crate::ui_warn!(
                "{} files mix Def adds with other operations, see {path}",
                report.mixed.len()
            );
        }
        crate::ui_ok!("{} files moved to Defs", report.moved.len());
    }

    if !report.failures.is_empty() {
        bail!("{} file(s) could not be moved", report.failures.len());
    }
    Ok(())
}
