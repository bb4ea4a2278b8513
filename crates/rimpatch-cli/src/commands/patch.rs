use std::path::PathBuf;

use color_eyre::eyre::bail;

use crate::Format;

pub fn run_patch(src: PathBuf, dest: Option<PathBuf>, format: Format) -> color_eyre::Result<()> {
    tracing::debug!(event = "patch_args", src = ?src, dest = ?dest);
    let report = rimpatch_services::patch_dir(&src, dest.as_deref())?;

    if format == Format::Json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for f in &report.failures {
            crate::ui_err!("{}: {}", f.path, f.error);
        }
        crate::ui_ok!(
            "{} files written, {} operations flattened",
            report.files_written,
            report.operations_flattened
        );
    }

    if !report.failures.is_empty() {
        bail!("{} file(s) could not be parsed", report.failures.len());
    }
    Ok(())
}
