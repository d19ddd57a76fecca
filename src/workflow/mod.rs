pub mod dispatch;
pub mod publish;

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// File the CI runner reads step outputs from, when running under GitHub Actions.
pub fn step_output_path() -> Option<PathBuf> {
    std::env::var_os("GITHUB_OUTPUT")
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
}

/// Append `key=value` lines to a step output file.
pub fn append_step_outputs(path: &Path, outputs: &[(&str, &str)]) -> Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    for (key, value) in outputs {
        writeln!(file, "{key}={value}")?;
    }
    Ok(())
}

/// Publish step outputs if the CI runner asked for them.
pub(crate) fn emit_step_outputs(path: Option<&Path>, outputs: &[(&str, &str)]) -> Result<()> {
    if let Some(path) = path {
        append_step_outputs(path, outputs)?;
    }
    Ok(())
}
