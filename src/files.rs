use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;

use crate::collect::{FileSet, StripPrefix, collect_files};
use crate::config::load_config;

/// CLI command: print the files `push` would publish from `root`.
///
/// Each line shows a short SHA-256, the size in bytes and the remote path:
/// ```text
/// 2d711642b726  12  README.md
/// ba7816bf8f01   3  cmd/app/main.go
///
/// 2 files, 15 bytes
/// ```
///
/// `strip` overrides `scaffold.strip_segments` from the config.
///
/// # Errors
/// Returns an error if the config cannot be loaded or the walk fails.
pub fn cmd_files(config: Option<&Path>, root: &Path, strip: Option<usize>) -> Result<()> {
    let cfg = load_config(config)?;
    let strip = match strip {
        Some(n) => StripPrefix::Segments(n),
        None => cfg.provision_settings().strip,
    };
    let files = collect_files(root, strip)
        .with_context(|| format!("failed to collect {}", root.display()))?;

    for line in listing(&files) {
        println!("{}", line);
    }
    println!();
    println!("{} files, {} bytes", files.len(), files.total_bytes());
    Ok(())
}

fn listing(files: &FileSet) -> Vec<String> {
    let width = files
        .iter()
        .map(|(_, c)| c.len().to_string().len())
        .max()
        .unwrap_or(1);
    files
        .iter()
        .map(|(path, content)| {
            let digest = files.digest(path).unwrap_or_default();
            format!(
                "{}  {:>width$}  {}",
                digest.get(..12).unwrap_or(&digest).dimmed(),
                content.len(),
                path.bold(),
            )
        })
        .collect()
}
