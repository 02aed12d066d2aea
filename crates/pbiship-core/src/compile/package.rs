//! Read-only inspection of package archives.

use std::fs::File;
use std::path::Path;

use anyhow::Context;

/// List the entry names of a package archive, sorted.
pub fn list_entries(path: &Path) -> anyhow::Result<Vec<String>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open package: {}", path.display()))?;
    let archive = zip::ZipArchive::new(file)
        .with_context(|| format!("Package is not a valid archive: {}", path.display()))?;

    let mut entries: Vec<String> = archive.file_names().map(str::to_string).collect();
    entries.sort();
    Ok(entries)
}

/// [`list_entries`] on the blocking pool, for use from async code.
pub async fn read_entries(path: &Path) -> anyhow::Result<Vec<String>> {
    let owned = path.to_path_buf();
    tokio::task::spawn_blocking(move || list_entries(&owned))
        .await
        .context("Package listing task failed")?
}
