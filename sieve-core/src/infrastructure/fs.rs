// sieve-core/src/infrastructure/fs.rs

use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use crate::infrastructure::error::InfrastructureError;

/// Stages `content` in a sibling temp file, then renames it over `path`.
/// Readers see the old file or the complete new one. Missing parent
/// directories are created.
pub fn atomic_write<P: AsRef<Path>, C: AsRef<[u8]>>(
    path: P,
    content: C,
) -> Result<(), InfrastructureError> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut staged = NamedTempFile::new_in(dir)?;
    staged.write_all(content.as_ref())?;
    staged.flush()?;
    staged
        .persist(path)
        .map_err(|e| InfrastructureError::Io(e.error))?;
    Ok(())
}

/// Pretty JSON, written atomically.
pub fn write_json<P: AsRef<Path>, T: Serialize + ?Sized>(
    path: P,
    value: &T,
) -> Result<(), InfrastructureError> {
    let content = serde_json::to_vec_pretty(value)?;
    atomic_write(path, content)
}
