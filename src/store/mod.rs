pub mod codes;
pub mod listings;

pub use codes::{CodeStore, MarkOutcome};
pub use listings::ListingStore;

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Replace a file's contents in one step: write a sibling temp file, then rename over the target
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = Path::new(&tmp);

    fs::write(tmp, contents).with_context(|| format!("Failed to write {}", tmp.display()))?;
    fs::rename(tmp, path).with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}
