use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::model::VirtualDiskImage;

/// Recursively search the given roots for files named `file_name` and return
/// one `VirtualDiskImage` per match, in discovery order.
///
/// Roots that do not exist are skipped silently — the absence of a storage
/// backend (e.g. Docker not installed) is expected. Unreadable subtrees are
/// skipped per-entry so one denied directory does not abort discovery
/// elsewhere. An empty result is not an error; the caller decides.
pub fn discover(roots: &[impl AsRef<Path>], file_name: &str) -> Vec<VirtualDiskImage> {
    let mut images: Vec<VirtualDiskImage> = Vec::new();

    for root in roots {
        let root = root.as_ref();
        if !root.is_dir() {
            debug!("Search root {} does not exist, skipping", root.display());
            continue;
        }

        for entry in WalkDir::new(root).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    debug!("Skipping unreadable entry under {}: {}", root.display(), err);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }
            // NTFS filenames are case-insensitive.
            if !entry
                .file_name()
                .to_string_lossy()
                .eq_ignore_ascii_case(file_name)
            {
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(err) => {
                    warn!(
                        "Could not read metadata for {}, skipping: {}",
                        entry.path().display(),
                        err
                    );
                    continue;
                }
            };

            let origin_directory = entry
                .path()
                .parent()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            images.push(VirtualDiskImage {
                path: entry.path().to_path_buf(),
                size_bytes_before: metadata.len(),
                last_modified: metadata.modified().ok(),
                origin_directory,
            });
        }
    }

    images
}
