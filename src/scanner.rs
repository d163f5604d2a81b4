//! Directory scanner producing media descriptors.
//!
//! Walks a directory tree and emits one [`MediaDescriptor`] per entry with
//! the modification time the cache uses as its freshness token. Filtering of
//! directories and unrecognized kinds is left to the batch driver.

use std::fs::Metadata;
use std::path::Path;
use std::time::UNIX_EPOCH;

use anyhow::Result;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::media::{MediaDescriptor, MediaKind};

/// Scan a directory tree into a deterministic, name-ordered listing.
pub fn scan_directory(root: &Path) -> Result<Vec<MediaDescriptor>> {
    info!(root = %root.display(), "scanning directory");
    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if path == root {
            continue;
        }

        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(err) => {
                debug!(path = %path.display(), error = %err, "skipping unreadable entry");
                continue;
            }
        };

        let kind = MediaKind::from_path(path);
        files.push(MediaDescriptor {
            kind,
            mtime: unix_mtime(&metadata),
            is_dir: metadata.is_dir(),
            path: entry.into_path(),
        });
    }

    info!(count = files.len(), "scan complete");
    Ok(files)
}

/// Modification time as whole seconds since the Unix epoch, 0 when the
/// filesystem cannot report one.
pub fn unix_mtime(metadata: &Metadata) -> i64 {
    metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_classifies_entries() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("a.png"), b"x").unwrap();
        std::fs::write(dir.path().join("b.mp4"), b"x").unwrap();
        std::fs::write(dir.path().join("c.txt"), b"x").unwrap();

        let files = scan_directory(dir.path()).unwrap();
        assert_eq!(files.len(), 4);

        let by_name = |name: &str| {
            files
                .iter()
                .find(|f| f.path.file_name().unwrap() == name)
                .unwrap()
        };
        assert_eq!(by_name("a.png").kind, Some(MediaKind::Image));
        assert_eq!(by_name("b.mp4").kind, Some(MediaKind::Video));
        assert_eq!(by_name("c.txt").kind, None);
        assert!(by_name("sub").is_dir);
        assert!(by_name("a.png").mtime > 0);
    }

    #[test]
    fn test_scan_is_name_ordered() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["c.png", "a.png", "b.png"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }

        let files = scan_directory(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|f| f.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.png", "b.png", "c.png"]);
    }
}
