//! Media kinds and descriptors.
//!
//! Provides extension-based detection of the preview strategy for a file:
//! single-image thumbnail, sampled video filmstrip, or sampled animated-image
//! filmstrip.

use std::fmt;
use std::path::{Path, PathBuf};

/// Supported still-image file extensions.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "bmp", "tiff", "tif"];

/// Supported video file extensions.
const VIDEO_EXTENSIONS: &[&str] = &[
    "mkv", "mp4", "avi", "m4v", "ts", "webm", "mov", "wmv", "flv",
];

/// Supported animated-image file extensions (frame-indexable decode).
const ANIMATED_EXTENSIONS: &[&str] = &["gif"];

/// How a file should be turned into a preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    /// Still image: a single-cell thumbnail.
    Image,
    /// Video: a filmstrip of frames sampled at evenly spaced timestamps.
    Video,
    /// Animated image: a filmstrip of frames sampled at evenly spaced indices.
    Animated,
}

impl MediaKind {
    /// Detect the media kind of a path from its extension, if recognized.
    pub fn from_path(path: &Path) -> Option<MediaKind> {
        let ext = path.extension().and_then(|e| e.to_str())?.to_lowercase();
        let ext = ext.as_str();
        if ANIMATED_EXTENSIONS.contains(&ext) {
            Some(MediaKind::Animated)
        } else if IMAGE_EXTENSIONS.contains(&ext) {
            Some(MediaKind::Image)
        } else if VIDEO_EXTENSIONS.contains(&ext) {
            Some(MediaKind::Video)
        } else {
            None
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Image => write!(f, "image"),
            MediaKind::Video => write!(f, "video"),
            MediaKind::Animated => write!(f, "animated"),
        }
    }
}

/// A file as supplied by the enumeration side (directory scanner or caller).
#[derive(Debug, Clone)]
pub struct MediaDescriptor {
    /// Absolute or caller-relative path; the cache key.
    pub path: PathBuf,
    /// Detected media kind, or `None` when the extension is unrecognized.
    pub kind: Option<MediaKind>,
    /// Modification time in seconds since the Unix epoch; the freshness token.
    pub mtime: i64,
    /// Directories are never previewed.
    pub is_dir: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_extensions() {
        assert_eq!(MediaKind::from_path(Path::new("photo.JPG")), Some(MediaKind::Image));
        assert_eq!(MediaKind::from_path(Path::new("/a/b/pic.png")), Some(MediaKind::Image));
        assert_eq!(MediaKind::from_path(Path::new("pic.webp")), Some(MediaKind::Image));
    }

    #[test]
    fn test_video_extensions() {
        assert_eq!(MediaKind::from_path(Path::new("clip.mkv")), Some(MediaKind::Video));
        assert_eq!(MediaKind::from_path(Path::new("clip.MP4")), Some(MediaKind::Video));
    }

    #[test]
    fn test_animated_beats_image() {
        assert_eq!(MediaKind::from_path(Path::new("loop.gif")), Some(MediaKind::Animated));
    }

    #[test]
    fn test_unrecognized() {
        assert_eq!(MediaKind::from_path(Path::new("notes.txt")), None);
        assert_eq!(MediaKind::from_path(Path::new("no_extension")), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(MediaKind::Video.to_string(), "video");
        assert_eq!(MediaKind::Animated.to_string(), "animated");
    }
}
