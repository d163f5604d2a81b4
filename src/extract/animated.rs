//! Frame-indexable decoding of animated images.
//!
//! Only containers with a frame-indexable decoder are accepted; anything else
//! fails fast with an unsupported error rather than attempting a partial
//! still-image fallback.

use std::io::Cursor;
use std::path::Path;

use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, RgbaImage};

use crate::error::{Error, Result};

/// Decode every frame of the first (and only) track of an animated image.
pub fn decode_frames(path: &Path, bytes: Vec<u8>) -> Result<Vec<RgbaImage>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    let frames = match ext.as_str() {
        "gif" => {
            let decoder = GifDecoder::new(Cursor::new(bytes))?;
            decoder.into_frames().collect_frames()?
        }
        other => {
            return Err(Error::unsupported(format!(
                "no frame-indexable decoder for '{other}' files"
            )));
        }
    };

    if frames.is_empty() {
        return Err(Error::decode(format!(
            "animation {} has no frames",
            path.display()
        )));
    }

    Ok(frames.into_iter().map(|f| f.into_buffer()).collect())
}

/// Evenly spaced frame indices across a track of `total` frames.
///
/// Indices may repeat when the track is shorter than the sample count.
pub fn sample_indices(total: usize, count: usize) -> Vec<usize> {
    debug_assert!(total > 0);
    (0..count)
        .map(|i| {
            if count == 1 {
                0
            } else {
                i * (total - 1) / (count - 1)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::gif::GifEncoder;
    use image::{Delay, Frame, Rgba};

    fn gif_bytes(frame_count: usize) -> Vec<u8> {
        let mut out = Vec::new();
        {
            let mut encoder = GifEncoder::new(&mut out);
            for i in 0..frame_count {
                let buffer =
                    RgbaImage::from_pixel(8, 8, Rgba([(i * 10) as u8, 0, 0, 255]));
                let frame =
                    Frame::from_parts(buffer, 0, 0, Delay::from_numer_denom_ms(100, 1));
                encoder.encode_frame(frame).unwrap();
            }
        }
        out
    }

    #[test]
    fn test_decode_gif_frames() {
        let frames = decode_frames(Path::new("loop.gif"), gif_bytes(4)).unwrap();
        assert_eq!(frames.len(), 4);
        assert_eq!(frames[0].dimensions(), (8, 8));
    }

    #[test]
    fn test_unsupported_container_fails_fast() {
        let err = decode_frames(Path::new("anim.webp"), vec![1, 2, 3]).unwrap_err();
        assert!(matches!(err, Error::Unsupported(_)));
    }

    #[test]
    fn test_corrupt_gif_is_decode_error() {
        let err = decode_frames(Path::new("bad.gif"), vec![0; 16]).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn test_sample_indices_even_spread() {
        assert_eq!(sample_indices(100, 5), vec![0, 24, 49, 74, 99]);
        assert_eq!(sample_indices(5, 5), vec![0, 1, 2, 3, 4]);
        assert_eq!(sample_indices(2, 5), vec![0, 0, 0, 0, 1]);
        assert_eq!(sample_indices(1, 5), vec![0, 0, 0, 0, 0]);
        assert_eq!(sample_indices(10, 1), vec![0]);
    }
}
