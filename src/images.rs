/// Loading picked image files
///
/// Picked files are read on the tokio runtime so the UI never blocks. Files
/// are read concurrently but handed back in the order they were picked.

use std::io::Cursor;
use std::path::PathBuf;

use image::ImageReader;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ImageLoadError {
    #[error("could not read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not a readable image: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("image loader task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Pixel size of an encoded image, without decoding the pixels
pub fn dimensions(bytes: &[u8]) -> Result<(u32, u32), image::ImageError> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .into_dimensions()
}

/// Read one image file and check that it holds a decodable image
pub async fn load_image(path: PathBuf) -> Result<Vec<u8>, ImageLoadError> {
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|source| ImageLoadError::Read {
            path: path.clone(),
            source,
        })?;
    dimensions(&bytes).map_err(|source| ImageLoadError::Decode {
        path: path.clone(),
        source,
    })?;
    debug!(path = %path.display(), bytes = bytes.len(), "image loaded");
    Ok(bytes)
}

/// Load several images concurrently, returning them in the order given.
///
/// Files that fail to load are logged and left out; the rest keep their
/// relative order no matter which read finishes first.
pub async fn load_images_in_order(paths: Vec<PathBuf>) -> Vec<Vec<u8>> {
    let handles: Vec<_> = paths
        .into_iter()
        .map(|path| {
            let task_path = path.clone();
            (path, tokio::spawn(load_image(task_path)))
        })
        .collect();

    let mut loaded = Vec::with_capacity(handles.len());
    for (path, handle) in handles {
        match handle.await.map_err(ImageLoadError::from).and_then(|r| r) {
            Ok(bytes) => loaded.push(bytes),
            Err(e) => warn!(path = %path.display(), error = %e, "skipping picked image"),
        }
    }
    loaded
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbImage};
    use std::path::Path;

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.join(name);
        RgbImage::new(width, height)
            .save_with_format(&path, ImageFormat::Png)
            .unwrap();
        path
    }

    #[test]
    fn test_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "a.png", 7, 3);
        let bytes = std::fs::read(path).unwrap();
        assert_eq!(dimensions(&bytes).unwrap(), (7, 3));
        assert!(dimensions(b"not an image").is_err());
    }

    #[tokio::test]
    async fn test_load_keeps_submission_order() {
        let dir = tempfile::tempdir().unwrap();
        // Larger files first so later reads tend to finish earlier
        let paths = vec![
            write_png(dir.path(), "big.png", 900, 900),
            write_png(dir.path(), "medium.png", 200, 100),
            write_png(dir.path(), "small.png", 2, 2),
        ];
        let expected: Vec<Vec<u8>> = paths.iter().map(|p| std::fs::read(p).unwrap()).collect();

        let loaded = load_images_in_order(paths).await;
        assert_eq!(loaded, expected);
    }

    #[tokio::test]
    async fn test_failed_loads_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let junk = dir.path().join("junk.png");
        std::fs::write(&junk, b"nope").unwrap();
        let paths = vec![
            write_png(dir.path(), "first.png", 4, 4),
            junk,
            dir.path().join("missing.png"),
            write_png(dir.path(), "last.png", 5, 5),
        ];

        let loaded = load_images_in_order(paths).await;
        assert_eq!(loaded.len(), 2);
        assert_eq!(dimensions(&loaded[0]).unwrap(), (4, 4));
        assert_eq!(dimensions(&loaded[1]).unwrap(), (5, 5));
    }

    #[tokio::test]
    async fn test_load_image_errors() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_image(dir.path().join("missing.png")).await.unwrap_err();
        assert!(matches!(err, ImageLoadError::Read { .. }));
    }
}
