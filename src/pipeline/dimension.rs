//! Dimension resolution: explicit attributes or an image-header probe.
//!
//! Probing reads only the image header through the `image` crate's reader;
//! no pixels are decoded. Remote references are never fetched, so anything
//! that looks like a URL is reported unavailable without touching the disk.

use crate::config::FitOptions;
use crate::error::FitError;
use image::ImageReader;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Intrinsic pixel size of a media resource. Both sides are positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    /// `None` unless both sides are positive.
    pub fn new(width: u32, height: u32) -> Option<Self> {
        (width > 0 && height > 0).then_some(Self { width, height })
    }

    /// Dimensions from `width`/`height` attribute values; both must parse.
    pub fn from_attributes(width: Option<&str>, height: Option<&str>) -> Option<Self> {
        Self::new(parse_leading_int(width?)?, parse_leading_int(height?)?)
    }

    /// `"{width}/{height}"`, the value of an `aspect-ratio` declaration.
    pub fn ratio(&self) -> String {
        format!("{}/{}", self.width, self.height)
    }

    /// `height / width * 100` as a CSS percentage, e.g. `"56.25%"`.
    pub fn padding_percent(&self) -> String {
        format!("{}%", self.height as f64 / self.width as f64 * 100.0)
    }
}

/// Leading-integer parse: `" 640px"` → 640, `"abc"` / `"-3"` → `None`.
pub fn parse_leading_int(value: &str) -> Option<u32> {
    let s = value.trim_start();
    let s = s.strip_prefix('+').unwrap_or(s);
    let end = s
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map_or(s.len(), |(i, _)| i);
    s[..end].parse().ok()
}

/// Check if a source reference points at a remote or inline resource.
pub fn is_remote(src: &str) -> bool {
    let lower = src.trim_start().to_ascii_lowercase();
    lower.starts_with("http://")
        || lower.starts_with("https://")
        || lower.starts_with("//")
        || lower.starts_with("data:")
}

/// The location probed for `src`: `img_dir` and `src` concatenated as text.
pub fn candidate_path(src: &str, img_dir: &str) -> PathBuf {
    if img_dir.is_empty() {
        PathBuf::from(src)
    } else {
        PathBuf::from(format!("{img_dir}{src}"))
    }
}

/// Read the image header at `path` and return its pixel size.
pub fn probe(path: &Path) -> Result<Dimensions, FitError> {
    let reader = ImageReader::open(path).map_err(|e| io_error(path, e))?;
    let reader = reader.with_guessed_format().map_err(|e| io_error(path, e))?;
    let (width, height) = reader.into_dimensions().map_err(|e| match e {
        image::ImageError::IoError(io) => io_error(path, io),
        other => FitError::ProbeFailed {
            path: path.to_path_buf(),
            detail: other.to_string(),
        },
    })?;
    Dimensions::new(width, height).ok_or_else(|| FitError::ProbeFailed {
        path: path.to_path_buf(),
        detail: format!("degenerate size {width}x{height}"),
    })
}

fn io_error(path: &Path, err: std::io::Error) -> FitError {
    let path = path.to_path_buf();
    match err.kind() {
        ErrorKind::NotFound => FitError::FileNotFound { path },
        ErrorKind::PermissionDenied => FitError::PermissionDenied { path },
        _ => FitError::ProbeFailed {
            path,
            detail: err.to_string(),
        },
    }
}

/// Resolve the intrinsic size of `src`, or `None` when it cannot be probed.
///
/// Failures are logged and swallowed: the caller skips size-dependent
/// mutations and carries on.
pub fn resolve(src: &str, options: &FitOptions) -> Option<Dimensions> {
    if is_remote(src) {
        debug!("Not probing remote source '{}'", src);
        return None;
    }

    let path = candidate_path(src, &options.img_dir);
    match probe(&path) {
        Ok(dims) => {
            debug!("Probed {} → {}x{}", path.display(), dims.width, dims.height);
            Some(dims)
        }
        Err(e) => {
            warn!("{}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use tempfile::TempDir;

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.join(name);
        RgbaImage::from_pixel(width, height, Rgba([0, 128, 255, 255]))
            .save(&path)
            .expect("write png fixture");
        path
    }

    #[test]
    fn test_parse_leading_int() {
        assert_eq!(parse_leading_int("640"), Some(640));
        assert_eq!(parse_leading_int(" 640px"), Some(640));
        assert_eq!(parse_leading_int("+12"), Some(12));
        assert_eq!(parse_leading_int("56.9"), Some(56));
        assert_eq!(parse_leading_int("abc"), None);
        assert_eq!(parse_leading_int("-3"), None);
        assert_eq!(parse_leading_int(""), None);
    }

    #[test]
    fn test_from_attributes_requires_both_positive() {
        assert_eq!(
            Dimensions::from_attributes(Some("640"), Some("360")),
            Dimensions::new(640, 360)
        );
        assert_eq!(Dimensions::from_attributes(Some("640"), None), None);
        assert_eq!(Dimensions::from_attributes(Some("0"), Some("360")), None);
    }

    #[test]
    fn test_padding_percent() {
        let d = Dimensions::new(640, 360).unwrap();
        assert_eq!(d.padding_percent(), "56.25%");
        assert_eq!(d.ratio(), "640/360");
        assert_eq!(Dimensions::new(10, 10).unwrap().padding_percent(), "100%");
    }

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://example.com/a.png"));
        assert!(is_remote("HTTP://example.com/a.png"));
        assert!(is_remote("//cdn.example.com/a.png"));
        assert!(is_remote("data:image/png;base64,AAAA"));
        assert!(!is_remote("/images/a.png"));
        assert!(!is_remote("a.png"));
    }

    #[test]
    fn test_candidate_path_concatenates() {
        assert_eq!(candidate_path("a.png", ""), PathBuf::from("a.png"));
        assert_eq!(candidate_path("/a.png", "public"), PathBuf::from("public/a.png"));
        assert_eq!(candidate_path("a.png", "public/"), PathBuf::from("public/a.png"));
    }

    #[test]
    fn test_probe_png() {
        let dir = TempDir::new().unwrap();
        let path = write_png(dir.path(), "hero.png", 32, 18);
        assert_eq!(probe(&path).unwrap(), Dimensions::new(32, 18).unwrap());
    }

    #[test]
    fn test_probe_ignores_misleading_extension() {
        let dir = TempDir::new().unwrap();
        let png = write_png(dir.path(), "real.png", 7, 3);
        let disguised = dir.path().join("real.jpg");
        std::fs::copy(&png, &disguised).unwrap();
        assert_eq!(probe(&disguised).unwrap(), Dimensions::new(7, 3).unwrap());
    }

    #[test]
    fn test_probe_missing_file() {
        let err = probe(Path::new("definitely/missing.png")).unwrap_err();
        assert!(matches!(err, FitError::FileNotFound { .. }), "got {err:?}");
    }

    #[test]
    fn test_probe_not_an_image() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.png");
        std::fs::write(&path, b"these are not pixels").unwrap();
        let err = probe(&path).unwrap_err();
        assert!(err.is_probe_failure());
    }

    #[test]
    fn test_resolve_uses_img_dir_prefix() {
        let dir = TempDir::new().unwrap();
        write_png(dir.path(), "pic.png", 4, 2);
        let options = FitOptions {
            img_dir: format!("{}/", dir.path().display()),
            ..FitOptions::default()
        };
        assert_eq!(resolve("pic.png", &options), Dimensions::new(4, 2));
        assert_eq!(resolve("other.png", &options), None);
    }

    #[test]
    fn test_resolve_skips_remote() {
        assert_eq!(resolve("https://example.com/a.png", &FitOptions::default()), None);
    }
}
