//! Error types for the fit-media library.
//!
//! Failures split into two groups that are handled very differently:
//!
//! * **Recovered**: a probe that cannot size an image ([`FitError::ProbeFailed`],
//!   [`FitError::FileNotFound`], [`FitError::PermissionDenied`]) or a fragment
//!   the rewriter cannot process ([`FitError::FragmentRewrite`],
//!   [`FitError::InvalidSelector`]). These never leave a render call: the
//!   interceptor logs them and the token renders as if the plugin were absent.
//!
//! * **Surfaced**: reading the input document, writing the output file, or
//!   parsing a JSON option bag. These are returned from the
//!   [`crate::convert`] entry points and from [`crate::FitOptions::from_json`].

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the fit-media library.
#[derive(Debug, Error)]
pub enum FitError {
    // ── Probe errors ──────────────────────────────────────────────────────
    /// The media file referenced by `src` does not exist.
    #[error("Media file not found: '{path}'\nCheck imgDir and the src attribute.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the media file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file was read but its header could not be decoded as an image.
    #[error("Could not determine dimensions of '{path}': {detail}")]
    ProbeFailed { path: PathBuf, detail: String },

    // ── Fragment errors ───────────────────────────────────────────────────
    /// The HTML rewriter rejected the fragment or a mutation on it.
    #[error("Failed to rewrite HTML fragment: {0}")]
    FragmentRewrite(String),

    /// A configured element name is not a valid CSS selector.
    #[error("Invalid element selector '{selector}': {detail}")]
    InvalidSelector { selector: String, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// The element lists conflict with each other.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A JSON option bag could not be parsed.
    #[error("Failed to parse options: {0}")]
    ConfigParse(#[from] serde_json::Error),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not read the Markdown input.
    #[error("Failed to read input '{path}': {source}")]
    InputReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or write the output HTML file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FitError {
    /// `true` for failures that only mean "no usable dimensions".
    pub fn is_probe_failure(&self) -> bool {
        matches!(
            self,
            FitError::FileNotFound { .. }
                | FitError::PermissionDenied { .. }
                | FitError::ProbeFailed { .. }
        )
    }
}

impl From<lol_html::errors::RewritingError> for FitError {
    fn from(err: lol_html::errors::RewritingError) -> Self {
        FitError::FragmentRewrite(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_not_found_display() {
        let e = FitError::FileNotFound {
            path: PathBuf::from("images/missing.png"),
        };
        let msg = e.to_string();
        assert!(msg.contains("images/missing.png"), "got: {msg}");
        assert!(msg.contains("imgDir"));
    }

    #[test]
    fn probe_failed_display() {
        let e = FitError::ProbeFailed {
            path: PathBuf::from("notes.txt"),
            detail: "unsupported format".into(),
        };
        assert!(e.to_string().contains("notes.txt"));
        assert!(e.to_string().contains("unsupported format"));
    }

    #[test]
    fn probe_failures_are_classified() {
        assert!(FitError::FileNotFound { path: "a".into() }.is_probe_failure());
        assert!(FitError::PermissionDenied { path: "a".into() }.is_probe_failure());
        assert!(!FitError::FragmentRewrite("boom".into()).is_probe_failure());
        assert!(!FitError::InvalidConfig("bad".into()).is_probe_failure());
    }

    #[test]
    fn config_parse_wraps_serde_error() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let e = FitError::from(err);
        assert!(e.to_string().starts_with("Failed to parse options"));
    }

    #[test]
    fn invalid_selector_display() {
        let e = FitError::InvalidSelector {
            selector: "[[".into(),
            detail: "unexpected token".into(),
        };
        assert!(e.to_string().contains("[["));
    }
}
