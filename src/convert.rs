//! High-level entry points: Markdown in, fitted HTML out.
//!
//! These build a fresh [`Renderer`] with the plugin installed for each call.
//! Hosts that already own a renderer should call [`crate::fit_media`] on it
//! once and reuse it instead.

use crate::config::FitOptions;
use crate::error::FitError;
use crate::pipeline::intercept::fit_media;
use crate::renderer::{RenderEnv, Renderer};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// A default renderer with media fitting installed.
pub fn renderer_with(options: &FitOptions) -> Renderer {
    let mut renderer = Renderer::new();
    fit_media(&mut renderer, options.clone());
    renderer
}

/// Render a Markdown string to HTML with media fitting.
///
/// Never fails: anything the plugin cannot process renders unchanged.
pub fn render_markdown(markdown: &str, options: &FitOptions) -> String {
    renderer_with(options).render_markdown(markdown, &mut RenderEnv::default())
}

/// Read a Markdown file and render it.
///
/// Relative media paths are probed against `options.img_dir`, or the
/// process working directory when it is empty, not the file's directory.
pub fn render_file(path: impl AsRef<Path>, options: &FitOptions) -> Result<String, FitError> {
    let path = path.as_ref();
    let start = Instant::now();
    let markdown = std::fs::read_to_string(path).map_err(|e| FitError::InputReadFailed {
        path: path.to_path_buf(),
        source: e,
    })?;
    let html = render_markdown(&markdown, options);
    info!(
        "Rendered {} ({} → {} bytes) in {}ms",
        path.display(),
        markdown.len(),
        html.len(),
        start.elapsed().as_millis()
    );
    Ok(html)
}

/// Render a Markdown file and write the HTML to `output_path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub fn render_to_file(
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    options: &FitOptions,
) -> Result<(), FitError> {
    let html = render_file(input_path, options)?;
    let path = output_path.as_ref();
    let write_err = |e| FitError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }

    let tmp_path = path.with_extension("html.tmp");
    std::fs::write(&tmp_path, &html).map_err(write_err)?;
    std::fs::rename(&tmp_path, path).map_err(write_err)?;
    debug!("Wrote {}", path.display());
    Ok(())
}
