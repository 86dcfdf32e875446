//! # fit-media
//!
//! Reserve the on-page footprint of `img`, `iframe` and `video` elements in
//! rendered Markdown, so pages do not shift while media loads.
//!
//! ## How it works
//!
//! The plugin decorates three output-stage rules of a [`Renderer`]: inline
//! HTML, block HTML and native Markdown images. Before a rule emits a token,
//! the matching policy rewrites it:
//!
//! * **Resize** (`img` by default): `loading="lazy"`, an optional
//!   `decoding` hint, `aspect-ratio` in the inline style and the intrinsic
//!   `width`/`height`, read from the attributes or probed from the image file.
//! * **Wrap** (`iframe`, `video` by default): explicit `width`/`height` are
//!   moved into a `padding-bottom` ratio box and the element fills it.
//!
//! Anything that cannot be processed renders exactly as it would without the
//! plugin.
//!
//! ## Pipeline Overview
//!
//! ```text
//! Markdown
//!  │
//!  ├─ 1. Parse      pulldown-cmark events; raw HTML and images lifted to tokens
//!  ├─ 2. Intercept  decorated rule chain per token kind
//!  ├─ 3. Mutate     lol_html rewrite of matched elements
//!  ├─ 4. Measure    attributes, else image-header probe under imgDir
//!  ├─ 5. Style      aspect-ratio / layout declarations merged into style=""
//!  └─ 6. Output     tokens spliced back into the HTML stream
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fit_media::{render_markdown, FitOptions};
//!
//! let options = FitOptions::builder().img_dir("site/").build().unwrap();
//! let html = render_markdown("![Hero](images/hero.png)", &options);
//! println!("{html}");
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `fitmedia` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod markdown;
pub mod pipeline;
pub mod renderer;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{Decoding, FitOptions, FitOptionsBuilder, FitStrategy, RawFitOptions};
pub use convert::{render_file, render_markdown, render_to_file, renderer_with};
pub use error::FitError;
pub use pipeline::dimension::Dimensions;
pub use pipeline::intercept::fit_media;
pub use pipeline::mutate::Mutation;
pub use renderer::{RenderEnv, RenderOptions, Renderer, Rule, Token, TokenKind};
