//! Pipeline stages for media fitting.
//!
//! Each submodule owns one concern so it can be tested on its own.
//!
//! ## Data Flow
//!
//! ```text
//! intercept ──▶ mutate ──▶ dimension
//! (rule chain)  (policies)  (attrs / probe)
//!                  │
//!                  └──────▶ style
//!                           (inline CSS)
//! ```
//!
//! 1. [`intercept`]: decorate the renderer's inline-HTML, block-HTML and
//!    image rules; fall through to the previous rule on every path
//! 2. [`mutate`]:    locate target elements in a fragment and apply the
//!    resize or wrap policy
//! 3. [`dimension`]: intrinsic size from `width`/`height` or an image-header
//!    probe under `imgDir`
//! 4. [`style`]:     merge `aspect-ratio` and layout declarations into an
//!    existing `style` attribute

pub mod dimension;
pub mod intercept;
pub mod mutate;
pub mod style;
