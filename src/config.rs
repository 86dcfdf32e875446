//! Configuration types for media fitting.
//!
//! Every behaviour of the plugin is controlled through [`FitOptions`], built
//! once per renderer installation and read-only afterwards. Two ways in:
//!
//! * [`FitOptions::builder()`] for Rust callers.
//! * [`RawFitOptions`], the camelCase option bag (`imgDir`, `imgLazyLoad`, …)
//!   accepted from JSON, normalised by [`RawFitOptions::normalize`].
//!
//! Legacy option names are resolved in a fixed priority order: the current
//! name wins, then the legacy alias, then the default.
//!
//! | Current name      | Legacy alias  | Default              |
//! |-------------------|---------------|----------------------|
//! | `imgLazyLoad`     | `lazyLoad`    | `true`               |
//! | `imgDecoding`     | `decoding`    | `"auto"`             |
//! | `imgSizeHint`     | `sizeHint`    | `true`               |
//! | `fitWrapElements` | `fitElements` | `["iframe","video"]` |

use crate::error::FitError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Immutable options consumed by every stage of the fitting pipeline.
///
/// # Example
/// ```rust
/// use fit_media::{Decoding, FitOptions};
///
/// let options = FitOptions::builder()
///     .img_dir("public/")
///     .decoding(Decoding::Async)
///     .wrap_elements(["iframe"])
///     .build()
///     .unwrap();
/// assert!(options.lazy_load);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FitOptions {
    /// Prefix prepended to `src` before probing. Empty probes `src` as given.
    ///
    /// The prefix is concatenated, not joined: `"public/"` + `"a.png"`.
    pub img_dir: String,

    /// Stamp `loading="lazy"` on resized images. Default: true.
    pub lazy_load: bool,

    /// Decoding hint stamped on resized images unless [`Decoding::Auto`].
    pub decoding: Decoding,

    /// Inject `aspect-ratio` declarations. Default: true.
    pub aspect_ratio: bool,

    /// Stamp resolved `width`/`height` attributes on resized images. Default: true.
    pub size_hint: bool,

    /// Tag names resized in place. Default: `["img"]`.
    pub resize_elements: Vec<String>,

    /// Tag names fitted with [`FitOptions::strategy`]. Default: `["iframe", "video"]`.
    pub wrap_elements: Vec<String>,

    /// How `wrap_elements` are fitted. Default: [`FitStrategy::Wrap`].
    pub strategy: FitStrategy,

    /// Use valid pre-existing `width`/`height` attributes on resize targets
    /// instead of probing the file. Default: true.
    pub trust_dimension_attrs: bool,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            img_dir: String::new(),
            lazy_load: true,
            decoding: Decoding::default(),
            aspect_ratio: true,
            size_hint: true,
            resize_elements: vec!["img".to_string()],
            wrap_elements: vec!["iframe".to_string(), "video".to_string()],
            strategy: FitStrategy::default(),
            trust_dimension_attrs: true,
        }
    }
}

impl FitOptions {
    /// Create a new builder starting from the defaults.
    pub fn builder() -> FitOptionsBuilder {
        FitOptionsBuilder {
            options: Self::default(),
        }
    }

    /// Parse, normalise and validate a JSON option bag.
    pub fn from_json(json: &str) -> Result<Self, FitError> {
        validate(RawFitOptions::from_json(json)?.normalize())
    }
}

impl From<RawFitOptions> for FitOptions {
    fn from(raw: RawFitOptions) -> Self {
        raw.normalize()
    }
}

/// Builder for [`FitOptions`].
#[derive(Debug)]
pub struct FitOptionsBuilder {
    options: FitOptions,
}

impl FitOptionsBuilder {
    pub fn img_dir(mut self, dir: impl Into<String>) -> Self {
        self.options.img_dir = dir.into();
        self
    }

    pub fn lazy_load(mut self, v: bool) -> Self {
        self.options.lazy_load = v;
        self
    }

    pub fn decoding(mut self, decoding: Decoding) -> Self {
        self.options.decoding = decoding;
        self
    }

    pub fn aspect_ratio(mut self, v: bool) -> Self {
        self.options.aspect_ratio = v;
        self
    }

    pub fn size_hint(mut self, v: bool) -> Self {
        self.options.size_hint = v;
        self
    }

    pub fn resize_elements<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.resize_elements = normalize_elements(names);
        self
    }

    pub fn wrap_elements<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.wrap_elements = normalize_elements(names);
        self
    }

    pub fn strategy(mut self, strategy: FitStrategy) -> Self {
        self.options.strategy = strategy;
        self
    }

    pub fn trust_dimension_attrs(mut self, v: bool) -> Self {
        self.options.trust_dimension_attrs = v;
        self
    }

    /// Build the options, checking the element lists.
    pub fn build(self) -> Result<FitOptions, FitError> {
        validate(self.options)
    }
}

/// Every element name must be a usable selector, and no element may be both
/// resized and wrapped.
fn validate(options: FitOptions) -> Result<FitOptions, FitError> {
    for name in options.resize_elements.iter().chain(&options.wrap_elements) {
        name.parse::<lol_html::Selector>()
            .map_err(|e| FitError::InvalidSelector {
                selector: name.clone(),
                detail: e.to_string(),
            })?;
    }
    if let Some(name) = options
        .resize_elements
        .iter()
        .find(|name| options.wrap_elements.contains(*name))
    {
        return Err(FitError::InvalidConfig(format!(
            "'{name}' is listed in both resizeElements and fitWrapElements"
        )));
    }
    Ok(options)
}

/// Trim, lowercase and drop empty or repeated element names.
fn normalize_elements<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut out: Vec<String> = Vec::new();
    for name in names.into_iter().map(|n| n.into().trim().to_ascii_lowercase()) {
        if !name.is_empty() && !out.contains(&name) {
            out.push(name);
        }
    }
    out
}

// ── Raw option bag ───────────────────────────────────────────────────────

/// Caller-supplied options as they appear in JSON, aliases included.
///
/// Every field is optional; [`RawFitOptions::normalize`] fills the gaps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawFitOptions {
    pub img_dir: Option<String>,
    pub img_lazy_load: Option<bool>,
    /// Legacy alias of `imgLazyLoad`.
    pub lazy_load: Option<bool>,
    pub img_decoding: Option<String>,
    /// Legacy alias of `imgDecoding`.
    pub decoding: Option<String>,
    pub aspect_ratio: Option<bool>,
    pub img_size_hint: Option<bool>,
    /// Legacy alias of `imgSizeHint`.
    pub size_hint: Option<bool>,
    pub fit_wrap_elements: Option<Vec<String>>,
    /// Legacy alias of `fitWrapElements`.
    pub fit_elements: Option<Vec<String>>,
    pub resize_elements: Option<Vec<String>>,
    pub fit_strategy: Option<FitStrategy>,
    pub trust_dimension_attrs: Option<bool>,
}

impl RawFitOptions {
    pub fn from_json(json: &str) -> Result<Self, FitError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Merge over the defaults and resolve legacy aliases.
    pub fn normalize(self) -> FitOptions {
        let defaults = FitOptions::default();

        let decoding = match self.img_decoding.or(self.decoding) {
            Some(value) => value.parse().unwrap_or_else(|e: String| {
                warn!("{e}; falling back to \"auto\"");
                Decoding::Auto
            }),
            None => defaults.decoding,
        };

        FitOptions {
            img_dir: self.img_dir.unwrap_or(defaults.img_dir),
            lazy_load: self
                .img_lazy_load
                .or(self.lazy_load)
                .unwrap_or(defaults.lazy_load),
            decoding,
            aspect_ratio: self.aspect_ratio.unwrap_or(defaults.aspect_ratio),
            size_hint: self
                .img_size_hint
                .or(self.size_hint)
                .unwrap_or(defaults.size_hint),
            resize_elements: self
                .resize_elements
                .map(normalize_elements)
                .unwrap_or(defaults.resize_elements),
            wrap_elements: self
                .fit_wrap_elements
                .or(self.fit_elements)
                .map(normalize_elements)
                .unwrap_or(defaults.wrap_elements),
            strategy: self.fit_strategy.unwrap_or(defaults.strategy),
            trust_dimension_attrs: self
                .trust_dimension_attrs
                .unwrap_or(defaults.trust_dimension_attrs),
        }
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Value of the `decoding` attribute stamped on images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decoding {
    /// Browser default; no attribute is written. (default)
    #[default]
    Auto,
    Sync,
    Async,
}

impl Decoding {
    /// The attribute value to write, or `None` for [`Decoding::Auto`].
    pub fn attribute_value(self) -> Option<&'static str> {
        match self {
            Decoding::Auto => None,
            Decoding::Sync => Some("sync"),
            Decoding::Async => Some("async"),
        }
    }
}

impl FromStr for Decoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" | "" => Ok(Decoding::Auto),
            "sync" => Ok(Decoding::Sync),
            "async" => Ok(Decoding::Async),
            other => Err(format!("unsupported decoding hint '{other}'")),
        }
    }
}

impl fmt::Display for Decoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.attribute_value().unwrap_or("auto"))
    }
}

/// How elements in [`FitOptions::wrap_elements`] reserve their footprint.
///
/// | Strategy | Output |
/// |----------|--------|
/// | `Wrap` | element absolutely positioned inside a padding-ratio `div` |
/// | `AspectRatio` | element keeps its place; gets `aspect-ratio` and fluid width |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FitStrategy {
    /// Padding-ratio wrapper box. (default)
    #[default]
    Wrap,
    /// In-place `aspect-ratio` plus `width:100%; max-width:100%; height:auto;`.
    AspectRatio,
}
