//! Element mutation: the resize and wrap policies.
//!
//! Fragments are streamed through `lol_html`, which touches only the start
//! tags of matched elements and passes every other byte through untouched.
//! Both policies report [`Mutation::Unchanged`] when no element qualified, so
//! the caller can keep the original markup byte-for-byte.
//!
//! The resize policy is written once against [`ElementView`] and shared by
//! HTML fragments and native Markdown image tokens.

use super::dimension::{self, Dimensions};
use super::style::{self, FLUID_LAYOUT, WRAPPED_ELEMENT_LAYOUT};
use crate::config::{FitOptions, FitStrategy};
use crate::error::FitError;
use crate::renderer::Token;
use html_escape::encode_double_quoted_attribute;
use lol_html::html_content::{ContentType, Element, EndTag};
use lol_html::{ElementContentHandlers, HtmlRewriter, Selector, Settings};
use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::error::Error;
use std::rc::Rc;
use tracing::debug;

/// Class carried by every wrapper inserted by the wrap policy.
pub const WRAPPER_CLASS: &str = "fit-media-wrapper";

/// Result of running a policy over a fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// At least one element was processed; the new fragment text.
    Mutated(String),
    /// Nothing qualified; render the original.
    Unchanged,
}

/// Attribute access shared by fragment elements and image tokens.
pub trait ElementView {
    fn tag_name(&self) -> String;
    fn attr(&self, name: &str) -> Option<String>;
    fn set_attr(&mut self, name: &str, value: &str) -> Result<(), FitError>;
    fn remove_attr(&mut self, name: &str);
}

impl ElementView for Element<'_, '_> {
    fn tag_name(&self) -> String {
        Element::tag_name(self)
    }

    fn attr(&self, name: &str) -> Option<String> {
        self.get_attribute(name)
    }

    fn set_attr(&mut self, name: &str, value: &str) -> Result<(), FitError> {
        self.set_attribute(name, value)
            .map_err(|e| FitError::FragmentRewrite(e.to_string()))
    }

    fn remove_attr(&mut self, name: &str) {
        self.remove_attribute(name);
    }
}

impl ElementView for Token {
    fn tag_name(&self) -> String {
        "img".to_string()
    }

    fn attr(&self, name: &str) -> Option<String> {
        Token::attr(self, name).map(str::to_string)
    }

    fn set_attr(&mut self, name: &str, value: &str) -> Result<(), FitError> {
        Token::set_attr(self, name, value);
        Ok(())
    }

    fn remove_attr(&mut self, name: &str) {
        Token::remove_attr(self, name);
    }
}

// ── Resize policy ────────────────────────────────────────────────────────

/// Stamp loading/decoding hints, then size the element from its dimensions.
///
/// Size-dependent steps are skipped when `src` is missing or no dimensions
/// can be resolved; the hints are applied regardless.
pub fn apply_resize(el: &mut impl ElementView, options: &FitOptions) -> Result<(), FitError> {
    if options.lazy_load {
        el.set_attr("loading", "lazy")?;
    }
    if let Some(hint) = options.decoding.attribute_value() {
        el.set_attr("decoding", hint)?;
    }

    let Some(src) = el.attr("src").filter(|s| !s.is_empty()) else {
        debug!("<{}> without src; hints only", el.tag_name());
        return Ok(());
    };

    let declared = if options.trust_dimension_attrs {
        Dimensions::from_attributes(el.attr("width").as_deref(), el.attr("height").as_deref())
    } else {
        None
    };
    let Some(dims) = declared.or_else(|| dimension::resolve(&src, options)) else {
        return Ok(());
    };

    if options.aspect_ratio {
        let composed = style::with_aspect_ratio(el.attr("style").as_deref(), dims.width, dims.height);
        el.set_attr("style", &composed)?;
    }
    if options.size_hint {
        el.set_attr("width", &dims.width.to_string())?;
        el.set_attr("height", &dims.height.to_string())?;
    }
    Ok(())
}

/// Apply the resize policy to every `resize_elements` match in `html`.
pub fn resize_fragment(html: &str, options: &FitOptions) -> Result<Mutation, FitError> {
    rewrite_fragment(html, &options.resize_elements, |el| {
        apply_resize(el, options)?;
        Ok(true)
    })
}

/// Apply the resize policy to a native Markdown image token.
pub fn resize_token(token: &mut Token, options: &FitOptions) -> Result<(), FitError> {
    apply_resize(token, options)
}

// ── Wrap policy ──────────────────────────────────────────────────────────

/// What [`apply_fit`] did to an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FitOutcome {
    /// Element restyled to fill a wrapper; the wrapper's style.
    Boxed(String),
    /// Element restyled in place.
    Fluid,
}

/// Fit one element by the configured strategy.
///
/// Returns `None`, touching nothing, unless the element carries positive
/// integer `width` and `height` attributes.
pub fn apply_fit(el: &mut impl ElementView, options: &FitOptions) -> Result<Option<FitOutcome>, FitError> {
    let Some(dims) =
        Dimensions::from_attributes(el.attr("width").as_deref(), el.attr("height").as_deref())
    else {
        debug!("<{}> lacks usable width/height; left as is", el.tag_name());
        return Ok(None);
    };

    match options.strategy {
        FitStrategy::Wrap => {
            el.remove_attr("width");
            el.remove_attr("height");
            let boxed = style::with_box_layout(el.attr("style").as_deref(), WRAPPED_ELEMENT_LAYOUT);
            el.set_attr("style", &boxed)?;
            Ok(Some(FitOutcome::Boxed(wrapper_style(dims, options))))
        }
        FitStrategy::AspectRatio => {
            let current = el.attr("style");
            let styled = if options.aspect_ratio {
                style::with_aspect_ratio(current.as_deref(), dims.width, dims.height)
            } else {
                current.unwrap_or_default()
            };
            el.set_attr("style", &style::with_box_layout(Some(&styled), FLUID_LAYOUT))?;
            Ok(Some(FitOutcome::Fluid))
        }
    }
}

/// Style of the padding-ratio container for an element of size `dims`.
pub fn wrapper_style(dims: Dimensions, options: &FitOptions) -> String {
    let padding = format!("padding-bottom:{}", dims.padding_percent());
    let base = style::with_box_layout(None, &["position:relative", "height:0", &padding]);
    if options.aspect_ratio {
        style::with_aspect_ratio(Some(&base), dims.width, dims.height)
    } else {
        base
    }
}

/// Apply the wrap policy to every `wrap_elements` match in `html`.
///
/// A wrapper is only kept for an element whose end tag is inside `html`, or
/// that has none (void elements). An element closed in a later fragment is
/// left as it was, so the wrapper `div` is always balanced.
pub fn wrap_fragment(html: &str, options: &FitOptions) -> Result<Mutation, FitError> {
    let (mutation, unclosed) = wrap_pass(html, options, &HashSet::new())?;
    if unclosed.is_empty() {
        return Ok(mutation);
    }
    debug!(
        "{} wrap target(s) not closed within the fragment; leaving them as is",
        unclosed.len()
    );
    let (mutation, _) = wrap_pass(html, options, &unclosed)?;
    Ok(mutation)
}

/// One rewrite of `html`, skipping the matches whose ordinal is in `skip`.
/// Also returns the ordinals that were wrapped but never saw an end tag.
fn wrap_pass(
    html: &str,
    options: &FitOptions,
    skip: &HashSet<usize>,
) -> Result<(Mutation, HashSet<usize>), FitError> {
    let mut seen = 0usize;
    let mut opened = HashSet::new();
    let closed = Rc::new(RefCell::new(HashSet::new()));

    let mutation = rewrite_fragment(html, &options.wrap_elements, |el| {
        let ordinal = seen;
        seen += 1;
        if skip.contains(&ordinal) {
            return Ok(false);
        }
        match apply_fit(el, options)? {
            Some(FitOutcome::Boxed(wrapper)) => {
                let open = format!(
                    r#"<div class="{WRAPPER_CLASS}" style="{}">"#,
                    encode_double_quoted_attribute(&wrapper)
                );
                el.before(&open, ContentType::Html);
                opened.insert(ordinal);
                match el.end_tag_handlers() {
                    Some(handlers) => {
                        let closed = Rc::clone(&closed);
                        handlers.push(Box::new(
                            move |end: &mut EndTag<'_>| -> Result<(), Box<dyn Error + Send + Sync>> {
                                end.after("</div>", ContentType::Html);
                                closed.borrow_mut().insert(ordinal);
                                Ok(())
                            },
                        ));
                    }
                    None => {
                        el.after("</div>", ContentType::Html);
                        closed.borrow_mut().insert(ordinal);
                    }
                }
                Ok(true)
            }
            Some(FitOutcome::Fluid) => Ok(true),
            None => Ok(false),
        }
    })?;

    let closed = closed.borrow();
    let unclosed = opened.difference(&closed).copied().collect();
    Ok((mutation, unclosed))
}

// ── Fragment plumbing ────────────────────────────────────────────────────

/// Stream `html` through the rewriter, calling `on_element` for every element
/// matching one of `selectors`. `on_element` returns whether it mutated.
fn rewrite_fragment<F>(html: &str, selectors: &[String], on_element: F) -> Result<Mutation, FitError>
where
    F: FnMut(&mut Element<'_, '_>) -> Result<bool, FitError>,
{
    if selectors.is_empty() || html.is_empty() {
        return Ok(Mutation::Unchanged);
    }

    let on_element = RefCell::new(on_element);
    let hits = Cell::new(0usize);

    let mut handlers = Vec::with_capacity(selectors.len());
    for selector in selectors {
        let parsed: Selector = selector.parse().map_err(|e: lol_html::errors::SelectorError| {
            FitError::InvalidSelector {
                selector: selector.clone(),
                detail: e.to_string(),
            }
        })?;
        let handler = ElementContentHandlers::default().element(
            |el: &mut Element<'_, '_>| -> Result<(), Box<dyn Error + Send + Sync>> {
                if (&mut *on_element.borrow_mut())(el)? {
                    hits.set(hits.get() + 1);
                }
                Ok(())
            },
        );
        handlers.push((Cow::Owned(parsed), handler));
    }

    let mut output = Vec::with_capacity(html.len() + 128);
    {
        let mut rewriter = HtmlRewriter::new(
            Settings {
                element_content_handlers: handlers,
                ..Settings::default()
            },
            |chunk: &[u8]| output.extend_from_slice(chunk),
        );
        rewriter.write(html.as_bytes())?;
        rewriter.end()?;
    }

    if hits.get() == 0 {
        return Ok(Mutation::Unchanged);
    }
    String::from_utf8(output)
        .map(Mutation::Mutated)
        .map_err(|e| FitError::FragmentRewrite(e.to_string()))
}
