//! Rule interception: wire the mutators into a renderer's output stages.
//!
//! Each interceptor is a [`Rule`] decorator installed with
//! [`Renderer::wrap_rule`], so it holds the rule that was registered before
//! it as `next`. On every call it:
//!
//! 1. runs its mutator on the token,
//! 2. writes a replacement fragment back into the token on success,
//! 3. always delegates to `next`.
//!
//! With the built-in rule at the end of the chain, step 3 returns the
//! replacement verbatim. With several installs, each layer sees the token as
//! left by the layers outside it, so every configuration's mutations land.
//! A mutator error is logged and the token renders through `next` exactly as
//! it arrived.

use super::mutate::{self, Mutation};
use crate::config::FitOptions;
use crate::error::FitError;
use crate::renderer::{Renderer, Rule, TokenKind};
use std::sync::Arc;
use tracing::{debug, warn};

type FragmentMutator = fn(&str, &FitOptions) -> Result<Mutation, FitError>;

/// Install media fitting on `renderer`.
///
/// Wraps the inline-HTML, block-HTML and image rules with the resize policy,
/// then the block-HTML rule again with the wrap policy. May be called more
/// than once; later installs run before earlier ones and both apply.
///
/// ```rust
/// use fit_media::{fit_media, FitOptions, RenderEnv, Renderer};
///
/// let mut renderer = Renderer::new();
/// fit_media(&mut renderer, FitOptions::default());
/// let html = renderer.render_markdown(
///     "<iframe width=\"640\" height=\"360\" src=\"https://v.example/1\"></iframe>\n",
///     &mut RenderEnv::default(),
/// );
/// assert!(html.contains("padding-bottom:56.25%"));
/// ```
pub fn fit_media(renderer: &mut Renderer, options: FitOptions) {
    let options = Arc::new(options);
    fit_images(renderer, &options);
    fit_elements(renderer, &options);
}

fn fit_images(renderer: &mut Renderer, options: &Arc<FitOptions>) {
    intercept_html(
        renderer,
        TokenKind::HtmlInline,
        options,
        "adjusting img",
        mutate::resize_fragment,
    );
    intercept_html(
        renderer,
        TokenKind::HtmlBlock,
        options,
        "adjusting img",
        mutate::resize_fragment,
    );
    intercept_image(renderer, options);
}

fn fit_elements(renderer: &mut Renderer, options: &Arc<FitOptions>) {
    intercept_html(
        renderer,
        TokenKind::HtmlBlock,
        options,
        "fitting media element",
        mutate::wrap_fragment,
    );
}

fn intercept_html(
    renderer: &mut Renderer,
    kind: TokenKind,
    options: &Arc<FitOptions>,
    stage: &'static str,
    mutator: FragmentMutator,
) {
    let options = Arc::clone(options);
    renderer.wrap_rule(kind, move |next| {
        Rule::new(move |tokens, idx, render_options, env, renderer| {
            match mutator(&tokens[idx].content, &options) {
                Ok(Mutation::Mutated(html)) => {
                    debug!("{:?} token {} rewritten while {}", kind, idx, stage);
                    tokens[idx].content = html;
                }
                Ok(Mutation::Unchanged) => {}
                Err(e) => warn!("Failure when {}: {}", stage, e),
            }
            next.call(tokens, idx, render_options, env, renderer)
        })
    });
}

fn intercept_image(renderer: &mut Renderer, options: &Arc<FitOptions>) {
    let options = Arc::clone(options);
    renderer.wrap_rule(TokenKind::Image, move |next| {
        Rule::new(move |tokens, idx, render_options, env, renderer| {
            let original = tokens[idx].attrs.clone();
            if let Err(e) = mutate::resize_token(&mut tokens[idx], &options) {
                warn!("Failure when adjusting img: {}", e);
                tokens[idx].attrs = original;
            }
            next.call(tokens, idx, render_options, env, renderer)
        })
    });
}
