//! Token model and output-stage rule registry.
//!
//! A [`Renderer`] turns a stream of [`Token`]s into HTML by dispatching each
//! token to the [`Rule`] registered for its [`TokenKind`]. Rules are plain
//! shared functions; plugins decorate them with [`Renderer::wrap_rule`],
//! which hands the currently registered rule to the decorator as `next`:
//!
//! ```text
//! install A            install B
//! default ──▶ A(next=default) ──▶ B(next=A(next=default))
//! ```
//!
//! Every decorator keeps its predecessor, so installs compose instead of
//! overwriting each other.

use crate::markdown;
use html_escape::encode_double_quoted_attribute;
use pulldown_cmark_escape::escape_href;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// The kinds of token whose output stage can be intercepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Raw HTML inside a paragraph, e.g. `text <img src="a.png"> text`.
    HtmlInline,
    /// A raw HTML block standing on its own lines.
    HtmlBlock,
    /// A native Markdown image, `![alt](src "title")`.
    Image,
}

/// One unit of the token stream.
///
/// HTML tokens carry their markup in `content`; image tokens carry `src`,
/// `alt` and optionally `title` in `attrs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub content: String,
    pub attrs: Vec<(String, String)>,
}

impl Token {
    pub fn html_inline(content: impl Into<String>) -> Self {
        Self {
            kind: TokenKind::HtmlInline,
            content: content.into(),
            attrs: Vec::new(),
        }
    }

    pub fn html_block(content: impl Into<String>) -> Self {
        Self {
            kind: TokenKind::HtmlBlock,
            content: content.into(),
            attrs: Vec::new(),
        }
    }

    pub fn image(src: impl Into<String>, alt: impl Into<String>) -> Self {
        Self {
            kind: TokenKind::Image,
            content: String::new(),
            attrs: vec![
                ("src".to_string(), src.into()),
                ("alt".to_string(), alt.into()),
            ],
        }
    }

    /// Value of attribute `key`, if present.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Replace attribute `key` in place, or append it when missing.
    pub fn set_attr(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value,
            None => self.attrs.push((key.to_string(), value)),
        }
    }

    pub fn remove_attr(&mut self, key: &str) -> Option<String> {
        let idx = self.attrs.iter().position(|(k, _)| k == key)?;
        Some(self.attrs.remove(idx).1)
    }
}

/// Renderer-wide output options passed to every rule.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Close void elements XHTML-style (`<img … />`).
    pub xhtml_out: bool,
}

/// Per-render scratch space shared by all rules of one render call.
#[derive(Debug, Clone, Default)]
pub struct RenderEnv {
    pub vars: HashMap<String, String>,
}

type RuleFn =
    dyn Fn(&mut [Token], usize, &RenderOptions, &mut RenderEnv, &Renderer) -> String + Send + Sync;

/// An output-stage rule: renders `tokens[idx]` to markup.
#[derive(Clone)]
pub struct Rule(Arc<RuleFn>);

impl Rule {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut [Token], usize, &RenderOptions, &mut RenderEnv, &Renderer) -> String
            + Send
            + Sync
            + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(
        &self,
        tokens: &mut [Token],
        idx: usize,
        options: &RenderOptions,
        env: &mut RenderEnv,
        renderer: &Renderer,
    ) -> String {
        (self.0)(tokens, idx, options, env, renderer)
    }

    /// The built-in rule for `kind`.
    pub fn default_for(kind: TokenKind) -> Self {
        match kind {
            TokenKind::HtmlInline | TokenKind::HtmlBlock => {
                Rule::new(|tokens, idx, _, _, _| tokens[idx].content.clone())
            }
            TokenKind::Image => Rule::new(|tokens, idx, options, _, _| {
                render_image(&tokens[idx], options)
            }),
        }
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Rule(<fn>)")
    }
}

/// Serialise an image token as an `<img>` tag, attributes in insertion order.
///
/// `src` is href-escaped the way pulldown-cmark writes link destinations;
/// the token itself keeps the raw path.
pub fn render_image(token: &Token, options: &RenderOptions) -> String {
    let mut out = String::from("<img");
    for (key, value) in &token.attrs {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        if key == "src" {
            let _ = escape_href(&mut out, value);
        } else {
            out.push_str(&encode_double_quoted_attribute(value));
        }
        out.push('"');
    }
    out.push_str(if options.xhtml_out { " />" } else { ">" });
    out
}

/// Registry of output-stage rules plus the entry points that drive them.
pub struct Renderer {
    rules: HashMap<TokenKind, Rule>,
    pub options: RenderOptions,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.rules.keys().map(|k| format!("{k:?}")).collect();
        kinds.sort();
        f.debug_struct("Renderer")
            .field("rules", &kinds)
            .field("options", &self.options)
            .finish()
    }
}

impl Renderer {
    /// A renderer with the built-in rule registered for every token kind.
    pub fn new() -> Self {
        let mut renderer = Self::bare();
        for kind in [TokenKind::HtmlInline, TokenKind::HtmlBlock, TokenKind::Image] {
            renderer.set_rule(kind, Rule::default_for(kind));
        }
        renderer
    }

    /// A renderer with no rules registered; dispatch falls back to the built-ins.
    pub fn bare() -> Self {
        Self {
            rules: HashMap::new(),
            options: RenderOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn rule(&self, kind: TokenKind) -> Option<Rule> {
        self.rules.get(&kind).cloned()
    }

    pub fn set_rule(&mut self, kind: TokenKind, rule: Rule) {
        self.rules.insert(kind, rule);
    }

    pub fn remove_rule(&mut self, kind: TokenKind) -> Option<Rule> {
        self.rules.remove(&kind)
    }

    /// Replace the rule for `kind` with `wrap(next)`, where `next` is the rule
    /// registered so far (or the built-in when nothing is registered).
    pub fn wrap_rule<F>(&mut self, kind: TokenKind, wrap: F)
    where
        F: FnOnce(Rule) -> Rule,
    {
        let next = self
            .rules
            .remove(&kind)
            .unwrap_or_else(|| Rule::default_for(kind));
        self.rules.insert(kind, wrap(next));
    }

    /// Render a single token through its rule chain.
    pub fn render_token(&self, tokens: &mut [Token], idx: usize, env: &mut RenderEnv) -> String {
        let kind = tokens[idx].kind;
        match self.rules.get(&kind) {
            Some(rule) => rule.call(tokens, idx, &self.options, env, self),
            None => Rule::default_for(kind).call(tokens, idx, &self.options, env, self),
        }
    }

    /// Render every token and concatenate the output.
    pub fn render(&self, tokens: &mut [Token], env: &mut RenderEnv) -> String {
        (0..tokens.len())
            .map(|idx| self.render_token(tokens, idx, env))
            .collect()
    }

    /// Render a Markdown document; raw HTML and images go through the rules.
    pub fn render_markdown(&self, src: &str, env: &mut RenderEnv) -> String {
        markdown::render(self, src, env)
    }
}
