//! pulldown-cmark bridge: lift interceptable events into [`Token`]s.
//!
//! The document is parsed once into events. Raw HTML blocks, inline HTML and
//! images are pulled out as tokens and rendered through the renderer's rule
//! chain; everything else stays an event. The rendered tokens are spliced back
//! as raw HTML events and the whole stream goes through a single
//! `push_html` call, so table and list state in the writer is never split.

use crate::renderer::{RenderEnv, Renderer, Token, TokenKind};
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag, TagEnd};

/// Extensions enabled for every document.
pub fn parser_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_TASKLISTS
}

enum Segment<'a> {
    Event(Event<'a>),
    Token(TokenKind),
}

/// Split `src` into pass-through events and interceptable tokens.
///
/// Each [`Segment::Token`] corresponds, in order, to one entry of the
/// returned token list.
fn lift(src: &str) -> (Vec<Segment<'_>>, Vec<Token>) {
    let mut segments = Vec::new();
    let mut tokens = Vec::new();
    let mut events = Parser::new_ext(src, parser_options());

    while let Some(event) = events.next() {
        match event {
            Event::Start(Tag::HtmlBlock) => {
                let mut content = String::new();
                for inner in events.by_ref() {
                    match inner {
                        Event::End(TagEnd::HtmlBlock) => break,
                        Event::Html(text) | Event::Text(text) => content.push_str(&text),
                        _ => {}
                    }
                }
                segments.push(Segment::Event(Event::Start(Tag::HtmlBlock)));
                segments.push(Segment::Token(TokenKind::HtmlBlock));
                segments.push(Segment::Event(Event::End(TagEnd::HtmlBlock)));
                tokens.push(Token::html_block(content));
            }
            Event::Html(text) => {
                segments.push(Segment::Token(TokenKind::HtmlBlock));
                tokens.push(Token::html_block(text.into_string()));
            }
            Event::InlineHtml(text) => {
                segments.push(Segment::Token(TokenKind::HtmlInline));
                tokens.push(Token::html_inline(text.into_string()));
            }
            Event::Start(Tag::Image {
                dest_url, title, ..
            }) => {
                let alt = collect_alt_text(&mut events);
                let mut token = Token::image(dest_url.into_string(), alt);
                if !title.is_empty() {
                    token.set_attr("title", title.into_string());
                }
                segments.push(Segment::Token(TokenKind::Image));
                tokens.push(token);
            }
            other => segments.push(Segment::Event(other)),
        }
    }

    (segments, tokens)
}

/// Consume events up to the matching image end, flattening them to text.
fn collect_alt_text<'a>(events: &mut impl Iterator<Item = Event<'a>>) -> String {
    let mut alt = String::new();
    let mut depth = 1usize;
    for event in events {
        match event {
            Event::Start(Tag::Image { .. }) => depth += 1,
            Event::End(TagEnd::Image) => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            Event::Text(text) | Event::Code(text) => alt.push_str(&text),
            Event::SoftBreak | Event::HardBreak => alt.push('\n'),
            _ => {}
        }
    }
    alt
}

/// Render `src` to HTML, routing lifted tokens through `renderer`.
pub fn render(renderer: &Renderer, src: &str, env: &mut RenderEnv) -> String {
    let (segments, mut tokens) = lift(src);

    let mut rendered = (0..tokens.len())
        .map(|idx| renderer.render_token(&mut tokens, idx, env))
        .collect::<Vec<_>>()
        .into_iter();

    let events = segments.into_iter().map(|segment| match segment {
        Segment::Event(event) => event,
        Segment::Token(kind) => {
            let markup = CowStr::from(rendered.next().unwrap_or_default());
            match kind {
                TokenKind::HtmlBlock => Event::Html(markup),
                TokenKind::HtmlInline | TokenKind::Image => Event::InlineHtml(markup),
            }
        }
    });

    let mut out = String::with_capacity(src.len() + src.len() / 2);
    html::push_html(&mut out, events);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::Rule;

    fn plain(src: &str) -> String {
        let mut out = String::new();
        html::push_html(&mut out, Parser::new_ext(src, parser_options()));
        out
    }

    #[test]
    fn lifts_block_inline_and_image_tokens() {
        let src = "<div>\n<img src=\"a.png\">\n</div>\n\ntext <span>x</span> ![An *alt*](b.png \"B\")\n";
        let (_, tokens) = lift(src);
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::HtmlBlock,
                TokenKind::HtmlInline,
                TokenKind::HtmlInline,
                TokenKind::Image
            ]
        );
        assert_eq!(tokens[0].content, "<div>\n<img src=\"a.png\">\n</div>\n");
        let img = &tokens[3];
        assert_eq!(img.attr("src"), Some("b.png"));
        assert_eq!(img.attr("alt"), Some("An alt"));
        assert_eq!(img.attr("title"), Some("B"));
    }

    #[test]
    fn default_rules_match_plain_output_without_images() {
        let src = "# Title\n\n| a | b |\n|---|---|\n| <b>1</b> | 2 |\n\n<div class=\"x\">\nraw\n</div>\n\n- [x] done\n";
        let r = Renderer::new();
        assert_eq!(r.render_markdown(src, &mut RenderEnv::default()), plain(src));
    }

    #[test]
    fn image_without_title_has_no_title_attr() {
        let r = Renderer::new();
        let html = r.render_markdown("![cat](cat.png)", &mut RenderEnv::default());
        assert_eq!(html, "<p><img src=\"cat.png\" alt=\"cat\"></p>\n");
    }

    #[test]
    fn rules_see_every_lifted_token() {
        let mut r = Renderer::new();
        r.set_rule(
            TokenKind::HtmlInline,
            Rule::new(|tokens, idx, _, _, _| format!("<!--{}-->", tokens.len() - idx)),
        );
        let html = r.render_markdown("a <i>b</i>", &mut RenderEnv::default());
        assert_eq!(html, "<p>a <!--2-->b<!--1--></p>\n");
    }
}
