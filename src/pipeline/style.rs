//! Inline-style composition.
//!
//! Pure `&str → String` helpers that merge declarations into an existing
//! `style` attribute. Both keep the same separator convention: the existing
//! text is right-trimmed, terminated with `;` if needed, and the new
//! declaration follows after a single space. Composing twice therefore stays
//! well-formed, and a declaration already present is never added again.

use once_cell::sync::Lazy;
use regex::Regex;

/// Declarations applied to an element moved into a padding-ratio wrapper.
pub const WRAPPED_ELEMENT_LAYOUT: &[&str] = &[
    "position:absolute",
    "top:0",
    "left:0",
    "width:100%",
    "height:100%",
];

/// Declarations that let an element scale with its container.
pub const FLUID_LAYOUT: &[&str] = &["width:100%", "max-width:100%", "height:auto"];

static RE_ASPECT_RATIO: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)aspect-ratio").unwrap());

/// Whether `style` already declares an aspect ratio (case-insensitive).
pub fn has_aspect_ratio(style: &str) -> bool {
    RE_ASPECT_RATIO.is_match(style)
}

/// Add `aspect-ratio:{width}/{height};` to `style`.
///
/// A style that already mentions `aspect-ratio` is returned unchanged. A
/// missing or blank style yields exactly the new declaration.
///
/// ```rust
/// use fit_media::pipeline::style::with_aspect_ratio;
///
/// assert_eq!(with_aspect_ratio(None, 16, 9), "aspect-ratio:16/9;");
/// assert_eq!(with_aspect_ratio(Some("color:red"), 16, 9), "color:red; aspect-ratio:16/9;");
/// ```
pub fn with_aspect_ratio(style: Option<&str>, width: u32, height: u32) -> String {
    let declaration = format!("aspect-ratio:{width}/{height};");
    match style.filter(|s| !s.trim().is_empty()) {
        None => declaration,
        Some(existing) if has_aspect_ratio(existing) => existing.to_string(),
        Some(existing) => append_declaration(existing, &declaration),
    }
}

/// Append each of `declarations` to `style`, skipping any already present.
///
/// Declarations are given without the trailing `;`.
pub fn with_box_layout(style: Option<&str>, declarations: &[&str]) -> String {
    let mut out = style.map(str::trim).unwrap_or_default().to_string();
    for declaration in declarations {
        let declaration = declaration.trim().trim_end_matches(';');
        if declaration.is_empty() || contains_declaration(&out, declaration) {
            continue;
        }
        let declaration = format!("{declaration};");
        out = if out.is_empty() {
            declaration
        } else {
            append_declaration(&out, &declaration)
        };
    }
    out
}

fn append_declaration(style: &str, declaration: &str) -> String {
    let trimmed = style.trim_end();
    if trimmed.ends_with(';') {
        format!("{trimmed} {declaration}")
    } else {
        format!("{trimmed}; {declaration}")
    }
}

/// Whitespace- and case-insensitive match of one whole declaration.
fn contains_declaration(style: &str, declaration: &str) -> bool {
    let squash = |s: &str| -> String {
        s.chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase()
    };
    let wanted = squash(declaration);
    style.split(';').any(|existing| squash(existing) == wanted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aspect_ratio_on_empty_style() {
        assert_eq!(with_aspect_ratio(Some(""), 16, 9), "aspect-ratio:16/9;");
        assert_eq!(with_aspect_ratio(Some("   "), 16, 9), "aspect-ratio:16/9;");
        assert_eq!(with_aspect_ratio(None, 16, 9), "aspect-ratio:16/9;");
    }

    #[test]
    fn test_aspect_ratio_after_terminated_style() {
        assert_eq!(
            with_aspect_ratio(Some("color:red;"), 16, 9),
            "color:red; aspect-ratio:16/9;"
        );
        assert_eq!(
            with_aspect_ratio(Some("color:red;  "), 16, 9),
            "color:red; aspect-ratio:16/9;"
        );
    }

    #[test]
    fn test_aspect_ratio_inserts_missing_separator() {
        assert_eq!(
            with_aspect_ratio(Some("color:red"), 16, 9),
            "color:red; aspect-ratio:16/9;"
        );
    }

    #[test]
    fn test_existing_aspect_ratio_is_kept() {
        let style = "Aspect-Ratio: 4 / 3; color:red";
        assert_eq!(with_aspect_ratio(Some(style), 16, 9), style);
    }

    #[test]
    fn test_aspect_ratio_is_idempotent() {
        let once = with_aspect_ratio(Some("color:red"), 16, 9);
        let twice = with_aspect_ratio(Some(&once), 16, 9);
        assert_eq!(once, twice);
        assert_eq!(twice.matches("aspect-ratio").count(), 1);
    }

    #[test]
    fn test_box_layout_from_nothing() {
        assert_eq!(
            with_box_layout(None, WRAPPED_ELEMENT_LAYOUT),
            "position:absolute; top:0; left:0; width:100%; height:100%;"
        );
    }

    #[test]
    fn test_box_layout_appends_to_existing() {
        assert_eq!(
            with_box_layout(Some("border:0"), &["width:100%"]),
            "border:0; width:100%;"
        );
    }

    #[test]
    fn test_box_layout_skips_present_declarations() {
        let style = "WIDTH: 100%; color:red;";
        assert_eq!(
            with_box_layout(Some(style), FLUID_LAYOUT),
            "WIDTH: 100%; color:red; max-width:100%; height:auto;"
        );
    }

    #[test]
    fn test_box_layout_then_aspect_ratio() {
        let wrapper = with_box_layout(None, &["position:relative", "height:0", "padding-bottom:56.25%"]);
        assert_eq!(
            with_aspect_ratio(Some(&wrapper), 640, 360),
            "position:relative; height:0; padding-bottom:56.25%; aspect-ratio:640/360;"
        );
    }
}
