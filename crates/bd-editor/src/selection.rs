//! Selection and format tracking.
//!
//! The toolbar reflects the formatting at the caret: bold/italic/underline
//! from the inline-element stack, heading level and alignment from the
//! nearest block-level ancestor. All of it is *derived* — this module
//! reads leaf markup, it never rewrites it.

use bd_core::id::BlockId;
use bd_core::model::Align;

/// A caret or range inside one leaf's markup, in byte offsets. The value
/// handed to the host's selection-change callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub block: BlockId,
    pub start: usize,
    pub end: usize,
}

impl Selection {
    pub fn caret(block: BlockId, offset: usize) -> Self {
        Self {
            block,
            start: offset,
            end: offset,
        }
    }

    pub fn is_caret(&self) -> bool {
        self.start == self.end
    }
}

/// Formatting in effect at a caret position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FormatState {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    /// Heading level of the nearest block-level ancestor (1..=3).
    pub heading: Option<u8>,
    pub align: Align,
}

impl FormatState {
    /// Derive the format state at `caret` (a byte offset into the leaf's
    /// markup) by scanning the stack of elements still open there.
    ///
    /// The scan is tag-structural, not a full parse: it walks tags left of
    /// the caret, pushing opens and popping matching closes. Malformed
    /// markup degrades to "fewer formats detected", never to an error.
    pub fn at(leaf_markup: &str, caret: usize) -> Self {
        let caret = caret.min(leaf_markup.len());
        let mut stack: Vec<Tag<'_>> = Vec::new();

        let mut rest = &leaf_markup[..caret];
        while let Some(lt) = rest.find('<') {
            rest = &rest[lt + 1..];
            let Some(gt) = rest.find('>') else {
                break; // caret sits inside a tag, ignore the partial
            };
            let raw = &rest[..gt];
            rest = &rest[gt + 1..];

            if let Some(name) = raw.strip_prefix('/') {
                let name = name.trim();
                if let Some(pos) = stack.iter().rposition(|t| t.name.eq_ignore_ascii_case(name)) {
                    stack.truncate(pos);
                }
            } else if !raw.starts_with('!') && !raw.ends_with('/') {
                let name = raw.split_whitespace().next().unwrap_or("");
                if !name.is_empty() && !is_void(name) {
                    stack.push(Tag {
                        name,
                        attrs: &raw[name.len()..],
                    });
                }
            }
        }

        let mut state = FormatState::default();
        for tag in &stack {
            match tag.name.to_ascii_lowercase().as_str() {
                "b" | "strong" => state.bold = true,
                "i" | "em" => state.italic = true,
                "u" => state.underline = true,
                "h1" => state.heading = Some(1),
                "h2" => state.heading = Some(2),
                "h3" => state.heading = Some(3),
                _ => {}
            }
        }

        // Alignment comes from the nearest block-level ancestor that
        // declares one.
        for tag in stack.iter().rev() {
            if !is_block_level(tag.name) {
                continue;
            }
            if let Some(align) = style_text_align(tag.attrs) {
                state.align = align;
                break;
            }
        }

        state
    }
}

struct Tag<'a> {
    name: &'a str,
    /// Everything after the tag name inside the angle brackets.
    attrs: &'a str,
}

fn is_void(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "br" | "hr" | "img" | "input" | "meta" | "link" | "source" | "wbr"
    )
}

fn is_block_level(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "p" | "div" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "ul" | "ol" | "li" | "nav"
            | "table" | "figure" | "blockquote"
    )
}

/// Pull `text-align` out of an inline `style="…"` attribute blob.
fn style_text_align(attrs: &str) -> Option<Align> {
    let style_at = attrs.find("style=")?;
    let rest = &attrs[style_at + "style=".len()..];
    let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let body = &rest[1..rest[1..].find(quote)? + 1];

    for decl in body.split(';') {
        if let Some((prop, value)) = decl.split_once(':')
            && prop.trim() == "text-align"
        {
            return Align::from_css(value.trim());
        }
    }
    None
}
