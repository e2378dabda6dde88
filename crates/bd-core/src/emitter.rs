//! Emitter: BlockTree → surface markup.
//!
//! Produces the serialized `content` value handed to the host. Output
//! round-trips through `parse_fragment` to a structurally identical tree;
//! leaf content is emitted verbatim.

use crate::model::*;
use petgraph::graph::NodeIndex;
use std::fmt::Write;

/// Emit a `BlockTree` as a markup fragment.
#[must_use]
pub fn emit_document(tree: &BlockTree) -> String {
    let mut out = String::with_capacity(1024);
    for &row_idx in tree.rows() {
        emit_block(tree, row_idx, &mut out);
        out.push('\n');
    }
    out
}

/// Emit the document wrapped in the settings panel's presentation
/// container (content width, alignment, page background).
#[must_use]
pub fn emit_with_settings(tree: &BlockTree, settings: &DocumentSettings) -> String {
    let mut style = format!("width: {}px;", format_px(settings.content_width));
    match settings.alignment {
        Align::Center => style.push_str(" margin: 0 auto;"),
        Align::Right => style.push_str(" margin-left: auto;"),
        Align::Left => {}
    }
    if let Some(bg) = &settings.background {
        let _ = write!(style, " background-color: {};", bg.to_hex());
    }
    format!(
        "<div class=\"document\" style=\"{}\">\n{}</div>\n",
        style,
        emit_document(tree)
    )
}

/// Emit one block (and its subtree) into `out`.
pub fn emit_block(tree: &BlockTree, idx: NodeIndex, out: &mut String) {
    let block = &tree.graph[idx];
    match &block.kind {
        BlockKind::Root => {
            for &child in tree.children(idx) {
                emit_block(tree, child, out);
            }
        }
        BlockKind::Row => {
            let _ = write!(out, "<div class=\"draggable-row\" data-block-id=\"{}\"", block.id);
            emit_style_attr(block, None, out);
            out.push('>');
            for &child in tree.children(idx) {
                emit_block(tree, child, out);
            }
            out.push_str("</div>");
        }
        BlockKind::Column { width_pct } => {
            let _ = write!(out, "<div class=\"column\" data-column-id=\"{}\"", block.id);
            emit_style_attr(block, *width_pct, out);
            out.push('>');
            for &child in tree.children(idx) {
                emit_block(tree, child, out);
            }
            out.push_str("</div>");
        }
        BlockKind::Leaf { content } => out.push_str(content),
    }
}

/// Emit the inline `style` attribute for a row or column, if any of its
/// structural/presentational state needs one.
fn emit_style_attr(block: &Block, width_pct: Option<f32>, out: &mut String) {
    let mut style = String::new();

    // An explicit resize override beats the layout template's fraction.
    if let Some(w) = block.dimensions.width {
        let _ = write!(style, "width: {}px; ", format_px(w));
    } else if let Some(pct) = width_pct {
        let _ = write!(style, "width: {}%; ", format_pct(pct * 100.0));
    }
    if let Some(h) = block.dimensions.height {
        let _ = write!(style, "height: {}px; ", format_px(h));
    }
    for attr in &block.attrs {
        match attr {
            StyleAttr::Background(c) => {
                let _ = write!(style, "background-color: {}; ", c.to_hex());
            }
            StyleAttr::BackgroundImage(url) => {
                let _ = write!(style, "background-image: url('{url}'); ");
            }
            StyleAttr::TextAlign(a) => {
                let _ = write!(style, "text-align: {}; ", a.as_css());
            }
        }
    }

    if !style.is_empty() {
        let _ = write!(out, " style=\"{}\"", style.trim_end());
    }
}

/// Pixel values: drop a trailing `.0` so `300.0` emits as `300`.
fn format_px(v: f32) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

/// Percent values keep two decimals (`33.33%`), trimming a whole number.
fn format_pct(v: f32) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{v:.2}")
    }
}
