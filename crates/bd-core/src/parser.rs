//! Parser for surface markup → BlockTree.
//!
//! Built on `winnow` 0.7. The grammar is the fragment dialect the editing
//! surface emits: rows are `<div class="draggable-row">…</div>`, columns
//! inside rows are `<div class="column" data-column-id=…>…</div>`, and
//! everything else is captured verbatim as opaque leaf content. The parser
//! never interprets leaf markup — leaves round-trip byte-for-byte.
//!
//! Structure is recovered, not trusted: top-level content that is not a
//! row is wrapped in an implicit row so the document root stays a flat
//! ordered row sequence.

use crate::error::EditError;
use crate::id::BlockId;
use crate::model::*;
use winnow::error::ContextError;
use winnow::prelude::*;
use winnow::token::{take_till, take_while};

/// Tags that never have a closing counterpart.
const VOID_TAGS: &[&str] = &[
    "br", "hr", "img", "input", "meta", "link", "area", "base", "col", "embed", "source", "track",
    "wbr",
];

/// Parse a markup fragment into a `BlockTree`.
///
/// Unbalanced or truncated markup is a `SerializationFailure`; the caller
/// keeps its previous tree in that case.
pub fn parse_fragment(input: &str) -> Result<BlockTree, EditError> {
    let nodes = parse_nodes(input)?;
    let mut tree = BlockTree::new();

    for node in nodes {
        match classify(&node) {
            NodeClass::Row => {
                let subtree = build_row(&node)?;
                let root = tree.root;
                let len = tree.children(root).len();
                tree.insert_subtree(root, len, subtree)?;
            }
            NodeClass::Other => {
                // Implicit row wrapper keeps the root row-only.
                let markup = node.outer.trim();
                if markup.is_empty() {
                    continue;
                }
                let row = Subtree::with_children(
                    Block::row(),
                    vec![Subtree::new(Block::leaf(markup))],
                );
                let root = tree.root;
                let len = tree.children(root).len();
                tree.insert_subtree(root, len, row)?;
            }
        }
    }

    Ok(tree)
}

// ─── Raw node scanning ──────────────────────────────────────────────────

/// A scanned top-level node: either an element with its source spans, or a
/// bare text run.
#[derive(Debug)]
struct RawNode<'a> {
    /// Element tag name, empty for text runs.
    tag: &'a str,
    attrs: Vec<(&'a str, &'a str)>,
    /// Source between the open and close tags (empty for text/void).
    inner: &'a str,
    /// Full source of the node, open tag through close tag.
    outer: &'a str,
}

enum NodeClass {
    Row,
    Other,
}

fn classify(node: &RawNode<'_>) -> NodeClass {
    if has_class(&node.attrs, "draggable-row") {
        NodeClass::Row
    } else {
        NodeClass::Other
    }
}

fn has_class(attrs: &[(&str, &str)], class: &str) -> bool {
    attrs
        .iter()
        .find(|(k, _)| *k == "class")
        .is_some_and(|(_, v)| v.split_ascii_whitespace().any(|c| c == class))
}

fn attr<'a>(attrs: &[(&'a str, &'a str)], name: &str) -> Option<&'a str> {
    attrs.iter().find(|(k, _)| *k == name).map(|(_, v)| *v)
}

/// Scan a full fragment into a flat list of sibling nodes.
fn parse_nodes(input: &str) -> Result<Vec<RawNode<'_>>, EditError> {
    let mut rest = input;
    let mut nodes = Vec::new();

    loop {
        skip_comments(&mut rest);
        if rest.trim().is_empty() {
            break;
        }
        if rest.starts_with('<') {
            nodes.push(scan_element(&mut rest)?);
        } else {
            // Bare text run up to the next tag.
            let end = rest.find('<').unwrap_or(rest.len());
            let (text, tail) = rest.split_at(end);
            if !text.trim().is_empty() {
                nodes.push(RawNode {
                    tag: "",
                    attrs: Vec::new(),
                    inner: "",
                    outer: text,
                });
            }
            rest = tail;
        }
    }

    Ok(nodes)
}

fn skip_comments(input: &mut &str) {
    loop {
        let trimmed = input.trim_start();
        if let Some(after) = trimmed.strip_prefix("<!--") {
            match after.find("-->") {
                Some(pos) => *input = &after[pos + 3..],
                None => {
                    *input = "";
                    return;
                }
            }
        } else {
            return;
        }
    }
}

/// Scan one element: open tag via winnow, then a balanced search for the
/// matching close tag. `inner`/`outer` are verbatim source spans.
fn scan_element<'a>(input: &mut &'a str) -> Result<RawNode<'a>, EditError> {
    let start = *input;
    let (tag, attrs, self_closed) = parse_open_tag
        .parse_next(input)
        .map_err(|e| EditError::SerializationFailure(format!("bad open tag: {e}")))?;

    if self_closed || VOID_TAGS.contains(&tag) {
        let consumed = start.len() - input.len();
        return Ok(RawNode {
            tag,
            attrs,
            inner: "",
            outer: &start[..consumed],
        });
    }

    // Balanced scan: count nested occurrences of this tag until its own
    // close tag. Case-insensitive on the tag name, verbatim on the span.
    let body = *input;
    let mut depth = 1usize;
    let mut cursor = 0usize;
    let lower = tag.to_ascii_lowercase();
    loop {
        let Some(lt) = body[cursor..].find('<') else {
            return Err(EditError::SerializationFailure(format!(
                "unclosed <{tag}> element"
            )));
        };
        cursor += lt;
        let rest = &body[cursor..];
        if let Some(after) = strip_tag_prefix(rest, &lower, true) {
            depth -= 1;
            if depth == 0 {
                let inner = &body[..cursor];
                let close_len = rest.len() - after.len();
                let outer_len = (start.len() - body.len()) + cursor + close_len;
                *input = after;
                return Ok(RawNode {
                    tag,
                    attrs,
                    inner,
                    outer: &start[..outer_len],
                });
            }
            cursor += rest.len() - after.len();
        } else if strip_tag_prefix(rest, &lower, false).is_some() {
            // Another open of the same tag — only counts if it isn't
            // self-closing.
            let tag_end = rest.find('>').ok_or_else(|| {
                EditError::SerializationFailure(format!("unterminated <{tag}> tag"))
            })?;
            if !rest[..tag_end].ends_with('/') {
                depth += 1;
            }
            cursor += tag_end + 1;
        } else {
            cursor += 1;
        }
    }
}

/// If `rest` starts with `<tag` (or `</tag` when `closing`), return the
/// remainder after the full tag. Tag-name boundary is checked so `<ul`
/// doesn't match `<u`.
fn strip_tag_prefix<'a>(rest: &'a str, tag: &str, closing: bool) -> Option<&'a str> {
    let prefix_len = if closing { 2 } else { 1 };
    let rest_l = rest.as_bytes();
    if closing {
        if !rest.starts_with("</") {
            return None;
        }
    } else if !rest.starts_with('<') || rest.starts_with("</") {
        return None;
    }
    let name_start = prefix_len;
    let name_end = name_start + tag.len();
    if rest.len() < name_end || !rest[name_start..name_end].eq_ignore_ascii_case(tag) {
        return None;
    }
    // Boundary: next byte must end the name.
    match rest_l.get(name_end) {
        Some(b'>') | Some(b' ') | Some(b'\t') | Some(b'\n') | Some(b'/') => {}
        _ => return None,
    }
    let gt = rest.find('>')?;
    Some(&rest[gt + 1..])
}

/// Parse `<tag attr="value" …>` returning (tag, attrs, self_closed).
fn parse_open_tag<'a>(input: &mut &'a str) -> ModalResult<(&'a str, Vec<(&'a str, &'a str)>, bool)> {
    let _ = '<'.parse_next(input)?;
    let tag = take_while(1.., |c: char| c.is_ascii_alphanumeric()).parse_next(input)?;

    let mut attrs = Vec::new();
    loop {
        skip_space(input);
        if input.starts_with("/>") {
            *input = &input[2..];
            return Ok((tag, attrs, true));
        }
        if input.starts_with('>') {
            *input = &input[1..];
            return Ok((tag, attrs, false));
        }
        let name = take_while(1.., |c: char| {
            c.is_ascii_alphanumeric() || c == '-' || c == '_'
        })
        .parse_next(input)?;
        skip_space(input);
        let value = if input.starts_with('=') {
            *input = &input[1..];
            skip_space(input);
            parse_attr_value.parse_next(input)?
        } else {
            ""
        };
        attrs.push((name, value));
    }
}

fn parse_attr_value<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    if input.starts_with('"') {
        let _ = '"'.parse_next(input)?;
        let v = take_till(0.., '"').parse_next(input)?;
        let _ = '"'.parse_next(input)?;
        Ok(v)
    } else if input.starts_with('\'') {
        let _ = '\''.parse_next(input)?;
        let v = take_till(0.., '\'').parse_next(input)?;
        let _ = '\''.parse_next(input)?;
        Ok(v)
    } else {
        take_while(0.., |c: char| !c.is_whitespace() && c != '>').parse_next(input)
    }
}

/// Consume optional whitespace (concrete error type avoids inference issues).
fn skip_space(input: &mut &str) {
    use winnow::ascii::multispace0;
    let _: Result<&str, winnow::error::ErrMode<ContextError>> = multispace0.parse_next(input);
}

// ─── Row / column construction ──────────────────────────────────────────

fn build_row(node: &RawNode<'_>) -> Result<Subtree, EditError> {
    let id = attr(&node.attrs, "data-block-id")
        .map(BlockId::intern)
        .unwrap_or_else(|| BlockId::with_prefix("row"));
    let mut block = Block::new(id, BlockKind::Row);
    apply_inline_style(&mut block, attr(&node.attrs, "style").unwrap_or(""));

    let children = parse_nodes(node.inner)?;
    let mut subtrees = Vec::new();
    for child in &children {
        if has_class(&child.attrs, "column") {
            subtrees.push(build_column(child)?);
        } else if !child.outer.trim().is_empty() {
            subtrees.push(Subtree::new(Block::leaf(child.outer.trim())));
        }
    }

    Ok(Subtree::with_children(block, subtrees))
}

fn build_column(node: &RawNode<'_>) -> Result<Subtree, EditError> {
    let id = attr(&node.attrs, "data-column-id")
        .map(BlockId::intern)
        .unwrap_or_else(|| BlockId::with_prefix("col"));
    let style = attr(&node.attrs, "style").unwrap_or("");
    let width_pct = style_decl(style, "width")
        .and_then(|v| v.strip_suffix('%').and_then(|n| n.trim().parse::<f32>().ok()))
        .map(|pct| pct / 100.0);

    let mut block = Block::new(id, BlockKind::Column { width_pct });
    apply_inline_style(&mut block, style);

    let children = parse_nodes(node.inner)?;
    let subtrees = children
        .iter()
        .filter(|c| !c.outer.trim().is_empty())
        .map(|c| Subtree::new(Block::leaf(c.outer.trim())))
        .collect();

    Ok(Subtree::with_children(block, subtrees))
}

/// Pull the structural declarations out of an inline `style` attribute.
/// Unrecognized declarations are presentational noise and are dropped.
fn apply_inline_style(block: &mut Block, style: &str) {
    if let Some(v) = style_decl(style, "width")
        && let Some(px) = v.strip_suffix("px").and_then(|n| n.trim().parse::<f32>().ok())
    {
        block.dimensions.width = Some(px);
    }
    if let Some(v) = style_decl(style, "height")
        && let Some(px) = v.strip_suffix("px").and_then(|n| n.trim().parse::<f32>().ok())
    {
        block.dimensions.height = Some(px);
    }
    if let Some(v) = style_decl(style, "background-color")
        && let Some(color) = Color::from_hex(v.trim())
    {
        block.set_attr(StyleAttr::Background(color));
    }
    if let Some(v) = style_decl(style, "background-image") {
        let url = v
            .trim()
            .strip_prefix("url(")
            .and_then(|u| u.strip_suffix(')'))
            .map(|u| u.trim_matches(|c| c == '\'' || c == '"'));
        if let Some(url) = url {
            block.set_attr(StyleAttr::BackgroundImage(url.to_string()));
        }
    }
    if let Some(v) = style_decl(style, "text-align")
        && let Some(align) = Align::from_css(v.trim())
    {
        block.set_attr(StyleAttr::TextAlign(align));
    }
}

/// Look up one declaration in an inline style string.
fn style_decl<'a>(style: &'a str, prop: &str) -> Option<&'a str> {
    style.split(';').find_map(|decl| {
        let (name, value) = decl.split_once(':')?;
        if name.trim().eq_ignore_ascii_case(prop) {
            Some(value.trim())
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_single_row_with_leaf() {
        let input = r#"<div class="draggable-row" data-block-id="intro"><p>Hello</p></div>"#;
        let tree = parse_fragment(input).unwrap();

        assert_eq!(tree.rows().len(), 1);
        let row = tree.get(BlockId::intern("intro")).unwrap();
        assert!(row.kind.is_row());

        let row_idx = tree.index_of(BlockId::intern("intro")).unwrap();
        let children = tree.children(row_idx);
        assert_eq!(children.len(), 1);
        match &tree.graph[children[0]].kind {
            BlockKind::Leaf { content } => assert_eq!(content, "<p>Hello</p>"),
            other => panic!("expected leaf, got {other:?}"),
        }
    }

    #[test]
    fn loose_content_gets_implicit_row() {
        let tree = parse_fragment("<p>Start typing your message here...</p>").unwrap();
        assert_eq!(tree.rows().len(), 1);
        assert_eq!(tree.count_blocks(), 2); // implicit row + leaf
    }

    #[test]
    fn parse_columns_with_widths() {
        let input = r#"
<div class="draggable-row" data-block-id="split">
  <div class="column" data-column-id="split_l" style="width: 33.33%"><p>L</p></div>
  <div class="column" data-column-id="split_r" style="width: 66.67%"><p>R</p></div>
</div>"#;
        let tree = parse_fragment(input).unwrap();

        let row_idx = tree.index_of(BlockId::intern("split")).unwrap();
        let cols = tree.children(row_idx);
        assert_eq!(cols.len(), 2);
        match tree.graph[cols[0]].kind {
            BlockKind::Column { width_pct } => {
                assert!((width_pct.unwrap() - 0.3333).abs() < 0.001)
            }
            _ => panic!("expected column"),
        }
    }

    #[test]
    fn parse_dimensions_and_background() {
        let input = r#"<div class="draggable-row" data-block-id="sized" style="width: 300px; height: 120px; background-color: #3b82f6"><p>x</p></div>"#;
        let tree = parse_fragment(input).unwrap();
        let row = tree.get(BlockId::intern("sized")).unwrap();

        assert_eq!(row.dimensions.width, Some(300.0));
        assert_eq!(row.dimensions.height, Some(120.0));
        assert_eq!(row.background().unwrap().to_hex(), "#3b82f6");
    }

    #[test]
    fn nested_same_tag_leaves_stay_balanced() {
        let input = r#"<div class="draggable-row"><div style="padding: 4px"><div>inner</div></div></div>"#;
        let tree = parse_fragment(input).unwrap();

        let row_idx = tree.rows()[0];
        let children = tree.children(row_idx);
        assert_eq!(children.len(), 1);
        match &tree.graph[children[0]].kind {
            BlockKind::Leaf { content } => {
                assert_eq!(content, r#"<div style="padding: 4px"><div>inner</div></div>"#)
            }
            _ => panic!("expected leaf"),
        }
    }

    #[test]
    fn void_and_self_closing_tags() {
        let input = r#"<div class="draggable-row"><hr /></div><div class="draggable-row"><img src="a.png"></div>"#;
        let tree = parse_fragment(input).unwrap();
        assert_eq!(tree.rows().len(), 2);
    }

    #[test]
    fn unclosed_element_is_serialization_failure() {
        let err = parse_fragment(r#"<div class="draggable-row"><p>oops</div>"#);
        assert!(matches!(err, Err(EditError::SerializationFailure(_))));
    }

    #[test]
    fn comments_are_skipped() {
        let input = r#"<!-- header --><div class="draggable-row"><p>x</p></div>"#;
        let tree = parse_fragment(input).unwrap();
        assert_eq!(tree.rows().len(), 1);
    }

    #[test]
    fn empty_fragment_is_empty_document() {
        let tree = parse_fragment("  \n ").unwrap();
        assert_eq!(tree.count_blocks(), 0);
    }

    #[test]
    fn text_run_between_rows_becomes_row() {
        let input = r#"<div class="draggable-row"><p>a</p></div>stray text<div class="draggable-row"><p>b</p></div>"#;
        let tree = parse_fragment(input).unwrap();
        assert_eq!(tree.rows().len(), 3);
    }
}
