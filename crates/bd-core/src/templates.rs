//! Template libraries: content blocks, multi-column layouts, media leaves.
//!
//! These are the named payloads the sidebar drags into the document. The
//! engine treats template markup as opaque — a template is just a way to
//! construct a `Subtree` to insert. Markup mirrors the surface dialect:
//! rows get placeholder content with dashed borders until the user edits
//! them.

use crate::model::{Align, Block, StyleAttr, Subtree};

/// A named content-block template from the sidebar library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentTemplate {
    pub name: &'static str,
    /// Markup fragment for the block's leaf. Empty for `image` — that
    /// entry routes through the uploader dialog instead of a drop.
    pub markup: &'static str,
}

const PLACEHOLDER_STYLE: &str =
    "padding: 15px; border: 1px dashed #d1d5db; background-color: #f9fafb;";

/// The sidebar's content-block library.
pub const CONTENT_TEMPLATES: &[ContentTemplate] = &[
    ContentTemplate {
        name: "title",
        markup: "<h2 contenteditable=\"true\" style=\"font-size: 24px; font-weight: bold; margin: 0; padding: 10px; border: 1px dashed #d1d5db; background-color: #f9fafb;\">Your Title Here</h2>",
    },
    ContentTemplate {
        name: "paragraph",
        markup: "<div contenteditable=\"true\" style=\"padding: 15px; border: 1px dashed #d1d5db; background-color: #f9fafb; min-height: 60px;\"><p style=\"margin: 0;\">Click here to add your paragraph text.</p></div>",
    },
    ContentTemplate {
        name: "list",
        markup: "<ul contenteditable=\"true\" style=\"padding: 15px; border: 1px dashed #d1d5db; background-color: #f9fafb;\"><li>List item 1</li><li>List item 2</li><li>List item 3</li></ul>",
    },
    ContentTemplate {
        name: "image",
        markup: "",
    },
    ContentTemplate {
        name: "button",
        markup: "<a href=\"#\" contenteditable=\"true\" style=\"background-color: #8b5cf6; color: white; padding: 10px 20px; text-decoration: none; border-radius: 4px; display: inline-block;\">Click Me</a>",
    },
    ContentTemplate {
        name: "table",
        markup: "<table contenteditable=\"true\" style=\"width: 100%; border-collapse: collapse; border: 1px dashed #d1d5db;\"><tr><td style=\"border: 1px solid #d1d5db; padding: 8px;\">Cell 1</td><td style=\"border: 1px solid #d1d5db; padding: 8px;\">Cell 2</td></tr><tr><td style=\"border: 1px solid #d1d5db; padding: 8px;\">Cell 3</td><td style=\"border: 1px solid #d1d5db; padding: 8px;\">Cell 4</td></tr></table>",
    },
    ContentTemplate {
        name: "divider",
        markup: "<hr style=\"border: 0; height: 1px; background-color: #e5e7eb; margin: 20px 0;\" />",
    },
    ContentTemplate {
        name: "spacer",
        markup: "<div style=\"height: 30px; border: 1px dashed #d1d5db; background-color: #f9fafb;\"></div>",
    },
    ContentTemplate {
        name: "social",
        markup: "<div contenteditable=\"true\" style=\"text-align: center; padding: 15px; border: 1px dashed #d1d5db; background-color: #f9fafb;\">Follow us on social media!</div>",
    },
    ContentTemplate {
        name: "html",
        markup: "<div contenteditable=\"true\" style=\"padding: 15px; border: 1px dashed #d1d5db; background-color: #f9fafb; font-family: monospace;\">&lt;p&gt;Custom HTML code here&lt;/p&gt;</div>",
    },
    ContentTemplate {
        name: "video",
        markup: "<div contenteditable=\"true\" style=\"text-align: center; padding: 15px; border: 1px dashed #d1d5db; background-color: #f9fafb;\">Video placeholder - Add your video embed code here</div>",
    },
    ContentTemplate {
        name: "icons",
        markup: "<div contenteditable=\"true\" style=\"text-align: center; padding: 15px; border: 1px dashed #d1d5db; background-color: #f9fafb;\">📧 📞 🌐</div>",
    },
    ContentTemplate {
        name: "menu",
        markup: "<nav contenteditable=\"true\" style=\"padding: 15px; border: 1px dashed #d1d5db; background-color: #f9fafb;\"><a href=\"#\" style=\"margin-right: 20px;\">Home</a><a href=\"#\" style=\"margin-right: 20px;\">About</a><a href=\"#\" style=\"margin-right: 20px;\">Contact</a></nav>",
    },
    ContentTemplate {
        name: "sticker",
        markup: "<div contenteditable=\"true\" style=\"text-align: center; background: linear-gradient(45deg, #ff6b6b, #4ecdc4); color: white; padding: 10px; border-radius: 10px; display: inline-block;\">Sticker Text</div>",
    },
    ContentTemplate {
        name: "gif",
        markup: "<div contenteditable=\"true\" style=\"text-align: center; padding: 15px; border: 1px dashed #d1d5db; background-color: #f9fafb;\">GIF placeholder - Add your GIF URL here</div>",
    },
];

/// Look up a content template by name.
pub fn lookup_content(name: &str) -> Option<&'static ContentTemplate> {
    CONTENT_TEMPLATES.iter().find(|t| t.name == name)
}

/// Build the row a content template inserts: one row, one leaf.
pub fn build_content_row(template: &ContentTemplate) -> Subtree {
    Subtree::with_children(
        Block::row(),
        vec![Subtree::new(Block::leaf(template.markup))],
    )
}

// ─── Layouts ─────────────────────────────────────────────────────────────

/// A multi-column row template. `columns` holds each column's width
/// fraction; per-column IDs are generated at build time so later color /
/// background drops can target one column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutTemplate {
    pub id: &'static str,
    pub name: &'static str,
    pub columns: &'static [f32],
}

const THIRD: f32 = 1.0 / 3.0;

/// The sidebar's layout library.
pub const LAYOUT_TEMPLATES: &[LayoutTemplate] = &[
    LayoutTemplate {
        id: "single-column",
        name: "Single Column",
        columns: &[1.0],
    },
    LayoutTemplate {
        id: "two-column-left",
        name: "Two Column (Left)",
        columns: &[THIRD, 2.0 * THIRD],
    },
    LayoutTemplate {
        id: "two-column-right",
        name: "Two Column (Right)",
        columns: &[2.0 * THIRD, THIRD],
    },
    LayoutTemplate {
        id: "two-column-equal",
        name: "Two Column (Equal)",
        columns: &[0.5, 0.5],
    },
    LayoutTemplate {
        id: "three-column",
        name: "Three Column",
        columns: &[THIRD, THIRD, THIRD],
    },
    LayoutTemplate {
        id: "two-row",
        name: "Two Row",
        // Two stacked rows — built as two single-column rows on drop.
        columns: &[1.0],
    },
];

/// Look up a layout template by its wire id (the `layout-` payload suffix).
pub fn lookup_layout(id: &str) -> Option<&'static LayoutTemplate> {
    LAYOUT_TEMPLATES.iter().find(|t| t.id == id)
}

/// Placeholder leaf every fresh layout column starts with.
fn column_placeholder() -> Subtree {
    Subtree::new(Block::leaf(format!(
        "<div contenteditable=\"true\" style=\"{PLACEHOLDER_STYLE} min-height: 60px;\"><p style=\"margin: 0;\">Add content</p></div>"
    )))
}

/// Build the row(s) a layout template inserts. `two-row` yields two rows;
/// everything else yields one row of columns.
pub fn build_layout_rows(template: &LayoutTemplate) -> Vec<Subtree> {
    if template.id == "two-row" {
        return (0..2)
            .map(|_| {
                Subtree::with_children(
                    Block::row(),
                    vec![Subtree::with_children(
                        Block::column(Some(1.0)),
                        vec![column_placeholder()],
                    )],
                )
            })
            .collect();
    }

    let columns = template
        .columns
        .iter()
        .map(|&pct| Subtree::with_children(Block::column(Some(pct)), vec![column_placeholder()]))
        .collect();
    vec![Subtree::with_children(Block::row(), columns)]
}

// ─── Media ───────────────────────────────────────────────────────────────

/// The media sources the uploader dialogs resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Image,
    Video,
    Gif,
    Icon,
    Sticker,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Gif => "gif",
            MediaKind::Icon => "icon",
            MediaKind::Sticker => "sticker",
        }
    }
}

/// Wrap a resolved media URL (or data URL from an upload) into a leaf with
/// a caption region underneath.
pub fn media_leaf(kind: MediaKind, url: &str) -> Subtree {
    let body = match kind {
        MediaKind::Video => format!(
            "<video controls src=\"{url}\" style=\"max-width: 100%;\"></video>"
        ),
        _ => format!(
            "<img src=\"{url}\" alt=\"Inserted {}\" style=\"max-width: 100%;\" />",
            kind.as_str()
        ),
    };
    Subtree::new(Block::leaf(format!(
        "<figure style=\"margin: 0; text-align: center;\">{body}<figcaption contenteditable=\"true\" style=\"font-size: 12px; color: #6b7280;\">Add a caption</figcaption></figure>"
    )))
}

/// Build the row a completed upload inserts.
pub fn build_media_row(kind: MediaKind, url: &str) -> Subtree {
    let mut row = Block::row();
    row.set_attr(StyleAttr::TextAlign(Align::Center));
    Subtree::with_children(row, vec![media_leaf(kind, url)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BlockKind;

    #[test]
    fn every_template_has_unique_name() {
        for (i, t) in CONTENT_TEMPLATES.iter().enumerate() {
            assert!(
                CONTENT_TEMPLATES.iter().skip(i + 1).all(|o| o.name != t.name),
                "duplicate template {}",
                t.name
            );
        }
    }

    #[test]
    fn image_template_routes_through_uploader() {
        assert_eq!(lookup_content("image").unwrap().markup, "");
    }

    #[test]
    fn two_column_layout_builds_row_of_two() {
        let rows = build_layout_rows(lookup_layout("two-column-equal").unwrap());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].children.len(), 2);
        for col in &rows[0].children {
            assert!(col.block.kind.is_column());
            assert_eq!(col.children.len(), 1);
            assert!(col.children[0].block.kind.is_leaf());
        }
    }

    #[test]
    fn two_row_layout_builds_two_rows() {
        let rows = build_layout_rows(lookup_layout("two-row").unwrap());
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.block.kind.is_row()));
    }

    #[test]
    fn media_leaf_has_caption_region() {
        let leaf = media_leaf(MediaKind::Image, "https://example.com/pic.png");
        match &leaf.block.kind {
            BlockKind::Leaf { content } => {
                assert!(content.contains("pic.png"));
                assert!(content.contains("figcaption"));
            }
            _ => panic!("expected leaf"),
        }
    }
}
