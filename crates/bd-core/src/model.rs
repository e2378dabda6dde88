//! Core data model for block documents.
//!
//! A document is a tree of content blocks: the root holds a flat, ordered
//! sequence of `Row` blocks; rows may hold `Column` blocks (stacked
//! horizontally); rows and columns hold `Leaf` blocks carrying opaque rich
//! markup. All structural mutation goes through `BlockTree` — the rendered
//! surface is a derived projection and is never the source of truth.

use crate::error::EditError;
use crate::id::BlockId;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;

// ─── Colors ──────────────────────────────────────────────────────────────

/// RGBA color. Stored as 4 × f32 [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Helper to parse a single hex digit.
fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parse a hex color string: `#RGB` or `#RRGGBB`.
    /// The string may optionally start with `#`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bytes = hex.as_bytes();

        match bytes.len() {
            3 => {
                let r = hex_val(bytes[0])?;
                let g = hex_val(bytes[1])?;
                let b = hex_val(bytes[2])?;
                Some(Self::rgba(
                    (r * 17) as f32 / 255.0,
                    (g * 17) as f32 / 255.0,
                    (b * 17) as f32 / 255.0,
                    1.0,
                ))
            }
            6 => {
                let r = hex_val(bytes[0])? << 4 | hex_val(bytes[1])?;
                let g = hex_val(bytes[2])? << 4 | hex_val(bytes[3])?;
                let b = hex_val(bytes[4])? << 4 | hex_val(bytes[5])?;
                Some(Self::rgba(
                    r as f32 / 255.0,
                    g as f32 / 255.0,
                    b as f32 / 255.0,
                    1.0,
                ))
            }
            _ => None,
        }
    }

    /// Emit as `#RRGGBB` (lowercase, the form the surface markup uses).
    pub fn to_hex(&self) -> String {
        let r = (self.r * 255.0).round() as u8;
        let g = (self.g * 255.0).round() as u8;
        let b = (self.b * 255.0).round() as u8;
        format!("#{r:02x}{g:02x}{b:02x}")
    }
}

// ─── Styling ─────────────────────────────────────────────────────────────

/// Horizontal text alignment of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

impl Align {
    pub fn as_css(&self) -> &'static str {
        match self {
            Align::Left => "left",
            Align::Center => "center",
            Align::Right => "right",
        }
    }

    pub fn from_css(s: &str) -> Option<Self> {
        match s {
            "left" => Some(Align::Left),
            "center" => Some(Align::Center),
            "right" => Some(Align::Right),
            _ => None,
        }
    }
}

/// A free-form presentational attribute on a block.
/// Set by drop-payload handlers (color swatches, background images) and
/// the settings panel — never structural.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StyleAttr {
    Background(Color),
    BackgroundImage(String),
    TextAlign(Align),
}

impl StyleAttr {
    /// Two attrs of the same variant occupy the same slot.
    fn same_slot(&self, other: &StyleAttr) -> bool {
        matches!(
            (self, other),
            (StyleAttr::Background(_), StyleAttr::Background(_))
                | (StyleAttr::BackgroundImage(_), StyleAttr::BackgroundImage(_))
                | (StyleAttr::TextAlign(_), StyleAttr::TextAlign(_))
        )
    }
}

/// Explicit width/height override written by the resize controller.
/// `None` means auto (flow-determined).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: Option<f32>,
    pub height: Option<f32>,
}

impl Dimensions {
    pub fn is_auto(&self) -> bool {
        self.width.is_none() && self.height.is_none()
    }
}

// ─── Blocks ──────────────────────────────────────────────────────────────

/// The block kinds in the document tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BlockKind {
    /// Root of the document. Holds rows only.
    Root,

    /// Top-level block, stacked vertically in document order.
    Row,

    /// Nested inside exactly one row, stacked horizontally with siblings.
    /// `width_pct` is the layout fraction assigned by its layout template.
    Column { width_pct: Option<f32> },

    /// Opaque rich-content payload (text, image, table, …) rendered as raw
    /// markup. Has no structural children.
    Leaf { content: String },
}

impl BlockKind {
    pub fn is_row(&self) -> bool {
        matches!(self, BlockKind::Row)
    }

    pub fn is_column(&self) -> bool {
        matches!(self, BlockKind::Column { .. })
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, BlockKind::Leaf { .. })
    }

    /// Structural invariant: what may nest under what.
    fn allowed_under(&self, parent: &BlockKind) -> bool {
        match self {
            BlockKind::Root => false,
            BlockKind::Row => matches!(parent, BlockKind::Root),
            BlockKind::Column { .. } => matches!(parent, BlockKind::Row),
            BlockKind::Leaf { .. } => {
                matches!(parent, BlockKind::Row | BlockKind::Column { .. })
            }
        }
    }
}

/// A single block in the document tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub kind: BlockKind,
    pub dimensions: Dimensions,
    pub attrs: SmallVec<[StyleAttr; 2]>,
}

impl Block {
    pub fn new(id: BlockId, kind: BlockKind) -> Self {
        Self {
            id,
            kind,
            dimensions: Dimensions::default(),
            attrs: SmallVec::new(),
        }
    }

    pub fn row() -> Self {
        Self::new(BlockId::with_prefix("row"), BlockKind::Row)
    }

    pub fn column(width_pct: Option<f32>) -> Self {
        Self::new(
            BlockId::with_prefix("col"),
            BlockKind::Column { width_pct },
        )
    }

    pub fn leaf(content: impl Into<String>) -> Self {
        Self::new(
            BlockId::with_prefix("leaf"),
            BlockKind::Leaf {
                content: content.into(),
            },
        )
    }

    /// Set or replace a presentational attribute.
    pub fn set_attr(&mut self, attr: StyleAttr) {
        if let Some(existing) = self.attrs.iter_mut().find(|a| a.same_slot(&attr)) {
            *existing = attr;
        } else {
            self.attrs.push(attr);
        }
    }

    pub fn background(&self) -> Option<&Color> {
        self.attrs.iter().find_map(|a| match a {
            StyleAttr::Background(c) => Some(c),
            _ => None,
        })
    }

    pub fn text_align(&self) -> Option<Align> {
        self.attrs.iter().find_map(|a| match a {
            StyleAttr::TextAlign(al) => Some(*al),
            _ => None,
        })
    }
}

/// An owned block with its children — the construction/transfer form used
/// by the parser, the template libraries, and subtree cloning. Inserted
/// into a `BlockTree` as one unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Subtree {
    pub block: Block,
    pub children: Vec<Subtree>,
}

impl Subtree {
    pub fn new(block: Block) -> Self {
        Self {
            block,
            children: Vec::new(),
        }
    }

    pub fn with_children(block: Block, children: Vec<Subtree>) -> Self {
        Self { block, children }
    }

    /// Total number of blocks in this subtree.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Subtree::count).sum::<usize>()
    }

    /// Re-identify every block in the subtree (used by duplication so the
    /// clone never aliases the original's IDs).
    pub fn refresh_ids(&mut self) {
        let prefix = match self.block.kind {
            BlockKind::Row => "row",
            BlockKind::Column { .. } => "col",
            BlockKind::Leaf { .. } => "leaf",
            BlockKind::Root => "root",
        };
        self.block.id = BlockId::with_prefix(prefix);
        for child in &mut self.children {
            child.refresh_ids();
        }
    }
}

// ─── The block tree ──────────────────────────────────────────────────────

/// The authoritative document structure.
///
/// Backed by a `StableDiGraph` (parent → child edges) plus an explicit
/// per-parent child-order table. Sibling order is semantic everywhere in a
/// block document, so the order table is authoritative — it is updated by
/// every insert/remove/move and `children()` reads only from it.
#[derive(Debug, Clone)]
pub struct BlockTree {
    pub graph: StableDiGraph<Block, ()>,
    pub root: NodeIndex,

    /// Index from BlockId → NodeIndex for fast lookup.
    id_index: HashMap<BlockId, NodeIndex>,

    /// Ordered children per parent. Every non-leaf node has an entry.
    child_order: HashMap<NodeIndex, Vec<NodeIndex>>,
}

impl BlockTree {
    /// Create a new empty tree with a root node.
    #[must_use]
    pub fn new() -> Self {
        let mut graph = StableDiGraph::new();
        let root_block = Block::new(BlockId::intern("root"), BlockKind::Root);
        let root = graph.add_node(root_block);

        let mut id_index = HashMap::new();
        id_index.insert(BlockId::intern("root"), root);

        let mut child_order = HashMap::new();
        child_order.insert(root, Vec::new());

        Self {
            graph,
            root,
            id_index,
            child_order,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────────

    pub fn get(&self, id: BlockId) -> Option<&Block> {
        self.id_index.get(&id).map(|idx| &self.graph[*idx])
    }

    pub fn get_mut(&mut self, id: BlockId) -> Option<&mut Block> {
        self.id_index
            .get(&id)
            .copied()
            .map(|idx| &mut self.graph[idx])
    }

    pub fn index_of(&self, id: BlockId) -> Option<NodeIndex> {
        self.id_index.get(&id).copied()
    }

    pub fn contains(&self, id: BlockId) -> bool {
        self.id_index.contains_key(&id)
    }

    pub fn parent(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .neighbors_directed(idx, petgraph::Direction::Incoming)
            .next()
    }

    /// Children of a node in document order.
    pub fn children(&self, idx: NodeIndex) -> &[NodeIndex] {
        self.child_order
            .get(&idx)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The root's ordered row sequence.
    pub fn rows(&self) -> &[NodeIndex] {
        self.children(self.root)
    }

    /// Position of a block within its parent's child order.
    pub fn position_of(&self, id: BlockId) -> Option<(NodeIndex, usize)> {
        let idx = self.index_of(id)?;
        let parent = self.parent(idx)?;
        let pos = self.children(parent).iter().position(|&c| c == idx)?;
        Some((parent, pos))
    }

    /// Number of blocks in the document, excluding the root.
    pub fn count_blocks(&self) -> usize {
        self.graph.node_count() - 1
    }

    /// Check if `ancestor_id` is a parent/grandparent/etc. of `descendant_id`.
    pub fn is_ancestor_of(&self, ancestor_id: BlockId, descendant_id: BlockId) -> bool {
        if ancestor_id == descendant_id {
            return false;
        }
        let mut current = match self.index_of(descendant_id) {
            Some(idx) => idx,
            None => return false,
        };
        while let Some(parent_idx) = self.parent(current) {
            if self.graph[parent_idx].id == ancestor_id {
                return true;
            }
            if matches!(self.graph[parent_idx].kind, BlockKind::Root) {
                break;
            }
            current = parent_idx;
        }
        false
    }

    /// Nearest `Row` ancestor of a block (the block itself if it is a row).
    /// Drop targets of any depth normalize to their row.
    pub fn row_of(&self, id: BlockId) -> Option<BlockId> {
        let mut idx = self.index_of(id)?;
        loop {
            let block = &self.graph[idx];
            match block.kind {
                BlockKind::Row => return Some(block.id),
                BlockKind::Root => return None,
                _ => idx = self.parent(idx)?,
            }
        }
    }

    // ── Mutation ─────────────────────────────────────────────────────────

    /// Insert a block under `parent` at `index` (clamped to the child count).
    /// Enforces the nesting invariants; violations leave the tree unchanged.
    pub fn insert(
        &mut self,
        parent: NodeIndex,
        index: usize,
        block: Block,
    ) -> Result<NodeIndex, EditError> {
        if !block.kind.allowed_under(&self.graph[parent].kind) {
            return Err(EditError::InvalidTarget);
        }
        let id = block.id;
        let idx = self.graph.add_node(block);
        self.graph.add_edge(parent, idx, ());
        self.id_index.insert(id, idx);
        let order = self.child_order.entry(parent).or_default();
        let at = index.min(order.len());
        order.insert(at, idx);
        self.child_order.entry(idx).or_default();
        Ok(idx)
    }

    /// Append a block as the last child of `parent`.
    pub fn append(&mut self, parent: NodeIndex, block: Block) -> Result<NodeIndex, EditError> {
        let len = self.children(parent).len();
        self.insert(parent, len, block)
    }

    /// Insert an owned subtree under `parent` at `index`.
    pub fn insert_subtree(
        &mut self,
        parent: NodeIndex,
        index: usize,
        subtree: Subtree,
    ) -> Result<NodeIndex, EditError> {
        let idx = self.insert(parent, index, subtree.block)?;
        for (i, child) in subtree.children.into_iter().enumerate() {
            self.insert_subtree(idx, i, child)?;
        }
        Ok(idx)
    }

    /// Clone the subtree rooted at `idx` into its owned form.
    pub fn clone_subtree(&self, idx: NodeIndex) -> Subtree {
        let children = self
            .children(idx)
            .to_vec()
            .into_iter()
            .map(|c| self.clone_subtree(c))
            .collect();
        Subtree {
            block: self.graph[idx].clone(),
            children,
        }
    }

    /// Remove a block and its whole subtree. Returns the removed subtree,
    /// or `None` if the id is unknown or names the root.
    pub fn remove(&mut self, id: BlockId) -> Option<Subtree> {
        let idx = self.index_of(id)?;
        if idx == self.root {
            return None;
        }
        let detached = self.clone_subtree(idx);
        if let Some(parent) = self.parent(idx)
            && let Some(order) = self.child_order.get_mut(&parent)
        {
            order.retain(|&c| c != idx);
        }
        self.remove_recursive(idx);
        Some(detached)
    }

    fn remove_recursive(&mut self, idx: NodeIndex) {
        for child in self.children(idx).to_vec() {
            self.remove_recursive(child);
        }
        self.child_order.remove(&idx);
        if let Some(block) = self.graph.remove_node(idx) {
            self.id_index.remove(&block.id);
        }
    }

    /// Atomically move a block to a new parent/position.
    ///
    /// Ownership transfers in one step: the block is unlinked from its old
    /// slot and linked into the new one with no intermediate state in which
    /// it exists twice or not at all. Rejected moves leave the tree
    /// untouched:
    /// - unknown block or parent,
    /// - moving a block into itself or its own subtree,
    /// - a nesting the block kind is not allowed to occupy (a column can
    ///   never become a top-level row).
    ///
    /// `index` is interpreted against the child list *without* the moved
    /// block, so "move before the block at position n" stays stable for
    /// same-parent reorders.
    pub fn move_block(
        &mut self,
        id: BlockId,
        new_parent_id: BlockId,
        index: usize,
    ) -> Result<(), EditError> {
        let idx = self.index_of(id).ok_or(EditError::InvalidTarget)?;
        let new_parent = self
            .index_of(new_parent_id)
            .ok_or(EditError::InvalidTarget)?;
        if idx == new_parent || self.is_ancestor_of(id, new_parent_id) {
            return Err(EditError::InvalidTarget);
        }
        if !self.graph[idx]
            .kind
            .allowed_under(&self.graph[new_parent].kind)
        {
            return Err(EditError::InvalidTarget);
        }

        let old_parent = self.parent(idx).ok_or(EditError::InvalidTarget)?;

        // Unlink from the old slot.
        if let Some(edge) = self.graph.find_edge(old_parent, idx) {
            self.graph.remove_edge(edge);
        }
        if let Some(order) = self.child_order.get_mut(&old_parent) {
            order.retain(|&c| c != idx);
        }

        // Link into the new slot.
        self.graph.add_edge(new_parent, idx, ());
        let order = self.child_order.entry(new_parent).or_default();
        let at = index.min(order.len());
        order.insert(at, idx);

        log::debug!("moved block {id} under {new_parent_id} at {at}");
        Ok(())
    }
}

impl Default for BlockTree {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Geometry ────────────────────────────────────────────────────────────

/// Axis-aligned bounding box of a rendered block, supplied by the host on
/// every drag tick. The engine never measures the surface itself.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn midpoint_y(&self) -> f32 {
        self.y + self.height / 2.0
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px <= self.x + self.width && py >= self.y && py <= self.y + self.height
    }
}

// ─── Document-level settings ─────────────────────────────────────────────

/// Presentation settings from the settings panel. Styling only — never
/// structural. Consumed by the emitter when wrapping the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSettings {
    /// Content area width in pixels.
    pub content_width: f32,
    /// Content area alignment within the viewport.
    pub alignment: Align,
    /// Page background color.
    pub background: Option<Color>,
}

impl Default for DocumentSettings {
    fn default() -> Self {
        Self {
            content_width: 650.0,
            alignment: Align::Center,
            background: None,
        }
    }
}
