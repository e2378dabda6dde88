pub mod emitter;
pub mod error;
pub mod id;
pub mod model;
pub mod parser;
pub mod templates;

pub use emitter::{emit_document, emit_with_settings};
pub use error::EditError;
pub use id::BlockId;
pub use model::*;
pub use parser::parse_fragment;
pub use templates::{
    CONTENT_TEMPLATES, ContentTemplate, LAYOUT_TEMPLATES, LayoutTemplate, MediaKind,
    build_content_row, build_layout_rows, build_media_row, lookup_content, lookup_layout,
    media_leaf,
};

// Re-export petgraph types so downstream crates don't need a direct dependency
pub use petgraph::graph::NodeIndex;
