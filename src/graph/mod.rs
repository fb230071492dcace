//! Property graph documents and the builder producing them.

mod builder;
mod document;

pub use builder::{
    BuildReport, BuiltGraph, GraphBuilder, PropertyGraph, SkipReason, StructuredGraph,
    DEFAULT_ALLOWED_PREFIXES,
};
pub use document::{
    document_id, edge_collection, edge_key, literal_value, AttributeValue, Attributes, Edge,
    Vertex,
};
