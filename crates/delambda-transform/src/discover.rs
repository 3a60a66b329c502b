//! Lambda discovery: classify arena nodes as closure sites.
//!
//! Discovery is a pure query over the document. It never mutates anything,
//! can be restarted at will, and may yield nothing.

use crate::model::{ClosureSite, NodeId, SemanticDocument};

/// A lazy, document-ordered sequence of closure-site node ids.
pub fn closure_sites<'a>(
    doc: &'a dyn SemanticDocument,
) -> impl Iterator<Item = NodeId> + 'a {
    (0..doc.node_count() as u32)
        .map(NodeId)
        .filter(|&id| doc.kind_of(id).introduces_closure())
}

/// Materialize the details of one discovered site.
pub fn site_at(doc: &dyn SemanticDocument, node: NodeId) -> ClosureSite {
    ClosureSite {
        node,
        span: doc.span_of(node),
        signature: doc.closure_signature(node),
        body: doc.closure_body(node),
        declared_name: doc.declared_name_of(node),
    }
}
