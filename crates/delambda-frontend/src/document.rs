//! The parsed-document handle the lifting core queries.
//!
//! A [`TsDocument`] owns the source text, a pre-order node arena built from
//! the SWC AST, and the per-closure details (signature, body, data-flow-in
//! set, free-occurrence spans) the builder collected in one walk. All core
//! queries are answered from these tables; the SWC AST itself is dropped
//! after building.

use delambda_diagnostics::{Diagnostics, FileId, Span};
use delambda_transform::{
    ClosureBody, InboundBinding, LiftError, NodeId, NodeKind, SemanticDocument, Signature,
    TransformationPlan,
};
use std::collections::{HashMap, HashSet};

use crate::render;

/// One arena node. Nodes are stored in pre-order, so a node's descendants
/// occupy the contiguous index range `(index, subtree_end)`.
#[derive(Debug)]
pub(crate) struct NodeData {
    pub kind: NodeKind,
    pub span: Span,
    pub parent: Option<NodeId>,
    /// Exclusive end of this node's subtree in the arena.
    pub subtree_end: u32,
}

/// A free read of an enclosing binding inside a closure body, kept for
/// `this.`-qualification when the body text is copied into the holder
/// method.
#[derive(Debug, Clone)]
pub(crate) struct Occurrence {
    pub name: String,
    pub span: Span,
    /// Object-literal shorthand (`{ x }`) needs `x: this.x`, not `this.x`.
    pub shorthand: bool,
}

/// Everything the builder learned about one closure site.
#[derive(Debug)]
pub(crate) struct ClosureInfo {
    pub signature: Signature,
    pub body: ClosureBody,
    pub declared_name: Option<String>,
    pub inbound: Vec<InboundBinding>,
    pub occurrences: Vec<Occurrence>,
}

/// A parsed TypeScript document, ready for the lifting core.
pub struct TsDocument {
    pub(crate) source: String,
    pub(crate) file_id: FileId,
    pub(crate) nodes: Vec<NodeData>,
    pub(crate) closures: HashMap<NodeId, ClosureInfo>,
    /// Every identifier spelled anywhere in the document. Used as a safe
    /// over-approximation of the symbols visible at any position.
    pub(crate) idents: HashSet<String>,
    /// Byte offset where generated holder classes are inserted (before the
    /// first non-import top-level item).
    pub(crate) class_anchor: u32,
    /// Recoverable parse warnings, surfaced by the driver.
    pub diagnostics: Diagnostics,
}

impl TsDocument {
    /// The file this document was parsed from.
    pub fn file_id(&self) -> FileId {
        self.file_id
    }

    /// Source text of a span.
    pub(crate) fn text_of(&self, span: Span) -> &str {
        let start = span.start as usize;
        let end = (span.end as usize).min(self.source.len());
        &self.source[start.min(end)..end]
    }

    pub(crate) fn closure(&self, node: NodeId) -> &ClosureInfo {
        self.closures
            .get(&node)
            .expect("queried a node that is not a closure site")
    }
}

impl SemanticDocument for TsDocument {
    fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn kind_of(&self, node: NodeId) -> NodeKind {
        self.nodes[node.index()].kind
    }

    fn parent_of(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.index()].parent
    }

    fn descendants_of(&self, node: NodeId) -> Vec<NodeId> {
        let start = node.0 + 1;
        let end = self.nodes[node.index()].subtree_end;
        (start..end).map(NodeId).collect()
    }

    fn span_of(&self, node: NodeId) -> Span {
        self.nodes[node.index()].span
    }

    fn closure_signature(&self, node: NodeId) -> Signature {
        self.closure(node).signature.clone()
    }

    fn closure_body(&self, node: NodeId) -> ClosureBody {
        self.closure(node).body
    }

    fn declared_name_of(&self, node: NodeId) -> Option<String> {
        self.closure(node).declared_name.clone()
    }

    fn data_flow_in(&self, node: NodeId) -> Vec<InboundBinding> {
        self.closure(node).inbound.clone()
    }

    fn is_name_visible_at(&self, _node: NodeId, name: &str) -> bool {
        self.idents.contains(name)
    }

    fn format(&self, plan: &TransformationPlan) -> Result<String, LiftError> {
        render::apply(self, plan)
    }
}
