//! Hand-constructed documents for exercising the core without a parser.

use crate::error::LiftError;
use crate::model::{
    BindingKind, BodyForm, ClosureBody, InboundBinding, NodeId, NodeKind, Param, ReturnType,
    SemanticDocument, Signature, TransformationPlan, TypeRef,
};
use delambda_diagnostics::{FileId, Span};
use std::collections::{HashMap, HashSet};

struct FakeNode {
    kind: NodeKind,
    span: Span,
    parent: Option<NodeId>,
}

struct FakeClosure {
    signature: Signature,
    body: ClosureBody,
    declared_name: Option<String>,
    inbound: Vec<InboundBinding>,
}

/// A document whose tree, signatures, and data-flow answers are all supplied
/// by the test.
#[derive(Default)]
pub struct FakeDocument {
    nodes: Vec<FakeNode>,
    closures: HashMap<NodeId, FakeClosure>,
    visible: HashSet<String>,
}

impl FakeDocument {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_span(&self) -> Span {
        let at = self.nodes.len() as u32 * 10;
        Span::new(FileId(0), at, at + 5)
    }

    /// Push the document root. Must be called first.
    pub fn push_root(&mut self) -> NodeId {
        assert!(self.nodes.is_empty(), "root must be the first node");
        let span = self.next_span();
        self.nodes.push(FakeNode {
            kind: NodeKind::Other,
            span,
            parent: None,
        });
        NodeId(0)
    }

    pub fn push_node(&mut self, kind: NodeKind, parent: NodeId) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        let span = self.next_span();
        self.nodes.push(FakeNode {
            kind,
            span,
            parent: Some(parent),
        });
        id
    }

    /// A lambda `(m: number) => ...boolean...` with one capture entry per
    /// `(name, type)` pair.
    pub fn push_simple_closure(&mut self, parent: NodeId, captures: &[(&str, &str)]) -> NodeId {
        let node = self.push_closure(
            parent,
            Signature {
                params: vec![Param {
                    name: "m".into(),
                    ty: TypeRef::resolved("number"),
                }],
                ret: ReturnType::Value(TypeRef::resolved("boolean")),
                is_async: false,
                is_generator: false,
            },
            BodyForm::Expression,
            None,
        );
        for (name, ty) in captures {
            let binding = inbound(name, BindingKind::Local, Some(ty));
            self.push_inbound(node, binding);
        }
        node
    }

    /// A closure node of the given shape, with an attached body node.
    pub fn push_closure(
        &mut self,
        parent: NodeId,
        signature: Signature,
        body_form: BodyForm,
        declared_name: Option<&str>,
    ) -> NodeId {
        let kind = if declared_name.is_some() {
            NodeKind::LocalFunction
        } else {
            NodeKind::LambdaExpression
        };
        let node = self.push_node(kind, parent);
        let body_node = self.push_node(NodeKind::Other, node);
        self.closures.insert(
            node,
            FakeClosure {
                signature,
                body: ClosureBody {
                    node: body_node,
                    form: body_form,
                },
                declared_name: declared_name.map(String::from),
                inbound: Vec::new(),
            },
        );
        node
    }

    /// A nested `function <name>() { ... }` declaration.
    pub fn push_local_function(&mut self, parent: NodeId, name: &str) -> NodeId {
        self.push_closure(
            parent,
            Signature {
                params: Vec::new(),
                ret: ReturnType::Void,
                is_async: false,
                is_generator: false,
            },
            BodyForm::Block,
            Some(name),
        )
    }

    pub fn push_inbound(&mut self, node: NodeId, binding: InboundBinding) {
        self.closures
            .get_mut(&node)
            .expect("not a closure node")
            .inbound
            .push(binding);
    }

    pub fn closure_body_node(&self, node: NodeId) -> NodeId {
        self.closures[&node].body.node
    }

    pub fn add_visible_name(&mut self, name: &str) {
        self.visible.insert(name.to_string());
    }

    fn is_descendant(&self, node: NodeId, ancestor: NodeId) -> bool {
        let mut current = self.nodes[node.index()].parent;
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.nodes[parent.index()].parent;
        }
        false
    }
}

impl SemanticDocument for FakeDocument {
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
        (0..self.nodes.len() as u32)
            .map(NodeId)
            .filter(|&id| self.is_descendant(id, node))
            .collect()
    }

    fn span_of(&self, node: NodeId) -> Span {
        self.nodes[node.index()].span
    }

    fn closure_signature(&self, node: NodeId) -> Signature {
        self.closures[&node].signature.clone()
    }

    fn closure_body(&self, node: NodeId) -> ClosureBody {
        self.closures[&node].body
    }

    fn declared_name_of(&self, node: NodeId) -> Option<String> {
        self.closures[&node].declared_name.clone()
    }

    fn data_flow_in(&self, node: NodeId) -> Vec<InboundBinding> {
        self.closures[&node].inbound.clone()
    }

    fn is_name_visible_at(&self, _node: NodeId, name: &str) -> bool {
        self.visible.contains(name)
    }

    fn format(&self, plan: &TransformationPlan) -> Result<String, LiftError> {
        // A flat rendering, good enough for asserting on commit results.
        let mut out = String::new();
        for site in &plan.sites {
            let fields: Vec<&str> = site.holder.fields.iter().map(|f| f.name.as_str()).collect();
            out.push_str(&format!(
                "class {} fields=[{}] inst={} inits=[{}] anchor={} replaces={}\n",
                site.holder.name,
                fields.join(","),
                site.instance,
                site.field_inits.join(","),
                site.anchor.0,
                site.replaces_anchor,
            ));
        }
        out.push_str(&format!("skipped={}\n", plan.skipped.len()));
        Ok(out)
    }
}

/// Shorthand for building data-flow entries in tests.
pub fn inbound(name: &str, kind: BindingKind, ty: Option<&str>) -> InboundBinding {
    InboundBinding {
        name: name.to_string(),
        kind,
        ty: match ty {
            Some(t) => TypeRef::resolved(t),
            None => TypeRef::Unresolved,
        },
        span: Span::new(FileId(0), 0, 1),
    }
}
