//! Data model for the lifting pass and the capability contract it requires
//! from a language front end.
//!
//! The core never touches a concrete syntax tree. It sees a document as a
//! pre-order arena of opaque nodes, each with a [`NodeKind`], a span, and a
//! parent, and asks the front end targeted questions about the nodes it cares
//! about (closure signatures, data-flow-in sets, name visibility). The
//! production front end wraps a real parser; tests construct documents by
//! hand.

use crate::error::LiftError;
use delambda_diagnostics::Span;

/// Canonical name of the single method every holder class carries.
pub const METHOD_NAME: &str = "invoke";

/// Index of a node in the front end's pre-order arena.
///
/// Arena order is document order: iterating ids from zero visits every node
/// before any of its descendants, left to right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Classification of syntax nodes, as reported by the front end.
///
/// The closure-introducing kinds form a closed enumeration: adding support
/// for a new closure-like construct means adding a variant here and a match
/// arm in [`NodeKind::introduces_closure`]. The structural kinds are the ones
/// the rewriter navigates by when placing generated statements. Everything
/// else is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Anonymous function literal, expression- or statement-bodied.
    LambdaExpression,
    /// Anonymous method construct (`function` expression).
    AnonymousMethod,
    /// Named function declared inside another function's body.
    LocalFunction,
    /// Query pipeline: filtering clause.
    QueryFilterClause,
    /// Query pipeline: ordering clause.
    QueryOrderingClause,
    /// Query pipeline: let binding clause.
    QueryLetClause,
    /// Query pipeline: join clause.
    QueryJoinClause,
    /// Query pipeline: grouping clause.
    QueryGroupClause,
    /// Query pipeline: source-binding clause. The first one of a pipeline
    /// introduces the iteration variable but captures nothing itself.
    QuerySourceClause { first_in_pipeline: bool },

    /// Variable declaration in statement position.
    VariableDeclaration,
    /// Expression statement.
    ExpressionStatement,
    /// Return statement.
    ReturnStatement,
    /// Class or other type declaration.
    TypeDeclaration,

    /// Anything the pass does not navigate by.
    Other,
}

impl NodeKind {
    /// Whether a node of this kind creates a closure scope that the pass
    /// must lift.
    pub fn introduces_closure(self) -> bool {
        match self {
            NodeKind::LambdaExpression
            | NodeKind::AnonymousMethod
            | NodeKind::LocalFunction
            | NodeKind::QueryFilterClause
            | NodeKind::QueryOrderingClause
            | NodeKind::QueryLetClause
            | NodeKind::QueryJoinClause
            | NodeKind::QueryGroupClause => true,
            NodeKind::QuerySourceClause { first_in_pipeline } => !first_in_pipeline,
            _ => false,
        }
    }
}

/// A type as resolved by the front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    /// Concrete type, rendered the way the target language spells it.
    Resolved(String),
    /// The front end could not determine a concrete type.
    Unresolved,
}

impl TypeRef {
    pub fn resolved(text: impl Into<String>) -> Self {
        TypeRef::Resolved(text.into())
    }
}

/// Return type descriptor of a closure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnType {
    /// The closure produces no value.
    Void,
    /// The closure produces a value of the given type.
    Value(TypeRef),
}

/// One formal parameter of a closure.
#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub ty: TypeRef,
}

/// Signature of a closure site.
#[derive(Debug, Clone)]
pub struct Signature {
    pub params: Vec<Param>,
    pub ret: ReturnType,
    pub is_async: bool,
    pub is_generator: bool,
}

/// Whether a closure body is a bare expression or a statement block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyForm {
    Expression,
    Block,
}

/// The body of a closure site.
#[derive(Debug, Clone, Copy)]
pub struct ClosureBody {
    /// The body's node in the arena.
    pub node: NodeId,
    pub form: BodyForm,
}

/// A discovered closure site. Read-only once discovered; owned by the
/// pipeline for the duration of one conversion.
#[derive(Debug, Clone)]
pub struct ClosureSite {
    pub node: NodeId,
    pub span: Span,
    pub signature: Signature,
    pub body: ClosureBody,
    /// Name the site binds in its enclosing scope, when it has one (local
    /// function declarations).
    pub declared_name: Option<String>,
}

/// How an identifier read inside a closure resolves in its enclosing scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    /// A local variable of an enclosing function.
    Local,
    /// A formal parameter of an enclosing function.
    Parameter,
    /// A field of the enclosing type.
    InstanceMember,
    /// The enclosing instance itself (`this`).
    EnclosingInstance,
    /// The binding the site itself introduces (recursive reference).
    SelfReference,
    /// A module-scope or ambient binding, still visible where the holder
    /// class is emitted.
    ModuleScope,
}

/// One entry of a closure's data-flow-in set.
#[derive(Debug, Clone)]
pub struct InboundBinding {
    pub name: String,
    pub kind: BindingKind,
    pub ty: TypeRef,
    /// Where the first read occurs, for error reporting.
    pub span: Span,
}

/// A free variable the closure reads from its enclosing scope, with its
/// concrete type. Produced by the capture analyzer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureEntry {
    pub name: String,
    pub ty: String,
}

/// Ordered captures of one site. Enumeration order is the order the
/// data-flow collaborator reports; empty is valid.
pub type CaptureSet = Vec<CaptureEntry>;

/// One synthesized field of a holder class.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub ty: String,
}

/// The transformed closure body carried by a holder method.
#[derive(Debug, Clone, Copy)]
pub enum MethodBody {
    /// Statement block copied verbatim from the closure body.
    Block(NodeId),
    /// Expression body executed for effect (void closure).
    ExpressionStatement(NodeId),
    /// Expression body wrapped in an implicit return.
    ReturnExpression(NodeId),
}

/// The single method of a holder class.
#[derive(Debug, Clone)]
pub struct Method {
    pub name: String,
    /// (name, concrete type) per parameter, in declaration order.
    pub params: Vec<(String, String)>,
    /// `None` encodes the no-value variant.
    pub ret: Option<String>,
    pub is_async: bool,
    pub is_generator: bool,
    pub body: MethodBody,
}

/// A synthesized holder class: one field per capture, exactly one method.
/// Created once per site and never mutated afterward.
#[derive(Debug, Clone)]
pub struct HolderType {
    pub name: String,
    pub fields: Vec<Field>,
    pub method: Method,
}

/// Everything needed to rewrite one site: the holder class, the instance to
/// create, the field assignments to emit, and the call-site replacement.
#[derive(Debug, Clone)]
pub struct SiteTransformation {
    pub site: ClosureSite,
    pub holder: HolderType,
    /// Name of the generated local instance binding.
    pub instance: String,
    /// Capture names to assign, in capture order.
    pub field_inits: Vec<String>,
    /// Statement before which the instantiation and assignments go.
    pub anchor: NodeId,
    /// When true the anchor statement itself is the closure (a local
    /// function declaration) and is replaced wholesale by a binding of the
    /// bound method reference.
    pub replaces_anchor: bool,
}

/// The complete, ordered plan for one document. Applied atomically at commit
/// or not at all.
#[derive(Debug, Clone, Default)]
pub struct TransformationPlan {
    pub sites: Vec<SiteTransformation>,
    /// Sites left unconverted because no enclosing statement exists.
    pub skipped: Vec<NodeId>,
}

/// Capability contract the lifting core requires from a language front end.
///
/// One instance describes one parsed document. All queries are pure: nothing
/// here mutates the underlying tree. [`SemanticDocument::format`] is invoked
/// exactly once, at commit, and is the only operation that produces output
/// text.
pub trait SemanticDocument {
    /// The document root.
    fn root(&self) -> NodeId;

    /// Total number of arena nodes. Iterating `0..node_count()` visits the
    /// document in document order.
    fn node_count(&self) -> usize;

    fn kind_of(&self, node: NodeId) -> NodeKind;

    fn parent_of(&self, node: NodeId) -> Option<NodeId>;

    /// Pre-order descendants of `node`, excluding `node` itself.
    fn descendants_of(&self, node: NodeId) -> Vec<NodeId>;

    fn span_of(&self, node: NodeId) -> Span;

    /// Signature of a closure-kind node. Only meaningful for nodes whose
    /// kind [`NodeKind::introduces_closure`].
    fn closure_signature(&self, node: NodeId) -> Signature;

    /// Body of a closure-kind node.
    fn closure_body(&self, node: NodeId) -> ClosureBody;

    /// Name a closure-kind node binds in its enclosing scope, if any.
    fn declared_name_of(&self, node: NodeId) -> Option<String>;

    /// Which identifiers the region reads from its enclosing scope, in the
    /// order the semantic layer enumerates them.
    fn data_flow_in(&self, node: NodeId) -> Vec<InboundBinding>;

    /// Whether `name` would collide with any symbol visible at `node`.
    /// Over-approximation is allowed; under-approximation is not.
    fn is_name_visible_at(&self, node: NodeId, name: &str) -> bool;

    /// Apply the committed plan and pretty-print the resulting document.
    fn format(&self, plan: &TransformationPlan) -> Result<String, LiftError>;
}
