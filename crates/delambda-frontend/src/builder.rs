//! One walk over the SWC AST that builds everything the core asks about:
//! the pre-order node arena, closure signatures and bodies, and each
//! closure's data-flow-in set with the spans of its free reads.
//!
//! Scope handling mirrors the language: a scope per module, function, and
//! block, with declarations hoisted at block entry so a closure may read a
//! binding declared later in the same block. While one or more closure
//! frames are active, every identifier read is resolved against the scope
//! stack and classified per frame: bound inside the frame, bound in an
//! enclosing function (a capture), bound at module scope (still visible to
//! the emitted holder class), or the frame's own name (recursion).

use crate::document::{ClosureInfo, NodeData, Occurrence};
use crate::scope::{Binding, ScopeStack};
use crate::types;
use delambda_diagnostics::{FileId, Span};
use delambda_transform::{
    BindingKind, BodyForm, ClosureBody, InboundBinding, NodeId, NodeKind, ReturnType,
    Signature, TypeRef,
};
use std::collections::{HashMap, HashSet};
use swc_common::Spanned;
use swc_ecma_ast as ast;

/// Build the arena and closure tables for one parsed module.
pub(crate) fn build(
    src: &str,
    file_id: FileId,
    module: &ast::Module,
) -> (
    Vec<NodeData>,
    HashMap<NodeId, ClosureInfo>,
    HashSet<String>,
) {
    let mut builder = DocumentBuilder {
        src,
        file_id,
        nodes: Vec::new(),
        closures: HashMap::new(),
        idents: HashSet::new(),
        scopes: ScopeStack::new(),
        frames: Vec::new(),
        fn_depth: 0,
    };
    builder.walk_module(module);
    (builder.nodes, builder.closures, builder.idents)
}

/// An active closure whose free reads are being collected.
struct Frame {
    /// Identity of the closure, compared against bindings' function spans to
    /// recognize self-reference.
    site_span: Span,
    /// Scope depth when the frame was entered; any binding resolved in a
    /// shallower scope comes from outside the closure.
    entry_depth: usize,
    inbound: Vec<InboundBinding>,
    seen: HashSet<String>,
    occurrences: Vec<Occurrence>,
}

struct DocumentBuilder<'a> {
    src: &'a str,
    file_id: FileId,
    nodes: Vec<NodeData>,
    closures: HashMap<NodeId, ClosureInfo>,
    idents: HashSet<String>,
    scopes: ScopeStack,
    frames: Vec<Frame>,
    /// How many function bodies enclose the walk position.
    fn_depth: usize,
}

impl<'a> DocumentBuilder<'a> {
    fn span(&self, span: swc_common::Span) -> Span {
        // SWC byte positions start at 1 for the first file of a fresh map.
        Span::new(
            self.file_id,
            span.lo.0.saturating_sub(1),
            span.hi.0.saturating_sub(1),
        )
    }

    fn push_node(&mut self, kind: NodeKind, span: Span, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData {
            kind,
            span,
            parent,
            subtree_end: 0,
        });
        id
    }

    fn close_node(&mut self, id: NodeId) {
        let end = self.nodes.len() as u32;
        self.nodes[id.index()].subtree_end = end;
    }

    fn declare(&mut self, name: &str, binding: Binding) {
        self.idents.insert(name.to_string());
        self.scopes.declare(name, binding);
    }

    // ---- module ----------------------------------------------------------

    fn walk_module(&mut self, module: &ast::Module) {
        let root = self.push_node(NodeKind::Other, self.span(module.span), None);
        self.scopes.push();
        self.hoist_module_items(&module.body);
        for item in &module.body {
            match item {
                ast::ModuleItem::Stmt(stmt) => self.walk_stmt(stmt, root),
                ast::ModuleItem::ModuleDecl(decl) => self.walk_module_decl(decl, root),
            }
        }
        self.scopes.pop();
        self.close_node(root);
    }

    fn hoist_module_items(&mut self, items: &[ast::ModuleItem]) {
        for item in items {
            match item {
                ast::ModuleItem::Stmt(stmt) => self.hoist_stmt(stmt),
                ast::ModuleItem::ModuleDecl(decl) => match decl {
                    ast::ModuleDecl::Import(import) => {
                        for spec in &import.specifiers {
                            let local = match spec {
                                ast::ImportSpecifier::Named(named) => &named.local,
                                ast::ImportSpecifier::Default(default) => &default.local,
                                ast::ImportSpecifier::Namespace(ns) => &ns.local,
                            };
                            self.declare(&local.sym, Binding::local(TypeRef::Unresolved));
                        }
                    }
                    ast::ModuleDecl::ExportDecl(export) => self.hoist_decl(&export.decl),
                    _ => {}
                },
            }
        }
    }

    fn walk_module_decl(&mut self, decl: &ast::ModuleDecl, parent: NodeId) {
        match decl {
            ast::ModuleDecl::Import(import) => {
                let node = self.push_node(NodeKind::Other, self.span(import.span), Some(parent));
                self.close_node(node);
            }
            ast::ModuleDecl::ExportDecl(export) => {
                self.walk_decl(&export.decl, parent, Some(self.span(export.span)));
            }
            ast::ModuleDecl::ExportDefaultDecl(default) => {
                let node = self.push_node(NodeKind::Other, self.span(default.span), Some(parent));
                match &default.decl {
                    ast::DefaultDecl::Fn(fn_expr) => {
                        // `export default function` is an ordinary top-level
                        // function, not a closure site.
                        if let Some(body) = &fn_expr.function.body {
                            self.walk_plain_function(&fn_expr.function, body, node);
                        }
                    }
                    ast::DefaultDecl::Class(class_expr) => {
                        self.walk_class(&class_expr.class, node);
                    }
                    ast::DefaultDecl::TsInterfaceDecl(_) => {}
                }
                self.close_node(node);
            }
            ast::ModuleDecl::ExportDefaultExpr(default) => {
                let node = self.push_node(
                    NodeKind::ExpressionStatement,
                    self.span(default.span),
                    Some(parent),
                );
                self.walk_expr(&default.expr, node);
                self.close_node(node);
            }
            _ => {
                let node = self.push_node(NodeKind::Other, self.span(decl.span()), Some(parent));
                self.close_node(node);
            }
        }
    }

    // ---- statements ------------------------------------------------------

    fn hoist_stmts(&mut self, stmts: &[ast::Stmt]) {
        for stmt in stmts {
            self.hoist_stmt(stmt);
        }
    }

    fn hoist_stmt(&mut self, stmt: &ast::Stmt) {
        if let ast::Stmt::Decl(decl) = stmt {
            self.hoist_decl(decl);
        }
    }

    /// Declare a statement-level binding before walking its block, so reads
    /// ahead of the declaration still resolve.
    fn hoist_decl(&mut self, decl: &ast::Decl) {
        match decl {
            ast::Decl::Var(var) => {
                for declarator in &var.decls {
                    if let ast::Pat::Ident(ident) = &declarator.name {
                        let ty = types::declarator_type(self.src, declarator);
                        self.declare(&ident.id.sym, Binding::local(ty));
                    } else {
                        let mut names = Vec::new();
                        types::pat_names(self.src, &declarator.name, &mut names);
                        for (name, ty) in names {
                            self.declare(&name, Binding::local(ty));
                        }
                    }
                }
            }
            ast::Decl::Fn(fn_decl) => {
                let identity = self.fn_identity_span(fn_decl);
                let ty = types::function_type(self.src, &fn_decl.function);
                self.declare(&fn_decl.ident.sym, Binding::function(ty, identity));
            }
            ast::Decl::Class(class_decl) => {
                self.declare(&class_decl.ident.sym, Binding::local(TypeRef::Unresolved));
            }
            _ => {}
        }
    }

    fn fn_identity_span(&self, fn_decl: &ast::FnDecl) -> Span {
        self.span(fn_decl.ident.span)
            .merge(self.span(fn_decl.function.span))
    }

    fn walk_stmt(&mut self, stmt: &ast::Stmt, parent: NodeId) {
        match stmt {
            ast::Stmt::Decl(decl) => self.walk_decl(decl, parent, None),

            ast::Stmt::Expr(expr_stmt) => {
                let node = self.push_node(
                    NodeKind::ExpressionStatement,
                    self.span(expr_stmt.span),
                    Some(parent),
                );
                self.walk_expr(&expr_stmt.expr, node);
                self.close_node(node);
            }

            ast::Stmt::Return(ret) => {
                let node =
                    self.push_node(NodeKind::ReturnStatement, self.span(ret.span), Some(parent));
                if let Some(arg) = &ret.arg {
                    self.walk_expr(arg, node);
                }
                self.close_node(node);
            }

            ast::Stmt::Block(block) => {
                let node = self.push_node(NodeKind::Other, self.span(block.span), Some(parent));
                self.scopes.push();
                self.hoist_stmts(&block.stmts);
                for stmt in &block.stmts {
                    self.walk_stmt(stmt, node);
                }
                self.scopes.pop();
                self.close_node(node);
            }

            ast::Stmt::If(if_stmt) => {
                let node = self.push_node(NodeKind::Other, self.span(if_stmt.span), Some(parent));
                self.walk_expr(&if_stmt.test, node);
                self.walk_stmt(&if_stmt.cons, node);
                if let Some(alt) = &if_stmt.alt {
                    self.walk_stmt(alt, node);
                }
                self.close_node(node);
            }

            ast::Stmt::While(while_stmt) => {
                let node =
                    self.push_node(NodeKind::Other, self.span(while_stmt.span), Some(parent));
                self.walk_expr(&while_stmt.test, node);
                self.walk_stmt(&while_stmt.body, node);
                self.close_node(node);
            }

            ast::Stmt::DoWhile(do_stmt) => {
                let node = self.push_node(NodeKind::Other, self.span(do_stmt.span), Some(parent));
                self.walk_stmt(&do_stmt.body, node);
                self.walk_expr(&do_stmt.test, node);
                self.close_node(node);
            }

            ast::Stmt::For(for_stmt) => {
                let node = self.push_node(NodeKind::Other, self.span(for_stmt.span), Some(parent));
                self.scopes.push();
                match &for_stmt.init {
                    Some(ast::VarDeclOrExpr::VarDecl(var)) => {
                        for declarator in &var.decls {
                            if let Some(init) = &declarator.init {
                                self.walk_expr(init, node);
                            }
                            let ty = types::declarator_type(self.src, declarator);
                            let mut names = Vec::new();
                            types::pat_names(self.src, &declarator.name, &mut names);
                            for (name, name_ty) in names {
                                let binding = match &name_ty {
                                    TypeRef::Resolved(_) => Binding::local(name_ty),
                                    TypeRef::Unresolved => Binding::local(ty.clone()),
                                };
                                self.declare(&name, binding);
                            }
                        }
                    }
                    Some(ast::VarDeclOrExpr::Expr(expr)) => self.walk_expr(expr, node),
                    None => {}
                }
                if let Some(test) = &for_stmt.test {
                    self.walk_expr(test, node);
                }
                if let Some(update) = &for_stmt.update {
                    self.walk_expr(update, node);
                }
                self.walk_stmt(&for_stmt.body, node);
                self.scopes.pop();
                self.close_node(node);
            }

            ast::Stmt::ForIn(for_in) => {
                let node = self.push_node(NodeKind::Other, self.span(for_in.span), Some(parent));
                self.scopes.push();
                self.walk_for_head(&for_in.left, node);
                self.walk_expr(&for_in.right, node);
                self.walk_stmt(&for_in.body, node);
                self.scopes.pop();
                self.close_node(node);
            }

            ast::Stmt::ForOf(for_of) => {
                let node = self.push_node(NodeKind::Other, self.span(for_of.span), Some(parent));
                self.scopes.push();
                self.walk_for_head(&for_of.left, node);
                self.walk_expr(&for_of.right, node);
                self.walk_stmt(&for_of.body, node);
                self.scopes.pop();
                self.close_node(node);
            }

            ast::Stmt::Try(try_stmt) => {
                let node = self.push_node(NodeKind::Other, self.span(try_stmt.span), Some(parent));
                self.scopes.push();
                self.hoist_stmts(&try_stmt.block.stmts);
                for stmt in &try_stmt.block.stmts {
                    self.walk_stmt(stmt, node);
                }
                self.scopes.pop();
                if let Some(handler) = &try_stmt.handler {
                    self.scopes.push();
                    if let Some(param) = &handler.param {
                        // The language types catch bindings implicitly.
                        let mut names = Vec::new();
                        types::pat_names(self.src, param, &mut names);
                        for (name, _) in names {
                            self.declare(&name, Binding::local(TypeRef::resolved("any")));
                        }
                    }
                    self.hoist_stmts(&handler.body.stmts);
                    for stmt in &handler.body.stmts {
                        self.walk_stmt(stmt, node);
                    }
                    self.scopes.pop();
                }
                if let Some(finalizer) = &try_stmt.finalizer {
                    self.scopes.push();
                    self.hoist_stmts(&finalizer.stmts);
                    for stmt in &finalizer.stmts {
                        self.walk_stmt(stmt, node);
                    }
                    self.scopes.pop();
                }
                self.close_node(node);
            }

            ast::Stmt::Switch(switch) => {
                let node = self.push_node(NodeKind::Other, self.span(switch.span), Some(parent));
                self.walk_expr(&switch.discriminant, node);
                self.scopes.push();
                for case in &switch.cases {
                    self.hoist_stmts(&case.cons);
                }
                for case in &switch.cases {
                    if let Some(test) = &case.test {
                        self.walk_expr(test, node);
                    }
                    for stmt in &case.cons {
                        self.walk_stmt(stmt, node);
                    }
                }
                self.scopes.pop();
                self.close_node(node);
            }

            ast::Stmt::Throw(throw) => {
                let node = self.push_node(NodeKind::Other, self.span(throw.span), Some(parent));
                self.walk_expr(&throw.arg, node);
                self.close_node(node);
            }

            ast::Stmt::Labeled(labeled) => {
                let node = self.push_node(NodeKind::Other, self.span(labeled.span), Some(parent));
                self.walk_stmt(&labeled.body, node);
                self.close_node(node);
            }

            other => {
                let node = self.push_node(NodeKind::Other, self.span(other.span()), Some(parent));
                self.close_node(node);
            }
        }
    }

    fn walk_for_head(&mut self, head: &ast::ForHead, parent: NodeId) {
        match head {
            ast::ForHead::VarDecl(var) => {
                for declarator in &var.decls {
                    let mut names = Vec::new();
                    types::pat_names(self.src, &declarator.name, &mut names);
                    for (name, ty) in names {
                        // Loop heads carry no annotation syntax; fall back
                        // to the language's implicit typing.
                        let ty = match ty {
                            TypeRef::Resolved(t) => TypeRef::Resolved(t),
                            TypeRef::Unresolved => TypeRef::resolved("any"),
                        };
                        self.declare(&name, Binding::local(ty));
                    }
                }
            }
            ast::ForHead::Pat(pat) => self.walk_pat_reads(pat, parent),
            ast::ForHead::UsingDecl(_) => {}
        }
    }

    fn walk_decl(&mut self, decl: &ast::Decl, parent: NodeId, span_override: Option<Span>) {
        match decl {
            ast::Decl::Var(var) => {
                let span = span_override.unwrap_or_else(|| self.span(var.span));
                let node = self.push_node(NodeKind::VariableDeclaration, span, Some(parent));
                for declarator in &var.decls {
                    if let Some(init) = &declarator.init {
                        self.walk_expr(init, node);
                    }
                }
                self.close_node(node);
            }

            ast::Decl::Fn(fn_decl) => {
                match &fn_decl.function.body {
                    Some(body) if self.fn_depth > 0 => {
                        // A function declared inside another function is a
                        // closure site.
                        let identity = self.fn_identity_span(fn_decl);
                        let node =
                            self.push_node(NodeKind::LocalFunction, identity, Some(parent));
                        self.walk_closure_function(
                            node,
                            identity,
                            &fn_decl.function,
                            body,
                            Some(fn_decl.ident.sym.to_string()),
                            None,
                        );
                        self.close_node(node);
                    }
                    Some(body) => {
                        let span = span_override.unwrap_or_else(|| self.fn_identity_span(fn_decl));
                        let node = self.push_node(NodeKind::Other, span, Some(parent));
                        self.walk_plain_function(&fn_decl.function, body, node);
                        self.close_node(node);
                    }
                    None => {
                        let node = self.push_node(
                            NodeKind::Other,
                            self.fn_identity_span(fn_decl),
                            Some(parent),
                        );
                        self.close_node(node);
                    }
                }
            }

            ast::Decl::Class(class_decl) => {
                let span = span_override.unwrap_or_else(|| self.span(class_decl.class.span));
                let node = self.push_node(NodeKind::TypeDeclaration, span, Some(parent));
                self.walk_class(&class_decl.class, node);
                self.close_node(node);
            }

            other => {
                let span = span_override.unwrap_or_else(|| self.span(other.span()));
                let node = self.push_node(NodeKind::Other, span, Some(parent));
                self.close_node(node);
            }
        }
    }

    // ---- functions and classes ------------------------------------------

    /// Walk a function that is not a closure site (top-level declarations,
    /// methods, accessors).
    fn walk_plain_function(
        &mut self,
        function: &ast::Function,
        body: &ast::BlockStmt,
        parent: NodeId,
    ) {
        self.fn_depth += 1;
        self.scopes.push();
        for (i, param) in function.params.iter().enumerate() {
            self.declare_param(&param.pat, i);
        }
        for param in &function.params {
            if let ast::Pat::Assign(assign) = &param.pat {
                self.walk_expr(&assign.right, parent);
            }
        }
        self.scopes.push();
        self.hoist_stmts(&body.stmts);
        for stmt in &body.stmts {
            self.walk_stmt(stmt, parent);
        }
        self.scopes.pop();
        self.scopes.pop();
        self.fn_depth -= 1;
    }

    fn walk_class(&mut self, class: &ast::Class, parent: NodeId) {
        if let Some(super_class) = &class.super_class {
            self.walk_expr(super_class, parent);
        }
        for member in &class.body {
            match member {
                ast::ClassMember::Method(method) => {
                    if let Some(body) = &method.function.body {
                        self.walk_plain_function(&method.function, body, parent);
                    }
                }
                ast::ClassMember::PrivateMethod(method) => {
                    if let Some(body) = &method.function.body {
                        self.walk_plain_function(&method.function, body, parent);
                    }
                }
                ast::ClassMember::Constructor(ctor) => {
                    self.fn_depth += 1;
                    self.scopes.push();
                    for param in &ctor.params {
                        match param {
                            ast::ParamOrTsParamProp::Param(param) => {
                                self.declare_param(&param.pat, 0);
                            }
                            ast::ParamOrTsParamProp::TsParamProp(prop) => match &prop.param {
                                ast::TsParamPropParam::Ident(ident) => {
                                    let ty = match &ident.type_ann {
                                        Some(ann) => TypeRef::Resolved(types::type_ann_text(
                                            self.src, ann,
                                        )),
                                        None => TypeRef::resolved("any"),
                                    };
                                    self.declare(&ident.id.sym, Binding::param(ty));
                                }
                                ast::TsParamPropParam::Assign(assign) => {
                                    let mut names = Vec::new();
                                    types::pat_names(
                                        self.src,
                                        &ast::Pat::Assign(assign.clone()),
                                        &mut names,
                                    );
                                    for (name, ty) in names {
                                        self.declare(&name, Binding::param(ty));
                                    }
                                }
                            },
                        }
                    }
                    if let Some(body) = &ctor.body {
                        self.scopes.push();
                        self.hoist_stmts(&body.stmts);
                        for stmt in &body.stmts {
                            self.walk_stmt(stmt, parent);
                        }
                        self.scopes.pop();
                    }
                    self.scopes.pop();
                    self.fn_depth -= 1;
                }
                ast::ClassMember::ClassProp(prop) => {
                    if let Some(value) = &prop.value {
                        self.walk_expr(value, parent);
                    }
                }
                ast::ClassMember::PrivateProp(prop) => {
                    if let Some(value) = &prop.value {
                        self.walk_expr(value, parent);
                    }
                }
                ast::ClassMember::StaticBlock(block) => {
                    self.scopes.push();
                    self.hoist_stmts(&block.body.stmts);
                    for stmt in &block.body.stmts {
                        self.walk_stmt(stmt, parent);
                    }
                    self.scopes.pop();
                }
                _ => {}
            }
        }
    }

    fn declare_param(&mut self, pat: &ast::Pat, index: usize) {
        let simple = matches!(pat, ast::Pat::Ident(_))
            || matches!(pat, ast::Pat::Assign(assign) if matches!(&*assign.left, ast::Pat::Ident(_)));
        if simple {
            let param = types::param_from_pat(self.src, pat, index);
            self.declare(&param.name, Binding::param(param.ty));
        } else {
            let mut names = Vec::new();
            types::pat_names(self.src, pat, &mut names);
            for (name, ty) in names {
                self.declare(&name, Binding::param(ty));
            }
        }
    }

    // ---- closures --------------------------------------------------------

    fn enter_frame(&mut self, site_span: Span) {
        self.frames.push(Frame {
            site_span,
            entry_depth: self.scopes.depth(),
            inbound: Vec::new(),
            seen: HashSet::new(),
            occurrences: Vec::new(),
        });
    }

    fn exit_frame(&mut self) -> Frame {
        self.frames.pop().expect("frame stack underflow")
    }

    fn walk_arrow(&mut self, arrow: &ast::ArrowExpr, parent: NodeId) {
        let site_span = self.span(arrow.span);
        let node = self.push_node(NodeKind::LambdaExpression, site_span, Some(parent));

        let mut params = Vec::with_capacity(arrow.params.len());
        for (i, pat) in arrow.params.iter().enumerate() {
            params.push(types::param_from_pat(self.src, pat, i));
        }
        let ret = match &arrow.return_type {
            Some(ann) => annotated_return(types::type_ann_text(self.src, ann)),
            None => match &*arrow.body {
                ast::BlockStmtOrExpr::BlockStmt(block) => {
                    types::block_return_type(self.src, block)
                }
                ast::BlockStmtOrExpr::Expr(expr) => ReturnType::Value(TypeRef::Resolved(
                    types::infer_expr(self.src, expr).unwrap_or_else(|| "any".to_string()),
                )),
            },
        };
        let signature = Signature {
            params,
            ret,
            is_async: arrow.is_async,
            is_generator: arrow.is_generator,
        };

        self.enter_frame(site_span);
        self.fn_depth += 1;
        self.scopes.push();
        for (i, pat) in arrow.params.iter().enumerate() {
            self.declare_param(pat, i);
        }
        for pat in &arrow.params {
            if let ast::Pat::Assign(assign) = pat {
                self.walk_expr(&assign.right, node);
            }
        }

        let body = match &*arrow.body {
            ast::BlockStmtOrExpr::BlockStmt(block) => {
                let body_node =
                    self.push_node(NodeKind::Other, self.span(block.span), Some(node));
                self.scopes.push();
                self.hoist_stmts(&block.stmts);
                for stmt in &block.stmts {
                    self.walk_stmt(stmt, body_node);
                }
                self.scopes.pop();
                self.close_node(body_node);
                ClosureBody {
                    node: body_node,
                    form: BodyForm::Block,
                }
            }
            ast::BlockStmtOrExpr::Expr(expr) => {
                let body_node =
                    self.push_node(NodeKind::Other, self.span(expr.span()), Some(node));
                self.walk_expr(expr, body_node);
                self.close_node(body_node);
                ClosureBody {
                    node: body_node,
                    form: BodyForm::Expression,
                }
            }
        };

        self.scopes.pop();
        self.fn_depth -= 1;
        let frame = self.exit_frame();
        self.closures.insert(
            node,
            ClosureInfo {
                signature,
                body,
                declared_name: None,
                inbound: frame.inbound,
                occurrences: frame.occurrences,
            },
        );
        self.close_node(node);
    }

    fn walk_fn_expr(&mut self, fn_expr: &ast::FnExpr, parent: NodeId) {
        let Some(body) = &fn_expr.function.body else {
            return;
        };
        let site_span = self.span(fn_expr.function.span);
        let node = self.push_node(NodeKind::AnonymousMethod, site_span, Some(parent));
        let self_binding = fn_expr
            .ident
            .as_ref()
            .map(|ident| (ident.sym.to_string(), site_span));
        self.walk_closure_function(node, site_span, &fn_expr.function, body, None, self_binding);
        self.close_node(node);
    }

    /// Shared walk for `function`-keyword closures (anonymous expressions
    /// and local declarations).
    fn walk_closure_function(
        &mut self,
        node: NodeId,
        site_span: Span,
        function: &ast::Function,
        body: &ast::BlockStmt,
        declared_name: Option<String>,
        self_binding: Option<(String, Span)>,
    ) {
        let mut params = Vec::with_capacity(function.params.len());
        for (i, param) in function.params.iter().enumerate() {
            params.push(types::param_from_pat(self.src, &param.pat, i));
        }
        let ret = match &function.return_type {
            Some(ann) => annotated_return(types::type_ann_text(self.src, ann)),
            None => types::block_return_type(self.src, body),
        };
        let signature = Signature {
            params,
            ret,
            is_async: function.is_async,
            is_generator: function.is_generator,
        };

        self.enter_frame(site_span);
        self.fn_depth += 1;
        self.scopes.push();
        if let Some((name, fn_span)) = self_binding {
            self.declare(&name, Binding::function(TypeRef::Unresolved, fn_span));
        }
        for (i, param) in function.params.iter().enumerate() {
            self.declare_param(&param.pat, i);
        }
        for param in &function.params {
            if let ast::Pat::Assign(assign) = &param.pat {
                self.walk_expr(&assign.right, node);
            }
        }

        let body_node = self.push_node(NodeKind::Other, self.span(body.span), Some(node));
        self.scopes.push();
        self.hoist_stmts(&body.stmts);
        for stmt in &body.stmts {
            self.walk_stmt(stmt, body_node);
        }
        self.scopes.pop();
        self.close_node(body_node);

        self.scopes.pop();
        self.fn_depth -= 1;
        let frame = self.exit_frame();
        self.closures.insert(
            node,
            ClosureInfo {
                signature,
                body: ClosureBody {
                    node: body_node,
                    form: BodyForm::Block,
                },
                declared_name,
                inbound: frame.inbound,
                occurrences: frame.occurrences,
            },
        );
    }

    // ---- expressions -----------------------------------------------------

    fn walk_expr(&mut self, expr: &ast::Expr, parent: NodeId) {
        match expr {
            ast::Expr::Ident(ident) => {
                let span = self.span(ident.span);
                self.record_read(&ident.sym, span, false);
            }
            ast::Expr::This(this) => self.record_this(self.span(this.span)),

            ast::Expr::Arrow(arrow) => self.walk_arrow(arrow, parent),
            ast::Expr::Fn(fn_expr) => self.walk_fn_expr(fn_expr, parent),

            ast::Expr::Lit(_) | ast::Expr::MetaProp(_) | ast::Expr::Invalid(_) => {}

            ast::Expr::Tpl(tpl) => {
                for expr in &tpl.exprs {
                    self.walk_expr(expr, parent);
                }
            }
            ast::Expr::TaggedTpl(tagged) => {
                self.walk_expr(&tagged.tag, parent);
                for expr in &tagged.tpl.exprs {
                    self.walk_expr(expr, parent);
                }
            }
            ast::Expr::Array(array) => {
                for elem in array.elems.iter().flatten() {
                    self.walk_expr(&elem.expr, parent);
                }
            }
            ast::Expr::Object(object) => self.walk_object(object, parent),
            ast::Expr::Member(member) => self.walk_member(member, parent),
            ast::Expr::SuperProp(sup) => {
                self.record_this(self.span(sup.span));
                if let ast::SuperProp::Computed(computed) = &sup.prop {
                    self.walk_expr(&computed.expr, parent);
                }
            }
            ast::Expr::Call(call) => {
                match &call.callee {
                    ast::Callee::Expr(callee) => self.walk_expr(callee, parent),
                    ast::Callee::Super(sup) => self.record_this(self.span(sup.span)),
                    ast::Callee::Import(_) => {}
                }
                for arg in &call.args {
                    self.walk_expr(&arg.expr, parent);
                }
            }
            ast::Expr::New(new) => {
                self.walk_expr(&new.callee, parent);
                if let Some(args) = &new.args {
                    for arg in args {
                        self.walk_expr(&arg.expr, parent);
                    }
                }
            }
            ast::Expr::Bin(bin) => {
                self.walk_expr(&bin.left, parent);
                self.walk_expr(&bin.right, parent);
            }
            ast::Expr::Unary(unary) => self.walk_expr(&unary.arg, parent),
            ast::Expr::Update(update) => self.walk_expr(&update.arg, parent),
            ast::Expr::Assign(assign) => {
                self.walk_assign_target(&assign.left, parent);
                self.walk_expr(&assign.right, parent);
            }
            ast::Expr::Cond(cond) => {
                self.walk_expr(&cond.test, parent);
                self.walk_expr(&cond.cons, parent);
                self.walk_expr(&cond.alt, parent);
            }
            ast::Expr::Paren(paren) => self.walk_expr(&paren.expr, parent),
            ast::Expr::Seq(seq) => {
                for expr in &seq.exprs {
                    self.walk_expr(expr, parent);
                }
            }
            ast::Expr::Await(await_expr) => self.walk_expr(&await_expr.arg, parent),
            ast::Expr::Yield(yield_expr) => {
                if let Some(arg) = &yield_expr.arg {
                    self.walk_expr(arg, parent);
                }
            }
            ast::Expr::OptChain(opt) => match &*opt.base {
                ast::OptChainBase::Member(member) => self.walk_member(member, parent),
                ast::OptChainBase::Call(call) => {
                    self.walk_expr(&call.callee, parent);
                    for arg in &call.args {
                        self.walk_expr(&arg.expr, parent);
                    }
                }
            },
            ast::Expr::Class(class_expr) => self.walk_class(&class_expr.class, parent),

            ast::Expr::TsAs(e) => self.walk_expr(&e.expr, parent),
            ast::Expr::TsNonNull(e) => self.walk_expr(&e.expr, parent),
            ast::Expr::TsConstAssertion(e) => self.walk_expr(&e.expr, parent),
            ast::Expr::TsTypeAssertion(e) => self.walk_expr(&e.expr, parent),
            ast::Expr::TsSatisfies(e) => self.walk_expr(&e.expr, parent),
            ast::Expr::TsInstantiation(e) => self.walk_expr(&e.expr, parent),

            _ => {}
        }
    }

    fn walk_object(&mut self, object: &ast::ObjectLit, parent: NodeId) {
        for prop in &object.props {
            match prop {
                ast::PropOrSpread::Spread(spread) => self.walk_expr(&spread.expr, parent),
                ast::PropOrSpread::Prop(prop) => match &**prop {
                    ast::Prop::Shorthand(ident) => {
                        let span = self.span(ident.span);
                        self.record_read(&ident.sym, span, true);
                    }
                    ast::Prop::KeyValue(kv) => {
                        if let ast::PropName::Computed(computed) = &kv.key {
                            self.walk_expr(&computed.expr, parent);
                        }
                        self.walk_expr(&kv.value, parent);
                    }
                    ast::Prop::Assign(assign) => self.walk_expr(&assign.value, parent),
                    ast::Prop::Getter(getter) => {
                        if let Some(body) = &getter.body {
                            self.fn_depth += 1;
                            self.scopes.push();
                            self.hoist_stmts(&body.stmts);
                            for stmt in &body.stmts {
                                self.walk_stmt(stmt, parent);
                            }
                            self.scopes.pop();
                            self.fn_depth -= 1;
                        }
                    }
                    ast::Prop::Setter(setter) => {
                        if let Some(body) = &setter.body {
                            self.fn_depth += 1;
                            self.scopes.push();
                            self.declare_param(&setter.param, 0);
                            self.hoist_stmts(&body.stmts);
                            for stmt in &body.stmts {
                                self.walk_stmt(stmt, parent);
                            }
                            self.scopes.pop();
                            self.fn_depth -= 1;
                        }
                    }
                    ast::Prop::Method(method) => {
                        if let Some(body) = &method.function.body {
                            self.walk_plain_function(&method.function, body, parent);
                        }
                    }
                },
            }
        }
    }

    fn walk_member(&mut self, member: &ast::MemberExpr, parent: NodeId) {
        self.walk_expr(&member.obj, parent);
        if let ast::MemberProp::Computed(computed) = &member.prop {
            self.walk_expr(&computed.expr, parent);
        }
    }

    fn walk_assign_target(&mut self, target: &ast::AssignTarget, parent: NodeId) {
        match target {
            ast::AssignTarget::Simple(simple) => match simple {
                ast::SimpleAssignTarget::Ident(ident) => {
                    let span = self.span(ident.id.span);
                    self.record_read(&ident.id.sym, span, false);
                }
                ast::SimpleAssignTarget::Member(member) => self.walk_member(member, parent),
                ast::SimpleAssignTarget::Paren(paren) => self.walk_expr(&paren.expr, parent),
                _ => {}
            },
            ast::AssignTarget::Pat(pat) => match pat {
                ast::AssignTargetPat::Array(array) => {
                    for elem in array.elems.iter().flatten() {
                        self.walk_pat_reads(elem, parent);
                    }
                }
                ast::AssignTargetPat::Object(object) => {
                    for prop in &object.props {
                        match prop {
                            ast::ObjectPatProp::KeyValue(kv) => {
                                self.walk_pat_reads(&kv.value, parent)
                            }
                            ast::ObjectPatProp::Assign(assign) => {
                                let span = self.span(assign.key.id.span);
                                self.record_read(&assign.key.id.sym, span, false);
                                if let Some(value) = &assign.value {
                                    self.walk_expr(value, parent);
                                }
                            }
                            ast::ObjectPatProp::Rest(rest) => {
                                self.walk_pat_reads(&rest.arg, parent)
                            }
                        }
                    }
                }
                ast::AssignTargetPat::Invalid(_) => {}
            },
        }
    }

    /// Destructuring assignment targets write into existing bindings; each
    /// name is a read of the enclosing binding for capture purposes.
    fn walk_pat_reads(&mut self, pat: &ast::Pat, parent: NodeId) {
        match pat {
            ast::Pat::Ident(ident) => {
                let span = self.span(ident.id.span);
                self.record_read(&ident.id.sym, span, false);
            }
            ast::Pat::Array(array) => {
                for elem in array.elems.iter().flatten() {
                    self.walk_pat_reads(elem, parent);
                }
            }
            ast::Pat::Object(object) => {
                for prop in &object.props {
                    match prop {
                        ast::ObjectPatProp::KeyValue(kv) => self.walk_pat_reads(&kv.value, parent),
                        ast::ObjectPatProp::Assign(assign) => {
                            let span = self.span(assign.key.id.span);
                            self.record_read(&assign.key.id.sym, span, false);
                            if let Some(value) = &assign.value {
                                self.walk_expr(value, parent);
                            }
                        }
                        ast::ObjectPatProp::Rest(rest) => self.walk_pat_reads(&rest.arg, parent),
                    }
                }
            }
            ast::Pat::Assign(assign) => {
                self.walk_pat_reads(&assign.left, parent);
                self.walk_expr(&assign.right, parent);
            }
            ast::Pat::Rest(rest) => self.walk_pat_reads(&rest.arg, parent),
            ast::Pat::Expr(expr) => self.walk_expr(expr, parent),
            ast::Pat::Invalid(_) => {}
        }
    }

    // ---- read classification --------------------------------------------

    fn record_read(&mut self, name: &str, span: Span, shorthand: bool) {
        self.idents.insert(name.to_string());
        if self.frames.is_empty() {
            return;
        }

        let hit = self
            .scopes
            .lookup(name)
            .map(|(idx, binding)| (idx, binding.clone()));

        let frame_count = self.frames.len();
        for index in (0..frame_count).rev() {
            let (entry_depth, site_span) = {
                let frame = &self.frames[index];
                (frame.entry_depth, frame.site_span)
            };

            let classified = match &hit {
                // Unbound names are ambient globals, still reachable from
                // the emitted holder class.
                None => Some((BindingKind::ModuleScope, TypeRef::Unresolved)),
                Some((idx, binding)) => {
                    if binding.fn_span == Some(site_span) {
                        Some((BindingKind::SelfReference, binding.ty.clone()))
                    } else if *idx >= entry_depth {
                        // Bound inside this frame, hence inside every
                        // enclosing frame too.
                        None
                    } else if *idx == 0 {
                        Some((BindingKind::ModuleScope, binding.ty.clone()))
                    } else if binding.is_param {
                        Some((BindingKind::Parameter, binding.ty.clone()))
                    } else {
                        Some((BindingKind::Local, binding.ty.clone()))
                    }
                }
            };

            let Some((kind, ty)) = classified else {
                break;
            };

            if index == frame_count - 1
                && matches!(kind, BindingKind::Local | BindingKind::Parameter)
            {
                self.frames[index].occurrences.push(Occurrence {
                    name: name.to_string(),
                    span,
                    shorthand,
                });
            }

            let frame = &mut self.frames[index];
            if frame.seen.insert(name.to_string()) {
                frame.inbound.push(InboundBinding {
                    name: name.to_string(),
                    kind,
                    ty,
                    span,
                });
            }
        }
    }

    fn record_this(&mut self, span: Span) {
        for frame in self.frames.iter_mut() {
            if frame.seen.insert("this".to_string()) {
                frame.inbound.push(InboundBinding {
                    name: "this".to_string(),
                    kind: BindingKind::EnclosingInstance,
                    ty: TypeRef::Unresolved,
                    span,
                });
            }
        }
    }
}

/// An explicit `void` annotation selects the no-value variant.
fn annotated_return(text: String) -> ReturnType {
    if text == "void" {
        ReturnType::Void
    } else {
        ReturnType::Value(TypeRef::Resolved(text))
    }
}
