//! Type resolution for the TypeScript front end.
//!
//! Explicit annotations are authoritative: the annotation's source text is
//! the resolved type. Where the language itself would fall back to an
//! implicit `any` (unannotated parameters, catch clauses, loop heads) so do
//! we. Initialized bindings without annotations get a literal/operator
//! inference pass; when that fails the type is unresolved and conversion of
//! any closure capturing the binding fails.

use delambda_transform::{Param, ReturnType, TypeRef};
use swc_common::Spanned;
use swc_ecma_ast as ast;

/// Slice the source text of an SWC span. SWC byte positions start at 1 for
/// the first file of a fresh source map.
pub(crate) fn slice(src: &str, span: swc_common::Span) -> &str {
    let lo = (span.lo.0.saturating_sub(1) as usize).min(src.len());
    let hi = (span.hi.0.saturating_sub(1) as usize).min(src.len());
    &src[lo..hi.max(lo)]
}

/// The resolved text of a type annotation.
pub(crate) fn type_ann_text(src: &str, ann: &ast::TsTypeAnn) -> String {
    slice(src, ann.type_ann.span()).trim().to_string()
}

/// Build a signature parameter from a binding pattern. Destructuring, rest,
/// and other non-identifier patterns do not resolve.
pub(crate) fn param_from_pat(src: &str, pat: &ast::Pat, index: usize) -> Param {
    match pat {
        ast::Pat::Ident(ident) => Param {
            name: ident.id.sym.to_string(),
            ty: match &ident.type_ann {
                Some(ann) => TypeRef::Resolved(type_ann_text(src, ann)),
                None => TypeRef::resolved("any"),
            },
        },
        ast::Pat::Assign(assign) => match &*assign.left {
            ast::Pat::Ident(ident) => Param {
                name: ident.id.sym.to_string(),
                ty: match &ident.type_ann {
                    Some(ann) => TypeRef::Resolved(type_ann_text(src, ann)),
                    None => infer_expr(src, &assign.right)
                        .map(TypeRef::Resolved)
                        .unwrap_or_else(|| TypeRef::resolved("any")),
                },
            },
            _ => Param {
                name: format!("arg{}", index),
                ty: TypeRef::Unresolved,
            },
        },
        _ => Param {
            name: format!("arg{}", index),
            ty: TypeRef::Unresolved,
        },
    }
}

/// All names a pattern binds, with whatever types are recoverable. Used to
/// declare parameters and destructured locals in scope.
pub(crate) fn pat_names(src: &str, pat: &ast::Pat, out: &mut Vec<(String, TypeRef)>) {
    match pat {
        ast::Pat::Ident(ident) => {
            let ty = match &ident.type_ann {
                Some(ann) => TypeRef::Resolved(type_ann_text(src, ann)),
                None => TypeRef::Unresolved,
            };
            out.push((ident.id.sym.to_string(), ty));
        }
        ast::Pat::Array(arr) => {
            for elem in arr.elems.iter().flatten() {
                pat_names(src, elem, out);
            }
        }
        ast::Pat::Object(obj) => {
            for prop in &obj.props {
                match prop {
                    ast::ObjectPatProp::KeyValue(kv) => pat_names(src, &kv.value, out),
                    ast::ObjectPatProp::Assign(assign) => {
                        out.push((assign.key.id.sym.to_string(), TypeRef::Unresolved));
                    }
                    ast::ObjectPatProp::Rest(rest) => pat_names(src, &rest.arg, out),
                }
            }
        }
        ast::Pat::Assign(assign) => pat_names(src, &assign.left, out),
        ast::Pat::Rest(rest) => pat_names(src, &rest.arg, out),
        ast::Pat::Expr(_) | ast::Pat::Invalid(_) => {}
    }
}

/// Type of a variable declarator: annotation first, then initializer
/// inference, otherwise unresolved.
pub(crate) fn declarator_type(src: &str, decl: &ast::VarDeclarator) -> TypeRef {
    if let ast::Pat::Ident(ident) = &decl.name {
        if let Some(ann) = &ident.type_ann {
            return TypeRef::Resolved(type_ann_text(src, ann));
        }
    }
    match &decl.init {
        Some(init) => infer_expr(src, init)
            .map(TypeRef::Resolved)
            .unwrap_or(TypeRef::Unresolved),
        None => TypeRef::Unresolved,
    }
}

/// A function declaration's type, spelled as a function type literal.
pub(crate) fn function_type(src: &str, function: &ast::Function) -> TypeRef {
    let mut params = Vec::new();
    for (i, param) in function.params.iter().enumerate() {
        let p = param_from_pat(src, &param.pat, i);
        match p.ty {
            TypeRef::Resolved(ty) => params.push(format!("{}: {}", p.name, ty)),
            TypeRef::Unresolved => return TypeRef::Unresolved,
        }
    }
    let ret = match &function.return_type {
        Some(ann) => type_ann_text(src, ann),
        None => match &function.body {
            Some(body) => match block_return_type(src, body) {
                ReturnType::Void => "void".to_string(),
                ReturnType::Value(TypeRef::Resolved(ty)) => ty,
                ReturnType::Value(TypeRef::Unresolved) => return TypeRef::Unresolved,
            },
            None => return TypeRef::Unresolved,
        },
    };
    TypeRef::Resolved(format!("({}) => {}", params.join(", "), ret))
}

/// Return type of a statement-bodied closure without an annotation: void
/// when no return carries a value, otherwise inferred from the first
/// value-carrying return.
pub(crate) fn block_return_type(src: &str, body: &ast::BlockStmt) -> ReturnType {
    let mut returns = Vec::new();
    collect_returns(&body.stmts, &mut returns);

    let first_value = returns.iter().find_map(|arg| arg.as_ref());
    match first_value {
        None => ReturnType::Void,
        Some(expr) => ReturnType::Value(TypeRef::Resolved(
            infer_expr(src, expr).unwrap_or_else(|| "any".to_string()),
        )),
    }
}

/// Collect the return statements belonging to this function body, without
/// descending into nested function declarations.
fn collect_returns<'a>(
    stmts: &'a [ast::Stmt],
    out: &mut Vec<&'a Option<Box<ast::Expr>>>,
) {
    for stmt in stmts {
        match stmt {
            ast::Stmt::Return(ret) => {
                // Field is Option<Box<Expr>>; keep the reference shape uniform.
                out.push(&ret.arg);
            }
            ast::Stmt::Block(block) => collect_returns(&block.stmts, out),
            ast::Stmt::If(if_stmt) => {
                collect_returns(std::slice::from_ref(&*if_stmt.cons), out);
                if let Some(alt) = &if_stmt.alt {
                    collect_returns(std::slice::from_ref(&**alt), out);
                }
            }
            ast::Stmt::While(s) => collect_returns(std::slice::from_ref(&*s.body), out),
            ast::Stmt::DoWhile(s) => collect_returns(std::slice::from_ref(&*s.body), out),
            ast::Stmt::For(s) => collect_returns(std::slice::from_ref(&*s.body), out),
            ast::Stmt::ForIn(s) => collect_returns(std::slice::from_ref(&*s.body), out),
            ast::Stmt::ForOf(s) => collect_returns(std::slice::from_ref(&*s.body), out),
            ast::Stmt::Labeled(s) => collect_returns(std::slice::from_ref(&*s.body), out),
            ast::Stmt::Try(try_stmt) => {
                collect_returns(&try_stmt.block.stmts, out);
                if let Some(handler) = &try_stmt.handler {
                    collect_returns(&handler.body.stmts, out);
                }
                if let Some(finalizer) = &try_stmt.finalizer {
                    collect_returns(&finalizer.stmts, out);
                }
            }
            ast::Stmt::Switch(switch) => {
                for case in &switch.cases {
                    collect_returns(&case.cons, out);
                }
            }
            // Nested functions keep their own returns.
            _ => {}
        }
    }
}

/// Literal-and-operator type inference. Returns `None` when the expression's
/// type is not evident from its shape alone.
pub(crate) fn infer_expr(src: &str, expr: &ast::Expr) -> Option<String> {
    match expr {
        ast::Expr::Lit(lit) => match lit {
            ast::Lit::Num(_) => Some("number".into()),
            ast::Lit::Str(_) => Some("string".into()),
            ast::Lit::Bool(_) => Some("boolean".into()),
            ast::Lit::BigInt(_) => Some("bigint".into()),
            ast::Lit::Regex(_) => Some("RegExp".into()),
            _ => None,
        },
        ast::Expr::Tpl(_) => Some("string".into()),
        ast::Expr::Paren(paren) => infer_expr(src, &paren.expr),
        ast::Expr::Seq(seq) => seq.exprs.last().and_then(|e| infer_expr(src, e)),
        ast::Expr::Assign(assign) => infer_expr(src, &assign.right),
        ast::Expr::Update(_) => Some("number".into()),

        ast::Expr::Unary(unary) => match unary.op {
            ast::UnaryOp::Bang | ast::UnaryOp::Delete => Some("boolean".into()),
            ast::UnaryOp::Minus | ast::UnaryOp::Plus | ast::UnaryOp::Tilde => {
                Some("number".into())
            }
            ast::UnaryOp::TypeOf => Some("string".into()),
            ast::UnaryOp::Void => None,
        },

        ast::Expr::Bin(bin) => match bin.op {
            ast::BinaryOp::EqEq
            | ast::BinaryOp::NotEq
            | ast::BinaryOp::EqEqEq
            | ast::BinaryOp::NotEqEq
            | ast::BinaryOp::Lt
            | ast::BinaryOp::LtEq
            | ast::BinaryOp::Gt
            | ast::BinaryOp::GtEq
            | ast::BinaryOp::In
            | ast::BinaryOp::InstanceOf => Some("boolean".into()),

            ast::BinaryOp::Sub
            | ast::BinaryOp::Mul
            | ast::BinaryOp::Div
            | ast::BinaryOp::Mod
            | ast::BinaryOp::Exp
            | ast::BinaryOp::LShift
            | ast::BinaryOp::RShift
            | ast::BinaryOp::ZeroFillRShift
            | ast::BinaryOp::BitAnd
            | ast::BinaryOp::BitOr
            | ast::BinaryOp::BitXor => Some("number".into()),

            ast::BinaryOp::Add => {
                let left = infer_expr(src, &bin.left);
                let right = infer_expr(src, &bin.right);
                match (left.as_deref(), right.as_deref()) {
                    (Some("string"), _) | (_, Some("string")) => Some("string".into()),
                    (Some("number"), _) | (_, Some("number")) => Some("number".into()),
                    _ => None,
                }
            }

            ast::BinaryOp::LogicalAnd
            | ast::BinaryOp::LogicalOr
            | ast::BinaryOp::NullishCoalescing => {
                let left = infer_expr(src, &bin.left)?;
                let right = infer_expr(src, &bin.right)?;
                (left == right).then_some(left)
            }
        },

        ast::Expr::Cond(cond) => {
            let cons = infer_expr(src, &cond.cons)?;
            let alt = infer_expr(src, &cond.alt)?;
            (cons == alt).then_some(cons)
        }

        ast::Expr::TsAs(as_expr) => Some(slice(src, as_expr.type_ann.span()).trim().to_string()),
        ast::Expr::TsTypeAssertion(assertion) => {
            Some(slice(src, assertion.type_ann.span()).trim().to_string())
        }
        ast::Expr::TsNonNull(non_null) => infer_expr(src, &non_null.expr),
        ast::Expr::TsConstAssertion(assertion) => infer_expr(src, &assertion.expr),
        ast::Expr::TsSatisfies(satisfies) => infer_expr(src, &satisfies.expr),

        _ => None,
    }
}
