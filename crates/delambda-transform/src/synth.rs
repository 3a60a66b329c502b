//! Class synthesis: build the holder type for one closure site.

use crate::error::LiftError;
use crate::model::{
    BodyForm, CaptureSet, ClosureSite, Field, HolderType, Method, MethodBody, ReturnType,
    SemanticDocument, TypeRef, METHOD_NAME,
};
use crate::names::NameAllocator;

/// Synthesize the holder class for `site`: one field per capture, one
/// `invoke` method carrying the transformed body.
///
/// The body transformation is applied once, deterministically:
/// - a statement block is copied verbatim (a value-returning block is
///   trusted to carry its own return statements);
/// - a void expression body becomes a single expression statement;
/// - a value expression body is wrapped in an implicit return.
pub fn synthesize(
    doc: &dyn SemanticDocument,
    site: &ClosureSite,
    captures: &CaptureSet,
    names: &mut NameAllocator,
) -> Result<HolderType, LiftError> {
    let mut params = Vec::with_capacity(site.signature.params.len());
    for param in &site.signature.params {
        match &param.ty {
            TypeRef::Resolved(ty) => params.push((param.name.clone(), ty.clone())),
            TypeRef::Unresolved => {
                return Err(LiftError::TypeResolution {
                    what: format!("parameter `{}`", param.name),
                    span: site.span,
                });
            }
        }
    }

    let ret = match &site.signature.ret {
        ReturnType::Void => None,
        ReturnType::Value(TypeRef::Resolved(ty)) => Some(ty.clone()),
        ReturnType::Value(TypeRef::Unresolved) => {
            return Err(LiftError::TypeResolution {
                what: "the closure's return type".to_string(),
                span: site.span,
            });
        }
    };

    // The method name is canonical; a capture with the same name would
    // shadow it on the holder class.
    if captures.iter().any(|c| c.name == METHOD_NAME) {
        return Err(LiftError::Unsupported {
            reason: format!(
                "a captured binding is named `{}`, which collides with the holder method",
                METHOD_NAME
            ),
            span: site.span,
        });
    }

    let body = match (site.body.form, &ret) {
        (BodyForm::Block, _) => MethodBody::Block(site.body.node),
        (BodyForm::Expression, None) => MethodBody::ExpressionStatement(site.body.node),
        (BodyForm::Expression, Some(_)) => MethodBody::ReturnExpression(site.body.node),
    };

    let fields = captures
        .iter()
        .map(|c| Field {
            name: c.name.clone(),
            ty: c.ty.clone(),
        })
        .collect();

    Ok(HolderType {
        name: names.holder_name(doc, site.node),
        fields,
        method: Method {
            name: METHOD_NAME.to_string(),
            params,
            ret,
            is_async: site.signature.is_async,
            is_generator: site.signature.is_generator,
            body,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discover;
    use crate::model::{CaptureEntry, NodeKind, Param, Signature};
    use crate::testutil::FakeDocument;

    fn empty_captures() -> CaptureSet {
        Vec::new()
    }

    #[test]
    fn test_zero_captures_means_zero_fields() {
        let mut doc = FakeDocument::new();
        let root = doc.push_root();
        let stmt = doc.push_node(NodeKind::VariableDeclaration, root);
        let node = doc.push_simple_closure(stmt, &[]);

        let site = discover::site_at(&doc, node);
        let mut names = NameAllocator::new();
        let holder = synthesize(&doc, &site, &empty_captures(), &mut names).unwrap();

        assert!(holder.fields.is_empty());
        assert_eq!(holder.method.name, "invoke");
        assert_eq!(holder.method.params.len(), 1);
        assert!(matches!(holder.method.body, MethodBody::ReturnExpression(_)));
    }

    #[test]
    fn test_fields_mirror_captures() {
        let mut doc = FakeDocument::new();
        let root = doc.push_root();
        let stmt = doc.push_node(NodeKind::VariableDeclaration, root);
        let node = doc.push_simple_closure(stmt, &[]);

        let site = discover::site_at(&doc, node);
        let captures = vec![
            CaptureEntry {
                name: "text".into(),
                ty: "string".into(),
            },
            CaptureEntry {
                name: "abba".into(),
                ty: "string".into(),
            },
        ];
        let mut names = NameAllocator::new();
        let holder = synthesize(&doc, &site, &captures, &mut names).unwrap();

        assert_eq!(holder.fields.len(), 2);
        assert_eq!(holder.fields[0].name, "text");
        assert_eq!(holder.fields[1].name, "abba");
        assert_eq!(holder.fields[1].ty, "string");
    }

    #[test]
    fn test_void_block_body_is_copied_verbatim() {
        let mut doc = FakeDocument::new();
        let root = doc.push_root();
        let stmt = doc.push_node(NodeKind::ExpressionStatement, root);
        let node = doc.push_closure(
            stmt,
            Signature {
                params: vec![Param {
                    name: "n".into(),
                    ty: TypeRef::resolved("number"),
                }],
                ret: ReturnType::Void,
                is_async: false,
                is_generator: false,
            },
            BodyForm::Block,
            None,
        );

        let site = discover::site_at(&doc, node);
        let mut names = NameAllocator::new();
        let holder = synthesize(&doc, &site, &empty_captures(), &mut names).unwrap();

        assert!(holder.method.ret.is_none());
        assert!(matches!(holder.method.body, MethodBody::Block(_)));
    }

    #[test]
    fn test_void_expression_body_becomes_statement() {
        let mut doc = FakeDocument::new();
        let root = doc.push_root();
        let stmt = doc.push_node(NodeKind::ExpressionStatement, root);
        let node = doc.push_closure(
            stmt,
            Signature {
                params: vec![],
                ret: ReturnType::Void,
                is_async: false,
                is_generator: false,
            },
            BodyForm::Expression,
            None,
        );

        let site = discover::site_at(&doc, node);
        let mut names = NameAllocator::new();
        let holder = synthesize(&doc, &site, &empty_captures(), &mut names).unwrap();
        assert!(matches!(
            holder.method.body,
            MethodBody::ExpressionStatement(_)
        ));
    }

    #[test]
    fn test_unresolved_parameter_type_fails() {
        let mut doc = FakeDocument::new();
        let root = doc.push_root();
        let stmt = doc.push_node(NodeKind::VariableDeclaration, root);
        let node = doc.push_closure(
            stmt,
            Signature {
                params: vec![Param {
                    name: "pair".into(),
                    ty: TypeRef::Unresolved,
                }],
                ret: ReturnType::Value(TypeRef::resolved("number")),
                is_async: false,
                is_generator: false,
            },
            BodyForm::Expression,
            None,
        );

        let site = discover::site_at(&doc, node);
        let mut names = NameAllocator::new();
        assert!(matches!(
            synthesize(&doc, &site, &empty_captures(), &mut names),
            Err(LiftError::TypeResolution { .. })
        ));
    }

    #[test]
    fn test_unresolved_return_type_fails() {
        let mut doc = FakeDocument::new();
        let root = doc.push_root();
        let stmt = doc.push_node(NodeKind::VariableDeclaration, root);
        let node = doc.push_closure(
            stmt,
            Signature {
                params: vec![],
                ret: ReturnType::Value(TypeRef::Unresolved),
                is_async: false,
                is_generator: false,
            },
            BodyForm::Expression,
            None,
        );

        let site = discover::site_at(&doc, node);
        let mut names = NameAllocator::new();
        assert!(matches!(
            synthesize(&doc, &site, &empty_captures(), &mut names),
            Err(LiftError::TypeResolution { .. })
        ));
    }

    #[test]
    fn test_capture_named_invoke_is_refused() {
        let mut doc = FakeDocument::new();
        let root = doc.push_root();
        let stmt = doc.push_node(NodeKind::VariableDeclaration, root);
        let node = doc.push_simple_closure(stmt, &[]);

        let site = discover::site_at(&doc, node);
        let captures = vec![CaptureEntry {
            name: "invoke".into(),
            ty: "number".into(),
        }];
        let mut names = NameAllocator::new();
        assert!(matches!(
            synthesize(&doc, &site, &captures, &mut names),
            Err(LiftError::Unsupported { .. })
        ));
    }
}
