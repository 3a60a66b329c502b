//! Capture analysis: classify the free variables of one closure site.
//!
//! The analyzer walks the data-flow-in set the semantic layer reports for
//! the site and decides, per inbound binding, whether it becomes a capture,
//! is ignored, or kills the conversion. It inspects and classifies only; the
//! tree is never touched.

use crate::error::LiftError;
use crate::model::{
    BindingKind, CaptureEntry, CaptureSet, ClosureSite, SemanticDocument, TypeRef,
};

/// Compute the capture set of `site`, or fail.
///
/// Instance-bound bindings are fatal, not filtered: a closure that reads a
/// field or the enclosing instance cannot be lifted into a free-standing
/// holder class. A self-reference means the closure is recursive, which the
/// pass refuses outright rather than approximating.
pub fn analyze(
    doc: &dyn SemanticDocument,
    site: &ClosureSite,
) -> Result<CaptureSet, LiftError> {
    let mut captures = Vec::new();

    for binding in doc.data_flow_in(site.node) {
        match binding.kind {
            BindingKind::Local | BindingKind::Parameter => {
                let ty = match binding.ty {
                    TypeRef::Resolved(ty) => ty,
                    TypeRef::Unresolved => {
                        return Err(LiftError::TypeResolution {
                            what: format!("captured binding `{}`", binding.name),
                            span: binding.span,
                        });
                    }
                };
                captures.push(CaptureEntry {
                    name: binding.name,
                    ty,
                });
            }

            BindingKind::InstanceMember | BindingKind::EnclosingInstance => {
                return Err(LiftError::CaptureViolation {
                    name: binding.name,
                    span: binding.span,
                });
            }

            BindingKind::SelfReference => {
                return Err(LiftError::Unsupported {
                    reason: format!(
                        "closure `{}` refers to itself recursively",
                        binding.name
                    ),
                    span: binding.span,
                });
            }

            // Still visible where the holder class is emitted.
            BindingKind::ModuleScope => {}
        }
    }

    Ok(captures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discover;
    use crate::model::NodeKind;
    use crate::testutil::{inbound, FakeDocument};

    #[test]
    fn test_no_free_variables_means_no_captures() {
        let mut doc = FakeDocument::new();
        let root = doc.push_root();
        let stmt = doc.push_node(NodeKind::VariableDeclaration, root);
        let node = doc.push_simple_closure(stmt, &[]);

        let site = discover::site_at(&doc, node);
        let captures = analyze(&doc, &site).unwrap();
        assert!(captures.is_empty());
    }

    #[test]
    fn test_captures_keep_data_flow_order() {
        let mut doc = FakeDocument::new();
        let root = doc.push_root();
        let stmt = doc.push_node(NodeKind::VariableDeclaration, root);
        let node =
            doc.push_simple_closure(stmt, &[("text", "string"), ("abba", "string")]);

        let site = discover::site_at(&doc, node);
        let captures = analyze(&doc, &site).unwrap();
        assert_eq!(
            captures.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
            vec!["text", "abba"]
        );
    }

    #[test]
    fn test_module_scope_bindings_are_not_captured() {
        let mut doc = FakeDocument::new();
        let root = doc.push_root();
        let stmt = doc.push_node(NodeKind::VariableDeclaration, root);
        let node = doc.push_simple_closure(stmt, &[]);
        doc.push_inbound(node, inbound("console", BindingKind::ModuleScope, None));

        let site = discover::site_at(&doc, node);
        let captures = analyze(&doc, &site).unwrap();
        assert!(captures.is_empty());
    }

    #[test]
    fn test_instance_member_is_a_violation() {
        let mut doc = FakeDocument::new();
        let root = doc.push_root();
        let stmt = doc.push_node(NodeKind::VariableDeclaration, root);
        let node = doc.push_simple_closure(stmt, &[]);
        doc.push_inbound(
            node,
            inbound("a", BindingKind::InstanceMember, Some("number")),
        );

        let site = discover::site_at(&doc, node);
        let err = analyze(&doc, &site).unwrap_err();
        assert!(matches!(err, LiftError::CaptureViolation { ref name, .. } if name == "a"));
    }

    #[test]
    fn test_enclosing_instance_is_a_violation() {
        let mut doc = FakeDocument::new();
        let root = doc.push_root();
        let stmt = doc.push_node(NodeKind::ExpressionStatement, root);
        let node = doc.push_simple_closure(stmt, &[]);
        doc.push_inbound(node, inbound("this", BindingKind::EnclosingInstance, None));

        let site = discover::site_at(&doc, node);
        assert!(matches!(
            analyze(&doc, &site),
            Err(LiftError::CaptureViolation { .. })
        ));
    }

    #[test]
    fn test_unresolved_capture_type_fails_resolution() {
        let mut doc = FakeDocument::new();
        let root = doc.push_root();
        let stmt = doc.push_node(NodeKind::VariableDeclaration, root);
        let node = doc.push_simple_closure(stmt, &[]);
        doc.push_inbound(node, inbound("mystery", BindingKind::Local, None));

        let site = discover::site_at(&doc, node);
        assert!(matches!(
            analyze(&doc, &site),
            Err(LiftError::TypeResolution { .. })
        ));
    }

    #[test]
    fn test_self_reference_is_unsupported() {
        let mut doc = FakeDocument::new();
        let root = doc.push_root();
        let node = doc.push_local_function(root, "fact");
        doc.push_inbound(
            node,
            inbound("fact", BindingKind::SelfReference, Some("(n: number) => number")),
        );

        let site = discover::site_at(&doc, node);
        assert!(matches!(
            analyze(&doc, &site),
            Err(LiftError::Unsupported { .. })
        ));
    }
}
