//! Site rewriting: instantiation, field population, call-site replacement.

use crate::model::{
    CaptureSet, ClosureSite, HolderType, NodeId, NodeKind, SemanticDocument,
    SiteTransformation,
};
use crate::names::NameAllocator;

/// Build the transformation record for one site, or `None` when the site has
/// no enclosing statement to anchor generated statements to. A skipped site
/// is left unconverted; corrupting the surrounding structure is never an
/// option.
///
/// This step has no intrinsic failure mode: capture analysis and synthesis
/// already succeeded for the site.
pub fn rewrite_site(
    doc: &dyn SemanticDocument,
    site: ClosureSite,
    holder: HolderType,
    captures: &CaptureSet,
    names: &mut NameAllocator,
) -> Option<SiteTransformation> {
    let (anchor, replaces_anchor) = find_anchor(doc, site.node)?;

    let instance = names.instance_name(doc, site.node);
    let field_inits = captures.iter().map(|c| c.name.clone()).collect();

    Some(SiteTransformation {
        site,
        holder,
        instance,
        field_inits,
        anchor,
        replaces_anchor,
    })
}

/// Walk the site and then its ancestors for the statement to insert before.
///
/// A local function declaration is a statement by itself and anchors its own
/// rewrite: the whole declaration is replaced by a binding of the bound
/// method reference. Every other closure anchors at the nearest enclosing
/// variable declaration or expression statement.
fn find_anchor(doc: &dyn SemanticDocument, node: NodeId) -> Option<(NodeId, bool)> {
    if doc.kind_of(node) == NodeKind::LocalFunction {
        return Some((node, true));
    }

    let mut current = node;
    while let Some(parent) = doc.parent_of(current) {
        match doc.kind_of(parent) {
            NodeKind::VariableDeclaration | NodeKind::ExpressionStatement => {
                return Some((parent, false));
            }
            _ => current = parent,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CaptureEntry;
    use crate::testutil::FakeDocument;
    use crate::{discover, synth, NodeKind};

    fn build(
        doc: &FakeDocument,
        node: NodeId,
        captures: CaptureSet,
    ) -> Option<SiteTransformation> {
        let site = discover::site_at(doc, node);
        let mut names = NameAllocator::new();
        let holder = synth::synthesize(doc, &site, &captures, &mut names).unwrap();
        rewrite_site(doc, site, holder, &captures, &mut names)
    }

    #[test]
    fn test_anchors_at_enclosing_variable_declaration() {
        let mut doc = FakeDocument::new();
        let root = doc.push_root();
        let stmt = doc.push_node(NodeKind::VariableDeclaration, root);
        let call = doc.push_node(NodeKind::Other, stmt);
        let node = doc.push_simple_closure(call, &[]);

        let trans = build(&doc, node, Vec::new()).unwrap();
        assert_eq!(trans.anchor, stmt);
        assert!(!trans.replaces_anchor);
        assert_eq!(trans.instance, "lifted1");
    }

    #[test]
    fn test_field_inits_follow_capture_order() {
        let mut doc = FakeDocument::new();
        let root = doc.push_root();
        let stmt = doc.push_node(NodeKind::ExpressionStatement, root);
        let node = doc.push_simple_closure(stmt, &[]);

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
        let trans = build(&doc, node, captures).unwrap();
        assert_eq!(trans.field_inits, vec!["text", "abba"]);
    }

    #[test]
    fn test_local_function_is_its_own_anchor() {
        let mut doc = FakeDocument::new();
        let root = doc.push_root();
        let node = doc.push_local_function(root, "helper");

        let trans = build(&doc, node, Vec::new()).unwrap();
        assert_eq!(trans.anchor, node);
        assert!(trans.replaces_anchor);
    }

    #[test]
    fn test_no_enclosing_statement_skips_the_site() {
        let mut doc = FakeDocument::new();
        let root = doc.push_root();
        // Closure nested only under non-statement nodes.
        let expr = doc.push_node(NodeKind::Other, root);
        let node = doc.push_simple_closure(expr, &[]);

        assert!(build(&doc, node, Vec::new()).is_none());
    }
}
