//! The conversion pipeline: discover, plan, check, commit.
//!
//! One run converts exactly one document. The run either commits the whole
//! plan or fails without touching anything; no document is ever left half
//! converted.

use crate::error::LiftError;
use crate::model::{NodeId, SemanticDocument, SiteTransformation, TransformationPlan};
use crate::names::NameAllocator;
use crate::{capture, discover, rewrite, synth};

/// Result of a committed run.
#[derive(Debug)]
pub struct Outcome {
    /// Final document text, produced by the formatting collaborator.
    pub text: String,
    /// Number of sites converted.
    pub converted: usize,
    /// Sites left unconverted because no enclosing statement exists.
    pub skipped: Vec<NodeId>,
}

/// Convert one document: plan every site, then commit atomically.
pub fn run(doc: &dyn SemanticDocument) -> Result<Outcome, LiftError> {
    let plan = plan(doc)?;

    let converted = plan.sites.len();
    let skipped = plan.skipped.clone();
    log::debug!(
        "committing plan: {} site(s) converted, {} skipped",
        converted,
        skipped.len()
    );

    let text = doc.format(&plan)?;
    Ok(Outcome {
        text,
        converted,
        skipped,
    })
}

/// Build the complete transformation plan for a document.
///
/// Sites are planned in document order. The first capture violation, type
/// resolution failure, or unsupported construct aborts the whole run; no
/// partial plan is kept.
pub fn plan(doc: &dyn SemanticDocument) -> Result<TransformationPlan, LiftError> {
    let mut names = NameAllocator::new();
    let mut plan = TransformationPlan::default();

    for node in discover::closure_sites(doc) {
        match plan_site(doc, node, &mut names)? {
            Some(transformation) => plan.sites.push(transformation),
            None => {
                log::debug!("site {:?} has no enclosing statement, leaving unconverted", node);
                plan.skipped.push(node);
            }
        }
    }

    Ok(plan)
}

fn plan_site(
    doc: &dyn SemanticDocument,
    node: NodeId,
    names: &mut NameAllocator,
) -> Result<Option<SiteTransformation>, LiftError> {
    let site = discover::site_at(doc, node);
    log::trace!("planning closure site {:?} at {:?}", node, site.span);

    let captures = capture::analyze(doc, &site)?;
    let holder = synth::synthesize(doc, &site, &captures, names)?;

    // A holder body that still contains a closure would ship an inner
    // closure inside an already-converted method and silently change
    // behavior. Refuse the whole document instead.
    let nested = doc
        .descendants_of(site.body.node)
        .into_iter()
        .find(|&inner| doc.kind_of(inner).introduces_closure());
    if let Some(inner) = nested {
        return Err(LiftError::Unsupported {
            reason: "the closure contains another closure; nested closures cannot be lifted"
                .to_string(),
            span: doc.span_of(inner),
        });
    }

    Ok(rewrite::rewrite_site(doc, site, holder, &captures, names))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BindingKind, NodeKind};
    use crate::testutil::{inbound, FakeDocument};

    #[test]
    fn test_empty_document_commits_empty_plan() {
        let mut doc = FakeDocument::new();
        doc.push_root();

        let outcome = run(&doc).unwrap();
        assert_eq!(outcome.converted, 0);
        assert!(outcome.skipped.is_empty());
    }

    #[test]
    fn test_one_site_produces_one_transformation() {
        let mut doc = FakeDocument::new();
        let root = doc.push_root();
        let stmt = doc.push_node(NodeKind::VariableDeclaration, root);
        doc.push_simple_closure(stmt, &[("text", "string")]);

        let plan = plan(&doc).unwrap();
        assert_eq!(plan.sites.len(), 1);
        assert_eq!(plan.sites[0].holder.fields.len(), 1);
        assert_eq!(plan.sites[0].field_inits, vec!["text"]);
    }

    #[test]
    fn test_each_site_gets_unique_names() {
        let mut doc = FakeDocument::new();
        let root = doc.push_root();
        let first_stmt = doc.push_node(NodeKind::VariableDeclaration, root);
        doc.push_simple_closure(first_stmt, &[]);
        let second_stmt = doc.push_node(NodeKind::ExpressionStatement, root);
        doc.push_simple_closure(second_stmt, &[]);

        let plan = plan(&doc).unwrap();
        assert_eq!(plan.sites.len(), 2);
        assert_ne!(plan.sites[0].holder.name, plan.sites[1].holder.name);
        assert_ne!(plan.sites[0].instance, plan.sites[1].instance);
    }

    #[test]
    fn test_capture_violation_aborts_whole_run() {
        let mut doc = FakeDocument::new();
        let root = doc.push_root();
        let good_stmt = doc.push_node(NodeKind::VariableDeclaration, root);
        doc.push_simple_closure(good_stmt, &[]);
        let bad_stmt = doc.push_node(NodeKind::VariableDeclaration, root);
        let bad = doc.push_simple_closure(bad_stmt, &[]);
        doc.push_inbound(bad, inbound("a", BindingKind::InstanceMember, Some("number")));

        assert!(matches!(
            run(&doc),
            Err(LiftError::CaptureViolation { .. })
        ));
    }

    #[test]
    fn test_nested_closure_aborts_with_unsupported() {
        let mut doc = FakeDocument::new();
        let root = doc.push_root();
        let stmt = doc.push_node(NodeKind::VariableDeclaration, root);
        let outer = doc.push_simple_closure(stmt, &[]);
        let outer_body = doc.closure_body_node(outer);
        // Inner closure embedded in the outer body.
        doc.push_simple_closure(outer_body, &[]);

        assert!(matches!(run(&doc), Err(LiftError::Unsupported { .. })));
    }

    #[test]
    fn test_unanchored_site_is_skipped_not_failed() {
        let mut doc = FakeDocument::new();
        let root = doc.push_root();
        let expr = doc.push_node(NodeKind::Other, root);
        let site = doc.push_simple_closure(expr, &[]);

        let outcome = run(&doc).unwrap();
        assert_eq!(outcome.converted, 0);
        assert_eq!(outcome.skipped, vec![site]);
    }

    #[test]
    fn test_mixed_document_converts_and_skips() {
        let mut doc = FakeDocument::new();
        let root = doc.push_root();
        let stmt = doc.push_node(NodeKind::VariableDeclaration, root);
        doc.push_simple_closure(stmt, &[]);
        let bare = doc.push_node(NodeKind::Other, root);
        let skipped = doc.push_simple_closure(bare, &[]);

        let outcome = run(&doc).unwrap();
        assert_eq!(outcome.converted, 1);
        assert_eq!(outcome.skipped, vec![skipped]);
    }
}
