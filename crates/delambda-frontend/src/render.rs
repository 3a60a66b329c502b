//! Rendering and committing a transformation plan.
//!
//! The plan is applied as a single batch of text edits over the original
//! source: holder classes above the first top-level item, instantiation and
//! field assignments before each site's anchor statement, and the closure
//! text replaced by a bound method reference. Edits are spliced back to
//! front so earlier offsets stay valid; ties at one offset resolve so that
//! replacements land after insertions at the same position.

use crate::document::{Occurrence, TsDocument};
use delambda_diagnostics::Span;
use delambda_transform::{
    LiftError, MethodBody, SemanticDocument, SiteTransformation, TransformationPlan,
};
use std::collections::HashSet;

struct Edit {
    start: u32,
    end: u32,
    text: String,
}

/// Apply every edit of the plan and return the final document text.
pub(crate) fn apply(doc: &TsDocument, plan: &TransformationPlan) -> Result<String, LiftError> {
    let mut edits: Vec<Edit> = Vec::new();

    for site in &plan.sites {
        edits.push(Edit {
            start: doc.class_anchor,
            end: doc.class_anchor,
            text: render_class(doc, site),
        });

        let anchor_span = doc.span_of(site.anchor);
        let indent = line_indent(&doc.source, anchor_span.start);

        let mut setup = String::new();
        setup.push_str(&format!(
            "const {} = new {}();\n{}",
            site.instance, site.holder.name, indent
        ));
        for name in &site.field_inits {
            setup.push_str(&format!("{}.{} = {};\n{}", site.instance, name, name, indent));
        }
        edits.push(Edit {
            start: anchor_span.start,
            end: anchor_span.start,
            text: setup,
        });

        let bound = format!(
            "{}.{}.bind({})",
            site.instance, site.holder.method.name, site.instance
        );
        if site.replaces_anchor {
            let name = site
                .site
                .declared_name
                .clone()
                .unwrap_or_else(|| site.instance.clone());
            edits.push(Edit {
                start: anchor_span.start,
                end: anchor_span.end,
                text: format!("const {} = {};", name, bound),
            });
        } else {
            edits.push(Edit {
                start: site.site.span.start,
                end: site.site.span.end,
                text: bound,
            });
        }
    }

    Ok(splice(&doc.source, edits))
}

/// Byte offset where the line containing `offset` starts.
pub(crate) fn line_start(source: &str, offset: u32) -> u32 {
    let offset = (offset as usize).min(source.len());
    match source[..offset].rfind('\n') {
        Some(newline) => (newline + 1) as u32,
        None => 0,
    }
}

/// Leading whitespace of the line containing `offset`.
fn line_indent(source: &str, offset: u32) -> String {
    let start = line_start(source, offset) as usize;
    source[start..]
        .chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .collect()
}

fn render_class(doc: &TsDocument, site: &SiteTransformation) -> String {
    let holder = &site.holder;
    let mut out = String::new();

    out.push_str(&format!("class {} {{\n", holder.name));
    for field in &holder.fields {
        // Fields are assigned right after construction, never through a
        // constructor.
        out.push_str(&format!("    {}!: {};\n", field.name, field.ty));
    }
    if !holder.fields.is_empty() {
        out.push('\n');
    }

    let params = holder
        .method
        .params
        .iter()
        .map(|(name, ty)| format!("{}: {}", name, ty))
        .collect::<Vec<_>>()
        .join(", ");
    let ret = holder.method.ret.as_deref().unwrap_or("void");
    let prefix = match (holder.method.is_async, holder.method.is_generator) {
        (true, true) => "async *",
        (true, false) => "async ",
        (false, true) => "*",
        (false, false) => "",
    };
    out.push_str(&format!(
        "    {}{}({}): {} {{\n",
        prefix, holder.method.name, params, ret
    ));
    render_body(doc, site, &mut out);
    out.push_str("    }\n}\n\n");
    out
}

fn render_body(doc: &TsDocument, site: &SiteTransformation, out: &mut String) {
    const BODY_INDENT: &str = "        ";
    match site.holder.method.body {
        MethodBody::ReturnExpression(node) => {
            let text = body_text(doc, site, doc.span_of(node));
            out.push_str(&format!("{}return {};\n", BODY_INDENT, text));
        }
        MethodBody::ExpressionStatement(node) => {
            let text = body_text(doc, site, doc.span_of(node));
            out.push_str(&format!("{}{};\n", BODY_INDENT, text));
        }
        MethodBody::Block(node) => {
            let span = doc.span_of(node);
            let text = body_text(doc, site, span);
            // Drop the surrounding braces, keep the statements verbatim.
            let inner = text
                .strip_prefix('{')
                .and_then(|t| t.strip_suffix('}'))
                .unwrap_or(&text);
            out.push_str(&reindent(inner, BODY_INDENT));
        }
    }
}

/// Body text with every free read of a captured binding qualified through
/// the holder instance.
fn body_text(doc: &TsDocument, site: &SiteTransformation, body_span: Span) -> String {
    let info = doc.closure(site.site.node);
    let captured: HashSet<&str> = site
        .holder
        .fields
        .iter()
        .map(|f| f.name.as_str())
        .collect();

    let mut occurrences: Vec<&Occurrence> = info
        .occurrences
        .iter()
        .filter(|occ| captured.contains(occ.name.as_str()) && body_span.contains(occ.span))
        .collect();
    occurrences.sort_by_key(|occ| occ.span.start);
    occurrences.dedup_by_key(|occ| occ.span.start);

    let mut text = doc.text_of(body_span).to_string();
    for occ in occurrences.iter().rev() {
        let rel = (occ.span.start - body_span.start) as usize;
        if occ.shorthand {
            let rel_end = ((occ.span.end - body_span.start) as usize).min(text.len());
            text.replace_range(rel..rel_end, &format!("{}: this.{}", occ.name, occ.name));
        } else {
            text.insert_str(rel, "this.");
        }
    }
    text
}

/// Strip the common leading whitespace of the block's lines and re-indent
/// them at method-body depth.
fn reindent(inner: &str, indent: &str) -> String {
    let mut lines: Vec<&str> = inner.lines().collect();
    while lines.first().is_some_and(|line| line.trim().is_empty()) {
        lines.remove(0);
    }
    while lines.last().is_some_and(|line| line.trim().is_empty()) {
        lines.pop();
    }
    let common = lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);

    let mut out = String::new();
    for line in &lines {
        if line.trim().is_empty() {
            out.push('\n');
        } else {
            let dedented = if line.len() >= common { &line[common..] } else { line.trim_start() };
            out.push_str(indent);
            out.push_str(dedented);
            out.push('\n');
        }
    }
    if out.trim().is_empty() {
        out.clear();
    }
    out
}

/// Splice edits back to front. A stable sort keeps push order at equal
/// offsets, and reverse application makes earlier-pushed edits come out
/// first in the final text.
fn splice(source: &str, mut edits: Vec<Edit>) -> String {
    edits.sort_by_key(|edit| edit.start);
    let mut out = source.to_string();
    for edit in edits.iter().rev() {
        let start = (edit.start as usize).min(out.len());
        let end = (edit.end as usize).clamp(start, out.len());
        out.replace_range(start..end, &edit.text);
    }
    out
}
