//! TypeScript front end for the delambda closure lifter.
//!
//! This crate wraps the SWC parser and implements the semantic queries the
//! lifting core depends on: node classification, closure signatures,
//! data-flow-in sets, name visibility, and final text production. The core
//! itself never sees an SWC type.

use delambda_diagnostics::{Diagnostic, DiagnosticCode, Diagnostics, SourceCache, Span};
use delambda_transform::LiftError;
use swc_common::{input::StringInput, sync::Lrc, FileName, SourceMap, Spanned};
use swc_ecma_ast as ast;
use swc_ecma_parser::{lexer::Lexer, Parser, Syntax, TsSyntax};

mod builder;
mod document;
mod render;
mod scope;
mod types;

pub use document::TsDocument;

/// Parse TypeScript source into a document the lifting core can convert.
///
/// Fails with [`LiftError::ImproperInput`] when the text does not parse or
/// when the module has no top-level item to anchor generated classes into.
/// Recoverable parser complaints are collected as warnings on the returned
/// document.
pub fn parse_document(
    source: &str,
    filename: &str,
    cache: &mut SourceCache,
) -> Result<TsDocument, LiftError> {
    let file_id = cache.add_file(filename, source.to_string());

    // SWC keeps its own source map; ours only serves diagnostics.
    let source_map: Lrc<SourceMap> = Default::default();
    let source_file = source_map.new_source_file(
        Lrc::new(FileName::Custom(filename.to_string())),
        source.to_string(),
    );

    let lexer = Lexer::new(
        Syntax::Typescript(TsSyntax {
            tsx: false,
            decorators: true,
            dts: false,
            no_early_errors: false,
            disallow_ambiguous_jsx_like: false,
        }),
        ast::EsVersion::Es2022,
        StringInput::from(&*source_file),
        None,
    );

    let mut parser = Parser::new_from(lexer);

    let module = parser.parse_module().map_err(|e| {
        LiftError::ImproperInput(format!("cannot parse {}: {}", filename, e.kind().msg()))
    })?;

    let mut diagnostics = Diagnostics::new();
    for error in parser.take_errors() {
        let span = Span::new(
            file_id,
            error.span().lo.0.saturating_sub(1),
            error.span().hi.0.saturating_sub(1),
        );
        diagnostics.push(
            Diagnostic::warning(DiagnosticCode::ImproperInput, format!("{}", error.kind().msg()))
                .with_span(span)
                .build(),
        );
    }

    if module.body.is_empty() {
        return Err(LiftError::ImproperInput(format!(
            "{} contains no declarations to anchor generated classes into",
            filename
        )));
    }

    log::debug!("parsed {}: {} top-level item(s)", filename, module.body.len());

    let (nodes, closures, idents) = builder::build(source, file_id, &module);
    let class_anchor = compute_class_anchor(source, &module);

    Ok(TsDocument {
        source: source.to_string(),
        file_id,
        nodes,
        closures,
        idents,
        class_anchor,
        diagnostics,
    })
}

/// Holder classes go right above the first top-level item that is not an
/// import.
fn compute_class_anchor(source: &str, module: &ast::Module) -> u32 {
    for item in &module.body {
        if matches!(
            item,
            ast::ModuleItem::ModuleDecl(ast::ModuleDecl::Import(_))
        ) {
            continue;
        }
        let offset = item.span().lo.0.saturating_sub(1);
        return render::line_start(source, offset);
    }
    source.len() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use delambda_transform::{self as transform, LiftError, Outcome};

    fn convert(source: &str) -> Result<Outcome, LiftError> {
        let mut cache = SourceCache::new();
        let doc = parse_document(source, "test.ts", &mut cache)?;
        transform::run(&doc)
    }

    #[test]
    fn test_predicate_lambda_becomes_holder_class() {
        let source = r#"
function demo(ints: number[]): number[] {
    const even = ints.filter((m) => m % 2 == 0);
    return even;
}
"#;
        let outcome = convert(source).unwrap();
        assert_eq!(outcome.converted, 1);
        assert!(outcome.skipped.is_empty());

        let text = &outcome.text;
        assert!(text.contains("class LiftedLambda1 {"));
        assert!(text.contains("invoke(m: any): boolean {"));
        assert!(text.contains("return m % 2 == 0;"));
        assert!(text.contains("const lifted1 = new LiftedLambda1();"));
        assert!(text.contains("ints.filter(lifted1.invoke.bind(lifted1))"));
        assert!(!text.contains("=>"));
    }

    #[test]
    fn test_captured_locals_in_first_read_order() {
        let source = r#"
function demo(zipped: number[]): void {
    let text = "result of zipping";
    let abba = "baab";
    zipped.forEach((n) => {
        console.log(text);
        console.log(abba);
        console.log(n);
    });
}
"#;
        let outcome = convert(source).unwrap();
        assert_eq!(outcome.converted, 1);

        let text = &outcome.text;
        assert!(text.contains("text!: string;"));
        assert!(text.contains("abba!: string;"));
        assert!(text.contains("invoke(n: any): void {"));
        assert!(text.contains("console.log(this.text);"));
        assert!(text.contains("console.log(this.abba);"));
        // Parameters are not fields.
        assert!(text.contains("console.log(n);"));

        // Both assignments precede the consuming statement, in capture
        // order.
        let first = text.find("lifted1.text = text;").unwrap();
        let second = text.find("lifted1.abba = abba;").unwrap();
        let call = text.find("zipped.forEach(lifted1.invoke.bind(lifted1));").unwrap();
        assert!(first < second && second < call);
    }

    #[test]
    fn test_class_field_capture_is_a_violation() {
        let source = r#"
class LambdaCode {
    a: number = 3;

    meth(): void {
        const fieldLambd = (m: number) => m + this.a;
    }
}
"#;
        let err = convert(source).unwrap_err();
        assert!(matches!(err, LiftError::CaptureViolation { ref name, .. } if name == "this"));
    }

    #[test]
    fn test_nested_lambda_is_unsupported() {
        let source = r#"
function demo(): void {
    const nested = (b: number) => () => b * 3;
}
"#;
        assert!(matches!(
            convert(source),
            Err(LiftError::Unsupported { .. })
        ));
    }

    #[test]
    fn test_recursive_local_function_is_unsupported() {
        let source = r#"
function demo(): void {
    function fact(n: number): number {
        return n == 0 ? 1 : n * fact(n - 1);
    }
    const r = fact(5);
}
"#;
        assert!(matches!(
            convert(source),
            Err(LiftError::Unsupported { .. })
        ));
    }

    #[test]
    fn test_malformed_input_is_improper() {
        let source = "ajsdniasndkasnkjasa88 * ^& 1 void s()";
        assert!(matches!(
            convert(source),
            Err(LiftError::ImproperInput(_))
        ));
    }

    #[test]
    fn test_empty_module_is_improper() {
        assert!(matches!(convert(""), Err(LiftError::ImproperInput(_))));
    }

    #[test]
    fn test_local_function_declaration_is_lifted() {
        let source = r#"
function outer(): number {
    let base = 10;
    function helper(n: number): number {
        return base + n;
    }
    const r = helper(5);
    return r;
}
"#;
        let outcome = convert(source).unwrap();
        assert_eq!(outcome.converted, 1);

        let text = &outcome.text;
        assert!(text.contains("base!: number;"));
        assert!(text.contains("invoke(n: number): number {"));
        assert!(text.contains("return this.base + n;"));
        assert!(text.contains("const helper = lifted1.invoke.bind(lifted1);"));
        assert!(text.contains("lifted1.base = base;"));
        assert!(!text.contains("function helper"));
    }

    #[test]
    fn test_uninferable_capture_type_fails_resolution() {
        let source = r#"
function demo(): void {
    const conn = open();
    const f = () => { use(conn); };
}
"#;
        assert!(matches!(
            convert(source),
            Err(LiftError::TypeResolution { .. })
        ));
    }

    #[test]
    fn test_closure_in_return_position_is_skipped() {
        let source = r#"
function make(flag: boolean) {
    return (m: number) => m * 2;
}
"#;
        let outcome = convert(source).unwrap();
        assert_eq!(outcome.converted, 0);
        assert_eq!(outcome.skipped.len(), 1);
        // Nothing was edited.
        assert_eq!(outcome.text, source);
    }

    #[test]
    fn test_immediately_invoked_lambda_in_expression_statement() {
        let source = r#"
((m: number) => m + 1)(5);
"#;
        let outcome = convert(source).unwrap();
        assert_eq!(outcome.converted, 1);
        assert!(outcome.text.contains("(lifted1.invoke.bind(lifted1))(5);"));
    }

    #[test]
    fn test_function_expression_is_lifted() {
        let source = r#"
function demo(): void {
    const cb = function (n: number): void { report(n); };
    cb(3);
}
"#;
        let outcome = convert(source).unwrap();
        assert_eq!(outcome.converted, 1);
        assert!(outcome.text.contains("invoke(n: number): void {"));
        assert!(outcome.text.contains("const cb = lifted1.invoke.bind(lifted1);"));
        assert!(!outcome.text.contains("function ("));
    }

    #[test]
    fn test_module_level_bindings_are_not_captured() {
        let source = r#"
const prefix = "log: ";

function demo(items: string[]): void {
    items.forEach((item: string) => {
        console.log(prefix + item);
    });
}
"#;
        let outcome = convert(source).unwrap();
        assert_eq!(outcome.converted, 1);
        // The holder class sits next to `prefix`, so no field is needed.
        assert!(!outcome.text.contains("prefix!:"));
        assert!(outcome.text.contains("console.log(prefix + item);"));
    }

    #[test]
    fn test_multiple_sites_get_distinct_names() {
        let source = r#"
function demo(ints: number[]): void {
    const evens = ints.filter((m) => m % 2 == 0);
    const odds = ints.filter((m) => m % 2 == 1);
}
"#;
        let outcome = convert(source).unwrap();
        assert_eq!(outcome.converted, 2);
        assert!(outcome.text.contains("class LiftedLambda1 {"));
        assert!(outcome.text.contains("class LiftedLambda2 {"));
        assert!(outcome.text.contains("lifted1.invoke.bind(lifted1)"));
        assert!(outcome.text.contains("lifted2.invoke.bind(lifted2)"));
    }

    #[test]
    fn test_generated_names_avoid_existing_symbols() {
        let source = r#"
function demo(ints: number[]): void {
    const lifted1 = "taken";
    const evens = ints.filter((m) => m % 2 == 0);
}
"#;
        let outcome = convert(source).unwrap();
        assert_eq!(outcome.converted, 1);
        assert!(outcome.text.contains("lifted2.invoke.bind(lifted2)"));
    }

    #[test]
    fn test_converted_output_is_idempotent() {
        let source = r#"
function demo(zipped: number[]): void {
    let text = "result of zipping";
    zipped.forEach((n) => {
        console.log(text);
        console.log(n);
    });
}
"#;
        let first = convert(source).unwrap();
        assert_eq!(first.converted, 1);

        let second = convert(&first.text).unwrap();
        assert_eq!(second.converted, 0);
        assert!(second.skipped.is_empty());
        assert_eq!(second.text, first.text);
    }

    #[test]
    fn test_value_block_body_keeps_its_returns() {
        let source = r#"
function demo(a: number[], b: number[]): void {
    const zipped = a.map((m: number, n: number) => { return m - n; });
}
"#;
        let outcome = convert(source).unwrap();
        assert!(outcome.text.contains("invoke(m: number, n: number): number {"));
        assert!(outcome.text.contains("return m - n;"));
    }

    #[test]
    fn test_async_lambda_keeps_async_method() {
        let source = r#"
function demo(queue: string[]): void {
    queue.forEach(async (item: string): Promise<void> => {
        await send(item);
    });
}
"#;
        let outcome = convert(source).unwrap();
        assert_eq!(outcome.converted, 1);
        assert!(outcome
            .text
            .contains("async invoke(item: string): Promise<void> {"));
    }

    #[test]
    fn test_parse_keeps_going_on_recoverable_warnings() {
        let mut cache = SourceCache::new();
        let doc = parse_document("let x: number = 42;", "test.ts", &mut cache).unwrap();
        assert!(doc.diagnostics.is_empty());
    }

    #[test]
    fn test_writes_to_captured_locals_are_qualified() {
        let source = r#"
function demo(items: number[]): void {
    let count = 0;
    items.forEach((n) => {
        count = count + n;
    });
    console.log(count);
}
"#;
        let outcome = convert(source).unwrap();
        assert!(outcome.text.contains("count!: number;"));
        assert!(outcome.text.contains("this.count = this.count + n;"));
    }
}
