use ir::{
    AssignmentOperator, BinaryOperator, Constant, ExpressionKind, IntentionGraph, PropertyMode,
    StatementKind, SwiftType, TypeKind,
};
use parsers::grammar::parse_statement;
use parsers::{lower_source, read_statement, LoweringContext, TypeMapperContext};

fn lower(source: &str) -> ir::Statement {
    let mapper = TypeMapperContext::new();
    let lc = LoweringContext::new("test.m", false, &mapper);
    let ctx = parse_statement(source, "test.m");
    read_statement(&ctx, &lc)
}

#[test]
fn counted_loop_becomes_half_open_range() {
    let stmt = lower("for (int i = 0; i < 10; i++) { a[i] = 0; }");
    let StatementKind::ForIn(for_in) = stmt.kind else {
        panic!("expected for-in, got {:?}", stmt.kind);
    };
    assert_eq!(for_in.binding, "i");
    let ExpressionKind::Binary { lhs, op, rhs } = for_in.sequence.kind else {
        panic!("expected range sequence");
    };
    assert_eq!(op, BinaryOperator::OpenRange);
    assert_eq!(lhs.kind, ExpressionKind::Constant(Constant::Int(0)));
    assert_eq!(rhs.kind, ExpressionKind::Constant(Constant::Int(10)));
    assert_eq!(for_in.body.statements.len(), 1);
}

#[test]
fn inclusive_counted_loop_needs_literal_bound() {
    // Literal bound: closed range.
    let stmt = lower("for (int i = 1; i <= 3; i++) { sum += i; }");
    let StatementKind::ForIn(for_in) = stmt.kind else {
        panic!("expected for-in, got {:?}", stmt.kind);
    };
    let ExpressionKind::Binary { op, .. } = for_in.sequence.kind else {
        panic!("expected range sequence");
    };
    assert_eq!(op, BinaryOperator::ClosedRange);

    // Non-literal bound: the general while lowering with a defer step.
    let stmt = lower("for (int i = 1; i <= n; i++) { sum += i; }");
    let StatementKind::Do(do_stmt) = stmt.kind else {
        panic!("expected do-wrapped general lowering, got {:?}", stmt.kind);
    };
    let StatementKind::While(while_stmt) = &do_stmt.body.statements[1].kind else {
        panic!("expected while inside the wrapper");
    };
    let StatementKind::Defer(deferred) = &while_stmt.body.statements[0].kind else {
        panic!("expected defer as the first loop statement");
    };
    let StatementKind::Expressions(exprs) = &deferred.statements[0].kind else {
        panic!("expected step expression in defer");
    };
    let ExpressionKind::Assignment { op, .. } = &exprs[0].kind else {
        panic!("expected step assignment");
    };
    assert_eq!(*op, AssignmentOperator::AddAssign);
}

#[test]
fn counted_loop_rejected_when_body_assigns_the_variable() {
    let stmt = lower("for (int i = 0; i < 10; i++) { i = 5; }");
    assert!(
        matches!(stmt.kind, StatementKind::Do(_)),
        "assignment to the counter must force the general lowering"
    );
}

#[test]
fn for_with_no_init_and_no_condition_is_while_true() {
    let stmt = lower("for (;;) { tick(); }");
    let StatementKind::While(while_stmt) = stmt.kind else {
        panic!("expected bare while, got {:?}", stmt.kind);
    };
    assert_eq!(
        while_stmt.condition.kind,
        ExpressionKind::Constant(Constant::Bool(true))
    );
}

#[test]
fn fast_enumeration_maps_to_for_in() {
    let stmt = lower("for (NSString *name in names) { use(name); }");
    let StatementKind::ForIn(for_in) = stmt.kind else {
        panic!("expected for-in, got {:?}", stmt.kind);
    };
    assert_eq!(for_in.binding, "name");
}

#[test]
fn synchronized_lowering_captures_lock_once() {
    let stmt = lower("@synchronized(self) { x = 1; }");
    let StatementKind::Do(do_stmt) = stmt.kind else {
        panic!("expected do block, got {:?}", stmt.kind);
    };
    let body = &do_stmt.body.statements;
    assert_eq!(body.len(), 4);
    let StatementKind::VariableDeclarations(decls) = &body[0].kind else {
        panic!("expected lock capture first");
    };
    assert_eq!(decls[0].name, "_lockTarget");
    assert!(decls[0].is_constant);
    let StatementKind::Expressions(enter) = &body[1].kind else {
        panic!("expected objc_sync_enter");
    };
    let ExpressionKind::Call { callee, .. } = &enter[0].kind else {
        panic!("expected call");
    };
    assert_eq!(callee.as_identifier(), Some("objc_sync_enter"));
    assert!(matches!(body[2].kind, StatementKind::Defer(_)));
    assert!(matches!(body[3].kind, StatementKind::Expressions(_)));
}

#[test]
fn switch_gains_synthesised_default_and_drops_trailing_break() {
    let stmt = lower("switch (x) { case 1: f(); break; }");
    let StatementKind::Switch(switch_stmt) = stmt.kind else {
        panic!("expected switch, got {:?}", stmt.kind);
    };
    assert_eq!(switch_stmt.cases.len(), 1);
    assert_eq!(switch_stmt.cases[0].body.statements.len(), 1);
    assert!(matches!(
        switch_stmt.cases[0].body.statements[0].kind,
        StatementKind::Expressions(_)
    ));
    assert_eq!(switch_stmt.default.statements.len(), 1);
    assert!(matches!(
        switch_stmt.default.statements[0].kind,
        StatementKind::Break
    ));
}

#[test]
fn implicit_fallthrough_becomes_explicit() {
    let stmt = lower("switch (x) { case 1: f(); case 2: g(); break; }");
    let StatementKind::Switch(switch_stmt) = stmt.kind else {
        panic!("expected switch");
    };
    assert!(matches!(
        switch_stmt.cases[0].body.statements.last().unwrap().kind,
        StatementKind::Fallthrough
    ));
}

#[test]
fn nested_compound_blocks_are_flattened() {
    let stmt = lower("{ { int x = 1; } y = 2; }");
    let StatementKind::Compound(block) = stmt.kind else {
        panic!("expected compound");
    };
    assert_eq!(block.statements.len(), 2);
    assert!(matches!(
        block.statements[0].kind,
        StatementKind::VariableDeclarations(_)
    ));
}

#[test]
fn autoreleasepool_becomes_trailing_closure_call() {
    let stmt = lower("@autoreleasepool { work(); }");
    let StatementKind::Expressions(exprs) = stmt.kind else {
        panic!("expected expression statement");
    };
    let ExpressionKind::Call { callee, arguments } = &exprs[0].kind else {
        panic!("expected call");
    };
    assert_eq!(callee.as_identifier(), Some("autoreleasepool"));
    assert!(matches!(
        arguments[0].value.kind,
        ExpressionKind::Closure { .. }
    ));
}

#[test]
fn untranslatable_statements_degrade_to_unknown() {
    let stmt = lower("goto fail;");
    let StatementKind::Unknown(unknown) = stmt.kind else {
        panic!("expected unknown, got {:?}", stmt.kind);
    };
    assert!(unknown.source_text.contains("goto"));
}

#[test]
fn lowering_is_total_over_arbitrary_statement_soup() {
    for source in [
        "if (x",
        "switch { }",
        "for (;; step())",
        "@synchronized",
        "??? !!",
        "while (a b c) {}",
        "return @[];",
    ] {
        // Must produce some statement without panicking.
        let _ = lower(source);
    }
}

#[test]
fn message_sends_lower_to_labeled_calls() {
    let stmt = lower("[dict setObject:value forKey:key];");
    let StatementKind::Expressions(exprs) = stmt.kind else {
        panic!("expected expression statement");
    };
    let ExpressionKind::Call { callee, arguments } = &exprs[0].kind else {
        panic!("expected call");
    };
    let ExpressionKind::Member { name, .. } = &callee.kind else {
        panic!("expected member callee");
    };
    assert_eq!(name, "setObject");
    assert_eq!(arguments.len(), 2);
    assert_eq!(arguments[0].label, None);
    assert_eq!(arguments[1].label.as_deref(), Some("forKey"));
}

#[test]
fn interface_and_implementation_lower_to_type_fragments() {
    let source = r#"
NS_ASSUME_NONNULL_BEGIN
@interface Person : NSObject <NSCopying>
@property (nonatomic, copy) NSString *name;
@property (nonatomic, readonly) NSInteger age;
- (NSString *)describe;
@end
NS_ASSUME_NONNULL_END

@implementation Person
- (NSString *)describe {
    return self.name;
}
@end
"#;
    let mut graph = IntentionGraph::new();
    let mut mapper = TypeMapperContext::new();
    parsers::collect_known_names(&parsers::parse_source(source, "Person.m"), &mut mapper);
    let file_id = lower_source(&mut graph, source, "Person.m", false, &mapper);

    let file = graph.file(file_id).expect("file intention");
    assert_eq!(file.types.len(), 2, "interface and implementation fragments");

    let interface = graph.type_intention(file.types[0]).unwrap();
    assert_eq!(interface.name, "Person");
    assert_eq!(interface.kind, TypeKind::Class);
    assert_eq!(interface.supertype.as_deref(), Some("NSObject"));
    assert_eq!(interface.properties.len(), 2);
    assert_eq!(interface.conformances.len(), 1);
    // Declared inside the nonnull span.
    assert!(graph.intention(file.types[0]).in_nonnull_context);
    // The implementation fragment sits outside it.
    assert!(!graph.intention(file.types[1]).in_nonnull_context);

    let name_prop = graph
        .property(graph.property_named(file.types[0], "name").unwrap())
        .unwrap();
    // Nullability stays open until the nullability pass decides it.
    assert_eq!(
        name_prop.storage.ty,
        SwiftType::unspecified(SwiftType::string())
    );
    assert!(matches!(name_prop.mode, PropertyMode::Field));

    let implementation = graph.type_intention(file.types[1]).unwrap();
    assert_eq!(implementation.methods.len(), 1);
    let describe = graph.method(implementation.methods[0]).unwrap();
    assert!(describe.body.is_some());
}

#[test]
fn imports_are_collected_onto_the_file() {
    let source = "#import <Foundation/Foundation.h>\n#import \"Person.h\"\n";
    let mut graph = IntentionGraph::new();
    let mapper = TypeMapperContext::new();
    let file_id = lower_source(&mut graph, source, "main.m", false, &mapper);
    let file = graph.file(file_id).unwrap();
    assert_eq!(
        file.imports,
        vec!["Foundation/Foundation.h".to_string(), "Person.h".to_string()]
    );
}
