use engine::passes::{
    CancellationToken, IntentionPass, PassContext, PropertySynthesis, TypeFragmentMerge,
};
use engine::{translate_sources, SourceFile, TranslationOptions};
use ir::{PropertyMode, StatementKind, SwiftType, TypeKind};
use parsers::TypeMapperContext;
use std::path::PathBuf;

const PERSON_H: &str = r#"
#import <Foundation/Foundation.h>

NS_ASSUME_NONNULL_BEGIN

@interface Person : NSObject <NSCopying>
@property (nonatomic, copy) NSString *name;
@property (nonatomic, readonly) NSInteger age;
- (NSString *)greet;
- (void)celebrate;
@end

NS_ASSUME_NONNULL_END
"#;

const PERSON_M: &str = r#"
#import "Person.h"

@implementation Person

- (NSString *)greet {
    return self.name;
}

- (void)celebrate {
    for (int i = 0; i < 3; i++) {
        [self cheer];
    }
    return;
    [self cheer];
}

@end
"#;

fn sources() -> Vec<SourceFile> {
    vec![
        SourceFile {
            path: PathBuf::from("Person.h"),
            source: PERSON_H.to_string(),
            is_header: true,
        },
        SourceFile {
            path: PathBuf::from("Person.m"),
            source: PERSON_M.to_string(),
            is_header: false,
        },
    ]
}

#[test]
fn pipeline_merges_fragments_into_one_type() {
    let translation = translate_sources(sources(), &TranslationOptions::default()).unwrap();
    let graph = &translation.graph;

    let person = graph.type_named("Person").expect("Person survives");
    let ty = graph.type_intention(person).unwrap();
    assert_eq!(ty.kind, TypeKind::Class);
    assert_eq!(ty.supertype.as_deref(), Some("NSObject"));
    // The implementation fragment was folded in; only one Person remains.
    let person_count = graph
        .type_ids()
        .into_iter()
        .filter(|&id| graph.type_intention(id).map(|t| t.name.as_str()) == Some("Person"))
        .count();
    assert_eq!(person_count, 1);

    // The interface declaration adopted the implementation body.
    let greet = graph
        .method_matching_selector(person, &ir::Selector::unary("greet"))
        .unwrap();
    assert!(graph.method(greet).unwrap().body.is_some());
}

#[test]
fn pipeline_resolves_nullability_from_nonnull_region() {
    let translation = translate_sources(sources(), &TranslationOptions::default()).unwrap();
    let graph = &translation.graph;
    let person = graph.type_named("Person").unwrap();
    let name = graph
        .property(graph.property_named(person, "name").unwrap())
        .unwrap();
    // Declared inside NS_ASSUME_NONNULL: no optionality wrapper survives.
    assert_eq!(name.storage.ty, SwiftType::string());
}

#[test]
fn pipeline_promotes_readonly_and_infers_counted_loop() {
    let translation = translate_sources(sources(), &TranslationOptions::default()).unwrap();
    let graph = &translation.graph;
    let person = graph.type_named("Person").unwrap();

    let age = graph
        .property(graph.property_named(person, "age").unwrap())
        .unwrap();
    assert!(age.storage.is_constant, "readonly stored property becomes let");

    let celebrate = graph
        .method_matching_selector(person, &ir::Selector::unary("celebrate"))
        .unwrap();
    let body = graph.method(celebrate).unwrap().body.as_ref().unwrap();
    assert!(matches!(
        body.statements.statements[0].kind,
        StatementKind::ForIn(_)
    ));
}

#[test]
fn pipeline_removes_statements_after_return() {
    let translation = translate_sources(sources(), &TranslationOptions::default()).unwrap();
    let graph = &translation.graph;
    let person = graph.type_named("Person").unwrap();
    let celebrate = graph
        .method_matching_selector(person, &ir::Selector::unary("celebrate"))
        .unwrap();
    let body = graph.method(celebrate).unwrap().body.as_ref().unwrap();
    // for-in, return; the trailing cheer is unreachable and swept.
    assert_eq!(body.statements.statements.len(), 2);
    assert!(matches!(
        body.statements.statements[1].kind,
        StatementKind::Return(None)
    ));
}

#[test]
fn property_synthesis_is_idempotent() {
    let source = r#"
@interface Counter : NSObject
@property (nonatomic) NSInteger count;
@end

@implementation Counter
- (NSInteger)count {
    return [self load];
}
- (void)setCount:(NSInteger)value {
    [self store:value];
}
@end
"#;
    let mut graph = ir::IntentionGraph::new();
    let mut mapper = TypeMapperContext::new();
    parsers::collect_known_names(&parsers::parse_source(source, "Counter.m"), &mut mapper);
    parsers::lower_source(&mut graph, source, "Counter.m", false, &mapper);

    let cancellation = CancellationToken::new();
    let ctx = PassContext {
        mapper: &mapper,
        cancellation: &cancellation,
    };
    let mut merge = TypeFragmentMerge;
    merge.run(&mut graph, &ctx);

    let mut pass = PropertySynthesis;
    let first = pass.run(&mut graph, &ctx);
    let second = pass.run(&mut graph, &ctx);
    assert!(first, "accessor methods fold into the property");
    assert!(!second, "a second run must report no change");

    let counter = graph.type_named("Counter").unwrap();
    let count = graph
        .property(graph.property_named(counter, "count").unwrap())
        .unwrap();
    assert!(matches!(count.mode, PropertyMode::Accessors { .. }));
    // The folded accessor methods are gone from the type.
    assert!(graph
        .method_matching_selector(counter, &ir::Selector::unary("count"))
        .is_none());
}

#[test]
fn trivial_backing_accessors_collapse_to_stored_form() {
    let source = r#"
@interface Box : NSObject
@property (nonatomic) NSInteger value;
@end

@implementation Box
- (NSInteger)value {
    return _value;
}
- (void)setValue:(NSInteger)value {
    _value = value;
}
@end
"#;
    let mut graph = ir::IntentionGraph::new();
    let mut mapper = TypeMapperContext::new();
    parsers::collect_known_names(&parsers::parse_source(source, "Box.m"), &mut mapper);
    parsers::lower_source(&mut graph, source, "Box.m", false, &mapper);

    let cancellation = CancellationToken::new();
    let ctx = PassContext {
        mapper: &mapper,
        cancellation: &cancellation,
    };
    TypeFragmentMerge.run(&mut graph, &ctx);
    PropertySynthesis.run(&mut graph, &ctx);

    let ty = graph.type_named("Box").unwrap();
    let value = graph
        .property(graph.property_named(ty, "value").unwrap())
        .unwrap();
    assert!(
        matches!(value.mode, PropertyMode::Field),
        "trivial accessors collapse to stored form"
    );
    assert!(graph
        .method_matching_selector(ty, &ir::Selector::unary("value"))
        .is_none());
}

#[test]
fn protocol_conformance_synthesis_generates_missing_members() {
    let source = r#"
@protocol Greeter
@property (nonatomic, readonly) NSString *salutation;
- (void)greet;
@end

@interface Robot : NSObject <Greeter>
@end
"#;
    let mut graph = ir::IntentionGraph::new();
    let mut mapper = TypeMapperContext::new();
    parsers::collect_known_names(&parsers::parse_source(source, "Robot.h"), &mut mapper);
    parsers::lower_source(&mut graph, source, "Robot.h", true, &mapper);

    let cancellation = CancellationToken::new();
    let ctx = PassContext {
        mapper: &mapper,
        cancellation: &cancellation,
    };
    PropertySynthesis.run(&mut graph, &ctx);

    let robot = graph.type_named("Robot").unwrap();
    assert!(graph.property_named(robot, "salutation").is_some());
    let greet = graph
        .method_matching_selector(robot, &ir::Selector::unary("greet"))
        .expect("stub generated from protocol descriptor");
    assert!(graph.method(greet).unwrap().body.is_some());
}

#[test]
fn emitted_swift_contains_the_expected_shapes() {
    let translation = translate_sources(sources(), &TranslationOptions::default()).unwrap();
    let files = engine::emit_graph(&translation.graph);
    let header = files
        .iter()
        .find(|f| f.path.to_string_lossy().ends_with("Person.swift"))
        .expect("header-derived output");
    let text = engine::render(&header.syntax);

    assert!(text.contains("import Foundation"), "{text}");
    assert!(text.contains("class Person: NSObject, NSCopying {"), "{text}");
    assert!(text.contains("var name: String"), "{text}");
    assert!(text.contains("let age: Int"), "{text}");
    assert!(text.contains("for i in 0..<3 {"), "{text}");
    assert!(text.contains("func greet() -> String"), "{text}");
}
