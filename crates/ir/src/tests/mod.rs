use super::*;
use crate::cfg::{CfgNodeKind, ControlFlowGraph, StatementPath};

fn sample_graph() -> (IntentionGraph, IntentionId, IntentionId) {
    let mut graph = IntentionGraph::new();
    let file = graph.add_file(
        FileIntention::new("Person.h", true),
        IntentionMeta::nonnull(true),
    );
    let ty = graph.add_type(
        file,
        TypeIntention::new("Person", TypeKind::Class),
        IntentionMeta::nonnull(true),
    );
    (graph, file, ty)
}

#[test]
fn add_sets_parent_back_edge() {
    let (mut graph, file, ty) = sample_graph();
    assert_eq!(graph.intention(ty).parent, Some(file));

    let prop = graph.add_property(
        ty,
        PropertyIntention::field("name", ValueStorage::variable(SwiftType::string())),
        IntentionMeta::default(),
    );
    assert_eq!(graph.intention(prop).parent, Some(ty));
    assert_eq!(graph.type_intention(ty).unwrap().properties, vec![prop]);
}

#[test]
fn remove_clears_parent_back_edge() {
    let (mut graph, _file, ty) = sample_graph();
    let prop = graph.add_property(
        ty,
        PropertyIntention::field("name", ValueStorage::variable(SwiftType::string())),
        IntentionMeta::default(),
    );
    graph.remove_from_parent(prop);
    assert_eq!(graph.intention(prop).parent, None);
    assert!(graph.type_intention(ty).unwrap().properties.is_empty());
    // The arena slot survives removal.
    assert!(graph.property(prop).is_some());
}

#[test]
fn parent_back_edges_are_sound_after_mutation() {
    let (mut graph, file, ty) = sample_graph();
    let other = graph.add_type(
        file,
        TypeIntention::new("Person", TypeKind::Extension),
        IntentionMeta::default(),
    );
    let method = graph.add_method(
        other,
        MethodIntention::new(
            MethodKind::Method,
            FunctionSignature::new("run", SwiftType::Void),
        ),
        IntentionMeta::default(),
    );
    graph.reparent_member(method, ty);

    for intention in graph.intentions() {
        match intention.parent {
            None => {}
            Some(parent) => {
                let listed = match &graph.intention(parent).kind {
                    IntentionKind::File(f) => {
                        f.types.contains(&intention.id) || f.globals.contains(&intention.id)
                    }
                    IntentionKind::Type(t) => {
                        t.properties.contains(&intention.id)
                            || t.methods.contains(&intention.id)
                            || t.conformances.contains(&intention.id)
                    }
                    _ => false,
                };
                assert!(listed, "parent does not list child {:?}", intention.id);
            }
        }
    }
}

#[test]
fn insertion_at_index_preserves_sibling_order() {
    let (mut graph, file, first) = sample_graph();
    let last = graph.add_type(
        file,
        TypeIntention::new("Address", TypeKind::Class),
        IntentionMeta::default(),
    );
    let middle = graph.add_type_at(
        file,
        TypeIntention::new("Pet", TypeKind::Class),
        Some(1),
        IntentionMeta::default(),
    );
    assert_eq!(graph.file(file).unwrap().types, vec![first, middle, last]);
}

#[test]
fn method_lookup_by_selector_ignores_types() {
    let (mut graph, _file, ty) = sample_graph();
    let mut signature = FunctionSignature::new("setObject", SwiftType::Void);
    signature.parameters = vec![
        Parameter {
            label: None,
            name: "object".into(),
            ty: SwiftType::any_object(),
        },
        Parameter {
            label: Some("forKey".into()),
            name: "key".into(),
            ty: SwiftType::string(),
        },
    ];
    let id = graph.add_method(
        ty,
        MethodIntention::new(MethodKind::Method, signature),
        IntentionMeta::default(),
    );

    let selector = Selector::with_arguments(vec!["setObject".into(), "forKey".into()]);
    assert_eq!(graph.method_matching_selector(ty, &selector), Some(id));
}

#[test]
fn method_lookup_by_signature_drops_nullability() {
    let (mut graph, _file, ty) = sample_graph();
    let mut declared = FunctionSignature::new("find", SwiftType::optional(SwiftType::string()));
    declared.parameters = vec![Parameter {
        label: None,
        name: "needle".into(),
        ty: SwiftType::unspecified(SwiftType::string()),
    }];
    let id = graph.add_method(
        ty,
        MethodIntention::new(MethodKind::Method, declared),
        IntentionMeta::default(),
    );

    let mut probe = FunctionSignature::new("find", SwiftType::string());
    probe.parameters = vec![Parameter {
        label: None,
        name: "other".into(),
        ty: SwiftType::string(),
    }];
    assert_eq!(graph.method_with_signature(ty, &probe), Some(id));
}

#[test]
fn generate_method_from_descriptor_inherits_nonnull_context() {
    let (mut graph, _file, ty) = sample_graph();
    let descriptor = MethodDescriptor {
        signature: FunctionSignature::new("describe", SwiftType::string()),
    };
    let id = graph.generate_method(ty, &descriptor);
    assert!(graph.intention(id).in_nonnull_context);
    assert_eq!(graph.intention(id).parent, Some(ty));
    assert_eq!(graph.method(id).unwrap().signature.name, "describe");
}

#[test]
fn intention_graph_serde_roundtrip() {
    let (graph, _file, _ty) = sample_graph();
    let json = serde_json::to_string(&graph).unwrap();
    let back: IntentionGraph = serde_json::from_str(&json).unwrap();
    assert_eq!(graph, back);
}

#[test]
fn cfg_well_formed_after_construction() {
    let mut cfg = ControlFlowGraph::new();
    let a = cfg.add_statement_node(StatementPath(vec![0]), "a");
    let b = cfg.add_statement_node(StatementPath(vec![1]), "b");
    cfg.add_edge(cfg.entry(), a);
    cfg.add_edge(a, b);
    cfg.add_edge(b, cfg.exit());

    assert!(cfg.edges().all(|e| cfg.contains(e.source) && cfg.contains(e.target)));
    assert!(cfg.successors(cfg.exit()).is_empty());
    assert!(cfg.predecessors(cfg.entry()).is_empty());
}

#[test]
fn cfg_prune_removes_unreachable_nodes() {
    let mut cfg = ControlFlowGraph::new();
    let a = cfg.add_statement_node(StatementPath(vec![0]), "a");
    let orphan = cfg.add_statement_node(StatementPath(vec![9]), "orphan");
    cfg.add_edge(cfg.entry(), a);
    cfg.add_edge(a, cfg.exit());

    cfg.prune();
    assert!(!cfg.contains(orphan));
    assert!(cfg.contains(a));
    assert!(cfg.contains(cfg.entry()) && cfg.contains(cfg.exit()));
}

#[test]
fn cfg_marks_loop_back_edges() {
    let mut cfg = ControlFlowGraph::new();
    let header = cfg.add_statement_node(StatementPath(vec![0]), "while");
    let body = cfg.add_statement_node(StatementPath(vec![0, 0]), "body");
    cfg.add_edge(cfg.entry(), header);
    cfg.add_edge(header, body);
    cfg.add_edge(body, header);
    cfg.add_edge(header, cfg.exit());

    cfg.mark_back_edges();
    let back: Vec<_> = cfg.edges().filter(|e| e.back_edge).collect();
    assert_eq!(back.len(), 1);
    assert_eq!(back[0].source, body);
    assert_eq!(back[0].target, header);
}

#[test]
fn cfg_copy_then_deep_copy_is_structurally_equal() {
    let mut cfg = ControlFlowGraph::new();
    let a = cfg.add_statement_node(StatementPath(vec![0]), "a");
    let b = cfg.add_statement_node(StatementPath(vec![1]), "b");
    cfg.add_edge(cfg.entry(), a);
    cfg.add_edge(a, b);
    cfg.add_edge(b, a);
    cfg.add_edge(a, cfg.exit());
    cfg.mark_back_edges();

    let copied = cfg.copy().deep_copy();
    assert_eq!(copied, cfg);
    assert_eq!(copied.entry(), cfg.entry());
    assert_eq!(copied.exit(), cfg.exit());
}

#[test]
fn subgraph_expansion_preserves_reachable_statements() {
    let mut inner = ControlFlowGraph::new();
    let inner_stmt = inner.add_statement_node(StatementPath(vec![1, 0]), "nested");
    inner.add_edge(inner.entry(), inner_stmt);
    inner.add_edge(inner_stmt, inner.exit());

    let mut outer = ControlFlowGraph::new();
    let before = outer.add_statement_node(StatementPath(vec![0]), "before");
    let sub = outer.add_subgraph_node(inner);
    let after = outer.add_statement_node(StatementPath(vec![2]), "after");
    outer.add_edge(outer.entry(), before);
    outer.add_edge(before, sub);
    outer.add_edge(sub, after);
    outer.add_edge(after, outer.exit());

    let reachable_before = outer.reachable_statement_paths();
    outer.expand_subgraphs();
    outer.prune();
    let reachable_after = outer.reachable_statement_paths();

    assert_eq!(reachable_before, reachable_after);
    assert!(!outer
        .nodes()
        .any(|n| matches!(n.kind, CfgNodeKind::Subgraph(_))));
    // The nested statement is now wired between its old neighbours.
    let nested = outer
        .nodes()
        .find(|n| matches!(&n.kind, CfgNodeKind::Statement { description, .. } if description == "nested"))
        .expect("nested node survives expansion");
    assert_eq!(outer.predecessors(nested.id), vec![before]);
    assert_eq!(outer.successors(nested.id), vec![after]);
}

#[test]
fn empty_subgraph_expansion_connects_neighbours() {
    let mut inner = ControlFlowGraph::new();
    let (entry, exit) = (inner.entry(), inner.exit());
    inner.add_edge(entry, exit);

    let mut outer = ControlFlowGraph::new();
    let before = outer.add_statement_node(StatementPath(vec![0]), "before");
    let sub = outer.add_subgraph_node(inner);
    outer.add_edge(outer.entry(), before);
    outer.add_edge(before, sub);
    outer.add_edge(sub, outer.exit());

    outer.expand_subgraphs();
    assert!(outer.successors(before).contains(&outer.exit()));
}
