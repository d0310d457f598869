//! Declaration lowering: interfaces, implementations, categories,
//! protocols, properties, methods and file-level globals become intentions.
//!
//! `@interface`/`@implementation` pairs arrive as separate type fragments
//! sharing the type name; the fragment-merge pass unifies them later.
//! `NS_ASSUME_NONNULL` spans are tracked while walking the translation unit
//! and frozen into each intention at construction time.

use crate::context::{ParseContext, Rule};
use crate::lowering::{stmt, LoweringContext};
use crate::typemap::{self, TypeMapperContext};
use ir::{
    FileIntention, FunctionBody, FunctionSignature, GlobalVariableIntention, IntentionGraph,
    IntentionId, IntentionKind, IntentionMeta, MethodIntention, MethodKind, Ownership, Parameter,
    PropertyAttribute, PropertyIntention, PropertyMode, SwiftType, TypeIntention, TypeKind,
    ValueStorage,
};
use tracing::debug;

/// First walk: registers every class and protocol name so the type mapper
/// can resolve references between files regardless of lowering order.
pub fn collect_known_names(unit: &ParseContext, mapper: &mut TypeMapperContext) {
    for child in &unit.children {
        match child.rule {
            Rule::ClassInterface
            | Rule::ClassImplementation
            | Rule::CategoryInterface
            | Rule::CategoryImplementation => {
                if let Some(name) = &child.value {
                    mapper.register_class(name.clone());
                }
                if let Some(superclass) = child.child(Rule::SuperclassRef) {
                    mapper.register_class(superclass.token_text().to_string());
                }
            }
            Rule::ProtocolDeclaration => {
                if let Some(name) = &child.value {
                    mapper.register_protocol(name.clone());
                }
            }
            _ => {}
        }
    }
}

/// Lowers a whole translation unit into a file intention and its subtree.
pub fn lower_translation_unit(
    graph: &mut IntentionGraph,
    unit: &ParseContext,
    lc: &LoweringContext<'_>,
) -> IntentionId {
    let file_id = graph.add_file(
        FileIntention::new(lc.file.clone(), lc.is_header),
        IntentionMeta::default().with_origin(unit.range.clone(), rule_name(unit.rule)),
    );
    let mut nonnull = false;
    for child in &unit.children {
        match child.rule {
            Rule::NonnullBegin => nonnull = true,
            Rule::NonnullEnd => nonnull = false,
            Rule::Import => {
                if let Some(target) = &child.value {
                    if let Some(file) = graph.file_mut(file_id) {
                        file.imports.push(target.clone());
                    }
                }
            }
            Rule::ClassInterface => {
                lower_type(graph, file_id, child, TypeKind::Class, nonnull, lc);
            }
            Rule::ClassImplementation => {
                lower_type(graph, file_id, child, TypeKind::Class, nonnull, lc);
            }
            Rule::CategoryInterface | Rule::CategoryImplementation => {
                lower_type(graph, file_id, child, TypeKind::Extension, nonnull, lc);
            }
            Rule::ProtocolDeclaration => {
                lower_type(graph, file_id, child, TypeKind::Protocol, nonnull, lc);
            }
            Rule::VariableDeclaration => {
                lower_global_variables(graph, file_id, child, nonnull, lc);
            }
            Rule::FunctionDefinition => {
                lower_global_function(graph, file_id, child, nonnull, lc);
            }
            Rule::Unknown => {
                debug!(file = %lc.file, line = child.range.line, "unrecognised top-level region");
            }
            _ => {}
        }
    }
    file_id
}

fn rule_name(rule: Rule) -> String {
    format!("{rule:?}")
}

fn meta_for(ctx: &ParseContext, nonnull: bool) -> IntentionMeta {
    IntentionMeta::nonnull(nonnull).with_origin(ctx.range.clone(), rule_name(ctx.rule))
}

fn lower_type(
    graph: &mut IntentionGraph,
    file_id: IntentionId,
    ctx: &ParseContext,
    kind: TypeKind,
    nonnull: bool,
    lc: &LoweringContext<'_>,
) {
    let Some(name) = ctx.value.clone() else {
        return;
    };
    let mut ty = TypeIntention::new(name, kind);
    ty.supertype = ctx
        .child(Rule::SuperclassRef)
        .map(|s| s.token_text().to_string());
    let type_id = graph.add_type(file_id, ty, meta_for(ctx, nonnull));

    for proto in ctx.children_of(Rule::ProtocolRef) {
        graph.add_conformance(type_id, proto.token_text(), meta_for(proto, nonnull));
    }
    if let Some(ivars) = ctx.child(Rule::IvarBlock) {
        for decl in ivars.children_of(Rule::VariableDeclaration) {
            lower_ivars(graph, type_id, decl, nonnull, lc);
        }
    }
    for member in &ctx.children {
        match member.rule {
            Rule::PropertyDeclaration => {
                lower_property(graph, type_id, member, nonnull, lc);
            }
            Rule::MethodDeclaration | Rule::MethodDefinition => {
                lower_method(graph, type_id, member, nonnull, lc);
            }
            Rule::Unknown => {
                debug!(file = %lc.file, line = member.range.line, "unrecognised member");
            }
            _ => {}
        }
    }
}

fn lower_ivars(
    graph: &mut IntentionGraph,
    type_id: IntentionId,
    decl: &ParseContext,
    nonnull: bool,
    lc: &LoweringContext<'_>,
) {
    let Some(type_ctx) = decl.child(Rule::TypeName) else {
        return;
    };
    let spelled = type_ctx.token_text();
    let ty = typemap::map_spelled_type(spelled, lc.mapper);
    for declarator in decl.children_of(Rule::Declarator) {
        let storage = ValueStorage {
            ty: ty.clone(),
            ownership: typemap::ownership_of(spelled),
            is_constant: typemap::is_const(spelled),
        };
        let property = PropertyIntention::field(declarator.token_text(), storage);
        graph.add_property(type_id, property, meta_for(declarator, nonnull));
    }
}

fn lower_property(
    graph: &mut IntentionGraph,
    type_id: IntentionId,
    ctx: &ParseContext,
    nonnull: bool,
    lc: &LoweringContext<'_>,
) {
    let Some(name) = ctx.value.clone() else {
        return;
    };
    let Some(type_ctx) = ctx.child(Rule::TypeName) else {
        return;
    };
    let attributes: Vec<PropertyAttribute> = ctx
        .children_of(Rule::PropertyAttribute)
        .filter_map(|a| property_attribute(a.token_text()))
        .collect();
    let spelled = type_ctx.token_text();
    let mut ty = typemap::map_spelled_type(spelled, lc.mapper);
    if attributes.contains(&PropertyAttribute::Nullable) {
        ty = match ty {
            SwiftType::Unspecified(inner) => SwiftType::Optional(inner),
            other => SwiftType::optional(other),
        };
    } else if attributes.contains(&PropertyAttribute::Nonnull) {
        if let SwiftType::Unspecified(inner) = ty {
            ty = *inner;
        }
    }
    let ownership = if attributes.contains(&PropertyAttribute::Weak) {
        Ownership::Weak
    } else {
        typemap::ownership_of(spelled)
    };
    let property = PropertyIntention {
        name,
        storage: ValueStorage {
            ty,
            ownership,
            is_constant: false,
        },
        attributes,
        mode: PropertyMode::Field,
        initial_value: None,
    };
    graph.add_property(type_id, property, meta_for(ctx, nonnull));
}

fn property_attribute(text: &str) -> Option<PropertyAttribute> {
    if let Some(getter) = text.strip_prefix("getter=") {
        return Some(PropertyAttribute::Getter(getter.to_string()));
    }
    if let Some(setter) = text.strip_prefix("setter=") {
        return Some(PropertyAttribute::Setter(setter.to_string()));
    }
    let attr = match text {
        "readonly" => PropertyAttribute::Readonly,
        "nonatomic" => PropertyAttribute::Nonatomic,
        "atomic" => PropertyAttribute::Atomic,
        "copy" => PropertyAttribute::Copy,
        "strong" | "retain" => PropertyAttribute::Strong,
        "weak" => PropertyAttribute::Weak,
        "assign" => PropertyAttribute::Assign,
        "nullable" => PropertyAttribute::Nullable,
        "nonnull" => PropertyAttribute::Nonnull,
        "class" => PropertyAttribute::Class,
        _ => return None,
    };
    Some(attr)
}

fn lower_method(
    graph: &mut IntentionGraph,
    type_id: IntentionId,
    ctx: &ParseContext,
    nonnull: bool,
    lc: &LoweringContext<'_>,
) {
    let Some(signature) = signature_from_method(ctx, lc) else {
        debug!(file = %lc.file, line = ctx.range.line, "method selector did not lower");
        return;
    };
    let kind = if !signature.is_static && signature.name.starts_with("init") {
        MethodKind::Initializer
    } else {
        MethodKind::Method
    };
    let mut method = MethodIntention::new(kind, signature);
    if ctx.rule == Rule::MethodDefinition {
        if let Some(body_ctx) = ctx.child(Rule::CompoundStatement) {
            method.body = Some(FunctionBody::new(stmt::read_compound(body_ctx, lc)));
        }
    }
    graph.add_method(type_id, method, meta_for(ctx, nonnull));
}

/// Builds a Swift signature from a method context: the first selector piece
/// names the method, later pieces become argument labels.
fn signature_from_method(ctx: &ParseContext, lc: &LoweringContext<'_>) -> Option<FunctionSignature> {
    let is_static = ctx.child(Rule::ClassMethodMarker).is_some();
    let return_type = ctx
        .child(Rule::TypeName)
        .map(|t| typemap::map_spelled_type(t.token_text(), lc.mapper))
        .unwrap_or(SwiftType::Void);
    let pieces: Vec<&ParseContext> = ctx.children_of(Rule::MethodSelectorPiece).collect();
    let first = pieces.first()?;
    let mut signature = FunctionSignature::new(first.token_text(), return_type);
    signature.is_static = is_static;
    for (i, piece) in pieces.iter().enumerate() {
        let Some(param_ty) = piece.child(Rule::TypeName) else {
            continue;
        };
        let param_name = piece
            .child(Rule::Identifier)
            .map(|p| p.token_text().to_string())
            .unwrap_or_else(|| piece.token_text().to_string());
        signature.parameters.push(Parameter {
            label: if i == 0 {
                None
            } else {
                Some(piece.token_text().to_string())
            },
            name: param_name,
            ty: typemap::map_spelled_type(param_ty.token_text(), lc.mapper),
        });
    }
    Some(signature)
}

fn lower_global_variables(
    graph: &mut IntentionGraph,
    file_id: IntentionId,
    ctx: &ParseContext,
    nonnull: bool,
    lc: &LoweringContext<'_>,
) {
    let Some(type_ctx) = ctx.child(Rule::TypeName) else {
        return;
    };
    let spelled = type_ctx.token_text();
    let ty = typemap::map_spelled_type(spelled, lc.mapper);
    for declarator in ctx.children_of(Rule::Declarator) {
        let initial_value = declarator
            .child_at(0)
            .and_then(|init| super::expr::read_expression(init, lc));
        let global = GlobalVariableIntention {
            name: declarator.token_text().to_string(),
            storage: ValueStorage {
                ty: ty.clone(),
                ownership: typemap::ownership_of(spelled),
                is_constant: typemap::is_const(spelled),
            },
            initial_value,
        };
        graph.add_global(
            file_id,
            IntentionKind::GlobalVariable(global),
            meta_for(declarator, nonnull),
        );
    }
}

fn lower_global_function(
    graph: &mut IntentionGraph,
    file_id: IntentionId,
    ctx: &ParseContext,
    nonnull: bool,
    lc: &LoweringContext<'_>,
) {
    let Some(name) = ctx.value.clone() else {
        return;
    };
    let return_type = ctx
        .child(Rule::TypeName)
        .map(|t| typemap::map_spelled_type(t.token_text(), lc.mapper))
        .unwrap_or(SwiftType::Void);
    let mut signature = FunctionSignature::new(name, return_type);
    for param in ctx.children_of(Rule::ParameterDeclaration) {
        let Some(param_ty) = param.child(Rule::TypeName) else {
            continue;
        };
        signature.parameters.push(Parameter {
            label: None,
            name: param.token_text().to_string(),
            ty: typemap::map_spelled_type(param_ty.token_text(), lc.mapper),
        });
    }
    let mut method = MethodIntention::new(MethodKind::GlobalFunction, signature);
    if let Some(body_ctx) = ctx.child(Rule::CompoundStatement) {
        method.body = Some(FunctionBody::new(stmt::read_compound(body_ctx, lc)));
    }
    graph.add_global(file_id, IntentionKind::Method(method), meta_for(ctx, nonnull));
}
