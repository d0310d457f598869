//! Emission adapter: finalised intention graph → concrete Swift syntax
//! tree.
//!
//! A pure function over the graph. The tree is line/block structured:
//! rendering it to text (indentation, braces) is the caller's concern.
//! Unknown statements become block comments preserving the original
//! Objective-C text.

use ir::{
    AssignmentOperator, BinaryOperator, CompoundStatement, Constant, Expression, ExpressionKind,
    FunctionSignature, IntentionGraph, IntentionId, IntentionKind, MethodKind, Ownership,
    PropertyIntention, PropertyMode, Statement, StatementKind, SwiftType, TypeKind,
};
use serde::Serialize;
use std::path::PathBuf;

/// A node of the emitted Swift syntax tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SwiftSyntax {
    /// One line of Swift source.
    Line(String),
    /// A block comment carrying untranslated source text.
    Comment(String),
    /// `header { children } trailer?`
    Block {
        header: String,
        children: Vec<SwiftSyntax>,
        trailer: Option<String>,
    },
    /// `label:`-style entry (switch cases) with indented children and no
    /// braces.
    Labeled {
        label: String,
        children: Vec<SwiftSyntax>,
    },
    Blank,
}

impl SwiftSyntax {
    fn block(header: impl Into<String>, children: Vec<SwiftSyntax>) -> Self {
        SwiftSyntax::Block {
            header: header.into(),
            children,
            trailer: None,
        }
    }
}

/// One output file worth of syntax.
#[derive(Debug, Clone, Serialize)]
pub struct EmittedFile {
    pub path: PathBuf,
    pub syntax: Vec<SwiftSyntax>,
}

/// Emits every file intention that still owns declarations.
pub fn emit_graph(graph: &IntentionGraph) -> Vec<EmittedFile> {
    let mut out = Vec::new();
    for &file_id in graph.files() {
        let Some(file) = graph.file(file_id) else {
            continue;
        };
        if file.types.is_empty() && file.globals.is_empty() {
            continue;
        }
        let mut syntax = Vec::new();
        for import in framework_imports(&file.imports) {
            syntax.push(SwiftSyntax::Line(format!("import {import}")));
        }
        if !syntax.is_empty() {
            syntax.push(SwiftSyntax::Blank);
        }
        for &global in &file.globals {
            match &graph.intention(global).kind {
                IntentionKind::GlobalVariable(g) => {
                    let keyword = if g.storage.is_constant { "let" } else { "var" };
                    let mut line = format!("{keyword} {}: {}", g.name, g.storage.ty);
                    if let Some(init) = &g.initial_value {
                        line.push_str(&format!(" = {}", expression_text(init)));
                    }
                    syntax.push(SwiftSyntax::Line(line));
                }
                IntentionKind::Method(m) => {
                    syntax.push(function_syntax(m.kind, &m.signature, m.body.as_ref().map(|b| &b.statements)));
                    syntax.push(SwiftSyntax::Blank);
                }
                _ => {}
            }
        }
        for &type_id in &file.types {
            syntax.push(type_syntax(graph, type_id));
            syntax.push(SwiftSyntax::Blank);
        }
        while matches!(syntax.last(), Some(SwiftSyntax::Blank)) {
            syntax.pop();
        }
        out.push(EmittedFile {
            path: PathBuf::from(swift_path(&file.path)),
            syntax,
        });
    }
    out
}

fn swift_path(original: &str) -> String {
    match original.rsplit_once('.') {
        Some((stem, _ext)) => format!("{stem}.swift"),
        None => format!("{original}.swift"),
    }
}

/// `<Foundation/Foundation.h>` style imports become module imports; local
/// header imports vanish (the translated sources share a module).
fn framework_imports(imports: &[String]) -> Vec<String> {
    let mut seen = Vec::new();
    for import in imports {
        if let Some((framework, _)) = import.split_once('/') {
            if !seen.contains(&framework.to_string()) {
                seen.push(framework.to_string());
            }
        }
    }
    seen
}

fn type_syntax(graph: &IntentionGraph, type_id: IntentionId) -> SwiftSyntax {
    let Some(ty) = graph.type_intention(type_id) else {
        return SwiftSyntax::Blank;
    };
    let keyword = match ty.kind {
        TypeKind::Class => "class",
        TypeKind::Struct => "struct",
        TypeKind::Enum => "enum",
        TypeKind::Protocol => "protocol",
        TypeKind::Extension => "extension",
    };
    let mut inherits: Vec<String> = Vec::new();
    if let Some(supertype) = &ty.supertype {
        inherits.push(supertype.clone());
    }
    for &conformance in &ty.conformances {
        if let Some(c) = graph.conformance(conformance) {
            inherits.push(c.protocol_name.clone());
        }
    }
    let mut header = format!("{} {}", keyword, ty.name);
    if !inherits.is_empty() {
        header.push_str(&format!(": {}", inherits.join(", ")));
    }

    let is_protocol = ty.kind == TypeKind::Protocol;
    let mut children = Vec::new();
    for &property_id in &ty.properties {
        if let Some(property) = graph.property(property_id) {
            children.push(property_syntax(property, is_protocol));
        }
    }
    if !ty.properties.is_empty() && !ty.methods.is_empty() {
        children.push(SwiftSyntax::Blank);
    }
    for &method_id in &ty.methods {
        if let Some(method) = graph.method(method_id) {
            let body = if is_protocol {
                None
            } else {
                Some(
                    method
                        .body
                        .as_ref()
                        .map(|b| &b.statements)
                        .cloned()
                        .unwrap_or_default(),
                )
            };
            children.push(match body {
                None => SwiftSyntax::Line(function_header(method.kind, &method.signature)),
                Some(body) => function_syntax(method.kind, &method.signature, Some(&body)),
            });
            children.push(SwiftSyntax::Blank);
        }
    }
    while matches!(children.last(), Some(SwiftSyntax::Blank)) {
        children.pop();
    }
    SwiftSyntax::block(header, children)
}

fn property_syntax(property: &PropertyIntention, is_protocol: bool) -> SwiftSyntax {
    let ownership = match property.storage.ownership {
        Ownership::Weak => "weak ",
        Ownership::Unowned => "unowned ",
        Ownership::Strong => "",
    };
    let declaration = format!("{}: {}", property.name, property.storage.ty);
    match &property.mode {
        PropertyMode::Field => {
            if is_protocol {
                let accessors = if property.is_readonly() {
                    "{ get }"
                } else {
                    "{ get set }"
                };
                return SwiftSyntax::Line(format!("var {declaration} {accessors}"));
            }
            let keyword = if property.storage.is_constant {
                "let"
            } else {
                "var"
            };
            let mut line = format!("{ownership}{keyword} {declaration}");
            if let Some(init) = &property.initial_value {
                line.push_str(&format!(" = {}", expression_text(init)));
            }
            SwiftSyntax::Line(line)
        }
        PropertyMode::Computed { getter } => {
            if getter.statements.is_empty() {
                return SwiftSyntax::Line(format!("var {declaration} {{ get }}"));
            }
            SwiftSyntax::block(format!("var {declaration}"), block_syntax(&getter.statements))
        }
        PropertyMode::Accessors { getter, setter } => {
            let set_header = if setter.value_name == "newValue" {
                "set".to_string()
            } else {
                format!("set({})", setter.value_name)
            };
            SwiftSyntax::block(
                format!("var {declaration}"),
                vec![
                    SwiftSyntax::block("get", block_syntax(&getter.statements)),
                    SwiftSyntax::block(set_header, block_syntax(&setter.body.statements)),
                ],
            )
        }
    }
}

fn function_header(kind: MethodKind, signature: &FunctionSignature) -> String {
    let mut header = String::new();
    if signature.is_static {
        header.push_str("static ");
    }
    let params = signature
        .parameters
        .iter()
        .map(|p| {
            let label = match &p.label {
                None => "_ ".to_string(),
                Some(label) if *label == p.name => String::new(),
                Some(label) => format!("{label} "),
            };
            format!("{label}{}: {}", p.name, p.ty)
        })
        .collect::<Vec<_>>()
        .join(", ");
    match kind {
        MethodKind::Initializer => header.push_str(&format!("init({params})")),
        MethodKind::Method | MethodKind::GlobalFunction => {
            header.push_str(&format!("func {}({params})", signature.name));
            if signature.return_type != SwiftType::Void {
                header.push_str(&format!(" -> {}", signature.return_type));
            }
        }
    }
    header
}

fn function_syntax(
    kind: MethodKind,
    signature: &FunctionSignature,
    body: Option<&CompoundStatement>,
) -> SwiftSyntax {
    let children = body.map(block_syntax).unwrap_or_default();
    SwiftSyntax::block(function_header(kind, signature), children)
}

fn block_syntax(block: &CompoundStatement) -> Vec<SwiftSyntax> {
    let mut out = Vec::new();
    for stmt in &block.statements {
        out.extend(statement_syntax(stmt));
    }
    out
}

fn statement_syntax(stmt: &Statement) -> Vec<SwiftSyntax> {
    let mut out: Vec<SwiftSyntax> = stmt
        .leading_comments
        .iter()
        .map(|c| SwiftSyntax::Line(format!("// {c}")))
        .collect();
    let label_prefix = stmt
        .label
        .as_ref()
        .map(|l| format!("{l}: "))
        .unwrap_or_default();
    match &stmt.kind {
        StatementKind::Expressions(exprs) => {
            for e in exprs {
                out.push(SwiftSyntax::Line(expression_text(e)));
            }
        }
        StatementKind::VariableDeclarations(decls) => {
            for d in decls {
                let ownership = match d.ownership {
                    Ownership::Weak => "weak ",
                    Ownership::Unowned => "unowned ",
                    Ownership::Strong => "",
                };
                let keyword = if d.is_constant { "let" } else { "var" };
                let mut line = format!("{ownership}{keyword} {}", d.name);
                if let Some(ty) = &d.ty {
                    line.push_str(&format!(": {ty}"));
                }
                if let Some(init) = &d.initializer {
                    line.push_str(&format!(" = {}", expression_text(init)));
                }
                out.push(SwiftSyntax::Line(line));
            }
        }
        StatementKind::If(s) => {
            out.push(SwiftSyntax::block(
                format!("{label_prefix}if {}", expression_text(&s.condition)),
                block_syntax(&s.body),
            ));
            if let Some(else_body) = &s.else_body {
                out.push(SwiftSyntax::block("else", block_syntax(else_body)));
            }
        }
        StatementKind::Switch(s) => {
            let mut children = Vec::new();
            for case in &s.cases {
                let patterns = case
                    .patterns
                    .iter()
                    .map(expression_text)
                    .collect::<Vec<_>>()
                    .join(", ");
                children.push(SwiftSyntax::Labeled {
                    label: format!("case {patterns}:"),
                    children: block_syntax(&case.body),
                });
            }
            children.push(SwiftSyntax::Labeled {
                label: "default:".to_string(),
                children: block_syntax(&s.default),
            });
            out.push(SwiftSyntax::block(
                format!("{label_prefix}switch {}", expression_text(&s.subject)),
                children,
            ));
        }
        StatementKind::While(s) => {
            out.push(SwiftSyntax::block(
                format!("{label_prefix}while {}", expression_text(&s.condition)),
                block_syntax(&s.body),
            ));
        }
        StatementKind::RepeatWhile(s) => {
            out.push(SwiftSyntax::Block {
                header: format!("{label_prefix}repeat"),
                children: block_syntax(&s.body),
                trailer: Some(format!("while {}", expression_text(&s.condition))),
            });
        }
        StatementKind::ForIn(s) => {
            out.push(SwiftSyntax::block(
                format!(
                    "{label_prefix}for {} in {}",
                    s.binding,
                    expression_text(&s.sequence)
                ),
                block_syntax(&s.body),
            ));
        }
        StatementKind::Do(s) => {
            out.push(SwiftSyntax::block("do", block_syntax(&s.body)));
            for catch in &s.catch_blocks {
                let header = match &catch.binding {
                    Some(binding) => format!("catch let {binding}"),
                    None => "catch".to_string(),
                };
                out.push(SwiftSyntax::block(header, block_syntax(&catch.body)));
            }
        }
        StatementKind::Defer(body) => {
            out.push(SwiftSyntax::block("defer", block_syntax(body)));
        }
        StatementKind::Throw(e) => {
            out.push(SwiftSyntax::Line(format!("throw {}", expression_text(e))));
        }
        StatementKind::Break => out.push(SwiftSyntax::Line(match &stmt.label {
            Some(label) => format!("break {label}"),
            None => "break".to_string(),
        })),
        StatementKind::Continue => out.push(SwiftSyntax::Line(match &stmt.label {
            Some(label) => format!("continue {label}"),
            None => "continue".to_string(),
        })),
        StatementKind::Fallthrough => out.push(SwiftSyntax::Line("fallthrough".to_string())),
        StatementKind::Return(value) => out.push(SwiftSyntax::Line(match value {
            Some(e) => format!("return {}", expression_text(e)),
            None => "return".to_string(),
        })),
        StatementKind::Compound(body) => {
            // Free blocks are not legal Swift; a surviving compound renders
            // as a do block.
            out.push(SwiftSyntax::block("do", block_syntax(body)));
        }
        StatementKind::LocalFunction(f) => {
            let params = f
                .parameters
                .iter()
                .map(|p| format!("{}: {}", p.name, p.ty))
                .collect::<Vec<_>>()
                .join(", ");
            let mut header = format!("func {}({params})", f.name);
            if f.return_type != SwiftType::Void {
                header.push_str(&format!(" -> {}", f.return_type));
            }
            out.push(SwiftSyntax::block(header, block_syntax(&f.body)));
        }
        StatementKind::Unknown(unknown) => {
            out.push(SwiftSyntax::Comment(unknown.source_text.clone()));
        }
    }
    if let (Some(comment), Some(SwiftSyntax::Line(line))) =
        (&stmt.trailing_comment, out.last_mut())
    {
        line.push_str(&format!(" // {comment}"));
    }
    out
}

pub fn expression_text(expr: &Expression) -> String {
    match &expr.kind {
        ExpressionKind::Constant(c) => constant_text(c),
        ExpressionKind::Identifier(ident) => ident.name.clone(),
        ExpressionKind::Binary { lhs, op, rhs } => match op {
            BinaryOperator::OpenRange | BinaryOperator::ClosedRange => format!(
                "{}{}{}",
                expression_text(lhs),
                op.token(),
                expression_text(rhs)
            ),
            _ => format!(
                "{} {} {}",
                expression_text(lhs),
                op.token(),
                expression_text(rhs)
            ),
        },
        ExpressionKind::Assignment { target, op, value } => format!(
            "{} {} {}",
            expression_text(target),
            AssignmentOperator::token(*op),
            expression_text(value)
        ),
        ExpressionKind::Call { callee, arguments } => {
            // A lone closure argument renders as a trailing closure.
            if let [argument] = arguments.as_slice() {
                if argument.label.is_none() {
                    if let ExpressionKind::Closure { body, .. } = &argument.value.kind {
                        return format!(
                            "{} {{ {} }}",
                            expression_text(callee),
                            inline_statements(body)
                        );
                    }
                }
            }
            let args = arguments
                .iter()
                .map(|a| match &a.label {
                    Some(label) => format!("{label}: {}", expression_text(&a.value)),
                    None => expression_text(&a.value),
                })
                .collect::<Vec<_>>()
                .join(", ");
            format!("{}({args})", expression_text(callee))
        }
        ExpressionKind::Subscript { base, index } => {
            format!("{}[{}]", expression_text(base), expression_text(index))
        }
        ExpressionKind::Member { base, name } => {
            format!("{}.{}", expression_text(base), name)
        }
        ExpressionKind::Unary { op, operand } => {
            format!("{}{}", op.token(), expression_text(operand))
        }
        ExpressionKind::Cast { operand, target } => {
            let bare = target.dropping_nullability();
            match &bare {
                SwiftType::Nominal(name)
                    if matches!(
                        name.as_str(),
                        "Int" | "UInt" | "Double" | "Float" | "CGFloat" | "CChar" | "UInt8"
                    ) =>
                {
                    format!("{}({})", name, expression_text(operand))
                }
                _ => format!("({} as? {})", expression_text(operand), bare),
            }
        }
        ExpressionKind::Ternary {
            condition,
            if_true,
            if_false,
        } => format!(
            "{} ? {} : {}",
            expression_text(condition),
            expression_text(if_true),
            expression_text(if_false)
        ),
        ExpressionKind::Closure {
            parameters, body, ..
        } => {
            if parameters.is_empty() {
                format!("{{ {} }}", inline_statements(body))
            } else {
                let params = parameters
                    .iter()
                    .map(|p| p.name.clone())
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{{ {params} in {} }}", inline_statements(body))
            }
        }
        ExpressionKind::Parens(inner) => format!("({})", expression_text(inner)),
    }
}

/// Renders a block's statements on one line, for closure literals.
fn inline_statements(body: &CompoundStatement) -> String {
    let mut parts = Vec::new();
    for stmt in &body.statements {
        for node in statement_syntax(stmt) {
            flatten_inline(&node, &mut parts);
        }
    }
    parts.join("; ")
}

fn flatten_inline(node: &SwiftSyntax, parts: &mut Vec<String>) {
    match node {
        SwiftSyntax::Line(line) => parts.push(line.clone()),
        SwiftSyntax::Comment(text) => parts.push(format!("/* {text} */")),
        SwiftSyntax::Block {
            header,
            children,
            trailer,
        } => {
            let mut inner = Vec::new();
            for child in children {
                flatten_inline(child, &mut inner);
            }
            let mut rendered = format!("{header} {{ {} }}", inner.join("; "));
            if let Some(trailer) = trailer {
                rendered.push_str(&format!(" {trailer}"));
            }
            parts.push(rendered);
        }
        SwiftSyntax::Labeled { label, children } => {
            let mut inner = Vec::new();
            for child in children {
                flatten_inline(child, &mut inner);
            }
            parts.push(format!("{label} {}", inner.join("; ")));
        }
        SwiftSyntax::Blank => {}
    }
}

fn constant_text(constant: &Constant) -> String {
    match constant {
        Constant::Int(v) => v.to_string(),
        Constant::Float(v) => {
            if v.fract() == 0.0 {
                format!("{v:.1}")
            } else {
                v.to_string()
            }
        }
        Constant::Bool(true) => "true".to_string(),
        Constant::Bool(false) => "false".to_string(),
        Constant::String(s) => format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
        Constant::Nil => "nil".to_string(),
    }
}

/// Renders emitted syntax to text with four-space indentation. Kept beside
/// the adapter so tools and tests share one renderer; the CLI calls this.
pub fn render(syntax: &[SwiftSyntax]) -> String {
    let mut out = String::new();
    for node in syntax {
        render_node(node, 0, &mut out);
    }
    out
}

fn render_node(node: &SwiftSyntax, depth: usize, out: &mut String) {
    let indent = "    ".repeat(depth);
    match node {
        SwiftSyntax::Line(line) => {
            out.push_str(&indent);
            out.push_str(line);
            out.push('\n');
        }
        SwiftSyntax::Comment(text) => {
            out.push_str(&indent);
            out.push_str("/*\n");
            for line in text.lines() {
                out.push_str(&indent);
                out.push_str(line);
                out.push('\n');
            }
            out.push_str(&indent);
            out.push_str("*/\n");
        }
        SwiftSyntax::Block {
            header,
            children,
            trailer,
        } => {
            out.push_str(&indent);
            if header.is_empty() {
                out.push('{');
            } else {
                out.push_str(header);
                out.push_str(" {");
            }
            out.push('\n');
            for child in children {
                render_node(child, depth + 1, out);
            }
            out.push_str(&indent);
            out.push('}');
            if let Some(trailer) = trailer {
                out.push(' ');
                out.push_str(trailer);
            }
            out.push('\n');
        }
        SwiftSyntax::Labeled { label, children } => {
            out.push_str(&indent);
            out.push_str(label);
            out.push('\n');
            for child in children {
                render_node(child, depth + 1, out);
            }
        }
        SwiftSyntax::Blank => out.push('\n'),
    }
}
