//! Statement reader: Objective-C statement contexts to Swift statements.
//!
//! The reader is total: every context produces some statement, with
//! `unknown` as the fallback. No partial statement is ever produced; a
//! single untranslatable child degrades the whole statement.

use crate::context::{ParseContext, Rule};
use crate::lowering::{expr::read_expression, LoweringContext};
use crate::typemap;
use ir::{
    AssignmentOperator, BinaryOperator, CompoundStatement, Constant, DoStatement, Expression,
    ExpressionKind, ForInStatement, IfStatement, RepeatWhileStatement, Statement, StatementKind,
    SwitchCase, SwitchStatement, VariableDeclaration, WhileStatement,
};

/// Reads a compound context, flattening any directly nested compound block
/// into the enclosing statement list.
pub fn read_compound(ctx: &ParseContext, lc: &LoweringContext<'_>) -> CompoundStatement {
    let mut statements = Vec::new();
    for child in &ctx.children {
        let stmt = read_statement(child, lc);
        match stmt.kind {
            StatementKind::Compound(inner) if stmt.label.is_none() => {
                statements.extend(inner.statements);
            }
            _ => statements.push(stmt),
        }
    }
    CompoundStatement::new(statements)
}

/// Reads a single statement context. Never fails.
pub fn read_statement(ctx: &ParseContext, lc: &LoweringContext<'_>) -> Statement {
    match ctx.rule {
        Rule::CompoundStatement => {
            Statement::new(StatementKind::Compound(read_compound(ctx, lc)))
        }
        Rule::ExpressionStatement => match ctx.child_at(0).and_then(|c| read_expression(c, lc)) {
            Some(expr) => Statement::expression(expr),
            None => unknown(ctx),
        },
        Rule::VariableDeclaration => read_variable_declaration(ctx, lc),
        Rule::IfStatement => read_if(ctx, lc),
        Rule::SwitchStatement => read_switch(ctx, lc),
        Rule::WhileStatement => read_while(ctx, lc),
        Rule::DoWhileStatement => read_do_while(ctx, lc),
        Rule::ForStatement => read_for(ctx, lc),
        Rule::ForInStatement => read_for_in(ctx, lc),
        Rule::ReturnStatement => {
            if ctx.children.is_empty() {
                return Statement::return_stmt(None);
            }
            match read_expression(&ctx.children[0], lc) {
                Some(expr) => Statement::return_stmt(Some(expr)),
                None => unknown(ctx),
            }
        }
        Rule::BreakStatement => Statement::break_stmt(),
        Rule::ContinueStatement => Statement::continue_stmt(),
        Rule::SynchronizedStatement => read_synchronized(ctx, lc),
        Rule::AutoreleasepoolStatement => read_autoreleasepool(ctx, lc),
        _ => unknown(ctx),
    }
}

fn unknown(ctx: &ParseContext) -> Statement {
    tracing::debug!(rule = ?ctx.rule, line = ctx.range.line, "statement degraded to unknown");
    Statement::unknown(ctx.text.trim(), ctx.range.clone())
}

/// Reads a child that is syntactically a statement into a block, splicing
/// compound children instead of nesting them.
fn read_block(ctx: &ParseContext, lc: &LoweringContext<'_>) -> CompoundStatement {
    if ctx.rule == Rule::CompoundStatement {
        read_compound(ctx, lc)
    } else {
        CompoundStatement::new(vec![read_statement(ctx, lc)])
    }
}

fn read_variable_declaration(ctx: &ParseContext, lc: &LoweringContext<'_>) -> Statement {
    let Some(type_ctx) = ctx.child(Rule::TypeName) else {
        return unknown(ctx);
    };
    let spelled = type_ctx.token_text();
    let ty = typemap::map_spelled_type(spelled, lc.mapper);
    let ownership = typemap::ownership_of(spelled);
    let is_constant = typemap::is_const(spelled);
    let mut declarations = Vec::new();
    for declarator in ctx.children_of(Rule::Declarator) {
        let initializer = match declarator.child_at(0) {
            Some(init) => match read_expression(init, lc) {
                Some(expr) => Some(expr),
                None => return unknown(ctx),
            },
            None => None,
        };
        declarations.push(VariableDeclaration {
            name: declarator.token_text().to_string(),
            ty: Some(ty.clone()),
            is_constant,
            ownership,
            initializer,
        });
    }
    if declarations.is_empty() {
        return unknown(ctx);
    }
    Statement::new(StatementKind::VariableDeclarations(declarations))
}

fn read_if(ctx: &ParseContext, lc: &LoweringContext<'_>) -> Statement {
    let Some(condition) = ctx.child_at(0).and_then(|c| read_expression(c, lc)) else {
        return unknown(ctx);
    };
    let Some(then_ctx) = ctx.child_at(1) else {
        return unknown(ctx);
    };
    let body = read_block(then_ctx, lc);
    let else_body = ctx.child_at(2).map(|c| read_block(c, lc));
    Statement::new(StatementKind::If(IfStatement {
        condition,
        body,
        else_body,
    }))
}

fn read_while(ctx: &ParseContext, lc: &LoweringContext<'_>) -> Statement {
    let Some(condition) = ctx.child_at(0).and_then(|c| read_expression(c, lc)) else {
        return unknown(ctx);
    };
    let Some(body_ctx) = ctx.child_at(1) else {
        return unknown(ctx);
    };
    Statement::new(StatementKind::While(WhileStatement {
        condition,
        body: read_block(body_ctx, lc),
    }))
}

fn read_do_while(ctx: &ParseContext, lc: &LoweringContext<'_>) -> Statement {
    let Some(body_ctx) = ctx.child_at(0) else {
        return unknown(ctx);
    };
    let Some(condition) = ctx.child_at(1).and_then(|c| read_expression(c, lc)) else {
        return unknown(ctx);
    };
    Statement::new(StatementKind::RepeatWhile(RepeatWhileStatement {
        body: read_block(body_ctx, lc),
        condition,
    }))
}

fn read_for_in(ctx: &ParseContext, lc: &LoweringContext<'_>) -> Statement {
    let Some(binding) = ctx.child(Rule::Identifier) else {
        return unknown(ctx);
    };
    let Some(sequence) = ctx.child_at(2).and_then(|c| read_expression(c, lc)) else {
        return unknown(ctx);
    };
    let Some(body_ctx) = ctx.child_at(3) else {
        return unknown(ctx);
    };
    Statement::new(StatementKind::ForIn(ForInStatement {
        binding: binding.token_text().to_string(),
        sequence,
        body: read_block(body_ctx, lc),
    }))
}

/// Switch lowering. Case bodies drop a trailing `break` (Swift cases do not
/// fall through); a case that runs into the next one in C gains an explicit
/// `fallthrough`; and a default branch is always present, synthesised as a
/// lone `break` when the source has none.
fn read_switch(ctx: &ParseContext, lc: &LoweringContext<'_>) -> Statement {
    let Some(subject) = ctx.child_at(0).and_then(|c| read_expression(c, lc)) else {
        return unknown(ctx);
    };
    let sections: Vec<&ParseContext> = ctx.children_of(Rule::SwitchSection).collect();
    let mut cases = Vec::new();
    let mut default = None;
    for (index, section) in sections.iter().enumerate() {
        let mut patterns = Vec::new();
        let mut is_default = false;
        let mut body_statements = Vec::new();
        for child in &section.children {
            match child.rule {
                Rule::CaseLabel => {
                    let Some(pattern) =
                        child.child_at(0).and_then(|c| read_expression(c, lc))
                    else {
                        return unknown(ctx);
                    };
                    patterns.push(pattern);
                }
                Rule::DefaultLabel => is_default = true,
                _ => {
                    let stmt = read_statement(child, lc);
                    match stmt.kind {
                        StatementKind::Compound(inner) if stmt.label.is_none() => {
                            body_statements.extend(inner.statements)
                        }
                        _ => body_statements.push(stmt),
                    }
                }
            }
        }
        // Trailing break is implicit in Swift; keep it only when it is the
        // whole body.
        if body_statements.len() > 1
            && matches!(body_statements.last().map(|s| &s.kind), Some(StatementKind::Break))
        {
            body_statements.pop();
        }
        let falls_into_next = index + 1 < sections.len()
            && !body_statements.is_empty()
            && !body_statements
                .last()
                .map(Statement::is_terminal)
                .unwrap_or(false);
        if falls_into_next {
            body_statements.push(Statement::new(StatementKind::Fallthrough));
        }
        if is_default {
            if body_statements.is_empty() {
                body_statements.push(Statement::break_stmt());
            }
            default = Some(CompoundStatement::new(body_statements));
        } else {
            if body_statements.is_empty() {
                body_statements.push(Statement::break_stmt());
            }
            cases.push(SwitchCase {
                patterns,
                body: CompoundStatement::new(body_statements),
            });
        }
    }
    let default =
        default.unwrap_or_else(|| CompoundStatement::new(vec![Statement::break_stmt()]));
    Statement::new(StatementKind::Switch(SwitchStatement {
        subject,
        cases,
        default,
    }))
}

/// `@synchronized(e) S`: the lock handle is captured once, `objc_sync_enter`
/// runs before the `defer`, so `objc_sync_exit` runs on every non-abort
/// exit.
fn read_synchronized(ctx: &ParseContext, lc: &LoweringContext<'_>) -> Statement {
    let Some(target) = ctx.child_at(0).and_then(|c| read_expression(c, lc)) else {
        return unknown(ctx);
    };
    let Some(body_ctx) = ctx.child_at(1) else {
        return unknown(ctx);
    };
    let lock = "_lockTarget";
    let mut statements = vec![
        Statement::new(StatementKind::VariableDeclarations(vec![
            VariableDeclaration {
                name: lock.to_string(),
                ty: None,
                is_constant: true,
                ownership: ir::Ownership::Strong,
                initializer: Some(target),
            },
        ])),
        Statement::expression(Expression::call(
            Expression::identifier("objc_sync_enter"),
            vec![ir::Argument::unlabeled(Expression::identifier(lock))],
        )),
        Statement::new(StatementKind::Defer(CompoundStatement::new(vec![
            Statement::expression(Expression::call(
                Expression::identifier("objc_sync_exit"),
                vec![ir::Argument::unlabeled(Expression::identifier(lock))],
            )),
        ]))),
    ];
    statements.extend(read_block(body_ctx, lc).statements);
    Statement::new(StatementKind::Do(DoStatement {
        body: CompoundStatement::new(statements),
        catch_blocks: Vec::new(),
    }))
}

/// `@autoreleasepool S` becomes `autoreleasepool { S }`.
fn read_autoreleasepool(ctx: &ParseContext, lc: &LoweringContext<'_>) -> Statement {
    let Some(body_ctx) = ctx.child_at(0) else {
        return unknown(ctx);
    };
    let body = read_block(body_ctx, lc);
    let closure = Expression::new(ExpressionKind::Closure {
        parameters: Vec::new(),
        return_type: ir::SwiftType::Void,
        body,
    });
    Statement::expression(Expression::call(
        Expression::identifier("autoreleasepool"),
        vec![ir::Argument::unlabeled(closure)],
    ))
}

// -- C-style for ------------------------------------------------------------

/// The shape a counted loop must have to become a Swift range `for`.
struct CountedLoop {
    variable: String,
    start: Expression,
    end: Expression,
    inclusive: bool,
}

fn read_for(ctx: &ParseContext, lc: &LoweringContext<'_>) -> Statement {
    let init = ctx.child(Rule::ForInit);
    let condition = ctx.child(Rule::ForCondition);
    let step = ctx.child(Rule::ForStep);
    let Some(body_ctx) = ctx.child_at(3) else {
        return unknown(ctx);
    };
    let body = read_block(body_ctx, lc);

    if let Some(counted) = recognise_counted_loop(init, condition, step, &body, lc) {
        let op = if counted.inclusive {
            BinaryOperator::ClosedRange
        } else {
            BinaryOperator::OpenRange
        };
        return Statement::new(StatementKind::ForIn(ForInStatement {
            binding: counted.variable,
            sequence: Expression::binary(counted.start, op, counted.end),
            body,
        }));
    }

    general_for_lowering(init, condition, step, body, lc)
}

/// Recognises `for (int v = a; v < b; v += 1) body` with `b` an integer
/// literal, `≤` selecting the closed range, and `v` never assigned inside
/// the body (checked across every expression position, nested blocks
/// included). Bodies containing unknown statements are rejected, since an
/// untranslated region could hide an assignment.
fn recognise_counted_loop(
    init: Option<&ParseContext>,
    condition: Option<&ParseContext>,
    step: Option<&ParseContext>,
    body: &CompoundStatement,
    lc: &LoweringContext<'_>,
) -> Option<CountedLoop> {
    // init: a single integer variable declaration `v = a`.
    let init_decl = init?.child_at(0)?;
    if init_decl.rule != Rule::VariableDeclaration {
        return None;
    }
    let StatementKind::VariableDeclarations(decls) =
        read_statement(init_decl, lc).kind
    else {
        return None;
    };
    let [decl] = decls.as_slice() else {
        return None;
    };
    if !matches!(
        decl.ty.as_ref()?,
        ir::SwiftType::Nominal(name) if name == "Int" || name == "UInt"
    ) {
        return None;
    }
    let variable = decl.name.clone();
    let start = decl.initializer.clone()?;

    // cond: `v < b` or `v <= b` with `b` an integer literal.
    let cond = read_expression(condition?.child_at(0)?, lc)?;
    let ExpressionKind::Binary { lhs, op, rhs } = cond.kind else {
        return None;
    };
    if lhs.as_identifier() != Some(variable.as_str()) {
        return None;
    }
    let inclusive = match op {
        BinaryOperator::Less => false,
        BinaryOperator::LessOrEqual => true,
        _ => return None,
    };
    if !matches!(rhs.kind, ExpressionKind::Constant(Constant::Int(_))) {
        return None;
    }

    // step: `v += 1` (also the lowered form of `v++`/`++v`).
    let step_expr = read_expression(step?.child_at(0)?, lc)?;
    let ExpressionKind::Assignment { target, op, value } = step_expr.kind else {
        return None;
    };
    if target.as_identifier() != Some(variable.as_str())
        || op != AssignmentOperator::AddAssign
        || !matches!(value.kind, ExpressionKind::Constant(Constant::Int(1)))
    {
        return None;
    }

    if body_assigns_variable(body, &variable) || body_has_unknown(body) {
        return None;
    }

    Some(CountedLoop {
        variable,
        start,
        end: *rhs,
        inclusive,
    })
}

fn body_assigns_variable(body: &CompoundStatement, variable: &str) -> bool {
    let mut assigned = false;
    body.for_each_expression(&mut |expr| {
        if let ExpressionKind::Assignment { target, .. } = &expr.kind {
            if target.as_identifier() == Some(variable) {
                assigned = true;
            }
        }
    });
    assigned
}

fn body_has_unknown(body: &CompoundStatement) -> bool {
    fn stmt_has_unknown(stmt: &Statement) -> bool {
        match &stmt.kind {
            StatementKind::Unknown(_) => true,
            StatementKind::Compound(inner) | StatementKind::Defer(inner) => {
                inner.statements.iter().any(stmt_has_unknown)
            }
            StatementKind::If(s) => {
                s.body.statements.iter().any(stmt_has_unknown)
                    || s.else_body
                        .as_ref()
                        .is_some_and(|b| b.statements.iter().any(stmt_has_unknown))
            }
            StatementKind::Switch(s) => {
                s.cases
                    .iter()
                    .any(|c| c.body.statements.iter().any(stmt_has_unknown))
                    || s.default.statements.iter().any(stmt_has_unknown)
            }
            StatementKind::While(s) => s.body.statements.iter().any(stmt_has_unknown),
            StatementKind::RepeatWhile(s) => s.body.statements.iter().any(stmt_has_unknown),
            StatementKind::ForIn(s) => s.body.statements.iter().any(stmt_has_unknown),
            StatementKind::Do(s) => {
                s.body.statements.iter().any(stmt_has_unknown)
                    || s.catch_blocks
                        .iter()
                        .any(|c| c.body.statements.iter().any(stmt_has_unknown))
            }
            StatementKind::LocalFunction(f) => f.body.statements.iter().any(stmt_has_unknown),
            _ => false,
        }
    }
    body.statements.iter().any(stmt_has_unknown)
}

/// The general lowering: `do { init; while cond { defer { step }; body } }`.
/// The `defer` keeps the step running on every exit, `continue` included.
/// A missing initializer drops the wrapper block; a missing condition
/// defaults to `true`, so `for(;;)` reads as `while true`.
fn general_for_lowering(
    init: Option<&ParseContext>,
    condition: Option<&ParseContext>,
    step: Option<&ParseContext>,
    body: CompoundStatement,
    lc: &LoweringContext<'_>,
) -> Statement {
    let condition = condition
        .and_then(|c| c.child_at(0))
        .and_then(|c| read_expression(c, lc))
        .unwrap_or_else(|| Expression::constant(Constant::Bool(true)));

    let mut loop_body = Vec::new();
    if let Some(step_expr) = step
        .and_then(|c| c.child_at(0))
        .and_then(|c| read_expression(c, lc))
    {
        loop_body.push(Statement::new(StatementKind::Defer(
            CompoundStatement::new(vec![Statement::expression(step_expr)]),
        )));
    }
    loop_body.extend(body.statements);

    let while_stmt = Statement::new(StatementKind::While(WhileStatement {
        condition,
        body: CompoundStatement::new(loop_body),
    }));

    let init_stmt = init.and_then(|c| c.child_at(0)).map(|c| read_statement(c, lc));
    match init_stmt {
        Some(init_stmt) => Statement::new(StatementKind::Do(DoStatement {
            body: CompoundStatement::new(vec![init_stmt, while_stmt]),
            catch_blocks: Vec::new(),
        })),
        None => while_stmt,
    }
}
