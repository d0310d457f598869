//! Expression reader: Objective-C expression contexts to Swift expressions.
//!
//! Returns `None` when no translation rule applies; the statement reader
//! then degrades the whole statement to `unknown`, so no partial tree is
//! ever attached.

use crate::context::{ParseContext, Rule};
use crate::lowering::LoweringContext;
use crate::typemap;
use ir::{
    Argument, AssignmentOperator, BinaryOperator, ClosureParameter, Constant, Expression,
    SwiftType, UnaryOperator,
};

pub fn read_expression(ctx: &ParseContext, lc: &LoweringContext<'_>) -> Option<Expression> {
    match ctx.rule {
        Rule::Constant => read_constant(ctx.token_text()),
        Rule::StringLiteral => Some(Expression::constant(Constant::String(string_value(
            ctx.token_text(),
        )))),
        Rule::Identifier => Some(Expression::identifier(ctx.token_text())),
        Rule::ParenExpression => {
            let inner = read_expression(ctx.child_at(0)?, lc)?;
            Some(Expression::parens(inner))
        }
        Rule::BinaryExpression => {
            let op = binary_operator(ctx.token_text())?;
            let lhs = read_expression(ctx.child_at(0)?, lc)?;
            let rhs = read_expression(ctx.child_at(1)?, lc)?;
            Some(Expression::binary(lhs, op, rhs))
        }
        Rule::AssignmentExpression => {
            let op = assignment_operator(ctx.token_text())?;
            let target = read_expression(ctx.child_at(0)?, lc)?;
            let value = read_expression(ctx.child_at(1)?, lc)?;
            Some(Expression::assignment(target, op, value))
        }
        Rule::UnaryExpression => read_unary(ctx, lc),
        Rule::CastExpression => {
            let target = typemap::map_spelled_type(
                ctx.child(Rule::TypeName)?.token_text(),
                lc.mapper,
            );
            let operand = read_expression(ctx.child_at(1)?, lc)?;
            Some(Expression::new(ir::ExpressionKind::Cast {
                operand: Box::new(operand),
                target,
            }))
        }
        Rule::TernaryExpression => {
            let condition = read_expression(ctx.child_at(0)?, lc)?;
            let if_true = read_expression(ctx.child_at(1)?, lc)?;
            let if_false = read_expression(ctx.child_at(2)?, lc)?;
            Some(Expression::new(ir::ExpressionKind::Ternary {
                condition: Box::new(condition),
                if_true: Box::new(if_true),
                if_false: Box::new(if_false),
            }))
        }
        Rule::CallExpression => {
            let callee = read_expression(ctx.child_at(0)?, lc)?;
            let mut arguments = Vec::new();
            for child in &ctx.children[1..] {
                arguments.push(Argument::unlabeled(read_expression(child, lc)?));
            }
            Some(Expression::call(callee, arguments))
        }
        Rule::SubscriptExpression => {
            let base = read_expression(ctx.child_at(0)?, lc)?;
            let index = read_expression(ctx.child_at(1)?, lc)?;
            Some(Expression::subscript(base, index))
        }
        Rule::MemberAccess => {
            let base = read_expression(ctx.child_at(0)?, lc)?;
            Some(Expression::member(base, ctx.token_text()))
        }
        Rule::MessageSend => read_message_send(ctx, lc),
        Rule::BlockLiteral => read_block_literal(ctx, lc),
        Rule::SelectorLiteral => Some(Expression::call(
            Expression::identifier("Selector"),
            vec![Argument::unlabeled(Expression::constant(Constant::String(
                ctx.token_text().to_string(),
            )))],
        )),
        _ => None,
    }
}

/// `[receiver piece:a other:b]` reads as `receiver.piece(a, other: b)`;
/// piece-less sends read as nullary calls.
fn read_message_send(ctx: &ParseContext, lc: &LoweringContext<'_>) -> Option<Expression> {
    let receiver = read_expression(ctx.child_at(0)?, lc)?;
    let pieces: Vec<&ParseContext> = ctx.children_of(Rule::MessagePiece).collect();
    let first = pieces.first()?;
    let callee = Expression::member(receiver, first.token_text());
    let mut arguments = Vec::new();
    for (i, piece) in pieces.iter().enumerate() {
        if let Some(arg) = piece.child_at(0) {
            let value = read_expression(arg, lc)?;
            if i == 0 {
                arguments.push(Argument::unlabeled(value));
            } else {
                arguments.push(Argument::labeled(piece.token_text(), value));
            }
        }
    }
    Some(Expression::call(callee, arguments))
}

fn read_block_literal(ctx: &ParseContext, lc: &LoweringContext<'_>) -> Option<Expression> {
    let return_type = ctx
        .child(Rule::TypeName)
        .map(|t| typemap::map_spelled_type(t.token_text(), lc.mapper))
        .unwrap_or(SwiftType::Void);
    let mut parameters = Vec::new();
    for param in ctx.children_of(Rule::ParameterDeclaration) {
        let ty = param
            .child(Rule::TypeName)
            .map(|t| typemap::map_spelled_type(t.token_text(), lc.mapper))
            .unwrap_or_else(SwiftType::any_object);
        parameters.push(ClosureParameter {
            name: param.token_text().to_string(),
            ty,
        });
    }
    let body = ctx.child(Rule::CompoundStatement)?;
    let body = super::stmt::read_compound(body, lc);
    Some(Expression::new(ir::ExpressionKind::Closure {
        parameters,
        return_type,
        body,
    }))
}

/// Prefix and postfix `++`/`--` both compensate to compound assignments;
/// pointer dereference and address-of have no Swift counterpart and bail.
fn read_unary(ctx: &ParseContext, lc: &LoweringContext<'_>) -> Option<Expression> {
    let operand = read_expression(ctx.child_at(0)?, lc)?;
    match ctx.token_text() {
        "!" => Some(Expression::unary(UnaryOperator::Not, operand)),
        "-" => Some(Expression::unary(UnaryOperator::Negate, operand)),
        "~" => Some(Expression::unary(UnaryOperator::BitwiseNot, operand)),
        "++" | "post++" => Some(Expression::assignment(
            operand,
            AssignmentOperator::AddAssign,
            Expression::int(1),
        )),
        "--" | "post--" => Some(Expression::assignment(
            operand,
            AssignmentOperator::SubtractAssign,
            Expression::int(1),
        )),
        _ => None,
    }
}

fn binary_operator(token: &str) -> Option<BinaryOperator> {
    let op = match token {
        "+" => BinaryOperator::Add,
        "-" => BinaryOperator::Subtract,
        "*" => BinaryOperator::Multiply,
        "/" => BinaryOperator::Divide,
        "%" => BinaryOperator::Modulo,
        "==" => BinaryOperator::Equal,
        "!=" => BinaryOperator::NotEqual,
        "<" => BinaryOperator::Less,
        "<=" => BinaryOperator::LessOrEqual,
        ">" => BinaryOperator::Greater,
        ">=" => BinaryOperator::GreaterOrEqual,
        "&&" => BinaryOperator::LogicalAnd,
        "||" => BinaryOperator::LogicalOr,
        "&" => BinaryOperator::BitwiseAnd,
        "|" => BinaryOperator::BitwiseOr,
        "^" => BinaryOperator::BitwiseXor,
        "<<" => BinaryOperator::ShiftLeft,
        ">>" => BinaryOperator::ShiftRight,
        _ => return None,
    };
    Some(op)
}

fn assignment_operator(token: &str) -> Option<AssignmentOperator> {
    let op = match token {
        "=" => AssignmentOperator::Assign,
        "+=" => AssignmentOperator::AddAssign,
        "-=" => AssignmentOperator::SubtractAssign,
        "*=" => AssignmentOperator::MultiplyAssign,
        "/=" => AssignmentOperator::DivideAssign,
        _ => return None,
    };
    Some(op)
}

fn read_constant(text: &str) -> Option<Expression> {
    let constant = match text {
        "YES" | "true" => Constant::Bool(true),
        "NO" | "false" => Constant::Bool(false),
        "nil" | "Nil" | "NULL" => Constant::Nil,
        _ => {
            if text.starts_with('\'') {
                let inner = text.trim_matches('\'');
                let byte = inner.strip_prefix('\\').map_or_else(
                    || inner.chars().next().map(|c| c as i64),
                    |esc| match esc {
                        "n" => Some(b'\n' as i64),
                        "t" => Some(b'\t' as i64),
                        "0" => Some(0),
                        other => other.chars().next().map(|c| c as i64),
                    },
                )?;
                Constant::Int(byte)
            } else if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
                Constant::Int(i64::from_str_radix(hex.trim_end_matches(int_suffix), 16).ok()?)
            } else if text.contains('.') || text.ends_with('f') || text.ends_with('F') {
                Constant::Float(text.trim_end_matches(['f', 'F']).parse().ok()?)
            } else {
                Constant::Int(text.trim_end_matches(int_suffix).parse().ok()?)
            }
        }
    };
    Some(Expression::constant(constant))
}

fn int_suffix(c: char) -> bool {
    matches!(c, 'u' | 'U' | 'l' | 'L')
}

/// Strips the `@"`/`"` framing and resolves the common escapes.
fn string_value(raw: &str) -> String {
    let inner = raw
        .strip_prefix('@')
        .unwrap_or(raw)
        .trim_matches('"');
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('"') => out.push('"'),
                Some('\\') => out.push('\\'),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}
