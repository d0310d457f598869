//! Swift-shaped statement and expression AST.
//!
//! The lowering attaches these trees to method and property bodies inside
//! the intention graph. Both node families are closed enums so that the
//! lowering dispatcher and the CFG builder can match exhaustively. Every
//! expression carries a `resolved_type` slot that stays `None` until the
//! type-inference pass fills it in.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Location of a source fragment within an input file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRange {
    pub file: String,
    pub line: usize,
    pub column: usize,
}

impl SourceRange {
    pub fn new(file: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

/// A Swift type expression as produced by the type mapper.
///
/// `Unspecified` wraps an object type whose nullability the Objective-C
/// source left open; the nullability pass rewrites it to either the plain
/// type or an `Optional` depending on the enclosing nonnull context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwiftType {
    Void,
    Nominal(String),
    Generic(String, Vec<SwiftType>),
    Optional(Box<SwiftType>),
    Unspecified(Box<SwiftType>),
    Array(Box<SwiftType>),
    Dictionary(Box<SwiftType>, Box<SwiftType>),
    Function {
        parameters: Vec<SwiftType>,
        returns: Box<SwiftType>,
    },
}

impl SwiftType {
    pub fn nominal(name: impl Into<String>) -> Self {
        SwiftType::Nominal(name.into())
    }

    pub fn int() -> Self {
        SwiftType::nominal("Int")
    }

    pub fn bool() -> Self {
        SwiftType::nominal("Bool")
    }

    pub fn double() -> Self {
        SwiftType::nominal("Double")
    }

    pub fn string() -> Self {
        SwiftType::nominal("String")
    }

    pub fn any_object() -> Self {
        SwiftType::nominal("AnyObject")
    }

    pub fn optional(inner: SwiftType) -> Self {
        SwiftType::Optional(Box::new(inner))
    }

    pub fn unspecified(inner: SwiftType) -> Self {
        SwiftType::Unspecified(Box::new(inner))
    }

    /// Strips `Optional`/`Unspecified` wrappers at every level, yielding the
    /// shape used when comparing signatures with nullability dropped.
    pub fn dropping_nullability(&self) -> SwiftType {
        match self {
            SwiftType::Optional(inner) | SwiftType::Unspecified(inner) => {
                inner.dropping_nullability()
            }
            SwiftType::Generic(name, args) => SwiftType::Generic(
                name.clone(),
                args.iter().map(SwiftType::dropping_nullability).collect(),
            ),
            SwiftType::Array(inner) => SwiftType::Array(Box::new(inner.dropping_nullability())),
            SwiftType::Dictionary(key, value) => SwiftType::Dictionary(
                Box::new(key.dropping_nullability()),
                Box::new(value.dropping_nullability()),
            ),
            SwiftType::Function {
                parameters,
                returns,
            } => SwiftType::Function {
                parameters: parameters
                    .iter()
                    .map(SwiftType::dropping_nullability)
                    .collect(),
                returns: Box::new(returns.dropping_nullability()),
            },
            other => other.clone(),
        }
    }
}

impl fmt::Display for SwiftType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwiftType::Void => write!(f, "Void"),
            SwiftType::Nominal(name) => write!(f, "{name}"),
            SwiftType::Generic(name, args) => {
                write!(f, "{name}<")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ">")
            }
            SwiftType::Optional(inner) => write!(f, "{inner}?"),
            SwiftType::Unspecified(inner) => write!(f, "{inner}!"),
            SwiftType::Array(inner) => write!(f, "[{inner}]"),
            SwiftType::Dictionary(key, value) => write!(f, "[{key}: {value}]"),
            SwiftType::Function {
                parameters,
                returns,
            } => {
                write!(f, "(")?;
                for (i, p) in parameters.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{p}")?;
                }
                write!(f, ") -> {returns}")
            }
        }
    }
}

/// Literal constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Constant {
    Int(i64),
    Float(f64),
    Bool(bool),
    String(String),
    Nil,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    LogicalAnd,
    LogicalOr,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
    ShiftLeft,
    ShiftRight,
    NilCoalesce,
    /// `a..<b`
    OpenRange,
    /// `a...b`
    ClosedRange,
}

impl BinaryOperator {
    /// `true` for operators whose result is always `Bool`.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOperator::Equal
                | BinaryOperator::NotEqual
                | BinaryOperator::Less
                | BinaryOperator::LessOrEqual
                | BinaryOperator::Greater
                | BinaryOperator::GreaterOrEqual
                | BinaryOperator::LogicalAnd
                | BinaryOperator::LogicalOr
        )
    }

    pub fn token(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "%",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::Less => "<",
            BinaryOperator::LessOrEqual => "<=",
            BinaryOperator::Greater => ">",
            BinaryOperator::GreaterOrEqual => ">=",
            BinaryOperator::LogicalAnd => "&&",
            BinaryOperator::LogicalOr => "||",
            BinaryOperator::BitwiseAnd => "&",
            BinaryOperator::BitwiseOr => "|",
            BinaryOperator::BitwiseXor => "^",
            BinaryOperator::ShiftLeft => "<<",
            BinaryOperator::ShiftRight => ">>",
            BinaryOperator::NilCoalesce => "??",
            BinaryOperator::OpenRange => "..<",
            BinaryOperator::ClosedRange => "...",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignmentOperator {
    Assign,
    AddAssign,
    SubtractAssign,
    MultiplyAssign,
    DivideAssign,
}

impl AssignmentOperator {
    pub fn token(self) -> &'static str {
        match self {
            AssignmentOperator::Assign => "=",
            AssignmentOperator::AddAssign => "+=",
            AssignmentOperator::SubtractAssign => "-=",
            AssignmentOperator::MultiplyAssign => "*=",
            AssignmentOperator::DivideAssign => "/=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOperator {
    Negate,
    Not,
    BitwiseNot,
}

impl UnaryOperator {
    pub fn token(self) -> &'static str {
        match self {
            UnaryOperator::Negate => "-",
            UnaryOperator::Not => "!",
            UnaryOperator::BitwiseNot => "~",
        }
    }
}

/// Where an identifier resolved to, filled in by the resolution pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Definition {
    /// A local variable declared earlier in the body.
    Local { ty: Option<SwiftType> },
    /// A parameter of the enclosing function, by position.
    Parameter { index: usize, ty: SwiftType },
    /// A property of the enclosing type.
    Member { type_name: String, ty: SwiftType },
    /// The name of a known type.
    TypeName,
    /// A global variable or free function.
    Global { ty: Option<SwiftType> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentifierExpression {
    pub name: String,
    /// `None` until the identifier-resolution pass runs.
    pub definition: Option<Definition>,
}

/// A single call argument, optionally labelled (Swift argument labels come
/// from Objective-C selector pieces).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Argument {
    pub label: Option<String>,
    pub value: Expression,
}

impl Argument {
    pub fn unlabeled(value: Expression) -> Self {
        Self { label: None, value }
    }

    pub fn labeled(label: impl Into<String>, value: Expression) -> Self {
        Self {
            label: Some(label.into()),
            value,
        }
    }
}

/// Closure parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosureParameter {
    pub name: String,
    pub ty: SwiftType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExpressionKind {
    Constant(Constant),
    Identifier(IdentifierExpression),
    Binary {
        lhs: Box<Expression>,
        op: BinaryOperator,
        rhs: Box<Expression>,
    },
    Assignment {
        target: Box<Expression>,
        op: AssignmentOperator,
        value: Box<Expression>,
    },
    Call {
        callee: Box<Expression>,
        arguments: Vec<Argument>,
    },
    Subscript {
        base: Box<Expression>,
        index: Box<Expression>,
    },
    Member {
        base: Box<Expression>,
        name: String,
    },
    Unary {
        op: UnaryOperator,
        operand: Box<Expression>,
    },
    Cast {
        operand: Box<Expression>,
        target: SwiftType,
    },
    Ternary {
        condition: Box<Expression>,
        if_true: Box<Expression>,
        if_false: Box<Expression>,
    },
    Closure {
        parameters: Vec<ClosureParameter>,
        return_type: SwiftType,
        body: CompoundStatement,
    },
    Parens(Box<Expression>),
}

/// An expression together with its resolved type, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    pub kind: ExpressionKind,
    /// Filled in by the type-inference pass; `None` at construction.
    pub resolved_type: Option<SwiftType>,
}

impl Expression {
    pub fn new(kind: ExpressionKind) -> Self {
        Self {
            kind,
            resolved_type: None,
        }
    }

    pub fn constant(value: Constant) -> Self {
        Self::new(ExpressionKind::Constant(value))
    }

    pub fn int(value: i64) -> Self {
        Self::constant(Constant::Int(value))
    }

    pub fn identifier(name: impl Into<String>) -> Self {
        Self::new(ExpressionKind::Identifier(IdentifierExpression {
            name: name.into(),
            definition: None,
        }))
    }

    pub fn binary(lhs: Expression, op: BinaryOperator, rhs: Expression) -> Self {
        Self::new(ExpressionKind::Binary {
            lhs: Box::new(lhs),
            op,
            rhs: Box::new(rhs),
        })
    }

    pub fn assignment(target: Expression, op: AssignmentOperator, value: Expression) -> Self {
        Self::new(ExpressionKind::Assignment {
            target: Box::new(target),
            op,
            value: Box::new(value),
        })
    }

    pub fn call(callee: Expression, arguments: Vec<Argument>) -> Self {
        Self::new(ExpressionKind::Call {
            callee: Box::new(callee),
            arguments,
        })
    }

    pub fn member(base: Expression, name: impl Into<String>) -> Self {
        Self::new(ExpressionKind::Member {
            base: Box::new(base),
            name: name.into(),
        })
    }

    pub fn subscript(base: Expression, index: Expression) -> Self {
        Self::new(ExpressionKind::Subscript {
            base: Box::new(base),
            index: Box::new(index),
        })
    }

    pub fn unary(op: UnaryOperator, operand: Expression) -> Self {
        Self::new(ExpressionKind::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    pub fn parens(inner: Expression) -> Self {
        Self::new(ExpressionKind::Parens(Box::new(inner)))
    }

    /// The identifier name if this expression is a bare identifier.
    pub fn as_identifier(&self) -> Option<&str> {
        match &self.kind {
            ExpressionKind::Identifier(ident) => Some(&ident.name),
            _ => None,
        }
    }

    /// Visits this expression and every sub-expression, including the bodies
    /// of closure literals.
    pub fn for_each(&self, f: &mut impl FnMut(&Expression)) {
        f(self);
        match &self.kind {
            ExpressionKind::Constant(_) | ExpressionKind::Identifier(_) => {}
            ExpressionKind::Binary { lhs, rhs, .. } => {
                lhs.for_each(f);
                rhs.for_each(f);
            }
            ExpressionKind::Assignment { target, value, .. } => {
                target.for_each(f);
                value.for_each(f);
            }
            ExpressionKind::Call { callee, arguments } => {
                callee.for_each(f);
                for arg in arguments {
                    arg.value.for_each(f);
                }
            }
            ExpressionKind::Subscript { base, index } => {
                base.for_each(f);
                index.for_each(f);
            }
            ExpressionKind::Member { base, .. } => base.for_each(f),
            ExpressionKind::Unary { operand, .. } => operand.for_each(f),
            ExpressionKind::Cast { operand, .. } => operand.for_each(f),
            ExpressionKind::Ternary {
                condition,
                if_true,
                if_false,
            } => {
                condition.for_each(f);
                if_true.for_each(f);
                if_false.for_each(f);
            }
            ExpressionKind::Closure { body, .. } => body.for_each_expression(f),
            ExpressionKind::Parens(inner) => inner.for_each(f),
        }
    }

    /// Mutable counterpart of [`Expression::for_each`]. The callback runs
    /// before descending so it may rewrite children it is about to visit.
    pub fn for_each_mut(&mut self, f: &mut impl FnMut(&mut Expression)) {
        f(self);
        match &mut self.kind {
            ExpressionKind::Constant(_) | ExpressionKind::Identifier(_) => {}
            ExpressionKind::Binary { lhs, rhs, .. } => {
                lhs.for_each_mut(f);
                rhs.for_each_mut(f);
            }
            ExpressionKind::Assignment { target, value, .. } => {
                target.for_each_mut(f);
                value.for_each_mut(f);
            }
            ExpressionKind::Call { callee, arguments } => {
                callee.for_each_mut(f);
                for arg in arguments {
                    arg.value.for_each_mut(f);
                }
            }
            ExpressionKind::Subscript { base, index } => {
                base.for_each_mut(f);
                index.for_each_mut(f);
            }
            ExpressionKind::Member { base, .. } => base.for_each_mut(f),
            ExpressionKind::Unary { operand, .. } => operand.for_each_mut(f),
            ExpressionKind::Cast { operand, .. } => operand.for_each_mut(f),
            ExpressionKind::Ternary {
                condition,
                if_true,
                if_false,
            } => {
                condition.for_each_mut(f);
                if_true.for_each_mut(f);
                if_false.for_each_mut(f);
            }
            ExpressionKind::Closure { body, .. } => body.for_each_expression_mut(f),
            ExpressionKind::Parens(inner) => inner.for_each_mut(f),
        }
    }
}

/// Reference ownership derived from Objective-C qualifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ownership {
    #[default]
    Strong,
    Weak,
    Unowned,
}

/// A single declarator within a variable-declaration statement. `ty` is
/// `None` when the Swift side should infer the type from the initializer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDeclaration {
    pub name: String,
    pub ty: Option<SwiftType>,
    pub is_constant: bool,
    pub ownership: Ownership,
    pub initializer: Option<Expression>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompoundStatement {
    pub statements: Vec<Statement>,
}

impl CompoundStatement {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Visits every expression in the block, recursing into nested
    /// statements and closure bodies.
    pub fn for_each_expression(&self, f: &mut impl FnMut(&Expression)) {
        for stmt in &self.statements {
            stmt.for_each_expression(f);
        }
    }

    pub fn for_each_expression_mut(&mut self, f: &mut impl FnMut(&mut Expression)) {
        for stmt in &mut self.statements {
            stmt.for_each_expression_mut(f);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IfStatement {
    pub condition: Expression,
    pub body: CompoundStatement,
    pub else_body: Option<CompoundStatement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchCase {
    pub patterns: Vec<Expression>,
    pub body: CompoundStatement,
}

/// A switch with a structurally guaranteed default branch: the lowering
/// synthesises a break-only default when the source has none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchStatement {
    pub subject: Expression,
    pub cases: Vec<SwitchCase>,
    pub default: CompoundStatement,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhileStatement {
    pub condition: Expression,
    pub body: CompoundStatement,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepeatWhileStatement {
    pub body: CompoundStatement,
    pub condition: Expression,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForInStatement {
    pub binding: String,
    pub sequence: Expression,
    pub body: CompoundStatement,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatchBlock {
    pub binding: Option<String>,
    pub body: CompoundStatement,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoStatement {
    pub body: CompoundStatement,
    pub catch_blocks: Vec<CatchBlock>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalFunction {
    pub name: String,
    pub parameters: Vec<ClosureParameter>,
    pub return_type: SwiftType,
    pub body: CompoundStatement,
}

/// A statement the lowering could not translate. The original source text
/// survives verbatim so the emitter can reproduce it as a block comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnknownStatement {
    pub source_text: String,
    pub range: SourceRange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StatementKind {
    Expressions(Vec<Expression>),
    VariableDeclarations(Vec<VariableDeclaration>),
    If(IfStatement),
    Switch(SwitchStatement),
    While(WhileStatement),
    RepeatWhile(RepeatWhileStatement),
    ForIn(ForInStatement),
    Do(DoStatement),
    Defer(CompoundStatement),
    Throw(Expression),
    Break,
    Continue,
    Fallthrough,
    Return(Option<Expression>),
    Compound(CompoundStatement),
    LocalFunction(LocalFunction),
    Unknown(UnknownStatement),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub kind: StatementKind,
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub leading_comments: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trailing_comment: Option<String>,
}

impl Statement {
    pub fn new(kind: StatementKind) -> Self {
        Self {
            kind,
            label: None,
            leading_comments: Vec::new(),
            trailing_comment: None,
        }
    }

    pub fn expression(expr: Expression) -> Self {
        Self::new(StatementKind::Expressions(vec![expr]))
    }

    pub fn break_stmt() -> Self {
        Self::new(StatementKind::Break)
    }

    pub fn continue_stmt() -> Self {
        Self::new(StatementKind::Continue)
    }

    pub fn return_stmt(value: Option<Expression>) -> Self {
        Self::new(StatementKind::Return(value))
    }

    pub fn unknown(source_text: impl Into<String>, range: SourceRange) -> Self {
        Self::new(StatementKind::Unknown(UnknownStatement {
            source_text: source_text.into(),
            range,
        }))
    }

    /// `true` when control never continues past this statement.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.kind,
            StatementKind::Break
                | StatementKind::Continue
                | StatementKind::Fallthrough
                | StatementKind::Return(_)
                | StatementKind::Throw(_)
        )
    }

    pub fn for_each_expression(&self, f: &mut impl FnMut(&Expression)) {
        match &self.kind {
            StatementKind::Expressions(exprs) => {
                for e in exprs {
                    e.for_each(f);
                }
            }
            StatementKind::VariableDeclarations(decls) => {
                for d in decls {
                    if let Some(init) = &d.initializer {
                        init.for_each(f);
                    }
                }
            }
            StatementKind::If(s) => {
                s.condition.for_each(f);
                s.body.for_each_expression(f);
                if let Some(else_body) = &s.else_body {
                    else_body.for_each_expression(f);
                }
            }
            StatementKind::Switch(s) => {
                s.subject.for_each(f);
                for case in &s.cases {
                    for pat in &case.patterns {
                        pat.for_each(f);
                    }
                    case.body.for_each_expression(f);
                }
                s.default.for_each_expression(f);
            }
            StatementKind::While(s) => {
                s.condition.for_each(f);
                s.body.for_each_expression(f);
            }
            StatementKind::RepeatWhile(s) => {
                s.body.for_each_expression(f);
                s.condition.for_each(f);
            }
            StatementKind::ForIn(s) => {
                s.sequence.for_each(f);
                s.body.for_each_expression(f);
            }
            StatementKind::Do(s) => {
                s.body.for_each_expression(f);
                for catch in &s.catch_blocks {
                    catch.body.for_each_expression(f);
                }
            }
            StatementKind::Defer(body) | StatementKind::Compound(body) => {
                body.for_each_expression(f)
            }
            StatementKind::Throw(e) => e.for_each(f),
            StatementKind::Return(Some(e)) => e.for_each(f),
            StatementKind::LocalFunction(func) => func.body.for_each_expression(f),
            StatementKind::Return(None)
            | StatementKind::Break
            | StatementKind::Continue
            | StatementKind::Fallthrough
            | StatementKind::Unknown(_) => {}
        }
    }

    pub fn for_each_expression_mut(&mut self, f: &mut impl FnMut(&mut Expression)) {
        match &mut self.kind {
            StatementKind::Expressions(exprs) => {
                for e in exprs {
                    e.for_each_mut(f);
                }
            }
            StatementKind::VariableDeclarations(decls) => {
                for d in decls {
                    if let Some(init) = &mut d.initializer {
                        init.for_each_mut(f);
                    }
                }
            }
            StatementKind::If(s) => {
                s.condition.for_each_mut(f);
                s.body.for_each_expression_mut(f);
                if let Some(else_body) = &mut s.else_body {
                    else_body.for_each_expression_mut(f);
                }
            }
            StatementKind::Switch(s) => {
                s.subject.for_each_mut(f);
                for case in &mut s.cases {
                    for pat in &mut case.patterns {
                        pat.for_each_mut(f);
                    }
                    case.body.for_each_expression_mut(f);
                }
                s.default.for_each_expression_mut(f);
            }
            StatementKind::While(s) => {
                s.condition.for_each_mut(f);
                s.body.for_each_expression_mut(f);
            }
            StatementKind::RepeatWhile(s) => {
                s.body.for_each_expression_mut(f);
                s.condition.for_each_mut(f);
            }
            StatementKind::ForIn(s) => {
                s.sequence.for_each_mut(f);
                s.body.for_each_expression_mut(f);
            }
            StatementKind::Do(s) => {
                s.body.for_each_expression_mut(f);
                for catch in &mut s.catch_blocks {
                    catch.body.for_each_expression_mut(f);
                }
            }
            StatementKind::Defer(body) | StatementKind::Compound(body) => {
                body.for_each_expression_mut(f)
            }
            StatementKind::Throw(e) => e.for_each_mut(f),
            StatementKind::Return(Some(e)) => e.for_each_mut(f),
            StatementKind::LocalFunction(func) => func.body.for_each_expression_mut(f),
            StatementKind::Return(None)
            | StatementKind::Break
            | StatementKind::Continue
            | StatementKind::Fallthrough
            | StatementKind::Unknown(_) => {}
        }
    }
}
