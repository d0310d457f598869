//! Rule-tagged parse-tree contexts.
//!
//! The front-end produces a tree of [`ParseContext`] nodes; the lowering
//! consumes nothing else. A context exposes child lookup by grammar rule,
//! the principal token text, and the source range of the region it covers.
//! Regions the parser could not shape arrive as [`Rule::Unknown`] contexts
//! carrying their verbatim text.

use ir::SourceRange;
use serde::{Deserialize, Serialize};

/// Grammar rules of the Objective-C subset the front-end recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rule {
    TranslationUnit,
    Import,
    NonnullBegin,
    NonnullEnd,
    ClassInterface,
    ClassImplementation,
    CategoryInterface,
    CategoryImplementation,
    ProtocolDeclaration,
    SuperclassRef,
    ProtocolRef,
    IvarBlock,
    PropertyDeclaration,
    PropertyAttribute,
    MethodDeclaration,
    MethodDefinition,
    MethodSelectorPiece,
    ClassMethodMarker,
    FunctionDefinition,
    ParameterDeclaration,
    TypeName,
    CompoundStatement,
    IfStatement,
    SwitchStatement,
    SwitchSection,
    CaseLabel,
    DefaultLabel,
    WhileStatement,
    DoWhileStatement,
    ForStatement,
    ForInit,
    ForCondition,
    ForStep,
    ForInStatement,
    ReturnStatement,
    BreakStatement,
    ContinueStatement,
    SynchronizedStatement,
    AutoreleasepoolStatement,
    VariableDeclaration,
    Declarator,
    ExpressionStatement,
    AssignmentExpression,
    TernaryExpression,
    BinaryExpression,
    UnaryExpression,
    CastExpression,
    CallExpression,
    MessageSend,
    MessagePiece,
    SubscriptExpression,
    MemberAccess,
    Identifier,
    Constant,
    StringLiteral,
    SelectorLiteral,
    ParenExpression,
    BlockLiteral,
    Unknown,
}

/// One node of the parse tree delivered by the front-end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseContext {
    pub rule: Rule,
    /// Principal token of the context (an identifier, operator or literal),
    /// when one exists.
    pub value: Option<String>,
    /// Verbatim source slice the context covers.
    pub text: String,
    pub range: SourceRange,
    pub children: Vec<ParseContext>,
}

impl ParseContext {
    pub fn new(rule: Rule, range: SourceRange) -> Self {
        Self {
            rule,
            value: None,
            text: String::new(),
            range,
            children: Vec::new(),
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_children(mut self, children: Vec<ParseContext>) -> Self {
        self.children = children;
        self
    }

    /// First child with the given rule.
    pub fn child(&self, rule: Rule) -> Option<&ParseContext> {
        self.children.iter().find(|c| c.rule == rule)
    }

    /// All children with the given rule, in source order.
    pub fn children_of(&self, rule: Rule) -> impl Iterator<Item = &ParseContext> {
        self.children.iter().filter(move |c| c.rule == rule)
    }

    /// Child by position, regardless of rule.
    pub fn child_at(&self, index: usize) -> Option<&ParseContext> {
        self.children.get(index)
    }

    /// The principal token text, falling back to the covered source slice.
    pub fn token_text(&self) -> &str {
        self.value.as_deref().unwrap_or(&self.text)
    }
}
