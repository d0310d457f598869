//! Hand-written recursive-descent front-end for the Objective-C subset.
//!
//! The parser never fails: any region it cannot shape becomes a single
//! [`Rule::Unknown`] context covering the region verbatim, which the
//! lowering degrades to an unknown statement. Backtracking is used where
//! the grammar is ambiguous (variable declaration vs. expression, cast vs.
//! parenthesised expression, for-in vs. C-style for).

pub mod tokens;

use crate::context::{ParseContext, Rule};
use ir::SourceRange;
use tokens::{tokenize, Token, TokenKind};

/// Words that may join a multi-word primitive type (`unsigned long long`).
const PRIMITIVE_WORDS: &[&str] = &[
    "unsigned", "signed", "short", "long", "int", "char", "float", "double", "void",
];

const OWNERSHIP_QUALIFIERS: &[&str] = &["__strong", "__weak", "__unsafe_unretained", "__block"];

const NULLABILITY_WORDS: &[&str] = &[
    "_Nullable",
    "_Nonnull",
    "__nullable",
    "__nonnull",
    "nullable",
    "nonnull",
];

/// Statement keywords that can never open a type or name a declarator.
const STATEMENT_KEYWORDS: &[&str] = &[
    "if", "else", "while", "do", "for", "switch", "case", "default", "break", "continue",
    "return", "goto", "typedef", "struct", "enum", "union", "sizeof", "in",
];

/// Parses a whole source file into a `TranslationUnit` context.
pub fn parse_translation_unit(source: &str, file: &str) -> ParseContext {
    Parser::new(source, file).translation_unit()
}

/// Parses a single statement, mainly for tests and tools.
pub fn parse_statement(source: &str, file: &str) -> ParseContext {
    Parser::new(source, file).statement()
}

struct Parser<'a> {
    source: &'a str,
    file: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str, file: &'a str) -> Self {
        Self {
            source,
            file,
            tokens: tokenize(source),
            pos: 0,
        }
    }

    // -- token helpers -----------------------------------------------------

    fn tok(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn kind(&self) -> TokenKind {
        self.tok().kind
    }

    fn text(&self) -> &str {
        &self.tok().text
    }

    fn nth_text(&self, n: usize) -> &str {
        &self.tokens[(self.pos + n).min(self.tokens.len() - 1)].text
    }

    fn at(&self, text: &str) -> bool {
        self.tok().is(text)
    }

    fn at_any(&self, texts: &[&str]) -> bool {
        texts.iter().any(|t| self.at(t))
    }

    fn at_eof(&self) -> bool {
        self.kind() == TokenKind::Eof
    }

    fn bump(&mut self) -> Token {
        let tok = self.tok().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, text: &str) -> bool {
        if self.at(text) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn slice(&self, from: usize, to: usize) -> &str {
        if from >= to {
            return "";
        }
        let start = self.tokens[from].start;
        let end = self.tokens[to - 1].end;
        &self.source[start..end]
    }

    /// Builds a context covering the tokens consumed since `mark`.
    fn finish(&self, rule: Rule, mark: usize) -> ParseContext {
        let t = &self.tokens[mark.min(self.tokens.len() - 1)];
        ParseContext::new(rule, SourceRange::new(self.file, t.line, t.column))
            .with_text(self.slice(mark, self.pos).to_string())
    }

    /// Consumes a balanced region up to (not including) a closing `}` or
    /// past a `;` at depth zero, and wraps it as an `Unknown` context.
    fn unknown_statement(&mut self) -> ParseContext {
        let mark = self.pos;
        let mut depth = 0usize;
        while !self.at_eof() {
            match self.text() {
                "(" | "[" | "{" => depth += 1,
                ")" | "]" => depth = depth.saturating_sub(1),
                "}" => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
                ";" => {
                    if depth == 0 {
                        self.bump();
                        break;
                    }
                }
                _ => {}
            }
            self.bump();
        }
        if self.pos == mark {
            // Nothing consumable; step over one token so progress is made.
            self.bump();
        }
        self.finish(Rule::Unknown, mark)
    }

    /// Consumes tokens until one of `stops` at depth zero (or `@end`/EOF),
    /// wrapping the region as `Unknown`.
    fn unknown_until(&mut self, stops: &[&str]) -> ParseContext {
        let mark = self.pos;
        let mut depth = 0usize;
        while !self.at_eof() && !self.at("@end") {
            if depth == 0 && self.at_any(stops) {
                break;
            }
            match self.text() {
                "(" | "[" | "{" => depth += 1,
                ")" | "]" | "}" => depth = depth.saturating_sub(1),
                _ => {}
            }
            self.bump();
        }
        self.finish(Rule::Unknown, mark)
    }

    // -- translation unit --------------------------------------------------

    fn translation_unit(&mut self) -> ParseContext {
        let mark = self.pos;
        let mut children = Vec::new();
        while !self.at_eof() {
            if self.kind() == TokenKind::Preprocessor {
                let tok = self.bump();
                if let Some(target) = import_target(&tok.text) {
                    children.push(
                        ParseContext::new(
                            Rule::Import,
                            SourceRange::new(self.file, tok.line, tok.column),
                        )
                        .with_value(target)
                        .with_text(tok.text),
                    );
                }
                continue;
            }
            if self.at("NS_ASSUME_NONNULL_BEGIN") {
                let tok = self.bump();
                children.push(ParseContext::new(
                    Rule::NonnullBegin,
                    SourceRange::new(self.file, tok.line, tok.column),
                ));
                continue;
            }
            if self.at("NS_ASSUME_NONNULL_END") {
                let tok = self.bump();
                children.push(ParseContext::new(
                    Rule::NonnullEnd,
                    SourceRange::new(self.file, tok.line, tok.column),
                ));
                continue;
            }
            if self.at("@interface") {
                children.push(self.class_interface());
                continue;
            }
            if self.at("@implementation") {
                children.push(self.class_implementation());
                continue;
            }
            if self.at("@protocol") && self.nth_text(1) != "(" {
                children.push(self.protocol_declaration());
                continue;
            }
            if self.at("@class") || self.at(";") {
                // Forward declarations carry no members; skip to the `;`.
                while !self.at_eof() && !self.eat(";") {
                    self.bump();
                }
                continue;
            }
            if let Some(decl) = self.try_variable_declaration(true) {
                children.push(decl);
                continue;
            }
            if let Some(func) = self.try_function_definition() {
                children.push(func);
                continue;
            }
            children.push(self.unknown_statement());
        }
        self.finish(Rule::TranslationUnit, mark)
            .with_children(children)
    }

    // -- declarations ------------------------------------------------------

    fn class_interface(&mut self) -> ParseContext {
        let mark = self.pos;
        self.bump(); // @interface
        let name = if self.kind() == TokenKind::Identifier {
            self.bump().text
        } else {
            return self.unknown_until(&["@end"]);
        };
        let mut children = Vec::new();
        let mut rule = Rule::ClassInterface;
        if self.eat("(") {
            rule = Rule::CategoryInterface;
            // Class extensions have an empty category name.
            if self.kind() == TokenKind::Identifier {
                self.bump();
            }
            self.eat(")");
        }
        if self.eat(":") {
            if self.kind() == TokenKind::Identifier {
                let tok = self.bump();
                children.push(
                    ParseContext::new(
                        Rule::SuperclassRef,
                        SourceRange::new(self.file, tok.line, tok.column),
                    )
                    .with_value(tok.text),
                );
            }
        }
        children.extend(self.protocol_refs());
        if self.at("{") {
            children.push(self.ivar_block());
        }
        children.extend(self.member_declarations(false));
        self.eat("@end");
        self.finish(rule, mark)
            .with_value(name)
            .with_children(children)
    }

    fn class_implementation(&mut self) -> ParseContext {
        let mark = self.pos;
        self.bump(); // @implementation
        let name = if self.kind() == TokenKind::Identifier {
            self.bump().text
        } else {
            return self.unknown_until(&["@end"]);
        };
        let mut rule = Rule::ClassImplementation;
        if self.eat("(") {
            rule = Rule::CategoryImplementation;
            if self.kind() == TokenKind::Identifier {
                self.bump();
            }
            self.eat(")");
        }
        let children = self.member_declarations(true);
        self.eat("@end");
        self.finish(rule, mark)
            .with_value(name)
            .with_children(children)
    }

    fn protocol_declaration(&mut self) -> ParseContext {
        let mark = self.pos;
        self.bump(); // @protocol
        let name = if self.kind() == TokenKind::Identifier {
            self.bump().text
        } else {
            return self.unknown_until(&["@end"]);
        };
        if self.eat(";") {
            // Forward declaration.
            return self.finish(Rule::ProtocolDeclaration, mark).with_value(name);
        }
        let mut children = self.protocol_refs();
        children.extend(self.member_declarations(false));
        self.eat("@end");
        self.finish(Rule::ProtocolDeclaration, mark)
            .with_value(name)
            .with_children(children)
    }

    fn protocol_refs(&mut self) -> Vec<ParseContext> {
        let mut refs = Vec::new();
        if self.eat("<") {
            while !self.at_eof() && !self.eat(">") {
                if self.kind() == TokenKind::Identifier {
                    let tok = self.bump();
                    refs.push(
                        ParseContext::new(
                            Rule::ProtocolRef,
                            SourceRange::new(self.file, tok.line, tok.column),
                        )
                        .with_value(tok.text),
                    );
                } else {
                    self.bump();
                }
            }
        }
        refs
    }

    fn ivar_block(&mut self) -> ParseContext {
        let mark = self.pos;
        self.bump(); // {
        let mut children = Vec::new();
        while !self.at_eof() && !self.at("}") {
            if self.kind() == TokenKind::AtKeyword {
                // @private / @protected / @public / @package
                self.bump();
                continue;
            }
            match self.try_variable_declaration(false) {
                Some(decl) => children.push(decl),
                None => {
                    children.push(self.unknown_until(&[";", "}"]));
                    self.eat(";");
                }
            }
        }
        self.eat("}");
        self.finish(Rule::IvarBlock, mark).with_children(children)
    }

    fn member_declarations(&mut self, allow_bodies: bool) -> Vec<ParseContext> {
        let mut members = Vec::new();
        while !self.at_eof() && !self.at("@end") {
            if self.at("@property") {
                members.push(self.property_declaration());
            } else if self.at("+") || self.at("-") {
                members.push(self.method_declaration(allow_bodies));
            } else if self.at("@optional") || self.at("@required") {
                self.bump();
            } else if self.at("@synthesize") || self.at("@dynamic") {
                members.push(self.unknown_until(&[";"]));
                self.eat(";");
            } else if self.eat(";") {
                continue;
            } else {
                members.push(self.unknown_until(&["+", "-", "@property", ";"]));
                self.eat(";");
            }
        }
        members
    }

    fn property_declaration(&mut self) -> ParseContext {
        let mark = self.pos;
        self.bump(); // @property
        let mut children = Vec::new();
        if self.eat("(") {
            while !self.at_eof() && !self.eat(")") {
                if self.kind() == TokenKind::Identifier {
                    let tok = self.bump();
                    let mut attr = tok.text.clone();
                    if self.eat("=") {
                        if self.kind() == TokenKind::Identifier {
                            attr = format!("{attr}={}", self.bump().text);
                        }
                    }
                    children.push(
                        ParseContext::new(
                            Rule::PropertyAttribute,
                            SourceRange::new(self.file, tok.line, tok.column),
                        )
                        .with_value(attr),
                    );
                }
                self.eat(",");
            }
        }
        let Some((type_ctx, name)) = self.type_and_declarator_name() else {
            let mut unknown = self.unknown_until(&[";"]);
            self.eat(";");
            unknown.children = children;
            return unknown;
        };
        children.push(type_ctx);
        self.eat(";");
        self.finish(Rule::PropertyDeclaration, mark)
            .with_value(name)
            .with_children(children)
    }

    fn method_declaration(&mut self, allow_bodies: bool) -> ParseContext {
        let mark = self.pos;
        let is_static = self.bump().is("+");
        let mut children = Vec::new();
        if self.eat("(") {
            children.push(self.type_name_until(")"));
            self.eat(")");
        }
        // First selector piece.
        let Some(first) = self.identifier_token() else {
            let unknown = self.unknown_until(&[";", "{", "@end"]);
            self.eat(";");
            return unknown;
        };
        let mut piece_name = first.text.clone();
        loop {
            let piece_mark = self.pos;
            if !self.at(":") {
                // Piece without argument; selector ends here.
                children.push(
                    ParseContext::new(
                        Rule::MethodSelectorPiece,
                        SourceRange::new(self.file, first.line, first.column),
                    )
                    .with_value(piece_name.clone()),
                );
                break;
            }
            self.bump(); // :
            let mut piece_children = Vec::new();
            if self.eat("(") {
                piece_children.push(self.type_name_until(")"));
                self.eat(")");
            }
            let param = self
                .identifier_token()
                .map(|t| t.text)
                .unwrap_or_else(|| piece_name.clone());
            let mut piece = self
                .finish(Rule::MethodSelectorPiece, piece_mark)
                .with_value(piece_name.clone())
                .with_children(piece_children);
            piece.children.push(
                ParseContext::new(Rule::Identifier, piece.range.clone()).with_value(param),
            );
            children.push(piece);
            if self.kind() == TokenKind::Identifier && self.nth_text(1) == ":" {
                piece_name = self.bump().text;
                continue;
            }
            break;
        }
        if allow_bodies && self.at("{") {
            children.push(self.compound_statement());
            return self
                .finish(Rule::MethodDefinition, mark)
                .with_value(first.text)
                .with_children(children)
                .with_static_flag(is_static);
        }
        self.eat(";");
        self.finish(Rule::MethodDeclaration, mark)
            .with_value(first.text)
            .with_children(children)
            .with_static_flag(is_static)
    }

    fn try_function_definition(&mut self) -> Option<ParseContext> {
        let save = self.pos;
        let mark = self.pos;
        let (type_ctx, name) = match self.type_and_declarator_name() {
            Some(pair) => pair,
            None => {
                self.pos = save;
                return None;
            }
        };
        if !self.at("(") {
            self.pos = save;
            return None;
        }
        self.bump(); // (
        let mut children = vec![type_ctx];
        while !self.at_eof() && !self.at(")") {
            if self.at("void") && self.nth_text(1) == ")" {
                self.bump();
                break;
            }
            match self.type_and_declarator_name() {
                Some((param_ty, param_name)) => {
                    let param = ParseContext::new(Rule::ParameterDeclaration, param_ty.range.clone())
                        .with_value(param_name)
                        .with_children(vec![param_ty]);
                    children.push(param);
                }
                None => {
                    self.pos = save;
                    return None;
                }
            }
            self.eat(",");
        }
        self.eat(")");
        if !self.at("{") {
            self.pos = save;
            return None;
        }
        children.push(self.compound_statement());
        Some(
            self.finish(Rule::FunctionDefinition, mark)
                .with_value(name)
                .with_children(children),
        )
    }

    fn identifier_token(&mut self) -> Option<Token> {
        if self.kind() == TokenKind::Identifier {
            Some(self.bump())
        } else {
            None
        }
    }

    // -- types -------------------------------------------------------------

    /// Collects everything up to `stop` as one spelled-out type name.
    fn type_name_until(&mut self, stop: &str) -> ParseContext {
        let mark = self.pos;
        let mut depth = 0usize;
        while !self.at_eof() {
            if depth == 0 && self.at(stop) {
                break;
            }
            match self.text() {
                "(" | "<" => depth += 1,
                ")" | ">" => depth = depth.saturating_sub(1),
                _ => {}
            }
            self.bump();
        }
        let text = self.slice(mark, self.pos).to_string();
        self.finish(Rule::TypeName, mark).with_value(text)
    }

    /// Tries to read `qualifiers type declarator-name`, leaving the cursor
    /// after the name. Handles block declarators `R (^name)(Params)`.
    fn type_and_declarator_name(&mut self) -> Option<(ParseContext, String)> {
        let save = self.pos;
        let mark = self.pos;
        let mut spelled: Vec<String> = Vec::new();

        while self.kind() == TokenKind::Identifier
            && (OWNERSHIP_QUALIFIERS.contains(&self.text())
                || self.text() == "const"
                || self.text() == "static"
                || self.text() == "extern")
        {
            spelled.push(self.bump().text);
        }
        if self.kind() != TokenKind::Identifier || STATEMENT_KEYWORDS.contains(&self.text()) {
            self.pos = save;
            return None;
        }
        let base = self.bump().text;
        let multi_word = PRIMITIVE_WORDS.contains(&base.as_str());
        spelled.push(base);
        if multi_word {
            while self.kind() == TokenKind::Identifier
                && PRIMITIVE_WORDS.contains(&self.text())
            {
                spelled.push(self.bump().text);
            }
        }
        // Generic arguments or protocol qualifiers: <...>
        if self.at("<") {
            let gen_mark = self.pos;
            let mut depth = 0usize;
            loop {
                if self.at_eof() {
                    self.pos = save;
                    return None;
                }
                match self.text() {
                    "<" => depth += 1,
                    ">" => {
                        depth -= 1;
                        if depth == 0 {
                            self.bump();
                            break;
                        }
                    }
                    ";" | "{" | "}" => {
                        self.pos = save;
                        return None;
                    }
                    _ => {}
                }
                self.bump();
            }
            spelled.push(self.slice(gen_mark, self.pos).to_string());
        }
        // Block declarator: R (^name)(Params)
        if self.at("(") && self.nth_text(1) == "^" {
            self.bump(); // (
            self.bump(); // ^
            let name = self.identifier_token()?.text;
            if !self.eat(")") || !self.at("(") {
                self.pos = save;
                return None;
            }
            let params_mark = self.pos;
            let mut depth = 0usize;
            while !self.at_eof() {
                match self.text() {
                    "(" => depth += 1,
                    ")" => {
                        depth -= 1;
                        if depth == 0 {
                            self.bump();
                            break;
                        }
                    }
                    _ => {}
                }
                self.bump();
            }
            spelled.push("(^)".to_string());
            spelled.push(self.slice(params_mark, self.pos).to_string());
            let type_ctx = self
                .finish(Rule::TypeName, mark)
                .with_value(spelled.join(" "));
            return Some((type_ctx, name));
        }
        // Pointers and nullability qualifiers.
        loop {
            if self.at("*") {
                spelled.push(self.bump().text);
            } else if self.kind() == TokenKind::Identifier
                && NULLABILITY_WORDS.contains(&self.text())
            {
                spelled.push(self.bump().text);
            } else {
                break;
            }
        }
        if STATEMENT_KEYWORDS.contains(&self.text()) {
            self.pos = save;
            return None;
        }
        let name = match self.identifier_token() {
            Some(tok) => tok.text,
            None => {
                self.pos = save;
                return None;
            }
        };
        let type_ctx = self
            .finish(Rule::TypeName, mark)
            .with_value(spelled.join(" "));
        Some((type_ctx, name))
    }

    fn try_variable_declaration(&mut self, require_semicolon: bool) -> Option<ParseContext> {
        let save = self.pos;
        let mark = self.pos;
        let (type_ctx, first_name) = self.type_and_declarator_name()?;
        if !self.at_any(&["=", ",", ";", ")"]) {
            self.pos = save;
            return None;
        }
        let mut children = vec![type_ctx];
        let mut name = first_name;
        loop {
            let decl_mark = self.pos;
            let mut decl_children = Vec::new();
            if self.eat("=") {
                match self.try_expression() {
                    Some(init) => decl_children.push(init),
                    None => {
                        self.pos = save;
                        return None;
                    }
                }
            }
            children.push(
                self.finish(Rule::Declarator, decl_mark)
                    .with_value(name.clone())
                    .with_children(decl_children),
            );
            if self.eat(",") {
                // Further declarators share the spelled type; pointer stars
                // belong to the declarator in C but the subset treats them
                // as part of the shared type.
                while self.at("*") {
                    self.bump();
                }
                name = match self.identifier_token() {
                    Some(tok) => tok.text,
                    None => {
                        self.pos = save;
                        return None;
                    }
                };
                continue;
            }
            break;
        }
        if require_semicolon {
            if !self.eat(";") {
                self.pos = save;
                return None;
            }
        } else {
            self.eat(";");
        }
        Some(
            self.finish(Rule::VariableDeclaration, mark)
                .with_children(children),
        )
    }

    // -- statements --------------------------------------------------------

    fn compound_statement(&mut self) -> ParseContext {
        let mark = self.pos;
        self.bump(); // {
        let mut children = Vec::new();
        while !self.at_eof() && !self.at("}") {
            children.push(self.statement());
        }
        self.eat("}");
        self.finish(Rule::CompoundStatement, mark)
            .with_children(children)
    }

    fn statement(&mut self) -> ParseContext {
        match self.text() {
            "{" => return self.compound_statement(),
            "if" => return self.if_statement(),
            "switch" => return self.switch_statement(),
            "while" => return self.while_statement(),
            "do" => return self.do_while_statement(),
            "for" => return self.for_statement(),
            "return" => {
                let mark = self.pos;
                self.bump();
                let mut children = Vec::new();
                if !self.at(";") {
                    match self.try_expression() {
                        Some(e) => children.push(e),
                        None => return self.unknown_statement(),
                    }
                }
                self.eat(";");
                return self.finish(Rule::ReturnStatement, mark).with_children(children);
            }
            "break" => {
                let mark = self.pos;
                self.bump();
                self.eat(";");
                return self.finish(Rule::BreakStatement, mark);
            }
            "continue" => {
                let mark = self.pos;
                self.bump();
                self.eat(";");
                return self.finish(Rule::ContinueStatement, mark);
            }
            "@synchronized" => {
                let mark = self.pos;
                self.bump();
                if !self.eat("(") {
                    return self.unknown_statement();
                }
                let Some(target) = self.try_expression() else {
                    return self.unknown_statement();
                };
                self.eat(")");
                let body = self.statement();
                return self
                    .finish(Rule::SynchronizedStatement, mark)
                    .with_children(vec![target, body]);
            }
            "@autoreleasepool" => {
                let mark = self.pos;
                self.bump();
                let body = self.statement();
                return self
                    .finish(Rule::AutoreleasepoolStatement, mark)
                    .with_children(vec![body]);
            }
            ";" => {
                let mark = self.pos;
                self.bump();
                return self.finish(Rule::CompoundStatement, mark);
            }
            _ => {}
        }
        if let Some(decl) = self.try_variable_declaration(true) {
            return decl;
        }
        let mark = self.pos;
        match self.try_expression() {
            // An expression statement must end the statement; anything else
            // is a construct the grammar does not know.
            Some(expr) if self.at(";") || self.at("}") || self.at_eof() => {
                self.eat(";");
                self.finish(Rule::ExpressionStatement, mark)
                    .with_children(vec![expr])
            }
            Some(_) => {
                self.pos = mark;
                self.unknown_statement()
            }
            None => self.unknown_statement(),
        }
    }

    fn if_statement(&mut self) -> ParseContext {
        let mark = self.pos;
        self.bump(); // if
        if !self.eat("(") {
            return self.unknown_statement();
        }
        let Some(condition) = self.try_expression() else {
            return self.unknown_statement();
        };
        self.eat(")");
        let then_body = self.statement();
        let mut children = vec![condition, then_body];
        if self.eat("else") {
            children.push(self.statement());
        }
        self.finish(Rule::IfStatement, mark).with_children(children)
    }

    fn while_statement(&mut self) -> ParseContext {
        let mark = self.pos;
        self.bump(); // while
        if !self.eat("(") {
            return self.unknown_statement();
        }
        let Some(condition) = self.try_expression() else {
            return self.unknown_statement();
        };
        self.eat(")");
        let body = self.statement();
        self.finish(Rule::WhileStatement, mark)
            .with_children(vec![condition, body])
    }

    fn do_while_statement(&mut self) -> ParseContext {
        let mark = self.pos;
        self.bump(); // do
        let body = self.statement();
        if !self.eat("while") || !self.eat("(") {
            return self.unknown_statement();
        }
        let Some(condition) = self.try_expression() else {
            return self.unknown_statement();
        };
        self.eat(")");
        self.eat(";");
        self.finish(Rule::DoWhileStatement, mark)
            .with_children(vec![body, condition])
    }

    fn switch_statement(&mut self) -> ParseContext {
        let mark = self.pos;
        self.bump(); // switch
        if !self.eat("(") {
            return self.unknown_statement();
        }
        let Some(subject) = self.try_expression() else {
            return self.unknown_statement();
        };
        self.eat(")");
        if !self.at("{") {
            return self.unknown_statement();
        }
        self.bump(); // {
        let mut children = vec![subject];
        while !self.at_eof() && !self.at("}") {
            let section_mark = self.pos;
            let mut labels = Vec::new();
            loop {
                if self.at("case") {
                    let label_mark = self.pos;
                    self.bump();
                    let Some(pattern) = self.try_expression() else {
                        break;
                    };
                    self.eat(":");
                    labels.push(
                        self.finish(Rule::CaseLabel, label_mark)
                            .with_children(vec![pattern]),
                    );
                } else if self.at("default") {
                    let label_mark = self.pos;
                    self.bump();
                    self.eat(":");
                    labels.push(self.finish(Rule::DefaultLabel, label_mark));
                } else {
                    break;
                }
            }
            if labels.is_empty() {
                // Stray tokens inside the switch body.
                children.push(self.unknown_until(&["case", "default", "}"]));
                continue;
            }
            let mut body = labels;
            while !self.at_eof() && !self.at("case") && !self.at("default") && !self.at("}") {
                body.push(self.statement());
            }
            children.push(
                self.finish(Rule::SwitchSection, section_mark)
                    .with_children(body),
            );
        }
        self.eat("}");
        self.finish(Rule::SwitchStatement, mark)
            .with_children(children)
    }

    fn for_statement(&mut self) -> ParseContext {
        let mark = self.pos;
        self.bump(); // for
        if !self.eat("(") {
            return self.unknown_statement();
        }
        // For-in probe: `for (Type name in sequence)`.
        let probe = self.pos;
        if let Some((type_ctx, name)) = self.type_and_declarator_name() {
            if self.at("in") {
                self.bump();
                let Some(sequence) = self.try_expression() else {
                    return self.unknown_statement();
                };
                self.eat(")");
                let body = self.statement();
                let binding =
                    ParseContext::new(Rule::Identifier, type_ctx.range.clone()).with_value(name);
                return self
                    .finish(Rule::ForInStatement, mark)
                    .with_children(vec![type_ctx, binding, sequence, body]);
            }
        }
        self.pos = probe;

        let init_mark = self.pos;
        let init = if self.eat(";") {
            self.finish(Rule::ForInit, init_mark)
        } else if let Some(decl) = self.try_variable_declaration(true) {
            self.finish(Rule::ForInit, init_mark).with_children(vec![decl])
        } else if let Some(expr) = self.try_expression() {
            self.eat(";");
            let stmt = ParseContext::new(Rule::ExpressionStatement, expr.range.clone())
                .with_children(vec![expr]);
            self.finish(Rule::ForInit, init_mark).with_children(vec![stmt])
        } else {
            let unknown = self.unknown_until(&[";"]);
            self.eat(";");
            self.finish(Rule::ForInit, init_mark)
                .with_children(vec![unknown])
        };

        let cond_mark = self.pos;
        let condition = if self.at(";") {
            self.bump();
            self.finish(Rule::ForCondition, cond_mark)
        } else {
            let expr = self.try_expression();
            self.eat(";");
            self.finish(Rule::ForCondition, cond_mark)
                .with_children(expr.into_iter().collect())
        };

        let step_mark = self.pos;
        let step = if self.at(")") {
            self.finish(Rule::ForStep, step_mark)
        } else {
            let expr = self.try_expression();
            self.finish(Rule::ForStep, step_mark)
                .with_children(expr.into_iter().collect())
        };
        self.eat(")");
        let body = self.statement();
        self.finish(Rule::ForStatement, mark)
            .with_children(vec![init, condition, step, body])
    }

    // -- expressions -------------------------------------------------------

    fn try_expression(&mut self) -> Option<ParseContext> {
        let save = self.pos;
        match self.assignment_expression() {
            Some(e) => Some(e),
            None => {
                self.pos = save;
                None
            }
        }
    }

    fn assignment_expression(&mut self) -> Option<ParseContext> {
        let mark = self.pos;
        let lhs = self.ternary_expression()?;
        if self.at_any(&["=", "+=", "-=", "*=", "/="]) {
            let op = self.bump().text;
            let rhs = self.assignment_expression()?;
            return Some(
                self.finish(Rule::AssignmentExpression, mark)
                    .with_value(op)
                    .with_children(vec![lhs, rhs]),
            );
        }
        Some(lhs)
    }

    fn ternary_expression(&mut self) -> Option<ParseContext> {
        let mark = self.pos;
        let condition = self.binary_expression(0)?;
        if self.eat("?") {
            let if_true = self.assignment_expression()?;
            if !self.eat(":") {
                return None;
            }
            let if_false = self.ternary_expression()?;
            return Some(
                self.finish(Rule::TernaryExpression, mark)
                    .with_children(vec![condition, if_true, if_false]),
            );
        }
        Some(condition)
    }

    fn binary_expression(&mut self, level: usize) -> Option<ParseContext> {
        const LEVELS: &[&[&str]] = &[
            &["||"],
            &["&&"],
            &["|"],
            &["^"],
            &["&"],
            &["==", "!="],
            &["<", "<=", ">", ">="],
            &["<<", ">>"],
            &["+", "-"],
            &["*", "/", "%"],
        ];
        if level == LEVELS.len() {
            return self.unary_expression();
        }
        let mark = self.pos;
        let mut lhs = self.binary_expression(level + 1)?;
        while self.at_any(LEVELS[level]) {
            let op = self.bump().text;
            let rhs = self.binary_expression(level + 1)?;
            lhs = self
                .finish(Rule::BinaryExpression, mark)
                .with_value(op)
                .with_children(vec![lhs, rhs]);
        }
        Some(lhs)
    }

    fn unary_expression(&mut self) -> Option<ParseContext> {
        let mark = self.pos;
        if self.at_any(&["!", "-", "~", "*", "&", "++", "--"]) {
            let op = self.bump().text;
            let operand = self.unary_expression()?;
            return Some(
                self.finish(Rule::UnaryExpression, mark)
                    .with_value(op)
                    .with_children(vec![operand]),
            );
        }
        if self.at("(") && self.looks_like_cast() {
            self.bump(); // (
            let type_ctx = self.type_name_until(")");
            self.eat(")");
            let operand = self.unary_expression()?;
            return Some(
                self.finish(Rule::CastExpression, mark)
                    .with_children(vec![type_ctx, operand]),
            );
        }
        self.postfix_expression()
    }

    fn looks_like_cast(&self) -> bool {
        let mut i = self.pos + 1;
        let mut count = 0usize;
        let mut saw_star = false;
        let mut depth = 0usize;
        loop {
            let tok = &self.tokens[i.min(self.tokens.len() - 1)];
            match tok.kind {
                TokenKind::Identifier => count += 1,
                TokenKind::Punct => match tok.text.as_str() {
                    "*" => {
                        saw_star = true;
                        count += 1;
                    }
                    "<" => depth += 1,
                    ">" => depth = depth.saturating_sub(1),
                    "," if depth > 0 => {}
                    ")" if depth == 0 => break,
                    _ => return false,
                },
                _ => return false,
            }
            i += 1;
            if i >= self.tokens.len() {
                return false;
            }
        }
        if count == 0 {
            return false;
        }
        let next = &self.tokens[(i + 1).min(self.tokens.len() - 1)];
        let expr_start = matches!(
            next.kind,
            TokenKind::Identifier
                | TokenKind::IntLiteral
                | TokenKind::FloatLiteral
                | TokenKind::StringLiteral
                | TokenKind::CharLiteral
        ) || matches!(next.text.as_str(), "[" | "(" | "^" | "!" | "~" | "&");
        if !expr_start {
            return false;
        }
        // `(f)(x)` is a call through parens, not a cast.
        !(count == 1 && !saw_star && next.text == "(")
    }

    fn postfix_expression(&mut self) -> Option<ParseContext> {
        let mark = self.pos;
        let mut base = self.primary_expression()?;
        loop {
            if self.at("(") {
                self.bump();
                let mut children = vec![base];
                while !self.at_eof() && !self.at(")") {
                    children.push(self.assignment_expression()?);
                    if !self.eat(",") {
                        break;
                    }
                }
                if !self.eat(")") {
                    return None;
                }
                base = self
                    .finish(Rule::CallExpression, mark)
                    .with_children(children);
            } else if self.at("[") {
                self.bump();
                let index = self.try_expression()?;
                if !self.eat("]") {
                    return None;
                }
                base = self
                    .finish(Rule::SubscriptExpression, mark)
                    .with_children(vec![base, index]);
            } else if self.at(".") || self.at("->") {
                self.bump();
                let name = self.identifier_token()?.text;
                base = self
                    .finish(Rule::MemberAccess, mark)
                    .with_value(name)
                    .with_children(vec![base]);
            } else if self.at("++") || self.at("--") {
                let op = format!("post{}", self.bump().text);
                base = self
                    .finish(Rule::UnaryExpression, mark)
                    .with_value(op)
                    .with_children(vec![base]);
            } else {
                break;
            }
        }
        Some(base)
    }

    fn primary_expression(&mut self) -> Option<ParseContext> {
        let mark = self.pos;
        match self.kind() {
            TokenKind::IntLiteral | TokenKind::FloatLiteral | TokenKind::CharLiteral => {
                let tok = self.bump();
                return Some(self.finish(Rule::Constant, mark).with_value(tok.text));
            }
            TokenKind::StringLiteral => {
                let tok = self.bump();
                return Some(self.finish(Rule::StringLiteral, mark).with_value(tok.text));
            }
            TokenKind::Identifier => {
                let tok = self.bump();
                let rule = match tok.text.as_str() {
                    "YES" | "NO" | "true" | "false" | "nil" | "Nil" | "NULL" => Rule::Constant,
                    _ => Rule::Identifier,
                };
                return Some(self.finish(rule, mark).with_value(tok.text));
            }
            TokenKind::AtKeyword if self.at("@selector") => {
                self.bump();
                if !self.eat("(") {
                    return None;
                }
                let sel_mark = self.pos;
                while !self.at_eof() && !self.at(")") {
                    self.bump();
                }
                let text = self.slice(sel_mark, self.pos).replace(' ', "");
                self.eat(")");
                return Some(self.finish(Rule::SelectorLiteral, mark).with_value(text));
            }
            _ => {}
        }
        if self.at("(") {
            self.bump();
            let inner = self.try_expression()?;
            if !self.eat(")") {
                return None;
            }
            return Some(
                self.finish(Rule::ParenExpression, mark)
                    .with_children(vec![inner]),
            );
        }
        if self.at("[") {
            self.bump();
            let receiver = self.assignment_expression()?;
            let mut children = vec![receiver];
            let first = self.identifier_token()?;
            if self.at(":") {
                let mut piece_name = first.text;
                let mut piece_line = first.line;
                let mut piece_column = first.column;
                loop {
                    self.bump(); // :
                    let arg = self.assignment_expression()?;
                    children.push(
                        ParseContext::new(
                            Rule::MessagePiece,
                            SourceRange::new(self.file, piece_line, piece_column),
                        )
                        .with_value(piece_name.clone())
                        .with_children(vec![arg]),
                    );
                    if self.kind() == TokenKind::Identifier && self.nth_text(1) == ":" {
                        let tok = self.bump();
                        piece_name = tok.text;
                        piece_line = tok.line;
                        piece_column = tok.column;
                        continue;
                    }
                    break;
                }
            } else {
                children.push(
                    ParseContext::new(
                        Rule::MessagePiece,
                        SourceRange::new(self.file, first.line, first.column),
                    )
                    .with_value(first.text),
                );
            }
            if !self.eat("]") {
                return None;
            }
            return Some(self.finish(Rule::MessageSend, mark).with_children(children));
        }
        if self.at("^") {
            self.bump();
            let mut children = Vec::new();
            if self.kind() == TokenKind::Identifier {
                // Optional return type.
                children.push(self.type_name_until("("));
            }
            if self.eat("(") {
                while !self.at_eof() && !self.at(")") {
                    if self.at("void") && self.nth_text(1) == ")" {
                        self.bump();
                        break;
                    }
                    match self.type_and_declarator_name() {
                        Some((param_ty, param_name)) => {
                            children.push(
                                ParseContext::new(
                                    Rule::ParameterDeclaration,
                                    param_ty.range.clone(),
                                )
                                .with_value(param_name)
                                .with_children(vec![param_ty]),
                            );
                        }
                        None => return None,
                    }
                    self.eat(",");
                }
                self.eat(")");
            }
            if !self.at("{") {
                return None;
            }
            children.push(self.compound_statement());
            return Some(self.finish(Rule::BlockLiteral, mark).with_children(children));
        }
        None
    }
}

/// Extracts the target of a `#import`/`#include` line.
fn import_target(line: &str) -> Option<String> {
    let rest = line
        .trim_start()
        .strip_prefix("#import")
        .or_else(|| line.trim_start().strip_prefix("#include"))?
        .trim();
    let target = rest
        .strip_prefix('<')
        .and_then(|r| r.strip_suffix('>'))
        .or_else(|| rest.strip_prefix('"').and_then(|r| r.strip_suffix('"')))?;
    Some(target.to_string())
}

/// Prepends the `+` marker child on class methods.
trait StaticFlag {
    fn with_static_flag(self, is_static: bool) -> Self;
}

impl StaticFlag for ParseContext {
    fn with_static_flag(mut self, is_static: bool) -> Self {
        if is_static {
            self.children
                .insert(0, ParseContext::new(Rule::ClassMethodMarker, self.range.clone()));
        }
        self
    }
}
