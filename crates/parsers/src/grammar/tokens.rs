//! Token stream over Objective-C source.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
    Identifier,
    /// `@interface`, `@property`, `@synchronized`, ...
    AtKeyword,
    IntLiteral,
    FloatLiteral,
    /// Either `"..."` or `@"..."`; the text keeps the quotes.
    StringLiteral,
    CharLiteral,
    /// Operators and punctuation, longest-match first.
    Punct,
    /// A whole `#...` line.
    Preprocessor,
    Eof,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: usize,
    pub column: usize,
    /// Byte offsets into the source, for verbatim slices.
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn is(&self, text: &str) -> bool {
        self.text == text
    }
}

const PUNCTUATION: &[&str] = &[
    "<<=", ">>=", "...", "<<", ">>", "<=", ">=", "==", "!=", "&&", "||", "+=", "-=", "*=", "/=",
    "%=", "&=", "|=", "^=", "++", "--", "->", "(", ")", "[", "]", "{", "}", "<", ">", "+", "-",
    "*", "/", "%", "=", ";", ":", ",", ".", "?", "!", "&", "|", "^", "~", "@",
];

/// Splits source text into tokens. Comments and whitespace are skipped;
/// unterminated literals run to end of line. The lexer never fails.
pub fn tokenize(source: &str) -> Vec<Token> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0usize;
    let mut line = 1usize;
    let mut column = 1usize;

    let mut advance = |i: &mut usize, line: &mut usize, column: &mut usize, by: usize| {
        for _ in 0..by {
            if bytes.get(*i) == Some(&b'\n') {
                *line += 1;
                *column = 1;
            } else {
                *column += 1;
            }
            *i += 1;
        }
    };

    while i < bytes.len() {
        let c = bytes[i] as char;
        if c.is_ascii_whitespace() {
            advance(&mut i, &mut line, &mut column, 1);
            continue;
        }
        // Line comment.
        if source[i..].starts_with("//") {
            while i < bytes.len() && bytes[i] != b'\n' {
                advance(&mut i, &mut line, &mut column, 1);
            }
            continue;
        }
        // Block comment.
        if source[i..].starts_with("/*") {
            let end = source[i + 2..].find("*/").map(|p| i + 2 + p + 2);
            let stop = end.unwrap_or(bytes.len());
            while i < stop {
                advance(&mut i, &mut line, &mut column, 1);
            }
            continue;
        }
        let (start_line, start_column, start) = (line, column, i);
        // Preprocessor line.
        if c == '#' && (column == 1 || is_line_start(source, i)) {
            while i < bytes.len() && bytes[i] != b'\n' {
                advance(&mut i, &mut line, &mut column, 1);
            }
            tokens.push(Token {
                kind: TokenKind::Preprocessor,
                text: source[start..i].trim_end().to_string(),
                line: start_line,
                column: start_column,
                start,
                end: i,
            });
            continue;
        }
        // @keyword or @"string".
        if c == '@' {
            if source[i + 1..].starts_with('"') {
                let len = string_len(&source[i + 1..]) + 1;
                advance(&mut i, &mut line, &mut column, len);
                tokens.push(Token {
                    kind: TokenKind::StringLiteral,
                    text: source[start..i].to_string(),
                    line: start_line,
                    column: start_column,
                    start,
                    end: i,
                });
                continue;
            }
            let mut j = i + 1;
            while j < bytes.len() && (bytes[j].is_ascii_alphanumeric() || bytes[j] == b'_') {
                j += 1;
            }
            if j > i + 1 {
                let len = j - i;
                advance(&mut i, &mut line, &mut column, len);
                tokens.push(Token {
                    kind: TokenKind::AtKeyword,
                    text: source[start..i].to_string(),
                    line: start_line,
                    column: start_column,
                    start,
                    end: i,
                });
                continue;
            }
            // Bare '@' (collection literals): fall through to punctuation.
        }
        if c == '"' {
            let len = string_len(&source[i..]);
            advance(&mut i, &mut line, &mut column, len);
            tokens.push(Token {
                kind: TokenKind::StringLiteral,
                text: source[start..i].to_string(),
                line: start_line,
                column: start_column,
                start,
                end: i,
            });
            continue;
        }
        if c == '\'' {
            let mut j = i + 1;
            while j < bytes.len() && bytes[j] != b'\'' {
                if bytes[j] == b'\\' {
                    j += 1;
                }
                j += 1;
            }
            let len = (j + 1).min(bytes.len()) - i;
            advance(&mut i, &mut line, &mut column, len);
            tokens.push(Token {
                kind: TokenKind::CharLiteral,
                text: source[start..i].to_string(),
                line: start_line,
                column: start_column,
                start,
                end: i,
            });
            continue;
        }
        if c.is_ascii_digit() {
            let mut j = i;
            let mut is_float = false;
            while j < bytes.len() {
                let d = bytes[j] as char;
                if d.is_ascii_alphanumeric() || d == '_' {
                    j += 1;
                } else if d == '.' && bytes.get(j + 1).map_or(false, u8::is_ascii_digit) {
                    is_float = true;
                    j += 1;
                } else {
                    break;
                }
            }
            let len = j - i;
            advance(&mut i, &mut line, &mut column, len);
            tokens.push(Token {
                kind: if is_float {
                    TokenKind::FloatLiteral
                } else {
                    TokenKind::IntLiteral
                },
                text: source[start..i].to_string(),
                line: start_line,
                column: start_column,
                start,
                end: i,
            });
            continue;
        }
        if c.is_ascii_alphabetic() || c == '_' {
            let mut j = i;
            while j < bytes.len() && (bytes[j].is_ascii_alphanumeric() || bytes[j] == b'_') {
                j += 1;
            }
            let len = j - i;
            advance(&mut i, &mut line, &mut column, len);
            tokens.push(Token {
                kind: TokenKind::Identifier,
                text: source[start..i].to_string(),
                line: start_line,
                column: start_column,
                start,
                end: i,
            });
            continue;
        }
        let punct = PUNCTUATION
            .iter()
            .find(|p| source[i..].starts_with(**p))
            .copied();
        match punct {
            Some(p) => {
                advance(&mut i, &mut line, &mut column, p.len());
                tokens.push(Token {
                    kind: TokenKind::Punct,
                    text: p.to_string(),
                    line: start_line,
                    column: start_column,
                    start,
                    end: i,
                });
            }
            None => {
                // Unrecognised character: skip the whole char so the cursor
                // stays on a UTF-8 boundary.
                let width = source[i..].chars().next().map_or(1, char::len_utf8);
                advance(&mut i, &mut line, &mut column, width);
            }
        }
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        text: String::new(),
        line,
        column,
        start: bytes.len(),
        end: bytes.len(),
    });
    tokens
}

/// Byte length of a quoted string starting at a `"`, including both quotes.
fn string_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    let mut j = 1;
    while j < bytes.len() && bytes[j] != b'"' {
        if bytes[j] == b'\\' {
            j += 1;
        }
        j += 1;
    }
    (j + 1).min(bytes.len())
}

fn is_line_start(source: &str, i: usize) -> bool {
    source[..i].chars().rev().take_while(|&c| c != '\n').all(|c| c.is_ascii_whitespace())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_objc_keywords_and_literals() {
        let toks = tokenize("@interface Foo : NSObject\n- (int)count;\n@end");
        assert_eq!(toks[0].kind, TokenKind::AtKeyword);
        assert_eq!(toks[0].text, "@interface");
        assert!(toks.iter().any(|t| t.text == "count"));
        assert_eq!(toks.last().unwrap().kind, TokenKind::Eof);
    }

    #[test]
    fn tokenizes_string_and_char_literals() {
        let toks = tokenize(r#"NSString *s = @"hi"; char c = 'x';"#);
        assert!(toks
            .iter()
            .any(|t| t.kind == TokenKind::StringLiteral && t.text == "@\"hi\""));
        assert!(toks
            .iter()
            .any(|t| t.kind == TokenKind::CharLiteral && t.text == "'x'"));
    }

    #[test]
    fn captures_preprocessor_lines() {
        let toks = tokenize("#import <Foundation/Foundation.h>\nint x;");
        assert_eq!(toks[0].kind, TokenKind::Preprocessor);
        assert!(toks[0].text.starts_with("#import"));
        assert_eq!(toks[1].text, "int");
    }

    #[test]
    fn skips_comments_and_tracks_lines() {
        let toks = tokenize("// lead\nint /* mid */ x;\n");
        assert_eq!(toks[0].text, "int");
        assert_eq!(toks[0].line, 2);
        assert_eq!(toks[1].text, "x");
    }

    #[test]
    fn longest_match_punctuation() {
        let toks = tokenize("a <<= b << c <= d;");
        let puncts: Vec<_> = toks
            .iter()
            .filter(|t| t.kind == TokenKind::Punct)
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(puncts, vec!["<<=", "<<", "<=", ";"]);
    }
}
