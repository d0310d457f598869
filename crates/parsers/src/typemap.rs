//! Objective-C → Swift type mapping.
//!
//! Pure functions over spelled-out Objective-C type strings, plus a per-run
//! context carrying the class and protocol names collected from the input
//! files. Object pointers with no nullability qualifier map to
//! [`SwiftType::Unspecified`]; the nullability pass decides them later.

use crate::grammar::tokens::{tokenize, Token, TokenKind};
use ir::{Ownership, SwiftType};
use std::collections::HashSet;

/// Name tables the mapper consults for `id<P>` and unknown-name reporting.
/// One per pipeline run, passed explicitly.
#[derive(Debug, Clone, Default)]
pub struct TypeMapperContext {
    class_names: HashSet<String>,
    protocol_names: HashSet<String>,
}

impl TypeMapperContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_class(&mut self, name: impl Into<String>) {
        self.class_names.insert(name.into());
    }

    pub fn register_protocol(&mut self, name: impl Into<String>) {
        self.protocol_names.insert(name.into());
    }

    pub fn is_class(&self, name: &str) -> bool {
        self.class_names.contains(name)
    }

    pub fn is_protocol(&self, name: &str) -> bool {
        self.protocol_names.contains(name)
    }

    /// Whether a nominal name means anything to the mapper: a collected
    /// class/protocol or a built-in table entry.
    pub fn is_known_name(&self, name: &str) -> bool {
        self.is_class(name) || self.is_protocol(name) || builtin(name).is_some() || is_primitive(name)
    }
}

const QUALIFIERS: &[&str] = &[
    "const",
    "static",
    "extern",
    "volatile",
    "__strong",
    "__weak",
    "__unsafe_unretained",
    "__block",
    "__autoreleasing",
    "IBOutlet",
    "IBAction",
];

const NULLABLE_WORDS: &[&str] = &["nullable", "_Nullable", "__nullable"];
const NONNULL_WORDS: &[&str] = &["nonnull", "_Nonnull", "__nonnull"];

fn is_primitive(name: &str) -> bool {
    matches!(
        name,
        "void"
            | "int"
            | "long"
            | "short"
            | "char"
            | "float"
            | "double"
            | "unsigned"
            | "signed"
            | "BOOL"
            | "bool"
            | "NSInteger"
            | "NSUInteger"
            | "CGFloat"
            | "NSTimeInterval"
    )
}

/// Built-in Objective-C name table. Returns `None` for names that pass
/// through unchanged.
fn builtin(name: &str) -> Option<SwiftType> {
    let ty = match name {
        "void" => SwiftType::Void,
        "BOOL" | "bool" => SwiftType::bool(),
        "NSInteger" => SwiftType::int(),
        "NSUInteger" => SwiftType::nominal("UInt"),
        "float" => SwiftType::nominal("Float"),
        "double" => SwiftType::double(),
        "CGFloat" => SwiftType::nominal("CGFloat"),
        "NSTimeInterval" => SwiftType::nominal("TimeInterval"),
        "NSString" | "NSMutableString" => SwiftType::string(),
        "NSData" | "NSMutableData" => SwiftType::nominal("Data"),
        "NSDate" => SwiftType::nominal("Date"),
        "NSURL" => SwiftType::nominal("URL"),
        "id" => SwiftType::any_object(),
        "instancetype" => SwiftType::nominal("Self"),
        "SEL" => SwiftType::nominal("Selector"),
        "Class" => SwiftType::nominal("AnyClass"),
        _ => return None,
    };
    Some(ty)
}

fn primitive_words(words: &[String]) -> Option<SwiftType> {
    let joined = words.join(" ");
    let ty = match joined.as_str() {
        "int" | "long" | "long long" | "short" | "signed" | "signed int" | "long int" => {
            SwiftType::int()
        }
        "unsigned" | "unsigned int" | "unsigned long" | "unsigned long long"
        | "unsigned short" => SwiftType::nominal("UInt"),
        "char" | "signed char" => SwiftType::nominal("CChar"),
        "unsigned char" => SwiftType::nominal("UInt8"),
        _ => return None,
    };
    Some(ty)
}

/// Derives reference ownership from the spelled qualifiers.
pub fn ownership_of(spelled: &str) -> Ownership {
    if spelled.contains("__weak") {
        Ownership::Weak
    } else if spelled.contains("__unsafe_unretained") {
        Ownership::Unowned
    } else {
        Ownership::Strong
    }
}

/// Whether the spelled type carries a `const` qualifier at the outer level.
pub fn is_const(spelled: &str) -> bool {
    tokenize(spelled)
        .iter()
        .take_while(|t| t.kind == TokenKind::Identifier)
        .any(|t| t.text == "const")
}

/// Nominal names in the spelled type that the mapper cannot place: not a
/// primitive, not built-in, not a collected class or protocol.
pub fn unknown_names(spelled: &str, ctx: &TypeMapperContext) -> Vec<String> {
    tokenize(spelled)
        .iter()
        .filter(|t| t.kind == TokenKind::Identifier)
        .filter(|t| {
            !QUALIFIERS.contains(&t.text.as_str())
                && !NULLABLE_WORDS.contains(&t.text.as_str())
                && !NONNULL_WORDS.contains(&t.text.as_str())
                && !ctx.is_known_name(&t.text)
        })
        .map(|t| t.text.clone())
        .collect()
}

/// Maps a spelled-out Objective-C type to Swift.
///
/// # Example
/// ```
/// use parsers::typemap::{map_spelled_type, TypeMapperContext};
/// use ir::SwiftType;
/// let ctx = TypeMapperContext::new();
/// assert_eq!(map_spelled_type("BOOL", &ctx), SwiftType::bool());
/// assert_eq!(
///     map_spelled_type("NSString * _Nullable", &ctx),
///     SwiftType::optional(SwiftType::string()),
/// );
/// ```
pub fn map_spelled_type(spelled: &str, ctx: &TypeMapperContext) -> SwiftType {
    let tokens = tokenize(spelled);
    let tokens: Vec<Token> = tokens
        .into_iter()
        .filter(|t| t.kind != TokenKind::Eof)
        .collect();
    map_tokens(&tokens, ctx)
}

fn map_tokens(tokens: &[Token], ctx: &TypeMapperContext) -> SwiftType {
    if tokens.is_empty() {
        return SwiftType::Void;
    }
    // Block type: `R (^)(Params)`.
    if let Some(caret) = tokens
        .iter()
        .position(|t| t.is("^"))
        .filter(|&i| i > 0 && tokens[i - 1].is("("))
    {
        return map_block(tokens, caret, ctx);
    }

    let mut i = 0usize;
    while i < tokens.len() && QUALIFIERS.contains(&tokens[i].text.as_str()) {
        i += 1;
    }

    // Multi-word primitives.
    let mut words = Vec::new();
    while i < tokens.len()
        && tokens[i].kind == TokenKind::Identifier
        && matches!(
            tokens[i].text.as_str(),
            "unsigned" | "signed" | "short" | "long" | "int" | "char"
        )
    {
        words.push(tokens[i].text.clone());
        i += 1;
    }
    let base = if !words.is_empty() {
        primitive_words(&words).unwrap_or_else(SwiftType::int)
    } else {
        if i >= tokens.len() || tokens[i].kind != TokenKind::Identifier {
            return SwiftType::any_object();
        }
        let name = tokens[i].text.clone();
        i += 1;
        // Generic arguments / protocol qualifiers.
        let mut args = Vec::new();
        if i < tokens.len() && tokens[i].is("<") {
            let mut depth = 0usize;
            let start = i;
            while i < tokens.len() {
                match tokens[i].text.as_str() {
                    "<" => depth += 1,
                    ">" => {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                    }
                    _ => {}
                }
                i += 1;
            }
            let inner = &tokens[start + 1..i.min(tokens.len())];
            i = (i + 1).min(tokens.len());
            for group in split_top_level(inner) {
                args.push(map_tokens(group, ctx));
            }
        }
        resolve_nominal(&name, args)
    };

    // Stars and nullability.
    let mut stars = 0usize;
    let mut nullability: Option<bool> = None; // Some(true) = nullable
    while i < tokens.len() {
        if tokens[i].is("*") {
            stars += 1;
        } else if NULLABLE_WORDS.contains(&tokens[i].text.as_str()) {
            nullability = Some(true);
        } else if NONNULL_WORDS.contains(&tokens[i].text.as_str()) {
            nullability = Some(false);
        }
        i += 1;
    }

    let is_object = is_object_type(&base);
    let mapped = if stars > 0 && !is_object {
        // Pointer to a primitive.
        SwiftType::Generic("UnsafeMutablePointer".into(), vec![base])
    } else {
        base
    };
    match (is_object, nullability) {
        (true, Some(true)) => SwiftType::optional(mapped),
        (true, Some(false)) => mapped,
        // Keep a nullability wrapper that a nested rule already decided.
        (true, None) => match mapped {
            wrapped @ (SwiftType::Optional(_) | SwiftType::Unspecified(_)) => wrapped,
            plain => SwiftType::unspecified(plain),
        },
        (false, _) => mapped,
    }
}

fn map_block(tokens: &[Token], caret: usize, ctx: &TypeMapperContext) -> SwiftType {
    let returns = map_tokens(&tokens[..caret - 1], ctx);
    // Skip past `^ [name] )` to the parameter list.
    let mut i = caret + 1;
    while i < tokens.len() && !tokens[i].is(")") {
        i += 1;
    }
    i += 1;
    let mut parameters = Vec::new();
    if i < tokens.len() && tokens[i].is("(") {
        let mut depth = 0usize;
        let start = i;
        while i < tokens.len() {
            match tokens[i].text.as_str() {
                "(" => depth += 1,
                ")" => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
            i += 1;
        }
        let inner = &tokens[start + 1..i.min(tokens.len())];
        for group in split_top_level(inner) {
            let group = strip_trailing_name(group);
            if group.is_empty() || (group.len() == 1 && group[0].is("void")) {
                continue;
            }
            parameters.push(map_tokens(group, ctx));
        }
    }
    SwiftType::Function {
        parameters,
        returns: Box::new(returns),
    }
}

/// Splits a token run on top-level commas.
fn split_top_level(tokens: &[Token]) -> Vec<&[Token]> {
    let mut groups = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, t) in tokens.iter().enumerate() {
        match t.text.as_str() {
            "<" | "(" => depth += 1,
            ">" | ")" => depth = depth.saturating_sub(1),
            "," if depth == 0 => {
                groups.push(&tokens[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if start < tokens.len() {
        groups.push(&tokens[start..]);
    }
    groups
}

/// Drops a trailing parameter name from a `Type name` token run.
fn strip_trailing_name(tokens: &[Token]) -> &[Token] {
    if tokens.len() > 1
        && tokens[tokens.len() - 1].kind == TokenKind::Identifier
        && !matches!(
            tokens[tokens.len() - 1].text.as_str(),
            "int" | "long" | "short" | "char" | "unsigned" | "signed" | "double" | "float"
        )
        && (tokens[tokens.len() - 2].kind != TokenKind::Identifier
            || is_primitive(&tokens[tokens.len() - 2].text)
            || tokens[tokens.len() - 2].is("*"))
    {
        &tokens[..tokens.len() - 1]
    } else if tokens.len() > 1
        && tokens[tokens.len() - 1].kind == TokenKind::Identifier
        && tokens[tokens.len() - 2].is("*")
    {
        &tokens[..tokens.len() - 1]
    } else {
        tokens
    }
}

fn resolve_nominal(name: &str, args: Vec<SwiftType>) -> SwiftType {
    if let Some(builtin) = builtin(name) {
        // `id<P>` projects onto the protocol existential.
        if name == "id" {
            if let Some(first) = args.into_iter().next() {
                return first;
            }
        }
        return builtin;
    }
    if let Some(primitive) = primitive_words(&[name.to_string()]) {
        return primitive;
    }
    match name {
        "NSArray" | "NSMutableArray" => {
            let element = args.into_iter().next().unwrap_or_else(SwiftType::any_object);
            SwiftType::Array(Box::new(unwrap_nullability(element)))
        }
        "NSDictionary" | "NSMutableDictionary" => {
            let mut iter = args.into_iter();
            let key = iter.next().unwrap_or_else(SwiftType::any_object);
            let value = iter.next().unwrap_or_else(SwiftType::any_object);
            SwiftType::Dictionary(
                Box::new(unwrap_nullability(key)),
                Box::new(unwrap_nullability(value)),
            )
        }
        "NSSet" | "NSMutableSet" => {
            let element = args.into_iter().next().unwrap_or_else(SwiftType::any_object);
            SwiftType::Generic("Set".into(), vec![unwrap_nullability(element)])
        }
        _ => {
            if args.is_empty() {
                SwiftType::nominal(name)
            } else {
                SwiftType::Generic(name.to_string(), args)
            }
        }
    }
}

/// Collection elements drop the per-element nullability wrapper.
fn unwrap_nullability(ty: SwiftType) -> SwiftType {
    match ty {
        SwiftType::Unspecified(inner) => *inner,
        other => other,
    }
}

/// Whether the mapped type behaves like an object reference, so that stars
/// mean "reference" rather than "raw pointer".
fn is_object_type(ty: &SwiftType) -> bool {
    match ty {
        SwiftType::Nominal(name) => !matches!(
            name.as_str(),
            "Int" | "UInt" | "Bool" | "Float" | "Double" | "CGFloat" | "CChar" | "UInt8"
                | "TimeInterval" | "Selector"
        ),
        SwiftType::Generic(name, _) => name != "UnsafeMutablePointer",
        SwiftType::Array(_) | SwiftType::Dictionary(_, _) | SwiftType::Function { .. } => true,
        SwiftType::Void => false,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> TypeMapperContext {
        let mut ctx = TypeMapperContext::new();
        ctx.register_class("Person");
        ctx.register_protocol("NSCopying");
        ctx
    }

    #[test]
    fn maps_primitives() {
        assert_eq!(map_spelled_type("BOOL", &ctx()), SwiftType::bool());
        assert_eq!(map_spelled_type("NSInteger", &ctx()), SwiftType::int());
        assert_eq!(
            map_spelled_type("unsigned long long", &ctx()),
            SwiftType::nominal("UInt")
        );
        assert_eq!(map_spelled_type("CGFloat", &ctx()), SwiftType::nominal("CGFloat"));
    }

    #[test]
    fn maps_object_pointers_with_open_nullability() {
        assert_eq!(
            map_spelled_type("NSString *", &ctx()),
            SwiftType::unspecified(SwiftType::string())
        );
        assert_eq!(
            map_spelled_type("NSString * _Nullable", &ctx()),
            SwiftType::optional(SwiftType::string())
        );
        assert_eq!(
            map_spelled_type("nonnull NSString *", &ctx()),
            SwiftType::string()
        );
    }

    #[test]
    fn maps_generic_collections() {
        assert_eq!(
            map_spelled_type("NSArray<NSString *> *", &ctx()),
            SwiftType::unspecified(SwiftType::Array(Box::new(SwiftType::string())))
        );
        assert_eq!(
            map_spelled_type("NSDictionary<NSString *, Person *> *", &ctx()),
            SwiftType::unspecified(SwiftType::Dictionary(
                Box::new(SwiftType::string()),
                Box::new(SwiftType::unspecified(SwiftType::nominal("Person"))),
            ))
        );
    }

    #[test]
    fn maps_id_and_protocol_qualified_id() {
        assert_eq!(
            map_spelled_type("id", &ctx()),
            SwiftType::unspecified(SwiftType::any_object())
        );
        assert_eq!(
            map_spelled_type("id<NSCopying>", &ctx()),
            SwiftType::unspecified(SwiftType::nominal("NSCopying"))
        );
    }

    #[test]
    fn maps_blocks_to_function_types() {
        assert_eq!(
            map_spelled_type("void (^) ( int , NSString * s )", &ctx()),
            SwiftType::Function {
                parameters: vec![
                    SwiftType::int(),
                    SwiftType::unspecified(SwiftType::string()),
                ],
                returns: Box::new(SwiftType::Void),
            }
        );
    }

    #[test]
    fn maps_primitive_pointers() {
        assert_eq!(
            map_spelled_type("int *", &ctx()),
            SwiftType::Generic("UnsafeMutablePointer".into(), vec![SwiftType::int()])
        );
    }

    #[test]
    fn unknown_names_pass_through_and_are_reported() {
        let ctx = ctx();
        assert_eq!(
            map_spelled_type("CALayer *", &ctx),
            SwiftType::unspecified(SwiftType::nominal("CALayer"))
        );
        assert_eq!(unknown_names("CALayer *", &ctx), vec!["CALayer".to_string()]);
        assert!(unknown_names("Person *", &ctx).is_empty());
    }

    #[test]
    fn ownership_and_constness() {
        assert_eq!(ownership_of("__weak Person *"), Ownership::Weak);
        assert_eq!(ownership_of("NSString *"), Ownership::Strong);
        assert!(is_const("const int"));
        assert!(!is_const("int"));
    }
}
