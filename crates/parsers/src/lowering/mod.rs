//! Lowering from parse-tree contexts into the Swift AST and the intention
//! graph. Dispatch is flat: each reader matches on the context rule and
//! calls a free function, so individual rules stay testable in isolation.

pub mod decl;
pub mod expr;
pub mod stmt;

use crate::typemap::TypeMapperContext;

pub use decl::{collect_known_names, lower_translation_unit};
pub use expr::read_expression;
pub use stmt::{read_compound, read_statement};

/// Per-file lowering state: where the contexts came from and the per-run
/// type-mapper tables.
pub struct LoweringContext<'a> {
    pub file: String,
    pub is_header: bool,
    pub mapper: &'a TypeMapperContext,
}

impl<'a> LoweringContext<'a> {
    pub fn new(file: impl Into<String>, is_header: bool, mapper: &'a TypeMapperContext) -> Self {
        Self {
            file: file.into(),
            is_header,
            mapper,
        }
    }
}
