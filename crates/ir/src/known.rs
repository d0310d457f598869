//! Read-only "known symbol" views over intentions.
//!
//! Passes query types, methods and properties through these interfaces
//! without mutating the graph. The plain descriptor structs also serve as
//! the input to member generation: the conformance-synthesis path hands the
//! graph a [`MethodDescriptor`] or [`PropertyDescriptor`] and receives a
//! fresh intention shaped after it.

use crate::ast::SwiftType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A selector: the ordered colon-terminated pieces of an Objective-C
/// method name. `setObject:forKey:` has the pieces `["setObject", "forKey"]`
/// and takes two arguments; a piece-less selector like `count` takes none.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selector {
    pub pieces: Vec<String>,
    pub takes_arguments: bool,
}

impl Selector {
    pub fn unary(name: impl Into<String>) -> Self {
        Self {
            pieces: vec![name.into()],
            takes_arguments: false,
        }
    }

    pub fn with_arguments(pieces: Vec<String>) -> Self {
        Self {
            pieces,
            takes_arguments: true,
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.takes_arguments {
            for piece in &self.pieces {
                write!(f, "{piece}:")?;
            }
            Ok(())
        } else {
            write!(f, "{}", self.pieces[0])
        }
    }
}

/// A typed parameter of a method or function signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Swift argument label; `None` for `_`.
    pub label: Option<String>,
    /// Internal name used inside the body.
    pub name: String,
    pub ty: SwiftType,
}

/// Signature of a method, initializer or global function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSignature {
    pub is_static: bool,
    pub name: String,
    pub return_type: SwiftType,
    pub parameters: Vec<Parameter>,
}

impl FunctionSignature {
    pub fn new(name: impl Into<String>, return_type: SwiftType) -> Self {
        Self {
            is_static: false,
            name: name.into(),
            return_type,
            parameters: Vec::new(),
        }
    }

    /// The selector this signature answers to: the method name followed by
    /// the argument labels (or internal names where no label exists).
    pub fn selector(&self) -> Selector {
        if self.parameters.is_empty() {
            return Selector::unary(self.name.clone());
        }
        let mut pieces = vec![self.name.clone()];
        for param in self.parameters.iter().skip(1) {
            pieces.push(param.label.clone().unwrap_or_else(|| param.name.clone()));
        }
        Selector::with_arguments(pieces)
    }

    /// Signature equality with nullability dropped: static-ness, name,
    /// parameter count and the null-stripped parameter/return types must
    /// match. Parameter names and labels are not compared.
    pub fn matches(&self, other: &FunctionSignature) -> bool {
        if self.is_static != other.is_static
            || self.name != other.name
            || self.parameters.len() != other.parameters.len()
        {
            return false;
        }
        if self.return_type.dropping_nullability() != other.return_type.dropping_nullability() {
            return false;
        }
        self.parameters
            .iter()
            .zip(&other.parameters)
            .all(|(a, b)| a.ty.dropping_nullability() == b.ty.dropping_nullability())
    }

    /// Selector equality: ignores parameter and return types and variable
    /// names entirely.
    pub fn matches_selector(&self, selector: &Selector) -> bool {
        self.selector() == *selector
    }
}

/// Read-only view of a method-like member.
pub trait KnownMethod {
    fn signature(&self) -> &FunctionSignature;

    fn is_static(&self) -> bool {
        self.signature().is_static
    }
}

/// Read-only view of a property.
pub trait KnownProperty {
    fn name(&self) -> &str;
    fn property_type(&self) -> &SwiftType;
    fn is_readonly(&self) -> bool;
}

/// Read-only view of a type: name, supertype and member lookups by
/// descriptor.
pub trait KnownType {
    fn type_name(&self) -> &str;
    fn supertype_name(&self) -> Option<&str>;
    fn known_method_signatures(&self) -> Vec<FunctionSignature>;
    fn known_property_names(&self) -> Vec<String>;
}

/// Abstract method description, detached from any graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDescriptor {
    pub signature: FunctionSignature,
}

impl KnownMethod for MethodDescriptor {
    fn signature(&self) -> &FunctionSignature {
        &self.signature
    }
}

/// Abstract property description, detached from any graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    pub name: String,
    pub ty: SwiftType,
    pub is_readonly: bool,
}

impl KnownProperty for PropertyDescriptor {
    fn name(&self) -> &str {
        &self.name
    }

    fn property_type(&self) -> &SwiftType {
        &self.ty
    }

    fn is_readonly(&self) -> bool {
        self.is_readonly
    }
}
