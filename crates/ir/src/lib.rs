//! Intention graph: the mutable model of the Swift program being
//! synthesised.
//!
//! Intentions form a tree by ownership and a graph by cross-reference. The
//! graph owns every node in an arena; child links and the parent back-edge
//! are typed arena indices, kept in sync on every insert and remove. Slots
//! are never reclaimed individually, the whole graph is dropped at the end
//! of a run.

pub mod ast;
pub mod cfg;
pub mod known;

use serde::{Deserialize, Serialize};

pub use ast::{
    Argument, AssignmentOperator, BinaryOperator, CatchBlock, ClosureParameter, CompoundStatement,
    Constant, Definition, DoStatement, Expression, ExpressionKind, ForInStatement,
    IdentifierExpression, IfStatement, LocalFunction, Ownership, RepeatWhileStatement,
    SourceRange, Statement, StatementKind, SwiftType, SwitchCase, SwitchStatement,
    UnaryOperator, UnknownStatement, VariableDeclaration, WhileStatement,
};
pub use cfg::{CfgEdge, CfgNode, CfgNodeKind, ControlFlowGraph, NodeId, StatementPath};
pub use known::{
    FunctionSignature, KnownMethod, KnownProperty, KnownType, MethodDescriptor, Parameter,
    PropertyDescriptor, Selector,
};

/// Index of an intention within the graph arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IntentionId(pub usize);

/// Provenance back to the Objective-C parse node an intention was derived
/// from: the source range plus the grammar rule name. Read-only after
/// construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Origin {
    pub range: SourceRange,
    pub rule: String,
}

/// Construction-time metadata shared by every intention kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntentionMeta {
    pub origin: Option<Origin>,
    /// Whether the declaration sat inside an `NS_ASSUME_NONNULL` span.
    /// Fixed at collection time, never recomputed.
    pub in_nonnull_context: bool,
}

impl IntentionMeta {
    pub fn nonnull(in_nonnull_context: bool) -> Self {
        Self {
            origin: None,
            in_nonnull_context,
        }
    }

    pub fn with_origin(mut self, range: SourceRange, rule: impl Into<String>) -> Self {
        self.origin = Some(Origin {
            range,
            rule: rule.into(),
        });
        self
    }
}

/// Swift access level of a generated declaration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Access {
    Private,
    FilePrivate,
    #[default]
    Internal,
    Public,
    Open,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileIntention {
    pub path: String,
    /// `true` when the file was collected from a header.
    pub is_header: bool,
    pub imports: Vec<String>,
    pub types: Vec<IntentionId>,
    pub globals: Vec<IntentionId>,
}

impl FileIntention {
    pub fn new(path: impl Into<String>, is_header: bool) -> Self {
        Self {
            path: path.into(),
            is_header,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeKind {
    Class,
    Struct,
    Enum,
    Protocol,
    Extension,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeIntention {
    pub name: String,
    pub kind: TypeKind,
    pub supertype: Option<String>,
    pub access: Access,
    pub properties: Vec<IntentionId>,
    pub methods: Vec<IntentionId>,
    pub conformances: Vec<IntentionId>,
}

impl TypeIntention {
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            supertype: None,
            access: Access::default(),
            properties: Vec::new(),
            methods: Vec::new(),
            conformances: Vec::new(),
        }
    }
}

/// Objective-C property attributes carried through for the passes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyAttribute {
    Readonly,
    Nonatomic,
    Atomic,
    Copy,
    Strong,
    Weak,
    Assign,
    Nullable,
    Nonnull,
    Class,
    Getter(String),
    Setter(String),
}

/// Type, ownership and mutability of a stored value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueStorage {
    pub ty: SwiftType,
    pub ownership: Ownership,
    pub is_constant: bool,
}

impl ValueStorage {
    pub fn variable(ty: SwiftType) -> Self {
        Self {
            ty,
            ownership: Ownership::Strong,
            is_constant: false,
        }
    }

    pub fn constant(ty: SwiftType) -> Self {
        Self {
            ty,
            ownership: Ownership::Strong,
            is_constant: true,
        }
    }
}

/// A lowered statement block owned by a method or accessor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionBody {
    pub statements: CompoundStatement,
}

impl FunctionBody {
    pub fn new(statements: CompoundStatement) -> Self {
        Self { statements }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySetter {
    /// Name bound to the incoming value, `newValue` by convention.
    pub value_name: String,
    pub body: FunctionBody,
}

/// How the property materialises in Swift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyMode {
    /// Plain stored variable.
    Field,
    /// `{ get }` computed property.
    Computed { getter: FunctionBody },
    /// Full `{ get set }` pair.
    Accessors {
        getter: FunctionBody,
        setter: PropertySetter,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyIntention {
    pub name: String,
    pub storage: ValueStorage,
    pub attributes: Vec<PropertyAttribute>,
    pub mode: PropertyMode,
    pub initial_value: Option<Expression>,
}

impl PropertyIntention {
    pub fn field(name: impl Into<String>, storage: ValueStorage) -> Self {
        Self {
            name: name.into(),
            storage,
            attributes: Vec::new(),
            mode: PropertyMode::Field,
            initial_value: None,
        }
    }

    pub fn is_readonly(&self) -> bool {
        self.attributes.contains(&PropertyAttribute::Readonly)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MethodKind {
    Method,
    Initializer,
    GlobalFunction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodIntention {
    pub kind: MethodKind,
    pub signature: FunctionSignature,
    pub access: Access,
    pub body: Option<FunctionBody>,
}

impl MethodIntention {
    pub fn new(kind: MethodKind, signature: FunctionSignature) -> Self {
        Self {
            kind,
            signature,
            access: Access::default(),
            body: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalVariableIntention {
    pub name: String,
    pub storage: ValueStorage,
    pub initial_value: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConformanceIntention {
    pub protocol_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IntentionKind {
    File(FileIntention),
    Type(TypeIntention),
    Property(PropertyIntention),
    Method(MethodIntention),
    GlobalVariable(GlobalVariableIntention),
    Conformance(ConformanceIntention),
}

/// One node of the intention graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intention {
    pub id: IntentionId,
    pub parent: Option<IntentionId>,
    pub origin: Option<Origin>,
    pub in_nonnull_context: bool,
    pub kind: IntentionKind,
}

/// The arena of intentions for one translation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntentionGraph {
    nodes: Vec<Intention>,
    files: Vec<IntentionId>,
}

impl IntentionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, kind: IntentionKind, meta: IntentionMeta) -> IntentionId {
        let id = IntentionId(self.nodes.len());
        self.nodes.push(Intention {
            id,
            parent: None,
            origin: meta.origin,
            in_nonnull_context: meta.in_nonnull_context,
            kind,
        });
        id
    }

    pub fn intention(&self, id: IntentionId) -> &Intention {
        &self.nodes[id.0]
    }

    pub fn intention_mut(&mut self, id: IntentionId) -> &mut Intention {
        &mut self.nodes[id.0]
    }

    /// Every intention ever created, in creation order. Unlinked nodes stay
    /// in the arena with `parent == None`.
    pub fn intentions(&self) -> impl Iterator<Item = &Intention> {
        self.nodes.iter()
    }

    pub fn files(&self) -> &[IntentionId] {
        &self.files
    }

    // -- typed accessors ---------------------------------------------------

    pub fn file(&self, id: IntentionId) -> Option<&FileIntention> {
        match &self.intention(id).kind {
            IntentionKind::File(f) => Some(f),
            _ => None,
        }
    }

    pub fn file_mut(&mut self, id: IntentionId) -> Option<&mut FileIntention> {
        match &mut self.intention_mut(id).kind {
            IntentionKind::File(f) => Some(f),
            _ => None,
        }
    }

    pub fn type_intention(&self, id: IntentionId) -> Option<&TypeIntention> {
        match &self.intention(id).kind {
            IntentionKind::Type(t) => Some(t),
            _ => None,
        }
    }

    pub fn type_intention_mut(&mut self, id: IntentionId) -> Option<&mut TypeIntention> {
        match &mut self.intention_mut(id).kind {
            IntentionKind::Type(t) => Some(t),
            _ => None,
        }
    }

    pub fn property(&self, id: IntentionId) -> Option<&PropertyIntention> {
        match &self.intention(id).kind {
            IntentionKind::Property(p) => Some(p),
            _ => None,
        }
    }

    pub fn property_mut(&mut self, id: IntentionId) -> Option<&mut PropertyIntention> {
        match &mut self.intention_mut(id).kind {
            IntentionKind::Property(p) => Some(p),
            _ => None,
        }
    }

    pub fn method(&self, id: IntentionId) -> Option<&MethodIntention> {
        match &self.intention(id).kind {
            IntentionKind::Method(m) => Some(m),
            _ => None,
        }
    }

    pub fn method_mut(&mut self, id: IntentionId) -> Option<&mut MethodIntention> {
        match &mut self.intention_mut(id).kind {
            IntentionKind::Method(m) => Some(m),
            _ => None,
        }
    }

    pub fn global_variable(&self, id: IntentionId) -> Option<&GlobalVariableIntention> {
        match &self.intention(id).kind {
            IntentionKind::GlobalVariable(g) => Some(g),
            _ => None,
        }
    }

    pub fn conformance(&self, id: IntentionId) -> Option<&ConformanceIntention> {
        match &self.intention(id).kind {
            IntentionKind::Conformance(c) => Some(c),
            _ => None,
        }
    }

    // -- insertion ---------------------------------------------------------

    pub fn add_file(&mut self, file: FileIntention, meta: IntentionMeta) -> IntentionId {
        let id = self.push(IntentionKind::File(file), meta);
        self.files.push(id);
        id
    }

    /// Inserts a type into a file, at `index` or at the end. The parent
    /// back-edge is set as part of the insertion; untouched siblings keep
    /// their relative order.
    pub fn add_type_at(
        &mut self,
        file: IntentionId,
        ty: TypeIntention,
        index: Option<usize>,
        meta: IntentionMeta,
    ) -> IntentionId {
        let id = self.push(IntentionKind::Type(ty), meta);
        let list = &mut self
            .file_mut(file)
            .expect("parent of a type must be a file")
            .types;
        match index {
            Some(i) if i <= list.len() => list.insert(i, id),
            _ => list.push(id),
        }
        self.nodes[id.0].parent = Some(file);
        id
    }

    pub fn add_type(
        &mut self,
        file: IntentionId,
        ty: TypeIntention,
        meta: IntentionMeta,
    ) -> IntentionId {
        self.add_type_at(file, ty, None, meta)
    }

    pub fn add_property_at(
        &mut self,
        ty: IntentionId,
        property: PropertyIntention,
        index: Option<usize>,
        meta: IntentionMeta,
    ) -> IntentionId {
        let id = self.push(IntentionKind::Property(property), meta);
        let list = &mut self
            .type_intention_mut(ty)
            .expect("parent of a property must be a type")
            .properties;
        match index {
            Some(i) if i <= list.len() => list.insert(i, id),
            _ => list.push(id),
        }
        self.nodes[id.0].parent = Some(ty);
        id
    }

    pub fn add_property(
        &mut self,
        ty: IntentionId,
        property: PropertyIntention,
        meta: IntentionMeta,
    ) -> IntentionId {
        self.add_property_at(ty, property, None, meta)
    }

    pub fn add_method_at(
        &mut self,
        ty: IntentionId,
        method: MethodIntention,
        index: Option<usize>,
        meta: IntentionMeta,
    ) -> IntentionId {
        let id = self.push(IntentionKind::Method(method), meta);
        let list = &mut self
            .type_intention_mut(ty)
            .expect("parent of a method must be a type")
            .methods;
        match index {
            Some(i) if i <= list.len() => list.insert(i, id),
            _ => list.push(id),
        }
        self.nodes[id.0].parent = Some(ty);
        id
    }

    pub fn add_method(
        &mut self,
        ty: IntentionId,
        method: MethodIntention,
        meta: IntentionMeta,
    ) -> IntentionId {
        self.add_method_at(ty, method, None, meta)
    }

    pub fn add_conformance(
        &mut self,
        ty: IntentionId,
        protocol_name: impl Into<String>,
        meta: IntentionMeta,
    ) -> IntentionId {
        let id = self.push(
            IntentionKind::Conformance(ConformanceIntention {
                protocol_name: protocol_name.into(),
            }),
            meta,
        );
        self.type_intention_mut(ty)
            .expect("parent of a conformance must be a type")
            .conformances
            .push(id);
        self.nodes[id.0].parent = Some(ty);
        id
    }

    /// Adds a global variable or global function to a file.
    pub fn add_global(
        &mut self,
        file: IntentionId,
        kind: IntentionKind,
        meta: IntentionMeta,
    ) -> IntentionId {
        debug_assert!(
            matches!(
                kind,
                IntentionKind::GlobalVariable(_) | IntentionKind::Method(_)
            ),
            "file globals are variables or functions"
        );
        let id = self.push(kind, meta);
        self.file_mut(file)
            .expect("parent of a global must be a file")
            .globals
            .push(id);
        self.nodes[id.0].parent = Some(file);
        id
    }

    // -- removal -----------------------------------------------------------

    /// Unlinks an intention from its parent. The parent back-edge is cleared
    /// before the child entry is removed; the arena slot survives so other
    /// ids stay valid.
    pub fn remove_from_parent(&mut self, id: IntentionId) {
        let Some(parent) = self.nodes[id.0].parent.take() else {
            return;
        };
        let removed = match &mut self.nodes[parent.0].kind {
            IntentionKind::File(f) => {
                let before = f.types.len() + f.globals.len();
                f.types.retain(|&c| c != id);
                f.globals.retain(|&c| c != id);
                before != f.types.len() + f.globals.len()
            }
            IntentionKind::Type(t) => {
                let before = t.properties.len() + t.methods.len() + t.conformances.len();
                t.properties.retain(|&c| c != id);
                t.methods.retain(|&c| c != id);
                t.conformances.retain(|&c| c != id);
                before != t.properties.len() + t.methods.len() + t.conformances.len()
            }
            _ => false,
        };
        debug_assert!(removed, "parent did not list the removed child");
    }

    /// Re-parents a child intention onto a new owner of the same child
    /// class. Used when merging type fragments.
    pub fn reparent_member(&mut self, id: IntentionId, new_type: IntentionId) {
        self.remove_from_parent(id);
        let is_property = matches!(self.nodes[id.0].kind, IntentionKind::Property(_));
        let is_method = matches!(self.nodes[id.0].kind, IntentionKind::Method(_));
        let is_conformance = matches!(self.nodes[id.0].kind, IntentionKind::Conformance(_));
        let list = match (
            is_property,
            is_method,
            is_conformance,
            self.type_intention_mut(new_type),
        ) {
            (true, _, _, Some(t)) => &mut t.properties,
            (_, true, _, Some(t)) => &mut t.methods,
            (_, _, true, Some(t)) => &mut t.conformances,
            _ => panic!("reparent target must be a type accepting this member"),
        };
        list.push(id);
        self.nodes[id.0].parent = Some(new_type);
    }

    // -- lookup ------------------------------------------------------------

    /// Ids of every type intention, in file order then insertion order.
    pub fn type_ids(&self) -> Vec<IntentionId> {
        let mut out = Vec::new();
        for &file in &self.files {
            if let Some(f) = self.file(file) {
                out.extend(f.types.iter().copied());
            }
        }
        out
    }

    /// First type with the given name, in file order. Type identity is the
    /// fully-qualified name, so fragments of a split type all answer here.
    pub fn type_named(&self, name: &str) -> Option<IntentionId> {
        self.type_ids()
            .into_iter()
            .find(|&id| self.type_intention(id).map(|t| t.name.as_str()) == Some(name))
    }

    pub fn property_named(&self, ty: IntentionId, name: &str) -> Option<IntentionId> {
        let t = self.type_intention(ty)?;
        t.properties
            .iter()
            .copied()
            .find(|&id| self.property(id).map(|p| p.name.as_str()) == Some(name))
    }

    /// Finds a method by signature, compared with nullability dropped.
    pub fn method_with_signature(
        &self,
        ty: IntentionId,
        signature: &FunctionSignature,
    ) -> Option<IntentionId> {
        let t = self.type_intention(ty)?;
        t.methods
            .iter()
            .copied()
            .find(|&id| {
                self.method(id)
                    .is_some_and(|m| m.signature.matches(signature))
            })
    }

    /// Finds a method by selector, ignoring parameter and return types and
    /// variable names.
    pub fn method_matching_selector(
        &self,
        ty: IntentionId,
        selector: &Selector,
    ) -> Option<IntentionId> {
        let t = self.type_intention(ty)?;
        t.methods
            .iter()
            .copied()
            .find(|&id| {
                self.method(id)
                    .is_some_and(|m| m.signature.matches_selector(selector))
            })
    }

    pub fn conformance_named(&self, ty: IntentionId, protocol_name: &str) -> Option<IntentionId> {
        let t = self.type_intention(ty)?;
        t.conformances.iter().copied().find(|&id| {
            self.conformance(id).map(|c| c.protocol_name.as_str()) == Some(protocol_name)
        })
    }

    // -- generation from descriptors ---------------------------------------

    /// Materialises a method intention from an abstract descriptor. The new
    /// member inherits the nonnull context of its enclosing type.
    pub fn generate_method(&mut self, ty: IntentionId, known: &dyn KnownMethod) -> IntentionId {
        let nonnull = self.intention(ty).in_nonnull_context;
        let method = MethodIntention::new(MethodKind::Method, known.signature().clone());
        self.add_method(ty, method, IntentionMeta::nonnull(nonnull))
    }

    /// Materialises a stored property intention from an abstract descriptor.
    pub fn generate_property(&mut self, ty: IntentionId, known: &dyn KnownProperty) -> IntentionId {
        let nonnull = self.intention(ty).in_nonnull_context;
        let mut property = PropertyIntention::field(
            known.name().to_string(),
            ValueStorage::variable(known.property_type().clone()),
        );
        if known.is_readonly() {
            property.attributes.push(PropertyAttribute::Readonly);
        }
        self.add_property(ty, property, IntentionMeta::nonnull(nonnull))
    }
}

impl KnownType for TypeIntentionView<'_> {
    fn type_name(&self) -> &str {
        &self.ty.name
    }

    fn supertype_name(&self) -> Option<&str> {
        self.ty.supertype.as_deref()
    }

    fn known_method_signatures(&self) -> Vec<FunctionSignature> {
        self.ty
            .methods
            .iter()
            .filter_map(|&id| self.graph.method(id))
            .map(|m| m.signature.clone())
            .collect()
    }

    fn known_property_names(&self) -> Vec<String> {
        self.ty
            .properties
            .iter()
            .filter_map(|&id| self.graph.property(id))
            .map(|p| p.name.clone())
            .collect()
    }
}

/// Borrowed read-only view of a type intention, usable wherever a
/// [`KnownType`] is expected.
pub struct TypeIntentionView<'a> {
    pub graph: &'a IntentionGraph,
    pub ty: &'a TypeIntention,
}

impl IntentionGraph {
    pub fn known_type(&self, id: IntentionId) -> Option<TypeIntentionView<'_>> {
        self.type_intention(id)
            .map(|ty| TypeIntentionView { graph: self, ty })
    }
}

impl KnownMethod for MethodIntention {
    fn signature(&self) -> &FunctionSignature {
        &self.signature
    }
}

impl KnownProperty for PropertyIntention {
    fn name(&self) -> &str {
        &self.name
    }

    fn property_type(&self) -> &SwiftType {
        &self.storage.ty
    }

    fn is_readonly(&self) -> bool {
        PropertyIntention::is_readonly(self)
    }
}

#[cfg(test)]
mod tests;
