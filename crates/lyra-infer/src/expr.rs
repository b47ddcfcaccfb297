//! Expression shapes the reduction engine dispatches over.
//!
//! Parsing and name resolution live upstream; the engine only needs the
//! shape of an expression, its previously resolved binding, and enough
//! structure to recurse into poly sub-expressions. Expressions are arena
//! allocated and referenced by id.

use serde::{Deserialize, Serialize};

use lyra_types::{MethodSignature, TyId, TypeStore};

/// Id of an expression in a [`Body`] arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExprId(pub u32);

/// Identity of one poly-invocation site, used to key suspension records and
/// nested bound sets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PolySite(pub u32);

#[derive(Debug, Default)]
pub struct Body {
    exprs: Vec<Expr>,
}

impl Body {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, expr: Expr) -> ExprId {
        let id = ExprId(self.exprs.len() as u32);
        self.exprs.push(expr);
        id
    }

    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.0 as usize]
    }
}

/// Every expression shape reduction distinguishes. The engine matches this
/// exhaustively; adding a shape forces every match site to handle it.
#[derive(Clone, Debug)]
pub enum Expr {
    Standalone(Standalone),
    Invocation(Invocation),
    Conditional(Conditional),
    Lambda(Lambda),
    MethodRef(MethodRef),
}

/// An expression whose type does not depend on its context.
#[derive(Clone, Debug)]
pub struct Standalone {
    /// Resolved type; `None` when resolution failed.
    pub ty: Option<TyId>,
    /// Compile-time integer constant value, when known. Enables constant
    /// narrowing in assignment checks.
    pub constant: Option<i64>,
    /// True when a missing type stems from an unresolved inference-variable
    /// receiver rather than a real resolution error.
    pub unresolved_receiver: bool,
}

impl Standalone {
    pub fn typed(ty: TyId) -> Self {
        Self {
            ty: Some(ty),
            constant: None,
            unresolved_receiver: false,
        }
    }
}

/// A method or constructor invocation with its previously chosen binding.
#[derive(Clone, Debug)]
pub struct Invocation {
    pub site: PolySite,
    pub binding: MethodSignature,
    pub args: Vec<ExprId>,
}

#[derive(Clone, Copy, Debug)]
pub struct Conditional {
    pub then_expr: ExprId,
    pub else_expr: ExprId,
}

#[derive(Clone, Debug)]
pub struct Lambda {
    pub site: PolySite,
    /// Declared parameter types; `None` entries are elided.
    pub params: Vec<Option<TyId>>,
    /// Whether the body could complete as a statement (usable against a
    /// void-returning contract).
    pub void_compatible: bool,
    /// Whether every path through the body produces a value.
    pub value_compatible: bool,
    /// The result expressions of the body.
    pub results: Vec<ExprId>,
    /// The lambda's own inferred functional type, when already known.
    pub ty: Option<TyId>,
}

impl Lambda {
    /// True when every parameter carries a declared type (trivially true for
    /// a parameterless lambda).
    pub fn has_explicit_params(&self) -> bool {
        self.params.iter().all(Option::is_some)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MethodRefKind {
    Static,
    Instance,
    Constructor,
}

#[derive(Clone, Debug)]
pub struct MethodRef {
    pub site: PolySite,
    /// Type of the reference's left-hand side.
    pub receiver: TyId,
    pub name: String,
    pub kind: MethodRefKind,
    /// Set when the reference unambiguously names one fixed method or
    /// constructor (no overloads, no instance-bound ambiguity).
    pub exact: bool,
    /// True for a constructor reference through an explicitly parameterized
    /// receiver, e.g. one that names a concrete type argument.
    pub receiver_parameterized: bool,
}

/// Re-resolution callbacks supplied by the AST/resolution layer. Reduction
/// invokes these when a poly expression must be re-examined against a
/// freshly known target type.
pub trait ExprResolver {
    /// The context-free original of an invocation's chosen binding: the
    /// method-level type-argument instantiation discarded, the declaring
    /// type's kept.
    fn shallow_original(&self, site: PolySite) -> Option<MethodSignature>;

    /// Re-resolve a lambda's body against a now-concrete contract. A failed
    /// re-resolution means "cannot reduce further", not "type error".
    fn resolve_lambda_body(
        &mut self,
        store: &mut TypeStore,
        lambda: ExprId,
        sam: &MethodSignature,
    ) -> bool;

    /// Re-resolve a method reference against the target, yielding the
    /// potentially applicable candidate.
    fn resolve_method_ref(
        &mut self,
        store: &mut TypeStore,
        mref: ExprId,
        target: TyId,
    ) -> Option<MethodSignature>;
}
