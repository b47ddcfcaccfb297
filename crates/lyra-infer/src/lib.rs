//! Constraint-formula reduction for poly expressions.
//!
//! The type checker builds [`Constraint`]s relating an expression or a type
//! to a target type; [`reduce`] turns each one into a boolean verdict, a
//! list of replacement constraints, or "absorbed" when reduction already
//! fed the surrounding inference session's bound set. The bound-set solver
//! itself lives behind the [`InferenceSession`] trait and is driven, never
//! implemented, here.

mod constraint;
mod expr;
mod reduce;
mod session;

pub use constraint::{Constraint, Reduction, Relation, TypeConstraint};
pub use expr::{
    Body, Conditional, Expr, ExprId, ExprResolver, Invocation, Lambda, MethodRef, MethodRefKind,
    PolySite, Standalone,
};
pub use reduce::{input_variables, potentially_compatible, reduce};
pub use session::{Arguments, InferenceFailure, InferenceSession, PolyScope, SuspensionRecord};
