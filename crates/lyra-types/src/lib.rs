//! Type universe, interning cache and compatibility oracle for the Lyra
//! Java front end.
//!
//! Every derived type (parameterized, raw, wildcard, capture, array,
//! intersection) is constructed through the session-owned [`TypeStore`] and
//! canonicalized: two requests with structurally equal constituents return
//! the same [`TyId`]. The rest of the front end relies on this to use
//! identity comparison as a fast path before structural comparison.

mod compat;
mod decl;
mod display;
mod intersection;
mod ops;
mod sam;
mod store;

pub use compat::{
    is_assignable, is_assignable_with_constant, is_compatible, is_compatible_in, is_subtype,
    CompatQuery,
};
pub use decl::{
    ClassDef, ClassId, ClassKind, InfVarId, MethodDef, MethodFlags, MethodSignature, PrimitiveType,
    TypeParamDef, TypeVarId, WildcardKind,
};
pub use display::format_type;
pub use intersection::{
    intersection_is_compatible, intersection_is_subtype, intersection_superclass,
    intersection_superinterfaces,
};
pub use ops::{
    capture_conversion, collect_inference_vars, contains, erasure, glb, has_wildcard_args,
    instantiate_as_supertype, is_proper, non_wildcard_parameterization, replace, substitute,
    superclass, superinterfaces,
};
pub use sam::{abstract_contracts, single_abstract_method, SamError};
pub use store::{TyData, TyId, TypeStore, WellKnownTypes};
