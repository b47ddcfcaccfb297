//! The compatibility oracle: memoized assignment-compatibility and subtype
//! tests between interned types.
//!
//! Both entry points are recursion-safe: `is_compatible_in` stores a
//! tentative `false` memo entry before computing the structural answer, and
//! `is_subtype` keeps an in-progress pair set in the store. Mutually
//! referential generic bounds therefore terminate (answering false for the
//! cyclic leg) instead of looping.

use tracing::trace;

use crate::decl::{ClassKind, PrimitiveType, WildcardKind};
use crate::intersection::{intersection_is_compatible, intersection_is_subtype};
use crate::ops::{
    boxed_class, capture_conversion, instantiate_as_supertype, origin_of, unboxed_primitive,
};
use crate::store::{TyData, TyId, TypeStore};

#[derive(Clone, Copy, Debug)]
pub(crate) struct CompatMemo {
    pub result: bool,
    /// Whether the entry was computed with a capture scope supplied. An
    /// unscoped entry is invalidated when a scoped query arrives: a capture
    /// scope can unlock compatibility not visible without one.
    pub scoped: bool,
}

/// Contextual knobs for one compatibility query.
#[derive(Clone, Copy, Debug, Default)]
pub struct CompatQuery {
    /// Context type in which type-variable bounds may be capture-converted.
    pub capture_context: Option<TyId>,
    /// Set while reducing inside a nested lambda's own inference: an open
    /// inference variable on the right-hand side cannot yet refute
    /// compatibility, so it is treated as trivially satisfiable.
    pub lenient_inference_vars: bool,
}

impl CompatQuery {
    pub fn with_capture_context(context: TyId) -> Self {
        Self {
            capture_context: Some(context),
            ..Self::default()
        }
    }
}

pub fn is_compatible(store: &mut TypeStore, a: TyId, b: TyId) -> bool {
    is_compatible_in(store, a, b, CompatQuery::default())
}

pub fn is_compatible_in(store: &mut TypeStore, a: TyId, b: TyId, query: CompatQuery) -> bool {
    if a == b {
        return true;
    }
    if b == store.object_ty() {
        return true;
    }
    if matches!(store.data(a), TyData::Error) || matches!(store.data(b), TyData::Error) {
        // Missing declarations were already reported upstream; stay quiet.
        return true;
    }

    let key = (a, b);
    if let Some(memo) = store.compat_memo.get(&key) {
        let invalidated = !memo.scoped && query.capture_context.is_some();
        if !invalidated {
            return memo.result;
        }
    }
    // Tentative entry breaks the recursion for mutually-referential bounds.
    store.compat_memo.insert(
        key,
        CompatMemo {
            result: false,
            scoped: query.capture_context.is_some(),
        },
    );
    let result = compute_compatible(store, a, b, query);
    store.compat_memo.insert(
        key,
        CompatMemo {
            result,
            scoped: query.capture_context.is_some(),
        },
    );
    trace!(?a, ?b, result, "compatibility computed");
    result
}

fn compute_compatible(store: &mut TypeStore, a: TyId, b: TyId, query: CompatQuery) -> bool {
    if let TyData::Intersection(parts) = store.data(a) {
        let parts = parts.clone();
        return intersection_is_compatible(store, &parts, b, query);
    }

    if equivalent(store, a, b) {
        return true;
    }

    match store.data(b) {
        // Wildcards and intersections admit no widening beyond equivalence
        // at this level.
        TyData::Wildcard { .. } | TyData::Intersection(_) => return false,
        TyData::InferenceVar(_) => return query.lenient_inference_vars,
        _ => {}
    }

    match (store.data(a).clone(), store.data(b).clone()) {
        (TyData::Primitive(p), TyData::Primitive(q)) => return p.widens_to(q),
        (TyData::Primitive(_), _) | (_, TyData::Primitive(_)) => return false,
        (TyData::Null, _) => return store.is_reference(b),
        (_, TyData::Null) | (TyData::Void, _) | (_, TyData::Void) => return false,
        (
            TyData::Array {
                component: ca,
                dims: da,
            },
            TyData::Array {
                component: cb,
                dims: db,
            },
        ) => {
            if da < db {
                return false;
            }
            if da > db {
                // String[][] against Object[]: the extra dimensions stay on
                // the left and compare as a reference component.
                let inner = store.array(ca, da - db);
                return is_compatible_in(store, inner, cb, query);
            }
            if !store.is_reference(ca) || !store.is_reference(cb) {
                return ca == cb;
            }
            return is_compatible_in(store, ca, cb, query);
        }
        (TyData::Array { .. }, _) => {
            let wk = *store.well_known();
            let origin = origin_of(store, b);
            return origin == Some(wk.object)
                || origin == Some(wk.cloneable)
                || origin == Some(wk.serializable);
        }
        _ => {}
    }

    let b_kind = origin_of(store, b).and_then(|id| store.class(id).map(|def| def.kind));
    match b_kind {
        Some(ClassKind::Interface) => {
            if implements(store, a, b) {
                return true;
            }
            // An unresolved type variable may still reach the interface
            // through a parameterized first bound, visible only after
            // capture conversion in the supplied scope.
            if let TyData::TypeVar(v) = store.data(a) {
                let first_bound = store
                    .type_param(*v)
                    .and_then(|tp| tp.upper_bounds.first().copied());
                if let Some(bound) = first_bound {
                    if matches!(store.data(bound), TyData::Parameterized { .. })
                        && query.capture_context.is_some()
                    {
                        let captured = capture_conversion(store, bound);
                        return is_compatible_in(store, captured, b, query);
                    }
                }
            }
            false
        }
        Some(ClassKind::Class) => {
            let a_is_interface = origin_of(store, a)
                .and_then(|id| store.class(id).map(|def| def.kind == ClassKind::Interface))
                .unwrap_or(false);
            if a_is_interface {
                // Interfaces never widen to unrelated classes.
                return false;
            }
            ancestor_instantiation_matches(store, a, b)
        }
        None => false,
    }
}

/// Direct equivalence: identical type, or same generic origin with pairwise
/// contained type arguments. Raw and parameterized uses of the same origin
/// are mutually assignable (the unchecked warning is not this layer's job).
fn equivalent(store: &mut TypeStore, a: TyId, b: TyId) -> bool {
    if a == b {
        return true;
    }
    let (a_origin, b_origin) = (origin_of(store, a), origin_of(store, b));
    let (Some(a_origin), Some(b_origin)) = (a_origin, b_origin) else {
        return false;
    };
    if a_origin != b_origin {
        return false;
    }
    match (store.data(a).clone(), store.data(b).clone()) {
        (
            TyData::Parameterized {
                args: a_args,
                enclosing: a_enc,
                ..
            },
            TyData::Parameterized {
                args: b_args,
                enclosing: b_enc,
                ..
            },
        ) => {
            a_enc == b_enc
                && a_args.len() == b_args.len()
                && a_args
                    .iter()
                    .zip(b_args.iter())
                    .all(|(&aa, &ba)| crate::ops::contains(store, ba, aa))
        }
        (TyData::Raw { .. }, TyData::Parameterized { .. })
        | (TyData::Parameterized { .. }, TyData::Raw { .. })
        | (TyData::Raw { .. }, TyData::Raw { .. })
        | (TyData::Class(_), TyData::Class(_)) => true,
        _ => false,
    }
}

/// True when `a` implements interface type `b`, searching the full
/// superinterface closure with substitution applied.
fn implements(store: &mut TypeStore, a: TyId, b: TyId) -> bool {
    ancestor_instantiation_matches(store, a, b)
}

/// Find the ancestor of `a` that shares `b`'s generic origin, then require
/// per-argument containment when `b` is parameterized.
fn ancestor_instantiation_matches(store: &mut TypeStore, a: TyId, b: TyId) -> bool {
    let Some(target) = origin_of(store, b) else {
        return false;
    };
    let Some(ancestor) = instantiate_as_supertype(store, a, target) else {
        return false;
    };
    match store.data(b).clone() {
        TyData::Class(_) | TyData::Raw { .. } => true,
        TyData::Parameterized { args: b_args, .. } => match store.data(ancestor).clone() {
            TyData::Parameterized { args: anc_args, .. } => {
                b_args.len() == anc_args.len()
                    && b_args
                        .iter()
                        .zip(anc_args.iter())
                        .all(|(&ba, &aa)| crate::ops::contains(store, ba, aa))
            }
            // A raw ancestor carries no argument information.
            _ => false,
        },
        _ => false,
    }
}

/// Strict subtyping (JLS 4.10), including intersection decomposition on
/// both sides and per-argument containment through the common generic
/// ancestor.
pub fn is_subtype(store: &mut TypeStore, a: TyId, b: TyId) -> bool {
    if a == b {
        return true;
    }
    let key = (a, b);
    if !store.subtype_guard.insert(key) {
        return false;
    }
    let result = compute_subtype(store, a, b);
    store.subtype_guard.remove(&key);
    result
}

fn compute_subtype(store: &mut TypeStore, a: TyId, b: TyId) -> bool {
    if matches!(store.data(a), TyData::Error) || matches!(store.data(b), TyData::Error) {
        return true;
    }
    if b == store.object_ty() {
        return store.is_reference(a);
    }
    if matches!(store.data(a), TyData::Null) {
        return store.is_reference(b);
    }

    // Subtype of an intersection requires subtype of every constituent.
    if let TyData::Intersection(parts) = store.data(b) {
        let parts = parts.clone();
        return parts.iter().all(|&p| is_subtype(store, a, p));
    }
    if let TyData::Intersection(parts) = store.data(a) {
        let parts = parts.clone();
        return intersection_is_subtype(store, &parts, b);
    }

    match (store.data(a).clone(), store.data(b).clone()) {
        (TyData::Primitive(_), _) | (_, TyData::Primitive(_)) => return false,
        (_, TyData::Void) | (TyData::Void, _) => return false,
        (
            TyData::Array {
                component: ca,
                dims: da,
            },
            TyData::Array {
                component: cb,
                dims: db,
            },
        ) => {
            if da < db {
                return false;
            }
            if da > db {
                let inner = store.array(ca, da - db);
                return is_subtype(store, inner, cb);
            }
            if !store.is_reference(ca) || !store.is_reference(cb) {
                return ca == cb;
            }
            return is_subtype(store, ca, cb);
        }
        (TyData::Array { .. }, _) => {
            let wk = *store.well_known();
            let origin = origin_of(store, b);
            return origin == Some(wk.cloneable) || origin == Some(wk.serializable);
        }
        (
            TyData::TypeVar(v),
            _,
        ) => {
            let bounds = store
                .type_param(v)
                .map(|tp| tp.upper_bounds.clone())
                .unwrap_or_default();
            if bounds.iter().any(|&bound| is_subtype(store, bound, b)) {
                return true;
            }
        }
        (TyData::Capture { upper_bounds, .. }, _) => {
            if upper_bounds.iter().any(|&bound| is_subtype(store, bound, b)) {
                return true;
            }
        }
        _ => {}
    }

    match store.data(b).clone() {
        // A capture from a `super` wildcard admits everything below its
        // synthesized lower bound.
        TyData::Capture {
            lower_bound: Some(lower),
            ..
        } => return is_subtype(store, a, lower),
        TyData::Capture { .. } | TyData::TypeVar(_) | TyData::InferenceVar(_) => return false,
        TyData::Wildcard {
            kind: WildcardKind::Unbounded,
            ..
        } => return store.is_reference(a),
        TyData::Wildcard {
            kind: WildcardKind::Extends,
            bound: Some(bound),
            ..
        } => return is_subtype(store, a, bound),
        TyData::Wildcard {
            kind: WildcardKind::Super,
            bound: Some(bound),
            ..
        } => return is_subtype(store, bound, a),
        _ => {}
    }

    ancestor_instantiation_matches(store, a, b)
}

/// Assignment compatibility including boxing, unboxing and primitive
/// widening (JLS 5.2). This is the test reduction uses for proper types.
pub fn is_assignable(store: &mut TypeStore, from: TyId, to: TyId) -> bool {
    if from == to {
        return true;
    }
    match (store.data(from).clone(), store.data(to).clone()) {
        (TyData::Primitive(p), TyData::Primitive(q)) => p.widens_to(q),
        (TyData::Primitive(p), _) => {
            let Some(boxed) = boxed_class(store, p) else {
                return false;
            };
            let boxed_ty = store.class_ty(boxed, vec![]);
            is_compatible(store, boxed_ty, to)
        }
        (_, TyData::Primitive(q)) => {
            let Some(origin) = origin_of(store, from) else {
                return false;
            };
            match unboxed_primitive(store, origin) {
                Some(p) => p.widens_to(q),
                None => false,
            }
        }
        _ => is_compatible(store, from, to),
    }
}

/// Assignment compatibility with constant narrowing: an int constant in
/// range converts to byte, short or char (JLS 5.2).
pub fn is_assignable_with_constant(
    store: &mut TypeStore,
    from: TyId,
    to: TyId,
    constant: Option<i64>,
) -> bool {
    if is_assignable(store, from, to) {
        return true;
    }
    let (Some(value), TyData::Primitive(target)) = (constant, store.data(to)) else {
        return false;
    };
    if !matches!(
        store.data(from),
        TyData::Primitive(PrimitiveType::Int | PrimitiveType::Short | PrimitiveType::Char | PrimitiveType::Byte)
    ) {
        return false;
    }
    match target {
        PrimitiveType::Byte => i8::try_from(value).is_ok(),
        PrimitiveType::Short => i16::try_from(value).is_ok(),
        PrimitiveType::Char => u16::try_from(value).is_ok(),
        _ => false,
    }
}
