//! Structural operations over interned types: substitution, erasure,
//! properness, supertype traversal, capture conversion and bound
//! computation.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::decl::{ClassId, ClassKind, PrimitiveType, TypeVarId, WildcardKind};
use crate::store::{TyData, TyId, TypeStore};

/// True when no inference variable is reachable from `ty`.
pub fn is_proper(store: &TypeStore, ty: TyId) -> bool {
    fn inner(store: &TypeStore, ty: TyId, seen: &mut HashSet<TyId>) -> bool {
        if !seen.insert(ty) {
            return true;
        }
        match store.data(ty) {
            TyData::InferenceVar(_) => false,
            TyData::Parameterized {
                args, enclosing, ..
            } => {
                args.iter().all(|&a| inner(store, a, seen))
                    && enclosing.map_or(true, |e| inner(store, e, seen))
            }
            TyData::Wildcard {
                bound,
                extra_bounds,
                ..
            } => {
                bound.map_or(true, |b| inner(store, b, seen))
                    && extra_bounds.iter().all(|&b| inner(store, b, seen))
            }
            TyData::Capture {
                upper_bounds,
                lower_bound,
                ..
            } => {
                upper_bounds.iter().all(|&b| inner(store, b, seen))
                    && lower_bound.map_or(true, |b| inner(store, b, seen))
            }
            TyData::Intersection(parts) => parts.iter().all(|&p| inner(store, p, seen)),
            TyData::Array { component, .. } => inner(store, *component, seen),
            _ => true,
        }
    }
    let mut seen = HashSet::new();
    inner(store, ty, &mut seen)
}

/// Collect every inference variable reachable from `ty`.
pub fn collect_inference_vars(store: &TypeStore, ty: TyId, out: &mut Vec<TyId>) {
    fn inner(store: &TypeStore, ty: TyId, seen: &mut HashSet<TyId>, out: &mut Vec<TyId>) {
        if !seen.insert(ty) {
            return;
        }
        match store.data(ty) {
            TyData::InferenceVar(_) => {
                if !out.contains(&ty) {
                    out.push(ty);
                }
            }
            TyData::Parameterized {
                args, enclosing, ..
            } => {
                for &a in args {
                    inner(store, a, seen, out);
                }
                if let Some(e) = enclosing {
                    inner(store, *e, seen, out);
                }
            }
            TyData::Wildcard {
                bound,
                extra_bounds,
                ..
            } => {
                if let Some(b) = bound {
                    inner(store, *b, seen, out);
                }
                for &b in extra_bounds {
                    inner(store, b, seen, out);
                }
            }
            TyData::Capture {
                upper_bounds,
                lower_bound,
                ..
            } => {
                for &b in upper_bounds {
                    inner(store, b, seen, out);
                }
                if let Some(b) = lower_bound {
                    inner(store, *b, seen, out);
                }
            }
            TyData::Intersection(parts) => {
                for &p in parts {
                    inner(store, p, seen, out);
                }
            }
            TyData::Array { component, .. } => inner(store, *component, seen, out),
            _ => {}
        }
    }
    let mut seen = HashSet::new();
    inner(store, ty, &mut seen, out);
}

/// Replace type variables according to `map`, rebuilding derived types
/// through the interning cache. Captures are left untouched.
pub fn substitute(store: &mut TypeStore, ty: TyId, map: &HashMap<TypeVarId, TyId>) -> TyId {
    if map.is_empty() {
        return ty;
    }
    match store.data(ty).clone() {
        TyData::TypeVar(v) => map.get(&v).copied().unwrap_or(ty),
        TyData::Parameterized {
            origin,
            args,
            enclosing,
        } => {
            let args = args.iter().map(|&a| substitute(store, a, map)).collect();
            let enclosing = enclosing.map(|e| substitute(store, e, map));
            store.parameterized(origin, args, enclosing)
        }
        TyData::Wildcard {
            origin,
            rank,
            kind,
            bound,
            extra_bounds,
        } => {
            let bound = bound.map(|b| substitute(store, b, map));
            let extra_bounds = extra_bounds
                .iter()
                .map(|&b| substitute(store, b, map))
                .collect();
            store.wildcard(origin, rank, kind, bound, extra_bounds)
        }
        TyData::Intersection(parts) => {
            let parts = parts.iter().map(|&p| substitute(store, p, map)).collect();
            store.intersection(parts)
        }
        TyData::Array { component, dims } => {
            let component = substitute(store, component, map);
            store.array(component, dims)
        }
        _ => ty,
    }
}

/// Replace whole interned types according to `map`, rebuilding derived
/// types through the interning cache. Used to apply an inference-variable
/// instantiation to a type.
pub fn replace(store: &mut TypeStore, ty: TyId, map: &HashMap<TyId, TyId>) -> TyId {
    if map.is_empty() {
        return ty;
    }
    if let Some(&to) = map.get(&ty) {
        return to;
    }
    match store.data(ty).clone() {
        TyData::Parameterized {
            origin,
            args,
            enclosing,
        } => {
            let args = args.iter().map(|&a| replace(store, a, map)).collect();
            let enclosing = enclosing.map(|e| replace(store, e, map));
            store.parameterized(origin, args, enclosing)
        }
        TyData::Wildcard {
            origin,
            rank,
            kind,
            bound,
            extra_bounds,
        } => {
            let bound = bound.map(|b| replace(store, b, map));
            let extra_bounds = extra_bounds
                .iter()
                .map(|&b| replace(store, b, map))
                .collect();
            store.wildcard(origin, rank, kind, bound, extra_bounds)
        }
        TyData::Intersection(parts) => {
            let parts = parts.iter().map(|&p| replace(store, p, map)).collect();
            store.intersection(parts)
        }
        TyData::Array { component, dims } => {
            let component = replace(store, component, map);
            store.array(component, dims)
        }
        _ => ty,
    }
}

/// True when `ty` is a parameterized type with at least one wildcard
/// argument.
pub fn has_wildcard_args(store: &TypeStore, ty: TyId) -> bool {
    match store.data(ty) {
        TyData::Parameterized { args, .. } => args
            .iter()
            .any(|&a| matches!(store.data(a), TyData::Wildcard { .. })),
        _ => false,
    }
}

/// Erasure of a type (JLS 4.6).
pub fn erasure(store: &mut TypeStore, ty: TyId) -> TyId {
    match store.data(ty).clone() {
        TyData::Parameterized { origin, .. } | TyData::Raw { origin, .. } => {
            store.class_ty(origin, vec![])
        }
        TyData::Array { component, dims } => {
            let component = erasure(store, component);
            store.array(component, dims)
        }
        TyData::Wildcard { bound, .. } => match bound {
            Some(b) => erasure(store, b),
            None => store.object_ty(),
        },
        TyData::Capture { upper_bounds, .. } => match upper_bounds.first() {
            Some(&b) => erasure(store, b),
            None => store.object_ty(),
        },
        TyData::Intersection(parts) => match parts.first() {
            Some(&p) => erasure(store, p),
            None => store.object_ty(),
        },
        TyData::TypeVar(v) => {
            let bound = store
                .type_param(v)
                .and_then(|tp| tp.upper_bounds.first().copied());
            match bound {
                Some(b) => erasure(store, b),
                None => store.object_ty(),
            }
        }
        _ => ty,
    }
}

/// The generic declaration a class-like type originates from.
pub(crate) fn origin_of(store: &TypeStore, ty: TyId) -> Option<ClassId> {
    match store.data(ty) {
        TyData::Class(id) => Some(*id),
        TyData::Parameterized { origin, .. } | TyData::Raw { origin, .. } => Some(*origin),
        _ => None,
    }
}

/// Direct supertype (the declared superclass, substituted) of a type.
pub fn superclass(store: &mut TypeStore, ty: TyId) -> Option<TyId> {
    match store.data(ty).clone() {
        TyData::Class(id) => store.class(id).and_then(|def| def.super_class),
        TyData::Raw { origin, .. } => {
            let sc = store.class(origin).and_then(|def| def.super_class)?;
            Some(erasure(store, sc))
        }
        TyData::Parameterized { origin, args, .. } => {
            let def = store.class(origin)?;
            let sc = def.super_class?;
            let map = substitution_map(def.type_params.clone(), &args);
            Some(substitute(store, sc, &map))
        }
        TyData::Array { .. } => Some(store.object_ty()),
        TyData::Intersection(parts) => crate::intersection::intersection_superclass(store, &parts),
        TyData::Capture { upper_bounds, .. } => upper_bounds.first().copied(),
        TyData::TypeVar(v) => store
            .type_param(v)
            .and_then(|tp| tp.upper_bounds.first().copied()),
        _ => None,
    }
}

/// Declared superinterfaces of a type, substituted.
pub fn superinterfaces(store: &mut TypeStore, ty: TyId) -> Vec<TyId> {
    match store.data(ty).clone() {
        TyData::Class(id) => store
            .class(id)
            .map(|def| def.interfaces.clone())
            .unwrap_or_default(),
        TyData::Raw { origin, .. } => {
            let ifaces = store
                .class(origin)
                .map(|def| def.interfaces.clone())
                .unwrap_or_default();
            ifaces.into_iter().map(|i| erasure(store, i)).collect()
        }
        TyData::Parameterized { origin, args, .. } => {
            let Some(def) = store.class(origin) else {
                return vec![];
            };
            let ifaces = def.interfaces.clone();
            let map = substitution_map(def.type_params.clone(), &args);
            ifaces
                .into_iter()
                .map(|i| substitute(store, i, &map))
                .collect()
        }
        TyData::Intersection(parts) => {
            crate::intersection::intersection_superinterfaces(store, &parts)
        }
        TyData::Capture { upper_bounds, .. } => upper_bounds.get(1..).unwrap_or(&[]).to_vec(),
        TyData::TypeVar(v) => store
            .type_param(v)
            .map(|tp| tp.upper_bounds.get(1..).unwrap_or(&[]).to_vec())
            .unwrap_or_default(),
        _ => vec![],
    }
}

pub(crate) fn substitution_map(params: Vec<TypeVarId>, args: &[TyId]) -> HashMap<TypeVarId, TyId> {
    params
        .into_iter()
        .zip(args.iter().copied())
        .collect()
}

/// View `ty` as an instantiation of the generic declaration `target` by
/// walking the supertype graph with type-argument substitution applied.
///
/// Returns `None` when `target` is not an ancestor, or when intersection or
/// type-variable bounds would yield conflicting instantiations.
pub fn instantiate_as_supertype(store: &mut TypeStore, ty: TyId, target: ClassId) -> Option<TyId> {
    fn inner(
        store: &mut TypeStore,
        ty: TyId,
        target: ClassId,
        seen_vars: &mut HashSet<TypeVarId>,
    ) -> Option<TyId> {
        match store.data(ty).clone() {
            TyData::Array { .. } => {
                let wk = *store.well_known();
                if target == wk.object || target == wk.cloneable || target == wk.serializable {
                    return Some(store.class_ty(target, vec![]));
                }
                return None;
            }
            TyData::Intersection(parts) => {
                let mut out: Option<TyId> = None;
                for part in parts {
                    let Some(found) = inner(store, part, target, seen_vars) else {
                        continue;
                    };
                    match out {
                        None => out = Some(found),
                        Some(existing) if existing == found => {}
                        Some(_) => return None,
                    }
                }
                return out;
            }
            TyData::TypeVar(v) => {
                if !seen_vars.insert(v) {
                    return None;
                }
                let bounds = store
                    .type_param(v)
                    .map(|tp| tp.upper_bounds.clone())
                    .unwrap_or_default();
                let mut out: Option<TyId> = None;
                for bound in bounds {
                    let Some(found) = inner(store, bound, target, seen_vars) else {
                        continue;
                    };
                    match out {
                        None => out = Some(found),
                        Some(existing) if existing == found => {}
                        Some(_) => {
                            seen_vars.remove(&v);
                            return None;
                        }
                    }
                }
                seen_vars.remove(&v);
                return out;
            }
            TyData::Capture { upper_bounds, .. } => {
                for bound in upper_bounds {
                    if let Some(found) = inner(store, bound, target, seen_vars) {
                        return Some(found);
                    }
                }
                return None;
            }
            _ => {}
        }

        let mut queue: VecDeque<TyId> = VecDeque::new();
        let mut visited: HashSet<TyId> = HashSet::new();
        queue.push_back(ty);

        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            let Some(origin) = origin_of(store, current) else {
                continue;
            };
            if origin == target {
                return Some(current);
            }
            if let Some(sc) = superclass(store, current) {
                queue.push_back(sc);
            }
            for iface in superinterfaces(store, current) {
                queue.push_back(iface);
            }
            // Every interface implicitly has Object as a supertype (JLS 4.10.2).
            let is_interface = store
                .class(origin)
                .map(|def| def.kind == ClassKind::Interface)
                .unwrap_or(false);
            if is_interface {
                queue.push_back(store.object_ty());
            }
        }

        None
    }

    let mut seen_vars = HashSet::new();
    inner(store, ty, target, &mut seen_vars)
}

/// Type-argument containment (JLS 4.5.1): `outer` contains `inner`.
pub fn contains(store: &mut TypeStore, outer: TyId, inner: TyId) -> bool {
    if outer == inner {
        return true;
    }
    let outer_data = store.data(outer).clone();
    match outer_data {
        TyData::Wildcard {
            kind: WildcardKind::Unbounded,
            ..
        } => true,
        TyData::Wildcard {
            kind: WildcardKind::Extends,
            bound: Some(t),
            ..
        } => match store.data(inner).clone() {
            TyData::Wildcard {
                kind: WildcardKind::Extends,
                bound: Some(s),
                ..
            } => crate::compat::is_subtype(store, s, t),
            TyData::Wildcard {
                kind: WildcardKind::Unbounded,
                ..
            } => t == store.object_ty(),
            _ => crate::compat::is_subtype(store, inner, t),
        },
        TyData::Wildcard {
            kind: WildcardKind::Super,
            bound: Some(t),
            ..
        } => match store.data(inner).clone() {
            TyData::Wildcard {
                kind: WildcardKind::Super,
                bound: Some(s),
                ..
            } => crate::compat::is_subtype(store, t, s),
            TyData::Wildcard { .. } => false,
            _ => crate::compat::is_subtype(store, t, inner),
        },
        _ => false,
    }
}

/// Greatest lower bound of two reference types (JLS 5.1.10 glb).
pub fn glb(store: &mut TypeStore, a: TyId, b: TyId) -> TyId {
    if a == b {
        return a;
    }
    if crate::compat::is_subtype(store, a, b) {
        return a;
    }
    if crate::compat::is_subtype(store, b, a) {
        return b;
    }
    store.intersection(vec![a, b])
}

/// Capture conversion (JLS 5.1.10): allocate a fresh capture for every
/// wildcard argument of a parameterized type. Other types are returned
/// unchanged.
pub fn capture_conversion(store: &mut TypeStore, ty: TyId) -> TyId {
    let TyData::Parameterized {
        origin,
        args,
        enclosing,
    } = store.data(ty).clone()
    else {
        return ty;
    };
    if !args
        .iter()
        .any(|&a| matches!(store.data(a), TyData::Wildcard { .. }))
    {
        return ty;
    }
    let mut new_args = Vec::with_capacity(args.len());
    for (idx, &arg) in args.iter().enumerate() {
        if matches!(store.data(arg), TyData::Wildcard { .. }) {
            new_args.push(store.capture(arg, ty, idx as u32));
        } else {
            new_args.push(arg);
        }
    }
    store.parameterized(origin, new_args, enclosing)
}

/// The non-wildcard parameterization of a functional-interface target type
/// (JLS 9.9): each wildcard argument is resolved against the corresponding
/// formal bound.
pub fn non_wildcard_parameterization(store: &mut TypeStore, ty: TyId) -> TyId {
    let TyData::Parameterized {
        origin,
        args,
        enclosing,
    } = store.data(ty).clone()
    else {
        return ty;
    };
    let formals = store
        .class(origin)
        .map(|def| def.type_params.clone())
        .unwrap_or_default();
    let mut new_args = Vec::with_capacity(args.len());
    for (idx, &arg) in args.iter().enumerate() {
        let formal_bound = formals
            .get(idx)
            .and_then(|&tp| store.type_param(tp))
            .and_then(|tp| tp.upper_bounds.first().copied())
            .unwrap_or(store.object_ty());
        let resolved = match store.data(arg).clone() {
            TyData::Wildcard {
                kind: WildcardKind::Unbounded,
                ..
            } => formal_bound,
            TyData::Wildcard {
                kind: WildcardKind::Extends,
                bound: Some(b),
                ..
            } => glb(store, formal_bound, b),
            TyData::Wildcard {
                kind: WildcardKind::Super,
                bound: Some(b),
                ..
            } => b,
            _ => arg,
        };
        new_args.push(resolved);
    }
    store.parameterized(origin, new_args, enclosing)
}

/// Boxed class for a primitive type, when the bootstrap set declares it.
pub(crate) fn boxed_class(store: &TypeStore, p: PrimitiveType) -> Option<ClassId> {
    let name = match p {
        PrimitiveType::Boolean => "java.lang.Boolean",
        PrimitiveType::Byte => "java.lang.Byte",
        PrimitiveType::Short => "java.lang.Short",
        PrimitiveType::Char => "java.lang.Character",
        PrimitiveType::Int => "java.lang.Integer",
        PrimitiveType::Long => "java.lang.Long",
        PrimitiveType::Float => "java.lang.Float",
        PrimitiveType::Double => "java.lang.Double",
    };
    store.class_id(name)
}

pub(crate) fn unboxed_primitive(store: &TypeStore, id: ClassId) -> Option<PrimitiveType> {
    let name = store.class(id)?.name.as_str();
    Some(match name {
        "java.lang.Boolean" => PrimitiveType::Boolean,
        "java.lang.Byte" => PrimitiveType::Byte,
        "java.lang.Short" => PrimitiveType::Short,
        "java.lang.Character" => PrimitiveType::Char,
        "java.lang.Integer" => PrimitiveType::Int,
        "java.lang.Long" => PrimitiveType::Long,
        "java.lang.Float" => PrimitiveType::Float,
        "java.lang.Double" => PrimitiveType::Double,
        _ => return None,
    })
}
