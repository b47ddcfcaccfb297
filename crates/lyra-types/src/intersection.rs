//! Operations on intersection types (`A & B & ...`).
//!
//! Constituents are stored once in the interned [`crate::TyData::Intersection`]
//! and shared by every query; nothing here copies the list except to iterate.

use crate::compat::{is_compatible_in, is_subtype, CompatQuery};
use crate::decl::WildcardKind;
use crate::store::{TyData, TyId, TypeStore};

/// Compatibility of an intersection with `other`.
///
/// When `other` is itself an intersection (directly, or through the bound of
/// an `extends` wildcard), every required constituent of `other` must be
/// satisfied by a distinct constituent of the intersection, matched greedily.
/// Otherwise a single compatible constituent suffices.
pub fn intersection_is_compatible(
    store: &mut TypeStore,
    parts: &[TyId],
    other: TyId,
    query: CompatQuery,
) -> bool {
    if let Some(required) = required_constituents(store, other) {
        // Greedy bipartite matching: each of our constituents consumes the
        // first still-unsatisfied requirement it is compatible with.
        let mut satisfied = vec![false; required.len()];
        for &part in parts {
            for (idx, &req) in required.iter().enumerate() {
                if satisfied[idx] {
                    continue;
                }
                if is_compatible_in(store, part, req, query) {
                    satisfied[idx] = true;
                    break;
                }
            }
        }
        return satisfied.iter().all(|&s| s);
    }
    parts
        .iter()
        .any(|&part| is_compatible_in(store, part, other, query))
}

/// The constituent list `other` demands, when it is intersection-shaped.
fn required_constituents(store: &TypeStore, other: TyId) -> Option<Vec<TyId>> {
    match store.data(other) {
        TyData::Intersection(parts) => Some(parts.clone()),
        TyData::Wildcard {
            kind: WildcardKind::Extends,
            bound: Some(bound),
            ..
        } => match store.data(*bound) {
            TyData::Intersection(parts) => Some(parts.clone()),
            _ => None,
        },
        _ => None,
    }
}

pub fn intersection_is_subtype(store: &mut TypeStore, parts: &[TyId], other: TyId) -> bool {
    parts.iter().any(|&part| is_subtype(store, part, other))
}

/// First constituent when it is a class, else the synthesized top-type
/// superclass.
pub fn intersection_superclass(store: &mut TypeStore, parts: &[TyId]) -> Option<TyId> {
    let first = *parts.first()?;
    let is_class = match store.data(first) {
        TyData::Class(id) => store
            .class(*id)
            .map(|def| def.kind == crate::ClassKind::Class)
            .unwrap_or(false),
        TyData::Parameterized { origin, .. } | TyData::Raw { origin, .. } => store
            .class(*origin)
            .map(|def| def.kind == crate::ClassKind::Class)
            .unwrap_or(false),
        TyData::Array { .. } => true,
        _ => false,
    };
    if is_class {
        Some(first)
    } else {
        Some(store.object_ty())
    }
}

pub fn intersection_superinterfaces(store: &mut TypeStore, parts: &[TyId]) -> Vec<TyId> {
    let superclass = intersection_superclass(store, parts);
    parts
        .iter()
        .copied()
        .filter(|&p| Some(p) != superclass)
        .collect()
}
