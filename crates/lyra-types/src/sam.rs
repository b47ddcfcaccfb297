//! Single-abstract-method resolution for functional-interface types.
//!
//! Derives the one callable contract a functional interface exposes,
//! reconciling multiple override-equivalent declarations inherited through
//! diamond-shaped interface hierarchies.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;

use crate::compat::is_subtype;
use crate::decl::{ClassId, ClassKind, MethodDef, MethodSignature, TypeVarId};
use crate::ops::{erasure, non_wildcard_parameterization, substitute, substitution_map};
use crate::store::{TyData, TyId, TypeStore};

/// Sentinel outcome for a type that does not expose a single callable
/// contract. Callers test and branch; nothing unwinds.
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum SamError {
    #[error("not a functional interface: {0}")]
    NotFunctional(&'static str),
}

/// The closure of abstract, non-static, non-default methods a type inherits
/// or declares, with Object redeclarations removed and inherited methods
/// overridden by local declarations dropped.
///
/// Fails only when the type is not an interface; an interface with no
/// abstract methods yields an empty list.
pub fn abstract_contracts(store: &mut TypeStore, ty: TyId) -> Result<Vec<MethodSignature>, SamError> {
    let (origin, map) = interface_instantiation(store, ty)
        .ok_or(SamError::NotFunctional("not an interface type"))?;
    let def = store
        .class(origin)
        .ok_or(SamError::NotFunctional("unknown declaration"))?;
    if def.kind != ClassKind::Interface {
        return Err(SamError::NotFunctional("not an interface"));
    }
    let interfaces = def.interfaces.clone();
    let locals = def.methods.clone();

    let mut contracts: Vec<MethodSignature> = Vec::new();
    for iface in interfaces {
        let iface = substitute(store, iface, &map);
        for inherited in abstract_contracts(store, iface)? {
            if !contracts.contains(&inherited) {
                contracts.push(inherited);
            }
        }
    }

    // Any locally declared method (abstract or not) overrides an inherited
    // contract of the same shape.
    let mut kept = Vec::with_capacity(contracts.len());
    'inherited: for inherited in contracts {
        for local in &locals {
            if local.name == inherited.name && local.params.len() == inherited.params.len() {
                continue 'inherited;
            }
        }
        kept.push(inherited);
    }
    let mut contracts = kept;

    for local in &locals {
        let flags = local.flags;
        if !flags.is_abstract || flags.is_static || flags.is_default {
            continue;
        }
        let sig = substituted_signature(store, origin, local, &map);
        if is_object_redeclaration(store, &sig) {
            continue;
        }
        if !contracts.contains(&sig) {
            contracts.push(sig);
        }
    }
    Ok(contracts)
}

/// Resolve the single abstract method of a functional-interface type.
///
/// Memoized per `(type, replace_wildcards)`. With `replace_wildcards`, a
/// wildcard-parameterized target is first resolved to its non-wildcard
/// parameterization (JLS 9.9).
pub fn single_abstract_method(
    store: &mut TypeStore,
    ty: TyId,
    replace_wildcards: bool,
) -> Result<MethodSignature, SamError> {
    // Intersections take the first constituent whose SAM resolves. This is
    // a first-match policy, not a reconciliation across constituents.
    if let TyData::Intersection(parts) = store.data(ty) {
        let parts = parts.clone();
        for part in parts {
            if let Ok(sig) = single_abstract_method(store, part, replace_wildcards) {
                return Ok(sig);
            }
        }
        return Err(SamError::NotFunctional("no functional constituent"));
    }

    let key = (ty, replace_wildcards);
    if let Some(memo) = store.sam_memo.get(&key) {
        return memo.clone();
    }
    let result = compute_sam(store, ty, replace_wildcards);
    trace!(?ty, replace_wildcards, ok = result.is_ok(), "sam resolved");
    store.sam_memo.insert(key, result.clone());
    result
}

fn compute_sam(
    store: &mut TypeStore,
    ty: TyId,
    replace_wildcards: bool,
) -> Result<MethodSignature, SamError> {
    let mut target = ty;
    if replace_wildcards {
        target = non_wildcard_parameterization(store, ty);
    }
    let contracts = abstract_contracts(store, target)?;
    let Some(first) = contracts.first() else {
        return Err(SamError::NotFunctional("no abstract method"));
    };

    // A functional interface exposes exactly one method shape.
    let shape = (first.name.clone(), first.params.len());
    if contracts
        .iter()
        .any(|c| (c.name.as_str(), c.params.len()) != (shape.0.as_str(), shape.1))
    {
        return Err(SamError::NotFunctional("conflicting method shapes"));
    }
    if let [only] = contracts.as_slice() {
        return Ok(only.clone());
    }

    // Diamond inheritance: several override-equivalent contracts. Pick a
    // candidate substitutable for every other contract and synthesize the
    // unified signature from it.
    let winner = contracts
        .iter()
        .find(|cand| {
            contracts
                .iter()
                .all(|other| substitutable(store, cand, other))
        })
        .cloned()
        .ok_or(SamError::NotFunctional("no most specific contract"))?;

    let renamed: Vec<MethodSignature> = contracts
        .iter()
        .map(|c| rename_type_params(store, c, &winner.type_params))
        .collect();

    // Most specific return type compatible with every contract.
    let mut return_type = winner.return_type;
    for c in &renamed {
        if is_subtype(store, c.return_type, return_type) {
            return_type = c.return_type;
        }
    }

    // Most general parameter types compatible with every contract.
    let mut params = winner.params.clone();
    for c in &renamed {
        for (idx, &p) in c.params.iter().enumerate() {
            if is_subtype(store, params[idx], p) {
                params[idx] = p;
            }
        }
    }

    // Thrown-exception intersection closure: an exception from any contract
    // is kept only when every contract's throws clause covers it, directly
    // or via a supertype.
    let mut throws: Vec<TyId> = Vec::new();
    for c in &renamed {
        for &e in &c.throws {
            if throws.contains(&e) {
                continue;
            }
            let covered = renamed
                .iter()
                .all(|other| other.throws.iter().any(|&t| is_subtype(store, e, t)));
            if covered {
                throws.push(e);
            }
        }
    }

    Ok(MethodSignature {
        params,
        return_type,
        throws,
        ..winner
    })
}

/// `cand` is substitutable for `other` when its parameter types are the
/// same or more general and its return type is compatible with `other`'s.
fn substitutable(store: &mut TypeStore, cand: &MethodSignature, other: &MethodSignature) -> bool {
    if cand.name != other.name || cand.params.len() != other.params.len() {
        return false;
    }
    let other = rename_type_params(store, other, &cand.type_params);
    for (&cp, &op) in cand.params.iter().zip(other.params.iter()) {
        if cp != op && !is_subtype(store, op, cp) {
            return false;
        }
    }
    cand.return_type == other.return_type || is_subtype(store, cand.return_type, other.return_type)
}

/// Rename a signature's own type parameters to `target` ones (positionally)
/// so generic contracts compare consistently.
fn rename_type_params(
    store: &mut TypeStore,
    sig: &MethodSignature,
    target: &[TypeVarId],
) -> MethodSignature {
    if sig.type_params.is_empty() || sig.type_params.len() != target.len() {
        return sig.clone();
    }
    let mut map: HashMap<TypeVarId, TyId> = HashMap::new();
    for (&own, &to) in sig.type_params.iter().zip(target.iter()) {
        let to_ty = store.ty_var(to);
        map.insert(own, to_ty);
    }
    MethodSignature {
        name: sig.name.clone(),
        owner: sig.owner,
        type_params: target.to_vec(),
        params: sig.params.iter().map(|&p| substitute(store, p, &map)).collect(),
        return_type: substitute(store, sig.return_type, &map),
        throws: sig.throws.iter().map(|&t| substitute(store, t, &map)).collect(),
        flags: sig.flags,
    }
}

fn substituted_signature(
    store: &mut TypeStore,
    owner: ClassId,
    def: &MethodDef,
    map: &HashMap<TypeVarId, TyId>,
) -> MethodSignature {
    MethodSignature {
        name: def.name.clone(),
        owner,
        type_params: def.type_params.clone(),
        params: def.params.iter().map(|&p| substitute(store, p, map)).collect(),
        return_type: substitute(store, def.return_type, map),
        throws: def.throws.iter().map(|&t| substitute(store, t, map)).collect(),
        flags: def.flags,
    }
}

/// The interface declaration and substitution a class-like type denotes.
fn interface_instantiation(
    store: &mut TypeStore,
    ty: TyId,
) -> Option<(ClassId, HashMap<TypeVarId, TyId>)> {
    match store.data(ty).clone() {
        TyData::Class(id) => Some((id, HashMap::new())),
        TyData::Parameterized { origin, args, .. } => {
            let params = store.class(origin)?.type_params.clone();
            Some((origin, substitution_map(params, &args)))
        }
        TyData::Raw { origin, .. } => {
            // Raw use: the contract is viewed through erased bounds.
            let params = store.class(origin)?.type_params.clone();
            let mut map = HashMap::new();
            for tp in params {
                let var_ty = store.ty_var(tp);
                let erased = erasure(store, var_ty);
                map.insert(tp, erased);
            }
            Some((origin, map))
        }
        _ => None,
    }
}

fn is_object_redeclaration(store: &mut TypeStore, sig: &MethodSignature) -> bool {
    let object_ty = store.object_ty();
    match sig.name.as_str() {
        "equals" => sig.params == [object_ty],
        "hashCode" | "toString" => sig.params.is_empty(),
        _ => false,
    }
}
