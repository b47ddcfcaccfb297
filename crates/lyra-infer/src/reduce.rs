//! The constraint-formula reduction algorithm.
//!
//! [`reduce`] consumes one formula and produces a terminal verdict, a list
//! of replacement formulas, or "absorbed" when the work already landed in
//! the session's bound set. Nested poly invocations open their own
//! inference context through [`PolyScope`]; a hard [`InferenceFailure`]
//! raised inside one collapses to a structural `False` at that boundary, so
//! sibling overload candidates can still be tried.

use std::collections::HashMap;

use tracing::trace;

use lyra_types::{
    capture_conversion, collect_inference_vars, has_wildcard_args, is_assignable_with_constant,
    is_compatible_in, is_proper, is_subtype, non_wildcard_parameterization, replace,
    single_abstract_method, substitute, ClassId, CompatQuery, MethodSignature, TyData, TyId, TypeStore,
    TypeVarId,
};

use crate::constraint::{Constraint, Reduction, Relation, TypeConstraint};
use crate::expr::{Body, Expr, ExprId, ExprResolver, Invocation, Lambda, MethodRef, Standalone};
use crate::session::{Arguments, InferenceFailure, InferenceSession, PolyScope};

/// Reduce one constraint formula inside `session`.
///
/// An `Err` escapes only from the outermost formula; failures inside a
/// nested poly invocation are already converted to `Reduction::False` at
/// the invocation's suspension boundary.
pub fn reduce(
    store: &mut TypeStore,
    body: &Body,
    session: &mut dyn InferenceSession,
    resolver: &mut dyn ExprResolver,
    constraint: &Constraint,
) -> Result<Reduction, InferenceFailure> {
    match *constraint {
        Constraint::Type(tc) => Ok(reduce_type(store, session, tc)),
        Constraint::Expr {
            expr,
            relation,
            target,
        } => reduce_expr(store, body, session, resolver, expr, relation, target),
    }
}

/// A `⟨type rel type⟩` formula. Proper sides get a definitive verdict from
/// the compatibility oracle; an unresolved placeholder defers the formula
/// so the caller records it as a bound instead.
fn reduce_type(
    store: &mut TypeStore,
    session: &mut dyn InferenceSession,
    tc: TypeConstraint,
) -> Reduction {
    if !is_proper(store, tc.left) || !is_proper(store, tc.right) {
        return Reduction::Uncertain;
    }
    let verdict = match tc.relation {
        // Interning makes identity the same-type test.
        Relation::Same => tc.left == tc.right,
        Relation::Subtype => is_subtype(store, tc.left, tc.right),
        Relation::Compatible | Relation::PotentiallyCompatible => {
            is_compatible_in(store, tc.left, tc.right, lenient_query(session))
        }
    };
    Reduction::from_bool(verdict)
}

fn reduce_expr(
    store: &mut TypeStore,
    body: &Body,
    session: &mut dyn InferenceSession,
    resolver: &mut dyn ExprResolver,
    expr: ExprId,
    relation: Relation,
    target: TyId,
) -> Result<Reduction, InferenceFailure> {
    if relation == Relation::PotentiallyCompatible {
        let ok = potentially_compatible(store, body, expr, target);
        return Ok(Reduction::from_bool(ok));
    }

    trace!(?expr, ?relation, "reduce expression constraint");
    match body.expr(expr) {
        Expr::Standalone(plain) => Ok(reduce_standalone(store, session, plain, target)),
        Expr::Invocation(call) => {
            let call = call.clone();
            reduce_invocation(store, session, resolver, &call, target)
        }
        Expr::Conditional(cond) => Ok(Reduction::Replace(vec![
            Constraint::expr(cond.then_expr, relation, target),
            Constraint::expr(cond.else_expr, relation, target),
        ])),
        Expr::Lambda(lambda) => {
            let lambda = lambda.clone();
            reduce_lambda(store, body, session, resolver, expr, &lambda, target)
        }
        Expr::MethodRef(mref) => {
            let mref = mref.clone();
            reduce_method_ref(store, session, resolver, expr, &mref, target)
        }
    }
}

/// A plain (never-poly) expression. With a proper target this is a direct
/// assignability check; otherwise the formula rewrites into a type-only
/// constraint the bound set can hold until the target becomes proper.
fn reduce_standalone(
    store: &mut TypeStore,
    session: &mut dyn InferenceSession,
    plain: &Standalone,
    target: TyId,
) -> Reduction {
    let Some(ty) = plain.ty else {
        // A missing type caused by an unresolved placeholder receiver is
        // not a mismatch, just absent information.
        return if plain.unresolved_receiver {
            Reduction::Uncertain
        } else {
            Reduction::False
        };
    };
    if is_proper(store, target) {
        let ok = is_assignable_with_constant(store, ty, target, plain.constant)
            || is_compatible_in(store, ty, target, lenient_query(session));
        return Reduction::from_bool(ok);
    }
    Reduction::Replace(vec![Constraint::types(ty, Relation::Compatible, target)])
}

/// A (possibly generic) invocation against a target type. Applicability and
/// invocation-type inference run in a nested context around the call site;
/// on success the derived bounds stay in the session and the formula is
/// absorbed.
fn reduce_invocation(
    store: &mut TypeStore,
    session: &mut dyn InferenceSession,
    resolver: &mut dyn ExprResolver,
    call: &Invocation,
    target: TyId,
) -> Result<Reduction, InferenceFailure> {
    // Context-free original of the chosen binding: the method-level
    // type-argument instantiation dropped, the declaring type's kept.
    let original = resolver
        .shallow_original(call.site)
        .unwrap_or_else(|| call.binding.clone());

    // A void invocation cannot satisfy any value context. Raised before the
    // nested context opens, so it reaches this formula's caller instead of
    // being masked as an overload mismatch.
    if original.return_type == store.void_ty() && target != store.void_ty() {
        return Err(InferenceFailure::ValuelessExpression);
    }

    if original.type_params.is_empty() {
        // Non-generic binding: its nested bound set was already computed
        // when the invocation was first resolved; fold it in inside the
        // call's own context so the session attributes it to this site.
        let mut scope = PolyScope::enter(session, call.site);
        scope.session().integrate_inner_bounds(store, call.site);
        return Ok(Reduction::Absorbed);
    }

    let mut scope = PolyScope::enter(session, call.site);
    let outcome = infer_generic_invocation(store, &mut scope, &original, call, target);
    drop(scope);
    match outcome {
        Ok(ok) => Ok(if ok {
            Reduction::Absorbed
        } else {
            Reduction::False
        }),
        // The suspension boundary: a hard failure inside the nested
        // inference fails this one candidate only.
        Err(failure) => {
            trace!(?failure, "nested invocation inference failed");
            Ok(Reduction::False)
        }
    }
}

/// Applicability then invocation-type inference for one generic invocation.
fn infer_generic_invocation(
    store: &mut TypeStore,
    scope: &mut PolyScope<'_>,
    original: &MethodSignature,
    call: &Invocation,
    target: TyId,
) -> Result<bool, InferenceFailure> {
    let placeholders = scope
        .session()
        .create_placeholders(store, &original.type_params);
    let subst = placeholder_map(&original.type_params, &placeholders);
    let instantiated = instantiate_signature(store, original, &subst);

    scope.session().add_parameter_constraints(
        store,
        &instantiated,
        Arguments::Exprs(&call.args),
        instantiated.flags.is_varargs,
    )?;
    scope
        .session()
        .add_throws_constraints(store, &instantiated, call.site)?;

    // Invocation-type inference: the result type against the target.
    let ret = scope.session().substitute(store, instantiated.return_type);
    let propagated = if matches!(store.data(target), TyData::Array { .. }) {
        // An array target needs a concrete component now; solve what the
        // result type reaches and compare the instantiated result directly.
        let solved = scope.session().solve(store, ret)?;
        let ret = replace(store, ret, &solved);
        is_compatible_in(store, ret, target, CompatQuery::default())
    } else {
        let effective_target = if has_wildcard_args(store, target) {
            capture_conversion(store, target)
        } else {
            target
        };
        let constraint = TypeConstraint {
            left: ret,
            relation: Relation::Compatible,
            right: effective_target,
        };
        scope.session().reduce_and_incorporate(store, constraint)?
    };
    if !propagated {
        return Ok(false);
    }
    scope.session().solve(store, ret)?;
    Ok(true)
}

/// A lambda against a functional-interface target.
fn reduce_lambda(
    store: &mut TypeStore,
    body: &Body,
    session: &mut dyn InferenceSession,
    resolver: &mut dyn ExprResolver,
    expr: ExprId,
    lambda: &Lambda,
    target: TyId,
) -> Result<Reduction, InferenceFailure> {
    let Some(ground) = ground_target(store, session, lambda, target)? else {
        return Ok(Reduction::False);
    };
    let Ok(sam) = single_abstract_method(store, ground, true) else {
        return Ok(Reduction::False);
    };

    if lambda.params.len() != sam.params.len() {
        return Ok(Reduction::False);
    }
    if !lambda.has_explicit_params() && sam.params.iter().any(|&p| !is_proper(store, p)) {
        return Ok(Reduction::False);
    }

    // A failed body re-resolution means "cannot reduce further", not a type
    // error; the error surfaces when the body is finally checked.
    if !resolver.resolve_lambda_body(store, expr, &sam) {
        return Ok(Reduction::False);
    }

    let returns_void = sam.return_type == store.void_ty();
    if returns_void && !lambda.void_compatible {
        return Ok(Reduction::False);
    }
    if !returns_void && !lambda.value_compatible {
        return Ok(Reduction::False);
    }

    let mut out = Vec::new();
    if lambda.has_explicit_params() {
        for (declared, &sam_param) in lambda.params.iter().zip(&sam.params) {
            if let Some(declared) = *declared {
                out.push(Constraint::types(declared, Relation::Same, sam_param));
            }
        }
        if let Some(lambda_ty) = lambda.ty {
            out.push(Constraint::types(lambda_ty, Relation::Subtype, target));
        }
    }
    if !returns_void {
        let ret_proper = is_proper(store, sam.return_type);
        for &result in &lambda.results {
            if let (true, Some((ty, constant))) = (ret_proper, known_value(body, result)) {
                if !is_assignable_with_constant(store, ty, sam.return_type, constant) {
                    return Ok(Reduction::False);
                }
            } else {
                out.push(Constraint::expr(result, Relation::Compatible, sam.return_type));
            }
        }
    }
    if out.is_empty() {
        Ok(Reduction::True)
    } else {
        Ok(Reduction::Replace(out))
    }
}

/// Resolve a wildcard-parameterized functional target to its ground type.
///
/// Elided-parameter lambdas take the structural non-wildcard
/// parameterization; explicit parameter types instead drive a nested
/// inference over the interface's own type parameters.
fn ground_target(
    store: &mut TypeStore,
    session: &mut dyn InferenceSession,
    lambda: &Lambda,
    target: TyId,
) -> Result<Option<TyId>, InferenceFailure> {
    if !has_wildcard_args(store, target) {
        return Ok(Some(target));
    }
    if !lambda.has_explicit_params() {
        return Ok(Some(non_wildcard_parameterization(store, target)));
    }

    let TyData::Parameterized { origin, .. } = *store.data(target) else {
        return Ok(None);
    };
    let Some(class) = store.class(origin) else {
        return Ok(None);
    };
    let class_params = class.type_params.clone();

    let mut scope = PolyScope::enter(session, lambda.site);
    let inferred = infer_ground_target(store, &mut scope, origin, &class_params, lambda);
    drop(scope);
    match inferred {
        Ok(ground) => Ok(ground),
        Err(failure) => {
            trace!(?failure, "ground-target inference failed");
            Ok(None)
        }
    }
}

fn infer_ground_target(
    store: &mut TypeStore,
    scope: &mut PolyScope<'_>,
    origin: ClassId,
    class_params: &[TypeVarId],
    lambda: &Lambda,
) -> Result<Option<TyId>, InferenceFailure> {
    let placeholders = scope.session().create_placeholders(store, class_params);
    let open = store.parameterized(origin, placeholders, None);
    let Ok(sam) = single_abstract_method(store, open, false) else {
        return Ok(None);
    };
    if sam.params.len() != lambda.params.len() {
        return Ok(None);
    }
    for (declared, &sam_param) in lambda.params.iter().zip(&sam.params) {
        let Some(declared) = *declared else {
            return Ok(None);
        };
        let constraint = TypeConstraint {
            left: declared,
            relation: Relation::Same,
            right: sam_param,
        };
        if !scope.session().reduce_and_incorporate(store, constraint)? {
            return Ok(None);
        }
    }
    let solved = scope.session().solve(store, open)?;
    Ok(Some(replace(store, open, &solved)))
}

/// A method reference against a functional-interface target.
fn reduce_method_ref(
    store: &mut TypeStore,
    session: &mut dyn InferenceSession,
    resolver: &mut dyn ExprResolver,
    expr: ExprId,
    mref: &MethodRef,
    target: TyId,
) -> Result<Reduction, InferenceFailure> {
    let ground = if has_wildcard_args(store, target) {
        non_wildcard_parameterization(store, target)
    } else {
        target
    };
    let Ok(sam) = single_abstract_method(store, ground, true) else {
        return Ok(Reduction::False);
    };
    let Some(candidate) = resolver.resolve_method_ref(store, expr, ground) else {
        return Ok(Reduction::False);
    };

    if mref.exact {
        reduce_exact_method_ref(store, mref, &sam, &candidate)
    } else {
        reduce_inexact_method_ref(store, session, mref, &sam, &candidate)
    }
}

/// An exact reference: one fixed method, so the pairing is purely
/// structural. A parameter-count delta of one binds the contract's first
/// parameter to the receiver and shifts the rest.
fn reduce_exact_method_ref(
    store: &mut TypeStore,
    mref: &MethodRef,
    sam: &MethodSignature,
    candidate: &MethodSignature,
) -> Result<Reduction, InferenceFailure> {
    let delta = sam.params.len().wrapping_sub(candidate.params.len());
    let offset = match delta {
        0 => 0,
        1 => 1,
        _ => return Ok(Reduction::False),
    };

    let mut out = Vec::new();
    if offset == 1 {
        out.push(Constraint::types(
            sam.params[0],
            Relation::Compatible,
            mref.receiver,
        ));
    }
    for (i, &cand_param) in candidate.params.iter().enumerate() {
        out.push(Constraint::types(
            sam.params[i + offset],
            Relation::Compatible,
            cand_param,
        ));
    }

    if sam.return_type != store.void_ty() {
        if candidate.return_type == store.void_ty() {
            return Err(InferenceFailure::ValuelessExpression);
        }
        let produced = capture_conversion(store, candidate.return_type);
        out.push(Constraint::types(
            produced,
            Relation::Compatible,
            sam.return_type,
        ));
    }
    if out.is_empty() {
        Ok(Reduction::True)
    } else {
        Ok(Reduction::Replace(out))
    }
}

/// An inexact reference: overload resolution is still pending, so the
/// contract's parameter types stand in for arguments and the step-4
/// invocation machinery runs against the candidate.
fn reduce_inexact_method_ref(
    store: &mut TypeStore,
    session: &mut dyn InferenceSession,
    mref: &MethodRef,
    sam: &MethodSignature,
    candidate: &MethodSignature,
) -> Result<Reduction, InferenceFailure> {
    if sam.params.iter().any(|&p| !is_proper(store, p)) {
        return Ok(Reduction::False);
    }

    let returns_void = sam.return_type == store.void_ty();
    if returns_void && candidate.type_params.is_empty() {
        return Ok(Reduction::True);
    }

    let offset = if sam.params.len() == candidate.params.len() + 1 {
        1
    } else {
        0
    };
    let arg_types: Vec<TyId> = sam.params[offset..].to_vec();

    let mut scope = PolyScope::enter(session, mref.site);
    let outcome =
        infer_method_ref_invocation(store, &mut scope, mref, sam, candidate, &arg_types);
    drop(scope);
    match outcome {
        Ok(ok) => Ok(if ok {
            Reduction::Absorbed
        } else {
            Reduction::False
        }),
        Err(failure) => {
            trace!(?failure, "method reference inference failed");
            Ok(Reduction::False)
        }
    }
}

fn infer_method_ref_invocation(
    store: &mut TypeStore,
    scope: &mut PolyScope<'_>,
    mref: &MethodRef,
    sam: &MethodSignature,
    candidate: &MethodSignature,
    arg_types: &[TyId],
) -> Result<bool, InferenceFailure> {
    let placeholders = scope
        .session()
        .create_placeholders(store, &candidate.type_params);
    let subst = placeholder_map(&candidate.type_params, &placeholders);
    let instantiated = instantiate_signature(store, candidate, &subst);

    scope.session().add_parameter_constraints(
        store,
        &instantiated,
        Arguments::Types(arg_types),
        instantiated.flags.is_varargs,
    )?;
    scope
        .session()
        .add_throws_constraints(store, &instantiated, mref.site)?;

    if sam.return_type != store.void_ty() {
        if instantiated.return_type == store.void_ty() {
            return Err(InferenceFailure::ValuelessExpression);
        }
        let ret = scope.session().substitute(store, instantiated.return_type);
        let constraint = TypeConstraint {
            left: ret,
            relation: Relation::Compatible,
            right: sam.return_type,
        };
        if !scope.session().reduce_and_incorporate(store, constraint)? {
            return Ok(false);
        }
        scope.session().solve(store, ret)?;
    }

    // A constructor reference through an explicitly parameterized receiver
    // also pins the constructed type against the contract's return type.
    if mref.receiver_parameterized && candidate.flags.is_constructor {
        let constructed = capture_conversion(store, mref.receiver);
        let constraint = TypeConstraint {
            left: constructed,
            relation: Relation::Compatible,
            right: sam.return_type,
        };
        if !scope.session().reduce_and_incorporate(store, constraint)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Coarse arity/shape pre-check used to discard impossible overload
/// candidates before real reduction. Never mutates the session and never
/// suspends.
pub fn potentially_compatible(
    store: &mut TypeStore,
    body: &Body,
    expr: ExprId,
    target: TyId,
) -> bool {
    if matches!(store.data(target), TyData::InferenceVar(_)) {
        return true;
    }
    match body.expr(expr) {
        Expr::Lambda(lambda) => {
            let ground = non_wildcard_parameterization(store, target);
            let Ok(sam) = single_abstract_method(store, ground, true) else {
                return false;
            };
            if sam.params.len() != lambda.params.len() {
                return false;
            }
            if sam.return_type == store.void_ty() {
                lambda.void_compatible
            } else {
                lambda.value_compatible
            }
        }
        Expr::MethodRef(_) => {
            let ground = non_wildcard_parameterization(store, target);
            single_abstract_method(store, ground, true).is_ok()
        }
        Expr::Conditional(cond) => {
            let cond = *cond;
            potentially_compatible(store, body, cond.then_expr, target)
                && potentially_compatible(store, body, cond.else_expr, target)
        }
        Expr::Standalone(plain) => match plain.ty {
            Some(ty) => {
                let constant = plain.constant;
                is_assignable_with_constant(store, ty, target, constant)
            }
            None => true,
        },
        Expr::Invocation(_) => true,
    }
}

/// The inference placeholders a formula's evaluation depends on, used by
/// the outer driver to order constraint resolution. Read-only with respect
/// to the session; no suspension.
pub fn input_variables(
    store: &mut TypeStore,
    body: &Body,
    constraint: &Constraint,
) -> Vec<TyId> {
    let mut out = Vec::new();
    if let Constraint::Expr { expr, target, .. } = *constraint {
        collect_expr_inputs(store, body, expr, target, &mut out);
    }
    out.sort_by_key(|ty| ty.0);
    out.dedup();
    out
}

fn collect_expr_inputs(
    store: &mut TypeStore,
    body: &Body,
    expr: ExprId,
    target: TyId,
    out: &mut Vec<TyId>,
) {
    match body.expr(expr) {
        Expr::Lambda(lambda) => {
            if matches!(store.data(target), TyData::InferenceVar(_)) {
                out.push(target);
                return;
            }
            let lambda = lambda.clone();
            let ground = non_wildcard_parameterization(store, target);
            let Ok(sam) = single_abstract_method(store, ground, true) else {
                return;
            };
            if !lambda.has_explicit_params() {
                for &param in &sam.params {
                    collect_inference_vars(store, param, out);
                }
            }
            if sam.return_type != store.void_ty() {
                for &result in &lambda.results {
                    collect_expr_inputs(store, body, result, sam.return_type, out);
                }
            }
        }
        Expr::MethodRef(mref) => {
            if matches!(store.data(target), TyData::InferenceVar(_)) {
                out.push(target);
                return;
            }
            if mref.exact {
                return;
            }
            let ground = non_wildcard_parameterization(store, target);
            let Ok(sam) = single_abstract_method(store, ground, true) else {
                return;
            };
            for &param in &sam.params {
                collect_inference_vars(store, param, out);
            }
        }
        Expr::Conditional(cond) => {
            let cond = *cond;
            collect_expr_inputs(store, body, cond.then_expr, target, out);
            collect_expr_inputs(store, body, cond.else_expr, target, out);
        }
        Expr::Standalone(_) | Expr::Invocation(_) => {}
    }
}

fn lenient_query(session: &dyn InferenceSession) -> CompatQuery {
    CompatQuery {
        lenient_inference_vars: session.in_nested_lambda_inference(),
        ..CompatQuery::default()
    }
}

fn placeholder_map(params: &[TypeVarId], placeholders: &[TyId]) -> HashMap<TypeVarId, TyId> {
    params.iter().copied().zip(placeholders.iter().copied()).collect()
}

fn instantiate_signature(
    store: &mut TypeStore,
    method: &MethodSignature,
    subst: &HashMap<TypeVarId, TyId>,
) -> MethodSignature {
    let params = method
        .params
        .iter()
        .map(|&p| substitute(store, p, subst))
        .collect();
    let return_type = substitute(store, method.return_type, subst);
    let throws = method
        .throws
        .iter()
        .map(|&t| substitute(store, t, subst))
        .collect();
    MethodSignature {
        name: method.name.clone(),
        owner: method.owner,
        type_params: Vec::new(),
        params,
        return_type,
        throws,
        flags: method.flags,
    }
}

fn known_value(body: &Body, expr: ExprId) -> Option<(TyId, Option<i64>)> {
    match body.expr(expr) {
        Expr::Standalone(plain) => plain.ty.map(|ty| (ty, plain.constant)),
        _ => None,
    }
}
